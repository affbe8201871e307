use std::{io::Write, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    AlwaysConfirm, ClearOutcome, Confirm, ControllerOptions, HttpTaskService, TaskListController,
};
use shared::domain::{Priority, TaskFilter, TaskId};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod shell;
mod terminal;

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;

use terminal::{write_task_list, LineConfirm, RenderMode, TerminalSurface};

#[derive(Parser, Debug)]
#[command(name = "taskflow", about = "Terminal client for a TaskFlow to-do service")]
struct Cli {
    /// Base URL of the TaskFlow service.
    #[arg(long, global = true)]
    server_url: Option<String>,
    /// Settings file (defaults to ./taskflow.toml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Answer yes to every confirmation prompt.
    #[arg(long, short = 'y', global = true)]
    yes: bool,
    #[command(subcommand)]
    command: Option<CliCommand>,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Print the task list.
    List {
        #[arg(long, default_value_t = TaskFilter::All)]
        filter: TaskFilter,
        #[arg(long)]
        oldest_first: bool,
    },
    /// Create a task.
    Add {
        #[arg(required = true, num_args = 1..)]
        content: Vec<String>,
        #[arg(long, short, default_value_t = Priority::Medium)]
        priority: Priority,
    },
    /// Flip a task between pending and completed.
    Toggle { id: TaskId },
    /// Delete a task.
    Delete { id: TaskId },
    /// Delete every completed task.
    ClearCompleted,
    /// Change a task's content or priority.
    Edit {
        id: TaskId,
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        priority: Option<Priority>,
    },
    /// Server-side statistics.
    Stats,
    /// Interactive shell (default).
    Shell,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let mut settings = config::load_settings(cli.config.as_deref())?;
    if let Some(server_url) = cli.server_url {
        settings.server_url = server_url;
    }
    settings.validate()?;
    info!(
        "taskflow starting server_url={} timeout_secs={}",
        settings.server_url, settings.request_timeout_secs
    );

    let service = HttpTaskService::with_timeout(&settings.server_url, settings.request_timeout())
        .context("failed to build TaskFlow client")?;
    let command = cli.command.unwrap_or(CliCommand::Shell);
    let interactive = matches!(command, CliCommand::Shell);

    let lines = shell::spawn_stdin_reader();
    let confirm: Arc<dyn Confirm> = if cli.yes {
        Arc::new(AlwaysConfirm)
    } else {
        Arc::new(LineConfirm::new(lines.clone()))
    };
    let mode = if interactive {
        RenderMode::Interactive
    } else {
        RenderMode::Batch
    };
    let mut controller = TaskListController::with_options(
        Arc::new(service),
        confirm,
        Box::new(TerminalSurface::stdout(mode)),
        ControllerOptions {
            notification_ttl: settings.notification_ttl(),
        },
    );

    if interactive {
        return shell::run_shell(&mut controller, lines, |text| println!("{text}")).await;
    }
    run_once(&mut controller, command, &mut std::io::stdout()).await
}

async fn run_once(
    controller: &mut TaskListController,
    command: CliCommand,
    out: &mut (impl Write + Send),
) -> Result<()> {
    controller.load().await.context("failed to load tasks")?;

    match command {
        CliCommand::List {
            filter,
            oldest_first,
        } => {
            controller.set_filter(filter);
            if oldest_first {
                controller.toggle_sort();
            }
        }
        CliCommand::Add { content, priority } => {
            controller
                .add(&content.join(" "), priority)
                .await
                .context("add failed")?;
        }
        CliCommand::Toggle { id } => {
            controller.toggle(id).await.context("toggle failed")?;
        }
        CliCommand::Delete { id } => {
            if !controller.delete(id).await.context("delete failed")? {
                writeln!(out, "Delete cancelled, task #{id} kept")?;
            }
        }
        CliCommand::ClearCompleted => {
            let outcome = controller
                .clear_completed()
                .await
                .context("clear completed failed")?;
            if outcome == ClearOutcome::Declined {
                writeln!(out, "Clear cancelled, completed tasks kept")?;
            }
        }
        CliCommand::Edit {
            id,
            content,
            priority,
        } => {
            controller
                .update(id, content.as_deref(), priority)
                .await
                .context("edit failed")?;
        }
        CliCommand::Stats => {
            controller.remote_stats().await.context("stats failed")?;
            return Ok(());
        }
        CliCommand::Shell => {}
    }

    let view = controller.view_model();
    write_task_list(out, &view, None)?;
    out.flush()?;
    controller.settle_stats();
    Ok(())
}
