//! Interactive shell: a stdin reader thread feeds lines into one tokio loop
//! that also drives the once-per-second controller tick.

use std::{
    io::{self, BufRead},
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use anyhow::{anyhow, bail, Context};
use client_core::{commands::shortcut, Command, TaskListController};
use shared::domain::{Priority, TaskFilter, TaskId};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, warn};

use crate::terminal::SharedLines;

pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

pub const SHELL_HELP: &str = "\
Commands:
  add <text> [--high|--medium|--low]   create a task (medium by default)
  toggle <id>                          flip completed/pending
  delete <id>                          delete a task (asks first)
  clear                                delete all completed tasks (asks first)
  filter <all|pending|completed>       change the visible subset
  sort                                 flip newest/oldest first
  edit <id> [--high|--medium|--low] [new text]
  stats                                server-side statistics
  reload                               fetch the list again
  dismiss [id]                         dismiss a notification (latest by default)
  help                                 this listing plus keyboard shortcuts
  quit                                 leave the shell
  ^n ^a ^p ^c                          shortcut tokens";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellInput {
    Run(Command),
    DismissLatest,
    Help,
    Quit,
    Empty,
}

/// Splits trailing/leading `--high|--medium|--low` flags from free text.
fn split_priority<'a>(words: impl Iterator<Item = &'a str>) -> (Vec<&'a str>, Option<Priority>) {
    let mut text = Vec::new();
    let mut priority = None;
    for word in words {
        match word.strip_prefix("--").map(str::parse::<Priority>) {
            Some(Ok(parsed)) => priority = Some(parsed),
            _ => text.push(word),
        }
    }
    (text, priority)
}

fn parse_id(raw: Option<&str>) -> anyhow::Result<TaskId> {
    let raw = raw.ok_or_else(|| anyhow!("missing task id"))?;
    raw.parse()
        .with_context(|| format!("invalid task id '{raw}'"))
}

pub fn parse_line(line: &str) -> anyhow::Result<ShellInput> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(ShellInput::Empty);
    };

    if let Some(key) = head.strip_prefix('^') {
        let mut chars = key.chars();
        return match (chars.next(), chars.next()) {
            (Some(key), None) => shortcut(true, key)
                .map(ShellInput::Run)
                .ok_or_else(|| anyhow!("unknown shortcut '^{key}'")),
            _ => bail!("unknown shortcut '{head}'"),
        };
    }

    let command = match head.to_ascii_lowercase().as_str() {
        "add" | "new" => {
            let (text, priority) = split_priority(words);
            Command::Add {
                content: text.join(" "),
                priority: priority.unwrap_or_default(),
            }
        }
        "toggle" | "done" => Command::Toggle(parse_id(words.next())?),
        "delete" | "rm" => Command::Delete(parse_id(words.next())?),
        "clear" => Command::ClearCompleted,
        "filter" => {
            let raw = words.next().unwrap_or("all");
            Command::SetFilter(raw.parse::<TaskFilter>()?)
        }
        "sort" => Command::ToggleSort,
        "edit" => {
            let id = parse_id(words.next())?;
            let (text, priority) = split_priority(words);
            Command::Update {
                id,
                content: (!text.is_empty()).then(|| text.join(" ")),
                priority,
            }
        }
        "stats" => Command::FetchStats,
        "reload" => Command::Reload,
        "dismiss" => match words.next() {
            Some(raw) => Command::Dismiss(client_core::notifications::NotificationId(
                raw.parse()
                    .with_context(|| format!("invalid notification id '{raw}'"))?,
            )),
            None => return Ok(ShellInput::DismissLatest),
        },
        "help" | "?" => return Ok(ShellInput::Help),
        "quit" | "exit" | "q" => return Ok(ShellInput::Quit),
        other => bail!("unknown command '{other}', type `help`"),
    };
    Ok(ShellInput::Run(command))
}

/// Forwards lines until the reader ends or the receiver goes away. A line
/// that is not valid UTF-8 is skipped.
fn pump_lines(reader: impl BufRead, tx: &mpsc::Sender<String>) {
    for line in reader.lines() {
        match line {
            Ok(line) => {
                if tx.blocking_send(line).is_err() {
                    break;
                }
            }
            Err(err) if err.kind() == io::ErrorKind::InvalidData => {
                warn!("skipping unreadable input line: {err}");
            }
            Err(err) => {
                warn!("stdin read failed: {err}");
                break;
            }
        }
    }
}

/// Reads stdin on a plain thread; the async side shares the receiver.
pub fn spawn_stdin_reader() -> SharedLines {
    let (tx, rx) = mpsc::channel::<String>(64);
    thread::spawn(move || {
        pump_lines(io::stdin().lock(), &tx);
        debug!("stdin reader finished");
    });
    Arc::new(Mutex::new(rx))
}

async fn next_line(lines: &SharedLines) -> Option<String> {
    lines.lock().await.recv().await
}

/// Runs until `quit` or end of input. Command failures are already reported
/// through notifications and never end the loop.
pub async fn run_shell(
    controller: &mut TaskListController,
    lines: SharedLines,
    mut print: impl FnMut(&str),
) -> anyhow::Result<()> {
    let _ = controller.load().await;
    print("Type `help` for commands.");

    let mut ticker = tokio::time::interval(TICK_INTERVAL);
    loop {
        let line = tokio::select! {
            _ = ticker.tick() => {
                controller.tick(Instant::now());
                continue;
            }
            line = next_line(&lines) => line,
        };
        let Some(line) = line else {
            debug!("input closed, leaving shell");
            break;
        };

        let command = match parse_line(&line) {
            Ok(ShellInput::Empty) => continue,
            Ok(ShellInput::Quit) => break,
            Ok(ShellInput::Help) => {
                print(SHELL_HELP);
                Command::ShowShortcuts
            }
            Ok(ShellInput::DismissLatest) => match controller.notifications().latest() {
                Some(latest) => Command::Dismiss(latest.id),
                None => continue,
            },
            Ok(ShellInput::Run(command)) => command,
            Err(err) => {
                print(&format!("{err:#}"));
                continue;
            }
        };

        if let Err(err) = controller.dispatch(command).await {
            debug!("command failed: {err}");
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/shell_tests.rs"]
mod tests;
