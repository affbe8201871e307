//! Plain-text presentation surface and line-based confirmation prompts.

use std::{
    io::{self, Write},
    sync::Arc,
};

use async_trait::async_trait;
use client_core::{
    notifications::{Notification, NotificationId},
    stats::StatsDisplay,
    view::{EmptyState, TaskListView},
    Confirm, PresentationSurface,
};
use shared::{domain::TaskId, protocol::TaskStatsSummary};
use tokio::sync::{mpsc, Mutex};
use tracing::debug;

/// Lines typed by the user, shared between the shell loop and prompts.
pub type SharedLines = Arc<Mutex<mpsc::Receiver<String>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Every render is written as it happens.
    Interactive,
    /// Task lists and in-flight stat frames are skipped; the caller prints
    /// the final state once.
    Batch,
}

pub struct TerminalSurface<W> {
    out: W,
    mode: RenderMode,
    clock: Option<String>,
}

impl TerminalSurface<io::Stdout> {
    pub fn stdout(mode: RenderMode) -> Self {
        Self::new(io::stdout(), mode)
    }
}

impl<W: Write> TerminalSurface<W> {
    pub fn new(out: W, mode: RenderMode) -> Self {
        Self {
            out,
            mode,
            clock: None,
        }
    }
}

pub fn write_task_list(
    out: &mut impl Write,
    view: &TaskListView,
    clock: Option<&str>,
) -> io::Result<()> {
    let tabs: Vec<String> = view
        .filters
        .iter()
        .map(|tab| {
            if tab.active {
                format!("[{}]", tab.label)
            } else {
                tab.label.to_string()
            }
        })
        .collect();
    write!(
        out,
        "\nTasks ({}) | {} | sort: {}",
        view.count_badge(),
        tabs.join(" "),
        view.sort_label()
    )?;
    match clock {
        Some(clock) => writeln!(out, " | {clock}")?,
        None => writeln!(out)?,
    }

    if let Some(empty) = view.empty_state {
        writeln!(out, "  {}", empty.title())?;
        writeln!(out, "  {}", empty.hint())?;
        if let (EmptyState::NoTasks, Some(action)) = (empty, empty.action_label()) {
            writeln!(out, "  -> {action}: type `add <description>`")?;
        }
        return Ok(());
    }

    for item in &view.items {
        let mark = if item.completed { "x" } else { " " };
        writeln!(
            out,
            "  [{mark}] #{:<4} {} {}  ({}, {}, {})",
            item.id,
            item.priority.icon,
            item.content,
            item.priority.label,
            item.age,
            item.created_label
        )?;
    }
    Ok(())
}

pub fn write_stats(out: &mut impl Write, stats: &StatsDisplay) -> io::Result<()> {
    write!(
        out,
        "Total {} | Completed {} | Pending {} | {}% done",
        stats.total, stats.completed, stats.pending, stats.completion_rate
    )?;
    if stats.show_clear_completed {
        writeln!(out, " | `clear` removes completed")
    } else {
        writeln!(out)
    }
}

impl<W: Write + Send> PresentationSurface for TerminalSurface<W> {
    fn render_tasks(&mut self, view: &TaskListView) {
        if self.mode == RenderMode::Interactive {
            let _ = write_task_list(&mut self.out, view, self.clock.as_deref());
        }
    }

    fn render_stats(&mut self, stats: &StatsDisplay) {
        // Intermediate animation frames would scroll the terminal.
        if stats.settled {
            let _ = write_stats(&mut self.out, stats);
        }
    }

    fn show_notification(&mut self, notification: &Notification) {
        let _ = writeln!(
            self.out,
            "{} {}",
            notification.kind.icon(),
            notification.message
        );
    }

    fn dismiss_notification(&mut self, id: NotificationId) {
        debug!("notification dismissed id={id}");
    }

    fn set_loading(&mut self, loading: bool) {
        if loading && self.mode == RenderMode::Interactive {
            let _ = writeln!(self.out, "...");
        }
    }

    fn focus_input(&mut self) {
        let _ = writeln!(self.out, "New task: type `add <description> [--high|--low]`");
    }

    fn highlight_task(&mut self, id: TaskId) {
        let _ = writeln!(self.out, "  * #{id} is new");
    }

    fn render_clock(&mut self, label: &str) {
        self.clock = Some(label.to_string());
    }

    fn render_remote_stats(&mut self, summary: &TaskStatsSummary) {
        let breakdown = summary.priority_breakdown;
        let _ = writeln!(
            self.out,
            "Server stats: {} total, {} completed, {} pending, {}% done\n  high {} | medium {} | low {} | {} added in the last 24h",
            summary.total_tasks,
            summary.completed_tasks,
            summary.pending_tasks,
            summary.completion_rate,
            breakdown.high,
            breakdown.medium,
            breakdown.low,
            summary.recent_tasks
        );
    }
}

/// Asks on stdout and waits for the next typed line. Only `y`/`yes` confirm;
/// end of input declines.
pub struct LineConfirm {
    lines: SharedLines,
}

impl LineConfirm {
    pub fn new(lines: SharedLines) -> Self {
        Self { lines }
    }
}

pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

#[async_trait]
impl Confirm for LineConfirm {
    async fn confirm(&self, prompt: &str) -> bool {
        {
            let mut stdout = io::stdout();
            let _ = write!(stdout, "{prompt} [y/N] ");
            let _ = stdout.flush();
        }
        let answer = self.lines.lock().await.recv().await;
        answer.as_deref().is_some_and(is_affirmative)
    }
}
