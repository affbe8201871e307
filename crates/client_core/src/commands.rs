//! User intents, independent of whichever front end produced them.

use shared::domain::{Priority, TaskFilter, TaskId};

use crate::notifications::NotificationId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Reload,
    Add {
        content: String,
        priority: Priority,
    },
    Toggle(TaskId),
    Delete(TaskId),
    ClearCompleted,
    SetFilter(TaskFilter),
    ToggleSort,
    Update {
        id: TaskId,
        content: Option<String>,
        priority: Option<Priority>,
    },
    FetchStats,
    FocusInput,
    Dismiss(NotificationId),
    ShowShortcuts,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Reload => "reload",
            Command::Add { .. } => "add",
            Command::Toggle(_) => "toggle",
            Command::Delete(_) => "delete",
            Command::ClearCompleted => "clear_completed",
            Command::SetFilter(_) => "set_filter",
            Command::ToggleSort => "toggle_sort",
            Command::Update { .. } => "update",
            Command::FetchStats => "fetch_stats",
            Command::FocusInput => "focus_input",
            Command::Dismiss(_) => "dismiss",
            Command::ShowShortcuts => "show_shortcuts",
        }
    }
}

pub const SHORTCUTS: [(&str, &str); 4] = [
    ("New Task", "Ctrl+N"),
    ("All Tasks", "Ctrl+A"),
    ("Pending", "Ctrl+P"),
    ("Completed", "Ctrl+C"),
];

/// Ctrl (or Cmd) chords. Anything else is left to the focused widget.
pub fn shortcut(modifier_held: bool, key: char) -> Option<Command> {
    if !modifier_held {
        return None;
    }
    match key.to_ascii_lowercase() {
        'n' => Some(Command::FocusInput),
        'a' => Some(Command::SetFilter(TaskFilter::All)),
        'p' => Some(Command::SetFilter(TaskFilter::Pending)),
        'c' => Some(Command::SetFilter(TaskFilter::Completed)),
        _ => None,
    }
}

pub fn shortcuts_help() -> String {
    let mut help = String::from("Keyboard Shortcuts");
    for (action, keys) in SHORTCUTS {
        help.push_str(&format!("\n  {action:<10} {keys}"));
    }
    help
}
