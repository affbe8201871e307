//! Pure derivation of what the task list should display.
//!
//! Nothing here is cached: every render recomputes the filtered, sorted view
//! from the controller's mirror.

use chrono::{DateTime, FixedOffset, Local, Offset, Utc};
use shared::{
    domain::{Priority, SortOrder, TaskFilter, TaskId},
    protocol::Task,
};

/// Wall-clock inputs for relative ages and date labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewContext {
    pub now: DateTime<Utc>,
    pub offset: FixedOffset,
}

impl ViewContext {
    pub fn local() -> Self {
        let now = Local::now();
        Self {
            now: now.with_timezone(&Utc),
            offset: *now.offset(),
        }
    }

    pub fn utc(now: DateTime<Utc>) -> Self {
        Self {
            now,
            offset: Utc.fix(),
        }
    }

    fn localize(&self, at: DateTime<Utc>) -> DateTime<FixedOffset> {
        at.with_timezone(&self.offset)
    }
}

/// Filter by completion, then stable-sort by creation time.
pub fn derive_view(tasks: &[Task], filter: TaskFilter, sort_order: SortOrder) -> Vec<&Task> {
    let mut view: Vec<&Task> = tasks
        .iter()
        .filter(|task| filter.matches(task.completed))
        .collect();
    match sort_order {
        SortOrder::NewestFirst => view.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortOrder::OldestFirst => view.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
    }
    view
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Red,
    Yellow,
    Green,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriorityBadge {
    pub priority: Priority,
    pub label: String,
    pub icon: &'static str,
    pub tone: Tone,
}

impl PriorityBadge {
    pub fn for_priority(priority: Priority) -> Self {
        let (name, icon, tone) = match priority {
            Priority::High => ("High", "🔴", Tone::Red),
            Priority::Medium => ("Medium", "🟡", Tone::Yellow),
            Priority::Low => ("Low", "🟢", Tone::Green),
        };
        Self {
            priority,
            label: format!("{name} Priority"),
            icon,
            tone,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Pending,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskItemView {
    pub id: TaskId,
    pub content: String,
    pub completed: bool,
    pub status: TaskStatus,
    pub priority: PriorityBadge,
    pub age: String,
    pub created_label: String,
}

pub fn task_item_view(task: &Task, ctx: &ViewContext) -> TaskItemView {
    TaskItemView {
        id: task.id,
        content: task.content.clone(),
        completed: task.completed,
        status: if task.completed {
            TaskStatus::Completed
        } else {
            TaskStatus::Pending
        },
        priority: PriorityBadge::for_priority(task.priority),
        age: time_ago(task.created_at, ctx),
        created_label: ctx
            .localize(task.created_at)
            .format("%b %-d, %I:%M %p")
            .to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyState {
    /// Nothing exists at all.
    NoTasks,
    /// Tasks exist but the active filter hides all of them.
    NoMatches(TaskFilter),
}

impl EmptyState {
    pub fn title(&self) -> String {
        match self {
            EmptyState::NoTasks => "No tasks yet!".to_string(),
            EmptyState::NoMatches(filter) => format!("No {filter} tasks"),
        }
    }

    pub fn hint(&self) -> &'static str {
        match self {
            EmptyState::NoTasks => "Start organizing your day by adding your first task above.",
            EmptyState::NoMatches(_) => "No tasks match the current filter.",
        }
    }

    pub fn action_label(&self) -> Option<&'static str> {
        match self {
            EmptyState::NoTasks => Some("Add Your First Task"),
            EmptyState::NoMatches(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterTab {
    pub filter: TaskFilter,
    pub label: &'static str,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskListView {
    pub filter: TaskFilter,
    pub sort_order: SortOrder,
    pub filters: Vec<FilterTab>,
    pub items: Vec<TaskItemView>,
    pub empty_state: Option<EmptyState>,
}

impl TaskListView {
    pub fn count_badge(&self) -> usize {
        self.items.len()
    }

    pub fn sort_label(&self) -> &'static str {
        self.sort_order.label()
    }
}

pub fn build_list_view(
    tasks: &[Task],
    filter: TaskFilter,
    sort_order: SortOrder,
    ctx: &ViewContext,
) -> TaskListView {
    let items: Vec<TaskItemView> = derive_view(tasks, filter, sort_order)
        .into_iter()
        .map(|task| task_item_view(task, ctx))
        .collect();

    // An empty mirror always reads as "no tasks", whatever the filter.
    let empty_state = match (items.is_empty(), filter) {
        (false, _) => None,
        (true, TaskFilter::All) => Some(EmptyState::NoTasks),
        (true, _) if tasks.is_empty() => Some(EmptyState::NoTasks),
        (true, filter) => Some(EmptyState::NoMatches(filter)),
    };

    TaskListView {
        filter,
        sort_order,
        filters: TaskFilter::ALL
            .into_iter()
            .map(|candidate| FilterTab {
                filter: candidate,
                label: match candidate {
                    TaskFilter::All => "All",
                    TaskFilter::Pending => "Pending",
                    TaskFilter::Completed => "Completed",
                },
                active: candidate == filter,
            })
            .collect(),
        items,
        empty_state,
    }
}

pub fn time_ago(created_at: DateTime<Utc>, ctx: &ViewContext) -> String {
    let minutes = (ctx.now - created_at).num_minutes();
    let hours = minutes / 60;
    let days = hours / 24;

    if minutes < 1 {
        "Just now".to_string()
    } else if minutes < 60 {
        format!("{minutes}m ago")
    } else if hours < 24 {
        format!("{hours}h ago")
    } else if days < 7 {
        format!("{days}d ago")
    } else {
        ctx.localize(created_at).format("%-m/%-d/%Y").to_string()
    }
}

/// Header clock, e.g. `Sat, Oct 17 03:04 PM`.
pub fn clock_label(ctx: &ViewContext) -> String {
    ctx.localize(ctx.now)
        .format("%a, %b %-d %I:%M %p")
        .to_string()
}

#[cfg(test)]
#[path = "tests/view_tests.rs"]
mod tests;
