//! The task list controller: local mirror, filter/sort intent, and the
//! mutate-then-reload protocol against the remote [`TaskService`].

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use shared::{
    domain::{Priority, SortOrder, TaskFilter, TaskId},
    protocol::{CreateTaskRequest, Task, TaskStatsSummary, UpdateTaskRequest},
};
use tracing::{debug, error, info, warn};

use crate::{
    commands::{shortcuts_help, Command},
    error::ClientError,
    notifications::{Notification, NotificationCenter, NotificationId, NotificationKind},
    stats::{StatBoard, StatsDisplay, TaskStats},
    view::{build_list_view, clock_label, derive_view, TaskListView, ViewContext},
    Result, TaskService,
};

/// Where the controller sends everything it wants shown. Implementations
/// decide how (terminal, GUI widgets, test recorder).
pub trait PresentationSurface: Send {
    fn render_tasks(&mut self, view: &TaskListView);
    fn render_stats(&mut self, stats: &StatsDisplay);
    fn show_notification(&mut self, notification: &Notification);
    fn dismiss_notification(&mut self, id: NotificationId);
    fn set_loading(&mut self, loading: bool);

    fn clear_input(&mut self) {}
    fn focus_input(&mut self) {}
    fn highlight_task(&mut self, _id: TaskId) {}
    fn render_clock(&mut self, _label: &str) {}
    fn render_remote_stats(&mut self, _summary: &TaskStatsSummary) {}
}

/// Explicit user confirmation for destructive operations.
#[async_trait]
pub trait Confirm: Send + Sync {
    async fn confirm(&self, prompt: &str) -> bool;
}

/// Accepts every prompt; used for non-interactive runs (`--yes`).
pub struct AlwaysConfirm;

#[async_trait]
impl Confirm for AlwaysConfirm {
    async fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearOutcome {
    NothingToClear,
    Declined,
    /// Count reported by the service, which may differ from the local one.
    Cleared(u64),
}

#[derive(Debug, Clone)]
pub struct ControllerOptions {
    pub notification_ttl: Duration,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            notification_ttl: crate::notifications::DEFAULT_NOTIFICATION_TTL,
        }
    }
}

pub struct TaskListController {
    service: Arc<dyn TaskService>,
    confirm: Arc<dyn Confirm>,
    surface: Box<dyn PresentationSurface>,
    tasks: Vec<Task>,
    filter: TaskFilter,
    sort_order: SortOrder,
    notifications: NotificationCenter,
    stats: StatBoard,
    pinned_view_context: Option<ViewContext>,
}

impl TaskListController {
    pub fn new(
        service: Arc<dyn TaskService>,
        confirm: Arc<dyn Confirm>,
        surface: Box<dyn PresentationSurface>,
    ) -> Self {
        Self::with_options(service, confirm, surface, ControllerOptions::default())
    }

    pub fn with_options(
        service: Arc<dyn TaskService>,
        confirm: Arc<dyn Confirm>,
        surface: Box<dyn PresentationSurface>,
        options: ControllerOptions,
    ) -> Self {
        Self {
            service,
            confirm,
            surface,
            tasks: Vec::new(),
            filter: TaskFilter::default(),
            sort_order: SortOrder::default(),
            notifications: NotificationCenter::new(options.notification_ttl),
            stats: StatBoard::default(),
            pinned_view_context: None,
        }
    }

    /// Freezes the wall clock used for ages and labels.
    pub fn pin_view_context(&mut self, ctx: ViewContext) {
        self.pinned_view_context = Some(ctx);
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn filter(&self) -> TaskFilter {
        self.filter
    }

    pub fn sort_order(&self) -> SortOrder {
        self.sort_order
    }

    pub fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }

    pub fn stats(&self) -> TaskStats {
        self.stats.targets()
    }

    /// The filtered and sorted display list, derived fresh from the mirror.
    pub fn view(&self) -> Vec<&Task> {
        derive_view(&self.tasks, self.filter, self.sort_order)
    }

    pub fn view_model(&self) -> TaskListView {
        build_list_view(
            &self.tasks,
            self.filter,
            self.sort_order,
            &self.view_context(),
        )
    }

    pub async fn dispatch(&mut self, command: Command) -> Result<()> {
        debug!(command = command.name(), "dispatching command");
        match command {
            Command::Reload => self.load().await,
            Command::Add { content, priority } => self.add(&content, priority).await.map(drop),
            Command::Toggle(id) => self.toggle(id).await.map(drop),
            Command::Delete(id) => self.delete(id).await.map(drop),
            Command::ClearCompleted => self.clear_completed().await.map(drop),
            Command::SetFilter(filter) => {
                self.set_filter(filter);
                Ok(())
            }
            Command::ToggleSort => {
                self.toggle_sort();
                Ok(())
            }
            Command::Update {
                id,
                content,
                priority,
            } => self.update(id, content.as_deref(), priority).await.map(drop),
            Command::FetchStats => self.remote_stats().await.map(drop),
            Command::FocusInput => {
                self.surface.focus_input();
                Ok(())
            }
            Command::Dismiss(id) => {
                self.dismiss(id);
                Ok(())
            }
            Command::ShowShortcuts => {
                self.notify(NotificationKind::Info, shortcuts_help());
                Ok(())
            }
        }
    }

    /// Replaces the mirror wholesale. On failure the previous list stays.
    pub async fn load(&mut self) -> Result<()> {
        match self.service.list_tasks().await {
            Ok(tasks) => {
                debug!("loaded {} tasks", tasks.len());
                self.tasks = tasks;
                self.render();
                self.update_stats();
                Ok(())
            }
            Err(err) => {
                error!("failed to load tasks: {err}");
                self.notify(NotificationKind::Error, "Error loading tasks");
                Err(err)
            }
        }
    }

    pub async fn add(&mut self, content: &str, priority: Priority) -> Result<Task> {
        let content = content.trim();
        if content.is_empty() {
            self.notify(NotificationKind::Warning, "Please enter a task description");
            self.surface.focus_input();
            return Err(ClientError::Validation(
                "task content must not be empty".to_string(),
            ));
        }

        self.surface.set_loading(true);
        let result = self
            .service
            .create_task(CreateTaskRequest {
                content: content.to_string(),
                priority,
            })
            .await;
        let result = match result {
            Ok(task) => {
                info!("task created id={} priority={}", task.id, task.priority);
                self.surface.clear_input();
                self.refresh().await;
                self.notify(NotificationKind::Success, "Task added successfully!");
                self.surface.highlight_task(task.id);
                Ok(task)
            }
            Err(err) => {
                error!("failed to add task: {err}");
                self.notify(
                    NotificationKind::Error,
                    "Error adding task. Please try again.",
                );
                Err(err)
            }
        };
        self.surface.set_loading(false);
        result
    }

    pub async fn toggle(&mut self, id: TaskId) -> Result<Task> {
        self.surface.set_loading(true);
        let result = match self.service.toggle_task(id).await {
            Ok(task) => {
                info!("task {id} toggled completed={}", task.completed);
                self.refresh().await;
                if task.completed {
                    self.notify(NotificationKind::Success, "Task completed! 🎉");
                } else {
                    self.notify(NotificationKind::Info, "Task marked as pending");
                }
                Ok(task)
            }
            Err(err) => {
                error!("failed to toggle task {id}: {err}");
                self.notify(NotificationKind::Error, "Error updating task");
                Err(err)
            }
        };
        self.surface.set_loading(false);
        result
    }

    /// Returns `false` when the user declined the confirmation.
    pub async fn delete(&mut self, id: TaskId) -> Result<bool> {
        let confirmed = self
            .confirm
            .confirm("Are you sure you want to delete this task? This action cannot be undone.")
            .await;
        if !confirmed {
            debug!("delete of task {id} declined");
            return Ok(false);
        }

        self.surface.set_loading(true);
        let result = match self.service.delete_task(id).await {
            Ok(()) => {
                info!("task deleted id={id}");
                self.refresh().await;
                self.notify(NotificationKind::Success, "Task deleted successfully");
                Ok(true)
            }
            Err(err) => {
                error!("failed to delete task {id}: {err}");
                self.notify(NotificationKind::Error, "Error deleting task");
                Err(err)
            }
        };
        self.surface.set_loading(false);
        result
    }

    pub async fn clear_completed(&mut self) -> Result<ClearOutcome> {
        let completed = self.tasks.iter().filter(|task| task.completed).count();
        if completed == 0 {
            self.notify(NotificationKind::Info, "No completed tasks to clear");
            return Ok(ClearOutcome::NothingToClear);
        }

        let prompt = format!(
            "Are you sure you want to delete all {completed} completed tasks? This action cannot be undone."
        );
        if !self.confirm.confirm(&prompt).await {
            debug!("clear completed declined");
            return Ok(ClearOutcome::Declined);
        }

        self.surface.set_loading(true);
        let result = match self.service.clear_completed().await {
            Ok(deleted) => {
                if deleted != completed as u64 {
                    warn!("service cleared {deleted} tasks, local mirror had {completed} completed");
                }
                info!("cleared completed tasks count={deleted}");
                self.refresh().await;
                self.notify(
                    NotificationKind::Success,
                    format!("{deleted} completed tasks deleted"),
                );
                Ok(ClearOutcome::Cleared(deleted))
            }
            Err(err) => {
                error!("failed to clear completed tasks: {err}");
                self.notify(NotificationKind::Error, "Error clearing completed tasks");
                Err(err)
            }
        };
        self.surface.set_loading(false);
        result
    }

    /// Edits content and/or priority through the service's update endpoint.
    pub async fn update(
        &mut self,
        id: TaskId,
        content: Option<&str>,
        priority: Option<Priority>,
    ) -> Result<Task> {
        let content = content.map(str::trim);
        if content.is_some_and(str::is_empty) {
            self.notify(NotificationKind::Warning, "Task content cannot be empty");
            return Err(ClientError::Validation(
                "task content must not be empty".to_string(),
            ));
        }
        let request = UpdateTaskRequest {
            content: content.map(str::to_string),
            priority,
            completed: None,
        };
        if request.is_empty() {
            self.notify(NotificationKind::Warning, "Nothing to update");
            return Err(ClientError::Validation(
                "update needs content or priority".to_string(),
            ));
        }

        self.surface.set_loading(true);
        let result = match self.service.update_task(id, request).await {
            Ok(task) => {
                info!("task updated id={id}");
                self.refresh().await;
                self.notify(NotificationKind::Success, "Task updated successfully");
                Ok(task)
            }
            Err(err) => {
                error!("failed to update task {id}: {err}");
                self.notify(NotificationKind::Error, "Error updating task");
                Err(err)
            }
        };
        self.surface.set_loading(false);
        result
    }

    pub async fn remote_stats(&mut self) -> Result<TaskStatsSummary> {
        match self.service.fetch_stats().await {
            Ok(summary) => {
                self.surface.render_remote_stats(&summary);
                Ok(summary)
            }
            Err(err) => {
                error!("failed to fetch statistics: {err}");
                self.notify(NotificationKind::Error, "Error loading statistics");
                Err(err)
            }
        }
    }

    pub fn set_filter(&mut self, filter: TaskFilter) {
        self.filter = filter;
        self.render();
    }

    pub fn toggle_sort(&mut self) {
        self.sort_order = self.sort_order.toggled();
        self.render();
        let label = self.sort_order.label().to_lowercase();
        self.notify(NotificationKind::Info, format!("Sorted by {label}"));
    }

    pub fn dismiss(&mut self, id: NotificationId) {
        if self.notifications.dismiss(id).is_some() {
            self.surface.dismiss_notification(id);
        }
    }

    /// Periodic clock tick: expires notifications, advances stat counters
    /// and refreshes the clock label.
    pub fn tick(&mut self, now: Instant) {
        for id in self.notifications.expire(now) {
            self.surface.dismiss_notification(id);
        }
        if self.stats.advance(now) {
            self.surface.render_stats(&self.stats.snapshot());
        }
        let label = clock_label(&self.view_context());
        self.surface.render_clock(&label);
    }

    /// Jumps all stat counters to their targets.
    pub fn settle_stats(&mut self) {
        self.stats.settle();
        self.surface.render_stats(&self.stats.snapshot());
    }

    pub fn render(&mut self) {
        let view = self.view_model();
        self.surface.render_tasks(&view);
    }

    // Load failures are already reported by `load`; the mutation itself
    // still succeeded.
    async fn refresh(&mut self) {
        let _ = self.load().await;
    }

    fn update_stats(&mut self) {
        self.stats
            .set_targets(TaskStats::from_tasks(&self.tasks), Instant::now());
        self.surface.render_stats(&self.stats.snapshot());
    }

    fn notify(&mut self, kind: NotificationKind, message: impl Into<String>) {
        let notification = self.notifications.push(kind, message, Instant::now());
        self.surface.show_notification(&notification);
    }

    fn view_context(&self) -> ViewContext {
        self.pinned_view_context.unwrap_or_else(ViewContext::local)
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
