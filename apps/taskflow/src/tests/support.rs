use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use client_core::TaskService;
use shared::{
    domain::{Priority, TaskId},
    protocol::{CreateTaskRequest, Task, TaskStatsSummary, UpdateTaskRequest},
};

pub fn task(id: i64, content: &str, completed: bool) -> Task {
    Task {
        id: TaskId(id),
        content: content.to_string(),
        completed,
        priority: Priority::Medium,
        created_at: Utc
            .with_ymd_and_hms(2026, 10, 17, 9, 0, id as u32)
            .single()
            .expect("date"),
        updated_at: None,
    }
}

/// In-memory task service shared by the binary's tests.
#[derive(Default)]
pub struct MemoryService {
    pub tasks: tokio::sync::Mutex<Vec<Task>>,
}

#[async_trait]
impl TaskService for MemoryService {
    async fn list_tasks(&self) -> client_core::Result<Vec<Task>> {
        Ok(self.tasks.lock().await.clone())
    }

    async fn create_task(&self, request: CreateTaskRequest) -> client_core::Result<Task> {
        let mut tasks = self.tasks.lock().await;
        let mut task = task(tasks.len() as i64 + 1, &request.content, false);
        task.priority = request.priority;
        tasks.push(task.clone());
        Ok(task)
    }

    async fn toggle_task(&self, id: TaskId) -> client_core::Result<Task> {
        let mut tasks = self.tasks.lock().await;
        let task = tasks
            .iter_mut()
            .find(|task| task.id == id)
            .ok_or(client_core::ClientError::MissingTask)?;
        task.completed = !task.completed;
        Ok(task.clone())
    }

    async fn delete_task(&self, id: TaskId) -> client_core::Result<()> {
        self.tasks.lock().await.retain(|task| task.id != id);
        Ok(())
    }

    async fn clear_completed(&self) -> client_core::Result<u64> {
        let mut tasks = self.tasks.lock().await;
        let before = tasks.len();
        tasks.retain(|task| !task.completed);
        Ok((before - tasks.len()) as u64)
    }

    async fn update_task(
        &self,
        id: TaskId,
        request: UpdateTaskRequest,
    ) -> client_core::Result<Task> {
        let mut tasks = self.tasks.lock().await;
        let task = tasks
            .iter_mut()
            .find(|task| task.id == id)
            .ok_or(client_core::ClientError::MissingTask)?;
        if let Some(content) = request.content {
            task.content = content;
        }
        if let Some(priority) = request.priority {
            task.priority = priority;
        }
        Ok(task.clone())
    }

    async fn fetch_stats(&self) -> client_core::Result<TaskStatsSummary> {
        Ok(TaskStatsSummary::default())
    }
}

impl MemoryService {
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        Self {
            tasks: tokio::sync::Mutex::new(tasks),
        }
    }
}
