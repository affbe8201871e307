use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::TaskId,
    error::ApiErrorBody,
    protocol::{
        AckResponse, ApiOutcome, ClearCompletedResponse, CreateTaskRequest, Task,
        TaskResponse, TaskStatsSummary, UpdateTaskRequest,
    },
};
use tracing::{debug, warn};
use url::Url;

pub mod commands;
pub mod controller;
pub mod error;
pub mod notifications;
pub mod stats;
pub mod view;

pub use commands::Command;
pub use controller::{
    AlwaysConfirm, ClearOutcome, Confirm, ControllerOptions, PresentationSurface,
    TaskListController,
};
pub use error::{ClientError, ErrorCategory};

pub type Result<T, E = ClientError> = std::result::Result<T, E>;

/// The remote TaskFlow service. It owns storage, ids and timestamps; the
/// client only ever mirrors what it returns.
#[async_trait]
pub trait TaskService: Send + Sync {
    async fn list_tasks(&self) -> Result<Vec<Task>>;
    async fn create_task(&self, request: CreateTaskRequest) -> Result<Task>;
    async fn toggle_task(&self, id: TaskId) -> Result<Task>;
    async fn delete_task(&self, id: TaskId) -> Result<()>;
    /// Returns the number of tasks the service actually deleted.
    async fn clear_completed(&self) -> Result<u64>;
    async fn update_task(&self, id: TaskId, request: UpdateTaskRequest) -> Result<Task>;
    async fn fetch_stats(&self) -> Result<TaskStatsSummary>;
}

pub struct HttpTaskService {
    http: Client,
    base_url: Url,
}

impl HttpTaskService {
    pub fn new(server_url: &str) -> Result<Self> {
        Self::with_timeout(server_url, None)
    }

    pub fn with_timeout(server_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let base_url = normalize_base_url(server_url)?;
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|source| ClientError::InvalidUrl {
                url: format!("{}{path}", self.base_url),
                source,
            })
    }
}

#[async_trait]
impl TaskService for HttpTaskService {
    async fn list_tasks(&self) -> Result<Vec<Task>> {
        let res = self.http.get(self.endpoint("api/tasks")?).send().await?;
        decode_body(res).await
    }

    async fn create_task(&self, request: CreateTaskRequest) -> Result<Task> {
        let res = self
            .http
            .post(self.endpoint("api/add_task")?)
            .json(&request)
            .send()
            .await?;
        let body: TaskResponse = decode_outcome(res).await?;
        body.task.ok_or(ClientError::MissingTask)
    }

    async fn toggle_task(&self, id: TaskId) -> Result<Task> {
        let res = self
            .http
            .post(self.endpoint(&format!("api/toggle_task/{id}"))?)
            .send()
            .await?;
        let body: TaskResponse = decode_outcome(res).await?;
        body.task.ok_or(ClientError::MissingTask)
    }

    async fn delete_task(&self, id: TaskId) -> Result<()> {
        let res = self
            .http
            .delete(self.endpoint(&format!("api/delete_task/{id}"))?)
            .send()
            .await?;
        let _: AckResponse = decode_outcome(res).await?;
        Ok(())
    }

    async fn clear_completed(&self) -> Result<u64> {
        let res = self
            .http
            .delete(self.endpoint("api/clear_completed")?)
            .send()
            .await?;
        let body: ClearCompletedResponse = decode_outcome(res).await?;
        Ok(body.deleted_count)
    }

    async fn update_task(&self, id: TaskId, request: UpdateTaskRequest) -> Result<Task> {
        let res = self
            .http
            .put(self.endpoint(&format!("api/update_task/{id}"))?)
            .json(&request)
            .send()
            .await?;
        let body: TaskResponse = decode_outcome(res).await?;
        body.task.ok_or(ClientError::MissingTask)
    }

    async fn fetch_stats(&self) -> Result<TaskStatsSummary> {
        let res = self.http.get(self.endpoint("api/stats")?).send().await?;
        decode_body(res).await
    }
}

/// Paths are joined relative to the base, so it must end in `/` for a
/// deployment under a prefix like `http://host/taskflow`.
fn normalize_base_url(server_url: &str) -> Result<Url> {
    let trimmed = server_url.trim();
    let candidate = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };
    let url = Url::parse(&candidate).map_err(|source| ClientError::InvalidUrl {
        url: trimmed.to_string(),
        source,
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ClientError::Validation(format!(
            "unsupported server url scheme '{}'",
            url.scheme()
        )));
    }
    Ok(url)
}

async fn decode_body<T: DeserializeOwned>(res: Response) -> Result<T> {
    let status = res.status();
    let bytes = res.bytes().await?;
    if !status.is_success() {
        let message = serde_json::from_slice::<ApiErrorBody>(&bytes)
            .map(|body| body.error)
            .unwrap_or_else(|_| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            });
        warn!("service responded status={} error={message}", status.as_u16());
        return Err(ClientError::Service {
            status: status.as_u16(),
            message,
        });
    }
    debug!("service responded status={} bytes={}", status.as_u16(), bytes.len());
    Ok(serde_json::from_slice(&bytes)?)
}

async fn decode_outcome<T: DeserializeOwned + ApiOutcome>(res: Response) -> Result<T> {
    let body: T = decode_body(res).await?;
    if !body.succeeded() {
        return Err(ClientError::Rejected(
            body.error_message()
                .unwrap_or("request was not successful")
                .to_string(),
        ));
    }
    Ok(body)
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
