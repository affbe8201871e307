use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{0}")]
    Validation(String),
    #[error("invalid server url '{url}': {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("service returned {status}: {message}")]
    Service { status: u16, message: String },
    #[error("service rejected request: {0}")]
    Rejected(String),
    #[error("malformed service response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("service response did not include the task")]
    MissingTask,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Caught locally before any request was sent.
    Validation,
    /// The request never produced a usable response.
    Transport,
    /// The service answered, but with a failure.
    Service,
}

impl ClientError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ClientError::Validation(_) | ClientError::InvalidUrl { .. } => {
                ErrorCategory::Validation
            }
            ClientError::Transport(_) => ErrorCategory::Transport,
            ClientError::Service { .. }
            | ClientError::Rejected(_)
            | ClientError::Decode(_)
            | ClientError::MissingTask => ErrorCategory::Service,
        }
    }
}
