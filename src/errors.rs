use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("VALIDATION: {0}")]
    Validation(String),
    #[error("NOT_FOUND: {0}")]
    NotFound(String),
    #[error("CONFLICT: {0}")]
    Conflict(String),
    #[error("STORE_READ: {0}")]
    StoreRead(String),
    #[error("STORE_WRITE: {0}")]
    StoreWrite(String),
    #[error("INTERNAL: {0}")]
    Internal(String),
}

impl AppError {
    /// Message without the code prefix, as returned to HTTP clients.
    pub fn message(&self) -> &str {
        match self {
            Self::Validation(message)
            | Self::NotFound(message)
            | Self::Conflict(message)
            | Self::StoreRead(message)
            | Self::StoreWrite(message)
            | Self::Internal(message) => message,
        }
    }

    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::NotFound(_) | Self::Conflict(_))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::Internal(value.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(value: anyhow::Error) -> Self {
        Self::Internal(value.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;
