use std::fmt;
use storage::error::StorageError;
use validator::ValidationErrors;

use crate::config::ConfigError;
use crate::invocation::InvocationResponse;

/// Handler layer errors
#[derive(Debug)]
pub enum HandlerError {
    Config(ConfigError),
    Storage(StorageError),
    Validation(ValidationErrors),
    BadRequest(String),
    MalformedBody(String),
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "{}", e),
            Self::Storage(e) => write!(f, "{}", e),
            Self::Validation(e) => write!(f, "{}", validation_message(e)),
            Self::BadRequest(msg) => write!(f, "{}", msg),
            Self::MalformedBody(msg) => write!(f, "Malformed request body: {}", msg),
        }
    }
}

impl std::error::Error for HandlerError {}

impl HandlerError {
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) | Self::BadRequest(_) => 400,
            Self::Config(_) | Self::Storage(_) | Self::MalformedBody(_) => 500,
        }
    }

    /// Log the error and turn it into the client-facing reply. The client
    /// only receives the message; details stay in the logs.
    pub fn into_response(self) -> InvocationResponse {
        let status_code = self.status_code();

        if status_code >= 500 {
            tracing::error!(status_code, "Request failed: {:?}", self);
        } else {
            tracing::warn!(status_code, "Rejected request: {}", self);
        }

        InvocationResponse::error(status_code, self.to_string())
    }
}

// Field messages, falling back to the error code when a rule has none
fn validation_message(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(_, errors)| {
            errors.iter().map(|e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string())
            })
        })
        .collect();
    messages.sort();
    messages.join("; ")
}

impl From<ConfigError> for HandlerError {
    fn from(error: ConfigError) -> Self {
        Self::Config(error)
    }
}

impl From<StorageError> for HandlerError {
    fn from(error: StorageError) -> Self {
        Self::Storage(error)
    }
}

impl From<ValidationErrors> for HandlerError {
    fn from(error: ValidationErrors) -> Self {
        Self::Validation(error)
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(error: serde_json::Error) -> Self {
        Self::MalformedBody(error.to_string())
    }
}

pub type HandlerResult<T> = Result<T, HandlerError>;
