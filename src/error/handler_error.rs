use serde_json::{Value, json};
use thiserror::Error;

/// A tagged failure returned by a handler's executor.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct HandlerError {
    pub message: String,
    pub data: Option<Value>,
}

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(err: serde_json::Error) -> Self {
        HandlerError::new(format!("serialization failed: {err}"))
    }
}

/// A validator's reason for refusing a parameter bag.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{reason}")]
pub struct ValidationFailure {
    pub reason: String,
    pub data: Option<Value>,
}

impl ValidationFailure {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            data: None,
        }
    }

    /// A failure attributed to a single named field.
    pub fn field(field: &str, reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            data: Some(json!({ "field": field })),
        }
    }
}

impl From<serde_json::Error> for ValidationFailure {
    fn from(err: serde_json::Error) -> Self {
        ValidationFailure::new(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    #[error("a handler for method `{0}` is already registered")]
    DuplicateHandler(String),
    #[error("handler names must not be empty")]
    EmptyName,
}
