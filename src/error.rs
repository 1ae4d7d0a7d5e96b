//! Error taxonomy shared by every tool/decision boundary.
//!
//! Internal helpers are free to return `anyhow::Result`; anything that
//! crosses a tool or protocol boundary collapses into one of these codes
//! (spec §6/§7).

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidState,
    InvalidRequest,
    WrongPage,
    AuthError,
    SelectorError,
    TimeoutError,
    ValidationError,
    ApiKeyInvalid,
    Unknown,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = serde_json::to_value(self)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_else(|| "UNKNOWN".to_string());
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, thiserror::Error, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct CopilotError {
    pub code: ErrorCode,
    pub message: String,
    pub recoverable: bool,
    pub cause: Option<String>,
}

impl CopilotError {
    pub fn new(code: ErrorCode, message: impl Into<String>, recoverable: bool) -> Self {
        Self {
            code,
            message: message.into(),
            recoverable,
            cause: None,
        }
    }

    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    pub fn from_anyhow(code: ErrorCode, recoverable: bool, err: anyhow::Error) -> Self {
        Self::new(code, err.to_string(), recoverable)
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidState, message, false)
    }

    pub fn selector_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::SelectorError, message, true)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::TimeoutError, message, true)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError, message, true)
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::AuthError, message, true)
    }
}

pub type CopilotResult<T> = Result<T, CopilotError>;
