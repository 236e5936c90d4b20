//! Error types for toolpath generation.

use thiserror::Error;

/// Error codes for toolpath generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// No curves to convert (-1)
    EmptyInput = -1,
    /// File could not be read or written (-2)
    Io = -2,
    /// Malformed JSON input (-3)
    Parse = -3,
    /// Bad numeric format specifier in a template (E100)
    InvalidFormat = 100,
    /// Generation setting out of range (E200)
    InvalidSetting = 200,
    /// Pocket generation cancelled by the caller (E300)
    Cancelled = 300,
    /// Curve list failed validation (E400)
    InvalidGeometry = 400,
}

/// Main error type for toolpath generation.
#[derive(Debug, Error)]
pub enum ToolpathError {
    #[error("No curves to convert")]
    EmptyInput,

    #[error("Invalid format '{format}' for placeholder {{{placeholder}}}")]
    InvalidFormat { placeholder: String, format: String },

    #[error("Invalid value for '{field}': {value}")]
    InvalidSetting { field: String, value: String },

    #[error("Pocket generation cancelled after {rings} ring(s)")]
    Cancelled { rings: usize },

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ToolpathError {
    /// Get the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            ToolpathError::EmptyInput => ErrorCode::EmptyInput,
            ToolpathError::InvalidFormat { .. } => ErrorCode::InvalidFormat,
            ToolpathError::InvalidSetting { .. } => ErrorCode::InvalidSetting,
            ToolpathError::Cancelled { .. } => ErrorCode::Cancelled,
            ToolpathError::InvalidGeometry(_) => ErrorCode::InvalidGeometry,
            ToolpathError::Io(_) => ErrorCode::Io,
            ToolpathError::Json(_) => ErrorCode::Parse,
        }
    }

    /// Get the numeric error code value.
    pub fn code_value(&self) -> i32 {
        self.code() as i32
    }

    pub(crate) fn invalid_setting(field: &str, value: impl std::fmt::Display) -> Self {
        ToolpathError::InvalidSetting {
            field: field.to_string(),
            value: value.to_string(),
        }
    }
}

/// Result type alias for toolpath operations.
pub type Result<T> = std::result::Result<T, ToolpathError>;
