// ABOUTME: Error types for the slide-audit application
// ABOUTME: Provides structured error handling and exit codes for each stage of a run

use std::path::PathBuf;
use thiserror::Error;

/// Exit code for fatal errors (load failures, bad selectors, browser faults)
pub const EXIT_FATAL: i32 = 2;

/// Exit code when no overflow was found but some slides could not be verified
pub const EXIT_INCOMPLETE: i32 = 3;

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Could not load deck: {0}")]
    LoadFailure(String),

    #[error("Invalid slide selector: {0}")]
    SelectorValidation(String),

    #[error("Slide {slide} did not finish rendering within {waited_ms}ms")]
    RenderTimeout { slide: usize, waited_ms: u64 },

    #[error("Headless browser error: {message}")]
    BrowserError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Failed to capture slide: {0}")]
    CaptureError(String),

    #[error("Pagination error: {0}")]
    PaginationError(String),

    #[error("Input validation error: {0}")]
    ValidationError(String),

    #[error("Path not found: {0}")]
    PathNotFoundError(PathBuf),

    #[error("File error: {0}")]
    FileError(#[from] std::io::Error),

    #[error("Could not decode probe result: {0}")]
    ProbeDecodeError(#[from] serde_json::Error),
}

impl AuditError {
    /// Wrap an automation-layer failure with a short description of what was attempted
    pub fn browser(message: impl Into<String>, err: anyhow::Error) -> Self {
        AuditError::BrowserError {
            message: format!("{}: {}", message.into(), err),
            source: Some(err.into()),
        }
    }

    /// Process exit status for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            AuditError::RenderTimeout { .. } => EXIT_INCOMPLETE,
            _ => EXIT_FATAL,
        }
    }
}

// headless_chrome reports everything through anyhow
impl From<anyhow::Error> for AuditError {
    fn from(err: anyhow::Error) -> Self {
        AuditError::BrowserError {
            message: err.to_string(),
            source: Some(err.into()),
        }
    }
}

impl From<image::ImageError> for AuditError {
    fn from(err: image::ImageError) -> Self {
        AuditError::CaptureError(format!("captured image is unreadable: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, AuditError>;
