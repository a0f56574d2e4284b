//! Error types for Sitetrack

use thiserror::Error;

/// Result type alias using Sitetrack's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Sitetrack error types with helpful messages and suggestions
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // Validation errors (E100-E199)
    #[error("Validation failed: {0}")]
    Validation(String),

    // Lifecycle errors (E200-E299)
    #[error("Invalid transition: cannot {event} a task that is {state}")]
    InvalidTransition { state: String, event: String },

    // Lookup errors (E300-E399)
    #[error("Not found: {0}")]
    NotFound(String),

    // Persistence errors (E400-E499)
    #[error("Persistence error: {0}. The in-memory project was left unchanged; retry the operation.")]
    Persistence(String),

    // Config errors (E600-E699)
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Shorthand for a validation failure
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Shorthand for a persistence failure
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence(message.into())
    }

    /// Get error code for this error type
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "E100",
            Self::InvalidTransition { .. } => "E200",
            Self::NotFound(_) => "E300",
            Self::Persistence(_) => "E400",
            Self::Config(_) => "E600",
        }
    }

    /// Get suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::InvalidTransition { state, .. } => Some(format!(
                "Check which actions a {} task allows with `sitetrack show`",
                state
            )),
            Self::NotFound(_) => Some("sitetrack tree <project> --level 3".to_string()),
            Self::Persistence(_) => Some("Retry the same operation".to_string()),
            Self::Config(_) => Some("sitetrack config list".to_string()),
            Self::Validation(_) => None,
        }
    }

    /// Whether the error was raised before any state was touched
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::InvalidTransition { .. } | Self::NotFound(_)
        )
    }
}
