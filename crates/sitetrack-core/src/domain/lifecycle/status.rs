//! Task status

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Lifecycle status of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    /// Created, nobody submits yet
    #[default]
    Draft,
    /// Assigned and being worked on
    InProgress,
    /// Progress submitted, waiting for a reviewer
    Submitted,
    /// Accepted, either by review or by reaching the full quantity
    Approved,
    /// Sent back by a reviewer
    Rejected,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::InProgress => "in-progress",
            Self::Submitted => "submitted",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Whether progress can be submitted in this status
    pub fn accepts_submission(&self) -> bool {
        matches!(self, Self::InProgress | Self::Rejected)
    }

    /// Whether the task is waiting on a reviewer
    pub fn awaits_review(&self) -> bool {
        matches!(self, Self::Submitted)
    }

    /// Absorbing for display purposes (reassignment is still allowed)
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Approved)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "draft" => Ok(Self::Draft),
            "in-progress" | "in_progress" => Ok(Self::InProgress),
            "submitted" => Ok(Self::Submitted),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(Error::validation(format!("unknown task status '{}'", other))),
        }
    }
}
