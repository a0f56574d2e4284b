//! Lifecycle events

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of a lifecycle event, without its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleEventKind {
    Assign,
    SubmitProgress,
    Review,
}

impl LifecycleEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Assign => "assign",
            Self::SubmitProgress => "submit progress for",
            Self::Review => "review",
        }
    }
}

impl fmt::Display for LifecycleEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An event applied to a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LifecycleEvent {
    /// Replace the submitter and reviewer sets
    Assign {
        submitters: BTreeSet<String>,
        reviewers: BTreeSet<String>,
    },
    /// Report completed units out of a total
    SubmitProgress { completed: i64, total: i64 },
    /// Accept or reject the last submission
    Review {
        approved: bool,
        comment: Option<String>,
    },
}

impl LifecycleEvent {
    pub fn assign<S, R>(submitters: S, reviewers: R) -> Self
    where
        S: IntoIterator,
        S::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Self::Assign {
            submitters: submitters.into_iter().map(Into::into).collect(),
            reviewers: reviewers.into_iter().map(Into::into).collect(),
        }
    }

    pub fn submit_progress(completed: i64, total: i64) -> Self {
        Self::SubmitProgress { completed, total }
    }

    pub fn approve(comment: Option<String>) -> Self {
        Self::Review {
            approved: true,
            comment,
        }
    }

    pub fn reject(comment: impl Into<String>) -> Self {
        Self::Review {
            approved: false,
            comment: Some(comment.into()),
        }
    }

    pub fn kind(&self) -> LifecycleEventKind {
        match self {
            Self::Assign { .. } => LifecycleEventKind::Assign,
            Self::SubmitProgress { .. } => LifecycleEventKind::SubmitProgress,
            Self::Review { .. } => LifecycleEventKind::Review,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assign_constructor_deduplicates() {
        let event = LifecycleEvent::assign(["alice", "alice", "bob"], Vec::<String>::new());
        match event {
            LifecycleEvent::Assign {
                submitters,
                reviewers,
            } => {
                assert_eq!(submitters.len(), 2);
                assert!(reviewers.is_empty());
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_kind() {
        assert_eq!(
            LifecycleEvent::submit_progress(1, 2).kind(),
            LifecycleEventKind::SubmitProgress
        );
        assert_eq!(LifecycleEvent::reject("no").kind().to_string(), "review");
    }
}
