//! Task lifecycle state machine
//!
//! `next_status` is the decision table over (status, event). `apply` runs
//! validation and the table, then returns a new task carrying the effects.
//! Nothing is mutated when either step fails.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use tracing::debug;

use super::event::{LifecycleEvent, LifecycleEventKind};
use super::status::TaskStatus;
use crate::domain::progress::progress_percent;
use crate::domain::wbs::{NodePath, Project, Task, lookup};
use crate::error::{Error, Result};

/// Decision table and effects for task events
pub struct TaskLifecycle;

impl TaskLifecycle {
    /// Events legal in a status
    pub fn allowed_events(status: TaskStatus) -> &'static [LifecycleEventKind] {
        use LifecycleEventKind::*;
        match status {
            TaskStatus::Draft | TaskStatus::Approved => &[Assign],
            TaskStatus::InProgress | TaskStatus::Rejected => &[Assign, SubmitProgress],
            TaskStatus::Submitted => &[Assign, Review],
        }
    }

    /// Whether an event kind is legal in a status
    pub fn is_allowed(status: TaskStatus, kind: LifecycleEventKind) -> bool {
        Self::allowed_events(status).contains(&kind)
    }

    /// The status a task moves to, or `InvalidTransition`
    pub fn next_status(status: TaskStatus, event: &LifecycleEvent) -> Result<TaskStatus> {
        if !Self::is_allowed(status, event.kind()) {
            return Err(Error::InvalidTransition {
                state: status.to_string(),
                event: event.kind().to_string(),
            });
        }

        let next = match event {
            LifecycleEvent::Assign { submitters, .. } => {
                if status == TaskStatus::Draft && !submitters.is_empty() {
                    TaskStatus::InProgress
                } else {
                    status
                }
            }
            LifecycleEvent::SubmitProgress { completed, total } => {
                if completed == total {
                    TaskStatus::Approved
                } else {
                    TaskStatus::Submitted
                }
            }
            LifecycleEvent::Review { approved: true, .. } => TaskStatus::Approved,
            LifecycleEvent::Review { approved: false, .. } => TaskStatus::Rejected,
        };
        Ok(next)
    }

    /// Reject malformed event payloads
    pub fn validate(event: &LifecycleEvent) -> Result<()> {
        match event {
            LifecycleEvent::Assign {
                submitters,
                reviewers,
            } => {
                if submitters.is_empty() && reviewers.is_empty() {
                    return Err(Error::validation("no assignee"));
                }
                if submitters.iter().chain(reviewers).any(|u| u.trim().is_empty()) {
                    return Err(Error::validation("assignee ids must not be blank"));
                }
            }
            LifecycleEvent::SubmitProgress { completed, total } => {
                if *completed < 0 {
                    return Err(Error::validation(format!(
                        "completed must not be negative (got {})",
                        completed
                    )));
                }
                if *total <= 0 {
                    return Err(Error::validation(format!(
                        "total must be positive (got {})",
                        total
                    )));
                }
                if completed > total {
                    return Err(Error::validation(format!(
                        "completed {} exceeds total {}",
                        completed, total
                    )));
                }
            }
            LifecycleEvent::Review {
                approved: false,
                comment,
            } => {
                let blank = comment.as_deref().is_none_or(|c| c.trim().is_empty());
                if blank {
                    return Err(Error::validation("a rejection needs a comment"));
                }
            }
            LifecycleEvent::Review { approved: true, .. } => {}
        }
        Ok(())
    }

    /// Apply an event to a task, producing the next task value
    ///
    /// Legality is checked before payload validation, so an event that is
    /// wrong for the current status always reports `InvalidTransition`.
    pub fn apply(task: &Task, event: &LifecycleEvent, at: DateTime<Utc>) -> Result<Task> {
        let next_status = Self::next_status(task.status, event)?;
        Self::validate(event)?;

        let mut next = task.clone();
        next.status = next_status;

        match event {
            LifecycleEvent::Assign {
                submitters,
                reviewers,
            } => {
                next.submitters = submitters.clone();
                next.reviewers = reviewers.clone();
            }
            LifecycleEvent::SubmitProgress { completed, total } => {
                next.completed = *completed;
                next.total = *total;
                next.progress = progress_percent(*completed, *total);
                if next_status == TaskStatus::Approved {
                    next.approved_at = Some(at);
                } else {
                    next.submitted_at = Some(at);
                }
            }
            LifecycleEvent::Review { approved, comment } => {
                next.review_comment = comment
                    .as_deref()
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(str::to_string);
                if *approved {
                    next.approved_at = Some(at);
                }
            }
        }

        debug!(
            task = %task.name,
            event = %event.kind(),
            from = %task.status,
            to = %next.status,
            "Task transition"
        );

        Ok(next)
    }

    /// Apply an event to the task at `path`, producing the next project value
    ///
    /// The project is not re-aggregated here.
    pub fn apply_to_project(
        project: &Project,
        path: &NodePath,
        event: &LifecycleEvent,
        at: DateTime<Utc>,
    ) -> Result<Project> {
        let (p, s, t) = lookup::task_indices(path)?;
        let task = lookup::find_task(project, p, s, t)?;
        let updated = Self::apply(task, event, at)?;

        let mut next = project.clone();
        *lookup::find_task_mut(&mut next, path)? = updated;
        Ok(next)
    }

    /// Convenience: `assign` event
    pub fn assign(
        task: &Task,
        submitters: BTreeSet<String>,
        reviewers: BTreeSet<String>,
        at: DateTime<Utc>,
    ) -> Result<Task> {
        Self::apply(
            task,
            &LifecycleEvent::Assign {
                submitters,
                reviewers,
            },
            at,
        )
    }

    /// Convenience: `submit_progress` event
    pub fn submit_progress(task: &Task, completed: i64, total: i64, at: DateTime<Utc>) -> Result<Task> {
        Self::apply(task, &LifecycleEvent::submit_progress(completed, total), at)
    }

    /// Convenience: `review` event
    pub fn review(task: &Task, approved: bool, comment: Option<String>, at: DateTime<Utc>) -> Result<Task> {
        Self::apply(task, &LifecycleEvent::Review { approved, comment }, at)
    }
}
