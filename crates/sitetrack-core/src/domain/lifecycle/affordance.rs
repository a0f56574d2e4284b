//! UI affordances for the current user
//!
//! Membership in the submitter/reviewer sets decides which controls a view
//! offers. This is a display decision only; access control lives outside
//! the core.

use serde::Serialize;

use super::event::LifecycleEventKind;
use super::machine::TaskLifecycle;
use crate::domain::wbs::Task;

/// What the current user may be offered on a task
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskAffordances {
    pub is_submitter: bool,
    pub is_reviewer: bool,
    pub can_submit: bool,
    pub can_review: bool,
}

impl TaskAffordances {
    /// Evaluate affordances for `user` (None = signed out)
    pub fn for_user(task: &Task, user: Option<&str>) -> Self {
        let Some(user) = user else {
            return Self::default();
        };

        let is_submitter = task.submitters.contains(user);
        let is_reviewer = task.reviewers.contains(user);

        Self {
            is_submitter,
            is_reviewer,
            can_submit: is_submitter
                && TaskLifecycle::is_allowed(task.status, LifecycleEventKind::SubmitProgress),
            can_review: is_reviewer
                && TaskLifecycle::is_allowed(task.status, LifecycleEventKind::Review),
        }
    }

    /// Whether any action is on offer
    pub fn any(&self) -> bool {
        self.can_submit || self.can_review
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::lifecycle::TaskStatus;

    fn task(status: TaskStatus) -> Task {
        Task::new("Plaster")
            .with_status(status)
            .with_submitter("alice")
            .with_reviewer("bob")
    }

    #[test]
    fn test_submitter_can_submit_while_in_progress() {
        let affordances = TaskAffordances::for_user(&task(TaskStatus::InProgress), Some("alice"));
        assert!(affordances.is_submitter);
        assert!(affordances.can_submit);
        assert!(!affordances.can_review);
    }

    #[test]
    fn test_reviewer_can_review_submitted() {
        let affordances = TaskAffordances::for_user(&task(TaskStatus::Submitted), Some("bob"));
        assert!(affordances.can_review);
        assert!(!affordances.can_submit);
        assert!(affordances.any());
    }

    #[test]
    fn test_nothing_offered_when_signed_out_or_unrelated() {
        assert_eq!(
            TaskAffordances::for_user(&task(TaskStatus::Submitted), None),
            TaskAffordances::default()
        );
        assert!(!TaskAffordances::for_user(&task(TaskStatus::Submitted), Some("eve")).any());
    }

    #[test]
    fn test_approved_offers_nothing() {
        assert!(!TaskAffordances::for_user(&task(TaskStatus::Approved), Some("alice")).any());
        assert!(!TaskAffordances::for_user(&task(TaskStatus::Approved), Some("bob")).any());
    }
}
