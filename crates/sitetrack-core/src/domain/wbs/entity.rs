//! WBS entities
//!
//! Defines the value records of the hierarchy. Quantities are signed so that
//! bad input can be rejected with a validation error at the boundary; the
//! invariant `0 <= completed <= total` holds for every stored record.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::lifecycle::TaskStatus;
use crate::domain::progress::{Quantities, progress_percent};

/// Root of containment; owns every package, subpackage and task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Project identifier (UUID string when created in-process)
    pub id: String,
    /// Display name
    pub name: String,
    /// Rolled-up completed units
    #[serde(default)]
    pub completed: i64,
    /// Rolled-up total units
    #[serde(default)]
    pub total: i64,
    /// Rolled-up progress, 0-100
    #[serde(default)]
    pub progress: u8,
    /// Ordered work packages
    #[serde(default)]
    pub packages: Vec<Package>,
}

impl Project {
    /// Create an empty project with a fresh UUID
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), name)
    }

    /// Create an empty project with a known id
    pub fn with_id(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            completed: 0,
            total: 0,
            progress: 0,
            packages: Vec::new(),
        }
    }

    /// Builder: append a package
    pub fn with_package(mut self, package: Package) -> Self {
        self.packages.push(package);
        self
    }

    /// Number of tasks across the whole project
    pub fn task_count(&self) -> usize {
        self.packages
            .iter()
            .flat_map(|p| p.subpackages.iter())
            .map(|s| s.tasks.len())
            .sum()
    }
}

/// A work package (first level under the project)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Package {
    pub name: String,
    #[serde(default)]
    pub completed: i64,
    #[serde(default)]
    pub total: i64,
    #[serde(default)]
    pub progress: u8,
    #[serde(default)]
    pub subpackages: Vec<Subpackage>,
}

impl Package {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            completed: 0,
            total: 0,
            progress: 0,
            subpackages: Vec::new(),
        }
    }

    /// Builder: append a subpackage
    pub fn with_subpackage(mut self, subpackage: Subpackage) -> Self {
        self.subpackages.push(subpackage);
        self
    }

    /// Builder: set explicit quantities (used when the package has no subpackages)
    pub fn with_quantities(mut self, completed: i64, total: i64) -> Self {
        self.completed = completed;
        self.total = total;
        self.progress = progress_percent(completed, total);
        self
    }
}

/// A subpackage (second level); holds the tasks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subpackage {
    pub name: String,
    #[serde(default)]
    pub completed: i64,
    #[serde(default)]
    pub total: i64,
    #[serde(default)]
    pub progress: u8,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl Subpackage {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            completed: 0,
            total: 0,
            progress: 0,
            tasks: Vec::new(),
        }
    }

    /// Builder: append a task
    pub fn with_task(mut self, task: Task) -> Self {
        self.tasks.push(task);
        self
    }

    /// Builder: set explicit quantities (used when the subpackage has no tasks)
    pub fn with_quantities(mut self, completed: i64, total: i64) -> Self {
        self.completed = completed;
        self.total = total;
        self.progress = progress_percent(completed, total);
        self
    }
}

/// A leaf task; the only level whose quantities are authoritative
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub name: String,
    #[serde(default)]
    pub completed: i64,
    #[serde(default)]
    pub total: i64,
    #[serde(default)]
    pub progress: u8,
    #[serde(default)]
    pub status: TaskStatus,
    /// Users allowed to submit progress
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub submitters: BTreeSet<String>,
    /// Users allowed to review submissions
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub reviewers: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,
    /// Comment from the last review; kept after a rejection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_comment: Option<String>,
}

impl Task {
    /// Create a draft task with no quantities
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            completed: 0,
            total: 0,
            progress: 0,
            status: TaskStatus::Draft,
            submitters: BTreeSet::new(),
            reviewers: BTreeSet::new(),
            submitted_at: None,
            approved_at: None,
            review_comment: None,
        }
    }

    /// Builder: set quantities and the derived progress
    pub fn with_quantities(mut self, completed: i64, total: i64) -> Self {
        self.completed = completed;
        self.total = total;
        self.progress = progress_percent(completed, total);
        self
    }

    /// Builder: set status
    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    /// Builder: add a submitter
    pub fn with_submitter(mut self, user: impl Into<String>) -> Self {
        self.submitters.insert(user.into());
        self
    }

    /// Builder: add a reviewer
    pub fn with_reviewer(mut self, user: impl Into<String>) -> Self {
        self.reviewers.insert(user.into());
        self
    }

    /// Whether anyone is assigned to this task
    pub fn is_assigned(&self) -> bool {
        !self.submitters.is_empty() || !self.reviewers.is_empty()
    }
}

macro_rules! impl_quantities {
    ($($ty:ty),*) => {
        $(
            impl Quantities for $ty {
                fn completed(&self) -> i64 {
                    self.completed
                }

                fn total(&self) -> i64 {
                    self.total
                }

                fn progress(&self) -> u8 {
                    self.progress
                }
            }
        )*
    };
}

impl_quantities!(Project, Package, Subpackage, Task);
