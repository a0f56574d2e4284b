//! Project tracker
//!
//! Holds one loaded project and runs every mutation through the same flow:
//! compute the next project value, roll quantities up, save, and only then
//! replace the in-memory value. A rejected event or a failed save leaves the
//! tracker exactly as it was.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::collaborators::{IdentityProvider, ProjectRepository};
use crate::domain::lifecycle::{LifecycleEvent, TaskAffordances, TaskLifecycle};
use crate::domain::progress::{
    Allocation, DistributionRequest, DistributionStrategy, QuantityAggregator, QuantityDistributor,
};
use crate::domain::wbs::{NodePath, Project, Task, lookup};
use crate::error::{Error, Result};

/// Mutation front-end for a single project
///
/// Mutations take `&mut self`, so a tracker never has two in flight.
pub struct ProjectTracker<R: ProjectRepository> {
    repository: Arc<R>,
    project: Project,
}

impl<R: ProjectRepository> ProjectTracker<R> {
    /// Load a project and roll its quantities up
    pub async fn open(repository: Arc<R>, project_id: &str) -> Result<Self> {
        let project = QuantityAggregator::run(repository.load_project(project_id).await?)?;
        info!(
            project_id = %project.id,
            tasks = project.task_count(),
            "Project opened"
        );
        Ok(Self {
            repository,
            project,
        })
    }

    /// Current, aggregated project value
    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn project_id(&self) -> &str {
        &self.project.id
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    /// Replace the in-memory project with the stored one
    pub async fn reload(&mut self) -> Result<()> {
        let project = self.repository.load_project(&self.project.id).await?;
        self.project = QuantityAggregator::run(project)?;
        debug!(project_id = %self.project.id, "Project reloaded");
        Ok(())
    }

    pub fn task(&self, path: &NodePath) -> Result<&Task> {
        let (p, s, t) = lookup::task_indices(path)?;
        lookup::find_task(&self.project, p, s, t)
    }

    /// Replace a task's submitter and reviewer sets
    pub async fn assign(
        &mut self,
        path: &NodePath,
        submitters: BTreeSet<String>,
        reviewers: BTreeSet<String>,
    ) -> Result<&Task> {
        self.apply_event(
            path,
            LifecycleEvent::Assign {
                submitters,
                reviewers,
            },
        )
        .await
    }

    pub async fn submit_progress(&mut self, path: &NodePath, completed: i64, total: i64) -> Result<&Task> {
        self.apply_event(path, LifecycleEvent::submit_progress(completed, total))
            .await
    }

    pub async fn review(&mut self, path: &NodePath, approved: bool, comment: Option<String>) -> Result<&Task> {
        self.apply_event(path, LifecycleEvent::Review { approved, comment })
            .await
    }

    /// Apply a lifecycle event stamped with the current time
    pub async fn apply_event(&mut self, path: &NodePath, event: LifecycleEvent) -> Result<&Task> {
        self.apply_event_at(path, event, Utc::now()).await
    }

    /// Apply a lifecycle event stamped with `at`
    pub async fn apply_event_at(
        &mut self,
        path: &NodePath,
        event: LifecycleEvent,
        at: DateTime<Utc>,
    ) -> Result<&Task> {
        let next = TaskLifecycle::apply_to_project(&self.project, path, &event, at)?;
        self.commit(next, event.kind().as_str()).await?;

        let task = self.task(path)?;
        info!(
            project_id = %self.project.id,
            task = %path.dotted(),
            status = %task.status,
            "Task updated"
        );
        Ok(task)
    }

    /// Split `parent_total` over the children of a package or subpackage
    ///
    /// `manual` is only read for the manual strategy.
    pub async fn distribute(
        &mut self,
        target: &NodePath,
        strategy: DistributionStrategy,
        parent_total: i64,
        manual: Option<Vec<Allocation>>,
    ) -> Result<DistributionRequest> {
        let children = QuantityDistributor::children_of(&self.project, target)?;
        let request = QuantityDistributor::distribute(strategy, parent_total, &children, manual)?;
        let next = QuantityDistributor::apply(&self.project, target, &request)?;
        self.commit(next, "distribute").await?;

        info!(
            project_id = %self.project.id,
            target = %target.dotted(),
            strategy = %strategy,
            parent_total = parent_total,
            "Quantities distributed"
        );
        Ok(request)
    }

    /// What `identity` may be offered on the task at `path`
    pub fn affordances(&self, path: &NodePath, identity: &dyn IdentityProvider) -> Result<TaskAffordances> {
        let task = self.task(path)?;
        let user = identity.current_user_id();
        Ok(TaskAffordances::for_user(task, user.as_deref()))
    }

    async fn commit(&mut self, next: Project, action: &str) -> Result<()> {
        let next = QuantityAggregator::run(next)?;

        if let Err(err) = self.repository.save_project(&next.id, &next).await {
            warn!(
                project_id = %self.project.id,
                action = action,
                error = %err,
                "Save failed; keeping previous project"
            );
            return Err(match err {
                Error::Persistence(_) => err,
                other => Error::persistence(other.to_string()),
            });
        }

        self.project = next;
        Ok(())
    }
}
