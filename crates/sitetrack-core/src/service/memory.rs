//! In-memory project repository

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::collaborators::ProjectRepository;
use crate::domain::wbs::Project;
use crate::error::{Error, Result};

/// Project store kept in process memory
///
/// Handy for tests and demos. `set_unavailable(true)` makes every call fail
/// with a persistence error, the way an unreachable remote store would.
#[derive(Debug, Default)]
pub struct InMemoryProjectRepository {
    projects: RwLock<HashMap<String, Project>>,
    unavailable: AtomicBool,
}

impl InMemoryProjectRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: seed a project under its own id
    pub fn with_project(mut self, project: Project) -> Self {
        self.projects.get_mut().insert(project.id.clone(), project);
        self
    }

    pub async fn insert(&self, project: Project) {
        self.projects.write().await.insert(project.id.clone(), project);
    }

    /// Stored copy of a project, if any
    pub async fn get(&self, project_id: &str) -> Option<Project> {
        self.projects.read().await.get(project_id).cloned()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(Error::persistence("project store is unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl ProjectRepository for InMemoryProjectRepository {
    async fn load_project(&self, project_id: &str) -> Result<Project> {
        self.check_available()?;
        self.projects
            .read()
            .await
            .get(project_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("project '{}'", project_id)))
    }

    async fn save_project(&self, project_id: &str, project: &Project) -> Result<()> {
        self.check_available()?;
        self.projects
            .write()
            .await
            .insert(project_id.to_string(), project.clone());
        Ok(())
    }
}
