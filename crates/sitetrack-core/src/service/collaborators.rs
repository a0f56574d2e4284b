//! Collaborator traits injected into the tracker

use async_trait::async_trait;

use crate::domain::wbs::Project;
use crate::error::Result;

/// Repository trait for project persistence
///
/// The core never talks to a store directly. Implementations report store
/// failures as `Error::Persistence` and unknown ids as `Error::NotFound`.
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// Load a whole project
    async fn load_project(&self, project_id: &str) -> Result<Project>;

    /// Persist a whole project, replacing the stored value
    async fn save_project(&self, project_id: &str, project: &Project) -> Result<()>;
}

/// Source of the current user's id
pub trait IdentityProvider: Send + Sync {
    /// `None` when nobody is signed in
    fn current_user_id(&self) -> Option<String>;
}

/// Identity fixed at construction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticIdentity(Option<String>);

impl StaticIdentity {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self(Some(user_id.into()))
    }

    pub fn anonymous() -> Self {
        Self(None)
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_user_id(&self) -> Option<String> {
        self.0.clone()
    }
}
