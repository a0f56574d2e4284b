//! Project repository backed by JSON files
//!
//! Each project lives in `<dir>/<project id>.json`. Saves go through a
//! temporary file and a rename so a crash never leaves half a project on
//! disk.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sitetrack_core::domain::wbs::Project;
use sitetrack_core::service::ProjectRepository;
use sitetrack_core::{Error, Result};
use tokio::fs;
use tracing::debug;

pub struct JsonFileRepository {
    dir: PathBuf,
}

impl JsonFileRepository {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding `project_id`; ids that could escape the directory are refused
    pub fn path_for(&self, project_id: &str) -> Result<PathBuf> {
        let valid = !project_id.is_empty()
            && project_id != "."
            && project_id != ".."
            && !project_id.contains(['/', '\\']);
        if !valid {
            return Err(Error::validation(format!("invalid project id '{}'", project_id)));
        }
        Ok(self.dir.join(format!("{}.json", project_id)))
    }
}

#[async_trait]
impl ProjectRepository for JsonFileRepository {
    async fn load_project(&self, project_id: &str) -> Result<Project> {
        let path = self.path_for(project_id)?;
        let contents = match fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(Error::NotFound(format!(
                    "project '{}' (no file at {})",
                    project_id,
                    path.display()
                )));
            }
            Err(e) => {
                return Err(Error::persistence(format!(
                    "failed to read {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        let project: Project = serde_json::from_str(&contents).map_err(|e| {
            Error::persistence(format!("failed to parse {}: {}", path.display(), e))
        })?;
        if project.id != project_id {
            return Err(Error::persistence(format!(
                "{} holds project '{}', not '{}'",
                path.display(),
                project.id,
                project_id
            )));
        }

        debug!(project_id = %project_id, path = %path.display(), "Project loaded");
        Ok(project)
    }

    async fn save_project(&self, project_id: &str, project: &Project) -> Result<()> {
        let path = self.path_for(project_id)?;
        let contents = serde_json::to_string_pretty(project)
            .map_err(|e| Error::persistence(format!("failed to serialize project: {}", e)))?;

        fs::create_dir_all(&self.dir).await.map_err(|e| {
            Error::persistence(format!("failed to create {}: {}", self.dir.display(), e))
        })?;

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, contents)
            .await
            .map_err(|e| Error::persistence(format!("failed to write {}: {}", tmp.display(), e)))?;
        fs::rename(&tmp, &path).await.map_err(|e| {
            Error::persistence(format!("failed to replace {}: {}", path.display(), e))
        })?;

        debug!(project_id = %project_id, path = %path.display(), "Project saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitetrack_core::domain::wbs::{Package, Subpackage, Task};

    fn project() -> Project {
        Project::with_id("p1", "Site").with_package(
            Package::new("Structure")
                .with_subpackage(Subpackage::new("Level 1").with_task(Task::new("Columns").with_quantities(1, 4))),
        )
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepository::new(dir.path().join("data"));

        repo.save_project("p1", &project()).await.unwrap();
        assert!(dir.path().join("data").join("p1.json").exists());
        assert_eq!(repo.load_project("p1").await.unwrap(), project());
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepository::new(dir.path());
        assert!(matches!(repo.load_project("ghost").await, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_corrupt_or_mismatched_file() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepository::new(dir.path());

        std::fs::write(dir.path().join("bad.json"), "{ not json").unwrap();
        assert!(matches!(repo.load_project("bad").await, Err(Error::Persistence(_))));

        repo.save_project("p2", &project()).await.unwrap();
        assert!(matches!(repo.load_project("p2").await, Err(Error::Persistence(_))));
    }

    #[test]
    fn test_path_for_rejects_escapes() {
        let repo = JsonFileRepository::new("/tmp/sitetrack");
        assert!(repo.path_for("../etc").is_err());
        assert!(repo.path_for("").is_err());
        assert!(repo.path_for("..").is_err());
        assert!(repo.path_for("tower-7").is_ok());
    }
}
