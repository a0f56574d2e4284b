//! Lookup of entities by position
//!
//! Every accessor returns a `Result`, so a dangling path is a first-class
//! `NotFound` rather than something that surfaces later during rendering.

use serde::Serialize;

use super::entity::{Package, Project, Subpackage, Task};
use super::path::{NodePath, NodeType};
use crate::error::{Error, Result};

/// Borrowed reference to any entity in the hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum NodeRef<'a> {
    Project(&'a Project),
    Package(&'a Package),
    Subpackage(&'a Subpackage),
    Task(&'a Task),
}

impl<'a> NodeRef<'a> {
    pub fn name(&self) -> &'a str {
        match self {
            Self::Project(p) => &p.name,
            Self::Package(p) => &p.name,
            Self::Subpackage(s) => &s.name,
            Self::Task(t) => &t.name,
        }
    }

    pub fn node_type(&self) -> NodeType {
        match self {
            Self::Project(_) => NodeType::Project,
            Self::Package(_) => NodeType::Package,
            Self::Subpackage(_) => NodeType::Subpackage,
            Self::Task(_) => NodeType::Task,
        }
    }

    /// Number of direct children
    pub fn child_count(&self) -> usize {
        match self {
            Self::Project(p) => p.packages.len(),
            Self::Package(p) => p.subpackages.len(),
            Self::Subpackage(s) => s.tasks.len(),
            Self::Task(_) => 0,
        }
    }

    /// The `index`-th direct child
    pub fn child(&self, index: usize) -> Option<NodeRef<'a>> {
        match self {
            Self::Project(p) => p.packages.get(index).map(NodeRef::Package),
            Self::Package(p) => p.subpackages.get(index).map(NodeRef::Subpackage),
            Self::Subpackage(s) => s.tasks.get(index).map(NodeRef::Task),
            Self::Task(_) => None,
        }
    }

    /// `(completed, total, progress)` of the referenced entity
    pub fn quantities(&self) -> (i64, i64, u8) {
        match self {
            Self::Project(p) => (p.completed, p.total, p.progress),
            Self::Package(p) => (p.completed, p.total, p.progress),
            Self::Subpackage(s) => (s.completed, s.total, s.progress),
            Self::Task(t) => (t.completed, t.total, t.progress),
        }
    }

    pub fn as_task(&self) -> Option<&'a Task> {
        match self {
            Self::Task(t) => Some(t),
            _ => None,
        }
    }
}

pub fn find_package(project: &Project, package: usize) -> Result<&Package> {
    project.packages.get(package).ok_or_else(|| {
        Error::NotFound(format!("package {} in project '{}'", package, project.id))
    })
}

pub fn find_subpackage(project: &Project, package: usize, subpackage: usize) -> Result<&Subpackage> {
    find_package(project, package)?
        .subpackages
        .get(subpackage)
        .ok_or_else(|| {
            Error::NotFound(format!(
                "subpackage {}.{} in project '{}'",
                package, subpackage, project.id
            ))
        })
}

pub fn find_task(project: &Project, package: usize, subpackage: usize, task: usize) -> Result<&Task> {
    find_subpackage(project, package, subpackage)?
        .tasks
        .get(task)
        .ok_or_else(|| {
            Error::NotFound(format!(
                "task {}.{}.{} in project '{}'",
                package, subpackage, task, project.id
            ))
        })
}

/// Resolve any path to a borrowed entity
pub fn resolve<'a>(project: &'a Project, path: &NodePath) -> Result<NodeRef<'a>> {
    match *path {
        NodePath::Project => Ok(NodeRef::Project(project)),
        NodePath::Package { package } => find_package(project, package).map(NodeRef::Package),
        NodePath::Subpackage {
            package,
            subpackage,
        } => find_subpackage(project, package, subpackage).map(NodeRef::Subpackage),
        NodePath::Task {
            package,
            subpackage,
            task,
        } => find_task(project, package, subpackage, task).map(NodeRef::Task),
    }
}

/// Whether a path resolves inside the project
pub fn exists(project: &Project, path: &NodePath) -> bool {
    resolve(project, path).is_ok()
}

/// Require that a path addresses a task, returning its indices
pub fn task_indices(path: &NodePath) -> Result<(usize, usize, usize)> {
    match *path {
        NodePath::Task {
            package,
            subpackage,
            task,
        } => Ok((package, subpackage, task)),
        other => Err(Error::validation(format!(
            "expected a task path, got a {} path '{}'",
            other.node_type(),
            other.dotted()
        ))),
    }
}

pub(crate) fn find_task_mut<'a>(project: &'a mut Project, path: &NodePath) -> Result<&'a mut Task> {
    let (p, s, t) = task_indices(path)?;
    let project_id = project.id.clone();
    project
        .packages
        .get_mut(p)
        .and_then(|pkg| pkg.subpackages.get_mut(s))
        .and_then(|sub| sub.tasks.get_mut(t))
        .ok_or_else(|| {
            Error::NotFound(format!("task {}.{}.{} in project '{}'", p, s, t, project_id))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Project {
        Project::with_id("p1", "Site").with_package(
            Package::new("Structure").with_subpackage(
                Subpackage::new("Level 1")
                    .with_task(Task::new("Columns").with_quantities(2, 4))
                    .with_task(Task::new("Slab")),
            ),
        )
    }

    #[test]
    fn test_find_task() {
        let project = sample();
        let task = find_task(&project, 0, 0, 1).unwrap();
        assert_eq!(task.name, "Slab");
    }

    #[test]
    fn test_missing_entities_are_not_found() {
        let project = sample();
        assert!(matches!(find_package(&project, 3), Err(Error::NotFound(_))));
        assert!(matches!(find_subpackage(&project, 0, 9), Err(Error::NotFound(_))));
        let err = find_task(&project, 0, 0, 2).unwrap_err();
        assert!(err.to_string().contains("0.0.2"));
    }

    #[test]
    fn test_resolve_every_level() {
        let project = sample();
        assert_eq!(resolve(&project, &NodePath::Project).unwrap().name(), "Site");
        assert_eq!(resolve(&project, &NodePath::package(0)).unwrap().child_count(), 1);
        let sub = resolve(&project, &NodePath::subpackage(0, 0)).unwrap();
        assert_eq!(sub.node_type(), NodeType::Subpackage);
        assert_eq!(sub.child_count(), 2);
        let task = resolve(&project, &NodePath::task(0, 0, 0)).unwrap();
        assert_eq!(task.quantities(), (2, 4, 50));
        assert!(task.as_task().is_some());
        assert!(!exists(&project, &NodePath::task(1, 0, 0)));
    }

    #[test]
    fn test_task_indices_requires_task() {
        assert_eq!(task_indices(&NodePath::task(1, 2, 3)).unwrap(), (1, 2, 3));
        assert!(matches!(
            task_indices(&NodePath::package(1)),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_find_task_mut() {
        let mut project = sample();
        find_task_mut(&mut project, &NodePath::task(0, 0, 1)).unwrap().name = "Roof slab".into();
        assert_eq!(project.packages[0].subpackages[0].tasks[1].name, "Roof slab");
        assert!(find_task_mut(&mut project, &NodePath::task(0, 1, 0)).is_err());
    }
}
