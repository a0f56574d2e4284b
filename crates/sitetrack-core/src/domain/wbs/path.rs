//! Structured node identifiers
//!
//! A node is addressed by its project id plus its positional path
//! (`NodePath`). The string forms `project-{p}`, `package-{p}-{i}`,
//! `subpackage-{p}-{i}-{j}` and `task-{p}-{i}-{j}-{k}` exist only at the
//! serialization boundary.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};

/// Level of a node in the hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Project,
    Package,
    Subpackage,
    Task,
}

impl NodeType {
    /// Depth of this node type (project = 0)
    pub fn level(&self) -> u8 {
        match self {
            Self::Project => 0,
            Self::Package => 1,
            Self::Subpackage => 2,
            Self::Task => 3,
        }
    }

    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Package => "package",
            Self::Subpackage => "subpackage",
            Self::Task => "task",
        }
    }

    /// Number of positional indices a path of this type carries
    fn index_count(&self) -> usize {
        self.level() as usize
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for NodeType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "project" => Ok(Self::Project),
            "package" => Ok(Self::Package),
            "subpackage" => Ok(Self::Subpackage),
            "task" => Ok(Self::Task),
            other => Err(Error::validation(format!("unknown node type '{}'", other))),
        }
    }
}

/// Positional path of a node inside one project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodePath {
    Project,
    Package {
        package: usize,
    },
    Subpackage {
        package: usize,
        subpackage: usize,
    },
    Task {
        package: usize,
        subpackage: usize,
        task: usize,
    },
}

impl NodePath {
    pub fn package(package: usize) -> Self {
        Self::Package { package }
    }

    pub fn subpackage(package: usize, subpackage: usize) -> Self {
        Self::Subpackage {
            package,
            subpackage,
        }
    }

    pub fn task(package: usize, subpackage: usize, task: usize) -> Self {
        Self::Task {
            package,
            subpackage,
            task,
        }
    }

    /// Build a path from its indices (empty slice = project)
    pub fn from_indices(indices: &[usize]) -> Option<Self> {
        match *indices {
            [] => Some(Self::Project),
            [p] => Some(Self::package(p)),
            [p, s] => Some(Self::subpackage(p, s)),
            [p, s, t] => Some(Self::task(p, s, t)),
            _ => None,
        }
    }

    /// Parse the dotted form used on the command line (`0`, `0.1`, `0.1.2`)
    pub fn parse_dotted(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(Self::Project);
        }
        let indices = s
            .split('.')
            .map(|part| {
                part.parse::<usize>()
                    .map_err(|_| Error::validation(format!("invalid path segment '{}' in '{}'", part, s)))
            })
            .collect::<Result<Vec<_>>>()?;
        Self::from_indices(&indices)
            .ok_or_else(|| Error::validation(format!("path '{}' is deeper than a task", s)))
    }

    /// Dotted form (`0.1.2`); the project path is the empty string
    pub fn dotted(&self) -> String {
        self.indices()
            .iter()
            .map(|i| i.to_string())
            .collect::<Vec<_>>()
            .join(".")
    }

    pub fn node_type(&self) -> NodeType {
        match self {
            Self::Project => NodeType::Project,
            Self::Package { .. } => NodeType::Package,
            Self::Subpackage { .. } => NodeType::Subpackage,
            Self::Task { .. } => NodeType::Task,
        }
    }

    pub fn level(&self) -> u8 {
        self.node_type().level()
    }

    /// Positional indices from the root down
    pub fn indices(&self) -> Vec<usize> {
        match *self {
            Self::Project => vec![],
            Self::Package { package } => vec![package],
            Self::Subpackage {
                package,
                subpackage,
            } => vec![package, subpackage],
            Self::Task {
                package,
                subpackage,
                task,
            } => vec![package, subpackage, task],
        }
    }

    /// Get the parent path (None for the project)
    pub fn parent(&self) -> Option<Self> {
        match *self {
            Self::Project => None,
            Self::Package { .. } => Some(Self::Project),
            Self::Subpackage { package, .. } => Some(Self::package(package)),
            Self::Task {
                package,
                subpackage,
                ..
            } => Some(Self::subpackage(package, subpackage)),
        }
    }

    /// Path of the `index`-th child (None below a task)
    pub fn child(&self, index: usize) -> Option<Self> {
        match *self {
            Self::Project => Some(Self::package(index)),
            Self::Package { package } => Some(Self::subpackage(package, index)),
            Self::Subpackage {
                package,
                subpackage,
            } => Some(Self::task(package, subpackage, index)),
            Self::Task { .. } => None,
        }
    }

    pub fn package_index(&self) -> Option<usize> {
        match *self {
            Self::Project => None,
            Self::Package { package }
            | Self::Subpackage { package, .. }
            | Self::Task { package, .. } => Some(package),
        }
    }

    pub fn subpackage_index(&self) -> Option<usize> {
        match *self {
            Self::Subpackage { subpackage, .. } | Self::Task { subpackage, .. } => {
                Some(subpackage)
            }
            _ => None,
        }
    }

    pub fn task_index(&self) -> Option<usize> {
        match *self {
            Self::Task { task, .. } => Some(task),
            _ => None,
        }
    }
}

/// Identity of a node across projects: project id plus positional path
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    project_id: String,
    path: NodePath,
}

impl NodeId {
    pub fn new(project_id: impl Into<String>, path: NodePath) -> Self {
        Self {
            project_id: project_id.into(),
            path,
        }
    }

    /// Id of the project root node
    pub fn project(project_id: impl Into<String>) -> Self {
        Self::new(project_id, NodePath::Project)
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn path(&self) -> NodePath {
        self.path
    }

    pub fn node_type(&self) -> NodeType {
        self.path.node_type()
    }

    /// Id of the parent node (None for the project)
    pub fn parent(&self) -> Option<Self> {
        self.path.parent().map(|path| Self {
            project_id: self.project_id.clone(),
            path,
        })
    }

    /// Id of the `index`-th child (None below a task)
    pub fn child(&self, index: usize) -> Option<Self> {
        self.path.child(index).map(|path| Self {
            project_id: self.project_id.clone(),
            path,
        })
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.path.node_type(), self.project_id)?;
        for index in self.path.indices() {
            write!(f, "-{}", index)?;
        }
        Ok(())
    }
}

impl FromStr for NodeId {
    type Err = Error;

    /// Indices are read from the right so project ids containing `-` survive
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::validation(format!("invalid node id '{}'", s));

        let (kind, rest) = s.split_once('-').ok_or_else(invalid)?;
        let node_type: NodeType = kind.parse()?;
        let count = node_type.index_count();

        let mut parts: Vec<&str> = rest.rsplitn(count + 1, '-').collect();
        if parts.len() != count + 1 {
            return Err(invalid());
        }
        let project_id = parts.pop().ok_or_else(invalid)?;
        if project_id.is_empty() {
            return Err(invalid());
        }

        let indices = parts
            .iter()
            .rev()
            .map(|p| p.parse::<usize>().map_err(|_| invalid()))
            .collect::<Result<Vec<_>>>()?;
        let path = NodePath::from_indices(&indices).ok_or_else(invalid)?;

        Ok(Self::new(project_id, path))
    }
}

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
