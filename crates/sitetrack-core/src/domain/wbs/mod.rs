//! Work Breakdown Structure
//!
//! The four-level containment hierarchy a construction project is tracked
//! through: Project → Package → Subpackage → Task.
//!
//! Entities are plain value records. Components that change them (the
//! lifecycle machine, the distributor, the aggregator) take a project and
//! hand back a new one.

pub mod entity;
pub mod lookup;
pub mod path;

pub use entity::{Package, Project, Subpackage, Task};
pub use lookup::{NodeRef, find_package, find_subpackage, find_task, resolve};
pub use path::{NodeId, NodePath, NodeType};
