//! Sitetrack Core Library
//!
//! This crate provides the core functionality for Sitetrack, including:
//! - WBS entities (Project → Package → Subpackage → Task) and path lookup
//! - Quantity roll-up aggregation and distribution strategies
//! - The task lifecycle state machine
//! - Tree flattening with expand/collapse state and search visibility
//! - Collaborator traits for persistence and identity, plus the project tracker
//! - Configuration

pub mod config;
pub mod domain;
pub mod error;
pub mod service;
pub mod tree;

pub use error::{Error, Result};

#[cfg(test)]
mod config_tests;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::domain::lifecycle::{LifecycleEvent, TaskLifecycle, TaskStatus};
    pub use crate::domain::progress::{
        Allocation, DistributionRequest, DistributionStrategy, QuantityAggregator,
        QuantityDistributor,
    };
    pub use crate::domain::wbs::{NodeId, NodePath, NodeType, Package, Project, Subpackage, Task};
    pub use crate::error::{Error, Result};
    pub use crate::service::{IdentityProvider, ProjectRepository, ProjectTracker};
    pub use crate::tree::{ExpandedState, FlatItem, TreeBatchOperations, TreeFlattener, TreeView};
}
