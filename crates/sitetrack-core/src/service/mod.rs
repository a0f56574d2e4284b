//! Project service layer
//!
//! Wires the pure domain operations to injected collaborators:
//!
//! - **ProjectRepository**: async load/save of whole projects
//! - **IdentityProvider**: who is looking, for affordance decisions only
//! - **ProjectTracker**: mutate-aggregate-save flow over one loaded project

mod collaborators;
mod memory;
mod tracker;

pub use collaborators::{IdentityProvider, ProjectRepository, StaticIdentity};
pub use memory::InMemoryProjectRepository;
pub use tracker::ProjectTracker;
