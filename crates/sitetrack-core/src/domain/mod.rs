//! Domain layer
//!
//! Contains the core business logic and domain models.

pub mod lifecycle;
pub mod progress;
pub mod wbs;
