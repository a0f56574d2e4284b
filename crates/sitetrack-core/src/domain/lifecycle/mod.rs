//! Task Lifecycle Domain
//!
//! The finite-state machine that governs one task's assignment, progress
//! submission and review:
//!
//! ```text
//! draft ──assign──▶ in-progress ──submit──▶ submitted ──review──▶ approved
//!                        ▲                      │
//!                        │                      └──review(reject)──▶ rejected
//!                        └──────────────(resubmit)──────────────────────┘
//! ```
//!
//! Submitting `completed == total` approves the task immediately.

pub mod affordance;
pub mod event;
pub mod machine;
pub mod status;

pub use affordance::TaskAffordances;
pub use event::{LifecycleEvent, LifecycleEventKind};
pub use machine::TaskLifecycle;
pub use status::TaskStatus;
