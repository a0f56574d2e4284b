//! WBS Tree Module
//!
//! Turns a project hierarchy into an ordered, addressable list for windowed
//! rendering.
//!
//! # Features
//!
//! - **Flattening**: Depth-first pre-order walk that only descends into expanded nodes
//! - **Search**: Substring matching with ancestor-visibility propagation
//! - **Expansion State**: Per-view set of expanded node ids, passed explicitly
//! - **Batch Operations**: Expand to a level, bounded breadth-first expansion, stats
//! - **Text Rendering**: Unicode or ASCII outlines for CLI display
//!
//! # Example
//!
//! ```ignore
//! use sitetrack_core::tree::{ExpandedState, TreeFlattener, TreeView};
//!
//! let mut view = TreeView::new();
//! view.expand_to_level(&project, 2);
//! view.set_search(Some("slab".into()));
//!
//! let window = view.window(&project, 0, 50);
//! for item in &window.items {
//!     println!("{} {}", item.id, item.data.name());
//! }
//! ```

mod batch;
mod expanded;
mod flatten;
mod text;
mod view;

pub use batch::{TreeBatchOperations, TreeStats};
pub use expanded::ExpandedState;
pub use flatten::{FlatItem, FlattenOptions, TreeFlattener, text_matches};
pub use text::{NodeStyle, RenderOptions, StatusIcon, TextTreeRenderer};
pub use view::{ClickOutcome, RenderWindow, TreeRenderer, TreeView};
