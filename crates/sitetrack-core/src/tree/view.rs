//! One tree view session
//!
//! `TreeView` owns the expansion state, search term and selection of a single
//! view and hands out freshly flattened items on every call. Nothing is
//! cached between calls, so a mutated project is always rendered from its
//! newest values.

use serde::Serialize;
use tracing::debug;

use super::batch::{TreeBatchOperations, TreeStats};
use super::expanded::ExpandedState;
use super::flatten::{FlatItem, FlattenOptions, TreeFlattener};
use crate::config::TreeConfig;
use crate::domain::wbs::{NodeId, Project, lookup};

/// A slice of the flattened tree for windowed rendering
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderWindow<'a> {
    /// Position of the first item in the full sequence
    pub offset: usize,
    /// Length of the full sequence
    pub total: usize,
    pub items: Vec<FlatItem<'a>>,
}

impl RenderWindow<'_> {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether items follow this window
    pub fn has_more(&self) -> bool {
        self.offset + self.items.len() < self.total
    }
}

/// Rendering collaborator
///
/// Implementations draw a window however they like (terminal, widget,
/// JSON); they never see the project or the expansion state directly.
pub trait TreeRenderer {
    fn render(&mut self, window: &RenderWindow<'_>);
}

/// Result of a click on a row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// The row had children and was expanded or collapsed
    Toggled { id: NodeId, expanded: bool },
    /// The row is a leaf and is now selected
    Selected(NodeId),
}

#[derive(Debug, Clone, Default)]
pub struct TreeView {
    expanded: ExpandedState,
    search: Option<String>,
    options: FlattenOptions,
    selected: Option<NodeId>,
}

impl TreeView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &TreeConfig) -> Self {
        Self {
            options: FlattenOptions::default().case_sensitive(config.case_sensitive_search),
            ..Self::default()
        }
    }

    pub fn with_options(mut self, options: FlattenOptions) -> Self {
        self.options = options;
        self
    }

    pub fn expanded(&self) -> &ExpandedState {
        &self.expanded
    }

    pub fn expanded_mut(&mut self) -> &mut ExpandedState {
        &mut self.expanded
    }

    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    /// Set or clear the search term (blank terms clear it)
    pub fn set_search(&mut self, term: Option<String>) {
        self.search = term.filter(|t| !t.trim().is_empty());
    }

    pub fn selected(&self) -> Option<&NodeId> {
        self.selected.as_ref()
    }

    /// Flatten `project` with the current state and search term
    pub fn items<'a>(&self, project: &'a Project) -> Vec<FlatItem<'a>> {
        TreeFlattener::new(&self.expanded)
            .with_options(self.options)
            .flatten(project, self.search.as_deref())
    }

    /// At most `len` items starting at `offset`
    pub fn window<'a>(&self, project: &'a Project, offset: usize, len: usize) -> RenderWindow<'a> {
        let items = self.items(project);
        let total = items.len();
        let offset = offset.min(total);
        RenderWindow {
            offset,
            total,
            items: items.into_iter().skip(offset).take(len).collect(),
        }
    }

    pub fn render_to<R>(&self, project: &Project, renderer: &mut R, offset: usize, len: usize)
    where
        R: TreeRenderer + ?Sized,
    {
        renderer.render(&self.window(project, offset, len));
    }

    /// Returns whether the node is now expanded
    pub fn toggle_expand(&mut self, id: &NodeId) -> bool {
        let expanded = self.expanded.toggle(id);
        debug!(node = %id, expanded = expanded, "Toggled node");
        expanded
    }

    /// Expandable rows toggle, leaves become the selection
    pub fn on_item_click(&mut self, item: &FlatItem<'_>) -> ClickOutcome {
        if item.is_expandable() {
            let expanded = self.toggle_expand(&item.id);
            ClickOutcome::Toggled {
                id: item.id.clone(),
                expanded,
            }
        } else {
            self.selected = Some(item.id.clone());
            ClickOutcome::Selected(item.id.clone())
        }
    }

    /// Expand every node above `max_level`, however deep it currently sits
    /// behind collapsed ancestors
    pub fn expand_to_level(&mut self, project: &Project, max_level: u8) -> usize {
        self.until_settled(project, |state, items| {
            TreeBatchOperations::expand_to_level(state, items, max_level)
        })
    }

    /// Bounded breadth-first expansion across the whole project
    pub fn smart_expand(&mut self, project: &Project, max_nodes: usize) -> usize {
        self.until_settled(project, |state, items| {
            TreeBatchOperations::smart_expand(state, items, max_nodes)
        })
    }

    /// Expand the ancestors of all matches of the current search term
    pub fn reveal_search(&mut self, project: &Project) -> usize {
        match self.search.as_deref() {
            Some(term) => {
                TreeBatchOperations::reveal_matches(&mut self.expanded, project, term, self.options)
            }
            None => 0,
        }
    }

    pub fn collapse_all(&mut self) {
        self.expanded.collapse_all();
    }

    /// Forget expanded ids and the selection once they no longer resolve
    pub fn retain_existing(&mut self, project: &Project) -> usize {
        if let Some(selected) = &self.selected {
            if selected.project_id() == project.id
                && !lookup::exists(project, &selected.path())
            {
                self.selected = None;
            }
        }
        self.expanded.retain_existing(project)
    }

    pub fn stats(&self, project: &Project) -> TreeStats {
        TreeBatchOperations::calculate_stats(&self.items(project))
    }

    // Batch operations only see the flattened items, so each newly expanded
    // level needs another pass. The tree is four levels deep.
    fn until_settled<F>(&mut self, project: &Project, mut op: F) -> usize
    where
        F: FnMut(&mut ExpandedState, &[FlatItem<'_>]) -> usize,
    {
        let mut total = 0;
        loop {
            let items = TreeFlattener::new(&self.expanded).flatten(project, None);
            let newly = op(&mut self.expanded, &items);
            if newly == 0 {
                break;
            }
            total += newly;
        }
        total
    }
}
