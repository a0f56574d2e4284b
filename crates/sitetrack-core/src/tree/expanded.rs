//! Expand/collapse state of one tree view

use std::collections::HashSet;

use crate::domain::wbs::{NodeId, Project, lookup};

/// Set of expanded node ids
///
/// Owned by a single view session and handed to every flatten call. No
/// ordering guarantee on `expanded_ids`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpandedState {
    expanded: HashSet<NodeId>,
}

impl ExpandedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip a node; returns whether it is now expanded
    pub fn toggle(&mut self, id: &NodeId) -> bool {
        if self.expanded.remove(id) {
            false
        } else {
            self.expanded.insert(id.clone());
            true
        }
    }

    /// Returns true if the node was not expanded before
    pub fn expand(&mut self, id: &NodeId) -> bool {
        if self.expanded.contains(id) {
            return false;
        }
        self.expanded.insert(id.clone())
    }

    /// Returns true if the node was expanded before
    pub fn collapse(&mut self, id: &NodeId) -> bool {
        self.expanded.remove(id)
    }

    pub fn expand_all<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = NodeId>,
    {
        self.expanded.extend(ids);
    }

    pub fn collapse_all(&mut self) {
        self.expanded.clear();
    }

    pub fn is_expanded(&self, id: &NodeId) -> bool {
        self.expanded.contains(id)
    }

    pub fn expanded_ids(&self) -> Vec<NodeId> {
        self.expanded.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.expanded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expanded.is_empty()
    }

    /// Drop ids that no longer resolve in `project`
    ///
    /// Ids of other projects are left alone. Returns how many were dropped.
    pub fn retain_existing(&mut self, project: &Project) -> usize {
        let before = self.expanded.len();
        self.expanded.retain(|id| {
            id.project_id() != project.id || lookup::exists(project, &id.path())
        });
        before - self.expanded.len()
    }
}
