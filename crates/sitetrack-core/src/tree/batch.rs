//! Bulk expansion and statistics over flattened items

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use super::expanded::ExpandedState;
use super::flatten::{FlatItem, FlattenOptions, text_matches};
use crate::domain::wbs::{NodeId, NodeRef, NodeType, Project};

/// Counts for UI badges
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeStats {
    pub total: usize,
    pub by_type: BTreeMap<NodeType, usize>,
    pub by_level: BTreeMap<u8, usize>,
    pub expanded: usize,
}

impl TreeStats {
    pub fn count(&self, node_type: NodeType) -> usize {
        self.by_type.get(&node_type).copied().unwrap_or(0)
    }
}

/// Batch operations on an `ExpandedState`
///
/// The item-based operations only see what the caller flattened; nodes
/// inside still-collapsed subtrees are untouched until the next pass.
pub struct TreeBatchOperations;

impl TreeBatchOperations {
    /// Expand every item above `max_level` that has children
    ///
    /// Returns the number of nodes newly expanded.
    pub fn expand_to_level(state: &mut ExpandedState, items: &[FlatItem<'_>], max_level: u8) -> usize {
        let expanded = items
            .iter()
            .filter(|item| item.level < max_level && item.has_children)
            .filter(|item| state.expand(&item.id))
            .count();
        debug!(max_level = max_level, expanded = expanded, "Expanded to level");
        expanded
    }

    /// Expand breadth-first by level until `max_nodes` nodes are expanded
    ///
    /// Nodes already expanded use up budget too, so repeated calls converge
    /// instead of growing the tree without bound. Returns the number of nodes
    /// newly expanded.
    pub fn smart_expand(state: &mut ExpandedState, items: &[FlatItem<'_>], max_nodes: usize) -> usize {
        let mut candidates: Vec<&FlatItem<'_>> =
            items.iter().filter(|item| item.has_children).collect();
        // Stable, so siblings keep their display order within a level
        candidates.sort_by_key(|item| item.level);

        let mut budget = max_nodes;
        let mut newly = 0;
        for item in candidates {
            if budget == 0 {
                break;
            }
            budget -= 1;
            if state.expand(&item.id) {
                newly += 1;
            }
        }

        debug!(max_nodes = max_nodes, expanded = newly, "Smart expand");
        newly
    }

    pub fn calculate_stats(items: &[FlatItem<'_>]) -> TreeStats {
        let mut stats = TreeStats {
            total: items.len(),
            ..Default::default()
        };
        for item in items {
            *stats.by_type.entry(item.node_type).or_default() += 1;
            *stats.by_level.entry(item.level).or_default() += 1;
            if item.is_expanded {
                stats.expanded += 1;
            }
        }
        stats
    }

    /// Expand the ancestors of every node in `project` whose name matches
    /// `term`, including matches inside collapsed subtrees
    ///
    /// A blank term reveals nothing. Returns the number of nodes newly
    /// expanded.
    pub fn reveal_matches(
        state: &mut ExpandedState,
        project: &Project,
        term: &str,
        options: FlattenOptions,
    ) -> usize {
        if term.trim().is_empty() {
            return 0;
        }

        let mut matched = Vec::new();
        collect_matches(
            NodeId::project(project.id.as_str()),
            NodeRef::Project(project),
            term,
            options,
            &mut matched,
        );

        let mut newly = 0;
        for id in &matched {
            let mut ancestor = id.parent();
            while let Some(current) = ancestor {
                if state.expand(&current) {
                    newly += 1;
                }
                ancestor = current.parent();
            }
        }

        debug!(
            project_id = %project.id,
            matches = matched.len(),
            expanded = newly,
            "Revealed search matches"
        );
        newly
    }
}

fn collect_matches(
    id: NodeId,
    node: NodeRef<'_>,
    term: &str,
    options: FlattenOptions,
    matched: &mut Vec<NodeId>,
) {
    for index in 0..node.child_count() {
        if let (Some(child_id), Some(child)) = (id.child(index), node.child(index)) {
            collect_matches(child_id, child, term, options, matched);
        }
    }
    if text_matches(node.name(), term, options) {
        matched.push(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::wbs::{NodePath, Package, Subpackage, Task};
    use crate::tree::TreeFlattener;

    fn wide() -> Project {
        let mut project = Project::with_id("p1", "Site");
        for p in 0..3 {
            let mut package = Package::new(format!("Package {p}"));
            for s in 0..2 {
                package = package.with_subpackage(
                    Subpackage::new(format!("Sub {p}.{s}")).with_task(Task::new(format!("Task {p}.{s}"))),
                );
            }
            project = project.with_package(package);
        }
        project
    }

    #[test]
    fn test_expand_to_level_one_pass() {
        let project = wide();
        let mut state = ExpandedState::new();
        let items = TreeFlattener::new(&state).flatten(&project, None);
        assert_eq!(TreeBatchOperations::expand_to_level(&mut state, &items, 2), 1);
        assert!(state.is_expanded(&NodeId::project("p1")));

        let items = TreeFlattener::new(&state).flatten(&project, None);
        assert_eq!(TreeBatchOperations::expand_to_level(&mut state, &items, 2), 3);
        assert_eq!(TreeBatchOperations::expand_to_level(&mut state, &items, 2), 0);

        let items = TreeFlattener::new(&state).flatten(&project, None);
        assert_eq!(items.len(), 1 + 3 + 6);
        assert!(items.iter().filter(|i| i.level == 2).all(|i| !i.is_expanded));
    }

    #[test]
    fn test_expand_to_level_zero_is_noop() {
        let project = wide();
        let mut state = ExpandedState::new();
        let items = TreeFlattener::new(&state).flatten(&project, None);
        assert_eq!(TreeBatchOperations::expand_to_level(&mut state, &items, 0), 0);
        assert!(state.is_empty());
    }

    #[test]
    fn test_smart_expand_is_bounded_and_breadth_first() {
        let project = wide();
        let mut state = ExpandedState::new();
        state.expand(&NodeId::project("p1"));
        state.expand(&NodeId::new("p1", NodePath::package(2)));
        let items = TreeFlattener::new(&state).flatten(&project, None);

        // project (already), package 0, package 1 => budget of 3 spent
        let newly = TreeBatchOperations::smart_expand(&mut state, &items, 3);
        assert_eq!(newly, 2);
        assert!(state.is_expanded(&NodeId::new("p1", NodePath::package(0))));
        assert!(state.is_expanded(&NodeId::new("p1", NodePath::package(1))));
        assert!(!state.is_expanded(&NodeId::new("p1", NodePath::subpackage(2, 0))));
        assert_eq!(state.len(), 4);
    }

    #[test]
    fn test_smart_expand_zero_budget() {
        let project = wide();
        let mut state = ExpandedState::new();
        let items = TreeFlattener::new(&state).flatten(&project, None);
        assert_eq!(TreeBatchOperations::smart_expand(&mut state, &items, 0), 0);
    }

    #[test]
    fn test_calculate_stats() {
        let project = wide();
        let mut state = ExpandedState::new();
        state.expand(&NodeId::project("p1"));
        state.expand(&NodeId::new("p1", NodePath::package(0)));
        let items = TreeFlattener::new(&state).flatten(&project, None);

        let stats = TreeBatchOperations::calculate_stats(&items);
        assert_eq!(stats.total, 6);
        assert_eq!(stats.count(NodeType::Package), 3);
        assert_eq!(stats.count(NodeType::Subpackage), 2);
        assert_eq!(stats.count(NodeType::Task), 0);
        assert_eq!(stats.by_level.get(&0), Some(&1));
        assert_eq!(stats.expanded, 2);

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["byType"]["package"], 3);
        assert_eq!(json["byLevel"]["2"], 2);
    }

    #[test]
    fn test_reveal_matches_expands_collapsed_ancestors() {
        let project = wide();
        let mut state = ExpandedState::new();
        let newly = TreeBatchOperations::reveal_matches(&mut state, &project, "task 1.1", FlattenOptions::default());
        assert_eq!(newly, 3);

        let items = TreeFlattener::new(&state).flatten(&project, Some("task 1.1"));
        let names: Vec<_> = items.iter().map(|i| i.name()).collect();
        assert_eq!(names, vec!["Site", "Package 1", "Sub 1.1", "Task 1.1"]);
    }

    #[test]
    fn test_reveal_matches_blank_term() {
        let project = wide();
        let mut state = ExpandedState::new();
        assert_eq!(
            TreeBatchOperations::reveal_matches(&mut state, &project, "  ", FlattenOptions::default()),
            0
        );
        assert!(state.is_empty());
    }
}
