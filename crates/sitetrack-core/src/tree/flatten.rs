//! Tree flattening
//!
//! Depth-first pre-order walk from the project node. Children are only
//! visited when their parent is expanded, so the cost is bounded by the
//! visible part of the tree. With a search term, a second pass marks every
//! ancestor of a match visible and the result is filtered to visible items.

use serde::Serialize;
use tracing::debug;

use super::expanded::ExpandedState;
use crate::domain::wbs::{NodeId, NodeRef, NodeType, Project};

/// One row of the flattened tree
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatItem<'a> {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    /// 0 for the project, 3 for tasks
    pub level: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<NodeId>,
    pub project_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subpackage_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_index: Option<usize>,
    pub has_children: bool,
    pub is_expanded: bool,
    pub is_visible: bool,
    /// The entity this row renders
    pub data: NodeRef<'a>,
}

impl<'a> FlatItem<'a> {
    pub fn name(&self) -> &'a str {
        self.data.name()
    }

    /// Whether clicking this row should expand or collapse it
    pub fn is_expandable(&self) -> bool {
        self.has_children
    }
}

/// Flattening options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlattenOptions {
    /// Match the search term case-sensitively
    pub case_sensitive: bool,
}

impl FlattenOptions {
    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }
}

/// Whether `name` matches `term` (blank terms match everything)
pub fn text_matches(name: &str, term: &str, options: FlattenOptions) -> bool {
    Needle::new(term, options).is_none_or(|needle| needle.matches(name))
}

/// A search term trimmed and case-folded once for repeated matching
#[derive(Debug, Clone)]
struct Needle {
    term: String,
    case_sensitive: bool,
}

impl Needle {
    /// `None` for blank terms
    fn new(term: &str, options: FlattenOptions) -> Option<Self> {
        let term = term.trim();
        if term.is_empty() {
            return None;
        }
        let term = if options.case_sensitive {
            term.to_string()
        } else {
            term.to_lowercase()
        };
        Some(Self {
            term,
            case_sensitive: options.case_sensitive,
        })
    }

    fn matches(&self, name: &str) -> bool {
        if self.case_sensitive {
            name.contains(&self.term)
        } else {
            name.to_lowercase().contains(&self.term)
        }
    }
}

/// Flattens a project against one view's expansion state
#[derive(Debug, Clone, Copy)]
pub struct TreeFlattener<'s> {
    state: &'s ExpandedState,
    options: FlattenOptions,
}

impl<'s> TreeFlattener<'s> {
    pub fn new(state: &'s ExpandedState) -> Self {
        Self {
            state,
            options: FlattenOptions::default(),
        }
    }

    pub fn with_options(mut self, options: FlattenOptions) -> Self {
        self.options = options;
        self
    }

    /// Flatten `project` into display order
    ///
    /// Deterministic: the same state, data and term always give the same
    /// sequence.
    pub fn flatten<'a>(&self, project: &'a Project, search: Option<&str>) -> Vec<FlatItem<'a>> {
        let needle = search.and_then(|term| Needle::new(term, self.options));

        let mut walk = Walk {
            state: self.state,
            needle: needle.as_ref(),
            items: Vec::new(),
            parents: Vec::new(),
        };
        walk.visit(NodeId::project(project.id.as_str()), NodeRef::Project(project), None);

        let Walk {
            mut items, parents, ..
        } = walk;
        let walked = items.len();

        if needle.is_some() {
            // Parents always precede their children, so a reverse sweep
            // carries visibility all the way up.
            for pos in (0..items.len()).rev() {
                if items[pos].is_visible {
                    if let Some(parent) = parents[pos] {
                        items[parent].is_visible = true;
                    }
                }
            }
            items.retain(|item| item.is_visible);
        }

        debug!(
            project_id = %project.id,
            walked = walked,
            visible = items.len(),
            searching = needle.is_some(),
            "Tree flattened"
        );

        items
    }
}

struct Walk<'s, 'a, 'n> {
    state: &'s ExpandedState,
    needle: Option<&'n Needle>,
    items: Vec<FlatItem<'a>>,
    /// Position of each item's parent in `items`
    parents: Vec<Option<usize>>,
}

impl<'a> Walk<'_, 'a, '_> {
    fn matches(&self, name: &str) -> bool {
        self.needle.is_none_or(|needle| needle.matches(name))
    }

    fn visit(&mut self, id: NodeId, node: NodeRef<'a>, parent: Option<usize>) {
        let path = id.path();
        let child_count = node.child_count();
        let is_expanded = self.state.is_expanded(&id);
        let project_id = match node {
            NodeRef::Project(project) => project.id.as_str(),
            _ => match parent {
                Some(pos) => self.items[pos].project_id,
                None => "",
            },
        };

        let pos = self.items.len();
        self.items.push(FlatItem {
            parent_id: id.parent(),
            node_type: path.node_type(),
            level: path.level(),
            project_id,
            package_index: path.package_index(),
            subpackage_index: path.subpackage_index(),
            task_index: path.task_index(),
            has_children: child_count > 0,
            is_expanded,
            is_visible: self.matches(node.name()),
            data: node,
            id,
        });
        self.parents.push(parent);

        if !is_expanded {
            return;
        }
        for index in 0..child_count {
            let child_id = self.items[pos].id.child(index);
            if let (Some(child_id), Some(child)) = (child_id, node.child(index)) {
                self.visit(child_id, child, Some(pos));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::wbs::{NodePath, Package, Subpackage, Task};

    fn site() -> Project {
        Project::with_id("p1", "Site")
            .with_package(
                Package::new("Structure")
                    .with_subpackage(
                        Subpackage::new("Level 1")
                            .with_task(Task::new("Columns"))
                            .with_task(Task::new("Foo slab")),
                    )
                    .with_subpackage(Subpackage::new("Level 2").with_task(Task::new("Beams"))),
            )
            .with_package(
                Package::new("Facade")
                    .with_subpackage(Subpackage::new("Glazing").with_task(Task::new("Panels"))),
            )
    }

    fn expand_everything(project: &Project) -> ExpandedState {
        let mut state = ExpandedState::new();
        let root = NodeId::project(project.id.as_str());
        state.expand(&root);
        for (p, package) in project.packages.iter().enumerate() {
            state.expand(&NodeId::new(project.id.as_str(), NodePath::package(p)));
            for s in 0..package.subpackages.len() {
                state.expand(&NodeId::new(project.id.as_str(), NodePath::subpackage(p, s)));
            }
        }
        state
    }

    fn names<'a>(items: &[FlatItem<'a>]) -> Vec<&'a str> {
        items.iter().map(|i| i.name()).collect()
    }

    #[test]
    fn test_collapsed_project_shows_only_root() {
        let project = site();
        let state = ExpandedState::new();
        let items = TreeFlattener::new(&state).flatten(&project, None);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].node_type, NodeType::Project);
        assert!(items[0].has_children);
        assert!(!items[0].is_expanded);
        assert!(items[0].is_visible);
    }

    #[test]
    fn test_pre_order_with_everything_expanded() {
        let project = site();
        let state = expand_everything(&project);
        let items = TreeFlattener::new(&state).flatten(&project, None);

        assert_eq!(
            names(&items),
            vec![
                "Site", "Structure", "Level 1", "Columns", "Foo slab", "Level 2", "Beams",
                "Facade", "Glazing", "Panels"
            ]
        );
        let levels: Vec<u8> = items.iter().map(|i| i.level).collect();
        assert_eq!(levels, vec![0, 1, 2, 3, 3, 2, 3, 1, 2, 3]);
        assert_eq!(items[4].id.to_string(), "task-p1-0-0-1");
        assert_eq!(items[4].parent_id, Some(items[2].id.clone()));
        assert_eq!(items[4].task_index, Some(1));
        assert_eq!(items[4].project_id, "p1");
        assert!(!items[4].has_children);
    }

    #[test]
    fn test_collapsed_subtree_is_skipped() {
        let project = site();
        let mut state = expand_everything(&project);
        state.collapse(&NodeId::new("p1", NodePath::package(0)));
        let items = TreeFlattener::new(&state).flatten(&project, None);
        assert_eq!(names(&items), vec!["Site", "Structure", "Facade", "Glazing", "Panels"]);
        assert!(!items[1].is_expanded);
    }

    #[test]
    fn test_levels_increase_by_one() {
        let project = site();
        let state = expand_everything(&project);
        let items = TreeFlattener::new(&state).flatten(&project, None);
        for item in &items[1..] {
            let parent = items
                .iter()
                .find(|p| Some(&p.id) == item.parent_id.as_ref())
                .unwrap();
            assert_eq!(item.level, parent.level + 1);
        }
    }

    #[test]
    fn test_search_propagates_to_ancestors() {
        let project = site();
        let state = expand_everything(&project);
        let items = TreeFlattener::new(&state).flatten(&project, Some("foo"));
        assert_eq!(names(&items), vec!["Site", "Structure", "Level 1", "Foo slab"]);
        assert!(items.iter().all(|i| i.is_visible));
    }

    #[test]
    fn test_search_does_not_walk_collapsed_subtrees() {
        let project = site();
        let mut state = ExpandedState::new();
        state.expand(&NodeId::project("p1"));
        let items = TreeFlattener::new(&state).flatten(&project, Some("foo"));
        assert!(items.is_empty());
    }

    #[test]
    fn test_case_sensitive_search() {
        let project = site();
        let state = expand_everything(&project);
        let options = FlattenOptions::default().case_sensitive(true);
        let flattener = TreeFlattener::new(&state).with_options(options);
        assert!(flattener.flatten(&project, Some("foo")).is_empty());
        assert_eq!(flattener.flatten(&project, Some("Foo")).len(), 4);
    }

    #[test]
    fn test_blank_search_is_no_search() {
        let project = site();
        let state = expand_everything(&project);
        let flattener = TreeFlattener::new(&state);
        assert_eq!(
            flattener.flatten(&project, Some("   ")),
            flattener.flatten(&project, None)
        );
    }

    #[test]
    fn test_flatten_is_idempotent() {
        let project = site();
        let state = expand_everything(&project);
        let flattener = TreeFlattener::new(&state);
        assert_eq!(flattener.flatten(&project, None), flattener.flatten(&project, None));
        assert_eq!(
            flattener.flatten(&project, Some("level")),
            flattener.flatten(&project, Some("level"))
        );
    }

    #[test]
    fn test_text_matches() {
        let options = FlattenOptions::default();
        assert!(text_matches("Foo Slab", "slab", options));
        assert!(text_matches("anything", "", options));
        assert!(!text_matches("Foo Slab", "beam", options));
        assert!(!text_matches("Foo Slab", "slab", options.case_sensitive(true)));
    }

    #[test]
    fn test_flatten_and_text_matches_agree() {
        let project = site();
        let state = expand_everything(&project);
        let term = "  SLAB ";
        for options in [FlattenOptions::default(), FlattenOptions::default().case_sensitive(true)] {
            let items = TreeFlattener::new(&state)
                .with_options(options)
                .flatten(&project, Some(term));
            let leaves: Vec<&str> = items
                .iter()
                .filter(|i| i.node_type == NodeType::Task)
                .map(|i| i.name())
                .collect();
            let expected: Vec<&str> = ["Columns", "Foo slab", "Beams", "Panels"]
                .into_iter()
                .filter(|name| text_matches(name, term, options))
                .collect();
            assert_eq!(leaves, expected);
        }
    }

    #[test]
    fn test_flat_item_serializes_in_boundary_shape() {
        let project = site();
        let state = expand_everything(&project);
        let items = TreeFlattener::new(&state).flatten(&project, None);
        let json = serde_json::to_value(&items[3]).unwrap();
        assert_eq!(json["id"], "task-p1-0-0-0");
        assert_eq!(json["type"], "task");
        assert_eq!(json["parentId"], "subpackage-p1-0-0");
        assert_eq!(json["projectId"], "p1");
        assert_eq!(json["subpackageIndex"], 0);
        assert_eq!(json["hasChildren"], false);
        assert_eq!(json["data"]["name"], "Columns");

        let root = serde_json::to_value(&items[0]).unwrap();
        assert!(root.get("parentId").is_none());
        assert!(root.get("packageIndex").is_none());
    }
}
