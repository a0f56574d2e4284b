//! Sitetrack Core Integration Tests

use std::collections::BTreeSet;
use std::sync::Arc;

use sitetrack_core::{
    Error,
    config::Config,
    domain::lifecycle::TaskStatus,
    domain::progress::{Allocation, DistributionStrategy, QuantityAggregator},
    domain::wbs::{NodeId, NodePath, NodeType, Package, Project, Subpackage, Task},
    service::{InMemoryProjectRepository, ProjectRepository, ProjectTracker, StaticIdentity},
    tree::{TextTreeRenderer, TreeBatchOperations, TreeView},
};

fn tower() -> Project {
    Project::with_id("tower-7", "Tower 7")
        .with_package(
            Package::new("Structure")
                .with_subpackage(
                    Subpackage::new("Level 1")
                        .with_task(Task::new("Columns").with_quantities(0, 10))
                        .with_task(Task::new("Foo slab").with_quantities(4, 20)),
                )
                .with_subpackage(
                    Subpackage::new("Level 2").with_task(Task::new("Beams").with_quantities(1, 5)),
                ),
        )
        .with_package(
            Package::new("Facade")
                .with_subpackage(Subpackage::new("Glazing").with_task(Task::new("Panels"))),
        )
}

async fn open() -> ProjectTracker<InMemoryProjectRepository> {
    let repo = Arc::new(InMemoryProjectRepository::new().with_project(tower()));
    ProjectTracker::open(repo, "tower-7").await.unwrap()
}

fn users(ids: &[&str]) -> BTreeSet<String> {
    ids.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_task_lifecycle_updates_tree_quantities() {
    let mut tracker = open().await;
    let columns = NodePath::task(0, 0, 0);

    let mut view = TreeView::new();
    view.expand_to_level(tracker.project(), 3);
    let before = view.items(tracker.project());
    let level_1 = before.iter().find(|i| i.name() == "Level 1").unwrap();
    assert_eq!(level_1.data.quantities(), (4, 30, 13));

    tracker.assign(&columns, users(&["alice"]), users(&[])).await.unwrap();
    let task = tracker.submit_progress(&columns, 10, 10).await.unwrap();
    assert_eq!(task.status, TaskStatus::Approved);
    assert!(task.approved_at.is_some());

    let after = view.items(tracker.project());
    let level_1 = after.iter().find(|i| i.name() == "Level 1").unwrap();
    assert_eq!(level_1.data.quantities(), (14, 30, 47));
    assert_eq!(after[0].data.quantities(), (15, 35, 43));
}

#[tokio::test]
async fn test_review_cycle_with_rejection() {
    let mut tracker = open().await;
    let slab = NodePath::task(0, 0, 1);
    tracker.assign(&slab, users(&["alice"]), users(&["bob"])).await.unwrap();

    tracker.submit_progress(&slab, 8, 20).await.unwrap();
    let err = tracker.review(&slab, false, Some("  ".into())).await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    let task = tracker
        .review(&slab, false, Some("Photos missing".into()))
        .await
        .unwrap();
    assert_eq!(task.status, TaskStatus::Rejected);
    assert_eq!(task.review_comment.as_deref(), Some("Photos missing"));

    let alice = tracker.affordances(&slab, &StaticIdentity::new("alice")).unwrap();
    assert!(alice.can_submit);

    tracker.submit_progress(&slab, 12, 20).await.unwrap();
    let task = tracker.review(&slab, true, None).await.unwrap();
    assert_eq!(task.status, TaskStatus::Approved);
    assert_eq!(task.review_comment, None);

    let err = tracker.review(&slab, true, None).await.unwrap_err();
    assert_eq!(err.code(), "E200");
}

#[tokio::test]
async fn test_failed_save_is_not_visible_in_tree() {
    let mut tracker = open().await;
    let columns = NodePath::task(0, 0, 0);
    tracker.assign(&columns, users(&["alice"]), users(&[])).await.unwrap();

    tracker.repository().set_unavailable(true);
    let err = tracker.submit_progress(&columns, 10, 10).await.unwrap_err();
    assert!(matches!(err, Error::Persistence(_)));
    assert_eq!(tracker.task(&columns).unwrap().status, TaskStatus::InProgress);
    assert_eq!(tracker.project().completed, 5);
}

#[tokio::test]
async fn test_distribution_scenarios() {
    let mut tracker = open().await;

    let request = tracker
        .distribute(&NodePath::subpackage(0, 0), DistributionStrategy::Proportional, 60, None)
        .await
        .unwrap();
    assert_eq!(request.amounts(), vec![20, 40]);
    assert_eq!(tracker.project().packages[0].total, 65);

    let manual = vec![Allocation::new(0, "Columns", 3), Allocation::new(1, "Foo slab", 3)];
    let err = tracker
        .distribute(&NodePath::subpackage(0, 0), DistributionStrategy::Manual, 6, Some(manual))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert_eq!(tracker.project().packages[0].total, 65);

    let stored = tracker.repository().load_project("tower-7").await.unwrap();
    assert_eq!(QuantityAggregator::run(stored).unwrap(), tracker.project().clone());
}

#[test]
fn test_search_reveals_path_to_grandchild() {
    let project = QuantityAggregator::run(tower()).unwrap();
    let mut view = TreeView::from_config(&Config::default().tree);
    view.set_search(Some("foo".into()));
    view.reveal_search(&project);

    let items = view.items(&project);
    let ids: Vec<String> = items.iter().map(|i| i.id.to_string()).collect();
    assert_eq!(
        ids,
        vec![
            "project-tower-7",
            "package-tower-7-0",
            "subpackage-tower-7-0-0",
            "task-tower-7-0-0-1"
        ]
    );
    assert_eq!("task-tower-7-0-0-1".parse::<NodeId>().unwrap(), items[3].id);

    let stats = TreeBatchOperations::calculate_stats(&items);
    assert_eq!(stats.total, 4);
    assert_eq!(stats.count(NodeType::Task), 1);
}

#[test]
fn test_windowed_text_rendering() {
    let project = QuantityAggregator::run(tower()).unwrap();
    let mut view = TreeView::new();
    view.smart_expand(&project, 200);

    let window = view.window(&project, 0, 4);
    assert_eq!(window.total, 10);
    assert!(window.has_more());

    let mut renderer = TextTreeRenderer::new();
    view.render_to(&project, &mut renderer, 0, 4);
    assert_eq!(renderer.lines().len(), 4);
    assert!(renderer.lines()[0].contains("Tower 7"));
}
