use geoedit_core::{FeatureId, Geometry};
use geoedit_editor::{
    EditAction, FeatureStore, HistoryStatus, InMemoryFeatureStore, UndoRedoStack, UndoableAction,
};
use std::sync::{Arc, Mutex};

use crate::support::{feature, point_feature};

async fn commit(history: &UndoRedoStack, store: &InMemoryFeatureStore, action: EditAction) {
    action.apply(store).await.expect("apply");
    history.add_action(UndoableAction::new(action));
}

async fn geometry_of(store: &InMemoryFeatureStore, id: &str) -> Option<Geometry> {
    store
        .get(&FeatureId::new(id))
        .await
        .expect("get")
        .map(|f| f.geometry)
}

#[tokio::test]
async fn test_undo_redo_mirrors_store() {
    let store = InMemoryFeatureStore::new();
    let history = UndoRedoStack::new();
    let a = point_feature("a", 1.0, 2.0);

    commit(&history, &store, EditAction::AddFeature(a.clone())).await;
    assert!(store.contains(&FeatureId::new("a")));

    assert!(history.undo(&store).await.expect("undo"));
    assert!(!store.contains(&FeatureId::new("a")));
    assert!(history.can_redo());

    assert!(history.redo(&store).await.expect("redo"));
    assert_eq!(geometry_of(&store, "a").await, Some(a.geometry));
    assert!(history.can_undo());
    assert!(!history.can_redo());
}

#[tokio::test]
async fn test_modify_then_delete_unwinds() {
    let store = InMemoryFeatureStore::with_features([point_feature("a", 0.0, 0.0)]);
    let history = UndoRedoStack::new();
    let id = FeatureId::new("a");

    commit(
        &history,
        &store,
        EditAction::ModifyGeometry {
            id: id.clone(),
            before: Geometry::point(0.0, 0.0),
            after: Geometry::point(3.0, 3.0),
        },
    )
    .await;
    let current = store.get(&id).await.expect("get").expect("stored");
    commit(&history, &store, EditAction::DeleteFeature(current)).await;
    assert!(store.is_empty());

    history.undo(&store).await.expect("undo delete");
    assert_eq!(geometry_of(&store, "a").await, Some(Geometry::point(3.0, 3.0)));
    history.undo(&store).await.expect("undo modify");
    assert_eq!(geometry_of(&store, "a").await, Some(Geometry::point(0.0, 0.0)));
    assert!(!history.can_undo());
    assert_eq!(history.redo_count(), 2);
}

#[tokio::test]
async fn test_batch_undoes_in_reverse_order() {
    let store = InMemoryFeatureStore::with_features([point_feature("a", 0.0, 0.0)]);
    let history = UndoRedoStack::new();
    let id = FeatureId::new("a");

    history.start_batch();
    commit(
        &history,
        &store,
        EditAction::ModifyGeometry {
            id: id.clone(),
            before: Geometry::point(0.0, 0.0),
            after: Geometry::point(1.0, 1.0),
        },
    )
    .await;
    commit(
        &history,
        &store,
        EditAction::ModifyGeometry {
            id: id.clone(),
            before: Geometry::point(1.0, 1.0),
            after: Geometry::point(2.0, 2.0),
        },
    )
    .await;
    history.end_batch(Some("Move twice"));

    assert_eq!(history.undo_count(), 1);
    let entry = history.peek_undo().expect("batch entry");
    assert_eq!(entry.kind(), "batch");
    assert_eq!(entry.description(), Some("Move twice"));

    history.undo(&store).await.expect("undo batch");
    assert_eq!(geometry_of(&store, "a").await, Some(Geometry::point(0.0, 0.0)));

    history.redo(&store).await.expect("redo batch");
    assert_eq!(geometry_of(&store, "a").await, Some(Geometry::point(2.0, 2.0)));
}

#[tokio::test]
async fn test_empty_batch_leaves_history_untouched() {
    let store = InMemoryFeatureStore::new();
    let history = UndoRedoStack::new();
    commit(&history, &store, EditAction::AddFeature(point_feature("a", 0.0, 0.0))).await;
    history.undo(&store).await.expect("undo");

    history.start_batch();
    history.end_batch(None);

    assert_eq!(history.undo_count(), 0);
    assert_eq!(history.redo_count(), 1);
    assert!(!history.is_batching());
}

#[tokio::test]
async fn test_failed_redo_keeps_action() {
    let store = InMemoryFeatureStore::new();
    let history = UndoRedoStack::new();
    let square = feature("sq", Geometry::polygon(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)]));

    commit(&history, &store, EditAction::AddFeature(square.clone())).await;
    history.undo(&store).await.expect("undo");

    // Something else claimed the id in the meantime.
    store.insert(square).await.expect("insert");
    assert!(history.redo(&store).await.is_err());
    assert_eq!(history.redo_count(), 1);
    assert_eq!(history.undo_count(), 0);
}

#[tokio::test]
async fn test_change_callback_tracks_availability() {
    let store = Arc::new(InMemoryFeatureStore::new());
    let history = UndoRedoStack::with_depth(2);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    history.set_on_change(move |status| sink.lock().expect("lock").push(status));

    for id in ["a", "b", "c"] {
        commit(&history, &store, EditAction::AddFeature(point_feature(id, 0.0, 0.0))).await;
    }
    assert_eq!(history.undo_count(), 2);

    history.undo(store.as_ref()).await.expect("undo");
    history.undo(store.as_ref()).await.expect("undo");
    assert!(!history.undo(store.as_ref()).await.expect("nothing to undo"));

    // "a" fell off the bottom of the stack and stays stored.
    assert!(store.contains(&FeatureId::new("a")));
    assert_eq!(store.len(), 1);

    let seen = seen.lock().expect("lock").clone();
    assert_eq!(seen.len(), 5);
    assert_eq!(
        seen.last(),
        Some(&HistoryStatus {
            can_undo: false,
            can_redo: true,
        })
    );
}
