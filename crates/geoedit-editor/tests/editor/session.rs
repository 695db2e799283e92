use geo::Coord;
use geoedit_core::{
    EditorEvent, FeatureId, FeedbackSink, Geometry, GeometryKind, MessageLevel, Projection,
};
use geoedit_editor::{
    DrawMode, EditorSession, FeatureStore, InMemoryFeatureStore, Interaction, InteractionMode,
    OverlayLayer, SplitState, VectorSource,
};
use geoedit_service::ValidateOptions;
use geoedit_settings::Config;
use serde_json::json;
use std::sync::Arc;

use crate::support::{
    feature, metric_rectangle, point_feature, square, FakeGeometryService, RecordingFeedback,
    RecordingSurface,
};

struct Fixture {
    session: EditorSession<RecordingSurface>,
    store: Arc<InMemoryFeatureStore>,
    service: Arc<FakeGeometryService>,
    feedback: Arc<RecordingFeedback>,
}

fn fixture(features: Vec<geoedit_core::Feature>) -> Fixture {
    let store = Arc::new(InMemoryFeatureStore::with_features(features.clone()));
    let service = Arc::new(FakeGeometryService::new());
    let feedback = Arc::new(RecordingFeedback::default());
    let sink: Arc<dyn FeedbackSink> = feedback.clone();

    let mut config = Config::default();
    config.editor.display_projection = Projection::Wgs84;

    let surface = RecordingSurface::wgs84().with_source(VectorSource::new(features));
    let session = EditorSession::new(surface, store.clone(), service.clone(), sink, &config);
    Fixture {
        session,
        store,
        service,
        feedback,
    }
}

fn whole_map() -> (Coord<f64>, Coord<f64>) {
    (Coord { x: -20.0, y: -20.0 }, Coord { x: 20.0, y: 20.0 })
}

async fn stored(store: &InMemoryFeatureStore, id: &FeatureId) -> Option<geoedit_core::Feature> {
    store.get(id).await.expect("get")
}

#[tokio::test]
async fn test_draw_polygon_then_undo_redo() {
    let mut f = fixture(Vec::new());
    let mut events = f.session.events().subscribe();

    f.session.start_drawing(DrawMode::Polygon);
    assert!(f.session.draw_started(Coord { x: 0.0, y: 0.0 }));
    let metrics = f
        .session
        .sketch_changed(metric_rectangle(100.0, 50.0))
        .expect("live metrics");
    assert!(metrics.area_m2.is_some());

    let mut attributes = serde_json::Map::new();
    attributes.insert("name".to_string(), json!("Field 1"));
    let drawn = f
        .session
        .finish_drawing(metric_rectangle(100.0, 50.0), attributes)
        .await
        .expect("drawing stored")
        .expect("drawing was active");
    let id = drawn.id.clone().expect("generated id");

    assert_eq!(f.session.mode(), &InteractionMode::Idle);
    assert_eq!(stored(&f.store, &id).await, Some(drawn.clone()));
    assert_eq!(drawn.title(), "Field 1");
    assert!(f.session.history().can_undo());
    assert_eq!(
        f.feedback.last().map(|(level, _)| level),
        Some(MessageLevel::Success)
    );

    assert_eq!(
        events.recv().await.expect("event"),
        EditorEvent::HistoryChanged {
            can_undo: true,
            can_redo: false,
        }
    );
    assert_eq!(
        events.recv().await.expect("event"),
        EditorEvent::DrawingCompleted {
            id: id.clone(),
            kind: GeometryKind::Polygon,
        }
    );

    assert!(f.session.undo().await.expect("undo"));
    assert!(f.store.is_empty());
    assert!(f.session.redo().await.expect("redo"));
    assert_eq!(stored(&f.store, &id).await, Some(drawn));
}

#[tokio::test]
async fn test_finish_drawing_without_mode_does_nothing() {
    let mut f = fixture(Vec::new());
    let result = f
        .session
        .finish_drawing(Geometry::point(1.0, 1.0), Default::default())
        .await
        .expect("no error");
    assert_eq!(result, None);
    assert!(f.store.is_empty());
    assert!(!f.session.history().can_undo());
}

#[tokio::test]
async fn test_vertex_edit_is_undoable() {
    let parcel = feature("parcel", square(0.0, 0.0, 2.0));
    let mut f = fixture(vec![parcel.clone()]);
    let id = FeatureId::new("parcel");

    f.session.edit_feature(&id).await.expect("edit");
    assert!(f.session.surface().is_attached(Interaction::Modify));

    let moved = square(0.0, 0.0, 3.0);
    let edited = f
        .session
        .finish_vertex_edit(moved.clone())
        .await
        .expect("edit stored");
    assert_eq!(edited, Some(id.clone()));
    assert_eq!(stored(&f.store, &id).await.map(|f| f.geometry), Some(moved.clone()));

    f.session.undo().await.expect("undo");
    assert_eq!(
        stored(&f.store, &id).await.map(|f| f.geometry),
        Some(parcel.geometry.clone())
    );
    // The editing overlay follows the restored geometry.
    assert_eq!(
        f.session.surface().overlay(OverlayLayer::Editing),
        Some(&parcel.geometry)
    );

    f.session.stop_editing();
    assert!(f.session.surface().attached.is_empty());
}

#[tokio::test]
async fn test_edit_unknown_feature_fails() {
    let mut f = fixture(Vec::new());
    assert!(f.session.edit_feature(&FeatureId::new("ghost")).await.is_err());
    assert_eq!(f.feedback.count(MessageLevel::Warning), 1);
    assert_eq!(f.session.mode(), &InteractionMode::Idle);
}

#[tokio::test]
async fn test_box_select_excludes_site() {
    let site = feature("site", square(-10.0, -10.0, 20.0)).with_attribute("type", "Site");
    let mut f = fixture(vec![
        site,
        point_feature("a", 1.0, 1.0),
        point_feature("b", 2.0, 2.0),
    ]);

    let (start, end) = whole_map();
    assert!(f.session.select_in_box(start, end).is_empty());

    f.session.set_box_select(true);
    assert_eq!(f.session.mode(), &InteractionMode::BoxSelect);
    let ids: Vec<String> = f
        .session
        .select_in_box(start, end)
        .iter()
        .map(|s| s.id.to_string())
        .collect();
    assert_eq!(ids, vec!["a", "b"]);

    f.session.clear_selection();
    assert!(f.session.selection().is_empty());
    f.session.set_box_select(false);
    assert_eq!(f.session.mode(), &InteractionMode::Idle);
}

#[tokio::test]
async fn test_simplify_selection_is_one_undo_entry() {
    let zigzag = |id: &str, y: f64| {
        feature(
            id,
            Geometry::line_string(&[(0.0, y), (1.0, y + 0.001), (2.0, y)]),
        )
    };
    let mut f = fixture(vec![zigzag("l1", 0.0), zigzag("l2", 1.0)]);

    f.session.set_box_select(true);
    let (start, end) = whole_map();
    f.session.select_in_box(start, end);

    let modified = f
        .session
        .simplify_selection(Some(0.01))
        .await
        .expect("simplified");
    assert_eq!(modified.len(), 2);
    assert_eq!(f.session.history().undo_count(), 1);
    for id in &modified {
        let line = stored(&f.store, id).await.expect("stored").geometry;
        assert_eq!(line.as_line_string().map(|l| l.0.len()), Some(2));
    }

    f.session.undo().await.expect("undo");
    for id in &modified {
        let line = stored(&f.store, id).await.expect("stored").geometry;
        assert_eq!(line.as_line_string().map(|l| l.0.len()), Some(3));
    }
}

#[tokio::test]
async fn test_operation_without_selection_is_refused() {
    let mut f = fixture(vec![point_feature("a", 1.0, 1.0)]);
    assert!(f.session.buffer_selection(Some(10.0)).await.is_err());
    assert!(f.session.merge_selection().await.is_err());
    assert_eq!(f.service.call_count(), 0);
}

#[tokio::test]
async fn test_merge_selection_replaces_inputs() {
    let left = feature("left", square(0.0, 0.0, 1.0)).with_attribute("name", "Left");
    let right = feature("right", square(1.0, 0.0, 1.0)).with_attribute("name", "Right");
    let mut f = fixture(vec![left.clone(), right.clone()]);

    f.session.set_box_select(true);
    let (start, end) = whole_map();
    assert_eq!(f.session.select_in_box(start, end).len(), 2);

    let merged_id = f.session.merge_selection().await.expect("merged");

    assert_eq!(f.store.len(), 1);
    let merged = stored(&f.store, &merged_id).await.expect("merged stored");
    assert_eq!(merged.title(), "Left");
    assert!(f.session.selection().is_empty());

    f.session.undo().await.expect("undo merge");
    assert_eq!(f.store.len(), 2);
    assert_eq!(stored(&f.store, &FeatureId::new("left")).await, Some(left));
    assert_eq!(stored(&f.store, &FeatureId::new("right")).await, Some(right));
}

#[tokio::test]
async fn test_merge_single_selection_fails_client_side() {
    let mut f = fixture(vec![feature("only", square(0.0, 0.0, 1.0))]);
    f.session.set_box_select(true);
    let (start, end) = whole_map();
    f.session.select_in_box(start, end);

    let err = f.session.merge_selection().await.expect_err("needs two");
    assert!(err.user_message().starts_with("Select at least 2"));
    assert_eq!(f.service.call_count(), 0);
    assert_eq!(f.store.len(), 1);
}

#[tokio::test]
async fn test_split_flow_inherits_attributes() {
    let parcel = feature("parcel", square(0.0, 0.0, 10.0)).with_attribute("name", "Parcel");
    let mut f = fixture(vec![parcel.clone()]);
    let id = FeatureId::new("parcel");

    f.session.start_split(&id).await.expect("split started");
    assert_eq!(f.session.split_tool().state(), SplitState::TargetSelected);
    f.session
        .cut_line_drawn(Geometry::line_string(&[(5.0, -1.0), (5.0, 11.0)]))
        .expect("line drawn");

    let parts = f.session.confirm_split().await.expect("split confirmed");

    assert_eq!(parts.len(), 2);
    assert!(!f.store.contains(&id));
    for part in &parts {
        let stored_part = stored(&f.store, part).await.expect("part stored");
        assert_eq!(stored_part.title(), "Parcel");
    }
    assert_eq!(f.session.mode(), &InteractionMode::Idle);

    f.session.undo().await.expect("undo split");
    assert_eq!(f.store.len(), 1);
    assert_eq!(stored(&f.store, &id).await, Some(parcel));
}

#[tokio::test]
async fn test_validate_and_calculate_leave_store_untouched() {
    let parcel = feature("parcel", metric_rectangle(100.0, 50.0));
    let mut f = fixture(vec![parcel.clone()]);
    let id = FeatureId::new("parcel");

    let report = f
        .session
        .validate_feature(&id, ValidateOptions::default())
        .await
        .expect("validated");
    assert!(report.is_valid);

    let metrics = f.session.calculate_feature(&id).await.expect("calculated");
    assert!((metrics.perimeter_m.expect("perimeter") - 300.0).abs() < 0.5);

    assert_eq!(stored(&f.store, &id).await, Some(parcel));
    assert!(!f.session.history().can_undo());
}

#[tokio::test]
async fn test_reset_returns_to_clean_state() {
    let mut f = fixture(vec![point_feature("a", 1.0, 1.0)]);
    f.session.set_box_select(true);
    let (start, end) = whole_map();
    f.session.select_in_box(start, end);
    f.session
        .buffer_selection(Some(10.0))
        .await
        .expect("buffered");
    f.session.start_drawing(DrawMode::Line);

    f.session.reset();

    assert_eq!(f.session.mode(), &InteractionMode::Idle);
    assert!(f.session.surface().attached.is_empty());
    assert!(f.session.selection().is_empty());
    assert!(!f.session.history().can_undo());
    assert_eq!(f.session.operations().last_result(), None);
    assert!(!f.session.box_select().is_enabled());
}
