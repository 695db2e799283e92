use geo::Coord;
use geoedit_core::{FeatureId, Geometry, GeometryKind, Projection};
use geoedit_editor::{
    Cluster, ClusterSource, DrawMode, DrawingController, Interaction, InteractionMode,
    InteractionSlot, RectangleSelect, VectorSource,
};

use crate::support::{feature, point_feature, square, RecordingSurface};

fn surface_with_cluster() -> RecordingSurface {
    let site = feature("site", square(-50.0, -50.0, 100.0)).with_attribute("type", "Site");
    let points = VectorSource::new(vec![
        point_feature("p1", 1.0, 1.0),
        point_feature("p2", 2.0, 2.0),
        point_feature("p3", 3.0, 3.0),
        site,
    ]);
    let cluster = ClusterSource::new(vec![Cluster::new(vec![
        point_feature("c1", 4.0, 4.0),
        point_feature("c2", 6.0, 6.0),
    ])]);
    RecordingSurface::wgs84()
        .with_source(points)
        .with_source(cluster)
}

fn corners(a: (f64, f64), b: (f64, f64)) -> (Coord<f64>, Coord<f64>) {
    (Coord { x: a.0, y: a.1 }, Coord { x: b.0, y: b.1 })
}

#[test]
fn test_box_selection_expands_clusters_and_skips_site() {
    let mut slot = InteractionSlot::new(surface_with_cluster());
    let select = RectangleSelect::default();
    select.enable(&mut slot);
    assert!(slot.surface().is_attached(Interaction::DragBox));

    let (start, end) = corners((0.0, 0.0), (10.0, 10.0));
    let summaries = select.on_drag_end(&slot, start, end);

    let ids: Vec<&str> = summaries.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["p1", "p2", "p3", "c1", "c2"]);
    assert!(summaries
        .iter()
        .all(|s| s.feature_type.as_deref() != Some("Site")));
    assert!(summaries.iter().all(|s| s.geometry.is_some()));
}

#[test]
fn test_box_selection_dedupes_across_sources() {
    let surface = RecordingSurface::wgs84()
        .with_source(VectorSource::new(vec![point_feature("dup", 1.0, 1.0)]))
        .with_source(VectorSource::new(vec![
            point_feature("dup", 1.0, 1.0),
            point_feature("other", 2.0, 2.0),
        ]));
    let mut slot = InteractionSlot::new(surface);
    let select = RectangleSelect::default();
    select.enable(&mut slot);

    let (start, end) = corners((5.0, 5.0), (0.0, 0.0));
    let summaries = select.on_drag_end(&slot, start, end);
    assert_eq!(summaries.len(), 2);
}

#[test]
fn test_disabled_box_select_returns_nothing() {
    let mut slot = InteractionSlot::new(surface_with_cluster());
    let select = RectangleSelect::default();
    let (start, end) = corners((0.0, 0.0), (10.0, 10.0));

    assert!(select.on_drag_end(&slot, start, end).is_empty());

    select.enable(&mut slot);
    select.disable(&mut slot);
    assert!(select.on_drag_end(&slot, start, end).is_empty());
    assert!(!slot.surface().is_attached(Interaction::DragBox));
}

#[test]
fn test_drawing_disables_box_select() {
    let mut slot = InteractionSlot::new(surface_with_cluster());
    let select = RectangleSelect::default();
    let drawing = DrawingController::new();

    select.enable(&mut slot);
    drawing.activate(&mut slot, DrawMode::Point);

    assert!(!select.is_enabled());
    assert!(!slot.surface().is_attached(Interaction::DragBox));
    assert!(slot.surface().is_attached(Interaction::Draw(GeometryKind::Point)));
    assert_eq!(slot.mode(), &InteractionMode::Drawing(GeometryKind::Point));
    assert_eq!(slot.surface().log[0], "attach DragBox");
    assert_eq!(slot.surface().log[1], "detach DragBox");
}

#[test]
fn test_selection_reports_storage_geometry() {
    let stored = Geometry::point(8.5, 47.4);
    let display = Projection::WebMercator.to_display(&stored).expect("display");
    let Geometry::Point(p) = display.clone() else {
        panic!("expected a point");
    };

    let surface = RecordingSurface::new(Projection::WebMercator)
        .with_source(VectorSource::new(vec![feature("zurich", display)]));
    let mut slot = InteractionSlot::new(surface);
    let select = RectangleSelect::default();
    select.enable(&mut slot);

    let (start, end) = corners((p.x() - 10.0, p.y() - 10.0), (p.x() + 10.0, p.y() + 10.0));
    let summaries = select.on_drag_end(&slot, start, end);

    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].id, FeatureId::new("zurich"));
    let Some(Geometry::Point(q)) = &summaries[0].geometry else {
        panic!("expected a storage point");
    };
    assert!((q.x() - 8.5).abs() < 1e-9);
    assert!((q.y() - 47.4).abs() < 1e-9);
}
