//! Drawing and vertex modification controller.
//!
//! Creation runs `idle -> drawing(mode) -> idle`; modification runs
//! `idle -> editing vertices -> idle`. Both go through the interaction slot, so
//! starting one disposes the other (and any other tool).

use geoedit_core::{
    shared, FeatureId, Geometry, GeometryKind, GeometryMetrics, SharedOption, ValidationError,
};
use std::fmt;
use std::rc::Rc;

use crate::error::EditorResult;
use crate::interaction::{
    Interaction, InteractionMode, InteractionSlot, MapSurface, OverlayLayer, TooltipKind,
};

/// Default snapping radius in pixels.
pub const DEFAULT_SNAP_TOLERANCE_PX: f64 = 10.0;

/// Geometry type being drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawMode {
    Point,
    Line,
    Polygon,
}

impl DrawMode {
    pub fn geometry_kind(self) -> GeometryKind {
        match self {
            DrawMode::Point => GeometryKind::Point,
            DrawMode::Line => GeometryKind::LineString,
            DrawMode::Polygon => GeometryKind::Polygon,
        }
    }

    /// Instruction shown when the first vertex is placed.
    pub fn help_text(self) -> &'static str {
        match self {
            DrawMode::Point => "Click to place the point",
            DrawMode::Line => "Click to continue drawing the line, double-click to finish",
            DrawMode::Polygon => "Click to continue drawing the polygon, double-click to finish",
        }
    }
}

impl fmt::Display for DrawMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DrawMode::Point => write!(f, "point"),
            DrawMode::Line => write!(f, "line"),
            DrawMode::Polygon => write!(f, "polygon"),
        }
    }
}

/// State of an active drawing mode.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawingSession {
    pub mode: DrawMode,
    /// A sketch has been started
    pub drawing: bool,
    /// Latest sketch geometry, display projection
    pub sketch: Option<Geometry>,
    pub metrics: Option<GeometryMetrics>,
}

impl DrawingSession {
    fn new(mode: DrawMode) -> Self {
        Self {
            mode,
            drawing: false,
            sketch: None,
            metrics: None,
        }
    }
}

/// A finished drawing, in the storage projection.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedDrawing {
    pub mode: DrawMode,
    pub geometry: Geometry,
    pub metrics: GeometryMetrics,
}

/// A completed vertex drag, in the storage projection.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexEdit {
    pub feature_id: FeatureId,
    pub geometry: Geometry,
}

#[derive(Debug, Clone)]
struct EditingTarget {
    feature_id: FeatureId,
    geometry: Geometry,
}

/// Draw and modify interactions with live measurement.
pub struct DrawingController {
    session: SharedOption<DrawingSession>,
    editing: SharedOption<EditingTarget>,
    snap_tolerance_px: f64,
}

impl DrawingController {
    pub fn new() -> Self {
        Self::with_snap_tolerance(DEFAULT_SNAP_TOLERANCE_PX)
    }

    pub fn with_snap_tolerance(snap_tolerance_px: f64) -> Self {
        Self {
            session: shared(None),
            editing: shared(None),
            snap_tolerance_px,
        }
    }

    /// Active drawing mode, if any.
    pub fn mode(&self) -> Option<DrawMode> {
        self.session.borrow().as_ref().map(|s| s.mode)
    }

    pub fn is_drawing(&self) -> bool {
        self.session.borrow().as_ref().is_some_and(|s| s.drawing)
    }

    pub fn sketch(&self) -> Option<Geometry> {
        self.session.borrow().as_ref().and_then(|s| s.sketch.clone())
    }

    pub fn live_metrics(&self) -> Option<GeometryMetrics> {
        self.session.borrow().as_ref().and_then(|s| s.metrics.clone())
    }

    pub fn editing_feature(&self) -> Option<FeatureId> {
        self.editing.borrow().as_ref().map(|t| t.feature_id.clone())
    }

    /// Geometry on the editing overlay, display projection.
    pub fn editing_geometry(&self) -> Option<Geometry> {
        self.editing.borrow().as_ref().map(|t| t.geometry.clone())
    }

    /// Attaches a draw interaction for `mode` plus snapping.
    pub fn activate<S: MapSurface>(&self, slot: &mut InteractionSlot<S>, mode: DrawMode) {
        let session = Rc::clone(&self.session);
        let kind = mode.geometry_kind();
        let snap = Interaction::Snap {
            tolerance_px: self.snap_tolerance_px,
        };

        slot.activate(InteractionMode::Drawing(kind), move |surface| {
            surface.attach(Interaction::Draw(kind));
            surface.attach(snap);
            *session.borrow_mut() = Some(DrawingSession::new(mode));

            Box::new(move |surface: &mut S| {
                surface.detach(Interaction::Draw(kind));
                surface.detach(snap);
                surface.set_overlay(OverlayLayer::Sketch, None);
                surface.hide_tooltip(TooltipKind::Help);
                surface.hide_tooltip(TooltipKind::Measure);
                if let Some(discarded) = session.borrow_mut().take() {
                    if discarded.drawing {
                        tracing::debug!("Discarded in-progress {} sketch", discarded.mode);
                    }
                }
            })
        });
    }

    /// Leaves drawing mode, discarding any sketch.
    pub fn deactivate<S: MapSurface>(&self, slot: &mut InteractionSlot<S>) {
        slot.release_if(|mode| matches!(mode, InteractionMode::Drawing(_)));
        self.session.borrow_mut().take();
    }

    /// First pointer-down of a sketch. Returns `false` when no mode is active.
    pub fn on_draw_start<S: MapSurface>(
        &self,
        slot: &mut InteractionSlot<S>,
        start: geo::Coord<f64>,
    ) -> bool {
        let mode = {
            let mut guard = self.session.borrow_mut();
            let Some(session) = guard.as_mut() else {
                return false;
            };
            session.drawing = true;
            session.sketch = None;
            session.metrics = None;
            session.mode
        };

        slot.surface_mut()
            .show_tooltip(TooltipKind::Help, mode.help_text(), start);
        tracing::debug!("Started {} sketch", mode);
        true
    }

    /// Sketch geometry changed. Returns the live metrics for lines and polygons.
    pub fn on_sketch_change<S: MapSurface>(
        &self,
        slot: &mut InteractionSlot<S>,
        sketch: Geometry,
    ) -> Option<GeometryMetrics> {
        let mode = match self.session.borrow().as_ref() {
            Some(session) if session.drawing => session.mode,
            _ => return None,
        };

        let metrics = match mode {
            DrawMode::Point => None,
            DrawMode::Line | DrawMode::Polygon => {
                match slot.display_projection().to_storage(&sketch) {
                    Ok(storage) => Some(GeometryMetrics::compute(&storage)),
                    Err(err) => {
                        tracing::debug!("Sketch not measurable yet: {}", err);
                        None
                    }
                }
            }
        };

        let surface = slot.surface_mut();
        surface.set_overlay(OverlayLayer::Sketch, Some(sketch.clone()));
        let label = metrics.as_ref().and_then(GeometryMetrics::label);
        match (label, sketch.label_anchor()) {
            (Some(label), Some(anchor)) => surface.show_tooltip(TooltipKind::Measure, &label, anchor),
            _ => surface.hide_tooltip(TooltipKind::Measure),
        }

        if let Some(session) = self.session.borrow_mut().as_mut() {
            session.sketch = Some(sketch);
            session.metrics = metrics.clone();
        }
        metrics
    }

    /// Sketch finished. Converts to storage, measures, and returns to idle.
    ///
    /// Returns `Ok(None)` when no drawing mode is active. The session is torn
    /// down even when conversion fails.
    pub fn on_draw_end<S: MapSurface>(
        &self,
        slot: &mut InteractionSlot<S>,
        geometry: Geometry,
    ) -> EditorResult<Option<CompletedDrawing>> {
        let Some(mode) = self.mode() else {
            return Ok(None);
        };

        let converted = slot.display_projection().to_storage(&geometry);
        self.deactivate(slot);

        if geometry.kind() != mode.geometry_kind() {
            return Err(ValidationError::WrongGeometryType {
                operation: format!("draw {}", mode),
                expected: mode.geometry_kind().to_string(),
                actual: geometry.kind().to_string(),
            }
            .into());
        }

        let storage = converted?;
        let metrics = GeometryMetrics::compute(&storage);
        tracing::info!("Completed {} drawing ({})", mode, storage);

        Ok(Some(CompletedDrawing {
            mode,
            geometry: storage,
            metrics,
        }))
    }

    /// Puts `geometry` (storage projection) on the editing overlay with vertex handles.
    pub fn set_feature_for_editing<S: MapSurface>(
        &self,
        slot: &mut InteractionSlot<S>,
        geometry: &Geometry,
        feature_id: FeatureId,
    ) -> EditorResult<()> {
        let display = slot.display_projection().to_display(geometry)?;
        let editing = Rc::clone(&self.editing);
        let overlay = display.clone();

        slot.activate(
            InteractionMode::EditingVertices(feature_id.clone()),
            move |surface| {
                surface.set_overlay(OverlayLayer::Editing, Some(overlay));
                surface.attach(Interaction::Modify);

                Box::new(move |surface: &mut S| {
                    surface.detach(Interaction::Modify);
                    surface.set_overlay(OverlayLayer::Editing, None);
                    editing.borrow_mut().take();
                })
            },
        );

        tracing::debug!("Editing vertices of {}", feature_id);
        *self.editing.borrow_mut() = Some(EditingTarget {
            feature_id,
            geometry: display,
        });
        Ok(())
    }

    /// A vertex drag finished. Returns the edited feature and its new geometry.
    ///
    /// Returns `Ok(None)` when nothing is being edited. The modify interaction
    /// stays attached.
    pub fn on_modify_end<S: MapSurface>(
        &self,
        slot: &mut InteractionSlot<S>,
        geometry: Geometry,
    ) -> EditorResult<Option<VertexEdit>> {
        let Some(feature_id) = self.editing_feature() else {
            return Ok(None);
        };

        let storage = slot.display_projection().to_storage(&geometry)?;
        slot.surface_mut()
            .set_overlay(OverlayLayer::Editing, Some(geometry.clone()));
        if let Some(target) = self.editing.borrow_mut().as_mut() {
            target.geometry = geometry;
        }

        Ok(Some(VertexEdit {
            feature_id,
            geometry: storage,
        }))
    }

    /// Clears the editing overlay and removes the modify interaction.
    pub fn remove_editing_feature<S: MapSurface>(&self, slot: &mut InteractionSlot<S>) {
        slot.release_if(|mode| matches!(mode, InteractionMode::EditingVertices(_)));
        self.editing.borrow_mut().take();
    }
}

impl Default for DrawingController {
    fn default() -> Self {
        Self::new()
    }
}
