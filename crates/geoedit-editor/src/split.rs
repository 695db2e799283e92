//! Split-by-line tool.
//!
//! `inactive -> target selected -> line drawn -> inactive`. The target polygon
//! is shown on its own overlay and left untouched until the split is
//! confirmed; a failed confirmation keeps the session in `line drawn` so the
//! operator can retry.

use geo::{Contains, Intersects, LineString, Point, Polygon};
use geoedit_core::{
    shared, Error, Feature, FeedbackSink, Geometry, GeometryKind, MessageLevel, SharedOption,
    TopologyError, ValidationError,
};
use std::rc::Rc;
use std::sync::Arc;

use crate::error::{EditorError, EditorResult};
use crate::interaction::{Interaction, InteractionMode, InteractionSlot, MapSurface, OverlayLayer};
use crate::operations::GeometryOperations;

/// Split tool state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitState {
    Inactive,
    TargetSelected,
    LineDrawn,
}

#[derive(Debug, Clone)]
struct SplitSession {
    /// Target feature as stored, storage projection
    target: Feature,
    /// Cut line, display projection
    line: Option<Geometry>,
}

/// The original feature and the parts it was split into (storage projection).
#[derive(Debug, Clone, PartialEq)]
pub struct SplitOutcome {
    pub original: Feature,
    pub parts: Vec<Geometry>,
}

/// Rejects cut lines that cannot divide `polygon`.
///
/// A line whose endpoints both lie strictly inside the polygon never crosses
/// its boundary twice; a line that misses the polygon divides nothing.
pub fn validate_cut_line(
    polygon: &Polygon<f64>,
    line: &LineString<f64>,
) -> Result<(), TopologyError> {
    let (Some(first), Some(last)) = (line.0.first(), line.0.last()) else {
        return Err(TopologyError::CutLineMissesTarget);
    };

    if polygon.contains(&Point::from(*first)) && polygon.contains(&Point::from(*last)) {
        return Err(TopologyError::CutLineInsideTarget);
    }
    if !line.intersects(polygon) {
        return Err(TopologyError::CutLineMissesTarget);
    }
    Ok(())
}

/// Polygon split tool layered on the line-draw interaction.
pub struct SplitTool {
    session: SharedOption<SplitSession>,
    feedback: Arc<dyn FeedbackSink>,
}

impl SplitTool {
    pub fn new(feedback: Arc<dyn FeedbackSink>) -> Self {
        Self {
            session: shared(None),
            feedback,
        }
    }

    pub fn state(&self) -> SplitState {
        match self.session.borrow().as_ref() {
            None => SplitState::Inactive,
            Some(session) if session.line.is_none() => SplitState::TargetSelected,
            Some(_) => SplitState::LineDrawn,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state() != SplitState::Inactive
    }

    pub fn target(&self) -> Option<Feature> {
        self.session.borrow().as_ref().map(|s| s.target.clone())
    }

    /// The drawn cut line, display projection.
    pub fn cut_line(&self) -> Option<Geometry> {
        self.session.borrow().as_ref().and_then(|s| s.line.clone())
    }

    /// Starts splitting `feature`. Non-polygons are refused without any state change.
    pub fn start_split<S: MapSurface>(
        &self,
        slot: &mut InteractionSlot<S>,
        feature: &Feature,
    ) -> EditorResult<()> {
        if feature.geometry.kind() != GeometryKind::Polygon {
            return Err(self.reject(
                ValidationError::WrongGeometryType {
                    operation: "split".to_string(),
                    expected: GeometryKind::Polygon.to_string(),
                    actual: feature.geometry.kind().to_string(),
                }
                .into(),
            ));
        }

        let display = slot
            .display_projection()
            .to_display(&feature.geometry)
            .map_err(|e| self.reject(e.into()))?;

        let session = Rc::clone(&self.session);
        let target = feature.clone();
        slot.activate(InteractionMode::Splitting, move |surface| {
            surface.set_overlay(OverlayLayer::SplitTarget, Some(display));
            surface.attach(Interaction::Draw(GeometryKind::LineString));
            *session.borrow_mut() = Some(SplitSession { target, line: None });

            Box::new(move |surface: &mut S| {
                surface.detach(Interaction::Draw(GeometryKind::LineString));
                surface.set_overlay(OverlayLayer::SplitTarget, None);
                surface.set_overlay(OverlayLayer::CutLine, None);
                session.borrow_mut().take();
            })
        });

        tracing::debug!(
            "Split started for {}",
            feature.id.as_ref().map(|id| id.as_str()).unwrap_or("<anonymous>")
        );
        Ok(())
    }

    /// The cut line was drawn. Detaches the draw interaction; one line per session.
    pub fn on_line_drawn<S: MapSurface>(
        &self,
        slot: &mut InteractionSlot<S>,
        line: Geometry,
    ) -> EditorResult<()> {
        match self.state() {
            SplitState::TargetSelected => {}
            SplitState::LineDrawn => {
                tracing::debug!("Ignoring second cut line; cancel and restart to redraw");
                return Ok(());
            }
            SplitState::Inactive => return Ok(()),
        }

        if line.kind() != GeometryKind::LineString {
            return Err(self.reject(
                ValidationError::WrongGeometryType {
                    operation: "split".to_string(),
                    expected: GeometryKind::LineString.to_string(),
                    actual: line.kind().to_string(),
                }
                .into(),
            ));
        }

        let surface = slot.surface_mut();
        surface.detach(Interaction::Draw(GeometryKind::LineString));
        surface.set_overlay(OverlayLayer::CutLine, Some(line.clone()));
        if let Some(session) = self.session.borrow_mut().as_mut() {
            session.line = Some(line);
        }
        Ok(())
    }

    /// Splits the target along the cut line via the geometry service.
    ///
    /// On success the session is torn down. On failure it stays in `line drawn`.
    pub async fn confirm_split<S: MapSurface>(
        &self,
        slot: &mut InteractionSlot<S>,
        operations: &GeometryOperations,
    ) -> EditorResult<SplitOutcome> {
        let (target, line) = match self.session.borrow().as_ref() {
            Some(session) => (session.target.clone(), session.line.clone()),
            None => return Err(self.reject(ValidationError::MissingTarget.into())),
        };
        let Some(line) = line else {
            return Err(self.reject(ValidationError::MissingCutLine.into()));
        };

        let line = slot
            .display_projection()
            .to_storage(&line)
            .map_err(|e| self.reject(e.into()))?;

        if let (Some(polygon), Some(cut)) = (target.geometry.as_polygon(), line.as_line_string()) {
            validate_cut_line(polygon, cut).map_err(|e| self.reject(e.into()))?;
        }

        let parts = operations.split(&target.geometry, &line).await?;

        slot.release_if(|mode| *mode == InteractionMode::Splitting);
        self.session.borrow_mut().take();
        tracing::info!("Split produced {} parts", parts.len());

        Ok(SplitOutcome {
            original: target,
            parts,
        })
    }

    /// Abandons the split. Always safe to call.
    pub fn cancel_split<S: MapSurface>(&self, slot: &mut InteractionSlot<S>) {
        slot.release_if(|mode| *mode == InteractionMode::Splitting);
        self.session.borrow_mut().take();
    }

    fn reject(&self, err: Error) -> EditorError {
        self.feedback
            .show_toast(&err.user_message(), MessageLevel::Warning);
        err.into()
    }
}
