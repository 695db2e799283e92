//! Editor session: the composition root of the editing engine.
//!
//! Owns the map surface (through the interaction slot), the tools, the undo
//! history, the geometry operations and the current selection. Completed
//! interactions become feature store mutations recorded as undoable actions.

use geo::Coord;
use geoedit_core::{
    Attributes, EditorEvent, EventDispatcher, Feature, FeatureId, FeatureSummary, FeedbackSink,
    Geometry, GeometryMetrics, MessageLevel, ValidationError,
};
use geoedit_service::{GeometryService, ValidateOptions, ValidationReport};
use geoedit_settings::{Config, OperationSettings};
use std::sync::Arc;

use crate::drawing::{DrawMode, DrawingController};
use crate::error::{EditorError, EditorResult};
use crate::history::{EditAction, UndoRedoStack, UndoableAction};
use crate::interaction::{InteractionMode, InteractionSlot, MapSurface};
use crate::operations::GeometryOperations;
use crate::selection::RectangleSelect;
use crate::split::SplitTool;
use crate::store::FeatureStore;

/// Capacity of the editor event channel.
const EVENT_BUFFER_SIZE: usize = 100;

/// Interactive editing session over one map surface.
pub struct EditorSession<S: MapSurface> {
    slot: InteractionSlot<S>,
    drawing: DrawingController,
    split: SplitTool,
    box_select: RectangleSelect,
    history: Arc<UndoRedoStack>,
    operations: Arc<GeometryOperations>,
    store: Arc<dyn FeatureStore>,
    feedback: Arc<dyn FeedbackSink>,
    events: EventDispatcher,
    selection: Vec<FeatureSummary>,
    defaults: OperationSettings,
}

impl<S: MapSurface> EditorSession<S> {
    pub fn new(
        surface: S,
        store: Arc<dyn FeatureStore>,
        service: Arc<dyn GeometryService>,
        feedback: Arc<dyn FeedbackSink>,
        config: &Config,
    ) -> Self {
        if surface.display_projection() != config.editor.display_projection {
            tracing::warn!(
                "Map surface uses {} but the configuration expects {}",
                surface.display_projection(),
                config.editor.display_projection
            );
        }

        let events = EventDispatcher::new(EVENT_BUFFER_SIZE);

        let history = Arc::new(UndoRedoStack::with_depth(config.editor.undo_max_depth));
        let history_events = events.clone();
        history.set_on_change(move |status| {
            history_events.publish(EditorEvent::HistoryChanged {
                can_undo: status.can_undo,
                can_redo: status.can_redo,
            });
        });

        let operations = Arc::new(
            GeometryOperations::new(service, Arc::clone(&feedback)).with_events(events.clone()),
        );

        Self {
            slot: InteractionSlot::new(surface),
            drawing: DrawingController::with_snap_tolerance(config.editor.snap_tolerance_px),
            split: SplitTool::new(Arc::clone(&feedback)),
            box_select: RectangleSelect::new(config.editor.reserved_root_type.clone()),
            history,
            operations,
            store,
            feedback,
            events,
            selection: Vec::new(),
            defaults: config.operations.clone(),
        }
    }

    pub fn surface(&self) -> &S {
        self.slot.surface()
    }

    pub fn surface_mut(&mut self) -> &mut S {
        self.slot.surface_mut()
    }

    pub fn mode(&self) -> &InteractionMode {
        self.slot.mode()
    }

    pub fn drawing(&self) -> &DrawingController {
        &self.drawing
    }

    pub fn split_tool(&self) -> &SplitTool {
        &self.split
    }

    pub fn box_select(&self) -> &RectangleSelect {
        &self.box_select
    }

    pub fn history(&self) -> &Arc<UndoRedoStack> {
        &self.history
    }

    pub fn operations(&self) -> &Arc<GeometryOperations> {
        &self.operations
    }

    pub fn store(&self) -> &Arc<dyn FeatureStore> {
        &self.store
    }

    pub fn events(&self) -> &EventDispatcher {
        &self.events
    }

    pub fn selection(&self) -> &[FeatureSummary] {
        &self.selection
    }

    // ---------------------------------------------------------------------
    // Drawing
    // ---------------------------------------------------------------------

    pub fn start_drawing(&mut self, mode: DrawMode) {
        self.drawing.activate(&mut self.slot, mode);
    }

    pub fn stop_drawing(&mut self) {
        self.drawing.deactivate(&mut self.slot);
    }

    pub fn draw_started(&mut self, start: Coord<f64>) -> bool {
        self.drawing.on_draw_start(&mut self.slot, start)
    }

    pub fn sketch_changed(&mut self, sketch: Geometry) -> Option<GeometryMetrics> {
        self.drawing.on_sketch_change(&mut self.slot, sketch)
    }

    /// Stores the finished sketch as a new feature with `attributes`.
    ///
    /// Returns `Ok(None)` when no drawing mode was active.
    pub async fn finish_drawing(
        &mut self,
        geometry: Geometry,
        attributes: Attributes,
    ) -> EditorResult<Option<Feature>> {
        let completed = match self.drawing.on_draw_end(&mut self.slot, geometry) {
            Ok(Some(completed)) => completed,
            Ok(None) => return Ok(None),
            Err(err) => return Err(self.reject(err)),
        };

        let id = FeatureId::generate();
        let feature = Feature::new(id.clone(), completed.geometry).with_attributes(attributes);
        self.commit(
            EditAction::AddFeature(feature.clone()),
            Some(format!("Draw {}", completed.mode)),
        )
        .await?;

        if let Some(label) = completed.metrics.label() {
            self.feedback
                .show_toast(&format!("Drawing completed ({})", label), MessageLevel::Success);
        }
        self.events.publish(EditorEvent::DrawingCompleted {
            id,
            kind: completed.mode.geometry_kind(),
        });
        Ok(Some(feature))
    }

    // ---------------------------------------------------------------------
    // Vertex modification
    // ---------------------------------------------------------------------

    /// Puts a stored feature under vertex editing.
    pub async fn edit_feature(&mut self, id: &FeatureId) -> EditorResult<()> {
        let feature = self.feature(id).await?;
        self.drawing
            .set_feature_for_editing(&mut self.slot, &feature.geometry, id.clone())
            .map_err(|e| self.reject(e))
    }

    /// Records a finished vertex drag on the feature under editing.
    pub async fn finish_vertex_edit(&mut self, geometry: Geometry) -> EditorResult<Option<FeatureId>> {
        let edit = match self.drawing.on_modify_end(&mut self.slot, geometry) {
            Ok(Some(edit)) => edit,
            Ok(None) => return Ok(None),
            Err(err) => return Err(self.reject(err)),
        };

        let before = self.feature(&edit.feature_id).await?.geometry;
        self.commit(
            EditAction::ModifyGeometry {
                id: edit.feature_id.clone(),
                before,
                after: edit.geometry,
            },
            Some("Move vertex".to_string()),
        )
        .await?;

        self.events
            .publish(EditorEvent::FeatureModified(edit.feature_id.clone()));
        Ok(Some(edit.feature_id))
    }

    pub fn stop_editing(&mut self) {
        self.drawing.remove_editing_feature(&mut self.slot);
    }

    // ---------------------------------------------------------------------
    // Box selection
    // ---------------------------------------------------------------------

    pub fn set_box_select(&mut self, enabled: bool) {
        self.box_select.set_enabled(&mut self.slot, enabled);
    }

    /// Replaces the selection with the features under the dragged rectangle.
    pub fn select_in_box(&mut self, start: Coord<f64>, end: Coord<f64>) -> &[FeatureSummary] {
        if self.box_select.is_enabled() {
            self.selection = self.box_select.on_drag_end(&self.slot, start, end);
            self.events.publish(EditorEvent::SelectionChanged(
                self.selection.iter().map(|s| s.id.clone()).collect(),
            ));
        }
        &self.selection
    }

    pub fn clear_selection(&mut self) {
        if !self.selection.is_empty() {
            self.selection.clear();
            self.events.publish(EditorEvent::SelectionChanged(Vec::new()));
        }
    }

    // ---------------------------------------------------------------------
    // Splitting
    // ---------------------------------------------------------------------

    pub async fn start_split(&mut self, id: &FeatureId) -> EditorResult<()> {
        let feature = self.feature(id).await?;
        self.split.start_split(&mut self.slot, &feature)
    }

    pub fn cut_line_drawn(&mut self, line: Geometry) -> EditorResult<()> {
        self.split.on_line_drawn(&mut self.slot, line)
    }

    /// Replaces the target with its parts. Parts inherit the target's attributes.
    pub async fn confirm_split(&mut self) -> EditorResult<Vec<FeatureId>> {
        let outcome = self
            .split
            .confirm_split(&mut self.slot, &self.operations)
            .await?;

        let original = match &outcome.original.id {
            Some(id) => self.feature(id).await?,
            None => return Err(self.reject(ValidationError::MissingTarget.into())),
        };

        let parts: Vec<Feature> = outcome
            .parts
            .into_iter()
            .map(|geometry| {
                Feature::new(FeatureId::generate(), geometry)
                    .with_attributes(original.attributes.clone())
            })
            .collect();
        let part_ids: Vec<FeatureId> = parts.iter().filter_map(|p| p.id.clone()).collect();

        let mut actions = vec![EditAction::DeleteFeature(original.clone())];
        actions.extend(parts.into_iter().map(EditAction::AddFeature));
        self.commit(
            EditAction::Batch(actions),
            Some(format!("Split into {} parts", part_ids.len())),
        )
        .await?;

        if let Some(original_id) = original.id {
            self.forget_selected(&[original_id.clone()]);
            self.events.publish(EditorEvent::SplitCompleted {
                original: original_id,
                parts: part_ids.clone(),
            });
        }
        Ok(part_ids)
    }

    pub fn cancel_split(&mut self) {
        self.split.cancel_split(&mut self.slot);
    }

    // ---------------------------------------------------------------------
    // Geometry operations on the selection
    // ---------------------------------------------------------------------

    /// Simplifies every selected feature; several features form one undo entry.
    pub async fn simplify_selection(&mut self, tolerance: Option<f64>) -> EditorResult<Vec<FeatureId>> {
        let tolerance = tolerance.unwrap_or(self.defaults.default_simplify_tolerance);
        let preserve_topology = self.defaults.preserve_topology;
        let features = self.selected_features().await?;

        let mut actions = Vec::with_capacity(features.len());
        for (id, before) in features {
            let after = self
                .operations
                .simplify(&before, tolerance, preserve_topology)
                .await?;
            actions.push(EditAction::ModifyGeometry { id, before, after });
        }
        self.commit_modifications(actions, "Simplify").await
    }

    /// Buffers every selected feature; several features form one undo entry.
    pub async fn buffer_selection(&mut self, distance_meters: Option<f64>) -> EditorResult<Vec<FeatureId>> {
        let distance = distance_meters.unwrap_or(self.defaults.default_buffer_meters);
        let features = self.selected_features().await?;

        let mut actions = Vec::with_capacity(features.len());
        for (id, before) in features {
            let after = self.operations.buffer(&before, distance).await?;
            actions.push(EditAction::ModifyGeometry { id, before, after });
        }
        self.commit_modifications(actions, "Buffer").await
    }

    /// Merges the selected polygons into one new feature.
    ///
    /// The merged feature takes the attributes of the first selected feature.
    pub async fn merge_selection(&mut self) -> EditorResult<FeatureId> {
        let mut originals = Vec::with_capacity(self.selection.len());
        for id in self.selected_ids()? {
            originals.push(self.feature(&id).await?);
        }

        let polygons: Vec<Geometry> = originals.iter().map(|f| f.geometry.clone()).collect();
        let merged = self.operations.merge(&polygons).await?;

        let attributes = originals
            .first()
            .map(|f| f.attributes.clone())
            .unwrap_or_default();
        let id = FeatureId::generate();
        let feature = Feature::new(id.clone(), merged).with_attributes(attributes);

        let count = originals.len();
        let mut actions: Vec<EditAction> =
            originals.into_iter().map(EditAction::DeleteFeature).collect();
        actions.push(EditAction::AddFeature(feature));
        self.commit(
            EditAction::Batch(actions),
            Some(format!("Merge {} features", count)),
        )
        .await?;

        self.selection.clear();
        self.events.publish(EditorEvent::SelectionChanged(Vec::new()));
        Ok(id)
    }

    pub async fn validate_feature(
        &mut self,
        id: &FeatureId,
        options: ValidateOptions,
    ) -> EditorResult<ValidationReport> {
        let feature = self.feature(id).await?;
        Ok(self.operations.validate(&feature.geometry, options).await?)
    }

    /// Measures a stored feature. Nothing is modified.
    pub async fn calculate_feature(&mut self, id: &FeatureId) -> EditorResult<GeometryMetrics> {
        let feature = self.feature(id).await?;
        Ok(self.operations.calculate(&feature.geometry).await?)
    }

    // ---------------------------------------------------------------------
    // History
    // ---------------------------------------------------------------------

    pub async fn undo(&mut self) -> EditorResult<bool> {
        let undone = self
            .history
            .undo(self.store.as_ref())
            .await
            .map_err(|e| self.reject(e.into()))?;
        if undone {
            self.refresh_editing_overlay().await;
        }
        Ok(undone)
    }

    pub async fn redo(&mut self) -> EditorResult<bool> {
        let redone = self
            .history
            .redo(self.store.as_ref())
            .await
            .map_err(|e| self.reject(e.into()))?;
        if redone {
            self.refresh_editing_overlay().await;
        }
        Ok(redone)
    }

    /// Detaches every interaction and forgets history, selection and cached results.
    pub fn reset(&mut self) {
        self.slot.release();
        self.split.cancel_split(&mut self.slot);
        self.drawing.deactivate(&mut self.slot);
        self.drawing.remove_editing_feature(&mut self.slot);
        self.box_select.disable(&mut self.slot);
        self.history.clear();
        self.operations.clear_results();
        self.clear_selection();
        tracing::debug!("Editor session reset");
    }

    // ---------------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------------

    async fn feature(&self, id: &FeatureId) -> EditorResult<Feature> {
        match self.store.get(id).await? {
            Some(feature) => Ok(feature),
            None => Err(self.reject(ValidationError::UnknownFeature(id.to_string()).into())),
        }
    }

    fn selected_ids(&self) -> EditorResult<Vec<FeatureId>> {
        if self.selection.is_empty() {
            return Err(self.reject(ValidationError::NothingSelected.into()));
        }
        Ok(self.selection.iter().map(|s| s.id.clone()).collect())
    }

    async fn selected_features(&self) -> EditorResult<Vec<(FeatureId, Geometry)>> {
        let mut features = Vec::with_capacity(self.selection.len());
        for id in self.selected_ids()? {
            let geometry = self.feature(&id).await?.geometry;
            features.push((id, geometry));
        }
        Ok(features)
    }

    /// Applies `action` to the store and records it.
    async fn commit(&self, action: EditAction, description: Option<String>) -> EditorResult<()> {
        action
            .apply(self.store.as_ref())
            .await
            .map_err(|e| self.reject(e.into()))?;

        let mut entry = UndoableAction::new(action);
        if let Some(description) = description {
            entry = entry.with_description(description);
        }
        self.history.add_action(entry);
        Ok(())
    }

    async fn commit_modifications(
        &self,
        actions: Vec<EditAction>,
        label: &str,
    ) -> EditorResult<Vec<FeatureId>> {
        let ids: Vec<FeatureId> = actions
            .iter()
            .filter_map(|a| match a {
                EditAction::ModifyGeometry { id, .. } => Some(id.clone()),
                _ => None,
            })
            .collect();

        if actions.len() == 1 {
            for action in actions {
                self.commit(action, Some(label.to_string())).await?;
            }
        } else {
            self.history.start_batch();
            let mut outcome = Ok(());
            for action in actions {
                outcome = self.commit(action, None).await;
                if outcome.is_err() {
                    break;
                }
            }
            self.history
                .end_batch(Some(&format!("{} {} features", label, ids.len())));
            outcome?;
        }

        for id in &ids {
            self.events.publish(EditorEvent::FeatureModified(id.clone()));
        }
        Ok(ids)
    }

    fn forget_selected(&mut self, removed: &[FeatureId]) {
        let before = self.selection.len();
        self.selection.retain(|s| !removed.contains(&s.id));
        if self.selection.len() != before {
            self.events.publish(EditorEvent::SelectionChanged(
                self.selection.iter().map(|s| s.id.clone()).collect(),
            ));
        }
    }

    async fn refresh_editing_overlay(&mut self) {
        let Some(id) = self.drawing.editing_feature() else {
            return;
        };
        match self.store.get(&id).await {
            Ok(Some(feature)) => {
                if let Err(err) =
                    self.drawing
                        .set_feature_for_editing(&mut self.slot, &feature.geometry, id)
                {
                    tracing::warn!("Could not refresh editing overlay: {}", err);
                    self.drawing.remove_editing_feature(&mut self.slot);
                }
            }
            _ => self.drawing.remove_editing_feature(&mut self.slot),
        }
    }

    fn reject(&self, err: EditorError) -> EditorError {
        self.feedback
            .show_toast(&err.user_message(), MessageLevel::Warning);
        err
    }
}
