//! Rectangle multi-select over the map's feature sources.

use geo::Coord;
use geoedit_core::{
    extent_from_corners, shared, Extent, Feature, FeatureId, FeatureSummary, Projection, Shared,
};
use std::collections::HashSet;
use std::rc::Rc;

use crate::interaction::{
    FeatureSource, Interaction, InteractionMode, InteractionSlot, MapSurface,
};

/// Feature type excluded from box selection by default.
pub const DEFAULT_RESERVED_TYPE: &str = "Site";

/// Drag-box selection tool.
pub struct RectangleSelect {
    enabled: Shared<bool>,
    reserved_type: String,
}

impl RectangleSelect {
    pub fn new(reserved_type: impl Into<String>) -> Self {
        Self {
            enabled: shared(false),
            reserved_type: reserved_type.into(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        *self.enabled.borrow()
    }

    /// Turns box selection on or off.
    pub fn set_enabled<S: MapSurface>(&self, slot: &mut InteractionSlot<S>, enabled: bool) {
        if enabled {
            self.enable(slot);
        } else {
            self.disable(slot);
        }
    }

    pub fn enable<S: MapSurface>(&self, slot: &mut InteractionSlot<S>) {
        let enabled = Rc::clone(&self.enabled);
        slot.activate(InteractionMode::BoxSelect, move |surface| {
            surface.attach(Interaction::DragBox);
            *enabled.borrow_mut() = true;
            Box::new(move |surface: &mut S| {
                surface.detach(Interaction::DragBox);
                *enabled.borrow_mut() = false;
            })
        });
    }

    pub fn disable<S: MapSurface>(&self, slot: &mut InteractionSlot<S>) {
        slot.release_if(|mode| *mode == InteractionMode::BoxSelect);
        *self.enabled.borrow_mut() = false;
    }

    /// Selects the features under the dragged rectangle.
    ///
    /// Returns an empty list while the tool is disabled.
    pub fn on_drag_end<S: MapSurface>(
        &self,
        slot: &InteractionSlot<S>,
        start: Coord<f64>,
        end: Coord<f64>,
    ) -> Vec<FeatureSummary> {
        if !self.is_enabled() {
            return Vec::new();
        }
        let surface = slot.surface();
        let summaries = select_in_extent(
            surface.feature_sources(),
            &extent_from_corners(start, end),
            surface.display_projection(),
            &self.reserved_type,
        );
        tracing::debug!("Box selection picked {} feature(s)", summaries.len());
        summaries
    }
}

impl Default for RectangleSelect {
    fn default() -> Self {
        Self::new(DEFAULT_RESERVED_TYPE)
    }
}

/// Collects summaries of every identified, non-reserved feature intersecting
/// `extent`, in source order and without duplicates.
pub fn select_in_extent(
    sources: &[Box<dyn FeatureSource>],
    extent: &Extent,
    projection: Projection,
    reserved_type: &str,
) -> Vec<FeatureSummary> {
    let mut seen: HashSet<FeatureId> = HashSet::new();
    let mut summaries = Vec::new();

    for source in sources {
        source.for_each_intersecting(extent, &mut |feature| {
            let Some(id) = feature.id.as_ref() else {
                return;
            };
            if feature.is_of_type(reserved_type) || !seen.insert(id.clone()) {
                return;
            }
            summaries.push(summarize(id, feature, projection));
        });
    }

    summaries
}

fn summarize(id: &FeatureId, feature: &Feature, projection: Projection) -> FeatureSummary {
    let geometry = match projection.to_storage(&feature.geometry) {
        Ok(geometry) => Some(geometry),
        Err(err) => {
            tracing::warn!("Selected feature {} has an unusable geometry: {}", id, err);
            None
        }
    };

    FeatureSummary {
        id: id.clone(),
        feature_type: feature.feature_type().map(str::to_string),
        title: feature.title(),
        attributes: feature.attributes.clone(),
        geometry,
    }
}
