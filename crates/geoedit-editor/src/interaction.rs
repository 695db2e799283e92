//! Map surface abstraction and the single interaction slot.
//!
//! The host map (rendering, pointer plumbing) is reached through
//! [`MapSurface`]. Exactly one interaction mode owns the surface's event
//! pipeline at a time: [`InteractionSlot::activate`] runs the previous mode's
//! disposer before attaching the next one.

use geo::Coord;
use geoedit_core::{Extent, Feature, FeatureId, Geometry, GeometryKind, Projection};
use std::fmt;

/// Pointer interactions the surface can attach.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Interaction {
    /// Sketch a new geometry of the given kind
    Draw(GeometryKind),
    /// Snap new vertices onto existing geometry within a pixel radius
    Snap { tolerance_px: f64 },
    /// Drag vertices of the geometry on the editing overlay
    Modify,
    /// Drag a selection rectangle
    DragBox,
}

/// Transient vector overlays owned by the editing engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverlayLayer {
    /// In-progress sketch
    Sketch,
    /// Feature under vertex modification
    Editing,
    /// Clone of the polygon being split
    SplitTarget,
    /// Drawn cut line
    CutLine,
}

/// Floating tooltips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TooltipKind {
    /// Short instruction shown when sketching starts
    Help,
    /// Live length or area label
    Measure,
}

/// The map the engine draws on. All coordinates are in the display projection.
pub trait MapSurface: 'static {
    fn attach(&mut self, interaction: Interaction);

    /// Detaches an interaction. Detaching one that is not attached is a no-op.
    fn detach(&mut self, interaction: Interaction);

    /// Replaces the contents of an overlay layer; `None` clears it.
    fn set_overlay(&mut self, layer: OverlayLayer, geometry: Option<Geometry>);

    fn show_tooltip(&mut self, kind: TooltipKind, text: &str, anchor: Coord<f64>);

    fn hide_tooltip(&mut self, kind: TooltipKind);

    fn display_projection(&self) -> Projection;

    /// Renderable feature sources, in rendering order.
    fn feature_sources(&self) -> &[Box<dyn FeatureSource>];
}

/// A renderable source of features that can be queried by extent.
pub trait FeatureSource {
    /// Calls `visitor` for every feature whose geometry intersects `extent`.
    fn for_each_intersecting(&self, extent: &Extent, visitor: &mut dyn FnMut(&Feature));
}

/// Plain list of features.
#[derive(Debug, Clone, Default)]
pub struct VectorSource {
    features: Vec<Feature>,
}

impl VectorSource {
    pub fn new(features: Vec<Feature>) -> Self {
        Self { features }
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }
}

impl FeatureSource for VectorSource {
    fn for_each_intersecting(&self, extent: &Extent, visitor: &mut dyn FnMut(&Feature)) {
        self.features
            .iter()
            .filter(|f| f.geometry.intersects_extent(extent))
            .for_each(|f| visitor(f));
    }
}

/// Several nearby features rendered as one marker.
#[derive(Debug, Clone)]
pub struct Cluster {
    position: Option<Coord<f64>>,
    members: Vec<Feature>,
}

impl Cluster {
    pub fn at(position: Coord<f64>, members: Vec<Feature>) -> Self {
        Self {
            position: Some(position),
            members,
        }
    }

    /// Places the marker at the mean of the members' bounding-box centres.
    ///
    /// A cluster with no locatable member has no marker and is never hit.
    pub fn new(members: Vec<Feature>) -> Self {
        let centres: Vec<Coord<f64>> = members
            .iter()
            .filter_map(|f| f.geometry.bounding_rect())
            .map(|r| r.center())
            .collect();
        let position = (!centres.is_empty()).then(|| {
            let n = centres.len() as f64;
            let sum = centres
                .iter()
                .fold(Coord { x: 0.0, y: 0.0 }, |acc, c| Coord {
                    x: acc.x + c.x,
                    y: acc.y + c.y,
                });
            Coord {
                x: sum.x / n,
                y: sum.y / n,
            }
        });
        Self { position, members }
    }

    pub fn position(&self) -> Option<Coord<f64>> {
        self.position
    }

    pub fn members(&self) -> &[Feature] {
        &self.members
    }
}

/// Source whose features are grouped into clusters.
///
/// A cluster hit by the extent yields every one of its members.
#[derive(Debug, Clone, Default)]
pub struct ClusterSource {
    clusters: Vec<Cluster>,
}

impl ClusterSource {
    pub fn new(clusters: Vec<Cluster>) -> Self {
        Self { clusters }
    }

    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }
}

impl FeatureSource for ClusterSource {
    fn for_each_intersecting(&self, extent: &Extent, visitor: &mut dyn FnMut(&Feature)) {
        for cluster in &self.clusters {
            let Some(position) = cluster.position else {
                continue;
            };
            if Geometry::Point(position.into()).intersects_extent(extent) {
                cluster.members.iter().for_each(|f| visitor(f));
            }
        }
    }
}

/// Which tool currently owns the surface.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum InteractionMode {
    #[default]
    Idle,
    Drawing(GeometryKind),
    EditingVertices(FeatureId),
    Splitting,
    BoxSelect,
}

impl fmt::Display for InteractionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InteractionMode::Idle => write!(f, "idle"),
            InteractionMode::Drawing(kind) => write!(f, "drawing {}", kind),
            InteractionMode::EditingVertices(id) => write!(f, "editing {}", id),
            InteractionMode::Splitting => write!(f, "splitting"),
            InteractionMode::BoxSelect => write!(f, "box select"),
        }
    }
}

/// Tears down whatever an activation attached.
pub type Disposer<S> = Box<dyn FnOnce(&mut S)>;

/// The map surface plus the one interaction mode attached to it.
pub struct InteractionSlot<S: MapSurface> {
    surface: S,
    mode: InteractionMode,
    disposer: Option<Disposer<S>>,
}

impl<S: MapSurface> InteractionSlot<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            mode: InteractionMode::Idle,
            disposer: None,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn into_surface(mut self) -> S {
        self.release();
        self.surface
    }

    pub fn mode(&self) -> &InteractionMode {
        &self.mode
    }

    pub fn is_idle(&self) -> bool {
        self.mode == InteractionMode::Idle
    }

    pub fn display_projection(&self) -> Projection {
        self.surface.display_projection()
    }

    /// Disposes the current mode, then attaches `mode` via `attach`.
    ///
    /// `attach` returns the disposer that will undo it.
    pub fn activate<F>(&mut self, mode: InteractionMode, attach: F)
    where
        F: FnOnce(&mut S) -> Disposer<S>,
    {
        self.release();
        tracing::debug!("Activating interaction mode: {}", mode);
        let disposer = attach(&mut self.surface);
        self.mode = mode;
        self.disposer = Some(disposer);
    }

    /// Disposes the current mode and returns to idle. Safe to call when idle.
    pub fn release(&mut self) {
        if let Some(dispose) = self.disposer.take() {
            tracing::debug!("Releasing interaction mode: {}", self.mode);
            dispose(&mut self.surface);
        }
        self.mode = InteractionMode::Idle;
    }

    /// Releases only if `predicate` holds for the current mode.
    pub fn release_if(&mut self, predicate: impl FnOnce(&InteractionMode) -> bool) -> bool {
        if predicate(&self.mode) {
            self.release();
            true
        } else {
            false
        }
    }
}
