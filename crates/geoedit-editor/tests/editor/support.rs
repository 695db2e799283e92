//! Test doubles shared by the editor integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use geo::{BooleanOps, BoundingRect, Coord, MultiPolygon, Polygon, Simplify};
use geoedit_core::{Feature, FeatureId, FeedbackSink, Geometry, GeometryMetrics, MessageLevel, Projection};
use geoedit_editor::{FeatureSource, Interaction, MapSurface, OverlayLayer, TooltipKind};
use geoedit_service::{
    BufferRequest, CalculateRequest, GeometryResponse, GeometryService, MergeRequest,
    MetricsResponse, Operation, ServiceResult, SimplifyRequest, SplitRequest, SplitResponse,
    ValidateRequest, ValidationReport,
};
use parking_lot::Mutex;
use std::collections::HashMap;

/// Metres per degree of longitude at the equator on the WGS84 ellipsoid.
pub const METRES_PER_DEGREE_LON: f64 = 111_319.49;
/// Metres per degree of latitude at the equator on the WGS84 ellipsoid.
pub const METRES_PER_DEGREE_LAT: f64 = 110_574.27;

/// Map surface that records every call made to it.
pub struct RecordingSurface {
    pub projection: Projection,
    pub attached: Vec<Interaction>,
    pub log: Vec<String>,
    pub overlays: HashMap<OverlayLayer, Geometry>,
    pub tooltips: HashMap<TooltipKind, String>,
    pub sources: Vec<Box<dyn FeatureSource>>,
}

impl RecordingSurface {
    pub fn new(projection: Projection) -> Self {
        Self {
            projection,
            attached: Vec::new(),
            log: Vec::new(),
            overlays: HashMap::new(),
            tooltips: HashMap::new(),
            sources: Vec::new(),
        }
    }

    /// Surface whose display projection is the storage projection.
    pub fn wgs84() -> Self {
        Self::new(Projection::Wgs84)
    }

    pub fn with_source(mut self, source: impl FeatureSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    pub fn is_attached(&self, interaction: Interaction) -> bool {
        self.attached.contains(&interaction)
    }

    pub fn overlay(&self, layer: OverlayLayer) -> Option<&Geometry> {
        self.overlays.get(&layer)
    }

    pub fn tooltip(&self, kind: TooltipKind) -> Option<&str> {
        self.tooltips.get(&kind).map(String::as_str)
    }
}

impl MapSurface for RecordingSurface {
    fn attach(&mut self, interaction: Interaction) {
        self.log.push(format!("attach {:?}", interaction));
        self.attached.push(interaction);
    }

    fn detach(&mut self, interaction: Interaction) {
        if let Some(index) = self.attached.iter().position(|i| *i == interaction) {
            self.attached.remove(index);
            self.log.push(format!("detach {:?}", interaction));
        }
    }

    fn set_overlay(&mut self, layer: OverlayLayer, geometry: Option<Geometry>) {
        match geometry {
            Some(geometry) => {
                self.overlays.insert(layer, geometry);
            }
            None => {
                self.overlays.remove(&layer);
            }
        }
    }

    fn show_tooltip(&mut self, kind: TooltipKind, text: &str, _anchor: Coord<f64>) {
        self.tooltips.insert(kind, text.to_string());
    }

    fn hide_tooltip(&mut self, kind: TooltipKind) {
        self.tooltips.remove(&kind);
    }

    fn display_projection(&self) -> Projection {
        self.projection
    }

    fn feature_sources(&self) -> &[Box<dyn FeatureSource>] {
        &self.sources
    }
}

/// Feedback sink that keeps every toast.
#[derive(Default)]
pub struct RecordingFeedback {
    messages: Mutex<Vec<(MessageLevel, String)>>,
}

impl RecordingFeedback {
    pub fn messages(&self) -> Vec<(MessageLevel, String)> {
        self.messages.lock().clone()
    }

    pub fn last(&self) -> Option<(MessageLevel, String)> {
        self.messages.lock().last().cloned()
    }

    pub fn count(&self, level: MessageLevel) -> usize {
        self.messages.lock().iter().filter(|(l, _)| *l == level).count()
    }
}

impl FeedbackSink for RecordingFeedback {
    fn show_toast(&self, message: &str, level: MessageLevel) {
        self.messages.lock().push((level, message.to_string()));
    }
}

/// Geometry service computed locally with `geo`.
///
/// - merge: boolean union, rejected when the result is not one polygon
/// - split: cuts the polygon's bounding box at the mean x of the cut line
/// - buffer: square around the geometry's bounding box
/// - simplify: Ramer-Douglas-Peucker
/// - calculate: local geodesic metrics
///
/// Every call yields once before answering, so two calls joined together
/// overlap.
#[derive(Default)]
pub struct FakeGeometryService {
    calls: Mutex<Vec<Operation>>,
    split_parts: Mutex<Option<Vec<Geometry>>>,
    reject_with: Mutex<Option<String>>,
}

impl FakeGeometryService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call answer `success: false` with `message`.
    pub fn reject_with(&self, message: &str) {
        *self.reject_with.lock() = Some(message.to_string());
    }

    /// Overrides the parts returned by split.
    pub fn split_into(&self, parts: Vec<Geometry>) {
        *self.split_parts.lock() = Some(parts);
    }

    pub fn calls(&self) -> Vec<Operation> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    async fn enter(&self, operation: Operation) -> Option<String> {
        self.calls.lock().push(operation);
        tokio::task::yield_now().await;
        self.reject_with.lock().clone()
    }
}

fn geometry_response(geometry: Option<Geometry>, error: Option<String>) -> GeometryResponse {
    GeometryResponse {
        success: geometry.is_some(),
        geometry,
        error,
    }
}

fn rectangle(min: Coord<f64>, max: Coord<f64>) -> Geometry {
    Geometry::polygon(&[(min.x, min.y), (max.x, min.y), (max.x, max.y), (min.x, max.y)])
}

#[async_trait]
impl GeometryService for FakeGeometryService {
    async fn simplify(&self, request: SimplifyRequest) -> ServiceResult<GeometryResponse> {
        if let Some(message) = self.enter(Operation::Simplify).await {
            return Ok(geometry_response(None, Some(message)));
        }
        let simplified = match &request.geometry {
            Geometry::LineString(line) => Geometry::LineString(line.simplify(&request.tolerance)),
            Geometry::Polygon(polygon) => Geometry::Polygon(polygon.simplify(&request.tolerance)),
            point => point.clone(),
        };
        Ok(geometry_response(Some(simplified), None))
    }

    async fn merge(&self, request: MergeRequest) -> ServiceResult<GeometryResponse> {
        if let Some(message) = self.enter(Operation::Merge).await {
            return Ok(geometry_response(None, Some(message)));
        }
        let mut polygons = request
            .polygons
            .iter()
            .filter_map(|g| g.as_polygon().cloned());
        let Some(first) = polygons.next() else {
            return Ok(geometry_response(None, Some("Nothing to merge".to_string())));
        };
        let union = polygons.fold(MultiPolygon::new(vec![first]), |acc, p: Polygon<f64>| {
            acc.union(&MultiPolygon::new(vec![p]))
        });
        match union.0.as_slice() {
            [single] => Ok(geometry_response(Some(Geometry::Polygon(single.clone())), None)),
            _ => Ok(geometry_response(
                None,
                Some("Polygons are not contiguous".to_string()),
            )),
        }
    }

    async fn split(&self, request: SplitRequest) -> ServiceResult<SplitResponse> {
        if let Some(message) = self.enter(Operation::Split).await {
            return Ok(SplitResponse {
                success: false,
                geometries: None,
                error: Some(message),
            });
        }
        if let Some(parts) = self.split_parts.lock().clone() {
            return Ok(SplitResponse {
                success: true,
                geometries: Some(parts),
                error: None,
            });
        }

        let (Some(bbox), Some(line)) = (request.polygon.bounding_rect(), request.line.as_line_string())
        else {
            return Ok(SplitResponse {
                success: false,
                geometries: None,
                error: Some("Invalid split input".to_string()),
            });
        };
        let cut_x = line.0.iter().map(|c| c.x).sum::<f64>() / line.0.len().max(1) as f64;
        let (min, max) = (bbox.min(), bbox.max());
        let parts = if cut_x > min.x && cut_x < max.x {
            vec![
                rectangle(min, Coord { x: cut_x, y: max.y }),
                rectangle(Coord { x: cut_x, y: min.y }, max),
            ]
        } else {
            vec![request.polygon.clone()]
        };
        Ok(SplitResponse {
            success: true,
            geometries: Some(parts),
            error: None,
        })
    }

    async fn validate(&self, request: ValidateRequest) -> ServiceResult<ValidationReport> {
        self.enter(Operation::Validate).await;
        let geometry_valid = request.geometry.validate().is_ok();
        Ok(ValidationReport {
            is_valid: geometry_valid,
            geometry_valid,
            errors: if geometry_valid {
                Vec::new()
            } else {
                vec!["Invalid geometry".to_string()]
            },
            ..Default::default()
        })
    }

    async fn buffer(&self, request: BufferRequest) -> ServiceResult<GeometryResponse> {
        if let Some(message) = self.enter(Operation::Buffer).await {
            return Ok(geometry_response(None, Some(message)));
        }
        let Some(bbox) = request.geometry.to_geo().bounding_rect() else {
            return Ok(geometry_response(None, Some("Empty geometry".to_string())));
        };
        let dx = request.distance_meters / METRES_PER_DEGREE_LON;
        let dy = request.distance_meters / METRES_PER_DEGREE_LAT;
        let buffered = rectangle(
            Coord {
                x: bbox.min().x - dx,
                y: bbox.min().y - dy,
            },
            Coord {
                x: bbox.max().x + dx,
                y: bbox.max().y + dy,
            },
        );
        Ok(geometry_response(Some(buffered), None))
    }

    async fn calculate(&self, request: CalculateRequest) -> ServiceResult<MetricsResponse> {
        if let Some(message) = self.enter(Operation::Calculate).await {
            return Ok(MetricsResponse {
                success: false,
                metrics: None,
                error: Some(message),
            });
        }
        Ok(MetricsResponse {
            success: true,
            metrics: Some(GeometryMetrics::compute(&request.geometry)),
            error: None,
        })
    }
}

/// Axis-aligned square with its lower-left corner at `(x, y)`.
pub fn square(x: f64, y: f64, size: f64) -> Geometry {
    rectangle(Coord { x, y }, Coord { x: x + size, y: y + size })
}

/// Rectangle of `width` x `height` metres anchored at the equator and meridian.
pub fn metric_rectangle(width_m: f64, height_m: f64) -> Geometry {
    rectangle(
        Coord { x: 0.0, y: 0.0 },
        Coord {
            x: width_m / METRES_PER_DEGREE_LON,
            y: height_m / METRES_PER_DEGREE_LAT,
        },
    )
}

pub fn feature(id: &str, geometry: Geometry) -> Feature {
    Feature::new(FeatureId::new(id), geometry)
}

pub fn point_feature(id: &str, x: f64, y: f64) -> Feature {
    feature(id, Geometry::point(x, y))
}
