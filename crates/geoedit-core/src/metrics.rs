//! Derived geometry metrics.
//!
//! Metrics are never persisted; they are always recomputed from the current
//! geometry. Measures are geodesic (WGS84 ellipsoid) and expect a geometry in
//! the storage projection. Primary units are rounded to 2 decimals, derived
//! units (hectares, kilometres) to 4.

use geo::{Centroid, GeodesicArea, GeodesicLength};
use serde::{Deserialize, Serialize};

use crate::geometry::Geometry;

const SQUARE_METRES_PER_HECTARE: f64 = 10_000.0;
const METRES_PER_KILOMETRE: f64 = 1_000.0;

/// Geographic position of a centroid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

/// Area, length and centroid of a geometry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeometryMetrics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area_m2: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area_hectares: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length_m: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length_km: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub perimeter_m: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub perimeter_km: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub centroid: Option<LatLng>,
}

impl GeometryMetrics {
    /// Computes metrics for a geometry in the storage projection.
    pub fn compute(geometry: &Geometry) -> Self {
        let mut metrics = GeometryMetrics::default();
        match geometry {
            Geometry::Point(p) => {
                metrics.centroid = Some(LatLng {
                    lat: p.y(),
                    lng: p.x(),
                });
            }
            Geometry::LineString(line) => {
                let length = line.geodesic_length();
                metrics.length_m = Some(round_to(length, 2));
                metrics.length_km = Some(round_to(length / METRES_PER_KILOMETRE, 4));
                metrics.centroid = line.centroid().map(|c| LatLng {
                    lat: c.y(),
                    lng: c.x(),
                });
            }
            Geometry::Polygon(polygon) => {
                let area = polygon.geodesic_area_unsigned();
                let perimeter = polygon.geodesic_perimeter();
                metrics.area_m2 = Some(round_to(area, 2));
                metrics.area_hectares = Some(round_to(area / SQUARE_METRES_PER_HECTARE, 4));
                metrics.perimeter_m = Some(round_to(perimeter, 2));
                metrics.perimeter_km = Some(round_to(perimeter / METRES_PER_KILOMETRE, 4));
                metrics.centroid = polygon.centroid().map(|c| LatLng {
                    lat: c.y(),
                    lng: c.x(),
                });
            }
        }
        metrics
    }

    /// Text for the floating measurement label shown while sketching.
    ///
    /// Polygons show their area, lines their length. Points have no label.
    pub fn label(&self) -> Option<String> {
        if let Some(area) = self.area_m2 {
            return Some(format_area(area));
        }
        self.length_m.map(format_length)
    }
}

/// Rounds `value` to `places` decimal places.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Formats a length in metres, switching to kilometres from 1 km.
pub fn format_length(metres: f64) -> String {
    if metres >= METRES_PER_KILOMETRE {
        format!("{:.4} km", metres / METRES_PER_KILOMETRE)
    } else {
        format!("{:.2} m", metres)
    }
}

/// Formats an area in square metres, switching to hectares from 1 ha.
pub fn format_area(square_metres: f64) -> String {
    if square_metres >= SQUARE_METRES_PER_HECTARE {
        format!("{:.4} ha", square_metres / SQUARE_METRES_PER_HECTARE)
    } else {
        format!("{:.2} m²", square_metres)
    }
}
