//! Wire types of the remote geometry service.
//!
//! One JSON request/response pair per endpoint. Every geometry on the wire is
//! a GeoJSON geometry object in WGS84 longitude/latitude.

use geoedit_core::{Geometry, GeometryMetrics};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The service endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Simplify,
    Merge,
    Split,
    Validate,
    Buffer,
    Calculate,
}

impl Operation {
    /// Endpoint path segment.
    pub fn path(&self) -> &'static str {
        match self {
            Operation::Simplify => "simplify",
            Operation::Merge => "merge",
            Operation::Split => "split",
            Operation::Validate => "validate",
            Operation::Buffer => "buffer",
            Operation::Calculate => "calculate",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimplifyRequest {
    pub geometry: Geometry,
    pub tolerance: f64,
    pub preserve_topology: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeRequest {
    pub polygons: Vec<Geometry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitRequest {
    pub polygon: Geometry,
    pub line: Geometry,
}

/// Optional checks requested alongside geometric validity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidateOptions {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub check_within_site: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_id: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub check_duplicates: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidateRequest {
    pub geometry: Geometry,
    #[serde(flatten)]
    pub options: ValidateOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BufferRequest {
    pub geometry: Geometry,
    pub distance_meters: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculateRequest {
    pub geometry: Geometry,
}

/// Response of simplify, merge and buffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryResponse {
    pub success: bool,
    #[serde(default)]
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitResponse {
    pub success: bool,
    #[serde(default)]
    pub geometries: Option<Vec<Geometry>>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsResponse {
    pub success: bool,
    #[serde(default)]
    pub metrics: Option<GeometryMetrics>,
    #[serde(default)]
    pub error: Option<String>,
}

/// A nearby feature reported as a possible duplicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateCandidate {
    pub id: String,
    pub distance: f64,
    #[serde(rename = "type")]
    pub object_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub geometry_valid: bool,
    #[serde(default)]
    pub within_site: Option<bool>,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub duplicates: Option<Vec<DuplicateCandidate>>,
}
