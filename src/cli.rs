//! One-shot geometry operations from the command line.
//!
//! `geoedit <calculate|validate|simplify|buffer> <file.geojson> [value]`
//!
//! The input file holds one GeoJSON geometry in longitude/latitude, either bare
//! or wrapped in a `Feature`. The result is printed as JSON.

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use geoedit_core::Geometry;
use geoedit_editor::GeometryOperations;
use geoedit_service::ValidateOptions;
use geoedit_settings::OperationSettings;
use serde_json::{json, Value};
use std::fmt;
use std::path::{Path, PathBuf};

/// Run a geometry service operation on a GeoJSON file.
#[derive(Debug, Parser)]
#[command(name = "geoedit", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub operation: CliOperation,
}

/// Operation requested on the command line.
#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum CliOperation {
    /// Area, length, perimeter and centroid
    Calculate {
        /// GeoJSON geometry or feature
        input: PathBuf,
    },
    /// Geometry validity report
    Validate {
        /// GeoJSON geometry or feature
        input: PathBuf,
    },
    /// Simplify with a tolerance in metres
    Simplify {
        /// GeoJSON geometry or feature
        input: PathBuf,
        /// Defaults to `operations.default_simplify_tolerance`
        #[arg(value_name = "TOLERANCE", allow_negative_numbers = true)]
        tolerance: Option<f64>,
    },
    /// Buffer by a distance in metres
    Buffer {
        /// GeoJSON geometry or feature
        input: PathBuf,
        /// Defaults to `operations.default_buffer_meters`
        #[arg(value_name = "METRES", allow_negative_numbers = true)]
        distance_meters: Option<f64>,
    },
}

impl CliOperation {
    /// The GeoJSON file the operation reads.
    pub fn input(&self) -> &Path {
        match self {
            CliOperation::Calculate { input }
            | CliOperation::Validate { input }
            | CliOperation::Simplify { input, .. }
            | CliOperation::Buffer { input, .. } => input,
        }
    }
}

impl fmt::Display for CliOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliOperation::Calculate { .. } => write!(f, "calculate"),
            CliOperation::Validate { .. } => write!(f, "validate"),
            CliOperation::Simplify { .. } => write!(f, "simplify"),
            CliOperation::Buffer { .. } => write!(f, "buffer"),
        }
    }
}

/// Reads one geometry from a GeoJSON file.
pub fn read_geometry(path: &Path) -> anyhow::Result<Geometry> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_geometry(&content).with_context(|| format!("invalid GeoJSON in {}", path.display()))
}

/// Parses a bare GeoJSON geometry or a `Feature` wrapping one.
pub fn parse_geometry(content: &str) -> anyhow::Result<Geometry> {
    let value: Value = serde_json::from_str(content)?;
    let geometry = match value.get("type").and_then(Value::as_str) {
        Some("Feature") => value
            .get("geometry")
            .cloned()
            .ok_or_else(|| anyhow!("feature has no geometry"))?,
        _ => value,
    };
    Ok(serde_json::from_value(geometry)?)
}

/// Runs `operation` on `geometry` and returns the JSON to print.
pub async fn run(
    operation: &CliOperation,
    geometry: &Geometry,
    operations: &GeometryOperations,
    defaults: &OperationSettings,
) -> anyhow::Result<Value> {
    tracing::info!("Running {} on a {}", operation, geometry.kind());
    let output = match operation {
        CliOperation::Calculate { .. } => {
            let metrics = operations.calculate(geometry).await?;
            json!({ "metrics": metrics })
        }
        CliOperation::Validate { .. } => {
            let report = operations
                .validate(geometry, ValidateOptions::default())
                .await?;
            serde_json::to_value(report)?
        }
        CliOperation::Simplify { tolerance, .. } => {
            let tolerance = tolerance.unwrap_or(defaults.default_simplify_tolerance);
            let simplified = operations
                .simplify(geometry, tolerance, defaults.preserve_topology)
                .await?;
            json!({ "geometry": simplified })
        }
        CliOperation::Buffer {
            distance_meters, ..
        } => {
            let distance = distance_meters.unwrap_or(defaults.default_buffer_meters);
            let buffered = operations.buffer(geometry, distance).await?;
            json!({ "geometry": buffered })
        }
    };
    Ok(output)
}
