//! # GeoEdit Core
//!
//! Core types and utilities shared by the GeoEdit crates:
//! - **Geometry**: the editable `Point | LineString | Polygon` model with GeoJSON (de)serialisation
//! - **Projection**: the coordinate adapter between display and storage projections
//! - **Metrics**: geodesic area, length and centroid
//! - **Features**: identifiers, pass-through attributes and selection summaries
//! - **Errors**: the conversion / validation / remote / topology taxonomy
//! - **Feedback** and **Events**: outbound notifications to the host UI

pub mod error;
pub mod events;
pub mod feature;
pub mod feedback;
pub mod geometry;
pub mod metrics;
pub mod projection;
pub mod types;

pub use error::{
    ConversionError, Error, RemoteOperationError, Result, TopologyError, ValidationError,
};
pub use events::{EditorEvent, EventDispatcher};
pub use feature::{Attributes, Feature, FeatureId, FeatureSummary};
pub use feedback::{FeedbackSink, LogFeedback, MessageLevel};
pub use geometry::{extent_from_corners, Extent, Geometry, GeometryKind};
pub use metrics::{GeometryMetrics, LatLng};
pub use projection::{to_display, to_storage, Projection};
pub use types::{shared, DataCallback, Shared, SharedOption};

// Re-export the geometry primitives so downstream crates agree on one `geo` version.
pub use geo;
