//! Features: a stable identifier, a geometry and pass-through attributes.
//!
//! Attributes belong to the domain layer; the editing engine only reads the
//! `type` key (to exclude the reserved root type from selections) and a title
//! key for display.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::geometry::Geometry;

/// Opaque attribute mapping owned by the domain layer.
pub type Attributes = serde_json::Map<String, serde_json::Value>;

/// Attribute key holding the domain type of a feature.
pub const TYPE_ATTRIBUTE: &str = "type";

/// Attribute keys consulted, in order, for a display title.
const TITLE_ATTRIBUTES: [&str; 3] = ["name", "title", "label"];

/// Stable feature identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureId(String);

impl FeatureId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for FeatureId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A feature as rendered by the map or held by the feature store.
///
/// Map sources may carry features without an identifier; those are never
/// selectable or editable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub id: Option<FeatureId>,
    pub geometry: Geometry,
    #[serde(default)]
    pub attributes: Attributes,
}

impl Feature {
    pub fn new(id: FeatureId, geometry: Geometry) -> Self {
        Self {
            id: Some(id),
            geometry,
            attributes: Attributes::new(),
        }
    }

    /// Creates a feature without an identifier.
    pub fn anonymous(geometry: Geometry) -> Self {
        Self {
            id: None,
            geometry,
            attributes: Attributes::new(),
        }
    }

    pub fn with_attribute(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }

    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    /// Domain type from the `type` attribute.
    pub fn feature_type(&self) -> Option<&str> {
        self.attributes.get(TYPE_ATTRIBUTE).and_then(|v| v.as_str())
    }

    /// Whether this feature is of the reserved root type.
    pub fn is_of_type(&self, reserved: &str) -> bool {
        self.feature_type() == Some(reserved)
    }

    /// Display title from the first present title attribute, else the id.
    pub fn title(&self) -> String {
        TITLE_ATTRIBUTES
            .iter()
            .find_map(|key| self.attributes.get(*key).and_then(|v| v.as_str()))
            .map(str::to_string)
            .or_else(|| self.id.as_ref().map(|id| id.to_string()))
            .unwrap_or_default()
    }
}

/// Lightweight selection result handed to the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSummary {
    pub id: FeatureId,
    #[serde(rename = "type")]
    pub feature_type: Option<String>,
    pub title: String,
    pub attributes: Attributes,
    /// Geometry in the storage projection, `None` when conversion failed.
    pub geometry: Option<Geometry>,
}
