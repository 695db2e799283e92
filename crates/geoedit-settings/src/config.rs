//! Configuration and settings management for GeoEdit
//!
//! Provides configuration file handling and validation. Supports JSON and
//! TOML file formats stored in the platform configuration directory.
//!
//! Configuration is organized into logical sections:
//! - Geometry service settings (endpoint, timeout)
//! - Editor preferences (undo depth, display projection, snapping)
//! - Operation defaults (simplify tolerance, buffer distance)

use geoedit_core::Projection;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{SettingsError, SettingsResult};

/// Application directory name under the platform config directory
pub const APP_DIR_NAME: &str = "geoedit";

/// Default config file name
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Remote geometry service settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Base URL of the geometry service
    pub base_url: String,
    /// Path prefix of the geometry endpoint family
    pub api_prefix: String,
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            api_prefix: "/api/v1/geometry".to_string(),
            timeout_ms: 30_000,
        }
    }
}

impl ServiceSettings {
    /// Full URL of one operation endpoint.
    pub fn endpoint(&self, operation: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            self.api_prefix.trim_matches('/'),
            operation
        )
    }
}

/// Editor preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    /// Maximum number of undo entries kept
    pub undo_max_depth: usize,
    /// Projection used by the map surface
    pub display_projection: Projection,
    /// Snapping radius in pixels
    pub snap_tolerance_px: f64,
    /// Feature type excluded from box selection
    pub reserved_root_type: String,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            undo_max_depth: 50,
            display_projection: Projection::WebMercator,
            snap_tolerance_px: 10.0,
            reserved_root_type: "Site".to_string(),
        }
    }
}

/// Defaults for geometry operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperationSettings {
    /// Simplify tolerance in metres
    pub default_simplify_tolerance: f64,
    /// Keep shared boundaries intact when simplifying
    pub preserve_topology: bool,
    /// Buffer distance in metres
    pub default_buffer_meters: f64,
}

impl Default for OperationSettings {
    fn default() -> Self {
        Self {
            default_simplify_tolerance: 1.0,
            preserve_topology: true,
            default_buffer_meters: 10.0,
        }
    }
}

/// Complete application configuration
///
/// Aggregates all settings sections and provides file I/O operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Geometry service settings
    pub service: ServiceSettings,
    /// Editor preferences
    pub editor: EditorSettings,
    /// Operation defaults
    pub operations: OperationSettings,
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Default config file location (`<config dir>/geoedit/config.toml`)
    pub fn default_path() -> SettingsResult<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
            .ok_or_else(|| {
                SettingsError::ConfigDirectory("no platform config directory".to_string())
            })
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let content = std::fs::read_to_string(path)?;

        let config: Self = match extension(path).as_deref() {
            Some("json") => serde_json::from_str(&content)?,
            Some("toml") => toml::from_str(&content)?,
            other => {
                return Err(SettingsError::UnsupportedFormat(
                    other.unwrap_or("<none>").to_string(),
                ))
            }
        };

        config.validate()?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load config from file, or return defaults if the file does not exist
    pub fn load_or_default(path: &Path) -> SettingsResult<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            tracing::info!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match extension(path).as_deref() {
            Some("json") => serde_json::to_string_pretty(self)?,
            Some("toml") => toml::to_string_pretty(self)?,
            other => {
                return Err(SettingsError::UnsupportedFormat(
                    other.unwrap_or("<none>").to_string(),
                ))
            }
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> SettingsResult<()> {
        if self.service.base_url.trim().is_empty() {
            return Err(SettingsError::invalid("service.base_url", "must not be empty"));
        }

        if self.service.timeout_ms == 0 {
            return Err(SettingsError::invalid("service.timeout_ms", "must be > 0"));
        }

        if self.editor.undo_max_depth == 0 {
            return Err(SettingsError::invalid("editor.undo_max_depth", "must be > 0"));
        }

        if self.editor.snap_tolerance_px < 0.0 {
            return Err(SettingsError::invalid(
                "editor.snap_tolerance_px",
                "must not be negative",
            ));
        }

        if self.operations.default_simplify_tolerance <= 0.0 {
            return Err(SettingsError::invalid(
                "operations.default_simplify_tolerance",
                "must be > 0",
            ));
        }

        if self.operations.default_buffer_meters <= 0.0 {
            return Err(SettingsError::invalid(
                "operations.default_buffer_meters",
                "must be > 0",
            ));
        }

        Ok(())
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}
