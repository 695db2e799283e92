//! GeoEdit Settings Crate
//!
//! Handles application configuration loading, persistence and validation.

pub mod config;
pub mod error;

pub use config::{Config, EditorSettings, OperationSettings, ServiceSettings};
pub use error::{SettingsError, SettingsResult};
