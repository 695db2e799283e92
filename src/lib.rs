//! # GeoEdit
//!
//! Interactive map feature editing engine with support for:
//! - Point, line and polygon drawing with live geodesic measurement
//! - Vertex editing, polygon splitting and rectangle multi-select
//! - Bounded undo/redo with batched edits
//! - Remote geometry operations (simplify, merge, split, validate, buffer, calculate)
//!
//! ## Architecture
//!
//! GeoEdit is organized as a workspace with multiple crates:
//!
//! 1. **geoedit-core** - Geometry model, projections, metrics, errors, events
//! 2. **geoedit-settings** - Configuration file model and persistence
//! 3. **geoedit-service** - Geometry service contract and HTTP client
//! 4. **geoedit-editor** - Interaction tools, undo/redo, operations, editor session
//! 5. **geoedit** - Logging setup and the command line runner

pub mod cli;

pub use geoedit_core::{
    ConversionError, EditorEvent, Error, EventDispatcher, Feature, FeatureId, FeatureSummary,
    FeedbackSink, Geometry, GeometryKind, GeometryMetrics, LogFeedback, MessageLevel, Projection,
    Result,
};
pub use geoedit_editor::{
    DrawMode, EditAction, EditorError, EditorSession, FeatureStore, GeometryOperations,
    InMemoryFeatureStore, MapSurface, UndoRedoStack,
};
pub use geoedit_service::{GeometryService, HttpGeometryService, Operation};
pub use geoedit_settings::Config;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Output on stderr, so stdout stays free for command results
/// - RUST_LOG environment variable support (defaults to `info`)
///
/// Calling it more than once is harmless: the second call leaves the
/// installed subscriber in place.
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_line_number(true);

    if let Err(err) = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
    {
        tracing::debug!("Logging already initialised: {}", err);
    }

    Ok(())
}
