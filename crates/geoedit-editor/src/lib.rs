//! # GeoEdit Editor
//!
//! Interactive editing engine layered over a host map surface.
//!
//! ## Core Components
//!
//! ### Interaction slot
//! - **InteractionSlot**: owns the [`MapSurface`] and the single active interaction mode
//! - Activating a mode always disposes the previous one first
//!
//! ### Tools
//! - **DrawingController**: point/line/polygon drawing with live measurement, and vertex editing
//! - **SplitTool**: split a polygon along a drawn cut line
//! - **RectangleSelect**: box selection with cluster expansion
//!
//! ### History
//! - **UndoRedoStack**: bounded undo/redo over feature store mutations, with batching
//!
//! ### Operations
//! - **GeometryOperations**: single-flight bridge to the remote geometry service
//!
//! ## Architecture
//!
//! ```text
//! EditorSession (public API)
//!   ├── InteractionSlot<S: MapSurface>
//!   ├── DrawingController / SplitTool / RectangleSelect
//!   ├── UndoRedoStack ── FeatureStore
//!   └── GeometryOperations ── GeometryService
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use geoedit_editor::{DrawMode, EditorSession, InMemoryFeatureStore};
//!
//! let mut session = EditorSession::new(surface, store, service, feedback, &config);
//! session.start_drawing(DrawMode::Polygon);
//! // ... pointer events from the host map ...
//! session.finish_drawing(sketch, Default::default()).await?;
//! session.undo().await?;
//! ```

pub mod drawing;
pub mod error;
mod guard;
pub mod history;
pub mod interaction;
pub mod operations;
pub mod selection;
pub mod session;
pub mod split;
pub mod store;

pub use drawing::{CompletedDrawing, DrawMode, DrawingController, DrawingSession, VertexEdit};
pub use error::{
    EditorError, EditorResult, HistoryError, HistoryResult, StoreError, StoreResult,
};
pub use history::{EditAction, HistoryStatus, UndoRedoStack, UndoableAction};
pub use interaction::{
    Cluster, ClusterSource, Disposer, FeatureSource, Interaction, InteractionMode,
    InteractionSlot, MapSurface, OverlayLayer, TooltipKind, VectorSource,
};
pub use operations::{GeometryOperations, OperationOutput, OperationResult};
pub use selection::{select_in_extent, RectangleSelect};
pub use session::EditorSession;
pub use split::{validate_cut_line, SplitOutcome, SplitState, SplitTool};
pub use store::{FeatureStore, InMemoryFeatureStore};
