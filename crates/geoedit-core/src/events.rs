//! Editor event system
//!
//! Provides:
//! - Event types for editing state changes
//! - Event dispatcher for publishing events to subscribers

use tokio::sync::broadcast;

use crate::feature::FeatureId;
use crate::geometry::GeometryKind;

/// Editor event types
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    /// Undo/redo availability changed
    HistoryChanged { can_undo: bool, can_redo: bool },
    /// A new feature was drawn and stored
    DrawingCompleted { id: FeatureId, kind: GeometryKind },
    /// A feature's geometry was replaced
    FeatureModified(FeatureId),
    /// The box selection changed
    SelectionChanged(Vec<FeatureId>),
    /// A polygon was split into parts
    SplitCompleted { original: FeatureId, parts: Vec<FeatureId> },
    /// A remote geometry operation started
    OperationStarted(String),
    /// A remote geometry operation succeeded
    OperationFinished(String),
    /// A geometry operation failed
    OperationFailed { operation: String, message: String },
}

impl std::fmt::Display for EditorEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EditorEvent::HistoryChanged { can_undo, can_redo } => {
                write!(f, "History: undo={} redo={}", can_undo, can_redo)
            }
            EditorEvent::DrawingCompleted { id, kind } => write!(f, "Drew {} {}", kind, id),
            EditorEvent::FeatureModified(id) => write!(f, "Modified {}", id),
            EditorEvent::SelectionChanged(ids) => write!(f, "Selected {} feature(s)", ids.len()),
            EditorEvent::SplitCompleted { original, parts } => {
                write!(f, "Split {} into {} part(s)", original, parts.len())
            }
            EditorEvent::OperationStarted(op) => write!(f, "{} started", op),
            EditorEvent::OperationFinished(op) => write!(f, "{} finished", op),
            EditorEvent::OperationFailed { operation, message } => {
                write!(f, "{} failed: {}", operation, message)
            }
        }
    }
}

/// Event dispatcher for publishing events to subscribers
#[derive(Clone)]
pub struct EventDispatcher {
    tx: broadcast::Sender<EditorEvent>,
}

impl EventDispatcher {
    /// Create a new event dispatcher
    ///
    /// # Arguments
    /// * `buffer_size` - Size of the broadcast buffer
    pub fn new(buffer_size: usize) -> Self {
        let (tx, _) = broadcast::channel(buffer_size);
        Self { tx }
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<EditorEvent> {
        self.tx.subscribe()
    }

    /// Publish an event to all subscribers.
    ///
    /// Having no subscribers is not an error for the editor; the event is dropped.
    pub fn publish(&self, event: EditorEvent) -> usize {
        tracing::trace!("event: {}", event);
        self.tx.send(event).unwrap_or(0)
    }

    /// Get number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new(100)
    }
}
