//! User-facing feedback sink.
//!
//! Toast presentation lives outside the engine; components only need somewhere
//! to send a message and a severity.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Toast severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl fmt::Display for MessageLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Success => write!(f, "success"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Destination for operator-facing messages.
pub trait FeedbackSink: Send + Sync {
    fn show_toast(&self, message: &str, level: MessageLevel);
}

/// Feedback sink that writes toasts to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogFeedback;

impl FeedbackSink for LogFeedback {
    fn show_toast(&self, message: &str, level: MessageLevel) {
        match level {
            MessageLevel::Info | MessageLevel::Success => tracing::info!(%level, "{}", message),
            MessageLevel::Warning => tracing::warn!("{}", message),
            MessageLevel::Error => tracing::error!("{}", message),
        }
    }
}
