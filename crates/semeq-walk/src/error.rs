//! Error types for the walk crate.

use semeq_rules::CancelReason;
use semeq_types::{AttributePath, Diagnostics};

/// Errors that stop a walk as a whole.
///
/// Failures of individual nodes never end up here; they become `Error`
/// diagnostics on an otherwise complete result.
#[derive(Debug, thiserror::Error)]
pub enum WalkError {
    /// The cancellation token fired or the deadline passed. No merged tree
    /// is produced; `diagnostics` holds what was collected before the stop,
    /// followed by the cancellation entry.
    #[error("walk stopped at {path}: {reason}")]
    Cancelled {
        path: AttributePath,
        reason: CancelReason,
        diagnostics: Diagnostics,
    },

    /// Walk configuration could not be parsed.
    #[error("configuration error: {0}")]
    Config(String),
}

impl WalkError {
    /// Returns `true` for [`WalkError::Cancelled`].
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Diagnostics attached to the error, if any.
    pub fn diagnostics(&self) -> Option<&Diagnostics> {
        match self {
            Self::Cancelled { diagnostics, .. } => Some(diagnostics),
            Self::Config(_) => None,
        }
    }
}

/// Convenience alias for walk results.
pub type WalkResult<T> = Result<T, WalkError>;
