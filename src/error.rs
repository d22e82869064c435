//! Error types.
//!
//! Only programmer errors are reported. Ghost starts, events from a
//! non-owning modality and cancel without a gesture are normal control flow.

use thiserror::Error;

use crate::types::HandlerId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PointerError {
    /// Operating on a start handler id that was never registered or has
    /// been unregistered.
    #[error("Invalid handlerId: {0}")]
    InvalidHandler(HandlerId),

    /// Process-wide listener support was already resolved.
    #[error("listener support is already configured")]
    AlreadyConfigured,

    /// Options document could not be parsed.
    #[error("invalid arbiter options: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, PointerError>;
