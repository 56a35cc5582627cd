use thiserror::Error;

use crate::shared::read_context::ContextError;

/// Failure reported by a frame source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error("source is closed")]
    Closed,
    #[error("source has no more frames")]
    Exhausted,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("image decode failed: {0}")]
    Image(#[from] image::ImageError),
    #[error("{0}")]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl SourceError {
    pub fn other(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Other(err.into())
    }

    /// True when the call was aborted by its context rather than failing.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Context(_))
    }
}
