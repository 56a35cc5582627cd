use thiserror::Error;

use crate::source::domain::dependencies::ResolveError;
use crate::source::domain::source_error::SourceError;

/// Errors surfaced by the FPS overlay.
#[derive(Debug, Error)]
pub enum OverlayError {
    #[error("invalid configuration: {0}")]
    Configuration(String),
    #[error("unable to find source {name:?}")]
    DependencyResolution { name: String },
    #[error("source {name:?} is a {kind}, not a frame source")]
    UnsupportedSource { name: String, kind: String },
    #[error("could not get next frame from {name:?}: {source}")]
    UpstreamRead { name: String, source: SourceError },
    #[error("no source attached")]
    NotReady,
    #[error("unable to get properties of {name:?}: {source}")]
    Properties { name: String, source: SourceError },
    #[error("failed to close {name:?}: {source}")]
    Close { name: String, source: SourceError },
    #[error("overlay rendering failed: {0}")]
    Render(String),
}

impl OverlayError {
    /// Name of the upstream source the error implicates, if any.
    pub fn upstream_name(&self) -> Option<&str> {
        match self {
            Self::DependencyResolution { name }
            | Self::UnsupportedSource { name, .. }
            | Self::UpstreamRead { name, .. }
            | Self::Properties { name, .. }
            | Self::Close { name, .. } => Some(name),
            Self::Configuration(_) | Self::NotReady | Self::Render(_) => None,
        }
    }
}

impl From<ResolveError> for OverlayError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::NotFound(name) => Self::DependencyResolution { name },
            ResolveError::Unsupported { name, kind } => Self::UnsupportedSource { name, kind },
        }
    }
}

/// Lets a decorated source report through the plain [`SourceError`] channel.
///
/// Cancellation keeps its identity so callers stacking decorators can still
/// tell an aborted read from a failed one.
impl From<OverlayError> for SourceError {
    fn from(err: OverlayError) -> Self {
        match err {
            OverlayError::UpstreamRead {
                source: SourceError::Context(ctx),
                ..
            } => SourceError::Context(ctx),
            other => SourceError::other(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::read_context::ContextError;

    #[test]
    fn test_resolve_errors_map_to_taxonomy() {
        let err = OverlayError::from(ResolveError::NotFound("cam".into()));
        assert!(matches!(err, OverlayError::DependencyResolution { ref name } if name == "cam"));

        let err = OverlayError::from(ResolveError::Unsupported {
            name: "arm".into(),
            kind: "motor".into(),
        });
        assert_eq!(err.to_string(), r#"source "arm" is a motor, not a frame source"#);
    }

    #[test]
    fn test_upstream_name() {
        let err = OverlayError::UpstreamRead {
            name: "cam".into(),
            source: SourceError::Exhausted,
        };
        assert_eq!(err.upstream_name(), Some("cam"));
        assert_eq!(OverlayError::NotReady.upstream_name(), None);
    }

    #[test]
    fn test_upstream_read_message_names_source() {
        let err = OverlayError::UpstreamRead {
            name: "cam".into(),
            source: SourceError::Closed,
        };
        assert_eq!(
            err.to_string(),
            r#"could not get next frame from "cam": source is closed"#
        );
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_cancellation_survives_conversion() {
        let err = OverlayError::UpstreamRead {
            name: "cam".into(),
            source: SourceError::Context(ContextError::Cancelled),
        };
        assert!(matches!(
            SourceError::from(err),
            SourceError::Context(ContextError::Cancelled)
        ));
        assert!(matches!(
            SourceError::from(OverlayError::NotReady),
            SourceError::Other(_)
        ));
    }
}
