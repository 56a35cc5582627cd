use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

use crate::source::domain::frame_source::FrameSource;

/// A named resource made available to a component by its host.
pub enum Dependency {
    FrameSource(Box<dyn FrameSource>),
    /// Any resource that cannot stream frames; `kind` names what it is.
    Other { kind: String },
}

impl Dependency {
    pub fn kind(&self) -> &str {
        match self {
            Dependency::FrameSource(_) => "frame source",
            Dependency::Other { kind } => kind,
        }
    }
}

impl fmt::Debug for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dependency({})", self.kind())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("no dependency named {0:?}")]
    NotFound(String),
    #[error("dependency {name:?} is a {kind}, not a frame source")]
    Unsupported { name: String, kind: String },
}

/// Lookup-by-name set of resources handed to a component at (re)configuration.
///
/// Resolving a frame source moves it out of the set: the resolver becomes
/// its sole owner and is responsible for closing it.
#[derive(Debug, Default)]
pub struct Dependencies {
    entries: HashMap<String, Dependency>,
}

impl Dependencies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, dependency: Dependency) -> &mut Self {
        self.entries.insert(name.into(), dependency);
        self
    }

    pub fn insert_frame_source(
        &mut self,
        name: impl Into<String>,
        source: Box<dyn FrameSource>,
    ) -> &mut Self {
        self.insert(name, Dependency::FrameSource(source))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Takes ownership of the frame source registered under `name`.
    ///
    /// A dependency of another kind is left in place.
    pub fn resolve_frame_source(
        &mut self,
        name: &str,
    ) -> Result<Box<dyn FrameSource>, ResolveError> {
        match self.entries.get(name) {
            None => return Err(ResolveError::NotFound(name.to_string())),
            Some(Dependency::Other { kind }) => {
                return Err(ResolveError::Unsupported {
                    name: name.to_string(),
                    kind: kind.clone(),
                })
            }
            Some(Dependency::FrameSource(_)) => {}
        }
        match self.entries.remove(name) {
            Some(Dependency::FrameSource(source)) => Ok(source),
            _ => Err(ResolveError::NotFound(name.to_string())),
        }
    }
}
