use std::path::Path;

use crate::shared::frame::Frame;

/// Persists one overlaid frame.
pub trait ImageWriter: Send {
    fn write(&self, path: &Path, frame: &Frame) -> Result<(), Box<dyn std::error::Error>>;
}
