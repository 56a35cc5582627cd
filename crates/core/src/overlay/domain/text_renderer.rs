use crate::shared::frame::Frame;

/// Draws a line of overlay text onto a frame.
///
/// Implementations return a new frame and leave the input untouched, since
/// a producer may still own the source buffer until its release runs.
pub trait TextRenderer: Send {
    fn render(&self, frame: &Frame, text: &str) -> Result<Frame, Box<dyn std::error::Error>>;
}
