use crate::shared::frame::ReleasableFrame;
use crate::shared::read_context::ReadContext;
use crate::source::domain::source_error::SourceError;

/// What kind of image a source streams.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ImageType {
    Color,
    Depth,
    #[default]
    Unspecified,
}

/// Stream description queried once when a source is attached.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SourceProperties {
    pub image_type: ImageType,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// A camera-like producer of frames.
///
/// Calls are issued sequentially by one owner. `next_frame` may block and
/// must give up with [`SourceError::Context`] once `ctx` is cancelled or
/// past its deadline.
pub trait FrameSource: Send {
    /// Describes the stream (pixel kind, native size).
    fn properties(&mut self, ctx: &ReadContext) -> Result<SourceProperties, SourceError>;

    /// Produces the next frame along with its release obligation.
    fn next_frame(&mut self, ctx: &ReadContext) -> Result<ReleasableFrame, SourceError>;

    /// Releases any resources held by the source.
    fn close(&mut self, ctx: &ReadContext) -> Result<(), SourceError>;
}
