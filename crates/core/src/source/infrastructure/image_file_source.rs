use std::path::Path;

use crate::shared::frame::{Frame, ReleasableFrame};
use crate::shared::read_context::ReadContext;
use crate::source::domain::frame_source::{FrameSource, ImageType, SourceProperties};
use crate::source::domain::source_error::SourceError;

/// Serves one decoded still image as an endless stream of RGB frames.
///
/// Decoding happens once at construction; every read hands out a copy
/// with an increasing frame index.
pub struct ImageFileSource {
    frame: Option<Frame>,
    next_index: usize,
}

impl ImageFileSource {
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let img = image::open(path)?.to_rgb8();
        let (width, height) = img.dimensions();
        let frame = Frame::new(img.into_raw(), width, height, 3, 0);
        log::debug!("Decoded {} ({width}x{height})", path.display());
        Ok(Self {
            frame: Some(frame),
            next_index: 0,
        })
    }

    pub fn from_frame(frame: Frame) -> Self {
        Self {
            frame: Some(frame),
            next_index: 0,
        }
    }
}

impl FrameSource for ImageFileSource {
    fn properties(&mut self, _ctx: &ReadContext) -> Result<SourceProperties, SourceError> {
        let frame = self.frame.as_ref().ok_or(SourceError::Closed)?;
        Ok(SourceProperties {
            image_type: ImageType::Color,
            width: Some(frame.width()),
            height: Some(frame.height()),
        })
    }

    fn next_frame(&mut self, ctx: &ReadContext) -> Result<ReleasableFrame, SourceError> {
        ctx.check()?;
        let frame = self.frame.as_ref().ok_or(SourceError::Closed)?;
        let copy = Frame::new(
            frame.data().to_vec(),
            frame.width(),
            frame.height(),
            frame.channels(),
            self.next_index,
        );
        self.next_index += 1;
        Ok(ReleasableFrame::owned(copy))
    }

    fn close(&mut self, _ctx: &ReadContext) -> Result<(), SourceError> {
        self.frame = None;
        Ok(())
    }
}
