use ndarray::{ArrayView3, ArrayViewMut3};

/// Callback that returns a frame's backing memory to its producer.
pub type Release = Box<dyn FnOnce() + Send>;

/// One image from a frame source: contiguous pixel bytes in row-major order.
///
/// `channels` is 3 for RGB and 4 for RGBA. Pixel format negotiation happens
/// at the producer; everything downstream treats the layout as given.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
        }
    }

    /// A frame with every pixel set to `pixel` (whose length is the channel count).
    pub fn filled(width: u32, height: u32, pixel: &[u8], index: usize) -> Self {
        let data = pixel
            .iter()
            .copied()
            .cycle()
            .take((width as usize) * (height as usize) * pixel.len())
            .collect();
        Self::new(data, width, height, pixel.len() as u8, index)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    pub fn as_ndarray_mut(&mut self) -> ArrayViewMut3<'_, u8> {
        ArrayViewMut3::from_shape(self.shape(), &mut self.data)
            .expect("Frame data length must match dimensions")
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}

/// A frame handed out by a source together with its release obligation.
///
/// Whoever ends up holding the frame must run the release callback once the
/// pixels are no longer needed; pooled producers rely on it to recycle
/// buffers. Dropping a `ReleasableFrame` without calling [`into_parts`]
/// runs the callback automatically.
///
/// [`into_parts`]: ReleasableFrame::into_parts
pub struct ReleasableFrame {
    frame: Frame,
    release: Option<Release>,
}

impl ReleasableFrame {
    pub fn new(frame: Frame, release: Option<Release>) -> Self {
        Self { frame, release }
    }

    /// A frame with nothing to release.
    pub fn owned(frame: Frame) -> Self {
        Self::new(frame, None)
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    /// Swaps the pixels while keeping the original release obligation.
    pub fn map_frame(mut self, frame: Frame) -> Self {
        Self {
            frame,
            release: self.release.take(),
        }
    }

    /// Splits into the frame and a release callback, which is a no-op when
    /// the producer supplied none.
    pub fn into_parts(mut self) -> (Frame, Release) {
        let release = self.release.take().unwrap_or_else(|| Box::new(|| {}));
        let frame = std::mem::replace(&mut self.frame, Frame::new(Vec::new(), 0, 0, 0, 0));
        (frame, release)
    }

    /// Runs the release callback now and discards the frame.
    pub fn release(mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }

    pub fn has_release(&self) -> bool {
        self.release.is_some()
    }
}

impl Drop for ReleasableFrame {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl std::fmt::Debug for ReleasableFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReleasableFrame")
            .field("frame", &self.frame)
            .field("has_release", &self.release.is_some())
            .finish()
    }
}
