use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::SendTimeoutError;

use crate::shared::frame::{Frame, ReleasableFrame};
use crate::source::domain::frame_source::{ImageType, SourceProperties};
use crate::source::infrastructure::channel_source::ChannelSource;

/// Synthetic camera that emits a scrolling RGB gradient at a fixed rate.
///
/// Frames are produced on a background thread into a one-slot channel, so
/// a consumer that keeps up observes roughly `fps` frames per second.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TestPattern {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
}

impl TestPattern {
    pub fn new(width: u32, height: u32, fps: f64) -> Result<Self, &'static str> {
        if width == 0 || height == 0 {
            return Err("test pattern dimensions must be non-zero");
        }
        if !(fps.is_finite() && fps > 0.0) {
            return Err("test pattern fps must be positive");
        }
        Ok(Self { width, height, fps })
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.fps)
    }

    /// Renders frame `index`: red scrolls horizontally, green follows the row.
    pub fn render(&self, index: usize) -> Frame {
        let (w, h) = (self.width as usize, self.height as usize);
        let mut data = Vec::with_capacity(w * h * 3);
        for y in 0..h {
            let g = (y * 255 / h.max(1)) as u8;
            for x in 0..w {
                let r = (x + index % 64 * 4) as u8;
                data.extend_from_slice(&[r, g, 128]);
            }
        }
        Frame::new(data, self.width, self.height, 3, index)
    }

    /// Starts the producer thread; closing the returned source stops it.
    pub fn spawn(self) -> ChannelSource {
        let properties = SourceProperties {
            image_type: ImageType::Color,
            width: Some(self.width),
            height: Some(self.height),
        };
        let (tx, source) = ChannelSource::bounded(1, properties);
        let stop = Arc::new(AtomicBool::new(false));
        let interval = self.frame_interval();

        let producer_stop = Arc::clone(&stop);
        let handle = thread::spawn(move || {
            let mut index = 0usize;
            while !producer_stop.load(Ordering::Relaxed) {
                thread::sleep(interval);
                let mut pending = ReleasableFrame::owned(self.render(index));
                loop {
                    match tx.send_timeout(pending, interval) {
                        Ok(()) => break,
                        Err(SendTimeoutError::Timeout(frame)) => {
                            if producer_stop.load(Ordering::Relaxed) {
                                return;
                            }
                            pending = frame;
                        }
                        Err(SendTimeoutError::Disconnected(_)) => return,
                    }
                }
                index += 1;
            }
            log::debug!("Test pattern producer stopped after {index} frames");
        });

        source.with_close_hook(move || {
            stop.store(true, Ordering::Relaxed);
            if handle.join().is_err() {
                log::warn!("Test pattern producer panicked");
            }
        })
    }
}
