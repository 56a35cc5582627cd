use crossbeam_channel::{Receiver, Sender};

use crate::shared::frame::ReleasableFrame;
use crate::shared::read_context::{ContextError, ReadContext};
use crate::source::domain::frame_source::{FrameSource, SourceProperties};
use crate::source::domain::source_error::SourceError;

type CloseHook = Box<dyn FnOnce() + Send>;

/// Frame source fed by a producer thread over a channel.
///
/// `next_frame` blocks until a frame arrives, the context is cancelled, or
/// its deadline passes. A disconnected producer reads as
/// [`SourceError::Exhausted`].
pub struct ChannelSource {
    frames: Receiver<ReleasableFrame>,
    properties: SourceProperties,
    on_close: Option<CloseHook>,
    closed: bool,
}

impl ChannelSource {
    pub fn new(frames: Receiver<ReleasableFrame>, properties: SourceProperties) -> Self {
        Self {
            frames,
            properties,
            on_close: None,
            closed: false,
        }
    }

    /// Creates a source and the sender a producer pushes frames into.
    pub fn bounded(capacity: usize, properties: SourceProperties) -> (Sender<ReleasableFrame>, Self) {
        let (tx, rx) = crossbeam_channel::bounded(capacity);
        (tx, Self::new(rx, properties))
    }

    /// Runs `hook` on the first `close`, typically to stop the producer.
    pub fn with_close_hook(mut self, hook: impl FnOnce() + Send + 'static) -> Self {
        self.on_close = Some(Box::new(hook));
        self
    }
}

impl FrameSource for ChannelSource {
    fn properties(&mut self, _ctx: &ReadContext) -> Result<SourceProperties, SourceError> {
        if self.closed {
            return Err(SourceError::Closed);
        }
        Ok(self.properties)
    }

    fn next_frame(&mut self, ctx: &ReadContext) -> Result<ReleasableFrame, SourceError> {
        if self.closed {
            return Err(SourceError::Closed);
        }
        ctx.check()?;
        let deadline = match ctx.deadline() {
            Some(at) => crossbeam_channel::at(at),
            None => crossbeam_channel::never(),
        };
        crossbeam_channel::select! {
            recv(self.frames) -> msg => msg.map_err(|_| SourceError::Exhausted),
            recv(ctx.cancelled()) -> _ => Err(ContextError::Cancelled.into()),
            recv(deadline) -> _ => Err(ContextError::DeadlineExceeded.into()),
        }
    }

    fn close(&mut self, _ctx: &ReadContext) -> Result<(), SourceError> {
        self.closed = true;
        // Frames still queued are dropped here, which runs their release callbacks.
        while self.frames.try_recv().is_ok() {}
        if let Some(hook) = self.on_close.take() {
            hook();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::frame::Frame;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn frame(index: usize) -> ReleasableFrame {
        ReleasableFrame::owned(Frame::filled(2, 2, &[0, 0, 0], index))
    }

    #[test]
    fn test_frames_arrive_in_order() {
        let (tx, mut source) = ChannelSource::bounded(4, SourceProperties::default());
        tx.send(frame(0)).unwrap();
        tx.send(frame(1)).unwrap();
        let ctx = ReadContext::background();
        assert_eq!(source.next_frame(&ctx).unwrap().frame().index(), 0);
        assert_eq!(source.next_frame(&ctx).unwrap().frame().index(), 1);
    }

    #[test]
    fn test_disconnected_producer_is_exhausted() {
        let (tx, mut source) = ChannelSource::bounded(1, SourceProperties::default());
        drop(tx);
        let err = source.next_frame(&ReadContext::background()).unwrap_err();
        assert!(matches!(err, SourceError::Exhausted));
    }

    #[test]
    fn test_cancel_unblocks_waiting_read() {
        let (_tx, mut source) = ChannelSource::bounded(1, SourceProperties::default());
        let (ctx, handle) = ReadContext::with_cancel();
        let canceller = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            handle.cancel();
        });
        let err = source.next_frame(&ctx).unwrap_err();
        canceller.join().unwrap();
        assert!(matches!(err, SourceError::Context(ContextError::Cancelled)));
    }

    #[test]
    fn test_deadline_unblocks_waiting_read() {
        let (_tx, mut source) = ChannelSource::bounded(1, SourceProperties::default());
        let ctx = ReadContext::background().with_timeout(Duration::from_millis(10));
        let err = source.next_frame(&ctx).unwrap_err();
        assert!(matches!(
            err,
            SourceError::Context(ContextError::DeadlineExceeded)
        ));
    }

    #[test]
    fn test_close_runs_hook_once_and_releases_queued_frames() {
        let released = Arc::new(AtomicUsize::new(0));
        let hooks = Arc::new(AtomicUsize::new(0));
        let (tx, source) = ChannelSource::bounded(2, SourceProperties::default());
        let hook_counter = Arc::clone(&hooks);
        let mut source = source.with_close_hook(move || {
            hook_counter.fetch_add(1, Ordering::SeqCst);
        });
        let counter = Arc::clone(&released);
        tx.send(ReleasableFrame::new(
            Frame::filled(1, 1, &[0, 0, 0], 0),
            Some(Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })),
        ))
        .unwrap();

        let ctx = ReadContext::background();
        source.close(&ctx).unwrap();
        source.close(&ctx).unwrap();

        assert_eq!(hooks.load(Ordering::SeqCst), 1);
        assert_eq!(released.load(Ordering::SeqCst), 1);
        assert!(matches!(source.next_frame(&ctx), Err(SourceError::Closed)));
    }
}
