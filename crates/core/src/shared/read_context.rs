use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use thiserror::Error;

/// Why a context stopped admitting work.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ContextError {
    #[error("operation cancelled")]
    Cancelled,
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

/// Cancellation signal and optional deadline carried into blocking calls.
///
/// Cancellation is signalled by disconnecting a channel, so sources that
/// block on a `crossbeam_channel` can wait on [`cancelled`] in the same
/// `select!` as their frame channel.
///
/// [`cancelled`]: ReadContext::cancelled
#[derive(Clone, Debug)]
pub struct ReadContext {
    cancelled: Receiver<()>,
    deadline: Option<Instant>,
}

/// Cancels every clone of the context it was created with.
///
/// Dropping the handle cancels as well.
#[derive(Debug)]
pub struct CancelHandle {
    tx: Sender<()>,
}

impl CancelHandle {
    pub fn cancel(self) {
        drop(self.tx);
    }
}

impl ReadContext {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self {
            cancelled: crossbeam_channel::never(),
            deadline: None,
        }
    }

    pub fn with_cancel() -> (Self, CancelHandle) {
        let (tx, rx) = crossbeam_channel::bounded(0);
        (
            Self {
                cancelled: rx,
                deadline: None,
            },
            CancelHandle { tx },
        )
    }

    /// Derives a context that also expires after `timeout`.
    ///
    /// An earlier deadline already present is kept.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        };
        Self {
            cancelled: self.cancelled.clone(),
            deadline: Some(deadline),
        }
    }

    /// Becomes ready (with a disconnect error) once the context is cancelled.
    pub fn cancelled(&self) -> &Receiver<()> {
        &self.cancelled
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns the reason this context is done, or `None` while it is live.
    pub fn err(&self) -> Option<ContextError> {
        if let Err(TryRecvError::Disconnected) = self.cancelled.try_recv() {
            return Some(ContextError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(ContextError::DeadlineExceeded),
            _ => None,
        }
    }

    pub fn check(&self) -> Result<(), ContextError> {
        self.err().map_or(Ok(()), Err)
    }
}

impl Default for ReadContext {
    fn default() -> Self {
        Self::background()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_background_is_never_done() {
        let ctx = ReadContext::background();
        assert_eq!(ctx.err(), None);
        assert!(ctx.deadline().is_none());
    }

    #[test]
    fn test_cancel_reaches_clones() {
        let (ctx, handle) = ReadContext::with_cancel();
        let clone = ctx.clone();
        assert_eq!(clone.err(), None);
        handle.cancel();
        assert_eq!(ctx.err(), Some(ContextError::Cancelled));
        assert_eq!(clone.check(), Err(ContextError::Cancelled));
    }

    #[test]
    fn test_dropping_handle_cancels() {
        let (ctx, handle) = ReadContext::with_cancel();
        drop(handle);
        assert_eq!(ctx.err(), Some(ContextError::Cancelled));
    }

    #[test]
    fn test_expired_deadline() {
        let ctx = ReadContext::background().with_deadline(Instant::now());
        assert_eq!(ctx.err(), Some(ContextError::DeadlineExceeded));
    }

    #[test]
    fn test_with_timeout_keeps_earlier_deadline() {
        let early = Instant::now() + Duration::from_millis(5);
        let ctx = ReadContext::background()
            .with_deadline(early)
            .with_timeout(Duration::from_secs(60));
        assert_eq!(ctx.deadline(), Some(early));
    }

    #[test]
    fn test_cancelled_receiver_unblocks_select() {
        let (ctx, handle) = ReadContext::with_cancel();
        handle.cancel();
        let (_tx, frames) = crossbeam_channel::unbounded::<u32>();
        crossbeam_channel::select! {
            recv(frames) -> _ => panic!("no frame was sent"),
            recv(ctx.cancelled()) -> msg => assert!(msg.is_err()),
        }
    }
}
