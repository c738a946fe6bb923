//! Frame source fed by hand over a channel.
//!
//! Whoever holds the [`FrameFeed`] decides exactly what the decode thread
//! receives and when. Dropping every feed is treated like a lost connection.

use std::time::Duration;

use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, SendError, Sender};
use lumen_core::{FrameBatch, FrameSource, LumenError, LumenResult, Received};

/// Sending half. Cloneable; the source fails once all clones are gone.
#[derive(Clone, Debug)]
pub struct FrameFeed {
    tx: Sender<FrameBatch>,
}

impl FrameFeed {
    /// Queues a batch for the decode thread.
    ///
    /// # Errors
    ///
    /// Gives the batch back if the source has been dropped.
    pub fn send(&self, batch: FrameBatch) -> Result<(), FrameBatch> {
        self.tx.send(batch).map_err(|SendError(batch)| batch)
    }

    /// Batches waiting to be received.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.tx.len()
    }
}

/// Receiving half, handed to the decode thread.
#[derive(Debug)]
pub struct ChannelSource {
    rx: Receiver<FrameBatch>,
}

impl ChannelSource {
    /// Unbounded feed.
    #[must_use]
    pub fn unbounded() -> (FrameFeed, Self) {
        let (tx, rx) = unbounded();
        (FrameFeed { tx }, Self { rx })
    }

    /// Feed holding at most `capacity` batches; `send` blocks when full.
    #[must_use]
    pub fn bounded(capacity: usize) -> (FrameFeed, Self) {
        let (tx, rx) = bounded(capacity);
        (FrameFeed { tx }, Self { rx })
    }

    /// Wraps an existing receiver.
    #[must_use]
    pub fn from_receiver(rx: Receiver<FrameBatch>) -> Self {
        Self { rx }
    }

    /// Unwraps the receiver.
    #[must_use]
    pub fn into_receiver(self) -> Receiver<FrameBatch> {
        self.rx
    }
}

impl FrameSource for ChannelSource {
    fn receive(&mut self, timeout: Duration) -> LumenResult<Received> {
        match self.rx.recv_timeout(timeout) {
            Ok(batch) => Ok(Received::Frames(batch)),
            Err(RecvTimeoutError::Timeout) => Ok(Received::Timeout),
            Err(RecvTimeoutError::Disconnected) => {
                Err(LumenError::Receive("frame feed disconnected".to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::{Plane, VideoFrame};
    use lumen_shared::PixelFormat;

    #[test]
    fn test_receive_outcomes() {
        let (feed, mut source) = ChannelSource::unbounded();
        let timeout = Duration::from_millis(1);

        assert!(matches!(source.receive(timeout), Ok(Received::Timeout)));

        let frame = VideoFrame::packed(1, 1, PixelFormat::Rgba, Plane::new(vec![0; 4], 4));
        feed.send(FrameBatch::new().with(0, frame)).unwrap();
        assert_eq!(feed.pending(), 1);
        match source.receive(timeout) {
            Ok(Received::Frames(batch)) => assert!(batch.get(0).is_some()),
            other => panic!("expected frames, got {other:?}"),
        }

        drop(feed);
        assert!(matches!(source.receive(timeout), Err(LumenError::Receive(_))));
    }

    #[test]
    fn test_send_after_source_dropped() {
        let (feed, source) = ChannelSource::bounded(1);
        drop(source);
        assert!(feed.send(FrameBatch::new()).is_err());
    }
}
