//! # Decode Thread
//!
//! One background thread per handle. Each iteration:
//!
//! 1. Receive with timeout. Timeout: go again. Error: stop.
//! 2. If depth arrived and an unprojector is configured, validate the depth
//!    and texture frames and unproject into the working cloud. No lock held.
//! 3. Lock once: retain new frames, swap the cloud in. Unlock.
//!
//! The running flag is checked once per iteration, so shutdown latency is
//! bounded by the receive timeout.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use lumen_shared::{DEPTH_STREAM, TEXTURE_STREAM};

use super::state::{WorkerState, WorkerStatus};
use crate::backend::{DepthImage, FrameSource, Received, TextureImage, Unprojector};
use crate::error::{LumenError, LumenResult};
use crate::frame::{FrameBatch, VideoFrame};
use crate::sync::{Exchange, WorkingCloud};

const THREAD_NAME: &str = "lumen-decode";

/// Producer-exclusive state, moved into the thread.
struct DecodeLoop {
    source: Box<dyn FrameSource>,
    unprojector: Option<Box<dyn Unprojector>>,
    working: WorkingCloud,
    last_texture: Option<VideoFrame>,
    exchange: Arc<Exchange>,
    status: Arc<WorkerStatus>,
    timeout: Duration,
}

impl DecodeLoop {
    fn run(mut self) {
        while self.status.is_running() {
            let batch = match self.source.receive(self.timeout) {
                Ok(Received::Timeout) => {
                    self.exchange.stats().record_timeout();
                    continue;
                }
                Ok(Received::Frames(batch)) => batch,
                Err(err) => {
                    self.fail(&err);
                    break;
                }
            };

            if let Err(err) = self.cycle(&batch) {
                self.fail(&err);
                break;
            }
        }

        self.status.finish();
        tracing::info!("decode thread finished");
    }

    /// Only an error while running counts as a failure; one raised by a
    /// source torn down after a stop request is part of a clean shutdown.
    fn fail(&self, err: &LumenError) {
        if self.status.is_running() {
            tracing::error!(error = %err, "network decoder fatal error");
            self.status.fail();
        } else {
            tracing::debug!(error = %err, "receive error during shutdown");
            self.status.request_stop();
        }
    }

    fn cycle(&mut self, batch: &FrameBatch) -> LumenResult<()> {
        let Some(unprojector) = self.unprojector.as_mut() else {
            self.exchange.publish(batch, None);
            return Ok(());
        };

        // streams past the configured count are ignored, texture included
        if self.exchange.decoders() > TEXTURE_STREAM {
            if let Some(texture) = batch.get(TEXTURE_STREAM) {
                self.last_texture = Some(texture.clone());
            }
        }

        let Some(depth) = batch.get(DEPTH_STREAM).filter(|frame| frame.is_live()) else {
            self.exchange.publish(batch, None);
            return Ok(());
        };

        let depth = DepthImage::from_frame(depth)?;
        let texture = match &self.last_texture {
            Some(frame) => TextureImage::from_frame(frame)?,
            None => None,
        };

        let computed = self
            .working
            .compute(depth.len(), |slots| unprojector.unproject(depth, texture, slots))?;
        if computed.reallocated {
            tracing::debug!(slots = depth.len(), "point cloud buffer reallocated");
            self.exchange.stats().record_reallocation();
        }

        self.exchange.publish(batch, Some(&mut self.working));
        Ok(())
    }
}

/// Handle to the running decode thread.
///
/// Dropping it stops and joins the thread.
#[derive(Debug)]
pub struct DecodeWorker {
    handle: Option<JoinHandle<()>>,
    status: Arc<WorkerStatus>,
}

impl DecodeWorker {
    /// Starts the decode thread.
    ///
    /// # Errors
    ///
    /// [`LumenError::ThreadSpawn`] if the OS refuses the thread.
    pub fn spawn(
        source: Box<dyn FrameSource>,
        unprojector: Option<Box<dyn Unprojector>>,
        exchange: Arc<Exchange>,
        timeout: Duration,
    ) -> LumenResult<Self> {
        let status = Arc::new(WorkerStatus::new());
        let decode_loop = DecodeLoop {
            source,
            unprojector,
            working: WorkingCloud::new(),
            last_texture: None,
            exchange,
            status: Arc::clone(&status),
            timeout,
        };

        let handle = thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || decode_loop.run())
            .map_err(|e| LumenError::ThreadSpawn(e.to_string()))?;

        Ok(Self {
            handle: Some(handle),
            status,
        })
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> WorkerState {
        self.status.state()
    }

    /// True if the thread stopped on an error.
    #[must_use]
    pub fn has_failed(&self) -> bool {
        self.status.has_failed()
    }

    /// Asks the thread to stop and joins it. Safe to call repeatedly.
    pub fn stop(&mut self) {
        self.status.request_stop();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("decode thread panicked");
                self.status.fail();
            }
            self.status.finish();
        }
    }
}

impl Drop for DecodeWorker {
    fn drop(&mut self) {
        self.stop();
    }
}
