//! # Public Handle
//!
//! [`Lumen`] owns the decode thread and the exchange. Consumers poll it with
//! the `begin_*` calls from any thread.

use std::sync::Arc;

use crate::backend::Backend;
use crate::config::LumenConfig;
use crate::error::{LumenResult, RetrieveError};
use crate::sync::{Exchange, Retrieval, StatsSnapshot, Want};
use crate::worker::{DecodeWorker, WorkerState};

/// Logs an init failure with its own message before handing it back.
fn logged<T>(result: LumenResult<T>, message: &'static str) -> LumenResult<T> {
    result.map_err(|err| {
        tracing::error!(error = %err, "{message}");
        err
    })
}

/// A running decoder pipeline.
///
/// Shut down explicitly with [`Lumen::shutdown`] or by dropping it.
#[derive(Debug)]
pub struct Lumen {
    exchange: Arc<Exchange>,
    worker: Option<DecodeWorker>,
    failed_at_shutdown: bool,
}

impl Lumen {
    /// Validates `config`, opens the collaborators through `backend` and
    /// starts the decode thread.
    ///
    /// Point clouds are produced only if `config.depth` is set.
    ///
    /// # Errors
    ///
    /// Configuration, collaborator and thread spawn failures. Each is logged.
    /// Anything opened before the failure is released.
    pub fn init<B>(config: &LumenConfig, backend: &B) -> LumenResult<Self>
    where
        B: Backend + ?Sized,
    {
        logged(config.validate(), "rejected configuration")?;

        let exchange = Arc::new(logged(
            Exchange::new(config.decoders.len(), config.depth.is_some()),
            "failed to allocate frame slots",
        )?);

        let source = logged(
            backend.open_source(&config.net, &config.decoders),
            "failed to initialize network decoder",
        )?;

        let unprojector = match &config.depth {
            Some(depth) => Some(logged(
                backend.open_unprojector(depth),
                "failed to initialize hardware unprojector",
            )?),
            None => None,
        };

        let worker = logged(
            DecodeWorker::spawn(source, unprojector, Arc::clone(&exchange), config.net.timeout()),
            "failed to start decode thread",
        )?;

        tracing::info!(
            decoders = config.decoders.len(),
            point_cloud = config.depth.is_some(),
            port = config.net.port,
            "lumen started"
        );

        Ok(Self {
            exchange,
            worker: Some(worker),
            failed_at_shutdown: false,
        })
    }

    fn begin(&self, want: Want) -> Result<Retrieval<'_>, RetrieveError> {
        if self.worker.is_none() {
            return Err(RetrieveError::Closed);
        }
        self.exchange.begin(want)
    }

    /// Locks and exposes the latest frames.
    ///
    /// # Errors
    ///
    /// [`RetrieveError::NoNewData`] if nothing is available,
    /// [`RetrieveError::Closed`] after shutdown.
    pub fn begin_frames(&self) -> Result<Retrieval<'_>, RetrieveError> {
        self.begin(Want::Frames)
    }

    /// Locks and exposes the latest point cloud.
    ///
    /// Always `NoNewData` without a depth configuration.
    ///
    /// # Errors
    ///
    /// See [`Lumen::begin_frames`].
    pub fn begin_point_cloud(&self) -> Result<Retrieval<'_>, RetrieveError> {
        self.begin(Want::PointCloud)
    }

    /// Locks and exposes frames and point cloud from the same publish.
    ///
    /// # Errors
    ///
    /// See [`Lumen::begin_frames`].
    pub fn begin_both(&self) -> Result<Retrieval<'_>, RetrieveError> {
        self.begin(Want::Both)
    }

    /// Stops and joins the decode thread, then releases every buffer.
    ///
    /// Repeated calls do nothing.
    pub fn shutdown(&mut self) {
        let Some(mut worker) = self.worker.take() else {
            return;
        };
        worker.stop();
        self.failed_at_shutdown = worker.has_failed();
        drop(worker);
        self.exchange.clear();
        tracing::info!("lumen shut down");
    }

    /// Decode thread state. `Stopped` after shutdown.
    #[must_use]
    pub fn worker_state(&self) -> WorkerState {
        self.worker
            .as_ref()
            .map_or(WorkerState::Stopped, DecodeWorker::state)
    }

    /// True if the decode thread stopped on an error.
    #[must_use]
    pub fn has_failed(&self) -> bool {
        self.worker
            .as_ref()
            .map_or(self.failed_at_shutdown, DecodeWorker::has_failed)
    }

    /// True once [`Lumen::shutdown`] has run.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.worker.is_none()
    }

    /// Exchange counters.
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        self.exchange.stats().snapshot()
    }

    /// Configured decoder stream count.
    #[must_use]
    pub fn decoders(&self) -> usize {
        self.exchange.decoders()
    }

    /// True if point clouds are produced.
    #[must_use]
    pub fn has_unprojector(&self) -> bool {
        self.exchange.has_unprojector()
    }
}

impl Drop for Lumen {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Shuts down and clears an optional handle. Does nothing on `None`.
pub fn shutdown(handle: &mut Option<Lumen>) {
    if let Some(mut lumen) = handle.take() {
        lumen.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{FrameSource, Received, Unprojector};
    use crate::config::{DepthConfig, HwConfig, NetConfig};
    use crate::error::LumenError;
    use std::time::Duration;

    struct Idle;

    impl FrameSource for Idle {
        fn receive(&mut self, timeout: Duration) -> LumenResult<Received> {
            std::thread::sleep(timeout);
            Ok(Received::Timeout)
        }
    }

    /// Backend whose collaborators either idle or refuse to open.
    struct TestBackend {
        source_fails: bool,
        unprojector_fails: bool,
    }

    impl Backend for TestBackend {
        fn open_source(&self, _net: &NetConfig, _decoders: &[HwConfig]) -> LumenResult<Box<dyn FrameSource>> {
            if self.source_fails {
                return Err(LumenError::SourceInit("port in use".into()));
            }
            Ok(Box::new(Idle))
        }

        fn open_unprojector(&self, _depth: &DepthConfig) -> LumenResult<Box<dyn Unprojector>> {
            Err(LumenError::UnprojectorInit(if self.unprojector_fails {
                "no device".into()
            } else {
                "not provided".into()
            }))
        }
    }

    const OK: TestBackend = TestBackend {
        source_fails: false,
        unprojector_fails: false,
    };

    fn config(decoders: usize) -> LumenConfig {
        let mut config = LumenConfig::default();
        config.net.timeout_ms = 5;
        config.decoders = vec![HwConfig::new("h264", "bgr0"); decoders];
        config
    }

    #[test]
    fn test_init_and_shutdown() {
        let mut lumen = Lumen::init(&config(1), &OK).unwrap();
        assert_eq!(lumen.decoders(), 1);
        assert!(!lumen.has_unprojector());
        assert_eq!(lumen.worker_state(), WorkerState::Running);
        assert_eq!(lumen.begin_frames().unwrap_err(), RetrieveError::NoNewData);
        assert_eq!(lumen.begin_point_cloud().unwrap_err(), RetrieveError::NoNewData);

        lumen.shutdown();
        lumen.shutdown();
        assert!(lumen.is_closed());
        assert_eq!(lumen.worker_state(), WorkerState::Stopped);
        assert!(!lumen.has_failed());
        assert_eq!(lumen.begin_both().unwrap_err(), RetrieveError::Closed);
    }

    #[test]
    fn test_init_rejects_decoder_counts() {
        assert_eq!(Lumen::init(&config(0), &OK).unwrap_err(), LumenError::NoDecoders);
        assert!(matches!(
            Lumen::init(&config(4), &OK).unwrap_err(),
            LumenError::TooManyDecoders { requested: 4, .. }
        ));
    }

    #[test]
    fn test_init_collaborator_failures() {
        let source_down = TestBackend {
            source_fails: true,
            unprojector_fails: false,
        };
        assert!(matches!(
            Lumen::init(&config(1), &source_down).unwrap_err(),
            LumenError::SourceInit(_)
        ));

        let no_device = TestBackend {
            source_fails: false,
            unprojector_fails: true,
        };
        let mut with_depth = config(2);
        with_depth.depth = Some(DepthConfig::default());
        assert_eq!(
            Lumen::init(&with_depth, &no_device).unwrap_err(),
            LumenError::UnprojectorInit("no device".into())
        );
    }

    #[test]
    fn test_free_shutdown() {
        let mut handle = Some(Lumen::init(&config(1), &OK).unwrap());
        shutdown(&mut handle);
        assert!(handle.is_none());
        shutdown(&mut handle);
        assert!(handle.is_none());
    }
}
