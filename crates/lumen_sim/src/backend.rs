//! Simulation backend: builds in-process collaborators from configuration.

use crossbeam_channel::Receiver;
use lumen_core::{
    Backend, DepthConfig, FrameBatch, FrameSource, HwConfig, LumenError, LumenResult, NetConfig,
    Unprojector,
};
use lumen_shared::{DEPTH_STREAM, TEXTURE_STREAM};

use crate::channel::{ChannelSource, FrameFeed};
use crate::synthetic::{SimulationConfig, SyntheticSource};
use crate::unprojector::FlatUnprojector;

#[derive(Clone, Debug)]
enum SourceKind {
    Channel(Receiver<FrameBatch>),
    Synthetic(SimulationConfig),
    Unavailable(String),
}

/// [`Backend`] that never touches the network or a GPU.
#[derive(Clone, Debug)]
pub struct SimBackend {
    source: SourceKind,
    unprojector_error: Option<String>,
}

impl SimBackend {
    /// Backend fed by hand. Returns the feed to push batches through.
    #[must_use]
    pub fn channel() -> (FrameFeed, Self) {
        let (feed, source) = ChannelSource::unbounded();
        let backend = Self {
            source: SourceKind::Channel(source.into_receiver()),
            unprojector_error: None,
        };
        (feed, backend)
    }

    /// Backend generating synthetic frames.
    ///
    /// Non-zero decoder dimensions and a depth pixel format in the decoder
    /// config override the simulation's.
    #[must_use]
    pub fn synthetic(config: SimulationConfig) -> Self {
        Self {
            source: SourceKind::Synthetic(config),
            unprojector_error: None,
        }
    }

    /// Backend whose source refuses to open.
    #[must_use]
    pub fn unavailable(reason: &str) -> Self {
        Self {
            source: SourceKind::Unavailable(reason.to_string()),
            unprojector_error: None,
        }
    }

    /// Makes the unprojector refuse to open.
    #[must_use]
    pub fn without_unprojector(mut self, reason: &str) -> Self {
        self.unprojector_error = Some(reason.to_string());
        self
    }
}

impl Backend for SimBackend {
    fn open_source(&self, net: &NetConfig, decoders: &[HwConfig]) -> LumenResult<Box<dyn FrameSource>> {
        let address = net
            .bind_address()
            .map_err(|e| LumenError::SourceInit(e.to_string()))?;

        match &self.source {
            SourceKind::Channel(rx) => {
                tracing::debug!(%address, "opening channel source");
                Ok(Box::new(ChannelSource::from_receiver(rx.clone())))
            }
            SourceKind::Synthetic(config) => {
                let mut config = config.clone();
                if let Some(depth) = decoders.get(DEPTH_STREAM) {
                    if let Some((width, height)) = depth.dimensions() {
                        config.width = width;
                        config.height = height;
                    }
                    if let Some(format) = depth.requested_format().filter(|f| f.is_depth()) {
                        config.depth_format = format;
                    }
                }
                config.texture &= decoders.len() > TEXTURE_STREAM;
                tracing::debug!(
                    %address,
                    width = config.width,
                    height = config.height,
                    texture = config.texture,
                    "opening synthetic source"
                );
                Ok(Box::new(SyntheticSource::new(config)))
            }
            SourceKind::Unavailable(reason) => Err(LumenError::SourceInit(reason.clone())),
        }
    }

    fn open_unprojector(&self, depth: &DepthConfig) -> LumenResult<Box<dyn Unprojector>> {
        if let Some(reason) = &self.unprojector_error {
            return Err(LumenError::UnprojectorInit(reason.clone()));
        }
        Ok(Box::new(FlatUnprojector::new(depth)))
    }
}
