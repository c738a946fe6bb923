//! # LUMEN Sim
//!
//! In-process collaborators for the exchange core:
//! - [`ChannelSource`] - frames pushed by hand through a [`FrameFeed`]
//! - [`SyntheticSource`] - seeded depth and texture generator
//! - [`FlatUnprojector`] - pixel-grid unprojector without a lens model
//! - [`SimBackend`] - builds the above from a `LumenConfig`
//!
//! ## Example
//!
//! ```rust,ignore
//! use lumen_core::{Lumen, LumenConfig};
//! use lumen_sim::{SimBackend, SimulationConfig};
//!
//! let backend = SimBackend::synthetic(SimulationConfig::DEPTH_AND_TEXTURE);
//! let lumen = Lumen::init(&config, &backend)?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod backend;
pub mod channel;
pub mod synthetic;
pub mod unprojector;

pub use backend::SimBackend;
pub use channel::{ChannelSource, FrameFeed};
pub use synthetic::{SimulationConfig, SyntheticSource};
pub use unprojector::FlatUnprojector;
