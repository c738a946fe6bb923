//! # LUMEN Core
//!
//! Hands decoded video frames and point clouds from a background decode
//! thread to a polling consumer:
//! - Frames are shared by reference count, never copied
//! - Point clouds are double-buffered and published by swap
//! - One short lock per publish and per retrieval
//!
//! ## Architecture Rules
//!
//! 1. **Unprojection never runs under the lock** - the producer computes
//!    into its own buffer first
//! 2. **Consumers get views, not handles** - descriptors borrow from the
//!    retrieval guard and cannot outlive it
//! 3. **No panics across the API** - failures come back as `Result`
//!
//! ## Example
//!
//! ```rust,ignore
//! use lumen_core::{Lumen, LumenConfig, RetrieveError};
//!
//! let config = LumenConfig::load("lumen.toml")?;
//! let mut lumen = Lumen::init(&config, &backend)?;
//!
//! loop {
//!     match lumen.begin_both() {
//!         Ok(retrieval) => {
//!             if let Some(pc) = retrieval.point_cloud() {
//!                 render(pc.used_points(), pc.used_colors());
//!             }
//!             retrieval.end();
//!         }
//!         Err(RetrieveError::NoNewData) => {}
//!         Err(RetrieveError::Closed) => break,
//!     }
//! }
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod backend;
pub mod config;
pub mod error;
pub mod frame;
pub mod lumen;
pub mod sync;
pub mod worker;

pub use backend::{Backend, DepthImage, FrameSource, Received, TextureImage, Unprojector};
pub use config::{DepthConfig, HwConfig, LumenConfig, NetConfig};
pub use error::{LumenError, LumenResult, RetrieveError};
pub use frame::{FrameBatch, FrameDescriptor, FrameSlots, Plane, VideoFrame};
pub use lumen::{shutdown, Lumen};
pub use sync::{
    CloudSlots, Computed, Exchange, ExchangeStats, PointCloud, PointCloudDescriptor, Retrieval,
    StatsSnapshot, Want, WorkingCloud,
};
pub use worker::{DecodeWorker, WorkerState};
