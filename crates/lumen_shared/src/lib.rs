//! # LUMEN Shared
//!
//! Plain-data types used by the exchange core, the collaborators that feed it
//! and the consumers that read from it.
//!
//! ## CRITICAL RULE
//!
//! This crate must NEVER depend on threading, I/O or decoding code.
//! If you need a lock or a socket, put it in `lumen_core`.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod constants;
pub mod math;
pub mod pixel;

pub use constants::{
    DEFAULT_PORT, DEFAULT_TIMEOUT_MS, DEPTH_STREAM, MAX_DECODERS, NUM_DATA_POINTERS,
    TEXTURE_STREAM,
};
pub use math::{Quaternion, Vec3};
pub use pixel::{Color32, PixelFormat};
