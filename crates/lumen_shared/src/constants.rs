//! # Compile-Time Limits & Defaults
//!
//! **CRITICAL:** `MAX_DECODERS` sizes fixed arrays throughout the exchange.
//! Changing it changes the memory layout of every frame set.

// =============================================================================
// STREAM LIMITS
// =============================================================================

/// Maximum number of decoder streams in multi-frame decoding.
pub const MAX_DECODERS: usize = 3;

/// Maximum number of planes for planar image formats (e.g. Y + UV).
pub const NUM_DATA_POINTERS: usize = 3;

/// Stream index carrying depth when point clouds are enabled.
pub const DEPTH_STREAM: usize = 0;

/// Stream index carrying the optional color texture for depth.
pub const TEXTURE_STREAM: usize = 1;

// =============================================================================
// NETWORK DEFAULTS
// =============================================================================

/// Default port the receiver listens on.
pub const DEFAULT_PORT: u16 = 9768;

/// Default receive timeout in milliseconds.
///
/// Also bounds shutdown latency: the decode thread checks its running flag
/// once per receive call.
pub const DEFAULT_TIMEOUT_MS: u32 = 500;
