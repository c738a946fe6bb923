//! # Error Types
//!
//! Everything that can fail during initialization or inside the decode
//! thread. Retrieval has its own small enum, [`RetrieveError`], because
//! "no new data" is an expected outcome, not a failure.

use thiserror::Error;

use lumen_shared::PixelFormat;

/// Errors raised by initialization and the producer side of the exchange.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LumenError {
    /// More decoder streams were configured than the compile-time maximum.
    #[error("the maximum number of decoders (compile time) exceeded: requested {requested}, max {max}")]
    TooManyDecoders {
        /// Number of streams requested.
        requested: usize,
        /// Compile-time maximum.
        max: usize,
    },

    /// At least one decoder stream is required.
    #[error("at least one decoder must be configured")]
    NoDecoders,

    /// Invalid configuration value or file.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A buffer could not be allocated.
    #[error("not enough memory for {what} ({slots} slots)")]
    Allocation {
        /// What was being allocated.
        what: &'static str,
        /// Requested slot count.
        slots: usize,
    },

    /// The network/decoder collaborator failed to start.
    #[error("failed to initialize network decoder: {0}")]
    SourceInit(String),

    /// The depth unprojector collaborator failed to start.
    #[error("failed to initialize hardware unprojector: {0}")]
    UnprojectorInit(String),

    /// The decode thread could not be spawned.
    #[error("failed to spawn decode thread: {0}")]
    ThreadSpawn(String),

    /// Unrecoverable receive failure reported by the frame source.
    #[error("network decoder fatal error: {0}")]
    Receive(String),

    /// Depth frame is not 16-bit single-channel data.
    #[error("unprojection expects uint16 p010le/p016le depth data, got {format} with linesize {linesize} for width {width}")]
    UnexpectedDepthFormat {
        /// Format of the offending frame.
        format: PixelFormat,
        /// First-plane stride in bytes.
        linesize: usize,
        /// Frame width in pixels.
        width: usize,
    },

    /// Texture frame is not 32-bit packed RGB.
    #[error("unprojection expects rgb0/rgba texture data, got {0}")]
    UnexpectedTextureFormat(PixelFormat),

    /// The unprojector failed or reported more points than slots.
    #[error("unprojection failed: {0}")]
    Unproject(String),
}

/// Result type for exchange operations.
pub type LumenResult<T> = Result<T, LumenError>;

/// Outcome of a `begin_*` call that produced no retrieval.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrieveError {
    /// Nothing has been published since the last retrieval. Normal; poll again.
    #[error("no new data")]
    NoNewData,

    /// The handle has been shut down.
    #[error("exchange is closed")]
    Closed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_are_distinct() {
        let messages = [
            LumenError::TooManyDecoders { requested: 4, max: 3 }.to_string(),
            LumenError::NoDecoders.to_string(),
            LumenError::Allocation { what: "point cloud", slots: 10 }.to_string(),
            LumenError::SourceInit("x".into()).to_string(),
            LumenError::UnprojectorInit("x".into()).to_string(),
            LumenError::ThreadSpawn("x".into()).to_string(),
        ];
        for (i, a) in messages.iter().enumerate() {
            for b in &messages[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_depth_format_message() {
        let err = LumenError::UnexpectedDepthFormat {
            format: PixelFormat::Nv12,
            linesize: 640,
            width: 640,
        };
        let msg = err.to_string();
        assert!(msg.contains("nv12"));
        assert!(msg.contains("p010le"));
    }
}
