//! # Decoded Frames
//!
//! Reference-counted frame handles and the per-stream slots the exchange
//! keeps them in.

mod slots;
mod video_frame;

pub use slots::{FrameBatch, FrameSlots};
pub use video_frame::{FrameDescriptor, Plane, VideoFrame};
