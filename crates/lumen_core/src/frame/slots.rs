//! # Frame Buffer Set
//!
//! One slot per configured decoder stream. The producer replaces slots with
//! freshly retained frames; streams that produced nothing this cycle keep
//! their previous frame, so depth and texture may run at different rates.

use lumen_shared::MAX_DECODERS;

use super::video_frame::{FrameDescriptor, VideoFrame};
use crate::error::{LumenError, LumenResult};

/// Frames delivered by one receive call, indexed by stream.
///
/// `None` means the stream produced no new frame this cycle.
#[derive(Clone, Debug, Default)]
pub struct FrameBatch {
    frames: [Option<VideoFrame>; MAX_DECODERS],
}

impl FrameBatch {
    /// Empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`FrameBatch::set`].
    #[must_use]
    pub fn with(mut self, stream: usize, frame: VideoFrame) -> Self {
        self.set(stream, frame);
        self
    }

    /// Puts `frame` on `stream`. Streams past `MAX_DECODERS` are ignored.
    pub fn set(&mut self, stream: usize, frame: VideoFrame) {
        if let Some(slot) = self.frames.get_mut(stream) {
            *slot = Some(frame);
        }
    }

    /// Frame for `stream`, if one arrived.
    #[must_use]
    pub fn get(&self, stream: usize) -> Option<&VideoFrame> {
        self.frames.get(stream).and_then(Option::as_ref)
    }

    /// True if no stream produced a frame.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.iter().all(Option::is_none)
    }
}

/// Fixed-capacity set of frame references, one per stream.
#[derive(Debug)]
pub struct FrameSlots {
    slots: [Option<VideoFrame>; MAX_DECODERS],
    len: usize,
}

impl FrameSlots {
    /// Creates `len` empty slots.
    ///
    /// # Errors
    ///
    /// [`LumenError::NoDecoders`] for zero, [`LumenError::TooManyDecoders`]
    /// above `MAX_DECODERS`.
    pub fn new(len: usize) -> LumenResult<Self> {
        if len == 0 {
            return Err(LumenError::NoDecoders);
        }
        if len > MAX_DECODERS {
            return Err(LumenError::TooManyDecoders {
                requested: len,
                max: MAX_DECODERS,
            });
        }
        Ok(Self {
            slots: Default::default(),
            len,
        })
    }

    /// Number of configured streams.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always false; a set has at least one stream.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Retains every new frame in `batch`, releasing the one it replaces.
    ///
    /// Returns the number of streams updated.
    pub fn update(&mut self, batch: &FrameBatch) -> usize {
        let mut updated = 0;
        for (stream, slot) in self.slots[..self.len].iter_mut().enumerate() {
            if let Some(frame) = batch.get(stream) {
                // assignment drops the previous reference
                *slot = Some(frame.clone());
                updated += 1;
            }
        }
        updated
    }

    /// True if any stream holds a frame with data.
    #[must_use]
    pub fn has_live(&self) -> bool {
        self.slots[..self.len].iter().flatten().any(VideoFrame::is_live)
    }

    /// Frame held for `stream`.
    #[must_use]
    pub fn get(&self, stream: usize) -> Option<&VideoFrame> {
        self.slots[..self.len].get(stream).and_then(Option::as_ref)
    }

    /// Descriptor for `stream`; `None` unless the slot holds a live frame.
    #[must_use]
    pub fn descriptor(&self, stream: usize) -> Option<FrameDescriptor<'_>> {
        self.get(stream)
            .filter(|frame| frame.is_live())
            .map(VideoFrame::descriptor)
    }

    /// Drops every held reference.
    pub fn release_all(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Plane;
    use lumen_shared::PixelFormat;

    fn frame(tag: u8) -> VideoFrame {
        VideoFrame::packed(2, 1, PixelFormat::Rgba, Plane::new(vec![tag; 8], 8))
    }

    #[test]
    fn test_slot_count_limits() {
        assert!(FrameSlots::new(1).is_ok());
        assert!(FrameSlots::new(MAX_DECODERS).is_ok());
        assert_eq!(FrameSlots::new(0).unwrap_err(), LumenError::NoDecoders);
        assert_eq!(
            FrameSlots::new(MAX_DECODERS + 1).unwrap_err(),
            LumenError::TooManyDecoders { requested: 4, max: 3 }
        );
    }

    #[test]
    fn test_update_retains_without_copy() {
        let mut slots = FrameSlots::new(2).unwrap();
        let depth = frame(1);

        assert_eq!(slots.update(&FrameBatch::new().with(0, depth.clone())), 1);
        assert_eq!(depth.ref_count(), 2);
        assert!(slots.get(0).unwrap().same_storage(&depth));
    }

    #[test]
    fn test_update_releases_previous() {
        let mut slots = FrameSlots::new(1).unwrap();
        let first = frame(1);
        let second = frame(2);

        slots.update(&FrameBatch::new().with(0, first.clone()));
        slots.update(&FrameBatch::new().with(0, second.clone()));

        assert_eq!(first.ref_count(), 1);
        assert_eq!(second.ref_count(), 2);
    }

    #[test]
    fn test_independent_stream_rates() {
        let mut slots = FrameSlots::new(2).unwrap();
        let texture = frame(9);
        slots.update(&FrameBatch::new().with(0, frame(1)).with(1, texture.clone()));

        // depth only this cycle
        assert_eq!(slots.update(&FrameBatch::new().with(0, frame(2))), 1);
        assert!(slots.get(1).unwrap().same_storage(&texture));
        assert_eq!(slots.descriptor(0).unwrap().plane(0).unwrap()[0], 2);
    }

    #[test]
    fn test_streams_beyond_len_ignored() {
        let mut slots = FrameSlots::new(1).unwrap();
        let extra = frame(3);
        assert_eq!(slots.update(&FrameBatch::new().with(2, extra.clone())), 0);
        assert_eq!(extra.ref_count(), 1);
        assert!(!slots.has_live());
    }

    #[test]
    fn test_empty_frames_are_not_live() {
        let mut slots = FrameSlots::new(1).unwrap();
        slots.update(&FrameBatch::new().with(0, VideoFrame::empty(4, 4, PixelFormat::Nv12)));
        assert!(!slots.has_live());
        assert!(slots.descriptor(0).is_none());
    }

    #[test]
    fn test_release_all() {
        let mut slots = FrameSlots::new(2).unwrap();
        let held = frame(5);
        slots.update(&FrameBatch::new().with(0, held.clone()).with(1, held.clone()));
        assert_eq!(held.ref_count(), 3);

        slots.release_all();
        assert_eq!(held.ref_count(), 1);
        assert!(!slots.has_live());
    }
}
