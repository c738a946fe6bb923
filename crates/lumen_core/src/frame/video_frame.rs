//! # Reference-Counted Video Frames
//!
//! A decoded frame is shared, not copied: the decoder, the producer thread
//! and the exchange slot may all hold the same pixel storage. Retaining is an
//! `Arc` clone, releasing is a drop. Both are O(1) regardless of resolution.

use std::sync::Arc;

use lumen_shared::{PixelFormat, NUM_DATA_POINTERS};

/// One image plane: bytes plus row stride.
#[derive(Debug)]
pub struct Plane {
    data: Box<[u8]>,
    linesize: usize,
}

impl Plane {
    /// Wraps plane bytes with a row stride in bytes (row length including padding).
    #[must_use]
    pub fn new(data: impl Into<Box<[u8]>>, linesize: usize) -> Self {
        Self {
            data: data.into(),
            linesize,
        }
    }

    /// Plane bytes.
    #[inline]
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Row stride in bytes.
    #[inline]
    #[must_use]
    pub fn linesize(&self) -> usize {
        self.linesize
    }
}

#[derive(Debug)]
struct FrameData {
    width: u32,
    height: u32,
    format: PixelFormat,
    planes: [Option<Plane>; NUM_DATA_POINTERS],
}

/// Shared handle to a decoded frame.
///
/// Cloning takes a new reference; dropping releases it. The pixel storage is
/// freed when the last holder lets go.
///
/// A frame without a first plane means "no data yet". Such frames are
/// accepted into slots but never surfaced to a consumer.
#[derive(Clone, Debug)]
pub struct VideoFrame {
    inner: Arc<FrameData>,
}

impl VideoFrame {
    /// Creates a frame from up to `NUM_DATA_POINTERS` planes.
    #[must_use]
    pub fn new(
        width: u32,
        height: u32,
        format: PixelFormat,
        planes: [Option<Plane>; NUM_DATA_POINTERS],
    ) -> Self {
        Self {
            inner: Arc::new(FrameData {
                width,
                height,
                format,
                planes,
            }),
        }
    }

    /// Creates a packed (single-plane) frame.
    #[must_use]
    pub fn packed(width: u32, height: u32, format: PixelFormat, plane: Plane) -> Self {
        Self::new(width, height, format, [Some(plane), None, None])
    }

    /// Creates a frame header with no pixel data.
    #[must_use]
    pub fn empty(width: u32, height: u32, format: PixelFormat) -> Self {
        Self::new(width, height, format, [None, None, None])
    }

    /// Width in pixels.
    #[inline]
    #[must_use]
    pub fn width(&self) -> u32 {
        self.inner.width
    }

    /// Height in pixels.
    #[inline]
    #[must_use]
    pub fn height(&self) -> u32 {
        self.inner.height
    }

    /// Pixel format tag.
    #[inline]
    #[must_use]
    pub fn format(&self) -> PixelFormat {
        self.inner.format
    }

    /// Plane `index`, if present.
    #[inline]
    #[must_use]
    pub fn plane(&self, index: usize) -> Option<&Plane> {
        self.inner.planes.get(index).and_then(Option::as_ref)
    }

    /// True if the first plane carries data.
    #[inline]
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.inner.planes[0].is_some()
    }

    /// Number of holders sharing this frame's storage.
    #[must_use]
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// True if both handles share the same storage.
    #[must_use]
    pub fn same_storage(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// By-value summary borrowing this frame's planes.
    #[must_use]
    pub fn descriptor(&self) -> FrameDescriptor<'_> {
        let mut data = [None; NUM_DATA_POINTERS];
        let mut linesize = [0; NUM_DATA_POINTERS];
        for (i, plane) in self.inner.planes.iter().enumerate() {
            if let Some(plane) = plane {
                data[i] = Some(plane.data());
                linesize[i] = plane.linesize();
            }
        }
        FrameDescriptor {
            width: self.inner.width,
            height: self.inner.height,
            format: self.inner.format,
            data,
            linesize,
        }
    }
}

/// Lightweight copy-by-value frame description.
///
/// Holds plane views and strides, never the frame handle. The plane borrows
/// end with the retrieval that produced them, so a descriptor cannot outlive
/// the lock keeping the frame alive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameDescriptor<'a> {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel format tag.
    pub format: PixelFormat,
    /// Plane views (e.g. Y plane and UV plane).
    pub data: [Option<&'a [u8]>; NUM_DATA_POINTERS],
    /// Plane strides in bytes (row length including padding).
    pub linesize: [usize; NUM_DATA_POINTERS],
}

impl<'a> FrameDescriptor<'a> {
    /// Plane `index`, if present.
    #[must_use]
    pub fn plane(&self, index: usize) -> Option<&'a [u8]> {
        self.data.get(index).copied().flatten()
    }

    /// Row `y` of plane `index`, including padding.
    #[must_use]
    pub fn row(&self, index: usize, y: usize) -> Option<&'a [u8]> {
        let plane = self.plane(index)?;
        let stride = self.linesize[index];
        let start = y.checked_mul(stride)?;
        plane.get(start..start.checked_add(stride)?)
    }
}
