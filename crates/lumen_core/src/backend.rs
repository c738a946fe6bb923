//! # Collaborators
//!
//! The decode thread talks to two external components: a frame source that
//! receives and decodes network video, and an unprojector that turns depth
//! images into points. A [`Backend`] builds both from configuration.

use std::time::Duration;

use lumen_shared::{Color32, PixelFormat};

use crate::config::{DepthConfig, HwConfig, NetConfig};
use crate::error::{LumenError, LumenResult};
use crate::frame::{FrameBatch, VideoFrame};
use crate::sync::CloudSlots;

/// Outcome of one receive call.
#[derive(Debug)]
pub enum Received {
    /// Nothing arrived within the timeout.
    Timeout,
    /// At least one stream produced a frame.
    Frames(FrameBatch),
}

/// Receives and decodes frames from the network.
pub trait FrameSource: Send {
    /// Blocks up to `timeout` for the next batch of decoded frames.
    ///
    /// # Errors
    ///
    /// Any error is fatal to the decode thread.
    fn receive(&mut self, timeout: Duration) -> LumenResult<Received>;
}

/// 16-bit depth samples, borrowed from a decoded depth frame.
#[derive(Clone, Copy, Debug)]
pub struct DepthImage<'a> {
    /// Raw plane bytes, little-endian `u16` samples.
    pub data: &'a [u8],
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Row stride in bytes.
    pub linesize: usize,
}

impl<'a> DepthImage<'a> {
    /// Validates `frame` as a depth image.
    ///
    /// # Errors
    ///
    /// [`LumenError::UnexpectedDepthFormat`] unless the frame is live, P010LE
    /// or P016LE, and has two bytes per sample.
    pub fn from_frame(frame: &'a VideoFrame) -> LumenResult<Self> {
        let format = frame.format();
        let width = frame.width() as usize;
        let unexpected = |linesize| LumenError::UnexpectedDepthFormat {
            format,
            linesize,
            width,
        };

        let plane = frame.plane(0).ok_or_else(|| unexpected(0))?;
        let linesize = plane.linesize();
        if width == 0 || linesize / width != 2 || !format.is_depth() {
            return Err(unexpected(linesize));
        }

        Ok(Self {
            data: plane.data(),
            width: frame.width(),
            height: frame.height(),
            linesize,
        })
    }

    /// Pixel count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// True for a zero-sized image.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw sample at (`x`, `y`); 0 if out of range or past the plane end.
    #[inline]
    #[must_use]
    pub fn sample(&self, x: u32, y: u32) -> u16 {
        if x >= self.width || y >= self.height {
            return 0;
        }
        let offset = y as usize * self.linesize + x as usize * 2;
        match self.data.get(offset..offset + 2) {
            Some(&[lo, hi]) => u16::from_le_bytes([lo, hi]),
            _ => 0,
        }
    }
}

/// 32-bit packed color texture, borrowed from a decoded texture frame.
#[derive(Clone, Copy, Debug)]
pub struct TextureImage<'a> {
    /// Raw plane bytes, four per pixel.
    pub data: &'a [u8],
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Row stride in bytes.
    pub linesize: usize,
    /// RGB0 or RGBA.
    pub format: PixelFormat,
}

impl<'a> TextureImage<'a> {
    /// Validates `frame` as a texture.
    ///
    /// A frame without data yields `Ok(None)`.
    ///
    /// # Errors
    ///
    /// [`LumenError::UnexpectedTextureFormat`] for a live frame that is not
    /// RGB0 or RGBA.
    pub fn from_frame(frame: &'a VideoFrame) -> LumenResult<Option<Self>> {
        let Some(plane) = frame.plane(0) else {
            return Ok(None);
        };
        if !frame.format().is_rgb32() {
            return Err(LumenError::UnexpectedTextureFormat(frame.format()));
        }
        Ok(Some(Self {
            data: plane.data(),
            width: frame.width(),
            height: frame.height(),
            linesize: plane.linesize(),
            format: frame.format(),
        }))
    }

    /// Packed color at (`x`, `y`); zero if out of range.
    #[inline]
    #[must_use]
    pub fn color(&self, x: u32, y: u32) -> Color32 {
        if x >= self.width || y >= self.height {
            return Color32::ZERO;
        }
        let offset = y as usize * self.linesize + x as usize * 4;
        match self.data.get(offset..offset + 4) {
            Some(&[r, g, b, a]) => Color32::from_rgba(r, g, b, a),
            _ => Color32::ZERO,
        }
    }
}

/// Turns depth images into point clouds.
pub trait Unprojector: Send {
    /// Fills the leading slots of `out` from `depth`, colored by `texture`
    /// when one is given. `out` has one slot per depth pixel.
    ///
    /// Returns the number of slots written.
    ///
    /// # Errors
    ///
    /// Any error is fatal to the decode thread.
    fn unproject(
        &mut self,
        depth: DepthImage<'_>,
        texture: Option<TextureImage<'_>>,
        out: CloudSlots<'_>,
    ) -> LumenResult<usize>;
}

/// Builds collaborators from configuration.
pub trait Backend {
    /// Opens the network receiver and its decoders.
    ///
    /// # Errors
    ///
    /// Returns [`LumenError::SourceInit`] if the source cannot be set up.
    fn open_source(&self, net: &NetConfig, decoders: &[HwConfig]) -> LumenResult<Box<dyn FrameSource>>;

    /// Opens the unprojector.
    ///
    /// # Errors
    ///
    /// Returns [`LumenError::UnprojectorInit`] if it cannot be set up.
    fn open_unprojector(&self, depth: &DepthConfig) -> LumenResult<Box<dyn Unprojector>>;
}
