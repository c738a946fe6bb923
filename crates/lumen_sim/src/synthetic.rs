//! # Synthetic Depth Camera
//!
//! Generates a depth stream (a tilted plane plus seeded noise, P010LE) and an
//! optional RGB0 texture stream of the same size. Lost frames show up as
//! receive timeouts, and the source can be scripted to fail after N frames.

use std::thread;
use std::time::Duration;

use lumen_core::{FrameBatch, FrameSource, LumenError, LumenResult, Plane, Received, VideoFrame};
use lumen_shared::{PixelFormat, DEPTH_STREAM, TEXTURE_STREAM};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Parameters of the simulated camera.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationConfig {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Depth pixel format; P010LE or P016LE for a well-formed stream.
    pub depth_format: PixelFormat,
    /// Also produce a texture stream.
    pub texture: bool,
    /// Depth value at the top row, in raw units.
    pub near: u16,
    /// Depth value at the bottom row, in raw units.
    pub far: u16,
    /// Uniform noise amplitude added to each sample.
    pub noise: u16,
    /// Every Nth pixel is a hole (zero depth); 0 for none.
    pub hole_every: u32,
    /// Percentage of receive calls that time out (0-100).
    pub loss_percent: u8,
    /// Pause between frames.
    pub frame_interval: Duration,
    /// Fail the receive after this many frames.
    pub fail_after: Option<u64>,
    /// RNG seed.
    pub seed: u64,
}

impl SimulationConfig {
    /// Depth + texture, 640x360, clean.
    pub const DEPTH_AND_TEXTURE: Self = Self {
        width: 640,
        height: 360,
        depth_format: PixelFormat::P010Le,
        texture: true,
        near: 500,
        far: 4_000,
        noise: 0,
        hole_every: 0,
        loss_percent: 0,
        frame_interval: Duration::from_millis(1),
        fail_after: None,
        seed: 0x4C55_4D45,
    };

    /// Depth only, small and fast.
    pub const DEPTH_ONLY: Self = Self {
        width: 160,
        height: 90,
        texture: false,
        ..Self::DEPTH_AND_TEXTURE
    };

    /// Noisy sensor with holes and a lossy link.
    pub const NOISY: Self = Self {
        noise: 40,
        hole_every: 17,
        loss_percent: 10,
        ..Self::DEPTH_AND_TEXTURE
    };

    /// Pixels per frame.
    #[must_use]
    pub fn pixels(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Pixels that carry nonzero depth.
    #[must_use]
    pub fn valid_pixels(&self) -> usize {
        let pixels = self.pixels();
        if self.hole_every == 0 {
            pixels
        } else {
            pixels - pixels.div_ceil(self.hole_every as usize)
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::DEPTH_AND_TEXTURE
    }
}

/// Seeded generator of depth and texture frames.
#[derive(Debug)]
pub struct SyntheticSource {
    config: SimulationConfig,
    rng: ChaCha8Rng,
    produced: u64,
}

impl SyntheticSource {
    /// Creates a source; the same config always yields the same frames.
    #[must_use]
    pub fn new(config: SimulationConfig) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Self {
            config,
            rng,
            produced: 0,
        }
    }

    /// Frames produced so far.
    #[must_use]
    pub fn produced(&self) -> u64 {
        self.produced
    }

    /// Builds the next depth frame.
    pub fn depth_frame(&mut self) -> VideoFrame {
        let SimulationConfig {
            width,
            height,
            near,
            far,
            noise,
            hole_every,
            ..
        } = self.config;
        let linesize = width as usize * 2;
        let mut bytes = vec![0u8; linesize * height as usize];
        let span = f32::from(far.saturating_sub(near));

        for y in 0..height {
            let row_depth = f32::from(near) + span * y as f32 / height.max(1) as f32;
            for x in 0..width {
                let index = y * width + x;
                if hole_every != 0 && index % hole_every == 0 {
                    continue;
                }
                let jitter = if noise == 0 { 0 } else { self.rng.gen_range(0..=noise) };
                let sample = (row_depth as u16).saturating_add(jitter).max(1);
                let offset = y as usize * linesize + x as usize * 2;
                bytes[offset..offset + 2].copy_from_slice(&sample.to_le_bytes());
            }
        }

        VideoFrame::packed(width, height, self.config.depth_format, Plane::new(bytes, linesize))
    }

    /// Builds a texture frame: red follows x, green follows y.
    #[must_use]
    pub fn texture_frame(&self) -> VideoFrame {
        let SimulationConfig { width, height, .. } = self.config;
        let linesize = width as usize * 4;
        let mut bytes = Vec::with_capacity(linesize * height as usize);
        for y in 0..height {
            for x in 0..width {
                let r = (x * 255 / width.max(1)) as u8;
                let g = (y * 255 / height.max(1)) as u8;
                bytes.extend_from_slice(&[r, g, 0x40, 0]);
            }
        }
        VideoFrame::packed(width, height, PixelFormat::Rgb0, Plane::new(bytes, linesize))
    }
}

impl FrameSource for SyntheticSource {
    fn receive(&mut self, timeout: Duration) -> LumenResult<Received> {
        if self.config.fail_after.is_some_and(|limit| self.produced >= limit) {
            return Err(LumenError::Receive(format!(
                "simulated link failure after {} frames",
                self.produced
            )));
        }

        if self.config.loss_percent > 0 && self.rng.gen_range(0..100u8) < self.config.loss_percent {
            thread::sleep(timeout);
            return Ok(Received::Timeout);
        }

        thread::sleep(self.config.frame_interval.min(timeout));

        let mut batch = FrameBatch::new().with(DEPTH_STREAM, self.depth_frame());
        if self.config.texture {
            batch.set(TEXTURE_STREAM, self.texture_frame());
        }
        self.produced += 1;
        tracing::trace!(frame = self.produced, "synthetic frame");
        Ok(Received::Frames(batch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::DepthImage;

    fn small() -> SimulationConfig {
        SimulationConfig {
            width: 8,
            height: 4,
            frame_interval: Duration::ZERO,
            ..SimulationConfig::DEPTH_AND_TEXTURE
        }
    }

    #[test]
    fn test_depth_frame_is_valid_depth() {
        let mut source = SyntheticSource::new(small());
        let frame = source.depth_frame();
        let depth = DepthImage::from_frame(&frame).unwrap();
        assert_eq!(depth.len(), 32);
        assert_eq!(depth.sample(0, 0), 500);
        assert!(depth.sample(0, 3) > depth.sample(0, 0));
    }

    #[test]
    fn test_same_seed_same_frames() {
        let config = SimulationConfig {
            noise: 50,
            ..small()
        };
        let a = SyntheticSource::new(config.clone()).depth_frame();
        let b = SyntheticSource::new(config).depth_frame();
        assert_eq!(a.plane(0).unwrap().data(), b.plane(0).unwrap().data());
    }

    #[test]
    fn test_holes() {
        let config = SimulationConfig {
            hole_every: 5,
            ..small()
        };
        let mut source = SyntheticSource::new(config.clone());
        let frame = source.depth_frame();
        let depth = DepthImage::from_frame(&frame).unwrap();
        let nonzero = (0..4)
            .flat_map(|y| (0..8).map(move |x| (x, y)))
            .filter(|&(x, y)| depth.sample(x, y) != 0)
            .count();
        assert_eq!(nonzero, config.valid_pixels());
    }

    #[test]
    fn test_receive_batches() {
        let mut source = SyntheticSource::new(small());
        match source.receive(Duration::from_millis(5)).unwrap() {
            Received::Frames(batch) => {
                assert!(batch.get(DEPTH_STREAM).is_some());
                assert_eq!(batch.get(TEXTURE_STREAM).unwrap().format(), PixelFormat::Rgb0);
            }
            Received::Timeout => panic!("lossless source timed out"),
        }
        assert_eq!(source.produced(), 1);
    }

    #[test]
    fn test_fail_after() {
        let mut source = SyntheticSource::new(SimulationConfig {
            fail_after: Some(1),
            ..small()
        });
        assert!(source.receive(Duration::from_millis(1)).is_ok());
        assert!(matches!(
            source.receive(Duration::from_millis(1)),
            Err(LumenError::Receive(_))
        ));
    }

    #[test]
    fn test_total_loss_times_out() {
        let mut source = SyntheticSource::new(SimulationConfig {
            loss_percent: 100,
            ..small()
        });
        assert!(matches!(source.receive(Duration::from_millis(1)), Ok(Received::Timeout)));
        assert_eq!(source.produced(), 0);
    }
}
