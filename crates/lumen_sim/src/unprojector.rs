//! Stand-in unprojector.
//!
//! No lens model: a valid sample at pixel (x, y) becomes the point
//! `(x, y, depth)` with depth converted to meters by `depth_unit`. Samples
//! outside the configured margins are dropped.

use lumen_core::{CloudSlots, DepthConfig, DepthImage, LumenResult, TextureImage, Unprojector};
use lumen_shared::{Color32, Vec3};

/// Flat pixel-grid unprojector.
#[derive(Clone, Debug)]
pub struct FlatUnprojector {
    depth_unit: f32,
    min_margin: f32,
    max_margin: f32,
}

impl FlatUnprojector {
    /// Takes units and margins from `config`; intrinsics are ignored.
    #[must_use]
    pub fn new(config: &DepthConfig) -> Self {
        Self {
            depth_unit: config.depth_unit,
            min_margin: config.min_margin,
            max_margin: config.max_margin,
        }
    }

    fn keep(&self, meters: f32) -> bool {
        meters > self.min_margin && meters <= self.max_margin
    }
}

impl Unprojector for FlatUnprojector {
    fn unproject(
        &mut self,
        depth: DepthImage<'_>,
        texture: Option<TextureImage<'_>>,
        out: CloudSlots<'_>,
    ) -> LumenResult<usize> {
        let mut used = 0;
        for y in 0..depth.height {
            for x in 0..depth.width {
                let raw = depth.sample(x, y);
                if raw == 0 {
                    continue;
                }
                let meters = f32::from(raw) * self.depth_unit;
                if !self.keep(meters) {
                    continue;
                }
                // one slot per pixel, so used never passes the slice end
                let (Some(point), Some(color)) = (out.points.get_mut(used), out.colors.get_mut(used)) else {
                    return Ok(used);
                };
                *point = Vec3::new(x as f32, y as f32, meters);
                *color = match texture {
                    Some(texture) => texture.color(x, y),
                    None => Color32::grey((raw >> 8) as u8),
                };
                used += 1;
            }
        }
        Ok(used)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::{Plane, PointCloud, VideoFrame, WorkingCloud};
    use lumen_shared::PixelFormat;

    fn depth(samples: &[u16], width: u32) -> VideoFrame {
        let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        let height = samples.len() as u32 / width;
        VideoFrame::packed(width, height, PixelFormat::P016Le, Plane::new(bytes, width as usize * 2))
    }

    fn unproject(config: &DepthConfig, frame: &VideoFrame, texture: Option<&VideoFrame>) -> PointCloud {
        let image = DepthImage::from_frame(frame).unwrap();
        let texture = texture.map(|t| TextureImage::from_frame(t).unwrap().unwrap());
        let mut unprojector = FlatUnprojector::new(config);
        let mut working = WorkingCloud::new();
        working
            .compute(image.len(), |out| unprojector.unproject(image, texture, out))
            .unwrap();
        let mut published = PointCloud::new();
        working.swap_with(&mut published);
        published
    }

    #[test]
    fn test_skips_holes_and_margins() {
        let config = DepthConfig {
            depth_unit: 0.5,
            min_margin: 0.5,
            max_margin: 2.0,
            ..DepthConfig::default()
        };
        // 0 = hole, 1 = too near, 6 = too far
        let frame = depth(&[2, 0, 1, 3, 6, 4], 3);
        let cloud = unproject(&config, &frame, None);

        assert_eq!(cloud.capacity(), 6);
        assert_eq!(cloud.used(), 3);
        assert_eq!(cloud.points()[0], Vec3::new(0.0, 0.0, 1.0));
        assert_eq!(cloud.points()[1], Vec3::new(0.0, 1.0, 1.5));
        assert_eq!(cloud.points()[2], Vec3::new(2.0, 1.0, 2.0));
        assert!(cloud.points()[3..].iter().all(|p| p.is_zero()));
    }

    #[test]
    fn test_colors_from_texture() {
        let config = DepthConfig::default();
        let frame = depth(&[10, 20], 2);
        let texture = VideoFrame::packed(
            2,
            1,
            PixelFormat::Rgba,
            Plane::new(vec![1, 2, 3, 4, 5, 6, 7, 8], 8),
        );
        let cloud = unproject(&config, &frame, Some(&texture));
        assert_eq!(cloud.colors(), &[Color32::from_rgba(1, 2, 3, 4), Color32::from_rgba(5, 6, 7, 8)]);
    }

    #[test]
    fn test_grey_without_texture() {
        let frame = depth(&[0x1234], 1);
        let cloud = unproject(&DepthConfig::default(), &frame, None);
        assert_eq!(cloud.colors()[0], Color32::grey(0x12));
    }
}
