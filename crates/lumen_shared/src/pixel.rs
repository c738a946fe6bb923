//! Pixel formats and packed point colors.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// Pixel format tag of a decoded frame.
///
/// Names follow the decoder convention (`"p010le"`, `"rgb0"`, ...), which is
/// also how they appear in configuration files.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelFormat {
    /// Format not known to this crate.
    #[default]
    Unknown,
    /// 10-bit samples stored in the high bits of little-endian u16.
    P010Le,
    /// 16-bit little-endian samples.
    P016Le,
    /// Packed RGB with an unused fourth byte.
    Rgb0,
    /// Packed RGBA.
    Rgba,
    /// Packed BGR with an unused fourth byte.
    Bgr0,
    /// Planar Y + interleaved UV, 8 bit.
    Nv12,
    /// Planar Y, U, V, 8 bit, 4:2:0.
    Yuv420p,
}

impl PixelFormat {
    /// Parses a decoder format name. Returns `None` for unrecognized names.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let format = match name.to_ascii_lowercase().as_str() {
            "p010le" => Self::P010Le,
            "p016le" => Self::P016Le,
            "rgb0" => Self::Rgb0,
            "rgba" => Self::Rgba,
            "bgr0" => Self::Bgr0,
            "nv12" => Self::Nv12,
            "yuv420p" => Self::Yuv420p,
            _ => return None,
        };
        Some(format)
    }

    /// Decoder name of this format.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::P010Le => "p010le",
            Self::P016Le => "p016le",
            Self::Rgb0 => "rgb0",
            Self::Rgba => "rgba",
            Self::Bgr0 => "bgr0",
            Self::Nv12 => "nv12",
            Self::Yuv420p => "yuv420p",
        }
    }

    /// True for the 16-bit single-channel layouts depth is encoded in.
    #[must_use]
    pub const fn is_depth(self) -> bool {
        matches!(self, Self::P010Le | Self::P016Le)
    }

    /// True for 32-bit packed RGB layouts usable as point colors.
    #[must_use]
    pub const fn is_rgb32(self) -> bool {
        matches!(self, Self::Rgb0 | Self::Rgba)
    }
}

impl std::fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Packed point color, RGBA bytes in memory order.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct Color32(pub u32);

impl Color32 {
    /// Unused slot color.
    pub const ZERO: Self = Self(0);

    /// Packs RGBA components.
    #[must_use]
    pub const fn from_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self(u32::from_le_bytes([r, g, b, a]))
    }

    /// Opaque greyscale color.
    #[must_use]
    pub const fn grey(value: u8) -> Self {
        Self::from_rgba(value, value, value, u8::MAX)
    }

    /// Unpacks into RGBA components.
    #[must_use]
    pub const fn to_rgba(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_names() {
        for format in [
            PixelFormat::P010Le,
            PixelFormat::P016Le,
            PixelFormat::Rgb0,
            PixelFormat::Rgba,
            PixelFormat::Bgr0,
            PixelFormat::Nv12,
            PixelFormat::Yuv420p,
        ] {
            assert_eq!(PixelFormat::from_name(format.name()), Some(format));
        }
        assert_eq!(PixelFormat::from_name("P010LE"), Some(PixelFormat::P010Le));
        assert_eq!(PixelFormat::from_name("gray12le"), None);
    }

    #[test]
    fn test_format_classes() {
        assert!(PixelFormat::P010Le.is_depth());
        assert!(PixelFormat::P016Le.is_depth());
        assert!(!PixelFormat::Nv12.is_depth());
        assert!(PixelFormat::Rgb0.is_rgb32());
        assert!(!PixelFormat::Bgr0.is_rgb32());
    }

    #[test]
    fn test_color_packing() {
        let c = Color32::from_rgba(1, 2, 3, 4);
        assert_eq!(c.to_rgba(), [1, 2, 3, 4]);
        assert_eq!(Color32::grey(7).to_rgba(), [7, 7, 7, 255]);
        assert_eq!(Color32::ZERO.0, 0);
    }
}
