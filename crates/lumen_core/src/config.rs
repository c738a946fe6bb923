//! # Configuration
//!
//! Network, decoder and depth settings. Loaded once at startup, either built
//! in code or read from TOML:
//!
//! ```toml
//! [net]
//! port = 9768
//! timeout_ms = 500
//!
//! [[decoder]]
//! hardware = "vaapi"
//! codec = "hevc"
//! pixel_format = "p010le"
//! profile = 2
//!
//! [[decoder]]
//! hardware = "vaapi"
//! codec = "hevc"
//! pixel_format = "rgb0"
//!
//! [depth]
//! ppx = 421.353
//! ppy = 240.93
//! fx = 426.768
//! fy = 426.768
//! depth_unit = 0.0001
//! ```
//!
//! Optional strings and zero integers mean "use the default / let the decoder
//! infer". An absent `[depth]` table disables point cloud production.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use lumen_shared::{PixelFormat, DEFAULT_PORT, DEFAULT_TIMEOUT_MS, MAX_DECODERS};

use crate::error::{LumenError, LumenResult};

/// Network receive configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetConfig {
    /// IP to listen on, `None` to listen on any.
    pub ip: Option<String>,
    /// Port to listen on.
    pub port: u16,
    /// Receive timeout; zero or positive.
    pub timeout_ms: u32,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            ip: None,
            port: DEFAULT_PORT,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl NetConfig {
    /// Receive timeout as a `Duration`.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(u64::from(self.timeout_ms))
    }

    /// Address to bind, `0.0.0.0:port` when no IP is set.
    ///
    /// # Errors
    ///
    /// Returns [`LumenError::InvalidConfig`] if the IP does not parse.
    pub fn bind_address(&self) -> LumenResult<SocketAddr> {
        let ip = match non_empty(self.ip.as_ref()) {
            Some(ip) => ip
                .parse::<IpAddr>()
                .map_err(|e| LumenError::InvalidConfig(format!("bad listen ip {ip:?}: {e}")))?,
            None => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        };
        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Hardware decoder configuration, one per stream.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HwConfig {
    /// Hardware type for decoding, e.g. `"vaapi"`.
    pub hardware: Option<String>,
    /// Codec name, e.g. `"h264"`, `"hevc"`.
    pub codec: Option<String>,
    /// Device node, e.g. `"/dev/dri/renderD128"`.
    pub device: Option<String>,
    /// Output pixel format, e.g. `"rgb0"`, `"p010le"`.
    pub pixel_format: Option<String>,
    /// Frame width, 0 to let the decoder infer.
    pub width: u32,
    /// Frame height, 0 to let the decoder infer.
    pub height: u32,
    /// Codec profile, 0 to leave unknown.
    pub profile: i32,
}

impl HwConfig {
    /// Decoder stream for `codec` with the given output `pixel_format`.
    #[must_use]
    pub fn new(codec: &str, pixel_format: &str) -> Self {
        Self {
            codec: Some(codec.to_owned()),
            pixel_format: Some(pixel_format.to_owned()),
            ..Self::default()
        }
    }

    /// Hardware backend name, if set.
    #[must_use]
    pub fn hardware(&self) -> Option<&str> {
        non_empty(self.hardware.as_ref())
    }

    /// Codec name, if set.
    #[must_use]
    pub fn codec(&self) -> Option<&str> {
        non_empty(self.codec.as_ref())
    }

    /// Device node, if set.
    #[must_use]
    pub fn device(&self) -> Option<&str> {
        non_empty(self.device.as_ref())
    }

    /// Requested output format; `None` when unset or not known to this crate.
    #[must_use]
    pub fn requested_format(&self) -> Option<PixelFormat> {
        non_empty(self.pixel_format.as_ref()).and_then(PixelFormat::from_name)
    }

    /// Requested dimensions, `None` unless both are set.
    #[must_use]
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        (self.width > 0 && self.height > 0).then_some((self.width, self.height))
    }
}

/// Depth unprojection configuration. Presence enables point clouds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepthConfig {
    /// Principal point x, pixel coordinates.
    pub ppx: f32,
    /// Principal point y, pixel coordinates.
    pub ppy: f32,
    /// Focal length in pixel width units.
    pub fx: f32,
    /// Focal length in pixel height units.
    pub fy: f32,
    /// Multiplier for raw depth samples.
    pub depth_unit: f32,
    /// Minimal valid depth, in result units (raw * `depth_unit`).
    pub min_margin: f32,
    /// Maximal valid depth, in result units (raw * `depth_unit`).
    pub max_margin: f32,
}

impl Default for DepthConfig {
    fn default() -> Self {
        Self {
            ppx: 0.0,
            ppy: 0.0,
            fx: 1.0,
            fy: 1.0,
            depth_unit: 0.0001,
            min_margin: 0.0,
            max_margin: f32::INFINITY,
        }
    }
}

impl DepthConfig {
    /// Checks the intrinsics are usable.
    ///
    /// # Errors
    ///
    /// Returns [`LumenError::InvalidConfig`] naming the offending field.
    pub fn validate(&self) -> LumenResult<()> {
        let positive = [("fx", self.fx), ("fy", self.fy), ("depth_unit", self.depth_unit)];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(LumenError::InvalidConfig(format!(
                    "depth {name} must be positive and finite, got {value}"
                )));
            }
        }
        if !(self.ppx.is_finite() && self.ppy.is_finite()) {
            return Err(LumenError::InvalidConfig("depth principal point must be finite".into()));
        }
        if self.min_margin.is_nan() || self.max_margin.is_nan() || self.min_margin > self.max_margin {
            return Err(LumenError::InvalidConfig(format!(
                "depth margins must satisfy min <= max, got {} > {}",
                self.min_margin, self.max_margin
            )));
        }
        Ok(())
    }
}

/// Complete configuration of a [`crate::Lumen`] instance.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LumenConfig {
    /// Network settings.
    pub net: NetConfig,
    /// Decoder streams, 1 to `MAX_DECODERS`. Stream 0 carries depth when
    /// `depth` is set, stream 1 the optional texture.
    #[serde(rename = "decoder")]
    pub decoders: Vec<HwConfig>,
    /// Depth unprojection, `None` to disable point clouds.
    pub depth: Option<DepthConfig>,
}

impl LumenConfig {
    /// Single video stream, no point clouds.
    #[must_use]
    pub fn video(net: NetConfig, decoder: HwConfig) -> Self {
        Self {
            net,
            decoders: vec![decoder],
            depth: None,
        }
    }

    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`LumenError::InvalidConfig`] on syntax errors, or any error
    /// from [`LumenConfig::validate`].
    pub fn from_toml_str(text: &str) -> LumenResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| LumenError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`LumenError::InvalidConfig`] if the file cannot be read or
    /// parsed, or any error from [`LumenConfig::validate`].
    pub fn load(path: impl AsRef<Path>) -> LumenResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            LumenError::InvalidConfig(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&text)
    }

    /// Checks decoder count, listen address and depth intrinsics.
    ///
    /// # Errors
    ///
    /// [`LumenError::NoDecoders`], [`LumenError::TooManyDecoders`] or
    /// [`LumenError::InvalidConfig`].
    pub fn validate(&self) -> LumenResult<()> {
        if self.decoders.is_empty() {
            return Err(LumenError::NoDecoders);
        }
        if self.decoders.len() > MAX_DECODERS {
            return Err(LumenError::TooManyDecoders {
                requested: self.decoders.len(),
                max: MAX_DECODERS,
            });
        }
        self.net.bind_address()?;
        if let Some(depth) = &self.depth {
            depth.validate()?;
        }
        Ok(())
    }
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLOUD_TOML: &str = r#"
[net]
port = 9768
timeout_ms = 500

[[decoder]]
hardware = "vaapi"
codec = "hevc"
device = "/dev/dri/renderD128"
pixel_format = "p010le"
profile = 2

[[decoder]]
hardware = "vaapi"
codec = "hevc"
pixel_format = "rgb0"
profile = 1

[depth]
ppx = 421.353
ppy = 240.93
fx = 426.768
fy = 426.768
depth_unit = 0.0001
"#;

    #[test]
    fn test_parse_cloud_config() {
        let config = LumenConfig::from_toml_str(CLOUD_TOML).unwrap();
        assert_eq!(config.decoders.len(), 2);
        assert_eq!(config.decoders[0].requested_format(), Some(PixelFormat::P010Le));
        assert_eq!(config.decoders[1].requested_format(), Some(PixelFormat::Rgb0));
        assert_eq!(config.decoders[0].device(), Some("/dev/dri/renderD128"));
        assert_eq!(config.decoders[1].device(), None);
        let depth = config.depth.unwrap();
        assert!((depth.fx - 426.768).abs() < 1e-4);
        assert_eq!(depth.min_margin, 0.0);
        assert!(depth.max_margin.is_infinite());
    }

    #[test]
    fn test_defaults() {
        let config = LumenConfig::from_toml_str("[[decoder]]\n").unwrap();
        assert_eq!(config.net.port, DEFAULT_PORT);
        assert_eq!(config.net.timeout(), Duration::from_millis(500));
        assert_eq!(config.net.bind_address().unwrap().to_string(), "0.0.0.0:9768");
        assert!(config.depth.is_none());
        assert_eq!(config.decoders[0].dimensions(), None);
    }

    #[test]
    fn test_empty_strings_mean_default() {
        let hw = HwConfig {
            hardware: Some(String::new()),
            pixel_format: Some(String::new()),
            ..HwConfig::default()
        };
        assert_eq!(hw.hardware(), None);
        assert_eq!(hw.requested_format(), None);
    }

    #[test]
    fn test_decoder_count_validation() {
        let mut config = LumenConfig::default();
        assert_eq!(config.validate(), Err(LumenError::NoDecoders));

        config.decoders = vec![HwConfig::default(); MAX_DECODERS + 1];
        assert_eq!(
            config.validate(),
            Err(LumenError::TooManyDecoders { requested: 4, max: 3 })
        );

        config.decoders.truncate(MAX_DECODERS);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_depth_validation() {
        let bad = DepthConfig { fx: 0.0, ..DepthConfig::default() };
        assert!(matches!(bad.validate(), Err(LumenError::InvalidConfig(_))));

        let inverted = DepthConfig { min_margin: 2.0, max_margin: 1.0, ..DepthConfig::default() };
        assert!(inverted.validate().is_err());

        assert!(DepthConfig::default().validate().is_ok());
    }

    #[test]
    fn test_bad_listen_ip() {
        let net = NetConfig { ip: Some("not-an-ip".into()), ..NetConfig::default() };
        assert!(net.bind_address().is_err());

        let net = NetConfig { ip: Some("127.0.0.1".into()), port: 9000, ..NetConfig::default() };
        assert_eq!(net.bind_address().unwrap().to_string(), "127.0.0.1:9000");
    }

    #[test]
    fn test_syntax_error_is_invalid_config() {
        let err = LumenConfig::from_toml_str("[[decoder]\n").unwrap_err();
        assert!(matches!(err, LumenError::InvalidConfig(_)));
    }
}
