// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Enhancement parameters and service configuration.

use std::net::{IpAddr, Ipv4Addr};
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::error::{EnhancerError, Result};

/// Accepted sharpness factors at the service boundary.
pub const SHARPNESS_RANGE: RangeInclusive<f32> = 0.5..=3.0;
/// Accepted contrast factors at the service boundary.
pub const CONTRAST_RANGE: RangeInclusive<f32> = 0.5..=2.0;
/// Accepted brightness factors at the service boundary.
pub const BRIGHTNESS_RANGE: RangeInclusive<f32> = 0.5..=2.0;
/// Accepted color (saturation) factors at the service boundary.
pub const COLOR_RANGE: RangeInclusive<f32> = 0.5..=2.0;

/// Integer upscaling factor applied by the super-resolution stage.
///
/// Serialized as the bare factor (`1`, `2`, `4` or `8`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum SuperResolution {
    /// No scaling.
    #[default]
    None,
    X2,
    X4,
    X8,
}

impl SuperResolution {
    /// The scale factor as an integer.
    pub const fn factor(self) -> u32 {
        match self {
            SuperResolution::None => 1,
            SuperResolution::X2 => 2,
            SuperResolution::X4 => 4,
            SuperResolution::X8 => 8,
        }
    }

    /// Whether this setting changes the image dimensions at all.
    pub const fn is_upscale(self) -> bool {
        !matches!(self, SuperResolution::None)
    }
}

impl TryFrom<u32> for SuperResolution {
    type Error = EnhancerError;

    fn try_from(factor: u32) -> Result<Self> {
        match factor {
            1 => Ok(SuperResolution::None),
            2 => Ok(SuperResolution::X2),
            4 => Ok(SuperResolution::X4),
            8 => Ok(SuperResolution::X8),
            other => Err(EnhancerError::InvalidConfig(format!(
                "super_resolution must be 1, 2, 4, or 8 (got {other})"
            ))),
        }
    }
}

impl From<SuperResolution> for u32 {
    fn from(value: SuperResolution) -> Self {
        value.factor()
    }
}

impl std::fmt::Display for SuperResolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x", self.factor())
    }
}

/// Per-call enhancement settings.
///
/// A multiplicative factor of exactly `1.0`, `denoise == false` and
/// `super_resolution == None` each mean "skip this stage". The pipeline applies
/// whatever values it is given; range checks belong to [`validate`](Self::validate)
/// and are only run at the service boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnhancementConfig {
    /// Edge enhancement factor (> 1 sharpens, < 1 softens).
    pub sharpness: f32,
    /// Contrast factor around the mean luminance.
    pub contrast: f32,
    /// Brightness factor.
    pub brightness: f32,
    /// Saturation factor.
    pub color: f32,
    /// Run the denoise stage first.
    pub denoise: bool,
    /// Upscaling factor.
    pub super_resolution: SuperResolution,
}

impl Default for EnhancementConfig {
    fn default() -> Self {
        Self {
            sharpness: 2.0,
            contrast: 1.2,
            brightness: 1.1,
            color: 1.1,
            denoise: false,
            super_resolution: SuperResolution::None,
        }
    }
}

impl EnhancementConfig {
    /// A configuration in which every stage is a no-op.
    pub fn identity() -> Self {
        Self {
            sharpness: 1.0,
            contrast: 1.0,
            brightness: 1.0,
            color: 1.0,
            denoise: false,
            super_resolution: SuperResolution::None,
        }
    }

    /// Copy of this configuration with a different upscaling factor.
    pub fn with_super_resolution(self, super_resolution: SuperResolution) -> Self {
        Self {
            super_resolution,
            ..self
        }
    }

    /// Range-check every factor against the documented limits.
    ///
    /// Reports the first offending field.
    pub fn validate(&self) -> Result<()> {
        check_range("sharpness", self.sharpness, &SHARPNESS_RANGE)?;
        check_range("contrast", self.contrast, &CONTRAST_RANGE)?;
        check_range("brightness", self.brightness, &BRIGHTNESS_RANGE)?;
        check_range("color", self.color, &COLOR_RANGE)?;
        Ok(())
    }
}

fn check_range(name: &str, value: f32, range: &RangeInclusive<f32>) -> Result<()> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(EnhancerError::InvalidConfig(format!(
            "{name} must be between {:.1} and {:.1}",
            range.start(),
            range.end()
        )))
    }
}

/// Settings for the HTTP front end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the listener binds to.
    pub bind_address: IpAddr,
    /// TCP port (default 8000).
    pub port: u16,
    /// Largest request (headers + body) accepted before answering 413.
    pub max_request_bytes: usize,
    /// Origins granted CORS access.
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8000,
            max_request_bytes: 64 * 1024 * 1024,
            allowed_origins: vec![
                "https://image-enhancer.vercel.app".into(),
                "http://localhost:3000".into(),
                "http://127.0.0.1:3000".into(),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = EnhancementConfig::default();
        assert_eq!(config.sharpness, 2.0);
        assert_eq!(config.contrast, 1.2);
        assert_eq!(config.brightness, 1.1);
        assert_eq!(config.color, 1.1);
        assert!(!config.denoise);
        assert_eq!(config.super_resolution, SuperResolution::None);
    }

    #[test]
    fn missing_json_fields_take_defaults() {
        let config: EnhancementConfig =
            serde_json::from_str(r#"{"sharpness": 1.5, "super_resolution": 4}"#).unwrap();
        assert_eq!(config.sharpness, 1.5);
        assert_eq!(config.contrast, 1.2);
        assert_eq!(config.super_resolution, SuperResolution::X4);
    }

    #[test]
    fn super_resolution_serializes_as_integer() {
        let config = EnhancementConfig::identity().with_super_resolution(SuperResolution::X8);
        let json = serde_json::to_value(config).unwrap();
        assert_eq!(json["super_resolution"], 8);
    }

    #[test]
    fn super_resolution_rejects_other_factors() {
        assert!(SuperResolution::try_from(3).is_err());
        assert!(serde_json::from_str::<EnhancementConfig>(r#"{"super_resolution": 16}"#).is_err());
        assert_eq!(SuperResolution::try_from(2).unwrap().factor(), 2);
    }

    #[test]
    fn validate_accepts_range_bounds() {
        let config = EnhancementConfig {
            sharpness: 3.0,
            contrast: 0.5,
            brightness: 2.0,
            color: 0.5,
            ..EnhancementConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_names_the_offending_field() {
        let config = EnhancementConfig {
            sharpness: 10.0,
            ..EnhancementConfig::default()
        };
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("sharpness must be between 0.5 and 3.0"), "{err}");

        let config = EnhancementConfig {
            color: 0.1,
            ..EnhancementConfig::default()
        };
        assert!(config.validate().unwrap_err().to_string().contains("color"));
    }

    #[test]
    fn server_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 8000);
        assert_eq!(config.allowed_origins.len(), 3);
        let parsed: ServerConfig = serde_json::from_str(r#"{"port": 9000}"#).unwrap();
        assert_eq!(parsed.port, 9000);
        assert_eq!(parsed.max_request_bytes, config.max_request_bytes);
    }
}
