//! Configuration type definitions

use core::fmt;

use lumask_protocol::opcode::MAX_BRIGHTNESS;

use crate::color::ColorScheme;
use crate::render::TextStyle;
use crate::DisplayMode;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Current configuration format version
pub const CONFIG_VERSION: u8 = 1;

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Serialization failed (buffer too small)
    Serialize,
    /// Deserialization failed
    Deserialize,
    /// TOML parsing failed
    TomlParse,
    /// Config version mismatch
    VersionMismatch,
    /// Brightness above the firmware maximum
    BrightnessOutOfRange,
    /// Text scale outside the supported range
    InvalidTextStyle,
    /// Cancellation timeout of zero
    InvalidTimeout,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            ConfigError::Serialize => "config serialization failed",
            ConfigError::Deserialize => "config deserialization failed",
            ConfigError::TomlParse => "invalid TOML config",
            ConfigError::VersionMismatch => "config version mismatch",
            ConfigError::BrightnessOutOfRange => "brightness above 100",
            ConfigError::InvalidTextStyle => "text scale out of range",
            ConfigError::InvalidTimeout => "cancel timeout must be non-zero",
        };
        f.write_str(msg)
    }
}

/// Display settings sent ahead of every upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DisplayConfig {
    /// Brightness (0-100)
    pub brightness: u8,
    /// Presentation mode
    pub mode: DisplayMode,
    /// Scroll speed (0-255)
    pub speed: u8,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            brightness: 80,
            mode: DisplayMode::Steady,
            speed: 50,
        }
    }
}

/// What to do when an upload starts while another is in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum BusyPolicy {
    /// Cancel the running upload, then start the new one
    #[default]
    Preempt,
    /// Reject the new upload with `AlreadyUploading`
    FailFast,
}

/// Layout used for uploaded content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PayloadFormat {
    /// One RGB triple per pixel
    #[default]
    ColorBuffer,
    /// Column bitmap with per-column colours (older firmware)
    ColumnBitmap,
}

/// Upload sequencing settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct UploadConfig {
    /// Behaviour when busy
    pub busy_policy: BusyPolicy,
    /// Payload layout
    pub format: PayloadFormat,
    /// How long a cancellation waits for the session to stop
    pub cancel_timeout_ms: u32,
    /// Per-frame send timeout, `None` waits forever
    pub frame_timeout_ms: Option<u32>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            busy_policy: BusyPolicy::Preempt,
            format: PayloadFormat::ColorBuffer,
            cancel_timeout_ms: 1000,
            frame_timeout_ms: Some(3000),
        }
    }
}

/// Complete mask configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MaskConfig {
    /// Format version
    pub version: u8,
    pub display: DisplayConfig,
    pub scheme: ColorScheme,
    pub text: TextStyle,
    pub upload: UploadConfig,
}

impl Default for MaskConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            display: DisplayConfig::default(),
            scheme: ColorScheme::default(),
            text: TextStyle::default(),
            upload: UploadConfig::default(),
        }
    }
}

impl MaskConfig {
    /// Create a configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Check every field is within range
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != CONFIG_VERSION {
            return Err(ConfigError::VersionMismatch);
        }
        if self.display.brightness > MAX_BRIGHTNESS {
            return Err(ConfigError::BrightnessOutOfRange);
        }
        self.text
            .validate()
            .map_err(|_| ConfigError::InvalidTextStyle)?;
        if self.upload.cancel_timeout_ms == 0 {
            return Err(ConfigError::InvalidTimeout);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::DecorationStyle;
    use crate::Rgb;

    #[test]
    fn test_defaults() {
        let config = MaskConfig::new();
        assert_eq!(config.version, CONFIG_VERSION);
        assert_eq!(config.display.brightness, 80);
        assert_eq!(config.display.mode, DisplayMode::Steady);
        assert_eq!(config.display.speed, 50);
        assert_eq!(config.scheme.foreground, Rgb::WHITE);
        assert_eq!(config.scheme.style, DecorationStyle::Lines);
        assert_eq!(config.upload.busy_policy, BusyPolicy::Preempt);
        assert_eq!(config.upload.cancel_timeout_ms, 1000);
        assert_eq!(config.upload.frame_timeout_ms, Some(3000));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let mut config = MaskConfig::new();
        config.display.brightness = 101;
        assert_eq!(config.validate(), Err(ConfigError::BrightnessOutOfRange));

        let mut config = MaskConfig::new();
        config.text.scale = 0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidTextStyle));

        let mut config = MaskConfig::new();
        config.upload.cancel_timeout_ms = 0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidTimeout));

        let mut config = MaskConfig::new();
        config.version = 2;
        assert_eq!(config.validate(), Err(ConfigError::VersionMismatch));
    }
}
