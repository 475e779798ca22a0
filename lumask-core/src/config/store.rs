//! Configuration persistence
//!
//! Binary form is postcard; the version byte leads, so a stale blob is
//! rejected before any field is trusted.

use super::types::{ConfigError, MaskConfig};

/// Maximum serialized config size (binary)
pub const MAX_CONFIG_SIZE: usize = 64;

/// Serialize a configuration into `buffer`, returning the used bytes
pub fn to_bytes<'a>(config: &MaskConfig, buffer: &'a mut [u8]) -> Result<&'a [u8], ConfigError> {
    let bytes = postcard::to_slice(config, buffer).map_err(|_| ConfigError::Serialize)?;
    Ok(&*bytes)
}

/// Load a configuration from postcard bytes
pub fn from_bytes(bytes: &[u8]) -> Result<MaskConfig, ConfigError> {
    let config: MaskConfig = postcard::from_bytes(bytes).map_err(|_| ConfigError::Deserialize)?;
    config.validate()?;
    Ok(config)
}

/// Parse a configuration from a TOML document
///
/// Missing sections and keys take their defaults.
#[cfg(feature = "toml")]
pub fn from_toml(input: &str) -> Result<MaskConfig, ConfigError> {
    let config: MaskConfig = toml::from_str(input).map_err(|_| ConfigError::TomlParse)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DisplayMode, Rgb};

    #[test]
    fn test_binary_roundtrip() {
        let mut config = MaskConfig::new();
        config.display.mode = DisplayMode::ScrollLeft;
        config.scheme.foreground = Rgb::new(255, 200, 0);
        config.upload.frame_timeout_ms = None;

        let mut buffer = [0u8; MAX_CONFIG_SIZE];
        let bytes = to_bytes(&config, &mut buffer).unwrap();
        assert_eq!(bytes[0], config.version);

        assert_eq!(from_bytes(bytes), Ok(config));
    }

    #[test]
    fn test_binary_rejects_other_version() {
        let mut buffer = [0u8; MAX_CONFIG_SIZE];
        let len = to_bytes(&MaskConfig::new(), &mut buffer).unwrap().len();
        buffer[0] = 7;

        assert_eq!(from_bytes(&buffer[..len]), Err(ConfigError::VersionMismatch));
    }

    #[test]
    fn test_binary_rejects_garbage() {
        assert_eq!(from_bytes(&[]), Err(ConfigError::Deserialize));
    }

    #[test]
    fn test_small_buffer() {
        let mut buffer = [0u8; 4];
        assert_eq!(
            to_bytes(&MaskConfig::new(), &mut buffer),
            Err(ConfigError::Serialize)
        );
    }

    #[cfg(feature = "toml")]
    #[test]
    fn test_toml_partial_document() {
        use crate::color::DecorationStyle;
        use crate::config::BusyPolicy;

        let config = from_toml(
            r#"
            [display]
            brightness = 40
            mode = "ScrollRight"

            [scheme]
            foreground = { r = 255, g = 0, b = 64 }
            style = "waves"

            [upload]
            busy_policy = "fail_fast"
            "#,
        )
        .unwrap();

        assert_eq!(config.display.brightness, 40);
        assert_eq!(config.display.mode, DisplayMode::ScrollRight);
        assert_eq!(config.display.speed, 50);
        assert_eq!(config.scheme.foreground, Rgb::new(255, 0, 64));
        assert_eq!(config.scheme.style, DecorationStyle::Waves);
        assert_eq!(config.upload.busy_policy, BusyPolicy::FailFast);
        assert_eq!(config.upload.cancel_timeout_ms, 1000);
    }

    #[cfg(feature = "toml")]
    #[test]
    fn test_toml_rejects_invalid() {
        assert_eq!(
            from_toml("[display]\nbrightness = 150\n"),
            Err(ConfigError::BrightnessOutOfRange)
        );
        assert_eq!(from_toml("[display"), Err(ConfigError::TomlParse));
    }
}
