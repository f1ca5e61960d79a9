use std::time::Duration;
use url::Url;

use crate::error::ConfigError;

/// Centralized configuration validation utilities
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate a URL string
    pub fn validate_url(url: &str, field_name: &str) -> Result<(), ConfigError> {
        Url::parse(url).map_err(|_| ConfigError::InvalidValue {
            field: field_name.to_string(),
            value: url.to_string(),
        })?;
        Ok(())
    }

    /// Validate a raw pause-duration input. The value must be a positive
    /// whole number of seconds; anything else is rejected up front so a bad
    /// setting never surfaces mid-batch.
    pub fn validate_pause(raw: &str) -> Result<Duration, ConfigError> {
        let invalid = || ConfigError::InvalidValue {
            field: "pause".to_string(),
            value: raw.to_string(),
        };

        let seconds = raw.trim().parse::<u64>().map_err(|_| invalid())?;
        if seconds == 0 {
            return Err(invalid());
        }
        Ok(Duration::from_secs(seconds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(
            ConfigValidator::validate_url("https://apic-desktop.musixmatch.com/ws/1.1", "base_url")
                .is_ok()
        );
        assert!(ConfigValidator::validate_url("not-a-url", "base_url").is_err());
    }

    #[test]
    fn test_validate_pause() {
        assert_eq!(
            ConfigValidator::validate_pause("30").unwrap(),
            Duration::from_secs(30)
        );
        assert_eq!(
            ConfigValidator::validate_pause(" 5 ").unwrap(),
            Duration::from_secs(5)
        );
        assert!(ConfigValidator::validate_pause("abc").is_err());
        assert!(ConfigValidator::validate_pause("0").is_err());
        assert!(ConfigValidator::validate_pause("-3").is_err());
        assert!(ConfigValidator::validate_pause("2.5").is_err());
        assert!(ConfigValidator::validate_pause("").is_err());
    }
}
