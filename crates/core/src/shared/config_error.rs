use thiserror::Error;

/// Invalid or missing tracker setting. An absent required key is reported
/// by the JSON parser and lands in [`ConfigError::Parse`].
///
/// Raised when settings are loaded or validated, never during a run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("invalid value for '{key}': {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("failed to parse settings: {0}")]
    Parse(String),
}

impl ConfigError {
    pub fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Fails with [`ConfigError::Invalid`] unless `value` is finite and strictly positive.
pub fn require_positive(key: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(
            key,
            format!("expected a finite value > 0, got {value}"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0.0)]
    #[case(-1.0)]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    fn test_require_positive_rejects(#[case] value: f64) {
        let err = require_positive("max_distance", value).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "max_distance", .. }));
    }

    #[test]
    fn test_require_positive_accepts() {
        assert!(require_positive("max_distance", 1e-9).is_ok());
    }

    #[test]
    fn test_display_names_the_key() {
        let err = ConfigError::invalid("cutoff_percentile", "must be in [0, 1]");
        assert_eq!(
            err.to_string(),
            "invalid value for 'cutoff_percentile': must be in [0, 1]"
        );
    }
}
