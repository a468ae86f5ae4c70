//! Custom validation functions for configuration.

use validator::ValidationError;

/// Pattern names are lowercase identifiers, as registered by the engine.
pub fn validate_pattern_name(name: &str) -> Result<(), ValidationError> {
    let re = regex::Regex::new("^[a-z][a-z0-9_]*$")
        .map_err(|_| ValidationError::new("invalid_regex"))?;
    if re.is_match(name) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_pattern_name"))
    }
}

/// Correlation windows must be positive, finite seconds.
pub fn validate_window(value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ValidationError::new("window_not_positive"))
    }
}
