//! Pattern selection per layer.

use serde::{Deserialize, Serialize};
use validator::{self, Validate};

use crate::validation;

/// Name of the construction strategy to run for each layer.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct PatternsConfig {
    #[serde(default = "default_datalink")]
    #[validate(custom(function = validation::validate_pattern_name))]
    pub datalink: String,

    #[serde(default = "default_network")]
    #[validate(custom(function = validation::validate_pattern_name))]
    pub network: String,

    #[serde(default = "default_transport")]
    #[validate(custom(function = validation::validate_pattern_name))]
    pub transport: String,

    #[serde(default = "default_application")]
    #[validate(custom(function = validation::validate_pattern_name))]
    pub application: String,
}

fn default_datalink() -> String {
    "node_transmission".into()
}

fn default_network() -> String {
    "nwk_transmission".into()
}

fn default_transport() -> String {
    "transport_transmission".into()
}

fn default_application() -> String {
    "interact".into()
}

impl Default for PatternsConfig {
    fn default() -> Self {
        Self {
            datalink: default_datalink(),
            network: default_network(),
            transport: default_transport(),
            application: default_application(),
        }
    }
}

impl PatternsConfig {
    /// The configured pattern name for a store layer label.
    pub fn for_level(&self, level: u8) -> Option<&str> {
        match level {
            2 => Some(&self.datalink),
            3 => Some(&self.network),
            4 => Some(&self.transport),
            5 => Some(&self.application),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_names_are_checked() {
        let config = PatternsConfig {
            transport: "Not A Pattern!".into(),
            ..PatternsConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn for_level_maps_labels() {
        let config = PatternsConfig::default();
        assert_eq!(config.for_level(4), Some("transport_transmission"));
        assert_eq!(config.for_level(5), Some("interact"));
        assert_eq!(config.for_level(6), None);
    }
}
