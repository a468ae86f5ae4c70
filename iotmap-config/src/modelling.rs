//! Modelling parameters: target layer and correlation windows.

use serde::{Deserialize, Serialize};
use validator::{self, Validate};

use crate::validation;

/// Correlation windows (seconds) and the layer the run should reach.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct ModellingConfig {
    /// Store label of the layer to build (2 = datalink .. 5 = application).
    #[serde(default = "default_level")]
    #[validate(range(min = 2, max = 5))]
    pub level: u8,

    /// Delay for an object to respond to a request (transport phase 1).
    #[serde(default = "default_tdelta1")]
    #[validate(custom(function = validation::validate_window))]
    pub tdelta1: f64,

    /// Delay for an object to forward a packet (transport phase 2).
    /// Negative disables controller detection.
    #[serde(default = "default_tdelta2")]
    pub tdelta2: f64,

    /// Delay for a controller to forward a packet (application layer).
    #[serde(default = "default_adelta")]
    #[validate(custom(function = validation::validate_window))]
    pub adelta: f64,
}

fn default_level() -> u8 {
    5
}

fn default_tdelta1() -> f64 {
    0.6
}

fn default_tdelta2() -> f64 {
    0.7
}

fn default_adelta() -> f64 {
    1.5
}

impl Default for ModellingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            tdelta1: default_tdelta1(),
            tdelta2: default_tdelta2(),
            adelta: default_adelta(),
        }
    }
}
