//! # IoTMap Configuration System
//!
//! Hierarchical configuration for the modelling engine: correlation
//! windows, target layer, and per-layer pattern selection.
//!
//! ## Features
//! - **Unified Configuration**: one source of truth for every component
//! - **Validation**: runtime validation of windows and pattern names
//! - **Environment Awareness**: `IOTMAP_*` variables override files

#![warn(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

mod error;
mod modelling;
mod patterns;
mod validation;

pub use error::ConfigError;
pub use modelling::ModellingConfig;
pub use patterns::PatternsConfig;

/// Top-level configuration container.
#[derive(Debug, Serialize, Deserialize, Validate, Default)]
pub struct IotmapConfig {
    /// Correlation windows and target layer.
    #[validate(nested)]
    pub modelling: ModellingConfig,

    /// Pattern name selected per layer.
    #[validate(nested)]
    pub patterns: PatternsConfig,
}

impl IotmapConfig {
    /// Load configuration from default files and environment.
    ///
    /// Hierarchy:
    /// 1. Default values
    /// 2. `config/iotmap.yaml` - base settings; defaults when missing.
    /// 3. `IOTMAP_*` environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(IotmapConfig::default()));

        if Path::new("config/iotmap.yaml").exists() {
            figment = figment.merge(Yaml::file("config/iotmap.yaml"));
        }

        figment
            .merge(Env::prefixed("IOTMAP_").split("__"))
            .extract()
            .map_err(ConfigError::from)
            .and_then(|config: Self| {
                config.validate()?;
                Ok(config)
            })
    }

    /// Load configuration from a specific path.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(PathBuf::from(
                path.to_string_lossy().to_string(),
            )));
        }

        Figment::from(Serialized::defaults(IotmapConfig::default()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed("IOTMAP_").split("__"))
            .extract()
            .map_err(ConfigError::from)
            .and_then(|config: Self| {
                config.validate()?;
                Ok(config)
            })
    }
}
