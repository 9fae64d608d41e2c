//! # Configuration
//!
//! Tunables for bucket behaviour. Loaded from TOML or RON through the
//! [`Config`] trait, or built in code with the `with_*` setters.

pub use serde::{Deserialize, Serialize};

use crate::render::lights::MAX_LIGHT;

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;

        // Try different formats
        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A value is outside its allowed range
    #[error("Invalid value for {field}: {reason}")]
    Invalid {
        /// Name of the offending field
        field: &'static str,
        /// Why the value was rejected
        reason: String,
    },
}

/// # Bucket Configuration
///
/// Shared by every bucket created against the same scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BucketConfig {
    /// Edge length of the grid cell used to key the per-object light cache
    pub light_cell_size: f32,
    /// Lights gathered per object, clamped to [`MAX_LIGHT`]
    pub max_lights: usize,
    /// Number of skeletons the shared animation storage can hold
    pub skeleton_capacity: usize,
    /// Default log filter applied by [`BucketConfig::init_logging`]
    pub log_level: String,
}

impl BucketConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self {
            light_cell_size: 20.0,
            max_lights: MAX_LIGHT,
            skeleton_capacity: 1024,
            log_level: "info".to_string(),
        }
    }

    /// Set the light cache grid cell size
    pub fn with_light_cell_size(mut self, size: f32) -> Self {
        self.light_cell_size = size;
        self
    }

    /// Set how many lights each object gathers
    pub fn with_max_lights(mut self, count: usize) -> Self {
        self.max_lights = count;
        self
    }

    /// Set the animation storage capacity
    pub fn with_skeleton_capacity(mut self, capacity: usize) -> Self {
        self.skeleton_capacity = capacity;
        self
    }

    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Install the `env_logger` backend with [`Self::log_level`] as the
    /// default filter. `RUST_LOG` overrides it; repeated calls are ignored.
    pub fn init_logging(&self) {
        crate::foundation::logging::init_with_level(&self.log_level);
    }

    /// Lights per object after clamping to the push storage limit
    pub fn effective_max_lights(&self) -> usize {
        self.max_lights.min(MAX_LIGHT)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.light_cell_size.is_finite() && self.light_cell_size > 0.0) {
            return Err(ConfigError::Invalid {
                field: "light_cell_size",
                reason: format!("must be a positive finite number, got {}", self.light_cell_size),
            });
        }

        if self.max_lights > MAX_LIGHT {
            return Err(ConfigError::Invalid {
                field: "max_lights",
                reason: format!("must not exceed {MAX_LIGHT}, got {}", self.max_lights),
            });
        }

        if self.skeleton_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "skeleton_capacity",
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(())
    }
}

impl Default for BucketConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl Config for BucketConfig {}
