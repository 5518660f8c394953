//! Configuration using Figment
//!
//! Configuration is layered, later sources overriding earlier ones:
//! 1. Built-in defaults ([`AppConfig::default`])
//! 2. `config/biocapture.toml` (or an explicit path)
//! 3. Environment variables prefixed with `BIOCAPTURE_`, nested keys split on `__`
//!
//! # Example
//! ```no_run
//! use biocapture::config::AppConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::load()?;
//! println!("Profiles stored in {}", config.storage.profiles_path.display());
//! # Ok(())
//! # }
//! ```
//!
//! `BIOCAPTURE_APPLICATION__LOG_LEVEL=debug` overrides `application.log_level`.

use crate::error::{AppResult, CaptureError};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file read when none is given on the command line
pub const DEFAULT_CONFIG_PATH: &str = "config/biocapture.toml";
/// Default profile store file name
pub const DEFAULT_PROFILES_FILE: &str = "camera_profile_config.json";
/// Default collection store file name
pub const DEFAULT_COLLECTIONS_FILE: &str = "collection_config.json";
/// Default reserved identity token
pub const DEFAULT_EASTER_EGG_TOKEN: &str = "queen";
/// Prefix for environment overrides; `__` separates sections
pub const ENV_PREFIX: &str = "BIOCAPTURE_";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Name and logging
    #[serde(default)]
    pub application: ApplicationConfig,
    /// Catalog file locations
    #[serde(default)]
    pub storage: StorageConfig,
    /// Session actor settings
    #[serde(default)]
    pub session: SessionConfig,
    /// Simulated camera
    #[serde(default)]
    pub device: DeviceConfig,
}

/// Application-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Application name
    pub name: String,
    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Log output format (pretty, compact, json)
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

/// Profile and collection store locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Camera profile JSON file
    pub profiles_path: PathBuf,
    /// Collection JSON file
    pub collections_path: PathBuf,
}

/// Session actor settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Identity input containing this token skips validation
    pub easter_egg_token: String,
    /// Capacity of the actor's command queue
    #[serde(default = "default_command_capacity")]
    pub command_capacity: usize,
    /// Capacity of the session notice broadcast
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

/// Simulated camera used by `biocapture simulate`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Model name the mock camera reports
    pub model_name: String,
    /// Delay between shutter press and image ready
    #[serde(default = "default_image_delay")]
    pub image_delay_ms: u64,
}

// Default value functions
fn default_log_format() -> String {
    "compact".to_string()
}

fn default_command_capacity() -> usize {
    32
}

fn default_event_capacity() -> usize {
    64
}

fn default_image_delay() -> u64 {
    50
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: "BioCapture".to_string(),
            log_level: "info".to_string(),
            log_format: default_log_format(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            profiles_path: PathBuf::from(DEFAULT_PROFILES_FILE),
            collections_path: PathBuf::from(DEFAULT_COLLECTIONS_FILE),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            easter_egg_token: DEFAULT_EASTER_EGG_TOKEN.to_string(),
            command_capacity: default_command_capacity(),
            event_capacity: default_event_capacity(),
        }
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            model_name: "Canon EOS 5D Mark IV".to_string(),
            image_delay_ms: default_image_delay(),
        }
    }
}

impl AppConfig {
    /// Load from `config/biocapture.toml` and the environment.
    pub fn load() -> AppResult<Self> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load from a specific file path. A missing file leaves the defaults in place.
    pub fn load_from<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let config: AppConfig = Self::figment(path.as_ref()).extract()?;
        config.validate().map_err(CaptureError::Config)?;
        Ok(config)
    }

    fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.application.log_level.to_lowercase().as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.application.log_level,
                valid_levels.join(", ")
            ));
        }

        let valid_formats = ["pretty", "compact", "json"];
        if !valid_formats.contains(&self.application.log_format.to_lowercase().as_str()) {
            return Err(format!(
                "Invalid log_format '{}'. Must be one of: {}",
                self.application.log_format,
                valid_formats.join(", ")
            ));
        }

        if self.storage.profiles_path.as_os_str().is_empty()
            || self.storage.collections_path.as_os_str().is_empty()
        {
            return Err("Store paths must not be empty".to_string());
        }

        if self.session.easter_egg_token.trim().is_empty() {
            return Err("session.easter_egg_token must not be empty".to_string());
        }

        if self.session.command_capacity == 0 || self.session.event_capacity == 0 {
            return Err(format!(
                "Channel capacities must be greater than 0 (command {}, event {})",
                self.session.command_capacity, self.session.event_capacity
            ));
        }

        Ok(())
    }

    /// Render as TOML, e.g. to seed a config file.
    pub fn to_toml_string(&self) -> AppResult<String> {
        toml::to_string_pretty(self).map_err(|e| CaptureError::Config(e.to_string()))
    }
}
