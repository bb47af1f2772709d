//! Configuration management

use crate::error::{ErrorContext, SmartzoneError, SmartzoneResult};
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration for the SmartZone access kernel
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SmartzoneConfig {
    pub logging: LoggingConfig,
    pub resolver: ResolverConfig,
    pub flags: FlagConfig,
}

/// Session resolver tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Whether locally persisted demo flags may bypass the remote session.
    /// Production deployments turn this off without touching the
    /// authenticated path.
    pub bypass_enabled: bool,
    /// Upper bound on a single profile fetch, in milliseconds
    pub profile_timeout_ms: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            bypass_enabled: true,
            profile_timeout_ms: 5000,
        }
    }
}

/// Flag storage selection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FlagConfig {
    /// Persist flags to disk instead of keeping them in memory
    pub persist: bool,
    /// Flag file location; defaults under the platform data directory
    pub path: Option<PathBuf>,
}

impl FlagConfig {
    /// Resolve the flag file location for persistent storage
    pub fn storage_path(&self) -> SmartzoneResult<PathBuf> {
        if let Some(path) = &self.path {
            return Ok(path.clone());
        }

        let data_dir = dirs::data_dir().ok_or_else(|| SmartzoneError::Config {
            message: "Could not determine platform data directory".to_string(),
            source: None,
            context: ErrorContext::new("config")
                .with_operation("storage_path")
                .with_suggestion("Set flags.path explicitly in the configuration file"),
        })?;

        Ok(data_dir.join("smartzone").join("flags.json"))
    }
}

impl SmartzoneConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> SmartzoneResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| SmartzoneError::Config {
            message: format!("Failed to read config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("read_file")
                .with_suggestion("Check if the config file exists and is readable"),
        })?;

        let config: SmartzoneConfig =
            toml::from_str(&content).map_err(|e| SmartzoneError::Config {
                message: format!("Failed to parse config: {}", e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("config")
                    .with_operation("parse_toml")
                    .with_suggestion("Check TOML syntax in config file"),
            })?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> SmartzoneResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| SmartzoneError::Config {
            message: format!("Failed to serialize config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config").with_operation("serialize_toml"),
        })?;

        std::fs::write(path, content).map_err(|e| SmartzoneError::Config {
            message: format!("Failed to write config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("write_file")
                .with_suggestion("Check if the directory exists and is writable"),
        })?;

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> SmartzoneResult<()> {
        if self.resolver.profile_timeout_ms == 0 {
            return Err(SmartzoneError::Config {
                message: "Resolver profile_timeout_ms must be greater than 0".to_string(),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Set resolver.profile_timeout_ms to a positive value"),
            });
        }

        const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
        if !LEVELS.contains(&self.logging.level.as_str()) {
            return Err(SmartzoneError::Config {
                message: format!("Unknown logging level: {}", self.logging.level),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Use one of: trace, debug, info, warn, error"),
            });
        }

        Ok(())
    }
}
