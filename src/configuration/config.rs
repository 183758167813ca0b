use super::types::*;
use crate::error_handling::types::ConfigError;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Application configuration structure that defines all runtime parameters.
///
/// The configuration is read from a TOML file; every section has defaults so a
/// minimal file only needs the values that differ. `validate` is always run
/// after parsing.
///
/// # Examples
///
/// ```
/// use sitecycle::configuration::config::Config;
///
/// let config = Config::from_toml_str("max_retained = 5").unwrap();
/// assert_eq!(config.max_retained, 5);
/// assert!(config.remote.is_none());
/// ```
///
/// # Fields Overview
///
/// - `sites_file`: text file with one URL per line
/// - `state_file`: where the rotation cursor is persisted
/// - `screenshots_dir`: local capture directory
/// - `max_retained`: bound on both the local and the remote capture history
/// - `scheduler`, `web`, `capture`, `renderer`: component settings
/// - `remote`: optional remote history; when absent the remote step is skipped
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sites_file: PathBuf,
    pub state_file: PathBuf,
    pub screenshots_dir: PathBuf,
    pub max_retained: usize,
    pub scheduler: SchedulerConfig,
    pub web: WebConfig,
    pub capture: CaptureConfig,
    pub renderer: RendererConfig,
    pub remote: Option<RemoteConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sites_file: PathBuf::from("sites.txt"),
            state_file: PathBuf::from("state.json"),
            screenshots_dir: PathBuf::from("screenshots"),
            max_retained: 10,
            scheduler: SchedulerConfig::default(),
            web: WebConfig::default(),
            capture: CaptureConfig::default(),
            renderer: RendererConfig::default(),
            remote: None,
        }
    }
}

impl Config {
    /// Reads and validates the configuration file at `path`.
    ///
    /// Relative paths inside the file are resolved against the file's directory.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        info!("Reading configuration from {}", path.display());
        let content = fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&content)?;

        if let Some(base) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            config.resolve_relative_to(base);
        }
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config =
            toml::from_str(content).map_err(|e| ConfigError::TomlError(e.to_string()))?;
        config.validate()?;
        debug!("Parsed configuration: {:?}", config);
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_retained == 0 {
            return Err(ConfigError::NotInRange(String::from(
                "max_retained must be at least 1",
            )));
        }
        if self.scheduler.interval_secs == 0 {
            return Err(ConfigError::NotInRange(String::from(
                "scheduler.interval_secs must be greater than 0",
            )));
        }
        if self.capture.navigation_timeout_secs == 0 {
            return Err(ConfigError::NotInRange(String::from(
                "capture.navigation_timeout_secs must be greater than 0",
            )));
        }
        if self.renderer.command_timeout_secs == 0 {
            return Err(ConfigError::NotInRange(String::from(
                "renderer.command_timeout_secs must be greater than 0",
            )));
        }
        if self.capture.viewport.width == 0 || self.capture.viewport.height == 0 {
            return Err(ConfigError::NotInRange(String::from(
                "capture.viewport width and height must be greater than 0",
            )));
        }
        if let Some(remote) = &self.remote {
            if remote.owner.trim().is_empty() {
                return Err(ConfigError::MissingField(String::from("remote.owner")));
            }
            if remote.repo.trim().is_empty() {
                return Err(ConfigError::MissingField(String::from("remote.repo")));
            }
            if remote.sequence_digits == 0 || remote.sequence_digits > 9 {
                return Err(ConfigError::NotInRange(String::from(
                    "remote.sequence_digits must be between 1 and 9",
                )));
            }
        }
        Ok(())
    }

    fn resolve_relative_to(&mut self, base: &Path) {
        for path in [
            &mut self.sites_file,
            &mut self.state_file,
            &mut self.screenshots_dir,
        ] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}
