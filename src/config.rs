//! Layered configuration.
//!
//! Lowest to highest precedence: built-in defaults, a YAML file (from
//! `--config` or `FOLDER_LINKS_CONFIG`), environment variables (a `.env`
//! file in the working directory is loaded first), then CLI flags, which
//! the command applies on top.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::materialize::MaterializeOptions;
use crate::scan::{ScanOptions, DEFAULT_MAX_PATH_LEN};

/// Names a YAML config file.
pub const CONFIG_ENV: &str = "FOLDER_LINKS_CONFIG";
/// Overrides [`Config::staging_dir`].
pub const STAGING_DIR_ENV: &str = "FOLDER_LINKS_STAGING_DIR";
/// Overrides [`Config::follow_links`].
pub const FOLLOW_LINKS_ENV: &str = "FOLDER_LINKS_FOLLOW_LINKS";
/// Overrides [`Config::max_path_len`].
pub const MAX_PATH_LEN_ENV: &str = "FOLDER_LINKS_MAX_PATH_LEN";
/// Overrides [`Config::cleanup_staging_on_failure`].
pub const CLEANUP_STAGING_ENV: &str = "FOLDER_LINKS_CLEANUP_STAGING";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file {}: {source}", .path.display())]
    Read {
        /// The config file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The config file is not valid YAML for [`Config`].
    #[error("failed to parse config file {}: {source}", .path.display())]
    Parse {
        /// The config file.
        path: PathBuf,
        /// Underlying parse error.
        source: serde_yaml::Error,
    },
    /// An environment variable holds an unusable value.
    #[error("invalid value {value:?} for {key}: expected {expected}")]
    InvalidValue {
        /// The variable name.
        key: &'static str,
        /// The rejected value.
        value: String,
        /// What would have been accepted.
        expected: &'static str,
    },
}

/// Settings for a scan-and-convert run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Where staging folders are built; the system temp folder when unset.
    pub staging_dir: Option<PathBuf>,
    /// Follow symbolic links and junctions while scanning.
    pub follow_links: bool,
    /// Longest directory path the scanner descends into.
    pub max_path_len: usize,
    /// Remove orphaned staging folders after a failed conversion.
    pub cleanup_staging_on_failure: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            staging_dir: None,
            follow_links: false,
            max_path_len: DEFAULT_MAX_PATH_LEN,
            cleanup_staging_on_failure: false,
        }
    }
}

impl Config {
    /// Loads the config file (if any) and applies environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file is unreadable or invalid, or an
    /// environment variable holds an invalid value.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env");
        }
        let file = config_path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));
        let mut config = match file {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Reads a YAML config file. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&content)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    /// Applies overrides looked up by environment variable name.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first variable with an invalid value.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(STAGING_DIR_ENV).filter(|v| !v.is_empty()) {
            self.staging_dir = Some(PathBuf::from(dir));
        }
        if let Some(value) = lookup(FOLLOW_LINKS_ENV) {
            self.follow_links = parse_bool(FOLLOW_LINKS_ENV, &value)?;
        }
        if let Some(value) = lookup(CLEANUP_STAGING_ENV) {
            self.cleanup_staging_on_failure = parse_bool(CLEANUP_STAGING_ENV, &value)?;
        }
        if let Some(value) = lookup(MAX_PATH_LEN_ENV) {
            self.max_path_len = value
                .trim()
                .parse()
                .ok()
                .filter(|&len: &usize| len > 0)
                .ok_or(ConfigError::InvalidValue {
                    key: MAX_PATH_LEN_ENV,
                    value,
                    expected: "a positive integer",
                })?;
        }
        Ok(())
    }

    /// Traversal settings derived from this config.
    #[must_use]
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions { follow_links: self.follow_links, max_path_len: self.max_path_len }
    }

    /// Conversion settings derived from this config.
    #[must_use]
    pub fn materialize_options(&self) -> MaterializeOptions {
        MaterializeOptions {
            staging_dir: self.staging_dir.clone().unwrap_or_else(std::env::temp_dir),
            cleanup_staging_on_failure: self.cleanup_staging_on_failure,
        }
    }
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
            expected: "true or false",
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_classic_path_limit() {
        let config = Config::default();
        assert_eq!(config.max_path_len, 259);
        assert!(!config.follow_links);
        assert!(!config.cleanup_staging_on_failure);
        assert_eq!(config.materialize_options().staging_dir, std::env::temp_dir());
    }

    #[test]
    fn reads_partial_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("folder-links.yaml");
        std::fs::write(&path, "follow_links: true\nstaging_dir: /var/stage\n").unwrap();

        let config = Config::from_file(&path).unwrap();

        assert!(config.follow_links);
        assert_eq!(config.staging_dir, Some(PathBuf::from("/var/stage")));
        assert_eq!(config.max_path_len, 259);
    }

    #[test]
    fn empty_yaml_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.yaml");
        std::fs::write(&path, "\n").unwrap();
        assert_eq!(Config::from_file(&path).unwrap(), Config::default());
    }

    #[test]
    fn rejects_unknown_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.yaml");
        std::fs::write(&path, "follow_symlinks: true\n").unwrap();

        let err = Config::from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = Config::from_file(Path::new("/definitely/not/here.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn environment_overrides_file_values() {
        let mut config = Config { follow_links: true, ..Config::default() };
        config
            .apply_env(env(&[
                (FOLLOW_LINKS_ENV, "off"),
                (CLEANUP_STAGING_ENV, "YES"),
                (MAX_PATH_LEN_ENV, " 120 "),
                (STAGING_DIR_ENV, "/tmp/stage"),
            ]))
            .unwrap();

        assert!(!config.follow_links);
        assert!(config.cleanup_staging_on_failure);
        assert_eq!(config.max_path_len, 120);
        assert_eq!(config.scan_options().max_path_len, 120);
        assert_eq!(config.materialize_options().staging_dir, PathBuf::from("/tmp/stage"));
    }

    #[test]
    fn invalid_environment_values_name_the_key() {
        let mut config = Config::default();
        let err = config.apply_env(env(&[(MAX_PATH_LEN_ENV, "0")])).unwrap_err();
        assert!(err.to_string().contains(MAX_PATH_LEN_ENV));

        let err = config.apply_env(env(&[(FOLLOW_LINKS_ENV, "sometimes")])).unwrap_err();
        assert!(err.to_string().contains("true or false"));
    }
}
