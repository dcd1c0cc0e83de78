//! Runtime configuration for the CLI and the HTTP host.
//!
//! Values come from, in increasing precedence: built-in defaults, an
//! optional YAML file, then `CROSSWALK_*` environment variables. Per-call
//! options (query strings, `--opt`) override everything here.
//!
//! ```yaml
//! server:
//!   host: 0.0.0.0
//!   port: 8080
//!   log_level: info
//! defaults:
//!   geoprop: coordinates
//!   rights_field: aggregatedCHO/rights
//!   copy_rights_to: [isShownAt, aggregatedCHO/hasView]
//!   download: true
//! ```

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::enrich::copy_rights::{default_copy_to, DEFAULT_RIGHTS_FIELD};

/// Environment variable naming a YAML config file.
pub const CONFIG_ENV: &str = "CROSSWALK_CONFIG";

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse { path: PathBuf, source: serde_yaml::Error },
    InvalidEnv { var: String, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "Failed to read config file {}: {}", path.display(), source)
            }
            ConfigError::Parse { path, source } => {
                write!(f, "Failed to parse config file {}: {}", path.display(), source)
            }
            ConfigError::InvalidEnv { var, value } => {
                write!(f, "Invalid value for {}: {:?}", var, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
            ConfigError::InvalidEnv { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CrosswalkConfig {
    pub server: ServerConfig,
    pub defaults: ServiceDefaults,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Default tracing filter when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            log_level: "info".to_string(),
        }
    }
}

/// Option defaults applied to every service call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceDefaults {
    /// Field holding coordinates parallel to `coverage`.
    pub geoprop: Option<String>,
    pub rights_field: String,
    pub copy_rights_to: Vec<String>,
    pub download: bool,
}

impl Default for ServiceDefaults {
    fn default() -> Self {
        Self {
            geoprop: None,
            rights_field: DEFAULT_RIGHTS_FIELD.to_string(),
            copy_rights_to: default_copy_to(),
            download: true,
        }
    }
}

impl ServiceDefaults {
    /// The defaults as a flat option map, ready to be overlaid by per-call
    /// options.
    pub fn as_params(&self) -> HashMap<String, String> {
        let mut params = HashMap::new();
        if let Some(geoprop) = &self.geoprop {
            params.insert("geoprop".to_string(), geoprop.clone());
        }
        params.insert("rights_field".to_string(), self.rights_field.clone());
        params.insert("copy_to".to_string(), self.copy_rights_to.join(","));
        params.insert("download".to_string(), self.download.to_string());
        params
    }
}

impl CrosswalkConfig {
    /// Load configuration from a YAML file. Missing sections take their
    /// defaults.
    ///
    /// # Errors
    /// Returns error if the file can't be read or isn't valid YAML for
    /// this shape
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        // An empty file is a valid, all-defaults config
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from `path` if given, else from `CROSSWALK_CONFIG` if set, else
    /// defaults; then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let from_env = std::env::var(CONFIG_ENV).ok().map(PathBuf::from);
        let mut config = match path.map(Path::to_path_buf).or(from_env) {
            Some(path) => {
                tracing::debug!("Loading config from {}", path.display());
                Self::load_from_file(path)?
            }
            None => Self::default(),
        };
        config.apply_env(|var| std::env::var(var).ok())?;
        Ok(config)
    }

    /// Apply `CROSSWALK_HOST`, `CROSSWALK_PORT` and `CROSSWALK_GEOPROP`.
    ///
    /// # Arguments
    /// * `lookup` - Variable lookup, `std::env::var` outside of tests
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("CROSSWALK_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("CROSSWALK_PORT") {
            self.server.port = port.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                var: "CROSSWALK_PORT".to_string(),
                value: port.clone(),
            })?;
        }
        if let Some(geoprop) = lookup("CROSSWALK_GEOPROP") {
            self.defaults.geoprop = Some(geoprop).filter(|g| !g.is_empty());
        }
        Ok(())
    }
}
