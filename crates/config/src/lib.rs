//! Layered configuration for packdrop.
//!
//! Sources, lowest precedence first:
//!
//! 1. built-in defaults;
//! 2. the first of `packdrop.toml`, `packdrop.yaml`, `packdrop.json` found in
//!    the platform configuration directory;
//! 3. a file passed explicitly (its format picked by extension);
//! 4. `PACKDROP_`-prefixed environment variables, with `__` separating nested
//!    keys (`PACKDROP_REGISTRY__DIRECTORY`, `PACKDROP_LOG__LEVEL`).

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

const APPLICATION: &str = "packdrop";
const ENV_PREFIX: &str = "PACKDROP_";
const CONFIG_STEM: &str = "packdrop";
const CONFIG_EXTENSIONS: [&str; 3] = ["toml", "yaml", "json"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub registry: RegistryConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Flat directory holding every `<slug>.json` sidecar and `<slug>.zip`
    /// artifact. Must be absolute.
    pub directory: PathBuf,
}
impl Default for RegistryConfig {
    fn default() -> Self {
        // Left empty (and so rejected by validation) when the platform has no
        // home directory to derive a data directory from.
        let directory = project_dirs().map(|dirs| dirs.data_dir().join("packs")).unwrap_or_default();
        Self { directory }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: LogLevel,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}
impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}
impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", APPLICATION)
}

/// The provider chain rooted at the platform configuration directory.
pub fn figment(explicit: Option<&Path>) -> Result<Figment> {
    let dirs = project_dirs();
    figment_with(dirs.as_ref().map(ProjectDirs::config_dir), explicit)
}

/// The provider chain with the configuration directory supplied by the
/// caller.
///
/// Raises [`ErrorKind::NotFound`] if `explicit` does not exist and
/// [`ErrorKind::Invalid`] if its extension is not a supported format.
pub fn figment_with(config_dir: Option<&Path>, explicit: Option<&Path>) -> Result<Figment> {
    let mut figment = Figment::from(Serialized::defaults(Config::default()));
    if let Some(found) = config_dir.and_then(find_config_file) {
        tracing::debug!(path = %found.display(), "Using configuration file");
        figment = merge_file(figment, &found)?;
    }
    if let Some(path) = explicit {
        if !path.is_file() {
            exn::bail!(ErrorKind::NotFound(path.to_path_buf()));
        }
        tracing::debug!(path = %path.display(), "Using explicit configuration file");
        figment = merge_file(figment, path)?;
    }
    Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
}

fn find_config_file(dir: &Path) -> Option<PathBuf> {
    CONFIG_EXTENSIONS
        .iter()
        .map(|extension| dir.join(CONFIG_STEM).with_extension(extension))
        .find(|candidate| candidate.is_file())
}

fn merge_file(figment: Figment, path: &Path) -> Result<Figment> {
    let merged = match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => figment.merge(Toml::file(path)),
        Some("yaml" | "yml") => figment.merge(Yaml::file(path)),
        Some("json") => figment.merge(Json::file(path)),
        _ => exn::bail!(ErrorKind::Invalid("configuration file must be .toml, .yaml or .json")),
    };
    Ok(merged)
}

impl Config {
    /// Loads and validates the configuration from every source.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        Self::from_figment(&figment(explicit)?)
    }

    pub fn from_figment(figment: &Figment) -> Result<Self> {
        let config: Self = figment.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.registry.directory.as_os_str().is_empty() {
            exn::bail!(ErrorKind::Invalid("registry.directory is not set"));
        }
        if !self.registry.directory.is_absolute() {
            exn::bail!(ErrorKind::Invalid("registry.directory must be absolute"));
        }
        Ok(())
    }
}
