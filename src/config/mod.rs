// src/config/mod.rs

//! Manifest loading and validation
//!
//! The manifest is a TOML file with two top-level tables:
//!
//! ```toml
//! [settings]
//! install_command = "sudo pacman -S"
//!
//! [bundles.base]
//! members = ["base", "linux", "g#base-devel", "#desktop"]
//! include = "true"
//!
//! [bundles.desktop]
//! members = ["plasma-meta"]
//! ```
//!
//! Bundles keep the order in which they appear in the file.

use crate::error::{Error, Result};
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::debug;

/// Application name, used for the config directory
pub const APP_NAME: &str = "pacbundle";

/// Environment variable overriding the config file location
pub const CONFIG_ENV: &str = "PACBUNDLE_CONFIG";

/// Install command used when the manifest does not set one
pub const DEFAULT_INSTALL_COMMAND: &str = "sudo pacman -S";

/// Default pacman database root for the `local` backend
pub const DEFAULT_DB_PATH: &str = "/var/lib/pacman";

static MEMBER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(g#|#)?[\w@.+-]+$").expect("member pattern is a valid regex")
});

/// The whole manifest
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub bundles: IndexMap<String, Bundle>,
    #[serde(default)]
    pub settings: Settings,
}

/// A named list of packages, groups and child bundles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bundle {
    pub members: Vec<String>,
    /// Shell condition; the bundle is directly included when it exits 0
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<String>,
}

/// How pacbundle talks to pacman
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Command prefix used to install packages; package names are appended
    pub install_command: String,
    /// Where installed-package information comes from
    pub backend: Backend,
    /// pacman database root, read by the `local` backend
    pub db_path: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            install_command: DEFAULT_INSTALL_COMMAND.to_string(),
            backend: Backend::default(),
            db_path: PathBuf::from(DEFAULT_DB_PATH),
        }
    }
}

impl Settings {
    /// Split the install command into argv on single spaces
    pub fn install_argv(&self) -> Vec<String> {
        self.install_command
            .split(' ')
            .filter(|part| !part.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Source of installed-package information
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Query the `pacman` binary
    #[default]
    Pacman,
    /// Read pacman's local database directly
    Local,
}

impl Config {
    /// Parse and validate a manifest from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load the manifest at `path`
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading config from: {}", path.display());

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(Error::ConfigNotFound(path.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        };

        let config = Self::from_toml(&content)?;
        debug!("Loaded {} bundles", config.bundles.len());
        Ok(config)
    }

    /// Check every bundle member against the identifier grammar
    pub fn validate(&self) -> Result<()> {
        for (name, bundle) in &self.bundles {
            for member in &bundle.members {
                if !is_valid_member(member) {
                    return Err(Error::InvalidConfig(format!(
                        "bundles.{}.members: Invalid identifier: {}",
                        name, member
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Whether `member` is a well-formed package, `g#group` or `#bundle` reference
pub fn is_valid_member(member: &str) -> bool {
    MEMBER_PATTERN.is_match(member)
}

/// Resolve the config file location
///
/// `$PACBUNDLE_CONFIG` wins; otherwise `<config dir>/pacbundle/config.toml`,
/// where the config dir honours `$XDG_CONFIG_HOME`.
pub fn default_config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|dir| dir.join(APP_NAME).join("config.toml"))
}

/// Create an empty config file (and its directory) if none exists
///
/// Returns `true` when the file was created.
pub fn ensure_config_file(path: &Path) -> Result<bool> {
    if path.is_file() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)?;
    Ok(true)
}
