//! Device configuration via `catena.toml`
//!
//! Holds the settings a device is constructed with. A default file can be
//! written next to the device model; edit it and restart to change them.

use catena_core::{Error, Result, DEFAULT_MAX_LENGTH, DEFAULT_SCOPE, DEFAULT_TOTAL_LENGTH};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Config file name placed next to the device model.
pub const CONFIG_FILE_NAME: &str = "catena.toml";

/// How much of the device a client receives when it asks for the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailLevel {
    /// Every readable param
    #[default]
    Full,
    /// Only params in the minimal set
    Minimal,
    /// The minimal set plus subscribed params
    Subscriptions,
    /// Only commands
    Commands,
    /// Nothing beyond the device header
    None,
}

impl DetailLevel {
    /// Name used in config files
    pub fn as_str(&self) -> &'static str {
        match self {
            DetailLevel::Full => "full",
            DetailLevel::Minimal => "minimal",
            DetailLevel::Subscriptions => "subscriptions",
            DetailLevel::Commands => "commands",
            DetailLevel::None => "none",
        }
    }
}

impl fmt::Display for DetailLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DetailLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "full" => Ok(DetailLevel::Full),
            "minimal" => Ok(DetailLevel::Minimal),
            "subscriptions" => Ok(DetailLevel::Subscriptions),
            "commands" => Ok(DetailLevel::Commands),
            "none" => Ok(DetailLevel::None),
            other => Err(Error::invalid_argument(format!(
                "Invalid detail level '{}'. Expected one of \"full\", \"minimal\", \
                 \"subscriptions\", \"commands\" or \"none\".",
                other
            ))),
        }
    }
}

/// Device configuration loaded from `catena.toml`.
///
/// # Example
///
/// ```toml
/// slot = 1
/// detail_level = "minimal"
/// default_scope = "st2138:op"
/// multi_set_enabled = false
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Slot number the device answers on.
    #[serde(default)]
    pub slot: u32,
    /// Detail level: `"full"`, `"minimal"`, `"subscriptions"`, `"commands"` or `"none"`.
    #[serde(default = "default_detail_level_str")]
    pub detail_level: String,
    /// Scope of params that declare none.
    #[serde(default = "default_scope_str")]
    pub default_scope: String,
    /// Accept more than one value per set request.
    #[serde(default = "default_true")]
    pub multi_set_enabled: bool,
    /// Accept subscriptions.
    #[serde(default = "default_true")]
    pub subscriptions: bool,
    /// Element count / string length limit of params that declare none.
    #[serde(default = "default_max_length")]
    pub default_max_length: u32,
    /// Cumulative string length limit of params that declare none.
    #[serde(default = "default_total_length")]
    pub default_total_length: u32,
}

fn default_detail_level_str() -> String {
    DetailLevel::Full.as_str().to_string()
}

fn default_scope_str() -> String {
    DEFAULT_SCOPE.to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_length() -> u32 {
    DEFAULT_MAX_LENGTH
}

fn default_total_length() -> u32 {
    DEFAULT_TOTAL_LENGTH
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            slot: 0,
            detail_level: default_detail_level_str(),
            default_scope: default_scope_str(),
            multi_set_enabled: true,
            subscriptions: true,
            default_max_length: DEFAULT_MAX_LENGTH,
            default_total_length: DEFAULT_TOTAL_LENGTH,
        }
    }
}

impl DeviceConfig {
    /// Parse the detail level string.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for an unknown level.
    pub fn detail_level(&self) -> Result<DetailLevel> {
        self.detail_level.parse()
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Catena device configuration
#
# Slot number the device answers on
slot = 0

# What a client receives when it asks for the whole device:
#   "full"          = every readable param
#   "minimal"       = params in the minimal set
#   "subscriptions" = the minimal set plus subscribed params
#   "commands"      = commands only
#   "none"          = the device header only
detail_level = "full"

# Scope applied to params that declare none
default_scope = "st2138:mon"

# Accept set requests carrying more than one value
multi_set_enabled = true

# Accept subscriptions
subscriptions = true

# Length limits applied to params that declare none
default_max_length = 1024
default_total_length = 1024
"#
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the file cannot be read or parsed, or
    /// names an unknown detail level.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::invalid_argument(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: DeviceConfig = toml::from_str(&content).map_err(|e| {
            Error::invalid_argument(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.detail_level()?;
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                Error::internal(format!(
                    "Failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::internal(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            Error::internal(format!(
                "Failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }
}
