//! Runtime configuration, loaded from TOML.
//!
//! ```toml
//! [registry]
//! unregister_policy = "owner-checked" # or "unconditional"
//! ```

use serde::Deserialize;
use std::{fs, io, path::Path};
use thiserror::Error;

/// What the deactivation hook does when the registry entry for its identifier is owned by a
/// different object (two copies of the same scene content loaded at once).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnregisterPolicy {
    /// Only remove the entry if the deactivating object is the registered owner. A colliding
    /// owner that registered later stays resolvable.
    #[default]
    OwnerChecked,
    /// Remove whatever is registered under the identifier, even if another object owns it.
    Unconditional,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
    pub unregister_policy: UnregisterPolicy,
}

/// Top level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TetherConfig {
    pub registry: RegistryConfig,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("couldn't read the configuration file")]
    Io(#[from] io::Error),
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

impl TetherConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_str(&fs::read_to_string(path)?)
    }
}
