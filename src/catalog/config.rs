//! JSON configuration of the catalog subcommand

use crate::io::error::{Result, WithPath, invalid_parameter};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Catalog settings read from a JSON file
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct CatalogConfig {
    /// Parcellation key file
    #[serde(default)]
    pub key: Option<PathBuf>,
}

impl CatalogConfig {
    /// Read a config file
    ///
    /// # Errors
    ///
    /// Returns an error if the file is unreadable or not valid JSON
    pub fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).with_path(path)?;
        serde_json::from_str(&text).with_path(path)
    }
}

/// Key file from the explicit flag, else from the config file
///
/// # Errors
///
/// Returns an error if the config cannot be read or neither source names a key
pub fn resolve_key(explicit: Option<&Path>, config: Option<&Path>) -> Result<PathBuf> {
    if let Some(key) = explicit {
        return Ok(key.to_path_buf());
    }
    let from_config = config
        .map(CatalogConfig::read)
        .transpose()?
        .and_then(|c| c.key);
    from_config.ok_or_else(|| invalid_parameter("key", &"<none>", &"pass --key or a --config with a key field"))
}
