use crate::error::{Error, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Configuration for mounting an archive.
///
/// Archives carry no ownership metadata, so every stat result reports the
/// same owner. Both fields default to the ids of the current process.
///
/// ```toml
/// uid = 1000
/// gid = 1000
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MountConfig {
    /// Owner user id reported for every entry.
    pub uid: u32,
    /// Owner group id reported for every entry.
    pub gid: u32,
}

impl Default for MountConfig {
    fn default() -> Self {
        let (uid, gid) = process_ids();
        Self { uid, gid }
    }
}

impl MountConfig {
    /// Parse a configuration from TOML text. Missing keys take defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load a configuration from a TOML file.
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }
}

#[cfg(unix)]
fn process_ids() -> (u32, u32) {
    unsafe { (libc::getuid(), libc::getgid()) }
}

#[cfg(not(unix))]
fn process_ids() -> (u32, u32) {
    (0, 0)
}
