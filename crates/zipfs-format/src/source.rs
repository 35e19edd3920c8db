use crate::error::Result;
use std::io::Read;

/// One member as the archive lists it, before any path normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    /// Member name exactly as stored (e.g., "docs/", "docs/readme.txt").
    pub name: String,
    /// Uncompressed size in bytes.
    pub size: u64,
    /// Modification time as seconds since the Unix epoch, 0 if unknown.
    pub modified: i64,
    /// Whether the archive marks this member as a directory.
    pub is_dir: bool,
}

impl RawEntry {
    /// A file member.
    pub fn file(name: impl Into<String>, size: u64, modified: i64) -> Self {
        Self {
            name: name.into(),
            size,
            modified,
            is_dir: false,
        }
    }

    /// An explicit directory marker.
    pub fn directory(name: impl Into<String>, modified: i64) -> Self {
        Self {
            name: name.into(),
            size: 0,
            modified,
            is_dir: true,
        }
    }
}

/// Sequential, forward-only reader over one member's uncompressed bytes.
pub type EntryStream = Box<dyn Read + Send + Sync>;

/// A read-only source of archive members.
///
/// `list_entries` is called once when a mount is built. `open_entry` is
/// called for every file access and must hand out a reader that shares no
/// cursor with any other reader it has returned.
pub trait EntrySource: Send + Sync {
    /// List every member in archive order.
    fn list_entries(&self) -> Result<Vec<RawEntry>>;

    /// Open a member for streamed reading by its raw name.
    fn open_entry(&self, name: &str) -> Result<EntryStream>;
}
