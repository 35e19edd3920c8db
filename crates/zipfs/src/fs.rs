//! The filesystem capability contract hosts program against.

use crate::error::Result;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use zipfs_format::EntryStream;

/// File type bits for a directory.
pub const S_IFDIR: u32 = 0o040000;
/// File type bits for a regular file.
pub const S_IFREG: u32 = 0o100000;
/// Permission bits for directories: read and execute for everyone.
pub const DIR_PERMISSIONS: u32 = 0o555;
/// Permission bits for files: read for everyone.
pub const FILE_PERMISSIONS: u32 = 0o444;

/// Metadata returned by `stat` and `lstat`, shaped like POSIX `struct stat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    /// File type and permission bits.
    pub mode: u32,
    pub ino: u64,
    pub dev: u64,
    pub nlink: u64,
    pub uid: u32,
    pub gid: u32,
    /// Size in bytes; 0 for directories.
    pub size: u64,
    /// Access time, seconds since the Unix epoch.
    pub atime: i64,
    /// Modification time, seconds since the Unix epoch.
    pub mtime: i64,
    /// Status change time, seconds since the Unix epoch.
    pub ctime: i64,
}

impl FileStat {
    pub fn is_dir(&self) -> bool {
        self.mode & S_IFDIR == S_IFDIR
    }

    pub fn is_file(&self) -> bool {
        self.mode & S_IFREG == S_IFREG
    }

    /// Permission bits without the file type.
    pub fn permissions(&self) -> u32 {
        self.mode & 0o7777
    }

    /// Modification time as a `SystemTime`. Times before the epoch clamp to it.
    pub fn modified(&self) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(self.mtime.max(0) as u64)
    }
}

/// How a host wants to open a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    Read,
    Write,
    Append,
    ReadWrite,
}

impl OpenMode {
    /// Interpret a C `fopen`-style mode string ("rb", "wb", "ab", "r+b", ...).
    pub fn from_mode_str(mode: &str) -> Self {
        if mode.contains('+') {
            OpenMode::ReadWrite
        } else if mode.contains('w') || mode.contains('x') {
            OpenMode::Write
        } else if mode.contains('a') {
            OpenMode::Append
        } else {
            OpenMode::Read
        }
    }
}

/// Filesystem operations a file server issues on behalf of one client.
///
/// Paths are client paths: absolute ones start at `/`, relative ones are
/// taken from the session's current directory.
pub trait FileSystem {
    /// Resolve a client path into a normalized internal path.
    fn translate_client_path_to_internal(&self, path: &str) -> String;

    /// Whether the path is acceptable to this filesystem at all.
    fn is_path_valid(&self, path: &str) -> bool;

    /// Current directory as a client path (`/` for the root).
    fn current_directory(&self) -> String;

    fn change_directory(&mut self, path: &str) -> Result<()>;

    fn stat(&self, path: &str) -> Result<FileStat>;

    /// `stat` without following a final symbolic link.
    fn lstat(&self, path: &str) -> Result<FileStat>;

    fn open(&self, path: &str, mode: OpenMode) -> Result<EntryStream>;

    fn open_for_read(&self, path: &str) -> Result<EntryStream> {
        self.open(path, OpenMode::Read)
    }

    /// Names of the immediate children of a directory.
    fn list_directory(&self, path: &str) -> Result<Vec<String>>;

    fn get_size(&self, path: &str) -> Result<u64> {
        Ok(self.stat(path)?.size)
    }

    fn is_directory(&self, path: &str) -> bool {
        self.stat(path).map(|st| st.is_dir()).unwrap_or(false)
    }

    fn is_file(&self, path: &str) -> bool {
        self.stat(path).map(|st| st.is_file()).unwrap_or(false)
    }

    fn make_directory(&self, path: &str) -> Result<()>;

    fn remove_directory(&self, path: &str) -> Result<()>;

    fn remove_file(&self, path: &str) -> Result<()>;

    fn rename(&self, from: &str, to: &str) -> Result<()>;

    fn chmod(&self, path: &str, mode: u32) -> Result<()>;

    fn symlink(&self, target: &str, link: &str) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_mode_from_mode_str() {
        assert_eq!(OpenMode::from_mode_str("rb"), OpenMode::Read);
        assert_eq!(OpenMode::from_mode_str("r"), OpenMode::Read);
        assert_eq!(OpenMode::from_mode_str("wb"), OpenMode::Write);
        assert_eq!(OpenMode::from_mode_str("ab"), OpenMode::Append);
        assert_eq!(OpenMode::from_mode_str("r+b"), OpenMode::ReadWrite);
    }

    #[test]
    fn test_stat_mode_helpers() {
        let st = FileStat {
            mode: S_IFDIR | DIR_PERMISSIONS,
            ino: 0,
            dev: 1,
            nlink: 1,
            uid: 0,
            gid: 0,
            size: 0,
            atime: 0,
            mtime: 60,
            ctime: 0,
        };
        assert!(st.is_dir());
        assert!(!st.is_file());
        assert_eq!(st.permissions(), 0o555);
        assert_eq!(st.modified(), UNIX_EPOCH + Duration::from_secs(60));
    }
}
