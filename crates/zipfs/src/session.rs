use crate::config::MountConfig;
use crate::error::{Error, Result};
use crate::fs::{
    FileStat, FileSystem, OpenMode, DIR_PERMISSIONS, FILE_PERMISSIONS, S_IFDIR, S_IFREG,
};
use crate::index::{ArchiveIndex, Entry, EntryKind};
use crate::path;
use log::{debug, trace};
use std::sync::Arc;
use zipfs_format::{EntrySource, EntryStream};

/// One client's view of a mounted archive.
///
/// Holds the shared index and the session's current directory. Sessions are
/// created with [`crate::ArchiveMount::session`] and are independent of each
/// other.
pub struct VirtualFs {
    index: Arc<ArchiveIndex>,
    source: Arc<dyn EntrySource>,
    config: Arc<MountConfig>,
    cwd: String,
}

impl VirtualFs {
    pub(crate) fn new(
        index: Arc<ArchiveIndex>,
        source: Arc<dyn EntrySource>,
        config: Arc<MountConfig>,
    ) -> Self {
        Self {
            index,
            source,
            config,
            cwd: String::new(),
        }
    }

    /// List a directory together with the metadata of each child.
    pub fn list_directory_entries(&self, path: &str) -> Result<Vec<(String, FileStat)>> {
        let dir = self.directory(path)?;
        Ok(self
            .index
            .children(&dir)
            .map(|entry| {
                let stat = self.entry_stat(entry.kind, entry.size, entry.modified);
                (entry.name().to_string(), stat)
            })
            .collect())
    }

    /// Resolve a path that must name a directory.
    fn directory(&self, path: &str) -> Result<String> {
        let resolved = path::resolve(&self.cwd, path);
        match self.index.kind(&resolved) {
            Some(EntryKind::Directory) => Ok(resolved),
            Some(EntryKind::File) => Err(Error::NotADirectory(resolved)),
            None => Err(Error::NotFound(resolved)),
        }
    }

    /// Resolve a path that must name a stored file.
    fn file(&self, path: &str) -> Result<&Entry> {
        let resolved = path::resolve(&self.cwd, path);
        match self.index.get(&resolved) {
            Some(entry) if entry.kind == EntryKind::File => Ok(entry),
            Some(_) => Err(Error::IsADirectory(resolved)),
            None if resolved.is_empty() => Err(Error::IsADirectory(resolved)),
            None => Err(Error::NotFound(resolved)),
        }
    }

    fn entry_stat(&self, kind: EntryKind, size: u64, modified: i64) -> FileStat {
        let mode = match kind {
            EntryKind::Directory => S_IFDIR | DIR_PERMISSIONS,
            EntryKind::File => S_IFREG | FILE_PERMISSIONS,
        };
        FileStat {
            mode,
            ino: 0,
            dev: 1,
            nlink: 1,
            uid: self.config.uid,
            gid: self.config.gid,
            size,
            atime: modified,
            mtime: modified,
            ctime: modified,
        }
    }
}

impl FileSystem for VirtualFs {
    fn translate_client_path_to_internal(&self, path: &str) -> String {
        path::resolve(&self.cwd, path)
    }

    fn is_path_valid(&self, _path: &str) -> bool {
        true
    }

    fn current_directory(&self) -> String {
        path::to_client_path(&self.cwd)
    }

    fn change_directory(&mut self, path: &str) -> Result<()> {
        trace!("change_directory({:?}) from /{}", path, self.cwd);
        let resolved = path::resolve(&self.cwd, path);
        if !self.index.is_directory(&resolved) {
            return Err(Error::NotADirectory(resolved));
        }
        self.cwd = resolved;
        Ok(())
    }

    fn stat(&self, path: &str) -> Result<FileStat> {
        trace!("stat({:?})", path);
        let resolved = path::resolve(&self.cwd, path);
        if resolved.is_empty() {
            return Ok(self.entry_stat(EntryKind::Directory, 0, 0));
        }
        let entry = self
            .index
            .get(&resolved)
            .ok_or(Error::NotFound(resolved))?;
        Ok(self.entry_stat(entry.kind, entry.size, entry.modified))
    }

    fn lstat(&self, path: &str) -> Result<FileStat> {
        self.stat(path)
    }

    fn open(&self, path: &str, mode: OpenMode) -> Result<EntryStream> {
        trace!("open({:?}, {:?})", path, mode);
        if mode != OpenMode::Read {
            return Err(Error::Unsupported("open for writing"));
        }

        let entry = self.file(path)?;
        let name = entry.source_name.as_deref().unwrap_or(&entry.path);
        debug!("Opening archive member '{}' for /{}", name, entry.path);
        Ok(self.source.open_entry(name)?)
    }

    fn list_directory(&self, path: &str) -> Result<Vec<String>> {
        trace!("list_directory({:?})", path);
        let dir = self.directory(path)?;
        Ok(self
            .index
            .children(&dir)
            .map(|entry| entry.name().to_string())
            .collect())
    }

    fn make_directory(&self, _path: &str) -> Result<()> {
        Err(Error::Unsupported("make_directory"))
    }

    fn remove_directory(&self, _path: &str) -> Result<()> {
        Err(Error::Unsupported("remove_directory"))
    }

    fn remove_file(&self, _path: &str) -> Result<()> {
        Err(Error::Unsupported("remove_file"))
    }

    fn rename(&self, _from: &str, _to: &str) -> Result<()> {
        Err(Error::Unsupported("rename"))
    }

    fn chmod(&self, _path: &str, _mode: u32) -> Result<()> {
        Err(Error::Unsupported("chmod"))
    }

    fn symlink(&self, _target: &str, _link: &str) -> Result<()> {
        Err(Error::Unsupported("symlink"))
    }
}
