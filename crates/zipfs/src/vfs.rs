use crate::config::MountConfig;
use crate::error::Result;
use crate::index::ArchiveIndex;
use crate::session::VirtualFs;
use log::debug;
use std::path::Path;
use std::sync::Arc;
use zipfs_format::{EntrySource, ZipArchiveSource};

/// An archive mounted as a read-only directory tree.
///
/// The index is synthesized once, when the mount is created, and shared by
/// every session opened from it. Cloning a mount is cheap.
#[derive(Clone)]
pub struct ArchiveMount {
    index: Arc<ArchiveIndex>,
    source: Arc<dyn EntrySource>,
    config: Arc<MountConfig>,
}

impl ArchiveMount {
    /// Mount an entry source, listing its members exactly once.
    pub fn new<S>(source: S, config: MountConfig) -> Result<Self>
    where
        S: EntrySource + 'static,
    {
        Self::from_shared(Arc::new(source), config)
    }

    /// Mount an entry source that is already shared.
    pub fn from_shared(source: Arc<dyn EntrySource>, config: MountConfig) -> Result<Self> {
        let raw_entries = source.list_entries()?;
        debug!("Mounting {} raw archive members", raw_entries.len());
        let index = ArchiveIndex::synthesize(raw_entries);

        Ok(Self {
            index: Arc::new(index),
            source,
            config: Arc::new(config),
        })
    }

    /// Open a zip archive from disk and mount it.
    pub fn open<P: AsRef<Path>>(archive_path: P, config: MountConfig) -> Result<Self> {
        let source = ZipArchiveSource::open(archive_path)?;
        Self::new(source, config)
    }

    /// Start a new client session, positioned at the root.
    pub fn session(&self) -> VirtualFs {
        VirtualFs::new(
            Arc::clone(&self.index),
            Arc::clone(&self.source),
            Arc::clone(&self.config),
        )
    }

    /// Get the synthesized index.
    pub fn index(&self) -> &ArchiveIndex {
        &self.index
    }

    /// Get the mount configuration.
    pub fn config(&self) -> &MountConfig {
        &self.config
    }
}
