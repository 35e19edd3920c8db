//! Directory tree synthesis from a flat archive listing.

use crate::path::{ancestors, base_name, normalize_entry_name};
use log::{debug, warn};
use std::collections::btree_map::{self, BTreeMap};
use std::ops::Bound;
use zipfs_format::RawEntry;

/// Kind of a filesystem object in the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    File,
    Directory,
}

/// One logical filesystem object of a mounted archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Normalized path, no leading or trailing separator.
    pub path: String,
    /// File or directory, fixed at synthesis.
    pub kind: EntryKind,
    /// Size in bytes; 0 for directories.
    pub size: u64,
    /// Modification time as seconds since the Unix epoch.
    pub modified: i64,
    /// Raw member name to open for reads. `None` for directories.
    pub source_name: Option<String>,
}

impl Entry {
    fn file(path: String, size: u64, modified: i64, source_name: String) -> Self {
        Self {
            path,
            kind: EntryKind::File,
            size,
            modified,
            source_name: Some(source_name),
        }
    }

    fn directory(path: String, modified: i64) -> Self {
        Self {
            path,
            kind: EntryKind::Directory,
            size: 0,
            modified,
            source_name: None,
        }
    }

    /// Final path segment.
    pub fn name(&self) -> &str {
        base_name(&self.path)
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// A raw member skipped during synthesis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedEntry {
    /// Raw member name as listed by the archive.
    pub name: String,
    /// Why the name does not denote a navigable object.
    pub reason: &'static str,
}

/// Closed, immutable mapping from normalized path to entry.
///
/// Every proper ancestor of every stored path is stored as a directory. The
/// root (`""`) is never stored and always resolves as a directory.
#[derive(Debug, Default)]
pub struct ArchiveIndex {
    entries: BTreeMap<String, Entry>,
    malformed: Vec<MalformedEntry>,
}

impl ArchiveIndex {
    /// Build the index from a raw archive listing.
    ///
    /// The result does not depend on the order of `raw_entries`. When the
    /// same path is listed more than once:
    /// - a directory always beats a file;
    /// - two directories keep the latest timestamp;
    /// - two files keep the one with the greater `(modified, size)`.
    pub fn synthesize<I>(raw_entries: I) -> Self
    where
        I: IntoIterator<Item = RawEntry>,
    {
        let mut index = Self::default();

        for raw in raw_entries {
            let (path, marked_dir) = match normalize_entry_name(&raw.name) {
                Ok(normalized) => normalized,
                Err(reason) => {
                    warn!("Skipping malformed archive entry {:?}: {}", raw.name, reason);
                    index.malformed.push(MalformedEntry {
                        name: raw.name,
                        reason,
                    });
                    continue;
                }
            };

            let candidate = if raw.is_dir || marked_dir {
                Entry::directory(path, raw.modified)
            } else {
                Entry::file(path, raw.size, raw.modified, raw.name)
            };
            index.insert(candidate);
        }

        debug!(
            "Synthesized index: {} files, {} directories, {} skipped",
            index.file_count(),
            index.directory_count(),
            index.malformed.len()
        );
        index
    }

    /// Insert an entry and every ancestor, all the way to the root.
    fn insert(&mut self, candidate: Entry) {
        let path = candidate.path.clone();
        self.merge(candidate);
        for ancestor in ancestors(&path) {
            self.merge(Entry::directory(ancestor.to_string(), 0));
        }
    }

    fn merge(&mut self, candidate: Entry) {
        let mut slot = match self.entries.entry(candidate.path.clone()) {
            btree_map::Entry::Vacant(slot) => {
                slot.insert(candidate);
                return;
            }
            btree_map::Entry::Occupied(slot) => slot,
        };

        let existing = slot.get_mut();
        match (existing.kind, candidate.kind) {
            (EntryKind::Directory, EntryKind::Directory) => {
                existing.modified = existing.modified.max(candidate.modified);
            }
            (EntryKind::File, EntryKind::File) => {
                if file_rank(&candidate) > file_rank(existing) {
                    debug!("Duplicate file '{}': keeping the newer member", candidate.path);
                    *existing = candidate;
                }
            }
            (EntryKind::Directory, EntryKind::File) => {
                warn!(
                    "'{}' is listed as both a file and a directory; keeping the directory",
                    candidate.path
                );
            }
            (EntryKind::File, EntryKind::Directory) => {
                warn!(
                    "'{}' is listed as both a file and a directory; keeping the directory",
                    candidate.path
                );
                *existing = candidate;
            }
        }
    }

    /// Look up a stored entry. The root is not stored; see [`Self::kind`].
    pub fn get(&self, path: &str) -> Option<&Entry> {
        self.entries.get(path)
    }

    /// Kind of a path, treating the root as a directory.
    pub fn kind(&self, path: &str) -> Option<EntryKind> {
        if path.is_empty() {
            return Some(EntryKind::Directory);
        }
        self.get(path).map(|entry| entry.kind)
    }

    /// Whether the path is the root or a stored directory.
    pub fn is_directory(&self, path: &str) -> bool {
        self.kind(path) == Some(EntryKind::Directory)
    }

    /// Immediate children of a directory path, in key order.
    ///
    /// Returns nothing for paths that are not directories.
    pub fn children<'a>(&'a self, dir: &str) -> impl Iterator<Item = &'a Entry> + 'a {
        let prefix = if dir.is_empty() {
            String::new()
        } else {
            format!("{}/", dir)
        };
        let depth = prefix.len();

        self.entries
            .range::<str, _>((Bound::Included(prefix.as_str()), Bound::Unbounded))
            .take_while(move |(key, _)| key.starts_with(&prefix))
            .filter(move |(key, _)| !key[depth..].contains('/'))
            .map(|(_, entry)| entry)
    }

    /// All stored entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.values()
    }

    /// Raw members skipped during synthesis.
    pub fn malformed(&self) -> &[MalformedEntry] {
        &self.malformed
    }

    /// Number of stored entries (the root is not counted).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn file_count(&self) -> usize {
        self.iter().filter(|e| !e.is_dir()).count()
    }

    pub fn directory_count(&self) -> usize {
        self.iter().filter(|e| e.is_dir()).count()
    }
}

fn file_rank(entry: &Entry) -> (i64, u64, Option<&str>) {
    (entry.modified, entry.size, entry.source_name.as_deref())
}
