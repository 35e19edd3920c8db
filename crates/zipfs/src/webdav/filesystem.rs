//! WebDAV filesystem implementation for mounted archives.
//!
//! This module implements the `dav_server::fs::DavFileSystem` trait by
//! running every request through a fresh [`VirtualFs`] session with an
//! absolute path.

use crate::fs::{FileStat, FileSystem};
use crate::session::VirtualFs;
use crate::vfs::ArchiveMount;
use crate::Error as VfsError;
use dav_server::davpath::DavPath;
use dav_server::fs::{
    DavDirEntry, DavFile, DavFileSystem, DavMetaData, FsError, FsFuture, FsStream, OpenOptions,
    ReadDirMeta,
};
use futures::stream;
use log::{debug, error, trace};
use std::fmt;
use std::io::{self, Read, SeekFrom};
use std::sync::Arc;
use std::time::SystemTime;
use zipfs_format::EntryStream;

/// WebDAV filesystem adapter for a mounted archive.
#[derive(Clone)]
pub struct ArchiveDavFs {
    inner: Arc<ArchiveDavFsInner>,
}

struct ArchiveDavFsInner {
    mount: ArchiveMount,
    /// Reported for entries whose archive timestamp is 0.
    started: SystemTime,
}

impl ArchiveDavFs {
    /// Create a new WebDAV filesystem from an archive mount.
    pub fn new(mount: ArchiveMount) -> Self {
        Self {
            inner: Arc::new(ArchiveDavFsInner {
                mount,
                started: SystemTime::now(),
            }),
        }
    }

    fn session(&self) -> VirtualFs {
        self.inner.mount.session()
    }

    fn meta(&self, stat: FileStat) -> ArchiveDavMetaData {
        ArchiveDavMetaData::new(stat, self.inner.started)
    }
}

/// Client path for a DAV request path.
fn client_path(path: &DavPath) -> String {
    let rel = path.as_rel_ospath().to_string_lossy();
    format!("/{}", rel.trim_start_matches('/'))
}

fn dav_error(err: VfsError) -> FsError {
    match err {
        VfsError::NotFound(_) => FsError::NotFound,
        VfsError::NotADirectory(_) | VfsError::IsADirectory(_) => FsError::Forbidden,
        VfsError::Unsupported(_) => FsError::Forbidden,
        VfsError::Source(e) => {
            error!("archive read failed: {}", e);
            FsError::GeneralFailure
        }
        VfsError::Config(_) => FsError::GeneralFailure,
    }
}

impl DavFileSystem for ArchiveDavFs {
    fn open<'a>(&'a self, path: &'a DavPath, options: OpenOptions) -> FsFuture<'a, Box<dyn DavFile>> {
        trace!("open({:?}, {:?})", path, options);

        let result = (|| {
            // Read-only filesystem
            if options.write
                || options.append
                || options.create
                || options.create_new
                || options.truncate
            {
                return Err(FsError::Forbidden);
            }

            let path = client_path(path);
            let fs = self.session();
            let stat = fs.stat(&path).map_err(dav_error)?;
            let stream = fs.open_for_read(&path).map_err(dav_error)?;

            let dav_file = ArchiveDavFile {
                fs,
                path,
                meta: self.meta(stat),
                stream,
                position: 0,
            };
            Ok(Box::new(dav_file) as Box<dyn DavFile>)
        })();

        Box::pin(async move { result })
    }

    fn read_dir<'a>(
        &'a self,
        path: &'a DavPath,
        meta: ReadDirMeta,
    ) -> FsFuture<'a, FsStream<Box<dyn DavDirEntry>>> {
        trace!("read_dir({:?}, {:?})", path, meta);

        let result = (|| {
            let listing = self
                .session()
                .list_directory_entries(&client_path(path))
                .map_err(dav_error)?;

            let entries: Vec<Box<dyn DavDirEntry>> = listing
                .into_iter()
                .map(|(name, stat)| {
                    Box::new(ArchiveDavDirEntry {
                        name,
                        meta: self.meta(stat),
                    }) as Box<dyn DavDirEntry>
                })
                .collect();

            debug!("read_dir: returning {} entries", entries.len());

            let stream = stream::iter(entries.into_iter().map(Ok));
            Ok(Box::pin(stream) as FsStream<Box<dyn DavDirEntry>>)
        })();

        Box::pin(async move { result })
    }

    fn metadata<'a>(&'a self, path: &'a DavPath) -> FsFuture<'a, Box<dyn DavMetaData>> {
        trace!("metadata({:?})", path);

        let result = self
            .session()
            .stat(&client_path(path))
            .map(|stat| Box::new(self.meta(stat)) as Box<dyn DavMetaData>)
            .map_err(dav_error);

        Box::pin(async move { result })
    }
}

/// WebDAV file streaming one archive member.
///
/// Reads are forward-only on the underlying stream; a backwards seek
/// reopens the member and skips ahead.
struct ArchiveDavFile {
    fs: VirtualFs,
    path: String,
    meta: ArchiveDavMetaData,
    stream: EntryStream,
    position: u64,
}

impl fmt::Debug for ArchiveDavFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArchiveDavFile")
            .field("path", &self.path)
            .field("position", &self.position)
            .finish()
    }
}

impl ArchiveDavFile {
    fn read_chunk(&mut self, count: usize) -> Result<bytes::Bytes, FsError> {
        let remaining = self.meta.len.saturating_sub(self.position);
        let to_read = std::cmp::min(count as u64, remaining) as usize;

        let mut buffer = vec![0u8; to_read];
        let mut filled = 0;
        while filled < to_read {
            match self.stream.read(&mut buffer[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    error!("read: I/O error reading {}: {}", self.path, e);
                    return Err(FsError::GeneralFailure);
                }
            }
        }

        buffer.truncate(filled);
        self.position += filled as u64;
        Ok(bytes::Bytes::from(buffer))
    }

    fn seek_to(&mut self, target: u64) -> Result<u64, FsError> {
        if target < self.position {
            trace!("seek: reopening {} to rewind to {}", self.path, target);
            self.stream = self.fs.open_for_read(&self.path).map_err(dav_error)?;
            self.position = 0;
        }

        let skip = target - self.position;
        if skip > 0 {
            io::copy(&mut (&mut self.stream).take(skip), &mut io::sink()).map_err(|e| {
                error!("seek: I/O error skipping in {}: {}", self.path, e);
                FsError::GeneralFailure
            })?;
        }

        self.position = target;
        Ok(target)
    }
}

impl DavFile for ArchiveDavFile {
    fn metadata(&mut self) -> FsFuture<'_, Box<dyn DavMetaData>> {
        let meta = self.meta.clone();
        Box::pin(async move { Ok(Box::new(meta) as Box<dyn DavMetaData>) })
    }

    fn read_bytes(&mut self, count: usize) -> FsFuture<'_, bytes::Bytes> {
        let result = self.read_chunk(count);
        Box::pin(async move { result })
    }

    fn seek(&mut self, pos: SeekFrom) -> FsFuture<'_, u64> {
        let new_pos = match pos {
            SeekFrom::Start(n) => n as i64,
            SeekFrom::End(n) => self.meta.len as i64 + n,
            SeekFrom::Current(n) => self.position as i64 + n,
        };

        let result = if new_pos < 0 {
            Err(FsError::GeneralFailure)
        } else {
            self.seek_to(new_pos as u64)
        };
        Box::pin(async move { result })
    }

    fn write_buf(&mut self, _buf: Box<dyn bytes::Buf + Send>) -> FsFuture<'_, ()> {
        // Read-only filesystem
        Box::pin(async { Err(FsError::Forbidden) })
    }

    fn write_bytes(&mut self, _buf: bytes::Bytes) -> FsFuture<'_, ()> {
        // Read-only filesystem
        Box::pin(async { Err(FsError::Forbidden) })
    }

    fn flush(&mut self) -> FsFuture<'_, ()> {
        Box::pin(async { Ok(()) })
    }
}

/// WebDAV directory entry.
struct ArchiveDavDirEntry {
    name: String,
    meta: ArchiveDavMetaData,
}

impl DavDirEntry for ArchiveDavDirEntry {
    fn name(&self) -> Vec<u8> {
        self.name.as_bytes().to_vec()
    }

    fn metadata(&self) -> FsFuture<'_, Box<dyn DavMetaData>> {
        let meta = self.meta.clone();
        Box::pin(async move { Ok(Box::new(meta) as Box<dyn DavMetaData>) })
    }
}

/// WebDAV metadata for files and directories.
#[derive(Clone, Debug)]
struct ArchiveDavMetaData {
    is_dir: bool,
    len: u64,
    modified: SystemTime,
}

impl ArchiveDavMetaData {
    fn new(stat: FileStat, fallback: SystemTime) -> Self {
        Self {
            is_dir: stat.is_dir(),
            len: stat.size,
            modified: if stat.mtime == 0 {
                fallback
            } else {
                stat.modified()
            },
        }
    }
}

impl DavMetaData for ArchiveDavMetaData {
    fn len(&self) -> u64 {
        self.len
    }

    fn modified(&self) -> Result<SystemTime, FsError> {
        Ok(self.modified)
    }

    fn is_dir(&self) -> bool {
        self.is_dir
    }

    fn created(&self) -> Result<SystemTime, FsError> {
        Ok(self.modified)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MountConfig;
    use futures::StreamExt;
    use std::path::Path;
    use tempfile::TempDir;
    use zipfs_format::ArchiveBuilder;

    fn create_test_mount(temp_dir: &Path) -> ArchiveMount {
        let path = ArchiveBuilder::new()
            .with_file("docs/readme.txt", b"0123456789".to_vec())
            .with_directory("empty/")
            .write_to(temp_dir.join("dav.zip"))
            .unwrap();
        ArchiveMount::open(path, MountConfig::default()).unwrap()
    }

    fn dav_path(path: &str) -> DavPath {
        DavPath::new(path).unwrap()
    }

    #[tokio::test]
    async fn test_metadata_maps_stat() {
        let temp_dir = TempDir::new().unwrap();
        let fs = ArchiveDavFs::new(create_test_mount(temp_dir.path()));

        let root = fs.metadata(&dav_path("/")).await.unwrap();
        assert!(root.is_dir());

        let file = fs.metadata(&dav_path("/docs/readme.txt")).await.unwrap();
        assert!(!file.is_dir());
        assert_eq!(file.len(), 10);

        assert!(matches!(
            fs.metadata(&dav_path("/missing")).await,
            Err(FsError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_read_dir_lists_children() {
        let temp_dir = TempDir::new().unwrap();
        let fs = ArchiveDavFs::new(create_test_mount(temp_dir.path()));

        let mut stream = fs
            .read_dir(&dav_path("/"), ReadDirMeta::Data)
            .await
            .unwrap();
        let mut names = Vec::new();
        while let Some(entry) = stream.next().await {
            names.push(String::from_utf8(entry.unwrap().name()).unwrap());
        }
        assert_eq!(names, vec!["docs", "empty"]);
    }

    #[tokio::test]
    async fn test_open_reads_and_seeks() {
        let temp_dir = TempDir::new().unwrap();
        let fs = ArchiveDavFs::new(create_test_mount(temp_dir.path()));

        let mut file = fs
            .open(&dav_path("/docs/readme.txt"), OpenOptions { read: true, ..Default::default() })
            .await
            .unwrap();

        assert_eq!(&file.read_bytes(4).await.unwrap()[..], b"0123");
        assert_eq!(file.seek(SeekFrom::Current(2)).await.unwrap(), 6);
        assert_eq!(&file.read_bytes(100).await.unwrap()[..], b"6789");
        assert_eq!(file.seek(SeekFrom::Start(1)).await.unwrap(), 1);
        assert_eq!(&file.read_bytes(3).await.unwrap()[..], b"123");
        assert!(file.read_bytes(0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_open_rejects_writes_and_directories() {
        let temp_dir = TempDir::new().unwrap();
        let fs = ArchiveDavFs::new(create_test_mount(temp_dir.path()));

        assert!(matches!(
            fs.open(&dav_path("/docs/readme.txt"), OpenOptions { write: true, ..Default::default() }).await,
            Err(FsError::Forbidden)
        ));
        assert!(matches!(
            fs.open(&dav_path("/docs"), OpenOptions { read: true, ..Default::default() }).await,
            Err(FsError::Forbidden)
        ));
    }
}
