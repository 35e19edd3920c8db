use crate::error::{Error, Result};
use crate::source::{EntrySource, EntryStream, RawEntry};
use chrono::NaiveDate;
use flate2::read::DeflateDecoder;
use log::{debug, trace};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use zip::CompressionMethod;

/// Represents a member within a zip archive.
#[derive(Debug, Clone)]
pub struct ZipEntry {
    /// Raw member name (e.g., "docs/", "docs/readme.txt").
    pub name: String,
    /// Position of the member in the central directory.
    pub index: usize,
    /// Byte offset of the member data within the archive.
    pub offset: u64,
    /// Uncompressed size of the member.
    pub size: u64,
    /// Size of the member data as stored.
    pub compressed_size: u64,
    /// Compression method used for this member.
    pub compression: CompressionMethod,
    /// Modification time as seconds since the Unix epoch, 0 if unknown.
    pub modified: i64,
    /// Whether the member data is encrypted.
    pub encrypted: bool,
}

impl ZipEntry {
    /// Whether the member is a directory marker.
    pub fn is_dir(&self) -> bool {
        self.name.ends_with('/')
    }

    fn raw(&self) -> RawEntry {
        RawEntry {
            name: self.name.clone(),
            size: if self.is_dir() { 0 } else { self.size },
            modified: self.modified,
            is_dir: self.is_dir(),
        }
    }
}

/// A zip archive opened read-only as an [`EntrySource`].
///
/// The central directory is read once in [`ZipArchiveSource::open`]. Every
/// call to [`EntrySource::open_entry`] opens its own file handle, so readers
/// handed to concurrent sessions never share a cursor.
#[derive(Debug)]
pub struct ZipArchiveSource {
    path: PathBuf,
    entries: Vec<ZipEntry>,
    by_name: HashMap<String, usize>,
}

impl ZipArchiveSource {
    /// Open a zip archive from the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;

        let mut archive = zip::ZipArchive::new(file)?;
        let mut entries: Vec<ZipEntry> = Vec::with_capacity(archive.len());
        let mut by_name: HashMap<String, usize> = HashMap::new();

        for i in 0..archive.len() {
            let file = archive.by_index_raw(i)?;
            let entry = ZipEntry {
                name: file.name().to_string(),
                index: i,
                offset: file.data_start(),
                size: file.size(),
                compressed_size: file.compressed_size(),
                compression: file.compression(),
                modified: unix_timestamp(file.last_modified()),
                encrypted: file.encrypted(),
            };
            trace!(
                "member {} '{}' (offset={}, size={}, method={:?})",
                i,
                entry.name,
                entry.offset,
                entry.size,
                entry.compression
            );

            // Duplicate names resolve to the newest, then largest, member.
            let keep_existing = by_name.get(&entry.name).is_some_and(|&existing| {
                (entries[existing].modified, entries[existing].size) >= (entry.modified, entry.size)
            });
            if !keep_existing {
                by_name.insert(entry.name.clone(), entries.len());
            }
            entries.push(entry);
        }

        debug!("Opened {} with {} members", path.display(), entries.len());

        Ok(Self {
            path: path.to_path_buf(),
            entries,
            by_name,
        })
    }

    /// Get the path to the archive file.
    pub fn archive_path(&self) -> &Path {
        &self.path
    }

    /// Get all members in central directory order.
    pub fn entries(&self) -> &[ZipEntry] {
        &self.entries
    }

    /// Find a member by its raw name.
    pub fn entry(&self, name: &str) -> Option<&ZipEntry> {
        self.by_name.get(name).map(|&i| &self.entries[i])
    }

    /// Read a member through the zip library into memory.
    ///
    /// Used for compression methods that have no streaming decoder here,
    /// and for encrypted members (which the zip library rejects).
    fn read_buffered(&self, file: File, entry: &ZipEntry) -> Result<EntryStream> {
        debug!(
            "Buffering member '{}' ({:?}, {} bytes)",
            entry.name, entry.compression, entry.size
        );
        let mut archive = zip::ZipArchive::new(file)?;
        let mut member = archive.by_index(entry.index)?;
        let mut data = Vec::with_capacity(entry.size as usize);
        member.read_to_end(&mut data)?;
        Ok(Box::new(Cursor::new(data)))
    }
}

impl EntrySource for ZipArchiveSource {
    fn list_entries(&self) -> Result<Vec<RawEntry>> {
        Ok(self.entries.iter().map(ZipEntry::raw).collect())
    }

    fn open_entry(&self, name: &str) -> Result<EntryStream> {
        let entry = self
            .entry(name)
            .ok_or_else(|| Error::EntryNotFound(name.to_string()))?;
        if entry.is_dir() {
            return Err(Error::DirectoryEntry(name.to_string()));
        }

        let mut file = File::open(&self.path)?;
        if entry.encrypted {
            return self.read_buffered(file, entry);
        }

        match entry.compression {
            CompressionMethod::Stored => {
                file.seek(SeekFrom::Start(entry.offset))?;
                Ok(Box::new(BufReader::new(file).take(entry.size)))
            }
            CompressionMethod::Deflated => {
                file.seek(SeekFrom::Start(entry.offset))?;
                let raw = BufReader::new(file).take(entry.compressed_size);
                Ok(Box::new(DeflateDecoder::new(raw)))
            }
            _ => self.read_buffered(file, entry),
        }
    }
}

/// Interpret a member's DOS date/time as UTC seconds since the Unix epoch.
fn unix_timestamp(time: Option<zip::DateTime>) -> i64 {
    time.and_then(|t| {
        NaiveDate::from_ymd_opt(t.year() as i32, t.month() as u32, t.day() as u32)?.and_hms_opt(
            t.hour() as u32,
            t.minute() as u32,
            t.second() as u32,
        )
    })
    .map(|dt| dt.and_utc().timestamp())
    .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ArchiveBuilder;
    use chrono::NaiveDateTime;
    use std::io::Write;
    use tempfile::tempdir;

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn test_list_entries_reports_markers_and_metadata() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("listing.zip");

        ArchiveBuilder::new()
            .with_directory("c/")
            .with_file_modified("a/b.txt", b"hello".to_vec(), at("2024-03-15 12:30:00"))
            .write_to(&path)
            .unwrap();

        let source = ZipArchiveSource::open(&path).unwrap();
        let raw = source.list_entries().unwrap();

        assert_eq!(raw.len(), 2);
        assert_eq!(raw[0].name, "c/");
        assert!(raw[0].is_dir);
        assert_eq!(raw[0].size, 0);
        assert_eq!(raw[1], RawEntry::file("a/b.txt", 5, 1_710_505_800));
    }

    #[test]
    fn test_open_stored_entry_streams_exact_bytes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stored.zip");

        ArchiveBuilder::new()
            .with_file("first.txt", b"first".to_vec())
            .with_file("second.txt", b"second member".to_vec())
            .write_to(&path)
            .unwrap();

        let source = ZipArchiveSource::open(&path).unwrap();
        let mut data = String::new();
        source
            .open_entry("second.txt")
            .unwrap()
            .read_to_string(&mut data)
            .unwrap();
        assert_eq!(data, "second member");
    }

    #[test]
    fn test_open_deflated_entry_decompresses() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("deflated.zip");
        let body = "compressible ".repeat(500);

        ArchiveBuilder::new()
            .deflated(true)
            .with_file("big.txt", body.clone().into_bytes())
            .write_to(&path)
            .unwrap();

        let source = ZipArchiveSource::open(&path).unwrap();
        let entry = source.entry("big.txt").unwrap();
        assert_eq!(entry.compression, CompressionMethod::Deflated);
        assert!(entry.compressed_size < entry.size);

        let mut data = String::new();
        source
            .open_entry("big.txt")
            .unwrap()
            .read_to_string(&mut data)
            .unwrap();
        assert_eq!(data, body);
    }

    #[test]
    fn test_concurrent_readers_are_independent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("independent.zip");

        ArchiveBuilder::new()
            .with_file("one.txt", b"0123456789".to_vec())
            .write_to(&path)
            .unwrap();

        let source = ZipArchiveSource::open(&path).unwrap();
        let mut a = source.open_entry("one.txt").unwrap();
        let mut b = source.open_entry("one.txt").unwrap();

        let mut head = [0u8; 4];
        a.read_exact(&mut head).unwrap();
        assert_eq!(&head, b"0123");

        let mut all = Vec::new();
        b.read_to_end(&mut all).unwrap();
        assert_eq!(all, b"0123456789");

        let mut rest = Vec::new();
        a.read_to_end(&mut rest).unwrap();
        assert_eq!(rest, b"456789");
    }

    #[test]
    fn test_open_missing_and_directory_entries_fail() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("errors.zip");

        ArchiveBuilder::new()
            .with_directory("empty/")
            .write_to(&path)
            .unwrap();

        let source = ZipArchiveSource::open(&path).unwrap();
        assert!(matches!(
            source.open_entry("missing.txt"),
            Err(Error::EntryNotFound(_))
        ));
        assert!(matches!(
            source.open_entry("empty/"),
            Err(Error::DirectoryEntry(_))
        ));
    }

    #[test]
    fn test_open_rejects_non_zip_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("not-a.zip");
        File::create(&path)
            .unwrap()
            .write_all(b"plain text, no central directory")
            .unwrap();

        assert!(matches!(
            ZipArchiveSource::open(&path),
            Err(Error::ZipError(_))
        ));
    }

    #[test]
    fn test_unix_timestamp_handles_missing_time() {
        assert_eq!(unix_timestamp(None), 0);
        let t = zip::DateTime::from_date_and_time(2023, 11, 2, 8, 4, 6).unwrap();
        assert_eq!(unix_timestamp(Some(t)), 1_698_912_246);
    }
}
