use crate::{Error, Result};
use chrono::{Datelike, NaiveDateTime, Timelike};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

#[derive(Debug, Clone)]
enum Member {
    File {
        name: String,
        data: Vec<u8>,
        modified: Option<NaiveDateTime>,
    },
    Directory {
        name: String,
    },
}

/// Builder for creating zip archives, members written in insertion order.
#[derive(Debug, Default, Clone)]
pub struct ArchiveBuilder {
    members: Vec<Member>,
    deflated: bool,
}

impl ArchiveBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Compress file members with deflate instead of storing them.
    pub fn deflated(mut self, deflated: bool) -> Self {
        self.deflated = deflated;
        self
    }

    /// Add a file member with the zip default timestamp.
    pub fn with_file(mut self, name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        self.members.push(Member::File {
            name: name.into(),
            data: data.into(),
            modified: None,
        });
        self
    }

    /// Add a file member with an explicit (UTC) modification time.
    pub fn with_file_modified(
        mut self,
        name: impl Into<String>,
        data: impl Into<Vec<u8>>,
        modified: NaiveDateTime,
    ) -> Self {
        self.members.push(Member::File {
            name: name.into(),
            data: data.into(),
            modified: Some(modified),
        });
        self
    }

    /// Add an explicit directory marker. A trailing `/` is appended if missing.
    pub fn with_directory(mut self, name: impl Into<String>) -> Self {
        self.members.push(Member::Directory { name: name.into() });
        self
    }

    /// Write the archive to the specified path.
    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<PathBuf> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = File::create(path)?;
        let mut zip = ZipWriter::new(file);
        let method = if self.deflated {
            CompressionMethod::Deflated
        } else {
            CompressionMethod::Stored
        };
        let options = SimpleFileOptions::default().compression_method(method);

        for member in &self.members {
            match member {
                Member::File {
                    name,
                    data,
                    modified,
                } => {
                    let options = match modified {
                        Some(modified) => options.last_modified_time(zip_time(modified)?),
                        None => options,
                    };
                    zip.start_file(name.as_str(), options)?;
                    zip.write_all(data)?;
                }
                Member::Directory { name } => {
                    zip.add_directory(name.as_str(), options)?;
                }
            }
        }

        zip.finish()?;

        Ok(path.to_path_buf())
    }
}

fn zip_time(time: &NaiveDateTime) -> Result<zip::DateTime> {
    let year = u16::try_from(time.year()).map_err(|_| Error::InvalidTimestamp(time.to_string()))?;
    zip::DateTime::from_date_and_time(
        year,
        time.month() as u8,
        time.day() as u8,
        time.hour() as u8,
        time.minute() as u8,
        time.second() as u8,
    )
    .map_err(|_| Error::InvalidTimestamp(time.to_string()))
}
