use thiserror::Error;

/// Errors that can occur when reading members of a zip archive.
#[derive(Debug, Error)]
pub enum Error {
    /// No member with the given name exists in the archive.
    #[error("entry not found in archive: {0}")]
    EntryNotFound(String),

    /// The member is a directory marker and carries no data.
    #[error("entry is a directory marker: {0}")]
    DirectoryEntry(String),

    /// A timestamp cannot be represented in the zip date/time format.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// Error from the zip library.
    #[error("zip error: {0}")]
    ZipError(#[from] zip::result::ZipError),

    /// I/O error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for zipfs-format operations.
pub type Result<T> = std::result::Result<T, Error>;
