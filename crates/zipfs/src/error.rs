use thiserror::Error;

/// Errors returned by filesystem operations on a mounted archive.
///
/// Paths carried by the variants are normalized index paths (no leading
/// separator); they are displayed client-style, rooted at `/`.
#[derive(Debug, Error)]
pub enum Error {
    /// The resolved path is neither root nor present in the index.
    #[error("no such file or directory: /{0}")]
    NotFound(String),

    /// The operation needs a directory but the path is a file.
    #[error("not a directory: /{0}")]
    NotADirectory(String),

    /// The operation needs a file but the path is a directory.
    #[error("is a directory: /{0}")]
    IsADirectory(String),

    /// Mutating operations are never available on an archive mount.
    #[error("operation not supported on a read-only archive: {0}")]
    Unsupported(&'static str),

    /// Error from the archive entry source.
    #[error("archive error: {0}")]
    Source(#[from] zipfs_format::Error),

    /// Error loading the mount configuration.
    #[error("config error: {0}")]
    Config(String),
}

/// Result type for zipfs operations.
pub type Result<T> = std::result::Result<T, Error>;
