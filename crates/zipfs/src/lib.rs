//! # zipfs
//!
//! Read-only virtual filesystem over zip archives.
//!
//! This crate provides:
//! - Directory tree synthesis: a flat, unordered, possibly incomplete member
//!   list becomes a closed index where every ancestor of every entry is a
//!   directory
//! - Per-client sessions ([`VirtualFs`]) implementing the [`FileSystem`]
//!   contract: stat, list, open for read, change directory
//! - **WebDAV server support** (with the `webdav` feature)
//!
//! ## Example
//!
//! ```ignore
//! use std::io::Read;
//! use zipfs::{ArchiveMount, FileSystem, MountConfig};
//!
//! let mount = ArchiveMount::open("example.zip", MountConfig::default())?;
//! let mut fs = mount.session();
//!
//! for name in fs.list_directory("/")? {
//!     println!("{}", name);
//! }
//!
//! fs.change_directory("docs")?;
//! let mut text = String::new();
//! fs.open_for_read("readme.txt")?.read_to_string(&mut text)?;
//! ```
//!
//! ## WebDAV Support
//!
//! Enable the `webdav` feature to serve a mount to Finder, Explorer, or any
//! WebDAV client:
//!
//! ```ignore
//! use zipfs::webdav::serve;
//! use zipfs::{ArchiveMount, MountConfig};
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     let mount = ArchiveMount::open("data.zip", MountConfig::default()).unwrap();
//!     serve(mount, ([127, 0, 0, 1], 4918).into()).await
//! }
//! ```

mod config;
mod error;
mod fs;
mod index;
pub mod path;
mod session;
mod vfs;

#[cfg(feature = "webdav")]
pub mod webdav;

pub use config::MountConfig;
pub use error::{Error, Result};
pub use fs::{
    FileStat, FileSystem, OpenMode, DIR_PERMISSIONS, FILE_PERMISSIONS, S_IFDIR, S_IFREG,
};
pub use index::{ArchiveIndex, Entry, EntryKind, MalformedEntry};
pub use session::VirtualFs;
pub use vfs::ArchiveMount;

// Re-export zipfs-format types for convenience
pub use zipfs_format::{EntrySource, EntryStream, RawEntry, ZipArchiveSource};
