//! # zipfs-format
//!
//! Read-only access to zip archives as a flat list of members.
//!
//! This crate provides:
//! - The [`EntrySource`] trait: list raw members once, open any member for
//!   streamed reading any number of times
//! - [`ZipArchiveSource`], the zip implementation, streaming stored and
//!   deflated members straight from their data offset
//! - [`ArchiveBuilder`] for creating zip archives (fixtures, demos)
//!
//! ## Example
//!
//! ```ignore
//! use std::io::Read;
//! use zipfs_format::{EntrySource, ZipArchiveSource};
//!
//! let source = ZipArchiveSource::open("example.zip")?;
//! for raw in source.list_entries()? {
//!     println!("{} ({} bytes, dir={})", raw.name, raw.size, raw.is_dir);
//! }
//!
//! let mut text = String::new();
//! source.open_entry("docs/readme.txt")?.read_to_string(&mut text)?;
//! ```

mod builder;
mod error;
mod format;
mod source;

pub use builder::ArchiveBuilder;
pub use error::{Error, Result};
pub use format::{ZipArchiveSource, ZipEntry};
pub use source::{EntrySource, EntryStream, RawEntry};
