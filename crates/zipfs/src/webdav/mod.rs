//! WebDAV server adapter for mounted archives.
//!
//! This module exposes an [`ArchiveMount`](crate::ArchiveMount) as a
//! network-mountable, read-only filesystem, reachable from Finder, Windows
//! Explorer, or any WebDAV-compatible client.
//!
//! Every request is answered through a fresh [`VirtualFs`](crate::VirtualFs)
//! session, so clients share the mount's index but never its state.
//!
//! # Example
//!
//! ```ignore
//! use zipfs::webdav::serve;
//! use zipfs::{ArchiveMount, MountConfig};
//!
//! let mount = ArchiveMount::open("example.zip", MountConfig::default())?;
//!
//! // Start WebDAV server on port 4918
//! serve(mount, ([127, 0, 0, 1], 4918).into()).await?;
//! ```

mod filesystem;
mod server;

pub use filesystem::ArchiveDavFs;
pub use server::{serve, serve_background, ArchiveWebDavServer};
