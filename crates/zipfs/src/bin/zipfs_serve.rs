//! zipfs-serve: Serve a zip archive as a read-only WebDAV filesystem.
//!
//! This binary mounts a zip archive and starts a local WebDAV server over
//! it, enabling direct access from Finder, Windows Explorer, or any WebDAV
//! client.
//!
//! # Usage
//!
//! ```bash
//! # Start WebDAV server
//! zipfs-serve photos.zip
//!
//! # Then mount in Finder: Cmd+K → http://localhost:4918
//! ```

use clap::Parser;
use env_logger::Env;
use log::{error, info, warn};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::process;
use zipfs::webdav;
use zipfs::{ArchiveMount, MountConfig};

/// Serve a zip archive as a read-only WebDAV filesystem.
///
/// Directories the archive only implies (never lists) are shown like any
/// other directory.
#[derive(Parser, Debug)]
#[command(name = "zipfs-serve")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the zip archive
    #[arg(value_name = "ARCHIVE")]
    archive: PathBuf,

    /// Port to listen on
    #[arg(short, long, default_value = "4918")]
    port: u16,

    /// Address to bind
    #[arg(short, long, default_value = "127.0.0.1")]
    bind: IpAddr,

    /// Mount configuration file (TOML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level))
        .format_timestamp_millis()
        .init();

    // Validate archive path
    if !args.archive.is_file() {
        error!("Archive not found: {}", args.archive.display());
        process::exit(1);
    }

    let config = match &args.config {
        Some(path) => match MountConfig::from_toml_file(path) {
            Ok(c) => c,
            Err(e) => {
                error!("Failed to load config: {}", e);
                process::exit(1);
            }
        },
        None => MountConfig::default(),
    };

    // Mount the archive
    info!("Opening archive: {}", args.archive.display());
    let mount = match ArchiveMount::open(&args.archive, config) {
        Ok(m) => m,
        Err(e) => {
            error!("Failed to mount archive: {}", e);
            process::exit(1);
        }
    };

    let index = mount.index();
    info!(
        "Files: {}, directories: {}",
        index.file_count(),
        index.directory_count()
    );
    for skipped in index.malformed() {
        warn!("  skipped {:?}: {}", skipped.name, skipped.reason);
    }

    // Start WebDAV server
    let addr = SocketAddr::new(args.bind, args.port);
    if let Err(e) = webdav::serve(mount, addr).await {
        error!("Server error: {}", e);
        process::exit(1);
    }
}
