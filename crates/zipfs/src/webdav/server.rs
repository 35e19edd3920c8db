//! WebDAV server implementation using hyper.
//!
//! This module provides the HTTP server that hosts the WebDAV filesystem,
//! allowing clients to connect and mount the archive.

use super::ArchiveDavFs;
use crate::vfs::ArchiveMount;
use dav_server::{fakels::FakeLs, DavHandler};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use log::{debug, error, info};
use std::convert::Infallible;
use std::io;
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

/// WebDAV server for a mounted archive.
pub struct ArchiveWebDavServer {
    /// Server address.
    addr: SocketAddr,
    /// Shutdown signal sender.
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl ArchiveWebDavServer {
    /// Get the server's listen address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Get the URL to mount this server.
    pub fn mount_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Shutdown the server.
    pub fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

fn build_handler(mount: ArchiveMount) -> DavHandler {
    DavHandler::builder()
        .filesystem(Box::new(ArchiveDavFs::new(mount)))
        .locksystem(FakeLs::new()) // Fake locks for macOS/Windows compatibility
        .build_handler()
}

fn spawn_connection(dav_server: DavHandler, stream: TcpStream) {
    let io = TokioIo::new(stream);

    tokio::spawn(async move {
        if let Err(err) = http1::Builder::new()
            .serve_connection(
                io,
                service_fn(move |req| {
                    let dav_server = dav_server.clone();
                    async move { Ok::<_, Infallible>(dav_server.handle(req).await) }
                }),
            )
            .await
        {
            error!("Connection error: {:?}", err);
        }
    });
}

/// Start a WebDAV server and block until the listener fails.
///
/// # Arguments
///
/// * `mount` - The archive mount to expose
/// * `addr` - Address to listen on (port 0 for auto-assign)
///
/// # Example
///
/// ```ignore
/// use zipfs::webdav::serve;
/// use zipfs::{ArchiveMount, MountConfig};
///
/// #[tokio::main]
/// async fn main() -> std::io::Result<()> {
///     let mount = ArchiveMount::open("data.zip", MountConfig::default()).unwrap();
///
///     // This blocks until Ctrl+C
///     serve(mount, ([127, 0, 0, 1], 4918).into()).await
/// }
/// ```
pub async fn serve(mount: ArchiveMount, addr: SocketAddr) -> io::Result<()> {
    let dav_server = build_handler(mount);

    let listener = TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;

    info!("WebDAV server listening on http://{}", local_addr);
    info!("");
    info!("To mount from a terminal (Linux):");
    info!("  mount -t davfs http://{} /mnt/archive", local_addr);
    info!("To mount from Finder: Cmd+K, then http://{}", local_addr);
    info!("");
    info!("Press Ctrl+C to stop the server");

    loop {
        let (stream, remote_addr) = listener.accept().await?;
        debug!("Connection from {}", remote_addr);
        spawn_connection(dav_server.clone(), stream);
    }
}

/// Start a WebDAV server in the background.
///
/// Returns a handle that can be used to get the server address and shut it down.
///
/// # Example
///
/// ```ignore
/// use zipfs::webdav::serve_background;
/// use zipfs::{ArchiveMount, MountConfig};
///
/// #[tokio::main]
/// async fn main() -> std::io::Result<()> {
///     let mount = ArchiveMount::open("data.zip", MountConfig::default()).unwrap();
///
///     let server = serve_background(mount, ([127, 0, 0, 1], 0).into()).await?;
///     println!("Server running at {}", server.mount_url());
///
///     // Shutdown when done
///     server.shutdown();
///     Ok(())
/// }
/// ```
pub async fn serve_background(
    mount: ArchiveMount,
    addr: SocketAddr,
) -> io::Result<ArchiveWebDavServer> {
    let dav_server = build_handler(mount);

    let listener = TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;

    let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

    info!("WebDAV server started on http://{}", local_addr);

    tokio::spawn(async move {
        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, remote_addr)) => {
                            debug!("Connection from {}", remote_addr);
                            spawn_connection(dav_server.clone(), stream);
                        }
                        Err(e) => {
                            error!("Accept error: {:?}", e);
                        }
                    }
                }
                _ = &mut shutdown_rx => {
                    info!("WebDAV server shutting down");
                    break;
                }
            }
        }
    });

    Ok(ArchiveWebDavServer {
        addr: local_addr,
        shutdown_tx: Some(shutdown_tx),
    })
}
