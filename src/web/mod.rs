//! Prometheus scrape endpoint.
//!
//! A deliberately small HTTP/1.0 server: every connection gets one request
//! head read, one `200 OK` response carrying the current snapshot in the
//! Prometheus text format, and is then closed.

pub mod config;
pub mod exposition;
pub mod request;

// Re-export commonly used items
pub use config::ServerConfig;
pub use exposition::{encode, NoDataValue};

use crate::error::{ExporterError, Result};
use crate::metrics::SharedSnapshot;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tracing::{debug, info, trace, warn};

/// Delay before accepting again after an accept error (e.g. out of file descriptors).
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Build the full HTTP response for a metrics body.
pub fn render_response(body: &str) -> String {
    format!("HTTP/1.0 200 OK\r\nContent-Type: text/plain\r\n\r\n{}", body)
}

/// A bound metrics server.
pub struct MetricsServer {
    listener: TcpListener,
    snapshot: SharedSnapshot,
    config: ServerConfig,
}

impl MetricsServer {
    /// Bind the listening socket.
    ///
    /// Invalid addresses are configuration errors; bind failures are setup
    /// errors. Both are fatal.
    pub async fn bind(config: ServerConfig, snapshot: SharedSnapshot) -> Result<Self> {
        let addr = config.socket_addr().await?;
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            ExporterError::setup_error(format!("Failed to bind to {}: {}", addr, e))
        })?;

        info!("Metrics server listening on http://{}", listener.local_addr()?);

        Ok(Self {
            listener,
            snapshot,
            config,
        })
    }

    /// Address the server is actually bound to.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections forever, one task per connection.
    pub async fn run(self) {
        let io_timeout = self.config.io_timeout;
        let no_data = self.config.no_data;

        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    debug!(%peer, "Client connected");
                    let snapshot = self.snapshot.clone();
                    tokio::spawn(async move {
                        if let Err(e) =
                            handle_connection(stream, &snapshot, io_timeout, no_data).await
                        {
                            debug!(%peer, "Connection closed without response: {}", e);
                        }
                    });
                }
                Err(e) => {
                    warn!("Accept error: {}", e);
                    tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                }
            }
        }
    }
}

/// Serve one scrape: read the request head, answer, close.
///
/// Reading and writing are each bounded by `io_timeout`. The snapshot is
/// copied before any socket write, so no lock is held while the peer is slow.
async fn handle_connection(
    mut stream: TcpStream,
    snapshot: &SharedSnapshot,
    io_timeout: Duration,
    no_data: NoDataValue,
) -> Result<()> {
    let head = timeout(io_timeout, request::read_request_head(&mut stream))
        .await
        .map_err(|_| ExporterError::connection_error("Timed out waiting for request head"))??;
    trace!(
        request = %head.request_line,
        headers = head.header_count,
        "Scrape request"
    );

    let reading = snapshot.read();
    let response = render_response(&encode(reading.as_ref(), no_data));

    timeout(io_timeout, async {
        stream.write_all(response.as_bytes()).await?;
        stream.shutdown().await
    })
    .await
    .map_err(|_| ExporterError::connection_error("Timed out writing response"))?
    .map_err(|e| ExporterError::connection_error(format!("Write failed: {}", e)))
}

/// Bind and serve forever.
///
/// Only returns if binding fails.
pub async fn serve(config: ServerConfig, snapshot: SharedSnapshot) -> Result<()> {
    let server = MetricsServer::bind(config, snapshot).await?;
    server.run().await;
    Ok(())
}
