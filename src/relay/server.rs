//! Relay ingest server - accepts hardware relay connections and fans every
//! message out to the AI-input stream and the session's report stream.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::BufReader;
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::util::rate_limit::{IngestRateLimiter, RELAY_RATE_LIMIT};
use crate::util::time::ACCEPT_POLL_MS;
use crate::util::Shutdown;

use super::framing::{read_frame, FrameRead};

/// Downstream streams every relay message is copied onto
#[derive(Debug, Clone)]
pub struct RelaySinks {
    ai_input: UnboundedSender<String>,
    engine: UnboundedSender<String>,
}

impl RelaySinks {
    pub fn new(ai_input: UnboundedSender<String>, engine: UnboundedSender<String>) -> Self {
        Self { ai_input, engine }
    }

    /// Send the identical message to both streams
    pub fn dispatch(&self, message: String) {
        if self.ai_input.send(message.clone()).is_err() {
            debug!("AI input stream closed");
        }
        if self.engine.send(message).is_err() {
            debug!("Engine report stream closed");
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RelayServerConfig {
    /// Accept timeout; only bounds how long shutdown can go unnoticed
    pub accept_poll: Duration,
    /// Frames per second accepted from one connection
    pub rate_limit: u32,
}

impl Default for RelayServerConfig {
    fn default() -> Self {
        Self {
            accept_poll: Duration::from_millis(ACCEPT_POLL_MS),
            rate_limit: RELAY_RATE_LIMIT,
        }
    }
}

/// Single-client relay listener
pub struct RelayIngestServer {
    listener: TcpListener,
    sinks: RelaySinks,
    config: RelayServerConfig,
    shutdown: Shutdown,
}

impl RelayIngestServer {
    pub async fn bind(
        addr: impl ToSocketAddrs,
        sinks: RelaySinks,
        config: RelayServerConfig,
        shutdown: Shutdown,
    ) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            sinks,
            config,
            shutdown,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept loop. Clients are served one at a time; the listener is closed on return.
    pub async fn run(self) {
        match self.local_addr() {
            Ok(addr) => info!(addr = %addr, "Relay ingest listening"),
            Err(e) => warn!(error = %e, "Relay ingest listening on unknown address"),
        }

        while !self.shutdown.is_triggered() {
            match timeout(self.config.accept_poll, self.listener.accept()).await {
                Err(_) => continue,
                Ok(Ok((stream, peer))) => self.serve_client(stream, peer).await,
                Ok(Err(e)) => warn!(error = %e, "Relay accept failed"),
            }
        }

        info!("Relay ingest stopped");
    }

    async fn serve_client(&self, stream: TcpStream, peer: SocketAddr) {
        let conn_id = Uuid::new_v4();
        info!(conn_id = %conn_id, peer = %peer, "Relay client connected");

        if let Err(e) = stream.set_nodelay(true) {
            debug!(conn_id = %conn_id, error = %e, "Failed to set TCP_NODELAY");
        }

        let limiter = IngestRateLimiter::new(self.config.rate_limit);
        let mut reader = BufReader::new(stream);
        let mut frames: u64 = 0;

        loop {
            let read = tokio::select! {
                _ = self.shutdown.wait() => {
                    debug!(conn_id = %conn_id, "Shutdown requested, closing relay client");
                    break;
                }
                read = read_frame(&mut reader) => read,
            };

            match read {
                Ok(FrameRead::Message(message)) => {
                    if !limiter.check_frame() {
                        warn!(conn_id = %conn_id, "Rate limited relay frame");
                        continue;
                    }
                    debug!(conn_id = %conn_id, message = %message, "Relay frame received");
                    frames += 1;
                    self.sinks.dispatch(message);
                }
                Ok(FrameRead::Dropped(reason)) => {
                    warn!(conn_id = %conn_id, reason = %reason, "Relay frame dropped");
                }
                Ok(FrameRead::Disconnected) => {
                    debug!(conn_id = %conn_id, "Relay client disconnected");
                    break;
                }
                Err(e) => {
                    warn!(conn_id = %conn_id, error = %e, "Relay protocol error, closing connection");
                    break;
                }
            }
        }

        info!(conn_id = %conn_id, frames, "Relay client closed");
    }
}
