// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// HTTP server for the image enhancer.
//
// Listens on raw TCP and speaks just enough HTTP/1.1 for one request per
// connection: read the head, read `Content-Length` bytes of body, route,
// answer with `Connection: close`. Routing and the enhancement pipeline are
// CPU-bound and run on Tokio's blocking pool so the accept loop stays
// responsive.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use enhancer_core::config::ServerConfig;
use enhancer_core::error::{EnhancerError, Result};
use enhancer_core::types::ServerStatus;
use enhancer_imaging::Enhancer;

use crate::http::{HttpRequest, HttpResponse, find_subsequence, parse_head};
use crate::routes::Router;

/// Read buffer growth step.
const READ_CHUNK: usize = 16 * 1024;

/// Upper bound on the request line plus headers.
pub const MAX_HEAD_BYTES: usize = 32 * 1024;

const HEAD_TERMINATOR: &[u8] = b"\r\n\r\n";

// ---------------------------------------------------------------------------
// Shared state passed to connection handlers
// ---------------------------------------------------------------------------

struct SharedState {
    router: Arc<Router>,
    active_connections: Arc<AtomicU32>,
    max_request_bytes: usize,
}

/// What came off the socket.
enum ReadOutcome {
    Request(HttpRequest),
    /// The peer closed the connection before sending anything.
    Closed,
    /// Head or declared body exceeds the configured limit.
    TooLarge,
    /// No header terminator within [`MAX_HEAD_BYTES`].
    HeadTooLarge,
}

// ---------------------------------------------------------------------------
// EnhanceServer
// ---------------------------------------------------------------------------

/// The enhancer's HTTP front end.
///
/// Created `Stopped`; [`start`](Self::start) binds and spawns the accept loop,
/// [`stop`](Self::stop) signals it and waits for it to exit.
pub struct EnhanceServer {
    config: ServerConfig,
    router: Arc<Router>,
    status: ServerStatus,
    /// Notification handle used to signal a graceful shutdown.
    shutdown_signal: Arc<Notify>,
    /// Handle to the Tokio task running the accept loop.
    task_handle: Option<JoinHandle<()>>,
    active_connections: Arc<AtomicU32>,
    /// Bound address once started (resolves port 0).
    local_addr: Option<SocketAddr>,
}

impl EnhanceServer {
    pub fn new(config: ServerConfig, enhancer: Enhancer) -> Self {
        let router = Router::new(enhancer, config.allowed_origins.clone());
        Self {
            config,
            router: Arc::new(router),
            status: ServerStatus::Stopped,
            shutdown_signal: Arc::new(Notify::new()),
            task_handle: None,
            active_connections: Arc::new(AtomicU32::new(0)),
            local_addr: None,
        }
    }

    pub fn status(&self) -> ServerStatus {
        self.status
    }

    /// Address actually bound, available after a successful start.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Number of connections currently being served.
    pub fn active_connections(&self) -> u32 {
        self.active_connections.load(Ordering::Relaxed)
    }

    /// Bind the listener and start accepting connections.
    ///
    /// # Errors
    ///
    /// Returns [`EnhancerError::Server`] if the address cannot be bound.
    pub async fn start(&mut self) -> Result<SocketAddr> {
        if let (ServerStatus::Running, Some(addr)) = (self.status, self.local_addr) {
            debug!(%addr, "Server already running");
            return Ok(addr);
        }

        self.status = ServerStatus::Starting;

        let bind_addr = SocketAddr::new(self.config.bind_address, self.config.port);
        let listener = match TcpListener::bind(bind_addr).await {
            Ok(listener) => listener,
            Err(e) => {
                self.status = ServerStatus::Stopped;
                return Err(EnhancerError::Server(format!("bind {bind_addr}: {e}")));
            }
        };
        let local_addr = listener
            .local_addr()
            .map_err(|e| EnhancerError::Server(format!("local address: {e}")))?;

        info!(addr = %local_addr, "Image enhancer listening");

        let shared = Arc::new(SharedState {
            router: Arc::clone(&self.router),
            active_connections: Arc::clone(&self.active_connections),
            max_request_bytes: self.config.max_request_bytes,
        });
        let shutdown = Arc::clone(&self.shutdown_signal);

        let handle = tokio::spawn(async move {
            Self::accept_loop(listener, shutdown, shared).await;
        });

        self.task_handle = Some(handle);
        self.local_addr = Some(local_addr);
        self.status = ServerStatus::Running;
        Ok(local_addr)
    }

    /// Stop accepting connections and wait for the accept loop to exit.
    ///
    /// Connections already being served run to completion.
    pub async fn stop(&mut self) -> Result<()> {
        if self.status != ServerStatus::Running {
            return Ok(());
        }

        info!(addr = ?self.local_addr, "Stopping image enhancer");
        self.shutdown_signal.notify_one();

        if let Some(handle) = self.task_handle.take() {
            handle
                .await
                .map_err(|e| EnhancerError::Server(format!("task join: {e}")))?;
        }

        self.status = ServerStatus::Stopped;
        self.local_addr = None;
        info!("Image enhancer stopped");
        Ok(())
    }

    async fn accept_loop(listener: TcpListener, shutdown: Arc<Notify>, shared: Arc<SharedState>) {
        loop {
            tokio::select! {
                _ = shutdown.notified() => {
                    debug!("Accept loop received shutdown signal");
                    break;
                }

                accept_result = listener.accept() => {
                    match accept_result {
                        Ok((stream, peer_addr)) => {
                            debug!(peer = %peer_addr, "Incoming connection");
                            let state = Arc::clone(&shared);
                            tokio::spawn(async move {
                                state.active_connections.fetch_add(1, Ordering::Relaxed);
                                if let Err(e) = Self::handle_connection(stream, peer_addr, &state).await {
                                    warn!(
                                        peer = %peer_addr,
                                        error = %e,
                                        "Connection handler error"
                                    );
                                }
                                state.active_connections.fetch_sub(1, Ordering::Relaxed);
                            });
                        }
                        Err(e) => {
                            error!(error = %e, "Failed to accept connection");
                        }
                    }
                }
            }
        }
    }

    /// Serve one request on `stream`.
    async fn handle_connection(
        mut stream: TcpStream,
        peer_addr: SocketAddr,
        state: &SharedState,
    ) -> Result<()> {
        let request = match read_request(&mut stream, state.max_request_bytes).await {
            Ok(ReadOutcome::Request(request)) => request,
            Ok(ReadOutcome::Closed) => {
                debug!(peer = %peer_addr, "Empty request, closing connection");
                return Ok(());
            }
            Ok(ReadOutcome::TooLarge) => {
                warn!(
                    peer = %peer_addr,
                    limit = state.max_request_bytes,
                    "Request exceeds size limit"
                );
                let response = HttpResponse::detail(413, "Request body too large");
                return send_response(&mut stream, &response).await;
            }
            Ok(ReadOutcome::HeadTooLarge) => {
                warn!(peer = %peer_addr, limit = MAX_HEAD_BYTES, "Request head too large");
                let response = HttpResponse::detail(431, "Request header fields too large");
                return send_response(&mut stream, &response).await;
            }
            Err(err @ EnhancerError::BadRequest(_)) => {
                warn!(peer = %peer_addr, error = %err, "Malformed HTTP request");
                return send_response(&mut stream, &HttpResponse::error(&err)).await;
            }
            Err(err) => return Err(err),
        };

        let method = request.method().to_string();
        let path = request.path().to_string();
        let body_len = request.body.len();

        let router = Arc::clone(&state.router);
        let response = tokio::task::spawn_blocking(move || router.handle(&request))
            .await
            .unwrap_or_else(|e| {
                error!(error = %e, "Request handler panicked");
                HttpResponse::error(&EnhancerError::Server(format!("handler task: {e}")))
            });

        send_response(&mut stream, &response).await?;

        info!(
            peer = %peer_addr,
            %method,
            %path,
            request_bytes = body_len,
            status = response.status,
            response_bytes = response.body.len(),
            "Request served"
        );
        Ok(())
    }
}

/// Read one request: the head up to the blank line, then exactly
/// `Content-Length` bytes of body.
///
/// Only newly arrived bytes (plus a terminator-sized overlap) are searched
/// for the end of the head.
async fn read_request(stream: &mut TcpStream, max_request_bytes: usize) -> Result<ReadOutcome> {
    let mut buf: Vec<u8> = Vec::with_capacity(READ_CHUNK);
    let mut chunk = vec![0u8; READ_CHUNK];
    let mut scanned: usize = 0;

    let (head, body_offset) = loop {
        let from = scanned.saturating_sub(HEAD_TERMINATOR.len() - 1);
        if find_subsequence(&buf[from..], HEAD_TERMINATOR).is_some() {
            if let Some(parsed) = parse_head(&buf)? {
                break parsed;
            }
        }
        scanned = buf.len();
        if buf.len() > max_request_bytes {
            return Ok(ReadOutcome::TooLarge);
        }
        if buf.len() > MAX_HEAD_BYTES {
            return Ok(ReadOutcome::HeadTooLarge);
        }
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            if buf.is_empty() {
                return Ok(ReadOutcome::Closed);
            }
            return Err(EnhancerError::BadRequest(
                "connection closed before the request head was complete".into(),
            ));
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let length = head.content_length()?;
    let total = body_offset.saturating_add(length);
    if total > max_request_bytes {
        return Ok(ReadOutcome::TooLarge);
    }

    while buf.len() < total {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Err(EnhancerError::BadRequest(format!(
                "body truncated: expected {length} bytes, got {}",
                buf.len() - body_offset
            )));
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    buf.truncate(total);
    let body = buf.split_off(body_offset);
    Ok(ReadOutcome::Request(HttpRequest { head, body }))
}

async fn send_response(stream: &mut TcpStream, response: &HttpResponse) -> Result<()> {
    stream
        .write_all(&response.to_bytes())
        .await
        .map_err(|e| EnhancerError::Server(format!("write response: {e}")))?;
    stream
        .flush()
        .await
        .map_err(|e| EnhancerError::Server(format!("flush: {e}")))?;
    // Best effort; the peer may already be gone.
    let _ = stream.shutdown().await;
    Ok(())
}
