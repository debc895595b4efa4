//! Async lifecycle management for one HTTP listener.
//!
//! Each [`HttpServer`] owns one TCP listener, one background accept task, and
//! a watch channel that signals "fully stopped" to any number of waiters.
//! State transitions (Created → Running → Stopped) are serialized through a
//! single mutex; the stop signal is a single-shot channel rather than a flag
//! the worker polls.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::OnceLock;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{watch, Mutex};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info};

use crate::error::{CfnLocalError, Result};
use crate::http::RequestHandler;

enum ServerState {
    Created,
    Running { stop_tx: watch::Sender<bool>, worker: JoinHandle<()> },
    Stopped,
}

/// One HTTP listener and its background worker.
///
/// `serve()` and `shutdown()` are both idempotent, and `shutdown()` is safe
/// to call from a different task than `serve()` — including before `serve()`
/// was ever called.
pub struct HttpServer {
    name: &'static str,
    port: u16,
    handler: Arc<dyn RequestHandler>,
    state: Mutex<ServerState>,
    stopped_tx: watch::Sender<bool>,
    local_addr: OnceLock<SocketAddr>,
}

impl HttpServer {
    /// Create a listener handle bound to nothing yet.
    ///
    /// `name` is only used in log lines; `port` 0 asks the OS for an
    /// ephemeral port (see [`local_addr`](Self::local_addr)).
    pub fn new(name: &'static str, port: u16, handler: impl RequestHandler) -> Self {
        let (stopped_tx, _) = watch::channel(false);
        Self {
            name,
            port,
            handler: Arc::new(handler),
            state: Mutex::new(ServerState::Created),
            stopped_tx,
            local_addr: OnceLock::new(),
        }
    }

    /// Address the listener actually bound, once `serve()` has run.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr.get().copied()
    }

    /// Start accepting connections on a background task.
    ///
    /// Spawns exactly one worker. Calling again while running (or after the
    /// server stopped) is a no-op.
    pub async fn serve(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        if !matches!(*state, ServerState::Created) {
            debug!(server = self.name, "serve() called on an already-started server");
            return Ok(());
        }

        let addr = format!("0.0.0.0:{}", self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| CfnLocalError::ServerBind { addr: addr.clone(), source: e })?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| CfnLocalError::ServerBind { addr, source: e })?;
        let _ = self.local_addr.set(local_addr);

        let (stop_tx, stop_rx) = watch::channel(false);
        let worker =
            tokio::spawn(accept_loop(self.name, listener, self.handler.clone(), stop_rx));
        *state = ServerState::Running { stop_tx, worker };

        info!(server = self.name, addr = %local_addr, "Listening");
        Ok(())
    }

    /// Block until the server has fully stopped.
    ///
    /// Returns immediately if it already has. Safe to call from any number of
    /// tasks, concurrently with `shutdown()`.
    pub async fn wait(&self) {
        let mut rx = self.stopped_tx.subscribe();
        while !*rx.borrow_and_update() {
            if rx.changed().await.is_err() {
                break;
            }
        }
    }

    /// Stop accepting connections, drain in-flight requests, wake waiters.
    ///
    /// Idempotent; a no-op on an already-stopped or never-started server
    /// (the latter still transitions to Stopped so waiters are released).
    pub async fn shutdown(&self) {
        let mut state = self.state.lock().await;
        match std::mem::replace(&mut *state, ServerState::Stopped) {
            ServerState::Running { stop_tx, worker } => {
                debug!(server = self.name, "Shutting down");
                let _ = stop_tx.send(true);
                if let Err(e) = worker.await {
                    error!(server = self.name, "Listener worker panicked: {}", e);
                }
                info!(server = self.name, "Stopped");
            }
            ServerState::Created => {
                debug!(server = self.name, "shutdown() called before serve(), nothing to stop");
            }
            ServerState::Stopped => {}
        }
        let _ = self.stopped_tx.send(true);
    }
}

/// Accept connections until the stop signal fires, then drain in-flight ones.
async fn accept_loop(
    name: &'static str,
    listener: TcpListener,
    handler: Arc<dyn RequestHandler>,
    mut stop_rx: watch::Receiver<bool>,
) {
    let mut connections = JoinSet::new();
    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    debug!(server = name, peer = %peer, "Accepted connection");
                    let handler = handler.clone();
                    connections.spawn(async move {
                        if let Err(e) = handle_connection(stream, handler).await {
                            debug!(server = name, "Connection error: {}", e);
                        }
                    });
                }
                Err(e) => {
                    error!(server = name, "Failed to accept connection: {}", e);
                }
            },
            // Reap finished connection tasks as we go
            Some(_) = connections.join_next(), if !connections.is_empty() => {}
            _ = stop_rx.changed() => break,
        }
    }

    // Stop accepting before draining what is already in flight
    drop(listener);
    while connections.join_next().await.is_some() {}
    debug!(server = name, "Accept loop exited");
}

/// Serve a single connection: parse the request line, drain headers, respond.
async fn handle_connection(
    mut stream: TcpStream,
    handler: Arc<dyn RequestHandler>,
) -> Result<()> {
    let (method, path) = {
        let mut reader = BufReader::new(&mut stream);
        let mut request_line = String::new();
        reader
            .read_line(&mut request_line)
            .await
            .map_err(|e| CfnLocalError::Internal(format!("Failed to read request line: {}", e)))?;

        let mut parts = request_line.split_whitespace();
        let (method, path) = match (parts.next(), parts.next()) {
            (Some(method), Some(path)) => (method.to_string(), path.to_string()),
            _ => {
                return Err(CfnLocalError::Internal("Invalid HTTP request line".to_string()));
            }
        };

        // Drain headers; nothing in them affects the response
        loop {
            let mut line = String::new();
            let read = reader.read_line(&mut line).await.map_err(|e| {
                CfnLocalError::Internal(format!("Failed to read request headers: {}", e))
            })?;
            if read == 0 || line.trim().is_empty() {
                break;
            }
        }
        (method, path)
    };

    debug!(%method, %path, "Request");
    let response = if method == "GET" {
        handler.handle(&path)
    } else {
        crate::http::HttpResponse::method_not_allowed()
    };

    let payload = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        response.status,
        response.reason(),
        response.content_type,
        response.body.len(),
        response.body
    );
    stream
        .write_all(payload.as_bytes())
        .await
        .map_err(|e| CfnLocalError::Internal(format!("Failed to write response: {}", e)))?;
    stream.flush().await.ok();
    Ok(())
}
