//! Viewer connection lifecycle.
//!
//! # Responsibilities
//! - Admission against a tenant (exclusive or shared policy)
//! - Own the bounded outbound queue and its delivery loop
//! - Unregister from the tenant on every exit path
//!
//! # Lifecycle
//! ```text
//! admit ──▶ Registered ──upgrade──▶ Streaming ──▶ Closed
//!              │                        │
//!              └── upgrade failed ──────┴── peer close / write error /
//!                                           eviction / shutdown
//! ```
//!
//! Registration is taken before the upgrade response goes out, so a second
//! exclusive viewer is refused even while the first handshake is in flight.
//! `Subscription` unregisters itself on drop.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{close_code, CloseFrame, Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use crate::catcher::tenant::{Event, SubscriberHandle, Tenant};
use crate::lifecycle::ShutdownSignal;
use crate::observability::metrics;

/// Relaxed ordering is enough; ids only need to be unique.
static VIEWER_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a viewer connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewerId(u64);

impl ViewerId {
    pub fn new() -> Self {
        Self(VIEWER_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for ViewerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ViewerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "viewer-{}", self.0)
    }
}

/// How many viewers a tenant may have at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionPolicy {
    /// At most one viewer per tenant.
    Exclusive,
    /// Any number of viewers.
    Shared,
}

impl AdmissionPolicy {
    pub fn from_allow_multiple(allow_multiple: bool) -> Self {
        if allow_multiple {
            Self::Shared
        } else {
            Self::Exclusive
        }
    }
}

/// Reasons a subscribe attempt is refused.
#[derive(Debug, Error)]
pub enum AdmissionError {
    #[error("method {0} not allowed on the subscribe endpoint")]
    MethodNotAllowed(String),

    #[error("tenant {host} already has a viewer attached")]
    Occupied { host: String },
}

impl AdmissionError {
    /// Metrics label.
    pub fn reason(&self) -> &'static str {
        match self {
            AdmissionError::MethodNotAllowed(_) => "method",
            AdmissionError::Occupied { .. } => "occupied",
        }
    }
}

/// An admitted viewer: its registration plus the receiving end of its queue.
#[derive(Debug)]
pub struct Subscription {
    id: ViewerId,
    tenant: Arc<Tenant>,
    events: mpsc::Receiver<Event>,
    evicted: oneshot::Receiver<()>,
    closed: bool,
}

impl Subscription {
    /// Register a new viewer with `tenant`.
    pub fn admit(
        tenant: Arc<Tenant>,
        policy: AdmissionPolicy,
        queue_capacity: usize,
    ) -> Result<Self, AdmissionError> {
        let (queue, events) = mpsc::channel(queue_capacity.max(1));
        let (evict, evicted) = oneshot::channel();
        let id = ViewerId::new();

        tenant.add_subscriber(id, SubscriberHandle { queue, _evict: evict }, policy)?;
        metrics::viewer_attached();

        Ok(Self {
            id,
            tenant,
            events,
            evicted,
            closed: false,
        })
    }

    pub fn id(&self) -> ViewerId {
        self.id
    }

    pub fn tenant(&self) -> &Arc<Tenant> {
        &self.tenant
    }

    /// Next queued event, or `None` once the tenant has dropped this viewer.
    ///
    /// Eviction wins over events still sitting in the queue.
    pub async fn next_event(&mut self) -> Option<Event> {
        if self.closed {
            return None;
        }
        let next = tokio::select! {
            biased;
            _ = &mut self.evicted => None,
            event = self.events.recv() => event,
        };
        if next.is_none() {
            self.closed = true;
        }
        next
    }

    /// Stream events to `socket` until either side goes away.
    ///
    /// A write that stalls longer than `write_timeout`, or that is overtaken
    /// by eviction or shutdown, ends the connection.
    pub async fn run(
        mut self,
        socket: WebSocket,
        mut shutdown: ShutdownSignal,
        write_timeout: Duration,
    ) {
        tracing::info!(host = %self.tenant.host(), viewer = %self.id, "Viewer connected");
        let (mut ws_tx, mut ws_rx) = socket.split();

        let reason = loop {
            tokio::select! {
                event = self.next_event() => {
                    let Some(event) = event else {
                        break Disconnect::Evicted;
                    };
                    let text = match serde_json::to_string(event.as_ref()) {
                        Ok(text) => text,
                        Err(e) => {
                            tracing::error!(viewer = %self.id, error = %e, "Failed to encode event");
                            continue;
                        }
                    };

                    let write =
                        tokio::time::timeout(write_timeout, ws_tx.send(Message::Text(text.into())));
                    tokio::select! {
                        biased;
                        _ = &mut self.evicted => {
                            self.closed = true;
                            break Disconnect::Evicted;
                        }
                        _ = shutdown.wait() => break Disconnect::Shutdown,
                        result = write => match result {
                            Ok(Ok(())) => {}
                            Ok(Err(e)) => {
                                tracing::debug!(viewer = %self.id, error = %e, "Viewer write failed");
                                break Disconnect::WriteError;
                            }
                            Err(_) => break Disconnect::WriteTimeout,
                        },
                    }
                }
                msg = ws_rx.next() => {
                    match msg {
                        Some(Ok(Message::Close(_))) | None => break Disconnect::PeerClosed,
                        Some(Err(e)) => {
                            tracing::debug!(viewer = %self.id, error = %e, "Viewer read failed");
                            break Disconnect::ReadError;
                        }
                        // Viewers have nothing to say; ping/pong is answered by axum.
                        Some(Ok(_)) => continue,
                    }
                }
                _ = shutdown.wait() => break Disconnect::Shutdown,
            }
        };

        if let Some(code) = reason.close_code() {
            let frame = CloseFrame {
                code,
                reason: reason.as_str().into(),
            };
            if tokio::time::timeout(CLOSE_TIMEOUT, ws_tx.send(Message::Close(Some(frame))))
                .await
                .is_err()
            {
                tracing::debug!(viewer = %self.id, "Close frame not accepted, dropping transport");
            }
        }
        drop(ws_tx);
        drop(ws_rx);

        tracing::info!(
            host = %self.tenant.host(),
            viewer = %self.id,
            reason = %reason,
            "Viewer disconnected"
        );
    }
}

/// Longest wait for the Close frame before the socket is dropped anyway.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

/// Why a viewer connection ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Disconnect {
    PeerClosed,
    ReadError,
    WriteError,
    WriteTimeout,
    Evicted,
    Shutdown,
}

impl Disconnect {
    fn as_str(self) -> &'static str {
        match self {
            Disconnect::PeerClosed => "peer_closed",
            Disconnect::ReadError => "read_error",
            Disconnect::WriteError => "write_error",
            Disconnect::WriteTimeout => "write_timeout",
            Disconnect::Evicted => "evicted",
            Disconnect::Shutdown => "shutdown",
        }
    }

    /// Close code to send, if the transport is still worth writing to.
    fn close_code(self) -> Option<u16> {
        match self {
            Disconnect::PeerClosed | Disconnect::WriteError | Disconnect::WriteTimeout => None,
            Disconnect::Shutdown => Some(close_code::AWAY),
            Disconnect::Evicted => Some(close_code::POLICY),
            Disconnect::ReadError => Some(close_code::ERROR),
        }
    }
}

impl fmt::Display for Disconnect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.tenant.remove_subscriber(self.id);
        metrics::viewer_detached();
    }
}
