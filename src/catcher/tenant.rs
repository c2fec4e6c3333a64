//! Tenant: one isolated broadcast domain per normalized hostname.
//!
//! # Responsibilities
//! - Own the set of attached viewers
//! - Admit viewers according to the exclusive/shared policy
//! - Fan captured requests out to every attached viewer
//!
//! # Design Decisions
//! - Subscriber set is a mutex-protected map; the critical section only does
//!   `try_send`, which is bounded-time and never touches the network
//! - Holding the lock across the fan-out serializes broadcasts of one tenant,
//!   so every viewer observes the same order
//! - A viewer whose queue is full or closed is removed on the spot; dropping
//!   its handle is what tells the viewer task to close the transport

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};

use crate::catcher::request::CapturedRequest;
use crate::catcher::viewer::{AdmissionError, AdmissionPolicy, ViewerId};
use crate::observability::metrics;

/// Unit of fan-out, shared read-only by every viewer.
pub type Event = Arc<CapturedRequest>;

/// Tenant-side end of a viewer.
///
/// Dropping it closes the viewer's queue and fires its eviction signal.
#[derive(Debug)]
pub(crate) struct SubscriberHandle {
    pub(crate) queue: mpsc::Sender<Event>,
    pub(crate) _evict: oneshot::Sender<()>,
}

/// Outcome of one broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Delivery {
    /// Viewers the event was enqueued for.
    pub delivered: usize,
    /// Viewers dropped because their queue was full or closed.
    pub evicted: usize,
}

#[derive(Debug)]
pub struct Tenant {
    host: String,
    subscribers: Mutex<HashMap<ViewerId, SubscriberHandle>>,
}

impl Tenant {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            subscribers: Mutex::new(HashMap::new()),
        }
    }

    /// Normalized hostname identifying this tenant.
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ViewerId, SubscriberHandle>> {
        // Nothing in the critical sections can leave the map half-updated.
        self.subscribers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a viewer. Occupancy check and insert happen under one lock.
    pub(crate) fn add_subscriber(
        &self,
        id: ViewerId,
        handle: SubscriberHandle,
        policy: AdmissionPolicy,
    ) -> Result<(), AdmissionError> {
        let mut subscribers = self.lock();
        if policy == AdmissionPolicy::Exclusive && !subscribers.is_empty() {
            return Err(AdmissionError::Occupied {
                host: self.host.clone(),
            });
        }
        subscribers.insert(id, handle);
        tracing::debug!(
            host = %self.host,
            viewer = %id,
            subscribers = subscribers.len(),
            "Viewer attached"
        );
        Ok(())
    }

    /// Detach a viewer. Returns false if it was not attached.
    pub fn remove_subscriber(&self, id: ViewerId) -> bool {
        let removed = self.lock().remove(&id).is_some();
        if removed {
            tracing::debug!(host = %self.host, viewer = %id, "Viewer detached");
        }
        removed
    }

    /// Enqueue `event` for every viewer attached right now.
    ///
    /// Never waits on a viewer. Full or closed queues get their viewer evicted.
    pub fn broadcast(&self, event: Event) -> Delivery {
        let mut delivery = Delivery::default();
        let mut subscribers = self.lock();
        if subscribers.is_empty() {
            return delivery;
        }

        subscribers.retain(|id, handle| match handle.queue.try_send(Arc::clone(&event)) {
            Ok(()) => {
                delivery.delivered += 1;
                true
            }
            Err(TrySendError::Full(_)) => {
                tracing::warn!(host = %self.host, viewer = %id, "Viewer queue full, disconnecting");
                metrics::record_viewer_evicted("queue_full");
                delivery.evicted += 1;
                false
            }
            Err(TrySendError::Closed(_)) => {
                tracing::debug!(host = %self.host, viewer = %id, "Viewer queue closed, removing");
                metrics::record_viewer_evicted("closed");
                delivery.evicted += 1;
                false
            }
        });
        drop(subscribers);

        metrics::record_events_delivered(delivery.delivered);
        delivery
    }
}
