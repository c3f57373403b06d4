//! Synchronous in-process publish/subscribe for store changes.

use crate::models::Analysis;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use tracing::{debug, warn};

/// A change published by the store after a mutation commits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    AnalysisAdded(Analysis),
    AnalysisUpdated(Analysis),
    /// Emitted even if no record matched the id.
    AnalysisRemoved(String),
    AnalysesCleared,
    SessionChanged(Option<Analysis>),
    SidebarToggled(bool),
}

impl StoreEvent {
    /// Event name as seen by dashboard components.
    pub fn name(&self) -> &'static str {
        match self {
            StoreEvent::AnalysisAdded(_) => "analysisAdded",
            StoreEvent::AnalysisUpdated(_) => "analysisUpdated",
            StoreEvent::AnalysisRemoved(_) => "analysisRemoved",
            StoreEvent::AnalysesCleared => "analysesCleared",
            StoreEvent::SessionChanged(_) => "sessionChanged",
            StoreEvent::SidebarToggled(_) => "sidebarToggled",
        }
    }
}

type Callback = Arc<dyn Fn(&StoreEvent) -> anyhow::Result<()> + Send + Sync>;

#[derive(Default)]
struct BusInner {
    next_id: AtomicU64,
    listeners: Mutex<Vec<(u64, Callback)>>,
}

impl BusInner {
    fn remove(&self, id: u64) {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|(listener_id, _)| *listener_id != id);
    }
}

/// Ordered list of subscriber callbacks.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback. It stays registered until the returned
    /// subscription is explicitly unsubscribed.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&StoreEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(callback)));
        debug!("Registered state listener {}", id);

        Subscription {
            id,
            bus: Arc::downgrade(&self.inner),
        }
    }

    /// Invoke every registered callback in registration order.
    ///
    /// The listener list is snapshotted first, so callbacks may mutate the
    /// store or (un)subscribe. A failing or panicking callback is logged and
    /// skipped.
    pub fn notify(&self, event: &StoreEvent) {
        let listeners: Vec<(u64, Callback)> = self
            .inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        for (id, callback) in listeners {
            match catch_unwind(AssertUnwindSafe(|| callback(event))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!("State listener {} failed on {}: {:#}", id, event.name(), e),
                Err(_) => warn!("State listener {} panicked on {}", id, event.name()),
            }
        }
    }
}

/// Capability to remove one registered callback.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    bus: Weak<BusInner>,
}

impl Subscription {
    /// Remove the callback. Calling this more than once is harmless.
    pub fn unsubscribe(&self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.remove(self.id);
        }
    }
}
