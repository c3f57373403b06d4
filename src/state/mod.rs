//! Analysis queue state.
//!
//! `AnalysisStore` is the single source of truth for the analysis queue, the
//! current-session pointer and the sidebar preference. Every mutation is
//! persisted in full and then published to subscribers on the calling thread.

pub mod events;
pub mod simulation;
pub mod storage;

pub use events::{EventBus, StoreEvent, Subscription};
pub use simulation::{SimulationHandle, DEFAULT_SIMULATION, TICK_INTERVAL};
pub use storage::{FileStorage, MemoryStorage, StateStorage, DEFAULT_STORAGE_KEY};

use crate::clock::Clock;
use crate::display;
use crate::models::{
    clamp_progress, Aggregate, Analysis, AnalysisStatus, StatusInfo, Timestamp, MAX_ANALYSES,
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// Persisted analysis queue with change notifications.
pub struct AnalysisStore {
    state: Mutex<Aggregate>,
    storage: Arc<dyn StateStorage>,
    storage_key: String,
    bus: EventBus,
    clock: Arc<dyn Clock>,
}

impl AnalysisStore {
    /// Open the store under the default storage key.
    pub fn open(storage: Arc<dyn StateStorage>, clock: Arc<dyn Clock>) -> Self {
        Self::open_with_key(storage, DEFAULT_STORAGE_KEY, clock)
    }

    /// Open the store, restoring the aggregate stored under `key` or falling
    /// back to the demo seed.
    pub fn open_with_key(storage: Arc<dyn StateStorage>, key: &str, clock: Arc<dyn Clock>) -> Self {
        let state = Self::initialize(storage.as_ref(), key, clock.as_ref());
        info!(
            "Analytics state ready: {} analyses, session {:?}",
            state.analyses.len(),
            state.current_session
        );

        Self {
            state: Mutex::new(state),
            storage,
            storage_key: key.to_string(),
            bus: EventBus::new(),
            clock,
        }
    }

    /// Read the persisted aggregate, or build the seed when it is missing or
    /// unusable.
    pub fn initialize(storage: &dyn StateStorage, key: &str, clock: &dyn Clock) -> Aggregate {
        let now = clock.now();
        match storage.read(key) {
            Ok(Some(blob)) => Aggregate::decode_lenient(&blob, now).unwrap_or_else(|| {
                warn!("Stored analytics state unusable, starting from demo data");
                Aggregate::seed(now)
            }),
            Ok(None) => {
                debug!("No stored analytics state under {}, using demo data", key);
                Aggregate::seed(now)
            }
            Err(e) => {
                warn!("Failed to load analytics state: {}", e);
                Aggregate::seed(now)
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Aggregate> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Write the whole aggregate. Failures are logged and the in-memory
    /// state is kept as is.
    fn persist(&self, state: &mut Aggregate) {
        state.last_updated = self.clock.now();
        let result = serde_json::to_string(&*state)
            .map_err(crate::error::StorageError::from)
            .and_then(|blob| self.storage.write(&self.storage_key, &blob));

        match result {
            Ok(()) => debug!("Persisted analytics state ({} analyses)", state.analyses.len()),
            Err(e) => warn!("Failed to save analytics state: {}", e),
        }
    }

    /// Register a change listener.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&StoreEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.bus.subscribe(callback)
    }

    /// Queue a new pending analysis and make it the current session.
    /// Returns the new id.
    pub fn add_analysis(
        &self,
        indication: &str,
        indication_display_name: &str,
        analysis_type: &str,
        analysis_display_name: &str,
    ) -> String {
        let analysis = Analysis::new(
            indication,
            indication_display_name,
            analysis_type,
            analysis_display_name,
            self.clock.now(),
        );
        let id = analysis.id.clone();

        {
            let mut state = self.lock();
            state.analyses.insert(0, analysis.clone());
            state.analyses.truncate(MAX_ANALYSES);
            state.current_session = Some(id.clone());
            self.persist(&mut state);
        }

        info!("Added analysis {} ({})", id, analysis.title);
        self.bus.notify(&StoreEvent::AnalysisAdded(analysis));
        id
    }

    /// Set the status and, when given, the progress of an analysis.
    /// Unknown ids are ignored.
    pub fn update_analysis_status(
        &self,
        id: &str,
        status: impl Into<AnalysisStatus>,
        progress: Option<u8>,
    ) {
        let status = status.into();
        let updated = {
            let mut state = self.lock();
            let now = self.clock.now();
            let Some(analysis) = state.analyses.iter_mut().find(|a| a.id == id) else {
                debug!("Ignoring status update for unknown analysis {}", id);
                return;
            };

            analysis.status = status;
            if let Some(progress) = progress {
                analysis.progress = Some(clamp_progress(progress));
            }
            analysis.last_updated = Some(now);
            let updated = analysis.clone();

            self.persist(&mut state);
            updated
        };

        debug!(
            "Analysis {} now {} ({:?}%)",
            updated.id, updated.status, updated.progress
        );
        self.bus.notify(&StoreEvent::AnalysisUpdated(updated));
    }

    /// Copy of the queue, most recent first.
    pub fn analyses(&self) -> Vec<Analysis> {
        self.lock().analyses.clone()
    }

    /// The analysis the current session points at, if it still exists.
    pub fn current_analysis(&self) -> Option<Analysis> {
        let state = self.lock();
        Self::resolve_current(&state)
    }

    fn resolve_current(state: &Aggregate) -> Option<Analysis> {
        let current = state.current_session.as_deref()?;
        state.analyses.iter().find(|a| a.id == current).cloned()
    }

    pub fn current_session(&self) -> Option<String> {
        self.lock().current_session.clone()
    }

    /// Point the current session at `id` without checking that it exists.
    pub fn set_current_session(&self, id: Option<&str>) {
        let current = {
            let mut state = self.lock();
            state.current_session = id.map(str::to_string);
            self.persist(&mut state);
            Self::resolve_current(&state)
        };

        self.bus.notify(&StoreEvent::SessionChanged(current));
    }

    pub fn analysis_by_id(&self, id: &str) -> Option<Analysis> {
        self.lock().analyses.iter().find(|a| a.id == id).cloned()
    }

    /// Drop an analysis, clearing the current session if it pointed there.
    pub fn remove_analysis(&self, id: &str) {
        {
            let mut state = self.lock();
            let before = state.analyses.len();
            state.analyses.retain(|a| a.id != id);
            if state.current_session.as_deref() == Some(id) {
                state.current_session = None;
            }
            if state.analyses.len() < before {
                info!("Removed analysis {}", id);
            }
            self.persist(&mut state);
        }

        self.bus.notify(&StoreEvent::AnalysisRemoved(id.to_string()));
    }

    pub fn clear_analyses(&self) {
        {
            let mut state = self.lock();
            state.analyses.clear();
            state.current_session = None;
            self.persist(&mut state);
        }

        info!("Cleared all analyses");
        self.bus.notify(&StoreEvent::AnalysesCleared);
    }

    pub fn set_sidebar_collapsed(&self, collapsed: bool) {
        {
            let mut state = self.lock();
            state.sidebar_collapsed = collapsed;
            self.persist(&mut state);
        }

        self.bus.notify(&StoreEvent::SidebarToggled(collapsed));
    }

    pub fn is_sidebar_collapsed(&self) -> bool {
        self.lock().sidebar_collapsed
    }

    /// Relative ("5 min ago") or absolute rendering of `timestamp`.
    pub fn format_timestamp(&self, timestamp: Timestamp) -> String {
        display::format_timestamp(timestamp, self.clock.now())
    }

    pub fn status_info(&self, status: &str) -> &'static StatusInfo {
        StatusInfo::for_status(status)
    }

    /// Copy of the whole aggregate.
    pub fn snapshot(&self) -> Aggregate {
        self.lock().clone()
    }
}
