//! Demo progress simulation for queued analyses.

use super::AnalysisStore;
use crate::models::AnalysisStatus;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tracing::debug;

/// Time between simulated progress updates.
pub const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Default length of a simulated run.
pub const DEFAULT_SIMULATION: Duration = Duration::from_millis(5000);

/// Handle to a running simulation. Dropping it does not stop the run.
#[derive(Debug)]
pub struct SimulationHandle {
    task: JoinHandle<()>,
}

impl SimulationHandle {
    /// Stop before the next tick. Ticks already applied stay applied.
    pub fn stop(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait until the run completes or is stopped.
    pub async fn finished(self) {
        if let Err(e) = self.task.await {
            if !e.is_cancelled() {
                tracing::warn!("Progress simulation task failed: {}", e);
            }
        }
    }
}

impl AnalysisStore {
    /// Drive an analysis from 0 to 100% over roughly `duration`.
    ///
    /// The analysis is marked running immediately, then advanced every
    /// [`TICK_INTERVAL`] through [`AnalysisStore::update_analysis_status`],
    /// so each tick persists and notifies. At 100% it is marked completed.
    ///
    /// # Panics
    ///
    /// Must be called from within a Tokio runtime.
    pub fn simulate_analysis_progress(self: &Arc<Self>, id: &str, duration: Duration) -> SimulationHandle {
        let ticks = duration.as_secs_f64() / TICK_INTERVAL.as_secs_f64();
        let increment = if ticks > 0.0 { 100.0 / ticks } else { 100.0 };

        self.update_analysis_status(id, AnalysisStatus::Running, Some(0));

        let store = Arc::clone(self);
        let id = id.to_string();
        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + TICK_INTERVAL, TICK_INTERVAL);
            let mut progress = 0.0_f64;

            loop {
                ticker.tick().await;
                progress += increment;

                if progress >= 100.0 {
                    store.update_analysis_status(&id, AnalysisStatus::Completed, Some(100));
                    debug!("Simulation for {} finished", id);
                    break;
                }
                store.update_analysis_status(&id, AnalysisStatus::Running, Some(progress.floor() as u8));
            }
        });

        SimulationHandle { task }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::state::{MemoryStorage, StoreEvent};
    use std::sync::Mutex;

    fn store() -> Arc<AnalysisStore> {
        Arc::new(AnalysisStore::open(
            Arc::new(MemoryStorage::new()),
            Arc::new(ManualClock::new(1_700_000_000_000)),
        ))
    }

    fn progress_log(store: &AnalysisStore) -> Arc<Mutex<Vec<(String, Option<u8>)>>> {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        let _ = store.subscribe(move |event| {
            if let StoreEvent::AnalysisUpdated(a) = event {
                sink.lock().unwrap().push((a.status.to_string(), a.progress));
            }
            Ok(())
        });
        log
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulation_runs_to_completion() {
        let store = store();
        let id = store.add_analysis("AML", "AML", "persistency", "Persistency");
        let log = progress_log(&store);

        let handle = store.simulate_analysis_progress(&id, Duration::from_millis(500));
        handle.finished().await;

        let log = log.lock().unwrap();
        let progress: Vec<Option<u8>> = log.iter().map(|(_, p)| *p).collect();
        assert_eq!(
            progress,
            vec![Some(0), Some(20), Some(40), Some(60), Some(80), Some(100)]
        );
        assert_eq!(log.last().unwrap().0, "completed");
        assert!(log[..5].iter().all(|(s, _)| s == "running"));

        let analysis = store.analysis_by_id(&id).unwrap();
        assert_eq!(analysis.status, AnalysisStatus::Completed);
        assert_eq!(analysis.progress, Some(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulation_can_be_stopped() {
        let store = store();
        let id = store.add_analysis("AML", "AML", "persistency", "Persistency");

        let handle = store.simulate_analysis_progress(&id, DEFAULT_SIMULATION);
        tokio::time::sleep(Duration::from_millis(350)).await;
        handle.stop();
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert!(handle.is_finished());
        let analysis = store.analysis_by_id(&id).unwrap();
        assert_eq!(analysis.status, AnalysisStatus::Running);
        assert_eq!(analysis.progress, Some(6));
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_duration_completes_on_first_tick() {
        let store = store();
        let id = store.add_analysis("AML", "AML", "persistency", "Persistency");
        let log = progress_log(&store);

        store
            .simulate_analysis_progress(&id, Duration::from_millis(20))
            .finished()
            .await;

        let log = log.lock().unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[1], ("completed".to_string(), Some(100)));
    }
}
