//! Periodic expiry sweep for [`TtlKeySetStore`]
//!
//! One background task wakes every `cleanup_interval` and evicts every key
//! whose deadline has passed. A key may therefore outlive its nominal deadline
//! by up to one interval; reads already treat such keys as absent.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::store::ttl_store::TtlKeySetStore;

pub struct Reaper {
    store: TtlKeySetStore,
    interval: Duration,
}

impl Reaper {
    /// Creates a reaper using the store's configured cleanup interval
    pub fn new(store: TtlKeySetStore) -> Self {
        let interval = store.config().cleanup_interval;
        Self { store, interval }
    }

    pub fn with_interval(store: TtlKeySetStore, interval: Duration) -> Self {
        Self { store, interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Runs a single sweep and returns the number of evicted keys
    pub fn run_once(&self) -> usize {
        let evicted = self.store.sweep_expired();
        if evicted > 0 {
            debug!(
                evicted = evicted,
                remaining = self.store.len(),
                "Expiry sweep evicted keys"
            );
        }
        evicted
    }

    /// Spawns the sweep loop. Must be called from within a Tokio runtime.
    pub fn start(self) -> ReaperHandle {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        // interval() panics on a zero period
        let period = self.interval.max(Duration::from_millis(1));

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            info!(interval_ms = period.as_millis() as u64, "Expiry reaper started");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        self.run_once();
                    }
                    _ = shutdown_rx.recv() => {
                        info!("Expiry reaper received shutdown signal, stopping");
                        break;
                    }
                }
            }
        });

        ReaperHandle {
            handle,
            shutdown_tx,
        }
    }
}

/// Running reaper task
pub struct ReaperHandle {
    handle: JoinHandle<()>,
    shutdown_tx: mpsc::Sender<()>,
}

impl ReaperHandle {
    /// Signals the task to stop and waits for it to finish
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        if let Err(e) = self.handle.await {
            tracing::error!("Expiry reaper task failed: {}", e);
        }
    }
}

impl TtlKeySetStore {
    /// Starts a reaper for this store on its configured interval
    pub fn start_reaper(&self) -> ReaperHandle {
        Reaper::new(self.clone()).start()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::types::StoreConfig;
    use tokio::time::sleep;

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    fn store_with_interval(millis: u64) -> TtlKeySetStore {
        TtlKeySetStore::with_config(StoreConfig::default().with_cleanup_interval(ms(millis)))
    }

    #[tokio::test(start_paused = true)]
    async fn test_reaper_evicts_after_tick() {
        let store = store_with_interval(5000);
        let reaper = store.start_reaper();

        store.add_to_set_with_ttl("iv1", "t1", ms(3000));

        sleep(ms(2000)).await;
        assert_eq!(store.get_set("iv1"), vec!["t1"]);

        // Past the 5000ms tick
        sleep(ms(3010)).await;
        assert!(store.get_set("iv1").is_empty());
        assert_eq!(store.len(), 0);
        assert_eq!(store.scheduled_len(), 0);

        reaper.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_reaper_staleness_bounded_by_interval() {
        let store = store_with_interval(5000);
        let reaper = store.start_reaper();

        store.add_to_set_with_ttl("k", "v", ms(3000));

        // Deadline passed but the next tick has not fired: payload still held
        sleep(ms(4000)).await;
        assert_eq!(store.len(), 1);
        assert!(!store.has("k", "v"));

        sleep(ms(1010)).await;
        assert_eq!(store.len(), 0);

        reaper.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_reaper_leaves_cleared_and_pinned_keys_alone() {
        let store = store_with_interval(100);
        let reaper = store.start_reaper();

        store.add_to_set_with_ttl("pinned", "v", Duration::ZERO);
        store.add_to_set_with_ttl("cleared", "v", ms(50));
        store.clear("cleared");

        sleep(ms(1000)).await;
        assert!(store.has("pinned", "v"));
        assert!(!store.has("cleared", "v"));
        assert_eq!(store.len(), 1);

        reaper.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_once_counts_evictions() {
        let store = store_with_interval(5000);
        let reaper = Reaper::new(store.clone());
        assert_eq!(reaper.interval(), ms(5000));

        store.add_to_number_with_ttl("a", 1, ms(10));
        store.add_to_number_with_ttl("b", 1, ms(10));

        tokio::time::advance(ms(10)).await;
        assert_eq!(reaper.run_once(), 2);
        assert_eq!(reaper.run_once(), 0);
    }

    #[tokio::test]
    async fn test_reaper_shutdown_completes() {
        let store = TtlKeySetStore::new();
        let reaper = Reaper::with_interval(store, ms(10)).start();

        tokio::time::sleep(ms(50)).await;

        let result = tokio::time::timeout(Duration::from_secs(5), reaper.shutdown()).await;
        assert!(result.is_ok(), "Reaper should stop within timeout");
    }
}
