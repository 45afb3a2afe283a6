//! # Simulation Scheduler
//!
//! Owns the in-memory registry of running per-point simulations. Each entry
//! is a tokio task that wakes every tick interval (5 seconds by default),
//! re-reads its collection point and, while the point is still eligible,
//! persists a batch of one to three synthetic transactions.
//!
//! ## Lifecycle per point
//!
//! ```text
//!            start(id)                      stop(id) / stop_all()
//!  Stopped ───────────────► Running ──────────────────────────► Stopped
//!                              │
//!                              │ tick finds point missing, Inactive or disabled
//!                              └──────────────────────────────► Stopped
//! ```
//!
//! - The registry holds at most one entry per point id. Starting an id that
//!   is already registered returns `false` and changes nothing.
//! - Stopping signals the task through a watch channel and removes the entry
//!   at once. A tick that is already generating finishes its batch; no
//!   further tick starts after the signal. [`SimulationScheduler::stop_and_wait`]
//!   also waits for that batch.
//! - Ticks of one point never overlap: each task runs its ticks sequentially.
//! - Nothing in the registry is persisted. After a restart,
//!   [`SimulationScheduler::initialize`] rebuilds it from the store.
//!
//! The stored `simulation_enabled` flag and the registry are written in two
//! separate steps, so `status()` is eventually consistent with the store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::{watch, Mutex as AsyncMutex};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::domain::commands::simulation::{SchedulerSnapshot, ToggleOutcome};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::models::collection_point::CollectionPoint;
use crate::domain::transaction_generator;
use crate::storage::{CollectionPointStorage, TransactionStorage};

/// Interval between two ticks of a point's simulation
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(5);

/// A registered simulation task
struct SimulationEntry {
    /// Distinguishes successive runs of the same point id, so a retiring
    /// task never removes an entry created by a later `start`
    generation: u64,
    cancel: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

struct SchedulerInner {
    points: Arc<dyn CollectionPointStorage>,
    transactions: Arc<dyn TransactionStorage>,
    tick_interval: Duration,
    registry: Mutex<HashMap<String, SimulationEntry>>,
    next_generation: AtomicU64,
    initialized: AtomicBool,
    init_lock: AsyncMutex<()>,
}

/// Handle to the scheduler. Cloning is cheap and every clone shares the same
/// registry.
#[derive(Clone)]
pub struct SimulationScheduler {
    inner: Arc<SchedulerInner>,
}

impl SimulationScheduler {
    pub fn new(
        points: Arc<dyn CollectionPointStorage>,
        transactions: Arc<dyn TransactionStorage>,
        tick_interval: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                points,
                transactions,
                tick_interval,
                registry: Mutex::new(HashMap::new()),
                next_generation: AtomicU64::new(0),
                initialized: AtomicBool::new(false),
                init_lock: AsyncMutex::new(()),
            }),
        }
    }

    pub fn tick_interval(&self) -> Duration {
        self.inner.tick_interval
    }

    /// Resume simulations for every point that is Active with simulation
    /// enabled in the store. Only the first successful call does anything;
    /// later calls return `Ok(0)`.
    ///
    /// Each candidate is re-read before it is started. A point whose read
    /// fails, or which is no longer eligible, is logged and skipped.
    /// Returns the number of simulations resumed.
    pub async fn initialize(&self) -> DomainResult<usize> {
        let _guard = self.inner.init_lock.lock().await;
        if self.inner.initialized.load(Ordering::SeqCst) {
            debug!("Simulation scheduler already initialized");
            return Ok(0);
        }

        info!("Initializing simulation scheduler");
        let candidates = self.inner.points.find_eligible_for_simulation().await?;
        info!("Found {} collection points with simulation enabled", candidates.len());

        let mut resumed = 0;
        for candidate in &candidates {
            match self.inner.points.find_by_id(&candidate.id).await {
                Ok(Some(point)) if point.is_eligible_for_simulation() => {
                    if self.start(&point.id) {
                        resumed += 1;
                    }
                }
                Ok(Some(_)) | Ok(None) => {
                    warn!("Skipping recovery for {}: no longer eligible", candidate.id);
                }
                Err(e) => {
                    error!("Skipping recovery for {}: {:#}", candidate.id, e);
                }
            }
        }

        self.inner.initialized.store(true, Ordering::SeqCst);
        info!(
            "Simulation scheduler initialized: resumed {} of {} simulations",
            resumed,
            candidates.len()
        );
        Ok(resumed)
    }

    /// Register and spawn the periodic task for `point_id`.
    /// Returns `false` if the point already has a running simulation.
    ///
    /// Callers are expected to have validated the point and persisted
    /// `simulation_enabled = true` beforehand.
    pub fn start(&self, point_id: &str) -> bool {
        let mut registry = self.inner.registry();
        if registry.contains_key(point_id) {
            warn!("Simulation already running for {}", point_id);
            return false;
        }

        let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);
        let (cancel, cancelled) = watch::channel(false);
        let handle = tokio::spawn(run_simulation(
            Arc::downgrade(&self.inner),
            point_id.to_string(),
            generation,
            cancelled,
            self.inner.tick_interval,
        ));

        registry.insert(
            point_id.to_string(),
            SimulationEntry {
                generation,
                cancel,
                handle,
            },
        );
        info!(
            "Started simulation for {} (every {}s)",
            point_id,
            self.inner.tick_interval.as_secs_f64()
        );
        true
    }

    /// Cancel the task for `point_id` and remove its entry.
    /// Returns `false` if no simulation was running.
    pub fn stop(&self, point_id: &str) -> bool {
        let entry = self.inner.registry().remove(point_id);
        match entry {
            Some(entry) => {
                // The receiver may already be gone if the task retired itself
                let _ = entry.cancel.send(true);
                info!("Stopped simulation for {}", point_id);
                true
            }
            None => {
                warn!("No active simulation found for {}", point_id);
                false
            }
        }
    }

    /// Like [`stop`](Self::stop), then wait for the task to exit. A tick
    /// that was already writing has finished by the time this returns.
    pub async fn stop_and_wait(&self, point_id: &str) -> bool {
        let entry = self.inner.registry().remove(point_id);
        let Some(entry) = entry else {
            debug!("No active simulation found for {}", point_id);
            return false;
        };

        let _ = entry.cancel.send(true);
        if let Err(e) = entry.handle.await {
            error!("Simulation task for {} ended abnormally: {}", point_id, e);
        }
        info!("Stopped simulation for {}", point_id);
        true
    }

    /// Flip the stored `simulation_enabled` flag of `point_id` and start or
    /// stop its task to match.
    pub async fn toggle(&self, point_id: &str) -> DomainResult<ToggleOutcome> {
        let point = self
            .inner
            .points
            .find_by_id(point_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(point_id.to_string()))?;

        let enable = !point.simulation_enabled;
        self.inner
            .points
            .set_simulation_enabled(point_id, enable)
            .await?
            .ok_or_else(|| DomainError::NotFound(point_id.to_string()))?;

        let message = if enable {
            if self.start(point_id) {
                format!("Simulation started for {}", point_id)
            } else {
                format!("Simulation already running for {}", point_id)
            }
        } else if self.stop(point_id) {
            format!("Simulation stopped for {}", point_id)
        } else {
            format!("Simulation was not running for {}", point_id)
        };

        Ok(ToggleOutcome {
            active: enable,
            message,
        })
    }

    /// Cancel every registered task and clear the registry.
    /// Returns how many simulations were stopped.
    pub fn stop_all(&self) -> usize {
        let entries = self.drain();
        if !entries.is_empty() {
            info!("Stopped {} simulations", entries.len());
        }
        entries.len()
    }

    /// Like [`stop_all`](Self::stop_all), then wait until every task has
    /// exited, so no tick outlives the store it writes to.
    pub async fn shutdown(&self) -> usize {
        let entries = self.drain();
        let count = entries.len();
        info!("Shutting down simulation scheduler ({} running)", count);

        for (point_id, entry) in entries {
            if let Err(e) = entry.handle.await {
                error!("Simulation task for {} ended abnormally: {}", point_id, e);
            }
        }
        count
    }

    /// Snapshot of the registry. Read-only.
    pub fn status(&self) -> SchedulerSnapshot {
        let mut running_ids: Vec<String> = self.inner.registry().keys().cloned().collect();
        running_ids.sort();

        SchedulerSnapshot {
            active_count: running_ids.len(),
            running_ids,
            initialized: self.inner.initialized.load(Ordering::SeqCst),
        }
    }

    pub fn is_running(&self, point_id: &str) -> bool {
        self.inner.registry().contains_key(point_id)
    }

    /// Remove every entry and signal its task.
    fn drain(&self) -> Vec<(String, SimulationEntry)> {
        let entries: Vec<(String, SimulationEntry)> = self.inner.registry().drain().collect();
        for (_, entry) in &entries {
            let _ = entry.cancel.send(true);
        }
        entries
    }
}

impl SchedulerInner {
    fn registry(&self) -> MutexGuard<'_, HashMap<String, SimulationEntry>> {
        // No code path panics while holding the lock; recover the map if one ever does
        self.registry.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Run one tick for `point_id`. Returns `false` once the task should exit.
    async fn run_tick(&self, point_id: &str, generation: u64) -> bool {
        let point = match self.points.find_by_id(point_id).await {
            Ok(Some(point)) => point,
            Ok(None) => {
                warn!("Collection point {} no longer exists, stopping its simulation", point_id);
                self.retire(point_id, generation, None).await;
                return false;
            }
            Err(e) => {
                error!("Failed to load collection point {}, skipping tick: {:#}", point_id, e);
                return true;
            }
        };

        if !point.is_eligible_for_simulation() {
            warn!(
                "Collection point {} is {} with simulation {}, stopping its simulation",
                point_id,
                point.status.as_str(),
                if point.simulation_enabled { "enabled" } else { "disabled" }
            );
            self.retire(point_id, generation, Some(&point)).await;
            return false;
        }

        let batch = {
            let mut rng = StdRng::from_entropy();
            transaction_generator::generate_batch(&point, &mut rng, Utc::now())
        };

        // Each record is written on its own; one failure does not undo the others
        let mut persisted = 0;
        for transaction in &batch {
            match self.transactions.create_transaction(transaction).await {
                Ok(_) => persisted += 1,
                Err(e) => error!(
                    "Failed to persist simulated transaction {} for {}: {:#}",
                    transaction.id, point_id, e
                ),
            }
        }

        info!("Generated {} of {} transactions for {}", persisted, batch.len(), point_id);
        true
    }

    /// Remove the entry of a task that found its point ineligible.
    ///
    /// When the point still exists with its flag set (it went Inactive
    /// without the flag being cleared), the flag is cleared as well so the
    /// store matches the registry.
    async fn retire(&self, point_id: &str, generation: u64, point: Option<&CollectionPoint>) {
        let removed = {
            let mut registry = self.registry();
            let owned = registry.get(point_id).map(|entry| entry.generation) == Some(generation);
            if owned {
                registry.remove(point_id);
            }
            owned
        };

        if !removed {
            return;
        }
        info!("Simulation for {} stopped itself", point_id);

        if let Some(point) = point.filter(|p| p.simulation_enabled) {
            if let Err(e) = self.points.set_simulation_enabled(&point.id, false).await {
                error!("Failed to clear simulation flag for {}: {:#}", point.id, e);
            }
        }
    }
}

/// Body of a per-point task: wait for the next tick or a cancel signal,
/// whichever comes first, and run ticks until told to stop.
async fn run_simulation(
    inner: Weak<SchedulerInner>,
    point_id: String,
    generation: u64,
    mut cancelled: watch::Receiver<bool>,
    tick_interval: Duration,
) {
    let mut ticker = interval_at(Instant::now() + tick_interval, tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            // Fires on an explicit stop and when the entry (and its sender) is dropped
            _ = cancelled.changed() => break,
            _ = ticker.tick() => {}
        }

        let Some(scheduler) = inner.upgrade() else {
            break;
        };
        if !scheduler.run_tick(&point_id, generation).await {
            break;
        }
    }

    debug!("Simulation task for {} exited", point_id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::commands::transactions::TransactionQuery;
    use crate::domain::models::collection_point::test_support::point;
    use crate::domain::models::collection_point::PointStatus;
    use crate::domain::models::transaction::Transaction;
    use crate::storage::MemoryStore;
    use std::collections::HashSet;
    use tokio::time::sleep;

    fn setup_test() -> (Arc<MemoryStore>, SimulationScheduler) {
        let store = Arc::new(MemoryStore::new());
        let scheduler = SimulationScheduler::new(store.clone(), store.clone(), DEFAULT_TICK_INTERVAL);
        (store, scheduler)
    }

    async fn add_point(store: &MemoryStore, id: &str, enabled: bool, status: PointStatus) {
        let mut p = point(id);
        p.simulation_enabled = enabled;
        p.status = status;
        store.store_point(&p).await.expect("Failed to store point");
    }

    async fn transaction_count(store: &MemoryStore, point_id: &str) -> u64 {
        store
            .count_transactions(&TransactionQuery::for_point(point_id))
            .await
            .expect("Failed to count transactions")
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_twice_keeps_single_entry() {
        let (store, scheduler) = setup_test();
        add_point(&store, "Q1AAA", true, PointStatus::Active).await;

        assert!(scheduler.start("Q1AAA"));
        assert!(!scheduler.start("Q1AAA"));

        let status = scheduler.status();
        assert_eq!(status.active_count, 1);
        assert_eq!(status.running_ids, vec!["Q1AAA".to_string()]);
        scheduler.stop_all();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_starts_register_once() {
        let (store, scheduler) = setup_test();
        add_point(&store, "RACE1", true, PointStatus::Active).await;

        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..16 {
            let scheduler = scheduler.clone();
            tasks.spawn(async move { scheduler.start("RACE1") });
        }

        let mut successes = 0;
        while let Some(result) = tasks.join_next().await {
            if result.expect("start task panicked") {
                successes += 1;
            }
        }

        assert_eq!(successes, 1);
        assert_eq!(scheduler.status().active_count, 1);
        scheduler.stop_all();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_when_not_running() {
        let (_store, scheduler) = setup_test();
        assert!(!scheduler.stop("NOPE1"));

        assert!(scheduler.start("NOPE1"));
        assert!(scheduler.stop("NOPE1"));
        assert!(!scheduler.stop("NOPE1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_generate_transactions_every_interval() {
        let (store, scheduler) = setup_test();
        let mut p = point("Q1AAA");
        p.simulation_enabled = true;
        p.max_amount = Some(1000.0);
        store.store_point(&p).await.unwrap();

        assert!(scheduler.start("Q1AAA"));
        sleep(Duration::from_secs(12)).await;

        // Ticks at 5s and 10s, each producing 1 to 3 transactions
        let transactions = store
            .list_transactions(&TransactionQuery::for_point("Q1AAA"))
            .await
            .unwrap();
        assert!(
            (2..=6).contains(&transactions.len()),
            "unexpected transaction count {}",
            transactions.len()
        );

        let references: HashSet<&str> = transactions.iter().map(|t| t.reference.as_str()).collect();
        assert_eq!(references.len(), transactions.len());
        for tx in &transactions {
            assert!(Transaction::is_valid_reference(&tx.reference));
            assert!(tx.amount >= 10.0 && tx.amount <= 1000.0);
        }

        scheduler.stop_all();
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_generation_after_stop() {
        let (store, scheduler) = setup_test();
        add_point(&store, "STOP1", true, PointStatus::Active).await;

        scheduler.start("STOP1");
        sleep(Duration::from_secs(6)).await;
        let before = transaction_count(&store, "STOP1").await;
        assert!(before >= 1);

        assert!(scheduler.stop("STOP1"));
        sleep(Duration::from_secs(30)).await;

        assert_eq!(transaction_count(&store, "STOP1").await, before);
        assert!(!scheduler.is_running("STOP1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_self_terminates_when_point_goes_inactive() {
        let (store, scheduler) = setup_test();
        add_point(&store, "SELF1", true, PointStatus::Active).await;

        scheduler.start("SELF1");
        sleep(Duration::from_secs(6)).await;
        let before = transaction_count(&store, "SELF1").await;
        assert!(before >= 1);

        store.set_status("SELF1", PointStatus::Inactive).await.unwrap();
        sleep(Duration::from_secs(5)).await;

        assert_eq!(transaction_count(&store, "SELF1").await, before);
        assert!(!scheduler.status().running_ids.contains(&"SELF1".to_string()));

        // A later start is allowed again
        assert!(scheduler.start("SELF1"));
        scheduler.stop_all();
    }

    #[tokio::test(start_paused = true)]
    async fn test_self_terminates_when_flag_cleared_or_point_deleted() {
        let (store, scheduler) = setup_test();
        add_point(&store, "FLAG1", true, PointStatus::Active).await;
        add_point(&store, "GONE1", true, PointStatus::Active).await;

        scheduler.start("FLAG1");
        scheduler.start("GONE1");

        store.set_simulation_enabled("FLAG1", false).await.unwrap();
        store.delete_point("GONE1").await.unwrap();
        sleep(Duration::from_secs(6)).await;

        assert_eq!(scheduler.status().active_count, 0);
        assert_eq!(transaction_count(&store, "FLAG1").await, 0);
        assert_eq!(transaction_count(&store, "GONE1").await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_write_failures_keep_task_alive() {
        let (store, scheduler) = setup_test();
        add_point(&store, "FAIL1", true, PointStatus::Active).await;
        store.set_fail_transaction_writes(true);

        scheduler.start("FAIL1");
        sleep(Duration::from_secs(11)).await;
        assert_eq!(transaction_count(&store, "FAIL1").await, 0);
        assert!(scheduler.is_running("FAIL1"));

        store.set_fail_transaction_writes(false);
        sleep(Duration::from_secs(5)).await;
        assert!(transaction_count(&store, "FAIL1").await >= 1);
        scheduler.stop_all();
    }

    #[tokio::test(start_paused = true)]
    async fn test_initialize_resumes_only_eligible_points() {
        let (store, scheduler) = setup_test();
        add_point(&store, "AAAAA", true, PointStatus::Active).await;
        add_point(&store, "BBBBB", true, PointStatus::Inactive).await;
        add_point(&store, "CCCCC", false, PointStatus::Active).await;

        assert!(!scheduler.status().initialized);
        let resumed = scheduler.initialize().await.expect("initialize failed");
        assert_eq!(resumed, 1);

        let status = scheduler.status();
        assert!(status.initialized);
        assert_eq!(status.running_ids, vec!["AAAAA".to_string()]);

        // Second call is a no-op
        assert_eq!(scheduler.initialize().await.unwrap(), 0);
        assert_eq!(scheduler.status().active_count, 1);
        scheduler.stop_all();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_all_is_idempotent() {
        let (store, scheduler) = setup_test();
        add_point(&store, "AAAAA", true, PointStatus::Active).await;
        add_point(&store, "BBBBB", true, PointStatus::Active).await;
        scheduler.start("AAAAA");
        scheduler.start("BBBBB");

        assert_eq!(scheduler.stop_all(), 2);
        assert_eq!(scheduler.stop_all(), 0);
        assert_eq!(scheduler.status().active_count, 0);

        sleep(Duration::from_secs(10)).await;
        assert_eq!(store.count_transactions(&TransactionQuery::default()).await.unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_toggle_twice_returns_to_stopped() {
        let (store, scheduler) = setup_test();
        add_point(&store, "Q2AAA", false, PointStatus::Active).await;

        let first = scheduler.toggle("Q2AAA").await.expect("toggle failed");
        assert!(first.active);
        assert_eq!(first.message, "Simulation started for Q2AAA");
        assert!(scheduler.is_running("Q2AAA"));
        assert!(store.find_by_id("Q2AAA").await.unwrap().unwrap().simulation_enabled);

        let second = scheduler.toggle("Q2AAA").await.expect("toggle failed");
        assert!(!second.active);
        assert_eq!(scheduler.status().active_count, 0);
        assert!(!store.find_by_id("Q2AAA").await.unwrap().unwrap().simulation_enabled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_toggle_missing_point_is_not_found() {
        let (_store, scheduler) = setup_test();
        let result = scheduler.toggle("ZZZZZ").await;
        assert!(matches!(result, Err(DomainError::NotFound(id)) if id == "ZZZZZ"));
        assert_eq!(scheduler.status().active_count, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_toggle_reports_what_the_registry_did() {
        let (store, scheduler) = setup_test();
        add_point(&store, "Q3AAA", false, PointStatus::Active).await;

        // Registered while the stored flag is still off
        assert!(scheduler.start("Q3AAA"));
        let enabled = scheduler.toggle("Q3AAA").await.expect("toggle failed");
        assert!(enabled.active);
        assert_eq!(enabled.message, "Simulation already running for Q3AAA");
        assert_eq!(scheduler.status().active_count, 1);

        // Stored flag on, but nothing registered
        assert!(scheduler.stop("Q3AAA"));
        let disabled = scheduler.toggle("Q3AAA").await.expect("toggle failed");
        assert!(!disabled.active);
        assert_eq!(disabled.message, "Simulation was not running for Q3AAA");
        assert!(!store.find_by_id("Q3AAA").await.unwrap().unwrap().simulation_enabled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retiring_task_clears_stale_flag_on_inactive_point() {
        let (store, scheduler) = setup_test();
        add_point(&store, "STALE", true, PointStatus::Active).await;
        assert!(scheduler.start("STALE"));

        // Inactive with the flag still set, as a store without the
        // status invariant could leave it
        let mut stale = point("STALE");
        stale.status = PointStatus::Inactive;
        stale.simulation_enabled = true;
        store.put_point_unchecked(stale).await;

        sleep(Duration::from_secs(6)).await;

        assert!(!scheduler.is_running("STALE"));
        assert_eq!(transaction_count(&store, "STALE").await, 0);
        let stored = store.find_by_id("STALE").await.unwrap().unwrap();
        assert_eq!(stored.status, PointStatus::Inactive);
        assert!(!stored.simulation_enabled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_initialize_skips_point_whose_read_fails() {
        let (store, scheduler) = setup_test();
        add_point(&store, "AAAAA", true, PointStatus::Active).await;
        add_point(&store, "BBBBB", true, PointStatus::Active).await;
        store.set_fail_point_reads("AAAAA", true);

        let resumed = scheduler.initialize().await.expect("initialize failed");
        assert_eq!(resumed, 1);

        let status = scheduler.status();
        assert!(status.initialized);
        assert_eq!(status.running_ids, vec!["BBBBB".to_string()]);
        scheduler.stop_all();
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_read_failure_skips_tick_and_keeps_timer() {
        let (store, scheduler) = setup_test();
        add_point(&store, "READ1", true, PointStatus::Active).await;
        store.set_fail_point_reads("READ1", true);

        scheduler.start("READ1");
        sleep(Duration::from_secs(11)).await;
        assert_eq!(transaction_count(&store, "READ1").await, 0);
        assert!(scheduler.is_running("READ1"));

        store.set_fail_point_reads("READ1", false);
        sleep(Duration::from_secs(5)).await;
        assert!(transaction_count(&store, "READ1").await >= 1);
        scheduler.stop_all();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_and_wait_lets_inflight_tick_finish() {
        let (store, scheduler) = setup_test();
        add_point(&store, "SLOW1", true, PointStatus::Active).await;
        store.set_transaction_write_delay(Duration::from_millis(500));

        scheduler.start("SLOW1");
        // The first tick is at 5s and is still writing at 5.1s
        sleep(Duration::from_millis(5100)).await;

        assert!(scheduler.stop_and_wait("SLOW1").await);
        let settled = transaction_count(&store, "SLOW1").await;
        assert!(settled >= 1);

        sleep(Duration::from_secs(10)).await;
        assert_eq!(transaction_count(&store, "SLOW1").await, settled);
        assert!(!scheduler.stop_and_wait("SLOW1").await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_waits_for_tasks() {
        let (store, scheduler) = setup_test();
        add_point(&store, "AAAAA", true, PointStatus::Active).await;
        scheduler.start("AAAAA");
        sleep(Duration::from_secs(6)).await;

        assert_eq!(scheduler.shutdown().await, 1);
        assert_eq!(scheduler.status().active_count, 0);
        assert_eq!(scheduler.shutdown().await, 0);
    }
}
