//! Scheduler — drives the two background activities described in §5: a periodic metrics
//! refresh and a periodic optimization pass, guarded so at most one pass runs at a time. Grounded
//! on `binance-rs`'s `OrderBookManager` (`Arc<RwLock<_>>` state behind a manager struct, `tokio`
//! timeouts around I/O), generalized from a per-symbol order book cache to a single shared
//! (price snapshot, metrics, results) triple swapped atomically between passes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::RwLock;
use tokio::time::timeout;

use crate::config::Config;
use crate::id::CanonicalId;
use crate::metrics::{Metrics, MetricsView};
use crate::optimizer::{self, OptimizerRecord};
use crate::output::{FailedItem, RunSummary, StatusDocument};
use crate::price::{PriceSnapshot, PriceView};
use crate::providers::{MetricsProvider, PriceSnapshotProvider};
use crate::recipe::RecipeStore;

/// Bounds every suspension point named in §5 (metrics download, price-snapshot fetch, recipe
/// file read by way of the provider it wraps) so a stalled upstream cannot block the scheduler
/// indefinitely; on expiry the refresh fails and the prior cache is retained.
const IO_TIMEOUT: Duration = Duration::from_secs(30);

/// Owns the shared, reader-writer-disciplined state described in §5: the price snapshot and
/// metrics map readers see, the latest published results/failures, the status document, and the
/// single-flight "optimization in progress" flag. Each tick captures its own consistent
/// `(PriceSnapshot, Metrics)` pair at pass start rather than re-reading the locks mid-pass.
pub struct Scheduler {
    config: &'static Config,
    price_provider: Arc<dyn PriceSnapshotProvider>,
    metrics_provider: Arc<dyn MetricsProvider>,
    recipe_store: Arc<RecipeStore>,
    metrics: RwLock<Metrics>,
    latest_results: RwLock<Option<Arc<RunSummary>>>,
    latest_failures: RwLock<Option<Arc<Vec<FailedItem>>>>,
    status: RwLock<StatusDocument>,
    optimizing: AtomicBool,
}

impl Scheduler {
    pub fn new(
        config: &'static Config,
        price_provider: Arc<dyn PriceSnapshotProvider>,
        metrics_provider: Arc<dyn MetricsProvider>,
        recipe_store: Arc<RecipeStore>,
    ) -> Self {
        Scheduler {
            config,
            price_provider,
            metrics_provider,
            recipe_store,
            metrics: RwLock::new(Metrics::default()),
            latest_results: RwLock::new(None),
            latest_failures: RwLock::new(None),
            status: RwLock::new(StatusDocument::default()),
            optimizing: AtomicBool::new(false),
        }
    }

    pub async fn latest_results(&self) -> Option<Arc<RunSummary>> {
        self.latest_results.read().await.clone()
    }

    pub async fn latest_failures(&self) -> Option<Arc<Vec<FailedItem>>> {
        self.latest_failures.read().await.clone()
    }

    pub async fn status(&self) -> StatusDocument {
        self.status.read().await.clone()
    }

    /// Refreshes the metrics map. On success, atomically swaps it in; on timeout or provider
    /// failure, leaves the prior cache intact and records the failure in the status document
    /// (§5 "on timeout the refresh fails and leaves prior cache intact" / §7 `UpstreamUnavailable`).
    pub async fn refresh_metrics(&self) {
        match timeout(IO_TIMEOUT, self.metrics_provider.fetch()).await {
            Ok(Ok(fresh)) => {
                *self.metrics.write().await = fresh;
                let mut status = self.status.write().await;
                status.last_metrics_refresh = Some(Utc::now());
                status.last_metrics_attempt_status = "ok".to_string();
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "metrics refresh failed, retaining prior cache");
                self.status.write().await.last_metrics_attempt_status = format!("failed: {}", e);
            }
            Err(_) => {
                tracing::warn!("metrics refresh timed out, retaining prior cache");
                self.status.write().await.last_metrics_attempt_status =
                    "timed out".to_string();
            }
        }
    }

    /// Attempts one optimization pass. Returns `false` without doing any work if a pass is
    /// already running — per §5, a tick arriving mid-pass is dropped, not queued.
    pub async fn run_optimization_pass(&self) -> bool {
        if self
            .optimizing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("optimization pass already in progress, dropping tick");
            return false;
        }
        self.status.write().await.is_currently_optimizing = true;

        let outcome = self.run_pass_locked().await;

        self.status.write().await.is_currently_optimizing = false;
        self.optimizing.store(false, Ordering::Release);
        outcome
    }

    async fn run_pass_locked(&self) -> bool {
        let snapshot = match timeout(IO_TIMEOUT, self.price_provider.fetch()).await {
            Ok(Ok(snapshot)) => snapshot,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "price snapshot fetch failed, skipping pass");
                self.status.write().await.last_optimization_attempt_status =
                    format!("skipped: {}", e);
                return false;
            }
            Err(_) => {
                tracing::warn!("price snapshot fetch timed out, skipping pass");
                self.status.write().await.last_optimization_attempt_status =
                    "skipped: timed out".to_string();
                return false;
            }
        };

        // Clone out of the lock so the rest of the pass runs against a fixed, consistent pair —
        // metrics updates published mid-pass must not affect this pass (§5).
        let metrics = self.metrics.read().await.clone();

        // The feed's own product list is the universe of tradable items each pass (§5/§6):
        // there is no separate "watch list" to maintain alongside it.
        let items: Vec<String> = snapshot
            .item_ids()
            .into_iter()
            .map(|id| id.as_str().to_string())
            .collect();

        let records = self.run_batch_blocking(&items, snapshot, metrics).await;
        self.publish(&records).await;
        true
    }

    async fn run_batch_blocking(
        &self,
        items: &[String],
        snapshot: PriceSnapshot,
        metrics: Metrics,
    ) -> Vec<OptimizerRecord> {
        let items = items.to_vec();
        let recipe_store = Arc::clone(&self.recipe_store);
        let config = self.config;

        // The batch itself is pure CPU work (§5: "all other work is CPU-bound and must not
        // block on I/O") — run it off the async executor's thread pool.
        tokio::task::spawn_blocking(move || {
            let price_view = PriceView::new(&snapshot);
            let metrics_view = MetricsView::new(&metrics);
            optimizer::run_batch(
                &items,
                config.max_search_qty,
                config.max_cycle_time,
                config.items_per_chunk,
                &price_view,
                &metrics_view,
                &recipe_store,
                || std::thread::sleep(config.pause_between_chunks),
            )
        })
        .await
        .unwrap_or_default()
    }

    async fn publish(&self, records: &[OptimizerRecord]) {
        let failed = FailedItem::collect(records);
        let summary = RunSummary::from_records(
            Utc::now(),
            None,
            self.config.max_cycle_time.as_secs(),
            self.config.max_search_qty,
            records,
        );

        *self.latest_results.write().await = Some(Arc::new(summary));
        *self.latest_failures.write().await = Some(Arc::new(failed));

        let mut status = self.status.write().await;
        status.last_optimization_pass = Some(Utc::now());
        status.last_optimization_attempt_status = "ok".to_string();
    }

    /// Runs both interval loops concurrently until one of the providers is dropped or the
    /// process exits; a single long-running process per §5.
    pub async fn run_forever(self: Arc<Self>) {
        let metrics_self = Arc::clone(&self);
        let metrics_task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(metrics_self.config.metrics_refresh_interval);
            loop {
                ticker.tick().await;
                metrics_self.refresh_metrics().await;
            }
        });

        let optimization_self = Arc::clone(&self);
        let optimization_task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(optimization_self.config.optimization_interval);
            loop {
                ticker.tick().await;
                optimization_self.run_optimization_pass().await;
            }
        });

        let _ = tokio::join!(metrics_task, optimization_task);
    }
}

#[allow(dead_code)]
fn bottleneck_of(record: &OptimizerRecord) -> Option<&CanonicalId> {
    record.bottleneck.as_ref()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CalcError;
    use crate::metrics::RawMetricsEntry;
    use crate::price::RawPriceSnapshot;
    use crate::providers::RawRecipe;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::AtomicUsize;

    struct StubPriceProvider;
    #[async_trait]
    impl PriceSnapshotProvider for StubPriceProvider {
        async fn fetch(&self) -> Result<PriceSnapshot, CalcError> {
            PriceSnapshot::from_raw(RawPriceSnapshot {
                success: true,
                last_updated: 0,
                products: HashMap::new(),
            })
            .ok_or_else(|| CalcError::UpstreamUnavailable("unreachable".to_string()))
        }
    }

    struct StubMetricsProvider {
        calls: AtomicUsize,
    }
    #[async_trait]
    impl MetricsProvider for StubMetricsProvider {
        async fn fetch(&self) -> Result<Metrics, CalcError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Metrics::from_raw(Vec::<RawMetricsEntry>::new()))
        }
    }

    struct EmptyRecipeProvider;
    impl crate::providers::RecipeProvider for EmptyRecipeProvider {
        fn get(&self, _id: &CanonicalId) -> Option<RawRecipe> {
            None
        }
    }

    fn test_config() -> &'static Config {
        Box::leak(Box::new(Config::for_tests()))
    }

    #[tokio::test]
    async fn metrics_refresh_updates_status() {
        let scheduler = Scheduler::new(
            test_config(),
            Arc::new(StubPriceProvider),
            Arc::new(StubMetricsProvider {
                calls: AtomicUsize::new(0),
            }),
            Arc::new(RecipeStore::new(Arc::new(EmptyRecipeProvider))),
        );
        scheduler.refresh_metrics().await;
        let status = scheduler.status().await;
        assert_eq!(status.last_metrics_attempt_status, "ok");
        assert!(status.last_metrics_refresh.is_some());
    }

    #[tokio::test]
    async fn concurrent_passes_single_flight() {
        let scheduler = Arc::new(Scheduler::new(
            test_config(),
            Arc::new(StubPriceProvider),
            Arc::new(StubMetricsProvider {
                calls: AtomicUsize::new(0),
            }),
            Arc::new(RecipeStore::new(Arc::new(EmptyRecipeProvider))),
        ));

        let a = Arc::clone(&scheduler);
        let b = Arc::clone(&scheduler);

        // Flip the flag manually to simulate a pass already in flight, then confirm the second
        // caller observes the single-flight guard instead of racing into the same pass.
        scheduler
            .optimizing
            .store(true, Ordering::SeqCst);
        let dropped = b.run_optimization_pass().await;
        assert!(!dropped);
        scheduler.optimizing.store(false, Ordering::SeqCst);

        let ran = a.run_optimization_pass().await;
        assert!(ran);
        assert!(scheduler.latest_results().await.is_some());
    }
}
