//! Batched bulk-assignment runs.
//!
//! Where [`crate::workflow`] treats the whole submission as one
//! all-or-nothing call, a `BulkRun` assigns item by item: promotions are
//! processed in small concurrent batches with a pause between batches,
//! every item carries its own status and failure reason, and a retry
//! pass re-runs only the failed subset. Cancellation is cooperative and
//! checked between batches; a cancelled run reports no completion.

use crate::executor::{AssignmentExecutor, AssignmentOutcome};
use chrono::{DateTime, Utc};
use offerlink_core::config::AssignmentConfig;
use offerlink_core::event_bus::{self, EventSink};
use offerlink_core::types::Catalog;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    #[default]
    Pending,
    Processing,
    Succeeded,
    Failed,
}

/// One promotion inside a bulk run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunItem {
    pub leaf_id: String,
    pub name: String,
    /// "Partner > Program" breadcrumb for display.
    pub parent_path: String,
    pub status: ItemStatus,
    pub error: Option<String>,
}

impl RunItem {
    pub fn new(
        leaf_id: impl Into<String>,
        name: impl Into<String>,
        parent_path: impl Into<String>,
    ) -> Self {
        Self {
            leaf_id: leaf_id.into(),
            name: name.into(),
            parent_path: parent_path.into(),
            status: ItemStatus::Pending,
            error: None,
        }
    }

    /// Build a run item for a catalog promotion, resolving its name and
    /// breadcrumb. `None` when the id is not in the catalog.
    pub fn from_catalog(catalog: &Catalog, leaf_id: &str) -> Option<Self> {
        let pp = catalog.find_promotion(leaf_id)?;
        let parent_path = catalog.parent_path(leaf_id).unwrap_or_default();
        Some(Self::new(&pp.id, &pp.name, parent_path))
    }
}

/// Aggregate view over a run's items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    pub total: usize,
    pub completed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub processing: usize,
    pub pending: usize,
    pub progress_pct: f64,
}

impl RunStats {
    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.completed == self.total
    }

    fn from_items(items: &[RunItem]) -> Self {
        let total = items.len();
        let succeeded = items
            .iter()
            .filter(|i| i.status == ItemStatus::Succeeded)
            .count();
        let failed = items.iter().filter(|i| i.status == ItemStatus::Failed).count();
        let processing = items
            .iter()
            .filter(|i| i.status == ItemStatus::Processing)
            .count();
        let pending = items
            .iter()
            .filter(|i| i.status == ItemStatus::Pending)
            .count();
        let completed = succeeded + failed;
        Self {
            total,
            completed,
            succeeded,
            failed,
            processing,
            pending,
            progress_pct: if total > 0 {
                completed as f64 / total as f64 * 100.0
            } else {
                0.0
            },
        }
    }
}

/// What happened to a `start`/`retry_failed` call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RunOutcome {
    /// Every targeted item reached a terminal status.
    Completed(RunStats),
    /// The run was cancelled part-way; untouched items stay pending.
    Cancelled(RunStats),
    /// A pass was already processing; this call was dropped.
    AlreadyProcessing,
    /// No items to work on.
    Empty,
}

struct RunInner {
    items: Vec<RunItem>,
    processing: bool,
    cancelled: bool,
    /// Passes over the items: 1 for the initial run, +1 per retry.
    rounds: u32,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
}

pub struct BulkRun {
    run_id: Uuid,
    filter_id: String,
    executor: Arc<dyn AssignmentExecutor>,
    event_sink: Arc<dyn EventSink>,
    config: AssignmentConfig,
    inner: Mutex<RunInner>,
}

impl BulkRun {
    pub fn new(
        filter_id: impl Into<String>,
        executor: Arc<dyn AssignmentExecutor>,
        config: AssignmentConfig,
    ) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            filter_id: filter_id.into(),
            executor,
            event_sink: event_bus::noop_sink(),
            config,
            inner: Mutex::new(RunInner {
                items: Vec::new(),
                processing: false,
                cancelled: false,
                rounds: 0,
                started_at: None,
                finished_at: None,
            }),
        }
    }

    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = sink;
        self
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn filter_id(&self) -> &str {
        &self.filter_id
    }

    pub fn items(&self) -> Vec<RunItem> {
        self.inner.lock().expect("bulk run mutex poisoned").items.clone()
    }

    pub fn stats(&self) -> RunStats {
        RunStats::from_items(&self.inner.lock().expect("bulk run mutex poisoned").items)
    }

    pub fn is_processing(&self) -> bool {
        self.inner.lock().expect("bulk run mutex poisoned").processing
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.inner.lock().expect("bulk run mutex poisoned").started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.inner.lock().expect("bulk run mutex poisoned").finished_at
    }

    /// Request cancellation. Takes effect at the next batch boundary;
    /// items already dispatched finish normally.
    pub fn cancel(&self) {
        let mut inner = self.inner.lock().expect("bulk run mutex poisoned");
        if inner.processing {
            inner.cancelled = true;
        }
    }

    /// Run the full item list through the executor in batches. Dropped
    /// silently if a pass is already processing.
    pub async fn start(&self, items: Vec<RunItem>) -> RunOutcome {
        if items.is_empty() {
            return RunOutcome::Empty;
        }
        let (targets, round) = {
            let mut inner = self.inner.lock().expect("bulk run mutex poisoned");
            if inner.processing {
                return RunOutcome::AlreadyProcessing;
            }
            inner.items = items
                .into_iter()
                .map(|mut item| {
                    item.status = ItemStatus::Pending;
                    item.error = None;
                    item
                })
                .collect();
            inner.processing = true;
            inner.cancelled = false;
            inner.rounds = 1;
            inner.started_at = Some(Utc::now());
            inner.finished_at = None;
            (
                inner.items.iter().map(|i| i.leaf_id.clone()).collect::<Vec<_>>(),
                inner.rounds,
            )
        };

        info!(
            run_id = %self.run_id,
            filter_id = %self.filter_id,
            items = targets.len(),
            "Bulk assignment run started"
        );
        self.event_sink.emit(event_bus::assignment_started(
            &self.filter_id,
            targets.clone(),
            round,
        ));

        self.process(
            targets,
            round,
            self.config.batch_size,
            Duration::from_millis(self.config.delay_between_batches_ms),
        )
        .await
    }

    /// Re-run only the items that failed, with the smaller retry batch
    /// size and longer pause.
    pub async fn retry_failed(&self) -> RunOutcome {
        let (targets, round) = {
            let mut inner = self.inner.lock().expect("bulk run mutex poisoned");
            if inner.processing {
                return RunOutcome::AlreadyProcessing;
            }
            let targets: Vec<String> = inner
                .items
                .iter()
                .filter(|i| i.status == ItemStatus::Failed)
                .map(|i| i.leaf_id.clone())
                .collect();
            if targets.is_empty() {
                return RunOutcome::Empty;
            }
            for item in &mut inner.items {
                if item.status == ItemStatus::Failed {
                    item.status = ItemStatus::Pending;
                    item.error = None;
                }
            }
            inner.processing = true;
            inner.cancelled = false;
            inner.rounds += 1;
            inner.finished_at = None;
            (targets, inner.rounds)
        };

        info!(
            run_id = %self.run_id,
            filter_id = %self.filter_id,
            items = targets.len(),
            round,
            "Retrying failed assignments"
        );

        self.process(
            targets,
            round,
            self.config.retry_batch_size,
            Duration::from_millis(self.config.retry_delay_ms),
        )
        .await
    }

    async fn process(
        &self,
        targets: Vec<String>,
        round: u32,
        batch_size: usize,
        between_batches: Duration,
    ) -> RunOutcome {
        let batch_size = batch_size.max(1);
        let mut cancelled = false;

        for (batch_idx, chunk) in targets.chunks(batch_size).enumerate() {
            if self.is_cancelled() {
                cancelled = true;
                break;
            }

            if batch_idx > 0 && !between_batches.is_zero() {
                tokio::time::sleep(between_batches).await;
            }

            self.mark(chunk, ItemStatus::Processing, None);

            let mut handles = Vec::with_capacity(chunk.len());
            for leaf_id in chunk {
                let executor = Arc::clone(&self.executor);
                let filter_id = self.filter_id.clone();
                let leaf = leaf_id.clone();
                handles.push((
                    leaf.clone(),
                    tokio::spawn(async move {
                        match executor.assign(&filter_id, std::slice::from_ref(&leaf)).await {
                            Ok(outcome) => outcome,
                            Err(err) => AssignmentOutcome::failed(err.to_string()),
                        }
                    }),
                ));
            }

            for (leaf, handle) in handles {
                let outcome = match handle.await {
                    Ok(outcome) => outcome,
                    Err(_) => AssignmentOutcome::failed("Assignment task aborted"),
                };
                if outcome.success {
                    self.mark(std::slice::from_ref(&leaf), ItemStatus::Succeeded, None);
                } else {
                    self.mark(
                        std::slice::from_ref(&leaf),
                        ItemStatus::Failed,
                        outcome.reason.clone(),
                    );
                }
                self.event_sink
                    .emit(event_bus::item_result(&self.filter_id, &leaf, outcome.reason));
            }

            let stats = self.stats();
            debug!(
                run_id = %self.run_id,
                completed = stats.completed,
                total = stats.total,
                "Batch finished"
            );
            self.event_sink.emit(event_bus::run_progress(
                &self.filter_id,
                stats.completed,
                stats.total,
            ));
        }

        let stats = {
            let mut inner = self.inner.lock().expect("bulk run mutex poisoned");
            inner.processing = false;
            inner.cancelled = false;
            inner.finished_at = Some(Utc::now());
            RunStats::from_items(&inner.items)
        };

        if cancelled {
            info!(run_id = %self.run_id, "Bulk assignment run cancelled");
            return RunOutcome::Cancelled(stats);
        }

        info!(
            run_id = %self.run_id,
            succeeded = stats.succeeded,
            failed = stats.failed,
            "Bulk assignment run finished"
        );
        self.event_sink.emit(event_bus::assignment_completed(
            &self.filter_id,
            targets,
            stats.failed == 0,
            round,
        ));
        RunOutcome::Completed(stats)
    }

    fn is_cancelled(&self) -> bool {
        self.inner.lock().expect("bulk run mutex poisoned").cancelled
    }

    fn mark(&self, leaf_ids: &[String], status: ItemStatus, error: Option<String>) {
        let mut inner = self.inner.lock().expect("bulk run mutex poisoned");
        for item in &mut inner.items {
            if leaf_ids.contains(&item.leaf_id) {
                item.status = status;
                item.error = error.clone();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::MockExecutor;
    use async_trait::async_trait;
    use offerlink_core::event_bus::{capture_sink, EventType};
    use offerlink_core::OfferLinkResult;
    use std::collections::HashSet;

    fn config(batch_size: usize) -> AssignmentConfig {
        AssignmentConfig {
            batch_size,
            delay_between_batches_ms: 0,
            retry_batch_size: 2,
            retry_delay_ms: 0,
        }
    }

    fn items(ids: &[&str]) -> Vec<RunItem> {
        ids.iter()
            .map(|id| RunItem::new(*id, format!("Offer {id}"), "Partner > Program"))
            .collect()
    }

    /// Fails the first attempt for every leaf, succeeds afterwards.
    #[derive(Default)]
    struct FlakyPerItem {
        seen: Mutex<HashSet<String>>,
        delay: Duration,
    }

    #[async_trait]
    impl AssignmentExecutor for FlakyPerItem {
        async fn assign(
            &self,
            _filter_id: &str,
            leaf_ids: &[String],
        ) -> OfferLinkResult<AssignmentOutcome> {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let leaf = leaf_ids[0].clone();
            let first_time = self.seen.lock().expect("executor mutex poisoned").insert(leaf);
            if first_time {
                Ok(AssignmentOutcome::failed("Network timeout occurred"))
            } else {
                Ok(AssignmentOutcome::ok())
            }
        }

        fn executor_name(&self) -> &str {
            "flaky-per-item"
        }
    }

    // -----------------------------------------------------------------------
    // 1. Clean run: every item succeeds, progress per batch
    // -----------------------------------------------------------------------
    #[tokio::test]
    async fn test_clean_run() {
        let sink = capture_sink();
        let run = BulkRun::new(
            "filter-123",
            Arc::new(MockExecutor::reliable()),
            config(2),
        )
        .with_event_sink(sink.clone());

        let outcome = run.start(items(&["pp1", "pp2", "pp3", "pp5", "pp6"])).await;
        let RunOutcome::Completed(stats) = outcome else {
            panic!("expected completion, got {outcome:?}");
        };

        assert_eq!(stats.succeeded, 5);
        assert_eq!(stats.failed, 0);
        assert!(stats.is_complete());
        assert!((stats.progress_pct - 100.0).abs() < f64::EPSILON);

        assert_eq!(sink.count_type(EventType::ItemAssigned), 5);
        assert_eq!(sink.count_type(EventType::ItemFailed), 0);
        // 5 items in batches of 2 -> 3 progress ticks, monotone.
        let progress = sink.of_type(EventType::RunProgress);
        assert_eq!(progress.len(), 3);
        let counts: Vec<_> = progress.iter().map(|e| e.count.unwrap()).collect();
        assert_eq!(counts, vec![2, 4, 5]);

        let completed = sink.of_type(EventType::AssignmentCompleted);
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].success, Some(true));
        assert!(run.started_at().is_some());
        assert!(run.finished_at().is_some());
    }

    // -----------------------------------------------------------------------
    // 2. Failures carry reasons and fail the run
    // -----------------------------------------------------------------------
    #[tokio::test]
    async fn test_failed_items_recorded() {
        let sink = capture_sink();
        let run = BulkRun::new(
            "filter-123",
            Arc::new(FlakyPerItem::default()),
            config(3),
        )
        .with_event_sink(sink.clone());

        let RunOutcome::Completed(stats) = run.start(items(&["pp1", "pp2"])).await else {
            panic!("expected completion");
        };
        assert_eq!(stats.failed, 2);
        assert_eq!(stats.succeeded, 0);

        for item in run.items() {
            assert_eq!(item.status, ItemStatus::Failed);
            assert_eq!(item.error.as_deref(), Some("Network timeout occurred"));
        }
        let completed = sink.of_type(EventType::AssignmentCompleted);
        assert_eq!(completed[0].success, Some(false));
    }

    // -----------------------------------------------------------------------
    // 3. Retry re-runs only the failed subset
    // -----------------------------------------------------------------------
    #[tokio::test]
    async fn test_retry_failed_subset() {
        let sink = capture_sink();
        let executor = Arc::new(FlakyPerItem::default());
        let run = BulkRun::new("filter-123", executor, config(2))
            .with_event_sink(sink.clone());

        run.start(items(&["pp1", "pp2", "pp3"])).await;
        assert_eq!(run.stats().failed, 3);

        let RunOutcome::Completed(stats) = run.retry_failed().await else {
            panic!("expected completion");
        };
        assert_eq!(stats.succeeded, 3);
        assert_eq!(stats.failed, 0);
        assert!(stats.is_complete());

        // First pass failed all three, retry succeeded all three.
        assert_eq!(sink.count_type(EventType::ItemFailed), 3);
        assert_eq!(sink.count_type(EventType::ItemAssigned), 3);
        let completed = sink.of_type(EventType::AssignmentCompleted);
        assert_eq!(completed.len(), 2);
        assert_eq!(completed[0].success, Some(false));
        assert_eq!(completed[0].attempt, Some(1));
        assert_eq!(completed[1].success, Some(true));
        assert_eq!(completed[1].attempt, Some(2));

        // Nothing left to retry.
        assert_eq!(run.retry_failed().await, RunOutcome::Empty);
    }

    // -----------------------------------------------------------------------
    // 4. Cancellation stops at a batch boundary
    // -----------------------------------------------------------------------
    #[tokio::test]
    async fn test_cancellation_leaves_rest_pending() {
        let sink = capture_sink();
        let executor = Arc::new(FlakyPerItem {
            seen: Mutex::new(HashSet::new()),
            delay: Duration::from_millis(30),
        });
        let run = Arc::new(
            BulkRun::new("filter-123", executor, config(1)).with_event_sink(sink.clone()),
        );

        let driving = tokio::spawn({
            let run = Arc::clone(&run);
            async move { run.start(items(&["pp1", "pp2", "pp3", "pp5", "pp6"])).await }
        });
        tokio::time::sleep(Duration::from_millis(45)).await;
        run.cancel();

        let outcome = driving.await.unwrap();
        let RunOutcome::Cancelled(stats) = outcome else {
            panic!("expected cancellation, got {outcome:?}");
        };
        assert!(stats.pending >= 1, "some items should be untouched");
        assert!(stats.completed >= 1, "dispatched items finish normally");
        // A cancelled run never reports completion.
        assert_eq!(sink.count_type(EventType::AssignmentCompleted), 0);
        assert!(!run.is_processing());
    }

    // -----------------------------------------------------------------------
    // 5. Guards
    // -----------------------------------------------------------------------
    #[tokio::test]
    async fn test_start_guards() {
        let run = Arc::new(BulkRun::new(
            "filter-123",
            Arc::new(FlakyPerItem {
                seen: Mutex::new(HashSet::new()),
                delay: Duration::from_millis(30),
            }),
            config(1),
        ));

        assert_eq!(run.start(Vec::new()).await, RunOutcome::Empty);

        let driving = tokio::spawn({
            let run = Arc::clone(&run);
            async move { run.start(items(&["pp1", "pp2"])).await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(run.is_processing());
        assert_eq!(run.start(items(&["pp3"])).await, RunOutcome::AlreadyProcessing);
        assert_eq!(run.retry_failed().await, RunOutcome::AlreadyProcessing);
        driving.await.unwrap();
    }
}
