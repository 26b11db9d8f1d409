//! Registry of bulk runs, keyed by product filter.
//!
//! Lets any part of the application observe the run for a filter
//! (progress badges, a status modal) without threading the run handle
//! through every caller.

use crate::batch::BulkRun;
use crate::executor::AssignmentExecutor;
use dashmap::DashMap;
use offerlink_core::config::AssignmentConfig;
use offerlink_core::event_bus::EventSink;
use std::sync::Arc;

pub struct AssignmentRegistry {
    executor: Arc<dyn AssignmentExecutor>,
    config: AssignmentConfig,
    /// filter_id -> most recent run
    runs: DashMap<String, Arc<BulkRun>>,
}

impl AssignmentRegistry {
    pub fn new(executor: Arc<dyn AssignmentExecutor>, config: AssignmentConfig) -> Self {
        Self {
            executor,
            config,
            runs: DashMap::new(),
        }
    }

    /// Create and register a fresh run for a filter, replacing any
    /// previous (finished) run. The replaced run keeps working for
    /// holders of its `Arc` but is no longer observable here.
    pub fn begin_run(&self, filter_id: &str, sink: Arc<dyn EventSink>) -> Arc<BulkRun> {
        let run = Arc::new(
            BulkRun::new(filter_id, Arc::clone(&self.executor), self.config.clone())
                .with_event_sink(sink),
        );
        self.runs.insert(filter_id.to_string(), Arc::clone(&run));
        run
    }

    pub fn run_for(&self, filter_id: &str) -> Option<Arc<BulkRun>> {
        self.runs.get(filter_id).map(|r| Arc::clone(r.value()))
    }

    /// Whether a filter has a run that is processing or still has
    /// unfinished items.
    pub fn has_active_run(&self, filter_id: &str) -> bool {
        self.run_for(filter_id)
            .map(|run| {
                let stats = run.stats();
                run.is_processing() || (stats.total > 0 && !stats.is_complete())
            })
            .unwrap_or(false)
    }

    /// Drop runs whose items have all settled.
    pub fn clear_finished(&self) {
        self.runs
            .retain(|_, run| run.is_processing() || !run.stats().is_complete());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::{RunItem, RunOutcome};
    use crate::executor::MockExecutor;
    use offerlink_core::event_bus;

    fn registry() -> AssignmentRegistry {
        AssignmentRegistry::new(
            Arc::new(MockExecutor::reliable()),
            AssignmentConfig {
                batch_size: 2,
                delay_between_batches_ms: 0,
                retry_batch_size: 2,
                retry_delay_ms: 0,
            },
        )
    }

    #[tokio::test]
    async fn test_registry_lifecycle() {
        let registry = registry();
        assert!(registry.run_for("filter-123").is_none());
        assert!(!registry.has_active_run("filter-123"));

        let run = registry.begin_run("filter-123", event_bus::noop_sink());
        assert!(registry.run_for("filter-123").is_some());

        let outcome = run
            .start(vec![
                RunItem::new("pp1", "Legal Research Promotion", "Augeo > LexisNexis"),
                RunItem::new("pp2", "Student Discount Initiative", "Augeo > LexisNexis"),
            ])
            .await;
        assert!(matches!(outcome, RunOutcome::Completed(_)));
        assert!(!registry.has_active_run("filter-123"));

        registry.clear_finished();
        assert!(registry.run_for("filter-123").is_none());
    }

    #[tokio::test]
    async fn test_begin_run_replaces_previous() {
        let registry = registry();
        let first = registry.begin_run("filter-123", event_bus::noop_sink());
        let second = registry.begin_run("filter-123", event_bus::noop_sink());
        assert_ne!(first.run_id(), second.run_id());
        assert_eq!(
            registry.run_for("filter-123").unwrap().run_id(),
            second.run_id()
        );
    }
}
