//! Assignment execution seam.
//!
//! The workflow and bulk runs drive any backend that implements
//! [`AssignmentExecutor`]. The real backend is a remote service; this
//! crate ships a latency-and-failure-injecting mock for demos and a
//! scripted executor for deterministic tests.

use async_trait::async_trait;
use offerlink_core::config::ExecutorConfig;
use offerlink_core::OfferLinkResult;
use rand::Rng;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Outcome of one assignment call. A `success=false` outcome and an
/// `Err` from the executor are treated identically by callers.
#[derive(Debug, Clone)]
pub struct AssignmentOutcome {
    pub success: bool,
    pub reason: Option<String>,
}

impl AssignmentOutcome {
    pub fn ok() -> Self {
        Self {
            success: true,
            reason: None,
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            reason: Some(reason.into()),
        }
    }
}

/// Links a product filter to a set of promotions.
///
/// Implementations must resolve: the engine imposes no timeout, so a
/// bounded-latency guarantee (or an internal deadline) belongs to the
/// executor.
#[async_trait]
pub trait AssignmentExecutor: Send + Sync {
    async fn assign(
        &self,
        filter_id: &str,
        leaf_ids: &[String],
    ) -> OfferLinkResult<AssignmentOutcome>;

    /// Executor name for logging.
    fn executor_name(&self) -> &str;
}

/// Failure reasons surfaced by the mock, mirroring what the real
/// backend reports.
const FAILURE_REASONS: &[&str] = &[
    "Network timeout occurred",
    "Item is already assigned to another filter",
    "Insufficient permissions",
    "Item configuration is invalid",
    "Server error during assignment",
];

/// Mock backend with configurable latency and random failures.
pub struct MockExecutor {
    failure_rate: f64,
    latency: (Duration, Duration),
}

impl MockExecutor {
    pub fn new(config: &ExecutorConfig) -> Self {
        Self {
            failure_rate: config.failure_rate.clamp(0.0, 1.0),
            latency: (
                Duration::from_millis(config.min_latency_ms),
                Duration::from_millis(config.max_latency_ms.max(config.min_latency_ms)),
            ),
        }
    }

    /// A mock that always succeeds immediately.
    pub fn reliable() -> Self {
        Self {
            failure_rate: 0.0,
            latency: (Duration::ZERO, Duration::ZERO),
        }
    }
}

#[async_trait]
impl AssignmentExecutor for MockExecutor {
    async fn assign(
        &self,
        _filter_id: &str,
        _leaf_ids: &[String],
    ) -> OfferLinkResult<AssignmentOutcome> {
        let (delay, failed, reason_idx) = {
            let mut rng = rand::thread_rng();
            let min = self.latency.0.as_millis() as u64;
            let max = self.latency.1.as_millis() as u64;
            let delay = if max > min { rng.gen_range(min..=max) } else { min };
            (
                Duration::from_millis(delay),
                rng.gen_bool(self.failure_rate),
                rng.gen_range(0..FAILURE_REASONS.len()),
            )
        };

        tokio::time::sleep(delay).await;

        if failed {
            return Ok(AssignmentOutcome::failed(FAILURE_REASONS[reason_idx]));
        }
        Ok(AssignmentOutcome::ok())
    }

    fn executor_name(&self) -> &str {
        "mock"
    }
}

/// Scripted executor: fails the first `fail_count` calls, then
/// succeeds. Records every invocation so tests can assert call counts
/// and payloads.
pub struct FailFirstExecutor {
    fail_count: u32,
    calls: AtomicU32,
    invocations: Mutex<Vec<(String, Vec<String>)>>,
}

impl FailFirstExecutor {
    pub fn new(fail_count: u32) -> Self {
        Self {
            fail_count,
            calls: AtomicU32::new(0),
            invocations: Mutex::new(Vec::new()),
        }
    }

    /// Succeeds from the first call.
    pub fn always_succeeding() -> Self {
        Self::new(0)
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn invocations(&self) -> Vec<(String, Vec<String>)> {
        self.invocations
            .lock()
            .expect("executor mutex poisoned")
            .clone()
    }
}

#[async_trait]
impl AssignmentExecutor for FailFirstExecutor {
    async fn assign(
        &self,
        filter_id: &str,
        leaf_ids: &[String],
    ) -> OfferLinkResult<AssignmentOutcome> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.invocations
            .lock()
            .expect("executor mutex poisoned")
            .push((filter_id.to_string(), leaf_ids.to_vec()));

        if call <= self.fail_count {
            return Ok(AssignmentOutcome::failed("Server error during assignment"));
        }
        Ok(AssignmentOutcome::ok())
    }

    fn executor_name(&self) -> &str {
        "fail-first"
    }
}
