//! Bulk-assignment workflow state machine.
//!
//! One workflow instance drives the linking of a single product filter
//! to the promotions a user selected. Exactly one attempt may be in
//! flight at a time; retries re-submit the recorded pending ids; any
//! executor rejection is folded into the `Failed` state rather than
//! surfaced as an error.

use crate::executor::{AssignmentExecutor, AssignmentOutcome};
use chrono::{DateTime, Utc};
use offerlink_core::event_bus::{self, EventSink};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    #[default]
    Idle,
    Assigning,
    Succeeded,
    Failed,
}

impl AssignmentStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, AssignmentStatus::Succeeded | AssignmentStatus::Failed)
    }
}

/// What happened to a `start`/`retry` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// The attempt ran to a terminal state.
    Completed { success: bool },
    /// Another attempt was in flight; this call was dropped.
    AlreadyAssigning,
    /// No pending ids to submit; nothing happened.
    NothingPending,
    /// The workflow was reset while the attempt was in flight; its
    /// result was discarded and no completion was reported.
    Superseded,
}

struct WorkflowInner {
    status: AssignmentStatus,
    pending_leaf_ids: Vec<String>,
    attempt_count: u32,
    /// Bumped by `reset` so an in-flight attempt's result is dropped.
    epoch: u64,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
    last_error: Option<String>,
}

pub struct AssignmentWorkflow {
    filter_id: String,
    executor: Arc<dyn AssignmentExecutor>,
    event_sink: Arc<dyn EventSink>,
    inner: Mutex<WorkflowInner>,
}

impl AssignmentWorkflow {
    pub fn new(filter_id: impl Into<String>, executor: Arc<dyn AssignmentExecutor>) -> Self {
        Self {
            filter_id: filter_id.into(),
            executor,
            event_sink: event_bus::noop_sink(),
            inner: Mutex::new(WorkflowInner {
                status: AssignmentStatus::Idle,
                pending_leaf_ids: Vec::new(),
                attempt_count: 0,
                epoch: 0,
                started_at: None,
                finished_at: None,
                last_error: None,
            }),
        }
    }

    /// Attach an event sink; `AssignmentCompleted` fires exactly once
    /// per terminal transition.
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = sink;
        self
    }

    pub fn filter_id(&self) -> &str {
        &self.filter_id
    }

    pub fn status(&self) -> AssignmentStatus {
        self.inner.lock().expect("workflow mutex poisoned").status
    }

    pub fn is_assigning(&self) -> bool {
        self.status() == AssignmentStatus::Assigning
    }

    /// Attempts made since the last reset, retries included.
    pub fn attempt_count(&self) -> u32 {
        self.inner
            .lock()
            .expect("workflow mutex poisoned")
            .attempt_count
    }

    pub fn pending_leaf_ids(&self) -> Vec<String> {
        self.inner
            .lock()
            .expect("workflow mutex poisoned")
            .pending_leaf_ids
            .clone()
    }

    pub fn last_error(&self) -> Option<String> {
        self.inner
            .lock()
            .expect("workflow mutex poisoned")
            .last_error
            .clone()
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.inner.lock().expect("workflow mutex poisoned").started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.inner
            .lock()
            .expect("workflow mutex poisoned")
            .finished_at
    }

    /// Submit the selected promotion ids. Dropped silently while an
    /// attempt is in flight; a no-op for an empty id list (the caller's
    /// submit control is disabled at zero, and the model tolerates the
    /// call anyway).
    pub async fn start(&self, leaf_ids: Vec<String>) -> StartOutcome {
        if leaf_ids.is_empty() {
            return StartOutcome::NothingPending;
        }
        self.run_attempt(leaf_ids).await
    }

    /// Re-submit the ids recorded by the last `start`. Meaningful from
    /// `Failed`; tolerated from any state.
    pub async fn retry(&self) -> StartOutcome {
        let pending = {
            let inner = self.inner.lock().expect("workflow mutex poisoned");
            if inner.status == AssignmentStatus::Assigning {
                return StartOutcome::AlreadyAssigning;
            }
            inner.pending_leaf_ids.clone()
        };
        if pending.is_empty() {
            return StartOutcome::NothingPending;
        }
        self.run_attempt(pending).await
    }

    /// Force the workflow back to `Idle`, clearing pending ids and the
    /// attempt counter. An in-flight attempt's eventual result is
    /// discarded without a completion notification.
    pub fn reset(&self) {
        let mut inner = self.inner.lock().expect("workflow mutex poisoned");
        inner.status = AssignmentStatus::Idle;
        inner.pending_leaf_ids.clear();
        inner.attempt_count = 0;
        inner.epoch += 1;
        inner.started_at = None;
        inner.finished_at = None;
        inner.last_error = None;
    }

    async fn run_attempt(&self, leaf_ids: Vec<String>) -> StartOutcome {
        let (attempt, epoch) = {
            let mut inner = self.inner.lock().expect("workflow mutex poisoned");
            if inner.status == AssignmentStatus::Assigning {
                return StartOutcome::AlreadyAssigning;
            }
            inner.status = AssignmentStatus::Assigning;
            inner.pending_leaf_ids = leaf_ids.clone();
            inner.attempt_count += 1;
            inner.started_at = Some(Utc::now());
            inner.finished_at = None;
            inner.last_error = None;
            (inner.attempt_count, inner.epoch)
        };

        info!(
            filter_id = %self.filter_id,
            items = leaf_ids.len(),
            attempt,
            "Assignment attempt started"
        );
        self.event_sink.emit(event_bus::assignment_started(
            &self.filter_id,
            leaf_ids.clone(),
            attempt,
        ));

        // Executor rejection and an explicit failure outcome are the
        // same thing to the workflow.
        let outcome = match self.executor.assign(&self.filter_id, &leaf_ids).await {
            Ok(outcome) => outcome,
            Err(err) => AssignmentOutcome::failed(err.to_string()),
        };

        let mut inner = self.inner.lock().expect("workflow mutex poisoned");
        if inner.epoch != epoch {
            // Reset won while we were in flight; drop the result.
            warn!(
                filter_id = %self.filter_id,
                attempt,
                "Assignment attempt superseded by reset"
            );
            return StartOutcome::Superseded;
        }

        inner.status = if outcome.success {
            AssignmentStatus::Succeeded
        } else {
            AssignmentStatus::Failed
        };
        inner.finished_at = Some(Utc::now());
        inner.last_error = outcome.reason.clone();
        drop(inner);

        info!(
            filter_id = %self.filter_id,
            attempt,
            success = outcome.success,
            "Assignment attempt finished"
        );
        self.event_sink.emit(event_bus::assignment_completed(
            &self.filter_id,
            leaf_ids,
            outcome.success,
            attempt,
        ));

        StartOutcome::Completed {
            success: outcome.success,
        }
    }
}
