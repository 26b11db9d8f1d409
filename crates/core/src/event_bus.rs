//! Single-subscriber notification channel for engine state changes.
//!
//! Callers hand the selection model and assignment workflows an
//! `Arc<dyn EventSink>`; the engine emits `SelectionChanged` whenever the
//! selected count moves and `AssignmentCompleted` exactly once per
//! terminal assignment transition. Multi-subscriber fan-out is a caller
//! concern.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Trait for receiving engine events. A UI layer would route these into
/// its own store; tests capture them with [`CaptureSink`].
pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

/// No-op sink for callers that don't subscribe.
pub struct NoOpSink;

impl EventSink for NoOpSink {
    fn emit(&self, _event: EngineEvent) {}
}

/// In-memory sink that captures events for testing.
#[derive(Default)]
pub struct CaptureSink {
    events: Mutex<Vec<EngineEvent>>,
}

impl CaptureSink {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn events(&self) -> Vec<EngineEvent> {
        self.events.lock().expect("event bus mutex poisoned").clone()
    }

    pub fn count(&self) -> usize {
        self.events.lock().expect("event bus mutex poisoned").len()
    }

    pub fn count_type(&self, event_type: EventType) -> usize {
        self.events
            .lock()
            .expect("event bus mutex poisoned")
            .iter()
            .filter(|e| e.event_type == event_type)
            .count()
    }

    pub fn of_type(&self, event_type: EventType) -> Vec<EngineEvent> {
        self.events
            .lock()
            .expect("event bus mutex poisoned")
            .iter()
            .filter(|e| e.event_type == event_type)
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.events.lock().expect("event bus mutex poisoned").clear();
    }
}

impl EventSink for CaptureSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().expect("event bus mutex poisoned").push(event);
    }
}

/// A single engine notification. Flat struct with optional fields so one
/// event type serves every emitter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineEvent {
    pub event_id: Uuid,
    pub event_type: EventType,
    /// Product filter the event concerns, when applicable.
    pub filter_id: Option<String>,
    /// Promotion ids carried by assignment events.
    pub leaf_ids: Vec<String>,
    /// Selected count for `SelectionChanged`, completed count for
    /// `RunProgress`.
    pub count: Option<usize>,
    /// Total item count for `RunProgress`.
    pub total: Option<usize>,
    pub success: Option<bool>,
    pub attempt: Option<u32>,
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    SelectionChanged,
    AssignmentStarted,
    AssignmentCompleted,
    ItemAssigned,
    ItemFailed,
    RunProgress,
}

fn base_event(event_type: EventType) -> EngineEvent {
    EngineEvent {
        event_id: Uuid::new_v4(),
        event_type,
        filter_id: None,
        leaf_ids: Vec::new(),
        count: None,
        total: None,
        success: None,
        attempt: None,
        error: None,
        timestamp: Utc::now(),
    }
}

/// `SelectionChanged` carrying the new global selected count.
pub fn selection_changed(count: usize) -> EngineEvent {
    EngineEvent {
        count: Some(count),
        ..base_event(EventType::SelectionChanged)
    }
}

pub fn assignment_started(
    filter_id: impl Into<String>,
    leaf_ids: Vec<String>,
    attempt: u32,
) -> EngineEvent {
    EngineEvent {
        filter_id: Some(filter_id.into()),
        leaf_ids,
        attempt: Some(attempt),
        ..base_event(EventType::AssignmentStarted)
    }
}

pub fn assignment_completed(
    filter_id: impl Into<String>,
    leaf_ids: Vec<String>,
    success: bool,
    attempt: u32,
) -> EngineEvent {
    EngineEvent {
        filter_id: Some(filter_id.into()),
        leaf_ids,
        success: Some(success),
        attempt: Some(attempt),
        ..base_event(EventType::AssignmentCompleted)
    }
}

/// Per-item outcome within a bulk run.
pub fn item_result(
    filter_id: impl Into<String>,
    leaf_id: impl Into<String>,
    error: Option<String>,
) -> EngineEvent {
    let failed = error.is_some();
    EngineEvent {
        filter_id: Some(filter_id.into()),
        leaf_ids: vec![leaf_id.into()],
        success: Some(!failed),
        error,
        ..base_event(if failed {
            EventType::ItemFailed
        } else {
            EventType::ItemAssigned
        })
    }
}

pub fn run_progress(filter_id: impl Into<String>, completed: usize, total: usize) -> EngineEvent {
    EngineEvent {
        filter_id: Some(filter_id.into()),
        count: Some(completed),
        total: Some(total),
        ..base_event(EventType::RunProgress)
    }
}

/// Convenience: a no-op sink for components without a subscriber.
pub fn noop_sink() -> Arc<dyn EventSink> {
    Arc::new(NoOpSink)
}

/// Convenience: a capture sink for tests.
pub fn capture_sink() -> Arc<CaptureSink> {
    Arc::new(CaptureSink::new())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_sink() {
        let sink = capture_sink();
        assert_eq!(sink.count(), 0);

        sink.emit(selection_changed(3));
        sink.emit(assignment_completed(
            "filter-123",
            vec!["pp1".into(), "pp6".into()],
            true,
            2,
        ));

        assert_eq!(sink.count(), 2);
        assert_eq!(sink.count_type(EventType::SelectionChanged), 1);
        assert_eq!(sink.count_type(EventType::AssignmentCompleted), 1);

        let completed = sink.of_type(EventType::AssignmentCompleted);
        assert_eq!(completed[0].leaf_ids, vec!["pp1", "pp6"]);
        assert_eq!(completed[0].success, Some(true));
        assert_eq!(completed[0].attempt, Some(2));
    }

    #[test]
    fn test_item_result_picks_event_type() {
        let ok = item_result("filter-123", "pp1", None);
        assert_eq!(ok.event_type, EventType::ItemAssigned);
        assert_eq!(ok.success, Some(true));

        let failed = item_result("filter-123", "pp2", Some("Network timeout occurred".into()));
        assert_eq!(failed.event_type, EventType::ItemFailed);
        assert_eq!(failed.success, Some(false));
        assert!(failed.error.is_some());
    }

    #[test]
    fn test_noop_sink() {
        let sink = noop_sink();
        // Should not panic
        sink.emit(selection_changed(0));
    }
}
