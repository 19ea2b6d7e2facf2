//! Event sourcing for pipeline execution
//!
//! Full audit trail of one run:
//! - Event: envelope with id + timestamp + kind
//! - EventKind: run-level and step-level variants
//! - EventLog: thread-safe, append-only log

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::report::RunStatus;

/// Single event in the execution log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Monotonic sequence ID (for ordering)
    pub id: u64,
    /// Time since run start (ms)
    pub timestamp_ms: u64,
    /// Event type and data
    pub kind: EventKind,
}

/// All possible event types
///
/// Uses Arc<str> for step_id fields to enable zero-cost cloning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    // ═══════════════════════════════════════════
    // RUN LEVEL
    // ═══════════════════════════════════════════
    RunStarted {
        step_count: usize,
    },
    RunCompleted {
        status: RunStatus,
        duration_ms: u64,
    },
    RunFailed {
        error: String,
    },

    // ═══════════════════════════════════════════
    // STEP LEVEL
    // ═══════════════════════════════════════════
    /// Step execution begins with its fully resolved inputs
    StepStarted {
        step_id: Arc<str>,
        inputs: Value,
    },
    /// Agent implementation bound and invoked
    AgentInvoked {
        step_id: Arc<str>,
        agent: String,
    },
    StepCompleted {
        step_id: Arc<str>,
        duration_ms: u64,
    },
    StepFailed {
        step_id: Arc<str>,
        error: String,
        duration_ms: u64,
    },
    StepSkipped {
        step_id: Arc<str>,
        reason: String,
    },
}

impl EventKind {
    /// Extract step_id if event is step-related
    pub fn step_id(&self) -> Option<&str> {
        match self {
            Self::StepStarted { step_id, .. }
            | Self::AgentInvoked { step_id, .. }
            | Self::StepCompleted { step_id, .. }
            | Self::StepFailed { step_id, .. }
            | Self::StepSkipped { step_id, .. } => Some(step_id),
            Self::RunStarted { .. } | Self::RunCompleted { .. } | Self::RunFailed { .. } => None,
        }
    }

    /// Check if this is a run-level event
    pub fn is_run_event(&self) -> bool {
        matches!(
            self,
            Self::RunStarted { .. } | Self::RunCompleted { .. } | Self::RunFailed { .. }
        )
    }
}

/// Thread-safe, append-only event log
#[derive(Clone)]
pub struct EventLog {
    events: Arc<RwLock<Vec<Event>>>,
    start_time: Instant,
    next_id: Arc<AtomicU64>,
}

impl EventLog {
    /// Create a new event log (call at run start)
    pub fn new() -> Self {
        Self {
            events: Arc::new(RwLock::new(Vec::new())),
            start_time: Instant::now(),
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Emit an event (thread-safe, returns event ID)
    pub fn emit(&self, kind: EventKind) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let event = Event {
            id,
            timestamp_ms: self.start_time.elapsed().as_millis() as u64,
            kind,
        };

        // Poisoned only if another writer panicked mid-push
        self.events
            .write()
            .expect("event log lock poisoned")
            .push(event);
        id
    }

    /// Get all events (cloned)
    pub fn events(&self) -> Vec<Event> {
        self.events
            .read()
            .expect("event log lock poisoned")
            .clone()
    }

    /// Filter events by step ID
    pub fn filter_step(&self, step_id: &str) -> Vec<Event> {
        self.events()
            .into_iter()
            .filter(|e| e.kind.step_id() == Some(step_id))
            .collect()
    }

    /// Filter run-level events only
    pub fn run_events(&self) -> Vec<Event> {
        self.events()
            .into_iter()
            .filter(|e| e.kind.is_run_event())
            .collect()
    }

    /// Serialize to JSON for persistence/debugging
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self.events()).unwrap_or(Value::Null)
    }

    /// Number of events
    pub fn len(&self) -> usize {
        self.events.read().expect("event log lock poisoned").len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLog").field("len", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn eventkind_step_id_extraction() {
        let started = EventKind::StepStarted {
            step_id: "step1".into(),
            inputs: json!({}),
        };
        assert_eq!(started.step_id(), Some("step1"));

        let run = EventKind::RunStarted { step_count: 4 };
        assert_eq!(run.step_id(), None);
    }

    #[test]
    fn eventkind_serializes_with_type_tag() {
        let kind = EventKind::StepCompleted {
            step_id: "scoring".into(),
            duration_ms: 150,
        };

        let json = serde_json::to_value(&kind).unwrap();
        assert_eq!(json["type"], "step_completed");
        assert_eq!(json["step_id"], "scoring");
    }

    #[test]
    fn eventkind_deserializes_from_tagged_json() {
        let json = json!({
            "type": "step_skipped",
            "step_id": "outreach",
            "reason": "unresolved input reference"
        });

        let kind: EventKind = serde_json::from_value(json).unwrap();
        assert_eq!(
            kind,
            EventKind::StepSkipped {
                step_id: "outreach".into(),
                reason: "unresolved input reference".into(),
            }
        );
    }

    #[test]
    fn emit_returns_monotonic_ids() {
        let log = EventLog::new();

        let id1 = log.emit(EventKind::RunStarted { step_count: 2 });
        let id2 = log.emit(EventKind::StepStarted {
            step_id: "s1".into(),
            inputs: json!({}),
        });

        assert_eq!(id1, 0);
        assert_eq!(id2, 1);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn filter_step_returns_only_matching() {
        let log = EventLog::new();
        log.emit(EventKind::RunStarted { step_count: 2 });
        log.emit(EventKind::StepStarted {
            step_id: "alpha".into(),
            inputs: json!({}),
        });
        log.emit(EventKind::StepStarted {
            step_id: "beta".into(),
            inputs: json!({}),
        });
        log.emit(EventKind::StepCompleted {
            step_id: "alpha".into(),
            duration_ms: 100,
        });

        let alpha_events = log.filter_step("alpha");
        assert_eq!(alpha_events.len(), 2);
        assert!(alpha_events.iter().all(|e| e.kind.step_id() == Some("alpha")));
    }

    #[test]
    fn run_events_returns_only_run_level() {
        let log = EventLog::new();
        log.emit(EventKind::RunStarted { step_count: 1 });
        log.emit(EventKind::StepStarted {
            step_id: "s1".into(),
            inputs: json!({}),
        });
        log.emit(EventKind::RunCompleted {
            status: RunStatus::Completed,
            duration_ms: 500,
        });

        let run_events = log.run_events();
        assert_eq!(run_events.len(), 2);
        assert!(run_events.iter().all(|e| e.kind.is_run_event()));
    }

    #[test]
    fn clones_share_the_log() {
        let log = EventLog::new();
        log.emit(EventKind::RunStarted { step_count: 1 });

        let cloned = log.clone();
        assert_eq!(cloned.len(), 1);

        log.emit(EventKind::StepStarted {
            step_id: "s1".into(),
            inputs: json!({}),
        });
        assert_eq!(cloned.len(), 2);
    }

    #[test]
    fn step_started_captures_resolved_inputs() {
        let log = EventLog::new();
        let inputs = json!({"leads": [1, 2, 3], "persona": "SDR"});

        log.emit(EventKind::StepStarted {
            step_id: "outreach".into(),
            inputs: inputs.clone(),
        });

        let events = log.filter_step("outreach");
        assert_eq!(events.len(), 1);
        if let EventKind::StepStarted { inputs: captured, .. } = &events[0].kind {
            assert_eq!(captured, &inputs);
        } else {
            panic!("expected StepStarted event");
        }
    }

    #[test]
    fn to_json_is_an_array() {
        let log = EventLog::new();
        log.emit(EventKind::RunStarted { step_count: 1 });

        let json = log.to_json();
        assert!(json.is_array());
        assert_eq!(json[0]["kind"]["type"], "run_started");
    }
}
