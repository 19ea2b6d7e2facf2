//! Shared state accumulated across a single run
//!
//! Maps step id to that step's recorded output, plus a reserved namespace
//! for run metadata. Entries are immutable once written; the orchestrator
//! is the only writer, everything else reads.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::Value;

/// Milliseconds since the unix epoch
pub(crate) fn epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Run-level metadata kept apart from step outputs
#[derive(Debug, Clone)]
pub struct RunMeta {
    pub workflow_name: String,
    pub started_at_ms: u64,
}

/// Accumulated step outputs for one run. Created empty at run start,
/// grows monotonically, discarded at run end.
#[derive(Debug)]
pub struct SharedState {
    meta: RunMeta,
    outputs: HashMap<String, Value>,
}

impl SharedState {
    pub fn new(workflow_name: &str, started_at_ms: u64) -> Self {
        Self {
            meta: RunMeta {
                workflow_name: workflow_name.to_string(),
                started_at_ms,
            },
            outputs: HashMap::new(),
        }
    }

    pub fn meta(&self) -> &RunMeta {
        &self.meta
    }

    /// Record a completed step's output. Ids are validated unique before
    /// the run starts, so an entry is never overwritten.
    pub fn insert_output(&mut self, step_id: &str, output: Value) {
        debug_assert!(
            !self.outputs.contains_key(step_id),
            "step output recorded twice: {step_id}"
        );
        self.outputs.insert(step_id.to_string(), output);
    }

    pub fn contains(&self, step_id: &str) -> bool {
        self.outputs.contains_key(step_id)
    }

    pub fn get(&self, step_id: &str) -> Option<&Value> {
        self.outputs.get(step_id)
    }

    /// Descend a recorded output one path segment at a time. Numeric
    /// segments index arrays, everything else is an object key. Returns
    /// None as soon as any segment is absent.
    pub fn lookup(&self, step_id: &str, field_path: &[String]) -> Option<Value> {
        let mut value = self.outputs.get(step_id)?.clone();
        for segment in field_path {
            value = if let Ok(idx) = segment.parse::<usize>() {
                value.get(idx)?.clone()
            } else {
                value.get(segment.as_str())?.clone()
            };
        }
        Some(value)
    }

    /// Completed step ids, unordered
    pub fn step_ids(&self) -> impl Iterator<Item = &str> {
        self.outputs.keys().map(|k| k.as_str())
    }
}
