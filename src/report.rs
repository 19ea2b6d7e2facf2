//! Execution result: the immutable per-run audit record
//!
//! Built exactly once at the end of a run (or at the point of a fatal
//! validation failure) and serialized as the run's output document.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::executor::{StepOutcome, StepResult, StepStatus};

/// Longest output preview kept in a step report
const PREVIEW_LIMIT: usize = 200;

/// Overall status of one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    Failed,
}

/// Serializable summary of one step attempt
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub step_id: String,
    pub agent: String,
    pub status: StepStatus,
    pub started_at_ms: u64,
    pub duration_seconds: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_preview: Option<String>,
}

impl From<&StepResult> for StepReport {
    fn from(result: &StepResult) -> Self {
        let (error, skip_reason, output_preview) = match &result.outcome {
            StepOutcome::Completed { output } => {
                let rendered = Value::Object(output.clone()).to_string();
                let preview = if rendered.chars().count() > PREVIEW_LIMIT {
                    let truncated: String = rendered.chars().take(PREVIEW_LIMIT).collect();
                    format!("{truncated}...")
                } else {
                    rendered
                };
                (None, None, Some(preview))
            }
            StepOutcome::Failed { error } => (Some(error.clone()), None, None),
            StepOutcome::Skipped { reason } => (None, Some(reason.clone()), None),
        };

        Self {
            step_id: result.step_id.clone(),
            agent: result.agent.clone(),
            status: result.outcome.status(),
            started_at_ms: result.started_at_ms,
            duration_seconds: result.duration.as_secs_f64(),
            error,
            skip_reason,
            output_preview,
        }
    }
}

/// Per-run record: workflow name, overall status, duration, step trail
/// and a derived final-state summary. Written once, never mutated.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionResult {
    pub workflow_name: String,
    pub status: RunStatus,
    pub started_at_ms: u64,
    pub duration_seconds: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub steps: Vec<StepReport>,
    pub final_state: Map<String, Value>,
}

impl ExecutionResult {
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Derive the monitoring summary from the trail: every top-level array
/// field `f` of a completed step's output contributes `"{f}_count"`.
/// Nothing workflow-specific is hardcoded here.
pub fn summarize_final_state(trail: &[StepResult]) -> Map<String, Value> {
    let mut summary = Map::new();
    for result in trail {
        if let StepOutcome::Completed { output } = &result.outcome {
            for (field, value) in output {
                if let Value::Array(items) = value {
                    summary.insert(format!("{field}_count"), Value::from(items.len()));
                }
            }
        }
    }
    summary
}
