//! Workflow parsing structures
//!
//! A workflow document is YAML or JSON with a `workflow_name` and an
//! ordered `steps` list. Unknown fields are ignored so documents written
//! for newer versions still parse.

use std::collections::HashSet;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::config::CompletionPolicy;
use crate::error::FlowError;

/// Valid step id: starts with a letter or '_', then letters/digits/'_'/'-'
static STEP_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_-]*$").expect("valid step id regex"));

/// Workflow parsed from a declarative document
#[derive(Debug, Deserialize)]
pub struct WorkflowSpec {
    pub workflow_name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Overall-status policy; falls back to the engine default when absent
    #[serde(default)]
    pub policy: Option<CompletionPolicy>,
    pub steps: Vec<StepSpec>,
}

/// One position in the ordered workflow
#[derive(Debug, Deserialize)]
pub struct StepSpec {
    /// Unique key later steps use to reference this step's output
    pub id: String,
    /// Registered agent implementation name (exact match)
    pub agent: String,
    /// Literal values or template-expression strings, arbitrarily nested
    #[serde(default)]
    pub inputs: Map<String, Value>,
    /// Static agent configuration, distinct from per-invocation inputs
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub output_schema: Option<Value>,
    #[serde(default)]
    pub config: Map<String, Value>,
}

impl WorkflowSpec {
    pub fn from_yaml(document: &str) -> Result<Self, FlowError> {
        Ok(serde_yaml::from_str(document)?)
    }

    pub fn from_json(document: &str) -> Result<Self, FlowError> {
        Ok(serde_json::from_str(document)?)
    }

    /// Parse a document, choosing the format from the file extension
    /// (`.json` is JSON, everything else is treated as YAML).
    pub fn from_document(path: &Path, document: &str) -> Result<Self, FlowError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(document),
            _ => Self::from_yaml(document),
        }
    }

    /// Structural invariants: at least one step, well-formed ids, no
    /// duplicate ids. Agent-name and template validation need the registry
    /// and resolver and live in the orchestrator.
    pub fn validate_structure(&self) -> Result<(), FlowError> {
        if self.steps.is_empty() {
            return Err(FlowError::EmptyWorkflow);
        }

        let mut seen = HashSet::with_capacity(self.steps.len());
        for step in &self.steps {
            if !STEP_ID_PATTERN.is_match(&step.id) {
                return Err(FlowError::InvalidStepId {
                    step_id: step.id.clone(),
                });
            }
            if !seen.insert(step.id.as_str()) {
                return Err(FlowError::DuplicateStepId {
                    step_id: step.id.clone(),
                });
            }
        }
        Ok(())
    }
}
