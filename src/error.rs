//! Error types with fix suggestions

use thiserror::Error;

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

/// All error variants are part of the public API.
#[derive(Error, Debug)]
pub enum FlowError {
    #[error("LF-001: YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("LF-001: JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ─────────────────────────────────────────────────────────────
    // Workflow structure errors (LF-002 to LF-004)
    // ─────────────────────────────────────────────────────────────
    #[error("LF-002: workflow has no steps")]
    EmptyWorkflow,

    #[error("LF-003: duplicate step id '{step_id}'")]
    DuplicateStepId { step_id: String },

    #[error("LF-004: invalid step id '{step_id}'")]
    InvalidStepId { step_id: String },

    // ─────────────────────────────────────────────────────────────
    // Binding errors (LF-010 to LF-020)
    // ─────────────────────────────────────────────────────────────
    #[error("LF-010: unknown agent '{agent}' - not registered")]
    UnknownAgent { agent: String },

    #[error("LF-020: template parse error at byte {position}: {details}")]
    TemplateParse { position: usize, details: String },

    // ─────────────────────────────────────────────────────────────
    // Step-level errors (LF-030); captured in the trail, never fatal
    // ─────────────────────────────────────────────────────────────
    #[error("LF-030: agent '{agent}' failed in step '{step_id}': {message}")]
    AgentExecution {
        step_id: String,
        agent: String,
        message: String,
    },
}

impl FlowError {
    /// Configuration errors abort a run before any step executes.
    /// Step-level errors are recorded in the trail instead.
    pub fn is_configuration(&self) -> bool {
        !matches!(self, FlowError::AgentExecution { .. })
    }
}

impl FixSuggestion for FlowError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            FlowError::Yaml(_) => Some("Check YAML syntax: indentation and quoting"),
            FlowError::Json(_) => Some("Check JSON syntax (try parsing with jq)"),
            FlowError::Io(_) => Some("Check file path and permissions"),
            FlowError::EmptyWorkflow => Some("Add at least one step to the steps list"),
            FlowError::DuplicateStepId { .. } => Some("Use a unique id for every step"),
            FlowError::InvalidStepId { .. } => {
                Some("Step ids must start with a letter or '_' and use letters, digits, '_' or '-'")
            }
            FlowError::UnknownAgent { .. } => {
                Some("Check the agent name against the registered agent list (leadflow validate)")
            }
            FlowError::TemplateParse { .. } => {
                Some("Use {{ step_id.output.field }} with balanced '{{' and '}}' markers")
            }
            FlowError::AgentExecution { .. } => {
                Some("Inspect the step's trail entry for the agent's error message")
            }
        }
    }
}
