//! # Agent Abstraction Layer
//!
//! Trait and implementations for workflow agents.
//!
//! ## Overview
//!
//! An agent is one unit of domain logic bound to a workflow step. The
//! engine knows nothing about what an agent does; it only relies on the
//! capability contract:
//!
//! ```rust,ignore
//! #[async_trait]
//! pub trait Agent: Send + Sync {
//!     fn name(&self) -> &'static str;
//!     async fn run(&self, inputs: &Map<String, Value>) -> Result<Map<String, Value>>;
//! }
//! ```
//!
//! Agents report expected business conditions (no matches, empty input
//! lists) as normal output data - an empty `leads` list is not an error.
//! Failure is reserved for exceptional conditions: backend outage, bad
//! credentials, output that violates the step's declared schema.
//!
//! ## Available Agents
//!
//! | Agent | Purpose |
//! |-------|---------|
//! | `ProspectSearchAgent` | Discover companies matching ICP criteria |
//! | `ScoringAgent` | Score and rank leads 0-100 |
//! | `OutreachContentAgent` | Personalized cold-email drafts |
//! | `FeedbackTrainerAgent` | Campaign analysis and recommendations |
//! | `StubAgent` | Configurable canned output, for tests and dry runs |

mod feedback_trainer;
mod outreach_content;
mod prospect_search;
mod scoring;
mod stub;

pub use feedback_trainer::FeedbackTrainerAgent;
pub use outreach_content::OutreachContentAgent;
pub use prospect_search::ProspectSearchAgent;
pub use scoring::ScoringAgent;
pub use stub::StubAgent;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::warn;

use crate::config::Credentials;
use crate::workflow::StepSpec;

/// Step-scoped construction data for an agent: the step id it is bound
/// to, the static configuration from the step spec, and out-of-band
/// credentials the engine never inspects.
#[derive(Debug, Clone)]
pub struct AgentSpec {
    pub agent_id: String,
    pub instructions: Option<String>,
    pub output_schema: Option<Value>,
    pub config: Map<String, Value>,
    pub credentials: Credentials,
}

impl AgentSpec {
    pub fn for_step(step: &StepSpec, credentials: Credentials) -> Self {
        Self {
            agent_id: step.id.clone(),
            instructions: step.instructions.clone(),
            output_schema: step.output_schema.clone(),
            config: step.config.clone(),
            credentials,
        }
    }

    /// Bare spec for direct construction in tests and demos
    pub fn bare(agent_id: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            instructions: None,
            output_schema: None,
            config: Map::new(),
            credentials: Credentials::default(),
        }
    }
}

/// Core trait that all agents implement
///
/// Constructed per step execution with step-scoped [`AgentSpec`];
/// invoked once with the resolved input mapping.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Returns the agent's registered name
    fn name(&self) -> &'static str;

    /// Execute the agent's domain logic
    async fn run(&self, inputs: &Map<String, Value>) -> Result<Map<String, Value>>;
}

/// Names of required inputs that are absent from the mapping
pub(crate) fn missing_required<'a>(
    inputs: &Map<String, Value>,
    required: &[&'a str],
) -> Vec<&'a str> {
    required
        .iter()
        .filter(|field| !inputs.contains_key(**field))
        .copied()
        .collect()
}

/// Validate an agent's own output against the schema declared in its step
/// spec. Validation is an agent-level concern: the engine trusts outputs
/// as-given, so each implementation calls this before returning.
pub(crate) fn enforce_output_schema(spec: &AgentSpec, output: &Map<String, Value>) -> Result<()> {
    let Some(schema) = &spec.output_schema else {
        return Ok(());
    };

    let compiled = jsonschema::validator_for(schema)
        .map_err(|e| anyhow::anyhow!("invalid output_schema for '{}': {}", spec.agent_id, e))?;

    let instance = Value::Object(output.clone());
    if let Err(errors) = compiled.validate(&instance) {
        let messages: Vec<String> = errors.map(|e| e.to_string()).collect();
        warn!(agent_id = %spec.agent_id, "output failed schema validation");
        anyhow::bail!(
            "output of '{}' violates declared schema: {}",
            spec.agent_id,
            messages.join("; ")
        );
    }
    Ok(())
}
