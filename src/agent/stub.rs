//! Stub agent with configurable responses
//!
//! Returns whatever its step config declares, or fails on demand. Used by
//! engine tests and dry runs the way a live backend never could be.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};

use super::{enforce_output_schema, Agent, AgentSpec};

/// Config keys:
/// - `returns`: object used verbatim as the output mapping
/// - `fail`: string; when present the agent fails with this message
/// - `echo_inputs`: bool; when true the resolved inputs are returned
pub struct StubAgent {
    spec: AgentSpec,
}

impl StubAgent {
    pub fn new(spec: AgentSpec) -> Self {
        Self { spec }
    }
}

#[async_trait]
impl Agent for StubAgent {
    fn name(&self) -> &'static str {
        "StubAgent"
    }

    async fn run(&self, inputs: &Map<String, Value>) -> Result<Map<String, Value>> {
        if let Some(message) = self.spec.config.get("fail").and_then(|v| v.as_str()) {
            anyhow::bail!("{message}");
        }

        let output = if self
            .spec
            .config
            .get("echo_inputs")
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
        {
            inputs.clone()
        } else {
            self.spec
                .config
                .get("returns")
                .and_then(|v| v.as_object())
                .cloned()
                .unwrap_or_default()
        };

        enforce_output_schema(&self.spec, &output)?;
        Ok(output)
    }
}
