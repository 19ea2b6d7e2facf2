//! Step executor
//!
//! Executes one step against the current shared state: resolves declared
//! inputs, binds the agent, invokes it, and converts every possible
//! outcome - success, agent failure, unresolved inputs - into a
//! [`StepResult`]. Nothing an agent does can escape this boundary and
//! take the run down with it.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};

use crate::agent::AgentSpec;
use crate::config::Credentials;
use crate::error::FlowError;
use crate::event_log::{EventKind, EventLog};
use crate::registry::AgentRegistry;
use crate::state::{epoch_ms, SharedState};
use crate::template::TemplateResolver;
use crate::workflow::StepSpec;

/// Terminal status of one step attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Completed,
    Failed,
    Skipped,
}

/// What happened when the step ran
#[derive(Debug, Clone)]
pub enum StepOutcome {
    Completed { output: Map<String, Value> },
    Failed { error: String },
    Skipped { reason: String },
}

impl StepOutcome {
    pub fn status(&self) -> StepStatus {
        match self {
            StepOutcome::Completed { .. } => StepStatus::Completed,
            StepOutcome::Failed { .. } => StepStatus::Failed,
            StepOutcome::Skipped { .. } => StepStatus::Skipped,
        }
    }
}

/// One entry in the run's audit trail
#[derive(Debug, Clone)]
pub struct StepResult {
    pub step_id: String,
    pub agent: String,
    pub outcome: StepOutcome,
    pub started_at_ms: u64,
    pub duration: Duration,
}

impl StepResult {
    pub fn is_completed(&self) -> bool {
        matches!(self.outcome, StepOutcome::Completed { .. })
    }
}

/// Executes steps one at a time with read-only access to shared state
pub struct StepExecutor {
    registry: Arc<AgentRegistry>,
    resolver: TemplateResolver,
    credentials: Credentials,
    event_log: EventLog,
}

impl StepExecutor {
    pub fn new(registry: Arc<AgentRegistry>, credentials: Credentials, event_log: EventLog) -> Self {
        Self {
            registry,
            resolver: TemplateResolver::new(),
            credentials,
            event_log,
        }
    }

    pub fn resolver(&self) -> &TemplateResolver {
        &self.resolver
    }

    /// Execute one step. Never returns an error: every failure mode is
    /// folded into the StepResult so the orchestrator can keep going.
    #[instrument(skip(self, step, state), fields(step_id = %step.id, agent = %step.agent))]
    pub async fn execute(&self, step: &StepSpec, state: &SharedState) -> StepResult {
        let started_at_ms = epoch_ms();
        let clock = Instant::now();
        let step_id: Arc<str> = Arc::from(step.id.as_str());

        let finish = |outcome: StepOutcome, elapsed: Duration| StepResult {
            step_id: step.id.clone(),
            agent: step.agent.clone(),
            outcome,
            started_at_ms,
            duration: elapsed,
        };

        // 1. Resolve declared inputs against accumulated state
        let (inputs, unresolved) = match self.resolver.resolve_inputs(&step.inputs, state) {
            Ok(resolved) => resolved,
            Err(e) => {
                // Templates are validated before the run; a parse error
                // here still must not escape the step boundary
                warn!(error = %e, "input resolution failed");
                self.event_log.emit(EventKind::StepFailed {
                    step_id,
                    error: e.to_string(),
                    duration_ms: clock.elapsed().as_millis() as u64,
                });
                return finish(
                    StepOutcome::Failed {
                        error: e.to_string(),
                    },
                    clock.elapsed(),
                );
            }
        };

        // 2. Unresolved references mean an upstream step never produced
        //    the data: skip without invoking the agent
        if !unresolved.is_empty() {
            let reason = format!("unresolved input reference(s): {}", unresolved.join(", "));
            debug!(%reason, "skipping step");
            self.event_log.emit(EventKind::StepSkipped {
                step_id,
                reason: reason.clone(),
            });
            return finish(StepOutcome::Skipped { reason }, clock.elapsed());
        }

        // 3. Bind the agent implementation by name
        let spec = AgentSpec::for_step(step, self.credentials.clone());
        let agent = match self.registry.instantiate(&step.agent, spec) {
            Ok(agent) => agent,
            Err(e) => {
                self.event_log.emit(EventKind::StepFailed {
                    step_id,
                    error: e.to_string(),
                    duration_ms: clock.elapsed().as_millis() as u64,
                });
                return finish(
                    StepOutcome::Failed {
                        error: e.to_string(),
                    },
                    clock.elapsed(),
                );
            }
        };

        self.event_log.emit(EventKind::StepStarted {
            step_id: Arc::clone(&step_id),
            inputs: Value::Object(inputs.clone()),
        });
        self.event_log.emit(EventKind::AgentInvoked {
            step_id: Arc::clone(&step_id),
            agent: step.agent.clone(),
        });

        // 4. Invoke; agent errors become a failed trail entry, never a crash
        match agent.run(&inputs).await {
            Ok(output) => {
                self.event_log.emit(EventKind::StepCompleted {
                    step_id,
                    duration_ms: clock.elapsed().as_millis() as u64,
                });
                finish(StepOutcome::Completed { output }, clock.elapsed())
            }
            Err(e) => {
                let error = FlowError::AgentExecution {
                    step_id: step.id.clone(),
                    agent: step.agent.clone(),
                    message: e.to_string(),
                }
                .to_string();
                warn!(%error, "agent execution failed");
                self.event_log.emit(EventKind::StepFailed {
                    step_id,
                    error: error.clone(),
                    duration_ms: clock.elapsed().as_millis() as u64,
                });
                finish(StepOutcome::Failed { error }, clock.elapsed())
            }
        }
    }
}
