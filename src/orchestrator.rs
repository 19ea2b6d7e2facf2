//! Pipeline orchestrator
//!
//! Owns the ordered step list and the shared state for one run. The run
//! is a small state machine: `NotStarted → Running → {Completed, Failed}`.
//! `Failed` is reached only when pre-run validation rejects the workflow -
//! with zero steps attempted. Once steps are running, per-step failures
//! and skips are recorded in the trail and execution continues; downstream
//! steps that depended on a failed step skip themselves through their own
//! unresolved references, so the causal chain stays visible without any
//! dependency-graph machinery.

use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use tracing::{debug, error, info};

use crate::config::{CompletionPolicy, EngineConfig};
use crate::error::FlowError;
use crate::event_log::{EventKind, EventLog};
use crate::executor::{StepExecutor, StepResult};
use crate::registry::AgentRegistry;
use crate::report::{summarize_final_state, ExecutionResult, RunStatus, StepReport};
use crate::state::{epoch_ms, SharedState};
use crate::workflow::WorkflowSpec;

/// Run lifecycle. Terminal states are final; there is no resumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    NotStarted,
    Running,
    Completed,
    Failed,
}

fn transition(state: &mut RunState, to: RunState) {
    debug!(from = ?state, to = ?to, "run state transition");
    *state = to;
}

/// Drives a workflow through the step executor, one step at a time
pub struct Orchestrator {
    registry: Arc<AgentRegistry>,
    config: EngineConfig,
    event_log: EventLog,
}

impl Orchestrator {
    pub fn new(registry: Arc<AgentRegistry>, config: EngineConfig) -> Self {
        Self {
            registry,
            config,
            event_log: EventLog::new(),
        }
    }

    pub fn event_log(&self) -> &EventLog {
        &self.event_log
    }

    /// Fail-fast validation, run before any side effect: structural
    /// invariants, agent resolvability, template syntax.
    pub fn validate(&self, workflow: &WorkflowSpec) -> Result<(), FlowError> {
        workflow.validate_structure()?;

        let resolver = crate::template::TemplateResolver::new();
        for step in &workflow.steps {
            if !self.registry.contains(&step.agent) {
                return Err(FlowError::UnknownAgent {
                    agent: step.agent.clone(),
                });
            }
            resolver.check_inputs(&step.inputs)?;
        }
        Ok(())
    }

    /// Execute the workflow and produce its immutable result record.
    /// Always returns a result - validation failures yield a `failed`
    /// record with an empty trail rather than an error.
    pub async fn run(&self, workflow: &WorkflowSpec) -> ExecutionResult {
        let started_at_ms = epoch_ms();
        let clock = Instant::now();
        let mut run_state = RunState::NotStarted;

        transition(&mut run_state, RunState::Running);
        self.event_log.emit(EventKind::RunStarted {
            step_count: workflow.steps.len(),
        });
        info!(
            workflow = %workflow.workflow_name,
            steps = workflow.steps.len(),
            "starting workflow run"
        );

        if let Err(e) = self.validate(workflow) {
            transition(&mut run_state, RunState::Failed);
            error!(error = %e, "workflow validation failed, no steps attempted");
            self.event_log.emit(EventKind::RunFailed {
                error: e.to_string(),
            });
            return ExecutionResult {
                workflow_name: workflow.workflow_name.clone(),
                status: RunStatus::Failed,
                started_at_ms,
                duration_seconds: clock.elapsed().as_secs_f64(),
                error: Some(e.to_string()),
                steps: Vec::new(),
                final_state: serde_json::Map::new(),
            };
        }

        let mut state = SharedState::new(&workflow.workflow_name, started_at_ms);
        let executor = StepExecutor::new(
            Arc::clone(&self.registry),
            self.config.credentials.clone(),
            self.event_log.clone(),
        );

        let mut trail: Vec<StepResult> = Vec::with_capacity(workflow.steps.len());
        for (index, step) in workflow.steps.iter().enumerate() {
            info!(
                step = index + 1,
                total = workflow.steps.len(),
                step_id = %step.id,
                "executing step"
            );

            let result = executor.execute(step, &state).await;
            if let crate::executor::StepOutcome::Completed { output } = &result.outcome {
                state.insert_output(&step.id, Value::Object(output.clone()));
            }
            trail.push(result);
        }

        // All steps attempted: the run itself completed. The reported
        // status depends on the configured policy.
        transition(&mut run_state, RunState::Completed);
        let policy = workflow.policy.unwrap_or(self.config.default_policy);
        let status = match policy {
            CompletionPolicy::BestEffort => RunStatus::Completed,
            CompletionPolicy::AllSteps => {
                if trail.iter().all(StepResult::is_completed) {
                    RunStatus::Completed
                } else {
                    RunStatus::Failed
                }
            }
        };

        let duration_seconds = clock.elapsed().as_secs_f64();
        self.event_log.emit(EventKind::RunCompleted {
            status,
            duration_ms: clock.elapsed().as_millis() as u64,
        });
        info!(?status, duration_seconds, "workflow run finished");

        ExecutionResult {
            workflow_name: workflow.workflow_name.clone(),
            status,
            started_at_ms,
            duration_seconds,
            error: None,
            steps: trail.iter().map(StepReport::from).collect(),
            final_state: summarize_final_state(&trail),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::StepStatus;

    fn orchestrator() -> Orchestrator {
        Orchestrator::new(Arc::new(AgentRegistry::builtin()), EngineConfig::default())
    }

    fn parse(yaml: &str) -> WorkflowSpec {
        WorkflowSpec::from_yaml(yaml).unwrap()
    }

    #[tokio::test]
    async fn all_steps_completing_yields_completed_run() {
        let workflow = parse(
            r#"
workflow_name: demo
steps:
  - id: a
    agent: StubAgent
    config: { returns: { items: [1, 2] } }
  - id: b
    agent: StubAgent
    config: { returns: { others: [3] } }
"#,
        );

        let result = orchestrator().run(&workflow).await;
        assert_eq!(result.status, RunStatus::Completed);
        assert_eq!(result.steps.len(), 2);
        assert!(result
            .steps
            .iter()
            .all(|s| s.status == StepStatus::Completed));
        assert_eq!(result.final_state["items_count"], 2);
        assert_eq!(result.final_state["others_count"], 1);
    }

    #[tokio::test]
    async fn unknown_agent_fails_before_any_step() {
        let workflow = parse(
            r#"
workflow_name: demo
steps:
  - id: a
    agent: Nonexistent
"#,
        );

        let orch = orchestrator();
        let result = orch.run(&workflow).await;
        assert_eq!(result.status, RunStatus::Failed);
        assert!(result.steps.is_empty());
        assert!(result.error.unwrap().contains("LF-010"));

        // Zero step events: the run failed during validation
        assert!(orch.event_log().events().iter().all(|e| e.kind.is_run_event()));
    }

    #[tokio::test]
    async fn malformed_template_fails_before_any_step() {
        let workflow = parse(
            r#"
workflow_name: demo
steps:
  - id: a
    agent: StubAgent
    inputs:
      broken: "{{ a.output.x"
"#,
        );

        let result = orchestrator().run(&workflow).await;
        assert_eq!(result.status, RunStatus::Failed);
        assert!(result.steps.is_empty());
        assert!(result.error.unwrap().contains("LF-020"));
    }

    #[tokio::test]
    async fn failed_step_does_not_stop_independent_steps() {
        let workflow = parse(
            r#"
workflow_name: demo
steps:
  - id: broken
    agent: StubAgent
    config: { fail: "simulated outage" }
  - id: independent
    agent: StubAgent
    config: { returns: { items: [1] } }
"#,
        );

        let result = orchestrator().run(&workflow).await;
        assert_eq!(result.status, RunStatus::Completed); // best_effort default
        assert_eq!(result.steps[0].status, StepStatus::Failed);
        assert_eq!(result.steps[1].status, StepStatus::Completed);
    }

    #[tokio::test]
    async fn dependent_step_skips_after_upstream_failure() {
        let workflow = parse(
            r#"
workflow_name: demo
steps:
  - id: upstream
    agent: StubAgent
    config: { fail: "boom" }
  - id: dependent
    agent: StubAgent
    inputs:
      data: "{{ upstream.output.items }}"
"#,
        );

        let result = orchestrator().run(&workflow).await;
        assert_eq!(result.steps[1].status, StepStatus::Skipped);
        assert!(result.steps[1]
            .skip_reason
            .as_ref()
            .unwrap()
            .contains("upstream.output.items"));
    }

    #[tokio::test]
    async fn all_steps_policy_flips_status_on_failure() {
        let workflow = parse(
            r#"
workflow_name: demo
policy: all_steps
steps:
  - id: broken
    agent: StubAgent
    config: { fail: "boom" }
  - id: fine
    agent: StubAgent
"#,
        );

        let result = orchestrator().run(&workflow).await;
        assert_eq!(result.status, RunStatus::Failed);
        // Both steps were still attempted
        assert_eq!(result.steps.len(), 2);
    }

    #[tokio::test]
    async fn validate_passes_well_formed_workflow() {
        let workflow = parse(
            r#"
workflow_name: demo
steps:
  - id: a
    agent: StubAgent
    inputs:
      ref: "{{ a.output.x }}"
"#,
        );
        assert!(orchestrator().validate(&workflow).is_ok());
    }
}
