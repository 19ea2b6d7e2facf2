//! Agent registry: explicit name-to-implementation binding
//!
//! A closed list of factories built at process start. Lookup is
//! case-exact; an unknown name is a configuration error the orchestrator
//! surfaces before any step runs. No reflection, no discovery by file
//! naming: every implementation is registered here or not at all.

use std::collections::HashMap;

use crate::agent::{
    Agent, AgentSpec, FeedbackTrainerAgent, OutreachContentAgent, ProspectSearchAgent,
    ScoringAgent, StubAgent,
};
use crate::error::FlowError;

/// Constructs one agent instance with step-scoped configuration
pub type AgentFactory = fn(AgentSpec) -> Box<dyn Agent>;

/// Registry of agent factories, keyed by registered name
#[derive(Default)]
pub struct AgentRegistry {
    factories: HashMap<String, AgentFactory>,
}

impl AgentRegistry {
    /// Empty registry; callers register their own factories
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with every built-in agent
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register("ProspectSearchAgent", |spec| {
            Box::new(ProspectSearchAgent::new(spec))
        });
        registry.register("ScoringAgent", |spec| Box::new(ScoringAgent::new(spec)));
        registry.register("OutreachContentAgent", |spec| {
            Box::new(OutreachContentAgent::new(spec))
        });
        registry.register("FeedbackTrainerAgent", |spec| {
            Box::new(FeedbackTrainerAgent::new(spec))
        });
        registry.register("StubAgent", |spec| Box::new(StubAgent::new(spec)));
        registry
    }

    /// Register a factory under a name. Re-registering a name replaces the
    /// previous factory (last writer wins, like the workflow author expects).
    pub fn register(&mut self, name: impl Into<String>, factory: AgentFactory) {
        self.factories.insert(name.into(), factory);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, sorted for stable display
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(|k| k.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn get(&self, name: &str) -> Result<AgentFactory, FlowError> {
        self.factories
            .get(name)
            .copied()
            .ok_or_else(|| FlowError::UnknownAgent {
                agent: name.to_string(),
            })
    }

    /// Look up a factory and construct the agent in one step
    pub fn instantiate(&self, name: &str, spec: AgentSpec) -> Result<Box<dyn Agent>, FlowError> {
        Ok(self.get(name)?(spec))
    }
}

impl std::fmt::Debug for AgentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentRegistry")
            .field("names", &self.names())
            .finish()
    }
}
