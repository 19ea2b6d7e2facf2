//! Engine configuration, built once at process start and passed down.
//!
//! Agents never read the environment themselves: credentials are loaded
//! here and handed to each agent constructor, opaque to the engine.

use clap::ValueEnum;
use serde::Deserialize;

/// Policy deciding the overall run status once every step has been attempted.
///
/// `BestEffort` reports `completed` whenever validation passed and the run
/// reached the last step, even if individual steps failed or were skipped.
/// `AllSteps` flips the overall status to `failed` unless every step
/// completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum CompletionPolicy {
    BestEffort,
    AllSteps,
}

impl Default for CompletionPolicy {
    fn default() -> Self {
        CompletionPolicy::BestEffort
    }
}

/// Out-of-band credentials for agent backends (search/enrichment APIs,
/// language models). The engine carries but never inspects them.
#[derive(Clone, Default)]
pub struct Credentials {
    pub search_api_key: Option<String>,
    pub llm_api_key: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material
        f.debug_struct("Credentials")
            .field("search_api_key", &self.search_api_key.as_ref().map(|_| "***"))
            .field("llm_api_key", &self.llm_api_key.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Process-wide read-only configuration for the orchestrator.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    /// Policy applied when the workflow document does not declare one
    pub default_policy: CompletionPolicy,
    /// Credentials handed to every agent constructor
    pub credentials: Credentials,
}

impl EngineConfig {
    /// Build configuration from the process environment (honors .env via
    /// dotenvy, loaded in main before this runs).
    pub fn from_env() -> Self {
        Self {
            default_policy: CompletionPolicy::default(),
            credentials: Credentials {
                search_api_key: std::env::var("LEADFLOW_SEARCH_API_KEY").ok(),
                llm_api_key: std::env::var("LEADFLOW_LLM_API_KEY").ok(),
            },
        }
    }
}
