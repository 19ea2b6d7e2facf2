//! Lead scoring and ranking
//!
//! Assigns each lead a 0-100 score from revenue fit, employee-count fit
//! and buying-signal presence, then ranks the list highest first.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tracing::{info, warn};

use super::{enforce_output_schema, missing_required, Agent, AgentSpec};

/// Default weights when the step supplies no `scoring_criteria`
const DEFAULT_REVENUE_WEIGHT: f64 = 0.3;
const DEFAULT_EMPLOYEE_WEIGHT: f64 = 0.2;
const DEFAULT_SIGNAL_WEIGHT: f64 = 0.5;

/// Agent responsible for scoring and ranking leads.
///
/// Inputs: `leads` (from prospect search), optional `scoring_criteria`
/// weights. Output: `{ ranked_leads: [...] }` sorted by score descending,
/// each lead annotated with `score` and `ranking`.
pub struct ScoringAgent {
    spec: AgentSpec,
}

impl ScoringAgent {
    pub fn new(spec: AgentSpec) -> Self {
        Self { spec }
    }

    /// Revenue component: full marks at $200M+, linear ramp from $20M,
    /// proportional below the $20M floor.
    fn revenue_score(revenue: f64) -> f64 {
        if revenue >= 200_000_000.0 {
            100.0
        } else if revenue >= 20_000_000.0 {
            50.0 + ((revenue - 20_000_000.0) / 180_000_000.0) * 50.0
        } else {
            (revenue / 20_000_000.0) * 50.0
        }
    }

    /// Employee component: target band is 100-1000
    fn employee_score(employees: f64) -> f64 {
        if (100.0..=1000.0).contains(&employees) {
            100.0
        } else if employees > 1000.0 {
            80.0
        } else {
            (employees / 100.0) * 80.0
        }
    }

    fn score_lead(lead: &Value, weights: (f64, f64, f64)) -> f64 {
        let (revenue_weight, employee_weight, signal_weight) = weights;

        let revenue = lead["revenue"].as_f64().unwrap_or(50_000_000.0);
        let employees = lead["employee_count"].as_f64().unwrap_or(300.0);
        let signal_score = if lead["signal"].as_str().map(|s| !s.is_empty()).unwrap_or(false) {
            100.0
        } else {
            50.0
        };

        let total = Self::revenue_score(revenue) * revenue_weight
            + Self::employee_score(employees) * employee_weight
            + signal_score * signal_weight;

        total.min(100.0)
    }
}

#[async_trait]
impl Agent for ScoringAgent {
    fn name(&self) -> &'static str {
        "ScoringAgent"
    }

    async fn run(&self, inputs: &Map<String, Value>) -> Result<Map<String, Value>> {
        info!(agent_id = %self.spec.agent_id, "starting lead scoring");

        if !missing_required(inputs, &["leads"]).is_empty() {
            warn!("missing leads input, returning empty results");
            let mut output = Map::new();
            output.insert("ranked_leads".into(), json!([]));
            return Ok(output);
        }

        let leads = inputs["leads"].as_array().cloned().unwrap_or_default();
        if leads.is_empty() {
            let mut output = Map::new();
            output.insert("ranked_leads".into(), json!([]));
            return Ok(output);
        }

        let criteria = inputs.get("scoring_criteria").and_then(|v| v.as_object());
        let weight = |key: &str, default: f64| {
            criteria
                .and_then(|c| c.get(key))
                .and_then(|v| v.as_f64())
                .unwrap_or(default)
        };
        let weights = (
            weight("revenue_weight", DEFAULT_REVENUE_WEIGHT),
            weight("employee_count_weight", DEFAULT_EMPLOYEE_WEIGHT),
            weight("signal_weight", DEFAULT_SIGNAL_WEIGHT),
        );

        let mut ranked: Vec<Value> = leads
            .into_iter()
            .map(|lead| {
                let score = (Self::score_lead(&lead, weights) * 100.0).round() / 100.0;
                let mut scored = lead.as_object().cloned().unwrap_or_default();
                scored.insert("score".into(), json!(score));
                Value::Object(scored)
            })
            .collect();

        ranked.sort_by(|a, b| {
            let sa = a["score"].as_f64().unwrap_or(0.0);
            let sb = b["score"].as_f64().unwrap_or(0.0);
            sb.total_cmp(&sa)
        });

        for (i, lead) in ranked.iter_mut().enumerate() {
            if let Some(map) = lead.as_object_mut() {
                map.insert("ranking".into(), json!(i + 1));
            }
        }

        info!(
            scored = ranked.len(),
            top = %ranked[0]["company"].as_str().unwrap_or("?"),
            "scoring complete"
        );

        let mut output = Map::new();
        output.insert("ranked_leads".into(), Value::Array(ranked));
        enforce_output_schema(&self.spec, &output)?;
        Ok(output)
    }
}
