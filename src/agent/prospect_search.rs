//! Prospect discovery against the company catalog
//!
//! Searches for B2B companies matching the workflow's ideal-customer
//! profile. The catalog stands in for the live search/enrichment backends;
//! filtering is deterministic so repeated runs over the same inputs yield
//! the same leads.

use anyhow::Result;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};

use super::{enforce_output_schema, missing_required, Agent, AgentSpec};

/// Company catalog the search filters over
static CATALOG: Lazy<Vec<Value>> = Lazy::new(|| {
    vec![
        json!({
            "company": "CloudSync Technologies",
            "contact_name": "Sarah Mitchell",
            "email": "sarah.mitchell@cloudsync.io",
            "linkedin": "linkedin.com/in/sarahmitchell",
            "title": "VP of Sales",
            "signal": "recent_funding",
            "revenue": 45_000_000u64,
            "employee_count": 250
        }),
        json!({
            "company": "DataFlow Systems",
            "contact_name": "Michael Chen",
            "email": "m.chen@dataflow.com",
            "linkedin": "linkedin.com/in/michaelchen",
            "title": "Chief Revenue Officer",
            "signal": "hiring_for_sales",
            "revenue": 78_000_000u64,
            "employee_count": 450
        }),
        json!({
            "company": "AutoScale Inc",
            "contact_name": "Jennifer Rodriguez",
            "email": "jrodriguez@autoscale.io",
            "linkedin": "linkedin.com/in/jenniferrodriguez",
            "title": "Head of Business Development",
            "signal": "recent_funding",
            "revenue": 32_000_000u64,
            "employee_count": 180
        }),
        json!({
            "company": "SecureAPI Solutions",
            "contact_name": "David Park",
            "email": "david@secureapi.com",
            "linkedin": "linkedin.com/in/davidpark",
            "title": "VP of Marketing",
            "signal": "hiring_for_sales",
            "revenue": 125_000_000u64,
            "employee_count": 620
        }),
        json!({
            "company": "MetricsPro Analytics",
            "contact_name": "Amanda Johnson",
            "email": "ajohnson@metricspro.com",
            "linkedin": "linkedin.com/in/amandajohnson",
            "title": "Director of Sales",
            "signal": "recent_funding",
            "revenue": 55_000_000u64,
            "employee_count": 320
        }),
        json!({
            "company": "PipelineHub",
            "contact_name": "Robert Kim",
            "email": "rkim@pipelinehub.io",
            "linkedin": "linkedin.com/in/robertkim",
            "title": "Chief Operating Officer",
            "signal": "hiring_for_sales",
            "revenue": 89_000_000u64,
            "employee_count": 410
        }),
        json!({
            "company": "RevOps Platform",
            "contact_name": "Lisa Thompson",
            "email": "lisa.t@revopsplatform.com",
            "linkedin": "linkedin.com/in/lisathompson",
            "title": "VP of Revenue Operations",
            "signal": "recent_funding",
            "revenue": 67_000_000u64,
            "employee_count": 380
        }),
        json!({
            "company": "GrowthEngine AI",
            "contact_name": "James Wilson",
            "email": "jwilson@growthengine.ai",
            "linkedin": "linkedin.com/in/jameswilson",
            "title": "Head of Sales",
            "signal": "hiring_for_sales",
            "revenue": 42_000_000u64,
            "employee_count": 215
        }),
    ]
});

/// Agent responsible for discovering and collecting prospect leads.
///
/// Inputs: `industry`, `location`, `employee_count` ({min, max}),
/// `signals` (list of buying signals). Output: `{ leads: [...] }`.
pub struct ProspectSearchAgent {
    spec: AgentSpec,
}

impl ProspectSearchAgent {
    pub fn new(spec: AgentSpec) -> Self {
        Self { spec }
    }

    fn matches_icp(lead: &Value, min_employees: u64, max_employees: u64, signals: &[&str]) -> bool {
        let employees = lead["employee_count"].as_u64().unwrap_or(0);
        if employees < min_employees || employees > max_employees {
            return false;
        }
        let signal = lead["signal"].as_str().unwrap_or("");
        signals.is_empty() || signals.contains(&signal)
    }
}

#[async_trait]
impl Agent for ProspectSearchAgent {
    fn name(&self) -> &'static str {
        "ProspectSearchAgent"
    }

    async fn run(&self, inputs: &Map<String, Value>) -> Result<Map<String, Value>> {
        info!(agent_id = %self.spec.agent_id, "starting prospect search");

        let missing = missing_required(inputs, &["industry", "location", "employee_count", "signals"]);
        if !missing.is_empty() {
            warn!(?missing, "missing required inputs, returning empty leads");
            let mut output = Map::new();
            output.insert("leads".into(), json!([]));
            return Ok(output);
        }

        let industry = inputs["industry"].as_str().unwrap_or("N/A");
        let location = inputs["location"].as_str().unwrap_or("N/A");
        debug!(industry, location, "searching catalog");

        let min_employees = inputs["employee_count"]["min"].as_u64().unwrap_or(0);
        let max_employees = inputs["employee_count"]["max"].as_u64().unwrap_or(u64::MAX);
        let signals: Vec<&str> = inputs["signals"]
            .as_array()
            .map(|a| a.iter().filter_map(|s| s.as_str()).collect())
            .unwrap_or_default();

        let leads: Vec<Value> = CATALOG
            .iter()
            .filter(|lead| Self::matches_icp(lead, min_employees, max_employees, &signals))
            .cloned()
            .collect();

        info!(
            total_searched = CATALOG.len(),
            matched = leads.len(),
            "prospect search complete"
        );

        let mut output = Map::new();
        output.insert("leads".into(), Value::Array(leads));
        enforce_output_schema(&self.spec, &output)?;
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn icp_inputs() -> Map<String, Value> {
        json!({
            "industry": "SaaS",
            "location": "USA",
            "employee_count": {"min": 100, "max": 1000},
            "signals": ["recent_funding", "hiring_for_sales"]
        })
        .as_object()
        .cloned()
        .unwrap()
    }

    #[tokio::test]
    async fn full_icp_matches_whole_catalog() {
        let agent = ProspectSearchAgent::new(AgentSpec::bare("search"));
        let output = agent.run(&icp_inputs()).await.unwrap();
        assert_eq!(output["leads"].as_array().unwrap().len(), 8);
    }

    #[tokio::test]
    async fn employee_range_filters_catalog() {
        let agent = ProspectSearchAgent::new(AgentSpec::bare("search"));
        let mut inputs = icp_inputs();
        inputs.insert("employee_count".into(), json!({"min": 400, "max": 1000}));

        let output = agent.run(&inputs).await.unwrap();
        let leads = output["leads"].as_array().unwrap();
        // DataFlow (450), SecureAPI (620), PipelineHub (410)
        assert_eq!(leads.len(), 3);
        assert!(leads
            .iter()
            .all(|l| l["employee_count"].as_u64().unwrap() >= 400));
    }

    #[tokio::test]
    async fn signal_filter_applies() {
        let agent = ProspectSearchAgent::new(AgentSpec::bare("search"));
        let mut inputs = icp_inputs();
        inputs.insert("signals".into(), json!(["recent_funding"]));

        let output = agent.run(&inputs).await.unwrap();
        let leads = output["leads"].as_array().unwrap();
        assert_eq!(leads.len(), 4);
        assert!(leads.iter().all(|l| l["signal"] == "recent_funding"));
    }

    #[tokio::test]
    async fn missing_inputs_yield_empty_leads_not_error() {
        let agent = ProspectSearchAgent::new(AgentSpec::bare("search"));
        let inputs = Map::new();

        let output = agent.run(&inputs).await.unwrap();
        assert_eq!(output["leads"], json!([]));
    }

    #[tokio::test]
    async fn search_is_deterministic() {
        let agent = ProspectSearchAgent::new(AgentSpec::bare("search"));
        let first = agent.run(&icp_inputs()).await.unwrap();
        let second = agent.run(&icp_inputs()).await.unwrap();
        assert_eq!(first, second);
    }
}
