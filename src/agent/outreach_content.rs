//! Personalized outreach email generation
//!
//! Drafts one cold email per top-ranked lead from the signal-aware
//! template. A language-model backend could slot in behind the same
//! contract; the template path keeps generation deterministic.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tracing::{info, warn};

use super::{enforce_output_schema, missing_required, Agent, AgentSpec};

const DEFAULT_TOP_N: usize = 10;

/// Agent responsible for generating personalized outreach messages.
///
/// Inputs: `ranked_leads`, optional `top_n` (default 10), `persona`,
/// `tone`. Output: `{ messages: [...] }` with subject and body per lead.
pub struct OutreachContentAgent {
    spec: AgentSpec,
}

impl OutreachContentAgent {
    pub fn new(spec: AgentSpec) -> Self {
        Self { spec }
    }

    fn subject_for(company: &str, signal: &str) -> String {
        match signal {
            "recent_funding" => format!("Congrats on {company}'s recent funding!"),
            "hiring_for_sales" => format!("Scaling {company}'s sales team?"),
            _ => format!("Quick idea for {company}"),
        }
    }

    fn body_for(first_name: &str, company: &str, signal: &str) -> String {
        let opening = match signal {
            "recent_funding" => {
                format!("I saw that {company} recently raised funding - congrats! That's exciting.")
            }
            "hiring_for_sales" => {
                format!("I noticed {company} is actively hiring for sales roles. Looks like you're scaling!")
            }
            _ => format!("I've been following {company}'s growth and I'm impressed with what you're building."),
        };

        format!(
            "Hi {first_name},\n\n\
             {opening}\n\n\
             I'm reaching out because we work with similar B2B companies to help them \
             streamline their data analytics and improve decision-making processes.\n\n\
             Companies like yours often struggle with:\n\
             - Fragmented data across multiple tools\n\
             - Time-consuming manual reporting\n\
             - Difficulty identifying growth opportunities\n\n\
             Our platform at Analytos.ai helps solve these challenges by providing \
             AI-powered analytics that surface actionable insights automatically.\n\n\
             Would you be open to a quick 15-minute call next week to explore if this \
             could help {company}?\n\n\
             Best regards,\nSDR Team\nAnalytos.ai"
        )
    }

    fn draft_message(lead: &Value) -> Value {
        let company = lead["company"].as_str().unwrap_or("your company");
        let contact_name = lead["contact_name"].as_str().unwrap_or("there");
        let first_name = contact_name.split_whitespace().next().unwrap_or("there");
        let signal = lead["signal"].as_str().unwrap_or("");

        json!({
            "lead": company,
            "email": lead["email"].as_str().unwrap_or(""),
            "contact_name": contact_name,
            "subject": Self::subject_for(company, signal),
            "email_body": Self::body_for(first_name, company, signal),
            "generated_by": "template"
        })
    }
}

#[async_trait]
impl Agent for OutreachContentAgent {
    fn name(&self) -> &'static str {
        "OutreachContentAgent"
    }

    async fn run(&self, inputs: &Map<String, Value>) -> Result<Map<String, Value>> {
        info!(agent_id = %self.spec.agent_id, "starting outreach content generation");

        if !missing_required(inputs, &["ranked_leads"]).is_empty() {
            warn!("missing ranked_leads input, returning empty messages");
            let mut output = Map::new();
            output.insert("messages".into(), json!([]));
            return Ok(output);
        }

        let ranked_leads = inputs["ranked_leads"].as_array().cloned().unwrap_or_default();
        let top_n = inputs
            .get("top_n")
            .and_then(|v| v.as_u64())
            .map(|n| n as usize)
            .unwrap_or(DEFAULT_TOP_N);
        let persona = inputs.get("persona").and_then(|v| v.as_str()).unwrap_or("SDR");
        let tone = inputs
            .get("tone")
            .and_then(|v| v.as_str())
            .unwrap_or("professional and friendly");

        info!(
            candidates = ranked_leads.len(),
            top_n, persona, tone, "drafting messages"
        );

        let messages: Vec<Value> = ranked_leads
            .iter()
            .take(top_n)
            .map(Self::draft_message)
            .collect();

        info!(generated = messages.len(), "outreach content complete");

        let mut output = Map::new();
        output.insert("messages".into(), Value::Array(messages));
        enforce_output_schema(&self.spec, &output)?;
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranked_leads() -> Map<String, Value> {
        json!({
            "ranked_leads": [
                {"company": "DataFlow Systems", "contact_name": "Michael Chen",
                 "email": "m.chen@dataflow.com", "signal": "hiring_for_sales", "score": 91.5},
                {"company": "CloudSync Technologies", "contact_name": "Sarah Mitchell",
                 "email": "sarah.mitchell@cloudsync.io", "signal": "recent_funding", "score": 88.0},
                {"company": "Quiet Corp", "contact_name": "Ana Ruiz",
                 "email": "ana@quiet.example", "signal": "", "score": 61.0}
            ]
        })
        .as_object()
        .cloned()
        .unwrap()
    }

    #[tokio::test]
    async fn drafts_one_message_per_lead() {
        let agent = OutreachContentAgent::new(AgentSpec::bare("outreach"));
        let output = agent.run(&ranked_leads()).await.unwrap();
        let messages = output["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0]["lead"], "DataFlow Systems");
        assert_eq!(messages[0]["generated_by"], "template");
    }

    #[tokio::test]
    async fn subject_follows_signal() {
        let agent = OutreachContentAgent::new(AgentSpec::bare("outreach"));
        let output = agent.run(&ranked_leads()).await.unwrap();
        let messages = output["messages"].as_array().unwrap();

        assert_eq!(messages[0]["subject"], "Scaling DataFlow Systems's sales team?");
        assert_eq!(
            messages[1]["subject"],
            "Congrats on CloudSync Technologies's recent funding!"
        );
        assert_eq!(messages[2]["subject"], "Quick idea for Quiet Corp");
    }

    #[tokio::test]
    async fn body_greets_by_first_name() {
        let agent = OutreachContentAgent::new(AgentSpec::bare("outreach"));
        let output = agent.run(&ranked_leads()).await.unwrap();
        let body = output["messages"][0]["email_body"].as_str().unwrap();
        assert!(body.starts_with("Hi Michael,"));
        assert!(body.contains("DataFlow Systems"));
    }

    #[tokio::test]
    async fn top_n_limits_output() {
        let agent = OutreachContentAgent::new(AgentSpec::bare("outreach"));
        let mut inputs = ranked_leads();
        inputs.insert("top_n".into(), json!(2));

        let output = agent.run(&inputs).await.unwrap();
        assert_eq!(output["messages"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn missing_ranked_leads_yields_empty_messages() {
        let agent = OutreachContentAgent::new(AgentSpec::bare("outreach"));
        let output = agent.run(&Map::new()).await.unwrap();
        assert_eq!(output["messages"], json!([]));
    }
}
