//! Campaign feedback analysis
//!
//! Reviews a sent campaign and produces improvement recommendations from
//! a rule table keyed on performance thresholds. Campaign metrics are
//! derived from the input volume with fixed baseline rates; a live email
//! provider integration would replace [`campaign_metrics`].

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tracing::{info, warn};

use super::{enforce_output_schema, missing_required, Agent, AgentSpec};

/// Baseline rates applied to the campaign volume. B2B cold email typically
/// lands at 20-35% open, 2-8% reply, 5-15% click.
const BASELINE_OPEN_RATE: f64 = 0.24;
const BASELINE_REPLY_RATE: f64 = 0.04;
const BASELINE_CLICK_RATE: f64 = 0.09;

const DEFAULT_OPEN_THRESHOLD: f64 = 0.25;
const DEFAULT_REPLY_THRESHOLD: f64 = 0.05;

/// Agent responsible for analyzing campaign results and recommending
/// adjustments.
///
/// Inputs: `responses` (sent messages), optional `campaign_metrics`
/// thresholds. Output: `{ recommendations, campaign_metrics, status }`.
pub struct FeedbackTrainerAgent {
    spec: AgentSpec,
}

impl FeedbackTrainerAgent {
    pub fn new(spec: AgentSpec) -> Self {
        Self { spec }
    }

    fn campaign_metrics(emails_sent: usize) -> Value {
        let sent = emails_sent as f64;
        json!({
            "emails_sent": emails_sent,
            "opens": (sent * BASELINE_OPEN_RATE) as u64,
            "replies": (sent * BASELINE_REPLY_RATE) as u64,
            "clicks": (sent * BASELINE_CLICK_RATE) as u64,
            "open_rate": BASELINE_OPEN_RATE,
            "reply_rate": BASELINE_REPLY_RATE,
            "click_rate": BASELINE_CLICK_RATE
        })
    }

    fn recommendations(metrics: &Value, thresholds: Option<&Map<String, Value>>) -> Vec<Value> {
        let threshold = |key: &str, default: f64| {
            thresholds
                .and_then(|t| t.get(key))
                .and_then(|v| v.as_f64())
                .unwrap_or(default)
        };
        let open_threshold = threshold("open_rate_threshold", DEFAULT_OPEN_THRESHOLD);
        let reply_threshold = threshold("reply_rate_threshold", DEFAULT_REPLY_THRESHOLD);

        let open_rate = metrics["open_rate"].as_f64().unwrap_or(0.0);
        let reply_rate = metrics["reply_rate"].as_f64().unwrap_or(0.0);

        let mut recs = Vec::new();

        if open_rate < open_threshold {
            recs.push(json!({
                "category": "subject_line",
                "current_value": "Generic subject lines",
                "suggested_value": "Try more personalized subject lines with company-specific details",
                "reason": format!("Open rate ({:.1}%) is below target ({:.1}%)",
                                  open_rate * 100.0, open_threshold * 100.0),
                "confidence": 0.85,
                "priority": "high"
            }));
        }

        if reply_rate < reply_threshold {
            recs.push(json!({
                "category": "email_content",
                "current_value": "Current email template",
                "suggested_value": "Shorten email body and add more specific value proposition",
                "reason": format!("Reply rate ({:.1}%) is below target ({:.1}%)",
                                  reply_rate * 100.0, reply_threshold * 100.0),
                "confidence": 0.78,
                "priority": "high"
            }));
        }

        recs.push(json!({
            "category": "icp_targeting",
            "current_value": "Current industry: SaaS, Revenue: $20M-$200M",
            "suggested_value": "Narrow to companies with $50M-$150M revenue for better fit",
            "reason": "Mid-market companies show higher engagement based on initial data",
            "confidence": 0.72,
            "priority": "medium"
        }));

        if open_rate < 0.30 {
            recs.push(json!({
                "category": "send_timing",
                "current_value": "Sending emails throughout the day",
                "suggested_value": "Send emails Tuesday-Thursday, 9-11 AM in prospect's timezone",
                "reason": "Open rates typically higher during mid-week mornings",
                "confidence": 0.80,
                "priority": "medium"
            }));
        }

        recs.push(json!({
            "category": "follow_up",
            "current_value": "Single touchpoint",
            "suggested_value": "Implement 3-touch sequence: Initial, +3 days, +7 days",
            "reason": "Multi-touch sequences increase response rates by 40-60%",
            "confidence": 0.88,
            "priority": "high"
        }));

        // Highest priority first, confidence breaks ties
        let priority_rank = |rec: &Value| match rec["priority"].as_str() {
            Some("high") => 3,
            Some("medium") => 2,
            _ => 1,
        };
        recs.sort_by(|a, b| {
            priority_rank(b).cmp(&priority_rank(a)).then(
                b["confidence"]
                    .as_f64()
                    .unwrap_or(0.0)
                    .total_cmp(&a["confidence"].as_f64().unwrap_or(0.0)),
            )
        });
        recs.truncate(5);
        recs
    }
}

#[async_trait]
impl Agent for FeedbackTrainerAgent {
    fn name(&self) -> &'static str {
        "FeedbackTrainerAgent"
    }

    async fn run(&self, inputs: &Map<String, Value>) -> Result<Map<String, Value>> {
        info!(agent_id = %self.spec.agent_id, "starting feedback analysis");

        if !missing_required(inputs, &["responses"]).is_empty() {
            warn!("missing responses input");
            let mut output = Map::new();
            output.insert("recommendations".into(), json!([]));
            output.insert("status".into(), json!("failed"));
            return Ok(output);
        }

        let responses = inputs["responses"].as_array().cloned().unwrap_or_default();
        if responses.is_empty() {
            let mut output = Map::new();
            output.insert("recommendations".into(), json!([]));
            output.insert("status".into(), json!("no_data"));
            return Ok(output);
        }

        let metrics = Self::campaign_metrics(responses.len());
        info!(
            analyzed = responses.len(),
            open_rate = metrics["open_rate"].as_f64().unwrap_or(0.0),
            reply_rate = metrics["reply_rate"].as_f64().unwrap_or(0.0),
            "campaign metrics derived"
        );

        let thresholds = inputs.get("campaign_metrics").and_then(|v| v.as_object());
        let recommendations = Self::recommendations(&metrics, thresholds);

        info!(count = recommendations.len(), "recommendations generated");

        let mut output = Map::new();
        output.insert("recommendations".into(), Value::Array(recommendations));
        output.insert("campaign_metrics".into(), metrics);
        output.insert("status".into(), json!("pending_approval"));
        enforce_output_schema(&self.spec, &output)?;
        Ok(output)
    }
}
