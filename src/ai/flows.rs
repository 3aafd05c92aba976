//! The three analysis flows.
//!
//! Each flow binds its input into a fixed prompt, asks the generator for JSON
//! matching a declared schema, and parses the answer into a typed result.
//! Any failure along the way is reported as a generation error for that flow.

use super::TextGenerator;
use crate::error::{Error, Result};
use crate::latency::history::historical_series;
use crate::latency::realtime::topology_links;
use crate::latency::{HistoricalLatency, LatencySnapshot};
use crate::topology::Topology;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

const ANALYZE_FLOW: &str = "analyze latency data";
const SUGGEST_FLOW: &str = "suggest optimal server pairings";
const ADAPT_FLOW: &str = "adapt to network dynamics";

/// Series key used for the aggregate history attached to every flow.
const AGGREGATE_PAIR: &str = "all";

const ANALYZE_PROMPT: &str = "\
You are a systems administrator reviewing network latency for a cryptocurrency trading platform.

Study the real-time and historical latency data below. Look for patterns, anomalies and risks that could hurt trading performance.

Produce a list of alerts. Each alert has a severity (high, medium or low), a specific message describing the issue and an actionable suggested fix.

Also recommend exchange to cloud region pairings that would lower latency under current conditions, explaining which pairings help and why.

Real-time Latency Data: {{realtimeLatencyData}}
Historical Latency Data: {{historicalLatencyData}}

Answer in JSON following the response schema.";

const SUGGEST_PROMPT: &str = "\
You are a network analyst choosing server pairings for cryptocurrency trading infrastructure.

You have current and historical latency between exchange servers and AWS, GCP and Azure co-location regions. Consider latency ranges, historical stability and possible congestion.

Suggest the pairings that minimise latency and maximise trading efficiency, and summarise the reasoning behind them.

Current Latency Data: {{currentLatencyData}}
Historical Latency Data: {{historicalLatencyData}}

Return the suggested pairings as a JSON string and the summary as plain text.";

const ADAPT_PROMPT: &str = "\
You are a network performance optimiser. Using the historical latency data and the current server configurations below, recommend how the deployment should adapt.

Historical Latency Data: {{historicalLatencyData}}

Current Server Configurations: {{currentServerConfigurations}}

Provide, in JSON: the suggested optimal server pairings for current conditions, the routing adjustments that keep performance optimal, and a summary of the analysis.";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
            Severity::Low => "LOW",
        })
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeLatencyInput {
    pub realtime_latency_data: String,
    pub historical_latency_data: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatencyAlert {
    pub severity: Severity,
    pub message: String,
    pub suggested_action: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatencyAnalysis {
    pub alerts: Vec<LatencyAlert>,
    pub optimal_server_pairings: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestPairingsInput {
    pub current_latency_data: String,
    pub historical_latency_data: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairingSuggestion {
    pub suggested_server_pairings: String,
    pub analysis_summary: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdaptInput {
    pub historical_latency_data: String,
    pub current_server_configurations: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkAdaptation {
    pub suggested_server_pairings: String,
    pub suggested_routing_adjustments: String,
    pub analysis_summary: String,
}

pub fn analyze_latency_data(generator: &dyn TextGenerator, input: &AnalyzeLatencyInput) -> Result<LatencyAnalysis> {
    let prompt = render(
        ANALYZE_PROMPT,
        &[
            ("realtimeLatencyData", input.realtime_latency_data.as_str()),
            ("historicalLatencyData", input.historical_latency_data.as_str()),
        ],
    );
    run_flow(generator, ANALYZE_FLOW, &prompt, &analysis_schema())
}

pub fn suggest_optimal_server_pairings(
    generator: &dyn TextGenerator,
    input: &SuggestPairingsInput,
) -> Result<PairingSuggestion> {
    let prompt = render(
        SUGGEST_PROMPT,
        &[
            ("currentLatencyData", input.current_latency_data.as_str()),
            ("historicalLatencyData", input.historical_latency_data.as_str()),
        ],
    );
    run_flow(generator, SUGGEST_FLOW, &prompt, &suggestion_schema())
}

pub fn adapt_to_network_dynamics(generator: &dyn TextGenerator, input: &AdaptInput) -> Result<NetworkAdaptation> {
    let prompt = render(
        ADAPT_PROMPT,
        &[
            ("historicalLatencyData", input.historical_latency_data.as_str()),
            ("currentServerConfigurations", input.current_server_configurations.as_str()),
        ],
    );
    run_flow(generator, ADAPT_FLOW, &prompt, &adaptation_schema())
}

fn run_flow<T: DeserializeOwned>(
    generator: &dyn TextGenerator,
    flow: &'static str,
    prompt: &str,
    schema: &Value,
) -> Result<T> {
    let text = generator.generate(prompt, schema).map_err(|e| e.in_flow(flow))?;
    serde_json::from_str(strip_code_fence(&text)).map_err(|e| Error::from(e).in_flow(flow))
}

fn render(template: &str, values: &[(&str, &str)]) -> String {
    values.iter().fold(template.to_string(), |prompt, (key, value)| {
        prompt.replace(&format!("{{{{{key}}}}}"), value)
    })
}

/// Models sometimes wrap JSON in a markdown fence even when asked not to.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed)
}

fn analysis_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "alerts": {
                "type": "array",
                "description": "Alerts raised by the latency analysis.",
                "items": {
                    "type": "object",
                    "properties": {
                        "severity": { "type": "string", "enum": ["high", "medium", "low"] },
                        "message": { "type": "string", "description": "Description of the potential issue." },
                        "suggestedAction": { "type": "string", "description": "Action that mitigates the issue." }
                    },
                    "required": ["severity", "message", "suggestedAction"]
                }
            },
            "optimalServerPairings": {
                "type": "string",
                "description": "Server pairings that improve latency under current conditions."
            }
        },
        "required": ["alerts", "optimalServerPairings"]
    })
}

fn suggestion_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "suggestedServerPairings": { "type": "string", "description": "JSON string of suggested pairings." },
            "analysisSummary": { "type": "string", "description": "Reasoning behind the pairings." }
        },
        "required": ["suggestedServerPairings", "analysisSummary"]
    })
}

fn adaptation_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "suggestedServerPairings": { "type": "string", "description": "Suggested pairings, in JSON format." },
            "suggestedRoutingAdjustments": { "type": "string", "description": "Routing adjustments, in JSON format." },
            "analysisSummary": { "type": "string", "description": "Summary of the analysis." }
        },
        "required": ["suggestedServerPairings", "suggestedRoutingAdjustments", "analysisSummary"]
    })
}

/// Which flow to run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Analyze,
    Suggest,
    Adapt,
}

impl Flow {
    /// Name used in generation errors.
    pub fn name(self) -> &'static str {
        match self {
            Flow::Analyze => ANALYZE_FLOW,
            Flow::Suggest => SUGGEST_FLOW,
            Flow::Adapt => ADAPT_FLOW,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Flow::Analyze => "Latency alerts",
            Flow::Suggest => "Suggested server pairings",
            Flow::Adapt => "Network adaptation",
        }
    }
}

/// Serialized inputs shared by all flows.
#[derive(Clone, Debug)]
pub struct FlowContext {
    pub realtime: String,
    pub historical: String,
    pub server_configurations: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ServerConfigurations<'a> {
    cloud_regions: &'a [crate::topology::CloudRegion],
    routes: Vec<crate::latency::LatencyData>,
}

impl FlowContext {
    /// Serialize a snapshot plus an aggregate history over `window_hours`.
    pub fn gather(topology: &Topology, snapshot: &LatencySnapshot, window_hours: f64) -> Result<Self> {
        let history: Vec<HistoricalLatency> = historical_series(AGGREGATE_PAIR, window_hours)?;
        let configurations = ServerConfigurations {
            cloud_regions: &topology.cloud_regions,
            routes: topology_links(topology),
        };
        Ok(Self {
            realtime: serde_json::to_string(&snapshot.links)?,
            historical: serde_json::to_string(&history)?,
            server_configurations: serde_json::to_string(&configurations)?,
        })
    }
}

/// Result of any flow.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FlowOutput {
    Analysis(LatencyAnalysis),
    Suggestion(PairingSuggestion),
    Adaptation(NetworkAdaptation),
}

impl FlowOutput {
    /// Lines for display, each tagged with an optional severity.
    pub fn lines(&self) -> Vec<(Option<Severity>, String)> {
        let mut out = Vec::new();
        match self {
            FlowOutput::Analysis(a) => {
                if a.alerts.is_empty() {
                    out.push((None, "No alerts.".to_string()));
                }
                for alert in &a.alerts {
                    out.push((Some(alert.severity), format!("[{}] {}", alert.severity, alert.message)));
                    out.push((Some(alert.severity), format!("  -> {}", alert.suggested_action)));
                }
                out.push((None, String::new()));
                out.push((None, format!("Optimal pairings: {}", a.optimal_server_pairings)));
            }
            FlowOutput::Suggestion(s) => {
                out.push((None, format!("Pairings: {}", s.suggested_server_pairings)));
                out.push((None, String::new()));
                out.push((None, s.analysis_summary.clone()));
            }
            FlowOutput::Adaptation(a) => {
                out.push((None, format!("Pairings: {}", a.suggested_server_pairings)));
                out.push((None, format!("Routing: {}", a.suggested_routing_adjustments)));
                out.push((None, String::new()));
                out.push((None, a.analysis_summary.clone()));
            }
        }
        out
    }
}

/// Run `flow` against the serialized context.
pub fn run(generator: &dyn TextGenerator, flow: Flow, ctx: &FlowContext) -> Result<FlowOutput> {
    match flow {
        Flow::Analyze => analyze_latency_data(
            generator,
            &AnalyzeLatencyInput {
                realtime_latency_data: ctx.realtime.clone(),
                historical_latency_data: ctx.historical.clone(),
            },
        )
        .map(FlowOutput::Analysis),
        Flow::Suggest => suggest_optimal_server_pairings(
            generator,
            &SuggestPairingsInput {
                current_latency_data: ctx.realtime.clone(),
                historical_latency_data: ctx.historical.clone(),
            },
        )
        .map(FlowOutput::Suggestion),
        Flow::Adapt => adapt_to_network_dynamics(
            generator,
            &AdaptInput {
                historical_latency_data: ctx.historical.clone(),
                current_server_configurations: ctx.server_configurations.clone(),
            },
        )
        .map(FlowOutput::Adaptation),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::latency::realtime::generate_realtime_snapshot;
    use crate::latency::LatencyRanges;
    use crate::topology::default_topology;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Mutex;

    /// Replays a canned answer and records what it was asked.
    pub(crate) struct FakeGenerator {
        reply: std::result::Result<String, String>,
        pub prompts: Mutex<Vec<(String, Value)>>,
    }

    impl FakeGenerator {
        pub(crate) fn answering(reply: &str) -> Self {
            Self { reply: Ok(reply.to_string()), prompts: Mutex::new(Vec::new()) }
        }

        pub(crate) fn failing() -> Self {
            Self { reply: Err("connection reset".to_string()), prompts: Mutex::new(Vec::new()) }
        }
    }

    impl TextGenerator for FakeGenerator {
        fn generate(&self, prompt: &str, response_schema: &Value) -> Result<String> {
            self.prompts.lock().unwrap().push((prompt.to_string(), response_schema.clone()));
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(msg) => Err(Error::Io(std::io::Error::new(std::io::ErrorKind::ConnectionReset, msg.clone()))),
            }
        }
    }

    pub(crate) const ANALYSIS_REPLY: &str = r#"{
        "alerts": [
            {"severity": "high", "message": "bybit to azure-eastus above 240 ms", "suggestedAction": "route via aws-ap-northeast-1"},
            {"severity": "low", "message": "okx jitter rising", "suggestedAction": "watch"}
        ],
        "optimalServerPairings": "okx-aws-ap-northeast-1"
    }"#;

    fn analyze_input() -> AnalyzeLatencyInput {
        AnalyzeLatencyInput {
            realtime_latency_data: r#"[{"from":"okx","to":"aws-us-east-1","latency":42.0}]"#.into(),
            historical_latency_data: "[]".into(),
        }
    }

    #[test]
    fn analysis_parses_alerts() {
        let fake = FakeGenerator::answering(ANALYSIS_REPLY);
        let result = analyze_latency_data(&fake, &analyze_input()).unwrap();
        assert_eq!(result.alerts.len(), 2);
        assert_eq!(result.alerts[0].severity, Severity::High);
        assert_eq!(result.alerts[0].suggested_action, "route via aws-ap-northeast-1");
        assert_eq!(result.optimal_server_pairings, "okx-aws-ap-northeast-1");
    }

    #[test]
    fn prompt_embeds_inputs_and_schema() {
        let fake = FakeGenerator::answering(ANALYSIS_REPLY);
        analyze_latency_data(&fake, &analyze_input()).unwrap();
        let prompts = fake.prompts.lock().unwrap();
        let (prompt, schema) = &prompts[0];
        assert!(prompt.contains(r#"Real-time Latency Data: [{"from":"okx""#));
        assert!(prompt.contains("Historical Latency Data: []"));
        assert!(!prompt.contains("{{"));
        assert_eq!(schema["properties"]["alerts"]["items"]["properties"]["severity"]["enum"], json!(["high", "medium", "low"]));
    }

    #[test]
    fn unknown_severity_is_a_generation_error() {
        let fake = FakeGenerator::answering(
            r#"{"alerts":[{"severity":"critical","message":"m","suggestedAction":"a"}],"optimalServerPairings":"x"}"#,
        );
        let err = analyze_latency_data(&fake, &analyze_input()).unwrap_err();
        assert!(matches!(err, Error::Generation { flow: ANALYZE_FLOW, .. }));
        assert!(err.to_string().starts_with("failed to analyze latency data: JSON error"));
    }

    #[test]
    fn missing_field_and_non_json_fail() {
        let fake = FakeGenerator::answering(r#"{"analysisSummary":"only half"}"#);
        let input = SuggestPairingsInput { current_latency_data: "[]".into(), historical_latency_data: "[]".into() };
        assert!(matches!(
            suggest_optimal_server_pairings(&fake, &input),
            Err(Error::Generation { flow: SUGGEST_FLOW, .. })
        ));

        let fake = FakeGenerator::answering("Sure! Here are my thoughts.");
        assert!(suggest_optimal_server_pairings(&fake, &input).is_err());
    }

    #[test]
    fn transport_failure_is_wrapped() {
        let fake = FakeGenerator::failing();
        let input = AdaptInput { historical_latency_data: "[]".into(), current_server_configurations: "{}".into() };
        let err = adapt_to_network_dynamics(&fake, &input).unwrap_err();
        match err {
            Error::Generation { flow, source } => {
                assert_eq!(flow, ADAPT_FLOW);
                assert!(matches!(*source, Error::Io(_)));
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn fenced_json_is_accepted() {
        let fake = FakeGenerator::answering(
            "```json\n{\"suggestedServerPairings\":\"[]\",\"suggestedRoutingAdjustments\":\"none\",\"analysisSummary\":\"stable\"}\n```",
        );
        let input = AdaptInput { historical_latency_data: "[]".into(), current_server_configurations: "{}".into() };
        let out = adapt_to_network_dynamics(&fake, &input).unwrap();
        assert_eq!(out.analysis_summary, "stable");
    }

    #[test]
    fn context_serializes_camel_case_inputs() {
        let topo = default_topology();
        let snapshot = generate_realtime_snapshot(topo, &LatencyRanges::default(), &mut StdRng::seed_from_u64(3));
        let ctx = FlowContext::gather(topo, &snapshot, 7.0).unwrap();
        let realtime: Value = serde_json::from_str(&ctx.realtime).unwrap();
        assert_eq!(realtime.as_array().unwrap().len(), 45);
        let history: Value = serde_json::from_str(&ctx.historical).unwrap();
        assert_eq!(history.as_array().unwrap().len(), 24);
        assert!(ctx.server_configurations.contains("\"serverCount\""));
        assert!(FlowContext::gather(topo, &snapshot, 0.0).is_err());
    }

    #[test]
    fn run_dispatches_by_flow() {
        let fake = FakeGenerator::answering(ANALYSIS_REPLY);
        let ctx = FlowContext { realtime: "[]".into(), historical: "[]".into(), server_configurations: "{}".into() };
        let out = run(&fake, Flow::Analyze, &ctx).unwrap();
        let lines = out.lines();
        assert_eq!(lines[0], (Some(Severity::High), "[HIGH] bybit to azure-eastus above 240 ms".to_string()));
        assert_eq!(lines.last().unwrap().1, "Optimal pairings: okx-aws-ap-northeast-1");
    }
}
