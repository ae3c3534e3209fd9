use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::{indicators, signals, JobContext};

/// One step of a manual trigger: the step name, whether it succeeded, and
/// either the step's response payload or its error text.
#[derive(Debug, Serialize)]
pub struct StepResult {
    #[serde(rename = "type")]
    pub step: &'static str,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregate of a manual trigger run. `success` only when every step that
/// ran succeeded; an empty step list counts as success.
#[derive(Debug, Serialize)]
pub struct TriggerOutcome {
    pub success: bool,
    pub results: Vec<StepResult>,
}

/// Run the steps selected by `action` ("signals", "indicators" or "both"),
/// sequentially, in-process. A value matching neither step runs nothing.
/// One step failing never prevents the other from running.
pub async fn run(ctx: &JobContext, action: &str) -> TriggerOutcome {
    info!(action = %action, "Manual trigger requested");

    let mut results = Vec::new();

    if action == "signals" || action == "both" {
        let result = match signals::run(ctx).await {
            Ok(outcome) => StepResult {
                step: "signals",
                success: true,
                data: Some(signals::success_body(&outcome)),
                error: None,
            },
            Err(e) => StepResult {
                step: "signals",
                success: false,
                data: None,
                error: Some(e.to_string()),
            },
        };
        results.push(result);
    }

    if action == "indicators" || action == "both" {
        let result = match indicators::run(ctx).await {
            Ok(outcome) => StepResult {
                step: "indicators",
                success: true,
                data: Some(indicators::success_body(&outcome)),
                error: None,
            },
            Err(e) => StepResult {
                step: "indicators",
                success: false,
                data: None,
                error: Some(e.to_string()),
            },
        };
        results.push(result);
    }

    let success = results.iter().all(|r| r.success);
    TriggerOutcome { success, results }
}
