//! Scenario runner – execute scripted flows from YAML files.

use crate::commands::CommandRegistry;
use crate::context::AppContext;
use crate::simulate::{SimulateError, SimulateOptions, Stub};
use crate::types::*;
use serde_json::json;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

pub const STUB_FAILURE_MESSAGE: &str = "stubbed failure";

/// Load a scenario from a YAML string.
pub fn load_scenario(yaml: &str) -> Result<Scenario, String> {
    serde_yaml::from_str(yaml).map_err(|e| format!("failed to parse scenario YAML: {}", e))
}

/// Execute a scenario and return the overall result.
///
/// A step whose observed status or outcome differs from its expectation
/// marks the whole scenario as failed; later steps still run.
pub async fn run_scenario(
    scenario: &Scenario,
    ctx: &AppContext,
    registry: &CommandRegistry,
) -> ScenarioResult {
    let mut step_results = Vec::new();
    let mut overall = Status::Pass;

    for (i, step) in scenario.steps.iter().enumerate() {
        let result = match step {
            ScenarioStep::Call {
                call,
                args,
                expect_status,
            } => {
                let r = registry.execute(call, args.clone(), ctx);
                let actual_status = r.status.as_str();
                if actual_status != expect_status.as_str() {
                    tracing::warn!(
                        step = i,
                        expected = %expect_status,
                        actual = %actual_status,
                        "scenario step status mismatch"
                    );
                    overall = Status::Fail;
                }
                r
            }
            ScenarioStep::SetMode {
                set_mode,
                preview_outcome,
            } => {
                if let Some(outcome) = preview_outcome {
                    ctx.runner().set_preview_outcome(*outcome);
                }
                ctx.runner().set_mode(*set_mode);
                let mut r = result_ok("set_mode", set_mode.as_str(), &new_run_id(), 0);
                r.data = Some(json!({
                    "mode": set_mode,
                    "previewOutcome": ctx.runner().preview_outcome(),
                }));
                r
            }
            ScenarioStep::Simulate {
                simulate,
                retries,
                fail_times,
                stub,
                expect,
            } => {
                let r = run_simulate_step(ctx, simulate, *retries, *fail_times, *stub).await;
                let actual = r
                    .data
                    .as_ref()
                    .and_then(|d| d["outcome"].as_str())
                    .unwrap_or_default();
                if actual != expect.as_str() {
                    tracing::warn!(
                        step = i,
                        expected = %expect,
                        actual = %actual,
                        "scenario simulate outcome mismatch"
                    );
                    overall = Status::Fail;
                }
                r
            }
        };
        step_results.push(result);
    }

    ScenarioResult {
        name: scenario.name.clone(),
        overall_status: overall,
        step_results,
        events: ctx.runner().events(),
    }
}

/// Run a synthetic operation through the runner. The first `fail_times`
/// attempts fail, every later one succeeds.
async fn run_simulate_step(
    ctx: &AppContext,
    label: &str,
    retries: u32,
    fail_times: u32,
    with_stub: bool,
) -> CommandResult {
    let run_id = new_run_id();
    let start = Instant::now();
    let calls = AtomicU32::new(0);

    let mut options = SimulateOptions::new()
        .retries(retries)
        .describe(format!("scenario operation failing {} time(s)", fail_times));
    if with_stub {
        options = options.stub(Stub::new(
            json!({ "stubbed": true }),
            STUB_FAILURE_MESSAGE.to_string(),
        ));
    }

    let result = ctx
        .runner()
        .simulate(
            label,
            || {
                let attempt = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if attempt <= fail_times {
                        Err(format!("injected failure {}", attempt))
                    } else {
                        Ok(json!({ "attempt": attempt }))
                    }
                }
            },
            options,
        )
        .await;

    let elapsed = start.elapsed().as_millis() as u64;
    let executed = calls.load(Ordering::SeqCst);
    match result {
        Ok(outcome) => {
            let mut r = result_ok("simulate", label, &run_id, elapsed);
            r.data = Some(json!({
                "outcome": outcome.as_str(),
                "executedAttempts": executed,
                "value": outcome.into_value(),
            }));
            r
        }
        Err(e) => {
            let code = if matches!(e, SimulateError::StubRequired) {
                ErrorCode::StubRequired
            } else {
                ErrorCode::OperationFailed
            };
            let mut r = result_err("simulate", label, &run_id, elapsed, code, e.to_string());
            r.data = Some(json!({ "outcome": e.kind(), "executedAttempts": executed }));
            r
        }
    }
}
