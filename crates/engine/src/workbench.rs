//! Workbench flows – what a front end does when the user presses a button.
//!
//! These stitch the pure prompt engine, the simulation runner, the vault and
//! the best-effort remote together. Outbound calls never disturb local state.

use crate::context::AppContext;
use crate::prompt;
use crate::simulate::{SimulateError, SimulateOptions, Stub};
use crate::traits::CapError;
use crate::types::{EnhancedPrompt, ErrorCode, PromptAnalysis, ToastKind, VaultEntry};
use serde::Serialize;

pub const ENHANCE_LABEL: &str = "Enhance Prompt";

#[derive(Debug, thiserror::Error)]
pub enum WorkbenchError {
    #[error("prompt is empty")]
    EmptyPrompt,
    #[error(transparent)]
    Simulation(#[from] SimulateError<CapError>),
    #[error("vault: {0}")]
    Vault(CapError),
}

impl WorkbenchError {
    pub fn error_code(&self) -> ErrorCode {
        match self {
            WorkbenchError::EmptyPrompt => ErrorCode::InvalidInput,
            WorkbenchError::Simulation(SimulateError::StubRequired) => ErrorCode::StubRequired,
            WorkbenchError::Simulation(_) => ErrorCode::OperationFailed,
            WorkbenchError::Vault(CapError::Io(_)) => ErrorCode::IoError,
            WorkbenchError::Vault(CapError::Unsupported(_)) => ErrorCode::Unsupported,
            WorkbenchError::Vault(CapError::Timeout) => ErrorCode::Timeout,
            WorkbenchError::Vault(_) => ErrorCode::StorageError,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EnhanceReport {
    pub analysis: PromptAnalysis,
    /// How the runner resolved: completed, previewed, simulated or healed.
    pub outcome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enhanced: Option<EnhancedPrompt>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry: Option<VaultEntry>,
    pub synced: bool,
}

fn preview_stub() -> Stub<EnhancedPrompt, CapError> {
    Stub::new(
        EnhancedPrompt {
            meta_prompt: "stub".into(),
            reasoning: vec![],
        },
        CapError::Other("fail".into()),
    )
}

/// Analyze, enhance through the runner, then save and sync the result.
pub async fn enhance_and_save(ctx: &AppContext, raw: &str) -> Result<EnhanceReport, WorkbenchError> {
    if raw.trim().is_empty() {
        return Err(WorkbenchError::EmptyPrompt);
    }

    let analysis = prompt::analyze(raw);
    let runner = ctx.runner();
    let result = runner
        .simulate(
            ENHANCE_LABEL,
            || {
                let enhanced = prompt::enhance(&analysis);
                async move { Ok::<_, CapError>(enhanced) }
            },
            SimulateOptions::new()
                .describe("prompt::enhance(&analysis)")
                .stub(preview_stub()),
        )
        .await;

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => {
            runner.add_toast(ToastKind::Error, "Enhance Failed", e.to_string());
            return Err(e.into());
        }
    };

    let outcome_name = outcome.as_str().to_string();
    let Some(enhanced) = outcome.into_value() else {
        runner.add_toast(
            ToastKind::Info,
            "Nothing Saved",
            format!(
                "Enhancement was not executed in {} mode.",
                runner.mode().as_str().to_uppercase()
            ),
        );
        return Ok(EnhanceReport {
            analysis,
            outcome: outcome_name,
            enhanced: None,
            entry: None,
            synced: false,
        });
    };

    let entry = ctx
        .vault()
        .record(raw, enhanced.clone())
        .map_err(WorkbenchError::Vault)?;
    runner.add_toast(ToastKind::Success, "Enhanced", "Prompt saved to vault.");
    let synced = sync_entry(ctx, &entry).await;

    Ok(EnhanceReport {
        analysis,
        outcome: outcome_name,
        enhanced: Some(enhanced),
        entry: Some(entry),
        synced,
    })
}

/// Mirror an entry to the remote vault. Failures are logged, not returned.
pub async fn sync_entry(ctx: &AppContext, entry: &VaultEntry) -> bool {
    match ctx.remote().post_vault_entry(entry).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "remote vault sync failed");
            false
        }
    }
}

/// Ask the remote rewriter for a better prompt. `None` on blank input or
/// when the endpoint is unreachable.
pub async fn rewrite(ctx: &AppContext, raw: &str) -> Option<String> {
    if raw.trim().is_empty() {
        return None;
    }
    let runner = ctx.runner();
    runner.add_toast(ToastKind::Info, "GPT-Rewrite", "Contacting LLM...");
    match ctx.remote().rewrite(raw).await {
        Ok(rewritten) => {
            runner.add_toast(ToastKind::Success, "GPT-Rewrite Complete", "Prompt updated.");
            Some(rewritten)
        }
        Err(e) => {
            tracing::warn!(error = %e, "rewriter call failed");
            runner.add_toast(ToastKind::Error, "GPT-Rewrite Failed", "Endpoint unreachable.");
            None
        }
    }
}

/// External chat link carrying the meta prompt as a query parameter.
///
/// The query is form-encoded, so spaces come out as `+` rather than `%20`.
/// Chat front ends decode both to the same prompt.
pub fn deep_link(base: &str, meta_prompt: &str) -> Option<String> {
    if meta_prompt.trim().is_empty() {
        return None;
    }
    reqwest::Url::parse_with_params(base, &[("prompt", meta_prompt)])
        .map(|url| url.to_string())
        .map_err(|e| tracing::warn!(error = %e, base, "invalid deep link base"))
        .ok()
}
