//! Command registry and built-in commands.
//!
//! Commands are registered by name and invoked with JSON input/output.

use crate::coach;
use crate::context::AppContext;
use crate::prompt;
use crate::traits::CapError;
use crate::types::*;
use crate::workbench;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Instant;

/// Signature for all engine commands.
pub type CommandHandler = fn(Value, &AppContext) -> Result<Value, CommandError>;

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("storage: {0}")]
    Storage(#[from] CapError),
    #[error("serialization: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("{0}")]
    Other(String),
}

impl CommandError {
    pub fn error_code(&self) -> ErrorCode {
        match self {
            CommandError::InvalidInput(_) => ErrorCode::InvalidInput,
            CommandError::Storage(CapError::Io(_)) => ErrorCode::IoError,
            CommandError::Storage(CapError::InvalidKey(_)) => ErrorCode::InvalidInput,
            CommandError::Storage(CapError::Unsupported(_)) => ErrorCode::Unsupported,
            CommandError::Storage(CapError::Timeout) => ErrorCode::Timeout,
            CommandError::Storage(_) => ErrorCode::StorageError,
            CommandError::Serde(_) | CommandError::Other(_) => ErrorCode::InternalError,
        }
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

pub struct CommandRegistry {
    handlers: HashMap<String, CommandHandler>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        let mut reg = Self {
            handlers: HashMap::new(),
        };
        reg.register("ping", cmd_ping);
        reg.register("analyze", cmd_analyze);
        reg.register("enhance", cmd_enhance);
        reg.register("coach", cmd_coach);
        reg.register("quality", cmd_quality);
        reg.register("refine", cmd_refine);
        reg.register("suggest", cmd_suggest);
        reg.register("expand", cmd_expand);
        reg.register("deep_link", cmd_deep_link);
        reg.register("vault_list", cmd_vault_list);
        reg.register("vault_clear", cmd_vault_clear);
        reg.register("events", cmd_events);
        reg.register("clear_events", cmd_clear_events);
        reg.register("set_mode", cmd_set_mode);
        reg.register("set_preview_outcome", cmd_set_preview_outcome);
        reg.register("toasts", cmd_toasts);
        reg
    }

    pub fn register(&mut self, name: &str, handler: CommandHandler) {
        self.handlers.insert(name.to_string(), handler);
    }

    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(|s| s.as_str()).collect();
        names.sort();
        names
    }

    /// Execute a command by name and return a full CommandResult.
    pub fn execute(&self, name: &str, args: Value, ctx: &AppContext) -> CommandResult {
        let run_id = new_run_id();
        let start = Instant::now();

        let handler = match self.handlers.get(name) {
            Some(h) => h,
            None => {
                return result_err(
                    "call",
                    name,
                    &run_id,
                    start.elapsed().as_millis() as u64,
                    ErrorCode::InvalidInput,
                    format!("unknown command: {}", name),
                );
            }
        };

        match handler(args, ctx) {
            Ok(data) => {
                let mut r = result_ok("call", name, &run_id, start.elapsed().as_millis() as u64);
                r.data = Some(data);
                r
            }
            Err(e) => {
                tracing::debug!(command = name, error = %e, "command failed");
                result_err(
                    "call",
                    name,
                    &run_id,
                    start.elapsed().as_millis() as u64,
                    e.error_code(),
                    e.to_string(),
                )
            }
        }
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn str_arg<'a>(args: &'a Value, field: &str) -> Result<&'a str, CommandError> {
    args.get(field)
        .and_then(|v| v.as_str())
        .ok_or_else(|| CommandError::InvalidInput(format!("missing '{}' string field", field)))
}

fn parse_arg<T>(args: &Value, field: &str) -> Result<T, CommandError>
where
    T: std::str::FromStr<Err = String>,
{
    str_arg(args, field)?
        .parse()
        .map_err(CommandError::InvalidInput)
}

// ===========================================================================
// Prompt engine commands
// ===========================================================================

/// `ping` – returns { "pong": true }. Proves wiring works.
fn cmd_ping(_args: Value, _ctx: &AppContext) -> Result<Value, CommandError> {
    Ok(json!({ "pong": true }))
}

/// `analyze` – `{ "prompt": "..." }` -> PromptAnalysis.
fn cmd_analyze(args: Value, _ctx: &AppContext) -> Result<Value, CommandError> {
    let raw = str_arg(&args, "prompt")?;
    Ok(serde_json::to_value(prompt::analyze(raw))?)
}

/// `enhance` – `{ "prompt": "..." }` -> `{ analysis, enhanced }`.
///
/// Pure transformation; does not touch the runner or the vault.
fn cmd_enhance(args: Value, _ctx: &AppContext) -> Result<Value, CommandError> {
    let raw = str_arg(&args, "prompt")?;
    let analysis = prompt::analyze(raw);
    let enhanced = prompt::enhance(&analysis);
    Ok(json!({ "analysis": analysis, "enhanced": enhanced }))
}

fn cmd_coach(args: Value, _ctx: &AppContext) -> Result<Value, CommandError> {
    let raw = str_arg(&args, "prompt")?;
    Ok(json!({
        "tips": coach::coaching_tips(raw),
        "cognitionLevel": coach::cognition_level(raw),
    }))
}

fn cmd_quality(args: Value, _ctx: &AppContext) -> Result<Value, CommandError> {
    let raw = str_arg(&args, "prompt")?;
    Ok(serde_json::to_value(coach::quality_breakdown(raw))?)
}

/// `refine` – `{ "prompt": "...", "focus": "clarity" }` -> `{ refined }`.
fn cmd_refine(args: Value, _ctx: &AppContext) -> Result<Value, CommandError> {
    let raw = str_arg(&args, "prompt")?;
    let focus: RefinementFocus = parse_arg(&args, "focus")?;
    Ok(json!({ "focus": focus, "refined": coach::refine(raw, focus) }))
}

/// `suggest` – `{ "text": "..." }` -> `{ suggestion }` (null when none).
fn cmd_suggest(args: Value, _ctx: &AppContext) -> Result<Value, CommandError> {
    let text = str_arg(&args, "text")?;
    Ok(json!({ "suggestion": prompt::suggest_completion(text) }))
}

fn cmd_expand(args: Value, _ctx: &AppContext) -> Result<Value, CommandError> {
    let raw = str_arg(&args, "prompt")?;
    Ok(json!({ "expanded": coach::expand(raw) }))
}

/// `deep_link` – `{ "prompt": "<meta prompt>" }` -> `{ url }`.
fn cmd_deep_link(args: Value, ctx: &AppContext) -> Result<Value, CommandError> {
    let meta = str_arg(&args, "prompt")?;
    let url = workbench::deep_link(&ctx.deep_link_base, meta).ok_or_else(|| {
        CommandError::InvalidInput("cannot build a link for an empty prompt".into())
    })?;
    Ok(json!({ "url": url }))
}

// ===========================================================================
// Vault commands
// ===========================================================================

fn cmd_vault_list(_args: Value, ctx: &AppContext) -> Result<Value, CommandError> {
    let entries = ctx.vault().load()?;
    Ok(json!({ "count": entries.len(), "entries": entries }))
}

fn cmd_vault_clear(_args: Value, ctx: &AppContext) -> Result<Value, CommandError> {
    ctx.vault().clear()?;
    Ok(json!({ "cleared": true }))
}

// ===========================================================================
// Simulation runner commands
// ===========================================================================

fn cmd_events(_args: Value, ctx: &AppContext) -> Result<Value, CommandError> {
    Ok(json!({ "events": ctx.runner().events() }))
}

fn cmd_clear_events(_args: Value, ctx: &AppContext) -> Result<Value, CommandError> {
    ctx.runner().clear_events();
    Ok(json!({ "cleared": true }))
}

/// `set_mode` – `{ "mode": "live", "preview_outcome": "failure"? }`.
fn cmd_set_mode(args: Value, ctx: &AppContext) -> Result<Value, CommandError> {
    let mode: Mode = parse_arg(&args, "mode")?;
    if args.get("preview_outcome").is_some() {
        let outcome: PreviewOutcome = parse_arg(&args, "preview_outcome")?;
        ctx.runner().set_preview_outcome(outcome);
    }
    ctx.runner().set_mode(mode);
    Ok(json!({
        "mode": ctx.runner().mode(),
        "previewOutcome": ctx.runner().preview_outcome(),
    }))
}

fn cmd_set_preview_outcome(args: Value, ctx: &AppContext) -> Result<Value, CommandError> {
    let outcome: PreviewOutcome = parse_arg(&args, "outcome")?;
    ctx.runner().set_preview_outcome(outcome);
    Ok(json!({ "previewOutcome": outcome }))
}

fn cmd_toasts(_args: Value, ctx: &AppContext) -> Result<Value, CommandError> {
    Ok(json!({ "toasts": ctx.runner().toasts().list() }))
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::AppContext;

    #[test]
    fn test_ping_command() {
        let ctx = AppContext::default_headless();
        let reg = CommandRegistry::new();
        let result = reg.execute("ping", json!({}), &ctx);
        assert_eq!(result.status, Status::Pass);
        assert_eq!(result.data.unwrap()["pong"], true);
    }

    #[test]
    fn test_unknown_command() {
        let ctx = AppContext::default_headless();
        let reg = CommandRegistry::new();
        let result = reg.execute("nonexistent", json!({}), &ctx);
        assert_eq!(result.status, Status::Error);
        assert_eq!(result.error.unwrap().code, ErrorCode::InvalidInput);
    }

    #[test]
    fn test_analyze_and_enhance() {
        let ctx = AppContext::default_headless();
        let reg = CommandRegistry::new();

        let a = reg.execute("analyze", json!({ "prompt": "Explain how tides work" }), &ctx);
        assert_eq!(a.status, Status::Pass);
        let data = a.data.unwrap();
        assert_eq!(data["intent"], "explanation");
        assert_eq!(data["detectedLanguage"], "en");

        let e = reg.execute("enhance", json!({ "prompt": "Explain how tides work" }), &ctx);
        let data = e.data.unwrap();
        let meta = data["enhanced"]["metaPrompt"].as_str().unwrap();
        assert!(meta.starts_with("# Task\nEXPLANATION"));
    }

    #[test]
    fn test_missing_prompt_is_invalid_input() {
        let ctx = AppContext::default_headless();
        let reg = CommandRegistry::new();
        let r = reg.execute("analyze", json!({}), &ctx);
        assert_eq!(r.status, Status::Error);
        let err = r.error.unwrap();
        assert_eq!(err.code, ErrorCode::InvalidInput);
        assert!(err.message.contains("prompt"));
    }

    #[test]
    fn test_refine_rejects_unknown_focus() {
        let ctx = AppContext::default_headless();
        let reg = CommandRegistry::new();
        let ok = reg.execute("refine", json!({ "prompt": "hi", "focus": "depth" }), &ctx);
        assert_eq!(ok.status, Status::Pass);
        assert_eq!(ok.data.unwrap()["focus"], "depth");

        let bad = reg.execute("refine", json!({ "prompt": "hi", "focus": "speed" }), &ctx);
        assert_eq!(bad.error.unwrap().code, ErrorCode::InvalidInput);
    }

    #[test]
    fn test_suggest_returns_null_without_match() {
        let ctx = AppContext::default_headless();
        let reg = CommandRegistry::new();
        let r = reg.execute("suggest", json!({ "text": "zzz" }), &ctx);
        assert_eq!(r.data.unwrap()["suggestion"], Value::Null);
    }

    #[test]
    fn test_set_mode_and_toasts() {
        let ctx = AppContext::default_headless();
        let reg = CommandRegistry::new();

        let r = reg.execute(
            "set_mode",
            json!({ "mode": "preview", "preview_outcome": "failure" }),
            &ctx,
        );
        assert_eq!(r.status, Status::Pass);
        let data = r.data.unwrap();
        assert_eq!(data["mode"], "preview");
        assert_eq!(data["previewOutcome"], "failure");
        assert_eq!(ctx.runner().mode(), Mode::Preview);

        let t = reg.execute("toasts", json!({}), &ctx).data.unwrap();
        assert_eq!(t["toasts"][0]["title"], "Mode Switched");

        let bad = reg.execute("set_mode", json!({ "mode": "turbo" }), &ctx);
        assert_eq!(bad.error.unwrap().code, ErrorCode::InvalidInput);
        assert_eq!(ctx.runner().mode(), Mode::Preview);
    }

    #[test]
    fn test_vault_list_and_clear() {
        let ctx = AppContext::default_headless();
        let reg = CommandRegistry::new();
        let analysis = prompt::analyze("Write a poem");
        ctx.vault()
            .record("Write a poem", prompt::enhance(&analysis))
            .unwrap();

        let list = reg.execute("vault_list", json!({}), &ctx).data.unwrap();
        assert_eq!(list["count"], 1);
        assert_eq!(list["entries"][0]["raw"], "Write a poem");

        reg.execute("vault_clear", json!({}), &ctx);
        let list = reg.execute("vault_list", json!({}), &ctx).data.unwrap();
        assert_eq!(list["count"], 0);
    }

    #[test]
    fn test_deep_link_command() {
        let ctx = AppContext::default_headless();
        let reg = CommandRegistry::new();
        let r = reg.execute("deep_link", json!({ "prompt": "hello world" }), &ctx);
        assert_eq!(
            r.data.unwrap()["url"],
            "https://chat.openai.com/?prompt=hello+world"
        );
        let empty = reg.execute("deep_link", json!({ "prompt": " " }), &ctx);
        assert_eq!(empty.status, Status::Error);
    }

    #[test]
    fn test_storage_error_codes() {
        assert_eq!(
            CommandError::from(CapError::Network("down".into())).error_code(),
            ErrorCode::StorageError
        );
        assert_eq!(
            CommandError::from(CapError::Io(std::io::Error::other("disk"))).error_code(),
            ErrorCode::IoError
        );
        assert_eq!(
            CommandError::from(CapError::Timeout).error_code(),
            ErrorCode::Timeout
        );
        assert_eq!(
            CommandError::from(CapError::Unsupported("offline".into())).error_code(),
            ErrorCode::Unsupported
        );
    }

    #[test]
    fn test_list_commands() {
        let reg = CommandRegistry::new();
        let names = reg.list();
        for name in ["ping", "analyze", "enhance", "vault_list", "set_mode", "toasts"] {
            assert!(names.contains(&name), "missing {}", name);
        }
    }
}
