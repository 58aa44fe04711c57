//! `echoctl` – command-line front end for the EchoMind prompt engine.
//!
//! Analyzes and enhances prompts, drives the dry-run simulation runner, and
//! manages the local prompt vault. Every one-shot subcommand prints the
//! stable `CommandResult` contract (human text or `--json`).

mod logging;
mod settings;

use anyhow::Context;
use clap::{Parser, Subcommand};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, Select};
use echomind_engine::types::*;
use echomind_engine::{coach, prompt, scenario, workbench};
use echomind_engine::{AppContext, CommandRegistry, CommandResult, SimulationRunner};
use serde_json::json;
use settings::Settings;
use std::path::{Path, PathBuf};
use std::time::Instant;

// ===========================================================================
// CLI definition
// ===========================================================================

#[derive(Parser)]
#[command(name = "echoctl", version, about = "Prompt analysis and enhancement workbench")]
struct Cli {
    /// Output as JSON instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a raw prompt.
    Analyze {
        prompt: String,
    },

    /// Enhance a prompt through the simulation runner and save it to the vault.
    Enhance {
        prompt: String,
        /// Runner mode for this call: live | dry | healing | preview.
        #[arg(long)]
        mode: Option<Mode>,
        /// Preview mode answers with the stub's failure arm.
        #[arg(long)]
        preview_failure: bool,
    },

    /// Invoke a registry command by name with JSON args.
    Call {
        /// Command name (e.g. "analyze", "refine", "vault_list").
        cmd: String,
        /// JSON args to pass to the command.
        #[arg(long, default_value = "{}")]
        args: String,
        /// Directory for artifacts output.
        #[arg(long)]
        artifacts: Option<PathBuf>,
    },

    /// Run a scripted scenario from a YAML file.
    RunScenario {
        /// Path to the scenario YAML file.
        file: PathBuf,
        /// Directory for artifacts output.
        #[arg(long)]
        artifacts: Option<PathBuf>,
    },

    /// List the prompt vault, newest first.
    Vault {
        /// Remove every entry instead.
        #[arg(long)]
        clear: bool,
    },

    /// Ask the remote rewriter for an improved prompt.
    Rewrite {
        prompt: String,
    },

    /// Build the external chat link for a prompt's enhanced form.
    Link {
        prompt: String,
    },

    /// Interactive prompt workbench.
    Workbench,

    /// Print the effective configuration (secrets omitted).
    Config,
}

// ===========================================================================
// Main
// ===========================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = settings::load_settings().context("failed to load configuration")?;
    logging::init_logging(&settings.logging);

    // reqwest is built without a bundled crypto provider
    let _ = rustls::crypto::ring::default_provider().install_default();

    let ctx = build_context(&settings)?;
    let registry = CommandRegistry::new();
    let json = cli.json;

    match cli.command {
        Commands::Analyze { prompt } => cmd_analyze(&prompt, json, &settings, &ctx, &registry),
        Commands::Enhance {
            prompt,
            mode,
            preview_failure,
        } => cmd_enhance(&prompt, mode, preview_failure, json, &ctx).await,
        Commands::Call {
            cmd,
            args,
            artifacts,
        } => cmd_call(&cmd, &args, json, artifacts, &ctx, &registry),
        Commands::RunScenario { file, artifacts } => {
            cmd_run_scenario(&file, json, artifacts, &ctx, &registry).await
        }
        Commands::Vault { clear } => {
            let name = if clear { "vault_clear" } else { "vault_list" };
            output_result(&registry.execute(name, json!({}), &ctx), json);
        }
        Commands::Rewrite { prompt } => cmd_rewrite(&prompt, json, &ctx).await,
        Commands::Link { prompt } => cmd_link(&prompt, json, &ctx),
        Commands::Workbench => cmd_workbench(&ctx).await?,
        Commands::Config => println!("{}", serde_json::to_string_pretty(&settings)?),
    }
    Ok(())
}

fn build_context(settings: &Settings) -> anyhow::Result<AppContext> {
    let runner = SimulationRunner::new(settings.simulation.runner_config());
    let data_dir = settings.vault.data_dir.clone();
    let mut ctx = if settings.remote.is_configured() {
        AppContext::default_platform(
            data_dir,
            &settings.remote.base_url,
            settings.remote.timeout(),
            settings.rewriter_api_key().map(String::from),
            runner,
        )
        .context("failed to set up remote endpoints")?
    } else {
        tracing::debug!("no remote base_url configured, running offline");
        AppContext::offline(data_dir, runner)
    };
    ctx.deep_link_base = settings.remote.deep_link_base.clone();
    ctx.vault_capacity = settings.vault.capacity;
    Ok(ctx)
}

// ===========================================================================
// Subcommand implementations
// ===========================================================================

fn cmd_analyze(
    raw: &str,
    json: bool,
    settings: &Settings,
    ctx: &AppContext,
    registry: &CommandRegistry,
) {
    let mut result = registry.execute("analyze", json!({ "prompt": raw }), ctx);
    if settings.feature_enabled("coach") {
        if let Some(serde_json::Value::Object(ref mut data)) = result.data {
            data.insert(
                "coaching".into(),
                json!({
                    "tips": coach::coaching_tips(raw),
                    "cognitionLevel": coach::cognition_level(raw),
                    "quality": coach::quality_breakdown(raw),
                }),
            );
        }
    }
    if settings.feature_enabled("suggestions") {
        if let (Some(suggestion), Some(serde_json::Value::Object(data))) =
            (prompt::suggest_completion(raw), result.data.as_mut())
        {
            data.insert("suggestion".into(), json!(suggestion));
        }
    }
    output_result(&result, json);
}

async fn cmd_enhance(
    raw: &str,
    mode: Option<Mode>,
    preview_failure: bool,
    json: bool,
    ctx: &AppContext,
) {
    let run_id = new_run_id();
    let start = Instant::now();
    if preview_failure {
        ctx.runner().set_preview_outcome(PreviewOutcome::Failure);
    }
    if let Some(mode) = mode {
        ctx.runner().set_mode(mode);
    }

    let outcome = workbench::enhance_and_save(ctx, raw).await;
    let elapsed = start.elapsed().as_millis() as u64;
    let mut result = match outcome {
        Ok(report) => {
            let mut r = result_ok("enhance", ctx.runner().mode().as_str(), &run_id, elapsed);
            r.data = Some(json!({ "report": report }));
            r
        }
        Err(e) => result_err(
            "enhance",
            ctx.runner().mode().as_str(),
            &run_id,
            elapsed,
            e.error_code(),
            e.to_string(),
        ),
    };
    attach_runner_state(&mut result, ctx);
    output_result(&result, json);
}

async fn cmd_rewrite(raw: &str, json: bool, ctx: &AppContext) {
    let run_id = new_run_id();
    let start = Instant::now();
    let rewritten = workbench::rewrite(ctx, raw).await;
    let elapsed = start.elapsed().as_millis() as u64;

    let mut result = match rewritten {
        Some(text) => {
            let mut r = result_ok("rewrite", "remote", &run_id, elapsed);
            r.data = Some(json!({ "rewritten": text }));
            r
        }
        None => {
            let mut r = result_err(
                "rewrite",
                "remote",
                &run_id,
                elapsed,
                ErrorCode::NetworkError,
                "Endpoint unreachable.",
            );
            r.status = Status::Fail;
            r
        }
    };
    attach_runner_state(&mut result, ctx);
    output_result(&result, json);
}

fn cmd_link(raw: &str, json: bool, ctx: &AppContext) {
    let run_id = new_run_id();
    let start = Instant::now();
    let enhanced = prompt::enhance(&prompt::analyze(raw));
    let elapsed = start.elapsed().as_millis() as u64;

    let result = match workbench::deep_link(&ctx.deep_link_base, &enhanced.meta_prompt) {
        Some(url) => {
            let mut r = result_ok("link", &ctx.deep_link_base, &run_id, elapsed);
            r.data = Some(json!({ "url": url }));
            r
        }
        None => result_err(
            "link",
            &ctx.deep_link_base,
            &run_id,
            elapsed,
            ErrorCode::InvalidInput,
            "cannot build a link from this prompt",
        ),
    };
    output_result(&result, json);
}

fn cmd_call(
    cmd: &str,
    args_str: &str,
    json: bool,
    artifacts: Option<PathBuf>,
    ctx: &AppContext,
    registry: &CommandRegistry,
) {
    let args: serde_json::Value = match serde_json::from_str(args_str) {
        Ok(v) => v,
        Err(e) => {
            let r = result_err(
                "call",
                cmd,
                &new_run_id(),
                0,
                ErrorCode::InvalidInput,
                format!("invalid JSON args: {}", e),
            );
            output_result(&r, json);
            return;
        }
    };

    let result = registry.execute(cmd, args, ctx);
    if let Some(ref dir) = artifacts {
        write_artifacts(dir, &result);
    }
    output_result(&result, json);
}

async fn cmd_run_scenario(
    file: &Path,
    json: bool,
    artifacts: Option<PathBuf>,
    ctx: &AppContext,
    registry: &CommandRegistry,
) {
    let yaml = match std::fs::read_to_string(file) {
        Ok(s) => s,
        Err(e) => {
            let r = result_err(
                "run-scenario",
                &file.display().to_string(),
                &new_run_id(),
                0,
                ErrorCode::IoError,
                format!("cannot read scenario file: {}", e),
            );
            output_result(&r, json);
            return;
        }
    };

    let parsed = match scenario::load_scenario(&yaml) {
        Ok(s) => s,
        Err(e) => {
            let r = result_err(
                "run-scenario",
                &file.display().to_string(),
                &new_run_id(),
                0,
                ErrorCode::InvalidInput,
                e,
            );
            output_result(&r, json);
            return;
        }
    };

    let scenario_result = scenario::run_scenario(&parsed, ctx, registry).await;

    if json {
        let j = serde_json::to_string_pretty(&scenario_result).unwrap_or_default();
        println!("{}", j);
    } else {
        println!(
            "Scenario: {}",
            scenario_result.name.as_deref().unwrap_or("<unnamed>")
        );
        println!("Overall: {}", scenario_result.overall_status.as_str());
        for (i, sr) in scenario_result.step_results.iter().enumerate() {
            println!(
                "  Step {}: {} {} -> {} ({}ms)",
                i,
                sr.command,
                sr.target,
                sr.status.as_str(),
                sr.timing_ms.total
            );
        }
        println!("Events: {}", scenario_result.events.len());
    }

    if let Some(ref dir) = artifacts {
        let art_dir = dir.join(new_run_id());
        if let Err(e) = std::fs::create_dir_all(&art_dir) {
            eprintln!(
                "warning: failed to create artifacts dir {}: {}",
                art_dir.display(),
                e
            );
        } else {
            let j = serde_json::to_string_pretty(&scenario_result).unwrap_or_default();
            let _ = std::fs::write(art_dir.join("result.json"), j);

            // Runner events, oldest first, one per line
            let mut lines = String::new();
            for event in scenario_result.events.iter().rev() {
                if let Ok(line) = serde_json::to_string(event) {
                    lines.push_str(&line);
                    lines.push('\n');
                }
            }
            let _ = std::fs::write(art_dir.join("events.jsonl"), lines);
        }
    }

    if scenario_result.overall_status == Status::Fail {
        std::process::exit(1);
    }
}

// ===========================================================================
// Interactive workbench
// ===========================================================================

const ACTIONS: [&str; 11] = [
    "Enhance & save",
    "GPT rewrite",
    "Coach me",
    "Refine",
    "Expand",
    "Suggest completion",
    "Show vault",
    "Open in chat (link)",
    "Switch mode",
    "Event log",
    "Quit",
];

async fn cmd_workbench(ctx: &AppContext) -> anyhow::Result<()> {
    let theme = ColorfulTheme::default();
    let vault = ctx.vault();

    let name = match vault.last_user()? {
        Some(name) => name,
        None => {
            let name: String = Input::with_theme(&theme)
                .with_prompt("Your name")
                .interact_text()?;
            let name = name.trim().to_string();
            vault.set_last_user(&name)?;
            name
        }
    };
    println!("Welcome, {}.", name);

    let mut last_toast: Option<u64> = None;
    loop {
        let choice = Select::with_theme(&theme)
            .with_prompt(format!(
                "[{}] What next?",
                ctx.runner().mode().as_str().to_uppercase()
            ))
            .items(&ACTIONS[..])
            .default(0)
            .interact()?;

        match choice {
            0 => {
                let raw = ask_prompt(&theme)?;
                match workbench::enhance_and_save(ctx, &raw).await {
                    Ok(report) => match report.enhanced {
                        Some(enhanced) => {
                            println!("\n{}\n", enhanced.meta_prompt);
                            for line in &enhanced.reasoning {
                                println!("  - {}", line);
                            }
                        }
                        None => println!("Outcome: {} (nothing executed)", report.outcome),
                    },
                    Err(e) => println!("error: {}", e),
                }
            }
            1 => {
                let raw = ask_prompt(&theme)?;
                if let Some(rewritten) = workbench::rewrite(ctx, &raw).await {
                    println!("\n{}\n", rewritten);
                }
            }
            2 => {
                let raw = ask_prompt(&theme)?;
                println!("Cognition level: {}", coach::cognition_level(&raw));
                let q = coach::quality_breakdown(&raw);
                println!(
                    "Quality: clarity {:.0} depth {:.0} empathy {:.0} creativity {:.0} structure {:.0}",
                    q.clarity, q.depth, q.empathy, q.creativity, q.structure
                );
                for tip in coach::coaching_tips(&raw) {
                    println!("  * {}", tip);
                }
            }
            3 => {
                let raw = ask_prompt(&theme)?;
                let foci = ["clarity", "depth", "empathy", "creativity", "structure"];
                let idx = Select::with_theme(&theme)
                    .with_prompt("Focus")
                    .items(&foci[..])
                    .default(0)
                    .interact()?;
                let focus: RefinementFocus = foci[idx].parse().map_err(anyhow::Error::msg)?;
                println!("\n{}\n", coach::refine(&raw, focus));
            }
            4 => {
                let raw = ask_prompt(&theme)?;
                println!("\n{}\n", coach::expand(&raw));
            }
            5 => {
                let raw = ask_prompt(&theme)?;
                match prompt::suggest_completion(&raw) {
                    Some(s) => println!("Suggestion: {}", s),
                    None => println!("No suggestion."),
                }
            }
            6 => {
                let entries = vault.load()?;
                if entries.is_empty() {
                    println!("Vault is empty.");
                }
                for entry in entries {
                    println!("[{}] {}", entry.ts, entry.raw);
                }
            }
            7 => {
                let raw = ask_prompt(&theme)?;
                let enhanced = prompt::enhance(&prompt::analyze(&raw));
                match workbench::deep_link(&ctx.deep_link_base, &enhanced.meta_prompt) {
                    Some(url) => println!("{}", url),
                    None => println!("Nothing to link."),
                }
            }
            8 => {
                let labels: Vec<&str> = Mode::ALL.iter().map(|m| m.as_str()).collect();
                let current = Mode::ALL
                    .iter()
                    .position(|m| *m == ctx.runner().mode())
                    .unwrap_or(0);
                let idx = Select::with_theme(&theme)
                    .with_prompt("Mode")
                    .items(&labels[..])
                    .default(current)
                    .interact()?;
                ctx.runner().set_mode(Mode::ALL[idx]);
            }
            9 => {
                for event in ctx.runner().events() {
                    println!(
                        "#{} {} [{}] {:?} attempts={}{}",
                        event.id,
                        event.timestamp,
                        event.mode,
                        event.status,
                        event.attempts,
                        event
                            .error
                            .map(|e| format!(" error={}", e))
                            .unwrap_or_default()
                    );
                }
            }
            _ => break,
        }
        print_new_toasts(ctx, &mut last_toast);
    }
    Ok(())
}

fn ask_prompt(theme: &ColorfulTheme) -> anyhow::Result<String> {
    let raw: String = Input::with_theme(theme)
        .with_prompt("Prompt")
        .allow_empty(true)
        .interact_text()?;
    Ok(raw)
}

fn print_new_toasts(ctx: &AppContext, last_seen: &mut Option<u64>) {
    for toast in ctx.runner().toasts().list() {
        if last_seen.is_some_and(|id| toast.id <= id) {
            continue;
        }
        println!("({:?}) {}: {}", toast.kind, toast.title, toast.message);
        *last_seen = Some(toast.id);
    }
}

// ===========================================================================
// Output helpers
// ===========================================================================

/// Fold the runner's mode, event log and visible toasts into the payload.
fn attach_runner_state(result: &mut CommandResult, ctx: &AppContext) {
    let state = json!({
        "mode": ctx.runner().mode(),
        "events": ctx.runner().events(),
        "toasts": ctx.runner().toasts().list(),
    });
    let data = result.data.get_or_insert_with(|| json!({}));
    if let Some(obj) = data.as_object_mut() {
        obj.insert("runner".into(), state);
    } else {
        *data = json!({ "runner": state });
    }
}

fn output_result(result: &CommandResult, json: bool) {
    if json {
        let j = serde_json::to_string_pretty(result).unwrap_or_default();
        println!("{}", j);
    } else {
        print_human(result);
    }

    // Exit with non-zero status on error/fail
    match result.status {
        Status::Pass => {}
        Status::Fail => std::process::exit(1),
        Status::Error => std::process::exit(2),
    }
}

fn print_human(r: &CommandResult) {
    let status_icon = match r.status {
        Status::Pass => "PASS",
        Status::Fail => "FAIL",
        Status::Error => "ERROR",
    };

    println!("[{}] {} {}", status_icon, r.command, r.target);
    println!("  run_id: {}", r.run_id);
    println!("  timing: {}ms", r.timing_ms.total);

    if let Some(ref err) = r.error {
        println!("  error:  {} – {}", err.code, err.message);
    }

    if let Some(ref data) = r.data {
        if let Ok(s) = serde_json::to_string_pretty(data) {
            for line in s.lines() {
                println!("  {}", line);
            }
        }
    }
}

// ===========================================================================
// Artifact helpers
// ===========================================================================

fn write_artifacts(dir: &Path, result: &CommandResult) {
    let art_dir = dir.join(&result.run_id);
    if let Err(e) = std::fs::create_dir_all(&art_dir) {
        eprintln!(
            "warning: failed to create artifacts dir {}: {}",
            art_dir.display(),
            e
        );
        return;
    }

    let j = serde_json::to_string_pretty(result).unwrap_or_default();
    let _ = std::fs::write(art_dir.join("result.json"), &j);

    // events.jsonl (single event for non-scenario)
    if let Ok(line) = serde_json::to_string(result) {
        let _ = std::fs::write(art_dir.join("events.jsonl"), format!("{}\n", line));
    }
}
