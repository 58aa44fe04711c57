use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Final result JSON – the stable output contract
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResult {
    pub run_id: String,
    pub command: String,
    pub target: String,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
    pub timing_ms: TimingInfo,
    #[serde(default)]
    pub artifacts: Vec<String>,
    /// Arbitrary command-specific payload returned on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Pass,
    Fail,
    Error,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pass => "pass",
            Status::Fail => "fail",
            Status::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: ErrorCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub details: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidInput,
    Unsupported,
    StubRequired,
    OperationFailed,
    NetworkError,
    IoError,
    StorageError,
    Timeout,
    InternalError,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = serde_json::to_value(self)
            .ok()
            .and_then(|v| v.as_str().map(String::from))
            .unwrap_or_else(|| format!("{:?}", self));
        f.write_str(&s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TimingInfo {
    pub total: u64,
}

// ---------------------------------------------------------------------------
// Prompt analysis
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Ru,
    Zh,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Ru => "ru",
            Language::Zh => "zh",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    ContentGeneration,
    Explanation,
    Translation,
    GeneralQuery,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::ContentGeneration => "content_generation",
            Intent::Explanation => "explanation",
            Intent::Translation => "translation",
            Intent::GeneralQuery => "general_query",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured report for a single raw prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptAnalysis {
    pub original: String,
    pub cleaned: String,
    pub detected_language: Language,
    pub intent: Intent,
    pub missing_pieces: Vec<String>,
    pub clarity_score: u8,
    pub vague_words: Vec<String>,
    pub word_count: usize,
    pub has_vague_terms: bool,
    pub has_actionable_verbs: bool,
    pub is_specific: bool,
    pub is_concise: bool,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancedPrompt {
    pub meta_prompt: String,
    pub reasoning: Vec<String>,
}

// ---------------------------------------------------------------------------
// Coaching / quality
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CognitionLevel {
    Reactive,
    Curious,
    Strategic,
    #[serde(rename = "Meta-Cognitive")]
    MetaCognitive,
    Divine,
}

impl fmt::Display for CognitionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CognitionLevel::Reactive => "Reactive",
            CognitionLevel::Curious => "Curious",
            CognitionLevel::Strategic => "Strategic",
            CognitionLevel::MetaCognitive => "Meta-Cognitive",
            CognitionLevel::Divine => "Divine",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityBreakdown {
    pub clarity: f64,
    pub depth: f64,
    pub empathy: f64,
    pub creativity: f64,
    pub structure: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefinementFocus {
    Clarity,
    Depth,
    Empathy,
    Creativity,
    Structure,
}

impl FromStr for RefinementFocus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "clarity" => Ok(RefinementFocus::Clarity),
            "depth" => Ok(RefinementFocus::Depth),
            "empathy" => Ok(RefinementFocus::Empathy),
            "creativity" => Ok(RefinementFocus::Creativity),
            "structure" => Ok(RefinementFocus::Structure),
            other => Err(format!(
                "unknown focus: {} (available: clarity, depth, empathy, creativity, structure)",
                other
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Simulation runner
// ---------------------------------------------------------------------------

/// Execution mode of the simulation runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Live,
    #[default]
    Dry,
    Healing,
    Preview,
}

impl Mode {
    pub const ALL: [Mode; 4] = [Mode::Live, Mode::Dry, Mode::Healing, Mode::Preview];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Live => "live",
            Mode::Dry => "dry",
            Mode::Healing => "healing",
            Mode::Preview => "preview",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mode::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown mode: {} (available: live, dry, healing, preview)", s))
    }
}

/// Which arm of a stub preview mode resolves with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PreviewOutcome {
    #[default]
    Success,
    Failure,
}

impl FromStr for PreviewOutcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "success" => Ok(PreviewOutcome::Success),
            "failure" => Ok(PreviewOutcome::Failure),
            other => Err(format!("unknown preview outcome: {} (available: success, failure)", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Success,
    Failure,
    Retrying,
    Simulated,
    Previewed,
}

/// One append-only record in the simulation log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulatedEvent {
    pub id: u64,
    pub label: String,
    pub mode: Mode,
    pub timestamp: String,
    pub status: EventStatus,
    pub operation: String,
    pub attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stub: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToastMessage {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: ToastKind,
    pub title: String,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Vault
// ---------------------------------------------------------------------------

/// A persisted raw/enhanced prompt pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultEntry {
    /// Milliseconds since the Unix epoch.
    pub ts: i64,
    pub raw: String,
    pub meta: EnhancedPrompt,
}

// ---------------------------------------------------------------------------
// Scenario types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub name: Option<String>,
    pub steps: Vec<ScenarioStep>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScenarioStep {
    Call {
        call: String,
        #[serde(default)]
        args: serde_json::Value,
        #[serde(default = "default_expect_status")]
        expect_status: String,
    },
    SetMode {
        set_mode: Mode,
        #[serde(default)]
        preview_outcome: Option<PreviewOutcome>,
    },
    Simulate {
        simulate: String,
        #[serde(default)]
        retries: u32,
        /// Number of leading attempts that fail before the operation succeeds.
        #[serde(default)]
        fail_times: u32,
        #[serde(default)]
        stub: bool,
        #[serde(default = "default_expect_outcome")]
        expect: String,
    },
}

fn default_expect_status() -> String {
    "pass".to_string()
}

fn default_expect_outcome() -> String {
    "completed".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub name: Option<String>,
    pub overall_status: Status,
    pub step_results: Vec<CommandResult>,
    pub events: Vec<SimulatedEvent>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Generate a new run ID (UUIDv4).
pub fn new_run_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Build a successful CommandResult shell (caller fills in data).
pub fn result_ok(command: &str, target: &str, run_id: &str, total_ms: u64) -> CommandResult {
    CommandResult {
        run_id: run_id.to_string(),
        command: command.to_string(),
        target: target.to_string(),
        status: Status::Pass,
        error: None,
        timing_ms: TimingInfo { total: total_ms },
        artifacts: vec![],
        data: None,
    }
}

/// Build an error CommandResult.
pub fn result_err(
    command: &str,
    target: &str,
    run_id: &str,
    total_ms: u64,
    code: ErrorCode,
    message: impl Into<String>,
) -> CommandResult {
    CommandResult {
        run_id: run_id.to_string(),
        command: command.to_string(),
        target: target.to_string(),
        status: Status::Error,
        error: Some(ErrorInfo {
            code,
            message: message.into(),
            details: serde_json::Value::Null,
        }),
        timing_ms: TimingInfo { total: total_ms },
        artifacts: vec![],
        data: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parse_and_display() {
        for mode in Mode::ALL {
            assert_eq!(mode.to_string().parse::<Mode>().unwrap(), mode);
        }
        assert_eq!("LIVE".parse::<Mode>().unwrap(), Mode::Live);
        assert!("turbo".parse::<Mode>().is_err());
        assert_eq!(Mode::default(), Mode::Dry);
    }

    #[test]
    fn test_analysis_serializes_camel_case() {
        let enhanced = EnhancedPrompt {
            meta_prompt: "# Task".into(),
            reasoning: vec!["Clarity score: 10".into()],
        };
        let json = serde_json::to_value(&enhanced).unwrap();
        assert_eq!(json["metaPrompt"], "# Task");
        assert!(json.get("meta_prompt").is_none());
    }

    #[test]
    fn test_toast_kind_serializes_as_type() {
        let toast = ToastMessage {
            id: 1,
            kind: ToastKind::Info,
            title: "Mode Switched".into(),
            message: "Environment is now in LIVE mode.".into(),
        };
        let json = serde_json::to_value(&toast).unwrap();
        assert_eq!(json["type"], "info");
    }

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::StubRequired.to_string(), "STUB_REQUIRED");
        assert_eq!(ErrorCode::InvalidInput.to_string(), "INVALID_INPUT");
    }

    #[test]
    fn test_cognition_level_serializes_hyphenated() {
        let json = serde_json::to_value(CognitionLevel::MetaCognitive).unwrap();
        assert_eq!(json, "Meta-Cognitive");
    }
}
