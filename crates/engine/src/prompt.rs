//! Prompt intelligence core – rule-based analysis and meta-prompt synthesis.
//!
//! Both entry points are pure: no I/O, no clock, no randomness. The same
//! input always yields the same [`PromptAnalysis`] and [`EnhancedPrompt`].

use crate::types::{EnhancedPrompt, Intent, Language, PromptAnalysis};
use regex::Regex;
use std::sync::LazyLock;

pub const MISSING_PUNCTUATION: &str = "Add ending punctuation.";
pub const MISSING_TONE: &str = "Specify tone/style/format.";
pub const MISSING_AUDIENCE: &str = "Define target audience.";
pub const LOW_CLARITY: &str = "Add more detail to raise clarity.";

/// Scores below this get a [`LOW_CLARITY`] recommendation.
pub const CLARITY_THRESHOLD: u8 = 60;
const LENGTH_CAP: usize = 60;
const MISSING_PENALTY: i32 = 5;
const CONCISE_MAX_WORDS: usize = 20;

static WH_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(why|how|what|who|when|where)\b").expect("valid pattern"));
static MODAL_VERB: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(should|could|would|can)\b").expect("valid pattern"));
static PLEASE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bplease\b").expect("valid pattern"));
static TONE_STYLE_FORMAT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(tone|style|format)\b").expect("valid pattern"));
static AUDIENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(target audience|reader|user)\b").expect("valid pattern")
});
static ACTIONABLE_VERB: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(create|generate|write|summarize|explain|translate)\b")
        .expect("valid pattern")
});
static VAGUE_TERM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(vague|general|unspecific)\b").expect("valid pattern"));
static VAGUE_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(kind of|sort of|a bit|thing|stuff|something)\b").expect("valid pattern")
});

// Keyword families in priority order; substring match on lower-cased text.
const INTENT_FAMILIES: [(Intent, &[&str]); 3] = [
    (Intent::ContentGeneration, &["create", "generate", "write"]),
    (Intent::Explanation, &["summarize", "explain", "simplify"]),
    (Intent::Translation, &["translate"]),
];

/// Analyze a raw prompt. Accepts any string, including empty input.
pub fn analyze(raw: &str) -> PromptAnalysis {
    let cleaned = raw.trim();
    let detected_language = guess_language(cleaned);
    let intent = classify_intent(cleaned);
    let missing_pieces = detect_missing(cleaned);
    let word_count = cleaned.split_whitespace().count();

    let penalty = MISSING_PENALTY * missing_pieces.len() as i32;
    let clarity_score = (score_clarity(cleaned) as i32 - penalty).clamp(0, 100) as u8;

    let vague_words: Vec<String> = VAGUE_TERM
        .find_iter(cleaned)
        .map(|m| m.as_str().to_string())
        .collect();
    let has_vague_terms = !vague_words.is_empty();

    let mut recommendations = Vec::with_capacity(missing_pieces.len() + 1);
    if clarity_score < CLARITY_THRESHOLD {
        recommendations.push(LOW_CLARITY.to_string());
    }
    recommendations.extend(missing_pieces.iter().cloned());

    PromptAnalysis {
        original: raw.to_string(),
        cleaned: cleaned.to_string(),
        detected_language,
        intent,
        missing_pieces,
        clarity_score,
        vague_words,
        word_count,
        has_vague_terms,
        has_actionable_verbs: ACTIONABLE_VERB.is_match(cleaned),
        is_specific: !has_vague_terms,
        is_concise: word_count <= CONCISE_MAX_WORDS,
        recommendations,
    }
}

/// Turn an analysis into a sectioned meta prompt plus reasoning trace.
pub fn enhance(analysis: &PromptAnalysis) -> EnhancedPrompt {
    let mut lines: Vec<String> = Vec::new();
    lines.push("# Task".into());
    lines.push(analysis.intent.as_str().replacen('_', " ", 1).to_uppercase());
    lines.push(String::new());
    lines.push("# Original Prompt".into());
    lines.push(analysis.cleaned.clone());
    lines.push(String::new());
    if !analysis.missing_pieces.is_empty() {
        lines.push("# Clarifications Added".into());
        lines.extend(analysis.missing_pieces.iter().map(|m| format!("- {}", m)));
        lines.push(String::new());
    }
    lines.push("# Output Format".into());
    lines.push("- Clear, structured answer".into());
    lines.push("- Use markdown where appropriate".into());
    lines.push(String::new());
    lines.push("# Tone".into());
    lines.push("- Professional but approachable".into());

    let mut reasoning = vec![
        format!("Detected language: {}", analysis.detected_language),
        format!("Intent classified as: {}", analysis.intent),
        format!("Clarity score: {}", analysis.clarity_score),
    ];
    reasoning.extend(
        analysis
            .recommendations
            .iter()
            .map(|r| format!("Recommendation: {}", r)),
    );

    EnhancedPrompt {
        meta_prompt: lines.join("\n"),
        reasoning,
    }
}

/// Autocomplete hint for prompts that trail off into a filler phrase.
///
/// Only the first filler occurrence is considered; the suggestion replaces
/// the trailing filler with "specify the <filler>".
pub fn suggest_completion(text: &str) -> Option<String> {
    if text.trim().is_empty() {
        return None;
    }
    let filler = VAGUE_SUFFIX.find(text)?.as_str();
    let head = text.strip_suffix(filler)?;
    Some(format!("{}specify the {}", head, filler))
}

fn guess_language(text: &str) -> Language {
    if text.chars().any(|c| ('\u{0400}'..='\u{04FF}').contains(&c)) {
        Language::Ru
    } else if text.chars().any(|c| ('\u{4E00}'..='\u{9FFF}').contains(&c)) {
        Language::Zh
    } else {
        Language::En
    }
}

fn classify_intent(text: &str) -> Intent {
    let lowered = text.to_lowercase();
    INTENT_FAMILIES
        .iter()
        .find(|(_, words)| words.iter().any(|w| lowered.contains(w)))
        .map(|(intent, _)| *intent)
        .unwrap_or(Intent::GeneralQuery)
}

fn score_clarity(text: &str) -> u32 {
    let mut score = text.chars().count().min(LENGTH_CAP) as u32;
    if WH_WORD.is_match(text) {
        score += 15;
    }
    if MODAL_VERB.is_match(text) {
        score += 10;
    }
    if PLEASE.is_match(text) {
        score += 5;
    }
    score.min(100)
}

fn detect_missing(text: &str) -> Vec<String> {
    let mut missing = Vec::new();
    if !text.trim_end().ends_with(['.', '!', '?']) {
        missing.push(MISSING_PUNCTUATION.to_string());
    }
    if !TONE_STYLE_FORMAT.is_match(text) {
        missing.push(MISSING_TONE.to_string());
    }
    if !AUDIENCE.is_match(text) {
        missing.push(MISSING_AUDIENCE.to_string());
    }
    missing
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translation_prompt() {
        let a = analyze("Translate this text to French.");
        assert_eq!(a.intent, Intent::Translation);
        assert_eq!(a.detected_language, Language::En);
        assert_eq!(a.word_count, 5);
        assert!(a.has_actionable_verbs);
        assert!(a.is_specific);
        assert!(a.missing_pieces.contains(&MISSING_TONE.to_string()));
        assert!(a.missing_pieces.contains(&MISSING_AUDIENCE.to_string()));
        assert!(!a.missing_pieces.contains(&MISSING_PUNCTUATION.to_string()));
        // 30 chars, no bonuses, two missing pieces
        assert_eq!(a.clarity_score, 20);
    }

    #[test]
    fn test_empty_input() {
        let a = analyze("");
        assert_eq!(a.clarity_score, 0);
        assert_eq!(a.word_count, 0);
        assert_eq!(
            a.missing_pieces,
            vec![MISSING_PUNCTUATION, MISSING_TONE, MISSING_AUDIENCE]
        );
        assert_eq!(a.recommendations[0], LOW_CLARITY);
        assert_eq!(a.intent, Intent::GeneralQuery);
    }

    #[test]
    fn test_whitespace_only_input() {
        let a = analyze("   \n\t ");
        assert_eq!(a.original, "   \n\t ");
        assert_eq!(a.cleaned, "");
        assert_eq!(a.clarity_score, 0);
    }

    #[test]
    fn test_language_precedence() {
        assert_eq!(analyze("Привет, мир").detected_language, Language::Ru);
        assert_eq!(analyze("你好世界").detected_language, Language::Zh);
        // Cyrillic is checked before CJK
        assert_eq!(analyze("мир 世界").detected_language, Language::Ru);
        assert_eq!(analyze("hello 123").detected_language, Language::En);
    }

    #[test]
    fn test_intent_priority() {
        // "write" beats "translate" because content generation is checked first
        assert_eq!(
            analyze("Write and translate a poem").intent,
            Intent::ContentGeneration
        );
        assert_eq!(analyze("Please explain monads").intent, Intent::Explanation);
        assert_eq!(analyze("Is it raining?").intent, Intent::GeneralQuery);
        // substring match, so "rewrite" counts as writing
        assert_eq!(analyze("rewrite this").intent, Intent::ContentGeneration);
    }

    #[test]
    fn test_clarity_bonuses() {
        let text = "Why should I use a formal tone for the target audience, please?";
        let a = analyze(text);
        assert!(a.missing_pieces.is_empty());
        // 60 (capped length) + 15 + 10 + 5
        assert_eq!(a.clarity_score, 90);
        assert!(a.recommendations.is_empty());
    }

    #[test]
    fn test_clarity_score_always_in_range() {
        let long = "x".repeat(500);
        let inputs = [
            "",
            "a",
            "why how what who when where should could would can please tone reader.",
            long.as_str(),
            "Why? How? What? Please, could you? Tone, user.",
            "\u{0}\u{FFFF}",
        ];
        for input in inputs {
            let score = analyze(input).clarity_score;
            assert!(score <= 100, "score {} out of range for {:?}", score, input);
        }
    }

    #[test]
    fn test_vague_terms_consistent() {
        let a = analyze("Give me a General, vague overview.");
        assert!(a.has_vague_terms);
        assert!(!a.is_specific);
        assert_eq!(a.vague_words, vec!["General", "vague"]);

        let b = analyze("Summarize chapter three.");
        assert!(!b.has_vague_terms);
        assert!(b.vague_words.is_empty());
    }

    #[test]
    fn test_concise_boundary() {
        let twenty = vec!["word"; 20].join(" ");
        assert!(analyze(&twenty).is_concise);
        let twenty_one = vec!["word"; 21].join(" ");
        assert!(!analyze(&twenty_one).is_concise);
    }

    #[test]
    fn test_analyze_is_idempotent() {
        let input = "  Create a product description for gamers  ";
        assert_eq!(analyze(input), analyze(input));
    }

    #[test]
    fn test_enhance_sections() {
        let a = analyze("Translate this text to French.");
        let e = enhance(&a);
        let expected = "# Task\nTRANSLATION\n\n# Original Prompt\nTranslate this text to French.\n\n\
                        # Clarifications Added\n- Specify tone/style/format.\n- Define target audience.\n\n\
                        # Output Format\n- Clear, structured answer\n- Use markdown where appropriate\n\n\
                        # Tone\n- Professional but approachable";
        assert_eq!(e.meta_prompt, expected);
        assert_eq!(
            e.reasoning,
            vec![
                "Detected language: en",
                "Intent classified as: translation",
                "Clarity score: 20",
                "Recommendation: Add more detail to raise clarity.",
                "Recommendation: Specify tone/style/format.",
                "Recommendation: Define target audience.",
            ]
        );
    }

    #[test]
    fn test_enhance_skips_clarifications_when_complete() {
        let a = analyze("Why should I use a formal tone for the target audience, please?");
        let e = enhance(&a);
        assert!(!e.meta_prompt.contains("# Clarifications Added"));
        assert!(e.meta_prompt.starts_with("# Task\nGENERAL QUERY\n"));
        assert_eq!(e.reasoning.len(), 3);
    }

    #[test]
    fn test_suggest_completion() {
        assert_eq!(
            suggest_completion("Write me some stuff"),
            Some("Write me some specify the stuff".to_string())
        );
        assert_eq!(
            suggest_completion("It is kind of"),
            Some("It is specify the kind of".to_string())
        );
        assert_eq!(suggest_completion("stuff happens here"), None);
        assert_eq!(suggest_completion("   "), None);
        assert_eq!(suggest_completion("no filler"), None);
    }
}
