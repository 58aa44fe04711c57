//! Prompt coaching – cognitive tips, quality meter, focused refinement and
//! the rule-based expansion pipeline.
//!
//! Keyword checks here are case-insensitive substring matches, unlike the
//! whole-word rules in [`crate::prompt`].

use crate::types::{CognitionLevel, QualityBreakdown, RefinementFocus};

pub const TIP_PURPOSE: &str = "Consider explaining the purpose behind your question: what are you trying to create, solve, or transform?";
pub const TIP_PERSONA: &str = "Try asking the AI to take on a specific persona or perspective to widen the depth of insight.";
pub const TIP_SHORT: &str = "Your prompt is short. What assumptions are being left unsaid that the AI may miss?";
pub const TIP_TONE: &str = "You haven't specified tone. Consider if you want confidence, warmth, humility, or authority in the response.";
pub const TIP_SURPRISE: &str = "What outcome would surprise you? Ask the AI to help you think beyond your current framing.";
pub const TIP_AUTOMATE: &str = "If this question could be automated forever, what would that system need to know or handle?";

const SHORT_PROMPT_CHARS: usize = 40;

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    let lowered = haystack.to_lowercase();
    needles.iter().any(|n| lowered.contains(n))
}

// ---------------------------------------------------------------------------
// Coaching
// ---------------------------------------------------------------------------

/// Reflection tips for a prompt. Blank input yields no tips.
pub fn coaching_tips(prompt: &str) -> Vec<String> {
    if prompt.trim().is_empty() {
        return Vec::new();
    }

    let mut tips = Vec::new();
    if !contains_any(prompt, &["why", "how", "purpose", "goal", "intended"]) {
        tips.push(TIP_PURPOSE);
    }
    if !contains_any(prompt, &["assume", "pretend", "role", "perspective"]) {
        tips.push(TIP_PERSONA);
    }
    if prompt.chars().count() < SHORT_PROMPT_CHARS {
        tips.push(TIP_SHORT);
    }
    if !contains_any(prompt, &["emotional", "empathetic", "tone", "voice"]) {
        tips.push(TIP_TONE);
    }
    tips.push(TIP_SURPRISE);
    tips.push(TIP_AUTOMATE);

    tips.into_iter().map(String::from).collect()
}

pub fn cognition_level(prompt: &str) -> CognitionLevel {
    let text = prompt.trim();
    let reflective = contains_any(
        text,
        &["reflect", "awareness", "bias", "assumption", "meta", "how am i"],
    );
    let strategic = contains_any(
        text,
        &["goal", "optimize", "process", "framework", "structure"],
    );
    let empathic = contains_any(text, &["emotion", "ethic", "integrity", "impact", "human"]);
    let creative = contains_any(
        text,
        &["system", "transcend", "transformation", "legacy", "divine"],
    );
    let curious = contains_any(text, &["why", "how", "what", "can"]);

    if reflective && strategic && empathic && creative {
        CognitionLevel::Divine
    } else if reflective || (strategic && empathic) {
        CognitionLevel::MetaCognitive
    } else if strategic {
        CognitionLevel::Strategic
    } else if curious {
        CognitionLevel::Curious
    } else {
        CognitionLevel::Reactive
    }
}

// ---------------------------------------------------------------------------
// Quality meter
// ---------------------------------------------------------------------------

struct Trait {
    keywords: &'static [&'static str],
    matched_base: f64,
    unmatched: f64,
}

const CLARITY: Trait = Trait {
    keywords: &[
        "who", "what", "when", "where", "why", "how", "define", "explain", "step-by-step",
        "clearly",
    ],
    matched_base: 50.0,
    unmatched: 40.0,
};
const DEPTH: Trait = Trait {
    keywords: &["system", "principle", "philosophy", "impact", "consequence", "unseen"],
    matched_base: 60.0,
    unmatched: 30.0,
};
const EMPATHY: Trait = Trait {
    keywords: &["emotion", "empathy", "tone", "inclusive", "compassion", "human"],
    matched_base: 70.0,
    unmatched: 25.0,
};
const CREATIVITY: Trait = Trait {
    keywords: &["metaphor", "story", "imagine", "vision", "invent", "transform", "alchemy"],
    matched_base: 65.0,
    unmatched: 35.0,
};
const STRUCTURE: Trait = Trait {
    keywords: &["format", "sections", "bullets", "numbered", "framework"],
    matched_base: 60.0,
    unmatched: 30.0,
};

impl Trait {
    fn score(&self, prompt: &str, length: usize) -> f64 {
        if contains_any(prompt, self.keywords) {
            (self.matched_base + length as f64 * 0.1).min(100.0)
        } else {
            self.unmatched
        }
    }
}

pub fn quality_breakdown(prompt: &str) -> QualityBreakdown {
    let length = prompt.chars().count();
    QualityBreakdown {
        clarity: CLARITY.score(prompt, length),
        depth: DEPTH.score(prompt, length),
        empathy: EMPATHY.score(prompt, length),
        creativity: CREATIVITY.score(prompt, length),
        structure: STRUCTURE.score(prompt, length),
    }
}

// ---------------------------------------------------------------------------
// Refinement
// ---------------------------------------------------------------------------

pub fn refine(prompt: &str, focus: RefinementFocus) -> String {
    let injection = match focus {
        RefinementFocus::Clarity => " Clarify the goal and reduce ambiguity. Define terms clearly.",
        RefinementFocus::Depth => {
            " Go deeper into principles, unseen layers, and long-term implications."
        }
        RefinementFocus::Empathy => {
            " Adjust tone for compassion, respect, and human emotional context."
        }
        RefinementFocus::Creativity => {
            " Add imaginative elements like metaphor, story, or analogy."
        }
        RefinementFocus::Structure => {
            " Organize the response into headings, bullets, or frameworks."
        }
    };
    format!("{}{}", prompt.trim(), injection)
}

// ---------------------------------------------------------------------------
// Expansion pipeline
// ---------------------------------------------------------------------------

type ExpansionRule = fn(String) -> String;

const EXPANSION_PIPELINE: [ExpansionRule; 8] = [
    inject_role,
    clarify_purpose,
    add_structure,
    embed_tone,
    include_edge_cases,
    explain_reasoning,
    future_proof,
    teach_back,
];

/// Run every expansion rule over the trimmed prompt, in order.
pub fn expand(prompt: &str) -> String {
    EXPANSION_PIPELINE
        .iter()
        .fold(prompt.trim().to_string(), |acc, rule| rule(acc))
}

fn inject_role(prompt: String) -> String {
    if contains_any(&prompt, &["assume the role"]) {
        return prompt;
    }
    format!(
        "Assume the role of an emotionally intelligent, knowledgeable AI assistant. {}",
        prompt
    )
}

fn clarify_purpose(prompt: String) -> String {
    if contains_any(&prompt, &["purpose", "intent", "goal"]) {
        return prompt;
    }
    format!(
        "{} Make sure to clarify the user's intent and expand it into a clear mission.",
        prompt
    )
}

fn add_structure(prompt: String) -> String {
    format!("{} Present your response using structured formatting: titles, bullet points, numbered steps, and summaries.", prompt)
}

fn embed_tone(prompt: String) -> String {
    format!("{} Tailor the tone to be confident, encouraging, and human-centered with emotional intelligence.", prompt)
}

fn include_edge_cases(prompt: String) -> String {
    format!("{} Identify and explain how to handle potential edge cases, risks, or breakdown scenarios.", prompt)
}

fn explain_reasoning(prompt: String) -> String {
    format!("{} Briefly explain your reasoning process so the user can learn how decisions were made.", prompt)
}

fn future_proof(prompt: String) -> String {
    format!("{} Anticipate future needs or extensions the user may not realize and suggest them proactively.", prompt)
}

fn teach_back(prompt: String) -> String {
    format!("{} Reinforce user understanding by summarizing what they should learn and how they can apply it independently.", prompt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tips_blank_prompt() {
        assert!(coaching_tips("   ").is_empty());
    }

    #[test]
    fn test_tips_short_prompt() {
        let tips = coaching_tips("list cats");
        assert_eq!(
            tips,
            vec![TIP_PURPOSE, TIP_PERSONA, TIP_SHORT, TIP_TONE, TIP_SURPRISE, TIP_AUTOMATE]
        );
    }

    #[test]
    fn test_tips_rich_prompt() {
        let tips = coaching_tips(
            "Assume the role of a mentor. Why does my goal matter? Use a warm tone and voice.",
        );
        assert_eq!(tips, vec![TIP_SURPRISE, TIP_AUTOMATE]);
    }

    #[test]
    fn test_cognition_levels() {
        assert_eq!(cognition_level("list cats"), CognitionLevel::Reactive);
        assert_eq!(cognition_level("why is the sky blue"), CognitionLevel::Curious);
        assert_eq!(cognition_level("optimize my day"), CognitionLevel::Strategic);
        assert_eq!(
            cognition_level("reflect on my bias"),
            CognitionLevel::MetaCognitive
        );
        assert_eq!(
            cognition_level("a goal with human impact"),
            CognitionLevel::MetaCognitive
        );
        assert_eq!(
            cognition_level("reflect on the goal, its human impact and my legacy"),
            CognitionLevel::Divine
        );
    }

    #[test]
    fn test_quality_breakdown() {
        let q = quality_breakdown("tell me a joke");
        assert_eq!(q.clarity, 40.0);
        assert_eq!(q.depth, 30.0);
        assert_eq!(q.empathy, 25.0);
        assert_eq!(q.creativity, 35.0);
        assert_eq!(q.structure, 30.0);

        // 21 chars -> +2.1
        let q = quality_breakdown("explain it in a story");
        assert!((q.clarity - 52.1).abs() < 1e-9);
        assert!((q.creativity - 67.1).abs() < 1e-9);
    }

    #[test]
    fn test_quality_caps_at_100() {
        let long = format!("human {}", "x".repeat(1000));
        assert_eq!(quality_breakdown(&long).empathy, 100.0);
    }

    #[test]
    fn test_refine_appends_focus() {
        assert_eq!(
            refine("  Describe Rome  ", RefinementFocus::Structure),
            "Describe Rome Organize the response into headings, bullets, or frameworks."
        );
    }

    #[test]
    fn test_expand_pipeline_order() {
        let out = expand("Plan a trip");
        assert!(out.starts_with("Assume the role of"));
        let structure = out.find("structured formatting").unwrap();
        let teach = out.find("Reinforce user understanding").unwrap();
        assert!(structure < teach);
        assert!(out.contains("clarify the user's intent"));
    }

    #[test]
    fn test_expand_respects_existing_role_and_goal() {
        let out = expand("Assume the role of a chef. My goal is dinner.");
        assert!(out.starts_with("Assume the role of a chef."));
        assert!(!out.contains("clarify the user's intent"));
    }
}
