//! # Guidance Rule Engine
//!
//! Maps the five questionnaire answers to a distilled sentence, an ordered
//! list of suggestions, and one uplifting message.
//!
//! The engine is pure and total: it never fails and has no side effects.
//!
//! ## Rule Order
//!
//! 1. Area rules, tested independently in table order. Every matching rule
//!    appends its pair of suggestions (fan-out, not first-match).
//! 2. Exactly one timeline nudge, always last.
//! 3. Message: the "stuck" group is checked before the "hopeful" group and
//!    wins when both match.

use crate::{DerivedGuidance, ReflectionInput};

// =============================================================================
// RULE TABLES
// =============================================================================

/// An area rule: if the normalized area contains any keyword, both
/// suggestions are appended.
#[derive(Debug, Clone, Copy)]
pub struct AreaRule {
    pub keywords: &'static [&'static str],
    pub suggestions: [&'static str; 2],
}

/// Area rules in evaluation order.
pub const AREA_RULES: [AreaRule; 5] = [
    AreaRule {
        keywords: &["career"],
        suggestions: [
            "List 3 roles or paths that genuinely excite you.",
            "Draft a tiny experiment for each (coffee chat, 1-day trial project, or a short course).",
        ],
    },
    AreaRule {
        keywords: &["growth", "mindset"],
        suggestions: [
            "Write a 2-sentence reframe of your current self-talk.",
            "Choose one practice to repeat daily for 7 days (journaling, meditation, or movement).",
        ],
    },
    AreaRule {
        keywords: &["purpose"],
        suggestions: [
            "Identify a person or group you want to positively impact this month.",
            "Describe how your strengths could serve them in one simple action.",
        ],
    },
    AreaRule {
        keywords: &["relationship"],
        suggestions: [
            "Note one honest feeling you haven\u{2019}t voiced yet\u{2014}then plan a gentle, specific share.",
            "Ask one curious question that invites deeper understanding.",
        ],
    },
    AreaRule {
        keywords: &["decision"],
        suggestions: [
            "Write the 2 best options. For each, list 3 pros, 3 cons, and how Future-You feels.",
            "Do a 24-hour pause after deciding, then re-check your felt sense.",
        ],
    },
];

/// Timeline substrings that select the urgent nudge.
pub const URGENCY_KEYWORDS: &[&str] = &["now", "today", "1", "one", "2", "soon", "week"];

/// Nudge appended when the timeline sounds urgent.
pub const URGENT_NUDGE: &str =
    "Pick the smallest 15-minute action and schedule it in your calendar right now.";

/// Nudge appended otherwise.
pub const PLANNING_NUDGE: &str =
    "Block a 30-minute slot this week to design your next step without distractions.";

/// Feeling substrings that select the reassurance message. Checked first.
pub const STRUGGLING_KEYWORDS: &[&str] = &["stuck", "lost", "overwhelmed", "anxious"];

/// Feeling substrings that select the momentum message.
pub const ENERGIZED_KEYWORDS: &[&str] = &["hopeful", "excited", "curious", "ready"];

pub const DEFAULT_MESSAGE: &str = "Progress comes from gentle steps.";

pub const REASSURANCE_MESSAGE: &str =
    "You\u{2019}re not behind. Even one clear, kind step is real momentum.";

pub const MOMENTUM_MESSAGE: &str = "Your curiosity is the signal\u{2014}follow it lightly.";

// =============================================================================
// ENGINE
// =============================================================================

/// Derive the generated fields of a reflection from its answers.
#[must_use]
pub fn derive(input: &ReflectionInput) -> DerivedGuidance {
    let feeling = normalize(&input.feeling);
    let area = normalize(&input.area);
    let timeline = normalize(&input.action_timeline);
    let challenge = input.challenge.trim();
    let desired = input.desired_outcome.trim();

    let distilled = format!(
        "You're feeling {feeling} and seeking direction in {area}. \
         The core block seems to be: {challenge}. \
         You hope to come away with: {desired}."
    );

    let mut guidance: Vec<String> = AREA_RULES
        .iter()
        .filter(|rule| contains_any(&area, rule.keywords))
        .flat_map(|rule| rule.suggestions.iter().map(|s| (*s).to_string()))
        .collect();
    guidance.push(timeline_nudge(&timeline).to_string());

    DerivedGuidance {
        distilled,
        guidance,
        message: message_for(&feeling).to_string(),
    }
}

/// Trimmed, lowercased form used for keyword matching.
fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

fn contains_any(haystack: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| haystack.contains(k))
}

fn timeline_nudge(timeline: &str) -> &'static str {
    if contains_any(timeline, URGENCY_KEYWORDS) {
        URGENT_NUDGE
    } else {
        PLANNING_NUDGE
    }
}

fn message_for(feeling: &str) -> &'static str {
    if contains_any(feeling, STRUGGLING_KEYWORDS) {
        REASSURANCE_MESSAGE
    } else if contains_any(feeling, ENERGIZED_KEYWORDS) {
        MOMENTUM_MESSAGE
    } else {
        DEFAULT_MESSAGE
    }
}

// =============================================================================
// TESTS
// =============================================================================
