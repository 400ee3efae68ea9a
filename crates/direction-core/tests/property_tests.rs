//! # Property-Based Tests
//!
//! Invariants of the guidance engine and the export mapping, checked with
//! proptest over arbitrary answers.

use direction_core::guidance::{
    AREA_RULES, DEFAULT_MESSAGE, ENERGIZED_KEYWORDS, MOMENTUM_MESSAGE, PLANNING_NUDGE,
    REASSURANCE_MESSAGE, STRUGGLING_KEYWORDS, URGENCY_KEYWORDS, URGENT_NUDGE,
};
use direction_core::export::FIELD_LABELS;
use direction_core::{
    Reflection, ReflectionInput, derive, reflection_from_bytes, reflection_to_bytes,
    summary_fields,
};
use proptest::prelude::*;

fn contains_any(haystack: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| haystack.contains(k))
}

fn any_input() -> impl Strategy<Value = ReflectionInput> {
    (
        ".{0,40}",
        ".{0,60}",
        ".{0,40}",
        ".{0,40}",
        ".{0,20}",
    )
        .prop_map(|(f, a, c, d, t)| ReflectionInput::new(f, a, c, d, t))
}

/// Areas built only from words that match no rule.
fn neutral_area() -> impl Strategy<Value = String> {
    proptest::sample::select(vec!["health", "money", "family", "travel", "home", ""])
        .prop_map(str::to_string)
}

proptest! {
    /// Same answers always produce identical output.
    #[test]
    fn derive_is_deterministic(input in any_input()) {
        prop_assert_eq!(derive(&input), derive(&input));
    }

    /// Exactly one timeline nudge, always last, never elsewhere.
    #[test]
    fn exactly_one_nudge_at_the_end(input in any_input()) {
        let derived = derive(&input);
        let nudges = derived
            .guidance
            .iter()
            .filter(|g| g.as_str() == URGENT_NUDGE || g.as_str() == PLANNING_NUDGE)
            .count();
        prop_assert_eq!(nudges, 1);

        let last = derived.guidance.last().map(String::as_str);
        let timeline = input.action_timeline.trim().to_lowercase();
        let expected = if contains_any(&timeline, URGENCY_KEYWORDS) {
            URGENT_NUDGE
        } else {
            PLANNING_NUDGE
        };
        prop_assert_eq!(last, Some(expected));
    }

    /// Guidance length is two per matching rule plus the nudge.
    #[test]
    fn guidance_length_matches_rule_count(input in any_input()) {
        let area = input.area.trim().to_lowercase();
        let matching = AREA_RULES
            .iter()
            .filter(|rule| contains_any(&area, rule.keywords))
            .count();
        prop_assert_eq!(derive(&input).guidance.len(), matching * 2 + 1);
    }

    /// Areas matching no rule yield only the nudge.
    #[test]
    fn neutral_area_yields_single_item(area in neutral_area(), timeline in ".{0,20}") {
        let input = ReflectionInput::new("fine", area, "x", "y", timeline);
        prop_assert_eq!(derive(&input).guidance.len(), 1);
    }

    /// The message always follows the precedence order.
    #[test]
    fn message_precedence(input in any_input()) {
        let feeling = input.feeling.trim().to_lowercase();
        let expected = if contains_any(&feeling, STRUGGLING_KEYWORDS) {
            REASSURANCE_MESSAGE
        } else if contains_any(&feeling, ENERGIZED_KEYWORDS) {
            MOMENTUM_MESSAGE
        } else {
            DEFAULT_MESSAGE
        };
        prop_assert_eq!(derive(&input).message, expected);
    }

    /// Challenge and desired outcome keep their case in the distilled text.
    #[test]
    fn distilled_preserves_challenge_case(challenge in "[A-Za-z ]{1,30}") {
        let input = ReflectionInput::new("ok", "career", challenge.clone(), "Plan", "now");
        let derived = derive(&input);
        let expected = format!("The core block seems to be: {}.", challenge.trim());
        prop_assert!(derived.distilled.contains(&expected));
    }

    /// Export mapping depends only on the stored answers and derived text.
    #[test]
    fn export_fields_are_deterministic(
        input in any_input(),
        now in 0i64..4_000_000_000_000,
        later in 0i64..1_000_000,
    ) {
        let record = Reflection::from_parts(input.clone(), derive(&input), now);
        let fields = summary_fields(&record);

        // Persisted and reloaded, the record maps to the same fields.
        let bytes = reflection_to_bytes(&record).expect("encode");
        let reloaded = reflection_from_bytes(&bytes).expect("decode");
        prop_assert_eq!(&summary_fields(&reloaded), &fields);

        // Re-deriving from the same answers at another time changes nothing either.
        let mut rederived = Reflection::from_parts(input.clone(), derive(&input), now + later);
        rederived.emailed_to = Some("me@example.com".to_string());
        prop_assert_eq!(&summary_fields(&rederived), &fields);

        let guidance_block: String = record.guidance.iter().map(|g| format!("\n- {}", g)).collect();
        let expected: Vec<(&str, String)> = FIELD_LABELS
            .into_iter()
            .zip([
                input.feeling.clone(),
                input.area.clone(),
                input.challenge.clone(),
                input.desired_outcome.clone(),
                input.action_timeline.clone(),
                record.distilled.clone(),
                guidance_block,
                record.message.clone(),
            ])
            .collect();
        prop_assert_eq!(fields, expected);
    }
}
