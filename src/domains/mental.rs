//! Mental wellbeing tracking: mood, anxiety, sleep, stress.

use chrono::{Duration, NaiveDate};

use crate::insight::extract::SectionSpec;
use crate::insight::keywords::{FlagCategory, KeywordRule};
use crate::insight::prompt::{
    compose_prompt, entry_block, history_block, profile_block, NOT_RECORDED,
};
use crate::models::{HealthRecord, PredictedWindow, QuickCheck, QuickMetric, UserProfile};

use super::{band_score, weighted_score, DomainModule};

const CHECK_IN_INTERVAL_DAYS: i64 = 7;

const SECTIONS: &[SectionSpec] = &[
    SectionSpec {
        key: "wellbeingOverview",
        aliases: &["🧠 Wellbeing Overview", "Wellbeing Overview"],
    },
    SectionSpec {
        key: "clinicalSummary",
        aliases: &["📊 Clinical Summary", "Clinical Summary"],
    },
    SectionSpec {
        key: "actionPlan",
        aliases: &["🎯 Action Plan", "Action Plan"],
    },
    SectionSpec {
        key: "careGuidance",
        aliases: &["⚠️ When to Seek Care", "When to Seek Care"],
    },
];

const KEYWORD_RULES: &[KeywordRule] = &[
    KeywordRule {
        keyword: "panic",
        category: FlagCategory::Risk,
        message: "Panic symptoms were mentioned — note triggers and duration when they happen.",
    },
    KeywordRule {
        keyword: "sleep",
        category: FlagCategory::Recommendation,
        message: "Sleep came up in the analysis — a regular wind-down routine is the first lever.",
    },
    KeywordRule {
        keyword: "counsel",
        category: FlagCategory::Alert,
        message: "The analysis mentions counseling — talking to a professional is a strong next step.",
    },
];

const PROMPT_FIELDS: &[(&str, &str)] = &[
    ("Mood (1-10)", "mood"),
    ("Anxiety (1-10)", "anxiety"),
    ("Stress level (1-10)", "stress_level"),
    ("Sleep hours", "sleep_hours"),
    ("Journal note", "journal"),
];

const HISTORY_FIELDS: &[(&str, &str)] = &[
    ("mood", "mood"),
    ("anxiety", "anxiety"),
    ("sleep", "sleep_hours"),
];

pub struct MentalHealthModule;

impl DomainModule for MentalHealthModule {
    fn key(&self) -> &'static str {
        "mental-health"
    }

    fn title(&self) -> &'static str {
        "Mental wellbeing"
    }

    fn sections(&self) -> &'static [SectionSpec] {
        SECTIONS
    }

    fn keyword_rules(&self) -> &'static [KeywordRule] {
        KEYWORD_RULES
    }

    fn build_prompt(
        &self,
        record: &HealthRecord,
        profile: &UserProfile,
        today: NaiveDate,
    ) -> String {
        let mut blocks = Vec::new();
        if let Some(latest) = record.latest() {
            blocks.push(entry_block("Latest check-in", latest, PROMPT_FIELDS));
        }
        blocks.push(history_block(record, HISTORY_FIELDS));
        blocks.push(profile_block(profile));

        compose_prompt(
            "You are a warm, careful assistant reviewing one person's mood and \
             wellbeing check-ins. You are not a therapist and you never diagnose; \
             you reflect patterns back gently and point toward professional support \
             when the data suggests it.",
            today,
            &blocks,
            SECTIONS,
        )
    }

    fn quick_check(&self, record: &HealthRecord, _today: NaiveDate) -> QuickCheck {
        let Some(latest) = record.latest() else {
            return QuickCheck {
                headline: "No check-ins yet.".to_string(),
                ..QuickCheck::default()
            };
        };

        let headline = match latest.number("mood") {
            Some(mood) if mood >= 7.0 => format!("Mood {mood}/10 — a good stretch"),
            Some(mood) if mood >= 4.0 => format!("Mood {mood}/10 — middling, keep an eye on it"),
            Some(mood) => format!("Mood {mood}/10 — a rough patch"),
            None => "Check-in logged — mood not recorded".to_string(),
        };

        let next = latest.recorded_at + Duration::days(CHECK_IN_INTERVAL_DAYS);

        QuickCheck {
            headline,
            metrics: vec![
                QuickMetric::new("Mood", latest.display("mood", NOT_RECORDED)),
                QuickMetric::new("Anxiety", latest.display("anxiety", NOT_RECORDED)),
                QuickMetric::new("Sleep hours", latest.display("sleep_hours", NOT_RECORDED)),
            ],
            next_window: Some(PredictedWindow {
                label: "Next weekly check-in".to_string(),
                starts: next,
                ends: next + Duration::days(2),
            }),
            wellness_score: weighted_score(&[
                (latest.number("mood").map(|m| m / 10.0), 0.4),
                (latest.number("anxiety").map(|a| 1.0 - a / 10.0), 0.3),
                (
                    latest
                        .number("sleep_hours")
                        .map(|h| band_score(h, 3.0, 7.0, 9.0, 12.0)),
                    0.3,
                ),
            ]),
        }
    }

    fn personalized_tips(&self, record: &HealthRecord, _profile: &UserProfile) -> Vec<String> {
        let mut tips = Vec::new();
        if let Some(latest) = record.latest() {
            if latest.number("sleep_hours").is_some_and(|h| h < 6.0) {
                tips.push(
                    "Short sleep amplifies everything else you logged — protecting a \
                     consistent bedtime is the highest-leverage change."
                        .to_string(),
                );
            }
            if latest.number("anxiety").is_some_and(|a| a >= 7.0) {
                tips.push(
                    "On high-anxiety days, a 10-minute walk or slow breathing lowers \
                     the baseline more reliably than distraction."
                        .to_string(),
                );
            }
            if latest.number("mood").is_some_and(|m| m <= 3.0) {
                tips.push(
                    "Low-mood stretches are worth sharing with someone you trust — \
                     and with a professional if they persist past two weeks."
                        .to_string(),
                );
            }
        }
        if tips.is_empty() {
            tips.push(
                "A one-line journal note per day makes the weekly pattern much easier to see."
                    .to_string(),
            );
        }
        tips
    }

    fn gentle_reminders(&self, _record: &HealthRecord) -> Vec<String> {
        vec![
            "Check in at roughly the same time each day — patterns need consistency.".to_string(),
            "Daylight in the first hour after waking supports mood and sleep.".to_string(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FieldValue, HealthEntry};

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn record(fields: &[(&str, FieldValue)]) -> HealthRecord {
        let mut entry = HealthEntry::new(day("2026-07-10"));
        for (name, value) in fields {
            entry = entry.with_field(name, value.clone());
        }
        HealthRecord::from_entries(vec![entry])
    }

    #[test]
    fn low_mood_headline_and_tip() {
        let record = record(&[("mood", FieldValue::Number(2.0))]);
        let check = MentalHealthModule.quick_check(&record, day("2026-07-14"));
        assert!(check.headline.contains("rough patch"));
        let tips = MentalHealthModule.personalized_tips(&record, &UserProfile::default());
        assert!(tips.iter().any(|t| t.contains("two weeks")));
    }

    #[test]
    fn short_sleep_surfaces_bedtime_tip() {
        let record = record(&[("sleep_hours", FieldValue::Number(4.5))]);
        let tips = MentalHealthModule.personalized_tips(&record, &UserProfile::default());
        assert!(tips.iter().any(|t| t.contains("bedtime")));
    }

    #[test]
    fn score_blends_mood_anxiety_sleep() {
        let record = record(&[
            ("mood", FieldValue::Number(8.0)),
            ("anxiety", FieldValue::Number(2.0)),
            ("sleep_hours", FieldValue::Number(8.0)),
        ]);
        let check = MentalHealthModule.quick_check(&record, day("2026-07-14"));
        let score = check.wellness_score.unwrap();
        assert!(score > 80.0, "got {score}");
    }

    #[test]
    fn check_in_window_is_a_week_out() {
        let record = record(&[("mood", FieldValue::Number(5.0))]);
        let check = MentalHealthModule.quick_check(&record, day("2026-07-14"));
        assert_eq!(check.next_window.unwrap().starts, day("2026-07-17"));
    }
}
