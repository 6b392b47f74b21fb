//! Medication tracking: adherence, side effects, refill timing.

use chrono::{Duration, NaiveDate};

use crate::insight::extract::SectionSpec;
use crate::insight::keywords::{FlagCategory, KeywordRule};
use crate::insight::prompt::{
    compose_prompt, entry_block, history_block, profile_block, NOT_RECORDED,
};
use crate::models::{HealthRecord, PredictedWindow, QuickCheck, QuickMetric, UserProfile};

use super::{weighted_score, DomainModule};

const SECTIONS: &[SectionSpec] = &[
    SectionSpec {
        key: "medicationOverview",
        aliases: &["💊 Medication Overview", "Medication Overview"],
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
        keyword: "interaction",
        category: FlagCategory::Alert,
        message: "A possible interaction was mentioned — have a pharmacist review your list.",
    },
    KeywordRule {
        keyword: "side effect",
        category: FlagCategory::Risk,
        message: "Side effects were discussed — log when they occur relative to doses.",
    },
    KeywordRule {
        keyword: "adherence",
        category: FlagCategory::Recommendation,
        message: "Adherence came up — anchoring doses to an existing routine helps most.",
    },
];

const PROMPT_FIELDS: &[(&str, &str)] = &[
    ("Medication", "medication"),
    ("Dose", "dose"),
    ("Adherence this week (%)", "adherence_pct"),
    ("Missed doses this week", "missed_doses"),
    ("Side effects", "side_effects"),
    ("Next refill date", "refill_date"),
];

const HISTORY_FIELDS: &[(&str, &str)] = &[
    ("adherence", "adherence_pct"),
    ("missed", "missed_doses"),
];

pub struct MedicationsModule;

impl DomainModule for MedicationsModule {
    fn key(&self) -> &'static str {
        "medications"
    }

    fn title(&self) -> &'static str {
        "Medication"
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
            blocks.push(entry_block("Latest entry", latest, PROMPT_FIELDS));
        }
        blocks.push(history_block(record, HISTORY_FIELDS));
        blocks.push(profile_block(profile));

        compose_prompt(
            "You are a supportive assistant reviewing one person's medication log. \
             You are not a doctor or pharmacist and you never direct medication \
             changes; you surface patterns and questions worth raising with the \
             prescriber.",
            today,
            &blocks,
            SECTIONS,
        )
    }

    fn quick_check(&self, record: &HealthRecord, today: NaiveDate) -> QuickCheck {
        let Some(latest) = record.latest() else {
            return QuickCheck {
                headline: "No medications logged yet.".to_string(),
                ..QuickCheck::default()
            };
        };

        let headline = match latest.number("adherence_pct") {
            Some(pct) if pct >= 90.0 => format!("Adherence {pct}% — strong week"),
            Some(pct) => format!("Adherence {pct}% — some doses slipped"),
            None => "Entry logged — adherence not recorded".to_string(),
        };

        // Refill window opens three days ahead so a pharmacy trip fits in.
        let next_window = latest.date("refill_date").and_then(|refill| {
            (refill >= today).then(|| PredictedWindow {
                label: "Refill window".to_string(),
                starts: refill - Duration::days(3),
                ends: refill,
            })
        });

        QuickCheck {
            headline,
            metrics: vec![
                QuickMetric::new("Medication", latest.display("medication", NOT_RECORDED)),
                QuickMetric::new("Dose", latest.display("dose", NOT_RECORDED)),
                QuickMetric::new("Missed doses", latest.display("missed_doses", NOT_RECORDED)),
            ],
            next_window,
            wellness_score: weighted_score(&[
                (latest.number("adherence_pct").map(|p| p / 100.0), 0.7),
                (
                    latest
                        .number("missed_doses")
                        .map(|m| 1.0 - (m / 7.0).clamp(0.0, 1.0)),
                    0.3,
                ),
            ]),
        }
    }

    fn personalized_tips(&self, record: &HealthRecord, _profile: &UserProfile) -> Vec<String> {
        let mut tips = Vec::new();
        if let Some(latest) = record.latest() {
            if latest.number("missed_doses").is_some_and(|m| m >= 1.0) {
                tips.push(
                    "Pair the dose with something you already do daily — brushing teeth, \
                     morning coffee — and missed doses usually vanish."
                        .to_string(),
                );
            }
            if latest.list("side_effects").is_some_and(|s| !s.is_empty()) {
                tips.push(
                    "Log each side effect with its time relative to the dose; that \
                     timing is exactly what your prescriber will ask about."
                        .to_string(),
                );
            }
        }
        if tips.is_empty() {
            tips.push(
                "A weekly pill organizer turns adherence from memory into a glance.".to_string(),
            );
        }
        tips
    }

    fn gentle_reminders(&self, record: &HealthRecord) -> Vec<String> {
        let mut reminders = vec![
            "Take doses at the same time each day — levels stay steadier.".to_string(),
        ];
        if record
            .latest()
            .and_then(|e| e.text("refill_date"))
            .is_some()
        {
            reminders.push("Request refills a few days early around holidays.".to_string());
        }
        reminders
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
    fn refill_window_opens_three_days_early() {
        let record = record(&[("refill_date", FieldValue::Text("2026-07-20".into()))]);
        let check = MedicationsModule.quick_check(&record, day("2026-07-14"));
        let window = check.next_window.unwrap();
        assert_eq!(window.starts, day("2026-07-17"));
        assert_eq!(window.ends, day("2026-07-20"));
    }

    #[test]
    fn past_refill_date_yields_no_window() {
        let record = record(&[("refill_date", FieldValue::Text("2026-07-01".into()))]);
        let check = MedicationsModule.quick_check(&record, day("2026-07-14"));
        assert!(check.next_window.is_none());
    }

    #[test]
    fn missed_doses_surface_routine_tip() {
        let record = record(&[("missed_doses", FieldValue::Number(2.0))]);
        let tips = MedicationsModule.personalized_tips(&record, &UserProfile::default());
        assert!(tips.iter().any(|t| t.contains("already do daily")));
    }

    #[test]
    fn adherence_score_weights_missed_doses() {
        let record = record(&[
            ("adherence_pct", FieldValue::Number(100.0)),
            ("missed_doses", FieldValue::Number(0.0)),
        ]);
        let check = MedicationsModule.quick_check(&record, day("2026-07-14"));
        assert_eq!(check.wellness_score, Some(100.0));
    }
}
