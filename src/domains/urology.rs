//! Urinary health tracking: frequency, urgency, nocturia, fluid intake.

use chrono::{Duration, NaiveDate};

use crate::insight::extract::SectionSpec;
use crate::insight::keywords::{FlagCategory, KeywordRule};
use crate::insight::prompt::{
    compose_prompt, entry_block, history_block, profile_block, NOT_RECORDED,
};
use crate::models::{HealthRecord, PredictedWindow, QuickCheck, QuickMetric, UserProfile};

use super::{band_score, weighted_score, DomainModule};

const DIARY_REVIEW_DAYS: i64 = 14;

const SECTIONS: &[SectionSpec] = &[
    SectionSpec {
        key: "urinaryOverview",
        aliases: &["💧 Urinary Health Overview", "Urinary Health Overview", "Urinary Overview"],
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
        keyword: "infection",
        category: FlagCategory::Alert,
        message: "Infection was mentioned — symptoms like burning or fever deserve a prompt call.",
    },
    KeywordRule {
        keyword: "blood",
        category: FlagCategory::Alert,
        message: "Visible blood was discussed — that is always worth reporting to a provider.",
    },
    KeywordRule {
        keyword: "pelvic floor",
        category: FlagCategory::Recommendation,
        message: "Pelvic floor work came up — consistency over weeks is what moves it.",
    },
];

const PROMPT_FIELDS: &[(&str, &str)] = &[
    ("Daytime frequency", "frequency_per_day"),
    ("Night-time waking (nocturia)", "nocturia_count"),
    ("Urgency (1-10)", "urgency"),
    ("Pain or burning (1-10)", "pain"),
    ("Fluid intake (ml/day)", "fluid_intake_ml"),
    ("Leak episodes", "leaks"),
];

const HISTORY_FIELDS: &[(&str, &str)] = &[
    ("freq", "frequency_per_day"),
    ("nocturia", "nocturia_count"),
    ("leaks", "leaks"),
];

pub struct UrologyModule;

impl DomainModule for UrologyModule {
    fn key(&self) -> &'static str {
        "urology"
    }

    fn title(&self) -> &'static str {
        "Urinary health"
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
            blocks.push(entry_block("Latest diary day", latest, PROMPT_FIELDS));
        }
        blocks.push(history_block(record, HISTORY_FIELDS));
        blocks.push(profile_block(profile));

        compose_prompt(
            "You are a supportive assistant reviewing one person's bladder diary. \
             You are not a doctor and you never diagnose; you describe what the \
             diary shows and which findings a urologist would want to hear about.",
            today,
            &blocks,
            SECTIONS,
        )
    }

    fn quick_check(&self, record: &HealthRecord, _today: NaiveDate) -> QuickCheck {
        let Some(latest) = record.latest() else {
            return QuickCheck {
                headline: "No diary days yet.".to_string(),
                ..QuickCheck::default()
            };
        };

        let headline = match latest.number("frequency_per_day") {
            Some(freq) if (4.0..=8.0).contains(&freq) => {
                format!("{freq} daytime voids — within the usual range")
            }
            Some(freq) => format!("{freq} daytime voids — outside the usual 4–8 range"),
            None => "Diary day logged — frequency not recorded".to_string(),
        };

        let review = latest.recorded_at + Duration::days(DIARY_REVIEW_DAYS);

        QuickCheck {
            headline,
            metrics: vec![
                QuickMetric::new("Nocturia", latest.display("nocturia_count", NOT_RECORDED)),
                QuickMetric::new("Urgency", latest.display("urgency", NOT_RECORDED)),
                QuickMetric::new("Fluid intake", latest.display("fluid_intake_ml", NOT_RECORDED)),
            ],
            next_window: Some(PredictedWindow {
                label: "Diary review point".to_string(),
                starts: review,
                ends: review + Duration::days(2),
            }),
            wellness_score: weighted_score(&[
                (
                    latest
                        .number("frequency_per_day")
                        .map(|f| band_score(f, 0.0, 4.0, 8.0, 15.0)),
                    0.35,
                ),
                (
                    latest
                        .number("nocturia_count")
                        .map(|n| 1.0 - (n / 4.0).clamp(0.0, 1.0)),
                    0.25,
                ),
                (latest.number("pain").map(|p| 1.0 - p / 10.0), 0.4),
            ]),
        }
    }

    fn personalized_tips(&self, record: &HealthRecord, _profile: &UserProfile) -> Vec<String> {
        let mut tips = Vec::new();
        if let Some(latest) = record.latest() {
            if latest.number("nocturia_count").is_some_and(|n| n >= 2.0) {
                tips.push(
                    "Waking twice or more at night often tracks with evening fluids — \
                     try tapering intake in the last two hours before bed."
                        .to_string(),
                );
            }
            if latest.number("leaks").is_some_and(|l| l >= 1.0) {
                tips.push(
                    "Leak episodes respond well to daily pelvic floor exercises; \
                     results typically show after four to six weeks."
                        .to_string(),
                );
            }
            if latest.number("pain").is_some_and(|p| p >= 5.0) {
                tips.push(
                    "Pain at this level, especially with burning, is worth a same-week \
                     call to your provider rather than watchful waiting."
                        .to_string(),
                );
            }
        }
        if tips.is_empty() {
            tips.push(
                "Two or three complete diary days tell a urologist more than a month \
                 of partial ones."
                    .to_string(),
            );
        }
        tips
    }

    fn gentle_reminders(&self, _record: &HealthRecord) -> Vec<String> {
        vec![
            "Spread fluids through the day instead of large amounts at once.".to_string(),
            "Caffeine and carbonated drinks are common bladder irritants — note them in the diary."
                .to_string(),
        ]
    }
}
