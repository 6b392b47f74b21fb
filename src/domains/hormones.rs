//! Hormone panel tracking: thyroid and reproductive hormone levels.

use chrono::{Duration, NaiveDate};

use crate::insight::extract::SectionSpec;
use crate::insight::keywords::{FlagCategory, KeywordRule};
use crate::insight::prompt::{
    compose_prompt, entry_block, history_block, profile_block, NOT_RECORDED,
};
use crate::models::{HealthRecord, PredictedWindow, QuickCheck, QuickMetric, UserProfile};

use super::{band_score, weighted_score, DomainModule};

/// Labs drawn roughly quarterly keep trend lines meaningful.
const RETEST_INTERVAL_DAYS: i64 = 90;

const SECTIONS: &[SectionSpec] = &[
    SectionSpec {
        key: "hormoneBalance",
        aliases: &["⚖️ Hormone Balance", "Hormone Balance"],
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
        keyword: "thyroid",
        category: FlagCategory::Risk,
        message: "Thyroid function came up in the analysis — keep your TSH history handy.",
    },
    KeywordRule {
        keyword: "retest",
        category: FlagCategory::Recommendation,
        message: "A retest was suggested — labs trend better when drawn at the same cycle day.",
    },
    KeywordRule {
        keyword: "endocrin",
        category: FlagCategory::Alert,
        message: "The analysis mentions endocrinology — a referral question for your provider.",
    },
];

const PROMPT_FIELDS: &[(&str, &str)] = &[
    ("TSH (mIU/L)", "tsh"),
    ("Estrogen (pg/mL)", "estrogen"),
    ("Progesterone (ng/mL)", "progesterone"),
    ("LH (IU/L)", "lh"),
    ("Cycle day at draw", "cycle_day"),
    ("Current medication", "medication"),
    ("Symptoms", "symptoms"),
];

const HISTORY_FIELDS: &[(&str, &str)] = &[("tsh", "tsh"), ("e2", "estrogen"), ("p4", "progesterone")];

pub struct HormonesModule;

impl DomainModule for HormonesModule {
    fn key(&self) -> &'static str {
        "hormones"
    }

    fn title(&self) -> &'static str {
        "Hormone"
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
            blocks.push(entry_block("Latest panel", latest, PROMPT_FIELDS));
        }
        blocks.push(history_block(record, HISTORY_FIELDS));
        blocks.push(profile_block(profile));

        compose_prompt(
            "You are a supportive assistant reviewing one person's hormone panel \
             history. You are not a doctor and you never diagnose; you explain \
             what the numbers are and which questions are worth asking a provider.",
            today,
            &blocks,
            SECTIONS,
        )
    }

    fn quick_check(&self, record: &HealthRecord, _today: NaiveDate) -> QuickCheck {
        let Some(latest) = record.latest() else {
            return QuickCheck {
                headline: "No panels logged yet.".to_string(),
                ..QuickCheck::default()
            };
        };

        let headline = match latest.number("tsh") {
            Some(tsh) if (0.4..=4.0).contains(&tsh) => {
                format!("TSH {tsh} — within the typical reference range")
            }
            Some(tsh) => format!("TSH {tsh} — outside the typical reference range"),
            None => "Panel logged — TSH not recorded".to_string(),
        };

        let retest = latest.recorded_at + Duration::days(RETEST_INTERVAL_DAYS);

        QuickCheck {
            headline,
            metrics: vec![
                QuickMetric::new("TSH", latest.display("tsh", NOT_RECORDED)),
                QuickMetric::new("Estrogen", latest.display("estrogen", NOT_RECORDED)),
                QuickMetric::new("Progesterone", latest.display("progesterone", NOT_RECORDED)),
            ],
            next_window: Some(PredictedWindow {
                label: "Suggested retest window".to_string(),
                starts: retest,
                ends: retest + Duration::days(14),
            }),
            wellness_score: weighted_score(&[
                (
                    latest.number("tsh").map(|t| band_score(t, 0.0, 0.4, 4.0, 10.0)),
                    0.5,
                ),
                (latest.number("estrogen").map(|_| 1.0), 0.25),
                (latest.number("progesterone").map(|_| 1.0), 0.25),
            ]),
        }
    }

    fn personalized_tips(&self, record: &HealthRecord, _profile: &UserProfile) -> Vec<String> {
        let mut tips = Vec::new();
        if let Some(latest) = record.latest() {
            if latest.number("tsh").is_some_and(|t| t > 4.0) {
                tips.push(
                    "Your TSH is above the typical range — bring this result to your \
                     provider and ask whether a repeat draw is warranted."
                        .to_string(),
                );
            }
            if latest.number("cycle_day").is_none() {
                tips.push(
                    "Reproductive hormone levels swing with the cycle — record the \
                     cycle day alongside each lab draw to make results comparable."
                        .to_string(),
                );
            }
        }
        if tips.is_empty() {
            tips.push(
                "Drawing labs at a consistent time of day keeps your trend lines honest."
                    .to_string(),
            );
        }
        tips
    }

    fn gentle_reminders(&self, _record: &HealthRecord) -> Vec<String> {
        vec![
            "Keep lab reports in one place — trends matter more than single values.".to_string(),
            "Sleep debt shows up in hormone panels; aim for a steady schedule.".to_string(),
        ]
    }
}
