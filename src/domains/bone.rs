//! Bone and muscle health tracking: intake, load-bearing activity, pain.

use chrono::NaiveDate;

use crate::insight::extract::SectionSpec;
use crate::insight::keywords::{FlagCategory, KeywordRule};
use crate::insight::prompt::{
    compose_prompt, entry_block, history_block, profile_block, NOT_RECORDED,
};
use crate::models::{HealthRecord, QuickCheck, QuickMetric, UserProfile};

use super::{band_score, weighted_score, DomainModule};

const SECTIONS: &[SectionSpec] = &[
    SectionSpec {
        key: "boneOverview",
        aliases: &["🦴 Bone & Muscle Overview", "Bone & Muscle Overview", "Bone and Muscle Overview"],
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
        keyword: "fracture",
        category: FlagCategory::Risk,
        message: "Fracture risk was discussed — share your history with your provider.",
    },
    KeywordRule {
        keyword: "density",
        category: FlagCategory::Recommendation,
        message: "Bone density testing came up — ask whether a scan is due for you.",
    },
    KeywordRule {
        keyword: "vitamin d",
        category: FlagCategory::Recommendation,
        message: "Vitamin D was highlighted — levels are easy to check with routine labs.",
    },
];

const PROMPT_FIELDS: &[(&str, &str)] = &[
    ("Calcium intake (mg/day)", "calcium_mg"),
    ("Vitamin D intake (IU/day)", "vitamin_d_iu"),
    ("Weight-bearing exercise (min/week)", "exercise_minutes"),
    ("Muscle or joint pain (1-10)", "pain_score"),
    ("Prior fractures", "fracture_history"),
];

const HISTORY_FIELDS: &[(&str, &str)] = &[
    ("exercise", "exercise_minutes"),
    ("pain", "pain_score"),
];

pub struct BoneMuscleModule;

impl DomainModule for BoneMuscleModule {
    fn key(&self) -> &'static str {
        "bone-muscle"
    }

    fn title(&self) -> &'static str {
        "Bone & muscle"
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
            "You are a supportive assistant reviewing one person's bone and muscle \
             health log. You are not a doctor and you never diagnose; you explain \
             what the numbers suggest and which habits move them.",
            today,
            &blocks,
            SECTIONS,
        )
    }

    fn quick_check(&self, record: &HealthRecord, _today: NaiveDate) -> QuickCheck {
        let Some(latest) = record.latest() else {
            return QuickCheck {
                headline: "No entries yet.".to_string(),
                ..QuickCheck::default()
            };
        };

        let headline = match latest.number("exercise_minutes") {
            Some(minutes) if minutes >= 150.0 => {
                format!("{minutes} weight-bearing minutes this week — on target")
            }
            Some(minutes) => format!("{minutes} weight-bearing minutes this week — below the 150 target"),
            None => "Entry logged — exercise minutes not recorded".to_string(),
        };

        QuickCheck {
            headline,
            metrics: vec![
                QuickMetric::new("Calcium", latest.display("calcium_mg", NOT_RECORDED)),
                QuickMetric::new("Vitamin D", latest.display("vitamin_d_iu", NOT_RECORDED)),
                QuickMetric::new("Pain", latest.display("pain_score", NOT_RECORDED)),
            ],
            next_window: None,
            wellness_score: weighted_score(&[
                (
                    latest
                        .number("calcium_mg")
                        .map(|c| band_score(c, 200.0, 1000.0, 1300.0, 3000.0)),
                    0.3,
                ),
                (
                    latest
                        .number("exercise_minutes")
                        .map(|m| (m / 150.0).clamp(0.0, 1.0)),
                    0.4,
                ),
                (
                    latest.number("pain_score").map(|p| 1.0 - p / 10.0),
                    0.3,
                ),
            ]),
        }
    }

    fn personalized_tips(&self, record: &HealthRecord, _profile: &UserProfile) -> Vec<String> {
        let mut tips = Vec::new();
        if let Some(latest) = record.latest() {
            if latest.number("calcium_mg").is_some_and(|c| c < 1000.0) {
                tips.push(
                    "Your logged calcium sits under the commonly cited 1000 mg/day — \
                     dairy, fortified alternatives, and leafy greens close the gap fastest."
                        .to_string(),
                );
            }
            if latest.number("exercise_minutes").is_some_and(|m| m < 150.0) {
                tips.push(
                    "Bone responds to load: brisk walking, stairs, or resistance work \
                     counts toward the 150 weekly minutes."
                        .to_string(),
                );
            }
            if latest.flag("fracture_history").is_some_and(|f| f) {
                tips.push(
                    "With a prior fracture on record, a bone density scan is a \
                     reasonable question for your next appointment."
                        .to_string(),
                );
            }
        }
        if tips.is_empty() {
            tips.push("Logging intake and exercise weekly is enough to see the trend.".to_string());
        }
        tips
    }

    fn gentle_reminders(&self, _record: &HealthRecord) -> Vec<String> {
        vec![
            "Vitamin D absorbs better taken with a meal containing fat.".to_string(),
            "Balance work — even one-leg stands while brushing teeth — quietly prevents falls."
                .to_string(),
        ]
    }
}
