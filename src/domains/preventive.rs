//! Preventive care tracking: screening recency and due windows.

use chrono::{Duration, NaiveDate};

use crate::insight::extract::SectionSpec;
use crate::insight::keywords::{FlagCategory, KeywordRule};
use crate::insight::prompt::{compose_prompt, entry_block, profile_block, NOT_RECORDED};
use crate::models::{HealthRecord, PredictedWindow, QuickCheck, QuickMetric, UserProfile};

use super::DomainModule;

/// Fixed screening intervals in days; the original tracker used the same
/// whole-day arithmetic with no age stratification.
const SCREENINGS: &[(&str, &str, i64)] = &[
    ("last_pap", "Pap smear", 365 * 3),
    ("last_mammogram", "Mammogram", 365 * 2),
    ("last_dental", "Dental cleaning", 180),
    ("last_flu_shot", "Flu shot", 365),
];

const SECTIONS: &[SectionSpec] = &[
    SectionSpec {
        key: "screeningOverview",
        aliases: &["🛡️ Screening Overview", "Screening Overview"],
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
        keyword: "overdue",
        category: FlagCategory::Risk,
        message: "An overdue screening was flagged — booking it removes the risk entirely.",
    },
    KeywordRule {
        keyword: "vaccin",
        category: FlagCategory::Recommendation,
        message: "Vaccination came up — pharmacies handle most routine ones without an appointment.",
    },
    KeywordRule {
        keyword: "screening",
        category: FlagCategory::Recommendation,
        message: "Screening guidance was given — check the action plan for which one and when.",
    },
];

const PROMPT_FIELDS: &[(&str, &str)] = &[
    ("Last Pap smear", "last_pap"),
    ("Last mammogram", "last_mammogram"),
    ("Last dental cleaning", "last_dental"),
    ("Last flu shot", "last_flu_shot"),
];

pub struct PreventiveCareModule;

impl PreventiveCareModule {
    /// (label, due date) per screening with a recorded last date.
    fn due_dates(record: &HealthRecord) -> Vec<(&'static str, NaiveDate)> {
        let Some(latest) = record.latest() else {
            return Vec::new();
        };
        SCREENINGS
            .iter()
            .filter_map(|(field, label, interval)| {
                latest
                    .date(field)
                    .map(|last| (*label, last + Duration::days(*interval)))
            })
            .collect()
    }
}

impl DomainModule for PreventiveCareModule {
    fn key(&self) -> &'static str {
        "preventive-care"
    }

    fn title(&self) -> &'static str {
        "Preventive care"
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
            blocks.push(entry_block("Screening history", latest, PROMPT_FIELDS));
        }

        let due = Self::due_dates(record);
        if !due.is_empty() {
            let mut block = String::from("== Computed due dates ==\n");
            for (label, date) in &due {
                let status = if *date <= today { "due now" } else { "upcoming" };
                block.push_str(&format!("{label}: {date} ({status})\n"));
            }
            blocks.push(block);
        }
        blocks.push(profile_block(profile));

        compose_prompt(
            "You are a supportive assistant reviewing one person's preventive care \
             history. You are not a doctor; you summarize which routine screenings \
             are current, which are coming due, and how to schedule them.",
            today,
            &blocks,
            SECTIONS,
        )
    }

    fn quick_check(&self, record: &HealthRecord, today: NaiveDate) -> QuickCheck {
        let Some(latest) = record.latest() else {
            return QuickCheck {
                headline: "No screening history yet.".to_string(),
                ..QuickCheck::default()
            };
        };

        let due = Self::due_dates(record);
        let overdue: Vec<&str> = due
            .iter()
            .filter(|(_, date)| *date <= today)
            .map(|(label, _)| *label)
            .collect();

        let headline = if due.is_empty() {
            "No screening dates recorded yet.".to_string()
        } else if overdue.is_empty() {
            "All recorded screenings are current.".to_string()
        } else {
            format!("Due now: {}", overdue.join(", "))
        };

        // The soonest upcoming due date becomes the predicted window.
        let next_window = due
            .iter()
            .filter(|(_, date)| *date > today)
            .min_by_key(|(_, date)| *date)
            .map(|(label, date)| PredictedWindow {
                label: format!("{label} due"),
                starts: *date,
                ends: *date + Duration::days(30),
            });

        let tracked = due.len() as f64;
        let current = (due.len() - overdue.len()) as f64;
        let wellness_score = (tracked > 0.0)
            .then(|| ((current / tracked) * 1000.0).round() as f32 / 10.0);

        QuickCheck {
            headline,
            metrics: vec![
                QuickMetric::new("Pap smear", latest.display("last_pap", NOT_RECORDED)),
                QuickMetric::new("Mammogram", latest.display("last_mammogram", NOT_RECORDED)),
                QuickMetric::new("Dental", latest.display("last_dental", NOT_RECORDED)),
                QuickMetric::new("Flu shot", latest.display("last_flu_shot", NOT_RECORDED)),
            ],
            next_window,
            wellness_score,
        }
    }

    fn personalized_tips(&self, record: &HealthRecord, profile: &UserProfile) -> Vec<String> {
        let mut tips = Vec::new();
        if let Some(latest) = record.latest() {
            if latest.date("last_dental").is_none() {
                tips.push(
                    "Dental cleanings are the easiest screening to keep current — \
                     most offices book six months ahead automatically if you ask."
                        .to_string(),
                );
            }
            if profile.age.is_some_and(|age| age >= 40)
                && latest.date("last_mammogram").is_none()
            {
                tips.push(
                    "From 40 onward, mammogram scheduling is a standard conversation \
                     to have with your provider if you have not already."
                        .to_string(),
                );
            }
        }
        if tips.is_empty() {
            tips.push(
                "Recording even approximate screening dates lets the tracker compute \
                 when the next ones are due."
                    .to_string(),
            );
        }
        tips
    }

    fn gentle_reminders(&self, _record: &HealthRecord) -> Vec<String> {
        vec![
            "Book screenings for a birthday month — the date is easy to remember.".to_string(),
            "Flu shots are seasonal: early autumn timing gives the best coverage.".to_string(),
        ]
    }
}
