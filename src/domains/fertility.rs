//! Fertility tracking: cycle phases, fertile-window prediction, and the
//! richest rule set of the built-in domains.

use chrono::{Duration, NaiveDate};

use crate::insight::extract::SectionSpec;
use crate::insight::keywords::{FlagCategory, KeywordRule};
use crate::insight::prompt::{
    compose_prompt, entry_block, history_block, profile_block, NOT_RECORDED,
};
use crate::models::{HealthRecord, PredictedWindow, QuickCheck, QuickMetric, UserProfile};

use super::{band_score, weighted_score, DomainModule};

/// Assumed when the record does not carry its own length.
pub const DEFAULT_CYCLE_LENGTH: i64 = 28;

/// Ovulation is estimated this many days before the next period.
const LUTEAL_OFFSET: i64 = 14;

/// Fertile window opens this many days before estimated ovulation…
const WINDOW_LEAD: i64 = 5;
/// …and closes this many days after it.
const WINDOW_TRAIL: i64 = 1;

const SECTIONS: &[SectionSpec] = &[
    SectionSpec {
        key: "cycleOverview",
        aliases: &["🌸 Cycle Overview", "Cycle Overview"],
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
        keyword: "anovulat",
        category: FlagCategory::Risk,
        message: "The analysis raises the possibility of a cycle without ovulation.",
    },
    KeywordRule {
        keyword: "spotting",
        category: FlagCategory::Risk,
        message: "Mid-cycle spotting was mentioned — keep noting when it occurs.",
    },
    KeywordRule {
        keyword: "fertile window",
        category: FlagCategory::Recommendation,
        message: "Your fertile window came up — check the action plan for timing.",
    },
    KeywordRule {
        keyword: "luteal",
        category: FlagCategory::Recommendation,
        message: "Luteal-phase observations were made — temperature logging helps confirm them.",
    },
];

/// Phase classification by fixed day-offset thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclePhase {
    Menstrual,
    Follicular,
    Ovulatory,
    Luteal,
}

impl CyclePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Menstrual => "Menstrual",
            Self::Follicular => "Follicular",
            Self::Ovulatory => "Ovulatory",
            Self::Luteal => "Luteal",
        }
    }
}

/// 1-based cycle day; `None` when the period start is missing or in the future.
pub fn cycle_day(last_period: NaiveDate, today: NaiveDate) -> Option<i64> {
    let day = (today - last_period).num_days() + 1;
    (day >= 1).then_some(day)
}

pub fn classify_phase(day: i64) -> CyclePhase {
    match day {
        ..=5 => CyclePhase::Menstrual,
        6..=13 => CyclePhase::Follicular,
        14..=16 => CyclePhase::Ovulatory,
        _ => CyclePhase::Luteal,
    }
}

/// Estimated ovulation date: next period minus the luteal offset.
pub fn ovulation_date(last_period: NaiveDate, cycle_length: i64) -> NaiveDate {
    last_period + Duration::days(cycle_length - LUTEAL_OFFSET)
}

/// Fertile window around estimated ovulation, whole-day granularity.
pub fn fertile_window(last_period: NaiveDate, cycle_length: i64) -> PredictedWindow {
    let ovulation = ovulation_date(last_period, cycle_length);
    PredictedWindow {
        label: "Estimated fertile window".to_string(),
        starts: ovulation - Duration::days(WINDOW_LEAD),
        ends: ovulation + Duration::days(WINDOW_TRAIL),
    }
}

pub fn next_period(last_period: NaiveDate, cycle_length: i64) -> NaiveDate {
    last_period + Duration::days(cycle_length)
}

/// Cycle length from the record if plausible, otherwise the fixed default.
fn effective_cycle_length(record: &HealthRecord) -> i64 {
    record
        .latest()
        .and_then(|entry| entry.number("cycle_length"))
        .map(|len| len as i64)
        .filter(|len| (15..=60).contains(len))
        .unwrap_or(DEFAULT_CYCLE_LENGTH)
}

const PROMPT_FIELDS: &[(&str, &str)] = &[
    ("Basal body temperature (°F)", "bbt"),
    ("Cervical mucus", "cervical_mucus"),
    ("Ovulation test", "ovulation_test"),
    ("Reported cycle length", "cycle_length"),
    ("Fertility goal", "fertility_goal"),
    ("Symptoms", "symptoms"),
    ("Notes", "notes"),
];

const HISTORY_FIELDS: &[(&str, &str)] = &[
    ("temp", "bbt"),
    ("mucus", "cervical_mucus"),
    ("test", "ovulation_test"),
];

pub struct FertilityModule;

impl FertilityModule {
    fn cycle_context_block(&self, record: &HealthRecord, today: NaiveDate) -> String {
        let mut block = String::from("== Cycle context ==\n");
        let cycle_length = effective_cycle_length(record);

        match record.latest().and_then(|entry| entry.date("last_period")) {
            Some(start) => {
                match cycle_day(start, today) {
                    Some(day) => {
                        block.push_str(&format!("Cycle day: {day}\n"));
                        block.push_str(&format!(
                            "Phase: {}\n",
                            classify_phase(day).as_str()
                        ));
                    }
                    None => block.push_str("Cycle day: Not recorded\n"),
                }
                let window = fertile_window(start, cycle_length);
                block.push_str(&format!(
                    "Estimated fertile window: {} to {}\n",
                    window.starts, window.ends
                ));
                block.push_str(&format!(
                    "Predicted next period: {}\n",
                    next_period(start, cycle_length)
                ));
            }
            None => {
                block.push_str(&format!("Cycle day: {NOT_RECORDED}\n"));
                block.push_str(&format!("Estimated fertile window: {NOT_RECORDED}\n"));
            }
        }
        block.push_str(&format!("Cycle length used: {cycle_length} days\n"));
        block
    }
}

impl DomainModule for FertilityModule {
    fn key(&self) -> &'static str {
        "fertility"
    }

    fn title(&self) -> &'static str {
        "Fertility"
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
        let mut blocks = vec![self.cycle_context_block(record, today)];
        if let Some(latest) = record.latest() {
            blocks.push(entry_block("Latest entry", latest, PROMPT_FIELDS));
        }
        blocks.push(history_block(record, HISTORY_FIELDS));
        blocks.push(profile_block(profile));

        compose_prompt(
            "You are a supportive fertility-awareness assistant reviewing one \
             person's cycle tracking data. You are not a doctor and you never \
             diagnose; you explain patterns and suggest questions for a provider.",
            today,
            &blocks,
            SECTIONS,
        )
    }

    fn quick_check(&self, record: &HealthRecord, today: NaiveDate) -> QuickCheck {
        let Some(latest) = record.latest() else {
            return QuickCheck {
                headline: "No entries yet — log a day to unlock cycle tracking.".to_string(),
                ..QuickCheck::default()
            };
        };

        let cycle_length = effective_cycle_length(record);
        let period_start = latest.date("last_period");

        let (headline, next_window) = match period_start.and_then(|start| {
            cycle_day(start, today).map(|day| (start, day))
        }) {
            Some((start, day)) => {
                let phase = classify_phase(day);
                let window = fertile_window(start, cycle_length);
                let next_window = if today <= window.ends {
                    window
                } else {
                    let upcoming = next_period(start, cycle_length);
                    PredictedWindow {
                        label: "Predicted next period".to_string(),
                        starts: upcoming,
                        ends: upcoming + Duration::days(4),
                    }
                };
                (
                    format!("Cycle day {day} — {} phase", phase.as_str()),
                    Some(next_window),
                )
            }
            None => (
                "Log your last period start to unlock cycle predictions.".to_string(),
                None,
            ),
        };

        let metrics = vec![
            QuickMetric::new("Basal temperature", latest.display("bbt", NOT_RECORDED)),
            QuickMetric::new(
                "Cervical mucus",
                latest.display("cervical_mucus", NOT_RECORDED),
            ),
            QuickMetric::new(
                "Ovulation test",
                latest.display("ovulation_test", NOT_RECORDED),
            ),
        ];

        let wellness_score = weighted_score(&[
            (
                latest.number("bbt").map(|t| band_score(t, 95.0, 96.5, 98.6, 100.5)),
                0.4,
            ),
            (latest.text("cervical_mucus").map(|_| 1.0), 0.3),
            (latest.text("ovulation_test").map(|_| 1.0), 0.3),
        ]);

        QuickCheck {
            headline,
            metrics,
            next_window,
            wellness_score,
        }
    }

    fn personalized_tips(&self, record: &HealthRecord, _profile: &UserProfile) -> Vec<String> {
        let mut tips = Vec::new();
        let Some(latest) = record.latest() else {
            tips.push(
                "Start with one entry a day — consistency matters more than completeness."
                    .to_string(),
            );
            return tips;
        };

        if latest
            .text("cervical_mucus")
            .is_some_and(|m| m.eq_ignore_ascii_case("egg-white"))
        {
            tips.push(
                "Egg-white cervical mucus is the most fertile sign your body gives — \
                 it usually appears in the days right before ovulation."
                    .to_string(),
            );
        }

        if latest
            .text("fertility_goal")
            .is_some_and(|g| g.eq_ignore_ascii_case("ttc"))
        {
            tips.push(
                "With trying-to-conceive as your goal, timing intercourse inside the \
                 fertile window matters more than frequency across the month."
                    .to_string(),
            );
        }

        if latest
            .text("ovulation_test")
            .is_some_and(|t| t.eq_ignore_ascii_case("positive"))
        {
            tips.push(
                "A positive ovulation test usually means ovulation within 24–36 hours — \
                 the next two days are your peak."
                    .to_string(),
            );
        }

        if latest.number("bbt").is_some() {
            tips.push(
                "Take your temperature at the same time every morning, before getting up, \
                 so the chart stays comparable day to day."
                    .to_string(),
            );
        }

        if tips.is_empty() {
            tips.push(
                "Adding temperature, mucus, or test results to your daily log makes \
                 cycle predictions noticeably sharper."
                    .to_string(),
            );
        }
        tips
    }

    fn gentle_reminders(&self, record: &HealthRecord) -> Vec<String> {
        let mut reminders = Vec::new();
        if let Some(latest) = record.latest() {
            if latest
                .text("fertility_goal")
                .is_some_and(|g| g.eq_ignore_ascii_case("ttc"))
            {
                reminders.push(
                    "A daily folic acid supplement is recommended when trying to conceive — \
                     worth mentioning at your next appointment."
                        .to_string(),
                );
            }
            if latest
                .list("symptoms")
                .is_some_and(|s| s.iter().any(|x| x.eq_ignore_ascii_case("cramping")))
            {
                reminders.push(
                    "For cramping days: warmth, rest, and water help more than pushing through."
                        .to_string(),
                );
            }
        }
        reminders.push("Drink water steadily through the day, not all at once.".to_string());
        reminders
    }
}
