//! Shared prompt-construction helpers.
//!
//! Domain modules build their data blocks with these so every prompt keeps
//! the same fixed layout: framing sentence, labelled data blocks, trailing
//! history, profile, then the output-format block naming the exact section
//! headers the extractor will look for. All functions are pure: `today`
//! is always injected, never read from the clock, so a fixed input produces
//! a byte-identical prompt.

use chrono::NaiveDate;

use crate::insight::extract::SectionSpec;
use crate::models::{HealthEntry, HealthRecord, UserProfile};

/// Placeholder for an absent entry field.
pub const NOT_RECORDED: &str = "Not recorded";
/// Placeholder for an absent profile attribute.
pub const NOT_SPECIFIED: &str = "Not specified";

/// How many prior entries the history block includes.
pub const HISTORY_WINDOW: usize = 3;

/// Labelled data block: `== Latest entry (2026-07-14) ==` plus one line per
/// listed field, placeholder-substituted.
pub fn entry_block(title: &str, entry: &HealthEntry, fields: &[(&str, &str)]) -> String {
    let mut block = format!("== {title} ({}) ==\n", entry.recorded_at);
    for (label, field) in fields {
        block.push_str(&format!("{label}: {}\n", entry.display(field, NOT_RECORDED)));
    }
    block
}

/// Compact trailing-history block over the last few entries, oldest first.
/// Absent when the record has no history.
pub fn history_block(record: &HealthRecord, fields: &[(&str, &str)]) -> String {
    let trailing = record.trailing(HISTORY_WINDOW);
    if trailing.is_empty() {
        return String::new();
    }

    let mut block = String::from("== Recent history ==\n");
    for entry in trailing {
        let values: Vec<String> = fields
            .iter()
            .map(|(label, field)| format!("{label} {}", entry.display(field, NOT_RECORDED)))
            .collect();
        block.push_str(&format!("{}: {}\n", entry.recorded_at, values.join(", ")));
    }
    block
}

/// Profile block shared by every domain.
pub fn profile_block(profile: &UserProfile) -> String {
    let mut block = String::from("== Profile ==\n");
    block.push_str(&format!("Age: {}\n", profile.age_display()));
    block.push_str(&format!(
        "Known conditions: {}\n",
        profile.conditions_display()
    ));
    for (key, value) in &profile.lifestyle {
        let shown = if value.trim().is_empty() {
            NOT_SPECIFIED
        } else {
            value.as_str()
        };
        block.push_str(&format!("{key}: {shown}\n"));
    }
    block
}

/// Output-format instruction block derived from the same section table the
/// extractor consumes, keeping prompt and extraction in one contract.
pub fn output_format_block(specs: &[SectionSpec]) -> String {
    let mut block = String::from(
        "Structure your answer with exactly these section headers, each alone on its own line:\n",
    );
    for spec in specs {
        block.push_str(&format!("**{}**\n", spec.header()));
    }
    block.push_str(
        "Write plain, supportive language under each header. \
         Do not add other headers and do not leave a section empty.",
    );
    block
}

/// Assemble the full prompt from a framing sentence, the domain's data
/// blocks, and the output-format block.
pub fn compose_prompt(
    framing: &str,
    today: NaiveDate,
    blocks: &[String],
    specs: &[SectionSpec],
) -> String {
    let mut prompt = String::new();
    prompt.push_str(framing);
    prompt.push_str(&format!("\nToday's date is {today}.\n\n"));
    for block in blocks {
        if block.is_empty() {
            continue;
        }
        prompt.push_str(block);
        prompt.push('\n');
    }
    prompt.push_str(&output_format_block(specs));
    prompt
}
