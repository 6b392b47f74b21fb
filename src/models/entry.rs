use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single recorded value on a tracking entry.
///
/// Entries are flat maps of field name → scalar or list; the tracking client
/// decides which fields a domain carries, the pipeline only reads them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Flag(bool),
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Self::Flag(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    /// Render for prompt interpolation. Numbers drop a trailing `.0` so
    /// "cycle length 28" never reads "28.0 days".
    pub fn render(&self) -> String {
        match self {
            Self::Number(n) if n.fract() == 0.0 => format!("{}", *n as i64),
            Self::Number(n) => format!("{n}"),
            Self::Flag(true) => "yes".to_string(),
            Self::Flag(false) => "no".to_string(),
            Self::Text(s) => s.clone(),
            Self::List(items) => items.join(", "),
        }
    }
}

/// One dated tracking entry: a flat field map owned by the caller.
///
/// Field order is deterministic (BTreeMap) so prompt construction over an
/// entry is byte-stable across calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthEntry {
    pub id: Uuid,
    pub recorded_at: NaiveDate,
    pub fields: BTreeMap<String, FieldValue>,
}

impl HealthEntry {
    pub fn new(recorded_at: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            recorded_at,
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, name: &str, value: FieldValue) -> Self {
        self.fields.insert(name.to_string(), value);
        self
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        self.fields.get(name).and_then(FieldValue::as_number)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(FieldValue::as_text)
    }

    pub fn flag(&self, name: &str) -> Option<bool> {
        self.fields.get(name).and_then(FieldValue::as_flag)
    }

    pub fn list(&self, name: &str) -> Option<&[String]> {
        self.fields.get(name).and_then(FieldValue::as_list)
    }

    /// A text field parsed as an ISO date (`2026-07-14`). Malformed dates
    /// degrade to `None`; a bad field must never block generation.
    pub fn date(&self, name: &str) -> Option<NaiveDate> {
        self.text(name)
            .and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok())
    }

    /// Render a field for the prompt, substituting `placeholder` when the
    /// field is absent. The rendered prompt never contains a null literal.
    pub fn display(&self, name: &str, placeholder: &str) -> String {
        match self.fields.get(name) {
            Some(value) => {
                let rendered = value.render();
                if rendered.trim().is_empty() {
                    placeholder.to_string()
                } else {
                    rendered
                }
            }
            None => placeholder.to_string(),
        }
    }
}

/// Append-only sequence of entries for one tracking domain.
///
/// Owned and mutated by the caller; the pipeline reads the latest entry and
/// a short trailing window only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HealthRecord {
    entries: Vec<HealthEntry>,
}

impl HealthRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<HealthEntry>) -> Self {
        Self { entries }
    }

    pub fn push(&mut self, entry: HealthEntry) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn latest(&self) -> Option<&HealthEntry> {
        self.entries.last()
    }

    /// Up to `n` entries immediately preceding the latest, oldest first.
    pub fn trailing(&self, n: usize) -> &[HealthEntry] {
        if self.entries.len() < 2 {
            return &[];
        }
        let end = self.entries.len() - 1;
        let start = end.saturating_sub(n);
        &self.entries[start..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn display_substitutes_placeholder_for_missing_field() {
        let entry = HealthEntry::new(day("2026-07-01"));
        assert_eq!(entry.display("bbt", "Not recorded"), "Not recorded");
    }

    #[test]
    fn display_substitutes_placeholder_for_blank_text() {
        let entry = HealthEntry::new(day("2026-07-01"))
            .with_field("notes", FieldValue::Text("   ".into()));
        assert_eq!(entry.display("notes", "Not recorded"), "Not recorded");
    }

    #[test]
    fn whole_numbers_render_without_fraction() {
        let entry = HealthEntry::new(day("2026-07-01"))
            .with_field("cycle_length", FieldValue::Number(28.0))
            .with_field("bbt", FieldValue::Number(97.2));
        assert_eq!(entry.display("cycle_length", "-"), "28");
        assert_eq!(entry.display("bbt", "-"), "97.2");
    }

    #[test]
    fn lists_render_comma_separated() {
        let entry = HealthEntry::new(day("2026-07-01")).with_field(
            "symptoms",
            FieldValue::List(vec!["cramping".into(), "bloating".into()]),
        );
        assert_eq!(entry.display("symptoms", "-"), "cramping, bloating");
    }

    #[test]
    fn date_field_parses_iso_and_tolerates_garbage() {
        let entry = HealthEntry::new(day("2026-07-01"))
            .with_field("last_period", FieldValue::Text("2026-06-20".into()))
            .with_field("bad_date", FieldValue::Text("yesterday-ish".into()));
        assert_eq!(entry.date("last_period"), Some(day("2026-06-20")));
        assert_eq!(entry.date("bad_date"), None);
    }

    #[test]
    fn trailing_excludes_latest_and_caps_length() {
        let mut record = HealthRecord::new();
        for d in ["2026-07-01", "2026-07-02", "2026-07-03", "2026-07-04", "2026-07-05"] {
            record.push(HealthEntry::new(day(d)));
        }
        let trailing = record.trailing(3);
        assert_eq!(trailing.len(), 3);
        assert_eq!(trailing[0].recorded_at, day("2026-07-02"));
        assert_eq!(trailing[2].recorded_at, day("2026-07-04"));
        assert_eq!(record.latest().unwrap().recorded_at, day("2026-07-05"));
    }

    #[test]
    fn trailing_on_single_entry_is_empty() {
        let mut record = HealthRecord::new();
        record.push(HealthEntry::new(day("2026-07-01")));
        assert!(record.trailing(3).is_empty());
    }
}
