use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// One labelled value projected straight from the latest entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuickMetric {
    pub label: String,
    pub value: String,
}

impl QuickMetric {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// A predicted date window derived with whole-day arithmetic
/// (fertile window, next period, screening due range).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictedWindow {
    pub label: String,
    pub starts: NaiveDate,
    pub ends: NaiveDate,
}

/// Non-AI summary computed directly from the latest record entry.
///
/// Pure field projection plus one derived window; produced identically on
/// the live and degraded paths.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickCheck {
    pub headline: String,
    pub metrics: Vec<QuickMetric>,
    pub next_window: Option<PredictedWindow>,
    /// Weighted 0–100 score over the latest entry's fields.
    pub wellness_score: Option<f32>,
}

/// The structured result handed back to the tracking client.
///
/// Shape is identical whether the analysis came from a provider or from the
/// degraded rule-based path; callers never need to distinguish them
/// structurally. `provider` carries the serving provider's name, or `None`
/// when insights were assembled without one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightResult {
    pub quick_check: QuickCheck,
    /// The full response text, rendered alongside any structured sections.
    pub ai_analysis: String,
    /// Extracted sections by key; keys with no matching header are absent.
    pub sections: BTreeMap<String, String>,
    pub risk_assessment: Vec<String>,
    pub recommendations: Vec<String>,
    pub medical_alerts: Vec<String>,
    pub personalized_tips: Vec<String>,
    pub gentle_reminders: Vec<String>,
    pub provider: Option<String>,
    pub generated_at: NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_serializes_camel_case_keys() {
        let result = InsightResult {
            quick_check: QuickCheck::default(),
            ai_analysis: "text".into(),
            sections: BTreeMap::new(),
            risk_assessment: vec![],
            recommendations: vec![],
            medical_alerts: vec![],
            personalized_tips: vec![],
            gentle_reminders: vec![],
            provider: Some("gemini".into()),
            generated_at: NaiveDate::from_ymd_opt(2026, 7, 1)
                .unwrap()
                .and_hms_opt(8, 30, 0)
                .unwrap(),
        };
        let json = serde_json::to_value(&result).unwrap();
        let obj = json.as_object().unwrap();
        for key in [
            "quickCheck",
            "aiAnalysis",
            "sections",
            "riskAssessment",
            "recommendations",
            "medicalAlerts",
            "personalizedTips",
            "gentleReminders",
            "provider",
            "generatedAt",
        ] {
            assert!(obj.contains_key(key), "missing key {key}");
        }
    }

    #[test]
    fn window_serializes_dates_as_iso() {
        let window = PredictedWindow {
            label: "Fertile window".into(),
            starts: NaiveDate::from_ymd_opt(2026, 7, 10).unwrap(),
            ends: NaiveDate::from_ymd_opt(2026, 7, 15).unwrap(),
        };
        let json = serde_json::to_value(&window).unwrap();
        assert_eq!(json["starts"], "2026-07-10");
        assert_eq!(json["ends"], "2026-07-15");
    }
}
