//! Tracking domains and their registry.
//!
//! One generic engine serves every tracking module; each domain contributes
//! only data and pure rules: a prompt builder, a section schema, a keyword
//! table, tip/reminder generators, and a quick-check projection. The engine
//! never special-cases a domain.

pub mod bone;
pub mod fertility;
pub mod hormones;
pub mod medications;
pub mod mental;
pub mod preventive;
pub mod urology;

use std::sync::Arc;

use chrono::NaiveDate;

use crate::insight::extract::SectionSpec;
use crate::insight::keywords::KeywordRule;
use crate::models::{HealthRecord, QuickCheck, UserProfile};

/// One health-tracking domain plugged into the generic engine.
///
/// Everything here is pure and infallible: a missing or malformed field
/// degrades to a placeholder, never an error. The tip and reminder
/// generators succeed unconditionally; they are what the degraded path is
/// built from.
pub trait DomainModule: Send + Sync {
    /// Stable lookup key ("fertility", "hormones", …).
    fn key(&self) -> &'static str;

    /// Human-readable name used in messages.
    fn title(&self) -> &'static str;

    /// Declared response sections; prompt layout and extraction both derive
    /// from this table.
    fn sections(&self) -> &'static [SectionSpec];

    /// Domain-specific keyword rules, scanned after the common table.
    fn keyword_rules(&self) -> &'static [KeywordRule];

    /// Render the full prompt. `today` is injected for determinism.
    fn build_prompt(
        &self,
        record: &HealthRecord,
        profile: &UserProfile,
        today: NaiveDate,
    ) -> String;

    /// Non-AI projection of the latest entry.
    fn quick_check(&self, record: &HealthRecord, today: NaiveDate) -> QuickCheck;

    /// Rule-based tips over raw record fields. Never calls a provider.
    fn personalized_tips(&self, record: &HealthRecord, profile: &UserProfile) -> Vec<String>;

    /// Rule-based reminders, same contract as tips.
    fn gentle_reminders(&self, record: &HealthRecord) -> Vec<String>;

    /// Main-analysis text used when every provider failed.
    fn unavailable_analysis(&self) -> String {
        format!(
            "{} insights are temporarily unavailable. The tips and reminders below \
             come straight from your own entries and do not need the analysis service.",
            self.title()
        )
    }
}

/// Lookup over the built-in domain modules.
pub struct DomainRegistry {
    modules: Vec<Arc<dyn DomainModule>>,
}

impl DomainRegistry {
    pub fn new(modules: Vec<Arc<dyn DomainModule>>) -> Self {
        Self { modules }
    }

    /// Every tracking domain the app ships with.
    pub fn builtin() -> Self {
        Self::new(vec![
            Arc::new(fertility::FertilityModule),
            Arc::new(hormones::HormonesModule),
            Arc::new(bone::BoneMuscleModule),
            Arc::new(mental::MentalHealthModule),
            Arc::new(medications::MedicationsModule),
            Arc::new(urology::UrologyModule),
            Arc::new(preventive::PreventiveCareModule),
        ])
    }

    pub fn get(&self, key: &str) -> Option<Arc<dyn DomainModule>> {
        self.modules.iter().find(|m| m.key() == key).cloned()
    }

    pub fn keys(&self) -> Vec<&'static str> {
        self.modules.iter().map(|m| m.key()).collect()
    }
}

/// Weighted 0–100 score over optional normalized parts.
///
/// Each part is `(value in 0..=1, weight)`; absent values drop out of both
/// numerator and denominator so a sparse entry is scored on what it has.
/// `None` when nothing was measurable.
pub(crate) fn weighted_score(parts: &[(Option<f64>, f64)]) -> Option<f32> {
    let mut total = 0.0;
    let mut weight_sum = 0.0;
    for (value, weight) in parts {
        if let Some(v) = value {
            total += v.clamp(0.0, 1.0) * weight;
            weight_sum += weight;
        }
    }
    if weight_sum == 0.0 {
        None
    } else {
        Some(((total / weight_sum) * 1000.0).round() as f32 / 10.0)
    }
}

/// Normalize a value against an ideal band: inside → 1.0, outside → linear
/// falloff reaching 0.0 at `hard_lo`/`hard_hi`.
pub(crate) fn band_score(value: f64, hard_lo: f64, lo: f64, hi: f64, hard_hi: f64) -> f64 {
    if value >= lo && value <= hi {
        1.0
    } else if value < lo {
        ((value - hard_lo) / (lo - hard_lo)).clamp(0.0, 1.0)
    } else {
        ((hard_hi - value) / (hard_hi - hi)).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_registry_resolves_every_domain() {
        let registry = DomainRegistry::builtin();
        for key in [
            "fertility",
            "hormones",
            "bone-muscle",
            "mental-health",
            "medications",
            "urology",
            "preventive-care",
        ] {
            assert!(registry.get(key).is_some(), "missing domain {key}");
        }
        assert!(registry.get("astrology").is_none());
        assert_eq!(registry.keys().len(), 7);
    }

    #[test]
    fn every_domain_declares_sections_and_rules() {
        let registry = DomainRegistry::builtin();
        for key in registry.keys() {
            let module = registry.get(key).unwrap();
            assert!(!module.sections().is_empty(), "{key} has no sections");
            for spec in module.sections() {
                assert!(!spec.aliases.is_empty(), "{key}/{} has no aliases", spec.key);
            }
            for rule in module.keyword_rules() {
                assert_eq!(rule.keyword, rule.keyword.to_lowercase(), "{key} rule not lowercase");
            }
        }
    }

    #[test]
    fn weighted_score_ignores_absent_parts() {
        let score = weighted_score(&[(Some(1.0), 0.5), (None, 0.5)]);
        assert_eq!(score, Some(100.0));
    }

    #[test]
    fn weighted_score_none_when_nothing_measured() {
        assert_eq!(weighted_score(&[(None, 1.0)]), None);
    }

    #[test]
    fn weighted_score_blends_by_weight() {
        let score = weighted_score(&[(Some(1.0), 3.0), (Some(0.0), 1.0)]).unwrap();
        assert!((score - 75.0).abs() < 0.01);
    }

    #[test]
    fn band_score_boundaries() {
        assert_eq!(band_score(5.0, 0.0, 4.0, 6.0, 10.0), 1.0);
        assert_eq!(band_score(2.0, 0.0, 4.0, 6.0, 10.0), 0.5);
        assert_eq!(band_score(8.0, 0.0, 4.0, 6.0, 10.0), 0.5);
        assert_eq!(band_score(-1.0, 0.0, 4.0, 6.0, 10.0), 0.0);
        assert_eq!(band_score(11.0, 0.0, 4.0, 6.0, 10.0), 0.0);
    }
}
