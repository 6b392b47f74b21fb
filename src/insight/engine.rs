use std::collections::BTreeMap;

use chrono::{Local, NaiveDate};

use crate::config::ProviderSettings;
use crate::domains::{DomainModule, DomainRegistry};
use crate::models::{HealthRecord, InsightResult, UserProfile};
use crate::providers::registry::ProviderRegistry;

use super::extract::extract_sections;
use super::keywords::{scan_flags, COMMON_RULES};
use super::InsightError;

/// The generic insight pipeline.
///
/// One engine serves every tracking domain: prompt construction, the
/// provider chain, section extraction, and assembly are shared; domains
/// contribute only data and rules. Provider-side failures never reach the
/// caller; they degrade to the rule-based result instead.
pub struct InsightEngine {
    providers: ProviderRegistry,
    domains: DomainRegistry,
}

impl InsightEngine {
    pub fn new(providers: ProviderRegistry, domains: DomainRegistry) -> Self {
        Self { providers, domains }
    }

    /// Engine over the default provider chain and built-in domains.
    pub fn from_settings(settings: &ProviderSettings) -> Self {
        Self::new(
            ProviderRegistry::from_settings(settings),
            DomainRegistry::builtin(),
        )
    }

    /// The provider chain, exposed for status reporting and operator reset.
    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    pub fn domains(&self) -> &DomainRegistry {
        &self.domains
    }

    /// Generate insights for one domain. The only caller-visible failure is
    /// an unknown domain key; everything provider-side degrades internally.
    pub async fn generate_insights(
        &self,
        domain: &str,
        record: &HealthRecord,
        profile: &UserProfile,
    ) -> Result<InsightResult, InsightError> {
        self.generate_insights_at(domain, record, profile, Local::now().date_naive())
            .await
    }

    /// Same as `generate_insights` with the reference date injected, so
    /// derived cycle math is reproducible in tests and replays.
    pub async fn generate_insights_at(
        &self,
        domain: &str,
        record: &HealthRecord,
        profile: &UserProfile,
        today: NaiveDate,
    ) -> Result<InsightResult, InsightError> {
        let module = self
            .domains
            .get(domain)
            .ok_or_else(|| InsightError::UnknownDomain(domain.to_string()))?;

        Ok(self
            .generate_for(module.as_ref(), record, profile, today)
            .await)
    }

    async fn generate_for(
        &self,
        module: &dyn DomainModule,
        record: &HealthRecord,
        profile: &UserProfile,
        today: NaiveDate,
    ) -> InsightResult {
        // Step 1: Build the prompt (pure, placeholder-safe).
        let prompt = module.build_prompt(record, profile, today);

        // Step 2: Run the provider chain; primary first, fallback on
        // exhaustion, sequential and same-tick throughout.
        match self.providers.execute(&prompt).await {
            Ok(generated) => {
                self.assemble_live(module, record, profile, today, generated.text, generated.provider)
            }
            Err(failure) => {
                tracing::warn!(
                    domain = module.key(),
                    attempts = failure.attempts.len(),
                    error = %failure,
                    "all providers failed, serving rule-based insights"
                );
                self.assemble_degraded(module, record, profile, today)
            }
        }
    }

    fn assemble_live(
        &self,
        module: &dyn DomainModule,
        record: &HealthRecord,
        profile: &UserProfile,
        today: NaiveDate,
        raw_text: String,
        provider: String,
    ) -> InsightResult {
        // Step 3: Extract declared sections from the free text.
        let sections = extract_sections(&raw_text, module.sections());
        if sections.is_empty() {
            // A sparse but valid state; the raw text still serves as the
            // main analysis.
            tracing::debug!(domain = module.key(), "no structured sections extracted");
        }

        // Step 4: Keyword scans run over whichever section text exists,
        // falling back to the whole response.
        let scan_source = if sections.is_empty() {
            raw_text.clone()
        } else {
            sections.values().cloned().collect::<Vec<_>>().join("\n")
        };
        let flags = scan_flags(&[COMMON_RULES, module.keyword_rules()], &scan_source);

        tracing::info!(
            domain = module.key(),
            provider = provider.as_str(),
            sections = sections.len(),
            risks = flags.risks.len(),
            "insight generation complete"
        );

        // Step 5: Assemble AI-derived pieces plus the always-on
        // rule-based generators.
        InsightResult {
            quick_check: module.quick_check(record, today),
            ai_analysis: raw_text,
            sections,
            risk_assessment: flags.risks,
            recommendations: flags.recommendations,
            medical_alerts: flags.alerts,
            personalized_tips: module.personalized_tips(record, profile),
            gentle_reminders: module.gentle_reminders(record),
            provider: Some(provider),
            generated_at: Local::now().naive_local(),
        }
    }

    /// Same shape as the live path, built from the rule-based generators
    /// alone.
    fn assemble_degraded(
        &self,
        module: &dyn DomainModule,
        record: &HealthRecord,
        profile: &UserProfile,
        today: NaiveDate,
    ) -> InsightResult {
        InsightResult {
            quick_check: module.quick_check(record, today),
            ai_analysis: module.unavailable_analysis(),
            sections: BTreeMap::new(),
            risk_assessment: Vec::new(),
            recommendations: Vec::new(),
            medical_alerts: Vec::new(),
            personalized_tips: module.personalized_tips(record, profile),
            gentle_reminders: module.gentle_reminders(record),
            provider: None,
            generated_at: Local::now().naive_local(),
        }
    }
}
