use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Demographic and lifestyle attributes supplied by the caller per request.
///
/// Never persisted by the pipeline; absent attributes render as
/// "Not specified" so prompts stay free of null literals.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserProfile {
    pub age: Option<u32>,
    #[serde(default)]
    pub conditions: Vec<String>,
    /// Free-form lifestyle flags: "exercise" → "3x weekly", "smoking" → "no".
    #[serde(default)]
    pub lifestyle: BTreeMap<String, String>,
}

impl UserProfile {
    pub fn with_age(age: u32) -> Self {
        Self {
            age: Some(age),
            ..Self::default()
        }
    }

    pub fn age_display(&self) -> String {
        match self.age {
            Some(age) => age.to_string(),
            None => "Not specified".to_string(),
        }
    }

    pub fn conditions_display(&self) -> String {
        if self.conditions.is_empty() {
            "None reported".to_string()
        } else {
            self.conditions.join(", ")
        }
    }

    pub fn lifestyle_display(&self, key: &str) -> String {
        self.lifestyle
            .get(key)
            .filter(|v| !v.trim().is_empty())
            .cloned()
            .unwrap_or_else(|| "Not specified".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_profile_renders_placeholders() {
        let profile = UserProfile::default();
        assert_eq!(profile.age_display(), "Not specified");
        assert_eq!(profile.conditions_display(), "None reported");
        assert_eq!(profile.lifestyle_display("exercise"), "Not specified");
    }

    #[test]
    fn populated_profile_renders_values() {
        let mut profile = UserProfile::with_age(29);
        profile.conditions.push("PCOS".into());
        profile.lifestyle.insert("exercise".into(), "3x weekly".into());
        assert_eq!(profile.age_display(), "29");
        assert_eq!(profile.conditions_display(), "PCOS");
        assert_eq!(profile.lifestyle_display("exercise"), "3x weekly");
    }
}
