//! Keyword-presence heuristics that turn analysis text into flag lists.
//!
//! These are deliberate substring scans, not language understanding: the
//! keyword → flag mapping is a declared table so the behavior is stable and
//! testable. Duplicate or missed flags are acceptable; silent drift is not.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagCategory {
    Risk,
    Recommendation,
    Alert,
}

/// One row of the scan table: lowercase keyword, the bucket it feeds, and
/// the canned message surfaced when it appears.
#[derive(Debug, Clone, Copy)]
pub struct KeywordRule {
    pub keyword: &'static str,
    pub category: FlagCategory,
    pub message: &'static str,
}

/// Vocabulary shared by every tracking domain.
pub const COMMON_RULES: &[KeywordRule] = &[
    KeywordRule {
        keyword: "irregular",
        category: FlagCategory::Risk,
        message: "The analysis notes irregular patterns in your recent entries.",
    },
    KeywordRule {
        keyword: "stress",
        category: FlagCategory::Risk,
        message: "Stress appears as a contributing factor in this analysis.",
    },
    KeywordRule {
        keyword: "worsen",
        category: FlagCategory::Risk,
        message: "The analysis mentions a trend that may be worsening.",
    },
    KeywordRule {
        keyword: "timing",
        category: FlagCategory::Recommendation,
        message: "Review the timing guidance highlighted in your analysis.",
    },
    KeywordRule {
        keyword: "hydration",
        category: FlagCategory::Recommendation,
        message: "Hydration came up — keep steady fluid intake through the day.",
    },
    KeywordRule {
        keyword: "follow up",
        category: FlagCategory::Recommendation,
        message: "A follow-up was suggested — consider scheduling one.",
    },
    KeywordRule {
        keyword: "consult",
        category: FlagCategory::Alert,
        message: "The analysis suggests discussing these results with your healthcare provider.",
    },
    KeywordRule {
        keyword: "seek care",
        category: FlagCategory::Alert,
        message: "The analysis flags findings that may need clinical attention.",
    },
];

/// Flags produced by one scan, bucketed by category.
#[derive(Debug, Default)]
pub struct FlagScan {
    pub risks: Vec<String>,
    pub recommendations: Vec<String>,
    pub alerts: Vec<String>,
}

/// Case-insensitive substring scan of `text` against the rule tables, in
/// table order. Messages are deduplicated; a keyword appearing five times
/// surfaces its flag once.
pub fn scan_flags(tables: &[&[KeywordRule]], text: &str) -> FlagScan {
    let lowered = text.to_lowercase();
    let mut scan = FlagScan::default();

    for rule in tables.iter().flat_map(|table| table.iter()) {
        if !lowered.contains(rule.keyword) {
            continue;
        }
        let bucket = match rule.category {
            FlagCategory::Risk => &mut scan.risks,
            FlagCategory::Recommendation => &mut scan.recommendations,
            FlagCategory::Alert => &mut scan.alerts,
        };
        if !bucket.iter().any(|message| message == rule.message) {
            bucket.push(rule.message.to_string());
        }
    }

    scan
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_common_keyword_feeds_its_declared_bucket() {
        for rule in COMMON_RULES {
            let scan = scan_flags(&[COMMON_RULES], rule.keyword);
            let bucket = match rule.category {
                FlagCategory::Risk => &scan.risks,
                FlagCategory::Recommendation => &scan.recommendations,
                FlagCategory::Alert => &scan.alerts,
            };
            assert!(
                bucket.iter().any(|m| m == rule.message),
                "keyword {:?} did not surface its message",
                rule.keyword
            );
        }
    }

    #[test]
    fn scan_is_case_insensitive() {
        let scan = scan_flags(&[COMMON_RULES], "Your cycle looks IRREGULAR this month.");
        assert_eq!(scan.risks.len(), 1);
    }

    #[test]
    fn repeated_keyword_surfaces_once() {
        let scan = scan_flags(
            &[COMMON_RULES],
            "stress, stress and more stress — stress everywhere",
        );
        assert_eq!(scan.risks.len(), 1);
    }

    #[test]
    fn consultation_maps_to_alert() {
        let scan = scan_flags(&[COMMON_RULES], "A consultation may help clarify these results.");
        assert_eq!(scan.alerts.len(), 1);
        assert!(scan.risks.is_empty());
    }

    #[test]
    fn clean_text_produces_no_flags() {
        let scan = scan_flags(
            &[COMMON_RULES],
            "Everything looks steady this cycle. Keep logging as usual.",
        );
        assert!(scan.risks.is_empty());
        assert!(scan.recommendations.is_empty());
        assert!(scan.alerts.is_empty());
    }

    #[test]
    fn common_keywords_are_lowercase() {
        for rule in COMMON_RULES {
            assert_eq!(rule.keyword, rule.keyword.to_lowercase());
        }
    }

    #[test]
    fn multiple_tables_scan_in_order() {
        const EXTRA: &[KeywordRule] = &[KeywordRule {
            keyword: "cramping",
            category: FlagCategory::Risk,
            message: "Cramping was called out in the analysis.",
        }];
        let scan = scan_flags(&[COMMON_RULES, EXTRA], "irregular cycles with cramping");
        assert_eq!(scan.risks.len(), 2);
        assert!(scan.risks[0].contains("irregular"));
        assert!(scan.risks[1].contains("Cramping"));
    }
}
