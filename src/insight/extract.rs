use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

/// A declared response section: stable key plus the header aliases that may
/// announce it in the model's free text.
///
/// The first alias is the canonical header the prompt instructs the model to
/// emit; the rest absorb the model's usual drift (emoji dropped, case kept,
/// shorthand). Prompt layout and alias list are a paired contract; both
/// derive from this table.
#[derive(Debug, Clone, Copy)]
pub struct SectionSpec {
    pub key: &'static str,
    pub aliases: &'static [&'static str],
}

impl SectionSpec {
    /// Canonical header written into the prompt's output-format block.
    pub fn header(&self) -> &'static str {
        self.aliases.first().copied().unwrap_or(self.key)
    }
}

/// Bodies shorter than this echo a header with nothing under it.
const MIN_SECTION_LEN: usize = 10;

/// A body containing one of these is the model echoing the template back
/// instead of writing content; such sections are rejected.
const PLACEHOLDER_MARKERS: &[&str] = &["completed successfully", "generated", "available"];

/// Extract declared sections from a free-text response.
///
/// For each spec, aliases are tried in order; an alias matches when a
/// trimmed line contains it verbatim (case-sensitive). Lines after the
/// match are collected up to the next standalone bold header or markdown
/// heading. Keys with no valid match are absent; a fully unstructured
/// response yields an empty map, never an error.
pub fn extract_sections(
    text: &str,
    specs: &[SectionSpec],
) -> BTreeMap<String, String> {
    let lines: Vec<&str> = text.lines().collect();
    let mut sections = BTreeMap::new();

    for spec in specs {
        for alias in spec.aliases {
            if let Some(body) = collect_after_alias(&lines, alias) {
                if is_valid_body(&body) {
                    sections.insert(spec.key.to_string(), body);
                    break;
                }
            }
        }
    }

    sections
}

/// Find the first line containing `alias` and collect the lines below it,
/// exclusive of the boundary line.
fn collect_after_alias(lines: &[&str], alias: &str) -> Option<String> {
    let at = lines.iter().position(|line| line.trim().contains(alias))?;

    let body: Vec<&str> = lines[at + 1..]
        .iter()
        .take_while(|line| !is_boundary(line))
        .copied()
        .collect();

    Some(body.join("\n").trim().to_string())
}

/// A whole line that is nothing but a bolded header.
static BOLD_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\*\*[^*]+\*\*$").expect("Invalid bold header pattern"));

/// A line that starts the next section: a markdown heading or a standalone
/// bolded header.
fn is_boundary(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.starts_with('#') || BOLD_HEADER.is_match(trimmed)
}

fn is_valid_body(body: &str) -> bool {
    if body.len() < MIN_SECTION_LEN {
        return false;
    }
    let lowered = body.to_lowercase();
    !PLACEHOLDER_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPECS: &[SectionSpec] = &[
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

    #[test]
    fn round_trips_a_section_in_declared_header_format() {
        let response = "\
**📊 Clinical Summary**
Your basal temperature shows a clear biphasic pattern this cycle.
Luteal phase length looks adequate.

**🎯 Action Plan**
Keep logging temperature at the same time each morning.
";
        let sections = extract_sections(response, SPECS);
        assert_eq!(
            sections.get("clinicalSummary").unwrap(),
            "Your basal temperature shows a clear biphasic pattern this cycle.\nLuteal phase length looks adequate."
        );
        assert_eq!(
            sections.get("actionPlan").unwrap(),
            "Keep logging temperature at the same time each morning."
        );
    }

    #[test]
    fn markdown_heading_terminates_collection() {
        let response = "\
Clinical Summary
Body line one.
Body line two.
# Something else entirely
Should not be captured.
";
        let sections = extract_sections(response, SPECS);
        assert_eq!(
            sections.get("clinicalSummary").unwrap(),
            "Body line one.\nBody line two."
        );
    }

    #[test]
    fn placeholder_body_is_rejected_and_key_absent() {
        let response = "\
**📊 Clinical Summary**
Content generated

**🎯 Action Plan**
Track your luteal phase temperatures every morning this week.
";
        let sections = extract_sections(response, SPECS);
        assert!(!sections.contains_key("clinicalSummary"));
        assert!(sections.contains_key("actionPlan"));
    }

    #[test]
    fn too_short_body_is_rejected() {
        let response = "Clinical Summary\nok\n";
        let sections = extract_sections(response, SPECS);
        assert!(sections.is_empty());
    }

    #[test]
    fn later_alias_rescues_a_section_after_invalid_first_match() {
        // The emoji-marked header at the bottom carries only template echo;
        // the plain alias earlier in the response has the real content.
        let response = "\
Clinical Summary
The real summary body with actual observations in it.

**📊 Clinical Summary**
Content generated
";
        let sections = extract_sections(response, SPECS);
        assert_eq!(
            sections.get("clinicalSummary").unwrap(),
            "The real summary body with actual observations in it."
        );
    }

    #[test]
    fn unstructured_response_yields_empty_map() {
        let response = "The model just wrote a paragraph with no headers at all, \
                        talking about cycles and temperatures in general terms.";
        let sections = extract_sections(response, SPECS);
        assert!(sections.is_empty());
    }

    #[test]
    fn alias_match_is_case_sensitive() {
        let response = "clinical summary\nLowercase header should not match the alias.\n";
        let sections = extract_sections(response, SPECS);
        assert!(sections.is_empty());
    }

    #[test]
    fn header_helper_returns_first_alias() {
        assert_eq!(SPECS[0].header(), "📊 Clinical Summary");
    }

    #[test]
    fn section_at_end_of_text_is_collected() {
        let response = "**⚠️ When to Seek Care**\nIf bleeding lasts longer than usual, talk to your provider.";
        let sections = extract_sections(response, SPECS);
        assert_eq!(
            sections.get("careGuidance").unwrap(),
            "If bleeding lasts longer than usual, talk to your provider."
        );
    }
}
