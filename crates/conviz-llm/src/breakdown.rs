//! Helpers for reading the markdown breakdown returned by the endpoint.
//!
//! A breakdown is laid out as:
//!
//! ```text
//! # <Concept Title>
//! ## Visual Representation
//! ## Detailed Explanation
//! ## Related Concepts
//! ## Notes
//! ```

/// Category used when none can be derived.
pub const UNCATEGORIZED: &str = "Uncategorized";

const RELATED_HEADING: &str = "## Related Concepts\n";

/// Text of the first level-one heading, trimmed.
pub fn extract_title(markdown: &str) -> Option<String> {
    markdown
        .lines()
        .filter_map(|line| line.trim_start().strip_prefix("# "))
        .map(str::trim)
        .find(|title| !title.is_empty())
        .map(str::to_string)
}

/// First word of the first entry under `## Related Concepts`.
///
/// The first list marker (`*` or `-`) and the whitespace after it are
/// dropped before taking the word. Falls back to [`UNCATEGORIZED`].
pub fn extract_category(markdown: &str) -> String {
    let Some(start) = markdown.find(RELATED_HEADING) else {
        return UNCATEGORIZED.to_string();
    };
    let section = &markdown[start + RELATED_HEADING.len()..];
    let section = section.find("\n#").map_or(section, |end| &section[..end]);

    section
        .lines()
        .find(|line| !line.trim().is_empty())
        .map(strip_first_marker)
        .and_then(|line| line.split(' ').next().map(str::to_string))
        .filter(|word| !word.is_empty())
        .unwrap_or_else(|| UNCATEGORIZED.to_string())
}

fn strip_first_marker(line: &str) -> String {
    match line.find(['*', '-']) {
        Some(i) => {
            let rest = line[i + 1..].trim_start();
            format!("{}{rest}", &line[..i])
        }
        None => line.to_string(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const BREAKDOWN: &str = "# Photosynthesis\n\n## Visual Representation\nsun -> leaf\n\n\
        ## Related Concepts\n\n- Respiration and energy\n- Chlorophyll\n\n## Notes\nnone\n";

    #[test]
    fn title_from_first_heading() {
        assert_eq!(extract_title(BREAKDOWN).as_deref(), Some("Photosynthesis"));
    }

    #[test]
    fn title_ignores_subheadings() {
        assert_eq!(extract_title("## Only sub\ntext"), None);
        assert_eq!(extract_title("#\n# \n#  Real  \n").as_deref(), Some("Real"));
    }

    #[test]
    fn category_from_related_concepts() {
        assert_eq!(extract_category(BREAKDOWN), "Respiration");
    }

    #[test]
    fn category_with_star_marker() {
        let md = "## Related Concepts\n*   Thermodynamics laws\n";
        assert_eq!(extract_category(md), "Thermodynamics");
    }

    #[test]
    fn category_without_section() {
        assert_eq!(extract_category("# Title\nbody"), UNCATEGORIZED);
    }

    #[test]
    fn category_with_empty_section() {
        assert_eq!(extract_category("## Related Concepts\n\n## Notes\nx"), UNCATEGORIZED);
    }

    #[test]
    fn category_with_indented_first_line() {
        // leading space survives marker removal, so the first word is empty
        assert_eq!(extract_category("## Related Concepts\n  plain\n"), UNCATEGORIZED);
    }
}
