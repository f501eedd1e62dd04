//! `${name}` placeholder resolution
//!
//! Every folder, file name and recipient setting is a template resolved
//! against the variable scope of the current token.

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("placeholder pattern is valid"))
}

/// Returns true if the template contains at least one `${...}` placeholder
///
/// A burst file name without placeholders selects single-record mode.
pub fn has_placeholders(template: &str) -> bool {
    placeholder_pattern().is_match(template)
}

/// Resolves every `${name}` in `template` from `scope`
///
/// Unknown names resolve to the empty string.
///
/// ```
/// use burstline::core::template::render;
/// use std::collections::BTreeMap;
///
/// let mut scope = BTreeMap::new();
/// scope.insert("burst_token".to_string(), "42".to_string());
/// assert_eq!(render("${burst_token}-${missing}.txt", &scope), "42-.txt");
/// ```
pub fn render(template: &str, scope: &BTreeMap<String, String>) -> String {
    placeholder_pattern()
        .replace_all(template, |caps: &regex::Captures<'_>| {
            scope.get(caps[1].trim()).cloned().unwrap_or_default()
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("${burst_token}.pdf", true)]
    #[test_case("invoice-${id}-${now}.txt", true)]
    #[test_case("report.pdf", false)]
    #[test_case("$burst_token.pdf", false)]
    #[test_case("${}", false)]
    fn test_has_placeholders(template: &str, expected: bool) {
        assert_eq!(has_placeholders(template), expected);
    }

    #[test]
    fn test_render_substitutes_all_occurrences() {
        let mut scope = BTreeMap::new();
        scope.insert("a".to_string(), "x".to_string());
        scope.insert("b".to_string(), "y".to_string());

        assert_eq!(render("${a}/${b}/${a}", &scope), "x/y/x");
    }

    #[test]
    fn test_render_leaves_plain_text() {
        assert_eq!(render("plain.txt", &BTreeMap::new()), "plain.txt");
    }
}
