use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;

/// `@name` or `@name(value)`, preceded by start-of-string or whitespace.
/// The value may contain anything except an unescaped `)`.
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\s)@([A-Za-z0-9_-]+)(?:\(((?:\\.|[^)\\])*)\))?").unwrap()
});

/// Extract all tags from an action's text into an ordered mapping.
///
/// Duplicate names keep the position of their first appearance; the last
/// occurrence's value wins.
pub fn scan_tags(text: &str) -> IndexMap<String, Option<String>> {
    let mut tags = IndexMap::new();
    for caps in TAG_RE.captures_iter(text) {
        let name = caps[1].to_string();
        let value = caps.get(2).map(|m| m.as_str().to_string());
        tags.insert(name, value);
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_tag() {
        let tags = scan_tags("Buy milk @home");
        assert_eq!(tags.get("home"), Some(&None));
    }

    #[test]
    fn test_tag_with_value() {
        let tags = scan_tags("File taxes @due(2025-04-15) @priority(2)");
        assert_eq!(
            tags.get("due"),
            Some(&Some("2025-04-15".to_string()))
        );
        assert_eq!(tags.get("priority"), Some(&Some("2".to_string())));
    }

    #[test]
    fn test_tag_at_start() {
        let tags = scan_tags("@next call the bank");
        assert!(tags.contains_key("next"));
    }

    #[test]
    fn test_mid_word_at_sign_is_not_a_tag() {
        let tags = scan_tags("email bob@example.com about it");
        assert!(tags.is_empty());
    }

    #[test]
    fn test_duplicate_keeps_first_position_last_value() {
        let tags = scan_tags("x @p(1) @q @p(2)");
        let keys: Vec<_> = tags.keys().cloned().collect();
        assert_eq!(keys, vec!["p", "q"]);
        assert_eq!(tags.get("p"), Some(&Some("2".to_string())));
    }

    #[test]
    fn test_escaped_paren_in_value() {
        let tags = scan_tags(r"note @msg(see \) bracket)");
        assert_eq!(tags.get("msg"), Some(&Some(r"see \) bracket".to_string())));
    }

    #[test]
    fn test_empty_value() {
        let tags = scan_tags("x @due()");
        assert_eq!(tags.get("due"), Some(&Some(String::new())));
    }
}
