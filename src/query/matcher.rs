use std::cmp::Ordering;

use regex::Regex;

use crate::model::action::Action;
use crate::query::dates::{DateResolver, parse_timestamp};
use crate::query::pattern::{Pattern, wildcard_to_regex};
use crate::query::term::{Comparator, Query, TagCriterion};

/// Which comparison path decided a tag criterion. The boolean result is all
/// the matcher uses, but surfacing the path keeps the date-vs-numeric
/// fallback honest in tests instead of silently guessing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparePath {
    NoTag,
    Presence,
    Date,
    Numeric,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompareOutcome {
    pub matched: bool,
    pub path: ComparePath,
}

impl CompareOutcome {
    fn new(matched: bool, path: ComparePath) -> Self {
        CompareOutcome { matched, path }
    }
}

/// Evaluate a query against one action. Both the free-text terms and the tag
/// criteria compose identically: if any negated member matches, reject;
/// every required member must match; the optional group is satisfied by any
/// one match and is vacuously true when empty.
pub fn matches(
    action: &Action,
    query: &Query,
    search_notes: bool,
    resolver: &dyn DateResolver,
) -> bool {
    let term_hit = |t: &Pattern| {
        t.is_match(&action.text) || (search_notes && t.is_match(&action.note_text()))
    };

    for term in query.terms.iter().filter(|t| t.negate) {
        if term_hit(&term.pattern) {
            return false;
        }
    }
    for term in query.terms.iter().filter(|t| t.required && !t.negate) {
        if !term_hit(&term.pattern) {
            return false;
        }
    }
    let optional: Vec<_> = query
        .terms
        .iter()
        .filter(|t| !t.required && !t.negate)
        .collect();
    if !optional.is_empty() && !optional.iter().any(|t| term_hit(&t.pattern)) {
        return false;
    }

    for crit in query.tags.iter().filter(|c| c.negate) {
        if compare_tag(action, crit, resolver).matched {
            return false;
        }
    }
    for crit in query.tags.iter().filter(|c| c.required && !c.negate) {
        if !compare_tag(action, crit, resolver).matched {
            return false;
        }
    }
    let optional: Vec<_> = query
        .tags
        .iter()
        .filter(|c| !c.required && !c.negate)
        .collect();
    if !optional.is_empty()
        && !optional
            .iter()
            .any(|c| compare_tag(action, c, resolver).matched)
    {
        return false;
    }

    true
}

/// Evaluate one criterion against an action's tags.
///
/// Resolution order: first tag whose name matches the criterion's name
/// pattern; presence check when there is no comparator; otherwise date
/// comparison when both sides parse, then numeric, then lexical. Nothing in
/// here propagates an error — a comparison that cannot be made is a
/// non-match.
pub fn compare_tag(
    action: &Action,
    crit: &TagCriterion,
    resolver: &dyn DateResolver,
) -> CompareOutcome {
    let found = action
        .tags
        .iter()
        .find(|(name, _)| crit.name.matches_exact(name));
    let Some((_, value)) = found else {
        return CompareOutcome::new(false, ComparePath::NoTag);
    };
    let Some(op) = crit.comparator else {
        return CompareOutcome::new(true, ComparePath::Presence);
    };
    let stored = value.as_deref().unwrap_or("");

    // Date path: both sides must parse, and the operator must be an
    // ordering/equality one. The substring-family operators always compare
    // text, even on dates.
    if !matches!(
        op,
        Comparator::Match | Comparator::Contains | Comparator::Prefix | Comparator::Suffix
    ) && let Some(lhs) = parse_timestamp(stored)
        && let Some(rhs) = resolver.resolve(&crit.value)
    {
        // Date-only granularity unless either side carries a clock time or
        // is a relative "now".
        let full = lhs.has_time || rhs.has_time || rhs.is_now;
        let ord = if full {
            lhs.dt.cmp(&rhs.dt)
        } else {
            lhs.dt.date().cmp(&rhs.dt.date())
        };
        let matched = match op {
            Comparator::Eq => ord == Ordering::Equal,
            Comparator::Lt => ord == Ordering::Less,
            Comparator::Gt => ord == Ordering::Greater,
            Comparator::Le => ord != Ordering::Greater,
            Comparator::Ge => ord != Ordering::Less,
            _ => unreachable!(),
        };
        return CompareOutcome::new(matched, ComparePath::Date);
    }

    match op {
        Comparator::Lt | Comparator::Gt | Comparator::Le | Comparator::Ge => {
            if let (Ok(a), Ok(b)) = (stored.parse::<f64>(), crit.value.parse::<f64>()) {
                let matched = match op {
                    Comparator::Lt => a < b,
                    Comparator::Gt => a > b,
                    Comparator::Le => a <= b,
                    Comparator::Ge => a >= b,
                    _ => unreachable!(),
                };
                CompareOutcome::new(matched, ComparePath::Numeric)
            } else {
                // Lexical last resort
                let ord = stored.to_lowercase().cmp(&crit.value.to_lowercase());
                let matched = match op {
                    Comparator::Lt => ord == Ordering::Less,
                    Comparator::Gt => ord == Ordering::Greater,
                    Comparator::Le => ord != Ordering::Greater,
                    Comparator::Ge => ord != Ordering::Less,
                    _ => unreachable!(),
                };
                CompareOutcome::new(matched, ComparePath::Text)
            }
        }
        Comparator::Eq => CompareOutcome::new(
            Pattern::from_token(&crit.value).matches_exact(stored),
            ComparePath::Text,
        ),
        Comparator::Match => {
            let matched = Pattern::from_regex(&crit.value)
                .map(|p| p.is_match(stored))
                .unwrap_or(false);
            CompareOutcome::new(matched, ComparePath::Text)
        }
        Comparator::Contains => CompareOutcome::new(
            Pattern::from_token(&crit.value).is_match(stored),
            ComparePath::Text,
        ),
        Comparator::Prefix => CompareOutcome::new(
            anchored(&crit.value, true).is_some_and(|re| re.is_match(stored)),
            ComparePath::Text,
        ),
        Comparator::Suffix => CompareOutcome::new(
            anchored(&crit.value, false).is_some_and(|re| re.is_match(stored)),
            ComparePath::Text,
        ),
    }
}

/// Wildcard-capable prefix/suffix regex for `^=` / `$=`.
fn anchored(value: &str, prefix: bool) -> Option<Regex> {
    let body = wildcard_to_regex(value);
    let body = &body[4..]; // strip the "(?i)" the translator prepends
    let expr = if prefix {
        format!("(?i)^{body}")
    } else {
        format!("(?i){body}$")
    };
    Regex::new(&expr).ok()
}
