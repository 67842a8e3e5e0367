use regex::Regex;

/// A compiled match pattern: the typed replacement for ad hoc regex grammar.
///
/// `Literal` compares text directly (case-insensitive), `Wildcard` is a
/// user pattern using `*`/`?`, `Regex` is a raw user-supplied expression.
#[derive(Debug, Clone)]
pub enum Pattern {
    Literal(String),
    /// Wildcard patterns carry two compiled forms: the lazy runs in `search`
    /// only have to occur somewhere, while `exact` is anchored — under `^`/`$`
    /// a lazy run is still forced across the whole string, which a span check
    /// on the unanchored regex is not (leftmost-shortest semantics).
    Wildcard { search: Regex, exact: Regex },
    Regex(Regex),
}

impl Pattern {
    /// Build a pattern from user input. Tokens containing `*` or `?` compile
    /// to a wildcard regex; everything else stays a literal. An invalid
    /// compile (pathological input) degrades to a literal, never an error —
    /// the query grammar is user-supplied.
    pub fn from_token(token: &str) -> Pattern {
        if token.contains('*') || token.contains('?') {
            let search = Regex::new(&wildcard_to_regex(token));
            let exact = Regex::new(&wildcard_to_anchored_regex(token));
            if let (Ok(search), Ok(exact)) = (search, exact) {
                return Pattern::Wildcard { search, exact };
            }
        }
        Pattern::Literal(token.to_string())
    }

    /// Build a raw-regex pattern. `None` when the expression is invalid;
    /// callers treat that as a failed match rather than an error.
    pub fn from_regex(expr: &str) -> Option<Pattern> {
        Regex::new(&format!("(?i){expr}")).ok().map(Pattern::Regex)
    }

    /// Substring-style search: does the pattern occur anywhere in `text`?
    pub fn is_match(&self, text: &str) -> bool {
        match self {
            Pattern::Literal(lit) => {
                text.to_lowercase().contains(&lit.to_lowercase())
            }
            Pattern::Wildcard { search, .. } => search.is_match(text),
            Pattern::Regex(re) => re.is_match(text),
        }
    }

    /// Anchored match: the whole of `text` must match.
    pub fn matches_exact(&self, text: &str) -> bool {
        match self {
            Pattern::Literal(lit) => text.eq_ignore_ascii_case(lit),
            Pattern::Wildcard { exact, .. } => exact.is_match(text),
            Pattern::Regex(re) => Regex::new(&format!("^(?:{})$", re.as_str()))
                .map(|anchored| anchored.is_match(text))
                .unwrap_or(false),
        }
    }
}

/// Translate a `*`/`?` wildcard token into a case-insensitive regex.
/// `*` becomes a lazy any-run, `?` a single character; everything else is
/// escaped literally.
pub fn wildcard_to_regex(token: &str) -> String {
    let mut out = String::from("(?i)");
    for ch in token.chars() {
        match ch {
            '*' => out.push_str(".*?"),
            '?' => out.push('.'),
            _ => out.push_str(&regex::escape(&ch.to_string())),
        }
    }
    out
}

/// Translate a wildcard token into a whole-string regex.
pub fn wildcard_to_anchored_regex(token: &str) -> String {
    let body = wildcard_to_regex(token);
    // "(?i)" prefix is 4 chars; anchor around the body
    format!("(?i)^{}$", &body[4..])
}
