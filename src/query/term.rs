use crate::query::pattern::Pattern;

/// Typed comparison operator for tag criteria.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    /// `=` / `==` — exact (wildcard-capable) equality
    Eq,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `<=`
    Le,
    /// `>=`
    Ge,
    /// `~=` — raw regex match
    Match,
    /// `*=` — substring
    Contains,
    /// `^=` — prefix
    Prefix,
    /// `$=` — suffix
    Suffix,
}

/// A free-text search term.
#[derive(Debug, Clone)]
pub struct QueryTerm {
    pub pattern: Pattern,
    pub required: bool,
    pub negate: bool,
}

/// A tag criterion: wildcard-capable name, optional typed comparison.
#[derive(Debug, Clone)]
pub struct TagCriterion {
    pub name: Pattern,
    pub comparator: Option<Comparator>,
    pub value: String,
    pub required: bool,
    pub negate: bool,
}

/// A parsed query: search terms plus tag criteria, each with tri-state
/// (optional / required / negated) semantics.
#[derive(Debug, Clone, Default)]
pub struct Query {
    pub terms: Vec<QueryTerm>,
    pub tags: Vec<TagCriterion>,
}

impl Query {
    /// Parse search and tag expressions. Tokens split on commas/whitespace;
    /// leading `+` marks required, `-`/`!` negated.
    pub fn parse(search: &str, tags: &str) -> Query {
        Query::parse_with_mode(search, tags, false)
    }

    /// Like `parse`, but with `regex_mode` the search tokens are compiled as
    /// raw regexes instead of wildcard/literal patterns. Invalid expressions
    /// fall back to literals rather than erroring — the grammar is
    /// user-supplied.
    pub fn parse_with_mode(search: &str, tags: &str, regex_mode: bool) -> Query {
        let terms = tokens(search)
            .map(|tok| {
                let (required, negate, body) = strip_flags(tok);
                let pattern = if regex_mode {
                    Pattern::from_regex(body)
                        .unwrap_or_else(|| Pattern::Literal(body.to_string()))
                } else {
                    Pattern::from_token(body)
                };
                QueryTerm {
                    pattern,
                    required,
                    negate,
                }
            })
            .collect();

        let tags = tokens(tags).map(parse_criterion).collect();

        Query { terms, tags }
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty() && self.tags.is_empty()
    }
}

fn tokens(s: &str) -> impl Iterator<Item = &str> {
    s.split([',', ' ', '\t']).filter(|t| !t.is_empty())
}

/// Strip leading `+` (required) and `-`/`!` (negated) markers.
fn strip_flags(tok: &str) -> (bool, bool, &str) {
    let mut required = false;
    let mut negate = false;
    let mut rest = tok;
    loop {
        if let Some(r) = rest.strip_prefix('+') {
            required = true;
            rest = r;
        } else if let Some(r) = rest.strip_prefix('-').or_else(|| rest.strip_prefix('!')) {
            negate = true;
            rest = r;
        } else {
            break;
        }
    }
    (required, negate, rest)
}

/// Parse one `name[<op>value]` criterion token. The scanner looks for the
/// first `<`, `>` or `=`; an `=` preceded by `~`, `*`, `^` or `$` starts a
/// two-character operator, so wildcards earlier in the name survive.
fn parse_criterion(tok: &str) -> TagCriterion {
    let (required, negate, body) = strip_flags(tok);

    let split = body.char_indices().find_map(|(i, c)| {
        match c {
            '<' | '>' => {
                let len = if body[i + 1..].starts_with('=') { 2 } else { 1 };
                let op = if c == '<' {
                    if len == 2 { Comparator::Le } else { Comparator::Lt }
                } else if len == 2 {
                    Comparator::Ge
                } else {
                    Comparator::Gt
                };
                Some((i, i + len, op))
            }
            '=' => {
                // Two-char op ending in '='?
                let prev = i.checked_sub(1).and_then(|j| body.as_bytes().get(j));
                match prev {
                    Some(b'~') => Some((i - 1, i + 1, Comparator::Match)),
                    Some(b'*') => Some((i - 1, i + 1, Comparator::Contains)),
                    Some(b'^') => Some((i - 1, i + 1, Comparator::Prefix)),
                    Some(b'$') => Some((i - 1, i + 1, Comparator::Suffix)),
                    _ => {
                        let len = if body[i + 1..].starts_with('=') { 2 } else { 1 };
                        Some((i, i + len, Comparator::Eq))
                    }
                }
            }
            _ => None,
        }
    });

    match split {
        Some((name_end, value_start, op)) => TagCriterion {
            name: Pattern::from_token(&body[..name_end]),
            comparator: Some(op),
            value: body[value_start..].to_string(),
            required,
            negate,
        },
        None => TagCriterion {
            name: Pattern::from_token(body),
            comparator: None,
            value: String::new(),
            required,
            negate,
        },
    }
}
