use std::path::PathBuf;

use chrono::NaiveDateTime;
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::parse::tags::scan_tags;
use crate::query::dates::{DateResolver, parse_timestamp};

/// A single task line with its tags and optional trailing note.
///
/// `tags` is derived from `text` and recomputed on every text change; code
/// must go through `set_text` or the tag helpers rather than poking `text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// Owning outline file.
    pub file: PathBuf,
    /// Top-level ancestor project name (empty for orphan actions).
    pub project: String,
    /// Full ancestor path, root first.
    pub parent: Vec<String>,
    /// The action text after the `- ` bullet, tags inline.
    pub text: String,
    /// 0-based line index in the file.
    pub line: usize,
    /// Ordered tag mapping: name → optional value.
    pub tags: IndexMap<String, Option<String>>,
    /// Trailing note lines, trimmed.
    pub note: Vec<String>,
}

impl Action {
    pub fn new(file: PathBuf, parent: Vec<String>, text: String, line: usize) -> Self {
        let tags = scan_tags(&text);
        let project = parent.first().cloned().unwrap_or_default();
        Action {
            file,
            project,
            parent,
            text,
            line,
            tags,
            note: Vec::new(),
        }
    }

    /// Replace the text and rescan tags.
    pub fn set_text(&mut self, text: String) {
        self.text = text;
        self.tags = scan_tags(&self.text);
    }

    /// Text with literal braces escaped, for the templating/plugin surface.
    /// Stored text stays raw.
    pub fn display_text(&self) -> String {
        self.text.replace('{', "{{").replace('}', "}}")
    }

    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.contains_key(name)
    }

    pub fn tag_value(&self, name: &str) -> Option<&str> {
        self.tags.get(name).and_then(|v| v.as_deref())
    }

    pub fn is_done(&self, done_tag: &str) -> bool {
        self.has_tag(done_tag)
    }

    /// The note joined for searching.
    pub fn note_text(&self) -> String {
        self.note.join("\n")
    }

    /// Append a tag, stripping any existing tag of the same name first.
    pub fn add_tag(&mut self, name: &str, value: Option<&str>) {
        self.remove_tag(name);
        let mut text = std::mem::take(&mut self.text);
        match value {
            Some(v) => text.push_str(&format!(" @{name}({v})")),
            None => text.push_str(&format!(" @{name}")),
        }
        self.set_text(text);
    }

    /// Remove every tag whose name matches `name_pattern` (`*`/`?` capable).
    pub fn remove_tag(&mut self, name_pattern: &str) {
        let Ok(re) = Regex::new(&format!(
            r"(?:^|\s)@(?:{})(?:\((?:\\.|[^)\\])*\))?",
            tag_name_regex(name_pattern)
        )) else {
            return;
        };
        let stripped = re.replace_all(&self.text, "").trim().to_string();
        self.set_text(stripped);
    }

    /// Replace the priority tag's value in place, or append one.
    pub fn set_priority(&mut self, priority: u32) {
        if self.has_tag("priority") {
            let re = Regex::new(r"@priority(?:\([^)]*\))?").unwrap();
            let text = re
                .replace(&self.text, format!("@priority({priority})"))
                .into_owned();
            self.set_text(text);
        } else {
            self.add_tag("priority", Some(&priority.to_string()));
        }
    }

    /// Stamp the done tag with a timestamp, unless already done.
    pub fn finish(&mut self, done_tag: &str, at: NaiveDateTime) {
        if self.is_done(done_tag) {
            return;
        }
        let stamp = at.format("%Y-%m-%d %H:%M").to_string();
        self.add_tag(done_tag, Some(&stamp));
    }

    /// Rewrite natural-language values of the configured date tags into
    /// canonical timestamp form. Values already in the strict grammar are
    /// left alone; unresolvable phrases are left alone too.
    pub fn normalize_date_tags(&mut self, resolver: &dyn DateResolver, date_tags: &[String]) {
        for name in date_tags {
            let Some(Some(value)) = self.tags.get(name).cloned() else {
                continue;
            };
            if value.is_empty() || parse_timestamp(&value).is_some() {
                continue;
            }
            if let Some(resolved) = resolver.resolve(&value) {
                let old = format!("@{}({})", name, value);
                let new = format!("@{}({})", name, resolved.canonical());
                let text = self.text.replacen(&old, &new, 1);
                self.set_text(text);
            }
        }
    }
}

/// Translate a wildcard-capable tag *name* into a regex body. Unlike free
/// text patterns, `*`/`?` here only span tag-name characters, so the
/// optional `(value)` that follows is never swallowed.
fn tag_name_regex(name_pattern: &str) -> String {
    let mut out = String::new();
    for ch in name_pattern.chars() {
        match ch {
            '*' => out.push_str(r"[A-Za-z0-9_-]*"),
            '?' => out.push_str(r"[A-Za-z0-9_-]"),
            _ => out.push_str(&regex::escape(&ch.to_string())),
        }
    }
    out
}
