//! Filter grammar codec.
//!
//! Array entries may be wrapped in prefix operators: `NOT(value)` negates an
//! entry, `!(value)` marks it as removed relative to the defaults. Operators
//! nest to any depth, e.g. `NOT(!(malware))`.
//!
//! ```text
//! "NOT(!(malware))"  ──unwrap──►  FilterEntry { operators: ["NOT", "!"], literal: "malware" }
//!                    ◄──wrap────
//! ```
//!
//! A string whose wrapping is unbalanced or uses an unknown operator is read as
//! a bare literal in full. Nothing is ever partially unwrapped.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::{DEFAULT_NOT_TOKEN, DEFAULT_OMIT_TOKEN};

/// One decoded array entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilterEntry {
    /// Operators, outermost first.
    pub operators: Vec<String>,
    /// The wrapped value.
    pub literal: String,
}

impl FilterEntry {
    pub fn literal(value: impl Into<String>) -> Self {
        Self {
            operators: Vec::new(),
            literal: value.into(),
        }
    }

    /// Wrap this entry in one more outer operator.
    pub fn wrapped_in(mut self, operator: impl Into<String>) -> Self {
        self.operators.insert(0, operator.into());
        self
    }

    pub fn outermost(&self) -> Option<&str> {
        self.operators.first().map(String::as_str)
    }

    /// Flat token list: operators outermost-first, literal last.
    pub fn tokens(&self) -> Vec<&str> {
        self.operators
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.literal.as_str()))
            .collect()
    }
}

/// Operator configuration for one filter-array field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterGrammar {
    pub not_token: String,
    pub omit_token: String,
}

impl Default for FilterGrammar {
    fn default() -> Self {
        Self {
            not_token: DEFAULT_NOT_TOKEN.to_string(),
            omit_token: DEFAULT_OMIT_TOKEN.to_string(),
        }
    }
}

impl FilterGrammar {
    pub fn new(not_token: impl Into<String>, omit_token: impl Into<String>) -> Self {
        Self {
            not_token: not_token.into(),
            omit_token: omit_token.into(),
        }
    }

    /// Strip operator layers until the remaining string is a bare literal.
    ///
    /// The omit token is tried before the not token at every layer.
    pub fn unwrap(&self, value: &str) -> FilterEntry {
        let mut operators = Vec::new();
        let mut rest = value;

        loop {
            if let Some(inner) = strip_operator(rest, &self.omit_token) {
                operators.push(self.omit_token.clone());
                rest = inner;
            } else if let Some(inner) = strip_operator(rest, &self.not_token) {
                operators.push(self.not_token.clone());
                rest = inner;
            } else {
                break;
            }
        }

        FilterEntry {
            operators,
            literal: rest.to_string(),
        }
    }

    /// Rebuild the flat string, applying the innermost operator first.
    pub fn wrap(&self, entry: &FilterEntry) -> String {
        entry
            .operators
            .iter()
            .rev()
            .fold(entry.literal.clone(), |inner, op| format!("{op}({inner})"))
    }

    pub fn is_omitted(&self, entry: &FilterEntry) -> bool {
        entry.outermost() == Some(self.omit_token.as_str())
    }

    /// Keep one entry per literal, scanning right to left so later entries
    /// win, then drop entries whose outermost operator is the omit token.
    ///
    /// The result is in right-to-left encounter order; callers sort it with
    /// [`FilterGrammar::canonical`] before exposing it.
    pub fn dedupe(&self, entries: Vec<FilterEntry>) -> Vec<FilterEntry> {
        let mut kept: Vec<FilterEntry> = Vec::with_capacity(entries.len());
        for entry in entries.into_iter().rev() {
            if !kept.iter().any(|k| k.literal == entry.literal) {
                kept.push(entry);
            }
        }
        kept.retain(|entry| !self.is_omitted(entry));
        kept
    }

    /// Entries needed to turn `defaults` into `current`.
    ///
    /// Emits every current entry not present verbatim among the defaults, and
    /// an omit-wrapped copy of every default whose literal no longer appears in
    /// `current`. Entries present in both are dropped. Both inputs are expected
    /// to be deduped already, so each literal occurs at most once per side.
    pub fn diff(&self, current: &[FilterEntry], defaults: &[FilterEntry]) -> Vec<FilterEntry> {
        let mut out = Vec::new();

        for entry in current.iter().rev() {
            let wrapped = self.wrap(entry);
            if !defaults.iter().any(|d| self.wrap(d) == wrapped) {
                out.push(entry.clone());
            }
        }

        for entry in defaults.iter().rev() {
            if !current.iter().any(|c| c.literal == entry.literal) {
                out.push(entry.clone().wrapped_in(self.omit_token.clone()));
            }
        }

        out
    }

    /// Sort by literal and wrap back to flat strings.
    pub fn canonical(&self, mut entries: Vec<FilterEntry>) -> Vec<String> {
        entries.sort_by(|a, b| caseless_cmp(&a.literal, &b.literal));
        entries.iter().map(|e| self.wrap(e)).collect()
    }

    pub fn unwrap_all<S: AsRef<str>>(&self, values: &[S]) -> Vec<FilterEntry> {
        values.iter().map(|v| self.unwrap(v.as_ref())).collect()
    }

    /// Dedupe and canonicalize a single list.
    pub fn clean<S: AsRef<str>>(&self, values: &[S]) -> Vec<String> {
        self.canonical(self.dedupe(self.unwrap_all(values)))
    }

    /// Union `current` over `defaults`: later (current) entries win per literal,
    /// omitted entries disappear.
    pub fn union<S: AsRef<str>, T: AsRef<str>>(&self, defaults: &[S], current: &[T]) -> Vec<String> {
        let mut entries = self.unwrap_all(defaults);
        entries.extend(self.unwrap_all(current));
        self.canonical(self.dedupe(entries))
    }

    /// Minimal entries that reproduce `current` when unioned over `defaults`.
    pub fn delta<S: AsRef<str>, T: AsRef<str>>(&self, current: &[S], defaults: &[T]) -> Vec<String> {
        let current = self.dedupe(self.unwrap_all(current));
        let defaults = self.dedupe(self.unwrap_all(defaults));
        self.canonical(self.diff(&current, &defaults))
    }
}

/// Inner text of `op(...)` when the parenthesis opened after `op` is the one
/// closed by the final character.
fn strip_operator<'a>(value: &'a str, op: &str) -> Option<&'a str> {
    let inner = value
        .strip_prefix(op)?
        .strip_prefix('(')?
        .strip_suffix(')')?;

    let mut depth = 0usize;
    for c in inner.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.checked_sub(1)?,
            _ => {}
        }
    }
    (depth == 0).then_some(inner)
}

/// Case-insensitive code-point ordering, lowercase first on ties. Not locale
/// collation: punctuation such as `:` and `_` sorts by code point.
fn caseless_cmp(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| b.cmp(a))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn grammar() -> FilterGrammar {
        FilterGrammar::default()
    }

    #[test]
    fn test_unwrap_nested() {
        let entry = grammar().unwrap("NOT(!(malware))");
        assert_eq!(entry.operators, vec!["NOT", "!"]);
        assert_eq!(entry.literal, "malware");
        assert_eq!(entry.tokens(), vec!["NOT", "!", "malware"]);
        assert_eq!(grammar().wrap(&entry), "NOT(!(malware))");
    }

    #[test]
    fn test_unwrap_bare_literal() {
        let entry = grammar().unwrap("type:pe");
        assert!(entry.operators.is_empty());
        assert_eq!(entry.literal, "type:pe");
    }

    #[test]
    fn test_malformed_is_literal() {
        for raw in ["NOT(a", "NOT(a)(b)", "NOT(!(a)", "NOT)a(", "NOTa)", "AND(a)"] {
            let entry = grammar().unwrap(raw);
            assert!(entry.operators.is_empty(), "{raw} should not unwrap");
            assert_eq!(entry.literal, raw);
        }
    }

    #[test]
    fn test_inner_parentheses_survive() {
        let entry = grammar().unwrap("NOT(f(x))");
        assert_eq!(entry.operators, vec!["NOT"]);
        assert_eq!(entry.literal, "f(x)");
    }

    #[test]
    fn test_custom_tokens() {
        let g = FilterGrammar::new("-", "~");
        let entry = g.unwrap("~(-(a))");
        assert_eq!(entry.operators, vec!["~", "-"]);
        assert_eq!(entry.literal, "a");
        // Default tokens mean nothing to a custom grammar.
        assert_eq!(g.unwrap("NOT(a)").literal, "NOT(a)");
    }

    #[test]
    fn test_dedupe_rightmost_wins() {
        let g = grammar();
        let out = g.dedupe(g.unwrap_all(&["a", "NOT(a)"]));
        assert_eq!(out.len(), 1);
        assert_eq!(g.wrap(&out[0]), "NOT(a)");

        let out = g.dedupe(g.unwrap_all(&["NOT(a)", "a"]));
        assert_eq!(g.wrap(&out[0]), "a");
    }

    #[test]
    fn test_dedupe_drops_omitted() {
        let g = grammar();
        let out = g.clean(&["a", "b", "!(a)"]);
        assert_eq!(out, vec!["b"]);

        // Only the outermost operator decides omission.
        let out = g.clean(&["NOT(!(c))"]);
        assert_eq!(out, vec!["NOT(!(c))"]);
    }

    #[test]
    fn test_union_overrides_default() {
        let g = grammar();
        let out = g.union(&["type:pe"], &["NOT(type:pe)", "type:elf"]);
        assert_eq!(out, vec!["type:elf", "NOT(type:pe)"]);
    }

    #[test]
    fn test_union_removes_default() {
        let g = grammar();
        assert!(g.union(&["a"], &["!(a)"]).is_empty());
    }

    #[test]
    fn test_delta_additions_and_omissions() {
        let g = grammar();
        assert_eq!(
            g.delta(&["NOT(type:pe)", "type:elf"], &["type:pe"]),
            vec!["type:elf", "NOT(type:pe)"]
        );
        assert_eq!(g.delta(&["b"], &["a", "b"]), vec!["!(a)"]);
        assert!(g.delta(&["a", "b"], &["b", "a"]).is_empty());
    }

    #[test]
    fn test_delta_then_union_reproduces() {
        let g = grammar();
        let defaults = ["a", "NOT(b)", "c"];
        let current = ["b", "c", "d"];
        let delta = g.delta(&current, &defaults);
        assert_eq!(g.union(&defaults, &delta), g.clean(&current));
    }

    #[test]
    fn test_canonical_order_is_case_insensitive() {
        let g = grammar();
        assert_eq!(g.clean(&["b", "NOT(A)", "a2"]), vec!["NOT(A)", "a2", "b"]);
        // Punctuation follows code points after lowercasing.
        assert_eq!(g.clean(&["a_b", "a:b", "A:a"]), vec!["A:a", "a:b", "a_b"]);
    }
}
