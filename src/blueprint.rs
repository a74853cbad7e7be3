//! Field blueprints.
//!
//! A [`Blueprint`] is the schema of one field: its kind, default value,
//! behavioural flags and type constraints. Blueprints are plain values built
//! with consuming builder methods, so a blueprint can be cloned and reused as
//! a template for another field without aliasing.
//!
//! ```
//! use search_params::Blueprint;
//!
//! let rows = Blueprint::number(5.0).min(10.0).max(20.0);
//! assert_eq!(rows.default_value().as_f64(), Some(10.0));
//! ```

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::grammar::FilterGrammar;
use crate::query::SearchParams;
use crate::resolve::{Source, Sources};
use crate::value::{ParamValue, ParamValues};

/// Where a field reads its raw value from during location resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// The visible query string.
    #[default]
    Search,
    /// The navigation state object.
    State,
    /// A live external reference supplied by the caller.
    Ref,
    /// A previously captured snapshot of resolved values.
    Snapshot,
}

/// The closed set of field kinds and their type constraints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Boolean,
    Number { min: Option<f64>, max: Option<f64> },
    String,
    Enum { options: Vec<String> },
    Filters(FilterGrammar),
}

impl FieldKind {
    /// Short tag used in logs and schema files.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Number { .. } => "number",
            Self::String => "string",
            Self::Enum { .. } => "enum",
            Self::Filters(_) => "filters",
        }
    }

    pub fn is_filters(&self) -> bool {
        matches!(self, Self::Filters(_))
    }
}

/// Schema of a single field.
#[derive(Debug, Clone, PartialEq)]
pub struct Blueprint {
    key: String,
    kind: FieldKind,
    default: ParamValue,
    ephemeral: bool,
    ignored: bool,
    locked: bool,
    nullable: bool,
    origin: Origin,
}

impl Blueprint {
    fn with_kind(kind: FieldKind, default: ParamValue) -> Self {
        Self {
            key: String::new(),
            kind,
            default,
            ephemeral: false,
            ignored: false,
            locked: false,
            nullable: false,
            origin: Origin::Search,
        }
    }

    pub fn boolean(default: bool) -> Self {
        Self::with_kind(FieldKind::Boolean, ParamValue::Bool(default))
    }

    pub fn number(default: f64) -> Self {
        Self::with_kind(
            FieldKind::Number {
                min: None,
                max: None,
            },
            ParamValue::Number(default),
        )
    }

    pub fn string(default: impl Into<String>) -> Self {
        Self::with_kind(FieldKind::String, ParamValue::String(default.into()))
    }

    /// Closed set of string options. A default outside `options` is invalid
    /// and the field is then left out of resolved state when no input matches.
    pub fn enumeration<I, S>(default: impl Into<String>, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_kind(
            FieldKind::Enum {
                options: options.into_iter().map(Into::into).collect(),
            },
            ParamValue::String(default.into()),
        )
    }

    /// Filter array with the default `NOT` / `!` operators.
    pub fn filters<I, S>(defaults: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_kind(
            FieldKind::Filters(FilterGrammar::default()),
            ParamValue::List(defaults.into_iter().map(Into::into).collect()),
        )
    }

    // -------------------------------------------------------------------------
    // Builder
    // -------------------------------------------------------------------------

    /// Assign the field key. Normally done by the owning set.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Replace the default. Numbers are clamped into configured bounds.
    pub fn with_default(mut self, value: impl Into<ParamValue>) -> Self {
        self.default = self.clamp(value.into());
        self
    }

    pub fn ephemeral(mut self, ephemeral: bool) -> Self {
        self.ephemeral = ephemeral;
        self
    }

    pub fn ignored(mut self, ignored: bool) -> Self {
        self.ignored = ignored;
        self
    }

    pub fn locked(mut self, locked: bool) -> Self {
        self.locked = locked;
        self
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn origin(mut self, origin: Origin) -> Self {
        self.origin = origin;
        self
    }

    /// Lower bound for number fields; re-clamps the current default.
    /// No effect on other kinds.
    pub fn min(mut self, bound: f64) -> Self {
        if let FieldKind::Number { min, .. } = &mut self.kind {
            *min = Some(bound);
            self.default = self.clamp(self.default.clone());
        }
        self
    }

    /// Upper bound for number fields; re-clamps the current default.
    /// No effect on other kinds.
    pub fn max(mut self, bound: f64) -> Self {
        if let FieldKind::Number { max, .. } = &mut self.kind {
            *max = Some(bound);
            self.default = self.clamp(self.default.clone());
        }
        self
    }

    /// Replace the option set of an enum field.
    pub fn options<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let FieldKind::Enum { options } = &mut self.kind {
            *options = values.into_iter().map(Into::into).collect();
        }
        self
    }

    /// Negation operator of a filters field.
    pub fn not_token(mut self, token: impl Into<String>) -> Self {
        if let FieldKind::Filters(grammar) = &mut self.kind {
            grammar.not_token = token.into();
        }
        self
    }

    /// Omission operator of a filters field.
    pub fn omit_token(mut self, token: impl Into<String>) -> Self {
        if let FieldKind::Filters(grammar) = &mut self.kind {
            grammar.omit_token = token.into();
        }
        self
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn name(&self) -> &str {
        &self.key
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    /// The declared (already clamped) default.
    pub fn default_value(&self) -> &ParamValue {
        &self.default
    }

    pub fn is_ephemeral(&self) -> bool {
        self.ephemeral
    }

    pub fn is_ignored(&self) -> bool {
        self.ignored
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn resolves_from(&self) -> Origin {
        self.origin
    }

    pub fn grammar(&self) -> Option<&FilterGrammar> {
        match &self.kind {
            FieldKind::Filters(grammar) => Some(grammar),
            _ => None,
        }
    }

    // -------------------------------------------------------------------------
    // Type strategy
    // -------------------------------------------------------------------------

    /// Parse a raw query-string value into a typed candidate.
    ///
    /// The literal `null` parses to [`ParamValue::Null`] for every kind except
    /// non-nullable strings; whether that is acceptable is decided by
    /// [`Blueprint::valid`].
    pub fn parse(&self, raw: &str) -> Option<ParamValue> {
        let parsed = match &self.kind {
            FieldKind::Boolean => match raw {
                "true" => Some(ParamValue::Bool(true)),
                "false" => Some(ParamValue::Bool(false)),
                _ => None,
            },
            FieldKind::Number { .. } => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    trimmed
                        .parse::<f64>()
                        .ok()
                        .filter(|n| n.is_finite())
                        .map(ParamValue::Number)
                }
            }
            FieldKind::String if self.nullable && raw == "null" => return Some(ParamValue::Null),
            FieldKind::String => return Some(ParamValue::String(raw.to_string())),
            FieldKind::Enum { options } => options
                .iter()
                .any(|o| o == raw)
                .then(|| ParamValue::String(raw.to_string())),
            FieldKind::Filters(_) => Some(ParamValue::List(vec![raw.to_string()])),
        };

        parsed.or_else(|| (raw == "null").then_some(ParamValue::Null))
    }

    /// Whether `value` is an acceptable resolved value for this field.
    pub fn valid(&self, value: &ParamValue) -> bool {
        match (value, &self.kind) {
            (ParamValue::Null, _) => self.nullable,
            (ParamValue::Bool(_), FieldKind::Boolean) => true,
            (ParamValue::Number(n), FieldKind::Number { .. }) => n.is_finite(),
            (ParamValue::String(_), FieldKind::String) => true,
            (ParamValue::String(s), FieldKind::Enum { options }) => options.contains(s),
            (ParamValue::List(_), FieldKind::Filters(_)) => true,
            _ => false,
        }
    }

    /// Serialize a resolved value into query-string values.
    ///
    /// Null is written as the literal `null` so nullable fields read it back.
    pub fn serialize(&self, value: &ParamValue) -> Vec<String> {
        match value {
            _ if !self.valid(value) => Vec::new(),
            ParamValue::Null => vec!["null".to_string()],
            value => value.to_query_values(),
        }
    }

    fn clamp(&self, value: ParamValue) -> ParamValue {
        match (&self.kind, value) {
            (FieldKind::Number { min, max }, ParamValue::Number(mut n)) => {
                if let Some(min) = min {
                    n = n.max(*min);
                }
                if let Some(max) = max {
                    n = n.min(*max);
                }
                ParamValue::Number(n)
            }
            (_, value) => value,
        }
    }

    /// Accept a value taken from an object source. Strings are run through
    /// [`Blueprint::parse`] so state restored from JSON may carry `"25"`.
    fn coerce(&self, value: &ParamValue) -> Option<ParamValue> {
        if self.valid(value) {
            return Some(value.clone());
        }
        match value {
            ParamValue::String(raw) if !self.kind.is_filters() => {
                self.parse(raw).filter(|v| self.valid(v))
            }
            _ => None,
        }
    }

    /// Read a valid scalar value for this field from `source`, clamped.
    pub fn get(&self, source: Source<'_>) -> Option<ParamValue> {
        let value = match source {
            Source::Params(params) => params
                .get(&self.key)
                .and_then(|raw| self.parse(raw))
                .filter(|v| self.valid(v)),
            Source::Object(values) => values.get(&self.key).and_then(|v| self.coerce(v)),
        };
        value.map(|v| self.clamp(v))
    }

    /// Read every filter entry for this field from `source`.
    ///
    /// Missing keys and non-array values read as an empty list.
    pub fn get_list(&self, source: Source<'_>) -> Vec<String> {
        match source {
            Source::Params(params) => params
                .get_all(&self.key)
                .into_iter()
                .map(str::to_string)
                .collect(),
            Source::Object(values) => match values.get(&self.key) {
                Some(ParamValue::List(items)) => items.clone(),
                _ => Vec::new(),
            },
        }
    }

    fn default_list(&self) -> &[String] {
        self.default.as_list().unwrap_or_default()
    }

    // -------------------------------------------------------------------------
    // Resolution
    // -------------------------------------------------------------------------

    /// Resolve the complete value of this field.
    pub fn full(&self, prev: ParamValues, source: Source<'_>) -> ParamValues {
        self.resolve(prev, Some(source))
    }

    /// Resolve only what differs from the default.
    pub fn delta(&self, mut prev: ParamValues, source: Source<'_>) -> ParamValues {
        if self.locked {
            return prev;
        }

        if let FieldKind::Filters(grammar) = &self.kind {
            if !source.contains(&self.key) {
                return prev;
            }
            let diff = grammar.delta(&self.get_list(source), self.default_list());
            if !diff.is_empty() {
                prev.insert(self.key.clone(), ParamValue::List(diff));
            }
            return prev;
        }

        if let Some(value) = self.get(source) {
            if value != self.default {
                prev.insert(self.key.clone(), value);
            }
        }
        prev
    }

    /// Resolve from whichever raw source this field's origin selects.
    pub fn from_location(&self, prev: ParamValues, sources: &Sources<'_>) -> ParamValues {
        self.resolve(prev, sources.select(self.origin))
    }

    /// Resolve without unioning filter arrays with their defaults.
    ///
    /// Scalars behave exactly as in [`Blueprint::full`].
    pub fn from_source(&self, mut prev: ParamValues, source: Source<'_>) -> ParamValues {
        match &self.kind {
            FieldKind::Filters(grammar) => {
                let values = if self.locked {
                    grammar.clean(self.default_list())
                } else {
                    grammar.clean(&self.get_list(source))
                };
                prev.insert(self.key.clone(), ParamValue::List(values));
                prev
            }
            _ => self.full(prev, source),
        }
    }

    fn resolve(&self, mut prev: ParamValues, source: Option<Source<'_>>) -> ParamValues {
        if let FieldKind::Filters(grammar) = &self.kind {
            let current = match source {
                Some(source) if !self.locked => self.get_list(source),
                _ => Vec::new(),
            };
            let values = grammar.union(self.default_list(), &current);
            prev.insert(self.key.clone(), ParamValue::List(values));
            return prev;
        }

        let value = match source {
            Some(source) if !self.locked => self.get(source),
            _ => None,
        };

        match value {
            Some(value) => {
                prev.insert(self.key.clone(), value);
            }
            None if self.valid(&self.default) => {
                trace!(field = %self.key, "falling back to default");
                prev.insert(self.key.clone(), self.default.clone());
            }
            None => {
                trace!(field = %self.key, "no valid value or default; omitting");
            }
        }
        prev
    }

    /// Append this field's entries from `values` to `out`.
    pub fn to_params(&self, out: &mut SearchParams, values: &ParamValues) {
        if let Some(value) = values.get(&self.key) {
            for raw in self.serialize(value) {
                out.append(self.key.clone(), raw);
            }
        }
    }

    /// Membership test: for filters, whether `needle` is one of the wrapped
    /// entries; for scalars, equality. `None` only checks presence.
    pub fn has(&self, value: Option<&ParamValue>, needle: Option<&ParamValue>) -> bool {
        match (value, needle) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(ParamValue::List(items)), Some(ParamValue::String(entry))) => {
                items.iter().any(|i| i == entry)
            }
            (Some(value), Some(needle)) => value == needle,
        }
    }
}
