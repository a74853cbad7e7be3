//! Resolution pipeline.
//!
//! Pure folds over a [`BlueprintSet`]: each field takes the previous state and
//! a raw source and returns the next state. Nothing here mutates its inputs or
//! fails; bad input falls back to defaults.
//!
//! ```text
//!                 ┌── full          complete typed state
//! raw source ─────┼── delta         only what differs from defaults
//!                 ├── from_source   full, without default union for filters
//!                 └── merge         per-key choice between two sources
//! Location ──────── from_location   source chosen by each field's origin
//! ```

use std::fmt;

use crate::blueprint::Origin;
use crate::navigation::Location;
use crate::query::SearchParams;
use crate::set::BlueprintSet;
use crate::value::{ParamValue, ParamValues};

/// A raw input to resolve against.
#[derive(Debug, Clone, Copy)]
pub enum Source<'a> {
    /// String-encoded parameters.
    Params(&'a SearchParams),
    /// Plain object of already-typed (or stringly) values.
    Object(&'a ParamValues),
}

impl Source<'_> {
    /// Whether the source carries any entry for `key`.
    pub fn contains(&self, key: &str) -> bool {
        match self {
            Self::Params(params) => params.has(key),
            Self::Object(values) => values.contains_key(key),
        }
    }
}

impl<'a> From<&'a SearchParams> for Source<'a> {
    fn from(params: &'a SearchParams) -> Self {
        Self::Params(params)
    }
}

impl<'a> From<&'a ParamValues> for Source<'a> {
    fn from(values: &'a ParamValues) -> Self {
        Self::Object(values)
    }
}

/// Every raw source a field may read from during location resolution.
#[derive(Debug, Clone)]
pub struct Sources<'a> {
    search: SearchParams,
    state: &'a ParamValues,
    snapshot: Option<&'a ParamValues>,
    live: Option<&'a ParamValues>,
}

impl<'a> Sources<'a> {
    pub fn new(location: &'a Location) -> Self {
        Self {
            search: location.search_params(),
            state: &location.state,
            snapshot: None,
            live: None,
        }
    }

    /// Values for fields whose origin is [`Origin::Snapshot`].
    pub fn snapshot(mut self, values: &'a ParamValues) -> Self {
        self.snapshot = Some(values);
        self
    }

    /// Values for fields whose origin is [`Origin::Ref`].
    pub fn live(mut self, values: &'a ParamValues) -> Self {
        self.live = Some(values);
        self
    }

    /// The raw source for `origin`, if one was supplied.
    pub fn select(&self, origin: Origin) -> Option<Source<'_>> {
        match origin {
            Origin::Search => Some(Source::Params(&self.search)),
            Origin::State => Some(Source::Object(self.state)),
            Origin::Snapshot => self.snapshot.map(Source::Object),
            Origin::Ref => self.live.map(Source::Object),
        }
    }
}

impl BlueprintSet {
    /// Complete state: valid input, else default, else omitted.
    pub fn full<'s>(&self, source: impl Into<Source<'s>>) -> Resolved<'_> {
        let source = source.into();
        let values = self
            .iter()
            .fold(ParamValues::new(), |prev, bp| bp.full(prev, source));
        Resolved::new(self, values)
    }

    /// Only the fields (and filter entries) that differ from defaults.
    pub fn delta<'s>(&self, source: impl Into<Source<'s>>) -> Resolved<'_> {
        let source = source.into();
        let values = self
            .iter()
            .fold(ParamValues::new(), |prev, bp| bp.delta(prev, source));
        Resolved::new(self, values)
    }

    /// Like [`BlueprintSet::full`], but filter arrays are taken as given
    /// (deduped and sorted) instead of unioned with their defaults.
    pub fn from_source<'s>(&self, source: impl Into<Source<'s>>) -> Resolved<'_> {
        let source = source.into();
        let values = self
            .iter()
            .fold(ParamValues::new(), |prev, bp| bp.from_source(prev, source));
        Resolved::new(self, values)
    }

    pub fn from_params(&self, params: &SearchParams) -> Resolved<'_> {
        self.from_source(params)
    }

    pub fn from_object(&self, values: &ParamValues) -> Resolved<'_> {
        self.from_source(values)
    }

    /// Complete state, each field reading from the source its origin names.
    pub fn from_location(&self, sources: &Sources<'_>) -> Resolved<'_> {
        let values = self
            .iter()
            .fold(ParamValues::new(), |prev, bp| bp.from_location(prev, sources));
        Resolved::new(self, values)
    }

    /// Complete state reading fields named in `keys` from `right` and every
    /// other field from `left`.
    pub fn merge<'l, 'r, S: AsRef<str>>(
        &self,
        left: impl Into<Source<'l>>,
        right: impl Into<Source<'r>>,
        keys: &[S],
    ) -> Resolved<'_> {
        let left = left.into();
        let right = right.into();
        let values = self.iter().fold(ParamValues::new(), |prev, bp| {
            if keys.iter().any(|k| k.as_ref() == bp.name()) {
                bp.full(prev, right)
            } else {
                bp.full(prev, left)
            }
        });
        Resolved::new(self, values)
    }
}

/// A resolved state bound to the set that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<'a> {
    set: &'a BlueprintSet,
    values: ParamValues,
}

impl<'a> Resolved<'a> {
    pub fn new(set: &'a BlueprintSet, values: ParamValues) -> Self {
        Self { set, values }
    }

    pub fn blueprints(&self) -> &'a BlueprintSet {
        self.set
    }

    pub fn values(&self) -> &ParamValues {
        &self.values
    }

    pub fn into_values(self) -> ParamValues {
        self.values
    }

    /// Copy of the values.
    pub fn to_object(&self) -> ParamValues {
        self.values.clone()
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.values.get(key)
    }

    /// Whether `key` is a known field with a value, and (when `needle` is
    /// given) whether that value equals or, for filters, contains `needle`.
    pub fn has(&self, key: &str, needle: Option<&ParamValue>) -> bool {
        self.set
            .get(key)
            .is_some_and(|bp| bp.has(self.values.get(key), needle))
    }

    /// Keep only `keys`.
    pub fn pick<S: AsRef<str>>(&self, keys: &[S]) -> Self {
        self.filtered(|k| keys.iter().any(|p| p.as_ref() == k))
    }

    /// Drop `keys`.
    pub fn omit<S: AsRef<str>>(&self, keys: &[S]) -> Self {
        self.filtered(|k| !keys.iter().any(|p| p.as_ref() == k))
    }

    fn filtered(&self, keep: impl Fn(&str) -> bool) -> Self {
        let values = self
            .values
            .iter()
            .filter(|(k, _)| keep(k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Self::new(self.set, values)
    }

    /// The set's declared defaults as a resolved state.
    pub fn defaults(&self) -> Self {
        Self::new(self.set, self.set.defaults())
    }

    /// Replace the values wholesale.
    pub fn replace(&self, values: ParamValues) -> Self {
        Self::new(self.set, values)
    }

    /// Derive new values from the current ones.
    pub fn update(&self, f: impl FnOnce(&ParamValues) -> ParamValues) -> Self {
        Self::new(self.set, f(&self.values))
    }

    /// Encode in blueprint order. Nulls and unknown keys are skipped.
    pub fn to_params(&self) -> SearchParams {
        let mut out = SearchParams::new();
        for bp in self.set {
            bp.to_params(&mut out, &self.values);
        }
        out
    }

    /// Canonical (sorted) query string.
    pub fn to_query_string(&self) -> String {
        self.to_params().sorted().to_string()
    }
}

impl fmt::Display for Resolved<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_query_string())
    }
}
