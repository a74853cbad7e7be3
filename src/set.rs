//! Blueprint sets.
//!
//! An insertion-ordered, immutable collection of field blueprints with unique
//! keys. Built once per consuming page and shared for its lifetime; derived
//! sets (new defaults, extra locks) are new values.

use crate::blueprint::Blueprint;
use crate::error::ParamsError;
use crate::value::ParamValues;

/// Ordered mapping of field name to blueprint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlueprintSet {
    fields: Vec<Blueprint>,
}

impl BlueprintSet {
    pub fn builder() -> BlueprintSetBuilder {
        BlueprintSetBuilder::default()
    }

    /// Build a set from `(key, blueprint)` pairs.
    ///
    /// # Errors
    /// Returns [`ParamsError::DuplicateKey`] or [`ParamsError::EmptyKey`].
    pub fn new<K, I>(fields: I) -> Result<Self, ParamsError>
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Blueprint)>,
    {
        fields
            .into_iter()
            .fold(Self::builder(), |b, (key, bp)| b.field(key, bp))
            .build()
    }

    pub fn get(&self, key: &str) -> Option<&Blueprint> {
        self.fields.iter().find(|bp| bp.name() == key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Blueprint> {
        self.fields.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(Blueprint::name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Every valid declared default.
    pub fn defaults(&self) -> ParamValues {
        self.fields
            .iter()
            .filter(|bp| bp.valid(bp.default_value()))
            .map(|bp| (bp.name().to_string(), bp.default_value().clone()))
            .collect()
    }

    pub fn ignored_keys(&self) -> Vec<&str> {
        self.keys_where(Blueprint::is_ignored)
    }

    pub fn ephemeral_keys(&self) -> Vec<&str> {
        self.keys_where(Blueprint::is_ephemeral)
    }

    pub fn locked_keys(&self) -> Vec<&str> {
        self.keys_where(Blueprint::is_locked)
    }

    fn keys_where(&self, pred: impl Fn(&Blueprint) -> bool) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|bp| pred(bp))
            .map(Blueprint::name)
            .collect()
    }

    /// Fail if any of `keys` is not a field of this set.
    pub fn check_keys<S: AsRef<str>>(&self, keys: &[S]) -> Result<(), ParamsError> {
        match keys.iter().find(|k| !self.contains(k.as_ref())) {
            Some(unknown) => Err(ParamsError::UnknownKey(unknown.as_ref().to_string())),
            None => Ok(()),
        }
    }

    /// Derive a set whose defaults are replaced by the valid entries of
    /// `values`. Invalid or unknown entries are skipped.
    pub fn with_defaults(&self, values: &ParamValues) -> Self {
        let fields = self
            .fields
            .iter()
            .map(|bp| match values.get(bp.name()) {
                Some(value) if bp.valid(value) => bp.clone().with_default(value.clone()),
                _ => bp.clone(),
            })
            .collect();
        Self { fields }
    }

    /// Derive a set in which every field named in `keys` is locked.
    pub fn with_locked<S: AsRef<str>>(&self, keys: &[S]) -> Self {
        let fields = self
            .fields
            .iter()
            .map(|bp| {
                if keys.iter().any(|k| k.as_ref() == bp.name()) {
                    bp.clone().locked(true)
                } else {
                    bp.clone()
                }
            })
            .collect();
        Self { fields }
    }
}

impl<'a> IntoIterator for &'a BlueprintSet {
    type Item = &'a Blueprint;
    type IntoIter = std::slice::Iter<'a, Blueprint>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

/// Incremental builder for [`BlueprintSet`].
#[derive(Debug, Default)]
pub struct BlueprintSetBuilder {
    fields: Vec<(String, Blueprint)>,
}

impl BlueprintSetBuilder {
    pub fn field(mut self, key: impl Into<String>, blueprint: Blueprint) -> Self {
        self.fields.push((key.into(), blueprint));
        self
    }

    pub fn build(self) -> Result<BlueprintSet, ParamsError> {
        let mut fields: Vec<Blueprint> = Vec::with_capacity(self.fields.len());
        for (key, blueprint) in self.fields {
            if key.is_empty() {
                return Err(ParamsError::EmptyKey);
            }
            if fields.iter().any(|bp| bp.name() == key) {
                return Err(ParamsError::DuplicateKey(key));
            }
            fields.push(blueprint.key(key));
        }
        Ok(BlueprintSet { fields })
    }
}
