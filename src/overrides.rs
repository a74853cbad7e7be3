//! Default overrides.
//!
//! A durable, user-editable layer over each field's declared default. The
//! stored entry is a query string holding only what differs from the caller's
//! defaults; the effective defaults are recomputed from it on every read.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ParamsError;
use crate::query::SearchParams;
use crate::resolve::Resolved;
use crate::set::BlueprintSet;
use crate::storage::ParamStore;
use crate::value::ParamValues;

/// Settings for a [`DefaultOverrides`] instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverridesConfig {
    /// Store key the overrides live under.
    pub storage_key: String,
    /// Fields whose stored override is never consulted.
    #[serde(default)]
    pub enforced: Vec<String>,
    /// Fields never persisted.
    #[serde(default)]
    pub ignored: Vec<String>,
}

/// Persisted overrides of a blueprint set's defaults.
#[derive(Debug, Clone)]
pub struct DefaultOverrides {
    /// Caller defaults applied.
    base: BlueprintSet,
    /// Caller defaults applied, enforced fields locked.
    effective: BlueprintSet,
    config: OverridesConfig,
    excluded: Vec<String>,
    stored: SearchParams,
    from_storage: bool,
}

impl DefaultOverrides {
    /// Bind `set` with caller-supplied `defaults` and read the current entry
    /// from `store`.
    ///
    /// # Errors
    /// [`ParamsError::UnknownKey`] when `enforced` or `ignored` names a field
    /// the set does not declare.
    pub fn open(
        set: &BlueprintSet,
        defaults: &ParamValues,
        config: OverridesConfig,
        store: &dyn ParamStore,
    ) -> Result<Self, ParamsError> {
        set.check_keys(&config.enforced)?;
        set.check_keys(&config.ignored)?;

        let base = set.with_defaults(defaults);
        let effective = base.with_locked(&config.enforced);

        let mut excluded: Vec<String> = config
            .ignored
            .iter()
            .chain(config.enforced.iter())
            .cloned()
            .chain(set.ignored_keys().into_iter().map(str::to_string))
            .chain(set.ephemeral_keys().into_iter().map(str::to_string))
            .collect();
        excluded.sort();
        excluded.dedup();

        let mut overrides = Self {
            base,
            effective,
            config,
            excluded,
            stored: SearchParams::new(),
            from_storage: false,
        };
        overrides.reload(store);
        Ok(overrides)
    }

    /// Re-read the stored entry. A missing entry reads as no overrides.
    pub fn reload(&mut self, store: &dyn ParamStore) {
        match store.get(&self.config.storage_key) {
            Some(raw) => {
                self.stored = self.persistable(SearchParams::parse(&raw));
                self.from_storage = true;
            }
            None => {
                self.stored = SearchParams::new();
                self.from_storage = false;
            }
        }
    }

    pub fn config(&self) -> &OverridesConfig {
        &self.config
    }

    /// Whether the last read or write found a stored entry.
    pub fn from_storage(&self) -> bool {
        self.from_storage
    }

    /// Stored overrides, already stripped of excluded fields.
    pub fn stored(&self) -> &SearchParams {
        &self.stored
    }

    /// Fields never read from or written to the store.
    pub fn excluded_keys(&self) -> &[String] {
        &self.excluded
    }

    /// Effective default snapshot: stored overrides over caller defaults,
    /// enforced fields pinned to the caller default.
    pub fn effective(&self) -> Resolved<'_> {
        self.effective.full(&self.stored)
    }

    pub fn effective_values(&self) -> ParamValues {
        self.effective().into_values()
    }

    /// Effective snapshot as a canonical query string.
    pub fn effective_query(&self) -> String {
        self.effective().to_query_string()
    }

    /// The set with effective defaults applied.
    pub fn effective_blueprints(&self) -> BlueprintSet {
        self.base.with_defaults(&self.effective_values())
    }

    /// Resolve `search` over the effective defaults.
    pub fn query_for(&self, search: &SearchParams) -> String {
        self.effective_blueprints().full(search).to_query_string()
    }

    /// Persist `values`, replacing the stored entry.
    ///
    /// Only non-excluded fields that differ from the caller defaults are
    /// written. An empty result removes the entry.
    pub fn write(
        &mut self,
        values: &ParamValues,
        store: &mut dyn ParamStore,
    ) -> Result<(), ParamsError> {
        let delta = self.base.delta(values);
        let params = self.persistable(delta.to_params()).sorted();
        let encoded = params.to_string();

        if encoded.is_empty() {
            store.remove(&self.config.storage_key)?;
            self.from_storage = false;
        } else {
            store.set(&self.config.storage_key, &encoded)?;
            self.from_storage = true;
        }
        debug!(
            storage_key = %self.config.storage_key,
            fields = params.len(),
            "wrote default overrides"
        );
        self.stored = params;
        Ok(())
    }

    /// Delete the stored entry.
    pub fn clear(&mut self, store: &mut dyn ParamStore) -> Result<(), ParamsError> {
        store.remove(&self.config.storage_key)?;
        self.stored = SearchParams::new();
        self.from_storage = false;
        debug!(storage_key = %self.config.storage_key, "cleared default overrides");
        Ok(())
    }

    fn persistable(&self, mut params: SearchParams) -> SearchParams {
        params.retain_keys(|k| !self.excluded.iter().any(|e| e == k));
        params
    }
}
