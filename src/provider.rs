//! Page-facing parameter provider.
//!
//! Consumers read a typed state and write back either a replacement or an
//! updater. Non-default values of hidden fields go to an internal store; the
//! rest are encoded into the visible query string and handed to the
//! [`Navigator`].
//!
//! ```text
//!   Location ──sync──► merge(visible search, hidden store) ──► state
//!
//!   write ──► full ──► delta ──┬── hidden keys ──► hidden store
//!                              └── the rest ────► navigate(path, search, hash)
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ParamsError;
use crate::navigation::{Location, Navigator};
use crate::query::SearchParams;
use crate::resolve::Resolved;
use crate::set::BlueprintSet;
use crate::value::{ParamValue, ParamValues};

/// Settings for a [`SearchParamsProvider`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Fields kept out of the visible query string.
    #[serde(default)]
    pub hidden: Vec<String>,
    /// Fields that always resolve to their effective default.
    #[serde(default)]
    pub enforced: Vec<String>,
}

/// Typed view over the current location plus a hidden store.
#[derive(Debug, Clone)]
pub struct SearchParamsProvider {
    base: BlueprintSet,
    /// `base` with effective defaults applied and enforced fields locked.
    set: BlueprintSet,
    config: ProviderConfig,
    location: Location,
    location_key: Option<String>,
    hidden_store: SearchParams,
    state: ParamValues,
    last_emitted: Option<(String, String)>,
}

impl SearchParamsProvider {
    /// # Errors
    /// [`ParamsError::UnknownKey`] when `hidden` or `enforced` names a field
    /// the set does not declare.
    pub fn new(set: &BlueprintSet, config: ProviderConfig) -> Result<Self, ParamsError> {
        set.check_keys(&config.hidden)?;
        set.check_keys(&config.enforced)?;

        let locked = set.with_locked(&config.enforced);
        let state = locked.defaults();
        Ok(Self {
            base: set.clone(),
            set: locked,
            config,
            location: Location::default(),
            location_key: None,
            hidden_store: SearchParams::new(),
            state,
            last_emitted: None,
        })
    }

    /// Use `defaults` (typically from default overrides) as the effective
    /// defaults and recompute the state.
    pub fn with_defaults(mut self, defaults: &ParamValues) -> Self {
        self.set_defaults(defaults);
        self
    }

    pub fn set_defaults(&mut self, defaults: &ParamValues) {
        self.set = self
            .base
            .with_defaults(defaults)
            .with_locked(&self.config.enforced);
        self.recompute();
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub fn blueprints(&self) -> &BlueprintSet {
        &self.set
    }

    /// Current typed state.
    pub fn state(&self) -> Resolved<'_> {
        Resolved::new(&self.set, self.state.clone())
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.state.get(key)
    }

    pub fn hidden_store(&self) -> &SearchParams {
        &self.hidden_store
    }

    /// Effective defaults as a typed snapshot.
    pub fn defaults(&self) -> Resolved<'_> {
        Resolved::new(&self.set, self.set.defaults())
    }

    /// Track `location`. The state is recomputed only when the location
    /// changed in a field that is not ignored; returns whether it was.
    /// A change also forgets the last emitted pair, so the next write always
    /// navigates.
    pub fn sync(&mut self, location: &Location) -> bool {
        let key = self.change_key(location);
        self.location = location.clone();
        if self.location_key.as_deref() == Some(key.as_str()) {
            return false;
        }
        self.location_key = Some(key);
        self.last_emitted = None;
        self.recompute();
        true
    }

    /// Replace the state with `values`. Returns whether a navigation happened.
    pub fn set_search_object(
        &mut self,
        values: &ParamValues,
        navigator: &mut dyn Navigator,
    ) -> bool {
        let full = self.set.full(values).into_values();
        self.commit(full, navigator)
    }

    /// Derive the next state from the current one.
    pub fn update_search_object(
        &mut self,
        update: impl FnOnce(&ParamValues) -> ParamValues,
        navigator: &mut dyn Navigator,
    ) -> bool {
        let next = update(&self.state);
        self.set_search_object(&next, navigator)
    }

    /// Replace the state with a string-encoded parameter set.
    pub fn set_search_params(
        &mut self,
        params: &SearchParams,
        navigator: &mut dyn Navigator,
    ) -> bool {
        let full = self.set.full(params).into_values();
        self.commit(full, navigator)
    }

    /// Derive the next parameter set from the current one.
    ///
    /// The updater sees the delta encoding of hidden and visible fields, which
    /// resolves back to the current state, omitted filter defaults included.
    pub fn update_search_params(
        &mut self,
        update: impl FnOnce(&SearchParams) -> SearchParams,
        navigator: &mut dyn Navigator,
    ) -> bool {
        let current = self.set.delta(&self.state).to_params();
        let next = update(&current);
        self.set_search_params(&next, navigator)
    }

    fn commit(&mut self, full: ParamValues, navigator: &mut dyn Navigator) -> bool {
        let delta = self.set.delta(&full);
        let hidden = delta.pick(&self.config.hidden).to_params().sorted();
        let visible = delta.omit(&self.config.hidden).to_params().sorted();
        let emitted = (hidden.to_string(), visible.to_string());

        if self.last_emitted.as_ref() == Some(&emitted) {
            debug!(search = %emitted.1, "search params unchanged; skipping navigation");
            return false;
        }

        let current = navigator.location();
        debug!(
            search_len = emitted.1.len(),
            hidden_keys = hidden.len(),
            "navigating with updated search params"
        );
        navigator.navigate(&current.pathname, &emitted.1, &current.hash);

        self.hidden_store = hidden;
        self.state = full;
        self.location = navigator.location();
        self.location_key = Some(self.change_key(&self.location));
        self.last_emitted = Some(emitted);
        true
    }

    fn recompute(&mut self) {
        let visible = self.location.search_params();
        self.state = self
            .set
            .merge(&visible, &self.hidden_store, &self.config.hidden)
            .into_values();
    }

    /// Change key of `location`: pathname, search and state with ignored
    /// fields removed.
    fn change_key(&self, location: &Location) -> String {
        let ignored = self.set.ignored_keys();
        let mut search = location.search_params();
        search.retain_keys(|k| !ignored.iter().any(|i| *i == k));

        let state: ParamValues = location
            .state
            .iter()
            .filter(|(k, _)| !ignored.iter().any(|i| *i == k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let state = serde_json::to_string(&state).unwrap_or_default();

        format!("{}?{}#{}", location.pathname, search.sorted(), state)
    }
}
