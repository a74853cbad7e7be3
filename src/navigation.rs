//! Navigation collaborator.
//!
//! The engine only ever reads a [`Location`] snapshot and hands back whole
//! replacement strings through [`Navigator::navigate`]. Routing itself lives
//! outside this crate.

use serde::{Deserialize, Serialize};

use crate::query::SearchParams;
use crate::value::ParamValues;

/// Snapshot of the current navigation entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Path component, e.g. `/alerts`.
    pub pathname: String,
    /// Query string, with or without the leading `?`.
    pub search: String,
    /// Fragment, with or without the leading `#`.
    pub hash: String,
    /// Navigation state attached to this entry.
    #[serde(default)]
    pub state: ParamValues,
}

impl Location {
    pub fn new(pathname: impl Into<String>) -> Self {
        Self {
            pathname: pathname.into(),
            ..Self::default()
        }
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = hash.into();
        self
    }

    pub fn with_state(mut self, state: ParamValues) -> Self {
        self.state = state;
        self
    }

    /// Decoded query string.
    pub fn search_params(&self) -> SearchParams {
        SearchParams::parse(&self.search)
    }

    /// `pathname?search#hash` as a single string.
    pub fn href(&self) -> String {
        let mut href = self.pathname.clone();
        let search = self.search.strip_prefix('?').unwrap_or(&self.search);
        if !search.is_empty() {
            href.push('?');
            href.push_str(search);
        }
        let hash = self.hash.strip_prefix('#').unwrap_or(&self.hash);
        if !hash.is_empty() {
            href.push('#');
            href.push_str(hash);
        }
        href
    }
}

/// Read the current location and replace it.
pub trait Navigator {
    /// Current navigation entry.
    fn location(&self) -> Location;

    /// Replace the current path, query string and hash.
    fn navigate(&mut self, pathname: &str, search: &str, hash: &str);
}

/// In-memory navigator that records every navigation.
#[derive(Debug, Clone, Default)]
pub struct MemoryNavigator {
    current: Location,
    history: Vec<Location>,
}

impl MemoryNavigator {
    pub fn new(location: Location) -> Self {
        Self {
            current: location,
            history: Vec::new(),
        }
    }

    /// Entries pushed by [`Navigator::navigate`], oldest first.
    pub fn history(&self) -> &[Location] {
        &self.history
    }

    /// Number of navigations performed.
    pub fn navigations(&self) -> usize {
        self.history.len()
    }

    /// Replace the current entry without recording a navigation, as a user
    /// editing the address bar would.
    pub fn visit(&mut self, location: Location) {
        self.current = location;
    }
}

impl Navigator for MemoryNavigator {
    fn location(&self) -> Location {
        self.current.clone()
    }

    fn navigate(&mut self, pathname: &str, search: &str, hash: &str) {
        let search = search.strip_prefix('?').unwrap_or(search);
        let next = Location {
            pathname: pathname.to_string(),
            search: if search.is_empty() {
                String::new()
            } else {
                format!("?{search}")
            },
            hash: hash.to_string(),
            state: self.current.state.clone(),
        };
        self.history.push(next.clone());
        self.current = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_href() {
        let loc = Location::new("/alerts").with_search("?q=1").with_hash("#top");
        assert_eq!(loc.href(), "/alerts?q=1#top");
        assert_eq!(Location::new("/alerts").href(), "/alerts");
    }

    #[test]
    fn test_memory_navigator_records() {
        let mut nav = MemoryNavigator::new(Location::new("/alerts").with_hash("#x"));
        nav.navigate("/alerts", "q=1", "#x");
        nav.navigate("/alerts", "", "#x");

        assert_eq!(nav.navigations(), 2);
        assert_eq!(nav.history()[0].search, "?q=1");
        assert_eq!(nav.location().search, "");
        assert_eq!(nav.location().hash, "#x");
    }

    #[test]
    fn test_visit_does_not_record() {
        let mut nav = MemoryNavigator::default();
        nav.visit(Location::new("/a").with_search("q=2"));
        assert_eq!(nav.navigations(), 0);
        assert_eq!(nav.location().search_params().get("q"), Some("2"));
    }
}
