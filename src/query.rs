//! The string-encoded parameter format.
//!
//! An ordered multiset of `key=value` pairs. Repeated keys are meaningful for
//! filter arrays. Values are percent-decoded on read and form-urlencoded on
//! write (`url::form_urlencoded`, the same encoding browsers use).

use std::fmt;
use url::form_urlencoded;

/// Ordered `key=value` pairs decoded from a query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchParams {
    pairs: Vec<(String, String)>,
}

impl SearchParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a query string. A leading `?` is ignored.
    pub fn parse(input: &str) -> Self {
        let input = input.strip_prefix('?').unwrap_or(input);
        Self {
            pairs: form_urlencoded::parse(input.as_bytes())
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect(),
        }
    }

    /// First value recorded for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Every value recorded for `key`, in encounter order.
    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn has(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == key)
    }

    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((key.into(), value.into()));
    }

    /// Drop every pair for `key`.
    pub fn remove(&mut self, key: &str) {
        self.pairs.retain(|(k, _)| k != key);
    }

    /// Keep only pairs whose key satisfies `keep`.
    pub fn retain_keys(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.pairs.retain(|(k, _)| keep(k));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Canonical ordering: pairs sorted by key, then by value.
    ///
    /// Two equivalent parameter sets always encode to the same string once
    /// sorted, which is what the provider's idempotence check relies on.
    pub fn sorted(mut self) -> Self {
        self.pairs.sort();
        self
    }
}

impl fmt::Display for SearchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let encoded = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.pairs.iter())
            .finish();
        f.write_str(&encoded)
    }
}

impl From<&str> for SearchParams {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SearchParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            pairs: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for SearchParams {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.pairs
            .extend(iter.into_iter().map(|(k, v)| (k.into(), v.into())));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_repeated_keys() {
        let params = SearchParams::parse("?query=evil&filters=NOT(type:pe)&filters=type%3Aelf");
        assert_eq!(params.get("query"), Some("evil"));
        assert_eq!(params.get_all("filters"), vec!["NOT(type:pe)", "type:elf"]);
        assert_eq!(params.get("missing"), None);
        assert!(params.get_all("missing").is_empty());
    }

    #[test]
    fn test_plus_and_percent_decoding() {
        let params = SearchParams::parse("query=hello+world&name=a%20b%26c");
        assert_eq!(params.get("query"), Some("hello world"));
        assert_eq!(params.get("name"), Some("a b&c"));
    }

    #[test]
    fn test_display_encodes() {
        let params: SearchParams = vec![("q", "a b&c"), ("f", "NOT(x)")].into_iter().collect();
        assert_eq!(params.to_string(), "q=a+b%26c&f=NOT%28x%29");
        assert_eq!(SearchParams::parse(&params.to_string()), params);
    }

    #[test]
    fn test_sorted_is_canonical() {
        let a = SearchParams::parse("query=evil&filters=type:elf&filters=NOT(type:pe)").sorted();
        let b = SearchParams::parse("filters=NOT(type:pe)&query=evil&filters=type:elf").sorted();
        assert_eq!(a.to_string(), b.to_string());
        assert_eq!(
            a.iter().collect::<Vec<_>>(),
            vec![
                ("filters", "NOT(type:pe)"),
                ("filters", "type:elf"),
                ("query", "evil")
            ]
        );
    }

    #[test]
    fn test_remove_and_retain() {
        let mut params = SearchParams::parse("a=1&b=2&a=3&c=4");
        params.remove("a");
        assert_eq!(params.to_string(), "b=2&c=4");
        params.retain_keys(|k| k != "c");
        assert_eq!(params.to_string(), "b=2");
        assert!(!params.is_empty());
        assert_eq!(params.len(), 1);
    }
}
