//! In-memory resource bundles, keyed by language then namespace.

use serde_json::{Map, Value};
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct ResourceStore {
    data: HashMap<String, HashMap<String, Value>>,
}

impl ResourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a bundle, replacing any previous one for the same language and namespace.
    pub fn add_bundle(&mut self, lng: &str, ns: &str, bundle: Value) {
        self.data
            .entry(lng.to_string())
            .or_default()
            .insert(ns.to_string(), bundle);
    }

    pub fn bundle(&self, lng: &str, ns: &str) -> Option<&Value> {
        self.data.get(lng).and_then(|namespaces| namespaces.get(ns))
    }

    pub fn has_bundle(&self, lng: &str, ns: &str) -> bool {
        self.bundle(lng, ns).is_some()
    }

    /// Languages that have at least one bundle loaded.
    pub fn languages(&self) -> Vec<&str> {
        let mut languages: Vec<&str> = self.data.keys().map(String::as_str).collect();
        languages.sort_unstable();
        languages
    }

    /// Look up `key` in a bundle.
    ///
    /// The key is split on `key_separator` and walked through nested
    /// objects. With `ignore_json_structure` the whole key is also tried as
    /// a flat key when the nested walk finds nothing.
    pub fn resource(
        &self,
        lng: &str,
        ns: &str,
        key: &str,
        key_separator: &str,
        ignore_json_structure: bool,
    ) -> Option<&Value> {
        let bundle = self.bundle(lng, ns)?;

        let nested = key
            .split(key_separator)
            .try_fold(bundle, |node, segment| node.as_object()?.get(segment));

        match nested {
            Some(value) => Some(value),
            None if ignore_json_structure => bundle.as_object()?.get(key),
            None => None,
        }
    }
}

/// Insert `value` at a nested `key` inside a JSON object.
///
/// Intermediate objects are created as needed; a non-object node in the
/// way is replaced. Returns false, leaving the tree untouched, when the key
/// already holds a value and `overwrite` is false.
pub fn set_nested(
    root: &mut Map<String, Value>,
    key: &str,
    key_separator: &str,
    value: Value,
    overwrite: bool,
) -> bool {
    let segments: Vec<&str> = key.split(key_separator).collect();
    let Some((last, parents)) = segments.split_last() else {
        return false;
    };

    let mut node = root;
    for segment in parents {
        let entry = node
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            if !overwrite {
                return false;
            }
            *entry = Value::Object(Map::new());
        }
        node = match entry {
            Value::Object(map) => map,
            _ => return false,
        };
    }

    if node.contains_key(*last) && !overwrite {
        return false;
    }
    node.insert(last.to_string(), value);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> ResourceStore {
        let mut store = ResourceStore::new();
        store.add_bundle(
            "en",
            "app",
            json!({
                "title": "Hello",
                "nav": { "home": "Home", "deep": { "er": "Deeper" } },
                "flat.key": "Flat"
            }),
        );
        store
    }

    #[test]
    fn test_top_level_key() {
        let store = store();
        assert_eq!(
            store.resource("en", "app", "title", ".", false),
            Some(&json!("Hello"))
        );
    }

    #[test]
    fn test_nested_key() {
        let store = store();
        assert_eq!(
            store.resource("en", "app", "nav.deep.er", ".", false),
            Some(&json!("Deeper"))
        );
        assert_eq!(
            store.resource("en", "app", "nav", ".", false),
            Some(&json!({ "home": "Home", "deep": { "er": "Deeper" } }))
        );
    }

    #[test]
    fn test_flat_key_needs_ignore_json_structure() {
        let store = store();
        assert_eq!(store.resource("en", "app", "flat.key", ".", false), None);
        assert_eq!(
            store.resource("en", "app", "flat.key", ".", true),
            Some(&json!("Flat"))
        );
    }

    #[test]
    fn test_missing_bundle() {
        let store = store();
        assert_eq!(store.resource("fr", "app", "title", ".", false), None);
        assert_eq!(store.resource("en", "info", "title", ".", false), None);
        assert!(!store.has_bundle("en", "info"));
        assert_eq!(store.languages(), vec!["en"]);
    }

    #[test]
    fn test_set_nested_creates_parents() {
        let mut root = Map::new();
        assert!(set_nested(&mut root, "a.b.c", ".", json!("x"), false));
        assert_eq!(Value::Object(root), json!({ "a": { "b": { "c": "x" } } }));
    }

    #[test]
    fn test_set_nested_keeps_existing_value() {
        let mut root = json!({ "a": { "b": "kept" } })
            .as_object()
            .cloned()
            .unwrap();

        assert!(!set_nested(&mut root, "a.b", ".", json!("new"), false));
        assert_eq!(root["a"]["b"], json!("kept"));

        assert!(set_nested(&mut root, "a.b", ".", json!("new"), true));
        assert_eq!(root["a"]["b"], json!("new"));
    }

    #[test]
    fn test_set_nested_does_not_clobber_leaf_with_object() {
        let mut root = json!({ "a": "leaf" }).as_object().cloned().unwrap();
        assert!(!set_nested(&mut root, "a.b", ".", json!("x"), false));
        assert_eq!(root["a"], json!("leaf"));
    }
}
