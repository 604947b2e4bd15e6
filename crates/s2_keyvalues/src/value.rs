use serde::Serialize;

/// A single KeyValues value: either a leaf string or a nested block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value {
    String(String),
    Object(KeyValues),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            Value::Object(_) => None,
        }
    }

    pub fn as_object(&self) -> Option<&KeyValues> {
        match self {
            Value::Object(kv) => Some(kv),
            Value::String(_) => None,
        }
    }
}

/// An ordered block of key/value pairs.
///
/// Keys may repeat (`SearchPaths` lists several `Game` entries), so this is a list rather
/// than a map. Every lookup compares keys ASCII case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct KeyValues {
    entries: Vec<(String, Value)>,
}

impl KeyValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<String>, value: Value) {
        self.entries.push((key.into(), value));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in source order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// First value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    }

    /// Every value stored under `key`, in source order.
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
        self.entries
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case(key))
            .find_map(|(_, v)| v.as_str())
    }

    pub fn get_object(&self, key: &str) -> Option<&KeyValues> {
        self.entries
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case(key))
            .find_map(|(_, v)| v.as_object())
    }

    /// Walk nested objects, e.g. `path(&["FileSystem", "SearchPaths"])`.
    pub fn path(&self, keys: &[&str]) -> Option<&KeyValues> {
        keys.iter()
            .try_fold(self, |current, key| current.get_object(key))
    }
}

/// A parsed KeyValues file: one named root block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    pub root_key: String,
    pub root: KeyValues,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> KeyValues {
        let mut inner = KeyValues::new();
        inner.push("Game", Value::String("citadel".into()));
        inner.push("game", Value::String("core".into()));

        let mut root = KeyValues::new();
        root.push("SearchPaths", Value::Object(inner));
        root.push("name", Value::String("Deadlock".into()));
        root
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let kv = sample();
        assert_eq!(kv.get_str("NAME"), Some("Deadlock"));
        assert!(kv.get_object("searchpaths").is_some());
    }

    #[test]
    fn test_get_all_keeps_duplicates_in_order() {
        let kv = sample();
        let paths = kv.get_object("SearchPaths").unwrap();
        let values: Vec<_> = paths.get_all("GAME").filter_map(Value::as_str).collect();
        assert_eq!(values, vec!["citadel", "core"]);
    }

    #[test]
    fn test_path_walks_objects_only() {
        let kv = sample();
        assert!(kv.path(&["SearchPaths"]).is_some());
        assert!(kv.path(&["name"]).is_none());
        assert!(kv.path(&["missing", "deeper"]).is_none());
    }
}
