use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// String-keyed map that keeps document order. Builds are stored
/// newest-first and packages case-insensitively sorted, so key order is part
/// of the persisted format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderedMap<V> {
    entries: IndexMap<String, V>,
}

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }
}

impl<V> OrderedMap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        self.entries.get_mut(key)
    }

    /// Replace the value in place when `key` exists, otherwise append.
    pub fn insert(&mut self, key: impl Into<String>, value: V) -> Option<V> {
        self.entries.insert(key.into(), value)
    }

    /// Insert `key` as the first entry. Existing entries keep their relative
    /// order; an existing `key` is moved to the front.
    pub fn insert_first(&mut self, key: impl Into<String>, value: V) {
        self.entries.shift_insert(0, key.into(), value);
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Stable sort on keys.
    pub fn sort_keys_by<F>(&mut self, mut compare: F)
    where
        F: FnMut(&str, &str) -> Ordering,
    {
        self.entries.sort_by(|a, _, b, _| compare(a, b));
    }

    pub fn sort_keys_case_insensitive(&mut self) {
        self.entries.sort_by_cached_key(|key, _| key.to_lowercase());
    }
}

impl<V> FromIterator<(String, V)> for OrderedMap<V> {
    fn from_iter<I: IntoIterator<Item = (String, V)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::OrderedMap;

    #[test]
    fn insert_first_shifts_existing_entries() {
        let mut map = OrderedMap::new();
        map.insert("b", 2);
        map.insert("c", 3);
        map.insert_first("a", 1);
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["a", "b", "c"]);
    }

    #[test]
    fn insert_first_moves_existing_key_to_front() {
        let mut map = OrderedMap::new();
        map.insert("a", 1);
        map.insert("b", 2);
        map.insert_first("b", 5);
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(map.get("b"), Some(&5));
    }

    #[test]
    fn insert_replaces_in_place() {
        let mut map = OrderedMap::new();
        map.insert("x", 1);
        map.insert("y", 2);
        assert_eq!(map.insert("x", 9), Some(1));
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["x", "y"]);
        assert_eq!(map.get("x"), Some(&9));
    }

    #[test]
    fn case_insensitive_sort_is_stable() {
        let mut map: OrderedMap<u8> = ["beta", "Alpha", "ALPHA", "gamma"]
            .into_iter()
            .enumerate()
            .map(|(i, k)| (k.to_string(), i as u8))
            .collect();
        map.sort_keys_case_insensitive();
        assert_eq!(
            map.keys().collect::<Vec<_>>(),
            vec!["Alpha", "ALPHA", "beta", "gamma"]
        );
    }

    #[test]
    fn json_round_trip_keeps_document_order() {
        let raw = r#"{"z":1,"a":2,"m":3}"#;
        let map: OrderedMap<u32> = serde_json::from_str(raw).expect("parse");
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["z", "a", "m"]);
        assert_eq!(serde_json::to_string(&map).expect("encode"), raw);
    }

    #[test]
    fn duplicate_json_keys_keep_first_position() {
        let map: OrderedMap<u32> = serde_json::from_str(r#"{"a":1,"b":2,"a":3}"#).expect("parse");
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(map.get("a"), Some(&3));
    }
}
