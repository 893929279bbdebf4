// Structurally immutable sorted map.
//
// Built once from an iterator; there is no API that mutates it afterwards.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Index;

#[derive(Clone, PartialEq, Eq)]
pub struct FrozenMap<K, V> {
    entries: Box<[(K, V)]>,
}

impl<K: Ord, V> FrozenMap<K, V> {
    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries
            .binary_search_by(|(k, _)| k.cmp(key))
            .ok()
            .map(|i| &self.entries[i].1)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }
}

impl<K, V> FrozenMap<K, V> {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in ascending key order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&K, &V)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn keys(&self) -> impl ExactSizeIterator<Item = &K> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl ExactSizeIterator<Item = &V> {
        self.entries.iter().map(|(_, v)| v)
    }

    /// The only entry, if there is exactly one.
    pub fn single(&self) -> Option<(&K, &V)> {
        match &*self.entries {
            [(k, v)] => Some((k, v)),
            _ => None,
        }
    }
}

impl<K, V> Default for FrozenMap<K, V> {
    fn default() -> Self {
        Self {
            entries: Box::new([]),
        }
    }
}

/// Later duplicates replace earlier ones.
impl<K: Ord, V> FromIterator<(K, V)> for FrozenMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut entries: Vec<(K, V)> = Vec::new();
        for (key, value) in iter {
            match entries.binary_search_by(|(k, _)| k.cmp(&key)) {
                Ok(i) => entries[i].1 = value,
                Err(i) => entries.insert(i, (key, value)),
            }
        }
        Self {
            entries: entries.into_boxed_slice(),
        }
    }
}

impl<K: Ord + fmt::Debug, V> Index<&K> for FrozenMap<K, V> {
    type Output = V;

    fn index(&self, key: &K) -> &V {
        match self.get(key) {
            Some(value) => value,
            None => panic!("key {key:?} not present in frozen map"),
        }
    }
}

impl<K: Hash, V: Hash> Hash for FrozenMap<K, V> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.entries.hash(state);
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for FrozenMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
