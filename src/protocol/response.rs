//! Response definitions
//!
//! Typed results assembled from server replies.

use std::collections::hash_map;
use std::collections::HashMap;
use std::str::FromStr;

/// A value block returned by `get`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Value {
    /// Key echoed in the `VALUE` header
    pub key: String,

    /// Opaque client flags stored with the item
    pub flags: u32,

    /// Item data
    pub data: Vec<u8>,
}

/// Statistics reported by `stats`, name to raw string value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stats {
    entries: HashMap<String, String>,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry, replacing any earlier value for the same name
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(name.into(), value.into());
    }

    /// Raw value of a statistic
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    /// Value of a statistic parsed into `T`; `None` if absent or unparseable
    pub fn get_parsed<T: FromStr>(&self, name: &str) -> Option<T> {
        self.get(name).and_then(|v| v.parse().ok())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> hash_map::Iter<'_, String, String> {
        self.entries.iter()
    }

    pub fn into_inner(self) -> HashMap<String, String> {
        self.entries
    }
}

impl IntoIterator for Stats {
    type Item = (String, String);
    type IntoIter = hash_map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl FromIterator<(String, String)> for Stats {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
