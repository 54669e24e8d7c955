//! In-memory decryption key set.
//!
//! Keys are never written to disk. The set keeps insertion order, rejects
//! blanks and duplicates, and tracks at most one selected key.

use serde::Serialize;

/// Ordered set of user-supplied decryption keys with an optional selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DecryptionKeySet {
    keys: Vec<String>,
    selected: Option<String>,
}

impl DecryptionKeySet {
    /// Empty set, nothing selected.
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Key used for the next decode, if any.
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Exact membership test.
    pub fn contains(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k == key)
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// True when no key was added.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Append `key` and select it.
    ///
    /// Returns `false` (and changes nothing) for blank or already-present keys.
    pub fn add(&mut self, key: &str) -> bool {
        if key.trim().is_empty() || self.contains(key) {
            return false;
        }
        self.keys.push(key.to_string());
        self.selected = Some(key.to_string());
        true
    }

    /// Remove `key`. If it was selected, the first remaining key (or none)
    /// becomes selected. Returns `false` if the key was not present.
    pub fn remove(&mut self, key: &str) -> bool {
        let Some(pos) = self.keys.iter().position(|k| k == key) else {
            return false;
        };
        self.keys.remove(pos);
        if self.selected.as_deref() == Some(key) {
            self.selected = self.keys.first().cloned();
        }
        true
    }

    /// Set the selected key. Membership is not checked; callers pass keys
    /// taken from [`keys`](Self::keys).
    pub fn select(&mut self, key: Option<&str>) {
        self.selected = key.map(str::to_string);
    }
}
