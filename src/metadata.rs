//! Name/value metadata attached to files and maps.

use std::collections::BTreeMap;

/// Metadata key holding the unique identifier of a map.
pub const UNIQUE_ID_KEY: &str = "UniqueID";

/// A metadata dictionary which remembers whether it was edited.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetaData {
    entries: BTreeMap<String, String>,
    modified: bool,
}

impl MetaData {
    /// Create empty metadata.
    pub fn new() -> Self {
        MetaData::default()
    }

    /// Fetch a value by name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    /// Set a value, marking the metadata as modified if it changed.
    pub fn set<K: Into<String>, V: Into<String>>(&mut self, name: K, value: V) {
        let value = value.into();
        let old = self.entries.insert(name.into(), value.clone());
        if old.as_ref() != Some(&value) {
            self.modified = true;
        }
    }

    /// Remove a value, marking the metadata as modified if it existed.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let old = self.entries.remove(name);
        if old.is_some() {
            self.modified = true;
        }
        old
    }

    /// Remove all values.
    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            self.entries.clear();
            self.modified = true;
        }
    }

    /// Replace all values with a copy of `other`'s.
    pub fn replace(&mut self, other: &MetaData) {
        if self.entries != other.entries {
            self.entries = other.entries.clone();
            self.modified = true;
        }
    }

    /// The unique identifier stored under [`UNIQUE_ID_KEY`], if any.
    ///
    /// [`UNIQUE_ID_KEY`]: ./constant.UNIQUE_ID_KEY.html
    pub fn unique_id(&self) -> Option<&str> {
        self.get(UNIQUE_ID_KEY)
    }

    /// Iterate over all entries, ordered by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether the metadata changed since the last `clear_modified`.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Forget about previous changes.
    pub fn clear_modified(&mut self) {
        self.modified = false;
    }
}

#[cfg(test)]
mod tests {
    use super::MetaData;

    #[test]
    fn tracks_changes() {
        let mut md = MetaData::new();
        assert!(!md.is_modified());
        md.set("UniqueID", "abc");
        assert!(md.is_modified());
        assert_eq!(md.unique_id(), Some("abc"));
        md.clear_modified();
        md.set("UniqueID", "abc");
        assert!(!md.is_modified());
        let _ = md.remove("missing");
        assert!(!md.is_modified());
        let _ = md.remove("UniqueID");
        assert!(md.is_modified());
    }
}
