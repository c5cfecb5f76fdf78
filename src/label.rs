//! Label tables, associating integer keys with named colors.

use rgb::RGBA;
use std::collections::BTreeMap;

/// A named color of a label table.
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    name: String,
    color: RGBA<f32>,
}

impl Label {
    /// Create a label. Color components are in `[0, 1]`.
    pub fn new<S: Into<String>>(name: S, color: RGBA<f32>) -> Self {
        Label {
            name: name.into(),
            color,
        }
    }

    /// Name of the label.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Color of the label.
    pub fn color(&self) -> RGBA<f32> {
        self.color
    }
}

/// Mapping from integer keys to labels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelTable {
    labels: BTreeMap<i32, Label>,
    modified: bool,
}

impl LabelTable {
    /// Create an empty table.
    pub fn new() -> Self {
        LabelTable::default()
    }

    /// Insert or replace the label of `key`.
    pub fn insert(&mut self, key: i32, label: Label) {
        let _ = self.labels.insert(key, label);
        self.modified = true;
    }

    /// Remove the label of `key`.
    pub fn remove(&mut self, key: i32) -> Option<Label> {
        let old = self.labels.remove(&key);
        if old.is_some() {
            self.modified = true;
        }
        old
    }

    /// Find the label of `key`.
    pub fn label(&self, key: i32) -> Option<&Label> {
        self.labels.get(&key)
    }

    /// All keys and names, ordered by key.
    pub fn keys_and_names(&self) -> impl Iterator<Item = (i32, &str)> {
        self.labels.iter().map(|(k, l)| (*k, l.name()))
    }

    /// Number of labels.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether the table has no labels.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Whether the table changed since the last `clear_modified`.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Forget about previous changes.
    pub fn clear_modified(&mut self) {
        self.modified = false;
    }

    /// A listing of the table, one label per line, each line starting with `indent`.
    pub fn to_formatted_string(&self, indent: &str) -> String {
        let mut out = String::new();
        for (key, label) in &self.labels {
            let c = label.color;
            out.push_str(&format!(
                "{}{} {} ({}, {}, {}, {})\n",
                indent, key, label.name, c.r, c.g, c.b, c.a
            ));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_and_listing() {
        let mut table = LabelTable::new();
        table.insert(1, Label::new("V1", RGBA::new(1., 0., 0., 1.)));
        table.insert(0, Label::new("???", RGBA::new(0., 0., 0., 0.)));
        assert_eq!(table.label(1).map(Label::name), Some("V1"));
        assert!(table.label(42).is_none());
        let keys: Vec<_> = table.keys_and_names().collect();
        assert_eq!(keys, vec![(0, "???"), (1, "V1")]);
        assert_eq!(table.to_formatted_string("  "), "  0 ??? (0, 0, 0, 0)\n  1 V1 (1, 0, 0, 1)\n");
    }
}
