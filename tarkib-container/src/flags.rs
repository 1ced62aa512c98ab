//! Boolean configuration flags.
//!
//! Flags select between conditional implementations. A container
//! captures its flags once, at construction, and never changes them:
//! scopes and composed containers receive a copy, not a live view.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Ordered, by-value map from flag name to boolean.
///
/// Deserializable from any serde format as a plain map:
///
/// ```
/// use tarkib_container::flags::Flags;
///
/// let mut flags = Flags::new();
/// flags.set("Verbose", true);
/// assert_eq!(flags.get("Verbose"), Some(true));
/// assert_eq!(flags.get("Unknown"), None);
/// assert!(!flags.is_enabled("Unknown"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Flags {
    values: BTreeMap<String, bool>,
}

impl Flags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares each name with `false` unless it already has a value.
    pub fn declare<'a>(&mut self, names: impl IntoIterator<Item = &'a str>) {
        for name in names {
            self.values.entry(name.to_string()).or_insert(false);
        }
    }

    pub fn set(&mut self, name: impl Into<String>, value: bool) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<bool> {
        self.values.get(name).copied()
    }

    /// Value of `name`, treating undeclared flags as `false`.
    pub fn is_enabled(&self, name: &str) -> bool {
        self.get(name).unwrap_or(false)
    }

    /// Overwrites local values with every entry of `other`.
    pub fn override_with(&mut self, other: &Flags) {
        for (name, value) in &other.values {
            self.values.insert(name.clone(), *value);
        }
    }

    /// Snapshot as `(name, value)` pairs in name order.
    pub fn to_pairs(&self) -> Vec<(String, bool)> {
        self.values
            .iter()
            .map(|(name, value)| (name.clone(), *value))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.values.iter().map(|(name, value)| (name.as_str(), *value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, bool)> for Flags {
    fn from_iter<I: IntoIterator<Item = (S, bool)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(name, value)| (name.into(), value)).collect(),
        }
    }
}
