//! Candidate value sets
//!
//! Duplicates collapse by `FilterValue::dedup_key`; the first occurrence wins
//! and keeps its original spelling.

use std::collections::HashSet;

use super::scalar::FilterValue;

/// A deduplicated candidate value set
#[derive(Debug, Clone)]
pub struct ValueSet<V: FilterValue> {
    values: Vec<V>,
}

impl<V: FilterValue> ValueSet<V> {
    /// Builds a set from any collection of candidates
    pub fn new(values: impl IntoIterator<Item = V>) -> Self {
        let mut seen = HashSet::new();
        let values = values
            .into_iter()
            .filter(|v| seen.insert(v.dedup_key()))
            .collect();
        Self { values }
    }

    /// Builds a set from nullable candidates, dropping nulls
    pub fn from_nullable(values: impl IntoIterator<Item = Option<V>>) -> Self {
        Self::new(values.into_iter().flatten())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &V> {
        self.values.iter()
    }

    pub fn contains(&self, value: &V) -> bool {
        let key = value.dedup_key();
        self.values.iter().any(|v| v.dedup_key() == key)
    }

    pub fn into_vec(self) -> Vec<V> {
        self.values
    }
}

impl<V: FilterValue> FromIterator<V> for ValueSet<V> {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl<V: FilterValue> IntoIterator for ValueSet<V> {
    type Item = V;
    type IntoIter = std::vec::IntoIter<V>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}
