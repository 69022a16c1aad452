//! Output contract handed to the step handler.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Values of every declared property after a step, in declaration order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    values: IndexMap<String, f64>,
}

impl Snapshot {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            values: IndexMap::with_capacity(capacity),
        }
    }

    #[inline]
    pub(crate) fn insert(&mut self, name: &str, value: f64) {
        self.values.insert(name.to_owned(), value);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_inner(self) -> IndexMap<String, f64> {
        self.values
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for Snapshot {
    fn from_iter<T: IntoIterator<Item = (K, f64)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
