use std::{collections::BTreeMap, sync::Arc};

/// Numeric metrics attached to a unit, keyed by metric name.
/// An absent key means the value is missing (null in the source table).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metrics(BTreeMap<Arc<str>, f64>);

impl Metrics {
    pub fn new() -> Self { Self::default() }

    #[inline] pub fn get(&self, name: &str) -> Option<f64> { self.0.get(name).copied() }

    #[inline] pub fn contains(&self, name: &str) -> bool { self.0.contains_key(name) }

    #[inline] pub fn len(&self) -> usize { self.0.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.0.is_empty() }

    /// Set `name` to `value`, or clear it when `value` is `None`.
    pub fn set(&mut self, name: &Arc<str>, value: Option<f64>) {
        match value {
            Some(value) => { self.0.insert(name.clone(), value); }
            None => { self.0.remove(name); }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Arc<str>, f64)> {
        self.0.iter().map(|(name, &value)| (name, value))
    }
}

impl FromIterator<(Arc<str>, f64)> for Metrics {
    fn from_iter<I: IntoIterator<Item = (Arc<str>, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
