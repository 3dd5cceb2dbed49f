use std::collections::BTreeMap;

use tracing::debug;

use crate::{common::first_max_per_key, map::UnitId};
use super::RelationshipEntry;

/// Functional child→parent mapping from NEW unit ids to their best OLD unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrosswalkMapping {
    parents: BTreeMap<UnitId, UnitId>,
}

impl CrosswalkMapping {
    /// Resolve every NEW id in `entries` (optionally restricted to ids starting with
    /// `jurisdiction`) to the OLD id with the largest overlap weight.
    ///
    /// Ties go to the entry encountered first in input order. Entries without a usable
    /// weight rank below every weighted entry, so they are chosen only when no entry for
    /// that NEW id carries a weight. NEW ids absent from the table have no mapping.
    pub fn resolve(entries: &[RelationshipEntry], jurisdiction: Option<&str>) -> Self {
        let filtered = entries.iter()
            .filter(|entry| jurisdiction.is_none_or(|prefix| entry.new_id.has_prefix(prefix)))
            .collect::<Vec<_>>();

        let parents = first_max_per_key(
            filtered.len(),
            |i| filtered[i].new_id.clone(),
            |i| filtered[i].overlap_weight,
        )
        .into_iter()
        .map(|(new_id, i)| (new_id, filtered[i].old_id.clone()))
        .collect::<BTreeMap<_, _>>();

        debug!("[crosswalk::resolve] {} of {} entries in scope, {} new units mapped",
            filtered.len(), entries.len(), parents.len());

        Self { parents }
    }

    /// The OLD unit chosen for `new_id`, if the table mentions it.
    #[inline] pub fn get(&self, new_id: &UnitId) -> Option<&UnitId> { self.parents.get(new_id) }

    #[inline] pub fn len(&self) -> usize { self.parents.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.parents.is_empty() }

    /// Iterate (new_id, old_id) pairs in ascending NEW id order.
    pub fn iter(&self) -> impl Iterator<Item = (&UnitId, &UnitId)> { self.parents.iter() }
}
