use crate::{common::coerce_numeric, map::UnitId};

/// One row of the many-to-many overlap table between NEW and OLD units.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipEntry {
    pub new_id: UnitId,
    pub old_id: UnitId,
    pub overlap_weight: Option<f64>, // None when the source cell is blank or non-numeric
}

impl RelationshipEntry {
    pub fn new(new_id: UnitId, old_id: UnitId, overlap_weight: Option<f64>) -> Self {
        Self { new_id, old_id, overlap_weight }
    }

    /// Build an entry from raw table cells, coercing the weight to a number.
    pub fn from_cells(new_id: &str, old_id: &str, weight: Option<&str>, id_width: Option<usize>) -> Self {
        Self::new(
            UnitId::normalized(new_id, id_width),
            UnitId::normalized(old_id, id_width),
            coerce_numeric(weight),
        )
    }
}
