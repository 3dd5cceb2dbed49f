use thiserror::Error;

/// Contract violations between the reconciliation components and their collaborators.
///
/// Data-quality problems (non-numeric weights, periods or metric cells) and unresolvable
/// references (no crosswalk entry, no parent row, no enclosing region) are not errors:
/// they surface as `None` values and aggregate counts.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// An expected key column is absent from an input table.
    #[error("[{component}] missing key column {column:?}")]
    SchemaMismatch { component: &'static str, column: String },

    /// A named input source is missing or unreadable.
    #[error("source {name:?} unavailable: {reason}")]
    SourceUnavailable { name: String, reason: String },

    /// A unit id occurs more than once within one vintage.
    #[error("duplicate unit id {unit_id} in {vintage} vintage")]
    DuplicateUnit { vintage: &'static str, unit_id: String },

    /// Point and region coordinate frames disagree.
    #[error("coordinate frames differ: regions EPSG:{regions}, points EPSG:{points}")]
    CrsMismatch { regions: u32, points: u32 },

    /// A geometry could not be decoded.
    #[error("[{context}] invalid geometry: {reason}")]
    InvalidGeometry { context: String, reason: String },

    /// A configuration value is unusable.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ReconcileError {
    pub(crate) fn schema(component: &'static str, column: &str) -> Self {
        Self::SchemaMismatch { component, column: column.to_string() }
    }

    pub(crate) fn geometry(context: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidGeometry { context: context.into(), reason: reason.into() }
    }
}
