use std::{fmt, sync::Arc};

/// Stable key for an areal unit within one vintage.
/// Keep the original GEOID text (with leading zeros) but avoid repeated owned Strings.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UnitId(Arc<str>); // e.g., "24001000100" for a tract

impl UnitId {
    pub fn new(id: &str) -> Self { Self(Arc::from(id)) }

    /// Normalize an id read from a table cell.
    /// Trims whitespace, and left-pads all-digit ids shorter than `width` with zeros
    /// (numeric parsing drops the leading zero of e.g. Alabama FIPS codes).
    pub fn normalized(raw: &str, width: Option<usize>) -> Self {
        let raw = raw.trim();
        match width {
            Some(width) if raw.len() < width && !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) =>
                Self::new(&format!("{:0>width$}", raw, width = width)),
            _ => Self::new(raw),
        }
    }

    /// Build a tract GEOID from its state (2), county (3) and tract (6) components.
    pub fn from_parts(state: &str, county: &str, tract: &str) -> Self {
        Self::new(&format!("{:0>2}{:0>3}{:0>6}", state.trim(), county.trim(), tract.trim()))
    }

    #[inline] pub fn id(&self) -> &str { &self.0 }

    /// True if this id lies inside the jurisdiction identified by `prefix` (e.g. a state code).
    #[inline] pub fn has_prefix(&self, prefix: &str) -> bool { self.0.starts_with(prefix) }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl From<&str> for UnitId {
    fn from(id: &str) -> Self { Self::new(id) }
}
