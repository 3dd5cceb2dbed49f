use std::fmt;

/// Per-unit result of one imputation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    AlreadyPresent, // Nothing to fill
    Filled,         // Values copied from the resolved parent
    StillMissing,   // No parent, or the parent has no collapsed row
}

/// Coverage counters for one imputation pass.
///
/// `already_present + filled + still_missing == total` always holds. `missing_after`
/// counts units still lacking the primary metric afterwards, which includes filled
/// units whose parent lacked it too.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImputeReport {
    pub total: usize,
    pub already_present: usize,
    pub filled: usize,
    pub still_missing: usize,
    pub missing_before: usize,
    pub missing_after: usize,
}

impl ImputeReport {
    pub(crate) fn record(&mut self, outcome: Outcome) {
        self.total += 1;
        match outcome {
            Outcome::AlreadyPresent => self.already_present += 1,
            Outcome::Filled => self.filled += 1,
            Outcome::StillMissing => self.still_missing += 1,
        }
    }

    /// Percentage of units with a usable primary metric after imputation.
    pub fn coverage(&self) -> f64 {
        if self.total == 0 { return 100.0; }
        100.0 * (self.total - self.missing_after) as f64 / self.total as f64
    }
}

impl fmt::Display for ImputeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total units: {}", self.total)?;
        writeln!(f, "Missing before crosswalk: {}", self.missing_before)?;
        writeln!(f, "Units filled with parent data: {}", self.filled)?;
        writeln!(f, "Remaining missing (water-only, etc.): {}", self.missing_after)?;
        write!(f, "Data coverage: {:.1}%", self.coverage())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_partition_the_units() {
        let mut report = ImputeReport::default();
        for outcome in [Outcome::AlreadyPresent, Outcome::Filled, Outcome::StillMissing, Outcome::Filled] {
            report.record(outcome);
        }
        assert_eq!(report.total, 4);
        assert_eq!(report.already_present + report.filled + report.still_missing, report.total);
    }

    #[test]
    fn coverage_of_empty_layer_is_full() {
        assert_eq!(ImputeReport::default().coverage(), 100.0);
    }

    #[test]
    fn summary_mentions_coverage() {
        let report = ImputeReport { total: 4, missing_after: 1, ..Default::default() };
        assert!(report.to_string().ends_with("Data coverage: 75.0%"));
    }
}
