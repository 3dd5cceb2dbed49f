use std::sync::Arc;

use anyhow::Result;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{
    crosswalk::CrosswalkMapping,
    error::ReconcileError,
    map::{GeoUnit, UnitLayer},
    series::{CollapsedMetrics, CollapsedRow},
};
use super::{report::Outcome, ImputeReport};

/// How much of a unit is overwritten when it is imputed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImputeMode {
    /// Units missing the primary metric take the parent's whole eligible metric vector;
    /// units that have it are untouched, even if other metrics are absent.
    #[default]
    AllOrNothing,
    /// Every absent eligible metric is filled on its own from the parent.
    PerField,
}

/// Fills missing metrics on NEW-vintage units from the collapsed metrics of the
/// OLD unit each one resolves to through the crosswalk.
#[derive(Debug, Clone)]
pub struct Imputer<'a> {
    crosswalk: &'a CrosswalkMapping,
    collapsed: &'a CollapsedMetrics,
    primary: Arc<str>,
    mode: ImputeMode,
}

/// A unit paired with the collapsed row of the OLD unit it resolves to.
/// The pairing is a join key, not domain data, and is dropped before output.
struct Linked<'a> {
    unit: GeoUnit,
    parent: Option<&'a CollapsedRow>,
}

impl<'a> Imputer<'a> {
    pub fn new(crosswalk: &'a CrosswalkMapping, collapsed: &'a CollapsedMetrics, primary: &str) -> Self {
        Self { crosswalk, collapsed, primary: Arc::from(primary), mode: ImputeMode::default() }
    }

    pub fn with_mode(mut self, mode: ImputeMode) -> Self {
        self.mode = mode;
        self
    }

    #[inline] pub fn mode(&self) -> ImputeMode { self.mode }

    /// Metric names that may be copied into `layer`: collapsed columns present in its schema.
    pub fn eligible_columns(&self, layer: &UnitLayer) -> Vec<Arc<str>> {
        self.collapsed.columns().iter()
            .filter(|column| layer.has_metric_column(column))
            .cloned()
            .collect()
    }

    /// Text columns copied alongside the metrics: collapsed text columns the layer's units carry.
    pub fn eligible_text_columns(&self, layer: &UnitLayer) -> Vec<String> {
        let present = layer.attribute_columns();
        self.collapsed.attribute_columns().iter()
            .filter(|column| present.contains(*column))
            .cloned()
            .collect()
    }

    /// Produce a copy of `layer` with missing metrics filled where a parent row exists.
    ///
    /// Fails with a schema mismatch when the primary metric is not a column of `layer`.
    pub fn impute(&self, layer: &UnitLayer) -> Result<(UnitLayer, ImputeReport)> {
        if !layer.has_metric_column(&self.primary) {
            return Err(ReconcileError::schema("impute", &self.primary).into());
        }
        if !self.collapsed.columns().contains(&self.primary) {
            warn!("[impute] primary metric {:?} is not a collapsed column; filled units stay without it", self.primary);
        }

        let eligible = self.eligible_columns(layer);
        let text = self.eligible_text_columns(layer);
        debug!("[impute] {} eligible metric columns, {} text columns, mode {:?}",
            eligible.len(), text.len(), self.mode);

        let (units, outcomes): (Vec<GeoUnit>, Vec<Outcome>) = layer.units().iter().cloned()
            .map(|unit| self.fill(self.link(unit), &eligible, &text))
            .unzip();

        let filled = layer.with_units(units)?;

        let mut report = ImputeReport::default();
        outcomes.into_iter().for_each(|outcome| report.record(outcome));
        report.missing_before = layer.missing_count(&self.primary);
        report.missing_after = filled.missing_count(&self.primary);

        info!("[impute] filled {} units, {} still missing ({:.1}% coverage)",
            report.filled, report.still_missing, report.coverage());

        Ok((filled, report))
    }

    fn link(&self, unit: GeoUnit) -> Linked<'a> {
        let collapsed: &'a CollapsedMetrics = self.collapsed;
        let parent = self.crosswalk.get(&unit.unit_id)
            .and_then(|old_id| collapsed.get(old_id));
        Linked { unit, parent }
    }

    fn fill(&self, linked: Linked<'_>, eligible: &[Arc<str>], text: &[String]) -> (GeoUnit, Outcome) {
        let Linked { mut unit, parent } = linked;
        let parent_text = |row: &CollapsedRow, column: &str| row.attributes.get(column).cloned().map(Value::String);

        match self.mode {
            ImputeMode::AllOrNothing => {
                if unit.metrics.contains(&self.primary) { return (unit, Outcome::AlreadyPresent) }
                let Some(row) = parent else { return (unit, Outcome::StillMissing) };
                for column in eligible {
                    unit.metrics.set(column, row.metrics.get(column));
                }
                for column in text {
                    unit.attributes.insert(column.clone(), parent_text(row, column).unwrap_or(Value::Null));
                }
                (unit, Outcome::Filled)
            }
            ImputeMode::PerField => {
                let gaps = eligible.iter()
                    .filter(|column| !unit.metrics.contains(column))
                    .collect::<Vec<_>>();
                if gaps.is_empty() { return (unit, Outcome::AlreadyPresent) }
                let Some(row) = parent else { return (unit, Outcome::StillMissing) };

                for column in text {
                    if unit.label(column).is_none() {
                        if let Some(value) = parent_text(row, column) {
                            unit.attributes.insert(column.clone(), value);
                        }
                    }
                }

                let mut any = false;
                for column in gaps {
                    if let Some(value) = row.metrics.get(column) {
                        unit.metrics.set(column, Some(value));
                        any = true;
                    }
                }
                (unit, if any { Outcome::Filled } else { Outcome::StillMissing })
            }
        }
    }
}
