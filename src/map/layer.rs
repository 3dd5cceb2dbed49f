use std::{collections::HashMap, sync::Arc};

use anyhow::{ensure, Result};
use serde_json::Value;
use tracing::debug;

use crate::{error::ReconcileError, series::CollapsedMetrics};
use super::{GeoUnit, UnitId, Vintage};

/// One vintage's set of areal units, indexed by unit id.
///
/// `metric_columns` is the layer's metric schema in first-seen order. It can name
/// columns no unit currently has a value for, so writers can emit them as nulls.
#[derive(Debug, Clone)]
pub struct UnitLayer {
    vintage: Vintage,
    units: Vec<GeoUnit>,
    index: HashMap<UnitId, usize>, // Map between unit ids and positions in `units`.
    metric_columns: Vec<Arc<str>>,
    epsg: Option<u32>,
}

impl UnitLayer {
    /// Build a layer, rejecting repeated unit ids and units from a different vintage.
    pub fn new(vintage: Vintage, units: Vec<GeoUnit>) -> Result<Self> {
        let mut index = HashMap::with_capacity(units.len());
        for (i, unit) in units.iter().enumerate() {
            ensure!(unit.vintage == vintage,
                "[UnitLayer::new] unit {} belongs to the {} vintage, expected {}",
                unit.unit_id, unit.vintage.to_str(), vintage.to_str());
            if index.insert(unit.unit_id.clone(), i).is_some() {
                return Err(ReconcileError::DuplicateUnit {
                    vintage: vintage.to_str(),
                    unit_id: unit.unit_id.to_string(),
                }.into());
            }
        }

        let mut layer = Self { vintage, units, index, metric_columns: Vec::new(), epsg: None };
        let found = layer.units.iter()
            .flat_map(|unit| unit.metrics.iter().map(|(name, _)| name.clone()))
            .collect::<Vec<_>>();
        layer.extend_metric_columns(found);
        Ok(layer)
    }

    /// Declare metric columns up front (e.g. columns that are entirely null in the source).
    pub fn with_metric_columns(mut self, columns: impl IntoIterator<Item = Arc<str>>) -> Self {
        let existing = std::mem::take(&mut self.metric_columns);
        self.extend_metric_columns(columns);
        self.extend_metric_columns(existing);
        self
    }

    pub fn with_epsg(mut self, epsg: Option<u32>) -> Self {
        self.epsg = epsg;
        self
    }

    #[inline] pub fn vintage(&self) -> Vintage { self.vintage }

    #[inline] pub fn len(&self) -> usize { self.units.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.units.is_empty() }

    #[inline] pub fn units(&self) -> &[GeoUnit] { &self.units }

    #[inline] pub fn metric_columns(&self) -> &[Arc<str>] { &self.metric_columns }

    #[inline] pub fn epsg(&self) -> Option<u32> { self.epsg }

    /// Look up a unit by id.
    pub fn get(&self, unit_id: &UnitId) -> Option<&GeoUnit> {
        self.index.get(unit_id).map(|&i| &self.units[i])
    }

    pub fn has_metric_column(&self, name: &str) -> bool {
        self.metric_columns.iter().any(|c| c.as_ref() == name)
    }

    /// Number of units without a value for `metric`.
    pub fn missing_count(&self, metric: &str) -> usize {
        self.units.iter().filter(|unit| !unit.metrics.contains(metric)).count()
    }

    /// Names of all attribute columns present on any unit, sorted.
    pub fn attribute_columns(&self) -> Vec<String> {
        let mut columns = self.units.iter()
            .flat_map(|unit| unit.attributes.keys().cloned())
            .collect::<Vec<_>>();
        columns.sort();
        columns.dedup();
        columns
    }

    /// Consume the layer, returning its units in order.
    pub fn into_units(self) -> Vec<GeoUnit> { self.units }

    /// Rebuild a layer of the same vintage, schema and frame around a new unit set.
    pub(crate) fn with_units(&self, units: Vec<GeoUnit>) -> Result<Self> {
        Ok(Self::new(self.vintage, units)?
            .with_metric_columns(self.metric_columns.iter().cloned())
            .with_epsg(self.epsg))
    }

    /// Left-join collapsed metrics onto units with an identical id.
    ///
    /// Matched units take the collapsed row's value for every collapsed column
    /// (absent where the row is absent) and its text columns as attributes (null where
    /// blank); unmatched units are untouched. The layer's schema gains the collapsed
    /// columns. Returns the new layer and the match count.
    pub fn attach_metrics(self, collapsed: &CollapsedMetrics) -> Result<(Self, usize)> {
        let columns = collapsed.columns().to_vec();
        let mut matched = 0;
        let units = self.units.iter().cloned()
            .map(|mut unit| {
                if let Some(row) = collapsed.get(&unit.unit_id) {
                    for column in &columns {
                        unit.metrics.set(column, row.metrics.get(column));
                    }
                    for column in collapsed.attribute_columns() {
                        let value = row.attributes.get(column).map_or(Value::Null, |v| Value::String(v.clone()));
                        unit.attributes.insert(column.clone(), value);
                    }
                    matched += 1;
                }
                unit
            })
            .collect();

        let layer = self.with_units(units)?.with_metric_columns(columns);
        debug!("[UnitLayer::attach_metrics] matched {matched} of {} units", layer.len());
        Ok((layer, matched))
    }

    fn extend_metric_columns(&mut self, columns: impl IntoIterator<Item = Arc<str>>) {
        for column in columns {
            if !self.has_metric_column(&column) {
                self.metric_columns.push(column);
            }
        }
    }
}
