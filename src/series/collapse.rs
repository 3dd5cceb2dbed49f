use std::{collections::BTreeMap, sync::Arc};

use tracing::debug;

use crate::{common::first_max_per_key, map::{Metrics, UnitId}};
use super::{MetricRecord, MetricSeries};

/// The latest record kept for one unit.
#[derive(Debug, Clone, PartialEq)]
pub struct CollapsedRow {
    pub period: Option<f64>,
    pub region: Option<String>,
    pub metrics: Metrics,
    pub attributes: BTreeMap<String, String>,
}

/// One metric row per OLD-vintage unit, taken from the latest period.
#[derive(Debug, Clone, Default)]
pub struct CollapsedMetrics {
    columns: Vec<Arc<str>>,
    attribute_columns: Vec<String>,
    rows: BTreeMap<UnitId, CollapsedRow>,
}

impl CollapsedMetrics {
    /// Reduce `series` to its latest record per unit, keeping only records whose region
    /// equals `region` when a filter is given.
    ///
    /// Records with a missing period never outrank a record with a period; among records
    /// with the same period (or none at all) the first in input order wins.
    pub fn collapse(series: &MetricSeries, region: Option<&str>) -> Self {
        let records = series.records().iter()
            .filter(|record| region.is_none_or(|r| record.region.as_deref() == Some(r)))
            .collect::<Vec<&MetricRecord>>();

        let rows = first_max_per_key(
            records.len(),
            |i| records[i].unit_id.clone(),
            |i| records[i].period,
        )
        .into_iter()
        .map(|(unit_id, i)| {
            let record = records[i];
            (unit_id, CollapsedRow {
                period: record.period,
                region: record.region.clone(),
                metrics: record.metrics.clone(),
                attributes: record.attributes.clone(),
            })
        })
        .collect::<BTreeMap<_, _>>();

        debug!("[series::collapse] {} of {} records in scope, {} units",
            records.len(), series.len(), rows.len());

        Self {
            columns: series.columns().to_vec(),
            attribute_columns: series.attribute_columns().to_vec(),
            rows,
        }
    }

    /// Metric names eligible for imputation.
    #[inline] pub fn columns(&self) -> &[Arc<str>] { &self.columns }

    /// Text columns kept beside the metrics.
    #[inline] pub fn attribute_columns(&self) -> &[String] { &self.attribute_columns }

    #[inline] pub fn get(&self, unit_id: &UnitId) -> Option<&CollapsedRow> { self.rows.get(unit_id) }

    #[inline] pub fn contains(&self, unit_id: &UnitId) -> bool { self.rows.contains_key(unit_id) }

    #[inline] pub fn len(&self) -> usize { self.rows.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.rows.is_empty() }

    /// Iterate rows in ascending unit id order.
    pub fn iter(&self) -> impl Iterator<Item = (&UnitId, &CollapsedRow)> { self.rows.iter() }
}
