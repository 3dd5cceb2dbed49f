use std::{collections::BTreeMap, sync::Arc};

use crate::map::{Metrics, UnitId};

/// One row of a multi-period metric table, keyed by (OLD-vintage unit id, period).
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRecord {
    pub unit_id: UnitId,
    pub period: Option<f64>,     // None when the source cell is blank or non-numeric
    pub region: Option<String>,  // Label used for filtering (e.g. state name)
    pub metrics: Metrics,
    pub attributes: BTreeMap<String, String>, // Text columns carried along (e.g. county name)
}

impl MetricRecord {
    pub fn new(unit_id: UnitId, period: Option<f64>, region: Option<String>, metrics: Metrics) -> Self {
        Self { unit_id, period, region, metrics, attributes: BTreeMap::new() }
    }

    pub fn with_attributes(mut self, attributes: BTreeMap<String, String>) -> Self {
        self.attributes = attributes;
        self
    }
}

/// A metric table: its metric column names (identity, period and region columns excluded),
/// the text columns carried beside them, and its rows in input order.
#[derive(Debug, Clone, Default)]
pub struct MetricSeries {
    columns: Vec<Arc<str>>,
    attribute_columns: Vec<String>,
    records: Vec<MetricRecord>,
}

impl MetricSeries {
    pub fn new(columns: Vec<Arc<str>>, records: Vec<MetricRecord>) -> Self {
        Self { columns, attribute_columns: Vec::new(), records }
    }

    pub fn with_attribute_columns(mut self, columns: Vec<String>) -> Self {
        self.attribute_columns = columns;
        self
    }

    #[inline] pub fn columns(&self) -> &[Arc<str>] { &self.columns }

    #[inline] pub fn attribute_columns(&self) -> &[String] { &self.attribute_columns }

    #[inline] pub fn records(&self) -> &[MetricRecord] { &self.records }

    #[inline] pub fn len(&self) -> usize { self.records.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.records.is_empty() }
}
