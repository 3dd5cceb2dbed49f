use std::collections::BTreeMap;

use geo::MultiPolygon;
use serde_json::Value;

use super::{Metrics, UnitId, Vintage};

/// An administrative areal unit of one vintage.
#[derive(Debug, Clone)]
pub struct GeoUnit {
    pub unit_id: UnitId,
    pub vintage: Vintage,
    pub geometry: MultiPolygon<f64>,
    pub metrics: Metrics,
    pub attributes: BTreeMap<String, Value>, // Non-numeric properties (names, region labels)
}

impl GeoUnit {
    pub fn new(unit_id: UnitId, vintage: Vintage, geometry: MultiPolygon<f64>) -> Self {
        Self { unit_id, vintage, geometry, metrics: Metrics::new(), attributes: BTreeMap::new() }
    }

    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_attribute(mut self, name: &str, value: Value) -> Self {
        self.attributes.insert(name.to_string(), value);
        self
    }

    /// The unit's label in `column`, if present and non-empty.
    /// Numbers are rendered as text so numeric codes can serve as labels.
    pub fn label(&self, column: &str) -> Option<String> {
        match self.attributes.get(column)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}
