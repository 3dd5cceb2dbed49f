//! Boundary layers from TIGER/Line-style shapefiles.

use std::{path::Path, sync::Arc};

use anyhow::{Context, Result};
use geo::{Coord, LineString, MultiPolygon, Polygon};
use serde_json::Value;
use shapefile::{
    dbase::FieldValue,
    PolygonRing, Shape,
};
use tracing::debug;

use crate::{
    error::ReconcileError,
    map::{GeoUnit, Metrics, UnitId, UnitLayer, Vintage},
};

/// Convert shapefile::Polygon to geo::MultiPolygon<f64>.
/// Shapefiles store each outer ring followed by its holes.
fn shp_to_geo(p: &shapefile::Polygon) -> MultiPolygon<f64> {
    fn ring_to_line(points: &[shapefile::Point]) -> LineString<f64> {
        let mut coords = points.iter().map(|pt| Coord { x: pt.x, y: pt.y }).collect::<Vec<_>>();
        if let (Some(&first), Some(&last)) = (coords.first(), coords.last()) {
            if first != last { coords.push(first) }
        }
        LineString(coords)
    }

    let mut polys = Vec::new();
    let mut current: Option<(LineString<f64>, Vec<LineString<f64>>)> = None;
    for ring in p.rings() {
        match ring {
            PolygonRing::Outer(points) => {
                if let Some((exterior, holes)) = current.take() {
                    polys.push(Polygon::new(exterior, holes));
                }
                current = Some((ring_to_line(points), Vec::new()));
            }
            PolygonRing::Inner(points) => match current.as_mut() {
                Some((_, holes)) => holes.push(ring_to_line(points)),
                None => current = Some((ring_to_line(points), Vec::new())),
            },
        }
    }
    if let Some((exterior, holes)) = current {
        polys.push(Polygon::new(exterior, holes));
    }

    MultiPolygon(polys)
}

type Fields = [(String, FieldValue)];

/// Text of an id-like field; numeric DBF fields are rendered without decimals.
fn id_text(value: &FieldValue) -> Option<String> {
    match value {
        FieldValue::Character(Some(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        FieldValue::Numeric(Some(n)) => Some(format!("{n:.0}")),
        FieldValue::Integer(i) => Some(i.to_string()),
        _ => None,
    }
}

fn field_text(fields: &Fields, field: &str) -> Option<String> {
    fields.iter().find(|(name, _)| name == field).and_then(|(_, value)| id_text(value))
}

/// Numeric value of a field, `Some(None)` for an empty numeric cell, `None` for non-numeric fields.
fn numeric(value: &FieldValue) -> Option<Option<f64>> {
    match value {
        FieldValue::Numeric(n) => Some(*n),
        FieldValue::Double(d) | FieldValue::Currency(d) => Some(Some(*d)),
        FieldValue::Float(f) => Some(f.map(f64::from)),
        FieldValue::Integer(i) => Some(Some(f64::from(*i))),
        _ => None,
    }
}

/// DBF column names in file order.
fn field_order(path: &Path) -> Result<Vec<String>> {
    let dbf_path = path.with_extension("dbf");
    let dbf = shapefile::dbase::Reader::from_path(&dbf_path)
        .with_context(|| format!("[io::shp] Failed to open attribute table: {}", dbf_path.display()))?;
    Ok(dbf.fields().iter().map(|field| field.name().to_string()).collect())
}

/// Name of the unit id field: the first column (in file order) whose name contains "geoid".
fn geoid_field(order: &[String]) -> Option<&str> {
    order.iter()
        .map(String::as_str)
        .find(|name| name.to_ascii_lowercase().contains("geoid"))
}

/// Unit id of a record, falling back to the state/county/tract code fields.
fn record_unit_id(fields: &Fields, id_field: Option<&str>, id_width: Option<usize>) -> Result<UnitId> {
    if let Some(id) = id_field.and_then(|field| field_text(fields, field)) {
        return Ok(UnitId::normalized(&id, id_width));
    }
    match (field_text(fields, "STATEFP"), field_text(fields, "COUNTYFP"), field_text(fields, "TRACTCE")) {
        (Some(state), Some(county), Some(tract)) => Ok(UnitId::from_parts(&state, &county, &tract)),
        _ => Err(ReconcileError::schema("shapefile", id_field.unwrap_or("GEOID")).into()),
    }
}

/// Read a boundary layer from a .shp file (with its .dbf alongside).
///
/// Numeric fields become metrics; text and logical fields become attributes.
pub fn read_boundaries_shapefile(path: &Path, vintage: Vintage, id_width: Option<usize>) -> Result<UnitLayer> {
    let order = field_order(path)?;
    let id_field = geoid_field(&order);
    let position = |name: &str| order.iter().position(|n| n == name).unwrap_or(usize::MAX);

    let mut reader = shapefile::Reader::from_path(path)
        .with_context(|| format!("[io::shp] Failed to open shapefile: {}", path.display()))?;

    let mut metric_columns: Vec<Arc<str>> = Vec::new();
    let mut units = Vec::new();
    for result in reader.iter_shapes_and_records() {
        let (shape, record) = result.context("[io::shp] Error reading shape+record")?;
        let mut fields = record.into_iter().collect::<Vec<_>>();
        fields.sort_by_key(|(name, _)| position(name));
        let unit_id = record_unit_id(&fields, id_field, id_width)?;

        let geometry = match shape {
            Shape::Polygon(polygon) => shp_to_geo(&polygon),
            other => return Err(ReconcileError::geometry(
                format!("io::shp unit {unit_id}"), format!("expected Polygon, found {:?}", other.shapetype())).into()),
        };

        let mut metrics = Metrics::new();
        let mut unit = GeoUnit::new(unit_id, vintage, geometry);
        for (field, value) in fields {
            if Some(field.as_str()) == id_field { continue }
            match value {
                FieldValue::Character(s) => {
                    unit.attributes.insert(field, s.map_or(Value::Null, |s| Value::String(s.trim().to_string())));
                }
                FieldValue::Logical(b) => {
                    unit.attributes.insert(field, b.map_or(Value::Null, Value::Bool));
                }
                value => if let Some(number) = numeric(&value) {
                    let name: Arc<str> = Arc::from(field.as_str());
                    if !metric_columns.contains(&name) {
                        metric_columns.push(name.clone());
                    }
                    metrics.set(&name, number);
                },
            }
        }
        units.push(unit.with_metrics(metrics));
    }

    debug!("[io::shp] read {} units from {}", units.len(), path.display());
    Ok(UnitLayer::new(vintage, units)?.with_metric_columns(metric_columns))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shapefile::Point;

    #[test]
    fn polygon_rings_group_holes_with_their_exterior() {
        let outer = vec![Point::new(0.0, 0.0), Point::new(0.0, 4.0), Point::new(4.0, 4.0), Point::new(4.0, 0.0), Point::new(0.0, 0.0)];
        let hole = vec![Point::new(1.0, 1.0), Point::new(2.0, 1.0), Point::new(2.0, 2.0), Point::new(1.0, 2.0), Point::new(1.0, 1.0)];
        let polygon = shapefile::Polygon::with_rings(vec![PolygonRing::Outer(outer), PolygonRing::Inner(hole)]);

        let mp = shp_to_geo(&polygon);
        assert_eq!(mp.0.len(), 1);
        assert_eq!(mp.0[0].interiors().len(), 1);
    }

    fn text(name: &str, value: &str) -> (String, FieldValue) {
        (name.to_string(), FieldValue::Character(Some(value.to_string())))
    }

    #[test]
    fn unit_id_from_geoid_field_or_parts() {
        let fields = vec![text("GEOID20", "24001000100"), text("NAMELSAD20", "Census Tract 1")];
        assert_eq!(record_unit_id(&fields, Some("GEOID20"), Some(11)).unwrap().id(), "24001000100");

        let parts = vec![text("COUNTYFP", "001"), text("STATEFP", "1"), text("TRACTCE", "020100")];
        assert_eq!(record_unit_id(&parts, None, None).unwrap().id(), "01001020100");

        let err = record_unit_id(&[text("NAME", "x")], None, None).unwrap_err();
        assert!(matches!(err.downcast_ref::<ReconcileError>(), Some(ReconcileError::SchemaMismatch { .. })));
    }

    #[test]
    fn geoid_field_follows_file_order() {
        let order = ["STATEFP20", "GEOID20", "AGEOID10"].map(String::from);
        assert_eq!(geoid_field(&order), Some("GEOID20"));
        assert_eq!(geoid_field(&["STATEFP".to_string()]), None);
    }

    #[test]
    fn numeric_ids_keep_their_digits() {
        let fields = vec![("GEOID".to_string(), FieldValue::Numeric(Some(1001020100.0)))];
        assert_eq!(record_unit_id(&fields, Some("GEOID"), Some(11)).unwrap().id(), "01001020100");
        assert_eq!(numeric(&FieldValue::Numeric(None)), Some(None));
        assert_eq!(numeric(&FieldValue::Character(Some("x".to_string()))), None);
    }
}
