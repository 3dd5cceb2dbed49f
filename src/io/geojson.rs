//! GeoJSON FeatureCollections for boundary layers and point collections.

use std::{collections::BTreeMap, fs::File, io::BufReader, path::Path, sync::Arc};

use anyhow::{Context, Result};
use geo::{Coord, Geometry, GeometryCollection, LineString, MultiLineString, MultiPoint, MultiPolygon, Point, Polygon};
use serde_json::{json, Map, Value};

use crate::{
    common::ensure_parent_dir,
    error::ReconcileError,
    join::{PointFeature, PointLayer},
    map::{GeoUnit, Metrics, UnitId, UnitLayer, Vintage},
};

/// Read a JSON document from a file.
pub fn read_json(path: &Path) -> Result<Value> {
    let file = File::open(path)
        .with_context(|| format!("[io::geojson::read] Failed to open GeoJSON file: {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("[io::geojson::read] Failed to parse GeoJSON from {:?}", path))
}

/// Write a JSON document to a file, creating its parent directory.
pub fn write_json(path: &Path, value: &Value) -> Result<()> {
    ensure_parent_dir(path)?;
    let file = File::create(path)
        .with_context(|| format!("[io::geojson::write] Failed to create GeoJSON file: {}", path.display()))?;
    serde_json::to_writer(file, value)
        .with_context(|| format!("[io::geojson::write] Failed to write GeoJSON to {:?}", path))
}

/// EPSG code named by a collection's legacy `crs` member, if any.
/// `urn:ogc:def:crs:OGC:1.3:CRS84` is WGS84 longitude/latitude.
pub fn epsg_from_crs(collection: &Value) -> Option<u32> {
    let name = collection["crs"]["properties"]["name"].as_str()?;
    if name.ends_with("CRS84") { return Some(4326) }
    name.rsplit(':').next()?.parse().ok()
}

fn crs_member(epsg: u32) -> Value {
    json!({ "type": "name", "properties": { "name": format!("urn:ogc:def:crs:EPSG::{epsg}") } })
}

fn features(collection: &Value) -> Result<&Vec<Value>> {
    collection["features"].as_array()
        .ok_or_else(|| ReconcileError::geometry("io::geojson", "document is not a FeatureCollection").into())
}

fn feature_collection(features: Vec<Value>, epsg: Option<u32>) -> Value {
    let mut collection = json!({ "type": "FeatureCollection", "features": features });
    if let Some(epsg) = epsg {
        collection["crs"] = crs_member(epsg);
    }
    collection
}

/// Parse a single `[x, y, ...]` position.
fn parse_coord(value: &Value) -> Result<Coord<f64>> {
    match value.as_array().map(Vec::as_slice) {
        Some([x, y, ..]) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => Ok(Coord { x, y }),
            _ => Err(ReconcileError::geometry("io::geojson", "coordinates must be numbers").into()),
        },
        _ => Err(ReconcileError::geometry("io::geojson", "position needs at least two values").into()),
    }
}

fn parse_array<T>(value: &Value, parse: impl Fn(&Value) -> Result<T>) -> Result<Vec<T>> {
    value.as_array()
        .ok_or_else(|| ReconcileError::geometry("io::geojson", "expected a coordinate array"))?
        .iter().map(parse).collect()
}

fn parse_line(value: &Value) -> Result<LineString<f64>> {
    Ok(LineString(parse_array(value, parse_coord)?))
}

/// Parse a ring list; the first ring is the exterior, the rest are holes.
fn parse_polygon(value: &Value) -> Result<Polygon<f64>> {
    let mut rings = parse_array(value, parse_line)?.into_iter();
    let exterior = rings.next()
        .ok_or_else(|| ReconcileError::geometry("io::geojson", "polygon without an exterior ring"))?;
    Ok(Polygon::new(exterior, rings.collect()))
}

/// Convert a GeoJSON geometry object into a `geo::Geometry`.
pub fn geometry_from_json(value: &Value) -> Result<Geometry<f64>> {
    let coords = &value["coordinates"];
    Ok(match value["type"].as_str() {
        Some("Point") => Point(parse_coord(coords)?).into(),
        Some("MultiPoint") => MultiPoint(parse_array(coords, |c| Ok(Point(parse_coord(c)?)))?).into(),
        Some("LineString") => parse_line(coords)?.into(),
        Some("MultiLineString") => MultiLineString(parse_array(coords, parse_line)?).into(),
        Some("Polygon") => parse_polygon(coords)?.into(),
        Some("MultiPolygon") => MultiPolygon(parse_array(coords, parse_polygon)?).into(),
        Some("GeometryCollection") => Geometry::GeometryCollection(GeometryCollection(
            parse_array(&value["geometries"], geometry_from_json)?)),
        other => return Err(ReconcileError::geometry("io::geojson",
            format!("unsupported geometry type {:?}", other.unwrap_or("<missing>"))).into()),
    })
}

fn coord_json(c: &Coord<f64>) -> Value { json!([c.x, c.y]) }

fn line_json(line: &LineString<f64>) -> Value {
    Value::Array(line.coords().map(coord_json).collect())
}

fn polygon_json(polygon: &Polygon<f64>) -> Value {
    Value::Array(std::iter::once(polygon.exterior()).chain(polygon.interiors()).map(line_json).collect())
}

/// Convert a `geo::Geometry` into a GeoJSON geometry object.
/// Lines, rectangles and triangles are written as their LineString/Polygon equivalents.
pub fn geometry_to_json(geometry: &Geometry<f64>) -> Value {
    match geometry {
        Geometry::Point(p) => json!({ "type": "Point", "coordinates": coord_json(&p.0) }),
        Geometry::MultiPoint(mp) => json!({ "type": "MultiPoint",
            "coordinates": mp.0.iter().map(|p| coord_json(&p.0)).collect::<Vec<_>>() }),
        Geometry::Line(l) => json!({ "type": "LineString", "coordinates": [coord_json(&l.start), coord_json(&l.end)] }),
        Geometry::LineString(ls) => json!({ "type": "LineString", "coordinates": line_json(ls) }),
        Geometry::MultiLineString(mls) => json!({ "type": "MultiLineString",
            "coordinates": mls.0.iter().map(line_json).collect::<Vec<_>>() }),
        Geometry::Polygon(p) => json!({ "type": "Polygon", "coordinates": polygon_json(p) }),
        Geometry::MultiPolygon(mp) => json!({ "type": "MultiPolygon",
            "coordinates": mp.0.iter().map(polygon_json).collect::<Vec<_>>() }),
        Geometry::GeometryCollection(gc) => json!({ "type": "GeometryCollection",
            "geometries": gc.0.iter().map(geometry_to_json).collect::<Vec<_>>() }),
        Geometry::Rect(r) => json!({ "type": "Polygon", "coordinates": polygon_json(&r.to_polygon()) }),
        Geometry::Triangle(t) => json!({ "type": "Polygon", "coordinates": polygon_json(&t.to_polygon()) }),
    }
}

/// Boundary features must be areal.
fn areal(geometry: Geometry<f64>, unit_id: &UnitId) -> Result<MultiPolygon<f64>> {
    match geometry {
        Geometry::Polygon(p) => Ok(MultiPolygon(vec![p])),
        Geometry::MultiPolygon(mp) => Ok(mp),
        _ => Err(ReconcileError::geometry(format!("io::geojson unit {unit_id}"), "expected Polygon or MultiPolygon").into()),
    }
}

/// Property columns are numeric (metrics) unless any feature holds a non-null, non-number value.
fn numeric_columns(features: &[Value], id_column: &str) -> Vec<Arc<str>> {
    let mut kinds: Vec<(&str, bool)> = Vec::new();
    for properties in features.iter().filter_map(|f| f["properties"].as_object()) {
        for (name, value) in properties.iter().filter(|(name, _)| name.as_str() != id_column) {
            let numeric = value.is_number() || value.is_null();
            match kinds.iter_mut().find(|(n, _)| *n == name.as_str()) {
                Some((_, kind)) => *kind &= numeric,
                None => kinds.push((name.as_str(), numeric)),
            }
        }
    }
    kinds.into_iter().filter(|(_, numeric)| *numeric).map(|(name, _)| Arc::from(name)).collect()
}

/// Read a boundary layer from a FeatureCollection.
///
/// `id_column` names the property holding the unit id. Numeric and null properties become
/// metrics (nulls leave the metric absent but keep the column in the layer schema);
/// everything else is kept as an attribute.
pub fn boundaries_from_geojson(collection: &Value, vintage: Vintage, id_column: &str, id_width: Option<usize>) -> Result<UnitLayer> {
    let features = features(collection)?;
    let metric_columns = numeric_columns(features, id_column);

    let units = features.iter()
        .map(|feature| -> Result<GeoUnit> {
            let empty = Map::new();
            let properties = feature["properties"].as_object().unwrap_or(&empty);
            let unit_id = match properties.get(id_column) {
                Some(Value::String(s)) => UnitId::normalized(s, id_width),
                Some(Value::Number(n)) => UnitId::normalized(&n.to_string(), id_width),
                _ => return Err(ReconcileError::schema("boundaries", id_column).into()),
            };
            let geometry = areal(geometry_from_json(&feature["geometry"])?, &unit_id)?;

            let metrics = metric_columns.iter()
                .filter_map(|name| Some((name.clone(), properties.get(name.as_ref())?.as_f64()?)))
                .collect::<Metrics>();
            let attributes = properties.iter()
                .filter(|(name, _)| name.as_str() != id_column && !metric_columns.iter().any(|m| m.as_ref() == name.as_str()))
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect::<BTreeMap<_, _>>();

            let mut unit = GeoUnit::new(unit_id, vintage, geometry).with_metrics(metrics);
            unit.attributes = attributes;
            Ok(unit)
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(UnitLayer::new(vintage, units)?
        .with_metric_columns(metric_columns)
        .with_epsg(epsg_from_crs(collection)))
}

/// Write a boundary layer as a FeatureCollection. Every schema metric is written on every
/// feature, as `null` where the unit has no value.
pub fn boundaries_to_geojson(layer: &UnitLayer, id_column: &str) -> Value {
    let features = layer.units().iter()
        .map(|unit| {
            let mut properties = Map::new();
            properties.insert(id_column.to_string(), Value::String(unit.unit_id.to_string()));
            for (name, value) in &unit.attributes {
                properties.insert(name.clone(), value.clone());
            }
            for name in layer.metric_columns() {
                let value = unit.metrics.get(name).map_or(Value::Null, |v| json!(v));
                properties.insert(name.to_string(), value);
            }
            json!({
                "type": "Feature",
                "geometry": geometry_to_json(&Geometry::MultiPolygon(unit.geometry.clone())),
                "properties": properties,
            })
        })
        .collect();

    feature_collection(features, layer.epsg())
}

/// Read a point collection. Features without a geometry are kept (they match no region).
pub fn points_from_geojson(name: &str, collection: &Value) -> Result<PointLayer> {
    let features = features(collection)?.iter()
        .map(|feature| -> Result<PointFeature> {
            let geometry = match &feature["geometry"] {
                Value::Null => Geometry::GeometryCollection(GeometryCollection(Vec::new())),
                value => geometry_from_json(value)?,
            };
            let properties = feature["properties"].as_object().cloned().unwrap_or_default();
            Ok(PointFeature::new(geometry).with_properties(properties))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(PointLayer::new(name, features).with_epsg(epsg_from_crs(collection)))
}

/// Write a labelled point collection, storing each feature's region label under
/// `target_column` (an empty string where no region contains the feature).
pub fn points_to_geojson(layer: &PointLayer, target_column: &str) -> Value {
    let features = layer.features().iter()
        .map(|feature| {
            let mut properties = feature.properties.clone();
            let label = feature.region_label.clone().unwrap_or_default();
            properties.insert(target_column.to_string(), Value::String(label));
            let geometry = match &feature.geometry {
                Geometry::GeometryCollection(gc) if gc.0.is_empty() => Value::Null,
                geometry => geometry_to_json(geometry),
            };
            json!({ "type": "Feature", "geometry": geometry, "properties": properties })
        })
        .collect();

    feature_collection(features, layer.epsg())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boundaries() -> Value {
        json!({
            "type": "FeatureCollection",
            "crs": { "type": "name", "properties": { "name": "urn:ogc:def:crs:EPSG::4269" } },
            "features": [
                { "type": "Feature",
                  "geometry": { "type": "Polygon", "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]]] },
                  "properties": { "GEOID": "24001000100", "county_name": "Allegany", "kfr": 0.41, "z": null } },
                { "type": "Feature",
                  "geometry": { "type": "MultiPolygon", "coordinates": [[[[1.0, 0.0], [2.0, 0.0], [2.0, 1.0], [1.0, 0.0]]]] },
                  "properties": { "GEOID": 1001020100u64, "county_name": null, "kfr": null, "z": null } },
            ],
        })
    }

    #[test]
    fn reads_boundaries_into_metrics_and_attributes() {
        let layer = boundaries_from_geojson(&boundaries(), Vintage::New, "GEOID", Some(11)).unwrap();

        assert_eq!(layer.len(), 2);
        assert_eq!(layer.epsg(), Some(4269));
        assert_eq!(layer.metric_columns(), &[Arc::<str>::from("kfr"), Arc::from("z")]);

        let first = layer.get(&UnitId::new("24001000100")).unwrap();
        assert_eq!(first.metrics.get("kfr"), Some(0.41));
        assert_eq!(first.label("county_name").as_deref(), Some("Allegany"));

        let second = layer.get(&UnitId::new("01001020100")).unwrap();
        assert!(second.metrics.is_empty());
        assert_eq!(second.attributes.get("county_name"), Some(&Value::Null));
    }

    #[test]
    fn missing_id_property_is_a_schema_mismatch() {
        let err = boundaries_from_geojson(&boundaries(), Vintage::New, "GEOID20", None).unwrap_err();
        assert!(matches!(err.downcast_ref::<ReconcileError>(), Some(ReconcileError::SchemaMismatch { .. })));
    }

    #[test]
    fn writes_null_for_absent_metrics() {
        let layer = boundaries_from_geojson(&boundaries(), Vintage::New, "GEOID", Some(11)).unwrap();
        let written = boundaries_to_geojson(&layer, "GEOID");

        let second = &written["features"][1]["properties"];
        assert_eq!(second["GEOID"], json!("01001020100"));
        assert_eq!(second["kfr"], Value::Null);
        assert_eq!(written["features"][0]["properties"]["kfr"], json!(0.41));
        assert_eq!(epsg_from_crs(&written), Some(4269));
    }

    #[test]
    fn points_keep_order_and_blank_unmatched_labels() {
        let collection = json!({
            "type": "FeatureCollection",
            "features": [
                { "type": "Feature", "geometry": { "type": "Point", "coordinates": [0.5, 0.5] }, "properties": { "name": "a" } },
                { "type": "Feature", "geometry": null, "properties": { "name": "b" } },
            ],
        });
        let mut layer = points_from_geojson("hospitals", &collection).unwrap();
        assert_eq!(layer.len(), 2);
        assert_eq!(layer.epsg(), None);

        let (name, mut features, epsg) = layer.into_features();
        features[0].region_label = Some("Allegany".to_string());
        layer = PointLayer::new(&name, features).with_epsg(epsg);

        let written = points_to_geojson(&layer, "county_name");
        assert_eq!(written["features"][0]["properties"]["county_name"], json!("Allegany"));
        assert_eq!(written["features"][1]["properties"]["county_name"], json!(""));
        assert_eq!(written["features"][1]["properties"]["name"], json!("b"));
        assert_eq!(written["features"][1]["geometry"], Value::Null);
    }

    #[test]
    fn rejects_unknown_geometry_types() {
        assert!(geometry_from_json(&json!({ "type": "Circle", "coordinates": [0.0, 0.0] })).is_err());
        assert!(geometry_from_json(&json!({ "type": "Point", "coordinates": ["x", 0.0] })).is_err());
    }

    #[test]
    fn reads_nested_geometry_collections() {
        let geometry = geometry_from_json(&json!({
            "type": "GeometryCollection",
            "geometries": [
                { "type": "Point", "coordinates": [1.0, 2.0] },
                { "type": "LineString", "coordinates": [[0.0, 0.0], [1.0, 1.0]] },
            ],
        })).unwrap();
        let Geometry::GeometryCollection(collection) = &geometry else { panic!("expected a collection") };
        assert_eq!(collection.0.len(), 2);
        assert_eq!(collection.0[0], Geometry::Point(Point::new(1.0, 2.0)));
        assert_eq!(geometry_to_json(&geometry)["geometries"][1]["type"], json!("LineString"));
    }
}
