// Integration tests for the fill workflow:
//   relationship file -> crosswalk, metric table -> collapsed rows,
//   boundaries -> imputed boundaries, read and written through `tractwalk::io`.

use std::{fs, path::Path};

use serde_json::{json, Value};
use tractwalk::{
    io, CollapsedMetrics, CrosswalkMapping, ImputeMode, Imputer, ReconcileConfig, ReconcileError, RegionSet, UnitId,
    Vintage,
};

const RELATIONSHIP: &str = "\
OID_TRACT_20|GEOID_TRACT_20|GEOID_TRACT_10|AREALAND_PART
1|24001000101|24001000100|900
2|24001000101|24001000200|100
3|24001000102|24001000200|500
4|24001000103|24001000300|
5|51001000100|51001000100|999
";

const SERIES: &str = "\
GEOID,year,state_name,county_name,kfr_pooled_pooled_mean,jail
24001000100,2010,Maryland,Allegany,0.40,0.01
24001000100,2018,Maryland,Allegany,0.45,0.02
24001000200,2018,Maryland,Allegany,0.50,
51001000100,2018,Virginia,Accomack,0.90,0.10
";

fn square(x: f64) -> Value {
    json!({ "type": "Polygon", "coordinates": [[[x, 0.0], [x + 1.0, 0.0], [x + 1.0, 1.0], [x, 1.0], [x, 0.0]]] })
}

fn boundaries() -> Value {
    let feature = |i: usize, geoid: &str, kfr: Value| json!({
        "type": "Feature",
        "geometry": square(i as f64),
        "properties": { "GEOID": geoid, "county_name": "Allegany", "kfr_pooled_pooled_mean": kfr, "jail": null },
    });
    json!({
        "type": "FeatureCollection",
        "features": [
            feature(0, "24001000101", Value::Null),
            feature(1, "24001000102", Value::Null),
            feature(2, "24001000103", Value::Null),
            feature(3, "24001000104", json!(0.3)),
        ],
    })
}

fn write_inputs(dir: &Path) {
    fs::write(dir.join("relationship.txt"), RELATIONSHIP).unwrap();
    fs::write(dir.join("series.csv"), SERIES).unwrap();
    io::write_json(&dir.join("tracts.geojson"), &boundaries()).unwrap();
}

#[test]
fn crosswalk_resolves_dominant_parent_within_jurisdiction() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path());
    let config = ReconcileConfig::default();

    let entries = io::read_relationship_table(&dir.path().join("relationship.txt"), &config.crosswalk, config.series.id_width).unwrap();
    assert_eq!(entries.len(), 5);
    assert_eq!(entries[3].overlap_weight, None);

    let mapping = CrosswalkMapping::resolve(&entries, config.crosswalk.jurisdiction());
    assert_eq!(mapping.len(), 3);
    assert_eq!(mapping.get(&UnitId::new("24001000101")), Some(&UnitId::new("24001000100")));
    assert_eq!(mapping.get(&UnitId::new("24001000103")), Some(&UnitId::new("24001000300")));
    assert_eq!(mapping.get(&UnitId::new("51001000100")), None);

    let out = dir.path().join("out/crosswalk.csv");
    io::write_crosswalk(&out, &mapping, &config.crosswalk).unwrap();
    let written = fs::read_to_string(&out).unwrap();
    assert_eq!(written.lines().next(), Some("GEOID_TRACT_20,GEOID_TRACT_10"));
    assert_eq!(written.lines().count(), 4);
}

#[test]
fn collapse_keeps_latest_record_in_region() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path());
    let config = ReconcileConfig::default();

    let series = io::read_metric_series(&dir.path().join("series.csv"), &config.series).unwrap();
    assert_eq!(series.len(), 4);
    assert_eq!(series.columns().len(), 2);

    let collapsed = CollapsedMetrics::collapse(&series, config.series.region.as_deref());
    assert_eq!(collapsed.len(), 2);
    let row = collapsed.get(&UnitId::new("24001000100")).unwrap();
    assert_eq!(row.period, Some(2018.0));
    assert_eq!(row.metrics.get("kfr_pooled_pooled_mean"), Some(0.45));
    assert!(!collapsed.contains(&UnitId::new("51001000100")));

    let out = dir.path().join("collapsed.csv");
    io::write_collapsed(&out, &collapsed, &config.series).unwrap();
    let written = fs::read_to_string(&out).unwrap();
    assert!(written.starts_with("GEOID,year,state_name,county_name,"));
    assert!(written.contains(",Allegany,"));
    assert_eq!(written.lines().count(), 3);
}

#[test]
fn fill_copies_parent_vectors_and_reports_coverage() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path());
    let config = ReconcileConfig::default();

    let entries = io::read_relationship_table(&dir.path().join("relationship.txt"), &config.crosswalk, config.series.id_width).unwrap();
    let mapping = CrosswalkMapping::resolve(&entries, config.crosswalk.jurisdiction());
    let series = io::read_metric_series(&dir.path().join("series.csv"), &config.series).unwrap();
    let collapsed = CollapsedMetrics::collapse(&series, config.series.region.as_deref());
    let layer = io::read_boundaries(&dir.path().join("tracts.geojson"), Vintage::New, "GEOID", Some(11)).unwrap();

    let (filled, report) = Imputer::new(&mapping, &collapsed, "kfr_pooled_pooled_mean")
        .impute(&layer)
        .unwrap();

    assert_eq!((report.total, report.already_present, report.filled, report.still_missing), (4, 1, 2, 1));
    assert_eq!((report.missing_before, report.missing_after), (3, 1));
    assert_eq!(format!("{:.1}", report.coverage()), "75.0");

    let unit = |id: &str| filled.get(&UnitId::new(id)).unwrap().clone();
    assert_eq!(unit("24001000101").metrics.get("kfr_pooled_pooled_mean"), Some(0.45));
    assert_eq!(unit("24001000101").metrics.get("jail"), Some(0.02));
    assert_eq!(unit("24001000102").metrics.get("kfr_pooled_pooled_mean"), Some(0.50));
    assert_eq!(unit("24001000102").metrics.get("jail"), None);
    assert_eq!(unit("24001000103").metrics.get("kfr_pooled_pooled_mean"), None);
    assert_eq!(unit("24001000104").metrics.get("kfr_pooled_pooled_mean"), Some(0.3));

    let out = dir.path().join("filled.geojson");
    io::write_boundaries(&out, &filled, "GEOID").unwrap();
    let written = io::read_json(&out).unwrap();
    let features = written["features"].as_array().unwrap();
    assert_eq!(features.len(), 4);
    assert_eq!(features[2]["properties"]["kfr_pooled_pooled_mean"], Value::Null);
    assert_eq!(features[0]["properties"]["county_name"], json!("Allegany"));
}

#[test]
fn per_field_mode_fills_individual_gaps() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path());
    let config = ReconcileConfig::from_toml_str("[impute]\nmode = \"per_field\"").unwrap();

    let mut entries = io::read_relationship_table(&dir.path().join("relationship.txt"), &config.crosswalk, config.series.id_width).unwrap();
    entries.push(tractwalk::RelationshipEntry::new(UnitId::new("24001000104"), UnitId::new("24001000100"), Some(1.0)));
    let mapping = CrosswalkMapping::resolve(&entries, config.crosswalk.jurisdiction());
    let series = io::read_metric_series(&dir.path().join("series.csv"), &config.series).unwrap();
    let collapsed = CollapsedMetrics::collapse(&series, config.series.region.as_deref());
    let layer = io::read_boundaries(&dir.path().join("tracts.geojson"), Vintage::New, "GEOID", Some(11)).unwrap();

    let (filled, _) = Imputer::new(&mapping, &collapsed, &config.impute.primary_metric)
        .with_mode(ImputeMode::PerField)
        .impute(&layer)
        .unwrap();

    let unit = filled.get(&UnitId::new("24001000104")).unwrap();
    assert_eq!(unit.metrics.get("kfr_pooled_pooled_mean"), Some(0.3));
    assert_eq!(unit.metrics.get("jail"), Some(0.02));
}

#[test]
fn missing_key_columns_are_schema_mismatches() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path());
    let mut config = ReconcileConfig::default();
    config.crosswalk.old_id_column = "GEOID_TRACT_00".to_string();

    let err = io::read_relationship_table(&dir.path().join("relationship.txt"), &config.crosswalk, None).unwrap_err();
    assert!(matches!(err.downcast_ref::<ReconcileError>(), Some(ReconcileError::SchemaMismatch { .. })));

    let layer = io::read_boundaries(&dir.path().join("tracts.geojson"), Vintage::New, "GEOID", Some(11)).unwrap();
    let mapping = CrosswalkMapping::resolve(&[], None);
    let collapsed = CollapsedMetrics::collapse(&tractwalk::MetricSeries::new(Vec::new(), Vec::new()), None);
    let err = Imputer::new(&mapping, &collapsed, "not_a_column").impute(&layer).unwrap_err();
    assert!(matches!(err.downcast_ref::<ReconcileError>(), Some(ReconcileError::SchemaMismatch { .. })));
}

#[test]
fn attached_layers_carry_region_labels_for_dissolve() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path());
    let config = ReconcileConfig::default();

    // TIGER-style layer: ids and geometry only, no county names.
    let bare = json!({
        "type": "FeatureCollection",
        "features": [
            { "type": "Feature", "geometry": square(0.0), "properties": { "GEOID": "24001000100" } },
            { "type": "Feature", "geometry": square(1.0), "properties": { "GEOID": "24001000200" } },
        ],
    });
    let path = dir.path().join("tiger.geojson");
    io::write_json(&path, &bare).unwrap();
    let layer = io::read_boundaries(&path, Vintage::New, "GEOID", Some(11)).unwrap();
    assert!(RegionSet::dissolve(&layer, &config.join.region_column).is_err());

    let series = io::read_metric_series(&dir.path().join("series.csv"), &config.series).unwrap();
    assert_eq!(series.attribute_columns(), &["county_name".to_string()]);
    let collapsed = CollapsedMetrics::collapse(&series, config.series.region.as_deref());
    let (attached, matched) = layer.attach_metrics(&collapsed).unwrap();
    assert_eq!(matched, 2);

    let regions = RegionSet::dissolve(&attached, &config.join.region_column).unwrap();
    assert_eq!(regions.labels(), &["Allegany".to_string()]);

    let out = dir.path().join("attached.geojson");
    io::write_boundaries(&out, &attached, "GEOID").unwrap();
    let written = io::read_json(&out).unwrap();
    assert_eq!(written["features"][1]["properties"]["county_name"], json!("Allegany"));
}
