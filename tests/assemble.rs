// Integration tests for building the metric table from per-source tables:
//   outcome table keyed by state/county/tract codes, opportunity index keyed by
//   `geoid10`, walkability keyed by GEOID, travel times in long format by block.

use std::{fs, path::Path};

use tractwalk::{io, CollapsedMetrics, ReconcileConfig, ReconcileError, UnitId};

const OUTCOMES: &str = "\
state,county,tract,kfr_pooled_pooled_mean,jail_pooled_pooled_mean
24,1,100,0.45,0.02
24,1,200,,0.03
";

const OPPORTUNITY: &str = "\
geoid10,year,state_name,county_name,z_COI_nat
24001000100,2010,Maryland,Allegany,-0.2
24001000100,2015,Maryland,Allegany,-0.1
24001000300,2015,Maryland,Allegany,0.4
";

const WALKABILITY: &str = "\
GEOID,NatWalkInd
24001000200,7.5
";

const TRAVEL: &str = "\
GEOID,type,travel_time
240010001001001,hospital,10
240010001001002,hospital,20
24001000200,hospital,8
24001000200,school,4
";

fn write_inputs(dir: &Path) {
    fs::write(dir.join("outcomes.csv"), OUTCOMES).unwrap();
    fs::write(dir.join("opportunity.csv"), OPPORTUNITY).unwrap();
    fs::write(dir.join("walkability.csv"), WALKABILITY).unwrap();
    fs::write(dir.join("travel.csv"), TRAVEL).unwrap();
}

#[test]
fn assembled_table_feeds_the_collapse() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path());
    let config = ReconcileConfig::default();
    let read = |name: &str| io::read_text_table(&dir.path().join(name)).unwrap();

    let joins = [read("opportunity.csv"), read("walkability.csv")];
    let table = tractwalk::assemble(&read("outcomes.csv"), &joins, Some(&read("travel.csv")),
        &config.assemble, config.series.id_width).unwrap();

    // Tract 100 has two opportunity years; tract 200 has none.
    assert_eq!(table.len(), 3);
    assert_eq!(table.columns()[0], "GEOID");
    assert!(table.column_index("state").is_none());
    assert!(table.column_index("geoid10").is_none());

    let out = dir.path().join("out/series.csv");
    io::write_text_table(&out, &table).unwrap();
    let series = io::read_metric_series(&out, &config.series).unwrap();
    assert_eq!(series.len(), 3);

    // Tract 200 has no state name, so collapse without the region filter.
    let collapsed = CollapsedMetrics::collapse(&series, None);
    assert_eq!(collapsed.len(), 2);

    let tract_100 = collapsed.get(&UnitId::new("24001000100")).unwrap();
    assert_eq!(tract_100.period, Some(2015.0));
    assert_eq!(tract_100.metrics.get("z_COI_nat"), Some(-0.1));
    assert_eq!(tract_100.metrics.get("hospital"), Some(15.0));
    assert_eq!(tract_100.attributes.get("county_name").map(String::as_str), Some("Allegany"));

    let tract_200 = collapsed.get(&UnitId::new("24001000200")).unwrap();
    assert_eq!(tract_200.metrics.get("kfr_pooled_pooled_mean"), None);
    assert_eq!(tract_200.metrics.get("NatWalkInd"), Some(7.5));
    assert_eq!(tract_200.metrics.get("school"), Some(4.0));
    assert!(!collapsed.contains(&UnitId::new("24001000300")));
}

#[test]
fn sources_without_unit_ids_are_schema_mismatches() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path());
    fs::write(dir.path().join("bare.csv"), "name,value\na,1\n").unwrap();
    let config = ReconcileConfig::default();

    let base = io::read_text_table(&dir.path().join("outcomes.csv")).unwrap();
    let bare = io::read_text_table(&dir.path().join("bare.csv")).unwrap();
    let err = tractwalk::assemble(&base, &[bare], None, &config.assemble, config.series.id_width).unwrap_err();
    assert!(matches!(err.downcast_ref::<ReconcileError>(), Some(ReconcileError::SchemaMismatch { .. })));
}
