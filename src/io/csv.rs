//! Delimited-table reading and writing.

use std::{collections::BTreeMap, fs::File, path::Path, sync::Arc};

use anyhow::{Context, Result};
use polars::prelude::*;
use tracing::debug;

use crate::{
    common::{coerce_numeric, ensure_parent_dir},
    config::{CrosswalkConfig, SeriesConfig},
    crosswalk::{CrosswalkMapping, RelationshipEntry},
    error::ReconcileError,
    map::{Metrics, UnitId},
    series::{CollapsedMetrics, MetricRecord, MetricSeries, TextTable},
};

/// Reads a delimited file with a header row into a DataFrame of text columns.
/// Every cell stays a string so ids keep their leading zeros; blanks become nulls.
pub fn read_delimited(path: &Path, separator: u8) -> Result<DataFrame> {
    let file = File::open(path)
        .with_context(|| format!("[io::csv::read] Failed to open delimited file: {}", path.display()))?;
    CsvReadOptions::default()
        .with_has_header(true)
        .map_parse_options(|po| po.with_separator(separator))
        .with_infer_schema_length(Some(0))
        .into_reader_with_file_handle(file)
        .finish()
        .with_context(|| format!("[io::csv::read] Failed to read delimited file from {:?}", path))
}

/// A required text column, or a schema mismatch naming `component`.
fn required_column<'a>(df: &'a DataFrame, name: &str, component: &'static str) -> Result<&'a StringChunked> {
    let column = df.column(name).map_err(|_| ReconcileError::schema(component, name))?;
    column.str().with_context(|| format!("[io::csv] column {name:?} is not a text column"))
}

/// An optional text column; absent columns read as all-null.
fn optional_column<'a>(df: &'a DataFrame, name: &str) -> Result<Option<&'a StringChunked>> {
    df.column(name).ok()
        .map(|column| column.str()
            .with_context(|| format!("[io::csv] column {name:?} is not a text column")))
        .transpose()
}

/// Convert a relationship table into entries. Rows missing either id are dropped;
/// a missing weight column leaves every weight unset.
pub fn relationship_entries(df: &DataFrame, config: &CrosswalkConfig, id_width: Option<usize>) -> Result<Vec<RelationshipEntry>> {
    let new_ids = required_column(df, &config.new_id_column, "crosswalk")?;
    let old_ids = required_column(df, &config.old_id_column, "crosswalk")?;
    let weights = optional_column(df, &config.weight_column)?;

    let entries = new_ids.into_iter()
        .zip(old_ids.into_iter())
        .enumerate()
        .filter_map(|(i, (new_id, old_id))| {
            let weight = weights.and_then(|w| w.get(i));
            Some(RelationshipEntry::from_cells(new_id?, old_id?, weight, id_width))
        })
        .collect::<Vec<_>>();

    debug!("[io::csv] {} relationship entries from {} rows", entries.len(), df.height());
    Ok(entries)
}

/// Read the NEW↔OLD relationship file named by `path`.
pub fn read_relationship_table(path: &Path, config: &CrosswalkConfig, id_width: Option<usize>) -> Result<Vec<RelationshipEntry>> {
    let df = read_delimited(path, config.separator as u8)?;
    relationship_entries(&df, config, id_width)
}

/// Convert a metric table into a series. Every column other than the unit id, period,
/// region and excluded columns is a metric; cells that are not numbers read as absent.
/// Excluded columns present in the table are carried as text attributes.
pub fn metric_series(df: &DataFrame, config: &SeriesConfig) -> Result<MetricSeries> {
    let unit_ids = required_column(df, &config.unit_id_column, "series")?;
    let periods = optional_column(df, &config.period_column)?;
    let regions = match config.region {
        Some(_) => Some(required_column(df, &config.region_column, "series")?),
        None => optional_column(df, &config.region_column)?,
    };

    let reserved = [&config.unit_id_column, &config.period_column, &config.region_column];
    let metric_columns = df.get_column_names().into_iter()
        .map(|name| name.as_str())
        .filter(|name| !reserved.iter().any(|r| r.as_str() == *name))
        .filter(|name| !config.exclude_columns.iter().any(|e| e == name))
        .map(|name| Ok((Arc::<str>::from(name), required_column(df, name, "series")?)))
        .collect::<Result<Vec<_>>>()?;
    let attribute_columns = config.exclude_columns.iter()
        .filter(|name| !reserved.contains(name))
        .filter_map(|name| optional_column(df, name).transpose().map(|values| Ok((name.clone(), values?))))
        .collect::<Result<Vec<_>>>()?;

    let records = unit_ids.into_iter()
        .enumerate()
        .filter_map(|(i, unit_id)| {
            let metrics = metric_columns.iter()
                .filter_map(|(name, values)| Some((name.clone(), coerce_numeric(values.get(i))?)))
                .collect::<Metrics>();
            let attributes = attribute_columns.iter()
                .filter_map(|(name, values)| Some((name.clone(), values.get(i)?.trim().to_string())))
                .collect::<BTreeMap<_, _>>();
            let record = MetricRecord::new(
                UnitId::normalized(unit_id?, config.id_width),
                coerce_numeric(periods.and_then(|p| p.get(i))),
                regions.and_then(|r| r.get(i)).map(str::to_string),
                metrics,
            );
            Some(record.with_attributes(attributes))
        })
        .collect::<Vec<_>>();

    debug!("[io::csv] {} metric records, {} metric columns, {} text columns",
        records.len(), metric_columns.len(), attribute_columns.len());
    Ok(MetricSeries::new(metric_columns.into_iter().map(|(name, _)| name).collect(), records)
        .with_attribute_columns(attribute_columns.into_iter().map(|(name, _)| name).collect()))
}

/// Read a comma-separated metric table.
pub fn read_metric_series(path: &Path, config: &SeriesConfig) -> Result<MetricSeries> {
    let df = read_delimited(path, b',')?;
    metric_series(&df, config)
}

/// Convert a DataFrame of text columns into a table; blank cells become `None`.
pub fn text_table(df: &DataFrame) -> Result<TextTable> {
    let columns = df.get_column_names().into_iter()
        .map(|name| name.as_str().to_string())
        .collect::<Vec<_>>();
    let cells = columns.iter()
        .map(|name| required_column(df, name, "assemble"))
        .collect::<Result<Vec<_>>>()?;
    let rows = (0..df.height())
        .map(|i| cells.iter()
            .map(|values| values.get(i).filter(|s| !s.trim().is_empty()).map(str::to_string))
            .collect())
        .collect::<Vec<Vec<Option<String>>>>();
    TextTable::new(columns, rows)
}

/// Read a comma-separated source table with every cell kept as text.
pub fn read_text_table(path: &Path) -> Result<TextTable> {
    let df = read_delimited(path, b',')?;
    debug!("[io::csv] {} rows, {} columns from {}", df.height(), df.width(), path.display());
    text_table(&df)
}

/// Write a text table as CSV, blanks as empty cells.
pub fn write_text_table(path: &Path, table: &TextTable) -> Result<()> {
    let columns = table.columns().iter().enumerate()
        .map(|(i, name)| {
            let values = table.rows().iter().map(|row| row[i].clone()).collect::<Vec<Option<String>>>();
            Column::new(name.as_str().into(), values)
        })
        .collect::<Vec<_>>();
    write_csv(&mut DataFrame::new(columns)?, path)
}

/// Write collapsed metrics as CSV: unit id, period, region, the carried text columns,
/// then every metric column.
pub fn write_collapsed(path: &Path, collapsed: &CollapsedMetrics, config: &SeriesConfig) -> Result<()> {
    let (ids, periods, regions) = collapsed.iter()
        .map(|(unit_id, row)| (unit_id.id().to_string(), row.period, row.region.clone()))
        .fold((Vec::new(), Vec::new(), Vec::new()), |(mut ids, mut periods, mut regions), (id, period, region)| {
            ids.push(id);
            periods.push(period);
            regions.push(region);
            (ids, periods, regions)
        });

    let mut columns = vec![
        Column::new(config.unit_id_column.as_str().into(), ids),
        Column::new(config.period_column.as_str().into(), periods),
        Column::new(config.region_column.as_str().into(), regions),
    ];
    columns.extend(collapsed.attribute_columns().iter().map(|name| {
        let values = collapsed.iter().map(|(_, row)| row.attributes.get(name).cloned()).collect::<Vec<Option<String>>>();
        Column::new(name.as_str().into(), values)
    }));
    columns.extend(collapsed.columns().iter().map(|name| {
        let values = collapsed.iter().map(|(_, row)| row.metrics.get(name)).collect::<Vec<Option<f64>>>();
        Column::new(name.as_ref().into(), values)
    }));

    write_csv(&mut DataFrame::new(columns)?, path)
}

/// Write a crosswalk mapping as CSV with the relationship table's id column names.
pub fn write_crosswalk(path: &Path, mapping: &CrosswalkMapping, config: &CrosswalkConfig) -> Result<()> {
    let (new_ids, old_ids) = mapping.iter()
        .map(|(new_id, old_id)| (new_id.id().to_string(), old_id.id().to_string()))
        .unzip::<_, _, Vec<_>, Vec<_>>();

    let mut df = DataFrame::new(vec![
        Column::new(config.new_id_column.as_str().into(), new_ids),
        Column::new(config.old_id_column.as_str().into(), old_ids),
    ])?;

    write_csv(&mut df, path)
}

/// Write a DataFrame to a CSV file.
fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    ensure_parent_dir(path)?;
    let file = File::create(path)
        .with_context(|| format!("[io::csv::write] Failed to create CSV file: {}", path.display()))?;
    CsvWriter::new(file)
        .finish(df)
        .with_context(|| format!("[io::csv::write] Failed to write CSV to {:?}", path))
}
