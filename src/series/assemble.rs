use std::collections::{BTreeMap, BTreeSet, HashMap};

use anyhow::Result;
use tracing::{debug, info};

use crate::{common::coerce_numeric, config::AssembleConfig, error::ReconcileError, map::UnitId};
use super::TextTable;

/// Running mean over present values.
#[derive(Debug, Clone, Copy, Default)]
struct Mean {
    sum: f64,
    count: usize,
}

impl Mean {
    fn add(&mut self, value: Option<f64>) {
        if let Some(value) = value {
            self.sum += value;
            self.count += 1;
        }
    }

    fn value(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

/// Per-row unit ids of a source table and the columns they were read from.
///
/// The first configured id column the table has wins; otherwise the id is built from
/// the state/county/tract code columns.
fn unit_ids(table: &TextTable, config: &AssembleConfig, id_width: Option<usize>) -> Result<(Vec<Option<UnitId>>, Vec<String>)> {
    if let Some(column) = config.source_id_columns.iter().find(|c| table.column_index(c).is_some()) {
        let ids = (0..table.len())
            .map(|i| table.cell(i, column)
                .filter(|id| !id.trim().is_empty())
                .map(|id| UnitId::normalized(id, id_width)))
            .collect();
        return Ok((ids, vec![column.clone()]));
    }

    let parts = [&config.state_column, &config.county_column, &config.tract_column];
    if parts.iter().all(|c| table.column_index(c).is_some()) {
        let ids = (0..table.len())
            .map(|i| match (table.cell(i, parts[0]), table.cell(i, parts[1]), table.cell(i, parts[2])) {
                (Some(state), Some(county), Some(tract)) => Some(UnitId::from_parts(state, county, tract)),
                _ => None,
            })
            .collect();
        return Ok((ids, parts.iter().map(|c| c.to_string()).collect()));
    }

    Err(ReconcileError::schema("assemble", &config.id_column).into())
}

/// Re-key a source table by unit id.
///
/// The id becomes the first column (named `config.id_column`), the columns it was read
/// from are dropped, and so are rows without an id. A non-empty `keep_columns` limits
/// the remaining columns.
pub fn key_by_unit(table: &TextTable, config: &AssembleConfig, id_width: Option<usize>) -> Result<TextTable> {
    let (ids, consumed) = unit_ids(table, config, id_width)?;
    let kept = table.columns().iter().enumerate()
        .filter(|(_, name)| !consumed.contains(name) && **name != config.id_column)
        .filter(|(_, name)| config.keep_columns.is_empty() || config.keep_columns.contains(name))
        .map(|(i, name)| (i, name.clone()))
        .collect::<Vec<_>>();

    let rows = ids.into_iter()
        .zip(table.rows())
        .filter_map(|(id, row)| {
            let mut out = Vec::with_capacity(kept.len() + 1);
            out.push(Some(id?.id().to_string()));
            out.extend(kept.iter().map(|&(i, _)| row[i].clone()));
            Some(out)
        })
        .collect::<Vec<_>>();
    debug!("[series::assemble] keyed {} of {} rows by {:?}", rows.len(), table.len(), consumed);

    let columns = std::iter::once(config.id_column.clone())
        .chain(kept.into_iter().map(|(_, name)| name))
        .collect();
    TextTable::new(columns, rows)
}

/// Left join `right` onto `left` by `id_column`.
///
/// Every left row is kept; a left row matching several right rows is repeated once per
/// match, in right-table order. Right columns already present on the left are not added.
pub fn left_join(left: &TextTable, right: &TextTable, id_column: &str) -> Result<TextTable> {
    let left_id = left.column_index(id_column).ok_or_else(|| ReconcileError::schema("assemble", id_column))?;
    let right_id = right.column_index(id_column).ok_or_else(|| ReconcileError::schema("assemble", id_column))?;
    let added = right.columns().iter().enumerate()
        .filter(|(i, name)| *i != right_id && left.column_index(name).is_none())
        .map(|(i, _)| i)
        .collect::<Vec<_>>();

    let mut matches: HashMap<&str, Vec<usize>> = HashMap::new();
    for (j, row) in right.rows().iter().enumerate() {
        if let Some(id) = row[right_id].as_deref() {
            matches.entry(id).or_default().push(j);
        }
    }

    let mut rows = Vec::with_capacity(left.len());
    for row in left.rows() {
        match row[left_id].as_deref().and_then(|id| matches.get(id)) {
            Some(found) => rows.extend(found.iter().map(|&j| {
                let mut out = row.clone();
                out.extend(added.iter().map(|&k| right.rows()[j][k].clone()));
                out
            })),
            None => {
                let mut out = row.clone();
                out.resize(row.len() + added.len(), None);
                rows.push(out);
            }
        }
    }
    debug!("[series::assemble] joined {} columns, {} -> {} rows", added.len(), left.len(), rows.len());

    let columns = left.columns().iter().cloned()
        .chain(added.iter().map(|&k| right.columns()[k].clone()))
        .collect();
    TextTable::new(columns, rows)
}

/// Pivot a long table (one row per unit and key) into one row per unit with a column
/// per key holding the mean value, keys in ascending order.
///
/// Ids longer than `id_width` (block ids) are cut to that width and the per-id means of
/// each unit averaged again. Cells that are not numbers are skipped.
pub fn pivot_mean(long: &TextTable, config: &AssembleConfig, id_width: Option<usize>) -> Result<TextTable> {
    let (ids, _) = unit_ids(long, config, id_width)?;
    let keys = long.column(&config.pivot_key_column)
        .ok_or_else(|| ReconcileError::schema("assemble", &config.pivot_key_column))?;
    let values = long.column(&config.pivot_value_column)
        .ok_or_else(|| ReconcileError::schema("assemble", &config.pivot_value_column))?;

    let mut cells: BTreeMap<UnitId, BTreeMap<String, Mean>> = BTreeMap::new();
    for ((id, key), value) in ids.into_iter().zip(keys).zip(values) {
        let (Some(id), Some(key)) = (id, key) else { continue };
        cells.entry(id).or_default()
            .entry(key.trim().to_string()).or_default()
            .add(coerce_numeric(value));
    }

    let width = id_width.unwrap_or(usize::MAX);
    let mut truncated = 0;
    let mut units: BTreeMap<UnitId, BTreeMap<String, Mean>> = BTreeMap::new();
    for (id, by_key) in cells {
        let prefix = (id.id().len() > width).then(|| id.id().get(..width)).flatten().map(UnitId::new);
        let unit_id = match prefix {
            Some(prefix) => { truncated += 1; prefix }
            None => id,
        };
        let target = units.entry(unit_id).or_default();
        for (key, mean) in by_key {
            target.entry(key).or_default().add(mean.value());
        }
    }
    if truncated > 0 {
        debug!("[series::assemble] averaged {truncated} sub-unit ids into {} units", units.len());
    }

    let keys = units.values().flat_map(|by_key| by_key.keys().cloned()).collect::<BTreeSet<_>>();
    let rows: Vec<Vec<Option<String>>> = units.iter()
        .map(|(id, by_key)| std::iter::once(Some(id.id().to_string()))
            .chain(keys.iter().map(|key| by_key.get(key).and_then(Mean::value).map(|v| v.to_string())))
            .collect())
        .collect();
    let columns = std::iter::once(config.id_column.clone()).chain(keys).collect();
    TextTable::new(columns, rows)
}

/// Build one metric table from `base`, left-joining each of `joins` and then the pivoted
/// `long` table on unit id.
pub fn assemble(
    base: &TextTable,
    joins: &[TextTable],
    long: Option<&TextTable>,
    config: &AssembleConfig,
    id_width: Option<usize>,
) -> Result<TextTable> {
    let mut table = key_by_unit(base, config, id_width)?;
    for other in joins {
        table = left_join(&table, &key_by_unit(other, config, id_width)?, &config.id_column)?;
    }
    if let Some(long) = long {
        table = left_join(&table, &pivot_mean(long, config, id_width)?, &config.id_column)?;
    }

    info!("[series::assemble] {} rows, {} columns", table.len(), table.columns().len());
    Ok(table)
}
