use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::{error::ReconcileError, impute::ImputeMode};

/// Settings for one reconciliation run, passed explicitly into each component.
///
/// Every section has defaults matching the 2010→2020 tract workflow for Maryland,
/// so a config file only needs the values that differ.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReconcileConfig {
    pub crosswalk: CrosswalkConfig,
    pub series: SeriesConfig,
    pub impute: ImputeConfig,
    pub join: JoinConfig,
    pub assemble: AssembleConfig,
}

/// Columns of the relationship table and the jurisdiction to resolve.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CrosswalkConfig {
    pub new_id_column: String,
    pub old_id_column: String,
    pub weight_column: String,
    /// Field separator of the relationship file.
    pub separator: char,
    /// Prefix every NEW id in scope starts with (e.g. a state FIPS code); empty for none.
    pub jurisdiction: String,
}

impl Default for CrosswalkConfig {
    fn default() -> Self {
        Self {
            new_id_column: "GEOID_TRACT_20".to_string(),
            old_id_column: "GEOID_TRACT_10".to_string(),
            weight_column: "AREALAND_PART".to_string(),
            separator: '|',
            jurisdiction: "24".to_string(),
        }
    }
}

impl CrosswalkConfig {
    pub fn jurisdiction(&self) -> Option<&str> {
        Some(self.jurisdiction.as_str()).filter(|p| !p.is_empty())
    }
}

/// Columns of the multi-period metric table.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SeriesConfig {
    pub unit_id_column: String,
    pub period_column: String,
    pub region_column: String,
    /// Keep only records whose region column equals this label.
    pub region: Option<String>,
    /// Further columns that are not metrics.
    pub exclude_columns: Vec<String>,
    /// Zero-pad all-digit unit ids to this width.
    pub id_width: Option<usize>,
}

impl Default for SeriesConfig {
    fn default() -> Self {
        Self {
            unit_id_column: "GEOID".to_string(),
            period_column: "year".to_string(),
            region_column: "state_name".to_string(),
            region: Some("Maryland".to_string()),
            exclude_columns: vec!["county_name".to_string()],
            id_width: Some(11),
        }
    }
}

/// Imputation settings for the NEW-vintage boundary layer.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImputeConfig {
    pub unit_id_column: String,
    /// Metric whose absence marks a unit for imputation.
    pub primary_metric: String,
    pub mode: ImputeMode,
}

impl Default for ImputeConfig {
    fn default() -> Self {
        Self {
            unit_id_column: "GEOID".to_string(),
            primary_metric: "kfr_pooled_pooled_mean".to_string(),
            mode: ImputeMode::AllOrNothing,
        }
    }
}

/// Region labelling of point collections.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JoinConfig {
    /// Unit attribute the regions are dissolved by.
    pub region_column: String,
    /// Property written onto each point feature.
    pub target_column: String,
    /// Collection names, each read from `<name>.geojson`.
    pub collections: Vec<String>,
}

impl Default for JoinConfig {
    fn default() -> Self {
        Self {
            region_column: "county_name".to_string(),
            target_column: "county_name".to_string(),
            collections: ["hospitals", "schools", "parks", "libraries", "stores"]
                .iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Building the multi-period metric table from per-source tables keyed by tract.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssembleConfig {
    /// Unit id column of the assembled table.
    pub id_column: String,
    /// Columns a source table may key its rows by, tried in order.
    pub source_id_columns: Vec<String>,
    /// State/county/tract code columns used when no id column is present.
    pub state_column: String,
    pub county_column: String,
    pub tract_column: String,
    /// Columns kept from each source table besides the id; empty keeps all.
    pub keep_columns: Vec<String>,
    /// Long-format table: the column whose values become new columns.
    pub pivot_key_column: String,
    /// Long-format table: the column averaged into each new column.
    pub pivot_value_column: String,
}

impl Default for AssembleConfig {
    fn default() -> Self {
        Self {
            id_column: "GEOID".to_string(),
            source_id_columns: vec!["GEOID".to_string(), "geoid10".to_string()],
            state_column: "state".to_string(),
            county_column: "county".to_string(),
            tract_column: "tract".to_string(),
            keep_columns: Vec::new(),
            pivot_key_column: "type".to_string(),
            pivot_value_column: "travel_time".to_string(),
        }
    }
}

impl ReconcileConfig {
    /// Parse a TOML document and validate it.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)
            .map_err(|e| ReconcileError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a TOML config file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("[config] Failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&text)
            .with_context(|| format!("[config] Invalid config file: {}", path.display()))
    }

    /// Reject settings no component can work with.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("crosswalk.new_id_column", &self.crosswalk.new_id_column),
            ("crosswalk.old_id_column", &self.crosswalk.old_id_column),
            ("crosswalk.weight_column", &self.crosswalk.weight_column),
            ("series.unit_id_column", &self.series.unit_id_column),
            ("series.period_column", &self.series.period_column),
            ("series.region_column", &self.series.region_column),
            ("impute.unit_id_column", &self.impute.unit_id_column),
            ("impute.primary_metric", &self.impute.primary_metric),
            ("join.region_column", &self.join.region_column),
            ("join.target_column", &self.join.target_column),
            ("assemble.id_column", &self.assemble.id_column),
            ("assemble.pivot_key_column", &self.assemble.pivot_key_column),
            ("assemble.pivot_value_column", &self.assemble.pivot_value_column),
        ];
        if let Some((key, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(ReconcileError::Config(format!("{key} must not be empty")).into());
        }
        if self.crosswalk.new_id_column == self.crosswalk.old_id_column {
            return Err(ReconcileError::Config(
                "crosswalk.new_id_column and crosswalk.old_id_column must differ".to_string()).into());
        }
        if !self.crosswalk.separator.is_ascii() {
            return Err(ReconcileError::Config("crosswalk.separator must be an ASCII character".to_string()).into());
        }
        if self.assemble.pivot_key_column == self.assemble.pivot_value_column {
            return Err(ReconcileError::Config(
                "assemble.pivot_key_column and assemble.pivot_value_column must differ".to_string()).into());
        }
        if self.series.id_width == Some(0) {
            return Err(ReconcileError::Config("series.id_width must be positive".to_string()).into());
        }
        Ok(())
    }
}
