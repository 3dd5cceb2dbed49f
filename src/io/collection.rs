use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::{
    error::ReconcileError,
    join::{PointLayer, PointSource},
};
use super::geojson::{points_from_geojson, points_to_geojson, read_json, write_json};

/// A point collection stored as `<dir>/<name>.geojson`, written back in place.
#[derive(Debug, Clone)]
pub struct GeoJsonCollection {
    name: String,
    path: PathBuf,
    target_column: String,
}

impl GeoJsonCollection {
    pub fn new(name: &str, path: PathBuf, target_column: &str) -> Self {
        Self { name: name.to_string(), path, target_column: target_column.to_string() }
    }

    /// The collection named `name` inside `dir`.
    pub fn in_dir(dir: &Path, name: &str, target_column: &str) -> Self {
        Self::new(name, dir.join(format!("{name}.geojson")), target_column)
    }

    #[inline] pub fn path(&self) -> &Path { &self.path }
}

impl PointSource for GeoJsonCollection {
    fn name(&self) -> &str { &self.name }

    fn load(&self) -> Result<PointLayer> {
        if !self.path.is_file() {
            return Err(ReconcileError::SourceUnavailable {
                name: self.name.clone(),
                reason: format!("{} not found", self.path.display()),
            }.into());
        }
        points_from_geojson(&self.name, &read_json(&self.path)?)
    }

    fn store(&self, layer: &PointLayer) -> Result<()> {
        write_json(&self.path, &points_to_geojson(layer, &self.target_column))
    }
}
