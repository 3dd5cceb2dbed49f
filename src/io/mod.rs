mod collection;
mod csv;
mod geojson;
mod shp;

use std::path::Path;

use anyhow::Result;

use crate::map::{UnitLayer, Vintage};

pub use collection::GeoJsonCollection;
pub use csv::{
    metric_series, read_delimited, read_metric_series, read_relationship_table, read_text_table,
    relationship_entries, text_table, write_collapsed, write_crosswalk, write_text_table,
};
pub use geojson::{
    boundaries_from_geojson, boundaries_to_geojson, epsg_from_crs, geometry_from_json,
    geometry_to_json, points_from_geojson, points_to_geojson, read_json, write_json,
};
pub use shp::read_boundaries_shapefile;

/// Read a boundary layer from a `.shp` file or a GeoJSON FeatureCollection, by extension.
pub fn read_boundaries(path: &Path, vintage: Vintage, id_column: &str, id_width: Option<usize>) -> Result<UnitLayer> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("shp") => read_boundaries_shapefile(path, vintage, id_width),
        _ => boundaries_from_geojson(&read_json(path)?, vintage, id_column, id_width),
    }
}

/// Write a boundary layer as a GeoJSON FeatureCollection.
pub fn write_boundaries(path: &Path, layer: &UnitLayer, id_column: &str) -> Result<()> {
    write_json(path, &boundaries_to_geojson(layer, id_column))
}
