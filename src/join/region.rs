use std::collections::BTreeMap;

use anyhow::Result;
use geo::{Geometry, MultiPolygon};
use tracing::debug;

use crate::{
    error::ReconcileError,
    geom::{union_all, Geometries},
    map::UnitLayer,
};

/// One merged polygon per region label.
///
/// Regions are enumerated in ascending label order (the order a dissolve-by-label
/// produces), and that order decides which region wins when a feature touches several.
#[derive(Debug, Clone)]
pub struct RegionSet {
    labels: Vec<String>,
    geoms: Geometries,
}

impl RegionSet {
    /// Build a region set from labelled shapes, merging shapes that share a label.
    pub fn from_regions(regions: impl IntoIterator<Item = (String, MultiPolygon<f64>)>, epsg: Option<u32>) -> Self {
        let mut grouped: BTreeMap<String, Vec<MultiPolygon<f64>>> = BTreeMap::new();
        for (label, shape) in regions {
            grouped.entry(label).or_default().push(shape);
        }

        let (labels, shapes): (Vec<_>, Vec<_>) = grouped.into_iter()
            .map(|(label, shapes)| (label, union_all(shapes).unwrap_or_else(|| MultiPolygon(vec![]))))
            .unzip();

        Self { labels, geoms: Geometries::new(shapes, epsg) }
    }

    /// Merge the geometries of all units sharing a value in `label_column`.
    /// Units without a label belong to no region.
    pub fn dissolve(layer: &UnitLayer, label_column: &str) -> Result<Self> {
        if !layer.is_empty() && !layer.units().iter().any(|unit| unit.attributes.contains_key(label_column)) {
            return Err(ReconcileError::schema("dissolve", label_column).into());
        }

        let labelled = layer.units().iter()
            .filter_map(|unit| Some((unit.label(label_column)?, unit.geometry.clone())))
            .collect::<Vec<_>>();
        debug!("[RegionSet::dissolve] {} of {} units carry {label_column:?}", labelled.len(), layer.len());

        let regions = Self::from_regions(labelled, layer.epsg());
        debug!("[RegionSet::dissolve] {} regions", regions.len());
        Ok(regions)
    }

    #[inline] pub fn len(&self) -> usize { self.labels.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.labels.is_empty() }

    #[inline] pub fn labels(&self) -> &[String] { &self.labels }

    #[inline] pub fn epsg(&self) -> Option<u32> { self.geoms.epsg() }

    /// Merged shape of the region at enumeration position `idx`.
    #[inline] pub fn shape(&self, idx: usize) -> &MultiPolygon<f64> { &self.geoms.shapes()[idx] }

    /// Labels of every region `geometry` intersects, in enumeration order.
    pub fn matches(&self, geometry: &Geometry<f64>) -> Vec<&str> {
        self.geoms.intersecting(geometry).into_iter()
            .map(|i| self.labels[i].as_str())
            .collect()
    }

    /// Label of the first region (in enumeration order) that `geometry` intersects.
    pub fn locate(&self, geometry: &Geometry<f64>) -> Option<&str> {
        self.matches(geometry).into_iter().next()
    }
}
