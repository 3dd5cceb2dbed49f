use anyhow::Result;
use tracing::debug;

use crate::error::ReconcileError;
use super::{PointFeature, PointLayer, RegionSet};

/// Counts from joining one point collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JoinStats {
    pub features: usize,
    pub matched: usize,
}

/// Assign each feature the label of the region it intersects.
///
/// Intersection (not strict containment) is used so features on a shared boundary still
/// match; such features take the first matching region in the set's enumeration order.
/// Features outside every region keep no label. The output has exactly one feature per
/// input feature, in input order.
///
/// Both layers must share a coordinate frame; reprojection is the caller's job.
pub fn assign_regions(regions: &RegionSet, layer: PointLayer) -> Result<(PointLayer, JoinStats)> {
    if let (Some(regions_epsg), Some(points_epsg)) = (regions.epsg(), layer.epsg()) {
        if regions_epsg != points_epsg {
            return Err(ReconcileError::CrsMismatch { regions: regions_epsg, points: points_epsg }.into());
        }
    }

    let (name, features, epsg) = layer.into_features();
    let features = features.into_iter()
        .map(|feature| PointFeature {
            region_label: regions.locate(&feature.geometry).map(str::to_string),
            ..feature
        })
        .collect::<Vec<_>>();

    let stats = JoinStats {
        features: features.len(),
        matched: features.iter().filter(|f| f.region_label.is_some()).count(),
    };
    debug!("[join::assign_regions] {name}: {} of {} features matched", stats.matched, stats.features);

    Ok((PointLayer::new(&name, features).with_epsg(epsg), stats))
}
