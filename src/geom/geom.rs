use geo::{BooleanOps, BoundingRect, Geometry, Intersects, MultiPolygon, Rect};
use rstar::{RTree, AABB};

use super::BoundingBox;

/// An ordered collection of MultiPolygons with an R-tree over their bounding boxes.
///
/// Enumeration order is the insertion order; every query reports candidates in that
/// order so "first match wins" tie-breaks are reproducible.
#[derive(Debug, Clone)]
pub(crate) struct Geometries {
    shapes: Vec<MultiPolygon<f64>>,
    rtree: RTree<BoundingBox>,
    epsg: Option<u32>, // EPSG code, if known
}

impl Geometries {
    /// Construct a Geometries object from a vector of MultiPolygons.
    /// Empty shapes are kept in place but never reported by queries.
    pub(crate) fn new(polygons: Vec<MultiPolygon<f64>>, epsg: Option<u32>) -> Self {
        Self {
            rtree: RTree::bulk_load(
                polygons.iter().enumerate()
                    .filter_map(|(i, polygon)| Some(BoundingBox::new(i, polygon.bounding_rect()?)))
                    .collect()
            ),
            shapes: polygons,
            epsg,
        }
    }

    /// Get a reference to the list of MultiPolygons.
    #[inline] pub(crate) fn shapes(&self) -> &[MultiPolygon<f64>] { &self.shapes }

    /// Get the EPSG code, if known.
    #[inline] pub(crate) fn epsg(&self) -> Option<u32> { self.epsg }

    /// Indices of shapes whose bounding boxes intersect `rect`, in enumeration order.
    pub(crate) fn candidates(&self, rect: Rect<f64>) -> Vec<usize> {
        let envelope = AABB::from_corners(rect.min().into(), rect.max().into());
        let mut indices = self.rtree.locate_in_envelope_intersecting(&envelope)
            .map(|bb| bb.idx())
            .collect::<Vec<_>>();
        indices.sort_unstable();
        indices
    }

    /// Indices of all shapes intersecting `geometry` (boundary contact counts), in enumeration order.
    pub(crate) fn intersecting(&self, geometry: &Geometry<f64>) -> Vec<usize> {
        let Some(rect) = geometry.bounding_rect() else { return Vec::new() };
        self.candidates(rect).into_iter()
            .filter(|&i| geometry.intersects(&self.shapes[i]))
            .collect()
    }
}

/// Merge a sequence of MultiPolygons into one.
/// This may be slow for large numbers of complex polygons.
pub(crate) fn union_all(shapes: impl IntoIterator<Item = MultiPolygon<f64>>) -> Option<MultiPolygon<f64>> {
    shapes.into_iter().reduce(|a, b| a.union(&b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{point, polygon, Area};

    fn square(x: f64, y: f64) -> MultiPolygon<f64> {
        MultiPolygon(vec![polygon![
            (x: x, y: y), (x: x + 1.0, y: y), (x: x + 1.0, y: y + 1.0), (x: x, y: y + 1.0),
        ]])
    }

    #[test]
    fn candidates_come_back_in_enumeration_order() {
        let geoms = Geometries::new(vec![square(1.0, 0.0), square(0.0, 0.0), square(5.0, 5.0)], None);
        let rect = Rect::new((0.5, 0.5), (1.5, 0.6));
        assert_eq!(geoms.candidates(rect), vec![0, 1]);
    }

    #[test]
    fn intersecting_includes_shared_edges() {
        let geoms = Geometries::new(vec![square(0.0, 0.0), square(1.0, 0.0)], Some(4269));
        let on_edge = Geometry::Point(point!(x: 1.0, y: 0.5));
        let inside = Geometry::Point(point!(x: 0.25, y: 0.5));
        let outside = Geometry::Point(point!(x: 9.0, y: 9.0));

        assert_eq!(geoms.intersecting(&on_edge), vec![0, 1]);
        assert_eq!(geoms.intersecting(&inside), vec![0]);
        assert!(geoms.intersecting(&outside).is_empty());
        assert_eq!(geoms.epsg(), Some(4269));
    }

    #[test]
    fn empty_shapes_are_never_reported() {
        let geoms = Geometries::new(vec![MultiPolygon(vec![]), square(0.0, 0.0)], None);
        assert_eq!(geoms.shapes().len(), 2);
        assert_eq!(geoms.intersecting(&Geometry::Point(point!(x: 0.5, y: 0.5))), vec![1]);
    }

    #[test]
    fn union_merges_adjacent_squares() {
        let merged = union_all([square(0.0, 0.0), square(1.0, 0.0)]).unwrap();
        assert!((merged.unsigned_area() - 2.0).abs() < 1e-9);
    }
}
