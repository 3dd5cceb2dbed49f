mod bbox;
mod geom;

use bbox::BoundingBox;
pub(crate) use geom::{union_all, Geometries};
