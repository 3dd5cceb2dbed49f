mod batch;
mod containment;
mod point;
mod region;

pub use batch::{augment_collections, BatchReport, CollectionOutcome, PointSource};
pub use containment::{assign_regions, JoinStats};
pub use point::{PointFeature, PointLayer};
pub use region::RegionSet;
