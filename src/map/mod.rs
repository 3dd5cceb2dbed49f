mod layer;
mod metrics;
mod unit;
mod unit_id;
mod vintage;

pub use layer::UnitLayer;
pub use metrics::Metrics;
pub use unit::GeoUnit;
pub use unit_id::UnitId;
pub use vintage::Vintage;
