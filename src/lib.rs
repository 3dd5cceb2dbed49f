#![doc = "Tractwalk public API: census vintage crosswalks, metric imputation and point-in-region joins"]
mod common;
mod config;
mod crosswalk;
mod error;
mod geom;
mod impute;
mod join;
mod map;
mod series;

pub mod io;

#[doc(inline)]
pub use config::{AssembleConfig, CrosswalkConfig, ImputeConfig, JoinConfig, ReconcileConfig, SeriesConfig};

#[doc(inline)]
pub use crosswalk::{CrosswalkMapping, RelationshipEntry};

#[doc(inline)]
pub use error::ReconcileError;

#[doc(inline)]
pub use impute::{ImputeMode, ImputeReport, Imputer};

#[doc(inline)]
pub use join::{
    assign_regions, augment_collections, BatchReport, CollectionOutcome, JoinStats,
    PointFeature, PointLayer, PointSource, RegionSet,
};

#[doc(inline)]
pub use map::{GeoUnit, Metrics, UnitId, UnitLayer, Vintage};

#[doc(inline)]
pub use series::{
    assemble, key_by_unit, left_join, pivot_mean, CollapsedMetrics, CollapsedRow, MetricRecord, MetricSeries,
    TextTable,
};
