mod engine;
mod report;

pub use engine::{ImputeMode, Imputer};
pub use report::ImputeReport;
