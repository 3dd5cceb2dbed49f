use std::fmt;

use anyhow::Result;
use tracing::{info, warn};

use crate::error::ReconcileError;
use super::{assign_regions, PointLayer, RegionSet};

/// A named point collection that can be loaded and written back.
pub trait PointSource {
    fn name(&self) -> &str;

    /// Load the collection. A missing collection should fail with
    /// `ReconcileError::SourceUnavailable` so it is reported as skipped.
    fn load(&self) -> Result<PointLayer>;

    /// Persist the labelled collection.
    fn store(&self, layer: &PointLayer) -> Result<()>;
}

/// What happened to one collection in a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionOutcome {
    Joined { features: usize, matched: usize },
    Skipped { reason: String },
    Failed { error: String },
}

/// Per-collection outcomes of a batch join, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub outcomes: Vec<(String, CollectionOutcome)>,
}

impl BatchReport {
    pub fn joined(&self) -> usize { self.count(|o| matches!(o, CollectionOutcome::Joined { .. })) }

    pub fn skipped(&self) -> usize { self.count(|o| matches!(o, CollectionOutcome::Skipped { .. })) }

    pub fn failed(&self) -> usize { self.count(|o| matches!(o, CollectionOutcome::Failed { .. })) }

    pub fn get(&self, name: &str) -> Option<&CollectionOutcome> {
        self.outcomes.iter().find(|(n, _)| n == name).map(|(_, outcome)| outcome)
    }

    fn count(&self, pred: impl Fn(&CollectionOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, outcome)| pred(outcome)).count()
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, outcome) in &self.outcomes {
            match outcome {
                CollectionOutcome::Joined { features, matched } =>
                    writeln!(f, "  {name}: {features} features, {matched} with region")?,
                CollectionOutcome::Skipped { reason } => writeln!(f, "  {name}: skipped ({reason})")?,
                CollectionOutcome::Failed { error } => writeln!(f, "  {name}: error: {error}")?,
            }
        }
        write!(f, "{} joined, {} skipped, {} failed", self.joined(), self.skipped(), self.failed())
    }
}

/// Label every collection independently. A failure in one collection is recorded and
/// never stops the others.
pub fn augment_collections<S: PointSource>(regions: &RegionSet, sources: &[S]) -> BatchReport {
    let outcomes = sources.iter()
        .map(|source| {
            let name = source.name().to_string();
            let outcome = match augment_one(regions, source) {
                Ok((features, matched)) => {
                    info!("[join] {name}: saved {features} features with region labels");
                    CollectionOutcome::Joined { features, matched }
                }
                Err(err) => match err.downcast_ref::<ReconcileError>() {
                    Some(ReconcileError::SourceUnavailable { reason, .. }) => {
                        warn!("[join] skipping {name}: {reason}");
                        CollectionOutcome::Skipped { reason: reason.clone() }
                    }
                    _ => {
                        warn!("[join] error processing {name}: {err:#}");
                        CollectionOutcome::Failed { error: format!("{err:#}") }
                    }
                },
            };
            (name, outcome)
        })
        .collect();

    BatchReport { outcomes }
}

fn augment_one<S: PointSource>(regions: &RegionSet, source: &S) -> Result<(usize, usize)> {
    let layer = source.load()?;
    let (joined, stats) = assign_regions(regions, layer)?;
    source.store(&joined)?;
    Ok((stats.features, stats.matched))
}
