pub mod assemble;
pub mod augment;
pub mod collapse;
pub mod crosswalk;
pub mod fill;

use anyhow::Result;
use tractwalk::ReconcileConfig;

/// The config named on the command line, or the built-in defaults.
pub fn load_config(cli: &crate::cli::Cli) -> Result<ReconcileConfig> {
    match &cli.config {
        Some(path) => ReconcileConfig::from_path(path),
        None => Ok(ReconcileConfig::default()),
    }
}
