use anyhow::{ensure, Result};
use tractwalk::{augment_collections, io::{self, GeoJsonCollection}, RegionSet, Vintage};

pub fn run(cli: &crate::cli::Cli, args: &crate::cli::AugmentArgs) -> Result<()> {
    let config = super::load_config(cli)?;
    let join = &config.join;
    ensure!(args.dir.is_dir(), "[augment] not a directory: {}", args.dir.display());

    println!("[augment] dissolving {} by {:?}", args.boundaries.display(), join.region_column);
    let layer = io::read_boundaries(&args.boundaries, Vintage::New, &config.impute.unit_id_column, config.series.id_width)?;
    let regions = RegionSet::dissolve(&layer, &join.region_column)?;
    println!("[augment] {} regions from {} units", regions.len(), layer.len());

    let names = if args.collections.is_empty() { &join.collections } else { &args.collections };
    let sources = names.iter()
        .map(|name| GeoJsonCollection::in_dir(&args.dir, name, &join.target_column))
        .collect::<Vec<_>>();

    let report = augment_collections(&regions, &sources);
    println!("{report}");
    ensure!(report.outcomes.is_empty() || report.failed() < report.outcomes.len(),
        "[augment] every collection failed");
    Ok(())
}
