use anyhow::Result;
use tractwalk::{io, CrosswalkMapping};

pub fn run(cli: &crate::cli::Cli, args: &crate::cli::CrosswalkArgs) -> Result<()> {
    let config = super::load_config(cli)?;
    let out_path = args.output.clone().unwrap_or("./crosswalk.csv".into());

    println!("[crosswalk] reading relationship file {}", args.relationship.display());
    let entries = io::read_relationship_table(&args.relationship, &config.crosswalk, config.series.id_width)?;
    let mapping = CrosswalkMapping::resolve(&entries, config.crosswalk.jurisdiction());
    println!("[crosswalk] {} relationship entries -> {} resolved units", entries.len(), mapping.len());

    println!("[crosswalk] writing mapping to {}", out_path.display());
    io::write_crosswalk(&out_path, &mapping, &config.crosswalk)
}
