use anyhow::Result;
use tracing::info;
use tractwalk::{io, CollapsedMetrics, CrosswalkMapping, Imputer, Vintage};

pub fn run(cli: &crate::cli::Cli, args: &crate::cli::FillArgs) -> Result<()> {
    let config = super::load_config(cli)?;
    let out_path = args.output.clone().unwrap_or("./filled.geojson".into());
    let id_column = &config.impute.unit_id_column;

    println!("[fill] resolving crosswalk from {}", args.relationship.display());
    let entries = io::read_relationship_table(&args.relationship, &config.crosswalk, config.series.id_width)?;
    let mapping = CrosswalkMapping::resolve(&entries, config.crosswalk.jurisdiction());

    println!("[fill] collapsing metric table {}", args.series.display());
    let series = io::read_metric_series(&args.series, &config.series)?;
    let collapsed = CollapsedMetrics::collapse(&series, config.series.region.as_deref());

    println!("[fill] loading boundaries from {}", args.boundaries.display());
    let mut layer = io::read_boundaries(&args.boundaries, Vintage::New, id_column, config.series.id_width)?;
    if args.attach {
        let (attached, matched) = layer.attach_metrics(&collapsed)?;
        info!("[fill] attached collapsed metrics to {matched} of {} units", attached.len());
        layer = attached;
    }

    let imputer = Imputer::new(&mapping, &collapsed, &config.impute.primary_metric)
        .with_mode(config.impute.mode);
    let (filled, report) = imputer.impute(&layer)?;
    println!("{report}");

    println!("[fill] writing boundaries to {}", out_path.display());
    io::write_boundaries(&out_path, &filled, id_column)
}
