use anyhow::Result;
use tractwalk::{io, CollapsedMetrics};

pub fn run(cli: &crate::cli::Cli, args: &crate::cli::CollapseArgs) -> Result<()> {
    let config = super::load_config(cli)?;
    let out_path = args.output.clone().unwrap_or("./collapsed.csv".into());

    println!("[collapse] reading metric table {}", args.series.display());
    let series = io::read_metric_series(&args.series, &config.series)?;
    let collapsed = CollapsedMetrics::collapse(&series, config.series.region.as_deref());
    println!("[collapse] {} records -> {} units, {} metric columns",
        series.len(), collapsed.len(), collapsed.columns().len());

    println!("[collapse] writing table to {}", out_path.display());
    io::write_collapsed(&out_path, &collapsed, &config.series)
}
