use std::path::PathBuf;

/// Census vintage reconciliation CLI (argument schema only)
#[derive(clap::Parser, Debug)]
#[command(name = "tractwalk", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// TOML config file; built-in defaults are used for anything it leaves out
    #[arg(short, long, global = true, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Join per-source tract tables into one multi-period metric table
    Assemble(AssembleArgs),

    /// Resolve each NEW unit to its dominant OLD unit
    Crosswalk(CrosswalkArgs),

    /// Collapse a multi-period metric table to each unit's latest record
    Collapse(CollapseArgs),

    /// Fill missing metrics on NEW boundaries from their OLD parent units
    Fill(FillArgs),

    /// Label point collections with the region that contains them
    Augment(AugmentArgs),
}

#[derive(clap::Args, Debug)]
pub struct AssembleArgs {
    /// Base table; every output row comes from one of its rows (CSV)
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub base: PathBuf,

    /// Tables left-joined onto the base by unit id, in order (CSV)
    #[arg(long = "join", value_name = "TABLE", value_hint = clap::ValueHint::FilePath)]
    pub joins: Vec<PathBuf>,

    /// Long-format table pivoted to one column per key, then joined (CSV)
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub long: Option<PathBuf>,

    /// Output table, defaults to "./series.csv"
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct CrosswalkArgs {
    /// Relationship file between the two vintages
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub relationship: PathBuf,

    /// Output mapping file, defaults to "./crosswalk.csv"
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct CollapseArgs {
    /// Multi-period metric table (CSV)
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub series: PathBuf,

    /// Output table, defaults to "./collapsed.csv"
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct FillArgs {
    /// Relationship file between the two vintages
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub relationship: PathBuf,

    /// Multi-period metric table keyed by OLD unit ids (CSV)
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub series: PathBuf,

    /// NEW-vintage boundaries (.geojson or .shp)
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub boundaries: PathBuf,

    /// Output boundaries, defaults to "./filled.geojson"
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// Join collapsed metrics onto boundaries with an identical id before filling
    #[arg(long)]
    pub attach: bool,
}

#[derive(clap::Args, Debug)]
pub struct AugmentArgs {
    /// Boundaries carrying the region label column (.geojson or .shp)
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub boundaries: PathBuf,

    /// Directory holding one `<name>.geojson` per point collection
    #[arg(value_hint = clap::ValueHint::DirPath)]
    pub dir: PathBuf,

    /// Collections to label, defaults to the configured list
    #[arg(long = "collection", value_name = "NAME")]
    pub collections: Vec<String>,
}
