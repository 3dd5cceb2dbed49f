mod cli;
mod commands;

use cli::{Cli, Commands};
use commands::{assemble, augment, collapse, crosswalk, fill};
use tracing_subscriber::EnvFilter;

/// Log to stderr; `-v` raises the default level, `RUST_LOG` overrides it.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

pub fn run() -> anyhow::Result<()> {
    use clap::Parser;

    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match &cli.command {
        Commands::Assemble(args) => assemble::run(&cli, args),
        Commands::Crosswalk(args) => crosswalk::run(&cli, args),
        Commands::Collapse(args) => collapse::run(&cli, args),
        Commands::Fill(args) => fill::run(&cli, args),
        Commands::Augment(args) => augment::run(&cli, args),
    }
}

fn main() -> anyhow::Result<()> { run() }
