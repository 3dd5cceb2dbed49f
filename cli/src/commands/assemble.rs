use anyhow::Result;
use tractwalk::io;

pub fn run(cli: &crate::cli::Cli, args: &crate::cli::AssembleArgs) -> Result<()> {
    let config = super::load_config(cli)?;
    let out_path = args.output.clone().unwrap_or("./series.csv".into());

    println!("[assemble] reading base table {}", args.base.display());
    let base = io::read_text_table(&args.base)?;
    let joins = args.joins.iter()
        .map(|path| {
            println!("[assemble] reading joined table {}", path.display());
            io::read_text_table(path)
        })
        .collect::<Result<Vec<_>>>()?;
    let long = args.long.as_deref()
        .map(|path| {
            println!("[assemble] reading long table {}", path.display());
            io::read_text_table(path)
        })
        .transpose()?;

    let series = tractwalk::assemble(&base, &joins, long.as_ref(), &config.assemble, config.series.id_width)?;
    println!("[assemble] {} base rows -> {} rows, {} columns", base.len(), series.len(), series.columns().len());

    println!("[assemble] writing table to {}", out_path.display());
    io::write_text_table(&out_path, &series)
}
