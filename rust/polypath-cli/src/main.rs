use std::fs::File;
use std::io::{self, BufWriter, Write};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::FmtSubscriber;

use polypath_cli::{run, Args};

fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder().with_ansi(false).json().with_writer(io::stderr).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    let args = Args::parse();
    info!(?args, "starting polypath");

    match &args.out {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
            let mut w = BufWriter::new(file);
            run(&args, &mut w)?;
            w.flush()?;
        }
        None => {
            let stdout = io::stdout();
            let mut w = stdout.lock();
            run(&args, &mut w)?;
        }
    }
    Ok(())
}
