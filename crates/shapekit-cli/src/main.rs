//! Command line entry point.

use clap::Parser;
use shapekit_cli::{Cli, run};

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    log::debug!("Running {:?}", cli.command);

    let output = run(&cli)?;
    println!("{output}");
    Ok(())
}
