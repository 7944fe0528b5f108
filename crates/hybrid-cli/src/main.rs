//! `hybrid` binary.

#![deny(unsafe_code)]

use anyhow::Result;
use clap::Parser;
use hybrid_cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = cli.load_settings()?;
    hybrid_core::logging::init_subscriber(&settings.logging.level);

    let output = hybrid_cli::run(&cli, settings)?;
    println!("{output}");
    Ok(())
}
