mod cli;
mod execute;

use anyhow::Result;
use clap::Parser;

use crate::cli::CLI;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    let cli = CLI::parse();
    execute::execute(cli)
}
