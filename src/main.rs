//! CLI entry point for the fMRI connectivity pipeline

use clap::Parser;
use fcpipe::io::cli::{Cli, FileProcessor};
use fcpipe::io::logging;

fn main() -> fcpipe::Result<()> {
    let cli = Cli::parse();
    logging::init(logging::parse_level(&cli.log_level)?);
    let processor = FileProcessor::new(cli);
    processor.process().inspect_err(|e| tracing::error!("{e}"))
}
