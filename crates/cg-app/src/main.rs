use std::process::ExitCode;

use clap::Parser;

pub mod cli;
pub mod pipeline;

fn main() -> ExitCode {
    // 1. Parser CLI
    let cli = cli::Cli::parse();

    // 2. Initialiser le logging
    env_logger::Builder::new()
        .filter_level(cli.log_level.parse().unwrap_or(log::LevelFilter::Warn))
        .init();

    // 3. Exécuter, une seule ligne de diagnostic en cas d'échec
    match pipeline::execute(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("contribgif: {e:#}");
            ExitCode::FAILURE
        }
    }
}
