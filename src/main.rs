use std::process::ExitCode;

use clap::Parser;

use fits_header_edit::cli::{Cli, Commands};
use fits_header_edit::commands::{list_headers, run_edit};
use fits_header_edit::logging;

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let config = cli.output.to_run_config(cli.verbose);
    let result = match cli.command {
        Commands::List { keyword, paths } => list_headers(&paths, &keyword, &config),
        command => run_edit(command, &config),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(2)
        }
    }
}
