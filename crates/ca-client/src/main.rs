// ABOUTME: Entry point for the ca-client CLI
// ABOUTME: Maps any fatal error to a message on stderr and exit code 1

use std::process::ExitCode;

use ca_client::cli::{self, Cli};
use clap::Parser;
use colored::Colorize;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    ca_client_log::init(cli.verbose);

    match cli::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!();
            eprintln!("{} {:#}", "error:".red().bold(), e);
            eprintln!();
            ExitCode::FAILURE
        }
    }
}
