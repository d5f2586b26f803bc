//! cmdgate - pre-execution safety gate for agent shell commands
//!
//! Thin binary entry point that delegates to the CLI handlers.

use std::process::ExitCode;

use clap::Parser;

mod cli;

use cli::Cli;

fn main() -> ExitCode {
    let args = Cli::parse();

    cli::initialize_tracing_from_env();

    match cli::run(args) {
        Ok(outcome) => outcome.exit_code(),
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
