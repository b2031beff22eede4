//! DIAS CLI - Command-line utility for creating, validating and inspecting
//! DIAS preservation packages.

mod cli;
mod commands;
mod error;
mod logging;
mod output;
mod progress;

use clap::Parser;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();

    let formatter = output::create_formatter(&cli);

    if let Err(err) = logging::init(cli.verbose, cli.quiet, cli.log_file.as_deref()) {
        formatter.format_error(&err);
        return ExitCode::FAILURE;
    }

    let result = match &cli.command {
        cli::Commands::Create(args) => commands::create::execute(
            args,
            cli.config.as_deref(),
            &*formatter,
            cli.show_progress(),
            cli.verbose,
        ),
        cli::Commands::Validate(args) => {
            commands::validate::execute(args, cli.config.as_deref(), &*formatter)
        }
        cli::Commands::Inspect(args) => commands::inspect::execute(args, &*formatter),
        cli::Commands::Template(args) => commands::template::execute(args, &*formatter),
        cli::Commands::Completion(args) => {
            commands::completion::execute(args.shell);
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if !error::is_reported(&err) {
                formatter.format_error(&err);
            }
            ExitCode::FAILURE
        }
    }
}
