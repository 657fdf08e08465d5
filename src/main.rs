use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::{Generator, generate};
use colored::Colorize;
use pkgaudit::cli::{Cli, Commands};
use pkgaudit::{AuditContext, commands};
use std::io;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

/// Diagnostics go to stderr; stdout carries only the report or archive
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        None => {
            let ctx = AuditContext::new(cli.config.as_deref(), cli.manifest_file.as_deref())?;
            commands::scan::execute(&ctx, cli.extract_metadata)?;
        }
        Some(Commands::Tar {
            exclude,
            files_from,
            files,
            ..
        }) => {
            let list = commands::export::FileList::from_args(files_from, files);
            commands::export::execute(list, exclude)?;
        }
        Some(Commands::Completion { shell }) => {
            print_completions(shell, &mut Cli::command());
        }
    }

    Ok(())
}

fn print_completions<G: Generator>(g: G, cmd: &mut clap::Command) {
    generate(g, cmd, cmd.get_name().to_string(), &mut io::stdout());
}
