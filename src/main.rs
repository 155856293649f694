use clap::Parser;
use colored::*;
use dicoterm::cli::{resolve_config, Cli, Commands};
use dicoterm::core::query_system;
use dicoterm::DicoError;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    // Initialize logging with DICOTERM_LOG environment variable support
    let log_level = std::env::var("DICOTERM_LOG").unwrap_or_else(|_| "info".to_string());

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("DICOTERM_LOG").unwrap_or_else(|_| EnvFilter::new(&log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = run(cli);
    if let Err(e) = query_system::close() {
        eprintln!("{} {}", "Warning:".yellow().bold(), e);
    }

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);

        // Use appropriate exit codes based on error type
        let exit_code = match e.downcast_ref::<DicoError>() {
            Some(DicoError::Config(_)) => 2,
            Some(DicoError::Io(_)) => 3,
            Some(DicoError::Parse(_)) | Some(DicoError::InvalidShardKey(_)) => 4,
            Some(DicoError::NotInitialized)
            | Some(DicoError::NotFound(_))
            | Some(DicoError::Corrupt(_))
            | Some(DicoError::Index(_))
            | Some(DicoError::Codec(_)) => 5,
            _ => 1,
        };
        process::exit(exit_code);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    dicoterm::utils::parallel::configure_thread_pool(cli.threads)?;

    if cli.verbose > 0 {
        eprintln!(
            "Using {} threads",
            dicoterm::utils::parallel::effective_threads(cli.threads)
        );
    }

    let config = resolve_config(cli.config.as_deref(), cli.root.as_deref())?;

    match cli.command {
        Commands::Index(args) => dicoterm::cli::commands::index::run(args, config),
        Commands::Term(args) => dicoterm::cli::commands::term::run(args, config),
        Commands::TaxPath(args) => dicoterm::cli::commands::tax_path::run(args, config),
        Commands::GoPath(args) => dicoterm::cli::commands::go_path::run(args, config),
        Commands::EnzymePath(args) => dicoterm::cli::commands::enzyme_path::run(args, config),
        Commands::Search(args) => dicoterm::cli::commands::search::run(args, config),
        Commands::Info(args) => dicoterm::cli::commands::info::run(args, config),
    }
}
