//! stateport CLI entry point.

use clap::Parser;
use stateport::cli::commands;
use stateport::cli::{Cli, Commands};
use stateport::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    // Set up tracing based on verbosity
    init_tracing(cli.verbose, cli.quiet);

    // Resolve effective JSON mode: --json OR non-TTY stdout
    let json = cli.json || !std::io::IsTerminal::is_terminal(&std::io::stdout());

    let result = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| Error::Other(format!("Failed to start runtime: {e}")))
        .and_then(|runtime| runtime.block_on(run(&cli, json)));

    // Run the command and handle errors
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if json {
                eprintln!("{}", e.to_structured_json());
            } else if matches!(e, Error::Cancelled) {
                if !cli.quiet {
                    eprintln!("{e}");
                }
            } else if !cli.quiet {
                if let Some(hint) = e.hint() {
                    eprintln!("Error: {e}\n  Hint: {hint}");
                } else {
                    eprintln!("Error: {e}");
                }
            }
            ExitCode::from(e.exit_code())
        }
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    if quiet {
        return;
    }

    // Honor RUST_LOG if set, otherwise use verbosity flag
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        match verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

async fn run(cli: &Cli, json: bool) -> Result<(), Error> {
    let data_dir = cli.data_dir.as_deref();

    match &cli.command {
        Commands::Export { output, force } => {
            commands::export::execute(output.as_ref(), *force, data_dir, json).await
        }
        Commands::Validate { file } => commands::validate::execute(file, json).await,
        Commands::Preview { file } => commands::preview::execute(file, data_dir, json).await,
        Commands::Import(args) => commands::import::execute(args, data_dir, json).await,
        Commands::Share { command } => commands::share::execute(command, data_dir, json).await,
        Commands::Version => commands::version::execute(json),

        // Shell completions
        Commands::Completions { shell } => commands::completions::execute(shell),
    }
}
