//! Calendar CLI entry point.

use calendar::cli::commands;
use calendar::cli::{Cli, Commands};
use calendar::config::{load_settings, LoggerSettings, Settings};
use calendar::error::Error;
use clap::Parser;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let settings = match resolve_settings(&cli) {
        Ok(settings) => settings,
        Err(e) => return report(&e, &cli),
    };

    init_tracing(&settings.logger, cli.verbose, cli.quiet);

    match run(&cli, &settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report(&e, &cli),
    }
}

/// Settings file + environment, then command-line overrides.
fn resolve_settings(cli: &Cli) -> Result<Settings, Error> {
    let mut settings = load_settings(cli.config.as_deref())?;
    if let Some(workmode) = cli.workmode {
        settings.database.workmode = workmode;
    }
    if let Some(dsn) = &cli.dsn {
        settings.database.sqlite.dsn.clone_from(dsn);
    }
    Ok(settings)
}

fn report(e: &Error, cli: &Cli) -> ExitCode {
    if cli.json {
        eprintln!("{}", e.to_structured_json());
    } else if let Some(hint) = e.hint() {
        eprintln!("Error: {e}\n  Hint: {hint}");
    } else {
        eprintln!("Error: {e}");
    }
    ExitCode::from(e.exit_code())
}

fn init_tracing(logger: &LoggerSettings, verbose: u8, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    if quiet {
        return;
    }

    // Honor RUST_LOG if set, then the verbosity flag, then the settings file
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        match verbose {
            0 => EnvFilter::try_new(&logger.level).unwrap_or_else(|_| EnvFilter::new("warn")),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug,r2d2=info"),
            _ => EnvFilter::new("trace"),
        }
    };

    let log_file = logger
        .file
        .as_ref()
        .filter(|path| !path.as_os_str().is_empty())
        .and_then(|path| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| eprintln!("Warning: cannot open log file {}: {e}", path.display()))
                .ok()
        });

    match log_file {
        Some(file) => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .init(),
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .without_time()
            .init(),
    }
}

fn run(cli: &Cli, settings: &Settings) -> Result<(), Error> {
    match &cli.command {
        Commands::Event { command } => {
            commands::event::execute(command, &settings.database, cli.json)
        }
        Commands::Version => commands::version::execute(cli.json),
        Commands::Completions { shell } => commands::completions::execute(shell),
    }
}
