use std::process::ExitCode;

use clap::Parser;
use minls::cli::{Cli, Commands};
use minls::commands::{self, CommandError};
use minls::config::Config;
use minls::observability::{self, LogSink};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CommandError> {
    if let Commands::Version = cli.command {
        return commands::version();
    }

    let config = Config::load(&cli.overrides())?;

    // Clearing logs must not hold a file open inside the directory being removed
    let clears_logs = matches!(&cli.command, Commands::Clear(args) if args.target.includes_logs());
    let sink = if clears_logs {
        LogSink::Console
    } else {
        LogSink::ConsoleAndFile {
            dir: config.logs_dir(),
        }
    };

    if let Some(path) = observability::init(&config.logging.level, &sink)? {
        tracing::debug!(path = %path.display(), "Logging to file");
        observability::spawn_log_pruning(config.logs_dir(), config.logging.retention.as_duration());
    }

    match cli.command {
        Commands::Upload(args) => {
            commands::upload(&config, &args.file, args.policy.into()).await
        }
        Commands::List => commands::list(&config),
        Commands::Clear(args) => commands::clear(&config, args.target),
        Commands::Version => commands::version(),
    }
}
