use std::io::IsTerminal;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use intentgrep::{cli::CliApp, cli_types::CliArgs, CliConfig};

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();

    // Logs go to stderr so `--json` output stays machine-readable.
    let log_level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();

    match run(args).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: CliArgs) -> Result<u8> {
    let mut config = CliConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(theme) = args.theme {
        config.output.theme = theme;
    }

    let app = CliApp::new(config, args.verbose, !args.no_color);
    app.run(args).await
}
