//! pastegrab CLI entry point

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use pastegrab::cli::{
    app::{load_merged_config, run_capture, run_format, CaptureSettings, OutputOptions},
    args::{Cli, Commands},
    config_cmd::handle_config_command,
    presenter::Presenter,
    watch::run_watch,
    EXIT_ERROR, EXIT_USAGE_ERROR,
};
use pastegrab::domain::clipboard::CaptureRequest;
use pastegrab::domain::config::AppConfig;
use pastegrab::infrastructure::XdgConfigStore;

/// Environment variable holding the log filter
const LOG_ENV: &str = "PASTEGRAB_LOG";

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let presenter = Presenter::new();

    // Config management needs no browser
    let command = match cli.command {
        Commands::Config { action } => {
            let store = XdgConfigStore::new();
            if let Err(e) = handle_config_command(action, &store, &presenter).await {
                presenter.error(&e.to_string());
                return ExitCode::from(EXIT_ERROR);
            }
            return ExitCode::SUCCESS;
        }
        command => command,
    };

    let watch_interval = match &command {
        Commands::Watch { interval, .. } => interval.clone(),
        _ => None,
    };

    // Build CLI config from args
    let cli_config = AppConfig {
        browser_path: cli.browser.clone(),
        capture_timeout: cli.capture_timeout.clone(),
        interval: watch_interval,
        paste_modifier: cli.modifier.clone(),
        ..Default::default()
    };

    // Merge config
    let config = load_merged_config(cli_config).await;
    let settings = match CaptureSettings::from_config(&config) {
        Ok(settings) => settings,
        Err(e) => {
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_USAGE_ERROR);
        }
    };

    let plain = |json| OutputOptions {
        json,
        file_output: None,
    };

    // Route to appropriate handler
    match command {
        Commands::Types { json } => run_capture(CaptureRequest::Types, settings, plain(json)).await,
        Commands::Text { json } => {
            run_capture(CaptureRequest::PlainText, settings, plain(json)).await
        }
        Commands::Html { json } => run_capture(CaptureRequest::RichText, settings, plain(json)).await,
        Commands::File { output, json } => {
            let output = OutputOptions {
                json,
                file_output: output,
            };
            run_capture(CaptureRequest::File, settings, output).await
        }
        Commands::Format { name } => run_format(&name, settings).await,
        Commands::Watch { kind, json, .. } => run_watch(kind.into(), settings, json).await,
        Commands::Config { .. } => ExitCode::SUCCESS,
    }
}
