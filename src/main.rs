// src/main.rs

use clap::Parser;
use log::LevelFilter;
use log4rs::{
    append::console::ConsoleAppender,
    append::file::FileAppender,
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
    Config,
};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use vista_sync::{
    export_snapshot, ApiConfig, AppError, Command, CommandLineInput, Phases, RetryPolicy,
    SyncConfig, SyncEngine, TokioPause, VistaHttpClient,
};

/// Sets up logging configuration.
fn setup_logging(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let log_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let log_file_path = std::env::temp_dir().join("vista_sync.log");
    if let Some(parent) = log_file_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let pattern = if verbose {
        "{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}"
    } else {
        "{m}{n}"
    };

    let stdout_appender = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(pattern)))
        .build();

    let file_appender = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} [{l}] {t} - {m}{n}",
        )))
        .build(&log_file_path)?;

    let config = Config::builder()
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(log_level)))
                .build("stdout", Box::new(stdout_appender)),
        )
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(LevelFilter::Debug)))
                .build("file", Box::new(file_appender)),
        )
        .build(
            Root::builder()
                .appender("stdout")
                .appender("file")
                .build(LevelFilter::Debug),
        )?;

    log4rs::init_config(config)?;
    log::debug!("Logging initialized. Log file: {}", log_file_path.display());
    Ok(())
}

/// Runs one or both sync phases against the configured API and store.
async fn execute_sync(cli: &CommandLineInput, phases: Phases) -> Result<(), AppError> {
    let config = SyncConfig::resolve(cli)?;
    log::debug!(
        "Listing endpoint {}, detail endpoint {}, store {}",
        config.api.listing_url,
        config.api.detail_url,
        config.store.url
    );

    let engine = SyncEngine::from_config(config)?;
    let report = engine.run(phases).await?;

    if report.has_failures() {
        log::warn!("Sync finished with failures; re-running converges on the same state");
    } else {
        log::info!("Sync finished");
    }
    Ok(())
}

/// Writes the CSV snapshot. Only the API settings are needed.
async fn execute_export(output: &Path) -> Result<(), AppError> {
    let config = ApiConfig::resolve()?;
    let transport = Arc::new(VistaHttpClient::new(config.timeout)?);
    let policy = RetryPolicy::new(config.max_attempts, Arc::new(TokioPause));

    let written = export_snapshot(transport, policy, &config, output).await?;
    if written > 0 {
        println!("✓ {} listing(s) saved to {}", written, output.display());
    } else {
        println!("No listings to save.");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CommandLineInput::parse();

    setup_logging(cli.verbose)?;
    cli.load_env_file()?;

    let result = match cli.command() {
        Command::Sync => execute_sync(&cli, Phases::All).await,
        Command::Listings => execute_sync(&cli, Phases::ListingsOnly).await,
        Command::History => execute_sync(&cli, Phases::HistoryOnly).await,
        Command::Export { output } => execute_export(&output).await,
    };

    if let Err(e) = &result {
        log::error!("{}", e);
    }
    result?;

    Ok(())
}
