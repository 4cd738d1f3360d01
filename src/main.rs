//! scrollex - Elasticsearch crawl export tool
//!
//! Pages through an Elasticsearch index with a scroll cursor and writes one
//! file per document under `<output>/<index>/`, extracting the article body
//! with a configurable CSS selector and falling back to the raw HTML when
//! the selector matches nothing.
//!
//! # Usage
//!
//! ```bash
//! scrollex --index crawled_pages --articleBodySelector "#article"
//! ```

use std::sync::Arc;

use scraper::Selector;
use tokio_util::sync::CancellationToken;
use tracing::Level;

mod cli;
mod config;
mod connection;
mod error;
mod export;
mod extract;
mod sink;

use cli::CliInterface;
use connection::EsClient;
use error::{ConfigError, Result};
use export::{DocumentExporter, ExportCoordinator, ExportQueue, ExportReport, ProgressTracker, ScrollStream};
use sink::{CollisionPolicy, FsSink};

/// Application entry point
#[tokio::main]
async fn main() {
    match run().await {
        Ok(Some(report)) if report.cancelled => {
            eprintln!("Export interrupted.");
            std::process::exit(130);
        }
        Ok(_) => {}
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Main application logic
///
/// 1. Parse command-line arguments and load configuration
/// 2. Initialize logging
/// 3. Handle subcommands (version, completion, config)
/// 4. Run the export pipeline
///
/// # Returns
/// * `Result<Option<ExportReport>>` - Report of the run, None for subcommands
async fn run() -> Result<Option<ExportReport>> {
    let cli = CliInterface::new()?;

    initialize_logging(&cli);

    if cli.handle_subcommand().await? {
        return Ok(None);
    }

    cli.print_banner();

    let report = run_export(&cli).await?;
    print_summary(&cli, &report);
    Ok(Some(report))
}

/// Wire up and execute the export pipeline
async fn run_export(cli: &CliInterface) -> Result<ExportReport> {
    let config = cli.config();
    let index = cli.index()?;

    // Validated at startup already; parse once for the pipeline's use.
    let body_selector = Selector::parse(&config.export.article_body_selector)
        .map_err(|e| ConfigError::InvalidSelector(e.to_string()))?;

    let client = EsClient::new(&config.connection.host);
    let stream = ScrollStream::new(
        client,
        index,
        config.export.page_size,
        &config.connection.scroll_window,
    );

    let collision_policy = if config.output.overwrite {
        CollisionPolicy::Overwrite
    } else {
        CollisionPolicy::Skip
    };
    let fs_sink = Arc::new(FsSink::new(&config.output.directory, index, collision_policy));
    let exporter = Arc::new(DocumentExporter::new(body_selector, fs_sink));

    let tracker = Arc::new(ProgressTracker::new(None, !cli.args().quiet));
    let queue = ExportQueue::new(config.export.concurrency, exporter, Some(tracker.clone()));

    let cancel_token = CancellationToken::new();
    let signal_token = cancel_token.clone();
    let ctrl_c_handle = tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => signal_token.cancel(),
            Err(err) => eprintln!("Failed to listen for Ctrl+C: {}", err),
        }
    });

    let mut coordinator = ExportCoordinator::new(Box::new(stream), queue, tracker)
        .with_cancellation(cancel_token);
    let result = coordinator.execute().await;

    ctrl_c_handle.abort();
    result
}

/// Print the end-of-run summary
fn print_summary(cli: &CliInterface, report: &ExportReport) {
    if cli.args().quiet {
        return;
    }

    println!(
        "Exported {} document(s) in {} page(s) ({} ms)",
        report.documents_exported, report.pages_fetched, report.elapsed_ms
    );
    if report.documents_skipped > 0 {
        println!("Skipped {} existing file(s)", report.documents_skipped);
    }
    if report.documents_failed > 0 {
        println!("Failed to export {} document(s), see log for details", report.documents_failed);
    }
}

/// Initialize logging system based on verbosity level
///
/// # Arguments
/// * `cli` - CLI interface with verbosity settings
fn initialize_logging(cli: &CliInterface) {
    let level = if cli.args().very_verbose {
        Level::TRACE
    } else if cli.args().verbose {
        Level::DEBUG
    } else {
        cli.config().logging.level.to_tracing_level()
    };

    // Build subscriber with level filter
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false);

    // Configure timestamps
    if cli.config().logging.timestamps {
        subscriber.init();
    } else {
        subscriber.without_time().init();
    }
}
