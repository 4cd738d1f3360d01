//! Scrollex Library
//!
//! This library provides the core functionality for scrollex, a tool that
//! exports crawled HTML documents from an Elasticsearch index to files on
//! disk. It can be used as a standalone library to build export pipelines.
//!
//! # Modules
//!
//! - `cli`: Command-line interface and argument parsing
//! - `config`: Configuration management
//! - `connection`: Elasticsearch scroll protocol client
//! - `error`: Error types and handling
//! - `export`: Scroll stream, work queue and coordinator
//! - `extract`: HTML fragment extraction
//! - `sink`: Path derivation and filesystem persistence
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use scrollex::connection::EsClient;
//! use scrollex::export::{DocumentExporter, ExportCoordinator, ExportQueue, ProgressTracker, ScrollStream};
//! use scrollex::sink::{CollisionPolicy, FsSink};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = EsClient::new("localhost:9200");
//!     let stream = ScrollStream::new(client, "crawled_pages", 20, "30s");
//!
//!     let sink = Arc::new(FsSink::new(
//!         std::path::Path::new("./output"),
//!         "crawled_pages",
//!         CollisionPolicy::Overwrite,
//!     ));
//!     let selector = scraper::Selector::parse("body").map_err(|e| e.to_string())?;
//!     let exporter = Arc::new(DocumentExporter::new(selector, sink));
//!
//!     let tracker = Arc::new(ProgressTracker::new(None, false));
//!     let queue = ExportQueue::new(5, exporter, Some(tracker.clone()));
//!
//!     let mut coordinator = ExportCoordinator::new(Box::new(stream), queue, tracker);
//!     let report = coordinator.execute().await?;
//!     println!("Exported {} documents", report.documents_exported);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod connection;
pub mod error;
pub mod export;
pub mod extract;
pub mod sink;

// Re-export commonly used types
pub use config::Config;
pub use connection::EsClient;
pub use error::{Result, ScrollexError};
pub use export::{Document, ExportCoordinator, ExportQueue, ExportReport, Page, ScrollStream};
pub use extract::ExtractedContent;
pub use sink::{ContentSink, FsSink, WriteOutcome};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library version string
///
/// # Returns
/// * `&str` - Version string
pub fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
