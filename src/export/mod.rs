//! Export pipeline for streaming documents out of a search index
//!
//! The pipeline is built from four components:
//!
//! 1. **DocumentStream** (`scroll`): pages through the index with a scroll
//!    cursor, one page at a time, strictly sequentially
//! 2. **ExportQueue** (`queue`): bounded-concurrency workers turning each
//!    document into a file, with drain-event signalling
//! 3. **ProgressTracker** (`progress`): real-time feedback for the user
//! 4. **ExportCoordinator** (`coordinator`): owns the two completion
//!    conditions (cursor exhausted, queue drained) and decides termination
//!
//! Documents flow producer → queue → worker by ownership transfer; nothing
//! mutates a document after it has been handed off.

pub mod coordinator;
pub mod progress;
pub mod queue;
pub mod scroll;

pub use coordinator::{ExportCoordinator, ExportReport};
pub use progress::ProgressTracker;
pub use queue::{DocumentProcessor, ExportQueue};
pub use scroll::{DocumentStream, ScrollStream};

use std::sync::Arc;

use async_trait::async_trait;
use scraper::Selector;
use tracing::debug;

use crate::error::Result;
use crate::extract::{self, ExtractedContent};
use crate::sink::{ContentSink, WriteOutcome};

/// One document retrieved from the search index
///
/// Immutable once retrieved; owned exclusively by whichever pipeline stage
/// is currently processing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Source URL; also determines the output path
    pub url: String,
    /// Page title as stored in the index
    pub title: String,
    /// Page description as stored in the index
    pub description: String,
    /// The stored raw HTML
    pub raw_content: String,
}

/// One page of hits produced by a cursor advance
#[derive(Debug, Clone)]
pub struct Page {
    /// Hits in index order
    pub documents: Vec<Document>,
    /// Continuation token for the next advance, when the server supplied one
    pub scroll_id: Option<String>,
    /// Index-reported result total, when parseable; seeds progress reporting
    pub total: Option<u64>,
}

/// Production document processor: extract, compose, persist
///
/// Applies the fallback policy per document: when the body selector yields
/// nothing, the raw HTML is written unmodified instead of a wrapped
/// fragment document.
pub struct DocumentExporter {
    /// Parsed article-body selector (validated at startup)
    body_selector: Selector,

    /// Destination for extracted content
    sink: Arc<dyn ContentSink>,
}

impl DocumentExporter {
    /// Create a new exporter
    ///
    /// # Arguments
    /// * `body_selector` - Parsed selector for the article body
    /// * `sink` - Destination sink
    pub fn new(body_selector: Selector, sink: Arc<dyn ContentSink>) -> Self {
        Self {
            body_selector,
            sink,
        }
    }
}

#[async_trait]
impl DocumentProcessor for DocumentExporter {
    async fn process(&self, document: Document) -> Result<WriteOutcome> {
        let content = match extract::extract(&document.raw_content, &self.body_selector) {
            ExtractedContent::Fragment { head, body } => extract::compose_document(&head, &body),
            ExtractedContent::RawFallback => {
                debug!("no content found, falling back to full HTML: \"{}\"", document.url);
                document.raw_content.clone()
            }
        };

        self.sink.write(&document, &content).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{CollisionPolicy, FsSink};

    fn doc(url: &str, raw: &str) -> Document {
        Document {
            url: url.to_string(),
            title: String::new(),
            description: String::new(),
            raw_content: raw.to_string(),
        }
    }

    #[tokio::test]
    async fn test_exporter_writes_wrapped_fragment() {
        let dir = tempfile::tempdir().unwrap();
        let sink = Arc::new(FsSink::new(dir.path(), "idx", CollisionPolicy::Overwrite));
        let exporter = DocumentExporter::new(Selector::parse("#article").unwrap(), sink);

        let raw = "<html><head><title>T</title></head>\
                   <body><div id=\"article\"><p>hi</p></div></body></html>";
        exporter.process(doc("http://a.com/x", raw)).await.unwrap();

        let written = std::fs::read_to_string(dir.path().join("idx/a.com/x.html")).unwrap();
        assert!(written.starts_with("<html>\n<head>"));
        assert!(written.contains("<title>T</title>"));
        assert!(written.contains("<p>hi</p>"));
        assert!(!written.contains("id=\"article\""));
    }

    #[tokio::test]
    async fn test_exporter_falls_back_to_raw_html() {
        let dir = tempfile::tempdir().unwrap();
        let sink = Arc::new(FsSink::new(dir.path(), "idx", CollisionPolicy::Overwrite));
        let exporter = DocumentExporter::new(Selector::parse("#missing").unwrap(), sink);

        let raw = "<html><body><p>unwrapped</p></body></html>";
        exporter.process(doc("http://a.com/y", raw)).await.unwrap();

        let written = std::fs::read_to_string(dir.path().join("idx/a.com/y.html")).unwrap();
        assert_eq!(written, raw);
    }
}
