//! Scroll-cursor pagination over the search index
//!
//! [`ScrollStream`] wraps the scroll protocol behind the [`DocumentStream`]
//! interface: the first `next_page` opens the scroll, subsequent calls
//! advance it, and exhaustion is reported as `None` exactly once. The
//! server-side cursor context is released on every exit path: normal
//! exhaustion, explicit close, and fatal transport error alike.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::connection::EsClient;
use crate::error::Result;
use crate::export::Page;

/// Trait for paging through documents in batches
///
/// This is the seam between the coordinator and the search protocol; tests
/// drive the coordinator with mock streams.
#[async_trait]
pub trait DocumentStream: Send {
    /// Fetch the next page of documents
    ///
    /// # Returns
    /// * `Result<Option<Page>>` - Next page, or None once exhausted
    async fn next_page(&mut self) -> Result<Option<Page>>;

    /// Close the stream and release the cursor. Idempotent.
    async fn close(&mut self) -> Result<()>;
}

/// Transport operations a scroll stream needs from the protocol layer
///
/// [`EsClient`] is the production implementation.
#[async_trait]
pub trait ScrollTransport: Send + Sync {
    /// Issue the initial scroll query over an index
    async fn open(&self, index: &str, page_size: u32, window: &str) -> Result<Page>;

    /// Advance the cursor, refreshing its validity window
    async fn resume(&self, scroll_id: &str, window: &str) -> Result<Page>;

    /// Release the cursor's server-side context
    async fn clear(&self, scroll_id: &str) -> Result<()>;
}

#[async_trait]
impl ScrollTransport for EsClient {
    async fn open(&self, index: &str, page_size: u32, window: &str) -> Result<Page> {
        self.open_scroll(index, page_size, window).await
    }

    async fn resume(&self, scroll_id: &str, window: &str) -> Result<Page> {
        self.continue_scroll(scroll_id, window).await
    }

    async fn clear(&self, scroll_id: &str) -> Result<()> {
        self.clear_scroll(scroll_id).await
    }
}

/// Cursor-based document stream over a scroll transport
///
/// Pages are requested strictly sequentially; the stream never issues the
/// next advance before the caller has consumed the previous page. Once
/// exhausted it is terminal: no further advances are issued.
pub struct ScrollStream<T: ScrollTransport> {
    transport: T,
    index: String,
    page_size: u32,
    window: String,
    scroll_id: Option<String>,
    opened: bool,
    exhausted: bool,
    total_fetched: u64,
}

impl<T: ScrollTransport> ScrollStream<T> {
    /// Create a new scroll stream
    ///
    /// # Arguments
    /// * `transport` - Protocol client
    /// * `index` - Index name to page through
    /// * `page_size` - Hits requested per page
    /// * `window` - Scroll validity window (e.g. "30s")
    pub fn new(transport: T, index: &str, page_size: u32, window: &str) -> Self {
        Self {
            transport,
            index: index.to_string(),
            page_size,
            window: window.to_string(),
            scroll_id: None,
            opened: false,
            exhausted: false,
            total_fetched: 0,
        }
    }

    /// Release the server-side cursor context, best-effort
    async fn release_cursor(&mut self) {
        if let Some(id) = self.scroll_id.take() {
            if let Err(e) = self.transport.clear(&id).await {
                warn!("failed to clear scroll context: {e}");
            }
        }
    }

    /// Mark the stream exhausted and release its cursor
    async fn finish(&mut self) {
        self.exhausted = true;
        self.release_cursor().await;
    }
}

#[async_trait]
impl<T: ScrollTransport> DocumentStream for ScrollStream<T> {
    async fn next_page(&mut self) -> Result<Option<Page>> {
        if self.exhausted {
            return Ok(None);
        }

        let page = if !self.opened {
            self.opened = true;
            debug!("opening scroll over index \"{}\"", self.index);
            match self
                .transport
                .open(&self.index, self.page_size, &self.window)
                .await
            {
                Ok(page) => page,
                Err(e) => {
                    self.finish().await;
                    return Err(e);
                }
            }
        } else {
            // No continuation token means the protocol has no further
            // response to give; that is normal termination, not an error.
            let Some(id) = self.scroll_id.clone() else {
                self.exhausted = true;
                return Ok(None);
            };
            match self.transport.resume(&id, &self.window).await {
                Ok(page) => page,
                Err(e) => {
                    self.finish().await;
                    return Err(e);
                }
            }
        };

        if let Some(id) = page.scroll_id.clone() {
            self.scroll_id = Some(id);
        }

        if page.documents.is_empty() {
            debug!(
                "scroll over \"{}\" exhausted after {} documents",
                self.index, self.total_fetched
            );
            self.finish().await;
            return Ok(None);
        }

        self.total_fetched += page.documents.len() as u64;
        debug!(
            "fetched page of {} documents (total: {})",
            page.documents.len(),
            self.total_fetched
        );
        Ok(Some(page))
    }

    async fn close(&mut self) -> Result<()> {
        if !self.exhausted || self.scroll_id.is_some() {
            info!(
                "closing scroll over \"{}\" after {} documents",
                self.index, self.total_fetched
            );
        }
        self.finish().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::Document;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn doc(url: &str) -> Document {
        Document {
            url: url.to_string(),
            title: String::new(),
            description: String::new(),
            raw_content: String::new(),
        }
    }

    fn page(urls: &[&str], scroll_id: Option<&str>) -> Page {
        Page {
            documents: urls.iter().map(|u| doc(u)).collect(),
            scroll_id: scroll_id.map(str::to_string),
            total: None,
        }
    }

    /// Scripted transport: plays back a fixed sequence of pages and records
    /// how often each protocol call was made.
    struct ScriptedTransport {
        pages: Mutex<Vec<Result<Page>>>,
        opens: AtomicUsize,
        resumes: AtomicUsize,
        clears: AtomicUsize,
    }

    impl ScriptedTransport {
        fn new(pages: Vec<Result<Page>>) -> Self {
            let mut pages = pages;
            pages.reverse();
            Self {
                pages: Mutex::new(pages),
                opens: AtomicUsize::new(0),
                resumes: AtomicUsize::new(0),
                clears: AtomicUsize::new(0),
            }
        }

        fn next_scripted(&self) -> Result<Page> {
            self.pages
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Ok(page(&[], None)))
        }
    }

    #[async_trait]
    impl ScrollTransport for &ScriptedTransport {
        async fn open(&self, _index: &str, _page_size: u32, _window: &str) -> Result<Page> {
            self.opens.fetch_add(1, Ordering::SeqCst);
            self.next_scripted()
        }

        async fn resume(&self, _scroll_id: &str, _window: &str) -> Result<Page> {
            self.resumes.fetch_add(1, Ordering::SeqCst);
            self.next_scripted()
        }

        async fn clear(&self, _scroll_id: &str) -> Result<()> {
            self.clears.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_pages_then_exhaustion() {
        let transport = ScriptedTransport::new(vec![
            Ok(page(&["http://a.com/1", "http://a.com/2"], Some("c1"))),
            Ok(page(&["http://a.com/3"], Some("c2"))),
            Ok(page(&[], Some("c3"))),
        ]);
        let mut stream = ScrollStream::new(&transport, "crawl", 2, "30s");

        assert_eq!(stream.next_page().await.unwrap().unwrap().documents.len(), 2);
        assert_eq!(stream.next_page().await.unwrap().unwrap().documents.len(), 1);
        assert!(stream.next_page().await.unwrap().is_none());

        assert_eq!(transport.opens.load(Ordering::SeqCst), 1);
        assert_eq!(transport.resumes.load(Ordering::SeqCst), 2);
        // The empty page released the cursor context.
        assert_eq!(transport.clears.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_no_advance_after_exhaustion() {
        let transport = ScriptedTransport::new(vec![
            Ok(page(&["http://a.com/1"], Some("c1"))),
            Ok(page(&[], Some("c2"))),
        ]);
        let mut stream = ScrollStream::new(&transport, "crawl", 1, "30s");

        assert!(stream.next_page().await.unwrap().is_some());
        assert!(stream.next_page().await.unwrap().is_none());
        // Terminal: further calls never touch the transport again.
        assert!(stream.next_page().await.unwrap().is_none());
        assert!(stream.next_page().await.unwrap().is_none());

        assert_eq!(transport.resumes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_token_is_normal_termination() {
        let transport =
            ScriptedTransport::new(vec![Ok(page(&["http://a.com/1"], None))]);
        let mut stream = ScrollStream::new(&transport, "crawl", 1, "30s");

        assert!(stream.next_page().await.unwrap().is_some());
        assert!(stream.next_page().await.unwrap().is_none());
        assert_eq!(transport.resumes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_transport_error_is_fatal_and_releases_cursor() {
        let transport = ScriptedTransport::new(vec![
            Ok(page(&["http://a.com/1"], Some("c1"))),
            Err(crate::error::TransportError::RequestFailed("boom".to_string()).into()),
        ]);
        let mut stream = ScrollStream::new(&transport, "crawl", 1, "30s");

        assert!(stream.next_page().await.unwrap().is_some());
        assert!(stream.next_page().await.is_err());
        assert_eq!(transport.clears.load(Ordering::SeqCst), 1);
        // Fatal errors are terminal too.
        assert!(stream.next_page().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let transport =
            ScriptedTransport::new(vec![Ok(page(&["http://a.com/1"], Some("c1")))]);
        let mut stream = ScrollStream::new(&transport, "crawl", 1, "30s");

        assert!(stream.next_page().await.unwrap().is_some());
        stream.close().await.unwrap();
        stream.close().await.unwrap();
        assert_eq!(transport.clears.load(Ordering::SeqCst), 1);
    }
}
