//! Connection layer for the Elasticsearch scroll protocol
//!
//! This module provides the HTTP client speaking the three protocol calls the
//! export pipeline needs:
//! - open a scroll search over an index
//! - advance an existing scroll cursor
//! - clear a scroll cursor, releasing its server-side context
//!
//! Every response is decoded into a [`Page`] of [`Document`]s. Non-success
//! HTTP statuses and bodies that do not match the search response shape are
//! transport errors, which are fatal for the export.

use serde::Deserialize;
use serde_json::json;

use crate::error::{Result, TransportError};
use crate::export::{Document, Page};

/// The stored fields requested for every hit.
pub const EXPORT_FIELDS: [&str; 4] = ["url", "title", "description", "rawContent"];

/// HTTP client for an Elasticsearch index
///
/// Holds a pooled connection to the index for the lifetime of the export.
/// The scroll cursor itself is server-side state; releasing it is the
/// caller's job via [`EsClient::clear_scroll`].
#[derive(Debug, Clone)]
pub struct EsClient {
    /// Underlying HTTP client (connection pooling included)
    http: reqwest::Client,

    /// Base URL of the index host, scheme included, no trailing slash
    base_url: String,
}

impl EsClient {
    /// Create a new client for the given host
    ///
    /// # Arguments
    /// * `host` - Hostname and port, with or without an http(s) scheme
    ///
    /// # Returns
    /// * `Self` - New client instance
    pub fn new(host: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: normalize_base_url(host),
        }
    }

    /// Base URL this client talks to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issue the initial scroll search over an index
    ///
    /// Requests `page_size` hits carrying only the exported `_source` fields
    /// and establishes a scroll cursor valid for `window`.
    ///
    /// # Arguments
    /// * `index` - Index name to page through
    /// * `page_size` - Number of hits per page
    /// * `window` - Scroll validity window (e.g. "30s")
    ///
    /// # Returns
    /// * `Result<Page>` - First page of hits or transport error
    pub async fn open_scroll(&self, index: &str, page_size: u32, window: &str) -> Result<Page> {
        let url = format!("{}/{}/_search", self.base_url, index);
        let body = json!({
            "size": page_size,
            "_source": EXPORT_FIELDS,
        });

        let response = self
            .http
            .post(&url)
            .query(&[("scroll", window)])
            .json(&body)
            .send()
            .await?;

        Self::decode_page(response).await
    }

    /// Advance an existing scroll cursor
    ///
    /// Each successful advance refreshes the cursor's validity window.
    ///
    /// # Arguments
    /// * `scroll_id` - Continuation token from the previous page
    /// * `window` - Scroll validity window (e.g. "30s")
    ///
    /// # Returns
    /// * `Result<Page>` - Next page of hits (possibly empty) or transport error
    pub async fn continue_scroll(&self, scroll_id: &str, window: &str) -> Result<Page> {
        let url = format!("{}/_search/scroll", self.base_url);
        let body = json!({
            "scroll": window,
            "scroll_id": scroll_id,
        });

        let response = self.http.post(&url).json(&body).send().await?;
        Self::decode_page(response).await
    }

    /// Release a scroll cursor's server-side context
    ///
    /// # Arguments
    /// * `scroll_id` - Continuation token to release
    ///
    /// # Returns
    /// * `Result<()>` - Success or transport error
    pub async fn clear_scroll(&self, scroll_id: &str) -> Result<()> {
        let url = format!("{}/_search/scroll", self.base_url);
        let body = json!({ "scroll_id": [scroll_id] });

        let response = self.http.delete(&url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(TransportError::HttpStatus {
                status: status.as_u16(),
                detail: truncate_detail(&detail),
            }
            .into());
        }
        Ok(())
    }

    /// Decode an HTTP response into a page of hits
    async fn decode_page(response: reqwest::Response) -> Result<Page> {
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(TransportError::HttpStatus {
                status: status.as_u16(),
                detail: truncate_detail(&detail),
            }
            .into());
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| TransportError::MalformedResponse(e.to_string()))?;

        Ok(parsed.into_page())
    }
}

/// Prefix a bare `host:port` with `http://` and drop any trailing slash
fn normalize_base_url(host: &str) -> String {
    let trimmed = host.trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    }
}

/// Keep error bodies readable in log lines
fn truncate_detail(body: &str) -> String {
    const MAX: usize = 512;
    if body.len() <= MAX {
        body.to_string()
    } else {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    }
}

/* ========================= Wire types ========================= */

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(rename = "_scroll_id", default)]
    scroll_id: Option<String>,
    hits: HitsEnvelope,
}

#[derive(Debug, Deserialize)]
struct HitsEnvelope {
    /// Opaque total: an integer on older servers, `{value, relation}` on
    /// newer ones. Used only to seed progress reporting.
    #[serde(default)]
    total: Option<serde_json::Value>,
    hits: Vec<RawHit>,
}

#[derive(Debug, Deserialize)]
struct RawHit {
    #[serde(rename = "_source")]
    source: SourceFields,
}

#[derive(Debug, Deserialize)]
struct SourceFields {
    url: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(rename = "rawContent", default)]
    raw_content: String,
}

impl SearchResponse {
    fn into_page(self) -> Page {
        let total = parse_total(self.hits.total.as_ref());
        let documents = self
            .hits
            .hits
            .into_iter()
            .map(|hit| Document {
                url: hit.source.url,
                title: hit.source.title,
                description: hit.source.description,
                raw_content: hit.source.raw_content,
            })
            .collect();

        Page {
            documents,
            scroll_id: self.scroll_id,
            total,
        }
    }
}

fn parse_total(total: Option<&serde_json::Value>) -> Option<u64> {
    match total {
        Some(serde_json::Value::Number(n)) => n.as_u64(),
        Some(serde_json::Value::Object(map)) => map.get("value").and_then(|v| v.as_u64()),
        _ => None,
    }
}
