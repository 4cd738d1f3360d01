//! Filesystem sink for exported documents
//!
//! Maps each document's source URL to a deterministic relative path under
//! `<output_root>/<index>/` and persists the extracted content there,
//! creating parent directories as needed.
//!
//! The path derivation carries a deliberate quirk from the tool this format
//! is compatible with: only the *first* occurrence of `?`, `=` or `&` in the
//! whole URL is replaced with `-`. Downstream consumers depend on the
//! resulting layout, so this must not be "fixed" into a global replace.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::error::{Result, SinkError};
use crate::export::Document;

/// Terminal outcome of persisting one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Content was written to the given path (truncating prior content)
    Written(PathBuf),

    /// A file already existed at the derived path and the sink is
    /// configured not to clobber it
    SkippedExisting(PathBuf),
}

/// What to do when two documents derive the same output path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollisionPolicy {
    /// Truncate and rewrite; last writer wins
    #[default]
    Overwrite,

    /// Leave the existing file untouched and skip the document
    Skip,
}

/// Sink abstraction for persisting extracted content
///
/// The production implementation is [`FsSink`]; tests instrument this seam
/// with counting stubs.
#[async_trait]
pub trait ContentSink: Send + Sync {
    /// Persist content for one document
    ///
    /// # Arguments
    /// * `document` - The document being exported (its URL names the file)
    /// * `content` - The content to persist
    ///
    /// # Returns
    /// * `Result<WriteOutcome>` - Outcome or per-document sink error
    async fn write(&self, document: &Document, content: &str) -> Result<WriteOutcome>;
}

/// Filesystem implementation of [`ContentSink`]
#[derive(Debug, Clone)]
pub struct FsSink {
    /// Directory all derived paths resolve under (`<output_root>/<index>`)
    root: PathBuf,

    /// Collision handling for already-existing files
    policy: CollisionPolicy,
}

impl FsSink {
    /// Create a sink rooted at `<output_root>/<index>`
    ///
    /// # Arguments
    /// * `output_root` - Configured output directory
    /// * `index` - Name of the index being exported
    /// * `policy` - Collision handling for existing files
    pub fn new(output_root: &Path, index: &str, policy: CollisionPolicy) -> Self {
        Self {
            root: output_root.join(index),
            policy,
        }
    }

    /// Directory this sink writes under
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl ContentSink for FsSink {
    async fn write(&self, document: &Document, content: &str) -> Result<WriteOutcome> {
        let relative = derive_relative_path(&document.url);
        let path = self.root.join(&relative);

        if self.policy == CollisionPolicy::Skip && path.exists() {
            debug!("skipping existing file \"{}\"", path.display());
            return Ok(WriteOutcome::SkippedExisting(path));
        }

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|source| {
                SinkError::CreateDir {
                    path: parent.to_path_buf(),
                    source,
                }
            })?;
        }

        debug!("writing \"{}\"", path.display());

        tokio::fs::write(&path, content)
            .await
            .map_err(|source| SinkError::WriteFile {
                path: path.clone(),
                source,
            })?;

        Ok(WriteOutcome::Written(path))
    }
}

/// Derive the relative output path for a document URL
///
/// Steps, in order:
/// 1. Strip a single trailing `/` if present.
/// 2. Remove the first occurrence of `http://` or `https://`.
/// 3. Replace the first occurrence of any of `?`, `=`, `&` with `-`,
///    first match only across the whole string.
/// 4. Append `.html`.
///
/// This is a pure function; identical URLs always derive identical paths.
pub fn derive_relative_path(url: &str) -> String {
    let mut name = if let Some(stripped) = url.strip_suffix('/') {
        stripped.to_string()
    } else {
        url.to_string()
    };

    let scheme = ["https://", "http://"]
        .iter()
        .filter_map(|s| name.find(s).map(|pos| (pos, s.len())))
        .min_by_key(|(pos, _)| *pos);
    if let Some((pos, len)) = scheme {
        name.replace_range(pos..pos + len, "");
    }

    if let Some(pos) = name.find(['?', '=', '&']) {
        name.replace_range(pos..pos + 1, "-");
    }

    name.push_str(".html");
    name
}
