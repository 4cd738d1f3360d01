//! Error handling for the export pipeline.
//!
//! The error taxonomy mirrors the pipeline's blast radius:
//! - [`TransportError`]: any failure talking to the search index. Always fatal:
//!   the whole export aborts after the scroll cursor is released.
//! - [`SinkError`]: filesystem failure for one document. Always local: logged with
//!   the offending path, that document's task fails, siblings continue.
//! - [`ConfigError`]: rejected at startup, before any network traffic.
//!
//! An empty extraction result is *not* an error anywhere in this hierarchy;
//! it is the documented fallback path in the `extract` module.

pub mod kinds;

// Re-export commonly used types
pub use kinds::{ConfigError, Result, ScrollexError, SinkError, TransportError};
