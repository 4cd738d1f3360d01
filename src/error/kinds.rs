use std::{fmt, io, path::PathBuf};

/// Crate-wide `Result` type using [`ScrollexError`] as the error.
///
/// This alias is re-exported by the parent `error` module and is intended
/// to be used throughout the crate for fallible operations.
pub type Result<T> = std::result::Result<T, ScrollexError>;

/// Top-level error type for scrollex operations.
///
/// This type wraps more specific error kinds and provides a single
/// error type that can be used throughout the crate.
#[derive(Debug)]
pub enum ScrollexError {
    /// Search-protocol transport errors. Always fatal for the export.
    Transport(TransportError),

    /// Per-document filesystem errors. Never fatal for sibling documents.
    Sink(SinkError),

    /// Configuration errors.
    Config(ConfigError),

    /// I/O errors.
    Io(io::Error),

    /// Generic error with a free-form message.
    Generic(String),
}

/// Transport-level errors from the search index protocol.
///
/// Any of these during scroll open or advance aborts the whole export;
/// there is deliberately no retry path.
#[derive(Debug)]
pub enum TransportError {
    /// Could not reach the index host.
    ConnectFailed(String),

    /// The request failed below the HTTP status layer.
    RequestFailed(String),

    /// The index answered with a non-success HTTP status.
    HttpStatus { status: u16, detail: String },

    /// The response body did not match the expected search/scroll shape.
    MalformedResponse(String),
}

/// Filesystem errors local to a single exported document.
#[derive(Debug)]
pub enum SinkError {
    /// Creating the parent directory chain for an output file failed.
    CreateDir { path: PathBuf, source: io::Error },

    /// Writing an output file failed.
    WriteFile { path: PathBuf, source: io::Error },
}

/// Configuration-specific errors.
#[derive(Debug)]
pub enum ConfigError {
    /// Config file not found.
    FileNotFound(String),

    /// Invalid config format.
    InvalidFormat(String),

    /// Missing required value.
    MissingValue(String),

    /// Invalid field value.
    InvalidValue { field: String, value: String },

    /// The article-body selector does not parse as a CSS selector.
    InvalidSelector(String),

    /// The scroll window is not a valid duration string (e.g. "30s").
    InvalidWindow(String),

    /// Generic configuration error.
    Generic(String),
}

/* ========================= Display & Error impls ========================= */

impl fmt::Display for ScrollexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScrollexError::Transport(e) => write!(f, "Transport error: {e}"),
            ScrollexError::Sink(e) => write!(f, "{e}"),
            ScrollexError::Config(e) => write!(f, "Configuration error: {e}"),
            ScrollexError::Io(e) => write!(f, "I/O error: {e}"),
            ScrollexError::Generic(msg) => write!(f, "{msg}"),
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::ConnectFailed(msg) => write!(f, "Failed to connect: {msg}"),
            TransportError::RequestFailed(msg) => write!(f, "Request failed: {msg}"),
            TransportError::HttpStatus { status, detail } => {
                write!(f, "Index returned HTTP {status}: {detail}")
            }
            TransportError::MalformedResponse(msg) => {
                write!(f, "Malformed response from index: {msg}")
            }
        }
    }
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkError::CreateDir { path, source } => {
                write!(f, "Failed to create directory \"{}\": {source}", path.display())
            }
            SinkError::WriteFile { path, source } => {
                write!(f, "Failed to write file \"{}\": {source}", path.display())
            }
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => write!(f, "Config file not found: {path}"),
            ConfigError::InvalidFormat(msg) => write!(f, "Invalid config format: {msg}"),
            ConfigError::MissingValue(what) => write!(f, "Missing required value: {what}"),
            ConfigError::InvalidValue { field, value } => {
                write!(f, "Invalid value '{value}' for field '{field}'")
            }
            ConfigError::InvalidSelector(msg) => {
                write!(f, "Invalid article body selector: {msg}")
            }
            ConfigError::InvalidWindow(value) => {
                write!(f, "Invalid scroll window '{value}' (expected e.g. \"30s\")")
            }
            ConfigError::Generic(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for ScrollexError {}
impl std::error::Error for TransportError {}
impl std::error::Error for SinkError {}
impl std::error::Error for ConfigError {}

/* ========================= Conversions to ScrollexError ========================= */

impl From<io::Error> for ScrollexError {
    fn from(err: io::Error) -> Self {
        ScrollexError::Io(err)
    }
}

impl From<TransportError> for ScrollexError {
    fn from(err: TransportError) -> Self {
        ScrollexError::Transport(err)
    }
}

impl From<SinkError> for ScrollexError {
    fn from(err: SinkError) -> Self {
        ScrollexError::Sink(err)
    }
}

impl From<ConfigError> for ScrollexError {
    fn from(err: ConfigError) -> Self {
        ScrollexError::Config(err)
    }
}

impl From<reqwest::Error> for ScrollexError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_connect() {
            TransportError::ConnectFailed(err.to_string())
        } else if err.is_decode() {
            TransportError::MalformedResponse(err.to_string())
        } else {
            TransportError::RequestFailed(err.to_string())
        };
        ScrollexError::Transport(kind)
    }
}

impl From<String> for ScrollexError {
    fn from(msg: String) -> Self {
        ScrollexError::Generic(msg)
    }
}

impl From<&str> for ScrollexError {
    fn from(msg: &str) -> Self {
        ScrollexError::Generic(msg.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_display() {
        let err = ScrollexError::Transport(TransportError::HttpStatus {
            status: 503,
            detail: "no shard available".to_string(),
        });
        let msg = err.to_string();
        assert!(msg.contains("503"));
        assert!(msg.contains("no shard available"));
    }

    #[test]
    fn test_sink_error_names_path() {
        let err = ScrollexError::Sink(SinkError::WriteFile {
            path: PathBuf::from("output/idx/a.com/x.html"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        });
        let msg = err.to_string();
        assert!(msg.contains("a.com/x.html"));
        assert!(msg.contains("denied"));
    }

    #[test]
    fn test_config_error_conversion() {
        let err: ScrollexError = ConfigError::InvalidWindow("forever".to_string()).into();
        assert!(matches!(err, ScrollexError::Config(_)));
        assert!(err.to_string().contains("forever"));
    }
}
