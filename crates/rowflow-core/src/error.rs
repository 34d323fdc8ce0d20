use thiserror::Error;

/// Canonical result for core.
pub type Result<T> = std::result::Result<T, Error>;

/// Type-erased error raised by caller-supplied code (capabilities and
/// renewable sources). The engine carries it through untouched so callers can
/// downcast back to their own error type.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Raised while building a graph or binding sources, before any data flows.
    #[error("Construction error: {0}")]
    Construction(String),

    #[error("column '{column}' not found in record")]
    MissingColumn { column: String },
}
