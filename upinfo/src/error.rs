use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures surfaced by the correlation pipeline.
///
/// Empty results are not failures; the reporter renders explicit empty-state
/// text for them instead.
#[derive(Debug, Error)]
pub enum Error {
    /// A package or advisory record that cannot be understood.
    #[error("malformed metadata record: {reason}")]
    Data { reason: String },

    /// The version comparator could not order two values. This is a
    /// data-integrity fault and is never retried.
    #[error("incomparable versions: {left} vs {right}")]
    Comparison { left: String, right: String },

    /// A glob pattern that does not compile.
    #[error("invalid pattern {pattern:?}: {reason}")]
    Pattern { pattern: String, reason: String },
}

impl Error {
    pub(crate) fn data(reason: impl Into<String>) -> Self {
        Error::Data {
            reason: reason.into(),
        }
    }
}
