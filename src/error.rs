/// Errors produced by [`LfuStore`](crate::LfuStore).
///
/// Lookups that miss are not errors; they return `None`.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The store was constructed with a negative capacity.
    #[error("capacity must be non-negative, got {0}")]
    NegativeCapacity(i64),

    /// An internal index disagrees with another. Only reported by
    /// [`LfuStore::check_invariants`](crate::LfuStore::check_invariants).
    #[error("invariant violated: {0}")]
    Invariant(String),
}

impl Error {
    pub(crate) fn invariant(msg: impl Into<String>) -> Self {
        Self::Invariant(msg.into())
    }
}

/// Result type alias used throughout this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
