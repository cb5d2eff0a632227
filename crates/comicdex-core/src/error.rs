use thiserror::Error;

/// The error kinds that cross core service boundaries.
///
/// Stores and the upstream client collapse their low-level failures into
/// [`Error::Internal`] at the point they're raised (plus a log line); the
/// HTTP layer is the only place that maps these back to status codes.
#[derive(Debug, Error)]
pub enum Error {
    /// The upstream has no such comic. Never surfaced past the `Updater` -
    /// it's the corpus terminator, not a failure.
    #[error("comic not found")]
    NotFound,

    /// A transient upstream or store failure. Fatal to the current update.
    #[error("transient failure: {0}")]
    Transient(String),

    /// Single-flight rejected a concurrent `Update` call.
    #[error("update already in progress")]
    UpdateInProgress,

    /// Login failed: unknown user or wrong password.
    #[error("wrong credentials")]
    WrongCredentials,

    /// The bearer token failed to verify (bad signature, expired, malformed).
    #[error("bad token")]
    BadToken,

    /// The scan or update was cancelled or exceeded its deadline.
    #[error("cancelled")]
    Cancelled,

    /// Unclassified internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn internal(err: impl std::fmt::Display) -> Self {
        Error::Internal(err.to_string())
    }

    pub fn transient(err: impl std::fmt::Display) -> Self {
        Error::Transient(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
