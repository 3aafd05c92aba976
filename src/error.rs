//! Error type shared by every module.
//!
//! Generation failures wrap their underlying cause so callers can surface a
//! single message while the log keeps the full chain.

use std::io;

use thiserror::Error;

/// Unified error for the dashboard.
#[derive(Error, Debug)]
pub enum Error {
    /// Terminal or file I/O.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Malformed settings file.
    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    /// JSON encoding or decoding.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Transport or HTTP status failure talking to the text-generation service.
    #[error("HTTP error: {0}")]
    Http(#[from] Box<ureq::Error>),

    /// Historical lookback window that is zero, negative or not finite.
    #[error("invalid lookback window: {0} hours")]
    InvalidWindow(f64),

    /// Latency range with a non-positive floor or an empty span.
    #[error("invalid latency range: {0}..{1} ms")]
    InvalidRange(f64, f64),

    /// Provider name not recognised.
    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    /// The service answered without any candidate text.
    #[error("empty response from text-generation service")]
    EmptyResponse,

    /// A background worker exited before delivering its result.
    #[error("worker stopped without a result")]
    WorkerStopped,

    /// A text-generation flow failed; `source` holds the underlying cause.
    #[error("failed to {flow}: {source}")]
    Generation {
        flow: &'static str,
        #[source]
        source: Box<Error>,
    },
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        Error::Http(Box::new(err))
    }
}

impl Error {
    /// Wrap `self` as the cause of a failed generation flow.
    pub fn in_flow(self, flow: &'static str) -> Self {
        Error::Generation {
            flow,
            source: Box::new(self),
        }
    }
}

/// Crate-wide `Result` alias defaulting to [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;
