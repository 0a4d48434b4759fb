//! Error taxonomy for the sampling engine.

use std::io;

use thiserror::Error;

/// Errors surfaced by counter probes and the [`Sampler`](crate::Sampler).
///
/// The acquisition variants (`Acquire`, `Malformed`) are fatal to the
/// current tick only: the caller logs them, skips the cycle, and retries on
/// the next tick. `NotReady` and `Exhausted` are protocol errors from
/// calling [`top`](crate::Sampler::top) at the wrong moment.
#[derive(Debug, Error)]
pub enum SampleError {
    /// The counter interface could not be read at all.
    #[error("reading {path}: {source}")]
    Acquire {
        /// Path of the counter interface, e.g. `/proc/stat`.
        path: String,
        #[source]
        source: io::Error,
    },

    /// The counter interface produced text we could not parse.
    #[error("malformed {what} data: {line:?}")]
    Malformed {
        /// Which interface the text came from.
        what: &'static str,
        /// The offending line.
        line: String,
    },

    /// Rates requested before two snapshots exist.
    #[error("not ready: two samples are needed before rates exist")]
    NotReady,

    /// The ranking for the current cycle was already consumed.
    #[error("ranking exhausted: call sample() again before top()")]
    Exhausted,
}

impl SampleError {
    pub(crate) fn acquire(path: impl Into<String>, source: io::Error) -> Self {
        SampleError::Acquire {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn malformed(what: &'static str, line: impl Into<String>) -> Self {
        SampleError::Malformed {
            what,
            line: line.into(),
        }
    }
}
