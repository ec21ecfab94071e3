use thiserror::Error;

/// Enumerates the ways a transform query can fail.
#[derive(Clone, Debug, Error)]
#[non_exhaustive]
pub enum TfError {
    /// A frame named in the query is unknown, or the walk ran past the depth
    /// bound because the tree contains a loop.
    #[error("tf_graph: lookup error, {0}")]
    LookupError(String),
    /// Both frames exist but their ancestor chains never meet (disconnected
    /// trees), or no common time could be found for a latest-data lookup.
    #[error("tf_graph: connectivity error, {0}")]
    ConnectivityError(String),
    /// The chain is connected but at least one sample lies outside the
    /// permitted extrapolation window.
    #[error("tf_graph: extrapolation error, {0}")]
    ExtrapolationError(String),
    /// The shared graph lock was poisoned by a panicking writer.
    #[error("tf_graph: could not acquire the graph lock")]
    CouldNotAcquireLock,
}
