use crate::transport;

/// Convenience alias for results produced by this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by builders, adapters, and the batch queue.
///
/// Conditional-check failures are deliberately absent: they are reported as
/// [`crate::adapter::WriteOutcome::ConditionFailed`], not as errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested index name is not present in the table schema.
    #[error("index `{index}` is not defined for table `{table}`")]
    UnknownIndex {
        /// The index name that failed to resolve.
        index: String,
        /// The table whose schema was consulted.
        table: String,
    },

    /// An item is missing one of the key attributes required by the schema.
    #[error("item is missing key attribute `{attribute}`")]
    MissingKeyAttribute {
        /// The absent key attribute name.
        attribute: String,
    },

    /// A sort key was supplied for a table whose schema has none.
    #[error("table `{table}` has no sort key")]
    NoSortKey {
        /// The table whose schema was consulted.
        table: String,
    },

    /// A query was built without any key condition.
    #[error("query requires at least one key condition")]
    MissingKeyCondition,

    /// A value could not be converted to or from the wire representation.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_dynamo::Error),

    /// A nested update was still rejected after the maximum number of
    /// path-shift retries.
    #[error("update rejected as structurally invalid after {attempts} path shift attempts")]
    PathShiftExhausted {
        /// Number of shift-and-resubmit rounds performed.
        attempts: u32,
    },

    /// A batch write hit its configured retry cap with items still
    /// unprocessed.
    #[error("batch write gave up after {attempts} retries with {remaining} items unprocessed")]
    BatchRetriesExhausted {
        /// Number of re-enqueue rounds performed.
        attempts: u32,
        /// Sub-requests the store never applied.
        remaining: usize,
    },

    /// Any store failure other than the ones recovered locally.
    #[error(transparent)]
    Transport(#[from] transport::TransportError),
}
