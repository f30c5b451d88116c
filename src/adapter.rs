//! Typed operation front-ends.
//!
//! Adapters serialize domain values at the API boundary, drive the builders,
//! and recover from the store failures that have a local answer: a failed
//! guard condition becomes a [`WriteOutcome`], a rejected document path
//! triggers the shift-up retry, and unprocessed batch items are requeued.

use crate::{error, request};

use serde::de::DeserializeOwned;

/// Batch delete front-end.
pub mod batch_delete;

/// Batch put front-end.
pub mod batch_put;

/// Delete front-end.
pub mod delete;

/// Get front-end.
pub mod get;

/// Put front-end.
pub mod put;

/// Query front-end.
pub mod query;

/// Update front-end.
pub mod update;

/// How a guarded write ended.
///
/// A failed guard condition is an expected outcome of optimistic writes, so
/// it is modelled here instead of as an error.
#[derive(Clone, Debug, PartialEq)]
pub enum WriteOutcome<T> {
    /// The write went through; carries the old item when it was requested.
    Applied(Option<T>),
    /// The guard condition did not hold and nothing was written.
    ConditionFailed,
}

impl<T> WriteOutcome<T> {
    /// Whether the write went through.
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }
}

pub(crate) fn deserialize_old<T: DeserializeOwned>(
    item: Option<request::Item>,
) -> error::Result<Option<T>> {
    item.map(serde_dynamo::from_item)
        .transpose()
        .map_err(Into::into)
}
