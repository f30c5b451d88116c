//! Chunked batch writes with unprocessed-item requeueing.

use crate::{error, request, schema, transport};

use std::collections::VecDeque;
use std::future::Future;

/// Maximum sub-requests per batch round trip, a protocol limit.
pub const MAX_BATCH_SIZE: usize = 25;

/// FIFO queue of batch chunks against one table.
///
/// Entries are split into chunks of at most [`MAX_BATCH_SIZE`] up front.
/// Chunks are submitted in order, and sub-requests the store reports as
/// unprocessed are re-enqueued as a new tail chunk instead of being retried
/// in place.
#[derive(Debug)]
pub struct BatchRequestQueue {
    table_name: String,
    chunks: VecDeque<Vec<request::BatchEntry>>,
    retry_limit: Option<u32>,
}

impl BatchRequestQueue {
    /// Queue a put sub-request per item.
    pub fn puts(schema: &schema::TableSchema, items: Vec<request::Item>) -> Self {
        Self::from_entries(
            schema,
            items.into_iter().map(request::BatchEntry::Put).collect(),
        )
    }

    /// Queue a delete sub-request per item, keeping only the key attributes.
    pub fn deletes(
        schema: &schema::TableSchema,
        items: Vec<request::Item>,
    ) -> error::Result<Self> {
        let entries = items
            .iter()
            .map(|item| Ok(request::BatchEntry::Delete(schema.extract_key(item)?)))
            .collect::<error::Result<Vec<_>>>()?;
        Ok(Self::from_entries(schema, entries))
    }

    fn from_entries(
        schema: &schema::TableSchema,
        entries: Vec<request::BatchEntry>,
    ) -> Self {
        let chunks = entries
            .chunks(MAX_BATCH_SIZE)
            .map(<[request::BatchEntry]>::to_vec)
            .collect();
        Self {
            table_name: schema.table_name.clone(),
            chunks,
            retry_limit: None,
        }
    }

    /// Cap how many times unprocessed items may be re-enqueued.
    ///
    /// Unlimited by default, matching the store's own guidance to keep
    /// resubmitting unprocessed items.
    pub fn retry_limit(mut self, limit: u32) -> Self {
        self.retry_limit = Some(limit);
        self
    }

    /// Submit every chunk in order, returning the applied sub-requests.
    ///
    /// An entry counts as applied once a round trip does not list it among
    /// the unprocessed items.
    pub async fn drain<F, Fut>(
        mut self,
        mut submit: F,
    ) -> error::Result<Vec<request::BatchEntry>>
    where
        F: FnMut(request::BatchWriteRequest) -> Fut,
        Fut: Future<Output = Result<request::BatchWriteResponse, transport::TransportError>>,
    {
        let mut applied = Vec::new();
        let mut retries = 0;
        while let Some(entries) = self.chunks.pop_front() {
            let submitted = entries.clone();
            let response = submit(request::BatchWriteRequest {
                table_name: self.table_name.clone(),
                entries,
            })
            .await?;

            let unprocessed = response.unprocessed;
            let mut pending = unprocessed.clone();
            for entry in submitted {
                match pending.iter().position(|pending| *pending == entry) {
                    Some(position) => {
                        pending.remove(position);
                    }
                    None => applied.push(entry),
                }
            }
            if unprocessed.is_empty() {
                continue;
            }

            if self.retry_limit.is_some_and(|limit| retries >= limit) {
                let remaining = unprocessed.len()
                    + self.chunks.iter().map(Vec::len).sum::<usize>();
                return Err(error::Error::BatchRetriesExhausted {
                    attempts: retries,
                    remaining,
                });
            }
            retries += 1;
            tracing::debug!(
                requeued = unprocessed.len(),
                retries,
                "batch write left items unprocessed"
            );
            self.chunks.push_back(unprocessed);
        }
        Ok(applied)
    }
}
