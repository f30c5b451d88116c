use crate::adapter::WriteOutcome;
use crate::builder::delete::DeleteBuilder;
use crate::expression::{condition, path};
use crate::{batch, error, request, schema, transport};

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::marker;

/// Deletes many items, picking the cheapest wire strategy.
///
/// Only the key attributes of each item travel on the wire. Plain deletes
/// ride the batch protocol; guard conditions and old-value returns switch
/// to one delete per item, concurrently, with positional outcomes.
#[derive(Debug)]
pub struct BatchDelete<'a, T> {
    schema: &'a schema::TableSchema,
    transport: &'a dyn transport::Transport,
    template: DeleteBuilder<'a>,
    has_condition: bool,
    items: Vec<request::Item>,
    return_old_values: bool,
    retry_limit: Option<u32>,
    marker: marker::PhantomData<T>,
}

impl<'a, T: Serialize + DeserializeOwned> BatchDelete<'a, T> {
    /// Start a batch delete against `schema` over `transport`.
    pub fn new(
        schema: &'a schema::TableSchema,
        transport: &'a dyn transport::Transport,
    ) -> Self {
        Self {
            schema,
            transport,
            template: DeleteBuilder::new(schema),
            has_condition: false,
            items: Vec::new(),
            return_old_values: false,
            retry_limit: None,
            marker: marker::PhantomData,
        }
    }

    /// Add items to delete, serialized at the boundary; repeatable.
    ///
    /// Anything beyond the key attributes is dropped before sending.
    pub fn items(mut self, items: &[T]) -> error::Result<Self> {
        for item in items {
            self.items.push(serde_dynamo::to_item(item)?);
        }
        Ok(self)
    }

    /// Guard every delete with a predicate on its stored item.
    pub fn when(
        mut self,
        path: impl Into<path::Path>,
        condition: condition::Condition,
    ) -> Self {
        self.template = self.template.condition(path, condition);
        self.has_condition = true;
        self
    }

    /// Add a further predicate joined with `AND`.
    pub fn and_when(
        mut self,
        path: impl Into<path::Path>,
        condition: condition::Condition,
    ) -> Self {
        self.template = self
            .template
            .joiner(condition::LogicalOperator::And)
            .condition(path, condition);
        self.has_condition = true;
        self
    }

    /// Add a further predicate joined with `OR`.
    pub fn or_when(
        mut self,
        path: impl Into<path::Path>,
        condition: condition::Condition,
    ) -> Self {
        self.template = self
            .template
            .joiner(condition::LogicalOperator::Or)
            .condition(path, condition);
        self.has_condition = true;
        self
    }

    /// Ask for each removed item in the outcomes.
    pub fn return_old_values(mut self) -> Self {
        self.return_old_values = true;
        self
    }

    /// Cap unprocessed-item retries on the batch protocol path.
    pub fn retry_limit(mut self, limit: u32) -> Self {
        self.retry_limit = Some(limit);
        self
    }

    /// Execute the deletes; outcomes are positional with the input items.
    pub async fn send(self) -> error::Result<Vec<WriteOutcome<T>>> {
        if self.has_condition || self.return_old_values {
            let mut requests = Vec::with_capacity(self.items.len());
            for item in &self.items {
                let key = self.schema.extract_key(item)?;
                let mut builder = self.template.clone();
                for (attribute, value) in key {
                    builder = builder.key(attribute, value);
                }
                requests.push(builder.return_old_values(self.return_old_values).build());
            }
            let transport = self.transport;
            let deletes = requests.into_iter().map(|request| async move {
                tracing::debug!(?request, "sending batched delete");
                match transport.delete_item(request).await {
                    Ok(old) => Ok(WriteOutcome::Applied(super::deserialize_old(old)?)),
                    Err(transport::TransportError::ConditionalCheckFailed) => {
                        Ok(WriteOutcome::ConditionFailed)
                    }
                    Err(other) => Err(other.into()),
                }
            });
            return futures::future::join_all(deletes).await.into_iter().collect();
        }

        let mut queue = batch::BatchRequestQueue::deletes(self.schema, self.items)?;
        if let Some(limit) = self.retry_limit {
            queue = queue.retry_limit(limit);
        }
        let applied = queue
            .drain(|request| self.transport.batch_write(request))
            .await?;
        Ok(applied
            .into_iter()
            .map(|_| WriteOutcome::Applied(None))
            .collect())
    }
}
