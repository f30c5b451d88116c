use crate::adapter::WriteOutcome;
use crate::builder::put::PutBuilder;
use crate::expression::{condition, path};
use crate::{batch, error, request, schema, transport};

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::marker;

/// Stores many items, picking the cheapest wire strategy.
///
/// Plain puts ride the batch protocol in chunks of
/// [`batch::MAX_BATCH_SIZE`]. Guard conditions and old-value returns are not
/// expressible there, so when either is requested every item is written
/// through its own put, in flight concurrently, and the outcomes stay
/// positional with the input.
#[derive(Debug)]
pub struct BatchPut<'a, T> {
    schema: &'a schema::TableSchema,
    transport: &'a dyn transport::Transport,
    template: PutBuilder<'a>,
    items: Vec<request::Item>,
    return_old_values: bool,
    retry_limit: Option<u32>,
    marker: marker::PhantomData<T>,
}

impl<'a, T: Serialize + DeserializeOwned> BatchPut<'a, T> {
    /// Start a batch put against `schema` over `transport`.
    pub fn new(
        schema: &'a schema::TableSchema,
        transport: &'a dyn transport::Transport,
    ) -> Self {
        Self {
            schema,
            transport,
            template: PutBuilder::new(schema),
            items: Vec::new(),
            return_old_values: false,
            retry_limit: None,
            marker: marker::PhantomData,
        }
    }

    /// Add items to store, serialized at the boundary; repeatable.
    pub fn items(mut self, items: &[T]) -> error::Result<Self> {
        for item in items {
            self.items.push(serde_dynamo::to_item(item)?);
        }
        Ok(self)
    }

    /// Guard every write with a predicate on its stored item.
    pub fn when(
        mut self,
        path: impl Into<path::Path>,
        condition: condition::Condition,
    ) -> Self {
        self.template = self.template.condition(path, condition);
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
        self
    }

    /// Ask for each replaced item in the outcomes.
    pub fn return_old_values(mut self) -> Self {
        self.return_old_values = true;
        self
    }

    /// Cap unprocessed-item retries on the batch protocol path.
    pub fn retry_limit(mut self, limit: u32) -> Self {
        self.retry_limit = Some(limit);
        self
    }

    /// Execute the writes; outcomes are positional with the input items.
    pub async fn send(self) -> error::Result<Vec<WriteOutcome<T>>> {
        if self.template.has_condition() || self.return_old_values {
            let transport = self.transport;
            let template = self.template;
            let return_old_values = self.return_old_values;
            let writes = self.items.into_iter().map(|item| {
                let request = template
                    .clone()
                    .item(item)
                    .return_old_values(return_old_values)
                    .build();
                async move {
                    tracing::debug!(?request, "sending batched put");
                    match transport.put_item(request).await {
                        Ok(old) => Ok(WriteOutcome::Applied(super::deserialize_old(old)?)),
                        Err(transport::TransportError::ConditionalCheckFailed) => {
                            Ok(WriteOutcome::ConditionFailed)
                        }
                        Err(other) => Err(other.into()),
                    }
                }
            });
            return futures::future::join_all(writes).await.into_iter().collect();
        }

        let mut queue = batch::BatchRequestQueue::puts(self.schema, self.items);
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

#[cfg(test)]
mod tests {
    use super::*;

    use crate::expression::condition::Condition;
    use crate::transport::stub::{Call, Reply, StubTransport};
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq, Serialize)]
    struct Order {
        order_id: String,
        status: String,
    }

    fn schema() -> schema::TableSchema {
        schema::TableSchema::new("orders", "order_id")
    }

    fn orders(count: usize) -> Vec<Order> {
        (0..count)
            .map(|id| Order {
                order_id: format!("o-{id}"),
                status: "open".to_string(),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_plain_puts_ride_the_batch_protocol() {
        let schema = schema();
        let transport = StubTransport::new([
            Reply::Batch(Ok(request::BatchWriteResponse::default())),
            Reply::Batch(Ok(request::BatchWriteResponse::default())),
        ]);
        let outcomes = BatchPut::new(&schema, &transport)
            .items(&orders(27))
            .unwrap()
            .send()
            .await
            .unwrap();
        assert_eq!(outcomes.len(), 27);
        assert!(outcomes.iter().all(WriteOutcome::is_applied));

        let calls = transport.calls();
        assert_eq!(calls.len(), 2);
        let Call::BatchWrite(first) = &calls[0] else {
            panic!("expected a batch write call");
        };
        assert_eq!(first.entries.len(), batch::MAX_BATCH_SIZE);
        let Call::BatchWrite(second) = &calls[1] else {
            panic!("expected a batch write call");
        };
        assert_eq!(second.entries.len(), 2);
    }

    #[tokio::test]
    async fn test_conditions_switch_to_individual_puts() {
        let schema = schema();
        let transport = StubTransport::new([
            Reply::Item(Ok(None)),
            Reply::Item(Err(transport::TransportError::ConditionalCheckFailed)),
            Reply::Item(Ok(None)),
        ]);
        let outcomes = BatchPut::new(&schema, &transport)
            .items(&orders(3))
            .unwrap()
            .when("order_id", Condition::NotExists)
            .send()
            .await
            .unwrap();
        assert_eq!(
            outcomes,
            vec![
                WriteOutcome::Applied(None),
                WriteOutcome::ConditionFailed,
                WriteOutcome::Applied(None),
            ]
        );

        let calls = transport.calls();
        assert_eq!(calls.len(), 3);
        assert!(calls.iter().all(|call| matches!(call, Call::Put(request)
            if request.condition_expression.is_some())));
    }

    #[tokio::test]
    async fn test_old_value_requests_switch_to_individual_puts() {
        let schema = schema();
        let transport = StubTransport::new([Reply::Item(Ok(None))]);
        BatchPut::<Order>::new(&schema, &transport)
            .items(&orders(1))
            .unwrap()
            .return_old_values()
            .send()
            .await
            .unwrap();
        let calls = transport.calls();
        assert!(matches!(&calls[0], Call::Put(request) if request.return_old_values));
    }
}
