use crate::adapter::WriteOutcome;
use crate::builder::delete::DeleteBuilder;
use crate::expression::{condition, path};
use crate::{error, schema, transport};

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::marker;

/// Deletes one item by primary key, optionally guarded by conditions.
#[derive(Debug)]
pub struct Delete<'a, T> {
    schema: &'a schema::TableSchema,
    transport: &'a dyn transport::Transport,
    builder: DeleteBuilder<'a>,
    marker: marker::PhantomData<T>,
}

impl<'a, T: DeserializeOwned> Delete<'a, T> {
    /// Start a delete against `schema` over `transport`.
    pub fn new(
        schema: &'a schema::TableSchema,
        transport: &'a dyn transport::Transport,
    ) -> Self {
        Self {
            schema,
            transport,
            builder: DeleteBuilder::new(schema),
            marker: marker::PhantomData,
        }
    }

    /// Partition key value of the item.
    pub fn key(mut self, value: impl Serialize) -> error::Result<Self> {
        let value = serde_dynamo::to_attribute_value(value)?;
        self.builder = self.builder.key(self.schema.partition_key.clone(), value);
        Ok(self)
    }

    /// Sort key value of the item, for tables with a composite key.
    pub fn sort_key(mut self, value: impl Serialize) -> error::Result<Self> {
        let Some(sort_key) = self.schema.sort_key.clone() else {
            return Err(error::Error::NoSortKey {
                table: self.schema.table_name.clone(),
            });
        };
        let value = serde_dynamo::to_attribute_value(value)?;
        self.builder = self.builder.key(sort_key, value);
        Ok(self)
    }

    /// Guard the delete with a predicate on the currently stored item.
    pub fn when(
        mut self,
        path: impl Into<path::Path>,
        condition: condition::Condition,
    ) -> Self {
        self.builder = self.builder.condition(path, condition);
        self
    }

    /// Add a further predicate joined with `AND`.
    pub fn and_when(
        mut self,
        path: impl Into<path::Path>,
        condition: condition::Condition,
    ) -> Self {
        self.builder = self
            .builder
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
        self.builder = self
            .builder
            .joiner(condition::LogicalOperator::Or)
            .condition(path, condition);
        self
    }

    /// Ask for the removed item in the outcome.
    pub fn return_old_values(mut self) -> Self {
        self.builder = self.builder.return_old_values(true);
        self
    }

    /// Execute the delete.
    pub async fn send(self) -> error::Result<WriteOutcome<T>> {
        let request = self.builder.build();
        tracing::debug!(?request, "sending delete");
        match self.transport.delete_item(request).await {
            Ok(old) => Ok(WriteOutcome::Applied(super::deserialize_old(old)?)),
            Err(transport::TransportError::ConditionalCheckFailed) => {
                Ok(WriteOutcome::ConditionFailed)
            }
            Err(other) => Err(other.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::expression::condition::Condition;
    use crate::request;
    use crate::transport::stub::{Call, Reply, StubTransport};
    use aws_sdk_dynamodb::types;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Order {
        order_id: String,
        status: String,
    }

    fn schema() -> schema::TableSchema {
        schema::TableSchema::new("orders", "order_id")
    }

    #[tokio::test]
    async fn test_delete_returns_the_removed_item_when_requested() {
        let schema = schema();
        let removed = request::Item::from([
            (
                "order_id".to_string(),
                types::AttributeValue::S("o-1".to_string()),
            ),
            (
                "status".to_string(),
                types::AttributeValue::S("draft".to_string()),
            ),
        ]);
        let transport = StubTransport::new([Reply::Item(Ok(Some(removed)))]);
        let outcome = Delete::<Order>::new(&schema, &transport)
            .key("o-1")
            .unwrap()
            .when("status", Condition::equals("draft").unwrap())
            .return_old_values()
            .send()
            .await
            .unwrap();
        let WriteOutcome::Applied(Some(old)) = outcome else {
            panic!("expected the removed item");
        };
        assert_eq!(old.status, "draft");

        let calls = transport.calls();
        let Call::Delete(request) = &calls[0] else {
            panic!("expected a delete call");
        };
        assert_eq!(
            request.condition_expression.as_deref(),
            Some("#status = :status_0")
        );
    }

    #[tokio::test]
    async fn test_failed_condition_is_an_outcome() {
        let schema = schema();
        let transport = StubTransport::new([Reply::Item(Err(
            transport::TransportError::ConditionalCheckFailed,
        ))]);
        let outcome = Delete::<Order>::new(&schema, &transport)
            .key("o-1")
            .unwrap()
            .when("status", Condition::equals("draft").unwrap())
            .send()
            .await
            .unwrap();
        assert_eq!(outcome, WriteOutcome::ConditionFailed);
    }
}
