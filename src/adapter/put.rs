use crate::adapter::WriteOutcome;
use crate::builder::put::PutBuilder;
use crate::expression::{condition, path};
use crate::{error, schema, transport};

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::marker;

/// Stores a full item, optionally guarded by conditions on the stored item.
///
/// ```rust,no_run
/// use dynamodb_adapter::adapter::put::Put;
/// use dynamodb_adapter::expression::condition::Condition;
/// use dynamodb_adapter::{schema, transport};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct Order {
///     order_id: String,
///     status: String,
/// }
///
/// # async fn example(
/// #     schema: &schema::TableSchema,
/// #     transport: &transport::DynamoTransport,
/// #     order: &Order,
/// # ) -> Result<(), Box<dyn std::error::Error>> {
/// let outcome = Put::new(schema, transport)
///     .item(order)?
///     .when("order_id", Condition::NotExists)
///     .send()
///     .await?;
/// assert!(outcome.is_applied());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Put<'a, T> {
    transport: &'a dyn transport::Transport,
    builder: PutBuilder<'a>,
    marker: marker::PhantomData<T>,
}

impl<'a, T: Serialize + DeserializeOwned> Put<'a, T> {
    /// Start a put against `schema` over `transport`.
    pub fn new(
        schema: &'a schema::TableSchema,
        transport: &'a dyn transport::Transport,
    ) -> Self {
        Self {
            transport,
            builder: PutBuilder::new(schema),
            marker: marker::PhantomData,
        }
    }

    /// The item to store, serialized at the boundary.
    pub fn item(mut self, item: &T) -> error::Result<Self> {
        self.builder = self.builder.item(serde_dynamo::to_item(item)?);
        Ok(self)
    }

    /// Guard the write with a predicate on the currently stored item.
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

    /// Ask for the replaced item in the outcome.
    pub fn return_old_values(mut self) -> Self {
        self.builder = self.builder.return_old_values(true);
        self
    }

    /// Execute the write.
    pub async fn send(self) -> error::Result<WriteOutcome<T>> {
        let request = self.builder.build();
        tracing::debug!(?request, "sending put");
        match self.transport.put_item(request).await {
            Ok(old) => Ok(WriteOutcome::Applied(super::deserialize_old(old)?)),
            Err(transport::TransportError::ConditionalCheckFailed) => {
                Ok(WriteOutcome::ConditionFailed)
            }
            Err(other) => Err(other.into()),
        }
    }
}
