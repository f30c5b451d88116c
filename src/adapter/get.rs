use crate::builder::get::GetBuilder;
use crate::expression::path;
use crate::{error, schema, transport};

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::marker;

/// Reads one item by primary key and deserializes it.
///
/// ```rust,no_run
/// use dynamodb_adapter::{adapter, schema, transport};
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Order {
///     order_id: String,
///     status: String,
/// }
///
/// # async fn example(
/// #     schema: &schema::TableSchema,
/// #     transport: &transport::DynamoTransport,
/// # ) -> Result<(), Box<dyn std::error::Error>> {
/// let order: Option<Order> = adapter::get::Get::new(schema, transport)
///     .key("o-1")?
///     .send()
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Get<'a, T> {
    schema: &'a schema::TableSchema,
    transport: &'a dyn transport::Transport,
    builder: GetBuilder<'a>,
    marker: marker::PhantomData<T>,
}

impl<'a, T: DeserializeOwned> Get<'a, T> {
    /// Start a get against `schema` over `transport`.
    pub fn new(
        schema: &'a schema::TableSchema,
        transport: &'a dyn transport::Transport,
    ) -> Self {
        Self {
            schema,
            transport,
            builder: GetBuilder::new(schema),
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

    /// Fetch only the given attribute path; repeatable.
    pub fn select(mut self, path: impl Into<path::Path>) -> Self {
        self.builder = self.builder.project(path);
        self
    }

    /// Read from the leader instead of an eventually consistent replica.
    pub fn consistent(mut self, consistent_read: bool) -> Self {
        self.builder = self.builder.consistent(consistent_read);
        self
    }

    /// Execute the read.
    pub async fn send(self) -> error::Result<Option<T>> {
        let request = self.builder.build();
        tracing::debug!(?request, "sending get");
        let item = self.transport.get_item(request).await?;
        super::deserialize_old(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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
        schema::TableSchema::new("orders", "order_id").with_sort_key("line")
    }

    #[tokio::test]
    async fn test_get_deserializes_the_stored_item() {
        let schema = schema();
        let stored = request::Item::from([
            (
                "order_id".to_string(),
                types::AttributeValue::S("o-1".to_string()),
            ),
            (
                "status".to_string(),
                types::AttributeValue::S("open".to_string()),
            ),
        ]);
        let transport = StubTransport::new([Reply::Item(Ok(Some(stored)))]);

        let order: Option<Order> = Get::new(&schema, &transport)
            .key("o-1")
            .unwrap()
            .sort_key(2)
            .unwrap()
            .send()
            .await
            .unwrap();
        assert_eq!(
            order,
            Some(Order {
                order_id: "o-1".to_string(),
                status: "open".to_string(),
            })
        );

        let calls = transport.calls();
        let Call::Get(request) = &calls[0] else {
            panic!("expected a get call");
        };
        assert_eq!(request.key.len(), 2);
        assert_eq!(
            request.key["line"],
            types::AttributeValue::N("2".to_string())
        );
    }

    #[tokio::test]
    async fn test_missing_item_is_none() {
        let schema = schema();
        let transport = StubTransport::new([Reply::Item(Ok(None))]);
        let order: Option<Order> = Get::new(&schema, &transport)
            .key("o-1")
            .unwrap()
            .send()
            .await
            .unwrap();
        assert_eq!(order, None);
    }

    #[test]
    fn test_adapters_are_debuggable_with_any_transport() {
        let schema = schema();
        let transport = StubTransport::default();
        let get = Get::<Order>::new(&schema, &transport);
        assert!(format!("{get:?}").contains("StubTransport"));
    }

    #[tokio::test]
    async fn test_sort_key_on_simple_key_table_fails_fast() {
        let schema = schema::TableSchema::new("orders", "order_id");
        let transport = StubTransport::default();
        let error = Get::<Order>::new(&schema, &transport)
            .sort_key(2)
            .unwrap_err();
        assert!(matches!(
            error,
            error::Error::NoSortKey { ref table } if table == "orders"
        ));
    }
}
