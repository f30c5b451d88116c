use crate::builder::query::{QueryBuilder, SortOrder};
use crate::expression::{condition, path};
use crate::{error, schema, transport};

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::marker;

/// Runs a key-condition query and drains every page.
///
/// The store paginates on its own schedule, so the adapter always follows
/// the resume cursor until it runs out and returns the merged result in
/// page order.
///
/// ```rust,no_run
/// use dynamodb_adapter::adapter::query::Query;
/// use dynamodb_adapter::expression::condition::Condition;
/// use dynamodb_adapter::{schema, transport};
/// # #[derive(serde::Deserialize)]
/// # struct Order;
///
/// # async fn example(
/// #     schema: &schema::TableSchema,
/// #     transport: &transport::DynamoTransport,
/// # ) -> Result<(), Box<dyn std::error::Error>> {
/// let open: Vec<Order> = Query::new(schema, transport)
///     .key("o-1")?
///     .when("status", Condition::equals("open")?)
///     .send()
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Query<'a, T> {
    schema: &'a schema::TableSchema,
    transport: &'a dyn transport::Transport,
    builder: QueryBuilder<'a>,
    marker: marker::PhantomData<T>,
}

impl<'a, T: DeserializeOwned> Query<'a, T> {
    /// Start a query against `schema` over `transport`.
    pub fn new(
        schema: &'a schema::TableSchema,
        transport: &'a dyn transport::Transport,
    ) -> Self {
        Self {
            schema,
            transport,
            builder: QueryBuilder::new(schema),
            marker: marker::PhantomData,
        }
    }

    /// Target a secondary index instead of the table.
    ///
    /// Call before adding conditions: the index decides which attributes
    /// classify as key conditions.
    pub fn use_index(mut self, index: impl Into<String>) -> error::Result<Self> {
        self.builder = self.builder.use_index(index)?;
        Ok(self)
    }

    /// Equality condition on the active partition key.
    pub fn key(mut self, value: impl Serialize) -> error::Result<Self> {
        let partition_key = self.builder.active_partition_key().to_string();
        self.builder = self
            .builder
            .condition(partition_key, condition::Condition::equals(value)?);
        Ok(self)
    }

    /// Condition on the active sort key.
    pub fn sort_key(mut self, condition: condition::Condition) -> error::Result<Self> {
        let Some(sort_key) = self.builder.active_sort_key().map(str::to_string) else {
            return Err(error::Error::NoSortKey {
                table: self.schema.table_name.clone(),
            });
        };
        self.builder = self.builder.condition(sort_key, condition);
        Ok(self)
    }

    /// Add a condition; key paths become key conditions, the rest filters.
    pub fn when(
        mut self,
        path: impl Into<path::Path>,
        condition: condition::Condition,
    ) -> Self {
        self.builder = self.builder.condition(path, condition);
        self
    }

    /// Add a further filter joined with `AND`.
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

    /// Add a further filter joined with `OR`.
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

    /// Fetch only the given attribute path; repeatable.
    pub fn select(mut self, path: impl Into<path::Path>) -> Self {
        self.builder = self.builder.project(path);
        self
    }

    /// Upper bound on items evaluated per page.
    pub fn limit(mut self, limit: i32) -> Self {
        self.builder = self.builder.limit(limit);
        self
    }

    /// Sort-key traversal direction.
    pub fn sort(mut self, sort: SortOrder) -> Self {
        self.builder = self.builder.sort(sort);
        self
    }

    /// Read from the leader instead of an eventually consistent replica.
    pub fn consistent(mut self, consistent_read: bool) -> Self {
        self.builder = self.builder.consistent(consistent_read);
        self
    }

    /// Execute the query, following the resume cursor to the last page.
    pub async fn send(self) -> error::Result<Vec<T>> {
        let mut request = self.builder.build()?;
        let mut items = Vec::new();
        loop {
            tracing::debug!(?request, "sending query page");
            let page = self.transport.query(request.clone()).await?;
            for item in page.items {
                items.push(serde_dynamo::from_item(item)?);
            }
            match page.last_evaluated_key {
                Some(cursor) => request.exclusive_start_key = Some(cursor),
                None => return Ok(items),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::expression::condition::Condition;
    use crate::request;
    use crate::schema::SecondaryIndex;
    use crate::transport::stub::{Call, Reply, StubTransport};
    use aws_sdk_dynamodb::types;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Order {
        order_id: String,
    }

    fn schema() -> schema::TableSchema {
        schema::TableSchema::new("orders", "order_id")
            .with_sort_key("line")
            .with_index(
                "by-customer",
                SecondaryIndex::Global {
                    partition_key: "customer_id".to_string(),
                    sort_key: None,
                },
            )
    }

    fn stored(id: &str) -> request::Item {
        request::Item::from([(
            "order_id".to_string(),
            types::AttributeValue::S(id.to_string()),
        )])
    }

    fn cursor(id: &str) -> request::Item {
        stored(id)
    }

    #[tokio::test]
    async fn test_pages_merge_in_order() {
        let schema = schema();
        let transport = StubTransport::new([
            Reply::Page(Ok(request::QueryPage {
                items: vec![stored("o-1"), stored("o-2")],
                last_evaluated_key: Some(cursor("o-2")),
            })),
            Reply::Page(Ok(request::QueryPage {
                items: vec![stored("o-3")],
                last_evaluated_key: None,
            })),
        ]);
        let orders: Vec<Order> = Query::new(&schema, &transport)
            .key("o-1")
            .unwrap()
            .send()
            .await
            .unwrap();
        assert_eq!(
            orders.iter().map(|order| order.order_id.as_str()).collect::<Vec<_>>(),
            vec!["o-1", "o-2", "o-3"]
        );

        let calls = transport.calls();
        assert_eq!(calls.len(), 2);
        let Call::Query(first) = &calls[0] else {
            panic!("expected a query call");
        };
        assert_eq!(first.exclusive_start_key, None);
        let Call::Query(second) = &calls[1] else {
            panic!("expected a query call");
        };
        assert_eq!(second.exclusive_start_key, Some(cursor("o-2")));
        // Only the cursor changes between pages.
        assert_eq!(
            first.key_condition_expression,
            second.key_condition_expression
        );
    }

    #[tokio::test]
    async fn test_key_and_filter_conditions_split() {
        let schema = schema();
        let transport = StubTransport::new([Reply::Page(Ok(request::QueryPage::default()))]);
        let _: Vec<Order> = Query::new(&schema, &transport)
            .key("o-1")
            .unwrap()
            .sort_key(Condition::less_than(5).unwrap())
            .unwrap()
            .when("status", Condition::equals("open").unwrap())
            .send()
            .await
            .unwrap();
        let calls = transport.calls();
        let Call::Query(request) = &calls[0] else {
            panic!("expected a query call");
        };
        assert_eq!(
            request.key_condition_expression,
            "#order_id = :order_id_0 AND #line < :line_1"
        );
        assert_eq!(
            request.filter_expression.as_deref(),
            Some("#status = :status_2")
        );
    }

    #[tokio::test]
    async fn test_index_query_targets_the_index_keys() {
        let schema = schema();
        let transport = StubTransport::new([Reply::Page(Ok(request::QueryPage::default()))]);
        let _: Vec<Order> = Query::new(&schema, &transport)
            .use_index("by-customer")
            .unwrap()
            .key("c-1")
            .unwrap()
            .send()
            .await
            .unwrap();
        let calls = transport.calls();
        let Call::Query(request) = &calls[0] else {
            panic!("expected a query call");
        };
        assert_eq!(request.index_name.as_deref(), Some("by-customer"));
        assert_eq!(
            request.key_condition_expression,
            "#customer_id = :customer_id_0"
        );
    }

    #[tokio::test]
    async fn test_query_without_key_condition_fails_before_sending() {
        let schema = schema();
        let transport = StubTransport::default();
        let error = Query::<Order>::new(&schema, &transport)
            .when("status", Condition::equals("open").unwrap())
            .send()
            .await
            .unwrap_err();
        assert!(matches!(error, error::Error::MissingKeyCondition));
        assert!(transport.calls().is_empty());
    }
}
