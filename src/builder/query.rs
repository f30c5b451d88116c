use crate::builder;
use crate::expression::{condition, path, placeholders};
use crate::{error, request, schema};

/// Sort-key traversal direction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Ascending sort-key order.
    #[default]
    Ascending,
    /// Descending sort-key order.
    Descending,
}

/// Builds a [`request::QueryRequest`] for one table or index.
///
/// Conditions are classified when added: a top-level path matching one of
/// the active key attributes becomes a key condition, everything else a
/// filter. Selecting an index swaps the active key attributes, so the same
/// condition can classify differently depending on the target.
#[derive(Clone, Debug)]
pub struct QueryBuilder<'a> {
    schema: &'a schema::TableSchema,
    index_name: Option<String>,
    active_partition_key: String,
    active_sort_key: Option<String>,
    key_conditions: builder::ConditionSet,
    filter_conditions: builder::ConditionSet,
    joiner: condition::LogicalOperator,
    projection: Vec<path::Path>,
    limit: Option<i32>,
    sort: SortOrder,
    consistent_read: bool,
}

impl<'a> QueryBuilder<'a> {
    /// Start a query against the table described by `schema`.
    pub fn new(schema: &'a schema::TableSchema) -> Self {
        Self {
            schema,
            index_name: None,
            active_partition_key: schema.partition_key.clone(),
            active_sort_key: schema.sort_key.clone(),
            key_conditions: builder::ConditionSet::default(),
            filter_conditions: builder::ConditionSet::default(),
            joiner: condition::LogicalOperator::And,
            projection: Vec::new(),
            limit: None,
            sort: SortOrder::Ascending,
            consistent_read: false,
        }
    }

    /// Target a secondary index instead of the table.
    ///
    /// Must be called before conditions are added, as it changes how they
    /// classify.
    pub fn use_index(mut self, index: impl Into<String>) -> error::Result<Self> {
        let index = index.into();
        let (partition_key, sort_key) = self.schema.index_keys(&index)?;
        self.active_partition_key = partition_key.to_string();
        self.active_sort_key = sort_key.map(str::to_string);
        self.index_name = Some(index);
        Ok(self)
    }

    /// Joiner placed before filter conditions added from now on.
    ///
    /// Key conditions always join with `AND`, which is all the wire grammar
    /// allows.
    pub fn joiner(mut self, joiner: condition::LogicalOperator) -> Self {
        self.joiner = joiner;
        self
    }

    /// Add a condition, classified as key condition or filter by its path.
    pub fn condition(
        mut self,
        path: impl Into<path::Path>,
        condition: condition::Condition,
    ) -> Self {
        let path = path.into();
        if self.is_key_path(&path) {
            self.key_conditions
                .push(condition::LogicalOperator::And, path, condition);
        } else {
            self.filter_conditions.push(self.joiner, path, condition);
        }
        self
    }

    /// Restrict the response to the given attribute path.
    pub fn project(mut self, path: impl Into<path::Path>) -> Self {
        self.projection.push(path.into());
        self
    }

    /// Upper bound on items evaluated per page.
    pub fn limit(mut self, limit: i32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sort-key traversal direction.
    pub fn sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    /// Read from the leader instead of an eventually consistent replica.
    pub fn consistent(mut self, consistent_read: bool) -> Self {
        self.consistent_read = consistent_read;
        self
    }

    /// Partition key attribute of the current target (table or index).
    pub fn active_partition_key(&self) -> &str {
        &self.active_partition_key
    }

    /// Sort key attribute of the current target, if any.
    pub fn active_sort_key(&self) -> Option<&str> {
        self.active_sort_key.as_deref()
    }

    fn is_key_path(&self, path: &path::Path) -> bool {
        path.is_top_level()
            && (path.root_name() == self.active_partition_key
                || Some(path.root_name()) == self.active_sort_key.as_deref())
    }

    /// Render the wire request.
    ///
    /// Fails when no key condition survives rendering; a query without one
    /// is a full scan in disguise and is rejected.
    pub fn build(self) -> error::Result<request::QueryRequest> {
        let mut map = placeholders::AttributeMap::default();
        let key_condition_expression = self
            .key_conditions
            .render(&mut map)
            .ok_or(error::Error::MissingKeyCondition)?;
        let filter_expression = self.filter_conditions.render(&mut map);
        let projection_expression = builder::render_projection(&self.projection, &mut map);
        let expressions = [
            Some(key_condition_expression.as_str()),
            filter_expression.as_deref(),
            projection_expression.as_deref(),
        ];
        Ok(request::QueryRequest {
            table_name: self.schema.table_name.clone(),
            index_name: self.index_name,
            expression_attribute_names: map.expression_attribute_names(&expressions),
            expression_attribute_values: map.expression_attribute_values(&expressions),
            key_condition_expression,
            filter_expression,
            projection_expression,
            limit: self.limit,
            scan_index_forward: self.sort == SortOrder::Ascending,
            exclusive_start_key: None,
            consistent_read: self.consistent_read,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::expression::condition::Condition;
    use crate::expression::path::Path;
    use crate::schema::SecondaryIndex;
    use rstest::rstest;

    fn schema() -> schema::TableSchema {
        schema::TableSchema::new("orders", "order_id")
            .with_sort_key("line")
            .with_index(
                "by-customer",
                SecondaryIndex::Global {
                    partition_key: "customer_id".to_string(),
                    sort_key: Some("placed_at".to_string()),
                },
            )
    }

    #[rstest]
    #[case::partition_key("order_id", true)]
    #[case::sort_key("line", true)]
    #[case::plain_attribute("status", false)]
    fn test_top_level_paths_classify_by_active_keys(
        #[case] attribute: &str,
        #[case] is_key: bool,
    ) {
        let schema = schema();
        let request = QueryBuilder::new(&schema)
            .condition("order_id", Condition::equals("o-1").unwrap())
            .condition(attribute, Condition::equals("x").unwrap())
            .build()
            .unwrap();
        assert_eq!(request.filter_expression.is_none(), is_key);
    }

    #[test]
    fn test_nested_path_on_key_attribute_is_a_filter() {
        let schema = schema();
        let request = QueryBuilder::new(&schema)
            .condition("order_id", Condition::equals("o-1").unwrap())
            .condition(
                Path::root("line").field("note"),
                Condition::Exists,
            )
            .build()
            .unwrap();
        assert_eq!(
            request.filter_expression.as_deref(),
            Some("attribute_exists(#line.#note)")
        );
    }

    #[test]
    fn test_index_selection_swaps_active_keys() {
        let schema = schema();
        let request = QueryBuilder::new(&schema)
            .use_index("by-customer")
            .unwrap()
            .condition("customer_id", Condition::equals("c-1").unwrap())
            .condition("order_id", Condition::equals("o-1").unwrap())
            .build()
            .unwrap();
        assert_eq!(request.index_name.as_deref(), Some("by-customer"));
        assert_eq!(
            request.key_condition_expression,
            "#customer_id = :customer_id_0"
        );
        assert_eq!(
            request.filter_expression.as_deref(),
            Some("#order_id = :order_id_1")
        );
    }

    #[test]
    fn test_query_without_key_condition_is_rejected() {
        let schema = schema();
        let error = QueryBuilder::new(&schema)
            .condition("status", Condition::equals("open").unwrap())
            .build()
            .unwrap_err();
        assert!(matches!(error, error::Error::MissingKeyCondition));
    }

    #[test]
    fn test_paging_and_sort_options_pass_through() {
        let schema = schema();
        let request = QueryBuilder::new(&schema)
            .condition("order_id", Condition::equals("o-1").unwrap())
            .limit(10)
            .sort(SortOrder::Descending)
            .consistent(true)
            .build()
            .unwrap();
        assert_eq!(request.limit, Some(10));
        assert!(!request.scan_index_forward);
        assert!(request.consistent_read);
        assert_eq!(request.exclusive_start_key, None);
    }
}
