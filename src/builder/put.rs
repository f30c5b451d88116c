use crate::builder;
use crate::expression::{condition, path, placeholders};
use crate::{request, schema};

/// Builds a [`request::PutRequest`] for one table.
#[derive(Clone, Debug)]
pub struct PutBuilder<'a> {
    schema: &'a schema::TableSchema,
    item: request::Item,
    conditions: builder::ConditionSet,
    joiner: condition::LogicalOperator,
    return_old_values: bool,
}

impl<'a> PutBuilder<'a> {
    /// Start a put against the table described by `schema`.
    pub fn new(schema: &'a schema::TableSchema) -> Self {
        Self {
            schema,
            item: request::Item::new(),
            conditions: builder::ConditionSet::default(),
            joiner: condition::LogicalOperator::And,
            return_old_values: false,
        }
    }

    /// The full item to store.
    pub fn item(mut self, item: request::Item) -> Self {
        self.item = item;
        self
    }

    /// Joiner placed before conditions added from now on.
    pub fn joiner(mut self, joiner: condition::LogicalOperator) -> Self {
        self.joiner = joiner;
        self
    }

    /// Guard the write with a predicate on the stored item.
    pub fn condition(
        mut self,
        path: impl Into<path::Path>,
        condition: condition::Condition,
    ) -> Self {
        self.conditions.push(self.joiner, path.into(), condition);
        self
    }

    /// Whether the write carries a guard condition.
    pub fn has_condition(&self) -> bool {
        !self.conditions.is_empty()
    }

    /// Ask the store to return the replaced item.
    pub fn return_old_values(mut self, return_old_values: bool) -> Self {
        self.return_old_values = return_old_values;
        self
    }

    /// Render the wire request.
    pub fn build(self) -> request::PutRequest {
        let mut map = placeholders::AttributeMap::default();
        let condition_expression = self.conditions.render(&mut map);
        let expressions = [condition_expression.as_deref()];
        let expression_attribute_names = map.expression_attribute_names(&expressions);
        let expression_attribute_values = map.expression_attribute_values(&expressions);
        request::PutRequest {
            table_name: self.schema.table_name.clone(),
            item: self.item,
            condition_expression,
            expression_attribute_names,
            expression_attribute_values,
            return_old_values: self.return_old_values,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::expression::condition::{Condition, LogicalOperator};
    use aws_sdk_dynamodb::types;

    fn schema() -> schema::TableSchema {
        schema::TableSchema::new("orders", "order_id")
    }

    fn item() -> request::Item {
        request::Item::from([(
            "order_id".to_string(),
            types::AttributeValue::S("o-1".to_string()),
        )])
    }

    #[test]
    fn test_unconditional_put_has_no_expression_tables() {
        let schema = schema();
        let request = PutBuilder::new(&schema).item(item()).build();
        assert_eq!(request.condition_expression, None);
        assert_eq!(request.expression_attribute_names, None);
        assert_eq!(request.expression_attribute_values, None);
        assert!(!request.return_old_values);
    }

    #[test]
    fn test_conditions_join_with_selected_joiners() {
        let schema = schema();
        let request = PutBuilder::new(&schema)
            .item(item())
            .condition("order_id", Condition::NotExists)
            .joiner(LogicalOperator::Or)
            .condition("status", Condition::equals("draft").unwrap())
            .build();
        assert_eq!(
            request.condition_expression.as_deref(),
            Some("attribute_not_exists(#order_id) OR #status = :status_0")
        );
        let names = request.expression_attribute_names.unwrap();
        assert_eq!(names.len(), 2);
        let values = request.expression_attribute_values.unwrap();
        assert_eq!(
            values[":status_0"],
            types::AttributeValue::S("draft".to_string())
        );
    }
}
