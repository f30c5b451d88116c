use crate::builder;
use crate::expression::{condition, path, placeholders};
use crate::{request, schema};

use aws_sdk_dynamodb::types;

/// Builds a [`request::DeleteRequest`] for one table.
#[derive(Clone, Debug)]
pub struct DeleteBuilder<'a> {
    schema: &'a schema::TableSchema,
    key: request::Item,
    conditions: builder::ConditionSet,
    joiner: condition::LogicalOperator,
    return_old_values: bool,
}

impl<'a> DeleteBuilder<'a> {
    /// Start a delete against the table described by `schema`.
    pub fn new(schema: &'a schema::TableSchema) -> Self {
        Self {
            schema,
            key: request::Item::new(),
            conditions: builder::ConditionSet::default(),
            joiner: condition::LogicalOperator::And,
            return_old_values: false,
        }
    }

    /// Add one key attribute.
    pub fn key(mut self, attribute: impl Into<String>, value: types::AttributeValue) -> Self {
        self.key.insert(attribute.into(), value);
        self
    }

    /// Joiner placed before conditions added from now on.
    pub fn joiner(mut self, joiner: condition::LogicalOperator) -> Self {
        self.joiner = joiner;
        self
    }

    /// Guard the delete with a predicate on the stored item.
    pub fn condition(
        mut self,
        path: impl Into<path::Path>,
        condition: condition::Condition,
    ) -> Self {
        self.conditions.push(self.joiner, path.into(), condition);
        self
    }

    /// Ask the store to return the removed item.
    pub fn return_old_values(mut self, return_old_values: bool) -> Self {
        self.return_old_values = return_old_values;
        self
    }

    /// Render the wire request.
    pub fn build(self) -> request::DeleteRequest {
        let mut map = placeholders::AttributeMap::default();
        let condition_expression = self.conditions.render(&mut map);
        let expressions = [condition_expression.as_deref()];
        let expression_attribute_names = map.expression_attribute_names(&expressions);
        let expression_attribute_values = map.expression_attribute_values(&expressions);
        request::DeleteRequest {
            table_name: self.schema.table_name.clone(),
            key: self.key,
            condition_expression,
            expression_attribute_names,
            expression_attribute_values,
            return_old_values: self.return_old_values,
        }
    }
}
