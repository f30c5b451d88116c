use crate::builder;
use crate::expression::{condition, path, placeholders, update};
use crate::{request, schema};

use aws_sdk_dynamodb::types;

/// Builds a [`request::UpdateRequest`] for one table.
///
/// Unlike the other builders this one renders on demand and stays usable
/// afterwards: when the store rejects a document path, the adapter shifts
/// the offending actions up and re-renders the same builder.
#[derive(Clone, Debug)]
pub struct UpdateBuilder<'a> {
    schema: &'a schema::TableSchema,
    key: request::Item,
    actions: update::UpdateActionList,
    conditions: builder::ConditionSet,
    joiner: condition::LogicalOperator,
    return_old_values: bool,
}

impl<'a> UpdateBuilder<'a> {
    /// Start an update against the table described by `schema`.
    pub fn new(schema: &'a schema::TableSchema) -> Self {
        Self {
            schema,
            key: request::Item::new(),
            actions: update::UpdateActionList::default(),
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

    /// Record an update action; a later action on the same path wins.
    pub fn push_action(mut self, action: update::UpdateAction) -> Self {
        self.actions.push(action);
        self
    }

    /// Joiner placed before conditions added from now on.
    pub fn joiner(mut self, joiner: condition::LogicalOperator) -> Self {
        self.joiner = joiner;
        self
    }

    /// Guard the update with a predicate on the stored item.
    pub fn condition(
        mut self,
        path: impl Into<path::Path>,
        condition: condition::Condition,
    ) -> Self {
        self.conditions.push(self.joiner, path.into(), condition);
        self
    }

    /// Ask the store to return the pre-update item.
    pub fn return_old_values(mut self, return_old_values: bool) -> Self {
        self.return_old_values = return_old_values;
        self
    }

    /// Retarget eligible actions one level up, returning how many moved.
    pub fn shift_paths_up(&mut self) -> usize {
        self.actions.shift_paths_up()
    }

    /// Render the wire request.
    ///
    /// `None` means every action was dropped and there is nothing to send.
    pub fn build(&self) -> Option<request::UpdateRequest> {
        let mut map = placeholders::AttributeMap::default();
        let update_expression = self.actions.render(&mut map)?;
        let condition_expression = self.conditions.render(&mut map);
        let expressions = [
            Some(update_expression.as_str()),
            condition_expression.as_deref(),
        ];
        Some(request::UpdateRequest {
            table_name: self.schema.table_name.clone(),
            key: self.key.clone(),
            expression_attribute_names: map.expression_attribute_names(&expressions),
            expression_attribute_values: map.expression_attribute_values(&expressions),
            update_expression,
            condition_expression,
            return_old_values: self.return_old_values,
        })
    }
}
