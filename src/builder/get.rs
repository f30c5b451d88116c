use crate::builder;
use crate::expression::{path, placeholders};
use crate::{request, schema};

use aws_sdk_dynamodb::types;

/// Builds a [`request::GetRequest`] for one table.
#[derive(Clone, Debug)]
pub struct GetBuilder<'a> {
    schema: &'a schema::TableSchema,
    key: request::Item,
    projection: Vec<path::Path>,
    consistent_read: bool,
}

impl<'a> GetBuilder<'a> {
    /// Start a get against the table described by `schema`.
    pub fn new(schema: &'a schema::TableSchema) -> Self {
        Self {
            schema,
            key: request::Item::new(),
            projection: Vec::new(),
            consistent_read: false,
        }
    }

    /// Add one key attribute.
    pub fn key(mut self, attribute: impl Into<String>, value: types::AttributeValue) -> Self {
        self.key.insert(attribute.into(), value);
        self
    }

    /// Restrict the response to the given attribute path.
    pub fn project(mut self, path: impl Into<path::Path>) -> Self {
        self.projection.push(path.into());
        self
    }

    /// Read from the leader instead of an eventually consistent replica.
    pub fn consistent(mut self, consistent_read: bool) -> Self {
        self.consistent_read = consistent_read;
        self
    }

    /// Render the wire request.
    pub fn build(self) -> request::GetRequest {
        let mut map = placeholders::AttributeMap::default();
        let projection_expression = builder::render_projection(&self.projection, &mut map);
        let expression_attribute_names =
            map.expression_attribute_names(&[projection_expression.as_deref()]);
        request::GetRequest {
            table_name: self.schema.table_name.clone(),
            key: self.key,
            projection_expression,
            expression_attribute_names,
            consistent_read: self.consistent_read,
        }
    }
}
