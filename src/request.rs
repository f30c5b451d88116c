//! Plain request and response values exchanged with the transport.
//!
//! Every request kind is an explicit struct: the transport dispatches on the
//! type, never on the runtime shape of a payload.

use aws_sdk_dynamodb::types;
use std::collections;

/// A stored item or key in wire representation.
pub type Item = collections::HashMap<String, types::AttributeValue>;

/// A single-item read.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GetRequest {
    /// Target table.
    pub table_name: String,
    /// Full primary key of the item.
    pub key: Item,
    /// Optional projection expression.
    pub projection_expression: Option<String>,
    /// Name placeholder table.
    pub expression_attribute_names: Option<collections::HashMap<String, String>>,
    /// Whether to read from the leader.
    pub consistent_read: bool,
}

/// A full-item write.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PutRequest {
    /// Target table.
    pub table_name: String,
    /// The item to store.
    pub item: Item,
    /// Optional guard condition.
    pub condition_expression: Option<String>,
    /// Name placeholder table.
    pub expression_attribute_names: Option<collections::HashMap<String, String>>,
    /// Value placeholder table.
    pub expression_attribute_values: Option<collections::HashMap<String, types::AttributeValue>>,
    /// Whether the response carries the replaced item.
    pub return_old_values: bool,
}

/// An in-place item update.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UpdateRequest {
    /// Target table.
    pub table_name: String,
    /// Full primary key of the item.
    pub key: Item,
    /// Rendered update expression.
    pub update_expression: String,
    /// Optional guard condition.
    pub condition_expression: Option<String>,
    /// Name placeholder table.
    pub expression_attribute_names: Option<collections::HashMap<String, String>>,
    /// Value placeholder table.
    pub expression_attribute_values: Option<collections::HashMap<String, types::AttributeValue>>,
    /// Whether the response carries the pre-update item.
    pub return_old_values: bool,
}

/// A single-item delete.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DeleteRequest {
    /// Target table.
    pub table_name: String,
    /// Full primary key of the item.
    pub key: Item,
    /// Optional guard condition.
    pub condition_expression: Option<String>,
    /// Name placeholder table.
    pub expression_attribute_names: Option<collections::HashMap<String, String>>,
    /// Value placeholder table.
    pub expression_attribute_values: Option<collections::HashMap<String, types::AttributeValue>>,
    /// Whether the response carries the removed item.
    pub return_old_values: bool,
}

/// A key-condition query over a table or one of its indexes.
#[derive(Clone, Debug, PartialEq)]
pub struct QueryRequest {
    /// Target table.
    pub table_name: String,
    /// Secondary index to query, or `None` for the table itself.
    pub index_name: Option<String>,
    /// Rendered key condition expression.
    pub key_condition_expression: String,
    /// Optional post-read filter expression.
    pub filter_expression: Option<String>,
    /// Optional projection expression.
    pub projection_expression: Option<String>,
    /// Name placeholder table.
    pub expression_attribute_names: Option<collections::HashMap<String, String>>,
    /// Value placeholder table.
    pub expression_attribute_values: Option<collections::HashMap<String, types::AttributeValue>>,
    /// Upper bound on items evaluated per page.
    pub limit: Option<i32>,
    /// Sort-key traversal direction, ascending when `true`.
    pub scan_index_forward: bool,
    /// Resume cursor from the previous page.
    pub exclusive_start_key: Option<Item>,
    /// Whether to read from the leader.
    pub consistent_read: bool,
}

impl Default for QueryRequest {
    fn default() -> Self {
        Self {
            table_name: String::new(),
            index_name: None,
            key_condition_expression: String::new(),
            filter_expression: None,
            projection_expression: None,
            expression_attribute_names: None,
            expression_attribute_values: None,
            limit: None,
            scan_index_forward: true,
            exclusive_start_key: None,
            consistent_read: false,
        }
    }
}

/// One page of query results.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryPage {
    /// Items matched on this page.
    pub items: Vec<Item>,
    /// Cursor for the next page, `None` on the last page.
    pub last_evaluated_key: Option<Item>,
}

/// One sub-request inside a batch write.
#[derive(Clone, Debug, PartialEq)]
pub enum BatchEntry {
    /// Store the item.
    Put(Item),
    /// Delete the item addressed by the key.
    Delete(Item),
}

/// A chunk of batch sub-requests against one table.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchWriteRequest {
    /// Target table.
    pub table_name: String,
    /// Sub-requests in submission order.
    pub entries: Vec<BatchEntry>,
}

/// Outcome of one batch write round trip.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchWriteResponse {
    /// Sub-requests the store did not apply.
    pub unprocessed: Vec<BatchEntry>,
}
