use crate::{error, request};

use indexmap::IndexMap;

/// A secondary index declared on a table.
///
/// Global indexes carry their own partition key; local indexes share the
/// table's partition key and only swap the sort key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SecondaryIndex {
    /// Global secondary index with its own key pair.
    Global {
        /// Partition key attribute of the index.
        partition_key: String,
        /// Optional sort key attribute of the index.
        sort_key: Option<String>,
    },
    /// Local secondary index reusing the table partition key.
    Local {
        /// Sort key attribute of the index.
        sort_key: String,
    },
}

/// Static description of a table: name, key attributes, and named secondary
/// indexes.
///
/// Constructed once at startup and shared read-only by every builder for the
/// table.
///
/// ```rust
/// use dynamodb_adapter::schema;
///
/// let table = schema::TableSchema::new("users", "id")
///     .with_sort_key("created_at")
///     .with_index(
///         "by-email",
///         schema::SecondaryIndex::Global {
///             partition_key: "email".to_string(),
///             sort_key: None,
///         },
///     );
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableSchema {
    /// Table name used in every wire request.
    pub table_name: String,
    /// Partition key attribute name.
    pub partition_key: String,
    /// Optional sort key attribute name.
    pub sort_key: Option<String>,
    /// Named secondary indexes.
    pub indexes: IndexMap<String, SecondaryIndex>,
}

impl TableSchema {
    /// Create a schema with a partition key only.
    pub fn new(table_name: impl Into<String>, partition_key: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            partition_key: partition_key.into(),
            sort_key: None,
            indexes: IndexMap::new(),
        }
    }

    /// Add a sort key attribute.
    pub fn with_sort_key(mut self, sort_key: impl Into<String>) -> Self {
        self.sort_key = Some(sort_key.into());
        self
    }

    /// Register a named secondary index.
    pub fn with_index(mut self, name: impl Into<String>, index: SecondaryIndex) -> Self {
        self.indexes.insert(name.into(), index);
        self
    }

    /// Resolve an index name to the key pair active while querying it.
    ///
    /// An unknown index name is a configuration error and fails synchronously.
    pub(crate) fn index_keys(&self, index: &str) -> error::Result<(&str, Option<&str>)> {
        match self.indexes.get(index) {
            Some(SecondaryIndex::Global {
                partition_key,
                sort_key,
            }) => Ok((partition_key, sort_key.as_deref())),
            Some(SecondaryIndex::Local { sort_key }) => {
                Ok((&self.partition_key, Some(sort_key)))
            }
            None => Err(error::Error::UnknownIndex {
                index: index.to_string(),
                table: self.table_name.clone(),
            }),
        }
    }

    /// Retain only the key attributes of an item, e.g. for delete
    /// sub-requests inside a batch.
    pub(crate) fn extract_key(&self, item: &request::Item) -> error::Result<request::Item> {
        let mut key = request::Item::new();
        let partition_value = item.get(&self.partition_key).ok_or_else(|| {
            error::Error::MissingKeyAttribute {
                attribute: self.partition_key.clone(),
            }
        })?;
        key.insert(self.partition_key.clone(), partition_value.clone());
        if let Some(sort_key) = &self.sort_key {
            if let Some(sort_value) = item.get(sort_key) {
                key.insert(sort_key.clone(), sort_value.clone());
            }
        }
        Ok(key)
    }
}
