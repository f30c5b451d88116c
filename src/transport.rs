//! The boundary between built requests and the store client.
//!
//! Store failures that the adapters recover from locally get their own
//! variants; everything else passes through opaquely.

use crate::request;

use async_trait::async_trait;
use aws_sdk_dynamodb::{
    Client,
    error::{ProvideErrorMetadata, SdkError},
    types,
};

/// Message prefix the store uses to reject an update whose document path
/// does not exist yet.
const INVALID_UPDATE_PATH: &str =
    "The document path provided in the update expression is invalid for update";

/// A failed round trip, pre-classified for the adapters.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The write's guard condition did not hold.
    #[error("conditional check failed")]
    ConditionalCheckFailed,

    /// The update targeted a document path that does not exist on the item.
    #[error("document path is invalid for update")]
    InvalidUpdatePath,

    /// Any other store or network failure.
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Executes prepared requests against the store.
///
/// The adapters depend on this trait only, so tests can swap in a scripted
/// implementation. Implementations must be `Debug` so the adapters holding
/// them can be too.
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// Read a single item; `None` when the key matches nothing.
    async fn get_item(
        &self,
        request: request::GetRequest,
    ) -> Result<Option<request::Item>, TransportError>;

    /// Store a full item, returning the replaced item when requested.
    async fn put_item(
        &self,
        request: request::PutRequest,
    ) -> Result<Option<request::Item>, TransportError>;

    /// Apply an update expression, returning the pre-update item when
    /// requested.
    async fn update_item(
        &self,
        request: request::UpdateRequest,
    ) -> Result<Option<request::Item>, TransportError>;

    /// Delete a single item, returning the removed item when requested.
    async fn delete_item(
        &self,
        request: request::DeleteRequest,
    ) -> Result<Option<request::Item>, TransportError>;

    /// Fetch one page of a query.
    async fn query(
        &self,
        request: request::QueryRequest,
    ) -> Result<request::QueryPage, TransportError>;

    /// Submit one batch chunk, reporting the sub-requests left unprocessed.
    async fn batch_write(
        &self,
        request: request::BatchWriteRequest,
    ) -> Result<request::BatchWriteResponse, TransportError>;
}

/// [`Transport`] over the real store client.
#[derive(Clone, Debug)]
pub struct DynamoTransport {
    client: Client,
}

impl DynamoTransport {
    /// Wrap a configured client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for DynamoTransport {
    async fn get_item(
        &self,
        request: request::GetRequest,
    ) -> Result<Option<request::Item>, TransportError> {
        let output = self
            .client
            .get_item()
            .table_name(request.table_name)
            .set_key(Some(request.key))
            .set_projection_expression(request.projection_expression)
            .set_expression_attribute_names(request.expression_attribute_names)
            .consistent_read(request.consistent_read)
            .send()
            .await
            .map_err(classify)?;
        Ok(output.item)
    }

    async fn put_item(
        &self,
        request: request::PutRequest,
    ) -> Result<Option<request::Item>, TransportError> {
        let mut builder = self
            .client
            .put_item()
            .table_name(request.table_name)
            .set_item(Some(request.item))
            .set_condition_expression(request.condition_expression)
            .set_expression_attribute_names(request.expression_attribute_names)
            .set_expression_attribute_values(request.expression_attribute_values);
        if request.return_old_values {
            builder = builder.return_values(types::ReturnValue::AllOld);
        }
        let output = builder.send().await.map_err(classify)?;
        Ok(output.attributes)
    }

    async fn update_item(
        &self,
        request: request::UpdateRequest,
    ) -> Result<Option<request::Item>, TransportError> {
        let mut builder = self
            .client
            .update_item()
            .table_name(request.table_name)
            .set_key(Some(request.key))
            .update_expression(request.update_expression)
            .set_condition_expression(request.condition_expression)
            .set_expression_attribute_names(request.expression_attribute_names)
            .set_expression_attribute_values(request.expression_attribute_values);
        if request.return_old_values {
            builder = builder.return_values(types::ReturnValue::AllOld);
        }
        let output = builder.send().await.map_err(classify)?;
        Ok(output.attributes)
    }

    async fn delete_item(
        &self,
        request: request::DeleteRequest,
    ) -> Result<Option<request::Item>, TransportError> {
        let mut builder = self
            .client
            .delete_item()
            .table_name(request.table_name)
            .set_key(Some(request.key))
            .set_condition_expression(request.condition_expression)
            .set_expression_attribute_names(request.expression_attribute_names)
            .set_expression_attribute_values(request.expression_attribute_values);
        if request.return_old_values {
            builder = builder.return_values(types::ReturnValue::AllOld);
        }
        let output = builder.send().await.map_err(classify)?;
        Ok(output.attributes)
    }

    async fn query(
        &self,
        request: request::QueryRequest,
    ) -> Result<request::QueryPage, TransportError> {
        let output = self
            .client
            .query()
            .table_name(request.table_name)
            .set_index_name(request.index_name)
            .key_condition_expression(request.key_condition_expression)
            .set_filter_expression(request.filter_expression)
            .set_projection_expression(request.projection_expression)
            .set_expression_attribute_names(request.expression_attribute_names)
            .set_expression_attribute_values(request.expression_attribute_values)
            .set_limit(request.limit)
            .scan_index_forward(request.scan_index_forward)
            .set_exclusive_start_key(request.exclusive_start_key)
            .consistent_read(request.consistent_read)
            .send()
            .await
            .map_err(classify)?;
        Ok(request::QueryPage {
            items: output.items.unwrap_or_default(),
            last_evaluated_key: output.last_evaluated_key,
        })
    }

    async fn batch_write(
        &self,
        request: request::BatchWriteRequest,
    ) -> Result<request::BatchWriteResponse, TransportError> {
        let mut writes = Vec::with_capacity(request.entries.len());
        for entry in request.entries {
            let write = match entry {
                request::BatchEntry::Put(item) => {
                    let put_request = types::PutRequest::builder()
                        .set_item(Some(item))
                        .build()
                        .map_err(box_error)?;
                    types::WriteRequest::builder()
                        .set_put_request(Some(put_request))
                        .build()
                }
                request::BatchEntry::Delete(key) => {
                    let delete_request = types::DeleteRequest::builder()
                        .set_key(Some(key))
                        .build()
                        .map_err(box_error)?;
                    types::WriteRequest::builder()
                        .set_delete_request(Some(delete_request))
                        .build()
                }
            };
            writes.push(write);
        }
        let output = self
            .client
            .batch_write_item()
            .request_items(request.table_name, writes)
            .send()
            .await
            .map_err(classify)?;
        let unprocessed = output
            .unprocessed_items
            .unwrap_or_default()
            .into_values()
            .flatten()
            .filter_map(|write| {
                if let Some(put_request) = write.put_request {
                    Some(request::BatchEntry::Put(put_request.item))
                } else {
                    write
                        .delete_request
                        .map(|delete_request| request::BatchEntry::Delete(delete_request.key))
                }
            })
            .collect();
        Ok(request::BatchWriteResponse { unprocessed })
    }
}

fn box_error(
    error: impl std::error::Error + Send + Sync + 'static,
) -> TransportError {
    TransportError::Other(Box::new(error))
}

/// Sort a failed round trip into the variants the adapters react to.
fn classify<E>(error: SdkError<E>) -> TransportError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    match error.code() {
        Some("ConditionalCheckFailedException") => TransportError::ConditionalCheckFailed,
        Some("ValidationException")
            if error
                .message()
                .is_some_and(|message| message.contains(INVALID_UPDATE_PATH)) =>
        {
            TransportError::InvalidUpdatePath
        }
        _ => box_error(error),
    }
}
