#![deny(missing_docs)]

//! # DynamoDB adapter
//!
//! A typed expression compiler and batching adapter for Amazon DynamoDB.
//!
//! ## Overview
//!
//! This library turns structured operations into DynamoDB wire expressions
//! so application code never concatenates expression strings or manages
//! `#name`/`:value` placeholders by hand:
//!
//! - Condition, update, key-condition, filter, and projection expressions
//!   are compiled from typed values, with placeholder deduplication and
//!   pruning handled centrally
//! - Per-operation adapters (Get, Put, Update, Delete, Query, batch
//!   variants) serialize domain types at the boundary via `serde`
//! - Recoverable store behavior is absorbed where it occurs: failed guard
//!   conditions become a [`adapter::WriteOutcome`], rejected nested document
//!   paths retry one level up, queries follow the resume cursor to the last
//!   page, and unprocessed batch items are requeued
//!
//! ## Quick Example
//!
//! ```no_run
//! use dynamodb_adapter::adapter::{put::Put, update::Update};
//! use dynamodb_adapter::expression::condition::Condition;
//! use dynamodb_adapter::expression::path::Path;
//! use dynamodb_adapter::{schema, transport};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct Order {
//!     order_id: String,
//!     status: String,
//! }
//!
//! # async fn example(client: aws_sdk_dynamodb::Client) -> Result<(), Box<dyn std::error::Error>> {
//! let table = schema::TableSchema::new("orders", "order_id");
//! let transport = transport::DynamoTransport::new(client);
//!
//! // Create-only put: a second write of the same key reports
//! // `WriteOutcome::ConditionFailed` instead of failing.
//! let order = Order {
//!     order_id: "o-1".to_string(),
//!     status: "open".to_string(),
//! };
//! let outcome = Put::new(&table, &transport)
//!     .item(&order)?
//!     .when("order_id", Condition::NotExists)
//!     .send()
//!     .await?;
//!
//! // Nested update that creates intermediate maps as needed.
//! Update::<Order>::new(&table, &transport)
//!     .key("o-1")?
//!     .set_with_shift(Path::root("shipping").field("city"), "Lisbon")?
//!     .send()
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`mod@schema`] - Table descriptions: keys and secondary indexes
//! - [`mod@expression`] - Paths, placeholders, conditions, update actions
//! - [`mod@builder`] - Per-operation wire request builders
//! - [`mod@request`] - Plain request and response values
//! - [`mod@transport`] - The store client boundary
//! - [`mod@batch`] - Chunked batch writes with requeueing
//! - [`mod@adapter`] - Typed operation front-ends

/// Typed operation front-ends over the transport.
pub mod adapter;

/// Chunked batch writes with unprocessed-item requeueing.
pub mod batch;

/// Per-operation wire request builders.
pub mod builder;

/// Errors surfaced by this crate.
pub mod error;

/// Wire expression construction.
pub mod expression;

/// Plain request and response values.
pub mod request;

/// Table descriptions: keys and secondary indexes.
pub mod schema;

/// The boundary between built requests and the store client.
pub mod transport;
