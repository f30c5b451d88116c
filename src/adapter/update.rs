use crate::adapter::WriteOutcome;
use crate::builder::update::UpdateBuilder;
use crate::expression::{condition, path, update};
use crate::{error, schema, transport};

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::marker;

/// Upper bound on shift-and-resubmit rounds for a rejected document path.
pub const MAX_PATH_SHIFTS: u32 = 32;

/// Applies update actions to one item in place.
///
/// Actions recorded through [`Update::set_with_shift`] opt into path-shift
/// recovery: when the store rejects the update because an intermediate map
/// or list does not exist yet, the deepest path segment folds into the
/// written value and the update is resubmitted one level up, until it lands
/// or [`MAX_PATH_SHIFTS`] rounds are spent.
///
/// ```rust,no_run
/// use dynamodb_adapter::adapter::update::Update;
/// use dynamodb_adapter::expression::path::Path;
/// use dynamodb_adapter::{schema, transport};
/// # #[derive(serde::Serialize, serde::Deserialize)]
/// # struct Order;
///
/// # async fn example(
/// #     schema: &schema::TableSchema,
/// #     transport: &transport::DynamoTransport,
/// # ) -> Result<(), Box<dyn std::error::Error>> {
/// Update::<Order>::new(schema, transport)
///     .key("o-1")?
///     .set_with_shift(Path::root("shipping").field("city"), "Lisbon")?
///     .send()
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Update<'a, T> {
    schema: &'a schema::TableSchema,
    transport: &'a dyn transport::Transport,
    builder: UpdateBuilder<'a>,
    marker: marker::PhantomData<T>,
}

impl<'a, T: DeserializeOwned> Update<'a, T> {
    /// Start an update against `schema` over `transport`.
    pub fn new(
        schema: &'a schema::TableSchema,
        transport: &'a dyn transport::Transport,
    ) -> Self {
        Self {
            schema,
            transport,
            builder: UpdateBuilder::new(schema),
            marker: marker::PhantomData,
        }
    }

    /// Partition key value of the item.
    pub fn key(mut self, value: impl Serialize) -> error::Result<Self> {
        let value = serde_dynamo::to_attribute_value(value)?;
        self.builder = self.builder.key(self.schema.partition_key.clone(), value);
        Ok(self)
    }

    /// Sort key value of the item, for tables with a composite key.
    pub fn sort_key(mut self, value: impl Serialize) -> error::Result<Self> {
        let Some(sort_key) = self.schema.sort_key.clone() else {
            return Err(error::Error::NoSortKey {
                table: self.schema.table_name.clone(),
            });
        };
        let value = serde_dynamo::to_attribute_value(value)?;
        self.builder = self.builder.key(sort_key, value);
        Ok(self)
    }

    /// Assign a value to the path.
    pub fn set(
        mut self,
        path: impl Into<path::Path>,
        value: impl Serialize,
    ) -> error::Result<Self> {
        self.builder = self.builder.push_action(update::UpdateAction::Assign {
            path: path.into(),
            value: serde_dynamo::to_attribute_value(value)?,
            shift_on_failure: false,
        });
        Ok(self)
    }

    /// Assign a value to the path, shifting up when the store rejects the
    /// document path.
    pub fn set_with_shift(
        mut self,
        path: impl Into<path::Path>,
        value: impl Serialize,
    ) -> error::Result<Self> {
        self.builder = self.builder.push_action(update::UpdateAction::Assign {
            path: path.into(),
            value: serde_dynamo::to_attribute_value(value)?,
            shift_on_failure: true,
        });
        Ok(self)
    }

    /// Assign only when the path is still absent.
    pub fn write_once(
        mut self,
        path: impl Into<path::Path>,
        value: impl Serialize,
    ) -> error::Result<Self> {
        let path = path.into();
        self.builder = self.builder.push_action(update::UpdateAction::IfNotExists {
            check: path.clone(),
            path,
            value: path::Operand::value(value)?,
        });
        Ok(self)
    }

    /// Assign the result of `left op right`.
    pub fn arithmetic(
        mut self,
        path: impl Into<path::Path>,
        left: path::Operand,
        op: update::ArithmeticOp,
        right: path::Operand,
    ) -> Self {
        self.builder = self.builder.push_action(update::UpdateAction::Arithmetic {
            path: path.into(),
            left,
            op,
            right,
        });
        self
    }

    /// Add a delta to a number attribute, creating it when absent.
    pub fn add_number(
        mut self,
        path: impl Into<path::Path>,
        delta: impl Serialize,
    ) -> error::Result<Self> {
        self.builder = self.builder.push_action(update::UpdateAction::Add {
            path: path.into(),
            value: serde_dynamo::to_attribute_value(delta)?,
        });
        Ok(self)
    }

    /// Merge elements into a set attribute, creating it when absent.
    pub fn add_to_set(
        mut self,
        path: impl Into<path::Path>,
        values: update::SetValue,
    ) -> Self {
        self.builder = self.builder.push_action(update::UpdateAction::Add {
            path: path.into(),
            value: values.into(),
        });
        self
    }

    /// Append elements to the end of a list attribute.
    pub fn append(
        mut self,
        path: impl Into<path::Path>,
        elements: impl Serialize,
    ) -> error::Result<Self> {
        let action = list_splice(path.into(), elements, update::Position::End)?;
        self.builder = self.builder.push_action(action);
        Ok(self)
    }

    /// Splice elements at the front of a list attribute.
    pub fn prepend(
        mut self,
        path: impl Into<path::Path>,
        elements: impl Serialize,
    ) -> error::Result<Self> {
        let action = list_splice(path.into(), elements, update::Position::Start)?;
        self.builder = self.builder.push_action(action);
        Ok(self)
    }

    /// Remove the attribute at the path.
    pub fn remove(mut self, path: impl Into<path::Path>) -> Self {
        self.builder = self
            .builder
            .push_action(update::UpdateAction::Remove { path: path.into() });
        self
    }

    /// Remove elements from a set attribute.
    pub fn delete_from_set(
        mut self,
        path: impl Into<path::Path>,
        values: update::SetValue,
    ) -> Self {
        self.builder = self
            .builder
            .push_action(update::UpdateAction::DeleteElements {
                path: path.into(),
                values: values.into(),
            });
        self
    }

    /// Guard the update with a predicate on the currently stored item.
    pub fn when(
        mut self,
        path: impl Into<path::Path>,
        condition: condition::Condition,
    ) -> Self {
        self.builder = self.builder.condition(path, condition);
        self
    }

    /// Add a further predicate joined with `AND`.
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

    /// Add a further predicate joined with `OR`.
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

    /// Ask for the pre-update item in the outcome.
    pub fn return_old_values(mut self) -> Self {
        self.builder = self.builder.return_old_values(true);
        self
    }

    /// Execute the update, resubmitting shifted variants as needed.
    ///
    /// When every action was dropped the update is a no-op and no round trip
    /// happens.
    pub async fn send(mut self) -> error::Result<WriteOutcome<T>> {
        let mut attempts = 0;
        loop {
            let Some(request) = self.builder.build() else {
                return Ok(WriteOutcome::Applied(None));
            };
            tracing::debug!(?request, attempts, "sending update");
            match self.transport.update_item(request).await {
                Ok(old) => return Ok(WriteOutcome::Applied(super::deserialize_old(old)?)),
                Err(transport::TransportError::ConditionalCheckFailed) => {
                    return Ok(WriteOutcome::ConditionFailed);
                }
                Err(transport::TransportError::InvalidUpdatePath) => {
                    attempts += 1;
                    if attempts >= MAX_PATH_SHIFTS {
                        return Err(error::Error::PathShiftExhausted { attempts });
                    }
                    if self.builder.shift_paths_up() == 0 {
                        return Err(transport::TransportError::InvalidUpdatePath.into());
                    }
                    tracing::debug!(attempts, "document path rejected, shifting up");
                }
                Err(other) => return Err(other.into()),
            }
        }
    }
}

fn list_splice(
    path: path::Path,
    elements: impl Serialize,
    position: update::Position,
) -> error::Result<update::UpdateAction> {
    Ok(update::UpdateAction::ListAppend {
        target: path::Operand::path(path.clone()),
        elements: path::Operand::value(elements)?,
        path,
        position,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::expression::condition::Condition;
    use crate::expression::path::Path;
    use crate::transport::stub::{Call, Reply, StubTransport};
    use aws_sdk_dynamodb::types;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq, Serialize)]
    struct Order {
        order_id: String,
    }

    fn schema() -> schema::TableSchema {
        schema::TableSchema::new("orders", "order_id")
    }

    fn update_expression(call: &Call) -> String {
        let Call::Update(request) = call else {
            panic!("expected an update call");
        };
        request.update_expression.clone()
    }

    #[tokio::test]
    async fn test_plain_set_sends_once() {
        let schema = schema();
        let transport = StubTransport::new([Reply::Item(Ok(None))]);
        let outcome = Update::<Order>::new(&schema, &transport)
            .key("o-1")
            .unwrap()
            .set("status", "shipped")
            .unwrap()
            .send()
            .await
            .unwrap();
        assert_eq!(outcome, WriteOutcome::Applied(None));
        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(update_expression(&calls[0]), "SET #status = :status_0");
    }

    #[tokio::test]
    async fn test_no_op_update_skips_the_round_trip() {
        let schema = schema();
        let transport = StubTransport::default();
        let outcome = Update::<Order>::new(&schema, &transport)
            .key("o-1")
            .unwrap()
            .set("status", Option::<String>::None)
            .unwrap()
            .send()
            .await
            .unwrap();
        assert_eq!(outcome, WriteOutcome::Applied(None));
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_path_shifts_up_until_it_lands() {
        let schema = schema();
        let transport = StubTransport::new([
            Reply::Item(Err(transport::TransportError::InvalidUpdatePath)),
            Reply::Item(Err(transport::TransportError::InvalidUpdatePath)),
            Reply::Item(Ok(None)),
        ]);
        let outcome = Update::<Order>::new(&schema, &transport)
            .key("o-1")
            .unwrap()
            .set_with_shift(
                Path::root("shipping").field("addresses").field("home"),
                "Lisbon",
            )
            .unwrap()
            .send()
            .await
            .unwrap();
        assert_eq!(outcome, WriteOutcome::Applied(None));

        let calls = transport.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(
            update_expression(&calls[0]),
            "SET #shipping.#addresses.#home = :home_0"
        );
        assert_eq!(
            update_expression(&calls[1]),
            "SET #shipping.#addresses = :addresses_0"
        );
        assert_eq!(update_expression(&calls[2]), "SET #shipping = :shipping_0");

        // The final write carries the whole nested shape.
        let Call::Update(request) = &calls[2] else {
            panic!("expected an update call");
        };
        let values = request.expression_attribute_values.clone().unwrap();
        let expected = types::AttributeValue::M(std::collections::HashMap::from([(
            "addresses".to_string(),
            types::AttributeValue::M(std::collections::HashMap::from([(
                "home".to_string(),
                types::AttributeValue::S("Lisbon".to_string()),
            )])),
        )]));
        assert_eq!(values[":shipping_0"], expected);
    }

    #[tokio::test]
    async fn test_unshiftable_rejection_propagates() {
        let schema = schema();
        let transport = StubTransport::new([Reply::Item(Err(
            transport::TransportError::InvalidUpdatePath,
        ))]);
        let error = Update::<Order>::new(&schema, &transport)
            .key("o-1")
            .unwrap()
            .set(Path::root("shipping").field("city"), "Lisbon")
            .unwrap()
            .send()
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            error::Error::Transport(transport::TransportError::InvalidUpdatePath)
        ));
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_shift_rounds_are_bounded() {
        let schema = schema();
        let replies = (0..MAX_PATH_SHIFTS)
            .map(|_| Reply::Item(Err(transport::TransportError::InvalidUpdatePath)));
        let transport = StubTransport::new(replies);
        // Deep enough that segments never run out before the bound.
        let mut path = Path::root("a");
        for _ in 0..MAX_PATH_SHIFTS {
            path = path.field("n");
        }
        let error = Update::<Order>::new(&schema, &transport)
            .key("o-1")
            .unwrap()
            .set_with_shift(path, 1)
            .unwrap()
            .send()
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            error::Error::PathShiftExhausted {
                attempts: MAX_PATH_SHIFTS,
            }
        ));
        assert_eq!(transport.calls().len(), MAX_PATH_SHIFTS as usize);
    }

    #[tokio::test]
    async fn test_failed_condition_is_an_outcome() {
        let schema = schema();
        let transport = StubTransport::new([Reply::Item(Err(
            transport::TransportError::ConditionalCheckFailed,
        ))]);
        let outcome = Update::<Order>::new(&schema, &transport)
            .key("o-1")
            .unwrap()
            .set("status", "shipped")
            .unwrap()
            .when("status", Condition::equals("open").unwrap())
            .send()
            .await
            .unwrap();
        assert_eq!(outcome, WriteOutcome::ConditionFailed);
    }

    #[tokio::test]
    async fn test_action_mix_renders_grouped_clauses() {
        let schema = schema();
        let transport = StubTransport::new([Reply::Item(Ok(None))]);
        Update::<Order>::new(&schema, &transport)
            .key("o-1")
            .unwrap()
            .add_number("revision", 1)
            .unwrap()
            .remove("draft_note")
            .add_to_set("labels", update::SetValue::strings(["rush"]))
            .set("status", "shipped")
            .unwrap()
            .send()
            .await
            .unwrap();
        let calls = transport.calls();
        assert_eq!(
            update_expression(&calls[0]),
            "SET #status = :status_0 ADD #revision :revision_1, #labels :labels_2 REMOVE #draft_note"
        );
    }
}
