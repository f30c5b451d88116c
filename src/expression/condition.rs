use crate::expression::{path, placeholders};

use aws_sdk_dynamodb::types;
use serde::Serialize;

/// Boolean joiner placed between accumulated condition fragments.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogicalOperator {
    /// All fragments must hold.
    #[default]
    And,
    /// At least one fragment must hold.
    Or,
}

impl LogicalOperator {
    fn as_wire(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

/// Comparison operator of the wire grammar.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Comparison {
    /// `=`
    Equal,
    /// `<>`
    NotEqual,
    /// `<`
    LessThan,
    /// `<=`
    LessThanOrEqual,
    /// `>`
    GreaterThan,
    /// `>=`
    GreaterThanOrEqual,
}

impl Comparison {
    fn as_wire(self) -> &'static str {
        match self {
            Self::Equal => "=",
            Self::NotEqual => "<>",
            Self::LessThan => "<",
            Self::LessThanOrEqual => "<=",
            Self::GreaterThan => ">",
            Self::GreaterThanOrEqual => ">=",
        }
    }
}

/// Wire type tags accepted by `attribute_type(..)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttributeType {
    /// String.
    String,
    /// String set.
    StringSet,
    /// Number.
    Number,
    /// Number set.
    NumberSet,
    /// Binary.
    Binary,
    /// Binary set.
    BinarySet,
    /// Boolean.
    Boolean,
    /// Null.
    Null,
    /// List.
    List,
    /// Map.
    Map,
}

impl AttributeType {
    fn as_wire(self) -> &'static str {
        match self {
            Self::String => "S",
            Self::StringSet => "SS",
            Self::Number => "N",
            Self::NumberSet => "NS",
            Self::Binary => "B",
            Self::BinarySet => "BS",
            Self::Boolean => "BOOL",
            Self::Null => "NULL",
            Self::List => "L",
            Self::Map => "M",
        }
    }
}

/// A single predicate against one attribute path.
///
/// The variant tag drives rendering; operands are wire values fixed at
/// construction.
///
/// ```rust
/// use dynamodb_adapter::expression::condition::Condition;
///
/// let active = Condition::equals("active").unwrap();
/// let adult = Condition::greater_than_or_equal(18).unwrap();
/// let known = Condition::Exists;
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum Condition {
    /// Binary comparison against a literal.
    Compare(Comparison, types::AttributeValue),
    /// The attribute is present on the item.
    Exists,
    /// The attribute is absent from the item.
    NotExists,
    /// String attribute starts with the given prefix.
    BeginsWith(types::AttributeValue),
    /// String or set attribute contains the given value.
    Contains(types::AttributeValue),
    /// The attribute has the given wire type.
    AttributeType(AttributeType),
    /// The attribute equals one of the listed values.
    InList(Vec<types::AttributeValue>),
    /// The attribute lies between the two bounds, inclusive.
    Between(types::AttributeValue, types::AttributeValue),
}

impl Condition {
    /// `path = value`
    pub fn equals(value: impl Serialize) -> serde_dynamo::Result<Self> {
        Ok(Self::Compare(
            Comparison::Equal,
            serde_dynamo::to_attribute_value(value)?,
        ))
    }

    /// `path <> value`
    pub fn not_equal(value: impl Serialize) -> serde_dynamo::Result<Self> {
        Ok(Self::Compare(
            Comparison::NotEqual,
            serde_dynamo::to_attribute_value(value)?,
        ))
    }

    /// `path < value`
    pub fn less_than(value: impl Serialize) -> serde_dynamo::Result<Self> {
        Ok(Self::Compare(
            Comparison::LessThan,
            serde_dynamo::to_attribute_value(value)?,
        ))
    }

    /// `path <= value`
    pub fn less_than_or_equal(value: impl Serialize) -> serde_dynamo::Result<Self> {
        Ok(Self::Compare(
            Comparison::LessThanOrEqual,
            serde_dynamo::to_attribute_value(value)?,
        ))
    }

    /// `path > value`
    pub fn greater_than(value: impl Serialize) -> serde_dynamo::Result<Self> {
        Ok(Self::Compare(
            Comparison::GreaterThan,
            serde_dynamo::to_attribute_value(value)?,
        ))
    }

    /// `path >= value`
    pub fn greater_than_or_equal(value: impl Serialize) -> serde_dynamo::Result<Self> {
        Ok(Self::Compare(
            Comparison::GreaterThanOrEqual,
            serde_dynamo::to_attribute_value(value)?,
        ))
    }

    /// `begins_with(path, prefix)`
    pub fn begins_with(prefix: impl Into<String>) -> Self {
        Self::BeginsWith(types::AttributeValue::S(prefix.into()))
    }

    /// `contains(path, value)`
    pub fn contains(value: impl Serialize) -> serde_dynamo::Result<Self> {
        Ok(Self::Contains(serde_dynamo::to_attribute_value(value)?))
    }

    /// `path IN (v1, v2, ...)`
    pub fn in_list<T: Serialize>(values: Vec<T>) -> serde_dynamo::Result<Self> {
        let values = values
            .into_iter()
            .map(serde_dynamo::to_attribute_value)
            .collect::<serde_dynamo::Result<Vec<_>>>()?;
        Ok(Self::InList(values))
    }

    /// `path BETWEEN lower AND upper`
    pub fn between(
        lower: impl Serialize,
        upper: impl Serialize,
    ) -> serde_dynamo::Result<Self> {
        Ok(Self::Between(
            serde_dynamo::to_attribute_value(lower)?,
            serde_dynamo::to_attribute_value(upper)?,
        ))
    }

    /// Render the predicate into one boolean sub-expression.
    ///
    /// `None` means an operand collapsed (null literal) and the fragment is
    /// dropped.
    pub(crate) fn render(
        self,
        target: &path::Path,
        map: &mut placeholders::AttributeMap,
    ) -> Option<String> {
        let name = map.add_name(target);
        match self {
            Self::Compare(comparison, value) => {
                let value = map.add_value(target, value)?;
                Some(format!("{name} {} {value}", comparison.as_wire()))
            }
            Self::Exists => Some(format!("attribute_exists({name})")),
            Self::NotExists => Some(format!("attribute_not_exists({name})")),
            Self::BeginsWith(prefix) => {
                let prefix = map.add_value(target, prefix)?;
                Some(format!("begins_with({name}, {prefix})"))
            }
            Self::Contains(value) => {
                let value = map.add_value(target, value)?;
                Some(format!("contains({name}, {value})"))
            }
            Self::AttributeType(attribute_type) => {
                let tag = map.add_value(
                    target,
                    types::AttributeValue::S(attribute_type.as_wire().to_string()),
                )?;
                Some(format!("attribute_type({name}, {tag})"))
            }
            Self::InList(values) => {
                if values.is_empty() {
                    return None;
                }
                let placeholders = values
                    .into_iter()
                    .map(|value| map.add_value(target, value))
                    .collect::<Option<Vec<_>>>()?;
                Some(format!("{name} IN ({})", placeholders.join(", ")))
            }
            Self::Between(lower, upper) => {
                let lower = map.add_value(target, lower)?;
                let upper = map.add_value(target, upper)?;
                Some(format!("{name} BETWEEN {lower} AND {upper}"))
            }
        }
    }
}

/// Ordered list of rendered condition fragments with their joiners.
///
/// The first fragment carries no joiner; every later fragment is preceded by
/// the joiner selected at the time it was pushed.
#[derive(Debug, Default)]
pub(crate) struct ConditionList {
    parts: Vec<String>,
    joiner: LogicalOperator,
}

impl ConditionList {
    pub(crate) fn set_joiner(&mut self, joiner: LogicalOperator) {
        self.joiner = joiner;
    }

    pub(crate) fn push(&mut self, fragment: String) {
        if !self.parts.is_empty() {
            self.parts.push(self.joiner.as_wire().to_string());
        }
        self.parts.push(fragment);
    }

    pub(crate) fn render(&self) -> Option<String> {
        (!self.parts.is_empty()).then(|| self.parts.join(" "))
    }
}
