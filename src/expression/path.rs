use crate::expression::placeholders;

use aws_sdk_dynamodb::types;
use serde::Serialize;
use std::fmt;

/// One step of an attribute path: a field name or a list index.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Segment {
    /// A named field inside a map (or at the top level of the item).
    Field(String),
    /// A numeric position inside a list.
    Index(usize),
}

/// A route into a nested item attribute, e.g. `shipping.addresses[0].city`.
///
/// A path is never empty and always starts with a field name; the
/// constructors make both invariants unrepresentable.
///
/// Field names are expected to stay within `[A-Za-z0-9_]`, because they are
/// embedded verbatim in `#name` placeholder tokens on the wire.
///
/// ```rust
/// use dynamodb_adapter::expression::path::Path;
///
/// let path = Path::root("shipping").field("addresses").index(0).field("city");
/// assert_eq!(path.to_string(), "shipping.addresses[0].city");
/// ```
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Path {
    segments: Vec<Segment>,
}

impl Path {
    /// Start a path at a top-level field.
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            segments: vec![Segment::Field(name.into())],
        }
    }

    /// Descend into a named field.
    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.segments.push(Segment::Field(name.into()));
        self
    }

    /// Descend into a list element.
    pub fn index(mut self, index: usize) -> Self {
        self.segments.push(Segment::Index(index));
        self
    }

    /// Number of segments in the path.
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Whether the path addresses a top-level attribute.
    pub fn is_top_level(&self) -> bool {
        self.segments.len() == 1
    }

    /// The top-level attribute name the path starts at.
    pub fn root_name(&self) -> &str {
        match &self.segments[0] {
            Segment::Field(name) => name,
            // Unreachable: constructors only ever start a path with a field.
            Segment::Index(_) => "",
        }
    }

    pub(crate) fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Remove and return the deepest segment, refusing to empty the path.
    pub(crate) fn pop_deepest(&mut self) -> Option<Segment> {
        if self.segments.len() > 1 {
            self.segments.pop()
        } else {
            None
        }
    }

    /// Stem used for value placeholder tokens: the deepest field name.
    pub(crate) fn value_stem(&self) -> &str {
        self.segments
            .iter()
            .rev()
            .find_map(|segment| match segment {
                Segment::Field(name) => Some(name.as_str()),
                Segment::Index(_) => None,
            })
            .unwrap_or_default()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Field(name) => {
                    if position > 0 {
                        formatter.write_str(".")?;
                    }
                    formatter.write_str(name)?;
                }
                Segment::Index(index) => write!(formatter, "[{index}]")?,
            }
        }
        Ok(())
    }
}

impl From<&str> for Path {
    fn from(name: &str) -> Self {
        Self::root(name)
    }
}

impl From<String> for Path {
    fn from(name: String) -> Self {
        Self::root(name)
    }
}

/// Either a literal value or a reference to another attribute path.
///
/// The distinction is made by the caller at the API boundary, never inferred
/// from the runtime shape of a value.
#[derive(Clone, Debug, PartialEq)]
pub enum Operand {
    /// A literal wire value.
    Value(types::AttributeValue),
    /// A reference to an attribute path in the stored item.
    Path(Path),
}

impl Operand {
    /// Build a literal operand from any serializable value.
    pub fn value(value: impl Serialize) -> serde_dynamo::Result<Self> {
        Ok(Self::Value(serde_dynamo::to_attribute_value(value)?))
    }

    /// Build a path operand.
    pub fn path(path: impl Into<Path>) -> Self {
        Self::Path(path.into())
    }

    /// Render the operand as a placeholder token; `None` drops the enclosing
    /// action.
    pub(crate) fn render(
        &self,
        target: &Path,
        map: &mut placeholders::AttributeMap,
    ) -> Option<String> {
        match self {
            Self::Value(value) => map.add_value(target, value.clone()),
            Self::Path(path) => Some(map.add_name(path)),
        }
    }
}
