use crate::expression::{path, placeholders};

use aws_sdk_dynamodb::types;
use indexmap::IndexMap;

/// Update expression verb an action belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum UpdateVerb {
    /// `SET`
    Set,
    /// `ADD`
    Add,
    /// `REMOVE`
    Remove,
    /// `DELETE`
    Delete,
}

impl UpdateVerb {
    const CLAUSE_ORDER: [Self; 4] = [Self::Set, Self::Add, Self::Remove, Self::Delete];

    fn as_wire(self) -> &'static str {
        match self {
            Self::Set => "SET",
            Self::Add => "ADD",
            Self::Remove => "REMOVE",
            Self::Delete => "DELETE",
        }
    }
}

/// Operator of a `SET path = a op b` action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArithmeticOp {
    /// `+`
    Add,
    /// `-`
    Subtract,
}

impl ArithmeticOp {
    fn as_wire(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Subtract => "-",
        }
    }
}

/// Which end of the list `list_append` extends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Position {
    /// Prepend the new elements.
    Start,
    /// Append the new elements.
    End,
}

/// A set literal for `ADD` and `DELETE` actions, which only accept set
/// operands on the wire.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SetValue {
    /// A string set.
    StringSet(Vec<String>),
    /// A number set, elements in decimal notation.
    NumberSet(Vec<String>),
}

impl SetValue {
    /// A string set from any iterable of strings.
    pub fn strings(values: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::StringSet(values.into_iter().map(Into::into).collect())
    }

    /// A number set from any iterable of displayable numbers.
    pub fn numbers(values: impl IntoIterator<Item = impl ToString>) -> Self {
        Self::NumberSet(values.into_iter().map(|value| value.to_string()).collect())
    }
}

impl From<SetValue> for types::AttributeValue {
    fn from(value: SetValue) -> Self {
        match value {
            SetValue::StringSet(values) => Self::Ss(values),
            SetValue::NumberSet(values) => Self::Ns(values),
        }
    }
}

/// One update action targeting a single attribute path.
#[derive(Clone, Debug, PartialEq)]
pub enum UpdateAction {
    /// `SET path = value`
    Assign {
        /// Target path.
        path: path::Path,
        /// Literal assigned to the path.
        value: types::AttributeValue,
        /// Whether the action participates in shift-up recovery when the
        /// store rejects the document path.
        shift_on_failure: bool,
    },
    /// `SET path = if_not_exists(check, value)`
    IfNotExists {
        /// Target path.
        path: path::Path,
        /// Path probed for existence.
        check: path::Path,
        /// Fallback operand used when `check` is absent.
        value: path::Operand,
    },
    /// `SET path = left op right`
    Arithmetic {
        /// Target path.
        path: path::Path,
        /// Left operand.
        left: path::Operand,
        /// `+` or `-`.
        op: ArithmeticOp,
        /// Right operand.
        right: path::Operand,
    },
    /// `SET path = list_append(..)`
    ListAppend {
        /// Target path.
        path: path::Path,
        /// The existing list.
        target: path::Operand,
        /// The elements spliced in.
        elements: path::Operand,
        /// Which end receives the elements.
        position: Position,
    },
    /// `ADD path value` for numbers and sets.
    Add {
        /// Target path.
        path: path::Path,
        /// Number delta or set of elements to merge.
        value: types::AttributeValue,
    },
    /// `DELETE path values` removing elements from a set.
    DeleteElements {
        /// Target path.
        path: path::Path,
        /// Set elements to remove.
        values: types::AttributeValue,
    },
    /// `REMOVE path`
    Remove {
        /// Target path.
        path: path::Path,
    },
}

impl UpdateAction {
    pub(crate) fn verb(&self) -> UpdateVerb {
        match self {
            Self::Assign { .. }
            | Self::IfNotExists { .. }
            | Self::Arithmetic { .. }
            | Self::ListAppend { .. } => UpdateVerb::Set,
            Self::Add { .. } => UpdateVerb::Add,
            Self::Remove { .. } => UpdateVerb::Remove,
            Self::DeleteElements { .. } => UpdateVerb::Delete,
        }
    }

    pub(crate) fn path(&self) -> &path::Path {
        match self {
            Self::Assign { path, .. }
            | Self::IfNotExists { path, .. }
            | Self::Arithmetic { path, .. }
            | Self::ListAppend { path, .. }
            | Self::Add { path, .. }
            | Self::DeleteElements { path, .. }
            | Self::Remove { path } => path,
        }
    }

    /// Render the action into one clause fragment; `None` drops the action.
    pub(crate) fn render(&self, map: &mut placeholders::AttributeMap) -> Option<String> {
        match self {
            Self::Assign { path, value, .. } => {
                let name = map.add_name(path);
                let value = map.add_value(path, value.clone())?;
                Some(format!("{name} = {value}"))
            }
            Self::IfNotExists { path, check, value } => {
                let name = map.add_name(path);
                let check = map.add_name(check);
                let value = value.render(path, map)?;
                Some(format!("{name} = if_not_exists({check}, {value})"))
            }
            Self::Arithmetic {
                path,
                left,
                op,
                right,
            } => {
                let name = map.add_name(path);
                let left = left.render(path, map)?;
                let right = right.render(path, map)?;
                Some(format!("{name} = {left} {} {right}", op.as_wire()))
            }
            Self::ListAppend {
                path,
                target,
                elements,
                position,
            } => {
                let name = map.add_name(path);
                let target = target.render(path, map)?;
                let elements = elements.render(path, map)?;
                let (first, second) = match position {
                    Position::End => (target, elements),
                    Position::Start => (elements, target),
                };
                Some(format!("{name} = list_append({first}, {second})"))
            }
            Self::Add { path, value } => {
                let name = map.add_name(path);
                let value = map.add_value(path, value.clone())?;
                Some(format!("{name} {value}"))
            }
            Self::DeleteElements { path, values } => {
                let name = map.add_name(path);
                let values = map.add_value(path, values.clone())?;
                Some(format!("{name} {values}"))
            }
            Self::Remove { path } => Some(map.add_name(path)),
        }
    }

    /// Retarget the action one level up, wrapping its value so the stored
    /// shape is preserved.
    ///
    /// Only assignments opted into shift recovery are eligible, and a
    /// top-level assignment cannot shift further.
    fn shift_up(&mut self) -> bool {
        let Self::Assign {
            path,
            value,
            shift_on_failure: true,
        } = self
        else {
            return false;
        };
        let Some(popped) = path.pop_deepest() else {
            return false;
        };
        let inner = std::mem::replace(value, types::AttributeValue::Null(true));
        *value = match popped {
            path::Segment::Field(name) => {
                types::AttributeValue::M(std::collections::HashMap::from([(name, inner)]))
            }
            path::Segment::Index(_) => types::AttributeValue::L(vec![inner]),
        };
        true
    }
}

/// Accumulated update actions, keyed by target path.
///
/// A later action on the same path replaces the earlier one wholesale, so a
/// builder can be corrected in place before the round trip.
#[derive(Clone, Debug, Default)]
pub struct UpdateActionList {
    actions: IndexMap<String, UpdateAction>,
}

impl UpdateActionList {
    /// Record an action, replacing any earlier action on the same path.
    pub fn push(&mut self, action: UpdateAction) {
        self.actions.insert(action.path().to_string(), action);
    }

    /// Whether no actions have been recorded.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Render the full update expression, verbs grouped into fixed-order
    /// clauses.
    ///
    /// `None` means every action was dropped and no round trip is needed.
    pub(crate) fn render(&self, map: &mut placeholders::AttributeMap) -> Option<String> {
        let mut clauses = Vec::new();
        for verb in UpdateVerb::CLAUSE_ORDER {
            let fragments: Vec<_> = self
                .actions
                .values()
                .filter(|action| action.verb() == verb)
                .filter_map(|action| action.render(map))
                .collect();
            if !fragments.is_empty() {
                clauses.push(format!("{} {}", verb.as_wire(), fragments.join(", ")));
            }
        }
        (!clauses.is_empty()).then(|| clauses.join(" "))
    }

    /// Shift every eligible action one level up, returning how many moved.
    pub(crate) fn shift_paths_up(&mut self) -> usize {
        let mut shifted = 0;
        let actions = std::mem::take(&mut self.actions);
        for (_, mut action) in actions {
            if action.shift_up() {
                shifted += 1;
            }
            self.actions.insert(action.path().to_string(), action);
        }
        shifted
    }
}
