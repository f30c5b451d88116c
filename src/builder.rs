//! Per-operation request builders.
//!
//! Each builder owns one placeholder table per rendered request and emits a
//! plain request value from `src/request.rs`; nothing here talks to the
//! store.

use crate::expression::{condition, path, placeholders};

/// Delete request builder.
pub mod delete;

/// Get request builder.
pub mod get;

/// Put request builder.
pub mod put;

/// Query request builder.
pub mod query;

/// Update request builder.
pub mod update;

/// Accumulated predicates, each remembering the joiner that precedes it.
#[derive(Clone, Debug, Default)]
pub(crate) struct ConditionSet {
    entries: Vec<(condition::LogicalOperator, path::Path, condition::Condition)>,
}

impl ConditionSet {
    pub(crate) fn push(
        &mut self,
        joiner: condition::LogicalOperator,
        path: path::Path,
        condition: condition::Condition,
    ) {
        self.entries.push((joiner, path, condition));
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render every predicate into one expression; dropped fragments simply
    /// do not appear.
    pub(crate) fn render(
        &self,
        map: &mut placeholders::AttributeMap,
    ) -> Option<String> {
        let mut list = condition::ConditionList::default();
        for (joiner, path, condition) in &self.entries {
            if let Some(fragment) = condition.clone().render(path, map) {
                list.set_joiner(*joiner);
                list.push(fragment);
            }
        }
        list.render()
    }
}

/// Render a projection as a comma-separated placeholder list.
///
/// Repeated paths render once; the store rejects overlapping document paths
/// in a projection.
pub(crate) fn render_projection(
    paths: &[path::Path],
    map: &mut placeholders::AttributeMap,
) -> Option<String> {
    if paths.is_empty() {
        return None;
    }
    let mut rendered: Vec<String> = Vec::new();
    for path in paths {
        let placeholder = map.add_name(path);
        if !rendered.contains(&placeholder) {
            rendered.push(placeholder);
        }
    }
    Some(rendered.join(", "))
}
