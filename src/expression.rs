//! Wire expression construction: attribute paths, placeholder tables,
//! condition predicates, and update actions.

/// Condition predicates and boolean joiners.
pub mod condition;

/// Attribute paths and operands.
pub mod path;

/// Placeholder deduplication and pruning.
pub mod placeholders;

/// Update actions and the verb-grouped update expression.
pub mod update;
