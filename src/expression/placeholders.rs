use crate::expression::path;

use aws_sdk_dynamodb::types;
use indexmap::IndexMap;
use std::collections;

const NAME_TOKEN: char = '#';
const VALUE_TOKEN: char = ':';

/// Placeholder tables for one wire request.
///
/// Name placeholders are deduplicated by attribute name, so the same
/// top-level name always resolves to the same `#token`. Value placeholders
/// are minted from a per-instance counter and never reused, because the wire
/// grammar requires distinct `:tokens` even for identical literals.
///
/// Each builder owns exactly one `AttributeMap`; instances are never shared
/// across in-flight operations.
#[derive(Debug, Default)]
pub struct AttributeMap {
    names: IndexMap<String, String>,
    values: IndexMap<String, types::AttributeValue>,
    value_counter: usize,
}

impl AttributeMap {
    /// Render a path as a placeholder expression, registering a name
    /// placeholder per field segment.
    ///
    /// Field segments join with `.`; index segments render as a bracketed
    /// suffix on the preceding token and never get their own placeholder.
    ///
    /// Field names must stay within `[A-Za-z0-9_]`: the name is embedded in
    /// the `#token` verbatim, and the pruning scan recognizes tokens by that
    /// alphabet.
    pub fn add_name(&mut self, path: &path::Path) -> String {
        let mut rendered = String::new();
        for segment in path.segments() {
            match segment {
                path::Segment::Field(name) => {
                    let placeholder = self
                        .names
                        .entry(name.clone())
                        .or_insert_with(|| format!("{NAME_TOKEN}{name}"));
                    if !rendered.is_empty() {
                        rendered.push('.');
                    }
                    rendered.push_str(placeholder);
                }
                path::Segment::Index(index) => {
                    rendered.push('[');
                    rendered.push_str(&index.to_string());
                    rendered.push(']');
                }
            }
        }
        rendered
    }

    /// Register a literal and return its fresh value placeholder.
    ///
    /// Returns `None` for a null literal; callers treat that as "skip this
    /// action", which is how no-op updates are silently dropped.
    ///
    /// The counter is separated from the stem by an underscore so that a
    /// digit-suffixed stem cannot run into the counter digits of another
    /// registration and mint the same token twice.
    pub fn add_value(
        &mut self,
        path: &path::Path,
        value: types::AttributeValue,
    ) -> Option<String> {
        if matches!(value, types::AttributeValue::Null(_)) {
            return None;
        }
        let placeholder = format!("{VALUE_TOKEN}{}_{}", path.value_stem(), self.value_counter);
        self.value_counter += 1;
        self.values.insert(placeholder.clone(), value);
        Some(placeholder)
    }

    /// Emit the name placeholder table, pruned to tokens actually present in
    /// the final expression strings.
    ///
    /// Unreferenced entries are a protocol violation for the wire format and
    /// must not appear.
    pub fn expression_attribute_names(
        &self,
        expressions: &[Option<&str>],
    ) -> Option<collections::HashMap<String, String>> {
        let tokens = referenced_tokens(expressions, NAME_TOKEN);
        let names: collections::HashMap<_, _> = self
            .names
            .iter()
            .filter(|(_, placeholder)| tokens.contains(placeholder.as_str()))
            .map(|(name, placeholder)| (placeholder.clone(), name.clone()))
            .collect();
        (!names.is_empty()).then_some(names)
    }

    /// Emit the value placeholder table, pruned like
    /// [`Self::expression_attribute_names`].
    pub fn expression_attribute_values(
        &self,
        expressions: &[Option<&str>],
    ) -> Option<collections::HashMap<String, types::AttributeValue>> {
        let tokens = referenced_tokens(expressions, VALUE_TOKEN);
        let values: collections::HashMap<_, _> = self
            .values
            .iter()
            .filter(|(placeholder, _)| tokens.contains(placeholder.as_str()))
            .map(|(placeholder, value)| (placeholder.clone(), value.clone()))
            .collect();
        (!values.is_empty()).then_some(values)
    }
}

/// Collect every `marker`-prefixed word token appearing in the expressions.
fn referenced_tokens(
    expressions: &[Option<&str>],
    marker: char,
) -> collections::HashSet<String> {
    let mut tokens = collections::HashSet::new();
    for expression in expressions.iter().flatten() {
        let mut rest = *expression;
        while let Some(start) = rest.find(marker) {
            let body: String = rest[start + 1..]
                .chars()
                .take_while(|character| character.is_alphanumeric() || *character == '_')
                .collect();
            let consumed = start + 1 + body.len();
            if !body.is_empty() {
                tokens.insert(format!("{marker}{body}"));
            }
            rest = &rest[consumed..];
        }
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::expression::path::Path;

    #[test]
    fn test_same_name_yields_identical_placeholder() {
        let mut map = AttributeMap::default();
        let first = map.add_name(&Path::root("status"));
        let second = map.add_name(&Path::root("status"));
        assert_eq!(first, "#status");
        assert_eq!(first, second);
    }

    #[test]
    fn test_nested_path_renders_dotted_with_bracketed_indexes() {
        let mut map = AttributeMap::default();
        let rendered = map.add_name(&Path::root("shipping").field("addresses").index(0).field("city"));
        assert_eq!(rendered, "#shipping.#addresses[0].#city");
    }

    #[test]
    fn test_same_literal_yields_distinct_value_placeholders() {
        let mut map = AttributeMap::default();
        let first = map
            .add_value(&Path::root("age"), types::AttributeValue::N("7".to_string()))
            .unwrap();
        let second = map
            .add_value(&Path::root("age"), types::AttributeValue::N("7".to_string()))
            .unwrap();
        assert_eq!(first, ":age_0");
        assert_eq!(second, ":age_1");
        assert_ne!(first, second);
    }

    #[test]
    fn test_digit_suffixed_stems_mint_distinct_tokens() {
        // `line1` at counter 0 and `line` at counter 10 must not both
        // render as `:line10`.
        let mut map = AttributeMap::default();
        let first = map
            .add_value(&Path::root("line1"), types::AttributeValue::N("1".to_string()))
            .unwrap();
        for _ in 0..9 {
            map.add_value(&Path::root("pad"), types::AttributeValue::N("0".to_string()))
                .unwrap();
        }
        let eleventh = map
            .add_value(&Path::root("line"), types::AttributeValue::N("2".to_string()))
            .unwrap();
        assert_eq!(first, ":line1_0");
        assert_eq!(eleventh, ":line_10");
        assert_ne!(first, eleventh);
    }

    #[test]
    fn test_null_literal_is_skipped() {
        let mut map = AttributeMap::default();
        let placeholder = map.add_value(&Path::root("age"), types::AttributeValue::Null(true));
        assert_eq!(placeholder, None);
    }

    #[test]
    fn test_unreferenced_placeholders_are_pruned() {
        let mut map = AttributeMap::default();
        let name = map.add_name(&Path::root("status"));
        map.add_name(&Path::root("orphan"));
        let value = map
            .add_value(
                &Path::root("status"),
                types::AttributeValue::S("open".to_string()),
            )
            .unwrap();
        map.add_value(
            &Path::root("orphan"),
            types::AttributeValue::S("unused".to_string()),
        )
        .unwrap();

        let expression = format!("{name} = {value}");
        let names = map
            .expression_attribute_names(&[Some(expression.as_str())])
            .unwrap();
        let values = map
            .expression_attribute_values(&[Some(expression.as_str())])
            .unwrap();
        assert_eq!(names, collections::HashMap::from([("#status".to_string(), "status".to_string())]));
        assert_eq!(values.len(), 1);
        assert!(values.contains_key(":status_0"));
    }

    #[test]
    fn test_empty_tables_are_omitted() {
        let map = AttributeMap::default();
        assert_eq!(map.expression_attribute_names(&[Some("a = b")]), None);
        assert_eq!(map.expression_attribute_values(&[None]), None);
    }

    #[test]
    fn test_tokens_found_across_multiple_expressions() {
        let mut map = AttributeMap::default();
        let first = map.add_name(&Path::root("a"));
        let second = map.add_name(&Path::root("b"));
        let names = map
            .expression_attribute_names(&[
                Some(&format!("attribute_exists({first})")),
                Some(&format!("{second} = :b_0")),
            ])
            .unwrap();
        assert_eq!(names.len(), 2);
    }
}
