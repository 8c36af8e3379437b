//! Restricted JSONPath-style query engine over the model document.
//!
//! Supported grammar:
//!
//! - `$` root (mandatory prefix)
//! - `.field` / `.*` child access
//! - `..*` every descendant of the current nodes
//! - `['key']` / `[*]` child access in bracket form
//! - `[@.field is 'value']` children whose `field` equals `value`

use serde_json::Value;

use crate::core::error::{Result, SensiError};
use crate::core::syntax::strip_quotes;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Step {
    Child(String),
    Children,
    Descendants,
    Filter { field: String, value: String },
}

/// A compiled query expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    steps: Vec<Step>,
}

impl Query {
    pub fn parse(expr: &str) -> Result<Self> {
        let expr = expr.trim();
        let mut rest = expr
            .strip_prefix('$')
            .ok_or_else(|| SensiError::query(format!("query must start with '$': '{expr}'")))?;
        let mut steps = Vec::new();

        while !rest.is_empty() {
            if let Some(after) = rest.strip_prefix("..*") {
                steps.push(Step::Descendants);
                rest = after;
            } else if let Some(after) = rest.strip_prefix('.') {
                let end = after.find(['.', '[']).unwrap_or(after.len());
                let field = after[..end].trim();
                match field {
                    "" => {
                        return Err(SensiError::query(format!("empty field name in '{expr}'")));
                    }
                    "*" => steps.push(Step::Children),
                    _ => steps.push(Step::Child(field.to_string())),
                }
                rest = &after[end..];
            } else if let Some(after) = rest.strip_prefix('[') {
                let close = closing_bracket(after)
                    .ok_or_else(|| SensiError::query(format!("unclosed '[' in '{expr}'")))?;
                steps.push(parse_bracket(after[..close].trim(), expr)?);
                rest = &after[close + 1..];
            } else {
                return Err(SensiError::query(format!(
                    "unexpected '{}' in '{expr}'",
                    rest.chars().next().unwrap_or_default()
                )));
            }
        }

        Ok(Self { steps })
    }

    /// Every node matched by the query, in document order.
    pub fn evaluate<'a>(&self, document: &'a Value) -> Vec<&'a Value> {
        let mut current = vec![document];
        for step in &self.steps {
            let mut next = Vec::new();
            for node in current {
                match step {
                    Step::Child(name) => next.extend(node.get(name.as_str())),
                    Step::Children => next.extend(children(node)),
                    Step::Descendants => collect_descendants(node, &mut next),
                    Step::Filter { field, value } => next.extend(
                        children(node).filter(|child| field_matches(child, field, value)),
                    ),
                }
            }
            current = next;
        }
        current
    }
}

/// Evaluate `expr` against `document`.
///
/// A lone string match is split on whitespace into one value per token, and a
/// lone array match is flattened into its elements. No match is an empty list.
pub fn query(document: &Value, expr: &str) -> Result<Vec<Value>> {
    let matches = Query::parse(expr)?.evaluate(document);
    let values = match matches.as_slice() {
        [] => Vec::new(),
        [Value::String(text)] => text
            .split_whitespace()
            .map(|token| Value::String(token.to_string()))
            .collect(),
        [Value::Array(items)] => items.clone(),
        _ => matches.iter().copied().cloned().collect(),
    };
    Ok(values)
}

fn parse_bracket(inner: &str, expr: &str) -> Result<Step> {
    if inner == "*" {
        return Ok(Step::Children);
    }
    if let Some(predicate) = inner.strip_prefix("@.") {
        let (field, value) = predicate.split_once(" is ").ok_or_else(|| {
            SensiError::query(format!("expected '@.<field> is <value>' in '{expr}'"))
        })?;
        return Ok(Step::Filter {
            field: field.trim().to_string(),
            value: strip_quotes(value.trim()).to_string(),
        });
    }
    let key = strip_quotes(inner);
    if key.len() == inner.len() || key.is_empty() {
        return Err(SensiError::query(format!(
            "expected a quoted key inside [...] in '{expr}'"
        )));
    }
    Ok(Step::Child(key.to_string()))
}

/// Offset of the first `]` outside single or double quotes.
fn closing_bracket(after: &str) -> Option<usize> {
    let mut quote = None;
    for (offset, ch) in after.char_indices() {
        match (quote, ch) {
            (None, '\'' | '"') => quote = Some(ch),
            (Some(open), _) if open == ch => quote = None,
            (None, ']') => return Some(offset),
            _ => {}
        }
    }
    None
}

fn children(node: &Value) -> Box<dyn Iterator<Item = &Value> + '_> {
    match node {
        Value::Object(map) => Box::new(map.values()),
        Value::Array(items) => Box::new(items.iter()),
        _ => Box::new(std::iter::empty()),
    }
}

fn collect_descendants<'a>(node: &'a Value, out: &mut Vec<&'a Value>) {
    for child in children(node) {
        out.push(child);
        collect_descendants(child, out);
    }
}

fn field_matches(node: &Value, field: &str, expected: &str) -> bool {
    match node.get(field) {
        Some(Value::String(text)) => text == expected,
        Some(Value::Number(number)) => number.to_string() == expected,
        Some(Value::Bool(flag)) => flag.to_string() == expected,
        _ => false,
    }
}
