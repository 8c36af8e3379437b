//! Directive parser.
//!
//! A directive is either a plain substitution (`<addr> = <value>`) or a file
//! directive (`file::<addr>[col].where<cond> = <value>`). File directives are
//! compiled into a query expression that locates the input file name inside
//! the model document.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::core::error::{Result, SensiError};

const FILE_MARKER: &str = "file::";
const WHERE_MARKER: &str = ".where";
const FLAT_PREFIX: &str = "$.framework.sensi_1.";
const FILENAME_SUFFIX: &str = ".filename";

static ECO_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| segment_regex("eco").expect("static eco segment regex"));
static DRIVER_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| segment_regex("driver").expect("static driver segment regex"));

fn segment_regex(prefix: &str) -> std::result::Result<Regex, regex::Error> {
    Regex::new(&format!(
        r"(?:^|\.)(?:(?P<key>{prefix}_\d+)|{prefix}\[(?P<name>[^\]]+)\])\."
    ))
}

/// Whether a directive carried the `file::` marker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectiveKind {
    #[default]
    Substitution,
    File,
}

/// Parsed form of one directive. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Syntax {
    pub kind: DirectiveKind,
    /// Query string for file directives, raw address for plain substitutions.
    pub expression: String,
    /// Column/row selector text found inside the trailing `[...]`.
    pub col: Option<String>,
    /// Boolean row filter found after `.where`.
    pub condition: Option<String>,
    /// Right-hand side of the assignment.
    pub value: Option<String>,
}

impl Syntax {
    /// True when the directive addresses an input file rather than a parameter.
    pub fn is_file_directive(&self) -> bool {
        self.kind == DirectiveKind::File
    }
}

/// Identifier of an eco or driver subtree, as written in the directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ident {
    /// Positional key form, e.g. `eco_1`.
    Key(String),
    /// Name form, e.g. `eco[EUR]`.
    Name(String),
}

impl Ident {
    /// Query fragment selecting the subtree anywhere below the current nodes.
    pub fn query_term(&self) -> String {
        match self {
            Ident::Key(key) => format!("..*['{key}']"),
            Ident::Name(name) => format!("..*[@.name is '{name}']"),
        }
    }
}

/// Parse a raw directive string.
pub fn parse(raw: &str) -> Result<Syntax> {
    let (left, right) = split_assignment(raw)?;
    let value = (!right.is_empty()).then(|| right.to_string());

    let Some(address) = left.strip_prefix(FILE_MARKER) else {
        return Ok(Syntax {
            kind: DirectiveKind::Substitution,
            expression: left.to_string(),
            col: None,
            condition: None,
            value,
        });
    };

    let (expression, condition) = split_condition(address)?;
    let (expression, col) = split_column(expression)?;
    let expression = build_query(expression)?;

    Ok(Syntax {
        kind: DirectiveKind::File,
        expression,
        col: Some(col.to_string()),
        condition: condition.map(str::to_string),
        value,
    })
}

/// Split on the last `=` into trimmed (left, right).
fn split_assignment(raw: &str) -> Result<(&str, &str)> {
    let (left, right) = raw
        .rsplit_once('=')
        .ok_or_else(|| SensiError::syntax(format!("missing '=' in directive '{raw}'")))?;
    let left = left.trim();
    if left.is_empty() {
        return Err(SensiError::syntax(format!(
            "missing address before '=' in directive '{raw}'"
        )));
    }
    Ok((left, right.trim()))
}

fn split_condition(address: &str) -> Result<(&str, Option<&str>)> {
    match address.matches(WHERE_MARKER).count() {
        0 => Ok((address.trim(), None)),
        1 => {
            let (expression, condition) = address
                .split_once(WHERE_MARKER)
                .ok_or_else(|| SensiError::syntax("unterminated .where clause"))?;
            let condition = condition.trim();
            Ok((expression.trim(), (!condition.is_empty()).then_some(condition)))
        }
        n => Err(SensiError::syntax(format!(
            "expected at most one '{WHERE_MARKER}' clause, found {n} in '{address}'"
        ))),
    }
}

/// Split `expr[col]` into (`expr`, `col`).
fn split_column(expression: &str) -> Result<(&str, &str)> {
    let expression = expression.trim();
    if !expression.ends_with(']') {
        return Err(SensiError::syntax(format!(
            "expected a trailing [column] clause in '{expression}'"
        )));
    }
    let open = matching_open_bracket(expression).ok_or_else(|| {
        SensiError::syntax(format!("unbalanced brackets in '{expression}'"))
    })?;
    let col = expression[open + 1..expression.len() - 1].trim();
    if col.is_empty() {
        return Err(SensiError::syntax(format!(
            "empty column clause in '{expression}'"
        )));
    }
    Ok((expression[..open].trim(), col))
}

/// Byte offset of the `[` matching the final `]`.
fn matching_open_bracket(expression: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (offset, ch) in expression.char_indices().rev() {
        match ch {
            ']' => depth += 1,
            '[' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(offset);
                }
            }
            _ => {}
        }
    }
    None
}

fn has_segment(expression: &str, prefix: &str) -> bool {
    expression
        .split('.')
        .any(|segment| segment.trim().starts_with(prefix))
}

/// Build the document query for a file address.
fn build_query(expression: &str) -> Result<String> {
    if expression.is_empty() {
        return Err(SensiError::syntax("empty file address"));
    }
    if !(has_segment(expression, "eco") && has_segment(expression, "driver")) {
        return Ok(format!("{FLAT_PREFIX}{expression}{FILENAME_SUFFIX}"));
    }

    let (eco, rest) = take_segment(&ECO_SEGMENT, expression, "eco")?;
    let (driver, rest) = take_segment(&DRIVER_SEGMENT, &rest, "driver")?;
    let rest = rest.trim_matches('.');
    if rest.is_empty() {
        return Err(SensiError::syntax(format!(
            "missing parameter path after eco/driver in '{expression}'"
        )));
    }
    Ok(format!(
        "${}{}.{rest}{FILENAME_SUFFIX}",
        eco.query_term(),
        driver.query_term()
    ))
}

/// Extract one eco/driver identifier and return the expression without it.
fn take_segment(pattern: &Regex, expression: &str, kind: &str) -> Result<(Ident, String)> {
    let caps = pattern.captures(expression).ok_or_else(|| {
        SensiError::syntax(format!(
            "expected '{kind}_<n>.' or '{kind}[<name>].' in '{expression}'"
        ))
    })?;
    let ident = match (caps.name("key"), caps.name("name")) {
        (Some(key), _) => Ident::Key(key.as_str().to_string()),
        (None, Some(name)) => Ident::Name(strip_quotes(name.as_str().trim()).to_string()),
        (None, None) => return Err(SensiError::syntax(format!("empty {kind} identifier"))),
    };
    let Some(whole) = caps.get(0) else {
        return Err(SensiError::syntax(format!("empty {kind} segment")));
    };
    let joiner = if whole.as_str().starts_with('.') { "." } else { "" };
    let rest = format!(
        "{}{joiner}{}",
        &expression[..whole.start()],
        &expression[whole.end()..]
    );
    Ok((ident, rest))
}

pub(crate) fn strip_quotes(raw: &str) -> &str {
    for quote in ['\'', '"'] {
        if raw.len() >= 2 && raw.starts_with(quote) && raw.ends_with(quote) {
            return &raw[1..raw.len() - 1];
        }
    }
    raw
}
