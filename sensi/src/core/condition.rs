//! Boolean row filters for `.where` clauses.
//!
//! A condition is a disjunction (`||`) of conjunctions (`&&`) of comparison
//! clauses such as `x==1,2` or `'rate'>=0.5`. Each clause is evaluated
//! against the unfiltered table and yields a set of original row indices.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::core::error::{Result, SensiError};
use crate::core::selector::{Selector, select_column};
use crate::core::syntax::strip_quotes;
use crate::core::table::Table;

/// Typed literal used on both sides of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Scalar {
    fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Int(value) => Some(*value as f64),
            Scalar::Float(value) => Some(*value),
            _ => None,
        }
    }

    fn matches(&self, other: &Scalar) -> bool {
        match (self, other) {
            (Scalar::Int(a), Scalar::Int(b)) => a == b,
            (Scalar::Bool(a), Scalar::Bool(b)) => a == b,
            (Scalar::Str(a), Scalar::Str(b)) => a == b,
            _ => match (self.as_f64(), other.as_f64()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }

    fn compare(&self, other: &Scalar) -> Option<Ordering> {
        match (self, other) {
            (Scalar::Int(a), Scalar::Int(b)) => Some(a.cmp(b)),
            (Scalar::Str(a), Scalar::Str(b)) => Some(a.cmp(b)),
            _ => self.as_f64()?.partial_cmp(&other.as_f64()?),
        }
    }
}

/// Coerce a literal token: bool, then int, then float, then unquoted string.
pub fn coerce(token: &str) -> Scalar {
    let token = token.trim();
    if token.eq_ignore_ascii_case("true") {
        return Scalar::Bool(true);
    }
    if token.eq_ignore_ascii_case("false") {
        return Scalar::Bool(false);
    }
    coerce_numeric(token).unwrap_or_else(|| Scalar::Str(strip_quotes(token).to_string()))
}

fn coerce_numeric(token: &str) -> Option<Scalar> {
    if let Ok(value) = token.parse::<i64>() {
        return Some(Scalar::Int(value));
    }
    token.parse::<f64>().ok().map(Scalar::Float)
}

/// Column cells are compared numerically when they parse as numbers.
fn coerce_cell(cell: &str) -> Scalar {
    coerce_numeric(cell.trim()).unwrap_or_else(|| Scalar::Str(cell.to_string()))
}

/// Comparison operators, in the order they are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Ne,
    Ge,
    Gt,
    Le,
    Lt,
}

impl Comparison {
    /// Multi-character operators come first so `>=` is never read as `>`.
    pub const PRECEDENCE: [Comparison; 6] = [
        Comparison::Eq,
        Comparison::Ne,
        Comparison::Ge,
        Comparison::Gt,
        Comparison::Le,
        Comparison::Lt,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            Comparison::Eq => "==",
            Comparison::Ne => "!=",
            Comparison::Ge => ">=",
            Comparison::Gt => ">",
            Comparison::Le => "<=",
            Comparison::Lt => "<",
        }
    }

    fn accepts(self, cell: &Scalar, literals: &[Scalar]) -> bool {
        let member = || literals.iter().any(|literal| cell.matches(literal));
        let ordering = || literals.first().and_then(|first| cell.compare(first));
        match self {
            Comparison::Eq => member(),
            Comparison::Ne => !member(),
            Comparison::Ge => matches!(ordering(), Some(Ordering::Greater | Ordering::Equal)),
            Comparison::Gt => matches!(ordering(), Some(Ordering::Greater)),
            Comparison::Le => matches!(ordering(), Some(Ordering::Less | Ordering::Equal)),
            Comparison::Lt => matches!(ordering(), Some(Ordering::Less)),
        }
    }
}

/// Rows of `table` satisfying `<lvalue><operator><literal>[,<literal>...]`.
///
/// `==`/`!=` test membership in the literal list; ordering operators compare
/// against the first literal only. Cells that cannot be ordered against the
/// literal are dropped.
pub fn filter(clause: &str, operator: Comparison, table: &Table) -> Result<BTreeSet<usize>> {
    let symbol = operator.symbol();
    if clause.matches(symbol).count() != 1 {
        return Err(SensiError::condition(format!(
            "clause '{clause}' must contain '{symbol}' exactly once"
        )));
    }
    let (lvalue, rvalue) = clause
        .split_once(symbol)
        .ok_or_else(|| SensiError::condition(format!("missing '{symbol}' in '{clause}'")))?;
    let column = select_column(table, &Selector::parse(lvalue)?)?;
    let literals: Vec<Scalar> = rvalue.split(',').map(coerce).collect();

    Ok(table
        .rows()
        .iter()
        .filter(|row| operator.accepts(&coerce_cell(&row.cells[column]), &literals))
        .map(|row| row.index)
        .collect())
}

/// Evaluate a single comparison clause.
///
/// A blank clause or an empty table keeps every row.
pub fn interpret_clause(clause: &str, table: &Table) -> Result<BTreeSet<usize>> {
    let clause = strip_parens(clause.trim());
    if clause.is_empty() || table.is_empty() {
        return Ok(table.row_indices());
    }
    let operator = Comparison::PRECEDENCE
        .into_iter()
        .find(|operator| clause.matches(operator.symbol()).count() == 1)
        .ok_or_else(|| {
            SensiError::condition(format!("no supported comparison operator in '{clause}'"))
        })?;
    filter(clause, operator, table)
}

/// Evaluate a full condition: union over `||` groups of the intersection of
/// each group's `&&` clauses.
pub fn interpret(condition: &str, table: &Table) -> Result<BTreeSet<usize>> {
    let condition = strip_parens(condition.trim());
    if condition.is_empty() || table.is_empty() {
        return Ok(table.row_indices());
    }

    let mut surviving = BTreeSet::new();
    let mut evaluated = false;
    for group in condition.split("||") {
        let mut group_rows: Option<BTreeSet<usize>> = None;
        for clause in group.split("&&").map(str::trim) {
            if clause.is_empty() {
                continue;
            }
            let rows = interpret_clause(clause, table)?;
            group_rows = Some(match group_rows {
                None => rows,
                Some(acc) => acc.intersection(&rows).copied().collect(),
            });
        }
        if let Some(rows) = group_rows {
            evaluated = true;
            surviving.extend(rows);
        }
    }

    if !evaluated {
        return Ok(table.row_indices());
    }
    Ok(surviving)
}

/// Remove one layer of parentheses when the first `(` closes at the end.
fn strip_parens(raw: &str) -> &str {
    let Some(inner) = raw.strip_prefix('(').and_then(|rest| rest.strip_suffix(')')) else {
        return raw;
    };
    let mut depth = 0i32;
    for ch in inner.chars() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return raw;
                }
            }
            _ => {}
        }
    }
    inner.trim()
}
