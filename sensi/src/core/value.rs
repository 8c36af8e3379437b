//! Mutation of selected cells with a literal or an arithmetic operation.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use tracing::debug;

use crate::core::error::{Result, SensiError};
use crate::core::precision::Precision;
use crate::core::syntax::strip_quotes;
use crate::core::table::{Cell, Selection};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
}

impl Operator {
    fn from_char(ch: char) -> Option<Self> {
        match ch {
            '+' => Some(Operator::Add),
            '-' => Some(Operator::Sub),
            '*' => Some(Operator::Mul),
            '/' => Some(Operator::Div),
            _ => None,
        }
    }

    fn apply(self, lhs: Decimal, rhs: Decimal) -> Option<Decimal> {
        match self {
            Operator::Add => lhs.checked_add(rhs),
            Operator::Sub => lhs.checked_sub(rhs),
            Operator::Mul => lhs.checked_mul(rhs),
            Operator::Div => lhs.checked_div(rhs),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
        };
        f.write_str(symbol)
    }
}

/// What a value token does to every selected cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Arithmetic { operator: Operator, operand: Decimal },
    Bool(bool),
    Literal(String),
    Identity,
}

impl Operation {
    /// Parse a value token.
    ///
    /// One layer of quotes and every whitespace character are removed first.
    /// `(<op><number>)` is arithmetic; a missing operator means `+`.
    pub fn parse(token: &str) -> Result<Self> {
        let token: String = strip_quotes(token.trim())
            .chars()
            .filter(|ch| !ch.is_whitespace())
            .collect();

        if let Some(inner) = token
            .strip_prefix('(')
            .and_then(|rest| rest.strip_suffix(')'))
        {
            let (operator, operand) = match inner.chars().next().and_then(Operator::from_char) {
                Some(operator) => (operator, &inner[1..]),
                None => {
                    debug!(token = %token, "no arithmetic operator, defaulting to '+'");
                    (Operator::Add, inner)
                }
            };
            let operand = parse_decimal(&operand.replace(',', "."))
                .ok_or_else(|| {
                    SensiError::value(format!(
                        "malformed number in '{token}' ({DECIMAL_RANGE})"
                    ))
                })?;
            return Ok(Operation::Arithmetic { operator, operand });
        }

        if token.eq_ignore_ascii_case("true") {
            return Ok(Operation::Bool(true));
        }
        if token.eq_ignore_ascii_case("false") {
            return Ok(Operation::Bool(false));
        }
        if token.is_empty() {
            return Ok(Operation::Identity);
        }
        Ok(Operation::Literal(token))
    }
}

/// Applies value tokens to selections at a fixed precision.
#[derive(Debug, Clone)]
pub struct ValueApplier {
    precision: Precision,
    dec_sep: String,
}

impl ValueApplier {
    /// `dec_sep` is the decimal separator used by text cells of the table.
    pub fn new(precision: Precision, dec_sep: impl Into<String>) -> Self {
        Self {
            precision,
            dec_sep: dec_sep.into(),
        }
    }

    pub fn apply(&self, token: &str, selection: Selection) -> Result<Selection> {
        let operation = Operation::parse(token)?;
        self.apply_operation(&operation, selection)
    }

    pub fn apply_operation(&self, operation: &Operation, selection: Selection) -> Result<Selection> {
        if *operation == Operation::Identity {
            return Ok(selection);
        }
        let mut mutated = Selection::new();
        for (column, cells) in selection {
            let mut out = BTreeMap::new();
            for (row, cell) in cells {
                let cell = self.apply_cell(operation, &column, row, cell)?;
                out.insert(row, cell);
            }
            mutated.insert(column, out);
        }
        Ok(mutated)
    }

    fn apply_cell(&self, operation: &Operation, column: &str, row: usize, cell: Cell) -> Result<Cell> {
        match operation {
            Operation::Identity => Ok(cell),
            Operation::Bool(flag) => Ok(Cell::Bool(*flag)),
            Operation::Literal(text) => Ok(Cell::Text(text.clone())),
            Operation::Arithmetic { operator, operand } => {
                let current = self.cell_number(&cell).ok_or_else(|| {
                    SensiError::value(format!(
                        "cell ({column}, {row}) is not numeric or outside {DECIMAL_RANGE}: {cell:?}"
                    ))
                })?;
                let result = operator.apply(current, *operand).ok_or_else(|| {
                    SensiError::value(format!(
                        "cannot compute {current} {operator} {operand} for cell ({column}, {row})"
                    ))
                })?;
                Ok(Cell::Number(self.precision.round(result)))
            }
        }
    }

    fn cell_number(&self, cell: &Cell) -> Option<Decimal> {
        match cell {
            Cell::Number(number) => Some(*number),
            Cell::Text(text) if self.dec_sep != "." => {
                parse_decimal(&text.trim().replace(self.dec_sep.as_str(), "."))
            }
            Cell::Text(text) => parse_decimal(text.trim()),
            Cell::Bool(_) => None,
        }
    }
}

const DECIMAL_RANGE: &str = "decimal range: at most 28 fractional digits, magnitude below 7.9e28";

fn parse_decimal(raw: &str) -> Option<Decimal> {
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selection(column: &str, cells: &[(usize, &str)]) -> Selection {
        Selection::from([(
            column.to_string(),
            cells
                .iter()
                .map(|(row, value)| (*row, Cell::Text(value.to_string())))
                .collect::<BTreeMap<_, _>>(),
        )])
    }

    fn applier() -> ValueApplier {
        ValueApplier::new(Precision::default(), ".")
    }

    fn rendered(selection: &Selection, column: &str, row: usize) -> String {
        selection[column][&row].render(".")
    }

    #[test]
    fn addition_in_parentheses() {
        let out = applier()
            .apply("(+1.5)", selection("x", &[(1, "2.0")]))
            .expect("apply");
        assert_eq!(rendered(&out, "x", 1), "3.5");
    }

    #[test]
    fn every_operator_applies_elementwise() {
        let cells = selection("x", &[(0, "10"), (1, "4")]);
        let out = applier().apply("(-1)", cells.clone()).expect("sub");
        assert_eq!(rendered(&out, "x", 0), "9");
        let out = applier().apply("(*2.5)", cells.clone()).expect("mul");
        assert_eq!(rendered(&out, "x", 1), "10.0");
        let out = applier().apply("(/4)", cells).expect("div");
        assert_eq!(rendered(&out, "x", 0), "2.5");
    }

    #[test]
    fn division_rounds_to_thirteen_digits() {
        let out = applier()
            .apply("(/3)", selection("x", &[(0, "1")]))
            .expect("apply");
        assert_eq!(rendered(&out, "x", 0), "0.3333333333333");
    }

    #[test]
    fn missing_operator_defaults_to_addition() {
        let out = applier()
            .apply("' (1,5) '", selection("x", &[(0, "2")]))
            .expect("apply");
        assert_eq!(rendered(&out, "x", 0), "3.5");
    }

    #[test]
    fn comma_separated_cells_follow_decimal_separator() {
        let applier = ValueApplier::new(Precision::default(), ",");
        let out = applier
            .apply("(*2)", selection("x", &[(0, "1,25")]))
            .expect("apply");
        assert_eq!(out["x"][&0].render(","), "2,50");
    }

    #[test]
    fn malformed_operand_is_rejected() {
        assert!(Operation::parse("(+abc)").is_err());
        assert!(Operation::parse("(+)").is_err());
    }

    #[test]
    fn division_by_zero_is_rejected() {
        let err = applier()
            .apply("(/0)", selection("x", &[(0, "1")]))
            .unwrap_err();
        assert!(matches!(err, SensiError::Value(_)));
    }

    #[test]
    fn non_numeric_cell_is_rejected() {
        let err = applier()
            .apply("(+1)", selection("x", &[(0, "abc")]))
            .unwrap_err();
        assert!(err.to_string().contains("not numeric"));
    }

    #[test]
    fn cells_beyond_decimal_range_name_the_limit() {
        for raw in ["1e30", "1e-30"] {
            let err = applier()
                .apply("(+1)", selection("x", &[(0, raw)]))
                .unwrap_err();
            assert!(err.to_string().contains("outside decimal range"), "{raw}: {err}");
        }
    }

    #[test]
    fn boolean_tokens_set_booleans() {
        let out = applier()
            .apply("TRUE", selection("x", &[(0, "1"), (2, "b")]))
            .expect("apply");
        assert!(out["x"].values().all(|cell| *cell == Cell::Bool(true)));
    }

    #[test]
    fn literal_tokens_lose_quotes_and_spaces() {
        let out = applier()
            .apply("'new value'", selection("x", &[(0, "old")]))
            .expect("apply");
        assert_eq!(out["x"][&0], Cell::Text("newvalue".to_string()));
    }

    #[test]
    fn empty_token_is_identity() {
        let cells = selection("x", &[(0, "1"), (1, "2")]);
        let out = applier().apply("", cells.clone()).expect("apply");
        assert_eq!(out, cells);
    }
}
