//! Column/row addressing inside a table.

use std::collections::BTreeMap;

use crate::core::error::{Result, SensiError};
use crate::core::table::{Cell, Row, Selection, Table};

/// One axis of a selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// Empty or `*`.
    All,
    /// Zero-based position, written 1-based in directives.
    Index(usize),
    /// Exact column name or row label.
    Name(String),
}

impl Selector {
    /// Parse one selector token: empty/`*`, a 1-based index, or a quoted name.
    ///
    /// Unquoted tokens that are not integers are taken as bare names.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() || raw == "*" {
            return Ok(Selector::All);
        }
        for quote in ['\'', '"'] {
            if raw.len() >= 2 && raw.starts_with(quote) && raw.ends_with(quote) {
                return Ok(Selector::Name(raw[1..raw.len() - 1].to_string()));
            }
        }
        let digits = raw.strip_prefix(['-', '+']).unwrap_or(raw);
        if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
            let position: usize = raw.parse().map_err(|_| {
                SensiError::selection(format!("index '{raw}' must be a positive integer"))
            })?;
            if position == 0 {
                return Err(SensiError::selection("index 0 is invalid; indices start at 1"));
            }
            return Ok(Selector::Index(position - 1));
        }
        Ok(Selector::Name(raw.to_string()))
    }
}

/// Parse `[column,row]` (brackets optional). Without a comma every row is selected.
pub fn parse_selector_string(raw: &str) -> Result<(Selector, Selector)> {
    let trimmed = raw.trim();
    let inner = trimmed
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .unwrap_or(trimmed);
    let commas = unquoted_commas(inner);
    match commas.as_slice() {
        [] => Ok((Selector::parse(inner)?, Selector::All)),
        [comma] => Ok((
            Selector::parse(&inner[..*comma])?,
            Selector::parse(&inner[comma + 1..])?,
        )),
        _ => Err(SensiError::selection(format!(
            "expected at most one ',' in selector '{raw}'"
        ))),
    }
}

/// Select a rectangle of `table` as a column -> row -> cell mapping.
pub fn select(table: &Table, column: &Selector, row: &Selector) -> Result<Selection> {
    let columns = column_positions(table, column)?;
    let rows = select_rows(table, row)?;

    let mut selection = Selection::new();
    for position in columns {
        let cells: BTreeMap<usize, Cell> = rows
            .iter()
            .map(|row| (row.index, Cell::Text(row.cells[position].clone())))
            .collect();
        selection.insert(table.columns()[position].clone(), cells);
    }
    Ok(selection)
}

/// Resolve a selector that must designate exactly one column.
pub fn select_column(table: &Table, column: &Selector) -> Result<usize> {
    match column {
        Selector::All => Err(SensiError::selection(
            "a single column is required, found '*'",
        )),
        _ => Ok(column_positions(table, column)?[0]),
    }
}

fn column_positions(table: &Table, selector: &Selector) -> Result<Vec<usize>> {
    let width = table.columns().len();
    match selector {
        Selector::All => Ok((0..width).collect()),
        Selector::Index(position) if *position < width => Ok(vec![*position]),
        Selector::Index(position) => Err(SensiError::selection(format!(
            "column {} out of range (table has {width} columns)",
            position + 1
        ))),
        Selector::Name(name) => table
            .column_position(name)
            .map(|position| vec![position])
            .ok_or_else(|| SensiError::selection(format!("column '{name}' not found"))),
    }
}

fn select_rows<'a>(table: &'a Table, selector: &Selector) -> Result<Vec<&'a Row>> {
    match selector {
        Selector::All => Ok(table.rows().iter().collect()),
        Selector::Index(position) => table
            .rows()
            .get(*position)
            .map(|row| vec![row])
            .ok_or_else(|| {
                SensiError::selection(format!(
                    "row {} out of range (table has {} rows)",
                    position + 1,
                    table.rows().len()
                ))
            }),
        Selector::Name(label) => {
            let rows: Vec<&Row> = table
                .rows()
                .iter()
                .filter(|row| table.label(row) == Some(label.as_str()))
                .collect();
            if rows.is_empty() {
                return Err(SensiError::selection(format!("row '{label}' not found")));
            }
            Ok(rows)
        }
    }
}

fn unquoted_commas(inner: &str) -> Vec<usize> {
    let mut quote = None;
    let mut commas = Vec::new();
    for (offset, ch) in inner.char_indices() {
        match (quote, ch) {
            (None, '\'' | '"') => quote = Some(ch),
            (Some(open), _) if open == ch => quote = None,
            (None, ',') => commas.push(offset),
            _ => {}
        }
    }
    commas
}
