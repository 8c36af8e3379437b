//! In-memory model of a delimited input table and of cell selections.

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;

use crate::core::error::{Result, SensiError};

/// One record of a [`Table`].
///
/// `index` is the 0-based position of the row in the file it was loaded from
/// and survives projection, so filtered views still address the full table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub index: usize,
    pub cells: Vec<String>,
}

/// Rows of string cells under named, ordered columns.
///
/// Cells are never typed on load. The first column doubles as the row label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    /// Build a table, padding short records with empty cells and dropping
    /// cells beyond the header width. Loaders reject wide records first.
    pub fn new(columns: Vec<String>, records: Vec<Vec<String>>) -> Self {
        let width = columns.len();
        let rows = records
            .into_iter()
            .enumerate()
            .map(|(index, mut cells)| {
                cells.resize(width, String::new());
                Row { index, cells }
            })
            .collect();
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// Label of `row`: the value of its first cell.
    pub fn label<'a>(&self, row: &'a Row) -> Option<&'a str> {
        row.cells.first().map(String::as_str)
    }

    /// Original indices of every row in this view.
    pub fn row_indices(&self) -> BTreeSet<usize> {
        self.rows.iter().map(|row| row.index).collect()
    }

    /// Keep only rows whose original index is in `keep`, preserving order.
    pub fn project(&self, keep: &BTreeSet<usize>) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: self
                .rows
                .iter()
                .filter(|row| keep.contains(&row.index))
                .cloned()
                .collect(),
        }
    }

    /// Overwrite the cell at (`column`, original row `index`).
    pub fn set(&mut self, column: &str, index: usize, value: String) -> Result<()> {
        let position = self
            .column_position(column)
            .ok_or_else(|| SensiError::selection(format!("unknown column '{column}'")))?;
        let row = self
            .rows
            .iter_mut()
            .find(|row| row.index == index)
            .ok_or_else(|| SensiError::selection(format!("unknown row index {index}")))?;
        row.cells[position] = value;
        Ok(())
    }
}

/// A selected cell, possibly already replaced by a typed value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Text(String),
    Bool(bool),
    Number(Decimal),
}

impl Cell {
    /// Render for write-back. Numbers are positional (never scientific) and
    /// use `dec_sep` as the decimal separator.
    pub fn render(&self, dec_sep: &str) -> String {
        match self {
            Cell::Text(text) => text.clone(),
            Cell::Bool(true) => "True".to_string(),
            Cell::Bool(false) => "False".to_string(),
            Cell::Number(number) => {
                let rendered = number.to_string();
                if dec_sep == "." {
                    rendered
                } else {
                    rendered.replace('.', dec_sep)
                }
            }
        }
    }
}

/// Column name -> (original row index -> cell).
pub type Selection = BTreeMap<String, BTreeMap<usize, Cell>>;
