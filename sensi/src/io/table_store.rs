//! Delimited table load/write.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use csv::{ReaderBuilder, WriterBuilder};
use tracing::debug;

use crate::core::error::{Result, SensiError};
use crate::core::table::Table;
use crate::io::config::WriteMode;

/// Load a delimited file with a header row, keeping every cell as a string.
///
/// Short records are padded. Duplicate header names and records wider than
/// the header are rejected, since write-back could not reproduce them.
pub fn load_table(path: &Path, col_sep: u8) -> Result<Table> {
    if !path.is_file() {
        return Err(SensiError::path(format!(
            "input file {} does not exist",
            path.display()
        )));
    }
    debug!(path = %path.display(), "loading table");
    let mut reader = ReaderBuilder::new()
        .delimiter(col_sep)
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;
    let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    check_unique_columns(&columns)?;
    let mut records = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        if record.len() > columns.len() {
            return Err(SensiError::layout(format!(
                "record {} has {} fields but the header has {}",
                index + 1,
                record.len(),
                columns.len()
            )));
        }
        records.push(record.iter().map(str::to_string).collect());
    }
    debug!(columns = columns.len(), rows = records.len(), "table loaded");
    Ok(Table::new(columns, records))
}

fn check_unique_columns(columns: &[String]) -> Result<()> {
    let mut seen = BTreeSet::new();
    for column in columns {
        if !seen.insert(column.as_str()) {
            return Err(SensiError::layout(format!(
                "duplicate column name '{column}' in header"
            )));
        }
    }
    Ok(())
}

/// Rewrite `path` with the full contents of `table`, header first.
///
/// The table is serialized before the original file is touched.
pub fn write_table(path: &Path, table: &Table, col_sep: u8, mode: WriteMode) -> Result<()> {
    let contents = render_table(table, col_sep)?;
    debug!(path = %path.display(), mode = ?mode, "writing table");
    match mode {
        WriteMode::Replace => {
            fs::remove_file(path)?;
            fs::write(path, contents)?;
        }
        WriteMode::Atomic => {
            let tmp_path = path.with_extension("sensi.tmp");
            fs::write(&tmp_path, contents)?;
            fs::rename(&tmp_path, path)?;
        }
    }
    Ok(())
}

fn render_table(table: &Table, col_sep: u8) -> Result<Vec<u8>> {
    let mut writer = WriterBuilder::new()
        .delimiter(col_sep)
        .from_writer(Vec::new());
    writer.write_record(table.columns())?;
    for row in table.rows() {
        writer.write_record(&row.cells)?;
    }
    writer
        .into_inner()
        .map_err(|err| SensiError::Io(err.into_error()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_keeps_cells_as_strings() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("t.csv");
        fs::write(&path, "id;x\nrowA;001\nrowB;1.50\n").expect("write");

        let table = load_table(&path, b';').expect("load");
        assert_eq!(table.columns(), ["id", "x"]);
        assert_eq!(table.rows()[0].cells, ["rowA", "001"]);
        assert_eq!(table.rows()[1].cells, ["rowB", "1.50"]);
    }

    #[test]
    fn load_missing_file_is_path_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let err = load_table(&temp.path().join("nope.csv"), b',').unwrap_err();
        assert!(matches!(err, SensiError::Path(_)));
    }

    #[test]
    fn write_preserves_header_and_order() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("t.csv");
        fs::write(&path, "b,a\n2,1\n").expect("write");

        let mut table = load_table(&path, b',').expect("load");
        table.set("a", 0, "9".to_string()).expect("set");
        write_table(&path, &table, b',', WriteMode::Replace).expect("write");
        assert_eq!(fs::read_to_string(&path).expect("read"), "b,a\n2,9\n");
    }

    #[test]
    fn atomic_write_leaves_no_temp_file() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("t.csv");
        fs::write(&path, "a\n1\n").expect("write");

        let table = load_table(&path, b',').expect("load");
        write_table(&path, &table, b',', WriteMode::Atomic).expect("write");
        assert_eq!(fs::read_to_string(&path).expect("read"), "a\n1\n");
        assert!(!path.with_extension("sensi.tmp").exists());
    }

    #[test]
    fn load_pads_short_records() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("t.csv");
        fs::write(&path, "id,x,y\nrowA,1\n").expect("write");

        let table = load_table(&path, b',').expect("load");
        assert_eq!(table.rows()[0].cells, ["rowA", "1", ""]);
    }

    #[test]
    fn load_rejects_records_wider_than_header() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("t.csv");
        fs::write(&path, "id,x\nrowA,1,EXTRA\n").expect("write");

        let err = load_table(&path, b',').unwrap_err();
        assert!(matches!(err, SensiError::Layout(_)));
        assert!(err.to_string().contains("record 1 has 3 fields"));
    }

    #[test]
    fn load_rejects_duplicate_header_names() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("t.csv");
        fs::write(&path, "id,a,a\nrowA,1,100\n").expect("write");

        let err = load_table(&path, b',').unwrap_err();
        assert!(matches!(err, SensiError::Layout(_)));
        assert!(err.to_string().contains("duplicate column name 'a'"));
    }
}
