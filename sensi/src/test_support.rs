//! Test-only fixtures: a model document, a small table, and an on-disk
//! environment layout matching that document.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Value, json};
use tempfile::TempDir;

use crate::core::table::Table;

/// Model document with flat parameters and two economies.
pub fn sample_document() -> Value {
    json!({
        "framework": {
            "name": "fwk",
            "sensi_1": {
                "name": "central",
                "folder_id": "S001",
                "param": {
                    "dependence": {"filename": "correlation.csv"},
                    "table_format": {"filename": "formats.csv"},
                    "roll_forward": {"filename": "roll_forward.csv"},
                    "aom": {"filename": "aom.csv"},
                    "report": {"summary": {"filename": "report.csv"}}
                },
                "hist_corr": {"target_corr": {"filename": "target_corr.csv"}},
                "eco": {
                    "eco_1": {
                        "name": "EUR",
                        "folder_id": "E01",
                        "driver": {
                            "driver_1": {
                                "name": "IR",
                                "class": "IR",
                                "param": {"filename": "eur_ir_param.csv"}
                            },
                            "driver_2": {
                                "name": "EQ1",
                                "class": "EQ_GLOBAL",
                                "subclass": "EQ",
                                "param": {"filename": "eur_eq_param.csv"}
                            }
                        }
                    },
                    "eco_2": {
                        "name": "USD",
                        "folder_id": "E02",
                        "driver": {
                            "driver_1": {
                                "name": "IR",
                                "class": "IR",
                                "param": {"filename": "usd_ir_param.csv"}
                            }
                        }
                    }
                }
            }
        }
    })
}

/// Settings document with comma-separated columns and `.` decimals.
pub fn sample_settings() -> Value {
    json!({"gen_param": {"input_format": {"dec_sep": ".", "col_sep": ","}}})
}

/// Four labeled rows: `id,x,y,name`.
pub fn sample_table() -> Table {
    let rows = [
        ["rowA", "1", "5", "alpha"],
        ["rowB", "2", "12", "beta"],
        ["rowC", "3", "8", "gamma"],
        ["rowD", "4", "20", "delta"],
    ];
    Table::new(
        ["id", "x", "y", "name"].map(str::to_string).to_vec(),
        rows.into_iter()
            .map(|row| row.map(str::to_string).to_vec())
            .collect(),
    )
}

/// `sample_table` rendered as a comma-separated file.
pub const SAMPLE_CSV: &str = "id,x,y,name\nrowA,1,5,alpha\nrowB,2,12,beta\nrowC,3,8,gamma\nrowD,4,20,delta\n";

/// `<env_dir>/resources/<sensi_folder>/fwk_inputs` for `sample_document`.
pub fn input_root(env_dir: &Path, sensi_folder: &str) -> PathBuf {
    env_dir
        .join("resources")
        .join(sensi_folder)
        .join("fwk_inputs")
}

/// Write `contents` to `path`, creating parent directories.
pub fn write_file(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dirs");
    }
    fs::write(path, contents).expect("write fixture file");
}

/// Temporary environment directory laid out for `sample_document`.
pub struct TestEnv {
    dir: TempDir,
}

impl TestEnv {
    pub fn new() -> std::io::Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Absolute path of an input file below the sensi_1 name folder.
    pub fn input(&self, local: &str) -> PathBuf {
        input_root(self.root(), "central").join(local)
    }

    /// Create an input file and return its absolute path.
    pub fn write_input(&self, local: &str, contents: &str) -> PathBuf {
        let path = self.input(local);
        write_file(&path, contents);
        path
    }
}
