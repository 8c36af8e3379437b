//! Orchestration for applying one file directive to its input table.
//!
//! Stages run in a fixed order and the first failure aborts the directive:
//!
//! `validate -> load_settings -> load_table -> [filter_rows] -> select_cells
//! -> [apply_value] -> write_back`
//!
//! Nothing is written unless every earlier stage succeeds.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::core::condition::interpret;
use crate::core::error::{Result, SensiError};
use crate::core::precision::Precision;
use crate::core::selector::{parse_selector_string, select};
use crate::core::syntax::Syntax;
use crate::core::value::ValueApplier;
use crate::io::config::{EngineConfig, WriteMode};
use crate::io::settings::InputFormat;
use crate::io::table_store::{load_table, write_table};

/// Stage of a file mutation, reported when the mutation fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationStage {
    Validate,
    LoadSettings,
    LoadTable,
    FilterRows,
    SelectCells,
    ApplyValue,
    WriteBack,
}

impl fmt::Display for MutationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MutationStage::Validate => "validate",
            MutationStage::LoadSettings => "load_settings",
            MutationStage::LoadTable => "load_table",
            MutationStage::FilterRows => "filter_rows",
            MutationStage::SelectCells => "select_cells",
            MutationStage::ApplyValue => "apply_value",
            MutationStage::WriteBack => "write_back",
        };
        f.write_str(name)
    }
}

/// A failed mutation: the stage that failed and why.
#[derive(Debug, Error)]
#[error("{stage} failed: {reason}")]
pub struct MutationError {
    pub stage: MutationStage,
    pub reason: String,
}

/// Applies parsed directives to delimited input files.
#[derive(Debug, Clone, Default)]
pub struct FileMutator {
    precision: Precision,
    write_mode: WriteMode,
}

impl FileMutator {
    pub fn new(precision: Precision, write_mode: WriteMode) -> Self {
        Self {
            precision,
            write_mode,
        }
    }

    pub fn from_config(config: &EngineConfig) -> anyhow::Result<Self> {
        Ok(Self::new(config.precision()?, config.write_mode))
    }

    /// Apply `syntax` to the table at `path`. Returns `true` on success.
    ///
    /// Every failure, panics included, is logged and reported as `false`.
    pub fn mutate(&self, path: &Path, syntax: &Syntax, settings: &Value) -> bool {
        self.try_mutate(path, syntax, settings).is_ok()
    }

    /// Like [`FileMutator::mutate`], keeping the failing stage and reason.
    pub fn try_mutate(
        &self,
        path: &Path,
        syntax: &Syntax,
        settings: &Value,
    ) -> std::result::Result<(), MutationError> {
        let mut stage = MutationStage::Validate;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.run(path, syntax, settings, &mut stage)
        }));
        let reason = match outcome {
            Ok(Ok(())) => {
                info!(path = %path.display(), expression = %syntax.expression, "directive applied");
                return Ok(());
            }
            Ok(Err(err)) => err.to_string(),
            Err(payload) => panic_message(payload.as_ref()),
        };
        warn!(
            stage = %stage,
            path = %path.display(),
            expression = %syntax.expression,
            error = %reason,
            "directive failed"
        );
        Err(MutationError { stage, reason })
    }

    fn run(
        &self,
        path: &Path,
        syntax: &Syntax,
        settings: &Value,
        stage: &mut MutationStage,
    ) -> Result<()> {
        *stage = MutationStage::Validate;
        if path.as_os_str().is_empty() {
            return Err(SensiError::path("no input path given"));
        }
        if syntax.expression.trim().is_empty() {
            return Err(SensiError::syntax("directive has an empty expression"));
        }
        if settings.is_null() {
            return Err(SensiError::settings("no settings document given"));
        }

        *stage = MutationStage::LoadSettings;
        let format = InputFormat::from_settings(settings)?;

        *stage = MutationStage::LoadTable;
        let mut table = load_table(path, format.col_sep)?;

        let filtered;
        let view = match syntax.condition.as_deref() {
            Some(condition) => {
                *stage = MutationStage::FilterRows;
                let rows = interpret(condition, &table)?;
                debug!(condition, kept = rows.len(), "rows filtered");
                filtered = table.project(&rows);
                &filtered
            }
            None => &table,
        };

        *stage = MutationStage::SelectCells;
        let col = syntax
            .col
            .as_deref()
            .ok_or_else(|| SensiError::selection("no column for selection"))?;
        let (column, row) = parse_selector_string(col)?;
        let mut selection = select(view, &column, &row)?;

        if let Some(value) = syntax.value.as_deref() {
            *stage = MutationStage::ApplyValue;
            selection =
                ValueApplier::new(self.precision, format.dec_sep.as_str()).apply(value, selection)?;
        }

        *stage = MutationStage::WriteBack;
        for (column, cells) in selection {
            for (row, cell) in cells {
                table.set(&column, row, cell.render(&format.dec_sep))?;
            }
        }
        write_table(path, &table, format.col_sep, self.write_mode)
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        return format!("panic: {message}");
    }
    if let Some(message) = payload.downcast_ref::<String>() {
        return format!("panic: {message}");
    }
    "panic".to_string()
}
