//! Resolution of file-directive queries to input files on disk.
//!
//! Inputs live under
//! `<env_dir>/<resources>/<sensi_1 name>/<framework name>_inputs/<local path>`,
//! where the local path is either `<eco folder>/<driver folder>/<file>` for
//! eco/driver addresses or `<parameter folder>/<file>` for flat parameters.
//! Some environments store the sensi_1 folder under its folder id instead of
//! its name; that layout is accepted as a fallback.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::Value;
use tracing::{debug, warn};

use crate::core::error::{Result, SensiError};
use crate::core::query::query;
use crate::core::syntax::Ident;

const FLAT_PREFIX: &str = "$.framework.sensi_1.";
const FILENAME_SUFFIX: &str = ".filename";
const REPORT_PREFIX: &str = "param.report.";
const REPORT_FOLDER: &str = "Report";

/// Driver class -> folder name.
const DRIVER_FOLDERS: [(&str, &str); 6] = [
    ("IR", "Nominal_rates"),
    ("RIR", "Real_rates"),
    ("EQ", "Equity"),
    ("RE", "Real_estate"),
    ("CRED", "Credit"),
    ("FX", "FX_rate"),
];

/// Flat parameter path -> folder name.
const PARAM_FOLDERS: [(&str, &str); 5] = [
    ("param.dependence", "Correlation"),
    ("hist_corr.target_corr", "Correlation"),
    ("param.table_format", "Formats"),
    ("param.roll_forward", "Roll_Forward"),
    ("param.aom", "Roll_Forward"),
];

static ECO_DRIVER_QUERY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^\$\.\.\*\[(?:'(?P<eco_key>[^']+)'|@\.name is '(?P<eco_name>[^']+)')\]",
        r"\.\.\*\[(?:'(?P<driver_key>[^']+)'|@\.name is '(?P<driver_name>[^']+)')\]\.",
    ))
    .expect("static eco/driver query regex")
});

/// Resolves query expressions against one model document.
#[derive(Debug, Clone)]
pub struct PathResolver<'a> {
    document: &'a Value,
    resources_dir: String,
}

impl<'a> PathResolver<'a> {
    pub fn new(document: &'a Value) -> Self {
        Self {
            document,
            resources_dir: "resources".to_string(),
        }
    }

    pub fn with_resources_dir(mut self, resources_dir: impl Into<String>) -> Self {
        self.resources_dir = resources_dir.into();
        self
    }

    /// Absolute location of the input file addressed by `expr`.
    pub fn resolve(&self, expr: &str, env_dir: &Path) -> Result<PathBuf> {
        let local = self.local_path(expr)?;
        let framework = self.first_string("$.framework.name")?;
        let inputs_dir = format!("{framework}_inputs");
        let sensi_name = self.first_string("$.framework.sensi_1.name")?;

        let global = env_dir
            .join(&self.resources_dir)
            .join(&sensi_name)
            .join(&inputs_dir)
            .join(&local);
        if global.exists() {
            debug!(path = %global.display(), "resolved input file");
            return Ok(global);
        }

        let sensi_id = self.first_string("$.framework.sensi_1.folder_id")?;
        let encrypted = env_dir
            .join(&self.resources_dir)
            .join(&sensi_id)
            .join(&inputs_dir)
            .join(&local);
        if encrypted.exists() {
            warn!(
                missing = %global.display(),
                path = %encrypted.display(),
                "input found under sensi folder id (encrypted paths)"
            );
            return Ok(encrypted);
        }

        Err(SensiError::path(format!(
            "no input file at {} or {}",
            global.display(),
            encrypted.display()
        )))
    }

    /// Path of the input file relative to `<framework>_inputs`.
    pub fn local_path(&self, expr: &str) -> Result<PathBuf> {
        let filename = self.first_string(expr)?;
        if let Some(caps) = ECO_DRIVER_QUERY.captures(expr) {
            let eco = ident(&caps, "eco_key", "eco_name")?;
            let driver = ident(&caps, "driver_key", "driver_name")?;
            let eco_folder = self.eco_folder(&eco)?;
            let driver_folder = self.driver_folder(&eco, &driver)?;
            return Ok(PathBuf::from(eco_folder).join(driver_folder).join(filename));
        }

        let key = expr
            .strip_prefix(FLAT_PREFIX)
            .and_then(|rest| rest.strip_suffix(FILENAME_SUFFIX))
            .unwrap_or(expr);
        let folder = folder_for_param(key)
            .ok_or_else(|| SensiError::path(format!("no input folder mapped for '{key}'")))?;
        Ok(PathBuf::from(folder).join(filename))
    }

    fn eco_folder(&self, eco: &Ident) -> Result<String> {
        let name = match eco {
            Ident::Key(key) => self.first_string(&format!("$..*['{key}'].name"))?,
            Ident::Name(name) => name.clone(),
        };
        self.first_string(&format!("$..*[@.name is '{name}'].folder_id"))
    }

    /// Folder of the driver's `class`, falling back to its `subclass`.
    fn driver_folder(&self, eco: &Ident, driver: &Ident) -> Result<&'static str> {
        let base = format!("${}{}", eco.query_term(), driver.query_term());
        let mut seen = Vec::new();
        for attribute in ["class", "subclass"] {
            let values = query(self.document, &format!("{base}.{attribute}"))?;
            let Some(class) = values.first().and_then(scalar_string) else {
                continue;
            };
            if let Some(folder) = folder_for_class(&class) {
                return Ok(folder);
            }
            seen.push(class);
        }
        Err(SensiError::path(format!(
            "no driver folder for {driver:?} (classes seen: {seen:?})"
        )))
    }

    fn first_string(&self, expr: &str) -> Result<String> {
        query(self.document, expr)?
            .first()
            .and_then(scalar_string)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| SensiError::query(format!("no value found for '{expr}'")))
    }
}

/// Resolve `expr` against `document` below `env_dir` with the default layout.
pub fn resolve(document: &Value, expr: &str, env_dir: &Path) -> Result<PathBuf> {
    PathResolver::new(document).resolve(expr, env_dir)
}

fn ident(caps: &Captures<'_>, key: &str, name: &str) -> Result<Ident> {
    match (caps.name(key), caps.name(name)) {
        (Some(key), _) => Ok(Ident::Key(key.as_str().to_string())),
        (None, Some(name)) => Ok(Ident::Name(name.as_str().to_string())),
        (None, None) => Err(SensiError::query(format!("missing {key}/{name} identifier"))),
    }
}

fn folder_for_class(class: &str) -> Option<&'static str> {
    DRIVER_FOLDERS
        .iter()
        .find(|(known, _)| *known == class)
        .map(|(_, folder)| *folder)
}

fn folder_for_param(key: &str) -> Option<&'static str> {
    if key.starts_with(REPORT_PREFIX) {
        return Some(REPORT_FOLDER);
    }
    PARAM_FOLDERS
        .iter()
        .find(|(known, _)| *known == key)
        .map(|(_, folder)| *folder)
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::syntax::parse;
    use crate::test_support::{input_root, sample_document, write_file};

    fn expr(directive: &str) -> String {
        parse(directive).expect("parse").expression
    }

    #[test]
    fn flat_parameters_map_to_static_folders() {
        let doc = sample_document();
        let resolver = PathResolver::new(&doc);
        assert_eq!(
            resolver
                .local_path(&expr("file::param.dependence[1] = 1"))
                .expect("local"),
            PathBuf::from("Correlation/correlation.csv")
        );
        assert_eq!(
            resolver
                .local_path(&expr("file::param.report.summary[1] = 1"))
                .expect("local"),
            PathBuf::from("Report/report.csv")
        );
    }

    #[test]
    fn unknown_flat_parameter_is_rejected() {
        let doc = sample_document();
        let err = PathResolver::new(&doc)
            .local_path(&expr("file::param.unmapped[1] = 1"))
            .unwrap_err();
        assert!(err.to_string().contains("no input folder mapped"));
    }

    #[test]
    fn missing_filename_is_rejected() {
        let doc = sample_document();
        let err = PathResolver::new(&doc)
            .local_path(&expr("file::param.nothing_here[1] = 1"))
            .unwrap_err();
        assert!(matches!(err, SensiError::Query(_)));
    }

    #[test]
    fn eco_and_driver_names_map_to_folders() {
        let doc = sample_document();
        let local = PathResolver::new(&doc)
            .local_path(&expr("file::eco[EUR].driver[IR].param[1] = 1"))
            .expect("local");
        assert_eq!(local, PathBuf::from("E01/Nominal_rates/eur_ir_param.csv"));
    }

    #[test]
    fn eco_and_driver_keys_fall_back_to_subclass() {
        let doc = sample_document();
        let local = PathResolver::new(&doc)
            .local_path(&expr("file::eco_1.driver_2.param[1] = 1"))
            .expect("local");
        assert_eq!(local, PathBuf::from("E01/Equity/eur_eq_param.csv"));
    }

    #[test]
    fn resolve_prefers_sensi_name_folder() {
        let doc = sample_document();
        let temp = tempfile::tempdir().expect("tempdir");
        let expected = input_root(temp.path(), "central").join("Correlation/correlation.csv");
        write_file(&expected, "a\n1\n");

        let path = resolve(&doc, &expr("file::param.dependence[1] = 1"), temp.path())
            .expect("resolve");
        assert_eq!(path, expected);
    }

    #[test]
    fn resolve_falls_back_to_folder_id() {
        let doc = sample_document();
        let temp = tempfile::tempdir().expect("tempdir");
        let expected = input_root(temp.path(), "S001").join("Formats/formats.csv");
        write_file(&expected, "a\n1\n");

        let path = resolve(&doc, &expr("file::param.table_format[1] = 1"), temp.path())
            .expect("resolve");
        assert_eq!(path, expected);
    }

    #[test]
    fn resolve_reports_missing_file() {
        let doc = sample_document();
        let temp = tempfile::tempdir().expect("tempdir");
        let err = resolve(&doc, &expr("file::param.aom[1] = 1"), temp.path()).unwrap_err();
        assert!(matches!(err, SensiError::Path(_)));
    }
}
