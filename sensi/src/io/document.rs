//! Loading of model and settings documents.
//!
//! Both are nested map/sequence structures. JSON is the default encoding;
//! files with a `.toml` extension are parsed as TOML.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::debug;

/// Read a document into a generic JSON value.
pub fn load_document(path: &Path) -> Result<Value> {
    debug!(path = %path.display(), "loading document");
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let is_toml = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    let value = if is_toml {
        toml::from_str::<Value>(&contents)
            .with_context(|| format!("parse toml {}", path.display()))?
    } else {
        serde_json::from_str(&contents)
            .with_context(|| format!("parse json {}", path.display()))?
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn loads_json_and_toml() {
        let temp = tempfile::tempdir().expect("tempdir");
        let json_path = temp.path().join("settings.json");
        fs::write(&json_path, r#"{"gen_param": {"input_format": {"col_sep": ";"}}}"#)
            .expect("write json");
        let toml_path = temp.path().join("settings.toml");
        fs::write(&toml_path, "[gen_param.input_format]\ncol_sep = \";\"\n").expect("write toml");

        let expected = json!({"gen_param": {"input_format": {"col_sep": ";"}}});
        assert_eq!(load_document(&json_path).expect("json"), expected);
        assert_eq!(load_document(&toml_path).expect("toml"), expected);
    }

    #[test]
    fn reports_parse_errors_with_path() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("broken.json");
        fs::write(&path, "{").expect("write");
        let err = load_document(&path).unwrap_err();
        assert!(format!("{err:#}").contains("broken.json"));
    }
}
