//! Input-format settings read from the settings document.

use serde_json::Value;

use crate::core::error::{Result, SensiError};

/// `gen_param.input_format` of the settings document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFormat {
    /// Decimal separator used by numeric cells.
    pub dec_sep: String,
    /// Column separator of input tables; always a single byte.
    pub col_sep: u8,
}

impl InputFormat {
    pub fn from_settings(settings: &Value) -> Result<Self> {
        let format = settings
            .get("gen_param")
            .and_then(|gen_param| gen_param.get("input_format"))
            .ok_or_else(|| SensiError::settings("missing gen_param.input_format"))?;
        let dec_sep = string_field(format, "dec_sep")?;
        let col_sep = string_field(format, "col_sep")?;

        if dec_sep.is_empty() {
            return Err(SensiError::settings(
                "gen_param.input_format.dec_sep must not be empty",
            ));
        }
        let col_sep = match col_sep.as_bytes() {
            [byte] => *byte,
            _ => {
                return Err(SensiError::settings(format!(
                    "gen_param.input_format.col_sep must be a single byte (got '{col_sep}')"
                )));
            }
        };

        Ok(Self {
            dec_sep: dec_sep.to_string(),
            col_sep,
        })
    }
}

fn string_field<'a>(format: &'a Value, key: &str) -> Result<&'a str> {
    format
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| SensiError::settings(format!("missing gen_param.input_format.{key}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_separators() {
        let settings = json!({"gen_param": {"input_format": {"dec_sep": ",", "col_sep": ";"}}});
        let format = InputFormat::from_settings(&settings).expect("format");
        assert_eq!(
            format,
            InputFormat {
                dec_sep: ",".to_string(),
                col_sep: b';',
            }
        );
    }

    #[test]
    fn missing_keys_are_settings_errors() {
        let err = InputFormat::from_settings(&json!({"gen_param": {}})).unwrap_err();
        assert!(err.to_string().contains("gen_param.input_format"));

        let settings = json!({"gen_param": {"input_format": {"dec_sep": "."}}});
        let err = InputFormat::from_settings(&settings).unwrap_err();
        assert!(err.to_string().contains("col_sep"));
    }

    #[test]
    fn multi_byte_column_separator_is_rejected() {
        let settings = json!({"gen_param": {"input_format": {"dec_sep": ".", "col_sep": "::"}}});
        assert!(InputFormat::from_settings(&settings).is_err());
    }
}
