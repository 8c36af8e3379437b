//! Engine configuration stored in an optional TOML file.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::precision::{DEFAULT_DIGITS, MAX_DIGITS, Precision};

/// How a mutated table replaces the original file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    /// Delete the original, then write the new contents in place.
    #[default]
    Replace,
    /// Write a sibling temp file, then rename it over the original.
    Atomic,
}

/// Engine configuration (TOML).
///
/// Missing fields default to the values the directive format was designed
/// around, so an absent file is a valid configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EngineConfig {
    /// Significant decimal digits kept after arithmetic mutations.
    pub precision_digits: u32,

    /// Strategy used when rewriting input tables.
    pub write_mode: WriteMode,

    /// Directory under the environment root holding sensitivity inputs.
    pub resources_dir: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            precision_digits: DEFAULT_DIGITS,
            write_mode: WriteMode::Replace,
            resources_dir: "resources".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.precision_digits == 0 || self.precision_digits > MAX_DIGITS {
            return Err(anyhow!("precision_digits must be within 1..={MAX_DIGITS}"));
        }
        if self.resources_dir.trim().is_empty() {
            return Err(anyhow!("resources_dir must not be empty"));
        }
        Ok(())
    }

    pub fn precision(&self) -> Result<Precision> {
        Ok(Precision::new(self.precision_digits)?)
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `EngineConfig::default()`.
pub fn load_config(path: &Path) -> Result<EngineConfig> {
    if !path.exists() {
        let cfg = EngineConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: EngineConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &EngineConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    if !parent.as_os_str().is_empty() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, buf)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}
