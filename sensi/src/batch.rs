//! Batch application of directives.
//!
//! Each directive is processed on its own: one failure is recorded and the
//! batch moves on. Directives targeting the same file are applied in order.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::core::syntax::{Syntax, parse};
use crate::io::config::EngineConfig;
use crate::io::resolver::PathResolver;
use crate::mutate::FileMutator;

/// Everything a directive needs besides its own text.
#[derive(Debug, Clone, Copy)]
pub struct BatchContext<'a> {
    pub document: &'a Value,
    pub settings: &'a Value,
    pub env_dir: &'a Path,
    pub config: &'a EngineConfig,
}

/// What happened to a single directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectiveOutcome {
    /// Plain parameter substitution, left to the caller's template system.
    Substitution(Syntax),
    /// Input file rewritten.
    Applied(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectiveFailure {
    pub directive: String,
    pub reason: String,
}

/// Summary of a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub applied: Vec<PathBuf>,
    pub substitutions: Vec<Syntax>,
    pub failures: Vec<DirectiveFailure>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Parse, resolve, and apply one directive.
pub fn apply_directive(
    raw: &str,
    ctx: &BatchContext<'_>,
    mutator: &FileMutator,
) -> Result<DirectiveOutcome> {
    let syntax = parse(raw).with_context(|| format!("parse directive '{raw}'"))?;
    if !syntax.is_file_directive() {
        debug!(expression = %syntax.expression, "plain substitution");
        return Ok(DirectiveOutcome::Substitution(syntax));
    }

    let path = PathResolver::new(ctx.document)
        .with_resources_dir(ctx.config.resources_dir.as_str())
        .resolve(&syntax.expression, ctx.env_dir)
        .with_context(|| format!("resolve input file for '{}'", syntax.expression))?;
    mutator
        .try_mutate(&path, &syntax, ctx.settings)
        .with_context(|| format!("mutate {}", path.display()))?;
    Ok(DirectiveOutcome::Applied(path))
}

/// Apply every directive in order, collecting failures instead of stopping.
pub fn apply_directives<I, S>(directives: I, ctx: &BatchContext<'_>) -> Result<BatchReport>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mutator = FileMutator::from_config(ctx.config)?;
    let mut report = BatchReport::default();
    for directive in directives {
        let directive = directive.as_ref();
        match apply_directive(directive, ctx, &mutator) {
            Ok(DirectiveOutcome::Applied(path)) => report.applied.push(path),
            Ok(DirectiveOutcome::Substitution(syntax)) => report.substitutions.push(syntax),
            Err(err) => report.failures.push(DirectiveFailure {
                directive: directive.to_string(),
                reason: format!("{err:#}"),
            }),
        }
    }
    info!(
        applied = report.applied.len(),
        substitutions = report.substitutions.len(),
        failed = report.failures.len(),
        "batch finished"
    );
    Ok(report)
}

/// Read directives from a file: one per line, blank lines and `#` comments skipped.
pub fn read_directives(path: &Path) -> Result<Vec<String>> {
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}
