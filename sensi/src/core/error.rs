//! Domain error kind shared by every stage of directive processing.

use thiserror::Error;

/// Failure raised while parsing, resolving, selecting, or mutating.
///
/// Every variant aborts the current directive; nothing is partially applied.
#[derive(Debug, Error)]
pub enum SensiError {
    /// Malformed directive text.
    #[error("syntax error: {0}")]
    Syntax(String),

    /// Query expression rejected or produced no usable result.
    #[error("query error: {0}")]
    Query(String),

    /// Input file could not be located.
    #[error("path error: {0}")]
    Path(String),

    /// Required settings key missing or invalid.
    #[error("settings error: {0}")]
    Settings(String),

    /// Unsupported or ambiguous row-filter clause.
    #[error("condition error: {0}")]
    Condition(String),

    /// Column or row selector out of range or not found.
    #[error("selection error: {0}")]
    Selection(String),

    /// Malformed value token or failed arithmetic.
    #[error("value error: {0}")]
    Value(String),

    /// Header or record shape that cannot be rewritten without loss.
    #[error("layout error: {0}")]
    Layout(String),

    /// Delimited table could not be parsed or written.
    #[error("table error: {0}")]
    Table(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SensiError>;

impl SensiError {
    pub(crate) fn syntax(msg: impl Into<String>) -> Self {
        Self::Syntax(msg.into())
    }

    pub(crate) fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    pub(crate) fn path(msg: impl Into<String>) -> Self {
        Self::Path(msg.into())
    }

    pub(crate) fn settings(msg: impl Into<String>) -> Self {
        Self::Settings(msg.into())
    }

    pub(crate) fn condition(msg: impl Into<String>) -> Self {
        Self::Condition(msg.into())
    }

    pub(crate) fn selection(msg: impl Into<String>) -> Self {
        Self::Selection(msg.into())
    }

    pub(crate) fn layout(msg: impl Into<String>) -> Self {
        Self::Layout(msg.into())
    }

    pub(crate) fn value(msg: impl Into<String>) -> Self {
        Self::Value(msg.into())
    }
}
