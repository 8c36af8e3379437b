//! Sensitivity-directive engine.
//!
//! A directive such as `file::eco[EUR].driver[IR].param[2].where x>=3 = (+0.5)`
//! names an input table through the model document, selects cells in it, and
//! rewrites them. The architecture enforces a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (parsing, document queries,
//!   selection, row filters, value application). No I/O.
//! - **[`io`]**: Side-effecting operations (config, settings, documents,
//!   tables on disk, input path resolution).
//!
//! Orchestration modules ([`mutate`], [`batch`]) coordinate core logic with
//! I/O to implement CLI commands.

pub mod batch;
pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod mutate;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
