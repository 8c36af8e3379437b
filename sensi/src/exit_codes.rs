//! Stable exit codes for `sensi` CLI commands.

/// Command succeeded; every directive was applied.
pub const OK: i32 = 0;
/// Invalid invocation, unreadable inputs, or a directive that could not be parsed/resolved.
pub const INVALID: i32 = 1;
/// `sensi apply` finished but at least one directive failed.
pub const PARTIAL: i32 = 2;
