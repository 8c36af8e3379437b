//! Deterministic, pure logic for directive processing.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! documents and tables and return deterministic outputs suitable for tests.

pub mod condition;
pub mod error;
pub mod precision;
pub mod query;
pub mod selector;
pub mod syntax;
pub mod table;
pub mod value;
