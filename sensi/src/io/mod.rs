//! I/O helpers for directive processing.

pub mod config;
pub mod document;
pub mod resolver;
pub mod settings;
pub mod table_store;
