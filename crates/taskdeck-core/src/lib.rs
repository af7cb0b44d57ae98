//! Core domain for taskdeck: task records, categories, theme, the filter engine,
//! the view projection, and the key-value storage contract.
//! Everything here is synchronous and free of I/O besides the storage trait.

pub mod categories;
pub mod filter;
pub mod storage;
pub mod tasks;
pub mod theme;
pub mod view;

use thiserror::Error;

/// Failure to parse one of the textual enums (priority, status, theme).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid {kind}: {value:?} (expected one of {expected})")]
pub struct ParseError {
    pub kind: &'static str,
    pub value: String,
    pub expected: &'static str,
}

impl ParseError {
    pub(crate) fn new(kind: &'static str, value: &str, expected: &'static str) -> Self {
        Self {
            kind,
            value: value.to_string(),
            expected,
        }
    }
}
