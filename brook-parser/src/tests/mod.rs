//! Parser tests
//!
//! Whole scripts go through [`crate::parse_script`] against a small prelude;
//! the modules check the statements and typed values that come out.

pub mod common;
pub mod test_expressions;
pub mod test_libraries;
pub mod test_serialization;
pub mod test_statements;
