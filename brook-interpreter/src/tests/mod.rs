//! Acceptance tests for the Brook interpreter
//!
//! Each module runs whole scripts through the parser → interpreter pipeline
//! with a [`crate::ScriptSession`] and checks what they print and how they end.

pub mod test_acceptance_control_flow;
pub mod test_libraries;
pub mod test_runtime_errors;
