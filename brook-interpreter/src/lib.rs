//! Brook Interpreter
//!
//! Tree-walking runtime for scripts produced by `brook-parser`. Each block and
//! call runs in a scope copied from its caller and merged back on exit;
//! operators arrive as calls to intrinsic functions, values are converted
//! implicitly through conversion functions, and exceptions and `exit` unwind
//! as typed errors rather than panics.

// Allow clippy lints for development
#![allow(clippy::single_match)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::result_large_err)]

pub mod builtins;
pub mod config;
pub mod context;
pub mod conversion;
pub mod error;
pub mod evaluator;
pub mod function_dispatch;
pub mod http;
pub mod interpreter;
pub mod intrinsics;
pub mod library;
pub mod test_harness;

// Include tests directory with all test modules
#[cfg(test)]
#[path = "tests/mod.rs"]
pub mod tests;

// Re-export public API
pub use builtins::{BuiltinRegistry, NativeFn};
pub use config::{InterpreterConfig, Io, DEFAULT_MAX_CALL_DEPTH};
pub use context::{CallFrame, InterpreterContext};
pub use error::{Flow, RuntimeError, ScriptException, Unwind};
pub use http::HttpLibrary;
pub use interpreter::{Interpreter, Outcome};
pub use library::{Library, LibraryRegistry, MathLibrary};
pub use test_harness::{ScriptSession, SharedBuffer, TestHarnessError};

