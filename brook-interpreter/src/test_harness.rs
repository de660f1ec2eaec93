//! Script session for testing the Brook interpreter
//!
//! A [`ScriptSession`] runs whole scripts against captured output streams so
//! tests can assert on what a script printed and how it ended:
//! - Capture stdout and stderr into shared buffers
//! - Feed canned input to `read_line`
//! - Run with custom configuration or extra libraries

use crate::builtins::BuiltinRegistry;
use crate::config::{InterpreterConfig, Io};
use crate::context::InterpreterContext;
use crate::interpreter::{Interpreter, Outcome};
use crate::library::{Library, LibraryRegistry};
use brook_parser::{ParseError, Script};
use miette::Diagnostic;
use std::cell::RefCell;
use std::io::{Cursor, Write};
use std::rc::Rc;
use thiserror::Error;

/// Errors that can occur in the test harness
#[derive(Debug, Error, Diagnostic)]
pub enum TestHarnessError {
    #[error("Parse error: {source}")]
    #[diagnostic(code(brook::test_harness::parse))]
    Parse {
        #[from]
        source: ParseError,
    },

    #[error("Assertion failed: expected {expected}, got {actual}")]
    #[diagnostic(code(brook::test_harness::assertion))]
    AssertionFailed { expected: String, actual: String },
}

/// A clonable in-memory writer; every clone appends to the same buffer.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Runs scripts and keeps what they wrote
pub struct ScriptSession {
    interpreter: Interpreter,
    stdout: SharedBuffer,
    stderr: SharedBuffer,
    input: String,
}

impl ScriptSession {
    pub fn new() -> Self {
        Self::with_config(InterpreterConfig::default())
    }

    pub fn with_config(config: InterpreterConfig) -> Self {
        Self {
            interpreter: Interpreter::new(config),
            stdout: SharedBuffer::default(),
            stderr: SharedBuffer::default(),
            input: String::new(),
        }
    }

    pub fn with_library(mut self, library: impl Library + 'static) -> Self {
        self.interpreter = self.interpreter.with_library(library);
        self
    }

    /// Text handed to `read_line` by later runs.
    pub fn with_input(mut self, input: impl Into<String>) -> Self {
        self.input = input.into();
        self
    }

    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    fn io(&self) -> Io {
        Io::new(
            Box::new(self.stdout.clone()),
            Box::new(self.stderr.clone()),
            Box::new(Cursor::new(self.input.clone().into_bytes())),
        )
    }

    /// Parse and run `source`, appending to the captured output.
    pub fn run(&mut self, source: &str) -> Result<Outcome, TestHarnessError> {
        let script = self.interpreter.parse(source)?;
        Ok(self.run_script(&script))
    }

    pub fn run_script(&mut self, script: &Script) -> Outcome {
        let io = self.io();
        self.interpreter.execute(script, io)
    }

    pub fn stdout(&self) -> String {
        self.stdout.contents()
    }

    pub fn stderr(&self) -> String {
        self.stderr.contents()
    }

    /// Forget everything captured so far.
    pub fn clear_output(&mut self) {
        self.stdout.clear();
        self.stderr.clear();
    }

    /// Run `source` and check its standard output.
    pub fn assert_output(&mut self, source: &str, expected: &str) -> Result<(), TestHarnessError> {
        self.clear_output();
        self.run(source)?;
        let actual = self.stdout();
        if actual == expected {
            Ok(())
        } else {
            Err(TestHarnessError::AssertionFailed {
                expected: format!("{expected:?}"),
                actual: format!("{actual:?}"),
            })
        }
    }

    /// Run `source` and check the exit code it ends with.
    pub fn assert_exit_code(&mut self, source: &str, expected: i32) -> Result<(), TestHarnessError> {
        let outcome = self.run(source)?;
        if outcome.exit_code() == expected {
            Ok(())
        } else {
            Err(TestHarnessError::AssertionFailed {
                expected: format!("exit code {expected}"),
                actual: format!("{outcome:?}"),
            })
        }
    }
}

impl Default for ScriptSession {
    fn default() -> Self {
        Self::new()
    }
}

/// A context with the standard builtins whose output goes nowhere.
pub fn null_context() -> InterpreterContext {
    let libraries = LibraryRegistry::standard();
    let mut builtins = BuiltinRegistry::standard();
    libraries.install_natives(&mut builtins);
    InterpreterContext::new(
        &InterpreterConfig::default(),
        Rc::new(builtins),
        Rc::new(libraries),
        Io::new(
            Box::new(std::io::sink()),
            Box::new(std::io::sink()),
            Box::new(std::io::empty()),
        ),
    )
}
