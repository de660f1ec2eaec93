//! Interpreter configuration and I/O sinks.

use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;

/// Call depth allowed when none is configured.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterpreterConfig {
    /// Nested script calls allowed before a stack overflow is raised.
    pub max_call_depth: usize,
    /// Directory that `use "x.brook"` paths are relative to.
    pub base_dir: PathBuf,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            base_dir: PathBuf::from("."),
        }
    }
}

impl InterpreterConfig {
    pub fn with_max_call_depth(mut self, max_call_depth: Option<usize>) -> Self {
        self.max_call_depth = max_call_depth.unwrap_or(DEFAULT_MAX_CALL_DEPTH);
        self
    }

    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }
}

/// Where a running script reads and writes.
pub struct Io {
    pub stdout: Box<dyn Write>,
    pub stderr: Box<dyn Write>,
    pub stdin: Box<dyn BufRead>,
}

impl Io {
    pub fn new(stdout: Box<dyn Write>, stderr: Box<dyn Write>, stdin: Box<dyn BufRead>) -> Self {
        Self {
            stdout,
            stderr,
            stdin,
        }
    }

    /// The process streams.
    pub fn standard() -> Self {
        Self::new(
            Box::new(io::stdout()),
            Box::new(io::stderr()),
            Box::new(BufReader::new(io::stdin())),
        )
    }
}

impl std::fmt::Debug for Io {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Io").finish_non_exhaustive()
    }
}
