//! Core interpreter implementation for running parsed Brook scripts.

use crate::builtins::{json_of, BuiltinRegistry};
use crate::config::{InterpreterConfig, Io};
use crate::context::{CallFrame, InterpreterContext};
use crate::error::{exit_code, Flow, Result, Unwind};
use crate::evaluator;
use crate::library::{Library, LibraryRegistry};
use brook_parser::types;
use brook_parser::{ParseError, Parser, Scope, Script, Value};
use std::io::Write;
use std::rc::Rc;

/// How a script run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Ran to the end, or returned from the top level.
    Completed(i32),
    /// Stopped by `exit(code)`.
    Exited(i32),
    /// A script exception reached the top level.
    Uncaught(Value),
}

impl Outcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::Completed(code) | Outcome::Exited(code) => *code,
            Outcome::Uncaught(_) => 1,
        }
    }
}

/// The main interpreter for parsing and running Brook programs
#[derive(Debug, Clone)]
pub struct Interpreter {
    config: InterpreterConfig,
    builtins: Rc<BuiltinRegistry>,
    libraries: Rc<LibraryRegistry>,
}

impl Interpreter {
    /// Create an interpreter with the standard builtins and libraries
    pub fn new(config: InterpreterConfig) -> Self {
        let libraries = LibraryRegistry::standard();
        let mut builtins = BuiltinRegistry::standard();
        libraries.install_natives(&mut builtins);

        Self {
            config,
            builtins: Rc::new(builtins),
            libraries: Rc::new(libraries),
        }
    }

    /// Register an additional library, available to `use` in later parses.
    pub fn with_library(mut self, library: impl Library + 'static) -> Self {
        let builtins = Rc::make_mut(&mut self.builtins);
        for (symbol, callback) in library.natives() {
            builtins.register_native(symbol, callback);
        }
        Rc::make_mut(&mut self.libraries).register(Rc::new(library));
        self
    }

    /// The builtin signatures scripts are parsed against.
    pub fn prelude(&self) -> Scope {
        self.builtins.prelude()
    }

    pub fn parse(&self, source: &str) -> std::result::Result<Script, ParseError> {
        Parser::new(self.prelude())
            .with_loader(self.libraries.as_ref())
            .with_base_dir(&self.config.base_dir)
            .parse(source)
    }

    /// Parse and execute `source`.
    pub fn run(&self, source: &str, io: Io) -> std::result::Result<Outcome, ParseError> {
        let script = self.parse(source)?;
        Ok(self.execute(&script, io))
    }

    /// Execute a parsed script in a fresh global scope.
    pub fn execute(&self, script: &Script, io: Io) -> Outcome {
        let mut ctx = InterpreterContext::new(
            &self.config,
            Rc::clone(&self.builtins),
            Rc::clone(&self.libraries),
            io,
        );
        for class in &script.classes {
            ctx.scope_mut().define_class(Rc::clone(class));
        }

        let outcome = match run_main(&mut ctx, script) {
            Ok(Flow::Return(Value::Constant(constant))) if constant.object_type == types::INT => {
                Outcome::Completed(constant.as_int().map_or(0, exit_code))
            }
            Ok(_) => Outcome::Completed(0),
            Err(Unwind::Exit(code)) => Outcome::Exited(code),
            Err(Unwind::Exception(exception)) => {
                tracing::debug!(
                    payload = ?exception.payload,
                    state = %ctx.debug_state(),
                    "uncaught script exception"
                );
                let report = json_of(&exception.payload);
                // The script is already over; a failing error stream has nowhere to report to.
                let _ = writeln!(ctx.io.stderr, "An unhandled exception occurred: {report}");
                Outcome::Uncaught(exception.payload)
            }
        };

        let _ = ctx.io.stdout.flush();
        let _ = ctx.io.stderr.flush();
        tracing::debug!(outcome = ?outcome, "script finished");
        outcome
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(InterpreterConfig::default())
    }
}

fn run_main(ctx: &mut InterpreterContext, script: &Script) -> Result<Flow> {
    ctx.push_call_frame(CallFrame::main())?;
    let flow = evaluator::execute_block(ctx, &script.statements);
    ctx.pop_call_frame();
    flow
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_harness::SharedBuffer;

    fn run(source: &str) -> (Outcome, String, String) {
        let stdout = SharedBuffer::default();
        let stderr = SharedBuffer::default();
        let io = Io::new(
            Box::new(stdout.clone()),
            Box::new(stderr.clone()),
            Box::new(std::io::empty()),
        );
        let outcome = Interpreter::default().run(source, io).unwrap();
        (outcome, stdout.contents(), stderr.contents())
    }

    #[test]
    fn test_top_level_int_return_is_exit_code() {
        let (outcome, _, _) = run("return 7");
        assert_eq!(outcome, Outcome::Completed(7));
    }

    #[test]
    fn test_non_int_return_is_zero() {
        let (outcome, _, _) = run("return \"done\"");
        assert_eq!(outcome, Outcome::Completed(0));
    }

    #[test]
    fn test_uncaught_exception_reports_json() {
        let (outcome, _, stderr) = run("throw \"x\"");
        assert_eq!(outcome.exit_code(), 1);
        assert_eq!(stderr, "An unhandled exception occurred: \"x\"\n");
    }

    #[test]
    fn test_parse_errors_are_returned() {
        let error = Interpreter::default()
            .run("int a = 1 + \"a\"", Io::standard())
            .unwrap_err();
        assert_eq!(error.line, 1);
    }
}
