//! Runtime error types for the Brook interpreter.
//!
//! Structured [`RuntimeError`]s describe what went wrong; once raised inside a
//! script they travel as an [`Unwind`], the single channel that carries both
//! catchable script exceptions and the uncatchable program exit.

use brook_parser::path::PathError;
use brook_parser::Value;
use miette::Diagnostic;
use thiserror::Error;

/// Runtime errors that can occur during interpretation
#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
pub enum RuntimeError {
    #[error("Type error: expected {expected}, found {found} ({context})")]
    #[diagnostic(
        code(brook::runtime::type_error),
        help("Check that the value has the expected type or define a conversion function")
    )]
    TypeError {
        expected: String,
        found: String,
        context: String,
    },

    #[error("Undefined variable: {name}")]
    #[diagnostic(
        code(brook::runtime::undefined_variable),
        help("Make sure the variable is defined before use")
    )]
    UndefinedVariable { name: String },

    #[error("Undefined function: {name}")]
    #[diagnostic(code(brook::runtime::undefined_function))]
    UndefinedFunction { name: String },

    #[error("Variable '{name}' is already defined in this scope")]
    #[diagnostic(code(brook::runtime::already_defined))]
    AlreadyDefined { name: String },

    #[error("Unknown class: {name}")]
    #[diagnostic(code(brook::runtime::unknown_class))]
    UnknownClass { name: String },

    #[error("'{name}' is not a class instance")]
    #[diagnostic(code(brook::runtime::not_an_instance))]
    NotAnInstance { name: String },

    #[error("'{owner}' has no member '{member}'")]
    #[diagnostic(code(brook::runtime::unknown_member))]
    UnknownMember { owner: String, member: String },

    #[error("Wrong arity: function {function} expects {expected} arguments, got {found}")]
    #[diagnostic(
        code(brook::runtime::wrong_arity),
        help("Check the function signature for the correct number of arguments")
    )]
    WrongArity {
        function: String,
        expected: usize,
        found: usize,
    },

    #[error("Division by zero")]
    #[diagnostic(
        code(brook::runtime::division_by_zero),
        help("Ensure the divisor is not zero before division")
    )]
    DivisionByZero,

    #[error("Index out of bounds: index {index} is not valid for array of length {length}")]
    #[diagnostic(
        code(brook::runtime::index_out_of_bounds),
        help("Ensure the index is within the valid range [0, {length})")
    )]
    IndexOutOfBounds { index: i64, length: usize },

    #[error("Invalid operation: {operation} cannot be applied to types [{operand_types}]")]
    #[diagnostic(code(brook::runtime::invalid_operation))]
    InvalidOperation {
        operation: String,
        operand_types: String, // Join types with ", " when creating the error
    },

    #[error("Cannot convert '{value}' to {target}")]
    #[diagnostic(code(brook::runtime::invalid_conversion))]
    InvalidConversion { value: String, target: String },

    #[error("Function call stack overflow (max depth: {max_depth})")]
    #[diagnostic(
        code(brook::runtime::stack_overflow),
        help("Check for unbounded recursion")
    )]
    StackOverflow { max_depth: usize },

    #[error("Unknown library: {name}")]
    #[diagnostic(code(brook::runtime::unknown_library))]
    UnknownLibrary { name: String },

    #[error("Cannot load library {name}: {message}")]
    #[diagnostic(code(brook::runtime::library_load))]
    LibraryLoad { name: String, message: String },

    #[error("Network error: {message}")]
    #[diagnostic(code(brook::runtime::network))]
    Network { message: String },

    #[error("Assertion failed: {message}")]
    #[diagnostic(code(brook::runtime::assertion_failed))]
    AssertionFailed { message: String },

    #[error("I/O error: {message}")]
    #[diagnostic(code(brook::runtime::io))]
    Io { message: String },

    #[error("{message}")]
    #[diagnostic(code(brook::runtime::custom_error))]
    Custom { message: String },
}

impl RuntimeError {
    /// Create a type error
    pub fn type_error(expected: &str, found: &str, context: impl Into<String>) -> Self {
        Self::TypeError {
            expected: expected.to_string(),
            found: found.to_string(),
            context: context.into(),
        }
    }

    /// Create an undefined function error
    pub fn undefined_function(name: &str) -> Self {
        Self::UndefinedFunction {
            name: name.to_string(),
        }
    }

    /// Create a wrong arity error
    pub fn wrong_arity(function: &str, expected: usize, found: usize) -> Self {
        Self::WrongArity {
            function: function.to_string(),
            expected,
            found,
        }
    }

    /// Create an invalid operation error
    pub fn invalid_operation(operation: &str, operand_types: Vec<String>) -> Self {
        Self::InvalidOperation {
            operation: operation.to_string(),
            operand_types: operand_types.join(", "),
        }
    }

    pub fn invalid_conversion(value: &str, target: &str) -> Self {
        Self::InvalidConversion {
            value: value.to_string(),
            target: target.to_string(),
        }
    }

    pub fn io(error: impl std::fmt::Display) -> Self {
        Self::Io {
            message: error.to_string(),
        }
    }

    /// Create a custom error
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom {
            message: message.into(),
        }
    }
}

impl From<PathError> for RuntimeError {
    fn from(error: PathError) -> Self {
        match error {
            PathError::Empty => Self::custom("empty path"),
            PathError::UnknownVariable(name) => Self::UndefinedVariable { name },
            PathError::UnknownFunction(name) => Self::UndefinedFunction { name },
            PathError::NotAnInstance(name) => Self::NotAnInstance { name },
            PathError::UnknownMember { owner, member } => Self::UnknownMember { owner, member },
        }
    }
}

/// A value raised by `throw`, or produced from a [`RuntimeError`].
#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
#[error("unhandled exception: {}", crate::builtins::render(&self.payload))]
#[diagnostic(code(brook::runtime::unhandled_exception))]
pub struct ScriptException {
    pub payload: Value,
}

/// Non-local exits out of statement execution.
#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
pub enum Unwind {
    /// Caught by the nearest enclosing try/catch.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Exception(ScriptException),

    /// Never caught; ends the program with the given code.
    #[error("program exited with code {0}")]
    #[diagnostic(code(brook::runtime::exit))]
    Exit(i32),
}

impl Unwind {
    pub fn throw(payload: Value) -> Self {
        Self::Exception(ScriptException { payload })
    }

    pub fn exit(code: i64) -> Self {
        Self::Exit(exit_code(code))
    }
}

/// Process exit code for a script integer, saturating outside the `i32` range.
pub fn exit_code(code: i64) -> i32 {
    i32::try_from(code).unwrap_or(if code < 0 { i32::MIN } else { i32::MAX })
}

impl From<RuntimeError> for Unwind {
    fn from(error: RuntimeError) -> Self {
        tracing::debug!(%error, "runtime error raised as script exception");
        Self::throw(Value::string(error.to_string()))
    }
}

impl From<PathError> for Unwind {
    fn from(error: PathError) -> Self {
        RuntimeError::from(error).into()
    }
}

/// How a block finished when it did not unwind.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Normal,
    Return(Value),
}

/// Type alias for interpreter results
pub type Result<T> = std::result::Result<T, Unwind>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_saturate() {
        assert_eq!(exit_code(3), 3);
        assert_eq!(exit_code(-1), -1);
        assert_eq!(exit_code(4_294_967_297), i32::MAX);
        assert_eq!(exit_code(-4_294_967_297), i32::MIN);
        assert_eq!(Unwind::exit(1 << 40), Unwind::Exit(i32::MAX));
    }
}
