// Brook Parser Error Handling
// Parse failures carry the offending logical line and a miette diagnostic code

use crate::path::PathError;
use miette::Diagnostic;
use thiserror::Error;

/// A parse failure on one logical line.
#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
#[error("{kind} (line {line}: `{text}`)")]
#[diagnostic(forward(kind))]
pub struct ParseError {
    pub line: usize,
    pub text: String,
    pub kind: ParseErrorKind,
}

#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
pub enum ParseErrorKind {
    #[error("Unknown identifier '{0}'")]
    #[diagnostic(
        code(brook::parse::unknown_identifier),
        help("Declare the variable before using it")
    )]
    UnknownIdentifier(String),

    #[error("Unknown function '{0}'")]
    #[diagnostic(
        code(brook::parse::unknown_function),
        help("Functions must be defined before the line that calls them")
    )]
    UnknownFunction(String),

    #[error("Unknown class '{0}'")]
    #[diagnostic(code(brook::parse::unknown_class))]
    UnknownClass(String),

    #[error("'{owner}' has no member '{member}'")]
    #[diagnostic(code(brook::parse::unknown_member))]
    UnknownMember { owner: String, member: String },

    #[error("'{0}' is not a class instance")]
    #[diagnostic(
        code(brook::parse::not_an_instance),
        help("Only class instances can be used with dot notation")
    )]
    NotAnInstance(String),

    #[error("Type mismatch: cannot apply '{operator}' to {left} and {right}")]
    #[diagnostic(
        code(brook::parse::type_mismatch),
        help("Both operands must have the same type; convert one side explicitly")
    )]
    TypeMismatch {
        operator: String,
        left: String,
        right: String,
    },

    #[error("Operator '{operator}' is not defined for {operand_type}")]
    #[diagnostic(code(brook::parse::invalid_operator))]
    InvalidOperator {
        operator: String,
        operand_type: String,
    },

    #[error("Array elements must share one type: expected {expected}, found {found}")]
    #[diagnostic(code(brook::parse::mixed_array))]
    MixedArray { expected: String, found: String },

    #[error("'{0}' is not an array")]
    #[diagnostic(code(brook::parse::not_an_array))]
    NotAnArray(String),

    #[error("Array index must be int, found {0}")]
    #[diagnostic(code(brook::parse::invalid_index))]
    InvalidIndex(String),

    #[error("Condition must be bool, found {0}")]
    #[diagnostic(code(brook::parse::condition_not_bool))]
    ConditionNotBool(String),

    #[error("Function '{function}' expects {expected} arguments, found {found}")]
    #[diagnostic(code(brook::parse::wrong_arity))]
    WrongArity {
        function: String,
        expected: usize,
        found: usize,
    },

    #[error("Malformed block: {0}")]
    #[diagnostic(
        code(brook::parse::malformed_block),
        help("Every block opens with '{{' on the line after its header and closes with a matching '}}'")
    )]
    MalformedBlock(String),

    #[error("try statement must have a catch statement")]
    #[diagnostic(code(brook::parse::missing_catch))]
    MissingCatch,

    #[error("Unbalanced scope braces")]
    #[diagnostic(code(brook::parse::unbalanced_scope))]
    UnbalancedScope,

    #[error("Invalid type name '{0}'")]
    #[diagnostic(code(brook::parse::invalid_type))]
    InvalidType(String),

    #[error("Invalid expression '{0}'")]
    #[diagnostic(code(brook::parse::invalid_expression))]
    InvalidExpression(String),

    #[error("Invalid statement")]
    #[diagnostic(
        code(brook::parse::invalid_statement),
        help("Expected a declaration, assignment, call, or control-flow statement")
    )]
    InvalidStatement,

    #[error("Only fields and methods may appear in a class body")]
    #[diagnostic(code(brook::parse::invalid_class_member))]
    InvalidClassMember,

    #[error("Field '{field}' of class '{class}' cannot default to a new {class}")]
    #[diagnostic(
        code(brook::parse::self_referential_field),
        help("Leave the field without a default and assign it from a method")
    )]
    SelfReferentialField { class: String, field: String },

    #[error("Cannot load library '{name}': {message}")]
    #[diagnostic(code(brook::parse::library))]
    Library { name: String, message: String },
}

impl From<PathError> for ParseErrorKind {
    fn from(error: PathError) -> Self {
        match error {
            PathError::Empty => ParseErrorKind::InvalidExpression(String::new()),
            PathError::UnknownVariable(name) => ParseErrorKind::UnknownIdentifier(name),
            PathError::UnknownFunction(name) => ParseErrorKind::UnknownFunction(name),
            PathError::NotAnInstance(name) => ParseErrorKind::NotAnInstance(name),
            PathError::UnknownMember { owner, member } => {
                ParseErrorKind::UnknownMember { owner, member }
            }
        }
    }
}

/// Result type for parsing operations
pub type ParseResult<T> = Result<T, ParseError>;
