// Brook Parser Library
// Line-oriented parser and shared data model for the Brook scripting language

pub mod ast;
pub mod error;
pub mod library;
pub mod lines;
pub mod parser;
pub mod path;
pub mod scan;
pub mod scope;
pub mod types;

// Include tests directory with all test modules
#[cfg(test)]
#[path = "tests/mod.rs"]
pub mod tests;

pub use ast::*;
pub use error::*;
pub use library::{LibraryError, LibraryLoader, NoLibraries};
pub use parser::Parser;
pub use scope::{Binding, Scope};

/// Parse a whole script against `prelude` with no libraries available.
pub fn parse_script(source: &str, prelude: Scope) -> Result<Script, ParseError> {
    Parser::new(prelude).parse(source)
}

// Version and metadata
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
