// Brook Library Loading
// The seam through which `use "name"` finds the symbols a library exposes

use crate::scope::Scope;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum LibraryError {
    #[error("no library named '{0}'")]
    NotFound(String),
    #[error("cannot read '{path}': {message}")]
    Io { path: String, message: String },
}

/// Supplies the names a registered library exposes to scripts.
pub trait LibraryLoader {
    fn load(&self, name: &str) -> Result<Scope, LibraryError>;
}

/// Loader for hosts that register no libraries.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLibraries;

impl LibraryLoader for NoLibraries {
    fn load(&self, name: &str) -> Result<Scope, LibraryError> {
        Err(LibraryError::NotFound(name.to_string()))
    }
}

/// Script libraries are loaded from source files instead of the registry.
pub const SCRIPT_LIBRARY_EXTENSION: &str = ".brook";

pub fn is_script_library(name: &str) -> bool {
    name.ends_with(SCRIPT_LIBRARY_EXTENSION)
}
