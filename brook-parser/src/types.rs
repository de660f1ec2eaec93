// Brook Parser Type Tags
// Names of the builtin object types and the acceptance rule shared by the
// parser and the interpreter

pub const INT: &str = "int";
pub const FLOAT: &str = "float";
pub const BOOL: &str = "bool";
pub const STRING: &str = "string";
pub const CLASS: &str = "class";
pub const NULL: &str = "NULL";
pub const ANY: &str = "any";
pub const ANY_ARRAY: &str = "any[]";

/// Canonical spelling of a declared type. `null` and `void` both mean `NULL`.
pub fn normalize(name: &str) -> String {
    match name.trim() {
        "null" | "void" | "NULL" => NULL.to_string(),
        other => other.to_string(),
    }
}

/// Whether a value of type `actual` may be stored where `expected` is declared.
pub fn accepts(expected: &str, actual: &str) -> bool {
    expected == actual || expected == ANY || (expected == ANY_ARRAY && is_array(actual))
}

pub fn is_array(name: &str) -> bool {
    name.ends_with("[]")
}

pub fn element_type(name: &str) -> Option<&str> {
    name.strip_suffix("[]")
}

pub fn array_of(element: &str) -> String {
    format!("{element}[]")
}

pub fn is_numeric(name: &str) -> bool {
    name == INT || name == FLOAT
}

/// A type name is an identifier followed by any number of `[]` pairs.
pub fn is_type_name(name: &str) -> bool {
    let mut base = name;
    while let Some(inner) = base.strip_suffix("[]") {
        base = inner;
    }
    crate::scan::is_identifier(base)
}
