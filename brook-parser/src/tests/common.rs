// Shared helpers for parser integration tests

use crate::*;
use std::rc::Rc;

/// A small prelude with the builtins the tests call by name.
pub fn prelude() -> Scope {
    let mut scope = Scope::new();
    for method in [
        MethodDefinition::native("println", &[("value", "string")], "NULL", "println"),
        MethodDefinition::native("str", &[("value", "any")], "string", "str"),
        MethodDefinition::native("get_var", &[("name", "string")], "any", "get_var"),
    ] {
        scope.define_function(Rc::new(method));
    }
    scope
}

pub fn parse(source: &str) -> Result<Script, ParseError> {
    parse_script(source, prelude())
}

/// The initializer of the first variable declaration named `name`.
pub fn init_value<'a>(script: &'a Script, name: &str) -> &'a Value {
    script
        .statements
        .iter()
        .find_map(|statement| match statement {
            Statement::VariableInit {
                name: declared,
                value,
                ..
            } if declared == name => Some(value),
            _ => None,
        })
        .unwrap_or_else(|| panic!("no declaration of {name}"))
}

pub fn call_parts(value: &Value) -> (String, &[Value], &str) {
    match value {
        Value::MethodCall(call) => (
            call.path.join("."),
            call.arguments.as_slice(),
            call.object_type.as_str(),
        ),
        other => panic!("Expected method call, got: {:?}", other),
    }
}
