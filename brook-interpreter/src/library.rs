//! Host libraries loaded with `use "name"`.
//!
//! A library exposes a scope fragment (variables, functions, classes), the
//! native callbacks its functions are implemented by, and an optional entry
//! action that runs when the `use` statement executes.

use crate::builtins::{BuiltinRegistry, NativeFn};
use crate::context::InterpreterContext;
use crate::error::{Result, RuntimeError};
use crate::http::HttpLibrary;
use brook_parser::types;
use brook_parser::{Binding, LibraryError, LibraryLoader, MethodDefinition, Scope, Value};
use indexmap::IndexMap;
use std::rc::Rc;

pub trait Library {
    fn name(&self) -> &str;

    /// Names merged into the scope that loads the library.
    fn exports(&self) -> Scope;

    /// Callbacks for the `MethodBody::Native` symbols used by `exports`.
    fn natives(&self) -> Vec<(&'static str, NativeFn)> {
        Vec::new()
    }

    /// Entry action, run after the exports are merged.
    fn run(&self, _ctx: &mut InterpreterContext) -> Result<()> {
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct LibraryRegistry {
    libraries: IndexMap<String, Rc<dyn Library>>,
}

impl LibraryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry holding the standard libraries.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register(Rc::new(MathLibrary));
        registry.register(Rc::new(HttpLibrary));
        registry
    }

    /// Later registrations replace earlier ones with the same name.
    pub fn register(&mut self, library: Rc<dyn Library>) {
        self.libraries.insert(library.name().to_string(), library);
    }

    pub fn get(&self, name: &str) -> Option<Rc<dyn Library>> {
        self.libraries.get(name).cloned()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rc<dyn Library>> {
        self.libraries.values()
    }

    /// Add every registered library's natives to `builtins`.
    pub fn install_natives(&self, builtins: &mut BuiltinRegistry) {
        for library in self.iter() {
            for (symbol, callback) in library.natives() {
                builtins.register_native(symbol, callback);
            }
        }
    }
}

impl std::fmt::Debug for LibraryRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.libraries.keys()).finish()
    }
}

impl LibraryLoader for LibraryRegistry {
    fn load(&self, name: &str) -> std::result::Result<Scope, LibraryError> {
        self.get(name)
            .map(|library| library.exports())
            .ok_or_else(|| LibraryError::NotFound(name.to_string()))
    }
}

/// Execute a `use` statement. Script libraries carry their exports in the
/// statement; anything else comes from the registry.
pub fn load(ctx: &mut InterpreterContext, name: &str, exports: Option<&Scope>) -> Result<()> {
    tracing::debug!(library = %name, "loading library");
    if let Some(exports) = exports {
        ctx.scope_mut().append(exports.clone());
        return Ok(());
    }

    let library = ctx
        .libraries
        .get(name)
        .ok_or_else(|| RuntimeError::UnknownLibrary {
            name: name.to_string(),
        })?;
    ctx.scope_mut().append(library.exports());
    library.run(ctx)
}

/// `use "math"`
#[derive(Debug, Clone, Copy, Default)]
pub struct MathLibrary;

impl Library for MathLibrary {
    fn name(&self) -> &str {
        "math"
    }

    fn exports(&self) -> Scope {
        let mut scope = Scope::new();
        scope.declare("PI", Binding::new(types::FLOAT, Value::float(std::f64::consts::PI)));

        let x = [("x", types::FLOAT)];
        let pair = [("a", types::FLOAT), ("b", types::FLOAT)];
        for (name, parameters, return_type) in [
            ("abs", &x[..], types::FLOAT),
            ("sqrt", &x[..], types::FLOAT),
            ("floor", &x[..], types::INT),
            ("pow", &pair[..], types::FLOAT),
            ("max", &pair[..], types::FLOAT),
            ("min", &pair[..], types::FLOAT),
        ] {
            scope.define_function(Rc::new(MethodDefinition::native(
                name,
                parameters,
                return_type,
                &format!("math.{name}"),
            )));
        }
        scope
    }

    fn natives(&self) -> Vec<(&'static str, NativeFn)> {
        vec![
            ("math.abs", math_abs),
            ("math.sqrt", math_sqrt),
            ("math.floor", math_floor),
            ("math.pow", math_pow),
            ("math.max", math_max),
            ("math.min", math_min),
        ]
    }
}

fn float(value: &Value) -> Result<f64> {
    value
        .as_constant()
        .and_then(|constant| constant.as_float())
        .ok_or_else(|| RuntimeError::type_error(types::FLOAT, &value.object_type(), "math argument").into())
}

fn math_abs(_ctx: &mut InterpreterContext, args: &[Value]) -> Result<Value> {
    Ok(Value::float(float(&args[0])?.abs()))
}

fn math_sqrt(_ctx: &mut InterpreterContext, args: &[Value]) -> Result<Value> {
    let x = float(&args[0])?;
    if x < 0.0 {
        return Err(RuntimeError::invalid_operation("sqrt", vec![format!("negative {x}")]).into());
    }
    Ok(Value::float(x.sqrt()))
}

fn math_floor(_ctx: &mut InterpreterContext, args: &[Value]) -> Result<Value> {
    Ok(Value::int(float(&args[0])?.floor() as i64))
}

fn math_pow(_ctx: &mut InterpreterContext, args: &[Value]) -> Result<Value> {
    Ok(Value::float(float(&args[0])?.powf(float(&args[1])?)))
}

fn math_max(_ctx: &mut InterpreterContext, args: &[Value]) -> Result<Value> {
    Ok(Value::float(float(&args[0])?.max(float(&args[1])?)))
}

fn math_min(_ctx: &mut InterpreterContext, args: &[Value]) -> Result<Value> {
    Ok(Value::float(float(&args[0])?.min(float(&args[1])?)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_math_exports_match_natives() {
        let exports = MathLibrary.exports();
        let natives: Vec<&str> = MathLibrary.natives().into_iter().map(|(s, _)| s).collect();

        for function in exports.functions.values() {
            let brook_parser::MethodBody::Native { symbol } = &function.body else {
                panic!("Expected native body for {}", function.name);
            };
            assert!(natives.contains(&symbol.as_str()), "missing native {symbol}");
        }
        assert!(exports.variable("PI").is_some());
    }

    #[test]
    fn test_registry_is_a_loader() {
        let registry = LibraryRegistry::standard();
        assert!(registry.load("math").unwrap().function("sqrt").is_some());
        assert_eq!(
            registry.load("net").unwrap_err(),
            LibraryError::NotFound("net".to_string())
        );
    }
}
