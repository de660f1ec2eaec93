//! Built-in functions for the Brook interpreter.
//!
//! Provides console, file and directory I/O, explicit conversions, JSON
//! encoding, array helpers and run-time library loading. Operator targets
//! live in [`crate::intrinsics`].

use crate::context::InterpreterContext;
use crate::conversion;
use crate::error::{Result, RuntimeError, Unwind};
use crate::intrinsics;
use crate::library;
use brook_parser::library::is_script_library;
use brook_parser::path::{self, Walk};
use brook_parser::scan;
use brook_parser::types;
use brook_parser::{ArrayValue, MethodDefinition, ParseErrorKind, Parser, Scope, Value};
use indexmap::IndexMap;
use std::io::{Read, Write};
use std::path::{Component, Path, PathBuf};
use std::rc::Rc;

/// Signature shared by builtins and library natives. Arguments arrive
/// resolved and checked against the declared parameter types.
pub type NativeFn = fn(&mut InterpreterContext, &[Value]) -> Result<Value>;

#[derive(Debug, Clone)]
pub struct Builtin {
    pub definition: Rc<MethodDefinition>,
    pub callback: NativeFn,
}

/// Builtins by name, in declaration order, plus the native symbol table that
/// `MethodBody::Native` definitions are resolved through.
#[derive(Debug, Clone, Default)]
pub struct BuiltinRegistry {
    functions: IndexMap<String, Builtin>,
    natives: IndexMap<String, NativeFn>,
}

impl BuiltinRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard builtins.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        register_builtins(&mut registry);
        registry
    }

    pub fn register(
        &mut self,
        name: &str,
        parameters: &[(&str, &str)],
        return_type: &str,
        callback: NativeFn,
    ) {
        let definition = Rc::new(MethodDefinition::native(name, parameters, return_type, name));
        self.natives.insert(name.to_string(), callback);
        self.functions.insert(
            name.to_string(),
            Builtin {
                definition,
                callback,
            },
        );
    }

    /// Make `symbol` callable from native method bodies without exposing it
    /// as a builtin name.
    pub fn register_native(&mut self, symbol: &str, callback: NativeFn) {
        self.natives.insert(symbol.to_string(), callback);
    }

    pub fn get(&self, name: &str) -> Option<&Builtin> {
        self.functions.get(name)
    }

    pub fn native(&self, symbol: &str) -> Option<NativeFn> {
        self.natives.get(symbol).copied()
    }

    pub fn definitions(&self) -> impl Iterator<Item = &Rc<MethodDefinition>> {
        self.functions.values().map(|builtin| &builtin.definition)
    }

    /// Scope holding every builtin signature, used to seed the parser.
    pub fn prelude(&self) -> Scope {
        let mut scope = Scope::new();
        for definition in self.definitions() {
            scope.define_function(Rc::clone(definition));
        }
        scope
    }
}

/// Register all built-in functions with the registry
pub fn register_builtins(registry: &mut BuiltinRegistry) {
    // I/O functions
    registry.register("print", &[("s", "string")], types::NULL, builtin_print);
    registry.register("println", &[("s", "string")], types::NULL, builtin_println);
    registry.register("read_key", &[], types::STRING, builtin_read_key);
    registry.register("read_line", &[], types::STRING, builtin_read_line);
    registry.register("exit", &[("code", "int")], types::NULL, builtin_exit);

    // Conversions
    registry.register("str", &[("val", "any")], types::STRING, builtin_string);
    registry.register("string", &[("val", "any")], types::STRING, builtin_string);
    registry.register("to_int", &[("val", "float")], types::INT, builtin_to_int);
    registry.register("to_float", &[("val", "int")], types::FLOAT, builtin_to_float);
    registry.register("type_of", &[("val", "any")], types::STRING, builtin_type_of);

    intrinsics::register_intrinsics(registry);

    // JSON
    registry.register("to_json", &[("val", "any")], types::STRING, builtin_to_json);
    registry.register(
        "from_json",
        &[("json", "string"), ("type", "class")],
        types::ANY,
        builtin_from_json,
    );

    // Arrays and strings
    registry.register(
        "get_array_object",
        &[("arr", "any[]"), ("index", "int")],
        types::ANY,
        builtin_get_array_object,
    );
    registry.register("length", &[("val", "any")], types::INT, builtin_length);
    registry.register(
        "split",
        &[("s", "string"), ("separator", "string")],
        "string[]",
        builtin_split,
    );
    registry.register(
        "assert",
        &[("condition", "bool"), ("message", "string")],
        types::NULL,
        builtin_assert,
    );
    registry.register("get_var", &[("name", "string")], types::ANY, builtin_get_var);
    registry.register("load_lib", &[("lib", "string")], types::NULL, builtin_load_lib);

    // Files
    registry.register(
        "read_file_as_text",
        &[("path", "string")],
        types::STRING,
        builtin_read_file_as_text,
    );
    registry.register(
        "write_text_to_file",
        &[("path", "string"), ("text", "string")],
        types::NULL,
        builtin_write_text_to_file,
    );
    registry.register("file_exists", &[("path", "string")], types::BOOL, builtin_file_exists);
    registry.register("delete_file", &[("path", "string")], types::NULL, builtin_delete_file);

    // Directories
    registry.register("get_files", &[("path", "string")], "string[]", builtin_get_files);
    registry.register(
        "get_directories",
        &[("path", "string")],
        "string[]",
        builtin_get_directories,
    );
    registry.register(
        "create_directory",
        &[("path", "string")],
        types::NULL,
        builtin_create_directory,
    );
    registry.register(
        "delete_directory",
        &[("path", "string")],
        types::NULL,
        builtin_delete_directory,
    );
    registry.register(
        "directory_exists",
        &[("path", "string")],
        types::BOOL,
        builtin_directory_exists,
    );
    registry.register(
        "get_current_directory",
        &[],
        types::STRING,
        builtin_get_current_directory,
    );
    registry.register(
        "set_current_directory",
        &[("path", "string")],
        types::NULL,
        builtin_set_current_directory,
    );
    registry.register(
        "get_full_path",
        &[("path", "string")],
        types::STRING,
        builtin_get_full_path,
    );
}

/// Text of a constant argument.
pub(crate) fn text(value: &Value) -> Result<&str> {
    value
        .as_constant()
        .map(|constant| constant.text.as_str())
        .ok_or_else(|| {
            RuntimeError::type_error("constant", &value.object_type(), "builtin argument").into()
        })
}

pub(crate) fn int(value: &Value) -> Result<i64> {
    value
        .as_constant()
        .and_then(|constant| constant.as_int())
        .ok_or_else(|| RuntimeError::invalid_conversion(&render(value), types::INT).into())
}

/// How a value prints: constants as their text, everything else as JSON.
pub fn render(value: &Value) -> String {
    match value {
        Value::Constant(constant) => constant.text.clone(),
        other => json_of(other).to_string(),
    }
}

/// The data a resolved value carries, as JSON.
pub fn json_of(value: &Value) -> serde_json::Value {
    use serde_json::Value as Json;
    match value {
        Value::Constant(constant) => match constant.object_type.as_str() {
            types::NULL => Json::Null,
            types::BOOL => constant.as_bool().map_or(Json::Null, Json::Bool),
            types::INT => constant
                .as_int()
                .map_or_else(|| Json::String(constant.text.clone()), Json::from),
            types::FLOAT => constant
                .as_float()
                .and_then(serde_json::Number::from_f64)
                .map_or_else(|| Json::String(constant.text.clone()), Json::Number),
            _ => Json::String(constant.text.clone()),
        },
        Value::Array(array) => Json::Array(array.values.iter().map(json_of).collect()),
        Value::Instance(instance) => Json::Object(
            instance
                .properties
                .iter()
                .map(|(name, property)| (name.clone(), json_of(&property.value)))
                .collect(),
        ),
        Value::Variable(_) | Value::MethodCall(_) | Value::DirectMethod(_) | Value::New(_) => {
            Json::Null
        }
    }
}

// I/O Functions

fn write_out(ctx: &mut InterpreterContext, text: &str, newline: bool) -> Result<Value> {
    let stdout = &mut ctx.io.stdout;
    let written = if newline {
        writeln!(stdout, "{text}")
    } else {
        write!(stdout, "{text}").and_then(|_| stdout.flush())
    };
    written.map_err(RuntimeError::io)?;
    Ok(Value::null())
}

fn builtin_print(ctx: &mut InterpreterContext, args: &[Value]) -> Result<Value> {
    let text = text(&args[0])?.to_string();
    write_out(ctx, &text, false)
}

fn builtin_println(ctx: &mut InterpreterContext, args: &[Value]) -> Result<Value> {
    let text = text(&args[0])?.to_string();
    write_out(ctx, &text, true)
}

/// One character from input, or `""` at end of input.
fn builtin_read_key(ctx: &mut InterpreterContext, _args: &[Value]) -> Result<Value> {
    let mut bytes = Vec::with_capacity(4);
    let mut byte = [0u8; 1];
    while bytes.len() < 4 {
        if ctx.io.stdin.read(&mut byte).map_err(RuntimeError::io)? == 0 {
            break;
        }
        bytes.push(byte[0]);
        match std::str::from_utf8(&bytes) {
            Ok(key) => return Ok(Value::string(key)),
            Err(error) if error.error_len().is_some() => break,
            Err(_) => {}
        }
    }
    Ok(Value::string(String::from_utf8_lossy(&bytes)))
}

fn builtin_read_line(ctx: &mut InterpreterContext, _args: &[Value]) -> Result<Value> {
    let mut line = String::new();
    ctx.io
        .stdin
        .read_line(&mut line)
        .map_err(RuntimeError::io)?;
    let trimmed = line.trim_end_matches(&['\n', '\r'][..]);
    Ok(Value::string(trimmed))
}

fn builtin_exit(_ctx: &mut InterpreterContext, args: &[Value]) -> Result<Value> {
    let code = int(&args[0])?;
    tracing::debug!(code, "exit requested");
    Err(Unwind::exit(code))
}

// Conversion Functions

fn builtin_string(_ctx: &mut InterpreterContext, args: &[Value]) -> Result<Value> {
    Ok(Value::string(render(&args[0])))
}

/// Float to int; the value must be integral.
fn builtin_to_int(_ctx: &mut InterpreterContext, args: &[Value]) -> Result<Value> {
    let text = text(&args[0])?;
    let float: f64 = text
        .trim()
        .parse()
        .map_err(|_| RuntimeError::invalid_conversion(text, types::INT))?;
    if float.fract() != 0.0 || !float.is_finite() {
        return Err(RuntimeError::invalid_conversion(text, types::INT).into());
    }
    Ok(Value::int(float as i64))
}

fn builtin_to_float(_ctx: &mut InterpreterContext, args: &[Value]) -> Result<Value> {
    Ok(Value::float(int(&args[0])? as f64))
}

fn builtin_type_of(_ctx: &mut InterpreterContext, args: &[Value]) -> Result<Value> {
    Ok(Value::string(args[0].object_type()))
}

// JSON Functions

fn builtin_to_json(_ctx: &mut InterpreterContext, args: &[Value]) -> Result<Value> {
    Ok(Value::string(json_of(&args[0]).to_string()))
}

fn builtin_from_json(ctx: &mut InterpreterContext, args: &[Value]) -> Result<Value> {
    let source = text(&args[0])?;
    let class_name = text(&args[1])?.to_string();
    let json: serde_json::Value = serde_json::from_str(source)
        .map_err(|e| RuntimeError::custom(format!("invalid JSON: {e}")))?;
    value_from_json(ctx, &json, &class_name)
}

/// Build a value of `declared_type` from JSON data.
fn value_from_json(
    ctx: &mut InterpreterContext,
    json: &serde_json::Value,
    declared_type: &str,
) -> Result<Value> {
    use serde_json::Value as Json;
    let mismatch = || -> Unwind { RuntimeError::invalid_conversion(&json.to_string(), declared_type).into() };

    let value = match (declared_type, json) {
        (types::NULL, Json::Null) => Value::null(),
        (types::INT, Json::Number(n)) => Value::int(n.as_i64().ok_or_else(mismatch)?),
        (types::FLOAT, Json::Number(n)) => Value::float(n.as_f64().ok_or_else(mismatch)?),
        (types::BOOL, Json::Bool(b)) => Value::boolean(*b),
        (types::STRING, Json::String(s)) => Value::string(s.as_str()),
        (types::ANY, Json::Null) => Value::null(),
        (types::ANY, Json::Bool(b)) => Value::boolean(*b),
        (types::ANY, Json::String(s)) => Value::string(s.as_str()),
        (types::ANY, Json::Number(n)) => match n.as_i64() {
            Some(int) => Value::int(int),
            None => Value::float(n.as_f64().ok_or_else(mismatch)?),
        },
        (array_type, Json::Array(items)) if types::is_array(array_type) => {
            let element_type = types::element_type(array_type).unwrap_or(types::ANY);
            let values = items
                .iter()
                .map(|item| value_from_json(ctx, item, element_type))
                .collect::<Result<Vec<_>>>()?;
            Value::Array(ArrayValue {
                element_type: element_type.to_string(),
                values,
            })
        }
        (class_name, Json::Object(fields)) => {
            let class = ctx.scope().class(class_name).cloned().ok_or_else(mismatch)?;
            let mut instance = class.instantiate();
            for (name, property) in instance.properties.iter_mut() {
                if let Some(field) = fields.get(name) {
                    property.value = value_from_json(ctx, field, &property.declared_type)?;
                }
            }
            Value::Instance(conversion::resolve_instance(ctx, &instance)?)
        }
        _ => return Err(mismatch()),
    };
    Ok(value)
}

// Array and String Functions

fn builtin_get_array_object(_ctx: &mut InterpreterContext, args: &[Value]) -> Result<Value> {
    let Value::Array(array) = &args[0] else {
        return Err(RuntimeError::type_error(types::ANY_ARRAY, &args[0].object_type(), "get_array_object").into());
    };
    let index = int(&args[1])?;
    usize::try_from(index)
        .ok()
        .and_then(|i| array.values.get(i))
        .cloned()
        .ok_or_else(|| {
            RuntimeError::IndexOutOfBounds {
                index,
                length: array.values.len(),
            }
            .into()
        })
}

fn builtin_length(_ctx: &mut InterpreterContext, args: &[Value]) -> Result<Value> {
    let length = match &args[0] {
        Value::Array(array) => array.values.len(),
        Value::Constant(constant) if constant.object_type == types::STRING => {
            constant.text.chars().count()
        }
        other => {
            return Err(
                RuntimeError::invalid_operation("length", vec![other.object_type().into_owned()]).into(),
            )
        }
    };
    Ok(Value::int(length as i64))
}

fn builtin_split(_ctx: &mut InterpreterContext, args: &[Value]) -> Result<Value> {
    let source = text(&args[0])?;
    let separator = text(&args[1])?;
    let values = if separator.is_empty() {
        source.chars().map(|c| Value::string(c.to_string())).collect()
    } else {
        source.split(separator).map(Value::string).collect()
    };
    Ok(Value::Array(ArrayValue {
        element_type: types::STRING.to_string(),
        values,
    }))
}

fn builtin_assert(_ctx: &mut InterpreterContext, args: &[Value]) -> Result<Value> {
    let holds = args[0]
        .as_constant()
        .and_then(|constant| constant.as_bool())
        .unwrap_or(false);
    if holds {
        Ok(Value::null())
    } else {
        Err(RuntimeError::AssertionFailed {
            message: text(&args[1])?.to_string(),
        }
        .into())
    }
}

fn builtin_get_var(ctx: &mut InterpreterContext, args: &[Value]) -> Result<Value> {
    let name = text(&args[0])?;
    let segments = scan::path_segments(name);
    let value = path::variable(ctx.scope(), &segments, Walk::Live)?
        .value
        .into_owned();
    Ok(value)
}

// File Functions

fn builtin_read_file_as_text(_ctx: &mut InterpreterContext, args: &[Value]) -> Result<Value> {
    let path = text(&args[0])?;
    let contents = std::fs::read_to_string(path)
        .map_err(|e| RuntimeError::io(format!("{path}: {e}")))?;
    Ok(Value::string(contents))
}

fn builtin_write_text_to_file(_ctx: &mut InterpreterContext, args: &[Value]) -> Result<Value> {
    let path = text(&args[0])?;
    std::fs::write(path, text(&args[1])?).map_err(|e| RuntimeError::io(format!("{path}: {e}")))?;
    Ok(Value::null())
}

fn builtin_file_exists(_ctx: &mut InterpreterContext, args: &[Value]) -> Result<Value> {
    let path = text(&args[0])?;
    Ok(Value::boolean(Path::new(path).is_file()))
}

fn builtin_delete_file(_ctx: &mut InterpreterContext, args: &[Value]) -> Result<Value> {
    let path = text(&args[0])?;
    std::fs::remove_file(path).map_err(|e| RuntimeError::io(format!("{path}: {e}")))?;
    Ok(Value::null())
}

// Directory Functions

fn io_error(path: &str, error: std::io::Error) -> RuntimeError {
    RuntimeError::io(format!("{path}: {error}"))
}

/// Entries of `path` that satisfy `keep`, as paths joined onto `path`, sorted.
fn directory_entries(path: &str, keep: fn(&std::fs::FileType) -> bool) -> Result<Value> {
    let mut entries = Vec::new();
    for entry in std::fs::read_dir(path).map_err(|e| io_error(path, e))? {
        let entry = entry.map_err(|e| io_error(path, e))?;
        let file_type = entry.file_type().map_err(|e| io_error(path, e))?;
        if keep(&file_type) {
            entries.push(Path::new(path).join(entry.file_name()).display().to_string());
        }
    }
    entries.sort();
    Ok(Value::Array(ArrayValue {
        element_type: types::STRING.to_string(),
        values: entries.into_iter().map(Value::string).collect(),
    }))
}

fn builtin_get_files(_ctx: &mut InterpreterContext, args: &[Value]) -> Result<Value> {
    directory_entries(text(&args[0])?, std::fs::FileType::is_file)
}

fn builtin_get_directories(_ctx: &mut InterpreterContext, args: &[Value]) -> Result<Value> {
    directory_entries(text(&args[0])?, std::fs::FileType::is_dir)
}

fn builtin_create_directory(_ctx: &mut InterpreterContext, args: &[Value]) -> Result<Value> {
    let path = text(&args[0])?;
    std::fs::create_dir_all(path).map_err(|e| io_error(path, e))?;
    Ok(Value::null())
}

/// Only empty directories are removed.
fn builtin_delete_directory(_ctx: &mut InterpreterContext, args: &[Value]) -> Result<Value> {
    let path = text(&args[0])?;
    std::fs::remove_dir(path).map_err(|e| io_error(path, e))?;
    Ok(Value::null())
}

fn builtin_directory_exists(_ctx: &mut InterpreterContext, args: &[Value]) -> Result<Value> {
    Ok(Value::boolean(Path::new(text(&args[0])?).is_dir()))
}

fn builtin_get_current_directory(_ctx: &mut InterpreterContext, _args: &[Value]) -> Result<Value> {
    let cwd = std::env::current_dir().map_err(RuntimeError::io)?;
    Ok(Value::string(cwd.display().to_string()))
}

fn builtin_set_current_directory(_ctx: &mut InterpreterContext, args: &[Value]) -> Result<Value> {
    let path = text(&args[0])?;
    tracing::debug!(path, "changing current directory");
    std::env::set_current_dir(path).map_err(|e| io_error(path, e))?;
    Ok(Value::null())
}

/// Absolute form of `path` with `.` and `..` removed. The path need not exist.
fn full_path(path: &str) -> std::io::Result<PathBuf> {
    let mut full = PathBuf::new();
    for component in std::path::absolute(path)?.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                full.pop();
            }
            other => full.push(other),
        }
    }
    Ok(full)
}

fn builtin_get_full_path(_ctx: &mut InterpreterContext, args: &[Value]) -> Result<Value> {
    let path = text(&args[0])?;
    let full = full_path(path).map_err(|e| io_error(path, e))?;
    Ok(Value::string(full.display().to_string()))
}

// Libraries

/// Load a library while the script runs. Its names are not known to the
/// parser, so they are reached through `get_var` or entry actions.
fn builtin_load_lib(ctx: &mut InterpreterContext, args: &[Value]) -> Result<Value> {
    let name = text(&args[0])?.to_string();
    if !is_script_library(&name) {
        library::load(ctx, &name, None)?;
        return Ok(Value::null());
    }

    let exports = Parser::new(ctx.builtins().prelude())
        .with_loader(ctx.libraries.as_ref())
        .with_base_dir(&ctx.base_dir)
        .load_script_library(&name)
        .map_err(|error| RuntimeError::LibraryLoad {
            name: name.clone(),
            message: match error.kind {
                ParseErrorKind::Library { message, .. } => message,
                other => other.to_string(),
            },
        })?;
    library::load(ctx, &name, Some(&exports))?;
    Ok(Value::null())
}
