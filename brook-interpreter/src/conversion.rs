//! Value resolution and implicit type conversion.
//!
//! Every consumption point (argument binding, declarations, assignments,
//! returns and conditions) resolves a value toward the type it expects. When
//! the resolved type is not accepted, a conversion function is looked up by
//! naming convention and invoked; if none exists the value comes back
//! unchanged and the caller's own type check reports the mismatch.

use crate::context::InterpreterContext;
use crate::error::{Result, RuntimeError};
use crate::function_dispatch;
use brook_parser::path::{self, Walk};
use brook_parser::types;
use brook_parser::{ArrayValue, ClassInstance, DirectMethod, MethodDefinition, Value};
use std::rc::Rc;

/// Reduce a value to a constant, array or instance in the current scope.
pub fn resolve(ctx: &mut InterpreterContext, value: &Value) -> Result<Value> {
    match value {
        Value::Constant(_) => Ok(value.clone()),
        Value::Variable(variable) => {
            let stored = path::variable(ctx.scope(), &variable.path, Walk::Live)?
                .value
                .into_owned();
            if let Value::Variable(inner) = &stored {
                if inner.path == variable.path {
                    return Err(RuntimeError::custom(format!(
                        "variable '{}' refers to itself",
                        variable.path.join(".")
                    ))
                    .into());
                }
            }
            if stored.is_real() {
                Ok(stored)
            } else {
                resolve(ctx, &stored)
            }
        }
        Value::MethodCall(call) => function_dispatch::call(ctx, call),
        Value::Array(array) => {
            let values = array
                .values
                .iter()
                .map(|element| resolve_toward(ctx, element, &array.element_type))
                .collect::<Result<Vec<_>>>()?;
            Ok(Value::Array(ArrayValue {
                element_type: array.element_type.clone(),
                values,
            }))
        }
        Value::Instance(instance) => resolve_instance(ctx, instance).map(Value::Instance),
        Value::DirectMethod(direct) => function_dispatch::invoke(
            ctx,
            &direct.method,
            direct.owner.clone(),
            &direct.arguments,
        )
        .map(|(result, _)| result),
        Value::New(new) => {
            let class = ctx
                .scope()
                .class(&new.class_name)
                .cloned()
                .ok_or_else(|| RuntimeError::UnknownClass {
                    name: new.class_name.clone(),
                })?;
            resolve_instance(ctx, &class.instantiate()).map(Value::Instance)
        }
    }
}

/// Resolve every property toward its declared type.
pub fn resolve_instance(
    ctx: &mut InterpreterContext,
    instance: &ClassInstance,
) -> Result<ClassInstance> {
    let mut resolved = instance.clone();
    for property in resolved.properties.values_mut() {
        if !matches!(property.value, Value::Constant(_)) {
            property.value = resolve_toward(ctx, &property.value, &property.declared_type)?;
        }
    }
    Ok(resolved)
}

/// Resolve `value`, converting it when its type is not accepted by
/// `expected`. The result is not checked.
pub fn resolve_toward(ctx: &mut InterpreterContext, value: &Value, expected: &str) -> Result<Value> {
    let resolved = resolve(ctx, value)?.retype_empty_array(expected);
    if types::accepts(expected, &resolved.object_type()) {
        return Ok(resolved);
    }
    convert(ctx, resolved, expected)
}

/// Fail unless `value` is accepted by `expected`.
pub fn expect_type(value: Value, expected: &str, context: impl FnOnce() -> String) -> Result<Value> {
    if types::accepts(expected, &value.object_type()) {
        Ok(value)
    } else {
        Err(RuntimeError::type_error(expected, &value.object_type(), context()).into())
    }
}

/// Resolve toward `expected` and check the result.
pub fn resolve_checked(
    ctx: &mut InterpreterContext,
    value: &Value,
    expected: &str,
    context: impl FnOnce() -> String,
) -> Result<Value> {
    let resolved = resolve_toward(ctx, value, expected)?;
    expect_type(resolved, expected, context)
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn conversion_names(from: &str, to: &str) -> [String; 5] {
    let (from_lower, to_lower) = (from.to_lowercase(), to.to_lowercase());
    [
        format!("{from_lower}_to_{to_lower}"),
        format!("to_{to_lower}"),
        format!("{}To{}", capitalize(from), capitalize(to)),
        to_lower,
        capitalize(to),
    ]
}

fn is_conversion(method: &MethodDefinition, names: &[String], from: &str, to: &str) -> bool {
    names.contains(&method.name)
        && method.return_type == to
        && method.parameters.len() == 1
        && (method.parameters[0].declared_type == from
            || method.parameters[0].declared_type == types::ANY)
}

/// Search class methods, then scope functions, then builtins, each in
/// declaration order.
fn find_conversion(
    ctx: &InterpreterContext,
    value: &Value,
    from: &str,
    to: &str,
) -> Option<(Rc<MethodDefinition>, Option<ClassInstance>)> {
    let names = conversion_names(from, to);
    let matches = |method: &&Rc<MethodDefinition>| is_conversion(method, &names, from, to);

    if let Some(class) = ctx.scope().class(from) {
        if let Some(method) = class.methods.iter().find(matches) {
            let owner = match value {
                Value::Instance(instance) => Some(instance.clone()),
                _ => None,
            };
            return Some((Rc::clone(method), owner));
        }
    }
    if let Some(method) = ctx.scope().functions.values().find(matches) {
        return Some((Rc::clone(method), None));
    }
    ctx.builtins()
        .definitions()
        .find(matches)
        .map(|method| (Rc::clone(method), None))
}

/// Convert a resolved value toward `to`, chaining while each step changes the
/// value's type.
pub fn convert(ctx: &mut InterpreterContext, value: Value, to: &str) -> Result<Value> {
    let from = value.object_type().into_owned();
    let Some((method, owner)) = find_conversion(ctx, &value, &from, to) else {
        return Ok(value);
    };
    tracing::debug!(from = %from, to, function = %method.name, "implicit conversion");

    let call = Value::DirectMethod(DirectMethod {
        method,
        arguments: vec![value],
        owner,
    });
    let converted = resolve(ctx, &call)?;
    let converted_type = converted.object_type().into_owned();
    if types::accepts(to, &converted_type) || converted_type == from {
        Ok(converted)
    } else {
        convert(ctx, converted, to)
    }
}
