//! Function dispatch for routing calls to builtins, script functions and
//! instance methods
//!
//! A single-segment name that matches a builtin runs the native callback
//! directly, without a scope of its own. Everything else is looked up through
//! the dot-notation resolver and invoked in a fresh child scope. Method calls
//! see their instance's properties and sibling methods unqualified; changed
//! properties are written back to the instance, and the instance back to the
//! path it was reached through.

use crate::builtins::Builtin;
use crate::context::{CallFrame, InterpreterContext};
use crate::conversion;
use crate::error::{Flow, Result, RuntimeError};
use crate::evaluator;
use brook_parser::path::{self, Walk};
use brook_parser::{Binding, ClassInstance, MethodBody, MethodCall, MethodDefinition, Parameter, Value};
use std::borrow::Cow;
use std::rc::Rc;

/// Grow the host stack when less than this remains before entering a body.
const RED_ZONE: usize = 256 * 1024;

/// Size of each newly allocated stack segment.
const STACK_GROWTH: usize = 2 * 1024 * 1024;

/// Evaluate a call and return its resolved result.
pub fn call(ctx: &mut InterpreterContext, call: &MethodCall) -> Result<Value> {
    if let [name] = call.path.as_slice() {
        if let Some(builtin) = ctx.builtins().get(name).cloned() {
            return call_builtin(ctx, &builtin, &call.arguments);
        }
    }

    let (method, owner) = {
        let (method, owner) = path::method(ctx.scope(), &call.path, Walk::Live)?;
        (method, owner.map(Cow::into_owned))
    };
    tracing::debug!(
        function = %call.path.join("."),
        depth = ctx.call_stack_depth(),
        "dispatching call"
    );

    let (result, owner) = invoke(ctx, &method, owner, &call.arguments)?;
    if let Some(instance) = owner {
        let instance_path = &call.path[..call.path.len() - 1];
        path::assign(ctx.scope_mut(), instance_path, Value::Instance(instance))?;
    }
    Ok(result)
}

fn call_builtin(ctx: &mut InterpreterContext, builtin: &Builtin, arguments: &[Value]) -> Result<Value> {
    let definition = &builtin.definition;
    tracing::trace!(builtin = %definition.name, "calling builtin");
    let values = bind_arguments(ctx, definition, arguments)?;
    (builtin.callback)(ctx, &values)
}

/// Resolve each argument in the caller's scope toward its parameter type.
fn bind_arguments(
    ctx: &mut InterpreterContext,
    method: &MethodDefinition,
    arguments: &[Value],
) -> Result<Vec<Value>> {
    if arguments.len() != method.parameters.len() {
        return Err(RuntimeError::wrong_arity(
            &method.name,
            method.parameters.len(),
            arguments.len(),
        )
        .into());
    }

    method
        .parameters
        .iter()
        .zip(arguments)
        .map(|(Parameter { name, declared_type }, argument)| {
            conversion::resolve_checked(ctx, argument, declared_type, || {
                format!("argument '{}' of {}", name, method.name)
            })
        })
        .collect()
}

/// Run `method` with `arguments`, optionally on behalf of `owner`. Returns the
/// result together with the owner as the call left it.
pub fn invoke(
    ctx: &mut InterpreterContext,
    method: &MethodDefinition,
    owner: Option<ClassInstance>,
    arguments: &[Value],
) -> Result<(Value, Option<ClassInstance>)> {
    let values = bind_arguments(ctx, method, arguments)?;
    ctx.push_call_frame(CallFrame::new(&method.name, &method.return_type))?;
    ctx.push_scope();

    let mut introduced = Vec::new();
    if let Some(instance) = &owner {
        let scope = ctx.scope_mut();
        for (name, property) in &instance.properties {
            scope.variables.insert(
                name.clone(),
                Binding::new(property.declared_type.clone(), property.value.clone()),
            );
            introduced.push(name.clone());
        }
        for (name, sibling) in &instance.methods {
            scope.functions.insert(name.clone(), Rc::clone(sibling));
        }
    }
    let argument_names: Vec<String> = method.parameters.iter().map(|p| p.name.clone()).collect();
    for (parameter, value) in method.parameters.iter().zip(&values) {
        ctx.scope_mut().variables.insert(
            parameter.name.clone(),
            Binding::new(parameter.declared_type.clone(), value.clone()),
        );
    }
    introduced.extend(argument_names.iter().cloned());

    // Script recursion is bounded by the configured call depth, never by the
    // host thread's stack.
    let outcome = stacker::maybe_grow(RED_ZONE, STACK_GROWTH, || run_body(ctx, method, &values));

    let owner = match owner {
        Some(mut instance) if outcome.is_ok() => {
            for (name, property) in instance.properties.iter_mut() {
                if argument_names.contains(name) {
                    continue;
                }
                if let Some(binding) = ctx.scope().variable(name) {
                    if binding.value != property.value {
                        tracing::trace!(property = %name, "writing back changed property");
                        property.value = binding.value.clone();
                    }
                }
            }
            Some(instance)
        }
        owner => owner,
    };

    ctx.pop_scope(&introduced);
    ctx.pop_call_frame();
    outcome.map(|result| (result, owner))
}

fn run_body(ctx: &mut InterpreterContext, method: &MethodDefinition, values: &[Value]) -> Result<Value> {
    match &method.body {
        MethodBody::Native { symbol } => {
            let callback = ctx
                .builtins()
                .native(symbol)
                .ok_or_else(|| RuntimeError::undefined_function(symbol))?;
            callback(ctx, values)
        }
        MethodBody::Statements(statements) => match evaluator::execute_block(ctx, statements)? {
            Flow::Return(value) => Ok(value),
            Flow::Normal => Ok(Value::null()),
        },
    }
}
