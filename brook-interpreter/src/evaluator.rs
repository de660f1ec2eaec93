//! Statement evaluator for parsed Brook scripts
//!
//! Executes statement lists against the interpreter context. A `return`
//! anywhere inside nested `if`/`while`/`try` bodies surfaces as
//! [`Flow::Return`] and stops every enclosing block up to the call that owns
//! it; exceptions and `exit` travel as [`Unwind`] errors.

use crate::context::InterpreterContext;
use crate::conversion;
use crate::error::{Flow, Result, RuntimeError, Unwind};
use crate::function_dispatch;
use crate::library;
use brook_parser::path::{self, Walk};
use brook_parser::types;
use brook_parser::{Binding, CatchClause, Statement, Value};
use std::rc::Rc;

/// Run `statements`, closing any bare scopes they leave open.
pub fn execute_block(ctx: &mut InterpreterContext, statements: &[Statement]) -> Result<Flow> {
    let base = ctx.scope_depth();
    let result = execute_statements(ctx, statements);
    ctx.close_scopes_to(base);
    result
}

fn execute_statements(ctx: &mut InterpreterContext, statements: &[Statement]) -> Result<Flow> {
    for statement in statements {
        if let Flow::Return(value) = execute_statement(ctx, statement)? {
            return Ok(Flow::Return(value));
        }
    }
    Ok(Flow::Normal)
}

/// Run `statements` in a child scope seeded with `bindings`. The seeded names
/// shadow the parent's and are never merged back.
pub fn execute_in_child_scope(
    ctx: &mut InterpreterContext,
    statements: &[Statement],
    bindings: Vec<(String, Binding)>,
) -> Result<Flow> {
    ctx.push_scope();
    let mut shadowed = Vec::with_capacity(bindings.len());
    for (name, binding) in bindings {
        ctx.scope_mut().variables.insert(name.clone(), binding);
        shadowed.push(name);
    }
    let result = execute_block(ctx, statements);
    ctx.pop_scope(&shadowed);
    result
}

pub fn execute_statement(ctx: &mut InterpreterContext, statement: &Statement) -> Result<Flow> {
    match statement {
        Statement::FunctionCall { call } => {
            function_dispatch::call(ctx, call)?;
        }

        Statement::VariableInit {
            name,
            declared_type,
            value,
        } => {
            if ctx.scope().variable(name).is_some() {
                return Err(RuntimeError::AlreadyDefined { name: name.clone() }.into());
            }
            let value = conversion::resolve_checked(ctx, value, declared_type, || {
                format!("declaration of '{name}'")
            })?;
            tracing::trace!(variable = %name, value = ?value, "declared variable");
            ctx.scope_mut()
                .declare(name.clone(), Binding::new(declared_type.clone(), value));
        }

        Statement::VariableSet { path: target, value } => {
            let declared_type = path::variable(ctx.scope(), target, Walk::Live)?.declared_type;
            let value = conversion::resolve_checked(ctx, value, &declared_type, || {
                format!("assignment to '{}'", target.join("."))
            })?;
            tracing::trace!(variable = %target.join("."), value = ?value, "assigned variable");
            path::assign(ctx.scope_mut(), target, value)?;
        }

        Statement::MethodDefinition { method } => {
            ctx.scope_mut().define_function(Rc::clone(method));
        }

        Statement::Return { value } => return execute_return(ctx, value),

        Statement::If {
            condition,
            body,
            else_body,
        } => {
            if evaluate_condition(ctx, condition)? {
                return execute_in_child_scope(ctx, body, Vec::new());
            }
            if let Some(else_body) = else_body {
                return execute_in_child_scope(ctx, else_body, Vec::new());
            }
        }

        Statement::While { condition, body } => {
            while evaluate_condition(ctx, condition)? {
                if let Flow::Return(value) = execute_in_child_scope(ctx, body, Vec::new())? {
                    return Ok(Flow::Return(value));
                }
            }
        }

        Statement::Throw { value } => {
            let payload = conversion::resolve(ctx, value)?;
            tracing::debug!(payload = ?payload, "script exception thrown");
            return Err(Unwind::throw(payload));
        }

        Statement::TryCatch { body, catch } => return execute_try(ctx, body, catch.as_ref()),

        Statement::EnterScope => ctx.push_scope(),

        Statement::ExitScope => ctx.pop_scope(&[]),

        Statement::LoadLib { name, exports } => library::load(ctx, name, exports.as_ref())?,
    }
    Ok(Flow::Normal)
}

fn execute_return(ctx: &mut InterpreterContext, value: &Value) -> Result<Flow> {
    let Some(frame) = ctx.current_call_frame().cloned() else {
        return conversion::resolve(ctx, value).map(Flow::Return);
    };

    let resolved = conversion::resolve_toward(ctx, value, &frame.return_type)?;
    let resolved = if frame.strict_return {
        conversion::expect_type(resolved, &frame.return_type, || {
            format!("return from {}", frame.function_name)
        })?
    } else {
        resolved
    };
    Ok(Flow::Return(resolved))
}

fn execute_try(
    ctx: &mut InterpreterContext,
    body: &[Statement],
    catch: Option<&CatchClause>,
) -> Result<Flow> {
    match execute_in_child_scope(ctx, body, Vec::new()) {
        Err(Unwind::Exception(exception)) => {
            let Some(clause) = catch else {
                return Err(Unwind::Exception(exception));
            };
            tracing::debug!(name = %clause.name, "caught script exception");
            let payload = exception.payload;
            let binding = Binding::new(payload.object_type().into_owned(), payload);
            execute_in_child_scope(ctx, &clause.body, vec![(clause.name.clone(), binding)])
        }
        other => other,
    }
}

/// Resolve a condition toward `bool` and read it.
pub fn evaluate_condition(ctx: &mut InterpreterContext, condition: &Value) -> Result<bool> {
    let value = conversion::resolve_toward(ctx, condition, types::BOOL)?;
    value
        .as_constant()
        .and_then(|constant| constant.as_bool())
        .ok_or_else(|| {
            RuntimeError::type_error(types::BOOL, &value.object_type(), "condition").into()
        })
}
