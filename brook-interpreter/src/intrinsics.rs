//! Intrinsics implementation for the Brook interpreter
//!
//! The parser desugars every operator into a call to one of these functions:
//! `+ - * /` become `add`/`subtract`/`multiply`/`divide` (or `concat` for
//! strings), comparisons become `equals`/`less_than`/..., and `!`, `&&`, `||`
//! become `not`/`and`/`or`. Operands arrive fully resolved.

use crate::builtins::{text, BuiltinRegistry};
use crate::context::InterpreterContext;
use crate::error::{Result, RuntimeError};
use brook_parser::types;
use brook_parser::Value;
use std::cmp::Ordering;

/// Register all intrinsic functions with the registry
pub fn register_intrinsics(registry: &mut BuiltinRegistry) {
    let binary = [("n1", types::ANY), ("n2", types::ANY)];

    // Arithmetic
    registry.register("add", &binary, types::ANY, intrinsic_add);
    registry.register("subtract", &binary, types::ANY, intrinsic_subtract);
    registry.register("multiply", &binary, types::ANY, intrinsic_multiply);
    registry.register("divide", &binary, types::ANY, intrinsic_divide);
    registry.register(
        "concat",
        &[("v1", types::STRING), ("v2", types::STRING)],
        types::STRING,
        intrinsic_concat,
    );

    // Comparison
    registry.register("equals", &binary, types::BOOL, intrinsic_equals);
    registry.register("not_equals", &binary, types::BOOL, intrinsic_not_equals);
    registry.register("less_than", &binary, types::BOOL, intrinsic_less_than);
    registry.register(
        "less_than_or_equals",
        &binary,
        types::BOOL,
        intrinsic_less_than_or_equals,
    );
    registry.register("more_than", &binary, types::BOOL, intrinsic_more_than);
    registry.register(
        "more_than_or_equals",
        &binary,
        types::BOOL,
        intrinsic_more_than_or_equals,
    );

    // Boolean logic
    registry.register("not", &[("condition", types::BOOL)], types::BOOL, intrinsic_not);
    registry.register(
        "and",
        &[("a", types::BOOL), ("b", types::BOOL)],
        types::BOOL,
        intrinsic_and,
    );
    registry.register(
        "or",
        &[("a", types::BOOL), ("b", types::BOOL)],
        types::BOOL,
        intrinsic_or,
    );
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn of(value: &Value) -> Option<Self> {
        let constant = value.as_constant()?;
        match constant.object_type.as_str() {
            types::INT => constant.as_int().map(Number::Int),
            types::FLOAT => constant.as_float().map(Number::Float),
            _ => None,
        }
    }

    fn as_float(self) -> f64 {
        match self {
            Number::Int(int) => int as f64,
            Number::Float(float) => float,
        }
    }
}

fn operands(operation: &str, args: &[Value]) -> Result<(Number, Number)> {
    match (Number::of(&args[0]), Number::of(&args[1])) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(RuntimeError::invalid_operation(
            operation,
            args.iter().map(|a| a.object_type().into_owned()).collect(),
        )
        .into()),
    }
}

/// Integer arithmetic when both sides are `int`, float arithmetic otherwise.
fn arithmetic(
    operation: &str,
    args: &[Value],
    integer: fn(i64, i64) -> Option<i64>,
    float: fn(f64, f64) -> f64,
) -> Result<Value> {
    match operands(operation, args)? {
        (Number::Int(a), Number::Int(b)) => integer(a, b).map(Value::int).ok_or_else(|| {
            RuntimeError::custom(format!("integer overflow in {operation}")).into()
        }),
        (a, b) => Ok(Value::float(float(a.as_float(), b.as_float()))),
    }
}

fn intrinsic_add(_ctx: &mut InterpreterContext, args: &[Value]) -> Result<Value> {
    arithmetic("add", args, i64::checked_add, |a, b| a + b)
}

fn intrinsic_subtract(_ctx: &mut InterpreterContext, args: &[Value]) -> Result<Value> {
    arithmetic("subtract", args, i64::checked_sub, |a, b| a - b)
}

fn intrinsic_multiply(_ctx: &mut InterpreterContext, args: &[Value]) -> Result<Value> {
    arithmetic("multiply", args, i64::checked_mul, |a, b| a * b)
}

fn intrinsic_divide(_ctx: &mut InterpreterContext, args: &[Value]) -> Result<Value> {
    let (_, divisor) = operands("divide", args)?;
    if divisor.as_float() == 0.0 {
        return Err(RuntimeError::DivisionByZero.into());
    }
    arithmetic("divide", args, i64::checked_div, |a, b| a / b)
}

fn intrinsic_concat(_ctx: &mut InterpreterContext, args: &[Value]) -> Result<Value> {
    Ok(Value::string(format!("{}{}", text(&args[0])?, text(&args[1])?)))
}

fn equal(a: &Value, b: &Value) -> bool {
    match (Number::of(a), Number::of(b)) {
        (Some(x), Some(y)) => x.as_float() == y.as_float(),
        _ => a == b,
    }
}

/// Numeric when both texts parse as numbers, lexical otherwise.
fn compare(operation: &str, args: &[Value]) -> Result<Ordering> {
    let (Some(a), Some(b)) = (args[0].as_constant(), args[1].as_constant()) else {
        return Err(RuntimeError::invalid_operation(
            operation,
            args.iter().map(|a| a.object_type().into_owned()).collect(),
        )
        .into());
    };
    let ordering = match (a.as_float(), b.as_float()) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => a.text.cmp(&b.text),
    };
    Ok(ordering)
}

fn intrinsic_equals(_ctx: &mut InterpreterContext, args: &[Value]) -> Result<Value> {
    Ok(Value::boolean(equal(&args[0], &args[1])))
}

fn intrinsic_not_equals(_ctx: &mut InterpreterContext, args: &[Value]) -> Result<Value> {
    Ok(Value::boolean(!equal(&args[0], &args[1])))
}

fn intrinsic_less_than(_ctx: &mut InterpreterContext, args: &[Value]) -> Result<Value> {
    Ok(Value::boolean(compare("less_than", args)?.is_lt()))
}

fn intrinsic_less_than_or_equals(_ctx: &mut InterpreterContext, args: &[Value]) -> Result<Value> {
    Ok(Value::boolean(compare("less_than_or_equals", args)?.is_le()))
}

fn intrinsic_more_than(_ctx: &mut InterpreterContext, args: &[Value]) -> Result<Value> {
    Ok(Value::boolean(compare("more_than", args)?.is_gt()))
}

fn intrinsic_more_than_or_equals(_ctx: &mut InterpreterContext, args: &[Value]) -> Result<Value> {
    Ok(Value::boolean(compare("more_than_or_equals", args)?.is_ge()))
}

fn flag(value: &Value) -> Result<bool> {
    value
        .as_constant()
        .and_then(|constant| constant.as_bool())
        .ok_or_else(|| RuntimeError::type_error(types::BOOL, &value.object_type(), "boolean operand").into())
}

fn intrinsic_not(_ctx: &mut InterpreterContext, args: &[Value]) -> Result<Value> {
    Ok(Value::boolean(!flag(&args[0])?))
}

fn intrinsic_and(_ctx: &mut InterpreterContext, args: &[Value]) -> Result<Value> {
    Ok(Value::boolean(flag(&args[0])? && flag(&args[1])?))
}

fn intrinsic_or(_ctx: &mut InterpreterContext, args: &[Value]) -> Result<Value> {
    Ok(Value::boolean(flag(&args[0])? || flag(&args[1])?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Unwind;
    use crate::test_harness::null_context;

    #[test]
    fn test_integer_arithmetic_stays_integral() {
        let mut ctx = null_context();
        let result = intrinsic_divide(&mut ctx, &[Value::int(7), Value::int(2)]).unwrap();
        assert_eq!(result, Value::int(3));

        let result = intrinsic_add(&mut ctx, &[Value::float(1.5), Value::float(1.0)]).unwrap();
        assert_eq!(result, Value::float(2.5));
    }

    #[test]
    fn test_division_by_zero() {
        let mut ctx = null_context();
        let error = intrinsic_divide(&mut ctx, &[Value::float(1.0), Value::float(0.0)]).unwrap_err();
        match error {
            Unwind::Exception(exception) => {
                assert_eq!(exception.payload, Value::string("Division by zero"))
            }
            other => panic!("Expected exception, got: {:?}", other),
        }
    }

    #[test]
    fn test_comparison_numeric_then_lexical() {
        let mut ctx = null_context();
        let numeric = intrinsic_less_than(&mut ctx, &[Value::int(9), Value::int(10)]).unwrap();
        assert_eq!(numeric, Value::boolean(true));

        let lexical =
            intrinsic_less_than(&mut ctx, &[Value::string("b"), Value::string("a")]).unwrap();
        assert_eq!(lexical, Value::boolean(false));
    }

    #[test]
    fn test_equality_is_numeric_across_number_types() {
        assert!(equal(&Value::int(3), &Value::float(3.0)));
        assert!(!equal(&Value::string("3"), &Value::int(3)));
    }

    #[test]
    fn test_non_numeric_arithmetic_is_rejected() {
        let mut ctx = null_context();
        assert!(intrinsic_add(&mut ctx, &[Value::string("a"), Value::int(1)]).is_err());
    }
}
