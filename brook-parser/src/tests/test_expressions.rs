// Expression parsing tests
// Operator scanning order, operand type checks, literals and indexing

use crate::*;
use super::common::{call_parts, init_value, parse};
use pretty_assertions::assert_eq;

#[test]
fn test_arithmetic_splits_at_first_operator() {
    let script = parse("int x = 1 + 2 * 3").unwrap();
    let (name, args, object_type) = call_parts(init_value(&script, "x"));

    assert_eq!(name, "add");
    assert_eq!(object_type, "int");
    assert_eq!(args[0], Value::int(1));
    let (inner, inner_args, _) = call_parts(&args[1]);
    assert_eq!(inner, "multiply");
    assert_eq!(inner_args, &[Value::int(2), Value::int(3)]);
}

#[test]
fn test_subtraction_recurses_to_the_right() {
    let script = parse("int x = 10 - 3 - 2").unwrap();
    let (name, args, _) = call_parts(init_value(&script, "x"));

    assert_eq!(name, "subtract");
    assert_eq!(args[0], Value::int(10));
    let (inner, inner_args, _) = call_parts(&args[1]);
    assert_eq!(inner, "subtract");
    assert_eq!(inner_args, &[Value::int(3), Value::int(2)]);
}

#[test]
fn test_parentheses_group() {
    let script = parse("int x = (1 + 2) * 3").unwrap();
    let (name, args, _) = call_parts(init_value(&script, "x"));

    assert_eq!(name, "multiply");
    assert_eq!(call_parts(&args[0]).0, "add");
    assert_eq!(args[1], Value::int(3));
}

#[test]
fn test_mixed_operand_types_rejected() {
    let error = parse(r#"int x = 1 + "a""#).unwrap_err();
    assert!(matches!(error.kind, ParseErrorKind::TypeMismatch { .. }));
    assert_eq!(error.line, 1);
}

#[test]
fn test_no_numeric_promotion() {
    let error = parse("float x = 1 + 2.5").unwrap_err();
    assert!(matches!(
        error.kind,
        ParseErrorKind::TypeMismatch { ref left, ref right, .. } if left == "int" && right == "float"
    ));
}

#[test]
fn test_string_plus_is_concat() {
    let script = parse(r#"string s = "a" + "b""#).unwrap();
    let (name, _, object_type) = call_parts(init_value(&script, "s"));
    assert_eq!(name, "concat");
    assert_eq!(object_type, "string");
}

#[test]
fn test_relational_operators_desugar() {
    let script = parse("bool a = 1 < 2\nbool b = 1 != 2\nbool c = true && false").unwrap();

    let (name, _, object_type) = call_parts(init_value(&script, "a"));
    assert_eq!(name, "less_than");
    assert_eq!(object_type, "bool");

    let (name, args, _) = call_parts(init_value(&script, "b"));
    assert_eq!(name, "not");
    assert_eq!(call_parts(&args[0]).0, "equals");

    assert_eq!(call_parts(init_value(&script, "c")).0, "and");
}

#[test]
fn test_relational_before_arithmetic() {
    let script = parse("bool a = 1 + 1 == 2").unwrap();
    let (name, args, _) = call_parts(init_value(&script, "a"));

    assert_eq!(name, "equals");
    assert_eq!(call_parts(&args[0]).0, "add");
}

#[test]
fn test_unary_not_and_negation() {
    let script = parse("bool a = !(1 == 2)\nint n = 4\nint m = -n").unwrap();

    let (name, args, _) = call_parts(init_value(&script, "a"));
    assert_eq!(name, "not");
    assert_eq!(call_parts(&args[0]).0, "equals");

    let (name, args, object_type) = call_parts(init_value(&script, "m"));
    assert_eq!(name, "subtract");
    assert_eq!(args[0], Value::int(0));
    assert_eq!(object_type, "int");
}

#[test]
fn test_leading_not_negates_the_whole_expression() {
    let script = parse("bool a = false\nbool b = false\nbool c = !a && b").unwrap();
    let (name, args, object_type) = call_parts(init_value(&script, "c"));
    assert_eq!(name, "not");
    assert_eq!(object_type, "bool");
    assert_eq!(call_parts(&args[0]).0, "and");

    let script = parse("int n = 1\nbool d = !n == 2").unwrap();
    let (name, args, _) = call_parts(init_value(&script, "d"));
    assert_eq!(name, "not");
    assert_eq!(call_parts(&args[0]).0, "equals");
}

#[test]
fn test_not_after_operator_binds_to_its_operand() {
    let script = parse("bool a = true\nbool b = a && !a").unwrap();
    let (name, args, _) = call_parts(init_value(&script, "b"));
    assert_eq!(name, "and");
    assert_eq!(call_parts(&args[1]).0, "not");
}

#[test]
fn test_literals() {
    let script = parse(
        r#"int a = -7
float b = 2.50
bool c = true
string d = "say \"hi\"\n"
"#,
    )
    .unwrap();

    assert_eq!(init_value(&script, "a"), &Value::int(-7));
    assert_eq!(init_value(&script, "b"), &Value::float(2.5));
    assert_eq!(init_value(&script, "c"), &Value::boolean(true));
    assert_eq!(init_value(&script, "d"), &Value::string("say \"hi\"\n"));
}

#[test]
fn test_array_literal_and_index() {
    let script = parse("int[] xs = [1, 2, 3]\nint second = xs[1]").unwrap();

    assert_eq!(init_value(&script, "xs").object_type(), "int[]");
    let (name, args, object_type) = call_parts(init_value(&script, "second"));
    assert_eq!(name, "get_array_object");
    assert_eq!(object_type, "int");
    assert_eq!(args[1], Value::int(1));
}

#[test]
fn test_mixed_array_rejected() {
    let error = parse("int[] xs = [1, 2.5]").unwrap_err();
    assert!(matches!(error.kind, ParseErrorKind::MixedArray { .. }));
}

#[test]
fn test_index_must_be_int() {
    let error = parse(r#"int[] xs = [1]
int y = xs["0"]"#)
    .unwrap_err();
    assert!(matches!(error.kind, ParseErrorKind::InvalidIndex(_)));
    assert_eq!(error.line, 2);
}

#[test]
fn test_empty_array_takes_declared_type() {
    let script = parse("string[] names = []").unwrap();
    assert_eq!(init_value(&script, "names").object_type(), "string[]");
}

#[test]
fn test_unknown_identifier() {
    let error = parse("int x = y + 1").unwrap_err();
    assert_eq!(error.kind, ParseErrorKind::UnknownIdentifier("y".to_string()));
}

#[test]
fn test_call_typed_by_return_type() {
    let script = parse(r#"string s = str(1)"#).unwrap();
    let (name, _, object_type) = call_parts(init_value(&script, "s"));
    assert_eq!(name, "str");
    assert_eq!(object_type, "string");
}

#[test]
fn test_call_arity_checked() {
    let error = parse("string s = str(1, 2)").unwrap_err();
    assert!(matches!(
        error.kind,
        ParseErrorKind::WrongArity { expected: 1, found: 2, .. }
    ));
}

#[test]
fn test_strings_hide_operators() {
    let script = parse(r#"string s = "1 + 2 == 3""#).unwrap();
    assert_eq!(init_value(&script, "s"), &Value::string("1 + 2 == 3"));
}
