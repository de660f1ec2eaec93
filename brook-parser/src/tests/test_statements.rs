// Statement parsing tests
// Declarations, assignments, blocks, control flow and diagnostics

use crate::*;
use super::common::{call_parts, parse};
use pretty_assertions::assert_eq;

#[test]
fn test_declaration_and_assignment() {
    let script = parse("int a = 1\na = a + 1").unwrap();

    assert_eq!(
        script.statements[0],
        Statement::VariableInit {
            name: "a".to_string(),
            declared_type: "int".to_string(),
            value: Value::int(1),
        }
    );
    match &script.statements[1] {
        Statement::VariableSet { path, value } => {
            assert_eq!(path, &vec!["a".to_string()]);
            assert_eq!(call_parts(value).0, "add");
        }
        other => panic!("Expected assignment, got: {:?}", other),
    }
}

#[test]
fn test_compound_assignment_desugars() {
    let script = parse("int a = 1; a += 2; a *= 3").unwrap();

    let Statement::VariableSet { value, .. } = &script.statements[1] else {
        panic!("Expected assignment");
    };
    let (name, args, _) = call_parts(value);
    assert_eq!(name, "add");
    assert!(matches!(&args[0], Value::Variable(v) if v.path == vec!["a".to_string()]));

    let Statement::VariableSet { value, .. } = &script.statements[2] else {
        panic!("Expected assignment");
    };
    assert_eq!(call_parts(value).0, "multiply");
}

#[test]
fn test_bare_declaration_uses_default() {
    let script = parse("float f\nstring s\nint[] xs").unwrap();
    let defaults: Vec<&Value> = script
        .statements
        .iter()
        .map(|s| match s {
            Statement::VariableInit { value, .. } => value,
            other => panic!("Expected declaration, got: {:?}", other),
        })
        .collect();

    assert_eq!(defaults[0], &Value::float(0.0));
    assert_eq!(defaults[1], &Value::string(""));
    assert_eq!(defaults[2].object_type(), "int[]");
}

#[test]
fn test_function_definition_and_recursion() {
    let source = r#"
int fact(int n)
{
    if (n <= 1)
    {
        return 1
    }
    return n * fact(n - 1)
}
int x = fact(5)
"#;
    let script = parse(source).unwrap();

    let Statement::MethodDefinition { method } = &script.statements[0] else {
        panic!("Expected function definition");
    };
    assert_eq!(method.name, "fact");
    assert_eq!(method.return_type, "int");
    assert_eq!(method.parameters.len(), 1);
    let MethodBody::Statements(body) = &method.body else {
        panic!("Expected statement body");
    };
    assert_eq!(body.len(), 2);
    assert!(matches!(body[0], Statement::If { .. }));
}

#[test]
fn test_call_statement() {
    let script = parse(r#"println("hi")"#).unwrap();
    let Statement::FunctionCall { call } = &script.statements[0] else {
        panic!("Expected call");
    };
    assert_eq!(call.path, vec!["println".to_string()]);
}

#[test]
fn test_if_else_chain() {
    let source = r#"
int a = 2
if (a == 1) {
    a = 10
} else if (a == 2) {
    a = 20
} else {
    a = 30
}
"#;
    let script = parse(source).unwrap();
    let Statement::If { else_body, .. } = &script.statements[1] else {
        panic!("Expected if");
    };
    let nested = else_body.as_ref().unwrap();
    assert_eq!(nested.len(), 1);
    let Statement::If { else_body, .. } = &nested[0] else {
        panic!("Expected chained if");
    };
    assert!(else_body.is_some());
}

#[test]
fn test_condition_must_be_bool() {
    let error = parse("int a = 1\nwhile (a)\n{\n}").unwrap_err();
    assert_eq!(error.kind, ParseErrorKind::ConditionNotBool("int".to_string()));
    assert_eq!(error.line, 2);
}

#[test]
fn test_try_requires_catch() {
    let error = parse("try {\n println(\"x\")\n}\nint a = 1").unwrap_err();
    assert_eq!(error.kind, ParseErrorKind::MissingCatch);
}

#[test]
fn test_try_catch_binds_name_as_string() {
    let source = r#"
try {
    throw "boom"
} catch (e) {
    println(e)
}
"#;
    let script = parse(source).unwrap();
    let Statement::TryCatch { catch, .. } = &script.statements[0] else {
        panic!("Expected try/catch");
    };
    let catch = catch.as_ref().unwrap();
    assert_eq!(catch.name, "e");
    assert_eq!(catch.body.len(), 1);
}

#[test]
fn test_block_variables_are_scoped() {
    let error = parse("{\n int inner = 1\n}\nint x = inner").unwrap_err();
    assert_eq!(error.kind, ParseErrorKind::UnknownIdentifier("inner".to_string()));
    assert_eq!(error.line, 4);
}

#[test]
fn test_bare_scopes_emit_enter_and_exit() {
    let script = parse("{\nint a = 1\n}").unwrap();
    assert_eq!(script.statements.first(), Some(&Statement::EnterScope));
    assert_eq!(script.statements.last(), Some(&Statement::ExitScope));
}

#[test]
fn test_unbalanced_scope() {
    let error = parse("int a = 1\n}").unwrap_err();
    assert_eq!(error.kind, ParseErrorKind::UnbalancedScope);
}

#[test]
fn test_malformed_block() {
    let error = parse("while (true)\nint a = 1").unwrap_err();
    assert!(matches!(error.kind, ParseErrorKind::MalformedBlock(_)));

    let error = parse("while (true)\n{\nint a = 1").unwrap_err();
    assert!(matches!(error.kind, ParseErrorKind::MalformedBlock(_)));
}

#[test]
fn test_return_without_value_is_null() {
    let script = parse("return").unwrap();
    assert_eq!(
        script.statements[0],
        Statement::Return {
            value: Value::null()
        }
    );
}

#[test]
fn test_unknown_function() {
    let error = parse("missing(1)").unwrap_err();
    assert_eq!(error.kind, ParseErrorKind::UnknownFunction("missing".to_string()));
}

#[test]
fn test_unknown_library() {
    let error = parse(r#"use "nowhere""#).unwrap_err();
    assert!(matches!(error.kind, ParseErrorKind::Library { ref name, .. } if name == "nowhere"));
}

#[test]
fn test_error_reports_source_line() {
    let error = parse("int a = 1\n\n// comment\nint b = a + true").unwrap_err();
    assert_eq!(error.line, 4);
    assert_eq!(error.text, "int b = a + true");
}
