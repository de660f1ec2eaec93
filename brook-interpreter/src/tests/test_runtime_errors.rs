//! Runtime failures surface as script exceptions with readable messages

use crate::config::InterpreterConfig;
use crate::{Outcome, ScriptSession};
use brook_parser::Value;

fn uncaught_message(session: &mut ScriptSession, source: &str) -> String {
    match session.run(source).unwrap() {
        Outcome::Uncaught(Value::Constant(constant)) => constant.text,
        other => panic!("Expected uncaught exception, got: {:?}", other),
    }
}

#[test]
fn test_runaway_recursion_is_a_stack_overflow() {
    let config = InterpreterConfig::default().with_max_call_depth(Some(20));
    let mut session = ScriptSession::with_config(config);
    let message = uncaught_message(
        &mut session,
        "int down(int n)\n{\nreturn down(n + 1)\n}\nint r = down(0)",
    );
    assert_eq!(message, "Function call stack overflow (max depth: 20)");
}

const DESCEND: &str = r#"
int down(int n, int limit)
{
    if (n == limit)
    {
        return n
    }
    return down(n + 1, limit)
}
"#;

#[test]
fn test_default_depth_overflows_as_an_exception() {
    let mut session = ScriptSession::new();
    let source = format!("{DESCEND}\nint r = down(0, 100000)");
    let message = uncaught_message(&mut session, &source);
    assert_eq!(message, "Function call stack overflow (max depth: 256)");
}

#[test]
fn test_deep_recursion_within_a_raised_limit() {
    let config = InterpreterConfig::default().with_max_call_depth(Some(3000));
    let mut session = ScriptSession::with_config(config);
    let source = format!("{DESCEND}\nprintln(str(down(0, 2500)))");
    session.assert_output(&source, "2500\n").unwrap();
}

#[test]
fn test_stack_overflow_is_catchable() {
    let config = InterpreterConfig::default().with_max_call_depth(Some(10));
    let mut session = ScriptSession::with_config(config);
    session
        .assert_output(
            r#"
int depth = 0
void dive()
{
    depth = depth + 1
    dive()
}
try {
    dive()
} catch (e) {
    println(e)
}
println(str(depth))
"#,
            "Function call stack overflow (max depth: 10)\n9\n",
        )
        .unwrap();
}

#[test]
fn test_return_type_is_enforced() {
    let mut session = ScriptSession::new();
    let message = uncaught_message(&mut session, "int f()\n{\nreturn \"x\"\n}\nint v = f()");
    assert_eq!(message, "Type error: expected int, found string (return from f)");
}

#[test]
fn test_argument_type_is_enforced() {
    let mut session = ScriptSession::new();
    let message = uncaught_message(
        &mut session,
        "float half(float x)\n{\nreturn x / 2.0\n}\nfloat h = half(\"a\")",
    );
    assert_eq!(
        message,
        "Type error: expected float, found string (argument 'x' of half)"
    );
}

#[test]
fn test_unknown_runtime_variable() {
    let mut session = ScriptSession::new();
    let message = uncaught_message(&mut session, "any v = get_var(\"nope\")");
    assert_eq!(message, "Undefined variable: nope");
}

#[test]
fn test_thrown_values_keep_their_type() {
    let mut session = ScriptSession::new();
    session
        .assert_output(
            "try {\nthrow 42\n} catch (e) {\nprintln(type_of(e))\n}",
            "int\n",
        )
        .unwrap();
}

#[test]
fn test_parse_errors_do_not_run() {
    let mut session = ScriptSession::new();
    let result = session.run("println(\"never\")\nint bad = 1 + \"a\"");
    assert!(result.is_err());
    assert_eq!(session.stdout(), "");
}
