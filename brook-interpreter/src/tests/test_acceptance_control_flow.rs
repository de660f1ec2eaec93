//! Acceptance tests for conditionals, loops, returns, exceptions and exit

use crate::{Outcome, ScriptSession};
use brook_parser::Value;

#[test]
fn test_while_runs_until_condition_fails() {
    let mut session = ScriptSession::new();
    session
        .assert_output(
            r#"
int i = 0
while (i < 3)
{
    println("tick")
    i = i + 1
}
println(str(i))
"#,
            "tick\ntick\ntick\n3\n",
        )
        .unwrap();
}

#[test]
fn test_while_with_false_condition_never_runs() {
    let mut session = ScriptSession::new();
    session
        .assert_output("while (false)\n{\nprintln(\"never\")\n}\nprintln(\"done\")", "done\n")
        .unwrap();
}

#[test]
fn test_if_else_chain() {
    let mut session = ScriptSession::new();
    let source = r#"
int a = 2
if (a == 1) {
    println("one")
} else if (a == 2) {
    println("two")
} else {
    println("many")
}
if (a != 2) {
    println("unreachable")
}
"#;
    session.assert_output(source, "two\n").unwrap();
}

#[test]
fn test_return_from_nested_blocks() {
    let mut session = ScriptSession::new();
    session
        .assert_output(
            r#"
int first_over(int limit)
{
    int i = 0
    while (true)
    {
        if (i > limit)
        {
            return i
        }
        i = i + 1
    }
    return 0
}
println(str(first_over(4)))
"#,
            "5\n",
        )
        .unwrap();
}

#[test]
fn test_recursion() {
    let mut session = ScriptSession::new();
    session
        .assert_output(
            r#"
int fact(int n)
{
    if (n <= 1)
    {
        return 1
    }
    return n * fact(n - 1)
}
println(str(fact(5)))
"#,
            "120\n",
        )
        .unwrap();
}

#[test]
fn test_try_catch_handles_throw() {
    let mut session = ScriptSession::new();
    let outcome = session
        .run("try {\n    throw \"boom\"\n} catch (e) {\n    println(e)\n}\nprintln(\"after\")")
        .unwrap();

    assert_eq!(outcome, Outcome::Completed(0));
    assert_eq!(session.stdout(), "boom\nafter\n");
}

#[test]
fn test_runtime_errors_are_catchable() {
    let mut session = ScriptSession::new();
    session
        .assert_output(
            "try {\nint z = 1 / 0\n} catch (e) {\nprintln(e)\n}",
            "Division by zero\n",
        )
        .unwrap();
}

#[test]
fn test_exception_crosses_function_boundaries() {
    let mut session = ScriptSession::new();
    session
        .assert_output(
            r#"
void fail(string why)
{
    throw "failed: " + why
}
try {
    fail("disk")
    println("not printed")
} catch (e) {
    println(e)
}
"#,
            "failed: disk\n",
        )
        .unwrap();
}

#[test]
fn test_uncaught_throw_exits_with_one() {
    let mut session = ScriptSession::new();
    let outcome = session.run("println(\"before\")\nthrow \"x\"\nprintln(\"after\")").unwrap();

    assert_eq!(outcome, Outcome::Uncaught(Value::string("x")));
    assert_eq!(outcome.exit_code(), 1);
    assert_eq!(session.stdout(), "before\n");
    assert_eq!(session.stderr(), "An unhandled exception occurred: \"x\"\n");
}

#[test]
fn test_exit_is_not_caught() {
    let mut session = ScriptSession::new();
    let outcome = session
        .run("try {\n    exit(3)\n} catch (e) {\n    println(\"caught\")\n}\nprintln(\"after\")")
        .unwrap();

    assert_eq!(outcome, Outcome::Exited(3));
    assert_eq!(session.stdout(), "");
}

#[test]
fn test_exit_from_inside_a_function() {
    let mut session = ScriptSession::new();
    session
        .assert_exit_code("void quit()\n{\nexit(4)\n}\nquit()\nprintln(\"after\")", 4)
        .unwrap();
    assert_eq!(session.stdout(), "");
}

#[test]
fn test_top_level_return_sets_exit_code() {
    let mut session = ScriptSession::new();
    session.assert_exit_code("return 42", 42).unwrap();
    session
        .assert_exit_code("int code()\n{\nreturn 5\n}\nreturn code()", 5)
        .unwrap();
    session.assert_exit_code("println(\"ok\")", 0).unwrap();
}

#[test]
fn test_out_of_range_exit_codes_saturate() {
    let mut session = ScriptSession::new();
    assert_eq!(
        session.run("exit(4294967297)").unwrap(),
        Outcome::Exited(i32::MAX)
    );
    assert_eq!(
        session.run("return -4294967297").unwrap(),
        Outcome::Completed(i32::MIN)
    );
}

#[test]
fn test_subtraction_groups_to_the_right() {
    let mut session = ScriptSession::new();
    session
        .assert_output("int r = 10 - 3 - 2\nprintln(str(r))", "9\n")
        .unwrap();
}

#[test]
fn test_leading_not_applies_to_the_whole_condition() {
    let mut session = ScriptSession::new();
    let source = r#"
bool a = false
bool b = false
if (!a && b) {
    println("left only")
} else {
    println("whole")
}
int n = 1
if (!n == 2) {
    println("not two")
}
"#;
    session.assert_output(source, "whole\nnot two\n").unwrap();
}
