//! Tests for `use`: the standard math library, host libraries with entry
//! actions, and script libraries loaded from disk

use crate::builtins::text;
use crate::config::InterpreterConfig;
use crate::context::InterpreterContext;
use crate::error::{Result, RuntimeError};
use crate::{Library, NativeFn, ScriptSession};
use brook_parser::{MethodDefinition, Scope, Value};
use std::fs;
use std::io::Write;
use std::rc::Rc;

struct Greetings;

fn greet(_ctx: &mut InterpreterContext, args: &[Value]) -> Result<Value> {
    Ok(Value::string(format!("hello {}", text(&args[0])?)))
}

impl Library for Greetings {
    fn name(&self) -> &str {
        "greetings"
    }

    fn exports(&self) -> Scope {
        let mut scope = Scope::new();
        scope.define_function(Rc::new(MethodDefinition::native(
            "greet",
            &[("who", "string")],
            "string",
            "greetings.greet",
        )));
        scope
    }

    fn natives(&self) -> Vec<(&'static str, NativeFn)> {
        vec![("greetings.greet", greet)]
    }

    fn run(&self, ctx: &mut InterpreterContext) -> Result<()> {
        writeln!(ctx.io.stdout, "greetings loaded").map_err(RuntimeError::io)?;
        Ok(())
    }
}

#[test]
fn test_math_library() {
    let mut session = ScriptSession::new();
    session
        .assert_output(
            r#"
use "math"
println(str(sqrt(16.0)))
println(str(floor(PI)))
println(str(max(2.0, 3.5)))
println(str(pow(2.0, 10.0)))
"#,
            "4\n3\n3.5\n1024\n",
        )
        .unwrap();
}

#[test]
fn test_math_errors_are_exceptions() {
    let mut session = ScriptSession::new();
    session
        .assert_output(
            "use \"math\"\ntry {\nfloat r = sqrt(-1.0)\n} catch (e) {\nprintln(\"rejected\")\n}",
            "rejected\n",
        )
        .unwrap();
}

#[test]
fn test_library_symbols_need_use() {
    let session = ScriptSession::new();
    assert!(session.interpreter().parse("float r = sqrt(4.0)").is_err());
}

#[test]
fn test_host_library_with_entry_action() {
    let mut session = ScriptSession::new().with_library(Greetings);
    session
        .assert_output(
            "use \"greetings\"\nprintln(greet(\"brook\"))",
            "greetings loaded\nhello brook\n",
        )
        .unwrap();
}

#[test]
fn test_script_library_from_base_dir() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("shapes.brook"),
        r#"
class Square
{
    float side = 2.0
}
float area(Square s)
{
    return s.side * s.side
}
"#,
    )
    .unwrap();

    let config = InterpreterConfig::default().with_base_dir(dir.path());
    let mut session = ScriptSession::with_config(config);
    session
        .assert_output(
            "use \"shapes.brook\"\nSquare sq = new Square\nsq.side = 3.0\nprintln(str(area(sq)))",
            "9\n",
        )
        .unwrap();
}

#[test]
fn test_load_lib_at_run_time() {
    let mut session = ScriptSession::new().with_library(Greetings);
    session
        .assert_output(
            "load_lib(\"greetings\")\nload_lib(\"math\")\nprintln(str(get_var(\"PI\")))",
            "greetings loaded\n3.141592653589793\n",
        )
        .unwrap();
}

#[test]
fn test_load_lib_failures_are_catchable() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("empty.brook"), "void nothing()\n{\n}\n").unwrap();

    let config = InterpreterConfig::default().with_base_dir(dir.path());
    let mut session = ScriptSession::with_config(config);
    session
        .assert_output(
            r#"
load_lib("empty.brook")
try {
    load_lib("missing.brook")
} catch (e) {
    println("no script")
}
try {
    load_lib("nope")
} catch (e) {
    println(e)
}
"#,
            "no script\nUnknown library: nope\n",
        )
        .unwrap();
}
