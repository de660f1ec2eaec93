// Library loading tests
// Registered libraries extend the shadow scope; script libraries are parsed
// from disk and embedded in the LoadLib statement

use crate::*;
use super::common::prelude;
use std::fs;
use std::rc::Rc;

struct Geometry;

impl LibraryLoader for Geometry {
    fn load(&self, name: &str) -> Result<Scope, LibraryError> {
        if name != "geometry" {
            return Err(LibraryError::NotFound(name.to_string()));
        }
        let mut scope = Scope::new();
        scope.define_function(Rc::new(MethodDefinition::native(
            "area",
            &[("w", "float"), ("h", "float")],
            "float",
            "geometry.area",
        )));
        scope.declare("UNIT", Binding::new("float", Value::float(1.0)));
        Ok(scope)
    }
}

#[test]
fn test_registered_library_symbols_resolve() {
    let script = Parser::new(prelude())
        .with_loader(&Geometry)
        .parse("use \"geometry\"\nfloat a = area(UNIT, 2.0)")
        .unwrap();

    assert_eq!(
        script.statements[0],
        Statement::LoadLib {
            name: "geometry".to_string(),
            exports: None,
        }
    );
}

#[test]
fn test_symbols_unknown_before_use() {
    let error = Parser::new(prelude())
        .with_loader(&Geometry)
        .parse("float a = area(1.0, 2.0)\nuse \"geometry\"")
        .unwrap_err();
    assert_eq!(error.kind, ParseErrorKind::UnknownFunction("area".to_string()));
}

#[test]
fn test_library_name_must_be_string() {
    let error = Parser::new(prelude())
        .with_loader(&Geometry)
        .parse("use geometry")
        .unwrap_err();
    assert!(matches!(error.kind, ParseErrorKind::Library { .. }));
}

#[test]
fn test_script_library_exports_classes_and_functions() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("shapes.brook"),
        r#"
class Square
{
    float side = 1.0
}
float double_it(float v)
{
    return v * 2.0
}
float ignored = 3.0
"#,
    )
    .unwrap();

    let script = Parser::new(prelude())
        .with_base_dir(dir.path())
        .parse("use \"shapes.brook\"\nSquare s = new Square\nfloat d = double_it(s.side)")
        .unwrap();

    let Statement::LoadLib {
        exports: Some(exports),
        ..
    } = &script.statements[0]
    else {
        panic!("Expected embedded library exports");
    };
    assert!(exports.class("Square").is_some());
    assert!(exports.function("double_it").is_some());
    assert!(exports.variable("ignored").is_none());
}

#[test]
fn test_script_library_errors_are_reported() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("broken.brook"), "int x = nope").unwrap();

    let error = Parser::new(prelude())
        .with_base_dir(dir.path())
        .parse("use \"broken.brook\"")
        .unwrap_err();
    assert!(matches!(error.kind, ParseErrorKind::Library { ref name, .. } if name == "broken.brook"));
}
