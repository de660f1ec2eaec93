// Serialized AST tests
// A parsed script survives a JSON round trip unchanged

use crate::*;
use super::common::parse;
use pretty_assertions::assert_eq;

const PROGRAM: &str = r#"
class Point
{
    int x = 0
    int y = 0
    move(int dx)
    {
        x = x + dx
    }
}
int twice(int v)
{
    return v * 2
}
Point p = new Point
p.move(3)
int[] xs = [1, 2, 3]
try {
    if (xs[0] == 1) {
        throw "first"
    } else {
        println(str(twice(p.x)))
    }
} catch (e) {
    println(e)
}
{
    float f = 1.5
}
"#;

#[test]
fn test_round_trip_preserves_script() {
    let script = parse(PROGRAM).unwrap();
    let json = script.to_json().unwrap();
    let restored = Script::from_json(&json).unwrap();

    assert_eq!(restored, script);
}

#[test]
fn test_json_is_tagged() {
    let script = parse("int a = 1").unwrap();
    let json: serde_json::Value = serde_json::from_str(&script.to_json().unwrap()).unwrap();

    assert_eq!(json["statements"][0]["statement"], "variable_init");
    assert_eq!(json["statements"][0]["value"]["kind"], "constant");
    assert_eq!(json["statements"][0]["value"]["text"], "1");
}

#[test]
fn test_malformed_json_is_an_error() {
    assert!(Script::from_json("{\"statements\": 3}").is_err());
}
