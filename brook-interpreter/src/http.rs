//! `use "http"`: blocking HTTP requests from scripts.
//!
//! `http_request(url, method, body, headers)` sends `body` as JSON with the
//! extra headers given as a JSON object string, and answers with an
//! `HttpResponse` instance. Error statuses are responses, not exceptions;
//! only transport failures raise.

use crate::builtins::{text, NativeFn};
use crate::context::InterpreterContext;
use crate::error::{Result, RuntimeError};
use crate::library::Library;
use brook_parser::types;
use brook_parser::{ClassDefinition, FieldDefinition, MethodDefinition, Scope, Value};
use std::rc::Rc;
use ureq::Agent;

pub const RESPONSE_CLASS: &str = "HttpResponse";

fn field(name: &str, declared_type: &str, value: Value) -> FieldDefinition {
    FieldDefinition {
        name: name.to_string(),
        declared_type: declared_type.to_string(),
        value,
    }
}

fn response_class() -> ClassDefinition {
    ClassDefinition {
        name: RESPONSE_CLASS.to_string(),
        fields: vec![
            field("status", types::INT, Value::int(0)),
            field("body", types::STRING, Value::string("")),
            field("headers", types::STRING, Value::string("{}")),
        ],
        methods: Vec::new(),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HttpLibrary;

impl Library for HttpLibrary {
    fn name(&self) -> &str {
        "http"
    }

    fn exports(&self) -> Scope {
        let mut scope = Scope::new();
        scope.define_class(Rc::new(response_class()));
        scope.define_function(Rc::new(MethodDefinition::native(
            "http_request",
            &[
                ("url", types::STRING),
                ("method", types::STRING),
                ("body", types::STRING),
                ("headers", types::STRING),
            ],
            RESPONSE_CLASS,
            "http.request",
        )));
        scope
    }

    fn natives(&self) -> Vec<(&'static str, NativeFn)> {
        vec![("http.request", http_request)]
    }
}

fn network_error(error: impl std::fmt::Display) -> RuntimeError {
    RuntimeError::Network {
        message: error.to_string(),
    }
}

/// Request headers from a JSON object string. An empty string means none.
fn parse_headers(headers: &str) -> Result<Vec<(String, String)>> {
    if headers.trim().is_empty() {
        return Ok(Vec::new());
    }
    let json: serde_json::Map<String, serde_json::Value> = serde_json::from_str(headers)
        .map_err(|e| RuntimeError::invalid_conversion(headers, &format!("header object ({e})")))?;
    Ok(json
        .into_iter()
        .map(|(name, value)| {
            let value = match value {
                serde_json::Value::String(text) => text,
                other => other.to_string(),
            };
            (name, value)
        })
        .collect())
}

fn http_request(_ctx: &mut InterpreterContext, args: &[Value]) -> Result<Value> {
    let url = text(&args[0])?;
    let method = text(&args[1])?.to_uppercase();
    let body = text(&args[2])?;
    let headers = parse_headers(text(&args[3])?)?;
    tracing::debug!(%method, url, "http request");

    let mut request = Agent::new()
        .request(&method, url)
        .set("Content-Type", "application/json");
    for (name, value) in &headers {
        request = request.set(name, value);
    }
    let sent = if body.is_empty() {
        request.call()
    } else {
        request.send_string(body)
    };
    let response = match sent {
        Ok(response) | Err(ureq::Error::Status(_, response)) => response,
        Err(error) => return Err(network_error(error).into()),
    };

    let status = response.status();
    let response_headers: serde_json::Map<String, serde_json::Value> = response
        .headers_names()
        .into_iter()
        .filter_map(|name| {
            let value = response.header(&name)?.to_string();
            Some((name, serde_json::Value::String(value)))
        })
        .collect();
    let body = response.into_string().map_err(network_error)?;
    tracing::debug!(status, bytes = body.len(), "http response");

    let mut instance = response_class().instantiate();
    for (name, value) in [
        ("status", Value::int(i64::from(status))),
        ("body", Value::string(body)),
        (
            "headers",
            Value::string(serde_json::Value::Object(response_headers).to_string()),
        ),
    ] {
        if let Some(property) = instance.properties.get_mut(name) {
            property.value = value;
        }
    }
    Ok(Value::Instance(instance))
}
