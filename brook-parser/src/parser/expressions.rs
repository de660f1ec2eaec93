// Expression parsing module
// Turns expression text into typed values: calls and grouping first, then a
// leading `!` or a left-to-right relational scan, then arithmetic, then atoms

use crate::ast::*;
use crate::error::*;
use crate::parser::Parser;
use crate::path::{self, Walk};
use crate::scan;
use crate::types;

/// Relational and boolean operators, tested in this order at each position.
const RELATIONAL: [(&str, &str); 8] = [
    ("!=", "not_equals"),
    ("==", "equals"),
    ("<=", "less_than_or_equals"),
    (">=", "more_than_or_equals"),
    ("||", "or"),
    ("&&", "and"),
    ("<", "less_than"),
    (">", "more_than"),
];

fn call(name: &str, arguments: Vec<Value>, object_type: &str) -> Value {
    Value::MethodCall(MethodCall {
        path: vec![name.to_string()],
        arguments,
        object_type: object_type.to_string(),
    })
}

fn looks_numeric(text: &str) -> bool {
    let digits = text.strip_prefix(&['-', '+'][..]).unwrap_or(text);
    digits.starts_with(|c: char| c.is_ascii_digit() || c == '.')
}

impl Parser<'_> {
    /// Parse an expression against the current shadow scope.
    pub fn parse_expression(&self, text: &str) -> ParseResult<Value> {
        let text = text.trim();
        if text.is_empty() {
            return Err(self.error(ParseErrorKind::InvalidExpression(String::new())));
        }
        if text == types::NULL || text == "null" {
            return Ok(Value::null());
        }
        if let Some(value) = self.parse_call_or_group(text)? {
            return Ok(value);
        }
        if let Some(value) = self.parse_relational(text)? {
            return Ok(value);
        }
        if let Some(value) = self.parse_arithmetic(text)? {
            return Ok(value);
        }
        self.parse_atom(text)
    }

    /// `( ... )` spanning the whole text is a group; `path( ... )` is a call.
    fn parse_call_or_group(&self, text: &str) -> ParseResult<Option<Value>> {
        let Some(open) = super::first_paren(text) else {
            return Ok(None);
        };
        if scan::matching_close(text, open) != Some(text.len() - 1) {
            return Ok(None);
        }

        let callee = text[..open].trim_end();
        let inner = &text[open + 1..text.len() - 1];
        if callee.is_empty() {
            return self.parse_expression(inner).map(Some);
        }
        if !scan::is_path(callee) {
            return Ok(None);
        }
        self.parse_call(callee, inner).map(Some)
    }

    fn parse_call(&self, callee: &str, inner: &str) -> ParseResult<Value> {
        let path = scan::path_segments(callee);
        let (method, _) = path::method(&self.current, &path, Walk::Shadow)
            .map_err(|e| self.error(e.into()))?;

        let arguments = if inner.trim().is_empty() {
            Vec::new()
        } else {
            scan::split_top_level(inner, ',')
                .into_iter()
                .map(|argument| self.parse_expression(argument))
                .collect::<ParseResult<Vec<_>>>()?
        };
        if arguments.len() != method.parameters.len() {
            return Err(self.error(ParseErrorKind::WrongArity {
                function: callee.to_string(),
                expected: method.parameters.len(),
                found: arguments.len(),
            }));
        }

        Ok(Value::MethodCall(MethodCall {
            path,
            arguments,
            object_type: method.return_type.clone(),
        }))
    }

    /// A leading `!` negates everything after it, so it is checked before any
    /// other operator.
    fn parse_relational(&self, text: &str) -> ParseResult<Option<Value>> {
        if let Some(operand) = text.strip_prefix('!').filter(|rest| !rest.starts_with('=')) {
            return self.parse_not(operand).map(Some);
        }
        for (idx, _) in scan::top_level(text) {
            let rest = &text[idx..];
            let Some((symbol, function)) = RELATIONAL
                .iter()
                .find(|(symbol, _)| rest.starts_with(symbol))
            else {
                continue;
            };

            let left = self.parse_expression(&text[..idx])?;
            let right = self.parse_expression(&text[idx + symbol.len()..])?;
            let left_type = left.object_type().into_owned();
            let right_type = right.object_type().into_owned();

            if left_type != right_type {
                return Err(self.error(ParseErrorKind::TypeMismatch {
                    operator: symbol.to_string(),
                    left: left_type,
                    right: right_type,
                }));
            }
            if matches!(*symbol, "&&" | "||") && left_type != types::BOOL {
                return Err(self.error(ParseErrorKind::InvalidOperator {
                    operator: symbol.to_string(),
                    operand_type: left_type,
                }));
            }

            let value = if *symbol == "!=" {
                call(
                    "not",
                    vec![call("equals", vec![left, right], types::BOOL)],
                    types::BOOL,
                )
            } else {
                call(function, vec![left, right], types::BOOL)
            };
            return Ok(Some(value));
        }
        Ok(None)
    }

    /// Splits at the first binary `+ - * /`. A `+` or `-` with no left operand
    /// is a sign, not an operator.
    fn parse_arithmetic(&self, text: &str) -> ParseResult<Option<Value>> {
        let mut previous: Option<char> = None;
        for (idx, c) in scan::top_level(text) {
            if matches!(c, '+' | '-' | '*' | '/') {
                let is_sign = matches!(c, '+' | '-')
                    && previous.map_or(true, |p| matches!(p, '+' | '-' | '*' | '/'));
                if !is_sign {
                    let left = self.parse_expression(&text[..idx])?;
                    let right = self.parse_expression(&text[idx + 1..])?;
                    return self.arithmetic_value(c, left, right).map(Some);
                }
            }
            if !c.is_whitespace() {
                previous = Some(c);
            }
        }
        Ok(None)
    }

    /// Desugars `left <operator> right` into the matching builtin call. The
    /// result has the left operand's type.
    pub(crate) fn arithmetic_value(
        &self,
        operator: char,
        left: Value,
        right: Value,
    ) -> ParseResult<Value> {
        let left_type = left.object_type().into_owned();
        let right_type = right.object_type().into_owned();
        if left_type != right_type {
            return Err(self.error(ParseErrorKind::TypeMismatch {
                operator: operator.to_string(),
                left: left_type,
                right: right_type,
            }));
        }

        let function = match (operator, left_type.as_str()) {
            ('+', types::STRING) => "concat",
            ('+', types::INT | types::FLOAT | types::ANY) => "add",
            ('-', types::INT | types::FLOAT | types::ANY) => "subtract",
            ('*', types::INT | types::FLOAT | types::ANY) => "multiply",
            ('/', types::INT | types::FLOAT | types::ANY) => "divide",
            _ => {
                return Err(self.error(ParseErrorKind::InvalidOperator {
                    operator: operator.to_string(),
                    operand_type: left_type,
                }))
            }
        };
        Ok(call(function, vec![left, right], &left_type))
    }

    fn parse_atom(&self, text: &str) -> ParseResult<Value> {
        if self.current.class(text).is_some() {
            return Ok(Value::constant(text, types::CLASS));
        }
        match text {
            "true" => return Ok(Value::boolean(true)),
            "false" => return Ok(Value::boolean(false)),
            _ => {}
        }
        if let Ok(int) = text.parse::<i64>() {
            return Ok(Value::int(int));
        }
        if looks_numeric(text) {
            if let Ok(float) = text.parse::<f64>() {
                return Ok(Value::float(float));
            }
        }
        if text.starts_with('"') {
            return scan::decode_string_literal(text)
                .map(Value::string)
                .ok_or_else(|| self.error(ParseErrorKind::InvalidExpression(text.to_string())));
        }
        if let Some(class_name) = text.strip_prefix("new ") {
            return self.parse_new(class_name);
        }
        if text.starts_with('[') && scan::matching_close(text, 0) == Some(text.len() - 1) {
            return self.parse_array_literal(&text[1..text.len() - 1]);
        }
        if text.ends_with(']') {
            if let Some(value) = self.parse_index(text)? {
                return Ok(value);
            }
        }
        if let Some(operand) = text.strip_prefix('-') {
            return self.parse_negation(operand);
        }
        if scan::is_path(text) {
            let path = scan::path_segments(text);
            let member = path::variable(&self.current, &path, Walk::Shadow)
                .map_err(|e| self.error(e.into()))?;
            return Ok(Value::Variable(VariableRef {
                path,
                object_type: member.declared_type,
            }));
        }

        Err(self.error(ParseErrorKind::InvalidExpression(text.to_string())))
    }

    fn parse_new(&self, class_name: &str) -> ParseResult<Value> {
        let class_name = class_name.trim();
        let class_name = class_name.strip_suffix("()").unwrap_or(class_name).trim();
        if self.current.class(class_name).is_none() {
            return Err(self.error(ParseErrorKind::UnknownClass(class_name.to_string())));
        }
        Ok(Value::New(NewInstance {
            class_name: class_name.to_string(),
        }))
    }

    fn parse_array_literal(&self, inner: &str) -> ParseResult<Value> {
        if inner.trim().is_empty() {
            return Ok(Value::Array(ArrayValue {
                element_type: types::NULL.to_string(),
                values: Vec::new(),
            }));
        }

        let values = scan::split_top_level(inner, ',')
            .into_iter()
            .map(|element| self.parse_expression(element))
            .collect::<ParseResult<Vec<_>>>()?;
        let element_type = values[0].object_type().into_owned();
        if let Some(odd) = values.iter().find(|v| v.object_type() != element_type) {
            return Err(self.error(ParseErrorKind::MixedArray {
                expected: element_type,
                found: odd.object_type().into_owned(),
            }));
        }

        Ok(Value::Array(ArrayValue {
            element_type,
            values,
        }))
    }

    /// `base[index]` becomes a call to `get_array_object`.
    fn parse_index(&self, text: &str) -> ParseResult<Option<Value>> {
        let open = scan::top_level(text)
            .filter(|&(_, c)| c == '[')
            .map(|(idx, _)| idx)
            .last();
        let Some(open) = open.filter(|&open| {
            open > 0 && scan::matching_close(text, open) == Some(text.len() - 1)
        }) else {
            return Ok(None);
        };

        let base_text = text[..open].trim();
        let base = self.parse_expression(base_text)?;
        let index = self.parse_expression(&text[open + 1..text.len() - 1])?;

        let base_type = base.object_type().into_owned();
        let Some(element_type) = types::element_type(&base_type) else {
            return Err(self.error(ParseErrorKind::NotAnArray(base_text.to_string())));
        };
        if index.object_type() != types::INT {
            return Err(self.error(ParseErrorKind::InvalidIndex(
                index.object_type().into_owned(),
            )));
        }

        Ok(Some(call(
            "get_array_object",
            vec![base, index],
            element_type,
        )))
    }

    fn parse_not(&self, operand: &str) -> ParseResult<Value> {
        let value = self.parse_expression(operand)?;
        if value.object_type() != types::BOOL {
            return Err(self.error(ParseErrorKind::InvalidOperator {
                operator: "!".to_string(),
                operand_type: value.object_type().into_owned(),
            }));
        }
        Ok(call("not", vec![value], types::BOOL))
    }

    /// `-expr` for a non-literal operand is `0 - expr`.
    fn parse_negation(&self, operand: &str) -> ParseResult<Value> {
        let value = self.parse_expression(operand)?;
        let zero = match value.object_type().as_ref() {
            types::INT => Value::int(0),
            types::FLOAT => Value::float(0.0),
            other => {
                return Err(self.error(ParseErrorKind::InvalidOperator {
                    operator: "-".to_string(),
                    operand_type: other.to_string(),
                }))
            }
        };
        self.arithmetic_value('-', zero, value)
    }
}
