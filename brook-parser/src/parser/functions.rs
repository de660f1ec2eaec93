// Function definition parsing module
// Handles `type name(type arg, ...)` headers and their bodies

use crate::ast::*;
use crate::error::*;
use crate::lines::SourceLine;
use crate::parser::Parser;
use crate::scan;
use crate::scope::{Binding, Scope};
use crate::types;
use std::rc::Rc;

impl Parser<'_> {
    /// Parse a function definition and its body. The function is visible to
    /// its own body so it can recurse.
    pub(crate) fn parse_function_definition(
        &mut self,
        lines: &[SourceLine],
        index: usize,
    ) -> ParseResult<(Option<Statement>, usize)> {
        let signature = self.parse_signature(&lines[index].text, None)?;
        self.current.define_function(Rc::new(signature.clone()));

        let (body, next) = self.block_body(lines, index)?;
        let statements = self.parse_method_body(&signature, body, |_| {})?;
        let method = Rc::new(MethodDefinition {
            body: MethodBody::Statements(statements),
            ..signature
        });
        self.current.define_function(Rc::clone(&method));
        tracing::debug!(function = %method.name, "defined function");

        Ok((Some(Statement::MethodDefinition { method }), next))
    }

    /// Parse `type name(params)`. When `default_return` is given the return
    /// type may be omitted, as in class methods.
    pub(crate) fn parse_signature(
        &self,
        header: &str,
        default_return: Option<&str>,
    ) -> ParseResult<MethodDefinition> {
        let invalid = || self.error(ParseErrorKind::InvalidStatement);
        let open = header.find('(').ok_or_else(invalid)?;
        if scan::matching_close(header, open) != Some(header.len() - 1) {
            return Err(invalid());
        }

        let prefix: Vec<&str> = header[..open].split_whitespace().collect();
        let (return_type, name) = match (prefix.as_slice(), default_return) {
            ([return_type, name], _) => (self.parse_type(return_type)?, *name),
            ([name], Some(default)) => (default.to_string(), *name),
            _ => return Err(invalid()),
        };
        if !scan::is_identifier(name) {
            return Err(invalid());
        }

        let inner = header[open + 1..header.len() - 1].trim();
        let mut parameters = Vec::new();
        if !inner.is_empty() {
            for parameter in scan::split_top_level(inner, ',') {
                let words: Vec<&str> = parameter.split_whitespace().collect();
                let [declared_type, name] = words.as_slice() else {
                    return Err(invalid());
                };
                if !scan::is_identifier(name) {
                    return Err(invalid());
                }
                parameters.push(Parameter {
                    name: name.to_string(),
                    declared_type: self.parse_type(declared_type)?,
                });
            }
        }

        Ok(MethodDefinition {
            name: name.to_string(),
            return_type,
            parameters,
            body: MethodBody::Statements(Vec::new()),
        })
    }

    /// Parse a method body in a child scope where the parameters are bound.
    pub(crate) fn parse_method_body(
        &mut self,
        signature: &MethodDefinition,
        body: &[SourceLine],
        seed: impl FnOnce(&mut Scope),
    ) -> ParseResult<Vec<Statement>> {
        self.parse_child_block(body, |scope| {
            seed(scope);
            for parameter in &signature.parameters {
                scope.variables.insert(
                    parameter.name.clone(),
                    Binding::new(
                        parameter.declared_type.clone(),
                        placeholder(&parameter.name, &parameter.declared_type),
                    ),
                );
            }
        })
    }
}

/// Stand-in value for a name whose value is only known at run time.
pub(crate) fn placeholder(name: &str, declared_type: &str) -> Value {
    Value::Variable(VariableRef {
        path: vec![name.to_string()],
        object_type: types::normalize(declared_type),
    })
}
