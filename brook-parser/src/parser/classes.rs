// Class parsing module
// A class body holds only field declarations and method definitions

use crate::ast::*;
use crate::error::*;
use crate::lines::SourceLine;
use crate::parser::{find_assignment, first_paren, Parser};
use crate::scan;
use crate::scope::{Binding, Scope};
use crate::types;
use std::rc::Rc;

fn upsert_method(methods: &mut Vec<Rc<MethodDefinition>>, method: Rc<MethodDefinition>) {
    match methods.iter_mut().find(|m| m.name == method.name) {
        Some(existing) => *existing = method,
        None => methods.push(method),
    }
}

/// Seeds a method body scope with the members declared so far.
fn seed_members(scope: &mut Scope, class: &ClassDefinition) {
    for field in &class.fields {
        scope.variables.insert(
            field.name.clone(),
            Binding::new(field.declared_type.clone(), field.value.clone()),
        );
    }
    for method in &class.methods {
        scope.define_function(Rc::clone(method));
    }
}

impl Parser<'_> {
    /// Parse `class Name` and its body. The class is registered in the shadow
    /// scope as each member is added, so later members can use earlier ones.
    pub(crate) fn parse_class(
        &mut self,
        lines: &[SourceLine],
        index: usize,
    ) -> ParseResult<(Option<Statement>, usize)> {
        let name = lines[index].text["class".len()..].trim();
        if !scan::is_identifier(name) {
            return Err(self.error(ParseErrorKind::InvalidStatement));
        }
        let (body, next) = self.block_body(lines, index)?;

        let mut class = ClassDefinition {
            name: name.to_string(),
            fields: Vec::new(),
            methods: Vec::new(),
        };
        self.current.define_class(Rc::new(class.clone()));

        let mut member = 0;
        while member < body.len() {
            let line = &body[member];
            self.at(line);
            let text = line.text.as_str();
            if text.is_empty() {
                member += 1;
                continue;
            }

            let paren = first_paren(text);
            let assignment = find_assignment(text);
            match paren {
                Some(open) if assignment.map_or(true, |(eq, _)| open < eq) => {
                    let signature = self.parse_signature(text, Some(types::NULL))?;
                    upsert_method(&mut class.methods, Rc::new(signature.clone()));
                    self.current.define_class(Rc::new(class.clone()));

                    let (method_body, after) = self.block_body(body, member)?;
                    let statements =
                        self.parse_method_body(&signature, method_body, |scope| {
                            seed_members(scope, &class)
                        })?;
                    upsert_method(
                        &mut class.methods,
                        Rc::new(MethodDefinition {
                            body: MethodBody::Statements(statements),
                            ..signature
                        }),
                    );
                    member = after;
                }
                _ => {
                    let field = self.parse_field(text, assignment)?;
                    if matches!(&field.value, Value::New(new) if new.class_name == class.name) {
                        return Err(self.error(ParseErrorKind::SelfReferentialField {
                            class: class.name.clone(),
                            field: field.name,
                        }));
                    }
                    class.fields.push(field);
                    member += 1;
                }
            }
            self.current.define_class(Rc::new(class.clone()));
        }

        tracing::debug!(class = %class.name, fields = class.fields.len(), methods = class.methods.len(), "defined class");
        let class = Rc::new(class);
        self.current.define_class(Rc::clone(&class));
        self.classes.push(class);
        Ok((None, next))
    }

    /// `type name = expr` or `type name`.
    fn parse_field(
        &mut self,
        text: &str,
        assignment: Option<(usize, Option<char>)>,
    ) -> ParseResult<FieldDefinition> {
        let (declaration, initializer) = match assignment {
            Some((eq, None)) => (text[..eq].trim(), Some(text[eq + 1..].trim())),
            Some(_) => return Err(self.error(ParseErrorKind::InvalidClassMember)),
            None => (text, None),
        };
        let words: Vec<&str> = declaration.split_whitespace().collect();
        let [declared_type, name] = words.as_slice() else {
            return Err(self.error(ParseErrorKind::InvalidClassMember));
        };
        if !scan::is_identifier(name) {
            return Err(self.error(ParseErrorKind::InvalidClassMember));
        }
        let declared_type = self.parse_type(declared_type)?;

        let value = match initializer {
            Some(expression) => self
                .parse_expression(expression)?
                .retype_empty_array(&declared_type),
            None => Value::default_for(&declared_type).unwrap_or_else(Value::null),
        };

        Ok(FieldDefinition {
            name: name.to_string(),
            declared_type,
            value,
        })
    }
}
