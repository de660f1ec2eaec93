// Brook Parser
// Line-oriented statement parser that validates every reference against a
// compile-time shadow of the run-time scope

mod classes;
mod control_flow;
mod expressions;
mod functions;

use crate::ast::*;
use crate::error::*;
use crate::library::{is_script_library, LibraryLoader, NoLibraries};
use crate::lines::{split_lines, SourceLine};
use crate::path::{self, Walk};
use crate::scan;
use crate::scope::{Binding, Scope};
use crate::types;
use std::mem;
use std::path::PathBuf;
use std::rc::Rc;

static NO_LIBRARIES: NoLibraries = NoLibraries;

/// Parses Brook source into a [`Script`].
///
/// The parser starts from a prelude scope (normally the builtin function
/// signatures) and mirrors every declaration in its own shadow scope so that
/// unknown names and operand type mismatches are reported before anything
/// runs.
pub struct Parser<'a> {
    prelude: Scope,
    current: Scope,
    saved: Vec<Scope>,
    classes: Vec<Rc<ClassDefinition>>,
    loader: &'a dyn LibraryLoader,
    base_dir: PathBuf,
    line: usize,
    text: String,
}

impl Parser<'static> {
    pub fn new(prelude: Scope) -> Self {
        Self {
            current: prelude.clone(),
            prelude,
            saved: Vec::new(),
            classes: Vec::new(),
            loader: &NO_LIBRARIES,
            base_dir: PathBuf::from("."),
            line: 0,
            text: String::new(),
        }
    }
}

impl<'a> Parser<'a> {
    /// Use `loader` to resolve `use "name"` for registered libraries.
    pub fn with_loader<'b>(self, loader: &'b dyn LibraryLoader) -> Parser<'b> {
        Parser {
            prelude: self.prelude,
            current: self.current,
            saved: self.saved,
            classes: self.classes,
            loader,
            base_dir: self.base_dir,
            line: self.line,
            text: self.text,
        }
    }

    /// Directory that script library paths are relative to.
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    pub fn parse(mut self, source: &str) -> ParseResult<Script> {
        let lines = split_lines(source);
        let statements = self.parse_block(&lines)?;
        Ok(Script {
            statements,
            classes: self.classes,
        })
    }

    /// The shadow scope as it stands.
    pub fn scope(&self) -> &Scope {
        &self.current
    }

    pub(crate) fn at(&mut self, line: &SourceLine) {
        self.line = line.number;
        self.text.clone_from(&line.text);
    }

    pub(crate) fn error(&self, kind: ParseErrorKind) -> ParseError {
        ParseError {
            line: self.line,
            text: self.text.clone(),
            kind,
        }
    }

    fn enter_scope(&mut self) {
        let child = self.current.child();
        self.saved.push(mem::replace(&mut self.current, child));
    }

    fn exit_scope(&mut self) {
        if let Some(parent) = self.saved.pop() {
            let child = mem::replace(&mut self.current, parent);
            // Classes are global at run time, so they outlive the block that
            // declared them.
            for (name, class) in child.classes.iter() {
                self.current
                    .classes
                    .entry(name.clone())
                    .or_insert_with(|| Rc::clone(class));
            }
            self.current.merge_back(child, &[]);
        }
    }

    /// Parses `body` in a child shadow scope prepared by `seed`.
    pub(crate) fn parse_child_block(
        &mut self,
        body: &[SourceLine],
        seed: impl FnOnce(&mut Scope),
    ) -> ParseResult<Vec<Statement>> {
        self.enter_scope();
        seed(&mut self.current);
        let result = self.parse_block(body);
        self.exit_scope();
        result
    }

    fn parse_block(&mut self, lines: &[SourceLine]) -> ParseResult<Vec<Statement>> {
        let mut statements = Vec::new();
        let mut open_scopes = 0usize;
        let mut index = 0;

        while index < lines.len() {
            let line = &lines[index];
            self.at(line);
            match line.text.as_str() {
                "" => index += 1,
                "{" => {
                    self.enter_scope();
                    open_scopes += 1;
                    statements.push(Statement::EnterScope);
                    index += 1;
                }
                "}" => {
                    if open_scopes == 0 {
                        return Err(self.error(ParseErrorKind::UnbalancedScope));
                    }
                    self.exit_scope();
                    open_scopes -= 1;
                    statements.push(Statement::ExitScope);
                    index += 1;
                }
                _ => {
                    let (statement, next) = self.parse_statement(lines, index)?;
                    statements.extend(statement);
                    index = next;
                }
            }
        }

        if open_scopes > 0 {
            return Err(self.error(ParseErrorKind::UnbalancedScope));
        }
        Ok(statements)
    }

    /// Parses the statement starting at `lines[index]` and returns the index
    /// of the first line after it. Class definitions produce no statement.
    fn parse_statement(
        &mut self,
        lines: &[SourceLine],
        index: usize,
    ) -> ParseResult<(Option<Statement>, usize)> {
        let text = lines[index].text.as_str();
        let keyword = scan::first_word(text);
        tracing::trace!(line = lines[index].number, keyword, "parsing statement");

        match keyword {
            "return" => {
                let rest = text[keyword.len()..].trim();
                let value = if rest.is_empty() {
                    Value::null()
                } else {
                    self.parse_expression(rest)?
                };
                Ok((Some(Statement::Return { value }), index + 1))
            }
            "throw" => {
                let value = self.parse_expression(&text[keyword.len()..])?;
                Ok((Some(Statement::Throw { value }), index + 1))
            }
            "use" => {
                let statement = self.parse_use(text[keyword.len()..].trim())?;
                Ok((Some(statement), index + 1))
            }
            "if" => self.parse_if(lines, index, text),
            "while" => self.parse_while(lines, index),
            "try" => self.parse_try(lines, index),
            "class" => self.parse_class(lines, index),
            "else" | "catch" => Err(self.error(ParseErrorKind::InvalidStatement)),
            _ => self.parse_simple(lines, index),
        }
    }

    /// Calls, declarations and assignments.
    fn parse_simple(
        &mut self,
        lines: &[SourceLine],
        index: usize,
    ) -> ParseResult<(Option<Statement>, usize)> {
        let text = lines[index].text.as_str();
        let paren = first_paren(text);
        let assignment = find_assignment(text);

        match (paren, assignment) {
            (Some(open), assignment) if assignment.map_or(true, |(eq, _)| open < eq) => {
                if text[..open].split_whitespace().count() == 2 {
                    self.parse_function_definition(lines, index)
                } else {
                    match self.parse_expression(text)? {
                        Value::MethodCall(call) => {
                            Ok((Some(Statement::FunctionCall { call }), index + 1))
                        }
                        _ => Err(self.error(ParseErrorKind::InvalidStatement)),
                    }
                }
            }
            (_, Some((eq, operator))) => {
                let statement = self.parse_assignment(text, eq, operator)?;
                Ok((Some(statement), index + 1))
            }
            _ => {
                let statement = self.parse_bare_declaration(text)?;
                Ok((Some(statement), index + 1))
            }
        }
    }

    fn parse_assignment(
        &mut self,
        text: &str,
        eq: usize,
        operator: Option<char>,
    ) -> ParseResult<Statement> {
        let lhs = text[..eq].trim();
        let width = if operator.is_some() { 2 } else { 1 };
        let rhs = text[eq + width..].trim();
        let words: Vec<&str> = lhs.split_whitespace().collect();

        match (words.as_slice(), operator) {
            ([declared_type, name], None) => self.parse_variable_init(declared_type, name, rhs),
            ([target], _) if scan::is_path(target) => self.parse_variable_set(target, operator, rhs),
            _ => Err(self.error(ParseErrorKind::InvalidStatement)),
        }
    }

    fn parse_variable_init(
        &mut self,
        declared_type: &str,
        name: &str,
        rhs: &str,
    ) -> ParseResult<Statement> {
        let declared_type = self.parse_type(declared_type)?;
        if !scan::is_identifier(name) {
            return Err(self.error(ParseErrorKind::InvalidStatement));
        }
        let value = self.parse_expression(rhs)?.retype_empty_array(&declared_type);
        self.current.variables.insert(
            name.to_string(),
            Binding::new(declared_type.clone(), value.clone()),
        );

        Ok(Statement::VariableInit {
            name: name.to_string(),
            declared_type,
            value,
        })
    }

    fn parse_variable_set(
        &mut self,
        target: &str,
        operator: Option<char>,
        rhs: &str,
    ) -> ParseResult<Statement> {
        let path = scan::path_segments(target);
        let member = path::variable(&self.current, &path, Walk::Shadow)
            .map_err(|e| self.error(e.into()))?;
        let declared_type = member.declared_type;

        let value = match operator {
            None => self.parse_expression(rhs)?,
            Some(operator) => {
                let current = Value::Variable(VariableRef {
                    path: path.clone(),
                    object_type: declared_type.clone(),
                });
                let right = self.parse_expression(rhs)?;
                self.arithmetic_value(operator, current, right)?
            }
        };

        Ok(Statement::VariableSet {
            path,
            value: value.retype_empty_array(&declared_type),
        })
    }

    /// `type name` with no initializer takes the type's default value.
    fn parse_bare_declaration(&mut self, text: &str) -> ParseResult<Statement> {
        let words: Vec<&str> = text.split_whitespace().collect();
        let [declared_type, name] = words.as_slice() else {
            return Err(self.error(ParseErrorKind::InvalidStatement));
        };
        let declared_type = self.parse_type(declared_type)?;
        if !scan::is_identifier(name) {
            return Err(self.error(ParseErrorKind::InvalidStatement));
        }
        let value = Value::default_for(&declared_type)
            .ok_or_else(|| self.error(ParseErrorKind::InvalidStatement))?;
        self.current.variables.insert(
            name.to_string(),
            Binding::new(declared_type.clone(), value.clone()),
        );

        Ok(Statement::VariableInit {
            name: name.to_string(),
            declared_type,
            value,
        })
    }

    /// Validates a declared type: a builtin type or known class, optionally
    /// with array suffixes.
    pub(crate) fn parse_type(&self, text: &str) -> ParseResult<String> {
        if !types::is_type_name(text) {
            return Err(self.error(ParseErrorKind::InvalidType(text.to_string())));
        }
        let normalized = types::normalize(text);
        let mut base = normalized.as_str();
        while let Some(element) = types::element_type(base) {
            base = element;
        }
        let builtin = matches!(
            base,
            types::INT
                | types::FLOAT
                | types::BOOL
                | types::STRING
                | types::CLASS
                | types::NULL
                | types::ANY
        );
        if builtin || self.current.class(base).is_some() {
            Ok(normalized)
        } else {
            Err(self.error(ParseErrorKind::UnknownClass(base.to_string())))
        }
    }

    fn parse_use(&mut self, argument: &str) -> ParseResult<Statement> {
        let name = scan::decode_string_literal(argument).ok_or_else(|| {
            self.error(ParseErrorKind::Library {
                name: argument.to_string(),
                message: "library name must be a string constant".to_string(),
            })
        })?;
        tracing::debug!(library = %name, "loading library");

        if is_script_library(&name) {
            let exports = self.load_script_library(&name)?;
            self.current.append(exports.clone());
            Ok(Statement::LoadLib {
                name,
                exports: Some(exports),
            })
        } else {
            let exports = self.loader.load(&name).map_err(|e| {
                self.error(ParseErrorKind::Library {
                    name: name.clone(),
                    message: e.to_string(),
                })
            })?;
            self.current.append(exports);
            Ok(Statement::LoadLib {
                name,
                exports: None,
            })
        }
    }

    /// Parses a library source file and collects its classes and top-level
    /// functions.
    pub fn load_script_library(&self, name: &str) -> ParseResult<Scope> {
        let library_error = |message: String| {
            self.error(ParseErrorKind::Library {
                name: name.to_string(),
                message,
            })
        };

        let path = self.base_dir.join(name);
        let source = std::fs::read_to_string(&path)
            .map_err(|e| library_error(format!("{}: {e}", path.display())))?;
        let base_dir = path
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(|| self.base_dir.clone());

        let script = Parser::new(self.prelude.clone())
            .with_loader(self.loader)
            .with_base_dir(base_dir)
            .parse(&source)
            .map_err(|e| library_error(e.to_string()))?;

        let mut exports = Scope::new();
        for class in script.classes {
            exports.define_class(class);
        }
        for statement in script.statements {
            match statement {
                Statement::MethodDefinition { method } => exports.define_function(method),
                Statement::LoadLib {
                    exports: Some(nested),
                    ..
                } => exports.append(nested),
                _ => {}
            }
        }
        Ok(exports)
    }

    /// Lines strictly between the `{` following `header` and its matching
    /// `}`, plus the index of the line after the close.
    pub(crate) fn block_body<'l>(
        &self,
        lines: &'l [SourceLine],
        header: usize,
    ) -> ParseResult<(&'l [SourceLine], usize)> {
        let open = header + 1;
        if lines.get(open).map(|l| l.text.as_str()) != Some("{") {
            return Err(self.error(ParseErrorKind::MalformedBlock(
                "expected '{' after block header".to_string(),
            )));
        }

        let mut depth = 0usize;
        for (offset, line) in lines[open..].iter().enumerate() {
            match line.text.as_str() {
                "{" => depth += 1,
                "}" => {
                    depth -= 1;
                    if depth == 0 {
                        let close = open + offset;
                        return Ok((&lines[open + 1..close], close + 1));
                    }
                }
                _ => {}
            }
        }

        Err(self.error(ParseErrorKind::MalformedBlock(
            "missing closing '}'".to_string(),
        )))
    }
}

/// Position of the first top-level `(`.
pub(crate) fn first_paren(text: &str) -> Option<usize> {
    scan::top_level(text)
        .find(|&(_, c)| c == '(')
        .map(|(idx, _)| idx)
}

/// Position of the first top-level assignment operator, with the arithmetic
/// operator of a compound assignment (`+=`, `-=`, `*=`, `/=`).
pub(crate) fn find_assignment(text: &str) -> Option<(usize, Option<char>)> {
    let mut previous: Option<(usize, char)> = None;
    let mut candidates = scan::top_level(text).peekable();

    while let Some((idx, c)) = candidates.next() {
        if c == '=' {
            let next_is_eq = candidates.peek().is_some_and(|&(_, n)| n == '=');
            match previous {
                _ if next_is_eq => {
                    candidates.next();
                }
                Some((_, '=' | '!' | '<' | '>')) => {}
                Some((at, operator @ ('+' | '-' | '*' | '/'))) if at + 1 == idx => {
                    return Some((at, Some(operator)));
                }
                _ => return Some((idx, None)),
            }
        }
        previous = Some((idx, c));
    }
    None
}
