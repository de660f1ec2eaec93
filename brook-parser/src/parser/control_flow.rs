// Control flow parsing module
// Handles if/else chains, while loops and try/catch

use crate::ast::*;
use crate::error::*;
use crate::lines::SourceLine;
use crate::parser::functions::placeholder;
use crate::parser::Parser;
use crate::scan;
use crate::scope::Binding;
use crate::types;

impl Parser<'_> {
    /// Parse `if (cond)` with an optional `else` or `else if` chain.
    pub(crate) fn parse_if(
        &mut self,
        lines: &[SourceLine],
        index: usize,
        header: &str,
    ) -> ParseResult<(Option<Statement>, usize)> {
        let condition = self.parse_condition(header["if".len()..].trim())?;
        let (body, mut next) = self.block_body(lines, index)?;
        let body = self.parse_child_block(body, |_| {})?;

        let mut else_body = None;
        if let Some(line) = lines.get(next) {
            let text = line.text.as_str();
            let chained = text
                .strip_prefix("else")
                .filter(|rest| rest.starts_with(char::is_whitespace))
                .map(str::trim_start)
                .filter(|rest| scan::first_word(rest) == "if");

            if text == "else" {
                self.at(line);
                let (block, after) = self.block_body(lines, next)?;
                else_body = Some(self.parse_child_block(block, |_| {})?);
                next = after;
            } else if let Some(nested_header) = chained {
                self.at(line);
                let (nested, after) = self.parse_if(lines, next, nested_header)?;
                else_body = Some(nested.into_iter().collect());
                next = after;
            }
        }

        Ok((
            Some(Statement::If {
                condition,
                body,
                else_body,
            }),
            next,
        ))
    }

    pub(crate) fn parse_while(
        &mut self,
        lines: &[SourceLine],
        index: usize,
    ) -> ParseResult<(Option<Statement>, usize)> {
        let header = lines[index].text.as_str();
        let condition = self.parse_condition(header["while".len()..].trim())?;
        let (body, next) = self.block_body(lines, index)?;
        let body = self.parse_child_block(body, |_| {})?;

        Ok((Some(Statement::While { condition, body }), next))
    }

    /// Parse `try` followed by its mandatory `catch (name)` clause. The caught
    /// value is typed `string` while parsing the catch body.
    pub(crate) fn parse_try(
        &mut self,
        lines: &[SourceLine],
        index: usize,
    ) -> ParseResult<(Option<Statement>, usize)> {
        if lines[index].text != "try" {
            return Err(self.error(ParseErrorKind::InvalidStatement));
        }
        let (body, next) = self.block_body(lines, index)?;
        let body = self.parse_child_block(body, |_| {})?;

        let catch_line = match lines.get(next) {
            Some(line) if scan::first_word(&line.text) == "catch" => line,
            _ => {
                self.at(&lines[index]);
                return Err(self.error(ParseErrorKind::MissingCatch));
            }
        };
        self.at(catch_line);

        let rest = catch_line.text["catch".len()..].trim();
        let name = rest
            .strip_prefix('(')
            .and_then(|r| r.strip_suffix(')'))
            .unwrap_or(rest)
            .trim()
            .to_string();
        if !scan::is_identifier(&name) {
            return Err(self.error(ParseErrorKind::InvalidStatement));
        }

        let (catch_body, after) = self.block_body(lines, next)?;
        let catch_body = self.parse_child_block(catch_body, |scope| {
            scope.variables.insert(
                name.clone(),
                Binding::new(types::STRING, placeholder(&name, types::STRING)),
            );
        })?;

        Ok((
            Some(Statement::TryCatch {
                body,
                catch: Some(CatchClause {
                    name,
                    body: catch_body,
                }),
            }),
            after,
        ))
    }

    /// Conditions must be typed `bool` (or `any`, checked when run).
    fn parse_condition(&self, text: &str) -> ParseResult<Value> {
        let condition = self.parse_expression(text)?;
        match condition.object_type().as_ref() {
            types::BOOL | types::ANY => Ok(condition),
            other => Err(self.error(ParseErrorKind::ConditionNotBool(other.to_string()))),
        }
    }
}
