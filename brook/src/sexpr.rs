// S-expression formatter for Brook scripts
// Renders the parsed AST as readable Lisp-like text for `brook parse`

use brook_parser::*;

pub fn format_script_as_sexpr(script: &Script) -> String {
    format_script_with_indent(script, 0)
}

fn pad(indent: usize) -> String {
    " ".repeat(indent)
}

/// `(head)` when there are no children, otherwise one child per line.
fn format_list(head: &str, children: Vec<String>, indent: usize) -> String {
    if children.is_empty() {
        format!("({head})")
    } else {
        format!(
            "({head}\n{}{})",
            pad(indent + 2),
            children.join(&format!("\n{}", pad(indent + 2)))
        )
    }
}

fn format_script_with_indent(script: &Script, indent: usize) -> String {
    let mut items: Vec<String> = script
        .classes
        .iter()
        .map(|class| format_class_with_indent(class, indent + 2))
        .collect();
    items.extend(
        script
            .statements
            .iter()
            .map(|statement| format_statement_with_indent(statement, indent + 2)),
    );
    format_list("script", items, indent)
}

fn format_class_with_indent(class: &ClassDefinition, indent: usize) -> String {
    let mut members: Vec<String> = class
        .fields
        .iter()
        .map(|field| {
            format!(
                "(field {} {} {})",
                field.declared_type,
                field.name,
                format_value_with_indent(&field.value, indent + 2)
            )
        })
        .collect();
    members.extend(
        class
            .methods
            .iter()
            .map(|method| format_method_with_indent(method, indent + 2)),
    );
    format_list(&format!("class {}", class.name), members, indent)
}

fn format_method_with_indent(method: &MethodDefinition, indent: usize) -> String {
    let parameters: Vec<String> = method
        .parameters
        .iter()
        .map(|p| format!("({} {})", p.declared_type, p.name))
        .collect();
    let head = format!(
        "method {} {} ({})",
        method.return_type,
        method.name,
        parameters.join(" ")
    );
    match &method.body {
        MethodBody::Native { symbol } => format!("({head} (native {symbol}))"),
        MethodBody::Statements(body) => format_list(&head, format_block(body, indent), indent),
    }
}

fn format_block(statements: &[Statement], indent: usize) -> Vec<String> {
    statements
        .iter()
        .map(|statement| format_statement_with_indent(statement, indent + 2))
        .collect()
}

fn format_statement_with_indent(statement: &Statement, indent: usize) -> String {
    match statement {
        Statement::FunctionCall { call } => format_call_with_indent(call, indent),
        Statement::VariableInit {
            name,
            declared_type,
            value,
        } => format!(
            "(init {declared_type} {name} {})",
            format_value_with_indent(value, indent + 2)
        ),
        Statement::VariableSet { path, value } => format!(
            "(set {} {})",
            path.join("."),
            format_value_with_indent(value, indent + 2)
        ),
        Statement::MethodDefinition { method } => format_method_with_indent(method, indent),
        Statement::If {
            condition,
            body,
            else_body,
        } => {
            let mut children = vec![format_list("then", format_block(body, indent + 2), indent + 2)];
            if let Some(else_body) = else_body {
                children.push(format_list("else", format_block(else_body, indent + 2), indent + 2));
            }
            format_list(
                &format!("if {}", format_value_with_indent(condition, indent + 2)),
                children,
                indent,
            )
        }
        Statement::While { condition, body } => format_list(
            &format!("while {}", format_value_with_indent(condition, indent + 2)),
            format_block(body, indent),
            indent,
        ),
        Statement::Return { value } => {
            format!("(return {})", format_value_with_indent(value, indent + 2))
        }
        Statement::Throw { value } => {
            format!("(throw {})", format_value_with_indent(value, indent + 2))
        }
        Statement::TryCatch { body, catch } => {
            let mut children = vec![format_list("try", format_block(body, indent + 2), indent + 2)];
            if let Some(clause) = catch {
                children.push(format_list(
                    &format!("catch {}", clause.name),
                    format_block(&clause.body, indent + 2),
                    indent + 2,
                ));
            }
            format_list("try-catch", children, indent)
        }
        Statement::EnterScope => "(enter-scope)".to_string(),
        Statement::ExitScope => "(exit-scope)".to_string(),
        Statement::LoadLib { name, exports } => match exports {
            Some(_) => format!("(use {name:?} embedded)"),
            None => format!("(use {name:?})"),
        },
    }
}

fn format_call_with_indent(call: &MethodCall, indent: usize) -> String {
    let arguments: Vec<String> = call
        .arguments
        .iter()
        .map(|argument| format_value_with_indent(argument, indent + 2))
        .collect();
    if arguments.is_empty() {
        format!("(call {})", call.path.join("."))
    } else {
        format!("(call {} {})", call.path.join("."), arguments.join(" "))
    }
}

fn format_value_with_indent(value: &Value, indent: usize) -> String {
    match value {
        Value::Constant(constant) => match constant.object_type.as_str() {
            types::STRING => format!("{:?}", constant.text),
            types::NULL => "null".to_string(),
            _ => constant.text.clone(),
        },
        Value::Variable(variable) => variable.path.join("."),
        Value::MethodCall(call) => format_call_with_indent(call, indent),
        Value::Array(array) => {
            let values: Vec<String> = array
                .values
                .iter()
                .map(|element| format_value_with_indent(element, indent))
                .collect();
            format!("(array {} [{}])", array.element_type, values.join(" "))
        }
        Value::Instance(instance) => format!("(instance {})", instance.class_name),
        Value::DirectMethod(direct) => {
            let arguments: Vec<String> = direct
                .arguments
                .iter()
                .map(|argument| format_value_with_indent(argument, indent))
                .collect();
            format!("(direct {} {})", direct.method.name, arguments.join(" "))
        }
        Value::New(new) => format!("(new {})", new.class_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script(statements: Vec<Statement>) -> Script {
        Script {
            statements,
            classes: Vec::new(),
        }
    }

    #[test]
    fn test_empty_script() {
        assert_eq!(format_script_as_sexpr(&Script::default()), "(script)");
    }

    #[test]
    fn test_declaration_with_call() {
        let init = Statement::VariableInit {
            name: "a".to_string(),
            declared_type: "int".to_string(),
            value: Value::MethodCall(MethodCall {
                path: vec!["add".to_string()],
                arguments: vec![Value::int(1), Value::int(2)],
                object_type: "int".to_string(),
            }),
        };
        assert_eq!(
            format_script_as_sexpr(&script(vec![init])),
            "(script\n  (init int a (call add 1 2)))"
        );
    }

    #[test]
    fn test_strings_are_quoted() {
        let throw = Statement::Throw {
            value: Value::string("boom"),
        };
        assert_eq!(
            format_script_as_sexpr(&script(vec![throw])),
            "(script\n  (throw \"boom\"))"
        );
    }
}
