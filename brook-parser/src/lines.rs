// Brook Line Splitter
// Breaks source text into logical lines: statements end at an unescaped
// newline or `;`, comments are removed and unescaped braces always stand on a
// line of their own

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    /// 1-based source line the logical line started on.
    pub number: usize,
    pub text: String,
}

struct Splitter {
    lines: Vec<SourceLine>,
    current: String,
    start: usize,
    line: usize,
}

impl Splitter {
    fn push(&mut self, c: char) {
        if self.current.trim().is_empty() && !c.is_whitespace() {
            self.start = self.line;
        }
        self.current.push(c);
    }

    fn flush(&mut self) {
        let text = self.current.trim();
        if !text.is_empty() {
            self.lines.push(SourceLine {
                number: self.start,
                text: text.to_string(),
            });
        }
        self.current.clear();
    }

    fn brace(&mut self, c: char) {
        self.flush();
        self.lines.push(SourceLine {
            number: self.line,
            text: c.to_string(),
        });
    }
}

/// Splits `source` into logical lines. A trailing empty line is always
/// appended. Escape sequences inside strings are kept verbatim.
pub fn split_lines(source: &str) -> Vec<SourceLine> {
    let mut splitter = Splitter {
        lines: Vec::new(),
        current: String::new(),
        start: 1,
        line: 1,
    };
    let mut chars = source.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            splitter.push(c);
            match c {
                '\\' => {
                    if let Some(next) = chars.next() {
                        if next == '\n' {
                            splitter.line += 1;
                        }
                        splitter.push(next);
                    }
                }
                '"' => in_string = false,
                '\n' => splitter.line += 1,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                splitter.push(c);
            }
            '/' if chars.peek() == Some(&'/') => {
                while let Some(&next) = chars.peek() {
                    if next == '\n' {
                        break;
                    }
                    chars.next();
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut previous = '\0';
                for next in chars.by_ref() {
                    if next == '\n' {
                        splitter.line += 1;
                    }
                    if previous == '*' && next == '/' {
                        break;
                    }
                    previous = next;
                }
                splitter.current.push(' ');
            }
            // Outside strings `\` escapes the next character. An escaped line
            // break continues the line; anything else is kept as plain text.
            '\\' => match chars.next() {
                Some(next @ ('\n' | '\r')) => {
                    if next == '\r' && chars.peek() == Some(&'\n') {
                        chars.next();
                    }
                    splitter.line += 1;
                    splitter.current.push(' ');
                }
                Some(escaped) => splitter.push(escaped),
                None => {}
            },
            '\n' => {
                splitter.flush();
                splitter.line += 1;
            }
            ';' => splitter.flush(),
            '{' | '}' => splitter.brace(c),
            '\r' => {}
            _ => splitter.push(c),
        }
    }

    splitter.flush();
    splitter.lines.push(SourceLine {
        number: splitter.line,
        text: String::new(),
    });
    splitter.lines
}
