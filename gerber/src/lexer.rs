//! Statement splitting, per §4.1 of the format specification.
//!
//! A statement is either a *word statement* (a single non-blank line
//! terminated by `*`) or an *extended statement* bounded by `%` on both
//! sides, which may span several lines. The lexer's only job is finding
//! statement boundaries and attaching a line number; classifying and
//! dispatching the statement text is [`crate::parser`]'s job.

/// One logical statement: its accumulated text (delimiters stripped) and
/// the one-based line number of its first source line.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Statement<'a> {
    pub(crate) text: StatementText<'a>,
    pub(crate) line: usize,
}

/// Extended statements must own their text (lines are joined); word
/// statements can borrow straight from the input.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum StatementText<'a> {
    Word(&'a str),
    Extended(String),
}

impl<'a> StatementText<'a> {
    pub(crate) fn as_str(&self) -> &str {
        match self {
            StatementText::Word(s) => s,
            StatementText::Extended(s) => s.as_str(),
        }
    }
}

/// Split `input` into an ordered sequence of statements.
///
/// Blank/whitespace-only lines outside a delimiter region are skipped. A
/// line starting with `%` opens a delimiter region that accumulates lines
/// (joined without separators, since `*` already separates sub-statements
/// inside the payload) until a line ending with `%` closes it.
pub(crate) fn lex(input: &str) -> Vec<Statement<'_>> {
    let mut statements = Vec::new();
    let mut lines = input.lines().enumerate().peekable();

    while let Some((idx, line)) = lines.next() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if let Some(rest) = trimmed.strip_prefix('%') {
            let start_line = idx + 1;
            if let Some(payload) = rest.strip_suffix('%') {
                statements.push(Statement {
                    text: StatementText::Extended(payload.to_string()),
                    line: start_line,
                });
                continue;
            }

            let mut payload = rest.to_string();
            loop {
                match lines.next() {
                    Some((_, next_line)) => {
                        let next_trimmed = next_line.trim();
                        if let Some(closing) = next_trimmed.strip_suffix('%') {
                            payload.push_str(closing);
                            break;
                        }
                        payload.push_str(next_trimmed);
                    }
                    None => {
                        // Unterminated delimiter region: hand back whatever
                        // was accumulated; the dispatcher will fail to
                        // classify it and report a lexical error.
                        break;
                    }
                }
            }

            statements.push(Statement {
                text: StatementText::Extended(payload),
                line: start_line,
            });
        } else {
            statements.push(Statement {
                text: StatementText::Word(trimmed),
                line: idx + 1,
            });
        }
    }

    statements
}
