//! Tokenizer for Python source.
//!
//! Produces just enough structure to walk import statements: names,
//! string literals, brackets, a few punctuation marks, and logical line
//! ends. Anything the tokenizer cannot make sense of is a [`SyntaxError`],
//! which sends the extractor down the regex fallback path.

use super::SyntaxError;

/// A lexical token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifier or keyword.
    Name(String),
    /// String literal. `plain` is false for f-strings, byte strings and
    /// literals containing escapes, whose runtime value is not the text.
    Str { value: String, plain: bool },
    /// Numeric literal.
    Number,
    Open(char),
    Close(char),
    Dot,
    Comma,
    Colon,
    Semicolon,
    /// Any other operator, as written. Adjacent operator characters form
    /// one token.
    Op(String),
    /// End of a logical line.
    Newline,
}

/// A token with its 1-based source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
}

/// Characters that may appear in operators.
const OPERATOR_CHARS: &str = "+-*/%@&|^~<>=!";

/// Tokenize a whole source text.
pub fn tokenize(source: &str) -> Result<Vec<Token>, SyntaxError> {
    Lexer::new(source).run()
}

struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    source: &'a str,
    line: usize,
    brackets: Vec<(char, usize)>,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            chars: source.char_indices().peekable(),
            source,
            line: 1,
            brackets: Vec::new(),
            tokens: Vec::new(),
        }
    }

    fn error(&self, message: impl Into<String>) -> SyntaxError {
        SyntaxError {
            line: self.line,
            message: message.into(),
        }
    }

    fn push(&mut self, kind: TokenKind) {
        self.tokens.push(Token {
            kind,
            line: self.line,
        });
    }

    fn push_newline(&mut self) {
        let redundant = matches!(
            self.tokens.last(),
            None | Some(Token {
                kind: TokenKind::Newline,
                ..
            })
        );
        if !redundant {
            self.push(TokenKind::Newline);
        }
    }

    fn run(mut self) -> Result<Vec<Token>, SyntaxError> {
        while let Some((idx, ch)) = self.chars.next() {
            match ch {
                '\n' => {
                    if self.brackets.is_empty() {
                        self.push_newline();
                    }
                    self.line += 1;
                }
                ' ' | '\t' | '\r' | '\x0c' => {}
                '#' => {
                    while let Some(&(_, c)) = self.chars.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.chars.next();
                    }
                }
                '\\' => match self.chars.next() {
                    Some((_, '\n')) => self.line += 1,
                    Some((_, '\r')) if matches!(self.chars.peek(), Some((_, '\n'))) => {
                        self.chars.next();
                        self.line += 1;
                    }
                    _ => return Err(self.error("unexpected character after line continuation")),
                },
                '\'' | '"' => self.string(ch, "")?,
                '(' | '[' | '{' => {
                    self.brackets.push((ch, self.line));
                    self.push(TokenKind::Open(ch));
                }
                ')' | ']' | '}' => {
                    let expected = match ch {
                        ')' => '(',
                        ']' => '[',
                        _ => '{',
                    };
                    match self.brackets.pop() {
                        Some((open, _)) if open == expected => self.push(TokenKind::Close(ch)),
                        Some((open, line)) => {
                            return Err(self.error(format!(
                                "closing '{}' does not match '{}' opened on line {}",
                                ch, open, line
                            )))
                        }
                        None => return Err(self.error(format!("unmatched '{}'", ch))),
                    }
                }
                '.' => {
                    if matches!(self.chars.peek(), Some((_, c)) if c.is_ascii_digit()) {
                        self.number();
                    } else {
                        self.push(TokenKind::Dot);
                    }
                }
                ',' => self.push(TokenKind::Comma),
                ':' => {
                    if matches!(self.chars.peek(), Some((_, '='))) {
                        self.chars.next();
                        self.push(TokenKind::Op(":=".to_string()));
                    } else {
                        self.push(TokenKind::Colon);
                    }
                }
                ';' => self.push(TokenKind::Semicolon),
                c if c.is_ascii_digit() => self.number(),
                c if c == '_' || c.is_alphabetic() => self.name_or_prefixed_string(idx)?,
                c if OPERATOR_CHARS.contains(c) => {
                    let mut end = idx + c.len_utf8();
                    while let Some(&(next_idx, next)) = self.chars.peek() {
                        if !OPERATOR_CHARS.contains(next) {
                            break;
                        }
                        end = next_idx + next.len_utf8();
                        self.chars.next();
                    }
                    let op = self.source[idx..end].to_string();
                    self.push(TokenKind::Op(op));
                }
                other => return Err(self.error(format!("unexpected character '{}'", other))),
            }
        }

        if let Some((open, line)) = self.brackets.last() {
            return Err(SyntaxError {
                line: *line,
                message: format!("'{}' was never closed", open),
            });
        }

        self.push_newline();
        Ok(self.tokens)
    }

    fn number(&mut self) {
        while let Some(&(_, c)) = self.chars.peek() {
            if c.is_ascii_alphanumeric() || c == '_' || c == '.' {
                self.chars.next();
            } else {
                break;
            }
        }
        self.push(TokenKind::Number);
    }

    fn name_or_prefixed_string(&mut self, start: usize) -> Result<(), SyntaxError> {
        let mut end = start + self.source[start..].chars().next().map_or(1, char::len_utf8);
        while let Some(&(idx, c)) = self.chars.peek() {
            if c == '_' || c.is_alphanumeric() {
                end = idx + c.len_utf8();
                self.chars.next();
            } else {
                break;
            }
        }

        let word = &self.source[start..end];
        if let Some(&(_, quote)) = self.chars.peek() {
            if (quote == '"' || quote == '\'') && is_string_prefix(word) {
                self.chars.next();
                return self.string(quote, word);
            }
        }

        self.push(TokenKind::Name(word.to_string()));
        Ok(())
    }

    fn string(&mut self, quote: char, prefix: &str) -> Result<(), SyntaxError> {
        let start_line = self.line;
        let prefix = prefix.to_ascii_lowercase();
        let triple = self.at_triple(quote);
        if triple {
            self.chars.next();
            self.chars.next();
        }

        let mut value = String::new();
        let mut escaped = false;
        loop {
            let Some((_, c)) = self.chars.next() else {
                return Err(SyntaxError {
                    line: start_line,
                    message: "unterminated string literal".to_string(),
                });
            };

            match c {
                '\\' => {
                    escaped = true;
                    value.push(c);
                    if let Some((_, next)) = self.chars.next() {
                        if next == '\n' {
                            self.line += 1;
                        }
                        value.push(next);
                    }
                }
                '\n' if !triple => {
                    return Err(SyntaxError {
                        line: start_line,
                        message: "unterminated string literal".to_string(),
                    })
                }
                '\n' => {
                    self.line += 1;
                    value.push(c);
                }
                c if c == quote => {
                    if !triple {
                        break;
                    }
                    if self.at_triple(quote) {
                        self.chars.next();
                        self.chars.next();
                        break;
                    }
                    value.push(c);
                }
                c => value.push(c),
            }
        }

        let plain = !prefix.contains('f') && !prefix.contains('b') && !escaped;
        self.push(TokenKind::Str { value, plain });
        Ok(())
    }

    /// Next two characters are both `quote`.
    fn at_triple(&self, quote: char) -> bool {
        let mut ahead = self.chars.clone();
        matches!(ahead.next(), Some((_, c)) if c == quote)
            && matches!(ahead.next(), Some((_, c)) if c == quote)
    }
}

fn is_string_prefix(word: &str) -> bool {
    matches!(
        word.to_ascii_lowercase().as_str(),
        "r" | "u" | "b" | "f" | "br" | "rb" | "fr" | "rf"
    )
}
