//! Logical-line walker over the token stream.

use super::lexer::{Token, TokenKind};
use super::{ImportKind, SyntaxError};

/// Callables whose single literal argument names a module.
const DYNAMIC_IMPORTERS: &[&str] = &["__import__", "import_module"];

/// Statements that must open their block with `:` on the same logical line.
const BLOCK_KEYWORDS: &[&str] = &[
    "if", "elif", "else", "for", "while", "def", "class", "try", "except", "finally", "with",
];

/// Operators that may directly follow another operator: `x = -1`, `f(**kw)`.
fn is_prefix_operator(op: &str) -> bool {
    op == "*" || op == "**" || op.chars().all(|c| matches!(c, '+' | '-' | '~'))
}

/// Walk tokens and collect every `(category, dotted name)` pair.
pub fn walk(tokens: &[Token]) -> Result<Vec<(ImportKind, String)>, SyntaxError> {
    let mut walker = Walker {
        tokens,
        pos: 0,
        found: Vec::new(),
    };
    walker.run()?;
    Ok(walker.found)
}

struct Walker<'t> {
    tokens: &'t [Token],
    pos: usize,
    found: Vec<(ImportKind, String)>,
}

impl<'t> Walker<'t> {
    fn peek(&self) -> Option<&'t TokenKind> {
        self.tokens.get(self.pos).map(|t| &t.kind)
    }

    fn peek_at(&self, idx: usize) -> Option<&'t TokenKind> {
        self.tokens.get(idx).map(|t| &t.kind)
    }

    fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(1, |t| t.line)
    }

    fn error(&self, message: &str) -> SyntaxError {
        SyntaxError {
            line: self.line(),
            message: message.to_string(),
        }
    }

    fn is_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek(), Some(TokenKind::Name(n)) if n == keyword)
    }

    fn follows_yield(&self) -> bool {
        let previous = self.pos.checked_sub(1).and_then(|i| self.peek_at(i));
        matches!(previous, Some(TokenKind::Name(n)) if n == "yield")
    }

    fn follows_operator(&self) -> bool {
        let previous = self.pos.checked_sub(1).and_then(|i| self.peek_at(i));
        matches!(previous, Some(TokenKind::Op(_)))
    }

    fn run(&mut self) -> Result<(), SyntaxError> {
        let mut depth = 0usize;
        let mut statement_start = true;
        // A block header is still waiting for its `:`.
        let mut open_header = false;

        while let Some(kind) = self.peek() {
            match kind {
                TokenKind::Name(name) if statement_start && depth == 0 && name == "import" => {
                    self.pos += 1;
                    self.import_statement()?;
                    statement_start = true;
                    continue;
                }
                TokenKind::Name(name) if statement_start && depth == 0 && name == "from" => {
                    self.pos += 1;
                    self.from_statement()?;
                    statement_start = true;
                    continue;
                }
                TokenKind::Name(name) if name == "import" => {
                    return Err(self.error("'import' outside an import statement"));
                }
                // `(yield from gen)` is the only bracketed use of `from`
                TokenKind::Name(name) if name == "from" && depth > 0 && !self.follows_yield() => {
                    return Err(self.error("'from' inside brackets"));
                }
                TokenKind::Name(name)
                    if statement_start && depth == 0 && BLOCK_KEYWORDS.contains(&name.as_str()) =>
                {
                    open_header = true;
                    statement_start = false;
                }
                TokenKind::Name(name) if DYNAMIC_IMPORTERS.contains(&name.as_str()) => {
                    self.dynamic_call(name);
                    statement_start = false;
                }
                TokenKind::Open(_) => {
                    depth += 1;
                    statement_start = false;
                }
                TokenKind::Close(_) => {
                    depth = depth.saturating_sub(1);
                    statement_start = false;
                }
                TokenKind::Op(op) => {
                    if self.follows_operator() && !is_prefix_operator(op) {
                        return Err(self.error(&format!("unexpected '{}'", op)));
                    }
                    let next = self.peek_at(self.pos + 1);
                    if matches!(next, None | Some(TokenKind::Newline | TokenKind::Semicolon)) {
                        return Err(self.error(&format!("expected an operand after '{}'", op)));
                    }
                    statement_start = false;
                }
                TokenKind::Newline | TokenKind::Semicolon => {
                    if open_header {
                        return Err(self.error("expected ':' after block header"));
                    }
                    statement_start = true;
                }
                // `if x: import y`, `try: import y`, `else: import y`
                TokenKind::Colon if depth == 0 => {
                    open_header = false;
                    statement_start = true;
                }
                _ => statement_start = false,
            }
            self.pos += 1;
        }

        if open_header {
            return Err(self.error("expected ':' after block header"));
        }
        Ok(())
    }

    /// Consume the end of a simple statement.
    fn end_of_statement(&mut self) -> Result<(), SyntaxError> {
        match self.peek() {
            Some(TokenKind::Newline) | Some(TokenKind::Semicolon) => {
                self.pos += 1;
                Ok(())
            }
            None => Ok(()),
            Some(_) => Err(self.error("invalid syntax in import statement")),
        }
    }

    fn dotted_name(&mut self) -> Result<String, SyntaxError> {
        let mut parts = Vec::new();
        loop {
            match self.peek() {
                Some(TokenKind::Name(name)) if name != "import" => {
                    parts.push(name.as_str());
                    self.pos += 1;
                }
                _ => return Err(self.error("expected module name")),
            }
            if matches!(self.peek(), Some(TokenKind::Dot)) {
                self.pos += 1;
            } else {
                break;
            }
        }
        Ok(parts.join("."))
    }

    fn optional_alias(&mut self) -> Result<(), SyntaxError> {
        if self.is_keyword("as") {
            self.pos += 1;
            match self.peek() {
                Some(TokenKind::Name(_)) => self.pos += 1,
                _ => return Err(self.error("expected name after 'as'")),
            }
        }
        Ok(())
    }

    /// `import a.b [as c], d`
    fn import_statement(&mut self) -> Result<(), SyntaxError> {
        loop {
            let name = self.dotted_name()?;
            self.optional_alias()?;
            self.found.push((ImportKind::Direct, name));
            if matches!(self.peek(), Some(TokenKind::Comma)) {
                self.pos += 1;
            } else {
                break;
            }
        }
        self.end_of_statement()
    }

    /// `from [.]*a.b import (x [as y], ...)` or `from a import *`
    fn from_statement(&mut self) -> Result<(), SyntaxError> {
        let mut relative = false;
        while matches!(self.peek(), Some(TokenKind::Dot)) {
            relative = true;
            self.pos += 1;
        }

        let module = if relative && self.is_keyword("import") {
            None
        } else {
            Some(self.dotted_name()?)
        };

        if !self.is_keyword("import") {
            return Err(self.error("expected 'import'"));
        }
        self.pos += 1;
        self.imported_names()?;

        if let (false, Some(module)) = (relative, module) {
            self.found.push((ImportKind::From, module));
        }
        self.end_of_statement()
    }

    fn imported_names(&mut self) -> Result<(), SyntaxError> {
        if matches!(self.peek(), Some(TokenKind::Op(op)) if op == "*") {
            // `*` is the only operator allowed here.
            self.pos += 1;
            return Ok(());
        }

        let parenthesized = matches!(self.peek(), Some(TokenKind::Open('(')));
        if parenthesized {
            self.pos += 1;
        }

        loop {
            match self.peek() {
                Some(TokenKind::Name(_)) => self.pos += 1,
                Some(TokenKind::Close(')')) if parenthesized => break,
                _ => return Err(self.error("expected imported name")),
            }
            self.optional_alias()?;
            if matches!(self.peek(), Some(TokenKind::Comma)) {
                self.pos += 1;
            } else {
                break;
            }
        }

        if parenthesized {
            if !matches!(self.peek(), Some(TokenKind::Close(')'))) {
                return Err(self.error("expected ')'"));
            }
            self.pos += 1;
        }
        Ok(())
    }

    /// Record `__import__("x")` / `importlib.import_module("x")` style calls.
    fn dynamic_call(&mut self, callee: &str) {
        let previous = self.pos.checked_sub(1).and_then(|i| self.peek_at(i));
        if matches!(previous, Some(TokenKind::Name(n)) if n == "def" || n == "class") {
            return;
        }
        if callee == "import_module" && matches!(previous, Some(TokenKind::Dot)) {
            let owner = self.pos.checked_sub(2).and_then(|i| self.peek_at(i));
            if !matches!(owner, Some(TokenKind::Name(n)) if n == "importlib") {
                return;
            }
        }

        let open = self.peek_at(self.pos + 1);
        let argument = self.peek_at(self.pos + 2);
        let after = self.peek_at(self.pos + 3);
        if let (
            Some(TokenKind::Open('(')),
            Some(TokenKind::Str { value, plain: true }),
            Some(TokenKind::Close(')') | TokenKind::Comma),
        ) = (open, argument, after)
        {
            let name = value.trim();
            if !name.is_empty() && !name.starts_with('.') {
                self.found.push((ImportKind::Dynamic, name.to_string()));
            }
        }
    }
}
