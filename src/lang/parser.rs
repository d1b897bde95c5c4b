//! Lexer and recursive-descent parser for the subject language.
//!
//! Source that fails to lex or parse is rejected with a `Parse` error; the
//! engine treats that as fatal for the affected function only.

use std::sync::Arc;

use crate::core::{Error, Result};

use super::ast::{BinOp, Block, CmpOp, Expr, FunctionDef, LogicOp, Stmt, UnaryOp};

/// Parse a source text containing one or more function definitions and
/// return the last one. Trailing garbage after the final definition is an
/// error.
pub fn parse_function(source: &str) -> Result<FunctionDef> {
    let tokens = lex(source)?;
    let mut parser = Parser::new(tokens);
    let mut last = None;
    while !parser.at_end() {
        last = Some(parser.function()?);
    }
    last.ok_or_else(|| Error::parse("<input>", "no function definition found"))
}

/// Parse an assertion: a single expression, optionally prefixed with the
/// `assert` keyword and optionally terminated with `;`.
pub fn parse_assertion(source: &str) -> Result<Arc<Expr>> {
    let tokens = lex(source)?;
    let mut parser = Parser::new(tokens);
    if parser.check_ident("assert") {
        parser.advance();
    }
    let expr = parser.expression()?;
    if parser.check(&Tok::Semi) {
        parser.advance();
    }
    if !parser.at_end() {
        return Err(parser.error("unexpected trailing input after assertion"));
    }
    Ok(expr)
}

// ---------------------------------------------------------------------------
// Lexer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Ident(String),
    Int(i64),
    Float(f64),
    Str(String),
    // Punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Semi,
    Assign,
    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone)]
struct Token {
    tok: Tok,
    line: u32,
}

fn lex(source: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = source.chars().peekable();
    let mut line: u32 = 1;

    while let Some(&c) = chars.peek() {
        match c {
            '\n' => {
                line += 1;
                chars.next();
            }
            c if c.is_whitespace() => {
                chars.next();
            }
            '#' => {
                // Line comment.
                for c in chars.by_ref() {
                    if c == '\n' {
                        line += 1;
                        break;
                    }
                }
            }
            '(' => push(&mut tokens, Tok::LParen, line, &mut chars),
            ')' => push(&mut tokens, Tok::RParen, line, &mut chars),
            '{' => push(&mut tokens, Tok::LBrace, line, &mut chars),
            '}' => push(&mut tokens, Tok::RBrace, line, &mut chars),
            '[' => push(&mut tokens, Tok::LBracket, line, &mut chars),
            ']' => push(&mut tokens, Tok::RBracket, line, &mut chars),
            ',' => push(&mut tokens, Tok::Comma, line, &mut chars),
            ';' => push(&mut tokens, Tok::Semi, line, &mut chars),
            '+' => push(&mut tokens, Tok::Plus, line, &mut chars),
            '-' => push(&mut tokens, Tok::Minus, line, &mut chars),
            '*' => push(&mut tokens, Tok::Star, line, &mut chars),
            '/' => push(&mut tokens, Tok::Slash, line, &mut chars),
            '%' => push(&mut tokens, Tok::Percent, line, &mut chars),
            '=' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token {
                        tok: Tok::EqEq,
                        line,
                    });
                } else {
                    tokens.push(Token {
                        tok: Tok::Assign,
                        line,
                    });
                }
            }
            '!' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token {
                        tok: Tok::NotEq,
                        line,
                    });
                } else {
                    return Err(lex_error(line, "expected `!=`"));
                }
            }
            '<' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token { tok: Tok::Le, line });
                } else {
                    tokens.push(Token { tok: Tok::Lt, line });
                }
            }
            '>' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token { tok: Tok::Ge, line });
                } else {
                    tokens.push(Token { tok: Tok::Gt, line });
                }
            }
            '"' => {
                chars.next();
                let mut s = String::new();
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some('n') => s.push('\n'),
                            Some('t') => s.push('\t'),
                            Some('\\') => s.push('\\'),
                            Some('"') => s.push('"'),
                            _ => return Err(lex_error(line, "invalid escape sequence")),
                        },
                        Some('\n') | None => {
                            return Err(lex_error(line, "unterminated string literal"))
                        }
                        Some(c) => s.push(c),
                    }
                }
                tokens.push(Token {
                    tok: Tok::Str(s),
                    line,
                });
            }
            c if c.is_ascii_digit() => {
                let mut text = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() {
                        text.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let mut is_float = false;
                if chars.peek() == Some(&'.') {
                    // Only a float if a digit follows the dot.
                    let mut lookahead = chars.clone();
                    lookahead.next();
                    if lookahead.peek().is_some_and(|d| d.is_ascii_digit()) {
                        is_float = true;
                        text.push('.');
                        chars.next();
                        while let Some(&d) = chars.peek() {
                            if d.is_ascii_digit() {
                                text.push(d);
                                chars.next();
                            } else {
                                break;
                            }
                        }
                    }
                }
                let tok = if is_float {
                    Tok::Float(
                        text.parse::<f64>()
                            .map_err(|_| lex_error(line, "invalid float literal"))?,
                    )
                } else {
                    Tok::Int(
                        text.parse::<i64>()
                            .map_err(|_| lex_error(line, "integer literal out of range"))?,
                    )
                };
                tokens.push(Token { tok, line });
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut ident = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_alphanumeric() || d == '_' {
                        ident.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token {
                    tok: Tok::Ident(ident),
                    line,
                });
            }
            other => {
                return Err(lex_error(line, format!("unexpected character `{other}`")));
            }
        }
    }
    Ok(tokens)
}

fn push(
    tokens: &mut Vec<Token>,
    tok: Tok,
    line: u32,
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
) {
    chars.next();
    tokens.push(Token { tok, line });
}

fn lex_error(line: u32, message: impl Into<String>) -> Error {
    Error::parse("<input>", format!("line {line}: {}", message.into()))
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<&Tok> {
        self.tokens.get(self.pos).map(|t| &t.tok)
    }

    fn advance(&mut self) -> Option<&Tok> {
        let tok = self.tokens.get(self.pos).map(|t| &t.tok);
        self.pos += 1;
        tok
    }

    fn check(&self, expected: &Tok) -> bool {
        self.peek() == Some(expected)
    }

    fn check_ident(&self, word: &str) -> bool {
        matches!(self.peek(), Some(Tok::Ident(w)) if w == word)
    }

    fn eat(&mut self, expected: Tok, what: &str) -> Result<()> {
        if self.check(&expected) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(format!("expected {what}")))
        }
    }

    fn eat_keyword(&mut self, word: &str) -> Result<()> {
        if self.check_ident(word) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(format!("expected `{word}`")))
        }
    }

    fn ident(&mut self, what: &str) -> Result<String> {
        match self.peek() {
            Some(Tok::Ident(name)) => {
                let name = name.clone();
                self.pos += 1;
                Ok(name)
            }
            _ => Err(self.error(format!("expected {what}"))),
        }
    }

    fn error(&self, message: impl Into<String>) -> Error {
        let line = self
            .tokens
            .get(self.pos.min(self.tokens.len().saturating_sub(1)))
            .map(|t| t.line)
            .unwrap_or(0);
        Error::parse("<input>", format!("line {line}: {}", message.into()))
    }

    fn function(&mut self) -> Result<FunctionDef> {
        self.eat_keyword("fn")?;
        let name = self.ident("function name")?;
        if is_reserved(&name) {
            return Err(self.error(format!("`{name}` is a reserved word")));
        }
        self.eat(Tok::LParen, "`(`")?;
        let mut params: Vec<Arc<str>> = Vec::new();
        if !self.check(&Tok::RParen) {
            loop {
                let p = self.ident("parameter name")?;
                if is_reserved(&p) {
                    return Err(self.error(format!("`{p}` is a reserved word")));
                }
                params.push(Arc::from(p.as_str()));
                if self.check(&Tok::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.eat(Tok::RParen, "`)`")?;
        let body = self.block()?;
        Ok(FunctionDef {
            name: Arc::from(name.as_str()),
            params: Arc::from(params),
            body,
        })
    }

    fn block(&mut self) -> Result<Block> {
        self.eat(Tok::LBrace, "`{`")?;
        let mut stmts: Vec<Arc<Stmt>> = Vec::new();
        while !self.check(&Tok::RBrace) {
            if self.at_end() {
                return Err(self.error("unterminated block, expected `}`"));
            }
            stmts.push(Arc::new(self.statement()?));
        }
        self.eat(Tok::RBrace, "`}`")?;
        Ok(Arc::from(stmts))
    }

    fn statement(&mut self) -> Result<Stmt> {
        if self.check_ident("let") {
            self.advance();
            let name = self.ident("binding name")?;
            self.eat(Tok::Assign, "`=`")?;
            let value = self.expression()?;
            self.eat(Tok::Semi, "`;`")?;
            return Ok(Stmt::Let(Arc::from(name.as_str()), value));
        }
        if self.check_ident("if") {
            return self.if_statement();
        }
        if self.check_ident("while") {
            self.advance();
            let cond = self.expression()?;
            let body = self.block()?;
            return Ok(Stmt::While { cond, body });
        }
        if self.check_ident("for") {
            self.advance();
            let var = self.ident("loop variable")?;
            self.eat_keyword("in")?;
            self.eat_keyword("range")?;
            self.eat(Tok::LParen, "`(`")?;
            let count = self.expression()?;
            self.eat(Tok::RParen, "`)`")?;
            let body = self.block()?;
            return Ok(Stmt::For {
                var: Arc::from(var.as_str()),
                count,
                body,
            });
        }
        if self.check_ident("return") {
            self.advance();
            if self.check(&Tok::Semi) {
                self.advance();
                return Ok(Stmt::Return(None));
            }
            let value = self.expression()?;
            self.eat(Tok::Semi, "`;`")?;
            return Ok(Stmt::Return(Some(value)));
        }
        // Assignment (`name = expr;`) or bare expression statement.
        if let Some(Tok::Ident(name)) = self.peek() {
            if !is_reserved(name) && self.tokens.get(self.pos + 1).map(|t| &t.tok) == Some(&Tok::Assign)
            {
                let name = name.clone();
                self.advance();
                self.advance();
                let value = self.expression()?;
                self.eat(Tok::Semi, "`;`")?;
                return Ok(Stmt::Assign(Arc::from(name.as_str()), value));
            }
        }
        let value = self.expression()?;
        self.eat(Tok::Semi, "`;`")?;
        Ok(Stmt::Expr(value))
    }

    fn if_statement(&mut self) -> Result<Stmt> {
        self.eat_keyword("if")?;
        let cond = self.expression()?;
        let then_body = self.block()?;
        let else_body = if self.check_ident("else") {
            self.advance();
            if self.check_ident("if") {
                let nested = self.if_statement()?;
                Some(Arc::from(vec![Arc::new(nested)]))
            } else {
                Some(self.block()?)
            }
        } else {
            None
        };
        Ok(Stmt::If {
            cond,
            then_body,
            else_body,
        })
    }

    fn expression(&mut self) -> Result<Arc<Expr>> {
        self.or_expr()
    }

    fn or_expr(&mut self) -> Result<Arc<Expr>> {
        let mut lhs = self.and_expr()?;
        while self.check_ident("or") {
            self.advance();
            let rhs = self.and_expr()?;
            lhs = Arc::new(Expr::Logic(LogicOp::Or, lhs, rhs));
        }
        Ok(lhs)
    }

    fn and_expr(&mut self) -> Result<Arc<Expr>> {
        let mut lhs = self.not_expr()?;
        while self.check_ident("and") {
            self.advance();
            let rhs = self.not_expr()?;
            lhs = Arc::new(Expr::Logic(LogicOp::And, lhs, rhs));
        }
        Ok(lhs)
    }

    fn not_expr(&mut self) -> Result<Arc<Expr>> {
        if self.check_ident("not") {
            self.advance();
            let operand = self.not_expr()?;
            return Ok(Arc::new(Expr::Unary(UnaryOp::Not, operand)));
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Arc<Expr>> {
        let lhs = self.additive()?;
        let op = match self.peek() {
            Some(Tok::EqEq) => Some(CmpOp::Eq),
            Some(Tok::NotEq) => Some(CmpOp::Ne),
            Some(Tok::Lt) => Some(CmpOp::Lt),
            Some(Tok::Le) => Some(CmpOp::Le),
            Some(Tok::Gt) => Some(CmpOp::Gt),
            Some(Tok::Ge) => Some(CmpOp::Ge),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let rhs = self.additive()?;
            return Ok(Arc::new(Expr::Compare(op, lhs, rhs)));
        }
        Ok(lhs)
    }

    fn additive(&mut self) -> Result<Arc<Expr>> {
        let mut lhs = self.multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Tok::Plus) => BinOp::Add,
                Some(Tok::Minus) => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.multiplicative()?;
            lhs = Arc::new(Expr::Binary(op, lhs, rhs));
        }
        Ok(lhs)
    }

    fn multiplicative(&mut self) -> Result<Arc<Expr>> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Tok::Star) => BinOp::Mul,
                Some(Tok::Slash) => BinOp::Div,
                Some(Tok::Percent) => BinOp::Mod,
                _ => break,
            };
            self.advance();
            let rhs = self.unary()?;
            lhs = Arc::new(Expr::Binary(op, lhs, rhs));
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Arc<Expr>> {
        if self.check(&Tok::Minus) {
            self.advance();
            let operand = self.unary()?;
            // Fold a negated numeric literal into a negative literal, so
            // printed trees reparse to identical structure.
            return Ok(match &*operand {
                Expr::Int(n) => Arc::new(Expr::Int(-n)),
                Expr::Float(x) => Arc::new(Expr::Float(-x)),
                _ => Arc::new(Expr::Unary(UnaryOp::Neg, operand)),
            });
        }
        self.postfix()
    }

    fn postfix(&mut self) -> Result<Arc<Expr>> {
        let mut expr = self.primary()?;
        loop {
            if self.check(&Tok::LParen) {
                let name = match &*expr {
                    Expr::Name(name) => name.clone(),
                    _ => return Err(self.error("only named functions can be called")),
                };
                self.advance();
                let mut args: Vec<Arc<Expr>> = Vec::new();
                if !self.check(&Tok::RParen) {
                    loop {
                        args.push(self.expression()?);
                        if self.check(&Tok::Comma) {
                            self.advance();
                        } else {
                            break;
                        }
                    }
                }
                self.eat(Tok::RParen, "`)`")?;
                expr = Arc::new(Expr::Call(name, Arc::from(args)));
            } else if self.check(&Tok::LBracket) {
                self.advance();
                let index = self.expression()?;
                self.eat(Tok::RBracket, "`]`")?;
                expr = Arc::new(Expr::Index(expr, index));
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn primary(&mut self) -> Result<Arc<Expr>> {
        match self.peek().cloned() {
            Some(Tok::Int(n)) => {
                self.advance();
                Ok(Arc::new(Expr::Int(n)))
            }
            Some(Tok::Float(x)) => {
                self.advance();
                Ok(Arc::new(Expr::Float(x)))
            }
            Some(Tok::Str(s)) => {
                self.advance();
                Ok(Arc::new(Expr::Str(Arc::from(s.as_str()))))
            }
            Some(Tok::LParen) => {
                self.advance();
                let inner = self.expression()?;
                self.eat(Tok::RParen, "`)`")?;
                Ok(inner)
            }
            Some(Tok::LBracket) => {
                self.advance();
                let mut items: Vec<Arc<Expr>> = Vec::new();
                if !self.check(&Tok::RBracket) {
                    loop {
                        items.push(self.expression()?);
                        if self.check(&Tok::Comma) {
                            self.advance();
                        } else {
                            break;
                        }
                    }
                }
                self.eat(Tok::RBracket, "`]`")?;
                Ok(Arc::new(Expr::List(Arc::from(items))))
            }
            Some(Tok::Ident(word)) => match word.as_str() {
                "true" => {
                    self.advance();
                    Ok(Arc::new(Expr::Bool(true)))
                }
                "false" => {
                    self.advance();
                    Ok(Arc::new(Expr::Bool(false)))
                }
                "none" => {
                    self.advance();
                    Ok(Arc::new(Expr::None))
                }
                w if is_reserved(w) => Err(self.error(format!("unexpected keyword `{w}`"))),
                _ => {
                    self.advance();
                    Ok(Arc::new(Expr::Name(Arc::from(word.as_str()))))
                }
            },
            _ => Err(self.error("expected an expression")),
        }
    }
}

fn is_reserved(word: &str) -> bool {
    matches!(
        word,
        "fn" | "let"
            | "if"
            | "else"
            | "while"
            | "for"
            | "in"
            | "range"
            | "return"
            | "and"
            | "or"
            | "not"
            | "true"
            | "false"
            | "none"
            | "assert"
    )
}
