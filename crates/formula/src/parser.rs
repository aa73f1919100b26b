use crate::ast::{BinaryOp, Expr, Function, Symbol};
use crate::error::FormulaError;
use crate::lexer::{Token, TokenKind, tokenize};

/// Parses a formula into an expression tree.
///
/// Grammar, loosest binding first:
///
/// ```text
/// expr    := term (('+' | '-') term)*
/// term    := unary (('*' | '/') unary)*
/// unary   := ('+' | '-') unary | power
/// power   := primary (('^' | '**') unary)?
/// primary := number | symbol | function '(' expr (',' expr)* ')' | '(' expr ')'
/// ```
pub fn parse(src: &str) -> Result<Expr, FormulaError> {
    let tokens = tokenize(src)?;
    if tokens.is_empty() {
        return Err(FormulaError::syntax(src, 0, "empty formula"));
    }

    let mut parser = Parser {
        src,
        tokens,
        pos: 0,
    };
    let expr = parser.expr()?;
    if let Some(token) = parser.peek() {
        return Err(parser.error_at(token, format!("unexpected '{}'", token.text)));
    }
    Ok(expr)
}

struct Parser<'a> {
    src: &'a str,
    tokens: Vec<Token<'a>>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token<'a>> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|t| t.kind)
    }

    fn advance(&mut self) -> Option<Token<'a>> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn error_at(&self, token: &Token<'_>, reason: impl Into<String>) -> FormulaError {
        FormulaError::syntax(self.src, token.span.start, reason)
    }

    fn error_at_end(&self, reason: impl Into<String>) -> FormulaError {
        FormulaError::syntax(self.src, self.src.len(), reason)
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<(), FormulaError> {
        match self.advance() {
            Some(token) if token.kind == kind => Ok(()),
            Some(token) => Err(self.error_at(&token, format!("expected {what}, found '{}'", token.text))),
            None => Err(self.error_at_end(format!("expected {what}"))),
        }
    }

    fn expr(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.term()?;
        while let Some(op) = match self.peek_kind() {
            Some(TokenKind::Plus) => Some(BinaryOp::Add),
            Some(TokenKind::Minus) => Some(BinaryOp::Sub),
            _ => None,
        } {
            self.pos += 1;
            let rhs = self.term()?;
            lhs = Expr::binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn term(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.unary()?;
        while let Some(op) = match self.peek_kind() {
            Some(TokenKind::Star) => Some(BinaryOp::Mul),
            Some(TokenKind::Slash) => Some(BinaryOp::Div),
            _ => None,
        } {
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = Expr::binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, FormulaError> {
        match self.peek_kind() {
            Some(TokenKind::Minus) => {
                self.pos += 1;
                Ok(Expr::neg(self.unary()?))
            }
            Some(TokenKind::Plus) => {
                self.pos += 1;
                self.unary()
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> Result<Expr, FormulaError> {
        let base = self.primary()?;
        if self.peek_kind() == Some(TokenKind::Caret) {
            self.pos += 1;
            // Right associative: `a^b^c` is `a^(b^c)`, and `a^-1` is allowed.
            let exponent = self.unary()?;
            return Ok(Expr::binary(BinaryOp::Pow, base, exponent));
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<Expr, FormulaError> {
        let Some(token) = self.advance() else {
            return Err(self.error_at_end("unexpected end of formula"));
        };

        match token.kind {
            TokenKind::Number(value) => Ok(Expr::Number(value)),
            TokenKind::LParen => {
                let inner = self.expr()?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(inner)
            }
            TokenKind::Ident => {
                if self.peek_kind() == Some(TokenKind::LParen) {
                    let func = Function::from_name(token.text).ok_or_else(|| {
                        self.error_at(&token, format!("unknown function '{}'", token.text))
                    })?;
                    self.call(func, &token)
                } else {
                    Symbol::from_name(token.text).map(Expr::Var).ok_or_else(|| {
                        self.error_at(
                            &token,
                            format!("unknown symbol '{}' (expected S, B, ES or EB)", token.text),
                        )
                    })
                }
            }
            _ => Err(self.error_at(&token, format!("unexpected '{}'", token.text))),
        }
    }

    fn call(&mut self, func: Function, name: &Token<'a>) -> Result<Expr, FormulaError> {
        self.expect(TokenKind::LParen, "'('")?;
        let mut args = vec![self.expr()?];
        while self.peek_kind() == Some(TokenKind::Comma) {
            self.pos += 1;
            args.push(self.expr()?);
        }
        self.expect(TokenKind::RParen, "')'")?;

        if args.len() != func.arity() {
            return Err(self.error_at(
                name,
                format!(
                    "{}() takes {} argument(s), {} given",
                    func.name(),
                    func.arity(),
                    args.len()
                ),
            ));
        }
        Ok(Expr::Call(func, args))
    }
}
