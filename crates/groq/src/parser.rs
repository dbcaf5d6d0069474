use serde_json::Value;

use crate::ast::{BinaryOp, Expr, OrderKey, Projected, Stage};
use crate::lexer::{tokenize, LexError, Punct, SpannedToken, Token};

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("lex error: {0}")]
    Lex(#[from] LexError),
    #[error("unexpected {found}, expected {expected}")]
    UnexpectedToken { found: String, expected: String },
    #[error("unexpected end of input")]
    UnexpectedEof,
    #[error("trailing input after expression: {0}")]
    TrailingInput(String),
}

/// Parse a GROQ query string into an AST.
pub fn parse(input: &str) -> Result<Expr, ParseError> {
    let mut parser = Parser {
        tokens: tokenize(input)?,
        pos: 0,
    };
    let expr = parser.expression(0)?;
    match parser.peek() {
        Token::Eof => Ok(expr),
        other => Err(ParseError::TrailingInput(other.to_string())),
    }
}

struct Parser {
    tokens: Vec<SpannedToken>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).map_or(&Token::Eof, |t| &t.token)
    }

    fn bump(&mut self) -> Token {
        let token = self.peek().clone();
        self.pos += 1;
        token
    }

    fn eat(&mut self, punct: Punct) -> bool {
        let found = self.peek() == &Token::Punct(punct);
        if found {
            self.pos += 1;
        }
        found
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        let found = matches!(self.peek(), Token::Ident(name) if name == keyword);
        if found {
            self.pos += 1;
        }
        found
    }

    fn expect(&mut self, punct: Punct) -> Result<(), ParseError> {
        if self.eat(punct) {
            Ok(())
        } else {
            Err(self.unexpected(punct.as_str()))
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        match self.peek() {
            Token::Eof => ParseError::UnexpectedEof,
            found => ParseError::UnexpectedToken {
                found: found.to_string(),
                expected: expected.to_string(),
            },
        }
    }

    fn field_name(&mut self) -> Result<String, ParseError> {
        match self.peek() {
            Token::Ident(name) => {
                let name = name.clone();
                self.pos += 1;
                Ok(name)
            }
            _ => Err(self.unexpected("attribute name")),
        }
    }

    fn binary_op(&self) -> Option<BinaryOp> {
        Some(match self.peek() {
            Token::Punct(Punct::OrOr) => BinaryOp::Or,
            Token::Punct(Punct::AndAnd) => BinaryOp::And,
            Token::Punct(Punct::EqEq) => BinaryOp::Eq,
            Token::Punct(Punct::NotEq) => BinaryOp::Neq,
            Token::Punct(Punct::Lt) => BinaryOp::Lt,
            Token::Punct(Punct::Gt) => BinaryOp::Gt,
            Token::Punct(Punct::Lte) => BinaryOp::Lte,
            Token::Punct(Punct::Gte) => BinaryOp::Gte,
            Token::Ident(name) if name == "in" => BinaryOp::In,
            _ => return None,
        })
    }

    /// Precedence climbing; every operator is left-associative.
    fn expression(&mut self, min_precedence: u8) -> Result<Expr, ParseError> {
        let mut left = self.unary()?;
        while let Some(op) = self.binary_op() {
            let precedence = op.precedence();
            if precedence < min_precedence {
                break;
            }
            self.pos += 1;
            let right = self.expression(precedence + 1)?;
            left = Expr::binary(op, left, right);
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<Expr, ParseError> {
        if self.eat(Punct::Bang) {
            return Ok(Expr::Not(Box::new(self.unary()?)));
        }
        let primary = self.primary()?;
        self.postfix(primary)
    }

    fn postfix(&mut self, mut expr: Expr) -> Result<Expr, ParseError> {
        loop {
            if self.eat(Punct::Dot) {
                expr = Expr::Attribute(Box::new(expr), self.field_name()?);
            } else if self.eat(Punct::Arrow) {
                expr = Expr::Deref(Box::new(expr), self.field_name()?);
            } else {
                return Ok(expr);
            }
        }
    }

    fn primary(&mut self) -> Result<Expr, ParseError> {
        match self.bump() {
            Token::Punct(Punct::Star) => self.pipeline(Expr::Everything),
            Token::Punct(Punct::At) => Ok(Expr::This),
            Token::Punct(Punct::Caret) => Ok(Expr::Parent),
            Token::Punct(Punct::LParen) => {
                let inner = self.expression(0)?;
                self.expect(Punct::RParen)?;
                Ok(inner)
            }
            Token::Punct(Punct::LBracket) => {
                Ok(Expr::Array(self.list(Punct::RBracket)?))
            }
            Token::Param(name) => Ok(Expr::Param(name)),
            Token::Str(s) => Ok(Expr::Literal(Value::String(s))),
            Token::Int(n) => Ok(Expr::Literal(n.into())),
            Token::Float(n) => Ok(Expr::Literal(n.into())),
            Token::Ident(name) => Ok(match name.as_str() {
                "true" => Expr::Literal(Value::Bool(true)),
                "false" => Expr::Literal(Value::Bool(false)),
                "null" => Expr::Literal(Value::Null),
                _ if self.eat(Punct::LParen) => Expr::Call(name, self.list(Punct::RParen)?),
                _ => Expr::Ident(name),
            }),
            Token::Eof => Err(ParseError::UnexpectedEof),
            other => Err(ParseError::UnexpectedToken {
                found: other.to_string(),
                expected: "expression".to_string(),
            }),
        }
    }

    /// Comma-separated expressions up to `close`; a trailing comma is allowed.
    fn list(&mut self, close: Punct) -> Result<Vec<Expr>, ParseError> {
        let mut items = Vec::new();
        while !self.eat(close) {
            items.push(self.expression(0)?);
            if !self.eat(Punct::Comma) {
                self.expect(close)?;
                break;
            }
        }
        Ok(items)
    }

    fn pipeline(&mut self, source: Expr) -> Result<Expr, ParseError> {
        let mut stages = Vec::new();
        loop {
            if self.eat(Punct::LBracket) {
                let predicate = self.expression(0)?;
                self.expect(Punct::RBracket)?;
                stages.push(Stage::Filter(predicate));
            } else if self.eat(Punct::LBrace) {
                stages.push(Stage::Projection(self.projection()?));
            } else if self.eat(Punct::Pipe) {
                stages.push(self.order()?);
            } else {
                break;
            }
        }
        Ok(if stages.is_empty() {
            source
        } else {
            Expr::Pipeline(Box::new(source), stages)
        })
    }

    fn projection(&mut self) -> Result<Vec<Projected>, ParseError> {
        let mut fields = Vec::new();
        while !self.eat(Punct::RBrace) {
            if self.eat(Punct::Ellipsis) {
                fields.push(Projected::Spread);
            } else {
                fields.push(self.projected_field()?);
            }
            if !self.eat(Punct::Comma) {
                self.expect(Punct::RBrace)?;
                break;
            }
        }
        Ok(fields)
    }

    fn projected_field(&mut self) -> Result<Projected, ParseError> {
        match self.peek().clone() {
            Token::Str(alias) => {
                self.pos += 1;
                self.expect(Punct::Colon)?;
                Ok(Projected::Field(alias, self.expression(0)?))
            }
            Token::Ident(name) => {
                if matches!(self.tokens.get(self.pos + 1), Some(t) if t.token == Token::Punct(Punct::Colon)) {
                    self.pos += 2;
                    return Ok(Projected::Field(name, self.expression(0)?));
                }
                let value = self.expression(0)?;
                let name = match &value {
                    Expr::Attribute(_, field) => field.clone(),
                    _ => name,
                };
                Ok(Projected::Field(name, value))
            }
            _ => Err(self.unexpected("projection field")),
        }
    }

    fn order(&mut self) -> Result<Stage, ParseError> {
        if !self.eat_keyword("order") {
            return Err(self.unexpected("order(...)"));
        }
        self.expect(Punct::LParen)?;
        let mut keys = Vec::new();
        loop {
            let expr = self.expression(0)?;
            let descending = self.eat_keyword("desc");
            if !descending {
                self.eat_keyword("asc");
            }
            keys.push(OrderKey { expr, descending });
            if !self.eat(Punct::Comma) {
                break;
            }
        }
        self.expect(Punct::RParen)?;
        Ok(Stage::Order(keys))
    }
}
