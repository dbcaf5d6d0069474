use std::fmt;
use std::iter::Peekable;
use std::str::CharIndices;

/// Keywords (`true`, `in`, `desc`, ...) come out as [`Token::Ident`]; the
/// parser decides what they mean in context.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Ident(String),
    /// `$name`, without the sigil.
    Param(String),
    Str(String),
    Int(i64),
    Float(f64),
    Punct(Punct),
    Eof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Punct {
    Star,
    Dot,
    Ellipsis,
    Comma,
    Colon,
    Pipe,
    Arrow,
    At,
    Caret,
    Bang,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    EqEq,
    NotEq,
    Lt,
    Gt,
    Lte,
    Gte,
    AndAnd,
    OrOr,
}

impl Punct {
    pub fn as_str(self) -> &'static str {
        match self {
            Punct::Star => "*",
            Punct::Dot => ".",
            Punct::Ellipsis => "...",
            Punct::Comma => ",",
            Punct::Colon => ":",
            Punct::Pipe => "|",
            Punct::Arrow => "->",
            Punct::At => "@",
            Punct::Caret => "^",
            Punct::Bang => "!",
            Punct::LParen => "(",
            Punct::RParen => ")",
            Punct::LBracket => "[",
            Punct::RBracket => "]",
            Punct::LBrace => "{",
            Punct::RBrace => "}",
            Punct::EqEq => "==",
            Punct::NotEq => "!=",
            Punct::Lt => "<",
            Punct::Gt => ">",
            Punct::Lte => "<=",
            Punct::Gte => ">=",
            Punct::AndAnd => "&&",
            Punct::OrOr => "||",
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(name) => f.write_str(name),
            Token::Param(name) => write!(f, "${name}"),
            Token::Str(s) => write!(f, "{s:?}"),
            Token::Int(n) => write!(f, "{n}"),
            Token::Float(n) => write!(f, "{n}"),
            Token::Punct(p) => f.write_str(p.as_str()),
            Token::Eof => f.write_str("end of input"),
        }
    }
}

/// Byte range in the query text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub span: Span,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum LexError {
    #[error("unexpected character '{0}' at byte {1}")]
    UnexpectedChar(char, usize),
    #[error("unterminated string starting at byte {0}")]
    UnterminatedString(usize),
    #[error("invalid number '{0}' at byte {1}")]
    InvalidNumber(String, usize),
}

/// Split a query into tokens. The last token is always [`Token::Eof`].
pub fn tokenize(input: &str) -> Result<Vec<SpannedToken>, LexError> {
    let mut lexer = Lexer {
        src: input,
        chars: input.char_indices().peekable(),
    };
    let mut tokens = Vec::new();
    loop {
        let next = lexer.next_token()?;
        let done = next.token == Token::Eof;
        tokens.push(next);
        if done {
            return Ok(tokens);
        }
    }
}

struct Lexer<'a> {
    src: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Lexer<'a> {
    fn next_token(&mut self) -> Result<SpannedToken, LexError> {
        self.skip_trivia();
        let Some((start, ch)) = self.chars.next() else {
            let end = self.src.len();
            return Ok(SpannedToken {
                token: Token::Eof,
                span: Span { start: end, end },
            });
        };

        let token = match ch {
            '"' | '\'' => self.string(ch, start)?,
            '$' => match self.word(start + 1) {
                "" => return Err(LexError::UnexpectedChar('$', start)),
                name => Token::Param(name.to_string()),
            },
            '-' if self.peek_is(|c| c.is_ascii_digit()) => self.number(start)?,
            c if c.is_ascii_digit() => self.number(start)?,
            c if c.is_alphabetic() || c == '_' => Token::Ident(self.word(start).to_string()),
            _ => Token::Punct(self.punct(ch, start)?),
        };

        Ok(SpannedToken {
            token,
            span: Span {
                start,
                end: self.offset(),
            },
        })
    }

    fn offset(&mut self) -> usize {
        self.chars.peek().map_or(self.src.len(), |&(i, _)| i)
    }

    fn rest(&mut self) -> &'a str {
        let src = self.src;
        &src[self.offset()..]
    }

    fn peek_is(&mut self, pred: impl FnOnce(char) -> bool) -> bool {
        self.chars.peek().is_some_and(|&(_, c)| pred(c))
    }

    fn eat(&mut self, expected: char) -> bool {
        self.chars.next_if(|&(_, c)| c == expected).is_some()
    }

    fn skip_trivia(&mut self) {
        loop {
            while self.chars.next_if(|&(_, c)| c.is_whitespace()).is_some() {}
            if !self.rest().starts_with("//") {
                return;
            }
            while self.chars.next_if(|&(_, c)| c != '\n').is_some() {}
        }
    }

    /// Identifier characters from the current position; `start` is where the
    /// word began (before any already consumed first character).
    fn word(&mut self, start: usize) -> &'a str {
        while self
            .chars
            .next_if(|&(_, c)| c.is_alphanumeric() || c == '_')
            .is_some()
        {}
        let src = self.src;
        &src[start..self.offset()]
    }

    fn digits(&mut self) {
        while self.chars.next_if(|&(_, c)| c.is_ascii_digit()).is_some() {}
    }

    fn number(&mut self, start: usize) -> Result<Token, LexError> {
        self.digits();
        let rest = self.rest();
        let fractional = rest.starts_with('.') && rest[1..].starts_with(|c: char| c.is_ascii_digit());
        if fractional {
            self.chars.next();
            self.digits();
        }

        let src = self.src;
        let text = &src[start..self.offset()];
        let invalid = || LexError::InvalidNumber(text.to_string(), start);
        if fractional {
            text.parse().map(Token::Float).map_err(|_| invalid())
        } else {
            text.parse().map(Token::Int).map_err(|_| invalid())
        }
    }

    fn string(&mut self, quote: char, start: usize) -> Result<Token, LexError> {
        let mut out = String::new();
        loop {
            match self.chars.next() {
                None => return Err(LexError::UnterminatedString(start)),
                Some((_, c)) if c == quote => return Ok(Token::Str(out)),
                Some((_, '\\')) => match self.chars.next() {
                    Some((_, 'n')) => out.push('\n'),
                    Some((_, 't')) => out.push('\t'),
                    Some((_, 'r')) => out.push('\r'),
                    Some((_, other)) => out.push(other),
                    None => return Err(LexError::UnterminatedString(start)),
                },
                Some((_, c)) => out.push(c),
            }
        }
    }

    fn punct(&mut self, ch: char, start: usize) -> Result<Punct, LexError> {
        let punct = match ch {
            '*' => Punct::Star,
            ',' => Punct::Comma,
            ':' => Punct::Colon,
            '@' => Punct::At,
            '^' => Punct::Caret,
            '(' => Punct::LParen,
            ')' => Punct::RParen,
            '[' => Punct::LBracket,
            ']' => Punct::RBracket,
            '{' => Punct::LBrace,
            '}' => Punct::RBrace,
            '.' if self.rest().starts_with("..") => {
                self.chars.nth(1);
                Punct::Ellipsis
            }
            '.' => Punct::Dot,
            '|' if self.eat('|') => Punct::OrOr,
            '|' => Punct::Pipe,
            '!' if self.eat('=') => Punct::NotEq,
            '!' => Punct::Bang,
            '<' if self.eat('=') => Punct::Lte,
            '<' => Punct::Lt,
            '>' if self.eat('=') => Punct::Gte,
            '>' => Punct::Gt,
            '=' if self.eat('=') => Punct::EqEq,
            '&' if self.eat('&') => Punct::AndAnd,
            '-' if self.eat('>') => Punct::Arrow,
            other => return Err(LexError::UnexpectedChar(other, start)),
        };
        Ok(punct)
    }
}
