//! Hand-written tokenizer for `.cps` source text.
//!
//! Control keywords become dedicated tokens. The primitive type names and
//! contextual words (`init`, `constructor`, `len`) stay identifiers; the
//! symbol table enforces which of those are reserved for declarations.

use crate::diagnostic::{AggregateResult, DiagnosticBuilder, Span};

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub span: Span,
    pub kind: TokenKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Ident(String),
    Integer(i64),
    Str(String),

    // Keywords
    Let,
    Var,
    Const,
    Function,
    Class,
    If,
    Else,
    While,
    Do,
    For,
    Foreach,
    In,
    Break,
    Continue,
    Return,
    Try,
    Catch,
    Switch,
    Case,
    Default,
    New,
    This,
    Super,
    Null,
    True,
    False,
    Print,

    // Punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Semicolon,
    Colon,
    Comma,
    Dot,
    Question,

    // Operators
    Assign,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    EqEq,
    BangEq,
    Lt,
    Le,
    Gt,
    Ge,
    AndAnd,
    OrOr,
    Bang,

    Eof,
}

impl TokenKind {
    /// Short name used in "expected one of" diagnostics.
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::Ident(_) => "identifier",
            TokenKind::Integer(_) => "integer literal",
            TokenKind::Str(_) => "string literal",
            TokenKind::Let => "`let`",
            TokenKind::Var => "`var`",
            TokenKind::Const => "`const`",
            TokenKind::Function => "`function`",
            TokenKind::Class => "`class`",
            TokenKind::If => "`if`",
            TokenKind::Else => "`else`",
            TokenKind::While => "`while`",
            TokenKind::Do => "`do`",
            TokenKind::For => "`for`",
            TokenKind::Foreach => "`foreach`",
            TokenKind::In => "`in`",
            TokenKind::Break => "`break`",
            TokenKind::Continue => "`continue`",
            TokenKind::Return => "`return`",
            TokenKind::Try => "`try`",
            TokenKind::Catch => "`catch`",
            TokenKind::Switch => "`switch`",
            TokenKind::Case => "`case`",
            TokenKind::Default => "`default`",
            TokenKind::New => "`new`",
            TokenKind::This => "`this`",
            TokenKind::Super => "`super`",
            TokenKind::Null => "`null`",
            TokenKind::True => "`true`",
            TokenKind::False => "`false`",
            TokenKind::Print => "`print`",
            TokenKind::LParen => "`(`",
            TokenKind::RParen => "`)`",
            TokenKind::LBrace => "`{`",
            TokenKind::RBrace => "`}`",
            TokenKind::LBracket => "`[`",
            TokenKind::RBracket => "`]`",
            TokenKind::Semicolon => "`;`",
            TokenKind::Colon => "`:`",
            TokenKind::Comma => "`,`",
            TokenKind::Dot => "`.`",
            TokenKind::Question => "`?`",
            TokenKind::Assign => "`=`",
            TokenKind::Plus => "`+`",
            TokenKind::Minus => "`-`",
            TokenKind::Star => "`*`",
            TokenKind::Slash => "`/`",
            TokenKind::Percent => "`%`",
            TokenKind::EqEq => "`==`",
            TokenKind::BangEq => "`!=`",
            TokenKind::Lt => "`<`",
            TokenKind::Le => "`<=`",
            TokenKind::Gt => "`>`",
            TokenKind::Ge => "`>=`",
            TokenKind::AndAnd => "`&&`",
            TokenKind::OrOr => "`||`",
            TokenKind::Bang => "`!`",
            TokenKind::Eof => "end of input",
        }
    }
}

fn keyword(ident: &str) -> Option<TokenKind> {
    Some(match ident {
        "let" => TokenKind::Let,
        "var" => TokenKind::Var,
        "const" => TokenKind::Const,
        "function" => TokenKind::Function,
        "class" => TokenKind::Class,
        "if" => TokenKind::If,
        "else" => TokenKind::Else,
        "while" => TokenKind::While,
        "do" => TokenKind::Do,
        "for" => TokenKind::For,
        "foreach" => TokenKind::Foreach,
        "in" => TokenKind::In,
        "break" => TokenKind::Break,
        "continue" => TokenKind::Continue,
        "return" => TokenKind::Return,
        "try" => TokenKind::Try,
        "catch" => TokenKind::Catch,
        "switch" => TokenKind::Switch,
        "case" => TokenKind::Case,
        "default" => TokenKind::Default,
        "new" => TokenKind::New,
        "this" => TokenKind::This,
        "super" => TokenKind::Super,
        "null" => TokenKind::Null,
        "true" => TokenKind::True,
        "false" => TokenKind::False,
        "print" => TokenKind::Print,
        _ => return None,
    })
}

struct Lexer<'s> {
    source: &'s str,
    bytes: &'s [u8],
    pos: usize,
}

impl<'s> Lexer<'s> {
    fn new(source: &'s str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek2(&self) -> Option<u8> {
        self.bytes.get(self.pos + 1).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }

    /// Skips whitespace and both comment forms. Returns an unterminated
    /// block comment's opening span on failure.
    fn skip_trivia(&mut self) -> Result<(), Span> {
        loop {
            match (self.peek(), self.peek2()) {
                (Some(b), _) if b.is_ascii_whitespace() => {
                    self.pos += 1;
                }
                (Some(b'/'), Some(b'/')) => {
                    while let Some(b) = self.peek() {
                        if b == b'\n' {
                            break;
                        }
                        self.pos += 1;
                    }
                }
                (Some(b'/'), Some(b'*')) => {
                    let start = self.pos;
                    self.pos += 2;
                    loop {
                        match (self.peek(), self.peek2()) {
                            (Some(b'*'), Some(b'/')) => {
                                self.pos += 2;
                                break;
                            }
                            (Some(_), _) => self.pos += 1,
                            (None, _) => return Err((start..start + 2).into()),
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn ident_or_keyword(&mut self) -> Token {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b.is_ascii_alphanumeric() || b == b'_' {
                self.pos += 1;
            } else {
                break;
            }
        }
        let text = &self.source[start..self.pos];
        let kind = keyword(text).unwrap_or_else(|| TokenKind::Ident(text.to_owned()));
        Token {
            span: (start..self.pos).into(),
            kind,
        }
    }

    fn integer(&mut self) -> Result<Token, Span> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b.is_ascii_digit() {
                self.pos += 1;
            } else {
                break;
            }
        }
        let span: Span = (start..self.pos).into();
        let value: i64 = self.source[start..self.pos].parse().map_err(|_| span)?;
        Ok(Token {
            span,
            kind: TokenKind::Integer(value),
        })
    }

    /// Double-quoted, no interior newlines; non-ASCII text passes through
    /// byte-for-byte.
    fn string(&mut self) -> Result<Token, Span> {
        let start = self.pos;
        self.pos += 1; // opening quote
        let mut bytes = Vec::new();
        loop {
            match self.bump() {
                Some(b'"') => break,
                Some(b'\n') | None => return Err((start..self.pos).into()),
                Some(b'\\') => match self.bump() {
                    Some(b'"') => bytes.push(b'"'),
                    Some(b'\\') => bytes.push(b'\\'),
                    Some(b'n') => bytes.push(b'\n'),
                    Some(b't') => bytes.push(b'\t'),
                    _ => return Err((start..self.pos).into()),
                },
                Some(b) => bytes.push(b),
            }
        }
        let value = String::from_utf8(bytes).map_err(|_| Span::from(start..self.pos))?;
        Ok(Token {
            span: (start..self.pos).into(),
            kind: TokenKind::Str(value),
        })
    }

    fn operator(&mut self) -> Result<Token, Span> {
        let start = self.pos;
        let two = |lexer: &mut Self, kind| {
            lexer.pos += 2;
            kind
        };
        let one = |lexer: &mut Self, kind| {
            lexer.pos += 1;
            kind
        };
        let kind = match (self.peek().unwrap(), self.peek2()) {
            (b'=', Some(b'=')) => two(self, TokenKind::EqEq),
            (b'!', Some(b'=')) => two(self, TokenKind::BangEq),
            (b'<', Some(b'=')) => two(self, TokenKind::Le),
            (b'>', Some(b'=')) => two(self, TokenKind::Ge),
            (b'&', Some(b'&')) => two(self, TokenKind::AndAnd),
            (b'|', Some(b'|')) => two(self, TokenKind::OrOr),
            (b'=', _) => one(self, TokenKind::Assign),
            (b'!', _) => one(self, TokenKind::Bang),
            (b'<', _) => one(self, TokenKind::Lt),
            (b'>', _) => one(self, TokenKind::Gt),
            (b'+', _) => one(self, TokenKind::Plus),
            (b'-', _) => one(self, TokenKind::Minus),
            (b'*', _) => one(self, TokenKind::Star),
            (b'/', _) => one(self, TokenKind::Slash),
            (b'%', _) => one(self, TokenKind::Percent),
            (b'(', _) => one(self, TokenKind::LParen),
            (b')', _) => one(self, TokenKind::RParen),
            (b'{', _) => one(self, TokenKind::LBrace),
            (b'}', _) => one(self, TokenKind::RBrace),
            (b'[', _) => one(self, TokenKind::LBracket),
            (b']', _) => one(self, TokenKind::RBracket),
            (b';', _) => one(self, TokenKind::Semicolon),
            (b':', _) => one(self, TokenKind::Colon),
            (b',', _) => one(self, TokenKind::Comma),
            (b'.', _) => one(self, TokenKind::Dot),
            (b'?', _) => one(self, TokenKind::Question),
            _ => return Err((start..start + 1).into()),
        };
        Ok(Token {
            span: (start..self.pos).into(),
            kind,
        })
    }
}

pub fn lex(source: &str) -> AggregateResult<Vec<Token>> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    loop {
        if let Err(span) = lexer.skip_trivia() {
            return AggregateResult::new_err(
                DiagnosticBuilder::new(span).build_unterminated("block comment"),
            );
        }
        let Some(b) = lexer.peek() else {
            tokens.push(Token {
                span: (lexer.pos..lexer.pos).into(),
                kind: TokenKind::Eof,
            });
            return AggregateResult::new_ok(tokens);
        };
        let token = if b.is_ascii_alphabetic() || b == b'_' {
            Ok(lexer.ident_or_keyword())
        } else if b.is_ascii_digit() {
            lexer.integer()
        } else if b == b'"' {
            lexer.string()
        } else {
            lexer.operator()
        };
        match token {
            Ok(token) => tokens.push(token),
            Err(span) => {
                let range = std::ops::Range::from(span);
                let snippet = source
                    .get(range.start..range.end.min(source.len()))
                    .unwrap_or("<non-ascii>");
                return AggregateResult::new_err(if b == b'"' {
                    DiagnosticBuilder::new(span).build_unterminated("string literal")
                } else {
                    DiagnosticBuilder::new(span).build_syntax_error(snippet, Vec::new())
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        lex(source)
            .into_value()
            .expect("lex failed")
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn keywords_and_idents() {
        assert_eq!(
            kinds("let foo = integer;"),
            vec![
                TokenKind::Let,
                TokenKind::Ident("foo".into()),
                TokenKind::Assign,
                TokenKind::Ident("integer".into()),
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn two_char_operators() {
        assert_eq!(
            kinds("<= >= == != && ||"),
            vec![
                TokenKind::Le,
                TokenKind::Ge,
                TokenKind::EqEq,
                TokenKind::BangEq,
                TokenKind::AndAnd,
                TokenKind::OrOr,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn comments_are_trivia() {
        assert_eq!(
            kinds("1 // comment\n/* block\n */ 2"),
            vec![
                TokenKind::Integer(1),
                TokenKind::Integer(2),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn string_literals() {
        assert_eq!(
            kinds(r#""hola" "a\"b""#),
            vec![
                TokenKind::Str("hola".into()),
                TokenKind::Str("a\"b".into()),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn unterminated_string_is_rejected() {
        assert!(lex("\"abc").is_err());
        assert!(lex("\"ab\nc\"").is_err());
    }

    #[test]
    fn spans_are_byte_offsets() {
        let tokens = lex("ab + 1").into_value().unwrap();
        assert_eq!(std::ops::Range::from(tokens[0].span), 0..2);
        assert_eq!(std::ops::Range::from(tokens[1].span), 3..4);
        assert_eq!(std::ops::Range::from(tokens[2].span), 5..6);
    }
}
