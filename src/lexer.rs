use logos::Logos;
use std::collections::HashSet;
use std::fmt;

use crate::Span;

/// Token categories of the Monkey language.
///
/// Keywords are recognized by exact match and win over the identifier rule;
/// identifiers and integers use maximal munch. Anything the lexer does not
/// recognize becomes a single [`TokenKind::Illegal`] token rather than an
/// error, so the token stream itself never fails.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[logos(skip r"[ \t\n\r]+")] // Skip whitespace
pub enum TokenKind {
    // Identifiers + literals
    #[regex(r"[a-zA-Z_]+")]
    Ident,
    #[regex(r"[0-9]+")]
    Int,

    // Operators
    #[token("=")]
    Assign,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("!")]
    Bang,
    #[token("*")]
    Asterisk,
    #[token("/")]
    Slash,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("==")]
    Eq,
    #[token("!=")]
    NotEq,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,

    // Delimiters
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,

    // Keywords
    #[token("fn")]
    Function,
    #[token("let")]
    Let,
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("return")]
    Return,
    #[token("while")]
    While,
    #[token("for")]
    For,

    // Catch-all for unrecognized characters, one at a time. The low
    // priority makes every other rule win when one applies.
    #[regex(r".", priority = 1)]
    Illegal,
    // A NUL byte marks end of input, matching the lexer's own sentinel.
    #[token("\0")]
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Ident => "IDENT",
            TokenKind::Int => "INT",
            TokenKind::Assign => "ASSIGN",
            TokenKind::Plus => "PLUS",
            TokenKind::Minus => "MINUS",
            TokenKind::Bang => "BANG",
            TokenKind::Asterisk => "ASTERISK",
            TokenKind::Slash => "SLASH",
            TokenKind::Lt => "LT",
            TokenKind::Gt => "GT",
            TokenKind::Eq => "EQ",
            TokenKind::NotEq => "NOT_EQ",
            TokenKind::LtEq => "LE",
            TokenKind::GtEq => "GE",
            TokenKind::Comma => "COMMA",
            TokenKind::Semicolon => "SEMICOLON",
            TokenKind::LParen => "LPAREN",
            TokenKind::RParen => "RPAREN",
            TokenKind::LBrace => "LBRACE",
            TokenKind::RBrace => "RBRACE",
            TokenKind::Function => "FUNCTION",
            TokenKind::Let => "LET",
            TokenKind::True => "TRUE",
            TokenKind::False => "FALSE",
            TokenKind::If => "IF",
            TokenKind::Else => "ELSE",
            TokenKind::Return => "RETURN",
            TokenKind::While => "WHILE",
            TokenKind::For => "FOR",
            TokenKind::Illegal => "ILLEGAL",
            TokenKind::Eof => "EOF",
        };
        write!(f, "{}", name)
    }
}

/// A token kind paired with the source text it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub literal: String,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, literal: impl Into<String>, span: Span) -> Token {
        Token {
            kind,
            literal: literal.into(),
            span,
        }
    }

    /// The end-of-input token, positioned just past the source text.
    pub fn eof(offset: usize) -> Token {
        Token::new(TokenKind::Eof, "", Span::new(offset, offset))
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token[kind={}, literal={}]", self.kind, self.literal)
    }
}

/// Pull-based lexer over a source string.
///
/// `next_token` always yields a token: unrecognized characters come out as
/// [`TokenKind::Illegal`] and, once the input is exhausted, every further
/// call yields [`TokenKind::Eof`].
pub struct Lexer<'src> {
    inner: logos::Lexer<'src, TokenKind>,
}

impl<'src> Lexer<'src> {
    pub fn new(input: &'src str) -> Lexer<'src> {
        Lexer {
            inner: TokenKind::lexer(input),
        }
    }

    pub fn next_token(&mut self) -> Token {
        match self.inner.next() {
            Some(Ok(kind)) => Token::new(
                kind,
                self.inner.slice(),
                Span::new(self.inner.span().start, self.inner.span().end),
            ),
            // The catch-all rule leaves nothing for logos to reject, but if
            // it ever does, surface the offending slice as an Illegal token.
            Some(Err(())) => Token::new(
                TokenKind::Illegal,
                self.inner.slice(),
                Span::new(self.inner.span().start, self.inner.span().end),
            ),
            None => Token::eof(self.inner.source().len()),
        }
    }
}

/// Identifiers the lexer reserves as keywords, for REPL completion.
pub fn keyword_identifiers() -> HashSet<String> {
    [
        "fn", "let", "true", "false", "if", "else", "return", "while", "for",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

/// Helper to tokenize a string in one go (useful for tests and benches).
/// The returned sequence always ends with exactly one EOF token.
pub fn tokenize(input: &str) -> Vec<Token> {
    let mut lexer = Lexer::new(input);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token();
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            return tokens;
        }
    }
}
