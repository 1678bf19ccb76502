use std::{collections::VecDeque, iter::Peekable, num::ParseIntError};

use crate::{
    token::{Span, Token, TokenKind, KEYWORDS},
    util::BreakableIteratorExt,
};

/// Width of a tab character when measuring indentation.
pub const TAB_WIDTH: usize = 4;

/// A convenience function that lexes the whole input into a new buffer. The
/// last token of the returned buffer is always `Eof`.
pub fn lex_in_new(src: &str) -> Vec<Token> {
    Lexer::new(src).up_to(Token::is_eof).collect()
}

/// The indentation-aware lexer.
///
/// Tokens are produced on demand through [`Lexer::next_token`]. Line breaks
/// are significant: each one yields a `Newline` token, and the leading
/// whitespace of the following line is compared against the indent stack to
/// synthesize `Indent` and `Dedent` tokens.
pub struct Lexer<'src> {
    src: &'src str,
    iter: Peekable<std::str::Chars<'src>>,
    cursor: usize,
    current_lo: usize,
    /// Strictly increasing indentation widths. The bottom is always zero.
    indents: Vec<usize>,
    /// Structural tokens waiting to be handed out before lexing resumes.
    pending: VecDeque<Token>,
    at_line_start: bool,
}

impl<'src> Lexer<'src> {
    /// Constructs a new lexer with the default state.
    pub fn new(src: &'src str) -> Lexer<'src> {
        Lexer {
            src,
            iter: src.chars().peekable(),
            cursor: 0,
            current_lo: 0,
            indents: vec![0],
            pending: VecDeque::with_capacity(4),
            at_line_start: true,
        }
    }

    /// Returns the next token, consuming input. Once the input is exhausted,
    /// every call returns `Eof`.
    pub fn next_token(&mut self) -> Token {
        if let Some(token) = self.pending.pop_front() {
            return token;
        }
        if self.at_line_start {
            self.at_line_start = false;
            self.indentation();
            if let Some(token) = self.pending.pop_front() {
                return token;
            }
        }
        self.skip_trivia();
        let kind = self.scan_token_kind();
        match kind {
            TokenKind::Eof => {
                self.close_blocks();
                match self.pending.pop_front() {
                    Some(dedent) => dedent,
                    None => self.produce(kind),
                }
            }
            TokenKind::Newline => {
                self.at_line_start = true;
                self.produce(kind)
            }
            _ => self.produce(kind),
        }
    }

    /// The current depth of the indent stack, not counting the base level.
    pub fn depth(&self) -> usize {
        self.indents.len() - 1
    }

    /// Tries to scan the current character.
    fn scan_token_kind(&mut self) -> TokenKind {
        use TokenKind::*;
        match self.mark_advance() {
            '\0' if self.cursor == self.current_lo => Eof,
            '\n' => Newline,
            '+' => Plus,
            '-' => Minus,
            '*' => Star,
            '/' => Slash,
            '<' => Less,
            '>' => Greater,
            '=' => match self.peek() {
                '=' => self.advance_with(Eq),
                _ => Assign,
            },
            '!' => match self.peek() {
                '=' => self.advance_with(NotEq),
                _ => Bang,
            },
            ',' => Comma,
            '.' => Dot,
            '(' => LParen,
            ')' => RParen,
            '[' => LBracket,
            ']' => RBracket,
            '"' => self.string(),
            c if c.is_ascii_alphabetic() || c == '_' => self.identifier_or_keyword(),
            c if c.is_ascii_digit() => self.number(),
            _ => Illegal,
        }
    }

    /// Measures the leading whitespace of a line and queues the structural
    /// tokens implied by it.
    ///
    /// Lines without tokens (blank or comment-only) leave the stack untouched.
    fn indentation(&mut self) {
        let mut width = 0;
        loop {
            match self.peek() {
                ' ' => width += 1,
                '\t' => width += TAB_WIDTH,
                _ => break,
            }
            self.advance();
        }
        if self.is_at_end() || matches!(self.peek(), '\n' | '\r' | '#') {
            return;
        }

        let span = Span::new_of_length(self.cursor, 0);
        let top = self.top();
        if width > top {
            self.indents.push(width);
            self.pending.push_back(Token::new(TokenKind::Indent, span));
        } else {
            while width < self.top() {
                self.indents.pop();
                self.pending.push_back(Token::new(TokenKind::Dedent, span));
            }
        }
    }

    /// Pops every open level at the end of input.
    fn close_blocks(&mut self) {
        let span = Span::new_of_length(self.cursor, 0);
        while self.indents.len() > 1 {
            self.indents.pop();
            self.pending.push_back(Token::new(TokenKind::Dedent, span));
        }
    }

    fn top(&self) -> usize {
        self.indents.last().copied().unwrap_or(0)
    }

    /// Skips inline whitespace and line comments. Line breaks are kept since
    /// they are tokens on their own.
    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                ' ' | '\t' | '\r' => {
                    self.advance();
                }
                '#' => {
                    while !self.is_at_end() && self.peek() != '\n' {
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    /// Lexes a string token. Escape sequences are skipped over but kept as
    /// written, so `\"` doesn't close the string.
    ///
    /// A string must be closed on the line it starts. Otherwise the lexer
    /// produces an `Illegal` token covering everything up to the line break.
    fn string(&mut self) -> TokenKind {
        let mut is_escaping = false;
        loop {
            match (is_escaping, self.peek()) {
                (_, '\0' | '\n') => return TokenKind::Illegal,
                (false, '"') => {
                    self.advance();
                    return TokenKind::String;
                }
                (false, '\\') => is_escaping = true,
                (_, _) => is_escaping = false,
            }
            self.advance();
        }
    }

    fn identifier_or_keyword(&mut self) -> TokenKind {
        while matches!(self.peek(), c if c.is_ascii_alphanumeric() || c == '_') {
            self.advance();
        }
        KEYWORDS
            .get(self.substr())
            .copied()
            .unwrap_or(TokenKind::Identifier)
    }

    fn number(&mut self) -> TokenKind {
        while self.peek().is_ascii_digit() {
            self.advance();
        }
        TokenKind::Int
    }
}

impl Lexer<'_> {
    /// Starts a new token "mark" and advances the iterator.
    fn mark_advance(&mut self) -> char {
        self.current_lo = self.cursor;
        self.advance()
    }

    /// Returns the next character and advances the iterator.
    fn advance(&mut self) -> char {
        self.iter
            .next()
            .inspect(|c| self.cursor += c.len_utf8())
            .unwrap_or('\0')
    }

    /// Advances and returns the provided value.
    fn advance_with<T>(&mut self, value: T) -> T {
        self.advance();
        value
    }

    /// Returns the next character without advancing the iterator.
    fn peek(&mut self) -> char {
        self.iter.peek().copied().unwrap_or('\0')
    }

    fn is_at_end(&mut self) -> bool {
        self.iter.peek().is_none()
    }

    /// Returns the current span.
    fn span(&self) -> Span {
        Span::new_of_bounds(self.current_lo..self.cursor)
    }

    /// Returns the substring of the current marked bounds.
    fn substr(&self) -> &str {
        self.span().substr(self.src)
    }

    /// Produces a token using the marked bounds.
    fn produce(&self, kind: TokenKind) -> Token {
        Token::new(kind, self.span())
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    /// Never returns `None`; the end of input is an endless run of `Eof`.
    fn next(&mut self) -> Option<Token> {
        Some(self.next_token())
    }
}

pub mod extract {
    use super::*;

    pub fn int(token: Token, src: &str) -> Result<i64, ParseIntError> {
        debug_assert_eq!(token.kind, TokenKind::Int);
        token.literal(src).parse()
    }

    pub fn ident(token: Token, src: &str) -> Box<str> {
        debug_assert_eq!(token.kind, TokenKind::Identifier);
        token.literal(src).into()
    }

    /// The raw text between the quotes, escape sequences included.
    pub fn string(token: Token, src: &str) -> Box<str> {
        debug_assert_eq!(token.kind, TokenKind::String);
        token.span().offset(1, -1).substr(src).into()
    }
}
