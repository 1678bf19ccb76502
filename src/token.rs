use std::{fmt, ops::Range};

#[derive(Copy, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    lo: usize,
    len: u32,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Token {
        Token {
            kind,
            len: span.len,
            lo: span.lo,
        }
    }

    pub fn span(&self) -> Span {
        Span {
            len: self.len,
            lo: self.lo,
        }
    }

    /// The source text covered by this token.
    ///
    /// Structural tokens (`Indent`, `Dedent` and `Eof`) have an empty span, so
    /// their literal is always the empty string.
    pub fn literal<'src>(&self, src: &'src str) -> &'src str {
        self.span().substr(src)
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token({:?}, {})", self.kind, self.span())
    }
}

#[derive(Copy, Clone, PartialEq, Eq)]
pub struct Span {
    pub len: u32,
    pub lo: usize,
}

impl Span {
    pub fn new_of_bounds(Range { start: lo, end: hi }: Range<usize>) -> Span {
        debug_assert!(hi >= lo);
        Self::new_of_length(lo, u32::try_from(hi - lo).unwrap())
    }

    pub fn new_of_length(lo: usize, len: u32) -> Span {
        Span { len, lo }
    }

    pub fn hi(&self) -> usize {
        self.lo + self.len as usize
    }

    pub fn substr<'src>(&self, src: &'src str) -> &'src str {
        &src[self.lo..self.hi()]
    }

    /// Shrinks (or grows) the span by the given offsets.
    pub fn offset(&self, lo: isize, hi: isize) -> Span {
        let new_lo = self.lo.checked_add_signed(lo).unwrap();
        let new_hi = self.hi().checked_add_signed(hi).unwrap();
        Span::new_of_bounds(new_lo..new_hi.max(new_lo))
    }

    /// Returns a span that starts at `self` and ends at `other`.
    pub fn to(&self, other: Span) -> Span {
        Span::new_of_bounds(self.lo..other.hi().max(self.lo))
    }

    pub fn wrap<T>(self, inner: T) -> Spanned<T> {
        Spanned { span: self, inner }
    }

    /// One-based line and column of the start of this span.
    pub fn line_col(&self, src: &str) -> (usize, usize) {
        let before = &src[..self.lo.min(src.len())];
        let line = before.matches('\n').count() + 1;
        let col = before.rfind('\n').map_or(before.len(), |nl| before.len() - nl - 1) + 1;
        (line, col)
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Span({self}, len: {})", self.len)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lo = self.lo;
        let hi = self.hi();
        write!(f, "{lo}..{hi}")
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Spanned<T> {
    pub span: Span,
    pub inner: T,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// A character the language doesn't know about, or an unterminated string.
    Illegal,
    Eof,

    Identifier,
    Int,
    String,

    /// `=`
    Assign,
    Plus,
    Minus,
    /// `!`
    Bang,
    Star,
    Slash,
    Less,
    Greater,
    /// `==`
    Eq,
    /// `!=`
    NotEq,
    Dot,
    Comma,
    LParen,
    RParen,
    LBracket,
    RBracket,

    /// End of a logical line. Its literal is the line break itself.
    Newline,
    /// Start of a nested block. Synthesized from leading whitespace.
    Indent,
    /// End of a nested block. Synthesized from leading whitespace.
    Dedent,

    Let,
    Def,
    Class,
    If,
    Else,
    For,
    In,
    Return,
    True,
    False,
    And,
    Or,
    Not,
    Print,
}

impl TokenKind {
    /// Whether a statement may end right before this token.
    pub fn ends_statement(self) -> bool {
        matches!(self, TokenKind::Newline | TokenKind::Dedent | TokenKind::Eof)
    }
}

pub static KEYWORDS: phf::Map<&'static str, TokenKind> = phf::phf_map! {
    "let" => TokenKind::Let,
    "def" => TokenKind::Def,
    "class" => TokenKind::Class,
    "if" => TokenKind::If,
    "else" => TokenKind::Else,
    "for" => TokenKind::For,
    "in" => TokenKind::In,
    "return" => TokenKind::Return,
    "true" => TokenKind::True,
    "false" => TokenKind::False,
    "and" => TokenKind::And,
    "or" => TokenKind::Or,
    "not" => TokenKind::Not,
    "print" => TokenKind::Print,
};
