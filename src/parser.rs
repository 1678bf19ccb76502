use crate::{
    ast::{
        Block, Class, Expr, ExprKind, Ident, InfixOperator, Method, PrefixOperator, Program,
        Stmt, StmtKind,
    },
    lexer::{extract, Lexer},
    token::{Spanned, Token, TokenKind},
};

type Result<T, E = ()> = std::result::Result<T, E>;

pub type ParseResult<T> = Result<T, (T, Vec<Spanned<Error>>)>;

/// Parses a whole program.
///
/// Parsing never stops at the first error. A statement that fails to parse is
/// left out of the tree and the parser resumes at the next line, so the
/// returned program always holds every statement that did parse.
pub fn parse_program(src: &str) -> ParseResult<Program> {
    let mut p = Parser::new(src);
    let program = p.parse_program();
    if p.errors.is_empty() {
        Ok(program)
    } else {
        Err((program, p.errors))
    }
}

/// The recursive descent parser.
///
/// Tokens are pulled from the lexer on demand, keeping only the current token
/// and a single token of lookahead.
pub struct Parser<'src> {
    src: &'src str,
    lexer: Lexer<'src>,
    current: Token,
    lookahead: Token,
    /// Kind of the last consumed token.
    prev: TokenKind,
    /// Number of consumed tokens.
    consumed: usize,
    errors: Vec<Spanned<Error>>,
}

impl Parser<'_> {
    fn parse_program(&mut self) -> Program {
        let mut statements = Vec::with_capacity(16);
        loop {
            self.skip_newlines();
            if self.is(TokenKind::Eof) {
                break;
            }
            if let Ok(stmt) = self.parse_stmt_or_recover() {
                statements.push(stmt);
            }
        }
        Program { statements }
    }

    /// Parses a statement. On failure, skips what's left of the statement
    /// (including an indented block that follows it) before returning.
    fn parse_stmt_or_recover(&mut self) -> Result<Stmt> {
        let start = self.consumed;
        let result = self.parse_stmt();
        if result.is_err() {
            self.recover_from(start);
        }
        result
    }

    fn parse_stmt(&mut self) -> Result<Stmt> {
        let token = self.peek();
        match token.kind {
            TokenKind::Let => self.parse_let(),
            TokenKind::Return => self.parse_return(),
            TokenKind::Class => self.parse_class(),
            TokenKind::For => self.parse_for(),
            TokenKind::Def if self.lookahead.kind == TokenKind::Identifier => {
                let method = self.parse_method()?;
                Ok(Stmt {
                    span: method.span,
                    kind: StmtKind::Method(method),
                })
            }
            _ => self.parse_expr_or_assignment(),
        }
    }

    fn parse_let(&mut self) -> Result<Stmt> {
        let start = self.consume(TokenKind::Let)?;
        let name = self.parse_ident()?;
        self.consume(TokenKind::Assign)?;
        let value = self.parse_expr()?;
        self.end_simple_stmt()?;
        let span = start.span().to(value.span);
        Ok(Stmt {
            kind: StmtKind::Let { name, value },
            span,
        })
    }

    fn parse_return(&mut self) -> Result<Stmt> {
        let start = self.consume(TokenKind::Return)?;
        let value = if self.peek().kind.ends_statement() {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.end_simple_stmt()?;
        let span = match &value {
            Some(value) => start.span().to(value.span),
            None => start.span(),
        };
        Ok(Stmt {
            kind: StmtKind::Return { value },
            span,
        })
    }

    fn parse_expr_or_assignment(&mut self) -> Result<Stmt> {
        let expr = self.parse_expr()?;
        if !self.take(TokenKind::Assign) {
            self.end_simple_stmt()?;
            let span = expr.span;
            return Ok(Stmt {
                kind: StmtKind::Expr(expr),
                span,
            });
        }

        if !matches!(expr.kind, ExprKind::Ident(_) | ExprKind::Member { .. }) {
            self.error(expr.span.wrap(Error::InvalidAssignmentTarget));
            return Err(());
        }
        let value = self.parse_expr()?;
        self.end_simple_stmt()?;
        let span = expr.span.to(value.span);
        Ok(Stmt {
            kind: StmtKind::Assignment {
                target: expr,
                value,
            },
            span,
        })
    }

    fn parse_class(&mut self) -> Result<Stmt> {
        let start = self.consume(TokenKind::Class)?;
        let name = self.parse_ident()?;

        let mut fields = Vec::new();
        while self.is(TokenKind::Identifier) {
            fields.push(self.parse_ident()?);
        }
        let mut end = self.consume_any(&[TokenKind::Newline, TokenKind::Eof])?;

        // A class without methods has no body.
        self.skip_newlines();
        let mut methods = Vec::new();
        if self.take(TokenKind::Indent) {
            loop {
                self.skip_newlines();
                if self.is(TokenKind::Dedent) || self.is(TokenKind::Eof) {
                    break;
                }
                let start = self.consumed;
                if self.is(TokenKind::Def) {
                    match self.parse_method() {
                        Ok(method) => methods.push(method),
                        Err(()) => self.recover_from(start),
                    }
                } else {
                    let c = self.peek();
                    self.error(c.span().wrap(Error::NonMethodInClass));
                    self.recover_from(start);
                }
            }
            end = self.peek();
            self.take(TokenKind::Dedent);
        }

        Ok(Stmt {
            kind: StmtKind::Class(Class {
                name,
                fields,
                methods,
            }),
            span: start.span().to(end.span()),
        })
    }

    fn parse_method(&mut self) -> Result<Method> {
        let start = self.consume(TokenKind::Def)?;
        let name = self.parse_ident()?;
        let params = self.parse_params()?;
        let body = self.parse_block()?;
        let span = start.span().to(body.span);
        Ok(Method {
            name,
            params,
            body,
            span,
        })
    }

    fn parse_for(&mut self) -> Result<Stmt> {
        let start = self.consume(TokenKind::For)?;
        let iterator = self.parse_ident()?;
        self.consume(TokenKind::In)?;
        let iterable = self.parse_expr()?;
        let body = self.parse_block()?;
        let span = start.span().to(body.span);
        Ok(Stmt {
            kind: StmtKind::For {
                iterator,
                iterable,
                body,
            },
            span,
        })
    }

    /// Parses `NEWLINE INDENT stmt* DEDENT`. Blank lines are skipped.
    fn parse_block(&mut self) -> Result<Block> {
        self.consume(TokenKind::Newline)?;
        self.skip_newlines();
        let start = self.consume(TokenKind::Indent)?;

        let mut statements = Vec::with_capacity(4);
        loop {
            self.skip_newlines();
            if self.is(TokenKind::Dedent) || self.is(TokenKind::Eof) {
                break;
            }
            if let Ok(stmt) = self.parse_stmt_or_recover() {
                statements.push(stmt);
            }
        }
        let end = self.peek();
        self.take(TokenKind::Dedent);

        Ok(Block {
            statements,
            span: start.span().to(end.span()),
        })
    }

    fn parse_params(&mut self) -> Result<Vec<Ident>> {
        self.consume(TokenKind::LParen)?;
        let params = self.parse_list(TokenKind::RParen, Parser::parse_ident)?;
        self.consume(TokenKind::RParen)?;
        Ok(params)
    }

    fn parse_ident(&mut self) -> Result<Ident> {
        let token = self.consume(TokenKind::Identifier)?;
        Ok(Ident {
            name: extract::ident(token, self.src),
            span: token.span(),
        })
    }

    fn parse_expr(&mut self) -> Result<Expr> {
        self.parse_expr_bp(0)
    }

    fn parse_expr_bp(&mut self, min_bp: u8) -> Result<Expr> {
        // Structural tokens are left for the enclosing statement to deal with.
        let lhs_token = self.peek();
        if matches!(
            lhs_token.kind,
            TokenKind::Newline | TokenKind::Dedent | TokenKind::Eof
        ) {
            let error = Error::UnexpectedTokenInExpr {
                token: lhs_token.kind,
            };
            self.error(lhs_token.span().wrap(error));
            return Err(());
        }
        self.advance();
        let mut lhs = self.parse_nud(lhs_token)?;

        loop {
            // An expression ending with a block can't go on past its `Dedent`.
            if self.prev == TokenKind::Dedent {
                break;
            }
            let op_token = self.peek();

            if let Some((lbp, rbp)) = Self::infix_binding_power(op_token.kind) {
                if lbp < min_bp {
                    // Operator binds less tightly than the minimum required
                    break;
                }

                self.advance(); // Operator
                lhs = self.parse_led(op_token, lhs, rbp)?;
            } else {
                break;
            }
        }

        Ok(lhs)
    }

    /// nud: Parses tokens that start an expression
    /// (prefix operators, literals, grouping)
    fn parse_nud(&mut self, token: Token) -> Result<Expr> {
        let (kind, span) = match token.kind {
            // `print` is a keyword, but is called like any other function.
            TokenKind::Identifier | TokenKind::Print => {
                let ident = Ident {
                    name: token.literal(self.src).into(),
                    span: token.span(),
                };
                (ExprKind::Ident(ident), token.span())
            }
            TokenKind::Int => {
                let Ok(parsed) = extract::int(token, self.src) else {
                    self.error(token.span().wrap(Error::ParseInt));
                    return Err(());
                };
                (ExprKind::Int(parsed), token.span())
            }
            TokenKind::String => (
                ExprKind::String(extract::string(token, self.src)),
                token.span(),
            ),
            TokenKind::True => (ExprKind::Bool(true), token.span()),
            TokenKind::False => (ExprKind::Bool(false), token.span()),

            // Grouping: ( expr )
            TokenKind::LParen => {
                let expr = self.parse_expr()?;
                let end = self.consume(TokenKind::RParen)?;
                (expr.kind, token.span().to(end.span()))
            }

            // Array: [ expr, ... ]
            TokenKind::LBracket => {
                let elements = self.parse_list(TokenKind::RBracket, Parser::parse_expr)?;
                let end = self.consume(TokenKind::RBracket)?;
                (ExprKind::Array(elements), token.span().to(end.span()))
            }

            // Prefix operators: -, !, not
            kind @ (TokenKind::Minus | TokenKind::Bang | TokenKind::Not) => {
                let op = match kind {
                    TokenKind::Minus => PrefixOperator::Neg,
                    _ => PrefixOperator::Not,
                };
                let right = self.parse_expr_bp(Self::PREFIX_BINDING_POWER)?;
                let span = token.span().to(right.span);
                let prefix = ExprKind::Prefix {
                    op,
                    right: Box::new(right),
                };
                (prefix, span)
            }

            // Conditional: if expr block [else block]
            TokenKind::If => {
                let condition = self.parse_expr()?;
                let consequence = self.parse_block()?;
                let alternative = if self.take(TokenKind::Else) {
                    Some(self.parse_block()?)
                } else {
                    None
                };
                let end = alternative.as_ref().unwrap_or(&consequence).span;
                let cond = ExprKind::If {
                    condition: Box::new(condition),
                    consequence,
                    alternative,
                };
                (cond, token.span().to(end))
            }

            // Function literal: def ( params ) block
            TokenKind::Def => {
                let params = self.parse_params()?;
                let body = self.parse_block()?;
                let span = token.span().to(body.span);
                (ExprKind::Function { params, body }, span)
            }

            TokenKind::Illegal => {
                let error = if token.literal(self.src).starts_with('"') {
                    Error::UnterminatedString
                } else {
                    Error::UnexpectedChar
                };
                self.error(token.span().wrap(error));
                return Err(());
            }

            other => {
                let error = Error::UnexpectedTokenInExpr { token: other };
                self.error(token.span().wrap(error));
                return Err(());
            }
        };

        Ok(Expr { kind, span })
    }

    /// led: Parses tokens that follow a left-hand-side expression
    /// (infix/postfix operators)
    fn parse_led(&mut self, op_token: Token, lhs: Expr, rbp: u8) -> Result<Expr> {
        let (kind, span) = match op_token.kind {
            // Call: expr ( [expr [, expr]*] )
            TokenKind::LParen => {
                let args = self.parse_list(TokenKind::RParen, Parser::parse_expr)?;
                let end = self.consume(TokenKind::RParen)?;
                let span = lhs.span.to(end.span());
                let call = ExprKind::Call {
                    callee: Box::new(lhs),
                    args,
                };
                (call, span)
            }

            // Member access: expr . ID
            TokenKind::Dot => {
                let member = self.parse_ident()?;
                let span = lhs.span.to(member.span);
                let access = ExprKind::Member {
                    base: Box::new(lhs),
                    member,
                };
                (access, span)
            }

            // Index: expr [ expr ]
            TokenKind::LBracket => {
                let index = self.parse_expr()?;
                let end = self.consume(TokenKind::RBracket)?;
                let span = lhs.span.to(end.span());
                let index = ExprKind::Index {
                    base: Box::new(lhs),
                    index: Box::new(index),
                };
                (index, span)
            }

            kind => {
                let Some(op) = Self::infix_operator(kind) else {
                    let error = Error::UnexpectedOperator { actual: kind };
                    self.error(op_token.span().wrap(error));
                    return Err(());
                };
                // Parse right operand with correct precedence
                let rhs = self.parse_expr_bp(rbp)?;

                let span = lhs.span.to(rhs.span);
                let infix = ExprKind::Infix {
                    op,
                    left: Box::new(lhs),
                    right: Box::new(rhs),
                };
                (infix, span)
            }
        };

        Ok(Expr { kind, span })
    }

    /// Parses `item (, item)*` until `end_delim` is found. Does **NOT**
    /// consume the end delimiter.
    fn parse_list<T>(
        &mut self,
        end_delim: TokenKind,
        parse_item: impl Fn(&mut Self) -> Result<T>,
    ) -> Result<Vec<T>> {
        let mut items = Vec::new();
        while self.except([end_delim]) {
            items.push(parse_item(self)?);
            if !self.take(TokenKind::Comma) {
                break;
            }
        }
        if !self.is(end_delim) {
            let c = self.peek();
            self.error(c.span().wrap(Error::UnexpectedAny {
                actual: c.kind,
                expected: Box::from([TokenKind::Comma, end_delim]),
            }));
            return Err(());
        }
        Ok(items)
    }

    const PREFIX_BINDING_POWER: u8 = 13;

    fn infix_binding_power(kind: TokenKind) -> Option<(u8, u8)> {
        let bp = match kind {
            TokenKind::Or => (1, 2),
            TokenKind::And => (3, 4),
            TokenKind::Eq | TokenKind::NotEq => (5, 6),
            TokenKind::Less | TokenKind::Greater => (7, 8),
            TokenKind::Plus | TokenKind::Minus => (9, 10),
            TokenKind::Star | TokenKind::Slash => (11, 12),

            // Prefix operators sit at 13.

            // Call and member access (left-associative)
            TokenKind::LParen | TokenKind::Dot => (15, 16),
            TokenKind::LBracket => (17, 18),

            _ => return None,
        };
        Some(bp)
    }

    fn infix_operator(kind: TokenKind) -> Option<InfixOperator> {
        let op = match kind {
            TokenKind::Plus => InfixOperator::Add,
            TokenKind::Minus => InfixOperator::Sub,
            TokenKind::Star => InfixOperator::Mul,
            TokenKind::Slash => InfixOperator::Div,
            TokenKind::Less => InfixOperator::Lt,
            TokenKind::Greater => InfixOperator::Gt,
            TokenKind::Eq => InfixOperator::Eq,
            TokenKind::NotEq => InfixOperator::NotEq,
            TokenKind::And => InfixOperator::And,
            TokenKind::Or => InfixOperator::Or,
            _ => return None,
        };
        Some(op)
    }
}

impl<'src> Parser<'src> {
    pub fn new(src: &'src str) -> Parser<'src> {
        let mut lexer = Lexer::new(src);
        let current = lexer.next_token();
        let lookahead = lexer.next_token();
        Parser {
            src,
            lexer,
            current,
            lookahead,
            prev: TokenKind::Newline,
            consumed: 0,
            errors: Vec::with_capacity(8),
        }
    }
}

impl Parser<'_> {
    /// Records an error.
    fn error(&mut self, error: Spanned<Error>) {
        self.errors.push(error);
    }

    /// Returns the current token.
    #[inline]
    fn peek(&self) -> Token {
        self.current
    }

    /// Returns the current token and advances.
    fn advance(&mut self) -> Token {
        let c = self.current;
        self.prev = c.kind;
        self.consumed += 1;
        self.current = self.lookahead;
        self.lookahead = self.lexer.next_token();
        c
    }

    /// Checks whether the current token matches the given one.
    fn is(&self, expect: TokenKind) -> bool {
        self.peek().kind == expect
    }

    /// Advances if the current token matches the provided one, returning true.
    /// If not, returns false and doesn't advance.
    fn take(&mut self, expect: TokenKind) -> bool {
        if self.is(expect) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Advances if the current token matches the provided one, returning it.
    /// If not, records an error.
    fn consume(&mut self, expect: TokenKind) -> Result<Token> {
        let c = self.peek();
        if self.is(expect) {
            self.advance();
            Ok(c)
        } else {
            self.error(c.span().wrap(Error::Unexpected {
                actual: c.kind,
                expected: expect,
            }));
            Err(())
        }
    }

    /// Advances if the current token matches any of the provided tokens,
    /// returning it. If not, records an error.
    fn consume_any(&mut self, expect: &'static [TokenKind]) -> Result<Token> {
        for t in expect {
            if self.is(*t) {
                return Ok(self.advance());
            }
        }
        let c = self.peek();
        self.error(c.span().wrap(Error::UnexpectedAny {
            actual: c.kind,
            expected: Box::from(expect),
        }));
        Err(())
    }

    /// Returns true while the current token does *not* match one of the
    /// provided ones. [`TokenKind::Eof`] is implicitly included in the list.
    ///
    /// This won't advance the cursor.
    fn except(&mut self, except: impl IntoIterator<Item = TokenKind>) -> bool {
        let c = self.peek();
        for e in except {
            if c.kind == e {
                return false;
            }
        }
        c.kind != TokenKind::Eof
    }

    fn skip_newlines(&mut self) {
        while self.take(TokenKind::Newline) {}
    }

    /// A simple statement must be followed by a line break, or close the
    /// enclosing block. A statement ending with a block has already consumed
    /// its terminator.
    fn end_simple_stmt(&mut self) -> Result<()> {
        if self.prev == TokenKind::Dedent {
            return Ok(());
        }
        let c = self.peek();
        match c.kind {
            TokenKind::Newline => {
                self.advance();
                Ok(())
            }
            TokenKind::Dedent | TokenKind::Eof => Ok(()),
            actual => {
                self.error(c.span().wrap(Error::Unexpected {
                    actual,
                    expected: TokenKind::Newline,
                }));
                Err(())
            }
        }
    }

    /// Resynchronizes after a failed statement that started when `start`
    /// tokens had been consumed.
    ///
    /// A statement that failed right after a line break is already at the
    /// start of the next one. One that failed on an unexpected `Indent` must
    /// skip the whole block it opened.
    fn recover_from(&mut self, start: usize) {
        let progressed = self.consumed > start;
        match self.prev {
            TokenKind::Newline | TokenKind::Dedent if progressed => (),
            TokenKind::Indent if progressed => self.skip_line(1),
            _ => self.skip_line(0),
        }
    }

    /// Skips the rest of the current line. If the next line opens an indented
    /// block, it's skipped as well. Stops before a `Dedent` that closes the
    /// enclosing block.
    fn skip_line(&mut self, mut depth: usize) {
        loop {
            match self.peek().kind {
                TokenKind::Eof => return,
                TokenKind::Dedent if depth == 0 => return,
                TokenKind::Newline if depth == 0 => {
                    self.advance();
                    if !self.is(TokenKind::Indent) {
                        return;
                    }
                    continue;
                }
                TokenKind::Indent => depth += 1,
                TokenKind::Dedent => {
                    depth -= 1;
                    if depth == 0 {
                        self.advance();
                        return;
                    }
                }
                _ => (),
            }
            self.advance();
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    InvalidAssignmentTarget,
    NonMethodInClass,
    UnexpectedTokenInExpr {
        token: TokenKind,
    },
    Unexpected {
        actual: TokenKind,
        expected: TokenKind,
    },
    UnexpectedAny {
        actual: TokenKind,
        expected: Box<[TokenKind]>,
    },
    UnexpectedOperator {
        actual: TokenKind,
    },
    ParseInt,
    UnexpectedChar,
    UnterminatedString,
}


#[cfg(test)]
mod tests {
    use crate::util::test_utils::tree_tests;

    tree_tests!(
        use parser;

        fn test_simple_expression() {
            let program = "(1 * 2 + 3) - (1 + 2 * 3)";
            let tree_ok = "
                expr (0..25)
                  infix Sub (0..25)
                    infix Add (0..11)
                      infix Mul (1..6)
                        int 1 (1..2)
                        int 2 (5..6)
                      int 3 (9..10)
                    infix Add (14..25)
                      int 1 (15..16)
                      infix Mul (19..24)
                        int 2 (19..20)
                        int 3 (23..24)
            ";
        }

        fn test_literals() {
            let program = r#"
                x
                42
                "hello\nworld"
                true
                false
            "#;
            let tree_ok = r#"
                expr (0..1)
                  ident x (0..1)
                expr (2..4)
                  int 42 (2..4)
                expr (5..19)
                  string "hello\nworld" (5..19)
                expr (20..24)
                  bool true (20..24)
                expr (25..30)
                  bool false (25..30)
            "#;
        }

        fn test_prefix_binds_tighter_than_infix() {
            let program = "-a * !b == not c";
            let tree_ok = "
                expr (0..16)
                  infix Eq (0..16)
                    infix Mul (0..7)
                      prefix Neg (0..2)
                        ident a (1..2)
                      prefix Not (5..7)
                        ident b (6..7)
                    prefix Not (11..16)
                      ident c (15..16)
            ";
        }

        fn test_logical_operators_bind_loosest() {
            let program = "a < b and c or d > e";
            let tree_ok = "
                expr (0..20)
                  infix Or (0..20)
                    infix And (0..11)
                      infix Lt (0..5)
                        ident a (0..1)
                        ident b (4..5)
                      ident c (10..11)
                    infix Gt (15..20)
                      ident d (15..16)
                      ident e (19..20)
            ";
        }

        fn test_postfix_chain() {
            let program = "a.b(1, 2)[0].c";
            let tree_ok = "
                expr (0..14)
                  member c (0..14)
                    index (0..12)
                      call (0..9)
                        member b (0..3)
                          ident a (0..1)
                        int 1 (4..5)
                        int 2 (7..8)
                      int 0 (10..11)
            ";
        }

        fn test_array_literal() {
            let program = "[1, x, [], f()]";
            let tree_ok = "
                expr (0..15)
                  array (0..15)
                    int 1 (1..2)
                    ident x (4..5)
                    array (7..9)
                    call (11..14)
                      ident f (11..12)
            ";
        }

        fn test_let_and_assignment() {
            let program = "
                let x = 1
                x = x + 1
                p.name = \"bob\"
            ";
            let tree_ok = r#"
                let x (0..9)
                  int 1 (8..9)
                assignment (10..19)
                  ident x (10..11)
                  infix Add (14..19)
                    ident x (14..15)
                    int 1 (18..19)
                assignment (20..34)
                  member name (20..26)
                    ident p (20..21)
                  string "bob" (29..34)
            "#;
        }

        fn test_return() {
            let program = "
                def f(a)
                    return a
                def g()
                    return
            ";
            let tree_ok = "
                def f(a) (0..22)
                  return (13..21)
                    ident a (20..21)
                def g() (22..41)
                  return (34..40)
            ";
        }

        fn test_if_else_statement() {
            let program = "
                if x > 1
                    print(x)
                else
                    print(0)
            ";
            let tree_ok = "
                expr (0..40)
                  if (0..40)
                    infix Gt (3..8)
                      ident x (3..4)
                      int 1 (7..8)
                    then
                      expr (13..21)
                        call (13..21)
                          ident print (13..18)
                          ident x (19..20)
                    else
                      expr (31..39)
                        call (31..39)
                          ident print (31..36)
                          int 0 (37..38)
            ";
        }

        fn test_if_without_else() {
            let program = "
                if ok
                    print(1)
                print(2)
            ";
            let tree_ok = "
                expr (0..19)
                  if (0..19)
                    ident ok (3..5)
                    then
                      expr (10..18)
                        call (10..18)
                          ident print (10..15)
                          int 1 (16..17)
                expr (19..27)
                  call (19..27)
                    ident print (19..24)
                    int 2 (25..26)
            ";
        }

        fn test_function_literal() {
            let program = "
                let add = def(a, b)
                    return a + b
                print(add(1, 2))
            ";
            let tree_ok = "
                let add (0..37)
                  def(a, b) (10..37)
                    return (24..36)
                      infix Add (31..36)
                        ident a (31..32)
                        ident b (35..36)
                expr (37..53)
                  call (37..53)
                    ident print (37..42)
                    call (43..52)
                      ident add (43..46)
                      int 1 (47..48)
                      int 2 (50..51)
            ";
        }

        fn test_class() {
            let program = "
                class Person name age
                    def greet(self)
                        print(self.name)

                    def older(self, years)
                        self.age = self.age + years
            ";
            let tree_ok = "
                class Person name age (0..131)
                  def greet(self) (26..72)
                    expr (50..66)
                      call (50..66)
                        ident print (50..55)
                        member name (56..65)
                          ident self (56..60)
                  def older(self, years) (72..131)
                    assignment (103..130)
                      member age (103..111)
                        ident self (103..107)
                      infix Add (114..130)
                        member age (114..122)
                          ident self (114..118)
                        ident years (125..130)
            ";
        }

        fn test_class_without_methods() {
            let program = "
                class Point x y
                let p = Point(1, 2)
            ";
            let tree_ok = "
                class Point x y (0..16)
                let p (16..35)
                  call (24..35)
                    ident Point (24..29)
                    int 1 (30..31)
                    int 2 (33..34)
            ";
        }

        fn test_for() {
            let program = "
                for i in 3
                    print(i)
            ";
            let tree_ok = "
                for i (0..24)
                  int 3 (9..10)
                  expr (15..23)
                    call (15..23)
                      ident print (15..20)
                      ident i (21..22)
            ";
        }

        fn test_blank_lines_inside_block() {
            let program = "
                for i in n

                    print(i)

                    print(i)
                print(0)
            ";
            let tree_ok = "
                for i (0..39)
                  ident n (9..10)
                  expr (16..24)
                    call (16..24)
                      ident print (16..21)
                      ident i (22..23)
                  expr (30..38)
                    call (30..38)
                      ident print (30..35)
                      ident i (36..37)
                expr (39..47)
                  call (39..47)
                    ident print (39..44)
                    int 0 (45..46)
            ";
        }

        fn test_error_recovers_after_malformed_statement() {
            let program = "
                let a = 1
                let = 2
                let c = 3
            ";
            let tree_error = "
                let a (0..9)
                  int 1 (8..9)
                let c (18..27)
                  int 3 (26..27)
            ";
            let expected_errors = &["14..15: expected token Identifier, but got Assign"];
        }

        fn test_error_skips_block_of_malformed_header() {
            let program = "
                for i 3
                    print(i)
                print(1)
            ";
            let tree_error = "
                expr (21..29)
                  call (21..29)
                    ident print (21..26)
                    int 1 (27..28)
            ";
            let expected_errors = &["6..7: expected token In, but got Int"];
        }

        fn test_error_missing_indent() {
            let program = "
                if x
                print(1)
            ";
            let tree_error = "
                expr (5..13)
                  call (5..13)
                    ident print (5..10)
                    int 1 (11..12)
            ";
            let expected_errors = &["5..10: expected token Indent, but got Identifier"];
        }

        fn test_error_non_method_in_class() {
            let program = "
                class A x
                    let y = 1
                    def get(self)
                        return self.x
            ";
            let tree_error = "
                class A x (0..64)
                  def get(self) (28..64)
                    return (50..63)
                      member x (57..63)
                        ident self (57..61)
            ";
            let expected_errors = &["14..17: only method definitions are allowed in a class body"];
        }

        fn test_error_invalid_assignment_target() {
            let program = "f() = 1";
            let expected_errors = &["0..3: invalid assignment target"];
        }

        fn test_error_unexpected_token_in_expr() {
            let program = "1 + )";
            let expected_errors = &["4..5: unexpected token RParen in expression"];
        }

        fn test_error_trailing_tokens() {
            let program = "let x = 1 2";
            let expected_errors = &["10..11: expected token Newline, but got Int"];
        }

        fn test_error_unmatched_paren() {
            let program = "(1 + 2";
            let expected_errors = &["6..6: expected token RParen, but got Eof"];
        }

        fn test_error_missing_list_separator() {
            let program = "f(a b)";
            let expected_errors = &["4..5: expected one of [Comma, RParen], but got Identifier"];
        }

        fn test_error_illegal_tokens() {
            let program = "
                let a = $
                let b = \"open
            ";
            let expected_errors = &[
                "8..9: unexpected character",
                "18..23: unterminated string",
            ];
        }

        fn test_error_parse_int_too_large() {
            let program = "999999999999999999999999999999";
            let expected_errors = &["0..30: integer literal out of range"];
        }

        fn test_error_stray_indent() {
            let program = "
                let a = 1
                    let b = 2
                let c = 3
            ";
            let tree_error = "
                let a (0..9)
                  int 1 (8..9)
                let c (24..33)
                  int 3 (32..33)
            ";
            let expected_errors = &["14..14: unexpected token Indent in expression"];
        }

        fn test_error_nul_character() {
            let program = "let a = 1\n\0\nlet b = 2\nlet c = $\n";
            let tree_error = "
                let a (0..9)
                  int 1 (8..9)
                let b (12..21)
                  int 2 (20..21)
            ";
            let expected_errors = &[
                "10..11: unexpected character",
                "30..31: unexpected character",
            ];
        }
    );
}
