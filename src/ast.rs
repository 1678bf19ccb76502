// program ::= (stmt NEWLINE)*
// stmt ::= let ID '=' expr
//        | return [expr]
//        | class ID ID* NEWLINE INDENT (method NEWLINE*)* DEDENT
//        | method
//        | for ID in expr block
//        | expr ['=' expr]
// method ::= def ID '(' [ID (',' ID)*] ')' block
// block ::= NEWLINE INDENT (stmt NEWLINE*)* DEDENT
// expr ::= ID | integer | string | true | false
//        | ('-' | '!' | not) expr
//        | expr op expr
//        | expr '(' [expr (',' expr)*] ')'
//        | expr '.' ID
//        | expr '[' expr ']'
//        | '[' [expr (',' expr)*] ']'
//        | '(' expr ')'
//        | if expr block [else block]
//        | def '(' [ID (',' ID)*] ')' block

// Precedence
//
// [ ]
// ( ) .
// - ! not
// * /
// + -
// < >
// == !=
// and
// or

use crate::token::Span;

#[derive(Debug, PartialEq, Default)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

#[derive(Debug, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Debug, PartialEq)]
pub enum StmtKind {
    Let {
        name: Ident,
        value: Expr,
    },
    Return {
        value: Option<Expr>,
    },
    /// The target is either a plain name or a member access.
    Assignment {
        target: Expr,
        value: Expr,
    },
    Expr(Expr),
    Class(Class),
    /// A named function. Inside a class it is a method whose first parameter
    /// is the receiver.
    Method(Method),
    For {
        iterator: Ident,
        /// Evaluated once, as the exclusive upper bound of the loop.
        iterable: Expr,
        body: Block,
    },
    Block(Block),
}

#[derive(Debug, PartialEq)]
pub struct Class {
    pub name: Ident,
    pub fields: Vec<Ident>,
    pub methods: Vec<Method>,
}

#[derive(Debug, PartialEq)]
pub struct Method {
    pub name: Ident,
    pub params: Vec<Ident>,
    pub body: Block,
    pub span: Span,
}

impl Method {
    /// The receiver name of a method, i.e. its first parameter.
    pub fn receiver(&self) -> Option<&Ident> {
        self.params.first()
    }
}

#[derive(Debug, PartialEq)]
pub struct Block {
    pub statements: Vec<Stmt>,
    pub span: Span,
}

impl Block {
    /// Whether the last statement of the block is a `return`.
    pub fn ends_with_return(&self) -> bool {
        matches!(
            self.statements.last(),
            Some(Stmt {
                kind: StmtKind::Return { .. },
                ..
            })
        )
    }
}

#[derive(Debug, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, PartialEq)]
pub enum ExprKind {
    Ident(Ident),
    Int(i64),
    /// The raw text between the quotes. Escape sequences are kept as written.
    String(Box<str>),
    Bool(bool),
    Prefix {
        op: PrefixOperator,
        right: Box<Expr>,
    },
    Infix {
        op: InfixOperator,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    If {
        condition: Box<Expr>,
        consequence: Block,
        alternative: Option<Block>,
    },
    Function {
        params: Vec<Ident>,
        body: Block,
    },
    Array(Vec<Expr>),
    Index {
        base: Box<Expr>,
        index: Box<Expr>,
    },
    Member {
        base: Box<Expr>,
        member: Ident,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PrefixOperator {
    /// `-`
    Neg,
    /// `!` and `not`
    Not,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InfixOperator {
    Add,
    Sub,
    Mul,
    Div,
    Lt,
    Gt,
    Eq,
    NotEq,
    And,
    Or,
}

impl InfixOperator {
    /// Whether both operands are booleans (as opposed to integers).
    pub fn is_logical(self) -> bool {
        matches!(self, InfixOperator::And | InfixOperator::Or)
    }

    /// Whether the operands may be of any comparable type.
    pub fn is_equality(self) -> bool {
        matches!(self, InfixOperator::Eq | InfixOperator::NotEq)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Ident {
    pub name: Box<str>,
    pub span: Span,
}

impl Ident {
    pub fn as_str(&self) -> &str {
        &self.name
    }
}
