use thiserror::Error;

use crate::{ast::Program, token::Span};

mod go;


pub use go::Generator;

/// Lowers a program into the source of a single Go `main` package.
///
/// Statements are lowered in order. Structs, methods and functions go in
/// front of `func main`, which holds everything else. The first construct
/// that can't be lowered aborts the whole pass.
pub fn generate(program: &Program) -> Result<String, Error> {
    Generator::new().generate(program)
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("cannot generate {node}")]
    Unsupported { node: &'static str, span: Span },

    #[error("method {method} must take its receiver as the first parameter")]
    MissingReceiver { method: Box<str>, span: Span },

    #[error("class {class} declares `{member}` more than once")]
    DuplicateMember {
        class: Box<str>,
        member: Box<str>,
        span: Span,
    },

    #[error("cannot infer the class of the receiver of `.{member}`")]
    UnknownReceiver { member: Box<str>, span: Span },

    #[error("class {class} has {expected} fields, but got {actual} arguments")]
    ConstructorArity {
        class: Box<str>,
        expected: usize,
        actual: usize,
        span: Span,
    },

    #[error("cannot return a value outside of a function")]
    ReturnOutsideFunction { span: Span },
}

impl Error {
    /// Source location of the offending node.
    pub fn span(&self) -> Span {
        match self {
            Error::Unsupported { span, .. }
            | Error::MissingReceiver { span, .. }
            | Error::DuplicateMember { span, .. }
            | Error::UnknownReceiver { span, .. }
            | Error::ConstructorArity { span, .. }
            | Error::ReturnOutsideFunction { span } => *span,
        }
    }
}
