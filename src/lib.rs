//! A compiler for gopy, a small indentation-sensitive language, to Go.
//!
//! Source text goes through the [`lexer`], the [`parser`] and the
//! [`codegen`] stage, which emits a single Go `main` package. The
//! [`compiler`] module chains them.

/// The lexer takes the source input, mapping it into a sequence of tokens,
/// including the synthetic `Indent` and `Dedent` ones.
pub mod lexer;

/// The parser takes a sequence of tokens, mapping it into an AST.
pub mod parser;

/// The code generator lowers an AST into Go source.
pub mod codegen;

pub mod compiler;

pub mod ast;
pub mod token;

pub mod util;
