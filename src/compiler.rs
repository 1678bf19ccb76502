//! The whole pipeline, from gopy source to Go source.

use thiserror::Error;

use crate::{ast::Program, codegen, parser, util::fmt::located};

#[derive(Debug, Error)]
pub enum CompileError {
    /// Every parser diagnostic, rendered as `LINE:COL: message`.
    #[error("{}", .0.join("\n"))]
    Parse(Vec<String>),

    #[error("{line}:{col}: {source}")]
    Generate {
        line: usize,
        col: usize,
        source: codegen::Error,
    },
}

/// Parses a whole program, failing if there is any diagnostic.
pub fn parse(src: &str) -> Result<Program, CompileError> {
    parser::parse_program(src).map_err(|(_, errors)| {
        let errors = errors.iter().map(|e| located(src, e).to_string());
        CompileError::Parse(errors.collect())
    })
}

/// Compiles a gopy program into the source of a Go `main` package.
///
/// Generation only runs on a program that parsed without diagnostics.
pub fn compile(src: &str) -> Result<String, CompileError> {
    let program = parse(src)?;
    codegen::generate(&program).map_err(|source| {
        let (line, col) = source.span().line_col(src);
        CompileError::Generate { line, col, source }
    })
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    use super::{compile, CompileError};
    use crate::codegen;

    #[test]
    fn test_compile() {
        let src = indoc! {r#"
            # greets everyone
            let names = ["a", "b"]
            for i in 2
                print("hi", names[i])
        "#};
        let expected = indoc! {"
            package main

            import (
            \t\"fmt\"
            )

            func main() {
            \tnames := []interface{}{\"a\", \"b\"}
            \t_ = names
            \tfor i := int64(0); i < int64(2); i++ {
            \t\tfmt.Println(\"hi\", names[i])
            \t}
            }
        "};
        assert_eq!(compile(src).unwrap(), expected);
    }

    #[test]
    fn test_all_parse_errors_are_reported() {
        let src = indoc! {"
            let = 1
            let x = 2
            let y 3
        "};
        let Err(CompileError::Parse(errors)) = compile(src) else {
            panic!("expected parse errors");
        };
        assert_eq!(
            errors,
            [
                "1:5: expected token Identifier, but got Assign",
                "3:7: expected token Assign, but got Int",
            ]
        );
    }

    #[test]
    fn test_generate_error_location() {
        let src = indoc! {"
            let a = 1
            return a
        "};
        let err = compile(src).unwrap_err();
        assert!(matches!(
            err,
            CompileError::Generate {
                source: codegen::Error::ReturnOutsideFunction { .. },
                ..
            }
        ));
        assert_eq!(
            err.to_string(),
            "2:1: cannot return a value outside of a function"
        );
    }
}
