use std::fmt;

use crate::{parser, token::Spanned};

impl fmt::Display for Spanned<parser::Error> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Spanned { span, inner: error } = self;

        if f.alternate() {
            write!(f, "{span}: ")?;
        }

        use parser::Error::*;
        match error {
            InvalidAssignmentTarget => write!(f, "invalid assignment target"),
            NonMethodInClass => {
                write!(f, "only method definitions are allowed in a class body")
            }
            UnexpectedTokenInExpr { token } => {
                write!(f, "unexpected token {token:?} in expression")
            }
            Unexpected { actual, expected } => {
                write!(f, "expected token {expected:?}, but got {actual:?}")
            }
            UnexpectedAny { actual, expected } => {
                write!(f, "expected one of {expected:?}, but got {actual:?}")
            }
            UnexpectedOperator { actual } => write!(f, "unexpected operator {actual:?}"),
            ParseInt => write!(f, "integer literal out of range"),
            UnexpectedChar => write!(f, "unexpected character"),
            UnterminatedString => write!(f, "unterminated string"),
        }
    }
}
