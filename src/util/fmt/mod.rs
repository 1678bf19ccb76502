use std::fmt;

use crate::token::Spanned;

pub mod error;
pub mod tree;

/// Displays an item prefixed by the one-based `line:col` of its span.
pub fn located<'a, T>(src: &'a str, item: &'a Spanned<T>) -> impl fmt::Display + 'a
where
    Spanned<T>: fmt::Display,
{
    Located { src, item }
}

struct Located<'a, T> {
    src: &'a str,
    item: &'a Spanned<T>,
}

impl<T> fmt::Display for Located<'_, T>
where
    Spanned<T>: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (line, col) = self.item.span.line_col(self.src);
        write!(f, "{line}:{col}: {}", self.item)
    }
}
