use crate::{codegen, parser, token::Spanned, util::fmt::tree};

pub fn format_errors<E>(e: &[Spanned<E>]) -> Vec<String>
where
    Spanned<E>: std::fmt::Display,
{
    e.iter().map(|e| format!("{e:#}")).collect()
}

/// Each variant contains the input.
pub enum Test {
    ParserProgram(&'static str),
    Codegen(&'static str),
}

pub enum Assertion {
    TreeOk(&'static str),
    TreeError(&'static str),
    ExpectedErrors(&'static [&'static str]),
    /// Expected Go source. Leading groups of four spaces stand for tabs.
    GoOk(&'static str),
}

#[track_caller]
pub fn run_pipeline(test: Test) -> (String, Vec<String>) {
    match test {
        Test::ParserProgram(input) => {
            let (prog, errors) = match parser::parse_program(input) {
                Ok(prog) => (prog, vec![]),
                Err((prog, errors)) => (prog, errors),
            };
            let tree = tree::print_program_string(&prog);
            (tree, format_errors(&errors))
        }
        Test::Codegen(input) => {
            let prog = match parser::parse_program(input) {
                Ok(prog) => prog,
                Err((_, errors)) => return (String::new(), format_errors(&errors)),
            };
            match codegen::generate(&prog) {
                Ok(code) => (code, vec![]),
                Err(e) => (String::new(), vec![format!("{}: {e}", e.span())]),
            }
        }
    }
}

#[track_caller]
pub fn run_assertion(
    assertion: Assertion,
    formatted_actual_tree: &str,
    formatted_actual_errors: &[String],
) {
    match assertion {
        Assertion::TreeOk(expected_tree) => {
            let expected_errors: &[&str] = &[];
            ::pretty_assertions::assert_eq!(formatted_actual_errors, expected_errors);
            ::pretty_assertions::assert_eq!(formatted_actual_tree.trim(), expected_tree.trim());
        }
        Assertion::TreeError(expected_tree) => {
            ::pretty_assertions::assert_eq!(formatted_actual_tree.trim(), expected_tree.trim());
        }
        Assertion::ExpectedErrors(expected_errors) => {
            ::pretty_assertions::assert_eq!(formatted_actual_errors, expected_errors);
        }
        Assertion::GoOk(expected_code) => {
            let expected_errors: &[&str] = &[];
            ::pretty_assertions::assert_eq!(formatted_actual_errors, expected_errors);
            let expected_code = tabify(expected_code);
            ::pretty_assertions::assert_eq!(formatted_actual_tree.trim(), expected_code.trim());
        }
    }
}

/// Turns each leading group of four spaces into a tab.
fn tabify(code: &str) -> String {
    let mut out = String::with_capacity(code.len());
    for line in code.lines() {
        let trimmed = line.trim_start_matches(' ');
        let tabs = (line.len() - trimmed.len()) / 4;
        out.extend(std::iter::repeat_n('\t', tabs));
        out.push_str(trimmed);
        out.push('\n');
    }
    out
}

macro_rules! tree_tests {
    (
        use $test_kind:ident;

        $(
            fn $test_name:ident() {
                let $source_kind:ident = $source:expr;
                $($assertions_tt:tt)*
            }
        )*
    ) => {
        $(
            #[test]
            fn $test_name() {
                let test: crate::util::test_utils::Test =
                    tree_tests!(@@get_test($test_kind, $source_kind), $source);
                let (formatted_actual_tree, formatted_actual_errors) =
                    crate::util::test_utils::run_pipeline(test);
                let ctx = (&formatted_actual_tree, &formatted_actual_errors);
                tree_tests!(@@expand_assertions, ctx, [$($assertions_tt)*]);
            }
        )*
    };

    (@@expand_assertions, $ctx:expr, []) => {};
    (@@expand_assertions, $ctx:expr, [
        // Comments are allowed between assertions.
        let $assertion:ident = $assertion_expected:expr;
        $($rest_assertions_tt:tt)*
    ]) => {
        crate::util::test_utils::run_assertion(
            tree_tests!(@@assertion, $assertion, $assertion_expected),
            $ctx.0,
            $ctx.1,
        );
        tree_tests!(@@expand_assertions, $ctx, [$($rest_assertions_tt)*]);
    };

    (@@assertion, tree_ok, $expected:expr) => {
        crate::util::test_utils::Assertion::TreeOk(::indoc::indoc! { $expected })
    };
    (@@assertion, tree_error, $expected:expr) => {
        crate::util::test_utils::Assertion::TreeError(::indoc::indoc! { $expected })
    };
    (@@assertion, expected_errors, $expected:expr) => {
        crate::util::test_utils::Assertion::ExpectedErrors($expected)
    };
    (@@assertion, go_ok, $expected:expr) => {
        crate::util::test_utils::Assertion::GoOk(::indoc::indoc! { $expected })
    };

    // Sources are unindented, since indentation is significant.
    (@@get_test(parser, program), $source:expr) => {
        crate::util::test_utils::Test::ParserProgram(::indoc::indoc! { $source })
    };
    (@@get_test(codegen, program), $source:expr) => {
        crate::util::test_utils::Test::Codegen(::indoc::indoc! { $source })
    };
}
pub(crate) use tree_tests;
