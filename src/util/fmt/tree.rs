use std::io::Write;

use crate::ast::*;

const INDENT_WIDTH: usize = 2;

pub fn print_program_string(program: &Program) -> String {
    let mut buf = Vec::with_capacity(1024);
    print_program(&mut buf, program).unwrap();
    String::from_utf8(buf).unwrap()
}

pub fn print_program(w: &mut impl Write, program: &Program) -> std::io::Result<()> {
    for stmt in &program.statements {
        print_stmt(w, 0, stmt)?;
    }
    Ok(())
}

fn print_stmt(w: &mut impl Write, i: usize, stmt: &Stmt) -> std::io::Result<()> {
    let span = stmt.span;
    match &stmt.kind {
        StmtKind::Let { name, value } => {
            sp(w, i)?;
            writeln!(w, "let {} ({span})", name.as_str())?;
            print_expr(w, i + 1, value)?;
        }
        StmtKind::Return { value } => {
            sp(w, i)?;
            writeln!(w, "return ({span})")?;
            if let Some(value) = value {
                print_expr(w, i + 1, value)?;
            }
        }
        StmtKind::Assignment { target, value } => {
            sp(w, i)?;
            writeln!(w, "assignment ({span})")?;
            print_expr(w, i + 1, target)?;
            print_expr(w, i + 1, value)?;
        }
        StmtKind::Expr(expr) => {
            sp(w, i)?;
            writeln!(w, "expr ({span})")?;
            print_expr(w, i + 1, expr)?;
        }
        StmtKind::Class(class) => {
            sp(w, i)?;
            write!(w, "class {}", class.name.as_str())?;
            for field in &class.fields {
                write!(w, " {}", field.as_str())?;
            }
            writeln!(w, " ({span})")?;
            for method in &class.methods {
                print_method(w, i + 1, method)?;
            }
        }
        StmtKind::Method(method) => print_method(w, i, method)?,
        StmtKind::For {
            iterator,
            iterable,
            body,
        } => {
            sp(w, i)?;
            writeln!(w, "for {} ({span})", iterator.as_str())?;
            print_expr(w, i + 1, iterable)?;
            print_block(w, i + 1, body)?;
        }
        StmtKind::Block(block) => {
            sp(w, i)?;
            writeln!(w, "block ({span})")?;
            print_block(w, i + 1, block)?;
        }
    }
    Ok(())
}

fn print_method(w: &mut impl Write, i: usize, method: &Method) -> std::io::Result<()> {
    sp(w, i)?;
    write!(w, "def {}", method.name.as_str())?;
    print_params(w, &method.params)?;
    writeln!(w, " ({})", method.span)?;
    print_block(w, i + 1, &method.body)
}

fn print_params(w: &mut impl Write, params: &[Ident]) -> std::io::Result<()> {
    write!(w, "(")?;
    for (idx, param) in params.iter().enumerate() {
        if idx > 0 {
            write!(w, ", ")?;
        }
        write!(w, "{}", param.as_str())?;
    }
    write!(w, ")")
}

fn print_block(w: &mut impl Write, i: usize, block: &Block) -> std::io::Result<()> {
    for stmt in &block.statements {
        print_stmt(w, i, stmt)?;
    }
    Ok(())
}

pub fn print_expr(w: &mut impl Write, i: usize, expr: &Expr) -> std::io::Result<()> {
    sp(w, i)?;
    let span = expr.span;
    match &expr.kind {
        ExprKind::Ident(ident) => {
            writeln!(w, "ident {} ({span})", ident.as_str())?;
        }
        ExprKind::Int(val) => {
            writeln!(w, "int {val} ({span})")?;
        }
        ExprKind::String(val) => {
            writeln!(w, "string \"{val}\" ({span})")?;
        }
        ExprKind::Bool(val) => {
            writeln!(w, "bool {val} ({span})")?;
        }
        ExprKind::Prefix { op, right } => {
            writeln!(w, "prefix {op:?} ({span})")?;
            print_expr(w, i + 1, right)?;
        }
        ExprKind::Infix { op, left, right } => {
            writeln!(w, "infix {op:?} ({span})")?;
            print_expr(w, i + 1, left)?;
            print_expr(w, i + 1, right)?;
        }
        ExprKind::Call { callee, args } => {
            writeln!(w, "call ({span})")?;
            print_expr(w, i + 1, callee)?;
            for arg in args {
                print_expr(w, i + 1, arg)?;
            }
        }
        ExprKind::If {
            condition,
            consequence,
            alternative,
        } => {
            writeln!(w, "if ({span})")?;
            print_expr(w, i + 1, condition)?;
            sp(w, i + 1)?;
            writeln!(w, "then")?;
            print_block(w, i + 2, consequence)?;
            if let Some(alternative) = alternative {
                sp(w, i + 1)?;
                writeln!(w, "else")?;
                print_block(w, i + 2, alternative)?;
            }
        }
        ExprKind::Function { params, body } => {
            write!(w, "def")?;
            print_params(w, params)?;
            writeln!(w, " ({span})")?;
            print_block(w, i + 1, body)?;
        }
        ExprKind::Array(elements) => {
            writeln!(w, "array ({span})")?;
            for element in elements {
                print_expr(w, i + 1, element)?;
            }
        }
        ExprKind::Index { base, index } => {
            writeln!(w, "index ({span})")?;
            print_expr(w, i + 1, base)?;
            print_expr(w, i + 1, index)?;
        }
        ExprKind::Member { base, member } => {
            writeln!(w, "member {} ({span})", member.as_str())?;
            print_expr(w, i + 1, base)?;
        }
    }
    Ok(())
}

fn sp(w: &mut impl Write, i: usize) -> std::io::Result<()> {
    write!(w, "{:width$}", "", width = i * INDENT_WIDTH)
}
