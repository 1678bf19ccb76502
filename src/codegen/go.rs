use std::{
    borrow::Cow,
    collections::HashSet,
    fmt::{self, Write},
    format_args as f,
};

use crate::{
    ast::{
        Block, Class, Expr, ExprKind, Ident, InfixOperator, Method, PrefixOperator, Program,
        Stmt, StmtKind,
    },
    codegen::Error,
    token::Span,
};

type Result<T, E = Error> = std::result::Result<T, E>;

const DEFAULT_CODE_CAPACITY: usize = 4 * 1024; // 4 KiB

/// The boxed value type.
const ANY: &str = "interface{}";
const INT: &str = "int64";
const BOOL: &str = "bool";
const ARRAY: &str = "[]interface{}";

const PRINT: &str = "print";

/// Go keywords, plus the predeclared and package names generated code uses.
static RESERVED: phf::Set<&'static str> = phf::phf_set! {
    "break", "case", "chan", "const", "continue", "default", "defer", "else",
    "fallthrough", "for", "func", "go", "goto", "if", "import", "interface",
    "map", "package", "range", "return", "select", "struct", "switch", "type",
    "var",
    "bool", "fmt", "int64", "main", "nil",
};

/// Go code generator.
///
/// Values produced at the top level keep their static Go types. Inside a
/// function or method body, parameters, locals and the results of calls,
/// member accesses and indexing are boxed in `interface{}`, and get unboxed
/// right where a concrete type is needed.
pub struct Generator {
    /// Structs, methods and functions, in declaration order.
    functions: String,
    /// Body of `func main`.
    main: String,
    sink: Sink,
    depth: usize,
    uses_fmt: bool,
    /// Names already bound in `func main`.
    declared: HashSet<Box<str>>,
    /// Loop iterators in `func main`.
    natives: HashSet<Box<str>>,
    /// Names of `func main` declared up front. They hold boxed values.
    hoisted: HashSet<Box<str>>,
    /// Classes declared so far, in declaration order.
    classes: Vec<ClassInfo>,
    /// Set while generating a function or method body.
    scope: Option<FnScope>,
    /// Counter for hoisted loop bounds.
    loops: usize,
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum Sink {
    Main,
    Functions,
}

struct ClassInfo {
    name: Box<str>,
    fields: Vec<Box<str>>,
    methods: Vec<Box<str>>,
}

impl ClassInfo {
    fn has_member(&self, member: &str) -> bool {
        let matches = |name: &Box<str>| &**name == member;
        self.fields.iter().any(matches) || self.methods.iter().any(matches)
    }
}

#[derive(Default)]
struct FnScope {
    declared: HashSet<Box<str>>,
    /// The receiver name, inside a method.
    receiver: Option<Box<str>>,
    /// Loop iterators. They hold plain `int64` values.
    natives: HashSet<Box<str>>,
}

/// A lowered expression.
struct Value {
    code: String,
    /// Whether the Go type of `code` is `interface{}`.
    boxed: bool,
}

impl Value {
    fn native(code: String) -> Value {
        Value { code, boxed: false }
    }

    /// Asserts a boxed value to `ty`. Other values are left as is.
    fn unbox(self, ty: &str) -> String {
        if self.boxed {
            format!("{}.({ty})", self.code)
        } else {
            self.code
        }
    }
}

impl Generator {
    pub fn new() -> Generator {
        Generator {
            functions: String::with_capacity(DEFAULT_CODE_CAPACITY),
            main: String::with_capacity(DEFAULT_CODE_CAPACITY),
            sink: Sink::Main,
            depth: 1,
            uses_fmt: false,
            declared: HashSet::new(),
            natives: HashSet::new(),
            hoisted: HashSet::new(),
            classes: Vec::new(),
            scope: None,
            loops: 0,
        }
    }

    pub fn generate(mut self, program: &Program) -> Result<String> {
        self.hoist(&program.statements);
        for stmt in &program.statements {
            self.g_stmt(stmt)?;
        }
        Ok(self.finish())
    }

    fn finish(self) -> String {
        let mut code = String::with_capacity(self.functions.len() + self.main.len() + 64);
        code.push_str("package main\n\n");
        if self.uses_fmt {
            code.push_str("import (\n\t\"fmt\"\n)\n\n");
        }
        code.push_str(&self.functions);
        code.push_str("func main() {\n");
        code.push_str(&self.main);
        code.push_str("}\n");
        code
    }
}

impl Default for Generator {
    fn default() -> Self {
        Generator::new()
    }
}

/// Statements.
impl Generator {
    fn g_stmt(&mut self, stmt: &Stmt) -> Result<()> {
        match &stmt.kind {
            StmtKind::Let { name, value } => {
                if let ExprKind::Function { params, body } = &value.kind {
                    return self.g_function(name, params, body, stmt.span);
                }
                let value = self.g_expr(value)?;
                self.bind(name.as_str(), &value);
            }
            StmtKind::Assignment { target, value } => match &target.kind {
                ExprKind::Ident(name) => {
                    let value = self.g_expr(value)?;
                    self.bind(name.as_str(), &value);
                }
                ExprKind::Member { base, member } => {
                    let target = self.g_member(base, member)?;
                    let value = self.g_expr(value)?;
                    self.line(f!("{} = {}", target.code, value.code));
                }
                _ => {
                    return Err(Error::Unsupported {
                        node: "an assignment to this target",
                        span: target.span,
                    })
                }
            },
            StmtKind::Return { value } => self.g_return(value.as_ref(), stmt.span)?,
            StmtKind::Expr(expr) => self.g_expr_stmt(expr)?,
            StmtKind::Class(class) => self.g_class(class, stmt.span)?,
            StmtKind::Method(method) => {
                self.g_function(&method.name, &method.params, &method.body, method.span)?;
            }
            StmtKind::For {
                iterator,
                iterable,
                body,
            } => self.g_for(iterator, iterable, body)?,
            StmtKind::Block(block) => {
                self.line("{");
                self.indented(|this| this.g_block(block))?;
                self.line("}");
            }
        }
        Ok(())
    }

    fn g_block(&mut self, block: &Block) -> Result<()> {
        for stmt in &block.statements {
            self.g_stmt(stmt)?;
        }
        Ok(())
    }

    /// A function or method body. Gets a trailing `return nil` unless it
    /// already ends with a `return`.
    fn g_body(&mut self, body: &Block) -> Result<()> {
        self.indented(|this| {
            this.hoist(&body.statements);
            this.g_block(body)?;
            if !body.ends_with_return() {
                this.line("return nil");
            }
            Ok(())
        })
    }

    /// Declares every name first bound inside a nested block at the start of
    /// the enclosing Go function, so that it stays visible after the block.
    fn hoist(&mut self, statements: &[Stmt]) {
        let (declared, _) = self.locals();
        let names = nested_bindings(statements, declared);
        for name in names {
            let code = go_ident(&name);
            self.line(f!("var {code} {ANY}"));
            self.line(f!("_ = {code}"));
            if self.scope.is_none() {
                self.hoisted.insert(name.clone());
            }
            self.locals().0.insert(name);
        }
    }

    /// Binds a value to a name, declaring it on first use.
    fn bind(&mut self, name: &str, value: &Value) {
        let in_function = self.scope.is_some();
        let first = self.locals().0.insert(name.into());
        let name = go_ident(name);
        let code = &value.code;
        if !first {
            self.line(f!("{name} = {code}"));
            return;
        }
        if in_function {
            self.line(f!("var {name} {ANY} = {code}"));
        } else {
            self.line(f!("{name} := {code}"));
        }
        // Go rejects unused locals.
        self.line(f!("_ = {name}"));
    }

    fn g_return(&mut self, value: Option<&Expr>, span: Span) -> Result<()> {
        match (value, self.scope.is_some()) {
            (Some(value), true) => {
                let value = self.g_expr(value)?;
                self.line(f!("return {}", value.code));
            }
            (None, true) => self.line("return nil"),
            (None, false) => self.line("return"),
            (Some(_), false) => return Err(Error::ReturnOutsideFunction { span }),
        }
        Ok(())
    }

    fn g_expr_stmt(&mut self, expr: &Expr) -> Result<()> {
        match &expr.kind {
            ExprKind::Call { callee, args } if is_print(callee) => {
                let args = self.g_list(args)?;
                self.uses_fmt = true;
                self.line(f!("fmt.Println({args})"));
            }
            ExprKind::Call { callee, .. } if !self.is_constructor(callee) => {
                let call = self.g_expr(expr)?;
                self.line(call.code);
            }
            ExprKind::If {
                condition,
                consequence,
                alternative,
            } => self.g_if(condition, consequence, alternative.as_ref())?,
            _ => {
                let value = self.g_expr(expr)?;
                self.line(f!("_ = {}", value.code));
            }
        }
        Ok(())
    }

    fn g_if(
        &mut self,
        condition: &Expr,
        consequence: &Block,
        alternative: Option<&Block>,
    ) -> Result<()> {
        let condition = self.g_expr(condition)?.unbox(BOOL);
        self.line(f!("if {condition} {{"));
        self.indented(|this| this.g_block(consequence))?;
        if let Some(alternative) = alternative {
            self.line("} else {");
            self.indented(|this| this.g_block(alternative))?;
        }
        self.line("}");
        Ok(())
    }

    /// Lowers `for i in n` into a counting loop from zero up to `n`, which is
    /// evaluated once.
    fn g_for(&mut self, iterator: &Ident, iterable: &Expr, body: &Block) -> Result<()> {
        let bound = self.g_expr(iterable)?.unbox(INT);
        let name = iterator.as_str();
        let i = go_ident(name);
        if matches!(iterable.kind, ExprKind::Int(_) | ExprKind::Ident(_)) {
            self.line(f!("for {i} := {INT}(0); {i} < {bound}; {i}++ {{"));
        } else {
            self.loops += 1;
            let end = format!("_end{}", self.loops);
            self.line(f!(
                "for {i}, {end} := {INT}(0), {bound}; {i} < {end}; {i}++ {{"
            ));
        }

        let (was_declared, was_native) = self.enter_loop(name);
        let res = self.indented(|this| this.g_block(body));
        self.leave_loop(name, was_declared, was_native);
        res?;

        self.line("}");
        Ok(())
    }

    /// Marks a loop iterator as a declared, native local.
    fn enter_loop(&mut self, iterator: &str) -> (bool, bool) {
        let (declared, natives) = self.locals();
        (
            !declared.insert(iterator.into()),
            !natives.insert(iterator.into()),
        )
    }

    /// The iterator goes out of scope with the loop.
    fn leave_loop(&mut self, iterator: &str, was_declared: bool, was_native: bool) {
        let (declared, natives) = self.locals();
        if !was_native {
            natives.remove(iterator);
        }
        if !was_declared {
            declared.remove(iterator);
        }
    }

    /// The declared names and loop iterators of the current Go function.
    fn locals(&mut self) -> (&mut HashSet<Box<str>>, &mut HashSet<Box<str>>) {
        match &mut self.scope {
            Some(scope) => (&mut scope.declared, &mut scope.natives),
            None => (&mut self.declared, &mut self.natives),
        }
    }
}

/// Declarations.
impl Generator {
    fn g_function(
        &mut self,
        name: &Ident,
        params: &[Ident],
        body: &Block,
        span: Span,
    ) -> Result<()> {
        if self.scope.is_some() {
            return Err(Error::Unsupported {
                node: "a nested function definition",
                span,
            });
        }
        let scope = FnScope {
            declared: params.iter().map(|p| p.name.clone()).collect(),
            ..FnScope::default()
        };
        let params = typed_params(params);
        self.into_functions(Some(scope), |this| {
            this.line(f!("func {}({params}) {ANY} {{", go_ident(name.as_str())));
            this.g_body(body)?;
            this.line("}");
            Ok(())
        })
    }

    /// Lowers a class into a struct of boxed fields, followed by one
    /// pointer-receiver method per `def`.
    fn g_class(&mut self, class: &Class, span: Span) -> Result<()> {
        if self.scope.is_some() {
            return Err(Error::Unsupported {
                node: "a nested class definition",
                span,
            });
        }
        if let Some(method) = class.methods.iter().find(|m| m.receiver().is_none()) {
            return Err(Error::MissingReceiver {
                method: method.name.name.clone(),
                span: method.span,
            });
        }
        let mut members = HashSet::new();
        let duplicate = class
            .fields
            .iter()
            .chain(class.methods.iter().map(|m| &m.name))
            .find(|member| !members.insert(member.as_str()));
        if let Some(member) = duplicate {
            return Err(Error::DuplicateMember {
                class: class.name.name.clone(),
                member: member.name.clone(),
                span: member.span,
            });
        }

        // Registered up front, so methods may refer to the class itself.
        self.classes.push(ClassInfo {
            name: class.name.name.clone(),
            fields: class.fields.iter().map(|f| f.name.clone()).collect(),
            methods: class.methods.iter().map(|m| m.name.name.clone()).collect(),
        });

        let name = go_ident(class.name.as_str());
        self.into_functions(None, |this| {
            if class.fields.is_empty() {
                this.line(f!("type {name} struct{{}}"));
                return;
            }
            this.line(f!("type {name} struct {{"));
            this.indented(|this| {
                for field in &class.fields {
                    this.line(f!("{} {ANY}", go_ident(field.as_str())));
                }
            });
            this.line("}");
        });

        for method in &class.methods {
            self.g_method(&name, method)?;
        }
        Ok(())
    }

    fn g_method(&mut self, class: &str, method: &Method) -> Result<()> {
        let Some((receiver, params)) = method.params.split_first() else {
            return Err(Error::MissingReceiver {
                method: method.name.name.clone(),
                span: method.span,
            });
        };
        let scope = FnScope {
            declared: method.params.iter().map(|p| p.name.clone()).collect(),
            receiver: Some(receiver.name.clone()),
            ..FnScope::default()
        };
        let params = typed_params(params);
        self.into_functions(Some(scope), |this| {
            this.line(f!(
                "func ({} *{class}) {}({params}) {ANY} {{",
                go_ident(receiver.as_str()),
                go_ident(method.name.as_str()),
            ));
            this.g_body(&method.body)?;
            this.line("}");
            Ok(())
        })
    }
}

/// Expressions.
impl Generator {
    fn g_expr(&mut self, expr: &Expr) -> Result<Value> {
        let span = expr.span;
        match &expr.kind {
            ExprKind::Ident(ident) => Ok(self.g_ident(ident)),
            ExprKind::Int(int) => Ok(Value::native(format!("{INT}({int})"))),
            ExprKind::String(string) => Ok(Value::native(format!("\"{string}\""))),
            ExprKind::Bool(value) => Ok(Value::native(value.to_string())),
            ExprKind::Prefix { op, right } => {
                let right = self.g_expr(right)?;
                let code = match op {
                    PrefixOperator::Neg => format!("(-{})", right.unbox(INT)),
                    PrefixOperator::Not => format!("(!{})", right.unbox(BOOL)),
                };
                Ok(Value::native(code))
            }
            ExprKind::Infix { op, left, right } => {
                let left = self.g_expr(left)?;
                let right = self.g_expr(right)?;
                let (left, right) = if op.is_equality() {
                    // Boxed values compare by dynamic type and value.
                    (left.code, right.code)
                } else {
                    let ty = if op.is_logical() { BOOL } else { INT };
                    (left.unbox(ty), right.unbox(ty))
                };
                let op = operator(*op);
                Ok(Value::native(format!("({left} {op} {right})")))
            }
            ExprKind::Call { callee, args } => self.g_call(callee, args, span),
            ExprKind::If { .. } => Err(Error::Unsupported {
                node: "an if expression used as a value",
                span,
            }),
            ExprKind::Function { .. } => Err(Error::Unsupported {
                node: "a function literal outside of a let statement",
                span,
            }),
            ExprKind::Array(elements) => {
                let elements = self.g_list(elements)?;
                Ok(Value::native(format!("{ARRAY}{{{elements}}}")))
            }
            ExprKind::Index { base, index } => {
                let base = self.g_expr(base)?.unbox(ARRAY);
                let index = self.g_expr(index)?.unbox(INT);
                Ok(self.produced(format!("{base}[{index}]")))
            }
            ExprKind::Member { base, member } => self.g_member(base, member),
        }
    }

    fn g_ident(&self, ident: &Ident) -> Value {
        let name = ident.as_str();
        let boxed = match &self.scope {
            Some(scope) => {
                let is_receiver = scope.receiver.as_deref() == Some(name);
                !is_receiver && !scope.natives.contains(name)
            }
            None => self.hoisted.contains(name) && !self.natives.contains(name),
        };
        Value {
            code: go_ident(name).into_owned(),
            boxed,
        }
    }

    fn g_call(&mut self, callee: &Expr, args: &[Expr], span: Span) -> Result<Value> {
        match &callee.kind {
            ExprKind::Ident(name) if name.as_str() == PRINT => Err(Error::Unsupported {
                node: "print used as a value",
                span,
            }),
            ExprKind::Ident(name) => {
                if let Some(idx) = self.class_index(name.as_str()) {
                    return self.g_construct(idx, args, span);
                }
                let args = self.g_list(args)?;
                Ok(self.produced(format!("{}({args})", go_ident(name.as_str()))))
            }
            ExprKind::Member { base, member } => {
                let method = self.g_member(base, member)?;
                let args = self.g_list(args)?;
                Ok(self.produced(format!("{}({args})", method.code)))
            }
            _ => Err(Error::Unsupported {
                node: "a call of something other than a name or a method",
                span,
            }),
        }
    }

    /// `C()` allocates a zeroed struct. `C(a, b, ...)` initializes every field
    /// in declaration order.
    fn g_construct(&mut self, class_idx: usize, args: &[Expr], span: Span) -> Result<Value> {
        let class = &self.classes[class_idx];
        let name = go_ident(&class.name).into_owned();
        if args.is_empty() {
            return Ok(Value::native(format!("&{name}{{}}")));
        }
        if args.len() != class.fields.len() {
            return Err(Error::ConstructorArity {
                class: class.name.clone(),
                expected: class.fields.len(),
                actual: args.len(),
                span,
            });
        }

        let fields = class.fields.clone();
        let mut inits = Vec::with_capacity(args.len());
        for (field, arg) in fields.iter().zip(args) {
            let value = self.g_expr(arg)?;
            inits.push(format!("{}: {}", go_ident(field), value.code));
        }
        Ok(Value::native(format!("&{name}{{{}}}", inits.join(", "))))
    }

    /// Lowers `base.member`. A boxed base is first asserted to the pointer
    /// type of the only class declared so far that has such a member.
    fn g_member(&mut self, base: &Expr, member: &Ident) -> Result<Value> {
        let base = self.g_expr(base)?;
        let receiver = if base.boxed {
            let class = self.infer_receiver(member)?;
            format!("{}.(*{})", base.code, go_ident(class))
        } else {
            base.code
        };
        Ok(self.produced(format!("{receiver}.{}", go_ident(member.as_str()))))
    }

    fn infer_receiver(&self, member: &Ident) -> Result<&str> {
        let mut candidates = self
            .classes
            .iter()
            .filter(|class| class.has_member(member.as_str()));
        match (candidates.next(), candidates.next()) {
            (Some(class), None) => Ok(&*class.name),
            _ => Err(Error::UnknownReceiver {
                member: member.name.clone(),
                span: member.span,
            }),
        }
    }

    /// Lowers a comma separated list of expressions.
    fn g_list(&mut self, exprs: &[Expr]) -> Result<String> {
        let mut list = String::new();
        for (idx, expr) in exprs.iter().enumerate() {
            if idx > 0 {
                list.push_str(", ");
            }
            list.push_str(&self.g_expr(expr)?.code);
        }
        Ok(list)
    }

    /// A value of unknown type. Boxed inside a body.
    fn produced(&self, code: String) -> Value {
        Value {
            code,
            boxed: self.scope.is_some(),
        }
    }

    fn class_index(&self, name: &str) -> Option<usize> {
        self.classes.iter().position(|class| &*class.name == name)
    }

    fn is_constructor(&self, callee: &Expr) -> bool {
        matches!(&callee.kind, ExprKind::Ident(name) if self.class_index(name.as_str()).is_some())
    }
}

// Utility functions.
impl Generator {
    /// Writes a line at the current indentation.
    fn line(&mut self, f: impl fmt::Display) {
        let buf = match self.sink {
            Sink::Main => &mut self.main,
            Sink::Functions => &mut self.functions,
        };
        for _ in 0..self.depth {
            buf.push('\t');
        }
        writeln!(buf, "{f}").expect("code emit should be infallible");
    }

    fn indented<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        self.depth += 1;
        let res = f(self);
        self.depth -= 1;
        res
    }

    /// Writes a top-level declaration into the functions buffer, followed by
    /// an empty line.
    fn into_functions<T>(&mut self, scope: Option<FnScope>, f: impl FnOnce(&mut Self) -> T) -> T {
        let sink = std::mem::replace(&mut self.sink, Sink::Functions);
        let depth = std::mem::replace(&mut self.depth, 0);
        self.scope = scope;
        let res = f(self);
        self.functions.push('\n');
        self.scope = None;
        self.sink = sink;
        self.depth = depth;
        res
    }
}

fn is_print(callee: &Expr) -> bool {
    matches!(&callee.kind, ExprKind::Ident(name) if name.as_str() == PRINT)
}

fn typed_params(params: &[Ident]) -> String {
    params
        .iter()
        .map(|p| format!("{} {ANY}", go_ident(p.as_str())))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Maps a name to a Go identifier that clashes with no keyword and no
/// generated name, by appending `_`. Names that already start or end with
/// `_` get one too, which keeps the mapping one-to-one.
fn go_ident(name: &str) -> Cow<'_, str> {
    if RESERVED.contains(name) || name.starts_with('_') || name.ends_with('_') {
        Cow::Owned(format!("{name}_"))
    } else {
        Cow::Borrowed(name)
    }
}

/// Names whose first binding in `statements` sits inside a nested block,
/// in order of appearance. Names in `declared` are already bound.
fn nested_bindings(statements: &[Stmt], declared: &HashSet<Box<str>>) -> Vec<Box<str>> {
    fn walk<'a>(
        statements: &'a [Stmt],
        nested: bool,
        seen: &mut HashSet<&'a str>,
        hoisted: &mut Vec<Box<str>>,
    ) {
        for stmt in statements {
            let name = match &stmt.kind {
                StmtKind::Let { value, .. } if matches!(value.kind, ExprKind::Function { .. }) => {
                    continue
                }
                StmtKind::Let { name, .. } => name,
                StmtKind::Assignment { target, .. } => match &target.kind {
                    ExprKind::Ident(name) => name,
                    _ => continue,
                },
                StmtKind::Expr(Expr {
                    kind:
                        ExprKind::If {
                            consequence,
                            alternative,
                            ..
                        },
                    ..
                }) => {
                    walk(&consequence.statements, true, seen, hoisted);
                    if let Some(alternative) = alternative {
                        walk(&alternative.statements, true, seen, hoisted);
                    }
                    continue;
                }
                StmtKind::For { body, .. } => {
                    walk(&body.statements, true, seen, hoisted);
                    continue;
                }
                StmtKind::Block(block) => {
                    walk(&block.statements, true, seen, hoisted);
                    continue;
                }
                _ => continue,
            };
            if seen.insert(name.as_str()) && nested {
                hoisted.push(name.name.clone());
            }
        }
    }

    let mut seen = declared.iter().map(|name| &**name).collect();
    let mut hoisted = Vec::new();
    walk(statements, false, &mut seen, &mut hoisted);
    hoisted
}

fn operator(op: InfixOperator) -> &'static str {
    match op {
        InfixOperator::Add => "+",
        InfixOperator::Sub => "-",
        InfixOperator::Mul => "*",
        InfixOperator::Div => "/",
        InfixOperator::Lt => "<",
        InfixOperator::Gt => ">",
        InfixOperator::Eq => "==",
        InfixOperator::NotEq => "!=",
        InfixOperator::And => "&&",
        InfixOperator::Or => "||",
    }
}
