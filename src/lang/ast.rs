//! Immutable syntax tree for the subject language.
//!
//! Nodes are tagged variants behind `Arc`, so a rewrite rebuilds only the
//! path from the root to the mutated node and shares every untouched subtree
//! with the original. Each tree has a structural fingerprint (xxh3 over a
//! canonical walk) used to deduplicate mutants.

use std::fmt;
use std::sync::Arc;

use xxhash_rust::xxh3::Xxh3;

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Arithmetic negation, `-x`.
    Neg,
    /// Logical negation, `not x`.
    Not,
}

/// Binary arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// Short-circuiting logical operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicOp {
    And,
    Or,
}

/// An expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// The `none` literal.
    None,
    /// Boolean literal.
    Bool(bool),
    /// Integer literal.
    Int(i64),
    /// Float literal.
    Float(f64),
    /// String literal.
    Str(Arc<str>),
    /// List literal.
    List(Arc<[Arc<Expr>]>),
    /// Name reference.
    Name(Arc<str>),
    /// Unary operation.
    Unary(UnaryOp, Arc<Expr>),
    /// Binary arithmetic.
    Binary(BinOp, Arc<Expr>, Arc<Expr>),
    /// Comparison.
    Compare(CmpOp, Arc<Expr>, Arc<Expr>),
    /// Short-circuiting logic.
    Logic(LogicOp, Arc<Expr>, Arc<Expr>),
    /// Call of a builtin or the enclosing function.
    Call(Arc<str>, Arc<[Arc<Expr>]>),
    /// Indexing, `base[index]`.
    Index(Arc<Expr>, Arc<Expr>),
}

/// A statement node.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `let name = expr;`
    Let(Arc<str>, Arc<Expr>),
    /// `name = expr;`
    Assign(Arc<str>, Arc<Expr>),
    /// `if cond { .. } else { .. }`
    If {
        cond: Arc<Expr>,
        then_body: Block,
        else_body: Option<Block>,
    },
    /// `while cond { .. }`
    While { cond: Arc<Expr>, body: Block },
    /// `for var in range(count) { .. }`
    For {
        var: Arc<str>,
        count: Arc<Expr>,
        body: Block,
    },
    /// `return expr;` / `return;`
    Return(Option<Arc<Expr>>),
    /// Bare expression statement.
    Expr(Arc<Expr>),
}

/// A sequence of statements.
pub type Block = Arc<[Arc<Stmt>]>;

/// A parsed function definition.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    /// Function name.
    pub name: Arc<str>,
    /// Ordered parameter names.
    pub params: Arc<[Arc<str>]>,
    /// Function body.
    pub body: Block,
}

impl FunctionDef {
    /// Structural fingerprint of the whole definition.
    ///
    /// Identical trees always hash identically; the hash covers operator
    /// tags, literal payloads and names, so any single-node rewrite changes
    /// it.
    pub fn fingerprint(&self) -> u64 {
        let mut h = Xxh3::new();
        hash_str(&self.name, &mut h);
        h.update(&[self.params.len() as u8]);
        for p in self.params.iter() {
            hash_str(p, &mut h);
        }
        hash_block(&self.body, &mut h);
        h.digest()
    }

    /// Render the definition back to source text.
    pub fn source(&self) -> String {
        self.to_string()
    }
}

fn hash_str(s: &str, h: &mut Xxh3) {
    h.update(&(s.len() as u64).to_le_bytes());
    h.update(s.as_bytes());
}

fn hash_expr(e: &Expr, h: &mut Xxh3) {
    match e {
        Expr::None => h.update(&[0x01]),
        Expr::Bool(b) => {
            h.update(&[0x02, *b as u8]);
        }
        Expr::Int(n) => {
            h.update(&[0x03]);
            h.update(&n.to_le_bytes());
        }
        Expr::Float(x) => {
            h.update(&[0x04]);
            h.update(&x.to_bits().to_le_bytes());
        }
        Expr::Str(s) => {
            h.update(&[0x05]);
            hash_str(s, h);
        }
        Expr::List(items) => {
            h.update(&[0x06]);
            h.update(&(items.len() as u64).to_le_bytes());
            for item in items.iter() {
                hash_expr(item, h);
            }
        }
        Expr::Name(name) => {
            h.update(&[0x07]);
            hash_str(name, h);
        }
        Expr::Unary(op, operand) => {
            h.update(&[0x08, *op as u8]);
            hash_expr(operand, h);
        }
        Expr::Binary(op, lhs, rhs) => {
            h.update(&[0x09, *op as u8]);
            hash_expr(lhs, h);
            hash_expr(rhs, h);
        }
        Expr::Compare(op, lhs, rhs) => {
            h.update(&[0x0a, *op as u8]);
            hash_expr(lhs, h);
            hash_expr(rhs, h);
        }
        Expr::Logic(op, lhs, rhs) => {
            h.update(&[0x0b, *op as u8]);
            hash_expr(lhs, h);
            hash_expr(rhs, h);
        }
        Expr::Call(name, args) => {
            h.update(&[0x0c]);
            hash_str(name, h);
            h.update(&(args.len() as u64).to_le_bytes());
            for arg in args.iter() {
                hash_expr(arg, h);
            }
        }
        Expr::Index(base, index) => {
            h.update(&[0x0d]);
            hash_expr(base, h);
            hash_expr(index, h);
        }
    }
}

fn hash_block(block: &Block, h: &mut Xxh3) {
    h.update(&(block.len() as u64).to_le_bytes());
    for stmt in block.iter() {
        hash_stmt(stmt, h);
    }
}

fn hash_stmt(s: &Stmt, h: &mut Xxh3) {
    match s {
        Stmt::Let(name, value) => {
            h.update(&[0x20]);
            hash_str(name, h);
            hash_expr(value, h);
        }
        Stmt::Assign(name, value) => {
            h.update(&[0x21]);
            hash_str(name, h);
            hash_expr(value, h);
        }
        Stmt::If {
            cond,
            then_body,
            else_body,
        } => {
            h.update(&[0x22]);
            hash_expr(cond, h);
            hash_block(then_body, h);
            match else_body {
                Some(b) => {
                    h.update(&[1]);
                    hash_block(b, h);
                }
                None => h.update(&[0]),
            }
        }
        Stmt::While { cond, body } => {
            h.update(&[0x23]);
            hash_expr(cond, h);
            hash_block(body, h);
        }
        Stmt::For { var, count, body } => {
            h.update(&[0x24]);
            hash_str(var, h);
            hash_expr(count, h);
            hash_block(body, h);
        }
        Stmt::Return(value) => {
            h.update(&[0x25]);
            match value {
                Some(e) => {
                    h.update(&[1]);
                    hash_expr(e, h);
                }
                None => h.update(&[0]),
            }
        }
        Stmt::Expr(e) => {
            h.update(&[0x26]);
            hash_expr(e, h);
        }
    }
}

// ---------------------------------------------------------------------------
// Single-site rewriting
// ---------------------------------------------------------------------------

/// One single-site rewrite of a function tree.
#[derive(Debug, Clone)]
pub struct Rewrite {
    /// The rewritten function. Untouched subtrees are shared with the input.
    pub func: FunctionDef,
    /// Preorder index of the mutated expression site.
    pub site: usize,
    /// Human-readable `original -> replacement` rendering.
    pub detail: String,
}

/// Enumerate single-site expression rewrites.
///
/// Visits every expression in the function body in preorder and offers it to
/// `candidates`. Each candidate replacement becomes one `Rewrite` of the
/// whole function (one site changed at a time). Candidates identical to the
/// node they replace are dropped. A function with no matching site simply
/// yields an empty vector.
pub fn expr_rewrites<F>(func: &FunctionDef, mut candidates: F) -> Vec<Rewrite>
where
    F: FnMut(&Expr) -> Vec<Expr>,
{
    let mut sites: Vec<(usize, Arc<Expr>, Vec<Expr>)> = Vec::new();
    let mut counter = 0;
    for stmt in func.body.iter() {
        collect_stmt_sites(stmt, &mut counter, &mut |idx, expr| {
            let repls: Vec<Expr> = candidates(expr.as_ref())
                .into_iter()
                .filter(|r| r != &**expr)
                .collect();
            if !repls.is_empty() {
                sites.push((idx, expr.clone(), repls));
            }
        });
    }

    let mut rewrites = Vec::new();
    for (site, original, repls) in sites {
        for repl in repls {
            let detail = format!("{} -> {}", original, repl);
            let func = replace_expr(func, site, &repl);
            rewrites.push(Rewrite { func, site, detail });
        }
    }
    rewrites
}

/// Enumerate rewrites of returned expressions, one return statement at a
/// time. `f` receives the returned expression and produces at most one
/// replacement for it; the rest of the tree is untouched.
pub fn return_rewrites<F>(func: &FunctionDef, mut f: F) -> Vec<Rewrite>
where
    F: FnMut(&Expr) -> Option<Expr>,
{
    let mut sites: Vec<(usize, Arc<Expr>, Expr)> = Vec::new();
    let mut counter = 0;
    for stmt in func.body.iter() {
        collect_return_sites(stmt, &mut counter, &mut |idx, expr| {
            if let Some(repl) = f(expr.as_ref()) {
                if repl != **expr {
                    sites.push((idx, expr.clone(), repl));
                }
            }
        });
    }

    sites
        .into_iter()
        .map(|(site, original, repl)| {
            let detail = format!("return {} -> return {}", original, repl);
            let func = replace_expr(func, site, &repl);
            Rewrite { func, site, detail }
        })
        .collect()
}

/// Replace the expression at preorder index `site` with `new`, rebuilding
/// only the root-to-site path.
pub fn replace_expr(func: &FunctionDef, site: usize, new: &Expr) -> FunctionDef {
    let mut counter = 0;
    let body = replace_in_block(&func.body, site, &mut counter, new);
    FunctionDef {
        name: func.name.clone(),
        params: func.params.clone(),
        body,
    }
}

fn collect_stmt_sites<F>(stmt: &Arc<Stmt>, counter: &mut usize, visit: &mut F)
where
    F: FnMut(usize, &Arc<Expr>),
{
    match &**stmt {
        Stmt::Let(_, value) | Stmt::Assign(_, value) | Stmt::Expr(value) => {
            collect_expr_sites(value, counter, visit);
        }
        Stmt::If {
            cond,
            then_body,
            else_body,
        } => {
            collect_expr_sites(cond, counter, visit);
            for s in then_body.iter() {
                collect_stmt_sites(s, counter, visit);
            }
            if let Some(body) = else_body {
                for s in body.iter() {
                    collect_stmt_sites(s, counter, visit);
                }
            }
        }
        Stmt::While { cond, body } => {
            collect_expr_sites(cond, counter, visit);
            for s in body.iter() {
                collect_stmt_sites(s, counter, visit);
            }
        }
        Stmt::For { count, body, .. } => {
            collect_expr_sites(count, counter, visit);
            for s in body.iter() {
                collect_stmt_sites(s, counter, visit);
            }
        }
        Stmt::Return(Some(value)) => collect_expr_sites(value, counter, visit),
        Stmt::Return(None) => {}
    }
}

fn collect_expr_sites<F>(expr: &Arc<Expr>, counter: &mut usize, visit: &mut F)
where
    F: FnMut(usize, &Arc<Expr>),
{
    let idx = *counter;
    *counter += 1;
    visit(idx, expr);
    match &**expr {
        Expr::List(items) => {
            for item in items.iter() {
                collect_expr_sites(item, counter, visit);
            }
        }
        Expr::Unary(_, operand) => collect_expr_sites(operand, counter, visit),
        Expr::Binary(_, lhs, rhs) | Expr::Compare(_, lhs, rhs) | Expr::Logic(_, lhs, rhs) => {
            collect_expr_sites(lhs, counter, visit);
            collect_expr_sites(rhs, counter, visit);
        }
        Expr::Call(_, args) => {
            for arg in args.iter() {
                collect_expr_sites(arg, counter, visit);
            }
        }
        Expr::Index(base, index) => {
            collect_expr_sites(base, counter, visit);
            collect_expr_sites(index, counter, visit);
        }
        _ => {}
    }
}

/// Visit returned expressions, tracking the shared preorder expression
/// counter so return sites use the same index space as `expr_rewrites`.
fn collect_return_sites<F>(stmt: &Arc<Stmt>, counter: &mut usize, visit: &mut F)
where
    F: FnMut(usize, &Arc<Expr>),
{
    match &**stmt {
        Stmt::Return(Some(value)) => {
            let idx = *counter;
            visit(idx, value);
            // Advance past the whole returned subtree.
            collect_expr_sites(value, counter, &mut |_, _| {});
        }
        Stmt::If {
            cond,
            then_body,
            else_body,
        } => {
            collect_expr_sites(cond, counter, &mut |_, _| {});
            for s in then_body.iter() {
                collect_return_sites(s, counter, visit);
            }
            if let Some(body) = else_body {
                for s in body.iter() {
                    collect_return_sites(s, counter, visit);
                }
            }
        }
        Stmt::While { cond, body } => {
            collect_expr_sites(cond, counter, &mut |_, _| {});
            for s in body.iter() {
                collect_return_sites(s, counter, visit);
            }
        }
        Stmt::For { count, body, .. } => {
            collect_expr_sites(count, counter, &mut |_, _| {});
            for s in body.iter() {
                collect_return_sites(s, counter, visit);
            }
        }
        Stmt::Let(_, value) | Stmt::Assign(_, value) | Stmt::Expr(value) => {
            collect_expr_sites(value, counter, &mut |_, _| {});
        }
        Stmt::Return(None) => {}
    }
}

fn replace_in_block(block: &Block, target: usize, counter: &mut usize, new: &Expr) -> Block {
    let mut changed = false;
    let stmts: Vec<Arc<Stmt>> = block
        .iter()
        .map(|s| {
            let replaced = replace_in_stmt(s, target, counter, new);
            if !Arc::ptr_eq(&replaced, s) {
                changed = true;
            }
            replaced
        })
        .collect();
    if changed {
        Arc::from(stmts)
    } else {
        block.clone()
    }
}

fn replace_in_stmt(stmt: &Arc<Stmt>, target: usize, counter: &mut usize, new: &Expr) -> Arc<Stmt> {
    match &**stmt {
        Stmt::Let(name, value) => {
            let r = replace_in_expr(value, target, counter, new);
            if Arc::ptr_eq(&r, value) {
                stmt.clone()
            } else {
                Arc::new(Stmt::Let(name.clone(), r))
            }
        }
        Stmt::Assign(name, value) => {
            let r = replace_in_expr(value, target, counter, new);
            if Arc::ptr_eq(&r, value) {
                stmt.clone()
            } else {
                Arc::new(Stmt::Assign(name.clone(), r))
            }
        }
        Stmt::If {
            cond,
            then_body,
            else_body,
        } => {
            let c = replace_in_expr(cond, target, counter, new);
            let t = replace_in_block(then_body, target, counter, new);
            let e = else_body
                .as_ref()
                .map(|b| replace_in_block(b, target, counter, new));
            let else_changed = match (&e, else_body) {
                (Some(b), Some(orig)) => !Arc::ptr_eq(b, orig),
                _ => false,
            };
            if Arc::ptr_eq(&c, cond) && Arc::ptr_eq(&t, then_body) && !else_changed {
                stmt.clone()
            } else {
                Arc::new(Stmt::If {
                    cond: c,
                    then_body: t,
                    else_body: e,
                })
            }
        }
        Stmt::While { cond, body } => {
            let c = replace_in_expr(cond, target, counter, new);
            let b = replace_in_block(body, target, counter, new);
            if Arc::ptr_eq(&c, cond) && Arc::ptr_eq(&b, body) {
                stmt.clone()
            } else {
                Arc::new(Stmt::While { cond: c, body: b })
            }
        }
        Stmt::For { var, count, body } => {
            let c = replace_in_expr(count, target, counter, new);
            let b = replace_in_block(body, target, counter, new);
            if Arc::ptr_eq(&c, count) && Arc::ptr_eq(&b, body) {
                stmt.clone()
            } else {
                Arc::new(Stmt::For {
                    var: var.clone(),
                    count: c,
                    body: b,
                })
            }
        }
        Stmt::Return(Some(value)) => {
            let r = replace_in_expr(value, target, counter, new);
            if Arc::ptr_eq(&r, value) {
                stmt.clone()
            } else {
                Arc::new(Stmt::Return(Some(r)))
            }
        }
        Stmt::Return(None) => stmt.clone(),
        Stmt::Expr(value) => {
            let r = replace_in_expr(value, target, counter, new);
            if Arc::ptr_eq(&r, value) {
                stmt.clone()
            } else {
                Arc::new(Stmt::Expr(r))
            }
        }
    }
}

fn replace_in_expr(expr: &Arc<Expr>, target: usize, counter: &mut usize, new: &Expr) -> Arc<Expr> {
    let idx = *counter;
    *counter += 1;
    if idx == target {
        // The subtree below is replaced wholesale; skip its site indices so
        // later statements keep their numbering.
        let mut skip = idx;
        skip_subtree(expr, &mut skip);
        *counter = skip + 1;
        return Arc::new(new.clone());
    }
    match &**expr {
        Expr::List(items) => {
            let mut changed = false;
            let rebuilt: Vec<Arc<Expr>> = items
                .iter()
                .map(|item| {
                    let r = replace_in_expr(item, target, counter, new);
                    if !Arc::ptr_eq(&r, item) {
                        changed = true;
                    }
                    r
                })
                .collect();
            if changed {
                Arc::new(Expr::List(Arc::from(rebuilt)))
            } else {
                expr.clone()
            }
        }
        Expr::Unary(op, operand) => {
            let r = replace_in_expr(operand, target, counter, new);
            if Arc::ptr_eq(&r, operand) {
                expr.clone()
            } else {
                Arc::new(Expr::Unary(*op, r))
            }
        }
        Expr::Binary(op, lhs, rhs) => {
            let l = replace_in_expr(lhs, target, counter, new);
            let r = replace_in_expr(rhs, target, counter, new);
            if Arc::ptr_eq(&l, lhs) && Arc::ptr_eq(&r, rhs) {
                expr.clone()
            } else {
                Arc::new(Expr::Binary(*op, l, r))
            }
        }
        Expr::Compare(op, lhs, rhs) => {
            let l = replace_in_expr(lhs, target, counter, new);
            let r = replace_in_expr(rhs, target, counter, new);
            if Arc::ptr_eq(&l, lhs) && Arc::ptr_eq(&r, rhs) {
                expr.clone()
            } else {
                Arc::new(Expr::Compare(*op, l, r))
            }
        }
        Expr::Logic(op, lhs, rhs) => {
            let l = replace_in_expr(lhs, target, counter, new);
            let r = replace_in_expr(rhs, target, counter, new);
            if Arc::ptr_eq(&l, lhs) && Arc::ptr_eq(&r, rhs) {
                expr.clone()
            } else {
                Arc::new(Expr::Logic(*op, l, r))
            }
        }
        Expr::Call(name, args) => {
            let mut changed = false;
            let rebuilt: Vec<Arc<Expr>> = args
                .iter()
                .map(|arg| {
                    let r = replace_in_expr(arg, target, counter, new);
                    if !Arc::ptr_eq(&r, arg) {
                        changed = true;
                    }
                    r
                })
                .collect();
            if changed {
                Arc::new(Expr::Call(name.clone(), Arc::from(rebuilt)))
            } else {
                expr.clone()
            }
        }
        Expr::Index(base, index) => {
            let b = replace_in_expr(base, target, counter, new);
            let i = replace_in_expr(index, target, counter, new);
            if Arc::ptr_eq(&b, base) && Arc::ptr_eq(&i, index) {
                expr.clone()
            } else {
                Arc::new(Expr::Index(b, i))
            }
        }
        _ => expr.clone(),
    }
}

/// Advance `last` to the preorder index of the last node in `expr`'s subtree.
fn skip_subtree(expr: &Arc<Expr>, last: &mut usize) {
    match &**expr {
        Expr::List(items) => {
            for item in items.iter() {
                *last += 1;
                skip_subtree(item, last);
            }
        }
        Expr::Unary(_, operand) => {
            *last += 1;
            skip_subtree(operand, last);
        }
        Expr::Binary(_, lhs, rhs) | Expr::Compare(_, lhs, rhs) | Expr::Logic(_, lhs, rhs) => {
            *last += 1;
            skip_subtree(lhs, last);
            *last += 1;
            skip_subtree(rhs, last);
        }
        Expr::Call(_, args) => {
            for arg in args.iter() {
                *last += 1;
                skip_subtree(arg, last);
            }
        }
        Expr::Index(base, index) => {
            *last += 1;
            skip_subtree(base, last);
            *last += 1;
            skip_subtree(index, last);
        }
        _ => {}
    }
}

// ---------------------------------------------------------------------------
// Pretty-printing
// ---------------------------------------------------------------------------

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOp::Neg => write!(f, "-"),
            UnaryOp::Not => write!(f, "not"),
        }
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
        };
        write!(f, "{s}")
    }
}

impl fmt::Display for CmpOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CmpOp::Eq => "==",
            CmpOp::Ne => "!=",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
        };
        write!(f, "{s}")
    }
}

impl fmt::Display for LogicOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicOp::And => write!(f, "and"),
            LogicOp::Or => write!(f, "or"),
        }
    }
}

fn prec(e: &Expr) -> u8 {
    match e {
        Expr::Logic(LogicOp::Or, ..) => 1,
        Expr::Logic(LogicOp::And, ..) => 2,
        Expr::Unary(UnaryOp::Not, _) => 3,
        Expr::Compare(..) => 4,
        Expr::Binary(BinOp::Add | BinOp::Sub, ..) => 5,
        Expr::Binary(..) => 6,
        Expr::Unary(UnaryOp::Neg, _) => 7,
        _ => 8,
    }
}

fn fmt_expr(e: &Expr, f: &mut fmt::Formatter<'_>, min_prec: u8) -> fmt::Result {
    let p = prec(e);
    let parens = p < min_prec;
    if parens {
        write!(f, "(")?;
    }
    match e {
        Expr::None => write!(f, "none")?,
        Expr::Bool(b) => write!(f, "{b}")?,
        Expr::Int(n) => write!(f, "{n}")?,
        Expr::Float(x) => {
            if x.fract() == 0.0 && x.is_finite() {
                write!(f, "{x:.1}")?
            } else {
                write!(f, "{x}")?
            }
        }
        Expr::Str(s) => write!(f, "{s:?}")?,
        Expr::List(items) => {
            write!(f, "[")?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                fmt_expr(item, f, 0)?;
            }
            write!(f, "]")?;
        }
        Expr::Name(name) => write!(f, "{name}")?,
        Expr::Unary(UnaryOp::Neg, operand) => {
            write!(f, "-")?;
            fmt_expr(operand, f, 8)?;
        }
        Expr::Unary(UnaryOp::Not, operand) => {
            write!(f, "not ")?;
            fmt_expr(operand, f, 3)?;
        }
        Expr::Binary(op, lhs, rhs) => {
            fmt_expr(lhs, f, p)?;
            write!(f, " {op} ")?;
            fmt_expr(rhs, f, p + 1)?;
        }
        Expr::Compare(op, lhs, rhs) => {
            fmt_expr(lhs, f, p + 1)?;
            write!(f, " {op} ")?;
            fmt_expr(rhs, f, p + 1)?;
        }
        Expr::Logic(op, lhs, rhs) => {
            fmt_expr(lhs, f, p)?;
            write!(f, " {op} ")?;
            fmt_expr(rhs, f, p + 1)?;
        }
        Expr::Call(name, args) => {
            write!(f, "{name}(")?;
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                fmt_expr(arg, f, 0)?;
            }
            write!(f, ")")?;
        }
        Expr::Index(base, index) => {
            fmt_expr(base, f, 8)?;
            write!(f, "[")?;
            fmt_expr(index, f, 0)?;
            write!(f, "]")?;
        }
    }
    if parens {
        write!(f, ")")?;
    }
    Ok(())
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_expr(self, f, 0)
    }
}

fn fmt_block(block: &Block, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
    for stmt in block.iter() {
        fmt_stmt(stmt, f, indent)?;
    }
    Ok(())
}

fn fmt_stmt(stmt: &Stmt, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
    let pad = "    ".repeat(indent);
    match stmt {
        Stmt::Let(name, value) => writeln!(f, "{pad}let {name} = {value};"),
        Stmt::Assign(name, value) => writeln!(f, "{pad}{name} = {value};"),
        Stmt::If {
            cond,
            then_body,
            else_body,
        } => {
            writeln!(f, "{pad}if {cond} {{")?;
            fmt_block(then_body, f, indent + 1)?;
            match else_body {
                Some(body) => {
                    writeln!(f, "{pad}}} else {{")?;
                    fmt_block(body, f, indent + 1)?;
                    writeln!(f, "{pad}}}")
                }
                None => writeln!(f, "{pad}}}"),
            }
        }
        Stmt::While { cond, body } => {
            writeln!(f, "{pad}while {cond} {{")?;
            fmt_block(body, f, indent + 1)?;
            writeln!(f, "{pad}}}")
        }
        Stmt::For { var, count, body } => {
            writeln!(f, "{pad}for {var} in range({count}) {{")?;
            fmt_block(body, f, indent + 1)?;
            writeln!(f, "{pad}}}")
        }
        Stmt::Return(Some(value)) => writeln!(f, "{pad}return {value};"),
        Stmt::Return(None) => writeln!(f, "{pad}return;"),
        Stmt::Expr(value) => writeln!(f, "{pad}{value};"),
    }
}

impl fmt::Display for FunctionDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fn {}(", self.name)?;
        for (i, p) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{p}")?;
        }
        writeln!(f, ") {{")?;
        fmt_block(&self.body, f, 1)?;
        writeln!(f, "}}")
    }
}
