//! Deadline-bounded tree-walking evaluator.
//!
//! The evaluator polls an explicit deadline at statement boundaries, loop
//! back-edges and call entries, so a runaway callable is cut off within the
//! configured budget without process signals. Raised errors and timeouts
//! surface as `Interrupt`s; the sandbox converts them into outcomes.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use crate::core::{ErrorKind, Value};
use crate::lang::{BinOp, Block, CmpOp, Expr, FunctionDef, LogicOp, Stmt, UnaryOp};

/// Non-local exit from evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Interrupt {
    /// A runtime error was raised.
    Raised(ErrorKind),
    /// The deadline elapsed.
    TimedOut,
}

type Eval<T> = Result<T, Interrupt>;

/// Statement-level control flow.
enum Flow {
    Normal,
    Return(Value),
}

/// Names callable from any sandboxed context.
const BUILTINS: &[&str] = &["abs", "min", "max", "len"];

pub(crate) struct Interp<'a> {
    deadline: Instant,
    max_depth: usize,
    /// The enclosing function, when self-recursion is permitted.
    func: Option<&'a FunctionDef>,
}

impl<'a> Interp<'a> {
    pub(crate) fn new(deadline: Instant, max_depth: usize, func: Option<&'a FunctionDef>) -> Self {
        Self {
            deadline,
            max_depth,
            func,
        }
    }

    fn check_deadline(&self) -> Eval<()> {
        if Instant::now() >= self.deadline {
            Err(Interrupt::TimedOut)
        } else {
            Ok(())
        }
    }

    /// Call `func` with positional `args` in a fresh environment.
    pub(crate) fn call(&self, func: &FunctionDef, args: &[Value], depth: usize) -> Eval<Value> {
        self.check_deadline()?;
        if depth > self.max_depth {
            return Err(Interrupt::Raised(ErrorKind::RecursionLimit));
        }
        if args.len() != func.params.len() {
            return Err(Interrupt::Raised(ErrorKind::ArityError));
        }
        let mut env: HashMap<Arc<str>, Value> = HashMap::with_capacity(args.len());
        for (param, arg) in func.params.iter().zip(args) {
            env.insert(param.clone(), arg.clone());
        }
        match self.exec_block(&func.body, &mut env, depth)? {
            Flow::Return(value) => Ok(value),
            Flow::Normal => Ok(Value::None),
        }
    }

    /// Evaluate a bare expression against an explicit environment.
    pub(crate) fn eval_with_env(
        &self,
        expr: &Expr,
        env: &mut HashMap<Arc<str>, Value>,
    ) -> Eval<Value> {
        self.check_deadline()?;
        self.eval(expr, env, 0)
    }

    fn exec_block(
        &self,
        block: &Block,
        env: &mut HashMap<Arc<str>, Value>,
        depth: usize,
    ) -> Eval<Flow> {
        for stmt in block.iter() {
            if let Flow::Return(value) = self.exec_stmt(stmt, env, depth)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_stmt(
        &self,
        stmt: &Stmt,
        env: &mut HashMap<Arc<str>, Value>,
        depth: usize,
    ) -> Eval<Flow> {
        self.check_deadline()?;
        match stmt {
            Stmt::Let(name, value) => {
                let v = self.eval(value, env, depth)?;
                env.insert(name.clone(), v);
                Ok(Flow::Normal)
            }
            Stmt::Assign(name, value) => {
                if !env.contains_key(name) {
                    return Err(Interrupt::Raised(ErrorKind::NameError));
                }
                let v = self.eval(value, env, depth)?;
                env.insert(name.clone(), v);
                Ok(Flow::Normal)
            }
            Stmt::If {
                cond,
                then_body,
                else_body,
            } => {
                if self.eval(cond, env, depth)?.truthy() {
                    self.exec_block(then_body, env, depth)
                } else if let Some(body) = else_body {
                    self.exec_block(body, env, depth)
                } else {
                    Ok(Flow::Normal)
                }
            }
            Stmt::While { cond, body } => {
                loop {
                    self.check_deadline()?;
                    if !self.eval(cond, env, depth)?.truthy() {
                        break;
                    }
                    if let Flow::Return(value) = self.exec_block(body, env, depth)? {
                        return Ok(Flow::Return(value));
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::For { var, count, body } => {
                let n = match self.eval(count, env, depth)? {
                    Value::Int(n) => n,
                    _ => return Err(Interrupt::Raised(ErrorKind::TypeError)),
                };
                let mut i = 0i64;
                while i < n {
                    self.check_deadline()?;
                    env.insert(var.clone(), Value::Int(i));
                    if let Flow::Return(value) = self.exec_block(body, env, depth)? {
                        return Ok(Flow::Return(value));
                    }
                    i += 1;
                }
                Ok(Flow::Normal)
            }
            Stmt::Return(Some(value)) => {
                let v = self.eval(value, env, depth)?;
                Ok(Flow::Return(v))
            }
            Stmt::Return(None) => Ok(Flow::Return(Value::None)),
            Stmt::Expr(value) => {
                self.eval(value, env, depth)?;
                Ok(Flow::Normal)
            }
        }
    }

    fn eval(&self, expr: &Expr, env: &mut HashMap<Arc<str>, Value>, depth: usize) -> Eval<Value> {
        match expr {
            Expr::None => Ok(Value::None),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Int(n) => Ok(Value::Int(*n)),
            Expr::Float(x) => Ok(Value::Float(*x)),
            Expr::Str(s) => Ok(Value::Str(s.to_string())),
            Expr::List(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items.iter() {
                    values.push(self.eval(item, env, depth)?);
                }
                Ok(Value::List(values))
            }
            Expr::Name(name) => env
                .get(name.as_ref())
                .cloned()
                .ok_or(Interrupt::Raised(ErrorKind::NameError)),
            Expr::Unary(op, operand) => {
                let v = self.eval(operand, env, depth)?;
                unary_op(*op, v).map_err(Interrupt::Raised)
            }
            Expr::Binary(op, lhs, rhs) => {
                let a = self.eval(lhs, env, depth)?;
                let b = self.eval(rhs, env, depth)?;
                binary_op(*op, a, b).map_err(Interrupt::Raised)
            }
            Expr::Compare(op, lhs, rhs) => {
                let a = self.eval(lhs, env, depth)?;
                let b = self.eval(rhs, env, depth)?;
                compare_op(*op, &a, &b).map_err(Interrupt::Raised)
            }
            Expr::Logic(op, lhs, rhs) => {
                let a = self.eval(lhs, env, depth)?;
                match op {
                    LogicOp::And if !a.truthy() => Ok(a),
                    LogicOp::Or if a.truthy() => Ok(a),
                    _ => self.eval(rhs, env, depth),
                }
            }
            Expr::Call(name, args) => {
                let mut values = Vec::with_capacity(args.len());
                for arg in args.iter() {
                    values.push(self.eval(arg, env, depth)?);
                }
                self.call_named(name, values, depth)
            }
            Expr::Index(base, index) => {
                let b = self.eval(base, env, depth)?;
                let i = self.eval(index, env, depth)?;
                index_op(&b, &i).map_err(Interrupt::Raised)
            }
        }
    }

    fn call_named(&self, name: &str, args: Vec<Value>, depth: usize) -> Eval<Value> {
        if BUILTINS.contains(&name) {
            return builtin(name, args).map_err(Interrupt::Raised);
        }
        if let Some(func) = self.func {
            if name == func.name.as_ref() {
                return self.call(func, &args, depth + 1);
            }
        }
        Err(Interrupt::Raised(ErrorKind::NameError))
    }
}

// ---------------------------------------------------------------------------
// Operator semantics
// ---------------------------------------------------------------------------

fn unary_op(op: UnaryOp, v: Value) -> Result<Value, ErrorKind> {
    match op {
        UnaryOp::Not => Ok(Value::Bool(!v.truthy())),
        UnaryOp::Neg => match v {
            Value::Int(n) => n
                .checked_neg()
                .map(Value::Int)
                .ok_or(ErrorKind::IntegerOverflow),
            Value::Float(x) => Ok(Value::Float(-x)),
            _ => Err(ErrorKind::TypeError),
        },
    }
}

fn binary_op(op: BinOp, a: Value, b: Value) -> Result<Value, ErrorKind> {
    match (op, &a, &b) {
        (_, Value::Int(x), Value::Int(y)) => int_op(op, *x, *y),
        (_, Value::Float(_) | Value::Int(_), Value::Float(_) | Value::Int(_)) => {
            float_op(op, as_f64(&a), as_f64(&b))
        }
        (BinOp::Add, Value::Str(x), Value::Str(y)) => {
            let mut s = x.clone();
            s.push_str(y);
            Ok(Value::Str(s))
        }
        (BinOp::Add, Value::List(x), Value::List(y)) => {
            let mut items = x.clone();
            items.extend(y.iter().cloned());
            Ok(Value::List(items))
        }
        _ => Err(ErrorKind::TypeError),
    }
}

fn int_op(op: BinOp, x: i64, y: i64) -> Result<Value, ErrorKind> {
    let result = match op {
        BinOp::Add => x.checked_add(y),
        BinOp::Sub => x.checked_sub(y),
        BinOp::Mul => x.checked_mul(y),
        BinOp::Div => {
            if y == 0 {
                return Err(ErrorKind::DivisionByZero);
            }
            x.checked_div(y)
        }
        BinOp::Mod => {
            if y == 0 {
                return Err(ErrorKind::DivisionByZero);
            }
            x.checked_rem(y)
        }
    };
    result.map(Value::Int).ok_or(ErrorKind::IntegerOverflow)
}

fn float_op(op: BinOp, x: f64, y: f64) -> Result<Value, ErrorKind> {
    let result = match op {
        BinOp::Add => x + y,
        BinOp::Sub => x - y,
        BinOp::Mul => x * y,
        BinOp::Div => {
            if y == 0.0 {
                return Err(ErrorKind::DivisionByZero);
            }
            x / y
        }
        BinOp::Mod => {
            if y == 0.0 {
                return Err(ErrorKind::DivisionByZero);
            }
            x % y
        }
    };
    Ok(Value::Float(result))
}

fn as_f64(v: &Value) -> f64 {
    match v {
        Value::Int(n) => *n as f64,
        Value::Float(x) => *x,
        _ => unreachable!("as_f64 called on non-numeric value"),
    }
}

fn compare_op(op: CmpOp, a: &Value, b: &Value) -> Result<Value, ErrorKind> {
    match op {
        CmpOp::Eq => return Ok(Value::Bool(a.eq_value(b))),
        CmpOp::Ne => return Ok(Value::Bool(!a.eq_value(b))),
        _ => {}
    }
    let ordering = match (a, b) {
        (Value::Int(x), Value::Int(y)) => x.cmp(y),
        (Value::Float(_) | Value::Int(_), Value::Float(_) | Value::Int(_)) => as_f64(a)
            .partial_cmp(&as_f64(b))
            .ok_or(ErrorKind::ValueError)?,
        (Value::Str(x), Value::Str(y)) => x.cmp(y),
        _ => return Err(ErrorKind::TypeError),
    };
    let result = match op {
        CmpOp::Lt => ordering.is_lt(),
        CmpOp::Le => ordering.is_le(),
        CmpOp::Gt => ordering.is_gt(),
        CmpOp::Ge => ordering.is_ge(),
        CmpOp::Eq | CmpOp::Ne => unreachable!(),
    };
    Ok(Value::Bool(result))
}

fn index_op(base: &Value, index: &Value) -> Result<Value, ErrorKind> {
    let i = match index {
        Value::Int(i) => *i,
        _ => return Err(ErrorKind::TypeError),
    };
    match base {
        Value::List(items) => {
            let idx = normalize_index(i, items.len())?;
            Ok(items[idx].clone())
        }
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            let idx = normalize_index(i, chars.len())?;
            Ok(Value::Str(chars[idx].to_string()))
        }
        _ => Err(ErrorKind::TypeError),
    }
}

/// Negative indices count from the end, as in the corpus's host language.
fn normalize_index(i: i64, len: usize) -> Result<usize, ErrorKind> {
    let idx = if i < 0 { i + len as i64 } else { i };
    if idx < 0 || idx as usize >= len {
        Err(ErrorKind::IndexError)
    } else {
        Ok(idx as usize)
    }
}

fn builtin(name: &str, args: Vec<Value>) -> Result<Value, ErrorKind> {
    match name {
        "abs" => {
            let [v] = args.as_slice() else {
                return Err(ErrorKind::ArityError);
            };
            match v {
                Value::Int(n) => n
                    .checked_abs()
                    .map(Value::Int)
                    .ok_or(ErrorKind::IntegerOverflow),
                Value::Float(x) => Ok(Value::Float(x.abs())),
                _ => Err(ErrorKind::TypeError),
            }
        }
        "len" => {
            let [v] = args.as_slice() else {
                return Err(ErrorKind::ArityError);
            };
            match v {
                Value::Str(s) => Ok(Value::Int(s.chars().count() as i64)),
                Value::List(items) => Ok(Value::Int(items.len() as i64)),
                _ => Err(ErrorKind::TypeError),
            }
        }
        "min" => extremum(args, CmpOp::Lt),
        "max" => extremum(args, CmpOp::Gt),
        _ => Err(ErrorKind::NameError),
    }
}

/// `min`/`max` over either a single list argument or two-plus scalars.
fn extremum(args: Vec<Value>, keep_if: CmpOp) -> Result<Value, ErrorKind> {
    let candidates: Vec<Value> = match args.len() {
        0 => return Err(ErrorKind::ArityError),
        1 => match args.into_iter().next() {
            Some(Value::List(items)) => items,
            _ => return Err(ErrorKind::TypeError),
        },
        _ => args,
    };
    let mut iter = candidates.into_iter();
    let mut best = iter.next().ok_or(ErrorKind::ValueError)?;
    for v in iter {
        if compare_op(keep_if, &v, &best)? == Value::Bool(true) {
            best = v;
        }
    }
    Ok(best)
}
