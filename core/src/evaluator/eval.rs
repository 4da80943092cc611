//! Core evaluation logic.

use std::rc::{Rc, Weak};
use std::sync::Arc;
use std::time::Instant;

use indexmap::IndexMap;

use crate::{
    api::ExecutionOptions,
    evaluator::{
        Env, ResourceExceeded, RuntimeError,
        operators::{eval_binary, eval_comparison},
    },
    parser::{AssignOp, DeclKind, Expr, FunctionBody, Literal, LogicalOp, Stmt, UnaryOp, UpdateOp},
    stdlib,
    values::{Closure, Function, StringBuilder, Value},
};

/// Arrays never grow past this many elements.
pub(crate) const MAX_ARRAY_LENGTH: usize = 1 << 24;

/// How often (in steps) the wall clock is consulted.
const TIMEOUT_CHECK_INTERVAL: u64 = 256;

/// Outcome of executing a statement.
enum Flow {
    Normal,
    Return(Value),
    Break,
    Continue,
}

/// An assignable location.
enum Place {
    Var(String),
    Member(Value, String),
}

/// Tree-walking interpreter.
///
/// One interpreter runs one expression or one top-level function call. It
/// owns the standard library bindings and the resource counters for that
/// run.
pub struct Interpreter {
    options: ExecutionOptions,
    globals: Rc<Env>,
    depth: usize,
    steps: u64,
    started: Instant,
    /// Scopes captured by closures, cleared on drop to break `Rc` cycles
    /// such as `const f = () => f()`.
    captured: Vec<Weak<Env>>,
}

impl Interpreter {
    pub fn new(options: &ExecutionOptions) -> Self {
        let globals = Env::root();
        stdlib::register_stdlib(&globals);
        Self {
            options: options.clone(),
            globals,
            depth: 0,
            steps: 0,
            started: Instant::now(),
            captured: Vec::new(),
        }
    }

    /// The environment holding the standard library.
    pub fn globals(&self) -> &Rc<Env> {
        &self.globals
    }

    /// Count one unit of work (loop iteration or call) against the limits.
    fn tick(&mut self) -> Result<(), RuntimeError> {
        self.steps += 1;
        if self.steps > self.options.max_steps {
            return Err(ResourceExceeded::StepLimit {
                max_steps: self.options.max_steps,
            }
            .into());
        }
        if self.steps % TIMEOUT_CHECK_INTERVAL == 0 {
            if let Some(timeout) = self.options.timeout {
                if self.started.elapsed() > timeout {
                    return Err(ResourceExceeded::Timeout(timeout).into());
                }
            }
        }
        Ok(())
    }

    fn enter(&mut self) -> Result<(), RuntimeError> {
        if self.depth >= self.options.max_depth {
            return Err(ResourceExceeded::StackOverflow {
                max_depth: self.options.max_depth,
            }
            .into());
        }
        self.depth += 1;
        Ok(())
    }

    /// Evaluate an expression node.
    pub fn eval(&mut self, expr: &Expr, env: &Rc<Env>) -> Result<Value, RuntimeError> {
        // Check depth before recursing
        self.enter()?;
        let result = self.eval_inner(expr, env);
        self.depth -= 1;
        result
    }

    /// Inner evaluation logic (no depth tracking).
    fn eval_inner(&mut self, expr: &Expr, env: &Rc<Env>) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                Literal::Number(n) => Value::Number(*n),
                Literal::Str(s) => Value::str(s),
                Literal::Bool(b) => Value::Bool(*b),
                Literal::Null => Value::Null,
                Literal::Undefined => Value::Undefined,
            }),

            Expr::Ident(name) => env.lookup(name).ok_or_else(|| RuntimeError::Reference {
                name: name.clone(),
            }),

            Expr::Binary { op, left, right } => {
                let left = self.eval(left, env)?;
                let right = self.eval(right, env)?;
                eval_binary(*op, &left, &right)
            }

            Expr::Logical { op, left, right } => {
                let left = self.eval(left, env)?;
                // Short-circuit: the deciding operand is the result.
                let decided = match op {
                    LogicalOp::And => !left.truthy(),
                    LogicalOp::Or => left.truthy(),
                    LogicalOp::Nullish => !left.is_nullish(),
                };
                if decided {
                    Ok(left)
                } else {
                    self.eval(right, env)
                }
            }

            Expr::Comparison { op, left, right } => {
                let left = self.eval(left, env)?;
                let right = self.eval(right, env)?;
                Ok(Value::Bool(eval_comparison(*op, &left, &right)))
            }

            Expr::Unary { op, expr: operand } => self.eval_unary(*op, operand, env),

            Expr::Conditional {
                cond,
                then_branch,
                else_branch,
            } => {
                if self.eval(cond, env)?.truthy() {
                    self.eval(then_branch, env)
                } else {
                    self.eval(else_branch, env)
                }
            }

            Expr::Assign { op, target, value } => self.eval_assign(*op, target, value, env),

            Expr::Update { op, prefix, target } => {
                let place = self.resolve_place(target, env)?;
                let old = self.read_place(&place, env)?.to_number();
                let new = match op {
                    UpdateOp::Increment => old + 1.0,
                    UpdateOp::Decrement => old - 1.0,
                };
                self.write_place(&place, Value::Number(new), env)?;
                Ok(Value::Number(if *prefix { new } else { old }))
            }

            Expr::Call { callable, args } => self.eval_call(callable, args, env),

            Expr::Index { value, index } => {
                let target = self.eval(value, env)?;
                let key = property_key(&self.eval(index, env)?);
                get_member(&target, &key)
            }

            Expr::Field {
                value,
                field,
                optional,
            } => {
                let target = self.eval(value, env)?;
                if *optional && target.is_nullish() {
                    return Ok(Value::Undefined);
                }
                get_member(&target, field)
            }

            Expr::Arrow { params, body } => {
                self.captured.push(Rc::downgrade(env));
                Ok(Value::Function(Function::Closure(Rc::new(Closure {
                    params: params.clone(),
                    body: Arc::clone(body),
                    env: Rc::clone(env),
                }))))
            }

            Expr::Object(props) => {
                let mut fields = IndexMap::with_capacity(props.len());
                for (key, value) in props {
                    let value = self.eval(value, env)?;
                    fields.insert(key.clone(), value);
                }
                Ok(Value::object(fields))
            }

            Expr::Array(items) => {
                let items = items
                    .iter()
                    .map(|item| self.eval(item, env))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::array(items))
            }

            Expr::Template { strs, exprs } => {
                let mut out = StringBuilder::new();
                for (i, text) in strs.iter().enumerate() {
                    out.push_str(text)?;
                    if let Some(expr) = exprs.get(i) {
                        out.push_value(&self.eval(expr, env)?)?;
                    }
                }
                Ok(Value::from(out.finish()))
            }
        }
    }

    fn eval_unary(
        &mut self,
        op: UnaryOp,
        operand: &Expr,
        env: &Rc<Env>,
    ) -> Result<Value, RuntimeError> {
        // `typeof undeclared` is "undefined" rather than a ReferenceError.
        if op == UnaryOp::TypeOf {
            if let Expr::Ident(name) = operand {
                if env.lookup(name).is_none() {
                    return Ok(Value::str("undefined"));
                }
            }
        }
        let value = self.eval(operand, env)?;
        Ok(match op {
            UnaryOp::Neg => Value::Number(-value.to_number()),
            UnaryOp::Plus => Value::Number(value.to_number()),
            UnaryOp::Not => Value::Bool(!value.truthy()),
            UnaryOp::TypeOf => Value::str(value.type_of()),
        })
    }

    fn eval_assign(
        &mut self,
        op: AssignOp,
        target: &Expr,
        value: &Expr,
        env: &Rc<Env>,
    ) -> Result<Value, RuntimeError> {
        let place = self.resolve_place(target, env)?;
        let new = match op.0 {
            None => self.eval(value, env)?,
            Some(binary) => {
                let old = self.read_place(&place, env)?;
                let rhs = self.eval(value, env)?;
                eval_binary(binary, &old, &rhs)?
            }
        };
        self.write_place(&place, new.clone(), env)?;
        Ok(new)
    }

    fn resolve_place(&mut self, target: &Expr, env: &Rc<Env>) -> Result<Place, RuntimeError> {
        match target {
            Expr::Ident(name) => Ok(Place::Var(name.clone())),
            Expr::Field { value, field, .. } => {
                Ok(Place::Member(self.eval(value, env)?, field.clone()))
            }
            Expr::Index { value, index } => {
                let target = self.eval(value, env)?;
                let key = property_key(&self.eval(index, env)?);
                Ok(Place::Member(target, key))
            }
            _ => Err(RuntimeError::Syntax(
                "Invalid left-hand side in assignment".to_string(),
            )),
        }
    }

    fn read_place(&mut self, place: &Place, env: &Rc<Env>) -> Result<Value, RuntimeError> {
        match place {
            Place::Var(name) => env.lookup(name).ok_or_else(|| RuntimeError::Reference {
                name: name.clone(),
            }),
            Place::Member(target, key) => get_member(target, key),
        }
    }

    fn write_place(&mut self, place: &Place, value: Value, env: &Rc<Env>) -> Result<(), RuntimeError> {
        match place {
            Place::Var(name) => env.assign(name, value),
            Place::Member(target, key) => set_member(target, key, value),
        }
    }

    fn eval_args(&mut self, args: &[Expr], env: &Rc<Env>) -> Result<Vec<Value>, RuntimeError> {
        args.iter().map(|arg| self.eval(arg, env)).collect()
    }

    fn eval_call(
        &mut self,
        callable: &Expr,
        args: &[Expr],
        env: &Rc<Env>,
    ) -> Result<Value, RuntimeError> {
        // Method calls dispatch on the receiver.
        if let Expr::Field {
            value,
            field,
            optional,
        } = callable
        {
            let receiver = self.eval(value, env)?;
            if *optional && receiver.is_nullish() {
                return Ok(Value::Undefined);
            }
            let args = self.eval_args(args, env)?;
            return self.call_method(&receiver, field, &args).unwrap_or_else(|| {
                Err(RuntimeError::type_error(format!(
                    "{} is not a function",
                    describe(callable)
                )))
            });
        }

        let callee = self.eval(callable, env)?;
        let args = self.eval_args(args, env)?;
        match callee {
            Value::Function(func) => self.call_function(&func, &args),
            _ => Err(RuntimeError::type_error(format!(
                "{} is not a function",
                describe(callable)
            ))),
        }
    }

    /// Call `name` on `receiver`: an own function-valued property first, then
    /// the built-in methods of the receiver's kind. `None` when `name` does
    /// not resolve to a function.
    fn call_method(
        &mut self,
        receiver: &Value,
        name: &str,
        args: &[Value],
    ) -> Option<Result<Value, RuntimeError>> {
        let own = match receiver {
            Value::Undefined | Value::Null => {
                return Some(Err(RuntimeError::type_error(format!(
                    "Cannot read properties of {} (reading '{}')",
                    receiver, name
                ))));
            }
            Value::Object(fields) => fields.borrow().get(name).cloned(),
            Value::Function(func) => stdlib::static_member(func, name),
            _ => None,
        };
        match own {
            Some(Value::Function(func)) => Some(self.call_function(&func, args)),
            Some(_) => None,
            None => stdlib::call_method(self, receiver, name, args),
        }
    }

    /// Call any value, failing if it is not a function.
    pub fn call(&mut self, callee: &Value, args: &[Value]) -> Result<Value, RuntimeError> {
        match callee {
            Value::Function(func) => self.call_function(func, args),
            other => Err(RuntimeError::type_error(format!(
                "{} is not a function",
                other.type_of()
            ))),
        }
    }

    pub fn call_function(&mut self, func: &Function, args: &[Value]) -> Result<Value, RuntimeError> {
        self.tick()?;
        self.enter()?;
        let result = self.call_function_inner(func, args);
        self.depth -= 1;
        result
    }

    fn call_function_inner(
        &mut self,
        func: &Function,
        args: &[Value],
    ) -> Result<Value, RuntimeError> {
        match func {
            Function::Native(native) => (native.func)(self, args),
            Function::Closure(closure) => {
                let env = Env::child(&closure.env);
                bind_params(&env, &closure.params, args);
                match closure.body.as_ref() {
                    FunctionBody::Expr(expr) => self.eval(expr, &env),
                    FunctionBody::Block(stmts) => self.run_body(stmts, &env),
                }
            }
            Function::User(user) => {
                // User functions see their parameters and the standard library only.
                let env = Env::child(&self.globals);
                bind_params(&env, &user.params, args);
                self.run_body(&user.body, &env)
            }
        }
    }

    /// Run a function body and produce its return value.
    pub fn run_body(&mut self, stmts: &[Stmt], env: &Rc<Env>) -> Result<Value, RuntimeError> {
        match self.exec_block(stmts, env)? {
            Flow::Normal => Ok(Value::Undefined),
            Flow::Return(value) => Ok(value),
            Flow::Break => Err(RuntimeError::Syntax("Illegal break statement".to_string())),
            Flow::Continue => Err(RuntimeError::Syntax(
                "Illegal continue statement: no surrounding iteration statement".to_string(),
            )),
        }
    }

    fn exec_block(&mut self, stmts: &[Stmt], env: &Rc<Env>) -> Result<Flow, RuntimeError> {
        for stmt in stmts {
            match self.exec_stmt(stmt, env)? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_stmt(&mut self, stmt: &Stmt, env: &Rc<Env>) -> Result<Flow, RuntimeError> {
        match stmt {
            Stmt::Declare { kind, bindings } => {
                for (name, init) in bindings {
                    let value = match init {
                        Some(init) => self.eval(init, env)?,
                        None => Value::Undefined,
                    };
                    if *kind == DeclKind::Var {
                        // `var` may be redeclared; a bare redeclaration keeps the value.
                        if init.is_some() || !env.has_own(name) {
                            env.define(name.as_str(), value, true);
                        }
                    } else {
                        env.declare(name, value, kind.is_mutable())?;
                    }
                }
                Ok(Flow::Normal)
            }

            Stmt::Expr(expr) => {
                self.eval(expr, env)?;
                Ok(Flow::Normal)
            }

            Stmt::Block(stmts) => self.exec_block(stmts, &Env::child(env)),

            Stmt::If {
                cond,
                then_branch,
                else_branch,
            } => {
                if self.eval(cond, env)?.truthy() {
                    self.exec_stmt(then_branch, env)
                } else if let Some(else_branch) = else_branch {
                    self.exec_stmt(else_branch, env)
                } else {
                    Ok(Flow::Normal)
                }
            }

            Stmt::ForOf {
                kind,
                name,
                iterable,
                body,
            } => {
                let items = match self.eval(iterable, env)? {
                    // Iterate over a snapshot so the body may mutate the array.
                    Value::Array(items) => items.borrow().to_vec(),
                    Value::Str(s) => s.chars().map(|c| Value::from(c.to_string())).collect(),
                    _ => {
                        return Err(RuntimeError::type_error(format!(
                            "{} is not iterable",
                            describe(iterable)
                        )));
                    }
                };
                for item in items {
                    self.tick()?;
                    let iter_env = Env::child(env);
                    match kind {
                        Some(kind) => iter_env.define(name.as_str(), item, kind.is_mutable()),
                        None => env.assign(name, item)?,
                    }
                    match self.exec_stmt(body, &iter_env)? {
                        Flow::Break => break,
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                        Flow::Normal | Flow::Continue => {}
                    }
                }
                Ok(Flow::Normal)
            }

            Stmt::For {
                init,
                test,
                update,
                body,
            } => {
                let loop_env = Env::child(env);
                if let Some(init) = init {
                    self.exec_stmt(init, &loop_env)?;
                }
                loop {
                    self.tick()?;
                    if let Some(test) = test {
                        if !self.eval(test, &loop_env)?.truthy() {
                            break;
                        }
                    }
                    match self.exec_stmt(body, &Env::child(&loop_env))? {
                        Flow::Break => break,
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                        Flow::Normal | Flow::Continue => {}
                    }
                    if let Some(update) = update {
                        self.eval(update, &loop_env)?;
                    }
                }
                Ok(Flow::Normal)
            }

            Stmt::While { cond, body } => {
                loop {
                    self.tick()?;
                    if !self.eval(cond, env)?.truthy() {
                        break;
                    }
                    match self.exec_stmt(body, &Env::child(env))? {
                        Flow::Break => break,
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                        Flow::Normal | Flow::Continue => {}
                    }
                }
                Ok(Flow::Normal)
            }

            Stmt::Return(value) => Ok(Flow::Return(match value {
                Some(value) => self.eval(value, env)?,
                None => Value::Undefined,
            })),

            Stmt::Throw(value) => {
                let thrown = self.eval(value, env)?;
                Err(RuntimeError::Thrown(thrown_message(&thrown)))
            }

            Stmt::Break => Ok(Flow::Break),
            Stmt::Continue => Ok(Flow::Continue),
            Stmt::Empty => Ok(Flow::Normal),
        }
    }
}

impl Drop for Interpreter {
    fn drop(&mut self) {
        for env in self.captured.drain(..) {
            if let Some(env) = env.upgrade() {
                env.clear();
            }
        }
        self.globals.clear();
    }
}

fn bind_params(env: &Env, params: &[String], args: &[Value]) {
    for (i, param) in params.iter().enumerate() {
        let value = args.get(i).cloned().unwrap_or(Value::Undefined);
        env.define(param.as_str(), value, true);
    }
}

/// The message of a thrown value: `error.message` for objects that have one.
fn thrown_message(value: &Value) -> String {
    if let Value::Object(fields) = value {
        if let Some(message) = fields.borrow().get("message") {
            return message.to_string();
        }
    }
    value.to_string()
}

/// Short source-like description of an expression for error messages.
fn describe(expr: &Expr) -> String {
    match expr {
        Expr::Ident(name) => name.clone(),
        Expr::Literal(Literal::Str(s)) => format!("{:?}", s),
        Expr::Literal(Literal::Number(n)) => crate::values::format_number(*n),
        Expr::Field { value, field, .. } => format!("{}.{}", describe(value), field),
        Expr::Index { value, .. } => format!("{}[...]", describe(value)),
        Expr::Call { callable, .. } => format!("{}(...)", describe(callable)),
        _ => "expression".to_string(),
    }
}

/// Property key for an index expression (`a[0]`, `o["k"]`).
fn property_key(index: &Value) -> String {
    index.to_string()
}

fn array_index(key: &str) -> Option<usize> {
    if key.len() > 1 && key.starts_with('0') {
        return None;
    }
    key.parse().ok()
}

/// Read `target[key]` / `target.key`.
fn get_member(target: &Value, key: &str) -> Result<Value, RuntimeError> {
    Ok(match target {
        Value::Undefined | Value::Null => {
            return Err(RuntimeError::type_error(format!(
                "Cannot read properties of {} (reading '{}')",
                target, key
            )));
        }
        Value::Object(fields) => fields.borrow().get(key).cloned().unwrap_or(Value::Undefined),
        Value::Array(items) => {
            let items = items.borrow();
            match array_index(key) {
                Some(i) => items.get(i).cloned().unwrap_or(Value::Undefined),
                None if key == "length" => Value::Number(items.len() as f64),
                None => Value::Undefined,
            }
        }
        Value::Str(s) => match array_index(key) {
            Some(i) => s
                .chars()
                .nth(i)
                .map(|c| Value::from(c.to_string()))
                .unwrap_or(Value::Undefined),
            None if key == "length" => Value::Number(s.chars().count() as f64),
            None => Value::Undefined,
        },
        Value::Function(func) => stdlib::static_member(func, key).unwrap_or(Value::Undefined),
        Value::Bool(_) | Value::Number(_) | Value::Date(_) => Value::Undefined,
    })
}

/// Write `target[key] = value`.
fn set_member(target: &Value, key: &str, value: Value) -> Result<(), RuntimeError> {
    match target {
        Value::Undefined | Value::Null => Err(RuntimeError::type_error(format!(
            "Cannot set properties of {} (setting '{}')",
            target, key
        ))),
        Value::Object(fields) => {
            fields.borrow_mut().insert(key.to_string(), value);
            Ok(())
        }
        Value::Array(items) => {
            let mut items = items.borrow_mut();
            if let Some(i) = array_index(key) {
                if i >= MAX_ARRAY_LENGTH {
                    return Err(RuntimeError::range_error("Invalid array length"));
                }
                if i >= items.len() {
                    items.resize(i + 1, Value::Undefined);
                }
                items[i] = value;
                Ok(())
            } else if key == "length" {
                let len = value.to_number();
                if len < 0.0 || len.fract() != 0.0 || len >= MAX_ARRAY_LENGTH as f64 {
                    return Err(RuntimeError::range_error("Invalid array length"));
                }
                items.resize(len as usize, Value::Undefined);
                Ok(())
            } else {
                Err(RuntimeError::type_error(format!(
                    "Cannot create property '{}' on array",
                    key
                )))
            }
        }
        // Writes to properties of primitives are silently ignored.
        _ => Ok(()),
    }
}
