//! Callable values.
//!
//! Three kinds of functions exist at runtime: native functions from the
//! standard library, arrow closures created during evaluation, and user
//! functions compiled by the registry.

use core::fmt;
use std::rc::Rc;
use std::sync::Arc;

use crate::evaluator::{Env, Interpreter, RuntimeError};
use crate::parser::FunctionBody;
use crate::registry::CompiledFunction;
use crate::values::Value;

/// Signature of standard library functions.
///
/// Natives receive the interpreter so they can call back into closures
/// (`[1, 2].map(x => x * 2)`).
pub type NativeFn = fn(&mut Interpreter, &[Value]) -> Result<Value, RuntimeError>;

#[derive(Clone, Copy)]
pub struct NativeFunction {
    pub name: &'static str,
    pub func: NativeFn,
}

impl NativeFunction {
    pub const fn new(name: &'static str, func: NativeFn) -> Self {
        Self { name, func }
    }
}

/// An arrow function together with the scope it was created in.
pub struct Closure {
    pub params: Vec<String>,
    pub body: Arc<FunctionBody>,
    pub env: Rc<Env>,
}

#[derive(Clone)]
pub enum Function {
    Native(NativeFunction),
    Closure(Rc<Closure>),
    User(Arc<CompiledFunction>),
}

impl Function {
    pub fn native(name: &'static str, func: NativeFn) -> Value {
        Value::Function(Function::Native(NativeFunction::new(name, func)))
    }

    pub fn name(&self) -> &str {
        match self {
            Function::Native(native) => native.name,
            Function::Closure(_) => "anonymous",
            Function::User(user) => &user.name,
        }
    }

    pub fn ptr_eq(&self, other: &Function) -> bool {
        match (self, other) {
            (Function::Native(a), Function::Native(b)) => {
                a.name == b.name && core::ptr::fn_addr_eq(a.func, b.func)
            }
            (Function::Closure(a), Function::Closure(b)) => Rc::ptr_eq(a, b),
            (Function::User(a), Function::User(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[Function: {}]", self.name())
    }
}
