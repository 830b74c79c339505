use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::ast::{BlockStatement, Identifier};
use crate::environment::Environment;

/// A runtime value produced by evaluation.
///
/// The tagged union is closed: every value the evaluator can produce is one
/// of these variants. `Boolean` and `Null` carry no allocation and compare
/// structurally, which is what gives `==`/`!=` their identity-style
/// semantics for those two types. `ReturnValue` is a transient control-flow
/// wrapper that never escapes a function call, and `Error` doubles as the
/// propagation signal for runtime failures.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    Integer(i64),
    Boolean(bool),
    Null,
    ReturnValue(Box<Object>),
    Error(String),
    Function(Function),
}

impl Object {
    pub fn type_name(&self) -> &'static str {
        match self {
            Object::Integer(_) => "INTEGER",
            Object::Boolean(_) => "BOOLEAN",
            Object::Null => "NULL",
            Object::ReturnValue(_) => "RETURN",
            Object::Error(_) => "ERROR",
            Object::Function(_) => "FUNCTION",
        }
    }

    /// Only `null` and `false` are falsy; everything else, including zero,
    /// is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Object::Null | Object::Boolean(false))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Object::Error(_))
    }

    pub fn error(message: impl Into<String>) -> Object {
        Object::Error(message.into())
    }
}

impl From<bool> for Object {
    fn from(value: bool) -> Object {
        Object::Boolean(value)
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Object::Integer(value) => write!(f, "{}", value),
            Object::Boolean(value) => write!(f, "{}", value),
            Object::Null => write!(f, "null"),
            Object::ReturnValue(inner) => write!(f, "{}", inner),
            Object::Error(message) => write!(f, "ERROR: {}", message),
            Object::Function(function) => write!(f, "{}", function),
        }
    }
}

/// A user-defined function: parameters, body, and the lexical environment
/// captured at the definition site.
#[derive(Debug, Clone)]
pub struct Function {
    pub parameters: Vec<Identifier>,
    pub body: BlockStatement,
    pub env: Rc<RefCell<Environment>>,
}

// Comparing captured environments structurally could cycle through closures
// stored inside them, so the environment is compared by reference.
impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.env, &other.env)
            && self.parameters == other.parameters
            && self.body == other.body
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fn(")?;
        let mut first = true;
        for param in &self.parameters {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{}", param)?;
            first = false;
        }
        write!(f, ") {}", self.body)
    }
}
