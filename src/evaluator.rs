use std::cell::RefCell;
use std::rc::Rc;

use crate::ast::{
    BlockStatement, Expression, InfixOperator, PrefixOperator, Program, Statement,
};
use crate::environment::Environment;
use crate::object::{Function, Object};

/// Default bound on nested expression evaluation. Deep AST nesting and deep
/// function-call chains both count against it, so the limit trips before
/// the host call stack does.
pub const DEFAULT_MAX_DEPTH: usize = 1024;

/// Tree-walking evaluator.
///
/// Runtime failures never unwind: they surface as [`Object::Error`] values
/// which every evaluation step checks for and propagates unchanged, so the
/// first error produced inside an expression is the one the caller sees.
pub struct Evaluator {
    max_depth: usize,
    depth: usize,
}

impl Default for Evaluator {
    fn default() -> Evaluator {
        Evaluator::new()
    }
}

impl Evaluator {
    pub fn new() -> Evaluator {
        Evaluator::with_max_depth(DEFAULT_MAX_DEPTH)
    }

    /// An evaluator that reports an error once expression nesting exceeds
    /// `max_depth`, instead of exhausting the host stack.
    pub fn with_max_depth(max_depth: usize) -> Evaluator {
        Evaluator {
            max_depth,
            depth: 0,
        }
    }

    /// Evaluates a whole program, unwrapping a trailing `return` so the
    /// caller receives the plain value.
    pub fn eval_program(
        &mut self,
        program: &Program,
        env: &Rc<RefCell<Environment>>,
    ) -> Object {
        let mut result = Object::Null;
        for stmt in &program.statements {
            match self.eval_statement(stmt, env) {
                Object::ReturnValue(value) => return *value,
                err @ Object::Error(_) => return err,
                other => result = other,
            }
        }
        result
    }

    fn eval_statement(&mut self, stmt: &Statement, env: &Rc<RefCell<Environment>>) -> Object {
        match stmt {
            Statement::Let { name, value } => {
                let value = self.eval_expression(value, env);
                if value.is_error() {
                    return value;
                }
                env.borrow_mut().set(name.name.clone(), value.clone());
                value
            }
            Statement::Return { value } => {
                let value = self.eval_expression(value, env);
                Object::ReturnValue(Box::new(value))
            }
            Statement::Expression { expression } => self.eval_expression(expression, env),
        }
    }

    /// Unlike program evaluation, a block leaves a `return` wrapped so the
    /// enclosing function call (or program) can detect and unwrap it.
    fn eval_block_statement(
        &mut self,
        block: &BlockStatement,
        env: &Rc<RefCell<Environment>>,
    ) -> Object {
        let mut result = Object::Null;
        for stmt in &block.statements {
            match self.eval_statement(stmt, env) {
                out @ (Object::ReturnValue(_) | Object::Error(_)) => return out,
                other => result = other,
            }
        }
        result
    }

    fn eval_expression(
        &mut self,
        expression: &Expression,
        env: &Rc<RefCell<Environment>>,
    ) -> Object {
        if self.depth >= self.max_depth {
            return Object::error("maximum recursion depth exceeded");
        }
        self.depth += 1;
        let result = self.eval_expression_inner(expression, env);
        self.depth -= 1;
        result
    }

    fn eval_expression_inner(
        &mut self,
        expression: &Expression,
        env: &Rc<RefCell<Environment>>,
    ) -> Object {
        match expression {
            Expression::IntegerLiteral(value) => Object::Integer(*value),
            Expression::BooleanLiteral(value) => Object::Boolean(*value),
            Expression::Identifier(ident) => match env.borrow().get(&ident.name) {
                Some(value) => value,
                None => Object::error(format!("identifier not found: {}", ident.name)),
            },
            Expression::Prefix { operator, right } => {
                let right = self.eval_expression(right, env);
                if right.is_error() {
                    return right;
                }
                eval_prefix_expression(*operator, right)
            }
            Expression::Infix {
                left,
                operator,
                right,
            } => {
                // Left before right, and either error short-circuits.
                let left = self.eval_expression(left, env);
                if left.is_error() {
                    return left;
                }
                let right = self.eval_expression(right, env);
                if right.is_error() {
                    return right;
                }
                eval_infix_expression(*operator, left, right)
            }
            Expression::If {
                condition,
                consequence,
                alternative,
            } => {
                let condition = self.eval_expression(condition, env);
                if condition.is_error() {
                    return condition;
                }
                if condition.is_truthy() {
                    self.eval_block_statement(consequence, env)
                } else if let Some(alternative) = alternative {
                    self.eval_block_statement(alternative, env)
                } else {
                    Object::Null
                }
            }
            Expression::FunctionLiteral { parameters, body } => Object::Function(Function {
                parameters: parameters.clone(),
                body: body.clone(),
                env: Rc::clone(env),
            }),
            Expression::Call {
                function,
                arguments,
            } => {
                let function = self.eval_expression(function, env);
                if function.is_error() {
                    return function;
                }
                match self.eval_expressions(arguments, env) {
                    Ok(arguments) => self.apply_function(function, arguments),
                    Err(err) => err,
                }
            }
        }
    }

    fn eval_expressions(
        &mut self,
        expressions: &[Expression],
        env: &Rc<RefCell<Environment>>,
    ) -> Result<Vec<Object>, Object> {
        let mut results = Vec::with_capacity(expressions.len());
        for expression in expressions {
            match self.eval_expression(expression, env) {
                err @ Object::Error(_) => return Err(err),
                value => results.push(value),
            }
        }
        Ok(results)
    }

    /// Binds the arguments into a fresh scope enclosed in the function's
    /// closure environment, evaluates the body there, and unwraps a
    /// trailing `return`.
    fn apply_function(&mut self, function: Object, arguments: Vec<Object>) -> Object {
        let function = match function {
            Object::Function(function) => function,
            other => return Object::error(format!("not a function: {}", other.type_name())),
        };

        if arguments.len() != function.parameters.len() {
            return Object::error(format!(
                "wrong number of arguments: want={}, got={}",
                function.parameters.len(),
                arguments.len()
            ));
        }

        let call_env = Environment::new_enclosed(Rc::clone(&function.env));
        for (param, value) in function.parameters.iter().zip(arguments) {
            call_env.borrow_mut().set(param.name.clone(), value);
        }

        match self.eval_block_statement(&function.body, &call_env) {
            Object::ReturnValue(value) => *value,
            other => other,
        }
    }
}

/// Convenience wrapper: evaluate with a default-configured evaluator.
pub fn eval(program: &Program, env: &Rc<RefCell<Environment>>) -> Object {
    Evaluator::new().eval_program(program, env)
}

fn eval_prefix_expression(operator: PrefixOperator, right: Object) -> Object {
    match operator {
        PrefixOperator::Bang => Object::Boolean(!right.is_truthy()),
        PrefixOperator::Minus => match right {
            Object::Integer(value) => Object::Integer(value.wrapping_neg()),
            other => Object::error(format!("unknown operator: -{}", other.type_name())),
        },
    }
}

fn eval_infix_expression(operator: InfixOperator, left: Object, right: Object) -> Object {
    match (left, right) {
        (Object::Integer(left), Object::Integer(right)) => {
            eval_integer_infix_expression(operator, left, right)
        }
        // The `==`/`!=` identity rule comes before the type-mismatch check:
        // mixed-type equality is false, not an error.
        (left, right) => match operator {
            InfixOperator::Eq => Object::Boolean(identity_eq(&left, &right)),
            InfixOperator::NotEq => Object::Boolean(!identity_eq(&left, &right)),
            _ if left.type_name() != right.type_name() => Object::error(format!(
                "type mismatch: {} {} {}",
                left.type_name(),
                operator,
                right.type_name()
            )),
            _ => Object::error(format!(
                "unknown operator: {} {} {}",
                left.type_name(),
                operator,
                right.type_name()
            )),
        },
    }
}

// Identity comparison as the shared singletons would see it: only the
// singleton values (booleans and null) can compare equal. Two distinct
// composite values with the same contents never do.
fn identity_eq(left: &Object, right: &Object) -> bool {
    match (left, right) {
        (Object::Boolean(left), Object::Boolean(right)) => left == right,
        (Object::Null, Object::Null) => true,
        _ => false,
    }
}

fn eval_integer_infix_expression(operator: InfixOperator, left: i64, right: i64) -> Object {
    match operator {
        InfixOperator::Plus => Object::Integer(left.wrapping_add(right)),
        InfixOperator::Minus => Object::Integer(left.wrapping_sub(right)),
        InfixOperator::Asterisk => Object::Integer(left.wrapping_mul(right)),
        InfixOperator::Slash => {
            if right == 0 {
                Object::error("division by zero")
            } else {
                // wrapping_div also covers i64::MIN / -1.
                Object::Integer(left.wrapping_div(right))
            }
        }
        InfixOperator::Lt => Object::Boolean(left < right),
        InfixOperator::Gt => Object::Boolean(left > right),
        InfixOperator::Eq => Object::Boolean(left == right),
        InfixOperator::NotEq => Object::Boolean(left != right),
    }
}
