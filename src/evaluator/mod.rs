use std::cell::RefCell;
use std::rc::Rc;

use crate::ast::{
    BlockStatement, Expression, InfixOperator, PrefixOperator, Program, Statement,
};
use crate::object::{
    self, Builtin, Environment, EvalError, EvalResult, Function, HashKey, HashPair, Macro, Object,
};

use indexmap::IndexMap;

pub mod macro_expansion;
pub mod operations;
pub mod quote_unquote;

pub use macro_expansion::{define_macros, expand_macros};

use operations::Operation;

/// Evaluates a program and unwraps a top-level `return` to its payload,
/// so `return x;` at program level yields `x`.
pub fn eval(program: &Program, env: &Rc<RefCell<Environment>>) -> EvalResult {
    let mut result = object::null();

    for statement in &program.statements {
        result = eval_statement(statement, env)?;

        if let Object::Return(value) = result.as_ref() {
            return Ok(Rc::clone(value));
        }
    }

    Ok(result)
}

pub(crate) fn eval_block_statement(
    block: &BlockStatement,
    env: &Rc<RefCell<Environment>>,
) -> EvalResult {
    let mut result = object::null();

    for statement in &block.statements {
        result = eval_statement(statement, env)?;

        if let Object::Return(_) = result.as_ref() {
            // keep the wrapper so outer blocks keep unwinding
            return Ok(result);
        }
    }

    Ok(result)
}

fn eval_statement(statement: &Statement, env: &Rc<RefCell<Environment>>) -> EvalResult {
    match statement {
        Statement::Expression(expression) => eval_expression(expression, env),
        Statement::Return(value) => {
            let value = eval_expression(value, env)?;
            Ok(Rc::new(Object::Return(value)))
        }
        Statement::Let(name, value) => {
            let value = eval_expression(value, env)?;
            env.borrow_mut().set(name, value);
            Ok(object::null())
        }
    }
}

pub(crate) fn eval_expression(
    expression: &Expression,
    env: &Rc<RefCell<Environment>>,
) -> EvalResult {
    match expression {
        Expression::NumberLiteral(value) => Ok(Rc::new(Object::Number(*value))),
        Expression::StringLiteral(value) => Ok(Rc::new(Object::Str(value.clone()))),
        Expression::Boolean(value) => Ok(object::boolean(*value)),
        Expression::Identifier(name) => eval_identifier(name, env),
        Expression::Prefix(operator, right) => eval_prefix_expression(*operator, right, env),
        Expression::Infix(operator, left, right) => {
            eval_infix_expression(*operator, left, right, env)
        }
        Expression::Grouped(inner) => eval_expression(inner, env),
        Expression::If(condition, consequence, alternative) => {
            eval_if_expression(condition, consequence, alternative.as_ref(), env)
        }
        Expression::FunctionLiteral(parameters, body) => {
            Ok(Rc::new(Object::Function(Function {
                parameters: parameters.clone(),
                body: body.clone(),
                env: Rc::clone(env),
            })))
        }
        Expression::MacroLiteral(parameters, body) => Ok(Rc::new(Object::Macro(Macro {
            parameters: parameters.clone(),
            body: body.clone(),
            env: Rc::clone(env),
        }))),
        Expression::Call(function, arguments) => eval_call_expression(function, arguments, env),
        Expression::ArrayLiteral(elements) => {
            let elements = eval_expressions(elements, env)?;
            Ok(Rc::new(Object::Array(elements)))
        }
        Expression::Index(collection, index) => {
            let collection = eval_expression(collection, env)?;
            let index = eval_expression(index, env)?;
            eval_index_expression(&collection, &index)
        }
        Expression::HashLiteral(pairs) => eval_hash_literal(pairs, env),
    }
}

fn eval_identifier(name: &str, env: &Rc<RefCell<Environment>>) -> EvalResult {
    if let Some(value) = env.borrow().get(name) {
        return Ok(value);
    }

    if let Some(builtin) = Builtin::lookup(name) {
        return Ok(builtin);
    }

    Err(EvalError::IdentifierNotFound(name.to_owned()))
}

fn eval_prefix_expression(
    operator: PrefixOperator,
    right: &Expression,
    env: &Rc<RefCell<Environment>>,
) -> EvalResult {
    let right = eval_expression(right, env)?;

    for operation in operations::lookup(operator.symbol()) {
        if let Operation::Prefix { right: wanted, apply } = operation {
            if wanted.matches(right.kind()) {
                return apply(&right);
            }
        }
    }

    Err(EvalError::UnknownPrefixOperator(operator, right))
}

fn eval_infix_expression(
    operator: InfixOperator,
    left: &Expression,
    right: &Expression,
    env: &Rc<RefCell<Environment>>,
) -> EvalResult {
    let left = eval_expression(left, env)?;
    let right = eval_expression(right, env)?;

    if left.kind() != right.kind() {
        return Err(EvalError::TypeMismatch(left, right));
    }

    for operation in operations::lookup(operator.symbol()) {
        if let Operation::Infix {
            left: wanted_left,
            right: wanted_right,
            apply,
        } = operation
        {
            if wanted_left.matches(left.kind()) && wanted_right.matches(right.kind()) {
                return apply(&left, &right);
            }
        }
    }

    Err(EvalError::UnknownInfixOperator(left, operator, right))
}

fn eval_if_expression(
    condition: &Expression,
    consequence: &BlockStatement,
    alternative: Option<&BlockStatement>,
    env: &Rc<RefCell<Environment>>,
) -> EvalResult {
    let condition = eval_expression(condition, env)?;

    if condition.is_truthy() {
        return eval_block_statement(consequence, env);
    }

    if let Some(alternative) = alternative {
        return eval_block_statement(alternative, env);
    }

    Ok(object::null())
}

fn eval_call_expression(
    function: &Expression,
    arguments: &[Expression],
    env: &Rc<RefCell<Environment>>,
) -> EvalResult {
    // `quote` is dispatched on the callee's lexeme before any lookup;
    // its argument is passed through unevaluated.
    if is_named(function, "quote") {
        if arguments.len() != 1 {
            return Err(EvalError::WrongArgumentCount {
                got: arguments.len(),
                want: 1,
            });
        }
        return quote_unquote::quote(arguments[0].clone(), env);
    }

    let function = eval_expression(function, env)?;
    let arguments = eval_expressions(arguments, env)?;

    apply_function(&function, arguments)
}

fn is_named(expression: &Expression, name: &str) -> bool {
    matches!(expression, Expression::Identifier(ident) if ident == name)
}

pub(crate) fn apply_function(function: &Rc<Object>, arguments: Vec<Rc<Object>>) -> EvalResult {
    match function.as_ref() {
        Object::Function(function) => {
            let env = extend_function_env(function, arguments);
            let evaluated = eval_block_statement(&function.body, &env)?;
            Ok(unwrap_return_value(evaluated))
        }
        Object::Builtin(builtin) => builtin.apply(arguments),
        _ => Err(EvalError::NotAFunction(Rc::clone(function))),
    }
}

fn extend_function_env(
    function: &Function,
    arguments: Vec<Rc<Object>>,
) -> Rc<RefCell<Environment>> {
    let env = Environment::enclosed(&function.env);
    let mut arguments = arguments.into_iter();

    for parameter in &function.parameters {
        let argument = arguments.next().unwrap_or_else(object::null);
        env.borrow_mut().set(parameter, argument);
    }

    env
}

fn unwrap_return_value(value: Rc<Object>) -> Rc<Object> {
    match value.as_ref() {
        Object::Return(inner) => Rc::clone(inner),
        _ => value,
    }
}

fn eval_expressions(
    expressions: &[Expression],
    env: &Rc<RefCell<Environment>>,
) -> Result<Vec<Rc<Object>>, EvalError> {
    let mut results = vec![];

    for expression in expressions {
        results.push(eval_expression(expression, env)?);
    }

    Ok(results)
}

fn eval_index_expression(collection: &Rc<Object>, index: &Rc<Object>) -> EvalResult {
    match (collection.as_ref(), index.as_ref()) {
        (Object::Array(elements), Object::Number(i)) => {
            if *i < 0 || *i as usize >= elements.len() {
                Ok(object::null())
            } else {
                Ok(Rc::clone(&elements[*i as usize]))
            }
        }
        (Object::Hash(pairs), _) => {
            let key = HashKey::from_object(index)?;
            Ok(pairs
                .get(&key)
                .map(|pair| Rc::clone(&pair.value))
                .unwrap_or_else(object::null))
        }
        _ => Err(EvalError::UnsupportedIndexOperator(Rc::clone(collection))),
    }
}

fn eval_hash_literal(
    pairs: &[(Expression, Expression)],
    env: &Rc<RefCell<Environment>>,
) -> EvalResult {
    let mut hash = IndexMap::new();

    for (key_expression, value_expression) in pairs {
        let key = eval_expression(key_expression, env)?;
        let hashed = HashKey::from_object(&key)?;

        let value = eval_expression(value_expression, env)?;

        hash.insert(hashed, HashPair { key, value });
    }

    Ok(Rc::new(Object::Hash(hash)))
}
