use super::{assert_argument_count, null, EvalError, EvalResult, Object};
use std::fmt;
use std::rc::Rc;

/// Host functions resolved by identifier after the environment chain
/// comes up empty. They allocate fresh values rather than mutate their
/// arguments: `rest` and `push` copy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Builtin {
    Len,
    First,
    Last,
    Rest,
    Push,
    Puts,
}

impl fmt::Display for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Builtin {
    pub fn name(self) -> &'static str {
        match self {
            Builtin::Len => "len",
            Builtin::First => "first",
            Builtin::Last => "last",
            Builtin::Rest => "rest",
            Builtin::Push => "push",
            Builtin::Puts => "puts",
        }
    }

    pub fn lookup(name: &str) -> Option<Rc<Object>> {
        let builtin = match name {
            "len" => Builtin::Len,
            "first" => Builtin::First,
            "last" => Builtin::Last,
            "rest" => Builtin::Rest,
            "push" => Builtin::Push,
            "puts" => Builtin::Puts,
            _ => return None,
        };

        Some(Rc::new(Object::Builtin(builtin)))
    }

    pub fn apply(self, arguments: Vec<Rc<Object>>) -> EvalResult {
        match self {
            Builtin::Len => len(arguments),
            Builtin::First => first(arguments),
            Builtin::Last => last(arguments),
            Builtin::Rest => rest(arguments),
            Builtin::Push => push(arguments),
            Builtin::Puts => puts(arguments),
        }
    }
}

fn len(arguments: Vec<Rc<Object>>) -> EvalResult {
    assert_argument_count(1, &arguments)?;

    match arguments[0].as_ref() {
        Object::Str(value) => Ok(Rc::new(Object::Number(value.len() as i64))),
        Object::Array(elements) => Ok(Rc::new(Object::Number(elements.len() as i64))),
        _ => Err(EvalError::UnsupportedArgument(
            "len",
            Rc::clone(&arguments[0]),
        )),
    }
}

fn first(arguments: Vec<Rc<Object>>) -> EvalResult {
    assert_argument_count(1, &arguments)?;

    match arguments[0].as_ref() {
        Object::Array(elements) => Ok(elements.first().cloned().unwrap_or_else(null)),
        _ => Err(EvalError::UnsupportedArgument(
            "first",
            Rc::clone(&arguments[0]),
        )),
    }
}

fn last(arguments: Vec<Rc<Object>>) -> EvalResult {
    assert_argument_count(1, &arguments)?;

    match arguments[0].as_ref() {
        Object::Array(elements) => Ok(elements.last().cloned().unwrap_or_else(null)),
        _ => Err(EvalError::UnsupportedArgument(
            "last",
            Rc::clone(&arguments[0]),
        )),
    }
}

fn rest(arguments: Vec<Rc<Object>>) -> EvalResult {
    assert_argument_count(1, &arguments)?;

    match arguments[0].as_ref() {
        Object::Array(elements) => {
            if elements.is_empty() {
                Ok(null())
            } else {
                Ok(Rc::new(Object::Array(elements[1..].to_vec())))
            }
        }
        _ => Err(EvalError::UnsupportedArgument(
            "rest",
            Rc::clone(&arguments[0]),
        )),
    }
}

fn push(arguments: Vec<Rc<Object>>) -> EvalResult {
    assert_argument_count(2, &arguments)?;

    match arguments[0].as_ref() {
        Object::Array(elements) => {
            let mut elements = elements.clone();
            elements.push(Rc::clone(&arguments[1]));
            Ok(Rc::new(Object::Array(elements)))
        }
        _ => Err(EvalError::UnsupportedArgument(
            "push",
            Rc::clone(&arguments[0]),
        )),
    }
}

fn puts(arguments: Vec<Rc<Object>>) -> EvalResult {
    for argument in &arguments {
        println!("{}", argument);
    }

    Ok(null())
}
