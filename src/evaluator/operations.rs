use std::rc::Rc;

use crate::ast::{InfixOperator, PrefixOperator};
use crate::object::{self, EvalError, EvalResult, Kind, Object};

/// One entry in the operator dispatch table. Operand kinds may be
/// `Kind::Any`, which matches every actual kind; the evaluator applies
/// the first record whose declared kinds match the evaluated operands.
pub enum Operation {
    Prefix {
        right: Kind,
        apply: fn(&Rc<Object>) -> EvalResult,
    },
    Infix {
        left: Kind,
        right: Kind,
        apply: fn(&Rc<Object>, &Rc<Object>) -> EvalResult,
    },
}

static BANG: [Operation; 1] = [Operation::Prefix {
    right: Kind::Any,
    apply: not,
}];

static MINUS: [Operation; 2] = [
    Operation::Prefix {
        right: Kind::Number,
        apply: negate,
    },
    Operation::Infix {
        left: Kind::Number,
        right: Kind::Number,
        apply: subtract,
    },
];

static PLUS: [Operation; 2] = [
    Operation::Infix {
        left: Kind::Number,
        right: Kind::Number,
        apply: add,
    },
    Operation::Infix {
        left: Kind::Str,
        right: Kind::Str,
        apply: concatenate,
    },
];

static STAR: [Operation; 1] = [Operation::Infix {
    left: Kind::Number,
    right: Kind::Number,
    apply: multiply,
}];

static SLASH: [Operation; 1] = [Operation::Infix {
    left: Kind::Number,
    right: Kind::Number,
    apply: divide,
}];

static LESS: [Operation; 1] = [Operation::Infix {
    left: Kind::Number,
    right: Kind::Number,
    apply: less_than,
}];

static MORE: [Operation; 1] = [Operation::Infix {
    left: Kind::Number,
    right: Kind::Number,
    apply: more_than,
}];

static EQUAL_EQUAL: [Operation; 1] = [Operation::Infix {
    left: Kind::Any,
    right: Kind::Any,
    apply: equal,
}];

static BANG_EQUAL: [Operation; 1] = [Operation::Infix {
    left: Kind::Any,
    right: Kind::Any,
    apply: not_equal,
}];

/// The records registered for an operator spelling. Unknown spellings
/// resolve to the empty slice, which the dispatcher reports as an
/// unknown operator.
pub fn lookup(operator: &str) -> &'static [Operation] {
    match operator {
        "!" => &BANG,
        "-" => &MINUS,
        "+" => &PLUS,
        "*" => &STAR,
        "/" => &SLASH,
        "<" => &LESS,
        ">" => &MORE,
        "==" => &EQUAL_EQUAL,
        "!=" => &BANG_EQUAL,
        _ => &[],
    }
}

fn not(right: &Rc<Object>) -> EvalResult {
    Ok(object::boolean(!right.is_truthy()))
}

fn negate(right: &Rc<Object>) -> EvalResult {
    match right.as_ref() {
        Object::Number(value) => Ok(Rc::new(Object::Number(value.wrapping_neg()))),
        _ => Err(EvalError::UnknownPrefixOperator(
            PrefixOperator::Minus,
            Rc::clone(right),
        )),
    }
}

fn add(left: &Rc<Object>, right: &Rc<Object>) -> EvalResult {
    numeric(left, right, InfixOperator::Plus, |l, r| {
        Ok(Object::Number(l.wrapping_add(r)))
    })
}

fn subtract(left: &Rc<Object>, right: &Rc<Object>) -> EvalResult {
    numeric(left, right, InfixOperator::Minus, |l, r| {
        Ok(Object::Number(l.wrapping_sub(r)))
    })
}

fn multiply(left: &Rc<Object>, right: &Rc<Object>) -> EvalResult {
    numeric(left, right, InfixOperator::Asterisk, |l, r| {
        Ok(Object::Number(l.wrapping_mul(r)))
    })
}

fn divide(left: &Rc<Object>, right: &Rc<Object>) -> EvalResult {
    numeric(left, right, InfixOperator::Slash, |l, r| {
        if r == 0 {
            Err(EvalError::DivisionByZero)
        } else {
            Ok(Object::Number(l.wrapping_div(r)))
        }
    })
}

fn less_than(left: &Rc<Object>, right: &Rc<Object>) -> EvalResult {
    compare(left, right, InfixOperator::Lt, |l, r| l < r)
}

fn more_than(left: &Rc<Object>, right: &Rc<Object>) -> EvalResult {
    compare(left, right, InfixOperator::Gt, |l, r| l > r)
}

fn concatenate(left: &Rc<Object>, right: &Rc<Object>) -> EvalResult {
    match (left.as_ref(), right.as_ref()) {
        (Object::Str(l), Object::Str(r)) => {
            let mut joined = String::with_capacity(l.len() + r.len());
            joined.push_str(l);
            joined.push_str(r);
            Ok(Rc::new(Object::Str(joined)))
        }
        _ => Err(EvalError::UnknownInfixOperator(
            Rc::clone(left),
            InfixOperator::Plus,
            Rc::clone(right),
        )),
    }
}

fn equal(left: &Rc<Object>, right: &Rc<Object>) -> EvalResult {
    Ok(object::boolean(objects_equal(left, right)))
}

fn not_equal(left: &Rc<Object>, right: &Rc<Object>) -> EvalResult {
    Ok(object::boolean(!objects_equal(left, right)))
}

/// Numbers compare by value; every other pair compares by reference
/// identity. The pooled TRUE/FALSE/NULL singletons therefore behave as
/// expected, while two separately constructed strings do not.
fn objects_equal(left: &Rc<Object>, right: &Rc<Object>) -> bool {
    match (left.as_ref(), right.as_ref()) {
        (Object::Number(l), Object::Number(r)) => l == r,
        _ => Rc::ptr_eq(left, right),
    }
}

fn numeric(
    left: &Rc<Object>,
    right: &Rc<Object>,
    operator: InfixOperator,
    apply: fn(i64, i64) -> Result<Object, EvalError>,
) -> EvalResult {
    match (left.as_ref(), right.as_ref()) {
        (Object::Number(l), Object::Number(r)) => apply(*l, *r).map(Rc::new),
        _ => Err(EvalError::UnknownInfixOperator(
            Rc::clone(left),
            operator,
            Rc::clone(right),
        )),
    }
}

fn compare(
    left: &Rc<Object>,
    right: &Rc<Object>,
    operator: InfixOperator,
    apply: fn(i64, i64) -> bool,
) -> EvalResult {
    match (left.as_ref(), right.as_ref()) {
        (Object::Number(l), Object::Number(r)) => Ok(object::boolean(apply(*l, *r))),
        _ => Err(EvalError::UnknownInfixOperator(
            Rc::clone(left),
            operator,
            Rc::clone(right),
        )),
    }
}
