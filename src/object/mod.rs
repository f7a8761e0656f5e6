use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use thiserror::Error;

use crate::ast::{BlockStatement, Expression, InfixOperator, PrefixOperator};

pub mod builtins;
pub mod environment;

pub use builtins::Builtin;
pub use environment::Environment;

pub type EvalResult = std::result::Result<Rc<Object>, EvalError>;

/// A runtime value. Values are handled as `Rc<Object>` throughout the
/// evaluator; `TRUE`, `FALSE` and `NULL` come from a pool so that
/// non-number equality can compare by reference identity.
#[derive(Debug)]
pub enum Object {
    Null,
    Number(i64),
    Boolean(bool),
    Str(String),
    Array(Vec<Rc<Object>>),
    Hash(IndexMap<HashKey, HashPair>),
    Function(Function),
    Builtin(Builtin),
    /// Wrapper that carries a `return` value up through enclosing
    /// blocks until the program or a function call unwraps it.
    Return(Rc<Object>),
    Quote(Expression),
    Macro(Macro),
}

pub struct Function {
    pub parameters: Vec<String>,
    pub body: BlockStatement,
    pub env: Rc<RefCell<Environment>>,
}

pub struct Macro {
    pub parameters: Vec<String>,
    pub body: BlockStatement,
    pub env: Rc<RefCell<Environment>>,
}

// The captured environment is elided: it can be cyclic through values
// bound to the function's own name.
impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Function")
            .field("parameters", &self.parameters)
            .field("body", &self.body)
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for Macro {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Macro")
            .field("parameters", &self.parameters)
            .field("body", &self.body)
            .finish_non_exhaustive()
    }
}

/// Value kind tags as they appear in diagnostics. `Any` is the wildcard
/// operand kind used by the operator dispatch table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    Any,
    Null,
    Number,
    Boolean,
    Str,
    Array,
    Hash,
    Function,
    Builtin,
    Return,
    Quote,
    Macro,
}

impl Kind {
    pub fn matches(self, actual: Kind) -> bool {
        self == Kind::Any || self == actual
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Kind::Any => "ANY",
            Kind::Null => "NULL",
            Kind::Number => "NUMBER",
            Kind::Boolean => "BOOLEAN",
            Kind::Str => "STRING",
            Kind::Array => "ARRAY",
            Kind::Hash => "HASH",
            Kind::Function => "FUNCTION",
            Kind::Builtin => "BUILTIN",
            Kind::Return => "RETURN_VALUE",
            Kind::Quote => "QUOTE",
            Kind::Macro => "MACRO",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Object {
    pub fn kind(&self) -> Kind {
        match self {
            Object::Null => Kind::Null,
            Object::Number(_) => Kind::Number,
            Object::Boolean(_) => Kind::Boolean,
            Object::Str(_) => Kind::Str,
            Object::Array(_) => Kind::Array,
            Object::Hash(_) => Kind::Hash,
            Object::Function(_) => Kind::Function,
            Object::Builtin(_) => Kind::Builtin,
            Object::Return(_) => Kind::Return,
            Object::Quote(_) => Kind::Quote,
            Object::Macro(_) => Kind::Macro,
        }
    }

    /// `false` and null are falsy; every other value, including `0` and
    /// `""`, is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Object::Null => false,
            Object::Boolean(value) => *value,
            _ => true,
        }
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Object::Null => f.write_str("null"),
            Object::Number(value) => write!(f, "{}", value),
            Object::Boolean(value) => write!(f, "{}", value),
            Object::Str(value) => f.write_str(value),
            Object::Array(elements) => {
                let elements: Vec<String> = elements.iter().map(|e| e.to_string()).collect();
                write!(f, "[{}]", elements.join(", "))
            }
            Object::Hash(pairs) => {
                let pairs: Vec<String> = pairs
                    .values()
                    .map(|pair| format!("{}: {}", pair.key, pair.value))
                    .collect();
                write!(f, "{{{}}}", pairs.join(", "))
            }
            Object::Function(function) => write!(
                f,
                "fn({}) {{ {} }}",
                function.parameters.join(", "),
                function.body
            ),
            Object::Builtin(_) => f.write_str("builtin function"),
            Object::Return(value) => write!(f, "{}", value),
            Object::Quote(node) => write!(f, "QUOTE({})", node),
            Object::Macro(r#macro) => write!(
                f,
                "macro({}) {{ {} }}",
                r#macro.parameters.join(", "),
                r#macro.body
            ),
        }
    }
}

/// Canonical hashable fingerprint of a value: the kind tag keeps keys of
/// different kinds apart (`1` and `true` both reduce to scalar 1), the
/// scalar is the number itself, 0/1 for booleans, or the FNV-1a 64-bit
/// hash of a string's bytes. The map is keyed on this fingerprint
/// directly and collisions are not resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HashKey {
    pub kind: Kind,
    pub value: u64,
}

impl HashKey {
    pub fn from_object(object: &Rc<Object>) -> Result<HashKey, EvalError> {
        match object.as_ref() {
            Object::Number(value) => Ok(HashKey {
                kind: Kind::Number,
                value: *value as u64,
            }),
            Object::Boolean(value) => Ok(HashKey {
                kind: Kind::Boolean,
                value: u64::from(*value),
            }),
            Object::Str(value) => Ok(HashKey {
                kind: Kind::Str,
                value: fnv1a(value.as_bytes()),
            }),
            _ => Err(EvalError::UnusableHashKey(Rc::clone(object))),
        }
    }
}

/// The stored pair keeps the original key value so hashes can be
/// inspected, not just probed.
#[derive(Clone, Debug)]
pub struct HashPair {
    pub key: Rc<Object>,
    pub value: Rc<Object>,
}

fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x100_0000_01b3;

    bytes
        .iter()
        .fold(OFFSET_BASIS, |hash, byte| {
            (hash ^ u64::from(*byte)).wrapping_mul(PRIME)
        })
}

thread_local! {
    static TRUE: Rc<Object> = Rc::new(Object::Boolean(true));
    static FALSE: Rc<Object> = Rc::new(Object::Boolean(false));
    static NULL: Rc<Object> = Rc::new(Object::Null);
}

/// The pooled boolean for `value`. Boolean results must always come
/// from here: `==` compares non-numbers by reference identity.
pub fn boolean(value: bool) -> Rc<Object> {
    if value {
        TRUE.with(Rc::clone)
    } else {
        FALSE.with(Rc::clone)
    }
}

/// The pooled null singleton.
pub fn null() -> Rc<Object> {
    NULL.with(Rc::clone)
}

#[derive(Debug, Error)]
pub enum EvalError {
    #[error("identifier not found: {0}")]
    IdentifierNotFound(String),
    // the separator is a literal " + " whatever the operator was
    #[error("type mismatch: {} + {}", .0.kind(), .1.kind())]
    TypeMismatch(Rc<Object>, Rc<Object>),
    #[error("unknown operator: {}{}", .0, .1.kind())]
    UnknownPrefixOperator(PrefixOperator, Rc<Object>),
    #[error("unknown operator: {} {} {}", .0.kind(), .1, .2.kind())]
    UnknownInfixOperator(Rc<Object>, InfixOperator, Rc<Object>),
    #[error("not a function: {}", .0.kind())]
    NotAFunction(Rc<Object>),
    #[error("unusable as hash key: {}", .0.kind())]
    UnusableHashKey(Rc<Object>),
    #[error("index operator not supported: {}", .0.kind())]
    UnsupportedIndexOperator(Rc<Object>),
    #[error("wrong number of arguments. got={got}, want={want}")]
    WrongArgumentCount { got: usize, want: usize },
    #[error("argument to `{}` not supported, got {}", .0, .1.kind())]
    UnsupportedArgument(&'static str, Rc<Object>),
    #[error("division by zero")]
    DivisionByZero,
}

pub fn assert_argument_count(want: usize, arguments: &[Rc<Object>]) -> Result<(), EvalError> {
    if arguments.len() != want {
        return Err(EvalError::WrongArgumentCount {
            got: arguments.len(),
            want,
        });
    }
    Ok(())
}
