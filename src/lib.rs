//! A tree-walking interpreter for the Monkey programming language:
//! integers, booleans, strings, arrays, hashes, first-class functions
//! with closures, and a `quote`/`unquote` macro system.
//!
//! The pipeline is `parse` → `define_macros` → `expand_macros` → `eval`;
//! the REPL and the `monkey` binary compose exactly those four calls.

pub mod ast;
pub mod evaluator;
pub mod lexer;
pub mod object;
pub mod parser;
pub mod repl;
pub mod token;

use crate::lexer::Lexer;
use crate::parser::{Parser, ParserError};

pub use evaluator::{define_macros, eval, expand_macros};
pub use object::Environment;

/// Parses `source` into a best-effort program plus whatever errors the
/// parser collected. An empty error list means the program is complete.
pub fn parse(source: &str) -> (ast::Program, Vec<ParserError>) {
    let lexer = Lexer::new(source);
    let mut parser = Parser::new(lexer);
    let program = parser.parse_program();
    let errors = parser.errors().to_vec();

    (program, errors)
}
