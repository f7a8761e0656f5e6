use std::cell::RefCell;
use std::rc::Rc;

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::evaluator;
use crate::lexer::Lexer;
use crate::object::Environment;
use crate::parser::Parser;

const MONKEY_FACE: &str = r#"            __,__
   .--.  .-"     "-.  .--.
  / .. \/  .-. .-.  \/ .. \
 | |  '|  /   Y   \  |'  | |
 | \   \  \ 0 | 0 /  /   / |
  \ '- ,\.-"""""""-./, -' /
   ''-' /_   ^ ^   _\ '-''
       |  \._   _./  |
       \   \ '~' /   /
        '._ '-=-' _.'
           '-----'
"#;

const PROMPT: &str = ">> ";

/// Interactive loop. Value and macro environments persist across lines,
/// so definitions typed earlier stay visible.
pub fn run() -> rustyline::Result<()> {
    println!("This is the Monkey programming language!");
    println!("Feel free to type in commands");

    let mut editor = DefaultEditor::new()?;

    let env = Environment::new();
    let macro_env = Environment::new();

    loop {
        match editor.readline(PROMPT) {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(line.as_str());
                evaluate_line(&line, &env, &macro_env);
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => return Ok(()),
            Err(err) => return Err(err),
        }
    }
}

fn evaluate_line(
    line: &str,
    env: &Rc<RefCell<Environment>>,
    macro_env: &Rc<RefCell<Environment>>,
) {
    let lexer =
        Lexer::with_error_handler(line, Box::new(|diagnostic| eprintln!("{}", diagnostic)));
    let mut parser = Parser::new(lexer);
    let mut program = parser.parse_program();

    if !parser.errors().is_empty() {
        print_parser_errors(parser.errors());
        return;
    }

    evaluator::define_macros(&mut program, macro_env);
    let expanded = evaluator::expand_macros(program, macro_env);

    match evaluator::eval(&expanded, env) {
        Ok(value) => println!("{}", value),
        Err(err) => println!("ERROR: {}", err),
    }
}

fn print_parser_errors(errors: &[crate::parser::ParserError]) {
    println!("{}", MONKEY_FACE);
    println!("Woops! We ran into some monkey business here!");
    println!(" parser errors:");
    for error in errors {
        println!("\t{}", error);
    }
}
