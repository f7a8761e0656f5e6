use std::cell::RefCell;
use std::rc::Rc;

use crate::ast::{self, BlockStatement, Expression, Program, Statement};
use crate::object::{Environment, Macro, Object};

use super::eval_block_statement;

/// Collects every top-level `let NAME = macro(...) {...};` into `env`
/// and splices those statements out of the program, so the evaluator
/// never sees a macro literal.
pub fn define_macros(program: &mut Program, env: &Rc<RefCell<Environment>>) {
    let mut definitions = vec![];

    for (i, statement) in program.statements.iter().enumerate() {
        if let Statement::Let(name, Expression::MacroLiteral(parameters, body)) = statement {
            let object = Object::Macro(Macro {
                parameters: parameters.clone(),
                body: body.clone(),
                env: Rc::clone(env),
            });
            env.borrow_mut().set(name, Rc::new(object));
            definitions.push(i);
        }
    }

    for i in definitions.into_iter().rev() {
        program.statements.remove(i);
    }
}

/// Rewrites every call to a macro bound in `env` into the AST the macro
/// returns. Arguments reach the macro body unevaluated, wrapped in
/// quotes; the body runs through the regular evaluator and must come
/// back as a quote. That invariant failing is a bug in the macro's host,
/// not a user-level error, and aborts.
pub fn expand_macros(program: Program, env: &Rc<RefCell<Environment>>) -> Program {
    ast::modify_program(program, &mut |expression| {
        let (function, arguments) = match expression {
            Expression::Call(function, arguments) => (function, arguments),
            other => return other,
        };

        let (parameters, body, macro_env) = match lookup_macro(&function, env) {
            Some(found) => found,
            None => return Expression::Call(function, arguments),
        };

        let eval_env = Environment::enclosed(&macro_env);
        for (parameter, argument) in parameters.iter().zip(arguments) {
            eval_env
                .borrow_mut()
                .set(parameter, Rc::new(Object::Quote(argument)));
        }

        let evaluated = eval_block_statement(&body, &eval_env);

        match evaluated.as_ref().map(|value| value.as_ref()) {
            Ok(Object::Quote(node)) => node.clone(),
            _ => panic!("we only support returning AST-nodes from macros"),
        }
    })
}

fn lookup_macro(
    function: &Expression,
    env: &Rc<RefCell<Environment>>,
) -> Option<(Vec<String>, BlockStatement, Rc<RefCell<Environment>>)> {
    let name = match function {
        Expression::Identifier(name) => name,
        _ => return None,
    };

    let object = env.borrow().get(name)?;

    match object.as_ref() {
        Object::Macro(r#macro) => Some((
            r#macro.parameters.clone(),
            r#macro.body.clone(),
            Rc::clone(&r#macro.env),
        )),
        _ => None,
    }
}
