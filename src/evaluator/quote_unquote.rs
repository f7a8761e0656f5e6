use std::cell::RefCell;
use std::rc::Rc;

use crate::ast::{self, Expression};
use crate::object::{Environment, EvalError, EvalResult, Object};

use super::eval_expression;

/// Handler for the `quote(x)` form: rewrites `unquote(...)` escapes
/// inside the unevaluated argument and wraps the result.
pub(crate) fn quote(node: Expression, env: &Rc<RefCell<Environment>>) -> EvalResult {
    let node = unquote(node, env)?;
    Ok(Rc::new(Object::Quote(node)))
}

/// Replaces every `unquote(x)` call inside `node` by the syntactic form
/// of `x`'s value, evaluated in `env`. Like `quote`, `unquote` is
/// recognised by the callee's name with exactly one argument; anything
/// else passes through untouched.
fn unquote(
    node: Expression,
    env: &Rc<RefCell<Environment>>,
) -> Result<Expression, EvalError> {
    let mut failure: Option<EvalError> = None;

    let rewritten = ast::modify_expression(node, &mut |expression| {
        if failure.is_some() {
            return expression;
        }

        let (function, arguments) = match expression {
            Expression::Call(function, arguments) => (function, arguments),
            other => return other,
        };

        if !is_unquote(&function) || arguments.len() != 1 {
            return Expression::Call(function, arguments);
        }

        match eval_expression(&arguments[0], env).and_then(expression_from_value) {
            Ok(node) => node,
            Err(err) => {
                failure = Some(err);
                Expression::Call(function, arguments)
            }
        }
    });

    match failure {
        Some(err) => Err(err),
        None => Ok(rewritten),
    }
}

fn is_unquote(function: &Expression) -> bool {
    matches!(function, Expression::Identifier(name) if name == "unquote")
}

/// Reifies a runtime value back into syntax. Only values with a literal
/// form can cross back; quoted syntax splices in verbatim.
fn expression_from_value(value: Rc<Object>) -> Result<Expression, EvalError> {
    match value.as_ref() {
        Object::Number(number) => Ok(Expression::NumberLiteral(*number)),
        Object::Boolean(boolean) => Ok(Expression::Boolean(*boolean)),
        Object::Str(string) => Ok(Expression::StringLiteral(string.clone())),
        Object::Quote(node) => Ok(node.clone()),
        _ => Err(EvalError::UnsupportedArgument("unquote", value)),
    }
}

#[cfg(test)]
mod tests {
    use crate::lexer::Lexer;
    use crate::object::{Environment, Object};
    use crate::parser::Parser;

    fn eval_quote(input: &str) -> String {
        let lexer = Lexer::new(input);
        let mut parser = Parser::new(lexer);
        let program = parser.parse_program();
        assert!(parser.errors().is_empty(), "parser errors: {:?}", parser.errors());

        let env = Environment::new();
        let evaluated = crate::evaluator::eval(&program, &env)
            .unwrap_or_else(|err| panic!("eval error for `{}`: {}", input, err));

        match evaluated.as_ref() {
            Object::Quote(node) => node.to_string(),
            other => panic!("expected a quote, got `{}` for `{}`", other, input),
        }
    }

    #[test]
    fn quote_leaves_its_argument_unevaluated() {
        let tests = vec![
            ("quote(5)", "5"),
            ("quote(5 + 8)", "(5 + 8)"),
            ("quote(foobar)", "foobar"),
            ("quote(hello + world)", "(hello + world)"),
        ];

        for (input, expected) in tests {
            assert_eq!(expected, eval_quote(input), "for `{}`", input);
        }
    }

    #[test]
    fn unquote_reinjects_values_as_syntax() {
        let tests = vec![
            ("quote(unquote(4))", "4"),
            ("quote(unquote(4 + 4))", "8"),
            ("quote(8 + unquote(4 + 4))", "(8 + 8)"),
            ("quote(unquote(4 + 4) + 8)", "(8 + 8)"),
            ("let foobar = 8; quote(foobar)", "foobar"),
            ("let foobar = 8; quote(unquote(foobar))", "8"),
            ("quote(unquote(true))", "true"),
            ("quote(unquote(true == false))", "false"),
            (r#"quote(unquote("hi"))"#, r#""hi""#),
            ("quote(unquote(quote(4 + 4)))", "(4 + 4)"),
            (
                "let quotedInfixExpression = quote(4 + 4);
                 quote(unquote(4 + 4) + unquote(quotedInfixExpression))",
                "(8 + (4 + 4))",
            ),
        ];

        for (input, expected) in tests {
            assert_eq!(expected, eval_quote(input), "for `{}`", input);
        }
    }

    #[test]
    fn quote_and_unquote_are_recognised_structurally() {
        // shadowing the names does not reach the special forms
        let tests = vec![
            ("let quote = 1; quote(4)", "4"),
            ("let unquote = fn(x) { x }; quote(unquote(4 + 4))", "8"),
        ];

        for (input, expected) in tests {
            assert_eq!(expected, eval_quote(input), "for `{}`", input);
        }
    }

    #[test]
    fn quote_errors() {
        let tests = vec![
            ("quote()", "wrong number of arguments. got=0, want=1"),
            ("quote(1, 2)", "wrong number of arguments. got=2, want=1"),
            (
                "quote(unquote(fn(x) { x }))",
                "argument to `unquote` not supported, got FUNCTION",
            ),
            (
                "quote(unquote(missing))",
                "identifier not found: missing",
            ),
        ];

        for (input, expected) in tests {
            let lexer = Lexer::new(input);
            let mut parser = Parser::new(lexer);
            let program = parser.parse_program();
            let env = Environment::new();

            match crate::evaluator::eval(&program, &env) {
                Ok(value) => panic!("no error, got `{}` for `{}`", value, input),
                Err(err) => assert_eq!(expected, err.to_string(), "for `{}`", input),
            }
        }
    }
}
