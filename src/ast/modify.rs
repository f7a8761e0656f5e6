use super::{BlockStatement, Expression, Program, Statement};

/// Bottom-up rewrite of a program: every expression node is rebuilt from
/// its (already rewritten) children and then handed to `modifier`, whose
/// return value replaces the node. This is the only post-construction
/// mutation the AST supports; both macro expansion and `unquote`
/// substitution are built on it.
pub fn modify_program<F>(program: Program, modifier: &mut F) -> Program
where
    F: FnMut(Expression) -> Expression,
{
    Program {
        statements: program
            .statements
            .into_iter()
            .map(|statement| modify_statement(statement, modifier))
            .collect(),
    }
}

pub fn modify_statement<F>(statement: Statement, modifier: &mut F) -> Statement
where
    F: FnMut(Expression) -> Expression,
{
    match statement {
        Statement::Let(name, value) => Statement::Let(name, modify_expression(value, modifier)),
        Statement::Return(value) => Statement::Return(modify_expression(value, modifier)),
        Statement::Expression(expression) => {
            Statement::Expression(modify_expression(expression, modifier))
        }
    }
}

pub fn modify_block<F>(block: BlockStatement, modifier: &mut F) -> BlockStatement
where
    F: FnMut(Expression) -> Expression,
{
    BlockStatement {
        statements: block
            .statements
            .into_iter()
            .map(|statement| modify_statement(statement, modifier))
            .collect(),
    }
}

pub fn modify_expression<F>(expression: Expression, modifier: &mut F) -> Expression
where
    F: FnMut(Expression) -> Expression,
{
    let rebuilt = match expression {
        Expression::Prefix(operator, right) => {
            Expression::Prefix(operator, Box::new(modify_expression(*right, modifier)))
        }
        Expression::Infix(operator, left, right) => Expression::Infix(
            operator,
            Box::new(modify_expression(*left, modifier)),
            Box::new(modify_expression(*right, modifier)),
        ),
        Expression::Grouped(inner) => {
            Expression::Grouped(Box::new(modify_expression(*inner, modifier)))
        }
        Expression::If(condition, consequence, alternative) => Expression::If(
            Box::new(modify_expression(*condition, modifier)),
            modify_block(consequence, modifier),
            alternative.map(|block| modify_block(block, modifier)),
        ),
        Expression::FunctionLiteral(parameters, body) => {
            Expression::FunctionLiteral(parameters, modify_block(body, modifier))
        }
        Expression::MacroLiteral(parameters, body) => {
            Expression::MacroLiteral(parameters, modify_block(body, modifier))
        }
        Expression::Call(function, arguments) => Expression::Call(
            Box::new(modify_expression(*function, modifier)),
            arguments
                .into_iter()
                .map(|argument| modify_expression(argument, modifier))
                .collect(),
        ),
        Expression::ArrayLiteral(elements) => Expression::ArrayLiteral(
            elements
                .into_iter()
                .map(|element| modify_expression(element, modifier))
                .collect(),
        ),
        Expression::Index(collection, index) => Expression::Index(
            Box::new(modify_expression(*collection, modifier)),
            Box::new(modify_expression(*index, modifier)),
        ),
        // keys may themselves be rewritten, so the pair list is rebuilt
        Expression::HashLiteral(pairs) => Expression::HashLiteral(
            pairs
                .into_iter()
                .map(|(key, value)| {
                    (
                        modify_expression(key, modifier),
                        modify_expression(value, modifier),
                    )
                })
                .collect(),
        ),
        leaf => leaf,
    };

    modifier(rebuilt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{InfixOperator, PrefixOperator};

    fn one() -> Expression {
        Expression::NumberLiteral(1)
    }

    fn two() -> Expression {
        Expression::NumberLiteral(2)
    }

    fn turn_one_into_two(expression: Expression) -> Expression {
        match expression {
            Expression::NumberLiteral(1) => Expression::NumberLiteral(2),
            other => other,
        }
    }

    fn block(expression: Expression) -> BlockStatement {
        BlockStatement {
            statements: vec![Statement::Expression(expression)],
        }
    }

    #[test]
    fn modify_rewrites_every_expression_position() {
        let tests: Vec<(Expression, Expression)> = vec![
            (one(), two()),
            (
                Expression::Infix(InfixOperator::Plus, Box::new(one()), Box::new(two())),
                Expression::Infix(InfixOperator::Plus, Box::new(two()), Box::new(two())),
            ),
            (
                Expression::Infix(InfixOperator::Plus, Box::new(two()), Box::new(one())),
                Expression::Infix(InfixOperator::Plus, Box::new(two()), Box::new(two())),
            ),
            (
                Expression::Prefix(PrefixOperator::Minus, Box::new(one())),
                Expression::Prefix(PrefixOperator::Minus, Box::new(two())),
            ),
            (
                Expression::Grouped(Box::new(one())),
                Expression::Grouped(Box::new(two())),
            ),
            (
                Expression::Index(Box::new(one()), Box::new(one())),
                Expression::Index(Box::new(two()), Box::new(two())),
            ),
            (
                Expression::If(Box::new(one()), block(one()), Some(block(one()))),
                Expression::If(Box::new(two()), block(two()), Some(block(two()))),
            ),
            (
                Expression::FunctionLiteral(vec!["x".to_owned()], block(one())),
                Expression::FunctionLiteral(vec!["x".to_owned()], block(two())),
            ),
            (
                Expression::Call(Box::new(Expression::Identifier("f".to_owned())), vec![one()]),
                Expression::Call(Box::new(Expression::Identifier("f".to_owned())), vec![two()]),
            ),
            (
                Expression::ArrayLiteral(vec![one(), one()]),
                Expression::ArrayLiteral(vec![two(), two()]),
            ),
            (
                Expression::HashLiteral(vec![(one(), one())]),
                Expression::HashLiteral(vec![(two(), two())]),
            ),
        ];

        for (input, expected) in tests {
            let actual = modify_expression(input, &mut turn_one_into_two);
            assert_eq!(expected, actual);
        }
    }

    #[test]
    fn modify_rewrites_statements() {
        let program = Program {
            statements: vec![
                Statement::Let("x".to_owned(), one()),
                Statement::Return(one()),
                Statement::Expression(one()),
            ],
        };

        let expected = Program {
            statements: vec![
                Statement::Let("x".to_owned(), two()),
                Statement::Return(two()),
                Statement::Expression(two()),
            ],
        };

        assert_eq!(expected, modify_program(program, &mut turn_one_into_two));
    }
}
