use crate::ast::{
    BlockStatement, Expression, InfixOperator, PrefixOperator, Program, Statement,
};
use crate::lexer::Lexer;
use crate::token::{Token, TokenKind};

use thiserror::Error;

/// Binding power ladder, strictly increasing. All infix operators are
/// left-associative.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    None,
    Equality,   // == or !=
    Comparison, // > or <
    Term,       // + or -
    Factor,     // * or /
    Unary,      // -x or !x
    Call,       // myFunction(x)
    Index,      // array[index]
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ParserError {
    #[error("Error:{line}:{offset}: expect expression, got {got:?}")]
    ExpectedExpression {
        line: usize,
        offset: usize,
        got: String,
    },
    #[error("Error:{line}:{offset}: invalid integer literal {got:?}")]
    InvalidIntegerLiteral {
        line: usize,
        offset: usize,
        got: String,
    },
    #[error("Error:{line}:{offset}: unexpected token {got:?}, wanted {wanted:?}")]
    UnexpectedToken {
        line: usize,
        offset: usize,
        got: String,
        wanted: &'static str,
    },
}

type Result<T> = std::result::Result<T, ParserError>;

type PrefixParseFn = fn(&mut Parser<'_>) -> Result<Expression>;
type InfixParseFn = fn(&mut Parser<'_>, Expression) -> Result<Expression>;

/// Per-token parse rule: how the token parses in prefix position, how it
/// continues an expression in infix position, and its infix precedence.
struct Rule {
    prefix: Option<PrefixParseFn>,
    infix: Option<InfixParseFn>,
    precedence: Precedence,
}

impl Rule {
    const NONE: Rule = Rule {
        prefix: None,
        infix: None,
        precedence: Precedence::None,
    };

    fn prefix(prefix: PrefixParseFn) -> Rule {
        Rule {
            prefix: Some(prefix),
            infix: None,
            precedence: Precedence::None,
        }
    }

    fn infix(infix: InfixParseFn, precedence: Precedence) -> Rule {
        Rule {
            prefix: None,
            infix: Some(infix),
            precedence,
        }
    }
}

fn rule(kind: TokenKind) -> Rule {
    match kind {
        TokenKind::Ident => Rule::prefix(|p| p.parse_identifier()),
        TokenKind::Number => Rule::prefix(|p| p.parse_number_literal()),
        TokenKind::Str => Rule::prefix(|p| p.parse_string_literal()),
        TokenKind::True | TokenKind::False => Rule::prefix(|p| p.parse_boolean()),
        TokenKind::Bang => Rule::prefix(|p| p.parse_prefix_expression()),
        TokenKind::Minus => Rule {
            prefix: Some(|p| p.parse_prefix_expression()),
            infix: Some(|p, left| p.parse_infix_expression(left)),
            precedence: Precedence::Term,
        },
        TokenKind::Plus => Rule::infix(|p, left| p.parse_infix_expression(left), Precedence::Term),
        TokenKind::Star | TokenKind::Slash => {
            Rule::infix(|p, left| p.parse_infix_expression(left), Precedence::Factor)
        }
        TokenKind::Less | TokenKind::More => {
            Rule::infix(|p, left| p.parse_infix_expression(left), Precedence::Comparison)
        }
        TokenKind::EqualEqual | TokenKind::BangEqual => {
            Rule::infix(|p, left| p.parse_infix_expression(left), Precedence::Equality)
        }
        TokenKind::LParen => Rule {
            prefix: Some(|p| p.parse_grouped_expression()),
            infix: Some(|p, function| p.parse_call_expression(function)),
            precedence: Precedence::Call,
        },
        TokenKind::LBracket => Rule {
            prefix: Some(|p| p.parse_array_literal()),
            infix: Some(|p, left| p.parse_index_expression(left)),
            precedence: Precedence::Index,
        },
        TokenKind::LBrace => Rule::prefix(|p| p.parse_hash_literal()),
        TokenKind::If => Rule::prefix(|p| p.parse_if_expression()),
        TokenKind::Function => Rule::prefix(|p| p.parse_function_literal()),
        TokenKind::Macro => Rule::prefix(|p| p.parse_macro_literal()),
        _ => Rule::NONE,
    }
}

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    peek: Token,
    errors: Vec<ParserError>,
}

impl<'a> Parser<'a> {
    pub fn new(lexer: Lexer<'a>) -> Self {
        let mut p = Parser {
            lexer,
            current: Token::eof(0, 1),
            peek: Token::eof(0, 1),
            errors: vec![],
        };

        // Read 2 tokens so that current and peek are both initialised
        p.next_token();
        p.next_token();

        p
    }

    /// Best-effort parse: statements that fail are recorded in
    /// `errors()` and skipped, and parsing continues. Callers must
    /// inspect `errors()` before trusting the program.
    pub fn parse_program(&mut self) -> Program {
        let mut statements = vec![];

        while self.current.kind != TokenKind::Eof {
            match self.parse_statement() {
                Ok(statement) => statements.push(statement),
                Err(err) => self.errors.push(err),
            }
            self.next_token();
        }

        Program { statements }
    }

    pub fn errors(&self) -> &[ParserError] {
        &self.errors
    }

    fn next_token(&mut self) {
        self.current = std::mem::replace(&mut self.peek, self.lexer.next());
    }

    fn parse_statement(&mut self) -> Result<Statement> {
        match self.current.kind {
            TokenKind::Let => self.parse_let_statement(),
            TokenKind::Return => self.parse_return_statement(),
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_let_statement(&mut self) -> Result<Statement> {
        self.expect_peek(TokenKind::Ident)?;
        let name = self.current.lexeme.clone();

        self.expect_peek(TokenKind::Equal)?;
        self.next_token();

        let value = self.parse_expression(Precedence::None)?;
        self.skip_optional_semicolon();

        Ok(Statement::Let(name, value))
    }

    fn parse_return_statement(&mut self) -> Result<Statement> {
        self.next_token();

        let value = self.parse_expression(Precedence::None)?;
        self.skip_optional_semicolon();

        Ok(Statement::Return(value))
    }

    fn parse_expression_statement(&mut self) -> Result<Statement> {
        let expression = self.parse_expression(Precedence::None)?;
        self.skip_optional_semicolon();

        Ok(Statement::Expression(expression))
    }

    fn parse_block_statement(&mut self) -> Result<BlockStatement> {
        let mut statements = vec![];

        self.next_token();

        while self.current.kind != TokenKind::RBrace && self.current.kind != TokenKind::Eof {
            statements.push(self.parse_statement()?);
            self.next_token();
        }

        Ok(BlockStatement { statements })
    }

    fn parse_expression(&mut self, precedence: Precedence) -> Result<Expression> {
        let prefix = rule(self.current.kind)
            .prefix
            .ok_or_else(|| self.expected_expression())?;

        let mut left = prefix(self)?;

        while self.peek.kind != TokenKind::SemiColon
            && precedence < rule(self.peek.kind).precedence
        {
            let infix = match rule(self.peek.kind).infix {
                Some(infix) => infix,
                None => return Ok(left),
            };

            self.next_token();
            left = infix(self, left)?;
        }

        Ok(left)
    }

    fn parse_identifier(&mut self) -> Result<Expression> {
        Ok(Expression::Identifier(self.current.lexeme.clone()))
    }

    fn parse_number_literal(&mut self) -> Result<Expression> {
        let value = self.current.lexeme.parse::<i64>().map_err(|_| {
            ParserError::InvalidIntegerLiteral {
                line: self.current.line,
                offset: self.current.start,
                got: self.current.lexeme.clone(),
            }
        })?;

        Ok(Expression::NumberLiteral(value))
    }

    fn parse_string_literal(&mut self) -> Result<Expression> {
        Ok(Expression::StringLiteral(self.current.lexeme.clone()))
    }

    fn parse_boolean(&mut self) -> Result<Expression> {
        Ok(Expression::Boolean(self.current.kind == TokenKind::True))
    }

    fn parse_prefix_expression(&mut self) -> Result<Expression> {
        let operator = match self.current.kind {
            TokenKind::Bang => PrefixOperator::Bang,
            TokenKind::Minus => PrefixOperator::Minus,
            _ => return Err(self.expected_expression()),
        };

        self.next_token();
        let right = self.parse_expression(Precedence::Unary)?;

        Ok(Expression::Prefix(operator, Box::new(right)))
    }

    fn parse_infix_expression(&mut self, left: Expression) -> Result<Expression> {
        let operator = match self.current.kind {
            TokenKind::EqualEqual => InfixOperator::Eq,
            TokenKind::BangEqual => InfixOperator::NotEq,
            TokenKind::Less => InfixOperator::Lt,
            TokenKind::More => InfixOperator::Gt,
            TokenKind::Plus => InfixOperator::Plus,
            TokenKind::Minus => InfixOperator::Minus,
            TokenKind::Star => InfixOperator::Asterisk,
            TokenKind::Slash => InfixOperator::Slash,
            _ => return Err(self.expected_expression()),
        };

        let precedence = rule(self.current.kind).precedence;
        self.next_token();
        let right = self.parse_expression(precedence)?;

        Ok(Expression::Infix(operator, Box::new(left), Box::new(right)))
    }

    fn parse_grouped_expression(&mut self) -> Result<Expression> {
        self.next_token();

        let inner = self.parse_expression(Precedence::None)?;
        self.expect_peek(TokenKind::RParen)?;

        Ok(Expression::Grouped(Box::new(inner)))
    }

    fn parse_if_expression(&mut self) -> Result<Expression> {
        self.expect_peek(TokenKind::LParen)?;
        self.next_token();

        let condition = self.parse_expression(Precedence::None)?;
        self.expect_peek(TokenKind::RParen)?;
        self.expect_peek(TokenKind::LBrace)?;

        let consequence = self.parse_block_statement()?;

        let alternative = if self.peek.kind == TokenKind::Else {
            self.next_token();
            self.expect_peek(TokenKind::LBrace)?;
            Some(self.parse_block_statement()?)
        } else {
            None
        };

        Ok(Expression::If(
            Box::new(condition),
            consequence,
            alternative,
        ))
    }

    fn parse_function_literal(&mut self) -> Result<Expression> {
        self.expect_peek(TokenKind::LParen)?;
        let parameters = self.parse_parameters()?;

        self.expect_peek(TokenKind::LBrace)?;
        let body = self.parse_block_statement()?;

        Ok(Expression::FunctionLiteral(parameters, body))
    }

    fn parse_macro_literal(&mut self) -> Result<Expression> {
        self.expect_peek(TokenKind::LParen)?;
        let parameters = self.parse_parameters()?;

        self.expect_peek(TokenKind::LBrace)?;
        let body = self.parse_block_statement()?;

        Ok(Expression::MacroLiteral(parameters, body))
    }

    fn parse_call_expression(&mut self, function: Expression) -> Result<Expression> {
        let arguments = self.parse_expression_list(TokenKind::RParen)?;
        Ok(Expression::Call(Box::new(function), arguments))
    }

    fn parse_array_literal(&mut self) -> Result<Expression> {
        let elements = self.parse_expression_list(TokenKind::RBracket)?;
        Ok(Expression::ArrayLiteral(elements))
    }

    fn parse_index_expression(&mut self, collection: Expression) -> Result<Expression> {
        self.next_token();
        let index = self.parse_expression(Precedence::None)?;

        self.expect_peek(TokenKind::RBracket)?;

        Ok(Expression::Index(Box::new(collection), Box::new(index)))
    }

    fn parse_hash_literal(&mut self) -> Result<Expression> {
        let mut pairs = vec![];

        while self.peek.kind != TokenKind::RBrace {
            self.next_token();
            let key = self.parse_expression(Precedence::None)?;

            self.expect_peek(TokenKind::Colon)?;
            self.next_token();
            let value = self.parse_expression(Precedence::None)?;

            pairs.push((key, value));

            if self.peek.kind != TokenKind::RBrace {
                self.expect_peek(TokenKind::Comma)?;
            }
        }

        self.expect_peek(TokenKind::RBrace)?;

        Ok(Expression::HashLiteral(pairs))
    }

    fn parse_parameters(&mut self) -> Result<Vec<String>> {
        let mut parameters = vec![];

        if self.peek.kind == TokenKind::RParen {
            self.next_token();
            return Ok(parameters);
        }

        self.next_token();
        parameters.push(self.current_identifier()?);

        while self.peek.kind == TokenKind::Comma {
            self.next_token(); // skip the comma
            self.next_token(); // slurp the identifier

            parameters.push(self.current_identifier()?);
        }

        self.expect_peek(TokenKind::RParen)?;

        Ok(parameters)
    }

    fn parse_expression_list(&mut self, end: TokenKind) -> Result<Vec<Expression>> {
        let mut expressions = vec![];

        if self.peek.kind == end {
            self.next_token();
            return Ok(expressions);
        }

        self.next_token();
        expressions.push(self.parse_expression(Precedence::None)?);

        while self.peek.kind == TokenKind::Comma {
            self.next_token(); // skip the comma
            self.next_token(); // slurp the expression

            expressions.push(self.parse_expression(Precedence::None)?);
        }

        self.expect_peek(end)?;

        Ok(expressions)
    }

    fn current_identifier(&self) -> Result<String> {
        if self.current.kind == TokenKind::Ident {
            Ok(self.current.lexeme.clone())
        } else {
            Err(ParserError::UnexpectedToken {
                line: self.current.line,
                offset: self.current.start,
                got: self.current.lexeme.clone(),
                wanted: TokenKind::Ident.spelling(),
            })
        }
    }

    fn skip_optional_semicolon(&mut self) {
        if self.peek.kind == TokenKind::SemiColon {
            self.next_token();
        }
    }

    fn expect_peek(&mut self, kind: TokenKind) -> Result<()> {
        if self.peek.kind != kind {
            return Err(ParserError::UnexpectedToken {
                line: self.peek.line,
                offset: self.peek.start,
                got: self.peek.lexeme.clone(),
                wanted: kind.spelling(),
            });
        }
        self.next_token();
        Ok(())
    }

    fn expected_expression(&self) -> ParserError {
        ParserError::ExpectedExpression {
            line: self.current.line,
            offset: self.current.start,
            got: self.current.lexeme.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{Expression, InfixOperator, PrefixOperator, Statement};
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn parse(input: &str) -> crate::ast::Program {
        let lexer = Lexer::new(input);
        let mut parser = Parser::new(lexer);
        let program = parser.parse_program();

        let errors = parser.errors();
        assert!(
            errors.is_empty(),
            "got parser errors for `{}`: {:?}",
            input,
            errors
        );

        program
    }

    #[test]
    fn let_statement() {
        let tests = vec![
            (
                "let x = 5;",
                Statement::Let("x".to_owned(), Expression::NumberLiteral(5)),
            ),
            (
                "let x = 5",
                Statement::Let("x".to_owned(), Expression::NumberLiteral(5)),
            ),
            (
                "let foobar = 838383;",
                Statement::Let("foobar".to_owned(), Expression::NumberLiteral(838383)),
            ),
            (
                "let s = \"hello\";",
                Statement::Let("s".to_owned(), Expression::StringLiteral("hello".to_owned())),
            ),
        ];

        for (input, expected) in tests {
            assert_eq!(vec![expected], parse(input).statements);
        }
    }

    #[test]
    fn return_statement() {
        let tests = vec![
            (
                "return 5;",
                Statement::Return(Expression::NumberLiteral(5)),
            ),
            ("return 5", Statement::Return(Expression::NumberLiteral(5))),
            (
                "return 2 * 3;",
                Statement::Return(Expression::Infix(
                    InfixOperator::Asterisk,
                    Box::new(Expression::NumberLiteral(2)),
                    Box::new(Expression::NumberLiteral(3)),
                )),
            ),
        ];

        for (input, expected) in tests {
            assert_eq!(vec![expected], parse(input).statements);
        }
    }

    #[test]
    fn identifier_expression() {
        assert_eq!(
            vec![Statement::Expression(Expression::Identifier(
                "foobar".to_owned()
            ))],
            parse("foobar;").statements
        );
    }

    #[test]
    fn number_literal() {
        assert_eq!(
            vec![Statement::Expression(Expression::NumberLiteral(5))],
            parse("5;").statements
        );
    }

    #[test]
    fn prefix_expressions() {
        let tests = vec![
            ("!5;", PrefixOperator::Bang, Expression::NumberLiteral(5)),
            ("-15;", PrefixOperator::Minus, Expression::NumberLiteral(15)),
            ("!true;", PrefixOperator::Bang, Expression::Boolean(true)),
            ("!false;", PrefixOperator::Bang, Expression::Boolean(false)),
        ];

        for (input, operator, right) in tests {
            assert_eq!(
                vec![Statement::Expression(Expression::Prefix(
                    operator,
                    Box::new(right)
                ))],
                parse(input).statements
            );
        }
    }

    #[test]
    fn infix_expressions() {
        let tests = vec![
            ("5 + 5;", InfixOperator::Plus),
            ("5 - 5;", InfixOperator::Minus),
            ("5 * 5;", InfixOperator::Asterisk),
            ("5 / 5;", InfixOperator::Slash),
            ("5 > 5;", InfixOperator::Gt),
            ("5 < 5;", InfixOperator::Lt),
            ("5 == 5;", InfixOperator::Eq),
            ("5 != 5;", InfixOperator::NotEq),
        ];

        for (input, operator) in tests {
            assert_eq!(
                vec![Statement::Expression(Expression::Infix(
                    operator,
                    Box::new(Expression::NumberLiteral(5)),
                    Box::new(Expression::NumberLiteral(5))
                ))],
                parse(input).statements
            );
        }
    }

    #[test]
    fn operator_precedence() {
        test_parsing(vec![
            ("-a * b", "((-a) * b)"),
            ("!-a", "(!(-a))"),
            ("a + b + c", "((a + b) + c)"),
            ("a + b - c", "((a + b) - c)"),
            ("a * b * c", "((a * b) * c)"),
            ("a * b / c", "((a * b) / c)"),
            ("a + b / c", "(a + (b / c))"),
            ("a + b * c + d / e - f", "(((a + (b * c)) + (d / e)) - f)"),
            ("3 + 4; -5 * 5", "(3 + 4)((-5) * 5)"),
            ("5 > 4 == 3 < 4", "((5 > 4) == (3 < 4))"),
            ("5 < 4 != 3 > 4", "((5 < 4) != (3 > 4))"),
            (
                "3 + 4 * 5 == 3 * 1 + 4 * 5",
                "((3 + (4 * 5)) == ((3 * 1) + (4 * 5)))",
            ),
            ("1 + (2 + 3) + 4", "((1 + (2 + 3)) + 4)"),
            ("(5 + 5) * 2", "((5 + 5) * 2)"),
            ("2 / (5 + 5)", "(2 / (5 + 5))"),
            ("-(5 + 5)", "(-(5 + 5))"),
            ("!(true == true)", "(!(true == true))"),
            ("add(1, 2 * 3, 4 + 5);", "add(1, (2 * 3), (4 + 5))"),
            (
                "a * [1, 2, 3, 4][b * c] * d",
                "((a * ([1, 2, 3, 4][(b * c)])) * d)",
            ),
            (
                "add(a * b[2], b[1], 2 * [1, 2][1])",
                "add((a * (b[2])), (b[1]), (2 * ([1, 2][1])))",
            ),
        ]);
    }

    #[test]
    fn boolean_expression() {
        let tests = vec![("true;", true), ("false;", false)];

        for (input, expected) in tests {
            assert_eq!(
                vec![Statement::Expression(Expression::Boolean(expected))],
                parse(input).statements
            );
        }
    }

    #[test]
    fn if_expression() {
        test_parsing(vec![
            ("if (x < y) { x }", "if ((x < y)) { x }"),
            (
                "if (x < y) { x } else { y }",
                "if ((x < y)) { x } else { y }",
            ),
        ]);
    }

    #[test]
    fn function_literal() {
        test_parsing(vec![
            ("fn() { }", "fn() {  }"),
            ("fn(x) { x }", "fn(x) { x }"),
            ("fn(x, y, z) { x }", "fn(x, y, z) { x }"),
            ("fn(x, y) { x + y; }", "fn(x, y) { (x + y) }"),
        ]);
    }

    #[test]
    fn macro_literal() {
        let program = parse("macro(x, y) { x + y; }");

        assert_eq!(
            vec![Statement::Expression(Expression::MacroLiteral(
                vec!["x".to_owned(), "y".to_owned()],
                crate::ast::BlockStatement {
                    statements: vec![Statement::Expression(Expression::Infix(
                        InfixOperator::Plus,
                        Box::new(Expression::Identifier("x".to_owned())),
                        Box::new(Expression::Identifier("y".to_owned())),
                    ))],
                },
            ))],
            program.statements
        );
    }

    #[test]
    fn string_literal() {
        test_parsing(vec![(r#""hello world""#, r#""hello world""#)]);
    }

    #[test]
    fn array_literal() {
        test_parsing(vec![
            ("[]", "[]"),
            ("[1, 2 * 2, 3 + 3]", "[1, (2 * 2), (3 + 3)]"),
        ]);
    }

    #[test]
    fn index_expression() {
        test_parsing(vec![("myArray[1 + 1]", "(myArray[(1 + 1)])")]);
    }

    #[test]
    fn hash_literal() {
        test_parsing(vec![
            ("{}", "{}"),
            (
                r#"{"one": 1, "two": 2, "three": 3}"#,
                r#"{"one": 1, "two": 2, "three": 3}"#,
            ),
            ("{true: 1, false: 2}", "{true: 1, false: 2}"),
            ("{1: 1, 2: 2, 3: 3}", "{1: 1, 2: 2, 3: 3}"),
            (
                r#"{"one": 0 + 1, "two": 10 - 8, "three": 15 / 5}"#,
                r#"{"one": (0 + 1), "two": (10 - 8), "three": (15 / 5)}"#,
            ),
        ]);
    }

    #[test]
    fn pretty_print_round_trips() {
        let sources = vec![
            "let a = 5;let b = (a + 5);c",
            "if ((x < y)) { x } else { y }",
            "fn(x, y) { (x + y) }",
            "macro(x) { quote((unquote(x) + 1)) }",
            "(!(10 > 5))",
            "{\"one\": 1, 2: \"two\", true: 3}",
            "(add(1, 2)[0])",
        ];

        for source in sources {
            let pretty = parse(source).to_string();
            assert_eq!(pretty, parse(&pretty).to_string(), "for `{}`", source);
        }
    }

    #[test]
    fn parse_errors() {
        let tests = vec![
            ("let x 5;", r#"Error:1:6: unexpected token "5", wanted "=""#),
            (
                "let = 5;",
                r#"Error:1:4: unexpected token "=", wanted "IDENT""#,
            ),
            (";", r#"Error:1:0: expect expression, got ";""#),
            (
                "9999999999999999999999",
                r#"Error:1:0: invalid integer literal "9999999999999999999999""#,
            ),
        ];

        for (input, expected) in tests {
            let lexer = Lexer::new(input);
            let mut parser = Parser::new(lexer);
            parser.parse_program();

            let errors = parser.errors();
            assert_eq!(1, errors.len(), "for `{}`", input);
            assert_eq!(expected, errors[0].to_string(), "for `{}`", input);
        }
    }

    #[test]
    fn parsing_continues_past_a_bad_statement() {
        let lexer = Lexer::new("let x 5; let y = 10;");
        let mut parser = Parser::new(lexer);
        let program = parser.parse_program();

        assert_eq!(1, parser.errors().len());
        assert!(program
            .statements
            .contains(&Statement::Let("y".to_owned(), Expression::NumberLiteral(10))));
    }

    fn test_parsing(tests: Vec<(&str, &str)>) {
        for (input, expected) in tests {
            assert_eq!(expected, parse(input).to_string(), "for `{}`", input);
        }
    }
}
