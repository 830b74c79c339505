use thiserror::Error;

use crate::Span;
use crate::ast::{
    BlockStatement, Expression, Identifier, InfixOperator, PrefixOperator, Program, Statement,
};
use crate::lexer::{Lexer, Token, TokenKind};

/// A single parse diagnostic.
///
/// Diagnostics are non-fatal: the parser records one, abandons the current
/// production and resynchronizes at the next statement. Callers must check
/// the accumulated list before trusting the tree.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("expected next token to be {expected}, got {} instead", found.kind)]
    UnexpectedToken { expected: TokenKind, found: Token },
    #[error("no prefix parse function for {} found", .0.kind)]
    NoPrefixParse(Token),
    #[error("could not parse {} as integer", .0.literal)]
    InvalidIntegerLiteral(Token),
}

impl ParseError {
    /// The source span the diagnostic points at.
    pub fn span(&self) -> Span {
        match self {
            ParseError::UnexpectedToken { found, .. } => found.span,
            ParseError::NoPrefixParse(token) => token.span,
            ParseError::InvalidIntegerLiteral(token) => token.span,
        }
    }
}

// Binding power of each operator token, lowest to highest. Ord on the
// declaration order is what drives the precedence climbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    Lowest,
    Equals,      // ==
    LessGreater, // > or <
    Sum,         // +
    Product,     // *
    Prefix,      // -x or !x
    Call,        // myFunction(x)
}

impl Precedence {
    fn of(kind: TokenKind) -> Precedence {
        match kind {
            TokenKind::Eq | TokenKind::NotEq => Precedence::Equals,
            TokenKind::Lt | TokenKind::Gt => Precedence::LessGreater,
            TokenKind::Plus | TokenKind::Minus => Precedence::Sum,
            TokenKind::Slash | TokenKind::Asterisk => Precedence::Product,
            TokenKind::LParen => Precedence::Call,
            _ => Precedence::Lowest,
        }
    }
}

/// Pratt parser over the token stream: one token of lookahead, no
/// backtracking.
pub struct Parser<'src> {
    lexer: Lexer<'src>,
    cur_token: Token,
    peek_token: Token,
    errors: Vec<ParseError>,
}

impl<'src> Parser<'src> {
    pub fn new(lexer: Lexer<'src>) -> Parser<'src> {
        let mut parser = Parser {
            lexer,
            cur_token: Token::eof(0),
            peek_token: Token::eof(0),
            errors: Vec::new(),
        };
        // Read two tokens to populate cur and peek.
        parser.next_token();
        parser.next_token();
        parser
    }

    /// Diagnostics accumulated so far, in source order.
    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<ParseError> {
        self.errors
    }

    pub fn parse_program(&mut self) -> Program {
        let mut program = Program::default();

        while self.cur_token.kind != TokenKind::Eof {
            if let Some(stmt) = self.parse_statement() {
                program.statements.push(stmt);
            }
            self.next_token();
        }

        program
    }

    fn parse_statement(&mut self) -> Option<Statement> {
        match self.cur_token.kind {
            TokenKind::Let => self.parse_let_statement(),
            TokenKind::Return => self.parse_return_statement(),
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_let_statement(&mut self) -> Option<Statement> {
        self.expect_peek(TokenKind::Ident)?;
        let name = Identifier::new(self.cur_token.literal.clone());

        self.expect_peek(TokenKind::Assign)?;

        self.next_token();
        let value = self.parse_expression(Precedence::Lowest)?;

        self.skip_optional_semicolon();
        Some(Statement::Let { name, value })
    }

    fn parse_return_statement(&mut self) -> Option<Statement> {
        self.next_token();
        let value = self.parse_expression(Precedence::Lowest)?;

        self.skip_optional_semicolon();
        Some(Statement::Return { value })
    }

    fn parse_expression_statement(&mut self) -> Option<Statement> {
        let expression = self.parse_expression(Precedence::Lowest)?;

        self.skip_optional_semicolon();
        Some(Statement::Expression { expression })
    }

    /// Precedence climbing: parse a prefix operand, then fold it into infix
    /// expressions for as long as the peek operator binds tighter than
    /// `precedence`.
    fn parse_expression(&mut self, precedence: Precedence) -> Option<Expression> {
        let mut left = match self.cur_token.kind {
            TokenKind::Ident => Expression::Identifier(Identifier::new(
                self.cur_token.literal.clone(),
            )),
            TokenKind::Int => self.parse_integer_literal()?,
            TokenKind::True => Expression::BooleanLiteral(true),
            TokenKind::False => Expression::BooleanLiteral(false),
            TokenKind::Bang | TokenKind::Minus => self.parse_prefix_expression()?,
            TokenKind::LParen => self.parse_grouped_expression()?,
            TokenKind::If => self.parse_if_expression()?,
            TokenKind::Function => self.parse_function_literal()?,
            _ => {
                self.errors
                    .push(ParseError::NoPrefixParse(self.cur_token.clone()));
                return None;
            }
        };

        while self.peek_token.kind != TokenKind::Semicolon
            && precedence < Precedence::of(self.peek_token.kind)
        {
            left = match self.peek_token.kind {
                TokenKind::Plus
                | TokenKind::Minus
                | TokenKind::Slash
                | TokenKind::Asterisk
                | TokenKind::Eq
                | TokenKind::NotEq
                | TokenKind::Lt
                | TokenKind::Gt => {
                    self.next_token();
                    self.parse_infix_expression(left)?
                }
                TokenKind::LParen => {
                    self.next_token();
                    self.parse_call_expression(left)?
                }
                _ => break,
            };
        }

        Some(left)
    }

    fn parse_integer_literal(&mut self) -> Option<Expression> {
        match self.cur_token.literal.parse::<i64>() {
            Ok(value) => Some(Expression::IntegerLiteral(value)),
            Err(_) => {
                self.errors
                    .push(ParseError::InvalidIntegerLiteral(self.cur_token.clone()));
                None
            }
        }
    }

    fn parse_prefix_expression(&mut self) -> Option<Expression> {
        let operator = match self.cur_token.kind {
            TokenKind::Bang => PrefixOperator::Bang,
            _ => PrefixOperator::Minus,
        };

        self.next_token();
        let right = self.parse_expression(Precedence::Prefix)?;

        Some(Expression::Prefix {
            operator,
            right: Box::new(right),
        })
    }

    fn parse_infix_expression(&mut self, left: Expression) -> Option<Expression> {
        let operator = match self.cur_token.kind {
            TokenKind::Plus => InfixOperator::Plus,
            TokenKind::Minus => InfixOperator::Minus,
            TokenKind::Slash => InfixOperator::Slash,
            TokenKind::Asterisk => InfixOperator::Asterisk,
            TokenKind::Eq => InfixOperator::Eq,
            TokenKind::NotEq => InfixOperator::NotEq,
            TokenKind::Lt => InfixOperator::Lt,
            _ => InfixOperator::Gt,
        };

        // Recursing with our own precedence makes same-level operators fold
        // left-associatively.
        let precedence = Precedence::of(self.cur_token.kind);
        self.next_token();
        let right = self.parse_expression(precedence)?;

        Some(Expression::Infix {
            left: Box::new(left),
            operator,
            right: Box::new(right),
        })
    }

    fn parse_grouped_expression(&mut self) -> Option<Expression> {
        self.next_token();
        let expression = self.parse_expression(Precedence::Lowest)?;

        self.expect_peek(TokenKind::RParen)?;
        Some(expression)
    }

    fn parse_if_expression(&mut self) -> Option<Expression> {
        self.expect_peek(TokenKind::LParen)?;

        self.next_token();
        let condition = self.parse_expression(Precedence::Lowest)?;

        self.expect_peek(TokenKind::RParen)?;
        self.expect_peek(TokenKind::LBrace)?;

        let consequence = self.parse_block_statement();

        let alternative = if self.peek_token.kind == TokenKind::Else {
            self.next_token();
            self.expect_peek(TokenKind::LBrace)?;
            Some(self.parse_block_statement())
        } else {
            None
        };

        Some(Expression::If {
            condition: Box::new(condition),
            consequence,
            alternative,
        })
    }

    fn parse_block_statement(&mut self) -> BlockStatement {
        let mut block = BlockStatement::default();
        self.next_token();

        while self.cur_token.kind != TokenKind::RBrace && self.cur_token.kind != TokenKind::Eof {
            if let Some(stmt) = self.parse_statement() {
                block.statements.push(stmt);
            }
            self.next_token();
        }

        block
    }

    fn parse_function_literal(&mut self) -> Option<Expression> {
        self.expect_peek(TokenKind::LParen)?;

        let parameters = self.parse_function_parameters()?;

        self.expect_peek(TokenKind::LBrace)?;
        let body = self.parse_block_statement();

        Some(Expression::FunctionLiteral { parameters, body })
    }

    fn parse_function_parameters(&mut self) -> Option<Vec<Identifier>> {
        let mut identifiers = Vec::new();

        if self.peek_token.kind == TokenKind::RParen {
            self.next_token();
            return Some(identifiers);
        }

        self.expect_peek(TokenKind::Ident)?;
        identifiers.push(Identifier::new(self.cur_token.literal.clone()));

        while self.peek_token.kind == TokenKind::Comma {
            self.next_token();
            self.expect_peek(TokenKind::Ident)?;
            identifiers.push(Identifier::new(self.cur_token.literal.clone()));
        }

        self.expect_peek(TokenKind::RParen)?;
        Some(identifiers)
    }

    fn parse_call_expression(&mut self, function: Expression) -> Option<Expression> {
        let arguments = self.parse_call_arguments()?;
        Some(Expression::Call {
            function: Box::new(function),
            arguments,
        })
    }

    fn parse_call_arguments(&mut self) -> Option<Vec<Expression>> {
        let mut arguments = Vec::new();

        if self.peek_token.kind == TokenKind::RParen {
            self.next_token();
            return Some(arguments);
        }

        self.next_token();
        arguments.push(self.parse_expression(Precedence::Lowest)?);

        while self.peek_token.kind == TokenKind::Comma {
            self.next_token();
            self.next_token();
            arguments.push(self.parse_expression(Precedence::Lowest)?);
        }

        self.expect_peek(TokenKind::RParen)?;
        Some(arguments)
    }

    fn next_token(&mut self) {
        self.cur_token = std::mem::replace(&mut self.peek_token, self.lexer.next_token());
    }

    /// Advance if the peek token has the expected kind, otherwise record a
    /// diagnostic and abort the current production.
    fn expect_peek(&mut self, expected: TokenKind) -> Option<()> {
        if self.peek_token.kind == expected {
            self.next_token();
            Some(())
        } else {
            self.errors.push(ParseError::UnexpectedToken {
                expected,
                found: self.peek_token.clone(),
            });
            None
        }
    }

    fn skip_optional_semicolon(&mut self) {
        if self.peek_token.kind == TokenKind::Semicolon {
            self.next_token();
        }
    }
}

/// Helper to lex and parse a string directly (useful for tests and the
/// REPL). Returns the accumulated diagnostics when any were recorded; the
/// partial tree is not exposed in that case.
pub fn parse(input: &str) -> Result<Program, Vec<ParseError>> {
    let mut parser = Parser::new(Lexer::new(input));
    let program = parser.parse_program();
    if parser.errors().is_empty() {
        Ok(program)
    } else {
        Err(parser.into_errors())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Helper for asserting successful parsing
    fn parse_ok(input: &str) -> Program {
        match parse(input) {
            Ok(program) => program,
            Err(errors) => panic!("Parsing failed for input '{}': {:?}", input, errors),
        }
    }

    // Helper to parse a single expression statement
    fn parse_expr(input: &str) -> Expression {
        let program = parse_ok(input);
        assert_eq!(program.statements.len(), 1, "Input: '{}'", input);
        match &program.statements[0] {
            Statement::Expression { expression } => expression.clone(),
            other => panic!("Expected expression statement, got: {:?}", other),
        }
    }

    fn assert_parsed_display(input: &str, expected: &str) {
        assert_eq!(parse_ok(input).to_string(), expected, "Input: '{}'", input);
    }

    #[test]
    fn test_parse_let_statements() {
        let program = parse_ok("let x = 5; let y = true; let foobar = y;");
        assert_eq!(program.statements.len(), 3);
        assert_eq!(
            program.statements[0],
            Statement::Let {
                name: Identifier::new("x"),
                value: Expression::IntegerLiteral(5),
            }
        );
        assert_eq!(
            program.statements[1],
            Statement::Let {
                name: Identifier::new("y"),
                value: Expression::BooleanLiteral(true),
            }
        );
        assert_eq!(
            program.statements[2],
            Statement::Let {
                name: Identifier::new("foobar"),
                value: Expression::Identifier(Identifier::new("y")),
            }
        );
    }

    #[test]
    fn test_parse_return_statements() {
        let program = parse_ok("return 5; return foobar;");
        assert_eq!(program.statements.len(), 2);
        assert_eq!(
            program.statements[0],
            Statement::Return {
                value: Expression::IntegerLiteral(5),
            }
        );
    }

    #[test]
    fn test_semicolons_are_optional() {
        let program = parse_ok("let x = 5\nx + 1");
        assert_eq!(program.statements.len(), 2);
    }

    #[test]
    fn test_parse_prefix_expressions() {
        assert_eq!(
            parse_expr("!5;"),
            Expression::Prefix {
                operator: PrefixOperator::Bang,
                right: Box::new(Expression::IntegerLiteral(5)),
            }
        );
        assert_eq!(
            parse_expr("-foobar;"),
            Expression::Prefix {
                operator: PrefixOperator::Minus,
                right: Box::new(Expression::Identifier(Identifier::new("foobar"))),
            }
        );
    }

    #[test]
    fn test_parse_infix_expressions() {
        let cases = [
            ("5 + 6;", InfixOperator::Plus),
            ("5 - 6;", InfixOperator::Minus),
            ("5 * 6;", InfixOperator::Asterisk),
            ("5 / 6;", InfixOperator::Slash),
            ("5 < 6;", InfixOperator::Lt),
            ("5 > 6;", InfixOperator::Gt),
            ("5 == 6;", InfixOperator::Eq),
            ("5 != 6;", InfixOperator::NotEq),
        ];
        for (input, operator) in cases {
            assert_eq!(
                parse_expr(input),
                Expression::Infix {
                    left: Box::new(Expression::IntegerLiteral(5)),
                    operator,
                    right: Box::new(Expression::IntegerLiteral(6)),
                },
                "Input: '{}'",
                input
            );
        }
    }

    #[test]
    fn test_operator_precedence() {
        assert_parsed_display("1 + 2 * 3", "(1 + (2 * 3))");
        assert_parsed_display("-a * b", "((-a) * b)");
        assert_parsed_display("a + b + c", "((a + b) + c)");
        assert_parsed_display("a + b - c", "((a + b) - c)");
        assert_parsed_display("a * b / c", "((a * b) / c)");
        assert_parsed_display("!-a", "(!(-a))");
        assert_parsed_display("a + b * c + d / e - f", "(((a + (b * c)) + (d / e)) - f)");
        assert_parsed_display("5 < 4 != 3 > 4", "((5 < 4) != (3 > 4))");
        assert_parsed_display(
            "3 + 4 * 5 == 3 * 1 + 4 * 5",
            "((3 + (4 * 5)) == ((3 * 1) + (4 * 5)))",
        );
        assert_parsed_display("3 > 5 == false", "((3 > 5) == false)");
    }

    #[test]
    fn test_grouped_expressions() {
        assert_parsed_display("(5 + 5) * 2", "((5 + 5) * 2)");
        assert_parsed_display("2 / (5 + 5)", "(2 / (5 + 5))");
        assert_parsed_display("-(5 + 5)", "(-(5 + 5))");
        assert_parsed_display("!(true == true)", "(!(true == true))");
    }

    #[test]
    fn test_call_precedence() {
        assert_parsed_display("a + add(b * c) + d", "((a + add((b * c))) + d)");
        assert_parsed_display(
            "add(a, b, 1, 2 * 3, 4 + 5, add(6, 7 * 8))",
            "add(a, b, 1, (2 * 3), (4 + 5), add(6, (7 * 8)))",
        );
    }

    #[test]
    fn test_parse_if_expression() {
        let expr = parse_expr("if (x < y) { x }");
        match expr {
            Expression::If {
                condition,
                consequence,
                alternative,
            } => {
                assert_eq!(condition.to_string(), "(x < y)");
                assert_eq!(consequence.statements.len(), 1);
                assert!(alternative.is_none());
            }
            other => panic!("Expected if expression, got: {:?}", other),
        }
    }

    #[test]
    fn test_parse_if_else_expression() {
        let expr = parse_expr("if (x < y) { x } else { y }");
        match expr {
            Expression::If { alternative, .. } => {
                let alternative = alternative.expect("alternative should be present");
                assert_eq!(alternative.statements.len(), 1);
                assert_eq!(alternative.to_string(), "{ y }");
            }
            other => panic!("Expected if expression, got: {:?}", other),
        }
    }

    #[test]
    fn test_parse_function_literal() {
        let expr = parse_expr("fn(x, y) { x + y; }");
        match expr {
            Expression::FunctionLiteral { parameters, body } => {
                assert_eq!(
                    parameters,
                    vec![Identifier::new("x"), Identifier::new("y")]
                );
                assert_eq!(body.statements.len(), 1);
            }
            other => panic!("Expected function literal, got: {:?}", other),
        }
    }

    #[test]
    fn test_parse_function_parameter_lists() {
        let cases = [
            ("fn() {};", vec![]),
            ("fn(x) {};", vec!["x"]),
            ("fn(x, y, z) {};", vec!["x", "y", "z"]),
        ];
        for (input, expected) in cases {
            match parse_expr(input) {
                Expression::FunctionLiteral { parameters, .. } => {
                    let names: Vec<&str> =
                        parameters.iter().map(|p| p.name.as_str()).collect();
                    assert_eq!(names, expected, "Input: '{}'", input);
                }
                other => panic!("Expected function literal, got: {:?}", other),
            }
        }
    }

    #[test]
    fn test_parse_call_expression() {
        let expr = parse_expr("add(1, 2 * 3, 4 + 5);");
        match expr {
            Expression::Call {
                function,
                arguments,
            } => {
                assert_eq!(function.to_string(), "add");
                assert_eq!(arguments.len(), 3);
                assert_eq!(arguments[1].to_string(), "(2 * 3)");
            }
            other => panic!("Expected call expression, got: {:?}", other),
        }
    }

    #[test]
    fn test_empty_and_chained_calls() {
        assert_parsed_display("noArgs()", "noArgs()");
        assert_parsed_display("curried(1)(2)", "curried(1)(2)");
    }

    #[test]
    fn test_missing_assign_records_diagnostic() {
        let errors = parse("let x 5;").expect_err("should not parse");
        assert!(
            errors
                .iter()
                .any(|e| matches!(e, ParseError::UnexpectedToken { expected, .. }
                    if *expected == TokenKind::Assign)),
            "got: {:?}",
            errors
        );
        assert_eq!(
            errors[0].to_string(),
            "expected next token to be ASSIGN, got INT instead"
        );
    }

    #[test]
    fn test_no_prefix_parse_diagnostic() {
        let errors = parse("5 + * 5;").expect_err("should not parse");
        assert_eq!(
            errors[0].to_string(),
            "no prefix parse function for ASTERISK found"
        );

        // Tokens the lexer knows but the parser has no handler for.
        let errors = parse("a <= b;").expect_err("should not parse");
        assert_eq!(errors[0].to_string(), "no prefix parse function for LE found");
        let errors = parse("while;").expect_err("should not parse");
        assert_eq!(
            errors[0].to_string(),
            "no prefix parse function for WHILE found"
        );
    }

    #[test]
    fn test_integer_overflow_records_diagnostic() {
        let errors = parse("92233720368547758089;").expect_err("should not parse");
        assert_eq!(
            errors[0].to_string(),
            "could not parse 92233720368547758089 as integer"
        );
    }

    #[test]
    fn test_recovery_at_next_statement() {
        // The bad let statement aborts, but the following statement still
        // parses into the tree.
        let mut parser = Parser::new(Lexer::new("let x 5; let y = 10;"));
        let program = parser.parse_program();
        assert_eq!(parser.errors().len(), 1);
        assert!(program.statements.iter().any(|s| matches!(
            s,
            Statement::Let { name, .. } if name.name == "y"
        )));
    }

    #[test]
    fn test_unclosed_group_records_diagnostic() {
        let errors = parse("(1 + 2").expect_err("should not parse");
        assert!(
            errors
                .iter()
                .any(|e| matches!(e, ParseError::UnexpectedToken { expected, .. }
                    if *expected == TokenKind::RParen)),
            "got: {:?}",
            errors
        );
    }

    #[test]
    fn test_diagnostics_are_ordered() {
        let mut parser = Parser::new(Lexer::new("let x 5; let = 10; 5 + * 5;"));
        parser.parse_program();
        let rendered: Vec<String> =
            parser.errors().iter().map(|e| e.to_string()).collect();
        // The failed `let =` production leaves the parser resynchronizing on
        // the `=` token itself, which records its own missing-prefix entry.
        assert_eq!(
            rendered,
            vec![
                "expected next token to be ASSIGN, got INT instead".to_string(),
                "expected next token to be IDENT, got ASSIGN instead".to_string(),
                "no prefix parse function for ASSIGN found".to_string(),
                "no prefix parse function for ASTERISK found".to_string(),
            ]
        );
    }
}
