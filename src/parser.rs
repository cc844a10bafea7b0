//! Recursive-descent parser over the token stream.
//!
//! Every expression is `( <form> )`; the first token inside the
//! parentheses selects the production:
//!
//! - `def` starts a variable or function definition. A definition whose
//!   value is an `(args ...)` form immediately followed by another
//!   parenthesized form is a function definition; anything else is a
//!   variable definition, optionally marked eager with a trailing `!`.
//! - `args` declares a parameter list.
//! - `if` takes exactly three values: condition, true branch, false branch.
//! - An identifier in first position is a call; the remaining values are
//!   its arguments.
//! - Any other registered operator heads an operator form; operand count
//!   is checked at evaluation, not here.
//!
//! A value is a literal, an identifier, or a nested parenthesized form, so
//! forms nest anywhere a value is expected with no fixed depth limit.

use crate::ParseError;
use crate::ast::Expr;
use crate::token::{Symbol, Token};
use crate::tokenizer::Tokenizer;

/// Parser behavior toggles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseConfig {
    /// Skip `;` line comments as whitespace. Off by default; the REPL
    /// turns it on.
    pub handle_comments: bool,
}

/// Recursive-descent parser for one source string.
#[derive(Debug)]
pub struct Parser {
    tokenizer: Tokenizer,
    peeked: Option<(Token, usize)>,
}

impl Parser {
    pub fn new(source: &str) -> Self {
        Parser::with_config(source, ParseConfig::default())
    }

    pub fn with_config(source: &str, config: ParseConfig) -> Self {
        let tokenizer = if config.handle_comments {
            Tokenizer::with_comments(source)
        } else {
            Tokenizer::new(source)
        };
        Parser {
            tokenizer,
            peeked: None,
        }
    }

    /// Parse the whole input as one expression. Trailing tokens after the
    /// closing paren are an error.
    pub fn parse(&mut self) -> Result<Expr, ParseError> {
        let expr = self.parse_expr()?;
        if let Some((token, position)) = self.peek()? {
            return Err(ParseError::syntax(
                *position,
                format!("unexpected trailing content starting at '{token}'"),
            ));
        }
        Ok(expr)
    }

    /// Drain the remaining input as a flat token sequence. On a fresh
    /// parser this is the token stream of the whole source; useful for
    /// tooling and tests.
    pub fn tokenize(&mut self) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();
        if let Some((token, _)) = self.peeked.take() {
            tokens.push(token);
        }
        while self.tokenizer.has_next() {
            tokens.push(self.tokenizer.next_token()?);
        }
        Ok(tokens)
    }

    fn advance(&mut self) -> Result<(Token, usize), ParseError> {
        if let Some(spanned) = self.peeked.take() {
            return Ok(spanned);
        }
        self.tokenizer.next_spanned()
    }

    /// One-token lookahead; `None` when the input is exhausted.
    fn peek(&mut self) -> Result<Option<&(Token, usize)>, ParseError> {
        if self.peeked.is_none() {
            match self.tokenizer.next_spanned() {
                Ok(spanned) => self.peeked = Some(spanned),
                Err(ParseError::EndOfSource) => return Ok(None),
                Err(err) => return Err(err),
            }
        }
        Ok(self.peeked.as_ref())
    }

    fn expect_right_paren(&mut self, context: &str) -> Result<(), ParseError> {
        match self.advance()? {
            (Token::RightParen, _) => Ok(()),
            (token, position) => Err(ParseError::syntax(
                position,
                format!("expected ')' to close {context}, found '{token}'"),
            )),
        }
    }

    /// `expr := '(' form ')'`
    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        match self.advance()? {
            (Token::LeftParen, _) => self.parse_form(),
            (token, position) => Err(ParseError::syntax(
                position,
                format!("expected '(', found '{token}'"),
            )),
        }
    }

    /// Dispatch on the first token after `(`. Consumes through the
    /// matching `)`.
    fn parse_form(&mut self) -> Result<Expr, ParseError> {
        let (token, position) = self.advance()?;
        match token {
            Token::Operator(Symbol::Def) => self.parse_def(),
            Token::Operator(Symbol::Args) => self.parse_args(),
            Token::Operator(Symbol::If) => self.parse_if(),
            Token::Operator(Symbol::Bang) => Err(ParseError::syntax(
                position,
                "'!' is only valid at the end of a variable definition",
            )),
            Token::Operator(op) => {
                let operands = self.parse_values_until_close()?;
                Ok(Expr::BinaryOp { op, operands })
            }
            Token::Identifier(name) => {
                let args = self.parse_values_until_close()?;
                Ok(Expr::Call { name, args })
            }
            Token::RightParen => Err(ParseError::syntax(position, "empty expression")),
            token => Err(ParseError::syntax(
                position,
                format!("expected an operator, keyword, or identifier, found '{token}'"),
            )),
        }
    }

    /// `def IDENT (value | func_body) '!'?` with `def` already consumed.
    fn parse_def(&mut self) -> Result<Expr, ParseError> {
        let name = match self.advance()? {
            (Token::Identifier(name), _) => name,
            (token, position) => {
                return Err(ParseError::syntax(
                    position,
                    format!("def expects an identifier, found '{token}'"),
                ));
            }
        };

        let value = self.parse_value()?;
        match value {
            // An `(args ...)` value immediately followed by another
            // parenthesized form is a function definition; on its own it
            // is an ordinary variable value.
            Expr::ArgsDef(params) => {
                if self.peek_is_left_paren()? {
                    let body = self.parse_value()?;
                    match self.advance()? {
                        (Token::RightParen, _) => Ok(Expr::FunctionDef {
                            name,
                            params,
                            body: Box::new(body),
                        }),
                        (Token::Operator(Symbol::Bang), position) => Err(ParseError::syntax(
                            position,
                            "'!' is only valid on variable definitions",
                        )),
                        (token, position) => Err(ParseError::syntax(
                            position,
                            format!("expected ')' to close def, found '{token}'"),
                        )),
                    }
                } else {
                    self.finish_variable_def(name, Expr::ArgsDef(params))
                }
            }
            value => self.finish_variable_def(name, value),
        }
    }

    /// Optional `!` marker and the closing `)` of a variable definition.
    fn finish_variable_def(&mut self, name: String, value: Expr) -> Result<Expr, ParseError> {
        let eval_now = match self.peek()? {
            Some((Token::Operator(Symbol::Bang), _)) => {
                self.advance()?;
                true
            }
            _ => false,
        };
        self.expect_right_paren("def")?;
        Ok(Expr::VariableDef {
            name,
            value: Box::new(value),
            eval_now,
        })
    }

    /// `args IDENT*` with `args` already consumed; parameter names must be
    /// unique within one list.
    fn parse_args(&mut self) -> Result<Expr, ParseError> {
        let mut params: Vec<String> = Vec::new();
        loop {
            match self.advance()? {
                (Token::RightParen, _) => return Ok(Expr::ArgsDef(params)),
                (Token::Identifier(name), position) => {
                    if params.contains(&name) {
                        return Err(ParseError::syntax(
                            position,
                            format!("duplicate parameter name ':{name}'"),
                        ));
                    }
                    params.push(name);
                }
                (token, position) => {
                    return Err(ParseError::syntax(
                        position,
                        format!("args expects identifiers, found '{token}'"),
                    ));
                }
            }
        }
    }

    /// `if value value value` with `if` already consumed.
    fn parse_if(&mut self) -> Result<Expr, ParseError> {
        let condition = self.parse_value()?;
        let true_branch = self.parse_value()?;
        let false_branch = self.parse_value()?;
        self.expect_right_paren("if")?;
        Ok(Expr::If {
            condition: Box::new(condition),
            true_branch: Box::new(true_branch),
            false_branch: Box::new(false_branch),
        })
    }

    /// `value := INT | IDENT | expr`
    fn parse_value(&mut self) -> Result<Expr, ParseError> {
        match self.advance()? {
            (Token::Int(value), _) => Ok(Expr::ConstantInt(value)),
            (Token::Identifier(name), _) => Ok(Expr::Identifier(name)),
            (Token::LeftParen, _) => self.parse_form(),
            (token, position) => Err(ParseError::syntax(
                position,
                format!("expected a value, found '{token}'"),
            )),
        }
    }

    /// Values up to and including the closing `)`.
    fn parse_values_until_close(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut values = Vec::new();
        loop {
            match self.peek()? {
                Some((Token::RightParen, _)) => {
                    self.advance()?;
                    return Ok(values);
                }
                Some(_) => values.push(self.parse_value()?),
                None => return Err(ParseError::EndOfSource),
            }
        }
    }

    fn peek_is_left_paren(&mut self) -> Result<bool, ParseError> {
        Ok(matches!(self.peek()?, Some((Token::LeftParen, _))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ident, int};

    fn parse(source: &str) -> Result<Expr, ParseError> {
        Parser::new(source).parse()
    }

    fn binop(op: Symbol, operands: Vec<Expr>) -> Expr {
        Expr::BinaryOp { op, operands }
    }

    #[test]
    fn test_nested_arithmetic_to_expression() {
        let source = "(*\n    (+ 1 1)\n    (* 2 2)\n    4\n)";
        let expected = binop(
            Symbol::Star,
            vec![
                binop(Symbol::Plus, vec![int(1), int(1)]),
                binop(Symbol::Star, vec![int(2), int(2)]),
                int(4),
            ],
        );
        assert_eq!(parse(source), Ok(expected));
    }

    #[test]
    fn test_do_and_def_to_expression() {
        let source = "( do\n    ( def :kto 100 )\n    ( * ( + 1 1) 4 :kto )\n)";
        let expected = binop(
            Symbol::Do,
            vec![
                Expr::VariableDef {
                    name: "kto".to_owned(),
                    value: Box::new(int(100)),
                    eval_now: false,
                },
                binop(
                    Symbol::Star,
                    vec![
                        binop(Symbol::Plus, vec![int(1), int(1)]),
                        int(4),
                        ident("kto"),
                    ],
                ),
            ],
        );
        assert_eq!(parse(source), Ok(expected));
    }

    #[test]
    fn test_eager_def_carries_marker() {
        assert_eq!(
            parse("(def :a (* 2 2) !)"),
            Ok(Expr::VariableDef {
                name: "a".to_owned(),
                value: Box::new(binop(Symbol::Star, vec![int(2), int(2)])),
                eval_now: true,
            })
        );
    }

    #[test]
    fn test_args_to_expression() {
        assert_eq!(
            parse("(args :a :b)"),
            Ok(Expr::ArgsDef(vec!["a".to_owned(), "b".to_owned()]))
        );
    }

    #[test]
    fn test_function_definition_to_expression() {
        let source = "(def\n    :addTwo\n    (args :a :b)\n    (+ :a :b)\n)";
        let expected = Expr::FunctionDef {
            name: "addTwo".to_owned(),
            params: vec!["a".to_owned(), "b".to_owned()],
            body: Box::new(binop(Symbol::Plus, vec![ident("a"), ident("b")])),
        };
        assert_eq!(parse(source), Ok(expected));
    }

    #[test]
    fn test_args_value_without_body_is_variable_definition() {
        assert_eq!(
            parse("(def :x (args :a))"),
            Ok(Expr::VariableDef {
                name: "x".to_owned(),
                value: Box::new(Expr::ArgsDef(vec!["a".to_owned()])),
                eval_now: false,
            })
        );
    }

    #[test]
    fn test_if_to_expression() {
        let source = "(if True (if True 1 0) (+ 2 0))";
        let expected = Expr::If {
            condition: Box::new(ident("True")),
            true_branch: Box::new(Expr::If {
                condition: Box::new(ident("True")),
                true_branch: Box::new(int(1)),
                false_branch: Box::new(int(0)),
            }),
            false_branch: Box::new(binop(Symbol::Plus, vec![int(2), int(0)])),
        };
        assert_eq!(parse(source), Ok(expected));
    }

    #[test]
    fn test_call_with_nested_argument_forms() {
        let source = "(:fib (- :n 1))";
        let expected = Expr::Call {
            name: "fib".to_owned(),
            args: vec![binop(Symbol::Minus, vec![ident("n"), int(1)])],
        };
        assert_eq!(parse(source), Ok(expected));
    }

    #[test]
    fn test_recursive_function_definition_parses() {
        let source = "(do\n            (def\n                :fib\n                (args :n)\n                (if\n                    (< :n 2)\n                    1\n                    (+ (:fib (- :n 1)) (:fib (- :n 2)))\n                )\n            )\n            (:fib 9)\n        )";
        let expected = binop(
            Symbol::Do,
            vec![
                Expr::FunctionDef {
                    name: "fib".to_owned(),
                    params: vec!["n".to_owned()],
                    body: Box::new(Expr::If {
                        condition: Box::new(binop(Symbol::Less, vec![ident("n"), int(2)])),
                        true_branch: Box::new(int(1)),
                        false_branch: Box::new(binop(
                            Symbol::Plus,
                            vec![
                                Expr::Call {
                                    name: "fib".to_owned(),
                                    args: vec![binop(Symbol::Minus, vec![ident("n"), int(1)])],
                                },
                                Expr::Call {
                                    name: "fib".to_owned(),
                                    args: vec![binop(Symbol::Minus, vec![ident("n"), int(2)])],
                                },
                            ],
                        )),
                    }),
                },
                Expr::Call {
                    name: "fib".to_owned(),
                    args: vec![int(9)],
                },
            ],
        );
        assert_eq!(parse(source), Ok(expected));
    }

    #[test]
    fn test_tokenize_exposes_token_stream() {
        let tokens = Parser::new("(+ 1 :a)").tokenize();
        assert_eq!(
            tokens,
            Ok(vec![
                Token::LeftParen,
                Token::Operator(Symbol::Plus),
                Token::Int(1),
                Token::Identifier("a".to_owned()),
                Token::RightParen,
            ])
        );
    }

    #[test]
    fn test_syntax_errors() {
        let cases = [
            ("", "end of source"),
            ("42", "expected '('"),
            ("()", "empty expression"),
            ("(+ 1 2", "end of source"),
            ("(1 2)", "expected an operator"),
            ("(def 1 2)", "def expects an identifier"),
            ("(def :a 1 ! 2)", "expected ')' to close def"),
            ("(def :f (args :a) (+ :a 1) !)", "variable definitions"),
            ("(args :a 1)", "args expects identifiers"),
            ("(args :a :a)", "duplicate parameter name"),
            ("(if 1 2)", "expected a value"),
            ("(if 1 2 3 4)", "expected ')' to close if"),
            ("(! 1)", "end of a variable definition"),
            ("(+ 1 2) 3", "unexpected trailing content"),
        ];
        for (source, fragment) in cases {
            let err = parse(source).expect_err(source);
            let message = err.to_string();
            assert!(
                message.contains(fragment),
                "source {source:?}: expected error containing {fragment:?}, got {message:?}"
            );
        }
    }

    #[test]
    fn test_unknown_word_propagates_position() {
        assert_eq!(
            parse("(+ 1 banana)"),
            Err(ParseError::NoSuchOperator {
                position: 5,
                word: "banana".to_owned(),
            })
        );
    }

    #[test]
    fn test_comments_via_config() {
        let config = ParseConfig {
            handle_comments: true,
        };
        let source = "; doubles its input\n(def :twice (args :n) (* :n 2))";
        let parsed = Parser::with_config(source, config).parse();
        assert!(matches!(parsed, Ok(Expr::FunctionDef { .. })));
    }
}
