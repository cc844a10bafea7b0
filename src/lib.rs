//! parfun - a tiny parenthesized-prefix language
//!
//! This crate implements an interpreter for a small S-expression language
//! over machine integers. Every expression is a parenthesized prefix form;
//! the first token inside the parentheses decides what the form means:
//!
//! ```text
//! (* (+ 1 1) (* 2 2) 4)          ; arithmetic, folded left to right => 32
//! (def :price 100)               ; variable definition (lazy by default)
//! (def :total (* :price 4) !)    ; trailing ! forces evaluation now => 400
//! (def :addTwo (args :a :b)      ; function definition
//!     (+ :a :b))
//! (:addTwo 1 2)                  ; function call => 3
//! (if (< :n 2) 1 0)              ; conditional, only one branch evaluated
//! (do (def :n 4) (:addTwo :n 1)) ; do returns its last operand => 5
//! ```
//!
//! Identifiers are written with a leading `:` sigil; the sigil is stripped
//! during tokenization. The bare words `True` and `False` are reserved
//! identifiers bound to `1` and `0` in every fresh environment.
//!
//! ## Semantics in brief
//!
//! - Every value is an `i64`. Comparison and logic operators return 1 or 0.
//! - `def` without `!` stores the value expression *unevaluated*; it is
//!   recomputed on each access, so definitions may reference names that do
//!   not exist yet.
//! - Functions capture the scope they were defined in. A call evaluates its
//!   arguments in the caller's scope and binds them positionally in a fresh
//!   child scope of the capture scope, which is what makes recursive
//!   definitions such as `fib` resolve their own name.
//! - Evaluation depth is bounded by [`MAX_EVAL_DEPTH`]; runaway recursion
//!   fails with an error instead of exhausting the native stack.
//!
//! ## Modules
//!
//! - `token`: token type and the operator/keyword registry
//! - `tokenizer`: source text to token stream
//! - `parser`: recursive-descent construction of the expression tree
//! - `ast`: the expression model
//! - `builtinops`: the operator dispatch registry used by the evaluator
//! - `evaluator`: scope arena and the tree-walking `eval`

use thiserror::Error;

/// Maximum evaluation depth. Recursive programs deeper than this fail with
/// [`EvalError::DepthLimitExceeded`] rather than overflowing the native
/// call stack.
pub const MAX_EVAL_DEPTH: usize = 512;

/// Errors produced while turning source text into an expression tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Input ended while a token or form was still expected.
    #[error("unexpected end of source")]
    EndOfSource,
    /// A word that is neither a registered operator, a `:`-sigiled
    /// identifier, nor a reserved identifier word.
    #[error("no such operator '{word}' at position {position}")]
    NoSuchOperator { position: usize, word: String },
    /// Structural violation: wrong token in position, unclosed form,
    /// malformed definition, and similar.
    #[error("{message} (at position {position})")]
    Syntax { position: usize, message: String },
}

impl ParseError {
    /// Create a syntax error at a source position.
    pub(crate) fn syntax(position: usize, message: impl Into<String>) -> Self {
        ParseError::Syntax {
            position,
            message: message.into(),
        }
    }
}

/// Errors produced while evaluating an expression tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    /// Identifier not found anywhere along the scope chain.
    #[error("'{0}' is not defined")]
    UndefinedName(String),
    /// Call target resolved to something that is not a function.
    #[error("'{0}' is not a function")]
    NotAFunction(String),
    /// A call supplied fewer arguments than the function declares.
    /// Excess arguments are ignored, not an error.
    #[error("function '{name}' expected {expected} arguments, got {got}")]
    NotEnoughArguments {
        name: String,
        expected: usize,
        got: usize,
    },
    #[error("division by zero")]
    DivisionByZero,
    #[error("integer overflow in {0}")]
    Overflow(&'static str),
    /// An operator form with the wrong number of operands, e.g. `(+)`.
    #[error("operator '{op}' requires {requires}")]
    OperatorArity {
        op: &'static str,
        requires: &'static str,
    },
    /// A symbol that has no entry in the operator dispatch registry.
    #[error("'{0}' can not be evaluated")]
    UnsupportedOperator(&'static str),
    #[error("evaluation depth limit exceeded (max {0})")]
    DepthLimitExceeded(usize),
}

/// Any interpreter failure, for callers that drive parse and eval together.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("evaluation error: {0}")]
    Eval(#[from] EvalError),
}

pub mod ast;
pub mod builtinops;
pub mod evaluator;
pub mod parser;
pub mod token;
pub mod tokenizer;
