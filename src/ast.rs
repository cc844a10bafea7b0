//! The expression model.
//!
//! [`Expr`] is the closed sum type produced by the parser and walked by the
//! evaluator. Trees are strict: every node owns its children outright, with
//! no sharing and no cycles. After parsing a tree is immutable; evaluation
//! never rewrites it. The one variant that cannot come out of the parser is
//! [`Expr::Function`], the callable value created when a function
//! definition is evaluated. It carries the scope the function captured at
//! definition time.

use std::fmt;

use crate::evaluator::ScopeId;
use crate::token::Symbol;

/// One node of the expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Integer literal. Terminal; always evaluates to itself.
    ConstantInt(i64),
    /// Reference to a binding, resolved through the scope chain at
    /// evaluation time.
    Identifier(String),
    /// Left-fold application of a named operator across its operands.
    BinaryOp { op: Symbol, operands: Vec<Expr> },
    /// `(def :name value)`, optionally with a trailing `!`. Without the
    /// marker the value expression is stored unevaluated.
    VariableDef {
        name: String,
        value: Box<Expr>,
        eval_now: bool,
    },
    /// `(args :a :b ...)`: a formal parameter list. Evaluating it seeds
    /// each name with 0 in the current scope.
    ArgsDef(Vec<String>),
    /// `(def :name (args ...) (body))`: registers a callable under `name`.
    FunctionDef {
        name: String,
        params: Vec<String>,
        body: Box<Expr>,
    },
    /// A callable value: the capture scope, parameter names, and body.
    /// Produced only by evaluating a [`Expr::FunctionDef`], never parsed.
    Function {
        scope: ScopeId,
        params: Vec<String>,
        body: Box<Expr>,
    },
    /// `(:name arg ...)`: invocation of a previously defined function.
    Call { name: String, args: Vec<Expr> },
    /// `(if cond then else)`. Only the selected branch is evaluated.
    If {
        condition: Box<Expr>,
        true_branch: Box<Expr>,
        false_branch: Box<Expr>,
    },
}

impl fmt::Display for Expr {
    /// Renders the parseable source form, except for function values,
    /// which have no source syntax.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::ConstantInt(n) => write!(f, "{n}"),
            Expr::Identifier(name) => write!(f, ":{name}"),
            Expr::BinaryOp { op, operands } => {
                write!(f, "({op}")?;
                for operand in operands {
                    write!(f, " {operand}")?;
                }
                write!(f, ")")
            }
            Expr::VariableDef {
                name,
                value,
                eval_now,
            } => {
                write!(f, "(def :{name} {value}")?;
                if *eval_now {
                    write!(f, " !")?;
                }
                write!(f, ")")
            }
            Expr::ArgsDef(params) => {
                write!(f, "(args")?;
                for param in params {
                    write!(f, " :{param}")?;
                }
                write!(f, ")")
            }
            Expr::FunctionDef { name, params, body } => {
                write!(f, "(def :{name} (args")?;
                for param in params {
                    write!(f, " :{param}")?;
                }
                write!(f, ") {body})")
            }
            Expr::Function { params, .. } => {
                write!(f, "#<function/{}>", params.len())
            }
            Expr::Call { name, args } => {
                write!(f, "(:{name}")?;
                for arg in args {
                    write!(f, " {arg}")?;
                }
                write!(f, ")")
            }
            Expr::If {
                condition,
                true_branch,
                false_branch,
            } => {
                write!(f, "(if {condition} {true_branch} {false_branch})")
            }
        }
    }
}

/// Helper for building integer literals in tests and expected trees.
#[cfg_attr(not(test), expect(dead_code))]
pub(crate) fn int(value: i64) -> Expr {
    Expr::ConstantInt(value)
}

/// Helper for building identifier references in tests and expected trees.
#[cfg_attr(not(test), expect(dead_code))]
pub(crate) fn ident(name: &str) -> Expr {
    Expr::Identifier(name.to_owned())
}
