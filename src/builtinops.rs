//! Built-in operator registry.
//!
//! Every operator that may head an operator form has one entry here. The
//! evaluator resolves the form's [`Symbol`] through [`find_op`] and applies
//! the entry's [`OpKind`]:
//!
//! - **Fold**: binary function folded left to right across the operands.
//!   The first operand seeds the accumulator, so `(- 10 3 2)` is
//!   `(10 - 3) - 2` and `(+ 5)` is just `5`.
//! - **Unary**: exactly one operand (`not`).
//! - **Variadic**: observes every evaluated operand at once (`display`).
//!
//! Arithmetic is checked: overflow and division by zero are reported as
//! errors, never wrapped or panicked. Comparison and logic operators
//! return 1 for true and 0 for false, the same convention as the reserved
//! `True`/`False` identifiers.
//!
//! The keywords `def`, `args`, and `if` are syntax, not operators: the
//! parser turns them into dedicated expression variants and they never
//! reach this registry.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::EvalError;
use crate::token::Symbol;

/// Binary fold step: accumulator and next operand to new accumulator.
pub type FoldFn = fn(i64, i64) -> Result<i64, EvalError>;
/// Single-operand operator.
pub type UnaryFn = fn(i64) -> Result<i64, EvalError>;
/// Operator applied to all evaluated operands at once.
pub type VariadicFn = fn(&[i64]) -> Result<i64, EvalError>;

/// How an operator consumes its evaluated operands.
#[derive(Debug, Clone, Copy)]
pub enum OpKind {
    Fold(FoldFn),
    Unary(UnaryFn),
    Variadic(VariadicFn),
}

/// One registered operator.
#[derive(Debug, Clone, Copy)]
pub struct BuiltinOp {
    pub symbol: Symbol,
    pub kind: OpKind,
}

fn op_add(a: i64, b: i64) -> Result<i64, EvalError> {
    a.checked_add(b).ok_or(EvalError::Overflow("addition"))
}

fn op_sub(a: i64, b: i64) -> Result<i64, EvalError> {
    a.checked_sub(b).ok_or(EvalError::Overflow("subtraction"))
}

fn op_mul(a: i64, b: i64) -> Result<i64, EvalError> {
    a.checked_mul(b)
        .ok_or(EvalError::Overflow("multiplication"))
}

fn op_div(a: i64, b: i64) -> Result<i64, EvalError> {
    if b == 0 {
        return Err(EvalError::DivisionByZero);
    }
    // i64::MIN / -1 is the one remaining overflow case.
    a.checked_div(b).ok_or(EvalError::Overflow("division"))
}

fn op_eq(a: i64, b: i64) -> Result<i64, EvalError> {
    Ok(i64::from(a == b))
}

fn op_gt(a: i64, b: i64) -> Result<i64, EvalError> {
    Ok(i64::from(a > b))
}

fn op_lt(a: i64, b: i64) -> Result<i64, EvalError> {
    Ok(i64::from(a < b))
}

fn op_and(a: i64, b: i64) -> Result<i64, EvalError> {
    Ok(i64::from(a != 0 && b != 0))
}

fn op_or(a: i64, b: i64) -> Result<i64, EvalError> {
    Ok(i64::from(a != 0 || b != 0))
}

/// `do` evaluates every operand in order and keeps the last result.
fn op_do(_: i64, b: i64) -> Result<i64, EvalError> {
    Ok(b)
}

fn op_not(a: i64) -> Result<i64, EvalError> {
    Ok(i64::from(a == 0))
}

/// Prints every operand on one line and returns the last one.
fn op_display(values: &[i64]) -> Result<i64, EvalError> {
    match values.split_last() {
        Some((last, init)) => {
            for value in init {
                print!("{value} ");
            }
            println!("{last}");
            Ok(*last)
        }
        None => Err(EvalError::OperatorArity {
            op: Symbol::Display.text(),
            requires: "at least one operand",
        }),
    }
}

/// All registered operators, indexable by symbol through [`find_op`].
static BUILTIN_OPS: LazyLock<Vec<BuiltinOp>> = LazyLock::new(|| {
    vec![
        BuiltinOp {
            symbol: Symbol::Plus,
            kind: OpKind::Fold(op_add),
        },
        BuiltinOp {
            symbol: Symbol::Minus,
            kind: OpKind::Fold(op_sub),
        },
        BuiltinOp {
            symbol: Symbol::Star,
            kind: OpKind::Fold(op_mul),
        },
        BuiltinOp {
            symbol: Symbol::Slash,
            kind: OpKind::Fold(op_div),
        },
        BuiltinOp {
            symbol: Symbol::Equal,
            kind: OpKind::Fold(op_eq),
        },
        BuiltinOp {
            symbol: Symbol::Greater,
            kind: OpKind::Fold(op_gt),
        },
        BuiltinOp {
            symbol: Symbol::Less,
            kind: OpKind::Fold(op_lt),
        },
        BuiltinOp {
            symbol: Symbol::And,
            kind: OpKind::Fold(op_and),
        },
        BuiltinOp {
            symbol: Symbol::Or,
            kind: OpKind::Fold(op_or),
        },
        BuiltinOp {
            symbol: Symbol::Do,
            kind: OpKind::Fold(op_do),
        },
        BuiltinOp {
            symbol: Symbol::Not,
            kind: OpKind::Unary(op_not),
        },
        BuiltinOp {
            symbol: Symbol::Display,
            kind: OpKind::Variadic(op_display),
        },
    ]
});

static OPS_BY_SYMBOL: LazyLock<HashMap<Symbol, &'static BuiltinOp>> =
    LazyLock::new(|| BUILTIN_OPS.iter().map(|op| (op.symbol, op)).collect());

/// Look up the registered operator for a symbol. Keywords that are syntax
/// rather than operators (`def`, `args`, `if`, `!`) have no entry.
pub fn find_op(symbol: Symbol) -> Option<&'static BuiltinOp> {
    OPS_BY_SYMBOL.get(&symbol).copied()
}
