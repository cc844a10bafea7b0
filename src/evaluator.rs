//! Scope arena and the tree-walking evaluator.
//!
//! An [`Environment`] is an explicit context object: it owns an arena of
//! scope records and is passed `&mut` into every evaluation call, so any
//! number of independent interpreter sessions can coexist. Scope records
//! link to their parent by index; scope 0 is the global root, which holds
//! every `def` binding and the reserved `True`/`False` constants.
//!
//! Bindings are a tagged variant: either a pre-evaluated constant or an
//! unevaluated thunk. Thunks are re-evaluated on every access, in the
//! scope where the binding resides, with no memoization; redefining a
//! name between two accesses of a dependent binding is observable.
//!
//! Function calls bind evaluated arguments positionally in a fresh child
//! scope of the function's capture scope. Unwinding on failure needs no
//! bookkeeping: the current scope is a parameter of each recursive
//! evaluation call, so an error can never leave a stale scope active.

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::EvalError;
use crate::MAX_EVAL_DEPTH;
use crate::ast::Expr;
use crate::builtinops::{self, OpKind};
use crate::token::{BUILTIN_IDENTIFIERS, Symbol};

/// Index of a scope record inside an [`Environment`]'s arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(usize);

/// What a name is bound to.
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    /// Pre-evaluated value; lookups return it as-is.
    Constant(i64),
    /// Unevaluated expression, recomputed on each access.
    Thunk(Expr),
}

impl std::fmt::Display for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Binding::Constant(value) => write!(f, "{value}"),
            Binding::Thunk(expr) => write!(f, "{expr}"),
        }
    }
}

/// One lexical or call scope: local bindings plus a non-owning link to the
/// parent scope used for lookup.
#[derive(Debug, Clone, PartialEq, Default)]
struct Scope {
    bindings: HashMap<String, Binding>,
    parent: Option<ScopeId>,
}

/// All interpreter state for one session.
#[derive(Debug, Clone, PartialEq)]
pub struct Environment {
    scopes: Vec<Scope>,
}

impl Default for Environment {
    fn default() -> Self {
        Environment::new()
    }
}

impl Environment {
    /// A fresh session: one global root scope with the reserved boolean
    /// constants bound to 1 and 0.
    pub fn new() -> Self {
        let mut env = Environment {
            scopes: vec![Scope::default()],
        };
        for (word, value) in BUILTIN_IDENTIFIERS.iter().zip([1, 0]) {
            env.define(env.global_scope(), (*word).to_owned(), Binding::Constant(value));
        }
        env
    }

    /// The root scope; `def` bindings live here regardless of where the
    /// definition was evaluated.
    pub fn global_scope(&self) -> ScopeId {
        ScopeId(0)
    }

    fn new_scope(&mut self, parent: ScopeId) -> ScopeId {
        self.scopes.push(Scope {
            bindings: HashMap::new(),
            parent: Some(parent),
        });
        ScopeId(self.scopes.len() - 1)
    }

    fn define(&mut self, scope: ScopeId, name: String, binding: Binding) {
        self.scopes[scope.0].bindings.insert(name, binding);
    }

    /// Walk the chain from `scope` to the root; returns the scope the
    /// binding was found in alongside the binding.
    fn lookup(&self, scope: ScopeId, name: &str) -> Option<(ScopeId, &Binding)> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let record = &self.scopes[id.0];
            if let Some(binding) = record.bindings.get(name) {
                return Some((id, binding));
            }
            current = record.parent;
        }
        None
    }

    /// All bindings of the global scope, sorted by name. Used by the REPL
    /// to render the session state.
    pub fn global_bindings(&self) -> Vec<(String, Binding)> {
        let mut bindings: Vec<_> = self.scopes[0]
            .bindings
            .iter()
            .map(|(name, binding)| (name.clone(), binding.clone()))
            .collect();
        bindings.sort_by(|a, b| a.0.cmp(&b.0));
        bindings
    }
}

/// Evaluate an expression in the global scope of `env` (public API).
pub fn eval(expr: &Expr, env: &mut Environment) -> Result<i64, EvalError> {
    let global = env.global_scope();
    eval_in(expr, env, global, 0)
}

/// Evaluate an expression in a given scope with depth tracking.
fn eval_in(
    expr: &Expr,
    env: &mut Environment,
    scope: ScopeId,
    depth: usize,
) -> Result<i64, EvalError> {
    if depth >= MAX_EVAL_DEPTH {
        debug!("evaluation depth limit hit at {depth}");
        return Err(EvalError::DepthLimitExceeded(MAX_EVAL_DEPTH));
    }

    match expr {
        Expr::ConstantInt(value) => Ok(*value),

        Expr::Identifier(name) => {
            let Some((found_scope, binding)) = env.lookup(scope, name) else {
                return Err(EvalError::UndefinedName(name.clone()));
            };
            match binding {
                Binding::Constant(value) => Ok(*value),
                // Thunks are recomputed on every access, in the scope the
                // binding resides in.
                Binding::Thunk(stored) => {
                    let stored = stored.clone();
                    eval_in(&stored, env, found_scope, depth + 1)
                }
            }
        }

        Expr::BinaryOp { op, operands } => eval_operator(*op, operands, env, scope, depth),

        Expr::VariableDef {
            name,
            value,
            eval_now,
        } => {
            let global = env.global_scope();
            if *eval_now {
                let result = eval_in(value, env, scope, depth + 1)?;
                trace!("defining :{name} = {result}");
                env.define(global, name.clone(), Binding::Constant(result));
                Ok(result)
            } else {
                trace!("defining :{name} lazily");
                env.define(global, name.clone(), Binding::Thunk((**value).clone()));
                Ok(0)
            }
        }

        Expr::ArgsDef(params) => {
            seed_params(env, scope, params);
            Ok(0)
        }

        Expr::FunctionDef { name, params, body } => {
            let capture = env.new_scope(scope);
            seed_params(env, capture, params);
            debug!("defining function :{name}/{}", params.len());
            env.define(
                scope,
                name.clone(),
                Binding::Thunk(Expr::Function {
                    scope: capture,
                    params: params.clone(),
                    body: body.clone(),
                }),
            );
            Ok(0)
        }

        // A function value in value position is invoked with no arguments:
        // zero-parameter functions run their body, anything else is short
        // of arguments.
        Expr::Function {
            scope: capture,
            params,
            body,
        } => invoke(env, *capture, params, body, &[], "<function>", depth),

        Expr::Call { name, args } => {
            let (capture, params, body) = match env.lookup(scope, name) {
                None => return Err(EvalError::UndefinedName(name.clone())),
                Some((
                    _,
                    Binding::Thunk(Expr::Function {
                        scope: capture,
                        params,
                        body,
                    }),
                )) => (*capture, params.clone(), body.as_ref().clone()),
                Some(_) => return Err(EvalError::NotAFunction(name.clone())),
            };

            // Arguments are evaluated left to right in the caller's scope.
            let mut values = Vec::with_capacity(args.len());
            for arg in args {
                values.push(eval_in(arg, env, scope, depth + 1)?);
            }
            invoke(env, capture, &params, &body, &values, name, depth)
        }

        Expr::If {
            condition,
            true_branch,
            false_branch,
        } => {
            // Only the selected branch is evaluated.
            if eval_in(condition, env, scope, depth + 1)? != 0 {
                eval_in(true_branch, env, scope, depth + 1)
            } else {
                eval_in(false_branch, env, scope, depth + 1)
            }
        }
    }
}

/// Bind each parameter name to 0 in `scope`, establishing the names so
/// lookups during registration succeed.
fn seed_params(env: &mut Environment, scope: ScopeId, params: &[String]) {
    for param in params {
        env.define(scope, param.clone(), Binding::Constant(0));
    }
}

/// Invoke a function value: bind argument values to parameters
/// index-for-index in a fresh child scope of the capture scope and
/// evaluate the body there. Excess arguments are ignored.
fn invoke(
    env: &mut Environment,
    capture: ScopeId,
    params: &[String],
    body: &Expr,
    args: &[i64],
    name: &str,
    depth: usize,
) -> Result<i64, EvalError> {
    if args.len() < params.len() {
        return Err(EvalError::NotEnoughArguments {
            name: name.to_owned(),
            expected: params.len(),
            got: args.len(),
        });
    }

    trace!("calling {name} with {} arguments", args.len());
    let call_scope = env.new_scope(capture);
    for (param, value) in params.iter().zip(args) {
        env.define(call_scope, param.clone(), Binding::Constant(*value));
    }
    eval_in(body, env, call_scope, depth + 1)
}

/// Apply a registered operator to its operand expressions.
fn eval_operator(
    op: Symbol,
    operands: &[Expr],
    env: &mut Environment,
    scope: ScopeId,
    depth: usize,
) -> Result<i64, EvalError> {
    let Some(builtin) = builtinops::find_op(op) else {
        return Err(EvalError::UnsupportedOperator(op.text()));
    };
    if operands.is_empty() {
        return Err(EvalError::OperatorArity {
            op: op.text(),
            requires: "at least one operand",
        });
    }

    match builtin.kind {
        OpKind::Fold(fold) => {
            let mut acc = eval_in(&operands[0], env, scope, depth + 1)?;
            for operand in &operands[1..] {
                let next = eval_in(operand, env, scope, depth + 1)?;
                acc = fold(acc, next)?;
            }
            Ok(acc)
        }
        OpKind::Unary(unary) => {
            if operands.len() != 1 {
                return Err(EvalError::OperatorArity {
                    op: op.text(),
                    requires: "exactly one operand",
                });
            }
            unary(eval_in(&operands[0], env, scope, depth + 1)?)
        }
        OpKind::Variadic(variadic) => {
            let mut values = Vec::with_capacity(operands.len());
            for operand in operands {
                values.push(eval_in(operand, env, scope, depth + 1)?);
            }
            variadic(&values)
        }
    }
}
