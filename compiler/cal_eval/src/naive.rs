//! Reference evaluator over a name-keyed environment.
//!
//! Every other backend is checked against this one.

use cal_ir::{BinaryOp, Expr};

use crate::{ensure_sufficient_stack, Environment, EvalError, EvalResult};

/// Evaluate `expr`, looking variables up by name in `env`.
pub fn eval(expr: &Expr, env: &Environment) -> EvalResult {
    ensure_sufficient_stack(|| match expr {
        Expr::Literal(value) => Ok(*value),
        Expr::Add(left, right) => Ok(BinaryOp::Add.apply(eval(left, env)?, eval(right, env)?)),
        Expr::Multiply(left, right) => {
            Ok(BinaryOp::Multiply.apply(eval(left, env)?, eval(right, env)?))
        }
        Expr::Variable(name) => env
            .get(name.as_str())
            .ok_or_else(|| EvalError::missing_binding(name)),
    })
}
