//! Constant folding and identity elimination.
//!
//! Children are simplified before their parent is inspected. Per node, the
//! rules apply in this order:
//!
//! | node           | rule                                   |
//! |----------------|----------------------------------------|
//! | `a + b`        | both literals: fold                    |
//! |                | `0 + x` -> `x`, `x + 0` -> `x`         |
//! | `a * b`        | both literals: fold                    |
//! |                | `0 * x` -> `0`, `x * 0` -> `0`         |
//! |                | `1 * x` -> `x`, `x * 1` -> `x`         |
//!
//! The pass is total and idempotent. Dropping `x` from `x * 0` removes its
//! variables from the result, which is sound because the value no longer
//! depends on them.

use cal_ir::{BinaryOp, Expr};

use crate::ensure_sufficient_stack;

/// Simplify `expr` into a new, equivalent tree.
pub fn simplify(expr: &Expr) -> Expr {
    let simplified = simplify_node(expr);
    tracing::debug!(
        before = expr.node_count(),
        after = simplified.node_count(),
        "simplified expression"
    );
    simplified
}

fn simplify_node(expr: &Expr) -> Expr {
    ensure_sufficient_stack(|| match expr {
        Expr::Literal(_) | Expr::Variable(_) => expr.clone(),
        Expr::Add(left, right) => simplify_add(simplify_node(left), simplify_node(right)),
        Expr::Multiply(left, right) => {
            simplify_multiply(simplify_node(left), simplify_node(right))
        }
    })
}

fn simplify_add(left: Expr, right: Expr) -> Expr {
    match (left.as_literal(), right.as_literal()) {
        (Some(l), Some(r)) => Expr::literal(BinaryOp::Add.apply(l, r)),
        (Some(0), _) => right,
        (_, Some(0)) => left,
        _ => Expr::add(left, right),
    }
}

fn simplify_multiply(left: Expr, right: Expr) -> Expr {
    match (left.as_literal(), right.as_literal()) {
        (Some(l), Some(r)) => Expr::literal(BinaryOp::Multiply.apply(l, r)),
        (Some(0), _) | (_, Some(0)) => Expr::literal(0),
        (Some(1), _) => right,
        (_, Some(1)) => left,
        _ => Expr::multiply(left, right),
    }
}

#[cfg(test)]
mod tests;
