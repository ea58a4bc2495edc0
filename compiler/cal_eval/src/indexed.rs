//! Evaluation against a flat, slot-indexed environment.
//!
//! Same recursion as the naive evaluator, but variables read
//! `env[table[name]]`. This is the baseline the specialized and native
//! backends are measured against.

use cal_ir::{BinaryOp, Expr};

use crate::{
    ensure_sufficient_stack, locate, EvalError, EvalResult, LocatedEnv, LocationTable,
};

/// Evaluate `expr` against slot values `env` laid out by `table`.
///
/// `table` must come from `locate` over `expr` (or a structurally equal
/// tree). Fails with [`EvalError::MissingSlot`] if the table has no slot
/// for a referenced variable and [`EvalError::SlotOutOfRange`] if `env` is
/// too short. [`LocatedExpr`] bundles the expression with its table so
/// neither can happen.
pub fn eval_located(expr: &Expr, table: &LocationTable, env: &[i64]) -> EvalResult {
    ensure_sufficient_stack(|| match expr {
        Expr::Literal(value) => Ok(*value),
        Expr::Add(left, right) => Ok(BinaryOp::Add.apply(
            eval_located(left, table, env)?,
            eval_located(right, table, env)?,
        )),
        Expr::Multiply(left, right) => Ok(BinaryOp::Multiply.apply(
            eval_located(left, table, env)?,
            eval_located(right, table, env)?,
        )),
        Expr::Variable(name) => {
            let slot = table
                .slot(name.as_str())
                .ok_or_else(|| EvalError::missing_slot(name))?;
            env.get(slot).copied().ok_or(EvalError::SlotOutOfRange {
                slot,
                len: env.len(),
            })
        }
    })
}

/// An expression paired with the table derived from it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocatedExpr {
    expr: Expr,
    table: LocationTable,
}

impl LocatedExpr {
    /// Locate `expr` and keep the two together.
    pub fn new(expr: Expr) -> Self {
        let table = locate(&expr);
        LocatedExpr { expr, table }
    }

    /// Pair `expr` with an existing table, rejecting tables derived from a
    /// different tree.
    pub fn with_table(expr: Expr, table: LocationTable) -> EvalResult<Self> {
        table.check_origin(&expr)?;
        Ok(LocatedExpr { expr, table })
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    pub fn table(&self) -> &LocationTable {
        &self.table
    }

    pub fn into_parts(self) -> (Expr, LocationTable) {
        (self.expr, self.table)
    }

    /// Evaluate against an environment built through this expression's
    /// table.
    pub fn eval(&self, env: &LocatedEnv) -> EvalResult {
        self.table.check_env(env)?;
        eval_located(&self.expr, &self.table, env.values())
    }
}
