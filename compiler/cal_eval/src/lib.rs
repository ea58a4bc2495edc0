//! Cal Eval - staging passes and in-process backends.
//!
//! # Pipeline
//!
//! ```text
//! Expr ──simplify──► Expr ──locate──► LocationTable
//!                                          │
//!            ┌─────────────┬───────────────┼──────────────┐
//!            ▼             ▼               ▼              ▼
//!          eval      eval_located      specialize    cal_native
//!       (by name)    (by slot)         (closures)    (compiled)
//! ```
//!
//! - [`eval`]: reference semantics against a name-keyed [`Environment`]
//! - [`eval_located`] / [`LocatedExpr`]: recursion over slot indices
//! - [`specialize`] / [`Specialized`]: dispatch resolved once, then only
//!   slot reads and arithmetic per call
//!
//! Arithmetic is wrapping `i64` everywhere, so every backend agrees with
//! [`eval`] on every complete environment.

mod environment;
mod errors;
mod indexed;
mod locate;
mod naive;
mod simplify;
mod specialize;
mod stack;

pub use environment::Environment;
pub use errors::{EvalError, EvalResult};
pub use indexed::{eval_located, LocatedExpr};
pub use locate::{locate, LocatedEnv, LocationTable};
pub use naive::eval;
pub use simplify::simplify;
pub use specialize::{specialize, Specialized};
pub use stack::ensure_sufficient_stack;

use cal_ir::Expr;

/// Simplify `expr` and locate the result.
///
/// This is the front half every located backend starts from.
pub fn stage(expr: &Expr) -> LocatedExpr {
    let _span = tracing::debug_span!("stage", nodes = expr.node_count()).entered();
    LocatedExpr::new(simplify(expr))
}
