//! Cal IR - the expression model shared by every Cal pass and backend.
//!
//! - `Expr`: closed sum type (literal, addition, multiplication, variable)
//! - `Name`: shared immutable variable names
//! - `Fingerprint`: structural hash used to pair located artifacts with the
//!   table they were built from
//!
//! # Rendering
//!
//! `Display` renders fully parenthesized infix text, so `((1+2)*(3+4))`
//! reads back unambiguously with any parser that understands integers, `+`,
//! `*` and parentheses.

mod expr;
mod fingerprint;
mod name;

pub use expr::{BinaryOp, Expr, Variables};
pub use fingerprint::Fingerprint;
pub use name::Name;
