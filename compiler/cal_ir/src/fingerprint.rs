//! Structural fingerprints.
//!
//! A fingerprint identifies the shape of an expression. Location tables
//! record the fingerprint of the expression they were derived from, and
//! every located artifact compares fingerprints before trusting a table or
//! a located environment.

use std::fmt;
use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;

use crate::Expr;

/// 64-bit structural hash of an expression.
///
/// Structurally equal expressions always have equal fingerprints.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
#[repr(transparent)]
pub struct Fingerprint(u64);

impl Fingerprint {
    /// Fingerprint an expression.
    ///
    /// Hashes a tagged pre-order walk with an explicit stack, so arbitrarily
    /// deep trees are fine.
    pub fn of(expr: &Expr) -> Self {
        let mut hasher = FxHasher::default();
        let mut stack = vec![expr];
        while let Some(node) = stack.pop() {
            match node {
                Expr::Literal(value) => {
                    hasher.write_u8(0);
                    value.hash(&mut hasher);
                }
                Expr::Add(left, right) => {
                    hasher.write_u8(1);
                    stack.push(right);
                    stack.push(left);
                }
                Expr::Multiply(left, right) => {
                    hasher.write_u8(2);
                    stack.push(right);
                    stack.push(left);
                }
                Expr::Variable(name) => {
                    hasher.write_u8(3);
                    name.as_str().hash(&mut hasher);
                }
            }
        }
        Fingerprint(hasher.finish())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({:016x})", self.0)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}
