//! The expression tree.
//!
//! `Expr` is a closed sum type: every pass and backend matches on it
//! exhaustively, so adding a variant is a compile error everywhere it is
//! not yet handled.
//!
//! Trees are immutable once built. Passes that rewrite an expression (the
//! simplifier) build a new tree instead of mutating the old one.

use std::fmt;

use crate::{Fingerprint, Name};

/// Binary arithmetic operator.
///
/// All arithmetic is two's-complement wrapping on `i64`, in every backend.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum BinaryOp {
    Add,
    Multiply,
}

impl BinaryOp {
    /// The infix symbol used when rendering.
    #[inline]
    pub const fn symbol(self) -> char {
        match self {
            BinaryOp::Add => '+',
            BinaryOp::Multiply => '*',
        }
    }

    /// Apply the operator.
    #[inline]
    pub const fn apply(self, left: i64, right: i64) -> i64 {
        match self {
            BinaryOp::Add => left.wrapping_add(right),
            BinaryOp::Multiply => left.wrapping_mul(right),
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// An arithmetic expression.
///
/// Each composite node exclusively owns its children. Equality is
/// structural: two `Add` nodes are equal iff their children are.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum Expr {
    /// Integer literal.
    Literal(i64),
    /// `left + right`.
    Add(Box<Expr>, Box<Expr>),
    /// `left * right`.
    Multiply(Box<Expr>, Box<Expr>),
    /// Reference to a named input.
    Variable(Name),
}

impl Expr {
    #[inline]
    pub fn literal(value: i64) -> Self {
        Expr::Literal(value)
    }

    #[inline]
    pub fn add(left: Expr, right: Expr) -> Self {
        Expr::Add(Box::new(left), Box::new(right))
    }

    #[inline]
    pub fn multiply(left: Expr, right: Expr) -> Self {
        Expr::Multiply(Box::new(left), Box::new(right))
    }

    #[inline]
    pub fn variable(name: impl Into<Name>) -> Self {
        Expr::Variable(name.into())
    }

    /// The literal value, if this is a literal.
    #[inline]
    pub fn as_literal(&self) -> Option<i64> {
        match self {
            Expr::Literal(value) => Some(*value),
            _ => None,
        }
    }

    /// Operator and operands of a binary node.
    #[inline]
    pub fn operands(&self) -> Option<(BinaryOp, &Expr, &Expr)> {
        match self {
            Expr::Add(left, right) => Some((BinaryOp::Add, left, right)),
            Expr::Multiply(left, right) => Some((BinaryOp::Multiply, left, right)),
            Expr::Literal(_) | Expr::Variable(_) => None,
        }
    }

    /// Total number of nodes in the tree.
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(expr) = stack.pop() {
            count += 1;
            if let Some((_, left, right)) = expr.operands() {
                stack.push(right);
                stack.push(left);
            }
        }
        count
    }

    /// Length of the longest root-to-leaf path, counting nodes.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self, 1usize)];
        while let Some((expr, level)) = stack.pop() {
            deepest = deepest.max(level);
            if let Some((_, left, right)) = expr.operands() {
                stack.push((right, level + 1));
                stack.push((left, level + 1));
            }
        }
        deepest
    }

    /// Variable references in left-to-right, depth-first order.
    ///
    /// Repeated references are yielded once per occurrence.
    pub fn variables(&self) -> Variables<'_> {
        Variables { stack: vec![self] }
    }

    /// Structural fingerprint of this tree.
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::of(self)
    }
}

/// Iterator over the variable references of an expression.
///
/// Walks with an explicit stack so arbitrarily deep trees do not recurse.
pub struct Variables<'a> {
    stack: Vec<&'a Expr>,
}

impl<'a> Iterator for Variables<'a> {
    type Item = &'a Name;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(expr) = self.stack.pop() {
            match expr {
                Expr::Variable(name) => return Some(name),
                Expr::Add(left, right) | Expr::Multiply(left, right) => {
                    self.stack.push(right);
                    self.stack.push(left);
                }
                Expr::Literal(_) => {}
            }
        }
        None
    }
}

/// Fully parenthesized infix rendering: `((1+2)*(3+4))`.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(value) => write!(f, "{value}"),
            Expr::Add(left, right) => write!(f, "({left}+{right})"),
            Expr::Multiply(left, right) => write!(f, "({left}*{right})"),
            Expr::Variable(name) => write!(f, "{name}"),
        }
    }
}

impl From<i64> for Expr {
    fn from(value: i64) -> Self {
        Expr::Literal(value)
    }
}
