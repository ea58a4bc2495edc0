//! Closure specialization (partial evaluation).
//!
//! `specialize` walks the expression once and returns a tree of boxed
//! closures. Variant dispatch and name -> slot lookups happen during that
//! walk; an invocation only reads slots and does arithmetic.
//!
//! Binary nodes whose operands are both leaves are fused into a single
//! closure, so the common `a_i_k * b_k_j` shape costs one call instead of
//! three. Two constant leaves fold at construction time.
//!
//! Calling the tree recurses once per level, and so does dropping it. Every
//! `GUARD_INTERVAL` levels the builder wraps the subtree in a guard that
//! grows the stack before calling into it or dropping it. The decision is
//! made at construction; nodes between guards carry no checks.

use std::fmt;

use cal_ir::{BinaryOp, Expr, Fingerprint, Name};

use crate::{
    ensure_sufficient_stack, EvalError, EvalResult, LocatedEnv, LocatedExpr, LocationTable,
};

/// A specialized node: slot values in, value out.
type SlotFn = Box<dyn Fn(&[i64]) -> i64 + Send + Sync>;

/// Maximum number of unguarded closure levels on any path.
const GUARD_INTERVAL: usize = 128;

/// A subtree whose call and drop both run under the stack guard.
struct Guarded(SlotFn);

impl Guarded {
    #[inline]
    fn call(&self, env: &[i64]) -> i64 {
        ensure_sufficient_stack(|| (self.0)(env))
    }
}

impl Drop for Guarded {
    fn drop(&mut self) {
        // A capture-free closure box does not allocate.
        let subtree = std::mem::replace(&mut self.0, Box::new(|_: &[i64]| 0));
        ensure_sufficient_stack(move || drop(subtree));
    }
}

/// A node under construction, with the number of unguarded levels from it
/// down to the nearest guard or leaf.
struct Node {
    function: SlotFn,
    height: usize,
}

impl Node {
    fn leaf(function: SlotFn) -> Self {
        Node {
            function,
            height: 1,
        }
    }

    fn binary(function: SlotFn, left: usize, right: usize) -> Self {
        let height = left.max(right) + 1;
        if height < GUARD_INTERVAL {
            return Node { function, height };
        }
        let guarded = Guarded(function);
        Node {
            function: Box::new(move |env: &[i64]| guarded.call(env)),
            height: 0,
        }
    }
}

/// A leaf resolved at construction time.
#[derive(Copy, Clone, Debug)]
enum Leaf {
    Const(i64),
    Slot(usize),
}

/// An expression specialized against its location table.
///
/// Built once, invoked many times. Shareable across threads.
pub struct Specialized {
    root: SlotFn,
    slots: usize,
    origin: Fingerprint,
}

/// Specialize `expr` for the slot layout of `table`.
///
/// Fails once, here, if `table` was not derived from `expr`.
pub fn specialize(expr: &Expr, table: &LocationTable) -> EvalResult<Specialized> {
    table.check_origin(expr)?;
    let root = build(expr, table)?.function;
    tracing::debug!(
        nodes = expr.node_count(),
        depth = expr.depth(),
        slots = table.len(),
        "specialized expression"
    );
    Ok(Specialized {
        root,
        slots: table.len(),
        origin: table.origin(),
    })
}

impl LocatedExpr {
    /// Specialize this expression against its own table.
    pub fn specialize(&self) -> EvalResult<Specialized> {
        specialize(self.expr(), self.table())
    }
}

impl Specialized {
    /// Invoke with an environment built through the originating table.
    #[inline]
    pub fn call(&self, env: &LocatedEnv) -> EvalResult {
        if env.origin() != self.origin {
            return Err(EvalError::TableMismatch {
                expected: self.origin,
                found: env.origin(),
            });
        }
        Ok((self.root)(env.values()))
    }

    /// Invoke with raw slot values.
    ///
    /// The length is checked once up front; the closures themselves never
    /// branch on it.
    #[inline]
    pub fn call_slice(&self, env: &[i64]) -> EvalResult {
        if env.len() < self.slots {
            return Err(EvalError::SlotOutOfRange {
                slot: self.slots - 1,
                len: env.len(),
            });
        }
        Ok((self.root)(env))
    }

    /// Number of slots the closures read.
    pub fn slot_count(&self) -> usize {
        self.slots
    }

    pub fn origin(&self) -> Fingerprint {
        self.origin
    }
}

impl fmt::Debug for Specialized {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Specialized")
            .field("slots", &self.slots)
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

fn build(expr: &Expr, table: &LocationTable) -> EvalResult<Node> {
    ensure_sufficient_stack(|| match expr {
        Expr::Literal(value) => Ok(Node::leaf(leaf_fn(Leaf::Const(*value)))),
        Expr::Variable(name) => Ok(Node::leaf(leaf_fn(Leaf::Slot(slot_of(name, table)?)))),
        Expr::Add(left, right) => build_binary(BinaryOp::Add, left, right, table),
        Expr::Multiply(left, right) => build_binary(BinaryOp::Multiply, left, right, table),
    })
}

fn slot_of(name: &Name, table: &LocationTable) -> EvalResult<usize> {
    table
        .slot(name.as_str())
        .ok_or_else(|| EvalError::missing_slot(name))
}

fn leaf(expr: &Expr, table: &LocationTable) -> EvalResult<Option<Leaf>> {
    match expr {
        Expr::Literal(value) => Ok(Some(Leaf::Const(*value))),
        Expr::Variable(name) => Ok(Some(Leaf::Slot(slot_of(name, table)?))),
        Expr::Add(..) | Expr::Multiply(..) => Ok(None),
    }
}

fn leaf_fn(leaf: Leaf) -> SlotFn {
    match leaf {
        Leaf::Const(value) => Box::new(move |_: &[i64]| value),
        Leaf::Slot(slot) => Box::new(move |env: &[i64]| env[slot]),
    }
}

fn build_binary(
    op: BinaryOp,
    left: &Expr,
    right: &Expr,
    table: &LocationTable,
) -> EvalResult<Node> {
    if let (Some(l), Some(r)) = (leaf(left, table)?, leaf(right, table)?) {
        return Ok(Node::leaf(fuse_leaves(op, l, r)));
    }
    let Node {
        function: left,
        height: left_height,
    } = build(left, table)?;
    let Node {
        function: right,
        height: right_height,
    } = build(right, table)?;
    let function: SlotFn = match op {
        BinaryOp::Add => Box::new(move |env: &[i64]| left(env).wrapping_add(right(env))),
        BinaryOp::Multiply => Box::new(move |env: &[i64]| left(env).wrapping_mul(right(env))),
    };
    Ok(Node::binary(function, left_height, right_height))
}

fn fuse_leaves(op: BinaryOp, left: Leaf, right: Leaf) -> SlotFn {
    match (op, left, right) {
        (op, Leaf::Const(l), Leaf::Const(r)) => {
            let value = op.apply(l, r);
            Box::new(move |_: &[i64]| value)
        }
        (BinaryOp::Add, Leaf::Slot(a), Leaf::Slot(b)) => {
            Box::new(move |env: &[i64]| env[a].wrapping_add(env[b]))
        }
        (BinaryOp::Multiply, Leaf::Slot(a), Leaf::Slot(b)) => {
            Box::new(move |env: &[i64]| env[a].wrapping_mul(env[b]))
        }
        (BinaryOp::Add, Leaf::Slot(a), Leaf::Const(c))
        | (BinaryOp::Add, Leaf::Const(c), Leaf::Slot(a)) => {
            Box::new(move |env: &[i64]| env[a].wrapping_add(c))
        }
        (BinaryOp::Multiply, Leaf::Slot(a), Leaf::Const(c)) => {
            Box::new(move |env: &[i64]| env[a].wrapping_mul(c))
        }
        (BinaryOp::Multiply, Leaf::Const(c), Leaf::Slot(a)) => {
            Box::new(move |env: &[i64]| c.wrapping_mul(env[a]))
        }
    }
}
