//! Matrix-product workload.
//!
//! `matrix_product(n)` is the sum of every entry of `A * B` for two `n x n`
//! matrices of variables, written out as one expression:
//!
//! ```text
//! ((0 + ((0 + a_0_0*b_0_0) + a_0_1*b_1_0) + ...) + ...)
//! ```
//!
//! Each entry is a left-nested chain of products starting from `Literal(0)`,
//! and the entries are chained the same way. The leading zeros are there on
//! purpose: they give the simplifier something to remove.

use cal_eval::Environment;
use cal_ir::Expr;

/// Name of the variable for entry `(row, col)` of matrix `matrix`.
pub fn entry_name(matrix: char, row: usize, col: usize) -> String {
    format!("{matrix}_{row}_{col}")
}

/// Sum of the entries of the product of two `n x n` variable matrices.
pub fn matrix_product(n: usize) -> Expr {
    let mut total = Expr::literal(0);
    for i in 0..n {
        for j in 0..n {
            let mut dot = Expr::literal(0);
            for k in 0..n {
                let term = Expr::multiply(
                    Expr::variable(entry_name('a', i, k)),
                    Expr::variable(entry_name('b', k, j)),
                );
                dot = Expr::add(dot, term);
            }
            total = Expr::add(total, dot);
        }
    }
    tracing::debug!(n, nodes = total.node_count(), "built matrix workload");
    total
}

/// Environment binding every entry of both matrices to `value`.
///
/// With `value == 1` the workload evaluates to `n^3`.
pub fn matrix_env(n: usize, value: i64) -> Environment {
    matrix_env_with(n, |_| value)
}

/// Environment binding every entry of both matrices to `value_of(name)`.
pub fn matrix_env_with(n: usize, mut value_of: impl FnMut(&str) -> i64) -> Environment {
    let mut env = Environment::new();
    for matrix in ['a', 'b'] {
        for row in 0..n {
            for col in 0..n {
                let name = entry_name(matrix, row, col);
                let value = value_of(&name);
                env.bind(name, value);
            }
        }
    }
    env
}
