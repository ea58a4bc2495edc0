use super::*;
use pretty_assertions::assert_eq;

fn lit(value: i64) -> Expr {
    Expr::literal(value)
}

fn var(name: &str) -> Expr {
    Expr::variable(name)
}

#[test]
fn test_folds_literal_arithmetic() {
    let expr = Expr::multiply(
        Expr::add(lit(1), lit(2)),
        Expr::add(lit(3), lit(4)),
    );
    assert_eq!(simplify(&expr), lit(21));
    assert_eq!(simplify(&Expr::add(lit(-4), lit(4))), lit(0));
    assert_eq!(simplify(&Expr::multiply(lit(6), lit(7))), lit(42));
}

#[test]
fn test_additive_identity() {
    assert_eq!(simplify(&Expr::add(var("x"), lit(0))), var("x"));
    assert_eq!(simplify(&Expr::add(lit(0), var("x"))), var("x"));
}

#[test]
fn test_multiplicative_identity() {
    assert_eq!(simplify(&Expr::multiply(var("x"), lit(1))), var("x"));
    assert_eq!(simplify(&Expr::multiply(lit(1), var("x"))), var("x"));
}

#[test]
fn test_multiplication_by_zero_discards_operand() {
    let big = Expr::add(var("a"), Expr::multiply(var("b"), var("c")));
    assert_eq!(simplify(&Expr::multiply(big.clone(), lit(0))), lit(0));
    assert_eq!(simplify(&Expr::multiply(lit(0), big)), lit(0));
}

#[test]
fn test_zero_wins_over_one() {
    // Both identities apply; the zero rule comes first.
    assert_eq!(simplify(&Expr::multiply(lit(0), Expr::multiply(lit(1), var("x")))), lit(0));
}

#[test]
fn test_identities_exposed_by_folding_children() {
    // (x + (2 + -2)) * (3 + -2) -> x
    let expr = Expr::multiply(
        Expr::add(var("x"), Expr::add(lit(2), lit(-2))),
        Expr::add(lit(3), lit(-2)),
    );
    assert_eq!(simplify(&expr), var("x"));
}

#[test]
fn test_rebuilds_irreducible_nodes() {
    let expr = Expr::add(
        Expr::multiply(var("a"), lit(2)),
        Expr::add(lit(0), var("b")),
    );
    assert_eq!(
        simplify(&expr),
        Expr::add(Expr::multiply(var("a"), lit(2)), var("b"))
    );
}

#[test]
fn test_leaves_unchanged() {
    assert_eq!(simplify(&lit(5)), lit(5));
    assert_eq!(simplify(&var("y")), var("y"));
}

#[test]
fn test_folding_wraps() {
    assert_eq!(simplify(&Expr::add(lit(i64::MAX), lit(1))), lit(i64::MIN));
}

#[test]
fn test_idempotent_on_matrix_chain() {
    // ((0 + (0 + a*b)) + (0 + c*d)) style chains collapse once, then stay put.
    let chain = Expr::add(
        Expr::add(lit(0), Expr::add(lit(0), Expr::multiply(var("a"), var("b")))),
        Expr::add(lit(0), Expr::multiply(var("c"), var("d"))),
    );
    let once = simplify(&chain);
    assert_eq!(
        once,
        Expr::add(
            Expr::multiply(var("a"), var("b")),
            Expr::multiply(var("c"), var("d"))
        )
    );
    assert_eq!(simplify(&once), once);
}
