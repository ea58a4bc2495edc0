use super::*;
use pretty_assertions::assert_eq;

fn var(name: &str) -> Expr {
    Expr::variable(name)
}

/// `(b * a) + (1 + (b * c))`
fn sample() -> Expr {
    Expr::add(
        Expr::multiply(var("b"), var("a")),
        Expr::add(Expr::literal(1), Expr::multiply(var("b"), var("c"))),
    )
}

#[test]
fn test_first_occurrence_order() {
    let table = locate(&sample());
    assert_eq!(table.slot("b"), Some(0));
    assert_eq!(table.slot("a"), Some(1));
    assert_eq!(table.slot("c"), Some(2));
    assert_eq!(table.slot("d"), None);
    let names: Vec<&str> = table.names().iter().map(Name::as_str).collect();
    assert_eq!(names, vec!["b", "a", "c"]);
}

#[test]
fn test_slots_are_dense() {
    let table = locate(&sample());
    assert_eq!(table.len(), 3);
    let mut slots: Vec<usize> = table.iter().map(|(_, slot)| slot).collect();
    slots.sort_unstable();
    assert_eq!(slots, vec![0, 1, 2]);
}

#[test]
fn test_literals_contribute_nothing() {
    let table = locate(&Expr::add(Expr::literal(1), Expr::literal(2)));
    assert!(table.is_empty());
    assert_eq!(table.len(), 0);
}

#[test]
fn test_deterministic_for_equal_trees() {
    assert_eq!(locate(&sample()), locate(&sample()));
}

#[test]
fn test_project_environment() {
    let table = locate(&sample());
    let env = Environment::new()
        .with("a", 10)
        .with("b", 20)
        .with("c", 30)
        .with("unused", 99);
    let located = table.project(&env).unwrap();
    assert_eq!(located.values(), &[20, 10, 30]);
    for (name, slot) in table.iter() {
        assert_eq!(located.values().get(slot).copied(), env.get(name.as_str()));
    }
    assert_eq!(located.origin(), table.origin());
}

#[test]
fn test_project_missing_binding() {
    let table = locate(&sample());
    let env = Environment::new().with("a", 1).with("b", 2);
    assert_eq!(
        table.project(&env),
        Err(EvalError::MissingBinding { name: Name::new("c") })
    );
}

#[test]
fn test_located_env_arity() {
    let table = locate(&sample());
    assert!(table.located_env(vec![1, 2, 3]).is_ok());
    assert_eq!(
        table.located_env(vec![1, 2]),
        Err(EvalError::ArityMismatch { expected: 3, found: 2 })
    );
}

#[test]
fn test_origin_checks() {
    let table = locate(&sample());
    assert!(table.check_origin(&sample()).is_ok());

    let other = Expr::add(var("x"), var("y"));
    assert!(matches!(
        table.check_origin(&other),
        Err(EvalError::TableMismatch { .. })
    ));

    let foreign = locate(&other).located_env(vec![1, 2]).unwrap();
    assert_eq!(
        table.check_env(&foreign),
        Err(EvalError::TableMismatch {
            expected: table.origin(),
            found: foreign.origin(),
        })
    );
}

#[test]
fn test_resimplified_tree_gets_its_own_table() {
    // `0 + (y + x)` and `y + x` locate identically but are different trees.
    let raw = Expr::add(Expr::literal(0), Expr::add(var("y"), var("x")));
    let simplified = crate::simplify(&raw);
    let raw_table = locate(&raw);
    let simplified_table = locate(&simplified);
    assert_eq!(raw_table.names(), simplified_table.names());
    assert_ne!(raw_table.origin(), simplified_table.origin());
}
