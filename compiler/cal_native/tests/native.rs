//! End-to-end tests for the native backend.
//!
//! These invoke the system C compiler (`cc`, or `CAL_CC`/`CC` when set).

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "tests use unwrap/expect for brevity"
)]

use cal_eval::{eval, locate, stage, Environment, EvalError, LocatedExpr};
use cal_ir::Expr;
use cal_native::{compile_located, compile_native, NativeConfig, NativeError};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rayon::prelude::*;
use std::path::Path;
use tempfile::TempDir;

fn config() -> NativeConfig {
    NativeConfig::from_env().expect("native config")
}

fn var(name: &str) -> Expr {
    Expr::variable(name)
}

#[test]
fn test_constant_expression() {
    // (1+2)*(3+4)
    let expr = Expr::multiply(
        Expr::add(Expr::literal(1), Expr::literal(2)),
        Expr::add(Expr::literal(3), Expr::literal(4)),
    );
    let located = LocatedExpr::new(expr);
    let native = compile_located(&located, &config()).unwrap();

    assert_eq!(native.slot_count(), 0);
    let env = located.table().located_env(Vec::new()).unwrap();
    assert_eq!(native.call(&env), Ok(21));
    assert!(native.source().contains("((1+2)*(3+4))"));
}

#[test]
fn test_variable_expression() {
    // x*x + x
    let expr = Expr::add(Expr::multiply(var("x"), var("x")), var("x"));
    let located = stage(&expr);
    let native = compile_located(&located, &config()).unwrap();

    let env = located
        .table()
        .project(&Environment::new().with("x", 5))
        .unwrap();
    assert_eq!(native.call(&env), Ok(30));
    assert_eq!(native.call_slice(&[-3]), Ok(6));
}

#[test]
fn test_wrapping_matches_other_backends() {
    let expr = Expr::add(
        Expr::multiply(var("a"), Expr::literal(i64::MAX)),
        Expr::literal(i64::MIN),
    );
    let located = LocatedExpr::new(expr.clone());
    let native = compile_located(&located, &config()).unwrap();

    for a in [0, 1, 2, -1, i64::MAX, i64::MIN] {
        let expected = eval(&expr, &Environment::new().with("a", a)).unwrap();
        assert_eq!(native.call_slice(&[a]), Ok(expected), "a = {a}");
    }
}

#[test]
fn test_foreign_environment_rejected() {
    let native = compile_located(&LocatedExpr::new(var("x")), &config()).unwrap();
    let other = LocatedExpr::new(var("y"));
    let env = other.table().located_env(vec![1]).unwrap();

    assert!(matches!(
        native.call(&env),
        Err(EvalError::TableMismatch { .. })
    ));
}

#[test]
fn test_short_slice_rejected() {
    let native = compile_located(
        &LocatedExpr::new(Expr::add(var("x"), var("y"))),
        &config(),
    )
    .unwrap();
    assert_eq!(
        native.call_slice(&[1]),
        Err(EvalError::SlotOutOfRange { slot: 1, len: 1 })
    );
}

#[test]
fn test_foreign_table_rejected_before_compiling() {
    let table = locate(&var("x"));
    // No compiler is needed to detect the mismatch.
    let config = NativeConfig::default().with_compiler("cal-no-such-compiler-7f3a");
    let result = compile_native(&var("y"), &table, &config);
    assert!(matches!(
        result,
        Err(NativeError::Eval(EvalError::TableMismatch { .. }))
    ));
}

#[test]
fn test_missing_compiler() {
    let config = NativeConfig::default().with_compiler("cal-no-such-compiler-7f3a");
    let result = compile_located(&LocatedExpr::new(var("x")), &config);
    assert!(matches!(result, Err(NativeError::CompilerNotFound { .. })));
}

#[cfg(unix)]
#[test]
fn test_compilation_failure() {
    let config = NativeConfig::default().with_compiler("false");
    let result = compile_located(&LocatedExpr::new(var("x")), &config);
    assert!(matches!(
        result,
        Err(NativeError::CompilationFailed { exit_code: Some(1), .. })
    ));
}

#[cfg(unix)]
#[test]
fn test_load_failure() {
    // `true` exits 0 without producing the artifact.
    let config = NativeConfig::default().with_compiler("true");
    let result = compile_located(&LocatedExpr::new(var("x")), &config);
    assert!(matches!(result, Err(NativeError::LoadFailed { .. })));
}

#[test]
fn test_rejected_flag_reports_stderr() {
    let config = config().with_flag("-fcal-no-such-flag");
    match compile_located(&LocatedExpr::new(var("x")), &config) {
        Err(NativeError::CompilationFailed { stderr, .. }) => {
            assert!(!stderr.is_empty());
        }
        other => panic!("expected compilation failure, got {other:?}"),
    }
}

#[test]
fn test_concurrent_compiles_and_calls() {
    let functions: Vec<_> = (0..4_i64)
        .into_par_iter()
        .map(|k| {
            let expr = Expr::add(var("x"), Expr::literal(k));
            let located = LocatedExpr::new(expr);
            (k, compile_located(&located, &config()).unwrap())
        })
        .collect();

    for (k, native) in &functions {
        let results: Vec<_> = (0..64_i64)
            .into_par_iter()
            .map(|x| native.call_slice(&[x]).unwrap())
            .collect();
        let expected: Vec<_> = (0..64_i64).map(|x| x + k).collect();
        assert_eq!(results, expected);
    }
}

#[test]
fn test_deep_expression_compiles() {
    // Far deeper than any compiler's default bracket nesting limit.
    let mut expr = var("x");
    for i in 0..2_000 {
        expr = Expr::add(Expr::multiply(expr, var("y")), Expr::literal(i % 7));
    }
    let located = LocatedExpr::new(expr);
    let native = compile_located(&located, &config()).unwrap();
    assert!(native.source().contains("const int64_t t0 = "));

    let env = located.table().located_env(vec![3, -1]).unwrap();
    assert_eq!(native.call(&env), located.eval(&env));

    let (mut expr, _) = located.into_parts();
    while let Expr::Add(left, right) = expr {
        drop(right);
        match *left {
            Expr::Multiply(inner, y) => {
                drop(y);
                expr = *inner;
            }
            other => expr = other,
        }
    }
}

// -- Scratch directory cleanup --

fn scratch_entries(parent: &Path) -> usize {
    std::fs::read_dir(parent).unwrap().count()
}

#[test]
fn test_scratch_dir_removed_when_function_dropped() {
    let parent = TempDir::new().unwrap();
    let config = config().with_scratch_dir(parent.path());

    let native = compile_located(&LocatedExpr::new(var("x")), &config).unwrap();
    let entries: Vec<_> = std::fs::read_dir(parent.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].starts_with("cal-native-"), "{entries:?}");
    assert_eq!(native.call_slice(&[4]), Ok(4));

    drop(native);
    assert_eq!(scratch_entries(parent.path()), 0);
}

#[cfg(unix)]
#[test]
fn test_scratch_dir_removed_after_compilation_failure() {
    let parent = TempDir::new().unwrap();
    let config = NativeConfig::default()
        .with_compiler("false")
        .with_scratch_dir(parent.path());
    let result = compile_located(&LocatedExpr::new(var("x")), &config);
    assert!(matches!(result, Err(NativeError::CompilationFailed { .. })));
    assert_eq!(scratch_entries(parent.path()), 0);
}

#[cfg(unix)]
#[test]
fn test_scratch_dir_removed_after_load_failure() {
    let parent = TempDir::new().unwrap();
    let config = NativeConfig::default()
        .with_compiler("true")
        .with_scratch_dir(parent.path());
    let result = compile_located(&LocatedExpr::new(var("x")), &config);
    assert!(matches!(result, Err(NativeError::LoadFailed { .. })));
    assert_eq!(scratch_entries(parent.path()), 0);
}

#[test]
fn test_missing_scratch_parent_is_io_error() {
    let parent = TempDir::new().unwrap();
    let config = config().with_scratch_dir(parent.path().join("absent"));
    let result = compile_located(&LocatedExpr::new(var("x")), &config);
    assert!(matches!(result, Err(NativeError::Io { .. })));
}

fn arb_expr() -> impl Strategy<Value = Expr> {
    let leaf = prop_oneof![
        (-50_i64..50).prop_map(Expr::literal),
        prop::sample::select(vec!["a", "b", "c"]).prop_map(|name| Expr::variable(name)),
    ];
    leaf.prop_recursive(4, 24, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(l, r)| Expr::add(l, r)),
            (inner.clone(), inner).prop_map(|(l, r)| Expr::multiply(l, r)),
        ]
    })
}

proptest! {
    // Each case runs the C compiler.
    #![proptest_config(ProptestConfig::with_cases(12))]

    #[test]
    fn native_agrees_with_naive(
        expr in arb_expr(),
        a in any::<i64>(),
        b in any::<i64>(),
        c in any::<i64>(),
    ) {
        let env = Environment::new().with("a", a).with("b", b).with("c", c);
        let expected = eval(&expr, &env).unwrap();

        let located = stage(&expr);
        let native = compile_located(&located, &config()).unwrap();
        let located_env = located.table().project(&env).unwrap();

        prop_assert_eq!(native.call(&located_env), Ok(expected));
        prop_assert_eq!(located.eval(&located_env), Ok(expected));
        prop_assert_eq!(located.specialize().unwrap().call(&located_env), Ok(expected));
    }
}
