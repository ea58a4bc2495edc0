//! Backend selection, benchmarking and cross-backend verification.
//!
//! A [`Prepared`] backend has done all of its one-time work (staging,
//! closure building, native compilation). [`Prepared::inputs`] projects an
//! environment once; [`Prepared::run`] is then the only thing timed.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use rustc_hash::FxHasher;

use cal_eval::{eval, stage, Environment, EvalResult, LocatedEnv, LocatedExpr, Specialized};
use cal_ir::Expr;
use cal_native::{compile_located, NativeConfig, NativeFn};

use crate::workload::{matrix_env, matrix_env_with, matrix_product};
use crate::CalcError;

/// One of the four evaluation strategies.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Backend {
    Naive,
    Indexed,
    Specialized,
    Native,
}

impl Backend {
    pub const ALL: [Backend; 4] = [
        Backend::Naive,
        Backend::Indexed,
        Backend::Specialized,
        Backend::Native,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Backend::Naive => "naive",
            Backend::Indexed => "indexed",
            Backend::Specialized => "specialized",
            Backend::Native => "native",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Backend {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Backend::ALL
            .into_iter()
            .find(|backend| backend.name() == s)
            .ok_or_else(|| {
                CalcError::Usage(format!(
                    "unknown backend '{s}' (expected naive, indexed, specialized or native)"
                ))
            })
    }
}

/// Per-call inputs for a [`Prepared`] backend.
#[derive(Clone, Debug)]
pub struct Inputs {
    env: Environment,
    located: LocatedEnv,
}

enum Runner {
    Naive,
    Indexed,
    Specialized(Specialized),
    Native(NativeFn),
}

/// A backend with its one-time work done.
pub struct Prepared {
    backend: Backend,
    /// The expression as given; the naive backend evaluates it unstaged.
    source: Expr,
    located: LocatedExpr,
    runner: Runner,
}

impl Prepared {
    /// Stage `expr` and build `backend` for it.
    ///
    /// `config` is only consulted for [`Backend::Native`].
    pub fn new(backend: Backend, expr: &Expr, config: &NativeConfig) -> Result<Self, CalcError> {
        let _span = tracing::debug_span!("prepare", %backend).entered();
        let located = stage(expr);
        let runner = match backend {
            Backend::Naive => Runner::Naive,
            Backend::Indexed => Runner::Indexed,
            Backend::Specialized => Runner::Specialized(located.specialize()?),
            Backend::Native => Runner::Native(compile_located(&located, config)?),
        };
        Ok(Prepared {
            backend,
            source: expr.clone(),
            located,
            runner,
        })
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// The staged expression the located backends run.
    pub fn located(&self) -> &LocatedExpr {
        &self.located
    }

    /// Project `env` for repeated [`run`](Self::run) calls.
    pub fn inputs(&self, env: &Environment) -> EvalResult<Inputs> {
        Ok(Inputs {
            located: self.located.table().project(env)?,
            env: env.clone(),
        })
    }

    #[inline]
    pub fn run(&self, inputs: &Inputs) -> EvalResult {
        match &self.runner {
            Runner::Naive => eval(&self.source, &inputs.env),
            Runner::Indexed => self.located.eval(&inputs.located),
            Runner::Specialized(function) => function.call(&inputs.located),
            Runner::Native(function) => function.call(&inputs.located),
        }
    }

    /// Project and run once.
    pub fn evaluate(&self, env: &Environment) -> EvalResult {
        self.run(&self.inputs(env)?)
    }
}

impl fmt::Debug for Prepared {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Prepared")
            .field("backend", &self.backend)
            .field("slots", &self.located.table().len())
            .finish_non_exhaustive()
    }
}

// -- Benchmarking --

/// Options for `calc bench`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BenchOptions {
    /// Matrix dimension of the workload.
    pub size: usize,
    pub iterations: usize,
    /// Empty means every backend.
    pub backends: Vec<Backend>,
}

impl Default for BenchOptions {
    fn default() -> Self {
        BenchOptions {
            size: 10,
            iterations: 1000,
            backends: Vec::new(),
        }
    }
}

impl BenchOptions {
    pub fn selected(&self) -> Vec<Backend> {
        if self.backends.is_empty() {
            Backend::ALL.to_vec()
        } else {
            self.backends.clone()
        }
    }
}

/// Timing of one backend on the workload.
#[derive(Clone, Debug)]
pub struct BenchReport {
    pub backend: Backend,
    /// Staging plus backend construction.
    pub prepare: Duration,
    /// All iterations together.
    pub run: Duration,
    pub iterations: usize,
    pub result: i64,
}

impl BenchReport {
    pub fn per_iteration(&self) -> Duration {
        match u32::try_from(self.iterations) {
            Ok(0) | Err(_) => Duration::ZERO,
            Ok(n) => self.run / n,
        }
    }
}

impl fmt::Display for BenchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<12} prepare {:>10.3} ms   run {:>10.3} ms   {:>10.3} us/iter   result {}",
            self.backend.name(),
            self.prepare.as_secs_f64() * 1000.0,
            self.run.as_secs_f64() * 1000.0,
            self.per_iteration().as_secs_f64() * 1_000_000.0,
            self.result,
        )
    }
}

/// Time every selected backend on the matrix workload with all entries 1.
pub fn bench(options: &BenchOptions, config: &NativeConfig) -> Result<Vec<BenchReport>, CalcError> {
    let expr = matrix_product(options.size);
    let env = matrix_env(options.size, 1);

    options
        .selected()
        .into_iter()
        .map(|backend| bench_one(backend, &expr, &env, options.iterations, config))
        .collect()
}

fn bench_one(
    backend: Backend,
    expr: &Expr,
    env: &Environment,
    iterations: usize,
    config: &NativeConfig,
) -> Result<BenchReport, CalcError> {
    let start = Instant::now();
    let prepared = Prepared::new(backend, expr, config)?;
    let inputs = prepared.inputs(env)?;
    let prepare = start.elapsed();

    let start = Instant::now();
    let mut result = prepared.run(&inputs)?;
    for _ in 1..iterations {
        result = std::hint::black_box(prepared.run(std::hint::black_box(&inputs))?);
    }
    let run = start.elapsed();

    tracing::info!(%backend, iterations, run_ms = run.as_secs_f64() * 1000.0, "benchmarked");
    Ok(BenchReport {
        backend,
        prepare,
        run,
        iterations: iterations.max(1),
        result,
    })
}

// -- Verification --

/// Options for `calc verify`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerifyOptions {
    pub size: usize,
    pub trials: u64,
    /// Include the native backend (needs a C compiler).
    pub native: bool,
}

impl Default for VerifyOptions {
    fn default() -> Self {
        VerifyOptions {
            size: 4,
            trials: 256,
            native: true,
        }
    }
}

/// A backend that disagreed with the naive evaluator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mismatch {
    pub trial: u64,
    pub backend: Backend,
    pub expected: i64,
    pub found: i64,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "trial {}: {} returned {}, naive returned {}",
            self.trial, self.backend, self.found, self.expected
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerifyReport {
    pub trials: u64,
    pub backends: Vec<Backend>,
    /// First disagreement in trial order.
    pub mismatch: Option<Mismatch>,
}

/// Value of `name` in the environment of `trial`.
///
/// Deterministic, so a failing trial can be replayed from its index.
/// Mostly small values, with every eighth trial drawing from the full
/// `i64` range to exercise wrapping.
pub fn trial_value(trial: u64, name: &str) -> i64 {
    let mut hasher = FxHasher::default();
    trial.hash(&mut hasher);
    name.hash(&mut hasher);
    let raw = i64::from_ne_bytes(hasher.finish().to_ne_bytes());
    if trial % 8 == 7 {
        raw
    } else {
        raw % 101
    }
}

/// Run every backend on `trials` environments of the matrix workload and
/// compare each against the naive evaluator. Trials run in parallel.
pub fn verify(options: &VerifyOptions, config: &NativeConfig) -> Result<VerifyReport, CalcError> {
    let expr = matrix_product(options.size);
    let backends: Vec<Backend> = Backend::ALL
        .into_iter()
        .filter(|&backend| options.native || backend != Backend::Native)
        .collect();
    let prepared = backends
        .iter()
        .map(|&backend| Prepared::new(backend, &expr, config))
        .collect::<Result<Vec<_>, _>>()?;

    let outcomes = (0..options.trials)
        .into_par_iter()
        .map(|trial| check_trial(trial, &expr, options.size, &prepared))
        .collect::<Result<Vec<_>, CalcError>>()?;
    let mismatch = outcomes.into_iter().flatten().next();

    tracing::info!(trials = options.trials, ok = mismatch.is_none(), "verified backends");
    Ok(VerifyReport {
        trials: options.trials,
        backends,
        mismatch,
    })
}

fn check_trial(
    trial: u64,
    expr: &Expr,
    size: usize,
    prepared: &[Prepared],
) -> Result<Option<Mismatch>, CalcError> {
    let env = matrix_env_with(size, |name| trial_value(trial, name));
    let expected = eval(expr, &env)?;

    for backend in prepared {
        let found = backend.evaluate(&env)?;
        if found != expected {
            return Ok(Some(Mismatch {
                trial,
                backend: backend.backend(),
                expected,
                found,
            }));
        }
    }
    Ok(None)
}
