//! Command handlers for the `calc` CLI.
//!
//! Each handler returns the text to print; `main` owns stdout, stderr and
//! the exit code. Option parsing lives here too so it can be tested
//! without spawning the binary.

use std::fmt::Write as _;
use std::path::Path;

use cal_eval::{simplify, Environment};
use cal_ir::Expr;
use cal_native::NativeConfig;

use crate::frontend::parse_expr;
use crate::harness::{bench, verify, Backend, BenchOptions, Prepared, VerifyOptions};
use crate::CalcError;

/// Options for `calc eval`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EvalOptions {
    pub backend: Option<Backend>,
    /// `name=value` pairs in command-line order; later bindings win.
    pub bindings: Vec<(String, i64)>,
}

impl EvalOptions {
    pub fn environment(&self) -> Environment {
        self.bindings
            .iter()
            .map(|(name, value)| (name.as_str(), *value))
            .collect()
    }
}

/// Read and decode an expression file.
pub fn read_expr(path: &Path) -> Result<Expr, CalcError> {
    let source = std::fs::read_to_string(path).map_err(|source| CalcError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_expr(&source)?)
}

/// `calc print`: render the expression as written.
pub fn print_file(path: &Path) -> Result<String, CalcError> {
    Ok(read_expr(path)?.to_string())
}

/// `calc simplify`: render the simplified expression.
pub fn simplify_file(path: &Path) -> Result<String, CalcError> {
    Ok(simplify(&read_expr(path)?).to_string())
}

/// `calc eval`: evaluate with one backend.
pub fn eval_file(path: &Path, options: &EvalOptions) -> Result<String, CalcError> {
    let expr = read_expr(path)?;
    let backend = options.backend.unwrap_or(Backend::Naive);
    let config = native_config(backend == Backend::Native)?;
    let prepared = Prepared::new(backend, &expr, &config)?;
    Ok(prepared.evaluate(&options.environment())?.to_string())
}

/// `calc bench`: one line per backend.
pub fn run_bench(options: &BenchOptions) -> Result<String, CalcError> {
    let config = native_config(options.selected().contains(&Backend::Native))?;
    let reports = bench(options, &config)?;

    let mut out = format!(
        "matrix workload n={} ({} iterations)",
        options.size,
        options.iterations.max(1)
    );
    for report in &reports {
        let _ = write!(out, "\n{report}");
    }
    Ok(out)
}

/// `calc verify`: fails with the first disagreement, if any.
pub fn run_verify(options: &VerifyOptions) -> Result<String, CalcError> {
    let config = native_config(options.native)?;
    let report = verify(options, &config)?;
    let backends: Vec<&str> = report.backends.iter().map(|b| b.name()).collect();

    match report.mismatch {
        Some(mismatch) => Err(CalcError::Disagreement(mismatch)),
        None => Ok(format!(
            "{} trials on matrix workload n={}: {} agree",
            report.trials,
            options.size,
            backends.join(", ")
        )),
    }
}

/// The environment only matters, and is only validated, when native code
/// will be built.
fn native_config(needed: bool) -> Result<NativeConfig, CalcError> {
    if needed {
        Ok(NativeConfig::from_env()?)
    } else {
        Ok(NativeConfig::default())
    }
}

// -- Option parsing --

/// Parse the arguments after `calc eval <file>`.
pub fn parse_eval_options(args: &[String]) -> Result<EvalOptions, CalcError> {
    let mut options = EvalOptions::default();
    for arg in args {
        if let Some(backend) = arg.strip_prefix("--backend=") {
            options.backend = Some(backend.parse()?);
        } else if let Some((name, value)) = arg.split_once('=') {
            if name.is_empty() || name.starts_with('-') {
                return Err(unknown_option(arg));
            }
            options.bindings.push((name.to_string(), parse_number(name, value)?));
        } else {
            return Err(unknown_option(arg));
        }
    }
    Ok(options)
}

/// Parse the arguments after `calc bench`.
pub fn parse_bench_options(args: &[String]) -> Result<BenchOptions, CalcError> {
    let mut options = BenchOptions::default();
    for arg in args {
        if let Some(size) = arg.strip_prefix("--size=") {
            options.size = parse_number("--size", size)?;
        } else if let Some(iterations) = arg.strip_prefix("--iterations=") {
            options.iterations = parse_number("--iterations", iterations)?;
        } else if let Some(backend) = arg.strip_prefix("--backend=") {
            let backend = backend.parse()?;
            if !options.backends.contains(&backend) {
                options.backends.push(backend);
            }
        } else {
            return Err(unknown_option(arg));
        }
    }
    Ok(options)
}

/// Parse the arguments after `calc verify`.
pub fn parse_verify_options(args: &[String]) -> Result<VerifyOptions, CalcError> {
    let mut options = VerifyOptions::default();
    for arg in args {
        if let Some(size) = arg.strip_prefix("--size=") {
            options.size = parse_number("--size", size)?;
        } else if let Some(trials) = arg.strip_prefix("--trials=") {
            options.trials = parse_number("--trials", trials)?;
        } else if arg == "--no-native" {
            options.native = false;
        } else {
            return Err(unknown_option(arg));
        }
    }
    Ok(options)
}

fn parse_number<T: std::str::FromStr>(what: &str, value: &str) -> Result<T, CalcError> {
    value
        .parse()
        .map_err(|_| CalcError::Usage(format!("invalid value for {what}: '{value}'")))
}

fn unknown_option(arg: &str) -> CalcError {
    CalcError::Usage(format!("unexpected argument '{arg}'"))
}
