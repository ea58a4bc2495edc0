//! Native backend errors.
//!
//! Compilation and load failures mean the generated source or the toolchain
//! is broken. They are reported as-is; the backend never falls back to a
//! slower evaluator.

use std::path::PathBuf;

use cal_eval::EvalError;

#[derive(Debug, thiserror::Error)]
pub enum NativeError {
    /// The located expression and table do not fit together.
    #[error(transparent)]
    Eval(#[from] EvalError),

    /// The compiler executable could not be started.
    #[error("C compiler '{compiler}' not found: {message}")]
    CompilerNotFound { compiler: String, message: String },

    /// The compiler ran and rejected the generated unit.
    #[error("{}", compilation_failed_message(.compiler, .exit_code, .stderr, .command))]
    CompilationFailed {
        compiler: String,
        exit_code: Option<i32>,
        stderr: String,
        command: String,
    },

    /// The artifact could not be opened as a shared library.
    #[error("failed to load '{}': {message}", .path.display())]
    LoadFailed { path: PathBuf, message: String },

    /// The library loaded but does not export the entry point.
    #[error("compiled library has no `{symbol}` entry point: {message}")]
    MissingEntryPoint { symbol: String, message: String },

    /// Bad backend configuration (for example an unknown optimisation level).
    #[error("invalid native backend configuration: {message}")]
    InvalidConfig { message: String },

    /// Filesystem work around the compile (scratch directory, source file).
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}

impl NativeError {
    pub(crate) fn io(context: &'static str) -> impl FnOnce(std::io::Error) -> Self {
        move |source| NativeError::Io { context, source }
    }
}

fn compilation_failed_message(
    compiler: &str,
    exit_code: &Option<i32>,
    stderr: &str,
    command: &str,
) -> String {
    let mut message = format!("compiling with '{compiler}' failed");
    if let Some(code) = exit_code {
        message.push_str(&format!(" (exit code {code})"));
    }
    if !stderr.is_empty() {
        message.push_str("\n\nCompiler stderr:\n");
        message.push_str(stderr);
    }
    message.push_str("\n\nCommand: ");
    message.push_str(command);
    message
}
