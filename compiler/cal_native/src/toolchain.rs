//! C compiler driver.
//!
//! Builds one shared library from one source file:
//!
//! ```text
//! <cc> -shared -fPIC -fwrapv -O<n> [extra flags] -o <artifact> <source>
//! ```
//!
//! The process is run to completion with its output captured. A non-zero
//! exit becomes [`NativeError::CompilationFailed`] carrying the compiler's
//! stderr and the full command line.

use std::path::Path;
use std::process::{Command, Output};
use std::time::Instant;

use crate::{NativeConfig, NativeError};

/// Flags every compile needs regardless of configuration.
const BASE_FLAGS: [&str; 3] = ["-shared", "-fPIC", "-fwrapv"];

/// Build the compiler command for `source` -> `artifact`.
pub fn compile_command(config: &NativeConfig, source: &Path, artifact: &Path) -> Command {
    let mut cmd = Command::new(&config.compiler);
    cmd.args(BASE_FLAGS)
        .arg(config.opt_level.flag())
        .args(&config.extra_flags)
        .arg("-o")
        .arg(artifact)
        .arg(source);
    cmd
}

/// Compile `source` into the shared library `artifact`.
pub fn compile(config: &NativeConfig, source: &Path, artifact: &Path) -> Result<(), NativeError> {
    let mut cmd = compile_command(config, source, artifact);
    let start = Instant::now();
    let output = run_compiler(&mut cmd, config)?;

    tracing::debug!(
        compiler = %config.compiler.display(),
        status = ?output.status.code(),
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "ran C compiler"
    );

    if output.status.success() {
        return Ok(());
    }

    Err(NativeError::CompilationFailed {
        compiler: config.compiler.display().to_string(),
        exit_code: output.status.code(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        command: format!("{cmd:?}"),
    })
}

fn run_compiler(cmd: &mut Command, config: &NativeConfig) -> Result<Output, NativeError> {
    cmd.output().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            NativeError::CompilerNotFound {
                compiler: config.compiler.display().to_string(),
                message: e.to_string(),
            }
        } else {
            NativeError::Io {
                context: "failed to run C compiler",
                source: e,
            }
        }
    })
}

#[cfg(test)]
mod tests;
