//! Cal Native - compile a located expression to machine code.
//!
//! # Pipeline
//!
//! ```text
//! Expr + LocationTable
//!     │ codegen::render_body            ((env[0]*env[1])+3)
//!     ▼
//! codegen::compilation_unit             int64_t evaluate(const int64_t *env)
//!     │ write to a fresh TempDir
//!     ▼
//! toolchain::compile                    cc -shared -fPIC -fwrapv -O2 ...
//!     │
//!     ▼
//! libloading::Library                   bind `evaluate`
//!     │
//!     ▼
//! NativeFn                              same contract as `Specialized`
//! ```
//!
//! Construction is expensive (a compiler process and filesystem I/O) and
//! blocks the calling thread; build once and reuse the [`NativeFn`].
//!
//! # Resources
//!
//! Each compile gets its own temporary directory, so concurrent compiles
//! never collide. The directory, the source and artifact inside it, and the
//! library handle are all owned values: an error at any step drops whatever
//! was created so far, and a successful [`NativeFn`] releases them when it
//! is dropped.

mod codegen;
mod config;
mod errors;
mod library;
mod toolchain;

pub use codegen::{compilation_unit, render_body, Body, ENTRY_POINT, MAX_NESTING};
pub use config::{NativeConfig, OptLevel};
pub use errors::NativeError;
pub use toolchain::{compile, compile_command};

use std::fmt;
use std::time::Instant;

use cal_eval::{EvalError, EvalResult, LocatedEnv, LocatedExpr, LocationTable};
use cal_ir::{Expr, Fingerprint};
use libloading::Library;
use tempfile::TempDir;

use library::EntryFn;

/// Name of the generated source file inside the scratch directory.
const SOURCE_FILE: &str = "evaluate.c";

/// A located expression compiled to native code.
pub struct NativeFn {
    entry: EntryFn,
    slots: usize,
    origin: Fingerprint,
    source: String,
    // Declaration order is drop order: unload the library, then delete the
    // directory holding it.
    _library: Library,
    _dir: TempDir,
}

/// Compile `expr`, laid out by `table`, into a native function.
pub fn compile_native(
    expr: &Expr,
    table: &LocationTable,
    config: &NativeConfig,
) -> Result<NativeFn, NativeError> {
    let _span = tracing::debug_span!(
        "compile_native",
        nodes = expr.node_count(),
        depth = expr.depth()
    )
    .entered();
    let start = Instant::now();

    table.check_origin(expr)?;
    let source = compilation_unit(&render_body(expr, table)?);

    let mut builder = tempfile::Builder::new();
    builder.prefix("cal-native-");
    let dir = match &config.scratch_dir {
        Some(parent) => builder.tempdir_in(parent),
        None => builder.tempdir(),
    }
    .map_err(NativeError::io("failed to create scratch directory"))?;
    let source_path = dir.path().join(SOURCE_FILE);
    let artifact = dir.path().join(libloading::library_filename("evaluate"));

    std::fs::write(&source_path, &source)
        .map_err(NativeError::io("failed to write generated source"))?;
    compile(config, &source_path, &artifact)?;
    let (library, entry) = library::load(&artifact)?;

    tracing::debug!(
        slots = table.len(),
        source_bytes = source.len(),
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "compiled native function"
    );

    Ok(NativeFn {
        entry,
        slots: table.len(),
        origin: table.origin(),
        source,
        _library: library,
        _dir: dir,
    })
}

/// Compile a [`LocatedExpr`] against its own table.
pub fn compile_located(
    located: &LocatedExpr,
    config: &NativeConfig,
) -> Result<NativeFn, NativeError> {
    compile_native(located.expr(), located.table(), config)
}

impl NativeFn {
    /// Invoke with an environment built through the originating table.
    #[inline]
    pub fn call(&self, env: &LocatedEnv) -> EvalResult {
        if env.origin() != self.origin {
            return Err(EvalError::TableMismatch {
                expected: self.origin,
                found: env.origin(),
            });
        }
        self.call_slice(env.values())
    }

    /// Invoke with raw slot values; `env` must cover every slot.
    #[inline]
    pub fn call_slice(&self, env: &[i64]) -> EvalResult {
        if env.len() < self.slots {
            return Err(EvalError::SlotOutOfRange {
                slot: self.slots - 1,
                len: env.len(),
            });
        }
        // SAFETY: `entry` came from `_library`, which lives as long as
        // `self`. The generated code reads only `env[0..slots]`, checked above.
        Ok(unsafe { (self.entry)(env.as_ptr()) })
    }

    /// Number of slots the compiled code reads.
    pub fn slot_count(&self) -> usize {
        self.slots
    }

    pub fn origin(&self) -> Fingerprint {
        self.origin
    }

    /// The generated C unit.
    pub fn source(&self) -> &str {
        &self.source
    }
}

impl fmt::Debug for NativeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFn")
            .field("slots", &self.slots)
            .field("origin", &self.origin)
            .field("dir", &self._dir.path())
            .finish_non_exhaustive()
    }
}
