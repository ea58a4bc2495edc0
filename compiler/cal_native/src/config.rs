//! Native backend configuration.
//!
//! Defaults compile with the system `cc` at `-O2`. `from_env` reads:
//!
//! | variable          | meaning                                  |
//! |-------------------|------------------------------------------|
//! | `CAL_CC`          | compiler executable (wins over `CC`)     |
//! | `CC`              | compiler executable                      |
//! | `CAL_OPT_LEVEL`   | `0`, `1`, `2` or `3`                     |
//! | `CAL_CFLAGS`      | extra flags, split on whitespace         |
//! | `CAL_SCRATCH_DIR` | parent of the per-compile scratch dirs   |
//!
//! Any GCC-compatible driver works (gcc, clang, `cc`).

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::NativeError;

/// Optimisation level passed to the compiler.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum OptLevel {
    O0,
    O1,
    #[default]
    O2,
    O3,
}

impl OptLevel {
    /// The `-O` flag for this level.
    pub const fn flag(self) -> &'static str {
        match self {
            OptLevel::O0 => "-O0",
            OptLevel::O1 => "-O1",
            OptLevel::O2 => "-O2",
            OptLevel::O3 => "-O3",
        }
    }
}

impl FromStr for OptLevel {
    type Err = NativeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "0" | "O0" | "-O0" => Ok(OptLevel::O0),
            "1" | "O1" | "-O1" => Ok(OptLevel::O1),
            "2" | "O2" | "-O2" => Ok(OptLevel::O2),
            "3" | "O3" | "-O3" => Ok(OptLevel::O3),
            other => Err(NativeError::InvalidConfig {
                message: format!("unknown optimisation level '{other}' (expected 0, 1, 2 or 3)"),
            }),
        }
    }
}

impl fmt::Display for OptLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.flag())
    }
}

/// How the native backend invokes the C compiler.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NativeConfig {
    /// Compiler executable, looked up on `PATH` if not a path.
    pub compiler: PathBuf,
    pub opt_level: OptLevel,
    /// Flags appended after the backend's own.
    pub extra_flags: Vec<String>,
    /// Where scratch directories are created; the system temp dir if unset.
    pub scratch_dir: Option<PathBuf>,
}

impl Default for NativeConfig {
    fn default() -> Self {
        NativeConfig {
            compiler: PathBuf::from("cc"),
            opt_level: OptLevel::default(),
            extra_flags: Vec::new(),
            scratch_dir: None,
        }
    }
}

impl NativeConfig {
    /// Configuration from the process environment.
    pub fn from_env() -> Result<Self, NativeError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Configuration from an arbitrary variable lookup.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, NativeError> {
        let mut config = NativeConfig::default();
        let non_empty = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        if let Some(compiler) = non_empty("CAL_CC").or_else(|| non_empty("CC")) {
            config.compiler = PathBuf::from(compiler);
        }

        if let Some(level) = non_empty("CAL_OPT_LEVEL") {
            config.opt_level = level.parse()?;
        }

        if let Some(flags) = lookup("CAL_CFLAGS") {
            config.extra_flags = flags.split_whitespace().map(str::to_owned).collect();
        }

        if let Some(dir) = non_empty("CAL_SCRATCH_DIR") {
            config.scratch_dir = Some(PathBuf::from(dir));
        }

        Ok(config)
    }

    #[must_use]
    pub fn with_compiler(mut self, compiler: impl Into<PathBuf>) -> Self {
        self.compiler = compiler.into();
        self
    }

    #[must_use]
    pub fn with_opt_level(mut self, opt_level: OptLevel) -> Self {
        self.opt_level = opt_level;
        self
    }

    #[must_use]
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn with_flag(mut self, flag: impl Into<String>) -> Self {
        self.extra_flags.push(flag.into());
        self
    }
}
