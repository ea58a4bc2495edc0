//! Calc - driver for the Cal staging pipeline.
//!
//! Everything user-facing lives here: the JSON front-end, the matrix
//! workload, the benchmark and verification harness, and the command
//! handlers behind the `calc` binary. The staging passes and backends are
//! in `cal_eval` and `cal_native`.

pub mod commands;
mod errors;
pub mod frontend;
pub mod harness;
mod tracing_setup;
pub mod workload;

pub use errors::CalcError;
pub use frontend::{parse_expr, FrontendError};
pub use harness::{Backend, BenchOptions, Prepared, VerifyOptions};
pub use tracing_setup::init_tracing;
