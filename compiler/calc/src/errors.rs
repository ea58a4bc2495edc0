//! Driver errors.

use std::path::PathBuf;

use cal_eval::EvalError;
use cal_native::NativeError;

use crate::frontend::FrontendError;
use crate::harness::Mismatch;

#[derive(Debug, thiserror::Error)]
pub enum CalcError {
    #[error(transparent)]
    Frontend(#[from] FrontendError),

    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error(transparent)]
    Native(#[from] NativeError),

    #[error("failed to read '{}'", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `calc verify` found a backend disagreeing with the naive evaluator.
    #[error("backends disagree: {0}")]
    Disagreement(Mismatch),

    /// Bad command-line input.
    #[error("{0}")]
    Usage(String),
}

impl CalcError {
    /// This error followed by each of its sources, outermost first.
    pub fn chain(&self) -> Vec<String> {
        let mut messages = vec![self.to_string()];
        let mut source = std::error::Error::source(self);
        while let Some(err) = source {
            messages.push(err.to_string());
            source = err.source();
        }
        messages
    }
}
