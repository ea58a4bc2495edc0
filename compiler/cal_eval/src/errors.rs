//! Evaluation errors.
//!
//! Every failure is surfaced to the caller. Nothing is defaulted: a missing
//! binding is an error, never zero.

use cal_ir::{Fingerprint, Name};

/// Result of evaluating with any in-process backend.
pub type EvalResult<T = i64> = Result<T, EvalError>;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EvalError {
    /// The naive evaluator (or a projection) met a name the environment
    /// does not bind.
    #[error("no binding for variable `{name}`")]
    MissingBinding { name: Name },

    /// The location table has no slot for a referenced variable.
    #[error("no slot assigned to variable `{name}`")]
    MissingSlot { name: Name },

    /// A slot index is past the end of the located environment.
    #[error("slot {slot} is out of range for a located environment of {len} values")]
    SlotOutOfRange { slot: usize, len: usize },

    /// Raw values do not match the number of slots in the table.
    #[error("expected {expected} located values, found {found}")]
    ArityMismatch { expected: usize, found: usize },

    /// A table or located environment was paired with an artifact derived
    /// from a different expression.
    #[error("location table mismatch: artifact expects table {expected}, got {found}")]
    TableMismatch {
        expected: Fingerprint,
        found: Fingerprint,
    },
}

impl EvalError {
    pub(crate) fn missing_binding(name: &Name) -> Self {
        EvalError::MissingBinding { name: name.clone() }
    }

    pub(crate) fn missing_slot(name: &Name) -> Self {
        EvalError::MissingSlot { name: name.clone() }
    }
}
