//! Variable location resolution.
//!
//! `locate` walks an expression once, left to right and depth first, and
//! gives each distinct variable name the next free slot. The resulting
//! [`LocationTable`] is dense (`k` names get slots `0..k`) and remembers the
//! fingerprint of the expression it came from.
//!
//! A table only means something next to the expression it was derived from.
//! [`LocatedEnv`] carries the same fingerprint, so artifacts can refuse
//! environments projected through some other table instead of silently
//! reading the wrong slots.

use rustc_hash::FxHashMap;

use cal_ir::{Expr, Fingerprint, Name};

use crate::{Environment, EvalError, EvalResult};

/// Name -> slot assignment for one expression.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocationTable {
    slots: FxHashMap<Name, usize>,
    /// Names in slot order.
    names: Vec<Name>,
    origin: Fingerprint,
}

/// Assign slots to the variables of `expr` in first-occurrence order.
pub fn locate(expr: &Expr) -> LocationTable {
    let mut slots = FxHashMap::default();
    let mut names = Vec::new();

    for name in expr.variables() {
        if !slots.contains_key(name) {
            slots.insert(name.clone(), names.len());
            names.push(name.clone());
        }
    }

    let table = LocationTable {
        slots,
        names,
        origin: expr.fingerprint(),
    };
    tracing::debug!(slots = table.len(), origin = %table.origin, "located variables");
    table
}

impl LocationTable {
    /// Slot assigned to `name`.
    #[inline]
    pub fn slot(&self, name: &str) -> Option<usize> {
        self.slots.get(name).copied()
    }

    /// Number of slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Names in slot order: `names()[slot]` is the name at `slot`.
    pub fn names(&self) -> &[Name] {
        &self.names
    }

    /// `(name, slot)` pairs in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (&Name, usize)> + '_ {
        self.names.iter().enumerate().map(|(slot, name)| (name, slot))
    }

    /// Fingerprint of the expression this table was derived from.
    #[inline]
    pub fn origin(&self) -> Fingerprint {
        self.origin
    }

    /// Project a name-keyed environment onto this table's slots.
    ///
    /// Fails with [`EvalError::MissingBinding`] for the first slot whose name
    /// `env` does not bind. Extra bindings are ignored.
    pub fn project(&self, env: &Environment) -> EvalResult<LocatedEnv> {
        let values = self
            .names
            .iter()
            .map(|name| env.get(name.as_str()).ok_or_else(|| EvalError::missing_binding(name)))
            .collect::<EvalResult<Vec<_>>>()?;
        Ok(LocatedEnv {
            values,
            origin: self.origin,
        })
    }

    /// Wrap raw slot values, which must cover every slot exactly.
    pub fn located_env(&self, values: Vec<i64>) -> EvalResult<LocatedEnv> {
        if values.len() != self.len() {
            return Err(EvalError::ArityMismatch {
                expected: self.len(),
                found: values.len(),
            });
        }
        Ok(LocatedEnv {
            values,
            origin: self.origin,
        })
    }

    /// Check that this table was derived from `expr` (or a structurally
    /// equal tree).
    pub fn check_origin(&self, expr: &Expr) -> EvalResult<()> {
        let found = expr.fingerprint();
        if found == self.origin {
            Ok(())
        } else {
            Err(EvalError::TableMismatch {
                expected: found,
                found: self.origin,
            })
        }
    }

    /// Check that `env` was built through this table.
    #[inline]
    pub fn check_env(&self, env: &LocatedEnv) -> EvalResult<()> {
        if env.origin == self.origin {
            Ok(())
        } else {
            Err(EvalError::TableMismatch {
                expected: self.origin,
                found: env.origin,
            })
        }
    }
}

/// Slot-indexed values for one evaluation.
///
/// Only constructed through a [`LocationTable`], whose fingerprint it keeps.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocatedEnv {
    values: Vec<i64>,
    origin: Fingerprint,
}

impl LocatedEnv {
    #[inline]
    pub fn values(&self) -> &[i64] {
        &self.values
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Fingerprint of the table this environment was built through.
    #[inline]
    pub fn origin(&self) -> Fingerprint {
        self.origin
    }
}

#[cfg(test)]
mod tests;
