//! Name-keyed environment for the naive evaluator.

use rustc_hash::FxHashMap;

use cal_ir::Name;

/// Variable bindings, keyed by name.
///
/// Built once by the caller, read-only during evaluation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Environment {
    bindings: FxHashMap<Name, i64>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name`, returning the previous value if it was already bound.
    pub fn bind(&mut self, name: impl Into<Name>, value: i64) -> Option<i64> {
        self.bindings.insert(name.into(), value)
    }

    /// Builder-style [`bind`](Self::bind).
    #[must_use]
    pub fn with(mut self, name: impl Into<Name>, value: i64) -> Self {
        self.bind(name, value);
        self
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<i64> {
        self.bindings.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Bindings in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&Name, i64)> + '_ {
        self.bindings.iter().map(|(name, value)| (name, *value))
    }
}

impl<N: Into<Name>> FromIterator<(N, i64)> for Environment {
    fn from_iter<I: IntoIterator<Item = (N, i64)>>(iter: I) -> Self {
        let mut env = Environment::new();
        env.extend(iter);
        env
    }
}

impl<N: Into<Name>> Extend<(N, i64)> for Environment {
    fn extend<I: IntoIterator<Item = (N, i64)>>(&mut self, iter: I) {
        for (name, value) in iter {
            self.bind(name, value);
        }
    }
}
