//! Invariant checking for the description registries.
//!
//! Descriptions are mutated by the adaptor and by every pipeline during the
//! request phase; the checks here verify that the ordered registries and
//! their name indices still agree afterwards.

use crate::coproc_error::CoProcessingError;
use std::collections::HashSet;
use std::hash::Hash;

/// Trait for validating data structure invariants.
pub trait DebugInvariants {
    /// Assert invariants in debug builds or when `check-invariants` is enabled.
    fn debug_assert_invariants(&self);
    /// Validate invariants and return the first error encountered.
    fn validate_invariants(&self) -> Result<(), CoProcessingError>;
}

/// Return the first key that occurs twice, if any.
pub(crate) fn first_duplicate<K, I>(keys: I) -> Option<K>
where
    K: Eq + Hash + Clone,
    I: IntoIterator<Item = K>,
{
    let mut seen = HashSet::new();
    keys.into_iter().find(|k| !seen.insert(k.clone()))
}

/// Run a fallible check and panic with context when invariant checking is on.
#[macro_export]
macro_rules! debug_invariants {
    ($expr:expr, $($ctx:tt)*) => {
        #[cfg(any(debug_assertions, feature = "check-invariants"))]
        if let Err(e) = $expr {
            panic!(concat!("[invariants] ", $($ctx)*, ": {}"), e);
        }
    };
}
