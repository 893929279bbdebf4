// Model identity carried by every variable and expression

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_MODEL_ID: AtomicU64 = AtomicU64::new(1);

/// Identifier of one model instance.
///
/// Variables and expressions carry this instead of a reference to their model, so
/// cross-model checks are plain equality tests and never pin the model's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct ModelId(u64);

impl ModelId {
    /// Allocate an identifier that no other model in this process has used.
    pub fn fresh() -> Self {
        Self(NEXT_MODEL_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the inner u64 value.
    pub fn inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "model#{}", self.0)
    }
}
