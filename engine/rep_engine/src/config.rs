//! Copy configuration.

/// Identities tracked before a session switches to iterative mode.
pub const DEFAULT_ITERATIVE_THRESHOLD: usize = 1000;

/// Largest tuple rebuilt directly from its slots.
pub const DEFAULT_MAX_DIRECT_TUPLE_ARITY: usize = 9;

/// Tuning knobs for a [`Replicator`](crate::Replicator).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CopyConfig {
    /// Once a session has tracked this many identities it stops recursing
    /// and fills remaining objects from a work queue.
    pub iterative_threshold: usize,
    /// Tuples of at most this many slots, all of safe types, are rebuilt
    /// directly instead of slot by slot.
    pub max_direct_tuple_arity: usize,
}

impl Default for CopyConfig {
    fn default() -> Self {
        CopyConfig {
            iterative_threshold: DEFAULT_ITERATIVE_THRESHOLD,
            max_direct_tuple_arity: DEFAULT_MAX_DIRECT_TUPLE_ARITY,
        }
    }
}

impl CopyConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Never escalate. Depth is still protected by stack growth.
    pub fn recursive_only() -> Self {
        CopyConfig {
            iterative_threshold: usize::MAX,
            ..Self::default()
        }
    }

    /// Queue-driven from the first object.
    pub fn always_iterative() -> Self {
        CopyConfig {
            iterative_threshold: 0,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_iterative_threshold(mut self, threshold: usize) -> Self {
        self.iterative_threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_max_direct_tuple_arity(mut self, arity: usize) -> Self {
        self.max_direct_tuple_arity = arity;
        self
    }
}
