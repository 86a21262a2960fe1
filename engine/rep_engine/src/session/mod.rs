//! Per-copy reference tracking.
//!
//! A [`CopySession`] maps source objects to their copies so shared and
//! cyclic references come out shared and cyclic. It lives for exactly one
//! top-level copy call and is never shared between threads.
//!
//! # Design
//!
//! - The first [`INLINE_SLOTS`] identities sit in a fixed array: small
//!   graphs never hash
//! - Later identities go into a map keyed by object address; the entry keeps
//!   the source alive so the address cannot be reused mid-copy
//! - After `threshold` identities the session turns iterative for good:
//!   new objects are shallow-copied, registered and queued, and the caller
//!   fills them from the queue instead of recursing

use std::collections::VecDeque;

use rep_value::ObjRef;
use rustc_hash::FxHashMap;

/// Identities stored without hashing.
pub const INLINE_SLOTS: usize = 3;

/// Identity map plus the deferred fill queue of one copy operation.
#[derive(Debug)]
pub struct CopySession {
    inline: [Option<(ObjRef, ObjRef)>; INLINE_SLOTS],
    overflow: FxHashMap<usize, (ObjRef, ObjRef)>,
    tracked: usize,
    threshold: usize,
    iterative: bool,
    pending: VecDeque<(ObjRef, ObjRef)>,
}

impl CopySession {
    /// Create a session that escalates after `threshold` identities.
    pub fn new(threshold: usize) -> Self {
        CopySession {
            inline: std::array::from_fn(|_| None),
            overflow: FxHashMap::default(),
            tracked: 0,
            threshold,
            iterative: threshold == 0,
            pending: VecDeque::new(),
        }
    }

    /// Record that `source` was copied to `dest`.
    pub fn add_known(&mut self, source: &ObjRef, dest: &ObjRef) {
        let entry = (source.clone(), dest.clone());
        match self.inline.iter_mut().find(|slot| slot.is_none()) {
            Some(slot) => *slot = Some(entry),
            None => {
                self.overflow.insert(source.addr(), entry);
            }
        }

        self.tracked += 1;
        if !self.iterative && self.tracked >= self.threshold {
            self.iterative = true;
            tracing::debug!(tracked = self.tracked, "copy session switched to iterative mode");
        }
    }

    /// The copy already made for `source`, if any.
    pub fn get_known(&self, source: &ObjRef) -> Option<ObjRef> {
        for (known, dest) in self.inline.iter().flatten() {
            if known.ptr_eq(source) {
                return Some(dest.clone());
            }
        }
        self.overflow.get(&source.addr()).map(|(_, dest)| dest.clone())
    }

    #[inline]
    pub fn is_iterative(&self) -> bool {
        self.iterative
    }

    /// Number of identities recorded so far.
    #[inline]
    pub fn tracked(&self) -> usize {
        self.tracked
    }

    /// Queue a shallow copy whose fields still need filling.
    pub fn enqueue(&mut self, source: ObjRef, dest: ObjRef) {
        self.pending.push_back((source, dest));
    }

    pub fn next_pending(&mut self) -> Option<(ObjRef, ObjRef)> {
        self.pending.pop_front()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests;
