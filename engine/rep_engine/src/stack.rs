//! Native stack growth for recursive copies.
//!
//! Recursive mode follows the shape of the source graph, so a long chain
//! that stays under the iterative threshold (or a session configured to
//! never escalate) could still exhaust the thread's stack. Every nested
//! object copy runs through [`ensure_sufficient_stack`].
//!
//! - **Red zone**: 100KB. Below this much remaining stack, grow.
//! - **Growth size**: 1MB per new segment.

const RED_ZONE: usize = 100 * 1024;

const STACK_PER_SEGMENT: usize = 1024 * 1024;

/// Run `f`, first growing the stack if less than the red zone remains.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub(crate) fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_SEGMENT, f)
}

/// WASM manages its own stack.
#[inline]
#[cfg(target_arch = "wasm32")]
pub(crate) fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
