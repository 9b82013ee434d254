//! Native stack headroom for the recursive walkers.
//!
//! Evaluating one Lox call nests several Rust frames (`call_value` →
//! `LoxFunction::call` → `execute_block` → `execute` → `evaluate` …), so a
//! modest Lox recursion depth can exhaust a thread's stack.  Recursive entry
//! points run through [`ensure_sufficient_stack`], which switches to a freshly
//! allocated segment once the remaining stack drops below the red zone.

/// Grow when less than this much stack is left.
const RED_ZONE: usize = 128 * 1024;

/// Size of each newly allocated stack segment.
const STACK_PER_RECURSION: usize = 1024 * 1024;

#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn depth(n: u64) -> u64 {
        ensure_sufficient_stack(|| if n == 0 { 0 } else { 1 + depth(n - 1) })
    }

    #[test]
    fn deep_recursion_does_not_overflow() {
        assert_eq!(depth(200_000), 200_000);
    }
}
