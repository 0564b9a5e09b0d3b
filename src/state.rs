//! Miscellaneous solver state.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Outcome of a `solve` call.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum SatState {
    Unknown,
    Sat,
    Unsat,
    UnsatUnderAssumptions,
}

impl Default for SatState {
    fn default() -> SatState {
        SatState::Unknown
    }
}

/// Cooperative cancellation flag.
///
/// This is the single cross-thread word the search driver polls between conflicts. Setting it
/// from another thread is the only supported way to interrupt a running `solve`.
#[derive(Clone, Default)]
pub struct Interrupt(Arc<AtomicBool>);

impl Interrupt {
    pub fn new() -> Interrupt {
        Interrupt(Arc::new(AtomicBool::new(false)))
    }

    /// Request that the current (or next) `solve` call stop at the next conflict boundary.
    pub fn set(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Clear the flag so a subsequent `solve` is not immediately interrupted.
    pub fn clear(&self) {
        self.0.store(false, Ordering::Relaxed);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Per-solve budgets.
///
/// A budget of `None` means unlimited. Budgets are counted down during the current `solve` call
/// and reset at the start of every `solve`.
#[derive(Default)]
pub struct Budget {
    pub conflict_budget: Option<u64>,
    pub propagation_budget: Option<u64>,
    conflicts_used: u64,
    propagations_used: u64,
}

impl Budget {
    pub fn reset_usage(&mut self) {
        self.conflicts_used = 0;
        self.propagations_used = 0;
    }

    pub fn record_conflict(&mut self) {
        self.conflicts_used += 1;
    }

    pub fn record_propagation(&mut self) {
        self.propagations_used += 1;
    }

    pub fn record_propagations(&mut self, count: u64) {
        self.propagations_used += count;
    }

    /// Conflicts seen so far in the current `solve` call, for [`crate::clause::ReduceDb`]'s
    /// scheduling.
    pub fn conflicts_used(&self) -> u64 {
        self.conflicts_used
    }

    pub fn exhausted(&self) -> bool {
        self.conflict_budget
            .map_or(false, |budget| self.conflicts_used >= budget)
            || self
                .propagation_budget
                .map_or(false, |budget| self.propagations_used >= budget)
    }
}

/// Miscellaneous solver state.
///
/// Anything larger or any larger group of related state variables should be moved into a separate
/// part of [`Context`](crate::context::Context).
#[derive(Default)]
pub struct SolverState {
    pub sat_state: SatState,
    pub interrupt: Interrupt,
    pub budget: Budget,
}
