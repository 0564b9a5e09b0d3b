//! Clause allocator.
use crate::lit::Lit;

use super::{Clause, ClauseHeader};

/// Storage for long (3+ literal) clauses.
///
/// Clauses are never moved or freed individually; [`ClauseRef`] is a stable index into an
/// append-only `Vec`. Deleted clauses keep their slot until [`super::ClauseDb::compact`] rewrites
/// the database's own bookkeeping, at which point the slots of dropped clauses simply become
/// unreachable garbage for the allocator to free as a whole. Binary and unit clauses are never
/// stored here, see [`crate::binary::BinaryClauses`] and the trail's level-0 facts.
#[derive(Default)]
pub struct ClauseAlloc {
    clauses: Vec<Clause>,
}

impl ClauseAlloc {
    /// Create an empty clause allocator.
    pub fn new() -> ClauseAlloc {
        ClauseAlloc::default()
    }

    /// Create a clause allocator with preallocated capacity.
    pub fn with_capacity(capacity: usize) -> ClauseAlloc {
        ClauseAlloc {
            clauses: Vec::with_capacity(capacity),
        }
    }

    /// Allocate space for and add a new clause.
    ///
    /// Clauses have a minimal size of 3, as binary and unit clauses are handled separately.
    pub fn add_clause(&mut self, header: ClauseHeader, lits: &[Lit]) -> ClauseRef {
        assert!(
            lits.len() >= 3,
            "ClauseAlloc can only store ternary and larger clauses"
        );

        let index = self.clauses.len();
        assert!(
            index <= (u32::max_value() as usize),
            "Exceeded ClauseAlloc's maximal clause count"
        );

        self.clauses.push(Clause {
            header,
            lits: lits.to_vec().into_boxed_slice(),
        });

        ClauseRef(index as u32)
    }

    /// Access the header of a clause.
    pub fn header(&self, cref: ClauseRef) -> &ClauseHeader {
        self.clause(cref).header()
    }

    /// Mutate the header of a clause.
    pub fn header_mut(&mut self, cref: ClauseRef) -> &mut ClauseHeader {
        self.clause_mut(cref).header_mut()
    }

    /// Access a clause.
    pub fn clause(&self, cref: ClauseRef) -> &Clause {
        &self.clauses[cref.0 as usize]
    }

    /// Mutate a clause.
    pub fn clause_mut(&mut self, cref: ClauseRef) -> &mut Clause {
        &mut self.clauses[cref.0 as usize]
    }

    /// Number of clause slots, including deleted ones not yet compacted away.
    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    /// Total literal count across all live (non-deleted) clauses, used to decide when a
    /// [`super::ClauseDb::compact`] pass is worthwhile.
    pub fn live_literal_count(&self) -> usize {
        self.clauses
            .iter()
            .filter(|clause| !clause.header().deleted())
            .map(Clause::len)
            .sum()
    }

    /// Total literal count across all clauses, live or deleted.
    pub fn total_literal_count(&self) -> usize {
        self.clauses.iter().map(Clause::len).sum()
    }
}

/// Reference to a clause stored in a [`ClauseAlloc`].
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub struct ClauseRef(u32);

impl ClauseRef {
    /// Dense index usable to index parallel per-clause side tables (e.g. the lower-bound
    /// propagator's occurrence lists).
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::cnf::{strategy::*, CnfFormula};

    use proptest::*;

    proptest! {
        #[test]
        fn roundtrip_from_cnf_formula(input in cnf_formula(1..100usize, 0..1000, 3..30)) {

            let mut clause_alloc = ClauseAlloc::new();
            let mut clause_refs = vec![];

            for clause_lits in input.iter() {
                let header = ClauseHeader::new();
                clause_refs.push(clause_alloc.add_clause(header, clause_lits));
            }

            let mut recovered = CnfFormula::new();

            for cref in clause_refs {
                let clause = clause_alloc.clause(cref);
                prop_assert_eq!(clause.lits().len(), clause.len());
                recovered.add_clause(clause.lits());
            }

            // Ignore difference caused by unused vars
            recovered.set_var_count(input.var_count());

            prop_assert_eq!(input, recovered);
        }

        #[test]
        fn clause_mutation(input in cnf_formula(1..100usize, 0..1000, 3..30)) {

            let mut clause_alloc = ClauseAlloc::new();
            let mut clause_refs = vec![];

            for clause_lits in input.iter() {
                let header = ClauseHeader::new();
                clause_refs.push(clause_alloc.add_clause(header, clause_lits));
            }

            for &cref in clause_refs.iter() {
                let clause = clause_alloc.clause_mut(cref);
                clause.lits_mut().reverse();
            }

            for (&cref, lits) in clause_refs.iter().zip(input.iter()) {
                let expected: Vec<_> = lits.iter().rev().collect();
                let actual: Vec<_> = clause_alloc.clause(cref).lits().iter().collect();
                prop_assert_eq!(actual, expected);
            }
        }
    }
}
