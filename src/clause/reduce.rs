//! ReduceDB: periodic reclamation of learned clauses.
//!
//! Every learned clause starts with a usage counter (see
//! [`super::assess::assess_learned_clause`]). Each time a clause is used as a reason during
//! conflict analysis its counter is decremented; once it reaches zero the clause becomes a
//! candidate for removal, unless its glue (LBD) is at or below the persistent threshold, in which
//! case it is never reclaimed regardless of usage. A growing threshold on the conflict count
//! decides how often a reduction pass runs, mirroring a "reduce less often as search goes on"
//! schedule.
use super::{ClauseAlloc, ClauseDb};

/// Scheduling and threshold state for clause database reduction.
pub struct ReduceDb {
    persistent_lbd: u32,
    volatile_lbd: u32,
    conflicts_at_last_reduce: u64,
    threshold: u64,
    increment: u64,
}

impl ReduceDb {
    pub fn new(persistent_lbd: u32, volatile_lbd: u32, first_threshold: u64, increment: u64) -> ReduceDb {
        ReduceDb {
            persistent_lbd,
            volatile_lbd,
            conflicts_at_last_reduce: 0,
            threshold: first_threshold,
            increment,
        }
    }

    /// Whether enough conflicts have elapsed to run another reduction pass.
    pub fn should_reduce(&self, conflicts: u64) -> bool {
        conflicts - self.conflicts_at_last_reduce >= self.threshold
    }

    /// Called whenever a learned clause is used as a reason during conflict analysis.
    ///
    /// Decrements the clause's usage counter, with a floor at zero. Clauses at or below the
    /// persistent LBD threshold are exempt, as they're never reclaimed anyway.
    pub fn note_used(&self, alloc: &mut ClauseAlloc, cref: super::ClauseRef) {
        let header = alloc.header_mut(cref);
        if header.glue <= self.persistent_lbd {
            return;
        }
        if header.usage > 0 {
            header.usage -= 1;
        }
    }

    /// Run a reduction pass, deleting eligible learned clauses.
    ///
    /// A learned clause is eligible once its usage counter has reached zero and its glue is at or
    /// above the volatile threshold; clauses at or below the persistent threshold are always
    /// kept. Returns the number of clauses deleted.
    pub fn reduce(&mut self, conflicts: u64, db: &mut ClauseDb, alloc: &mut ClauseAlloc) -> usize {
        let mut deleted = 0;
        for cref in db.iter_live(alloc).collect::<Vec<_>>() {
            let header = alloc.header(cref);
            if !header.learnt {
                continue;
            }
            if header.glue <= self.persistent_lbd {
                continue;
            }
            if header.usage == 0 && header.glue >= self.volatile_lbd {
                db.delete_clause(alloc, cref);
                deleted += 1;
            }
        }

        if db.should_compact() {
            db.compact(alloc);
        }

        self.conflicts_at_last_reduce = conflicts;
        self.threshold += self.increment;
        deleted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clause::ClauseHeader;
    use crate::cnf::strategy::*;

    #[test]
    fn reduces_only_unused_non_persistent_clauses() {
        let mut alloc = ClauseAlloc::new();
        let mut db = ClauseDb::default();
        let mut reduce = ReduceDb::new(2, 5, 0, 100);

        let clauses = cnf_formula![
            1, 2, 3;
            4, -5, 6;
            -2, 3, -4;
        ];

        let mut crefs = vec![];
        for (i, lits) in clauses.iter().enumerate() {
            let mut header = ClauseHeader::new();
            header.learnt = true;
            // first clause: persistent (glue 1), second: volatile but still "used", third:
            // volatile and unused.
            header.glue = match i {
                0 => 1,
                1 => 6,
                _ => 6,
            };
            header.usage = if i == 1 { 1 } else { 0 };
            crefs.push(db.add_clause(&mut alloc, header, lits));
        }

        let deleted = reduce.reduce(0, &mut db, &mut alloc);
        assert_eq!(deleted, 1);
        assert!(!alloc.header(crefs[0]).deleted());
        assert!(!alloc.header(crefs[1]).deleted());
        assert!(alloc.header(crefs[2]).deleted());
    }
}
