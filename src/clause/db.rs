//! Database for long clauses.
use super::{ClauseAlloc, ClauseHeader, ClauseRef};
use crate::lit::Lit;

/// Database for long (3+ literal) clauses.
///
/// Tracks which clauses are alive without owning their storage, which lives in a
/// [`ClauseAlloc`]. Deleted clauses are only marked in their header; [`ClauseDb::compact`] is the
/// only place that actually drops references to them, and it never touches the allocator's
/// storage itself.
#[derive(Default)]
pub struct ClauseDb {
    /// May contain deleted clauses, see above.
    clauses: Vec<ClauseRef>,
    /// Count of non-deleted clauses, kept in sync incrementally.
    live_count: usize,
}

impl ClauseDb {
    /// Add a long clause to the database.
    pub fn add_clause(
        &mut self,
        alloc: &mut ClauseAlloc,
        header: ClauseHeader,
        lits: &[Lit],
    ) -> ClauseRef {
        let cref = alloc.add_clause(header, lits);
        self.clauses.push(cref);
        self.live_count += 1;
        cref
    }

    /// Delete a long clause from the database.
    pub fn delete_clause(&mut self, alloc: &mut ClauseAlloc, cref: ClauseRef) {
        let header = alloc.header_mut(cref);
        debug_assert!(!header.deleted(), "delete_clause for already deleted clause");
        header.set_deleted(true);
        self.live_count -= 1;
    }

    /// Number of clauses not (yet) deleted.
    pub fn live_count(&self) -> usize {
        self.live_count
    }

    /// Iterate over all live clause references.
    pub fn iter_live<'a>(&'a self, alloc: &'a ClauseAlloc) -> impl Iterator<Item = ClauseRef> + 'a {
        self.clauses
            .iter()
            .copied()
            .filter(move |&cref| !alloc.header(cref).deleted())
    }

    /// Drop dead references from the database's own bookkeeping.
    ///
    /// This never shrinks the underlying [`ClauseAlloc`] buffer, it only shortens the index the
    /// database walks on every pass over "all clauses" (e.g. ReduceDB, subsumption). Worthwhile
    /// once a large enough fraction of tracked references point at deleted clauses.
    pub fn compact(&mut self, alloc: &ClauseAlloc) {
        self.clauses.retain(|&cref| !alloc.header(cref).deleted());
        debug_assert_eq!(self.clauses.len(), self.live_count);
    }

    /// Whether a compaction pass is likely worthwhile.
    pub fn should_compact(&self) -> bool {
        self.clauses.len() > self.live_count * 2 + 16
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cnf::strategy::*;
    use proptest::*;

    #[test]
    fn delete_and_compact() {
        let mut alloc = ClauseAlloc::new();
        let mut db = ClauseDb::default();

        let clauses = cnf_formula![
            1, 2, 3;
            4, -5, 6;
            -2, 3, -4;
        ];

        let mut crefs = vec![];
        for clause in clauses.iter() {
            let cref = db.add_clause(&mut alloc, ClauseHeader::new(), clause);
            crefs.push(cref);
        }

        assert_eq!(db.live_count(), 3);

        db.delete_clause(&mut alloc, crefs[1]);
        assert_eq!(db.live_count(), 2);
        assert_eq!(db.iter_live(&alloc).count(), 2);

        db.compact(&alloc);
        assert_eq!(db.iter_live(&alloc).count(), 2);
    }

    proptest! {
        #[test]
        fn compaction_preserves_live_clauses(
            input in cnf_formula(1..50usize, 0..200, 3..10),
        ) {
            let mut alloc = ClauseAlloc::new();
            let mut db = ClauseDb::default();

            let mut crefs = vec![];
            for lits in input.iter() {
                let cref = db.add_clause(&mut alloc, ClauseHeader::new(), lits);
                crefs.push(cref);
            }

            for (i, &cref) in crefs.iter().enumerate() {
                if i % 2 == 0 {
                    db.delete_clause(&mut alloc, cref);
                }
            }

            db.compact(&alloc);

            let remaining: Vec<_> = db.iter_live(&alloc).map(|cref| alloc.clause(cref).lits().to_vec()).collect();
            let expected: Vec<_> = input.iter().enumerate().filter(|(i, _)| i % 2 != 0).map(|(_, lits)| lits.to_vec()).collect();
            prop_assert_eq!(remaining, expected);
        }
    }
}
