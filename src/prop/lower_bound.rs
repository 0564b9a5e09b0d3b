//! Lower-bound counting propagator.
//!
//! An alternative to the 2-watched-literal scheme (§4.3) with identical semantics but different
//! performance characteristics: instead of tracking two specific watched literals, every clause
//! keeps a counter `lb` of how many of its literals are not currently false, plus a cached
//! possibly-true "blocker" literal. A per-literal index maps a literal `p` to the clauses
//! containing `!p`; popping `p` decrements `lb` for each of those clauses. Once `lb` drops to one
//! or zero the blocker is checked; if it's no longer true the clause is rescanned to find a new
//! blocker (propagating a forced literal, or reporting a conflict, if none is found).
use crate::clause::{ClauseAlloc, ClauseDb, ClauseRef};
use crate::lit::Lit;

use super::{enqueue_assignment, Assignment, Conflict, ImplGraph, Reason, Trail};

/// Per-clause lower-bound counting state, alongside the per-literal occurrence index.
pub struct LowerBoundProp {
    /// `occur[lit.code()]` lists every clause containing `!lit`; popping `lit` makes one more
    /// literal of each of those clauses false.
    occur: Vec<Vec<ClauseRef>>,
    lb: Vec<u32>,
    blocker: Vec<Option<Lit>>,
}

impl LowerBoundProp {
    /// Build the propagator's side tables from the current clause database.
    pub fn build(db: &ClauseDb, alloc: &ClauseAlloc, var_count: usize) -> LowerBoundProp {
        let clause_count = alloc.len();
        let mut occur = vec![vec![]; var_count * 2];
        let mut lb = vec![0u32; clause_count];

        for cref in db.iter_live(alloc) {
            let lits = alloc.clause(cref).lits();
            lb[cref.index()] = lits.len() as u32;
            for &l in lits {
                occur[(!l).code()].push(cref);
            }
        }

        LowerBoundProp {
            occur,
            lb,
            blocker: vec![None; clause_count],
        }
    }

    /// Register a freshly added clause (e.g. a learned clause) with the propagator.
    pub fn add_clause(&mut self, cref: ClauseRef, lits: &[Lit]) {
        let index = cref.index();
        if self.lb.len() <= index {
            self.lb.resize(index + 1, 0);
            self.blocker.resize(index + 1, None);
        }
        self.lb[index] = lits.len() as u32;
        self.blocker[index] = None;
        for &l in lits {
            let code = (!l).code();
            if self.occur.len() <= code {
                self.occur.resize(code + 1, vec![]);
            }
            self.occur[code].push(cref);
        }
    }

    /// Propagate all literals implied by clauses containing `!lit`, following a just-popped `lit`.
    pub fn propagate(
        &mut self,
        assignment: &mut Assignment,
        impl_graph: &mut ImplGraph,
        trail: &mut Trail,
        alloc: &ClauseAlloc,
        lit: Lit,
    ) -> Result<(), Conflict> {
        let affected = self.occur[lit.code()].clone();

        for cref in affected {
            let index = cref.index();
            if self.lb[index] == 0 {
                continue; // already detected unsatisfiable/handled
            }
            self.lb[index] -= 1;

            if self.lb[index] > 1 {
                continue;
            }

            if let Some(blocker) = self.blocker[index] {
                if assignment.lit_is_true(blocker) {
                    continue;
                }
            }

            let header = alloc.header(cref);
            if header.deleted() {
                continue;
            }
            let clause_lits = alloc.clause(cref).lits();

            let mut non_false = vec![];
            let mut satisfied = false;
            for &l in clause_lits {
                if assignment.lit_is_true(l) {
                    satisfied = true;
                    non_false.push(l);
                } else if assignment.lit_is_unk(l) {
                    non_false.push(l);
                }
            }

            self.lb[index] = non_false.len() as u32;

            if satisfied {
                self.blocker[index] = non_false.iter().copied().find(|&l| assignment.lit_is_true(l));
                continue;
            }

            match non_false.len() {
                0 => return Err(Conflict::Long(cref)),
                1 => {
                    let unit = non_false[0];
                    self.blocker[index] = Some(unit);
                    enqueue_assignment(assignment, impl_graph, trail, unit, Reason::Long(cref));
                }
                _ => {
                    self.blocker[index] = Some(non_false[0]);
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clause::ClauseHeader;
    use crate::lit::Var;

    fn lit(v: i32) -> Lit {
        let var = Var::from_index((v.abs() - 1) as usize);
        Lit::from_var(var, v < 0)
    }

    #[test]
    fn propagates_last_literal() {
        let mut alloc = ClauseAlloc::new();
        let mut db = ClauseDb::default();
        let cref = db.add_clause(&mut alloc, ClauseHeader::new(), &[lit(1), lit(2), lit(3)]);

        let mut prop = LowerBoundProp::build(&db, &alloc, 3);

        let mut assignment = Assignment::default();
        assignment.set_var_count(3);
        let mut impl_graph = ImplGraph::default();
        impl_graph.set_var_count(3);
        let mut trail = Trail::default();

        assignment.assign_lit(!lit(1));
        prop.propagate(&mut assignment, &mut impl_graph, &mut trail, &alloc, !lit(1))
            .unwrap();

        assignment.assign_lit(!lit(2));
        prop.propagate(&mut assignment, &mut impl_graph, &mut trail, &alloc, !lit(2))
            .unwrap();

        assert!(assignment.lit_is_true(lit(3)));
        let _ = cref;
    }

    #[test]
    fn detects_conflict() {
        let mut alloc = ClauseAlloc::new();
        let mut db = ClauseDb::default();
        db.add_clause(&mut alloc, ClauseHeader::new(), &[lit(1), lit(2), lit(3)]);

        let mut prop = LowerBoundProp::build(&db, &alloc, 3);

        let mut assignment = Assignment::default();
        assignment.set_var_count(3);
        let mut impl_graph = ImplGraph::default();
        impl_graph.set_var_count(3);
        let mut trail = Trail::default();

        assignment.assign_lit(!lit(1));
        prop.propagate(&mut assignment, &mut impl_graph, &mut trail, &alloc, !lit(1))
            .unwrap();
        assignment.assign_lit(!lit(2));
        prop.propagate(&mut assignment, &mut impl_graph, &mut trail, &alloc, !lit(2))
            .unwrap();
        assignment.assign_lit(!lit(3));
        let result = prop.propagate(&mut assignment, &mut impl_graph, &mut trail, &alloc, !lit(3));
        assert!(result.is_err());
    }
}
