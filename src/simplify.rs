//! Inprocessing simplification (§4.8): level-0 unit cleanup, subsumption and self-subsuming
//! resolution, and bounded variable elimination.
//!
//! All of this only runs at decision level 0. Every operation here may add or delete clauses and
//! must therefore be followed by a full rebuild of the propagator's watchlists before search
//! resumes; none of these functions touch watches themselves.

use crate::binary::{simplify_binary, BinaryClauses};
use crate::clause::{clause_abstraction, ClauseAlloc, ClauseDb, ClauseHeader, ClauseRef};
use crate::lit::{Lit, Var};
use crate::prop::{enqueue_assignment, Assignment, ImplGraph, Reason, Trail};
use crate::variables::Variables;

/// A single mutation of the clause set, for forwarding to proof generation.
///
/// Kept decoupled from `crate::proof::Proof` itself; the search driver translates these into
/// actual proof steps once a clause or unit is durably committed.
pub enum ProofRecord {
    AddClause(Vec<Lit>),
    DeleteClause(Vec<Lit>),
}

/// Drop clauses satisfied by the current (level-0) assignment and shrink clauses containing
/// falsified literals. Clauses shrunk to two literals are demoted into `BinaryClauses`; a clause
/// shrunk to the empty clause means the formula is unsatisfiable.
pub fn simplify_units(
    db: &mut ClauseDb,
    alloc: &mut ClauseAlloc,
    binary_clauses: &mut BinaryClauses,
    assignment: &mut Assignment,
    impl_graph: &mut ImplGraph,
    trail: &mut Trail,
    proof: &mut Vec<ProofRecord>,
) -> Result<(), ()> {
    simplify_binary(binary_clauses, assignment);

    let crefs: Vec<ClauseRef> = db.iter_live(alloc).collect();

    for cref in crefs {
        let lits = alloc.clause(cref).lits().to_vec();

        if lits.iter().any(|&l| assignment.lit_is_true(l)) {
            proof.push(ProofRecord::DeleteClause(lits));
            db.delete_clause(alloc, cref);
            continue;
        }

        if !lits.iter().any(|&l| assignment.lit_is_false(l)) {
            continue;
        }

        let shrunk: Vec<Lit> = lits
            .iter()
            .copied()
            .filter(|&l| !assignment.lit_is_false(l))
            .collect();

        proof.push(ProofRecord::DeleteClause(lits));

        match shrunk.len() {
            0 => return Err(()),
            1 => {
                proof.push(ProofRecord::AddClause(shrunk.clone()));
                if assignment.lit_value(shrunk[0]).is_none() {
                    enqueue_assignment(assignment, impl_graph, trail, shrunk[0], Reason::Unit);
                }
                db.delete_clause(alloc, cref);
            }
            2 => {
                proof.push(ProofRecord::AddClause(shrunk.clone()));
                binary_clauses.add_binary_clause([shrunk[0], shrunk[1]]);
                db.delete_clause(alloc, cref);
            }
            _ => {
                proof.push(ProofRecord::AddClause(shrunk.clone()));
                let clause = alloc.clause_mut(cref);
                clause.set_lits(&shrunk);
                clause.header_mut().abstraction = clause_abstraction(&shrunk);
            }
        }
    }

    if db.should_compact() {
        db.compact(alloc);
    }

    Ok(())
}

/// Whether `c` (with abstraction `c_abs`) subsumes `o` (with abstraction `o_abs`), i.e. `c ⊆ o` as
/// literal sets. The abstraction check is a cheap Bloom-filter pre-test before the literal scan.
fn subsumes(c: &[Lit], c_abs: u64, o: &[Lit], o_abs: u64) -> bool {
    c.len() <= o.len() && c_abs & !o_abs == 0 && c.iter().all(|l| o.contains(l))
}

/// If exactly one literal of `c` has its negation in `o`, and every other literal of `c` is also in
/// `o`, return that literal. Resolving `c` and `o` on it yields a clause that's a subset of `o`
/// minus its negation, i.e. that literal is redundant in `o` (self-subsuming resolution).
fn self_subsuming_literal(c: &[Lit], o: &[Lit]) -> Option<Lit> {
    let mut flip = None;
    for &l in c {
        if o.contains(&l) {
            continue;
        }
        if o.contains(&!l) {
            if flip.is_some() {
                return None;
            }
            flip = Some(l);
        } else {
            return None;
        }
    }
    flip
}

/// Subsumption and self-subsuming resolution (§4.8.1) over long clauses.
///
/// Rebuilds its occurrence index from scratch on every call (§4.8.3's "rebuild at each
/// invocation" option) rather than maintaining one incrementally across the whole search.
/// Operates only on clauses stored in [`ClauseDb`] (length ≥ 3); binary clauses are already
/// minimal and can't be usefully subsumed by anything shorter, since unit-driven simplification is
/// handled separately by [`simplify_units`].
pub fn subsume_and_strengthen(
    db: &mut ClauseDb,
    alloc: &mut ClauseAlloc,
    binary_clauses: &mut BinaryClauses,
    assignment: &mut Assignment,
    impl_graph: &mut ImplGraph,
    trail: &mut Trail,
    var_count: usize,
    proof: &mut Vec<ProofRecord>,
) -> Result<(), ()> {
    let mut live: Vec<ClauseRef> = db.iter_live(alloc).collect();

    for &cref in &live {
        let abstraction = clause_abstraction(alloc.clause(cref).lits());
        alloc.header_mut(cref).abstraction = abstraction;
    }

    // Duplicate removal: sort by (size, abstraction) so identical clauses end up adjacent.
    live.sort_by_key(|&cref| {
        let clause = alloc.clause(cref);
        (clause.len(), clause.header().abstraction)
    });

    for pair in 0..live.len().saturating_sub(1) {
        let (a, b) = (live[pair], live[pair + 1]);
        if alloc.header(a).deleted() || alloc.header(b).deleted() {
            continue;
        }
        if alloc.clause(a).len() != alloc.clause(b).len()
            || alloc.header(a).abstraction != alloc.header(b).abstraction
        {
            continue;
        }
        let mut la = alloc.clause(a).lits().to_vec();
        let mut lb = alloc.clause(b).lits().to_vec();
        la.sort_by_key(|l| l.code());
        lb.sort_by_key(|l| l.code());
        if la != lb {
            continue;
        }
        let drop = if alloc.header(a).glue() <= alloc.header(b).glue() {
            b
        } else {
            a
        };
        proof.push(ProofRecord::DeleteClause(alloc.clause(drop).lits().to_vec()));
        db.delete_clause(alloc, drop);
    }

    let mut occ_by_var: Vec<Vec<ClauseRef>> = vec![vec![]; var_count];
    for &cref in &live {
        if alloc.header(cref).deleted() {
            continue;
        }
        for &l in alloc.clause(cref).lits() {
            occ_by_var[l.var().index()].push(cref);
        }
    }

    for &c in &live {
        if alloc.header(c).deleted() {
            continue;
        }
        let c_lits = alloc.clause(c).lits().to_vec();
        let c_abs = alloc.header(c).abstraction;

        let rarest_var = c_lits
            .iter()
            .map(|l| l.var())
            .min_by_key(|v| occ_by_var[v.index()].len())
            .expect("clauses are never empty");

        for o in occ_by_var[rarest_var.index()].clone() {
            if o == c || alloc.header(o).deleted() {
                continue;
            }
            let o_lits = alloc.clause(o).lits().to_vec();
            let o_abs = alloc.header(o).abstraction;

            if subsumes(&c_lits, c_abs, &o_lits, o_abs) {
                if alloc.header(c).learnt && !alloc.header(o).learnt {
                    alloc.header_mut(c).learnt = false;
                }
                proof.push(ProofRecord::DeleteClause(o_lits));
                db.delete_clause(alloc, o);
                continue;
            }

            if let Some(flip) = self_subsuming_literal(&c_lits, &o_lits) {
                let strengthened: Vec<Lit> =
                    o_lits.iter().copied().filter(|&l| l != !flip).collect();

                proof.push(ProofRecord::DeleteClause(o_lits));

                match strengthened.len() {
                    0 => return Err(()),
                    1 => {
                        proof.push(ProofRecord::AddClause(strengthened.clone()));
                        if assignment.lit_value(strengthened[0]).is_none() {
                            enqueue_assignment(
                                assignment,
                                impl_graph,
                                trail,
                                strengthened[0],
                                Reason::Unit,
                            );
                        }
                        db.delete_clause(alloc, o);
                    }
                    2 => {
                        proof.push(ProofRecord::AddClause(strengthened.clone()));
                        binary_clauses.add_binary_clause([strengthened[0], strengthened[1]]);
                        db.delete_clause(alloc, o);
                    }
                    _ => {
                        proof.push(ProofRecord::AddClause(strengthened.clone()));
                        let clause = alloc.clause_mut(o);
                        clause.set_lits(&strengthened);
                        clause.header_mut().abstraction = clause_abstraction(&strengthened);
                    }
                }
            }
        }
    }

    if db.should_compact() {
        db.compact(alloc);
    }

    Ok(())
}

/// A clause occurrence, uniform across long and binary clauses, used by bounded variable
/// elimination so it can resolve a variable's long and binary occurrences together.
#[derive(Clone, Copy)]
enum Occ {
    Long(ClauseRef),
    Binary(Lit, Lit),
}

impl Occ {
    fn glue(self, alloc: &ClauseAlloc) -> usize {
        match self {
            Occ::Long(cref) => alloc.header(cref).glue(),
            Occ::Binary(..) => 0,
        }
    }

    fn lits(self, alloc: &ClauseAlloc) -> Vec<Lit> {
        match self {
            Occ::Long(cref) => alloc.clause(cref).lits().to_vec(),
            Occ::Binary(a, b) => vec![a, b],
        }
    }

    fn remove(
        self,
        db: &mut ClauseDb,
        alloc: &mut ClauseAlloc,
        binary_clauses: &mut BinaryClauses,
        proof: &mut Vec<ProofRecord>,
    ) {
        match self {
            Occ::Long(cref) => {
                if !alloc.header(cref).deleted() {
                    proof.push(ProofRecord::DeleteClause(alloc.clause(cref).lits().to_vec()));
                    db.delete_clause(alloc, cref);
                }
            }
            Occ::Binary(a, b) => {
                proof.push(ProofRecord::DeleteClause(vec![a, b]));
                binary_clauses.remove_binary_clause([a, b]);
            }
        }
    }
}

/// Every occurrence of `lit` (i.e. every clause, long or binary, containing `lit`).
///
/// `implied(!lit)` holds exactly the binary clauses' other literal for clauses containing `lit`,
/// see [`crate::binary::BinaryClauses::add_binary_clause`].
fn occurrences_of(db: &ClauseDb, alloc: &ClauseAlloc, binary_clauses: &BinaryClauses, lit: Lit) -> Vec<Occ> {
    let mut out: Vec<Occ> = db
        .iter_live(alloc)
        .filter(|&cref| alloc.clause(cref).lits().contains(&lit))
        .map(Occ::Long)
        .collect();
    out.extend(binary_clauses.implied(!lit).iter().map(|&other| Occ::Binary(lit, other)));
    out
}

/// Archive of clauses removed by bounded variable elimination, keyed by the eliminated variable,
/// kept in elimination order so a model can be extended by walking it in reverse (§4.8.2).
#[derive(Default)]
pub struct EliminatedClauses {
    archive: Vec<Vec<Vec<Lit>>>,
    order: Vec<Var>,
}

impl EliminatedClauses {
    pub fn set_var_count(&mut self, count: usize) {
        self.archive.resize(count, vec![]);
    }

    fn record(&mut self, var: Var, clauses: Vec<Vec<Lit>>) {
        self.archive[var.index()] = clauses;
        self.order.push(var);
    }

    pub fn is_eliminated(&self, var: Var) -> bool {
        !self.archive[var.index()].is_empty()
    }

    /// Take back a variable's archived clauses (e.g. to restore it for a later `solve` whose
    /// assumptions freeze it). The variable is no longer considered eliminated afterwards.
    pub fn restore(&mut self, var: Var) -> Vec<Vec<Lit>> {
        self.order.retain(|&v| v != var);
        std::mem::take(&mut self.archive[var.index()])
    }

    /// Extend a full assignment of the remaining variables with values for every eliminated
    /// variable, walking eliminated variables in reverse elimination order so that each one's
    /// archived clauses only ever reference already-decided variables.
    pub fn extend_model(&self, assignment: &mut Assignment) {
        for &var in self.order.iter().rev() {
            let mut satisfying_lit = None;
            for clause in &self.archive[var.index()] {
                let satisfied = clause
                    .iter()
                    .any(|&l| l.var() != var && assignment.lit_is_true(l));
                if !satisfied {
                    satisfying_lit = clause.iter().copied().find(|l| l.var() == var);
                }
            }
            let value = satisfying_lit.map_or(true, |l| l.is_positive());
            assignment.assign_lit(Lit::from_var(var, !value));
        }
    }
}

/// Restore a previously eliminated variable: its archived clauses are re-added to the clause set
/// and it becomes a decision variable again. Used when a later `solve` call freezes a variable
/// that a prior inprocessing pass had eliminated (§4.8.2, "Assumption handling").
pub fn restore_variable(
    db: &mut ClauseDb,
    alloc: &mut ClauseAlloc,
    binary_clauses: &mut BinaryClauses,
    variables: &mut Variables,
    eliminated: &mut EliminatedClauses,
    var: Var,
) {
    for lits in eliminated.restore(var) {
        match lits.len() {
            2 => binary_clauses.add_binary_clause([lits[0], lits[1]]),
            _ => {
                let mut header = ClauseHeader::new();
                header.abstraction = clause_abstraction(&lits);
                db.add_clause(alloc, header, &lits);
            }
        }
    }
    variables.set_eliminated(var, false);
}

/// Bounded variable elimination (§4.8.2).
///
/// Eliminates non-frozen, unassigned variables in descending order of occurrence count, as long as
/// doing so doesn't blow up the clause set: every resolvent must stay within `clause_lim` literals
/// and an eliminated variable's resolvents may not outnumber the clauses it replaces.
pub fn eliminate_variables(
    db: &mut ClauseDb,
    alloc: &mut ClauseAlloc,
    binary_clauses: &mut BinaryClauses,
    variables: &mut Variables,
    eliminated: &mut EliminatedClauses,
    assignment: &mut Assignment,
    impl_graph: &mut ImplGraph,
    trail: &mut Trail,
    clause_lim: usize,
    proof: &mut Vec<ProofRecord>,
) -> Result<(), ()> {
    let var_count = variables.count();

    let mut occurrence_count = vec![0usize; var_count];
    for cref in db.iter_live(alloc) {
        for &l in alloc.clause(cref).lits() {
            occurrence_count[l.var().index()] += 1;
        }
    }
    for var in variables.iter() {
        let pos = Lit::from_var(var, false);
        let neg = Lit::from_var(var, true);
        occurrence_count[var.index()] += binary_clauses.implied(pos).len();
        occurrence_count[var.index()] += binary_clauses.implied(neg).len();
    }

    let mut candidates: Vec<Var> = variables
        .iter()
        .filter(|&v| {
            !variables.is_frozen(v) && !variables.is_eliminated(v) && assignment.var_value(v).is_none()
        })
        .collect();
    candidates.sort_by_key(|&v| std::cmp::Reverse(occurrence_count[v.index()]));

    for v in candidates {
        if variables.is_frozen(v) || variables.is_eliminated(v) || assignment.var_value(v).is_some() {
            continue;
        }

        let pos_lit = Lit::from_var(v, false);
        let neg_lit = Lit::from_var(v, true);

        let pos = occurrences_of(db, alloc, binary_clauses, pos_lit);
        let neg = occurrences_of(db, alloc, binary_clauses, neg_lit);

        if pos.is_empty() && neg.is_empty() {
            continue;
        }

        let mut resolvents: Vec<(Vec<Lit>, usize)> = vec![];
        let mut rejected = false;

        'resolve: for &p in &pos {
            let p_lits = p.lits(alloc);
            for &n in &neg {
                let n_lits = n.lits(alloc);

                let mut resolvent: Vec<Lit> =
                    p_lits.iter().copied().filter(|&l| l != pos_lit).collect();
                let mut tautological = false;

                for &l in n_lits.iter().filter(|&&l| l != neg_lit) {
                    if resolvent.contains(&!l) {
                        tautological = true;
                        break;
                    }
                    if !resolvent.contains(&l) {
                        resolvent.push(l);
                    }
                }

                if tautological {
                    continue;
                }
                if resolvent.len() > clause_lim {
                    rejected = true;
                    break 'resolve;
                }

                let parent_glue = p.glue(alloc).min(n.glue(alloc));
                resolvents.push((resolvent, parent_glue));
            }
        }

        if rejected || resolvents.len() > pos.len() + neg.len() {
            continue;
        }

        let mut archive = vec![];
        for &p in &pos {
            archive.push(p.lits(alloc));
        }
        for &n in &neg {
            archive.push(n.lits(alloc));
        }

        for p in pos {
            p.remove(db, alloc, binary_clauses, proof);
        }
        for n in neg {
            n.remove(db, alloc, binary_clauses, proof);
        }

        for (resolvent, parent_glue) in resolvents {
            proof.push(ProofRecord::AddClause(resolvent.clone()));
            match resolvent.len() {
                0 => return Err(()),
                1 => {
                    if assignment.lit_value(resolvent[0]).is_none() {
                        enqueue_assignment(assignment, impl_graph, trail, resolvent[0], Reason::Unit);
                    }
                }
                2 => binary_clauses.add_binary_clause([resolvent[0], resolvent[1]]),
                n => {
                    let glue = parent_glue.min(n - 1);
                    let mut header = ClauseHeader::new();
                    header.set_glue(glue);
                    header.abstraction = clause_abstraction(&resolvent);
                    db.add_clause(alloc, header, &resolvent);
                }
            }
        }

        variables.set_eliminated(v, true);
        eliminated.record(v, archive);
    }

    if db.should_compact() {
        db.compact(alloc);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lit::Var;

    fn lit(v: i32) -> Lit {
        let var = Var::from_index((v.abs() - 1) as usize);
        Lit::from_var(var, v < 0)
    }

    #[test]
    fn units_drop_satisfied_and_shrink_falsified() {
        let mut db = ClauseDb::default();
        let mut alloc = ClauseAlloc::new();
        let mut binary_clauses = BinaryClauses::default();
        let mut assignment = Assignment::default();
        let mut impl_graph = ImplGraph::default();
        let mut trail = Trail::default();
        let mut proof = vec![];

        assignment.set_var_count(4);
        impl_graph.set_var_count(4);
        binary_clauses.set_var_count(4);

        db.add_clause(&mut alloc, ClauseHeader::new(), &[lit(1), lit(2), lit(3)]);
        db.add_clause(&mut alloc, ClauseHeader::new(), &[!lit(1), lit(2), lit(4)]);

        enqueue_assignment(&mut assignment, &mut impl_graph, &mut trail, lit(1), Reason::Unit);

        simplify_units(
            &mut db,
            &mut alloc,
            &mut binary_clauses,
            &mut assignment,
            &mut impl_graph,
            &mut trail,
            &mut proof,
        )
        .unwrap();

        // (1, 2, 3) is satisfied by lit(1) and gone; (-1, 2, 4) shrinks to the binary (2, 4).
        assert_eq!(db.live_count(), 0);
        assert_eq!(binary_clauses.count(), 1);
    }

    #[test]
    fn subsumption_deletes_the_subsumed_clause() {
        let mut db = ClauseDb::default();
        let mut alloc = ClauseAlloc::new();
        let mut binary_clauses = BinaryClauses::default();
        let mut assignment = Assignment::default();
        let mut impl_graph = ImplGraph::default();
        let mut trail = Trail::default();
        let mut proof = vec![];

        assignment.set_var_count(4);
        impl_graph.set_var_count(4);

        db.add_clause(&mut alloc, ClauseHeader::new(), &[lit(1), lit(2), lit(3)]);
        db.add_clause(&mut alloc, ClauseHeader::new(), &[lit(1), lit(2), lit(3), lit(4)]);

        subsume_and_strengthen(
            &mut db,
            &mut alloc,
            &mut binary_clauses,
            &mut assignment,
            &mut impl_graph,
            &mut trail,
            4,
            &mut proof,
        )
        .unwrap();

        assert_eq!(db.live_count(), 1);
    }

    #[test]
    fn self_subsuming_resolution_strengthens() {
        let mut db = ClauseDb::default();
        let mut alloc = ClauseAlloc::new();
        let mut binary_clauses = BinaryClauses::default();
        let mut assignment = Assignment::default();
        let mut impl_graph = ImplGraph::default();
        let mut trail = Trail::default();
        let mut proof = vec![];

        assignment.set_var_count(4);
        impl_graph.set_var_count(4);

        // (1, 2, 3) and (-1, 2, 3, 4) resolve on var 1; the second clause strengthens to (2, 3, 4).
        db.add_clause(&mut alloc, ClauseHeader::new(), &[lit(1), lit(2), lit(3)]);
        let o = db.add_clause(
            &mut alloc,
            ClauseHeader::new(),
            &[!lit(1), lit(2), lit(3), lit(4)],
        );

        subsume_and_strengthen(
            &mut db,
            &mut alloc,
            &mut binary_clauses,
            &mut assignment,
            &mut impl_graph,
            &mut trail,
            4,
            &mut proof,
        )
        .unwrap();

        assert_eq!(alloc.clause(o).lits(), &[lit(2), lit(3), lit(4)]);
    }

    #[test]
    fn eliminated_variable_is_restored_and_model_extended() {
        let mut db = ClauseDb::default();
        let mut alloc = ClauseAlloc::new();
        let mut binary_clauses = BinaryClauses::default();
        let mut variables = Variables::default();
        let mut eliminated = EliminatedClauses::default();
        let mut assignment = Assignment::default();
        let mut impl_graph = ImplGraph::default();
        let mut trail = Trail::default();
        let mut proof = vec![];

        variables.set_var_count(3);
        assignment.set_var_count(3);
        impl_graph.set_var_count(3);
        eliminated.set_var_count(3);

        let v2 = Var::from_index(1);

        db.add_clause(&mut alloc, ClauseHeader::new(), &[lit(1), lit(2), lit(3)]);
        db.add_clause(&mut alloc, ClauseHeader::new(), &[!lit(2), lit(1), lit(3)]);

        eliminate_variables(
            &mut db,
            &mut alloc,
            &mut binary_clauses,
            &mut variables,
            &mut eliminated,
            &mut assignment,
            &mut impl_graph,
            &mut trail,
            20,
            &mut proof,
        )
        .unwrap();

        assert!(variables.is_eliminated(v2));
        assert!(eliminated.is_eliminated(v2));

        // Assigning the remaining variables false forces the archived clauses to need var 2 true.
        assignment.assign_lit(!lit(1));
        assignment.assign_lit(!lit(3));
        eliminated.extend_model(&mut assignment);
        assert_eq!(assignment.var_value(v2), Some(true));

        restore_variable(
            &mut db,
            &mut alloc,
            &mut binary_clauses,
            &mut variables,
            &mut eliminated,
            v2,
        );
        assert!(!variables.is_eliminated(v2));
        assert!(db.live_count() > 0 || binary_clauses.count() > 0);
    }
}
