//! Top-level search driver (§4.9).
//!
//! Ties propagation, conflict analysis, branching, restarts, ReduceDB and inprocessing
//! simplification together into `solve`, the state machine a `Solver::solve` call runs.
use log::{debug, trace};

use crate::analyze_conflict::{analyze_conflict, analyze_final};
use crate::clause::{assess_learned_clause, bump_clause_activity, decay_clause_activities, ClauseHeader};
use crate::context::Context;
use crate::decision::make_decision;
use crate::lit::Lit;
use crate::prop::{backtrack, enqueue_assignment, propagate, Conflict, Reason};
use crate::proof::ProofStep;
use crate::simplify::{eliminate_variables, simplify_units, subsume_and_strengthen, ProofRecord};
use crate::state::SatState;

/// Outcome of a `solve` call.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SolveResult {
    Sat,
    Unsat,
    /// Unsatisfiable under the given assumptions; carries the subset of assumption literals whose
    /// joint enforcement is responsible.
    UnsatUnderAssumptions(Vec<Lit>),
    /// Search stopped early due to an exhausted budget or the cooperative interrupt flag.
    Unknown,
}

/// Run the search driver to completion (or until interrupted/budget-exhausted) under the given
/// assumptions.
pub fn solve(ctx: &mut Context, assumptions: &[Lit]) -> SolveResult {
    ctx.state.budget.reset_usage();
    ctx.state.interrupt.clear();
    ctx.state.sat_state = SatState::Unknown;

    if propagate_all(ctx).is_err() {
        ctx.state.sat_state = SatState::Unsat;
        return SolveResult::Unsat;
    }

    if run_inprocessing(ctx).is_err() {
        ctx.state.sat_state = SatState::Unsat;
        return SolveResult::Unsat;
    }

    loop {
        match propagate_all(ctx) {
            Err(conflict) => match handle_conflict(ctx, conflict) {
                ConflictOutcome::Continue => {
                    if ctx.state.interrupt.is_set() || ctx.state.budget.exhausted() {
                        return SolveResult::Unknown;
                    }
                }
                ConflictOutcome::Unsat => {
                    ctx.state.sat_state = SatState::Unsat;
                    return SolveResult::Unsat;
                }
            },
            Ok(()) => {
                if ctx.state.interrupt.is_set() || ctx.state.budget.exhausted() {
                    return SolveResult::Unknown;
                }

                if ctx.restart.should_restart() && ctx.trail.current_level() > assumptions.len() {
                    debug!("restart");
                    backtrack_to(ctx, assumptions.len());
                }

                if ctx.trail.current_level() == 0
                    && ctx.reduce_db.should_reduce(ctx.state.budget.conflicts_used())
                {
                    reduce_clause_db(ctx);
                }

                let pushed = ctx.trail.current_level();
                if pushed < assumptions.len() {
                    let a = assumptions[pushed];
                    ctx.trail.new_decision_level();
                    match ctx.assignment.lit_value(a) {
                        Some(true) => {}
                        Some(false) => {
                            let core = analyze_final(&ctx.impl_graph, &ctx.alloc, &ctx.assignment, a);
                            backtrack_to(ctx, 0);
                            ctx.state.sat_state = SatState::UnsatUnderAssumptions;
                            return SolveResult::UnsatUnderAssumptions(core);
                        }
                        None => {
                            enqueue_assignment(&mut ctx.assignment, &mut ctx.impl_graph, &mut ctx.trail, a, Reason::Unit);
                            ctx.branching.on_assigned(a.var());
                        }
                    }
                    continue;
                }

                if !make_decision(
                    &mut ctx.branching,
                    &ctx.polarity,
                    &ctx.variables,
                    &mut ctx.assignment,
                    &mut ctx.impl_graph,
                    &mut ctx.trail,
                ) {
                    ctx.eliminated.extend_model(&mut ctx.assignment);
                    ctx.state.sat_state = SatState::Sat;
                    return SolveResult::Sat;
                }
            }
        }
    }
}

enum ConflictOutcome {
    Continue,
    Unsat,
}

/// Analyse a conflict, learn and store the resulting clause, and backtrack to where it asserts.
fn handle_conflict(ctx: &mut Context, conflict: Conflict) -> ConflictOutcome {
    if ctx.trail.current_level() == 0 {
        return ConflictOutcome::Unsat;
    }

    let trail_size = ctx.trail.trail().len();

    let backtrack_level = analyze_conflict(
        &mut ctx.analyze,
        &mut ctx.branching,
        &ctx.alloc,
        &ctx.impl_graph,
        &ctx.trail,
        conflict,
    );

    let involved = ctx.analyze.involved().to_vec();
    for cref in involved {
        bump_clause_activity(&mut ctx.clause_activity, &ctx.db, &mut ctx.alloc, cref);
        ctx.reduce_db.note_used(&mut ctx.alloc, cref);
    }
    decay_clause_activities(&mut ctx.clause_activity, &ctx.db, &mut ctx.alloc);

    let learned = ctx.analyze.clause().to_vec();
    let header = assess_learned_clause(&mut ctx.tmp, &ctx.impl_graph, ctx.config.reduce_initial_usage, &learned);
    let glue = header.glue();

    ctx.proof.add_step(ProofStep::AddClause(&learned));
    ctx.restart.process_conflict(glue, trail_size);
    ctx.state.budget.record_conflict();

    trace!("learned clause of size {} at backtrack level {}", learned.len(), backtrack_level);

    backtrack_to(ctx, backtrack_level);

    add_learned_clause(ctx, header, &learned);

    ConflictOutcome::Continue
}

/// Add a just-learned clause to the appropriate store and enqueue its asserting literal.
fn add_learned_clause(ctx: &mut Context, header: ClauseHeader, learned: &[Lit]) {
    match learned.len() {
        0 => unreachable!("conflict analysis at level 0 is handled before this point"),
        1 => {
            enqueue_assignment(&mut ctx.assignment, &mut ctx.impl_graph, &mut ctx.trail, learned[0], Reason::Unit);
        }
        2 => {
            ctx.binary_clauses.add_binary_clause([learned[0], learned[1]]);
            enqueue_assignment(
                &mut ctx.assignment,
                &mut ctx.impl_graph,
                &mut ctx.trail,
                learned[0],
                Reason::Binary([learned[1]]),
            );
        }
        _ => {
            let cref = ctx.db.add_clause(&mut ctx.alloc, header, learned);
            ctx.watchlists.watch_clause(cref, [learned[0], learned[1]]);
            enqueue_assignment(
                &mut ctx.assignment,
                &mut ctx.impl_graph,
                &mut ctx.trail,
                learned[0],
                Reason::Long(cref),
            );
        }
    }
}

/// Backtrack to the given decision level, saving the phase of every undone variable and notifying
/// the branching heuristic.
fn backtrack_to(ctx: &mut Context, level: usize) {
    let undone_start = ctx.trail.level_trail_len(level);
    let undone: Vec<Lit> = ctx.trail.trail()[undone_start..].to_vec();

    let branching = &mut ctx.branching;
    backtrack(&mut ctx.assignment, &mut ctx.trail, level, |var| {
        branching.on_unassigned(var);
    });

    for lit in undone {
        ctx.polarity.save(lit.var(), lit.is_positive());
    }
}

/// Propagate to saturation, recording propagation-budget usage.
fn propagate_all(ctx: &mut Context) -> Result<(), Conflict> {
    let before = ctx.trail.trail().len();
    let result = propagate(
        &mut ctx.assignment,
        &mut ctx.impl_graph,
        &mut ctx.trail,
        &mut ctx.watchlists,
        &mut ctx.alloc,
        &ctx.binary_clauses,
    );
    let after = ctx.trail.trail().len();
    ctx.state.budget.record_propagations((after - before) as u64);
    result
}

/// Run a ReduceDB pass, emitting a proof deletion step for every clause it drops.
fn reduce_clause_db(ctx: &mut Context) {
    let live_before: Vec<_> = ctx.db.iter_live(&ctx.alloc).collect();

    let removed = ctx
        .reduce_db
        .reduce(ctx.state.budget.conflicts_used(), &mut ctx.db, &mut ctx.alloc);
    debug!("reduced {} clauses", removed);

    for cref in live_before {
        if ctx.alloc.header(cref).deleted() {
            let lits = ctx.alloc.clause(cref).lits().to_vec();
            ctx.proof.add_step(ProofStep::DeleteClause(&lits));
        }
    }

    rebuild_watches(ctx);
}

/// Run one round of inprocessing simplification: unit cleanup, subsumption/strengthening, and
/// bounded variable elimination, then rebuild the watch lists to match the mutated clause set.
fn run_inprocessing(ctx: &mut Context) -> Result<(), ()> {
    let mut proof = vec![];

    simplify_units(
        &mut ctx.db,
        &mut ctx.alloc,
        &mut ctx.binary_clauses,
        &mut ctx.assignment,
        &mut ctx.impl_graph,
        &mut ctx.trail,
        &mut proof,
    )?;

    subsume_and_strengthen(
        &mut ctx.db,
        &mut ctx.alloc,
        &mut ctx.binary_clauses,
        &mut ctx.assignment,
        &mut ctx.impl_graph,
        &mut ctx.trail,
        ctx.var_count(),
        &mut proof,
    )?;

    eliminate_variables(
        &mut ctx.db,
        &mut ctx.alloc,
        &mut ctx.binary_clauses,
        &mut ctx.variables,
        &mut ctx.eliminated,
        &mut ctx.assignment,
        &mut ctx.impl_graph,
        &mut ctx.trail,
        ctx.config.eliminate_clause_lim,
        &mut proof,
    )?;

    debug!("inprocessing produced {} proof steps", proof.len());

    for record in proof {
        match record {
            ProofRecord::AddClause(lits) => ctx.proof.add_step(ProofStep::AddClause(&lits)),
            ProofRecord::DeleteClause(lits) => ctx.proof.add_step(ProofStep::DeleteClause(&lits)),
        }
    }

    rebuild_watches(ctx);

    propagate_all(ctx).map_err(|_| ())
}

/// Rebuild the watch lists from scratch to match the current clause database.
///
/// Required after any pass that adds or removes clauses outside of conflict-driven learning
/// (ReduceDB, subsumption, variable elimination), since those never touch watches themselves.
fn rebuild_watches(ctx: &mut Context) {
    ctx.watchlists.clear();
    for cref in ctx.db.iter_live(&ctx.alloc).collect::<Vec<_>>() {
        let lits = ctx.alloc.clause(cref).lits();
        ctx.watchlists.watch_clause(cref, [lits[0], lits[1]]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::config::SolverConfig;
    use crate::lit::Var;

    fn lit(v: i32) -> Lit {
        let var = Var::from_index((v.unsigned_abs() - 1) as usize);
        Lit::from_var(var, v < 0)
    }

    fn add_clause(ctx: &mut Context, lits: &[Lit]) {
        match lits.len() {
            2 => ctx.binary_clauses.add_binary_clause([lits[0], lits[1]]),
            _ => {
                let cref = ctx.db.add_clause(&mut ctx.alloc, ClauseHeader::new(), lits);
                ctx.watchlists.watch_clause(cref, [lits[0], lits[1]]);
            }
        }
    }

    #[test]
    fn finds_a_satisfying_assignment() {
        let mut ctx = Context::new(SolverConfig::default());
        ctx.set_var_count(3);

        add_clause(&mut ctx, &[lit(1), lit(2), lit(3)]);
        add_clause(&mut ctx, &[!lit(1), !lit(2)]);
        add_clause(&mut ctx, &[!lit(2), !lit(3)]);

        let result = solve(&mut ctx, &[]);
        assert_eq!(result, SolveResult::Sat);
        assert!(
            ctx.assignment.lit_is_true(lit(1))
                || ctx.assignment.lit_is_true(lit(2))
                || ctx.assignment.lit_is_true(lit(3))
        );
    }

    #[test]
    fn detects_unsatisfiability() {
        let mut ctx = Context::new(SolverConfig::default());
        ctx.set_var_count(1);

        add_clause(&mut ctx, &[lit(1), lit(1)]);
        enqueue_assignment(&mut ctx.assignment, &mut ctx.impl_graph, &mut ctx.trail, !lit(1), Reason::Unit);

        let result = solve(&mut ctx, &[]);
        assert_eq!(result, SolveResult::Unsat);
    }

    #[test]
    fn unsat_under_assumptions_reports_a_core() {
        let mut ctx = Context::new(SolverConfig::default());
        ctx.set_var_count(2);

        add_clause(&mut ctx, &[!lit(1), !lit(2)]);

        let result = solve(&mut ctx, &[lit(1), lit(2)]);
        match result {
            SolveResult::UnsatUnderAssumptions(core) => assert!(!core.is_empty()),
            other => panic!("expected UnsatUnderAssumptions, got {:?}", other),
        }
    }
}
