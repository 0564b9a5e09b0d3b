//! The solver's public API.
//!
//! `Solver` owns a [`Context`] and exposes the operations a caller needs to build up a formula
//! incrementally, attach a proof sink, bound a search with budgets or an interrupt, and read back
//! a model or failed-assumption core. Parsing (DIMACS or otherwise) is the caller's job; this only
//! accepts already-parsed literals.
use std::io::Write;

use log::info;

use crate::clause::ClauseHeader;
use crate::config::SolverConfig;
use crate::context::Context;
use crate::error::{ProofError, Unsat};
use crate::lit::{Lit, Var};
use crate::prop::{backtrack, enqueue_assignment, propagate, Reason};
use crate::search;
use crate::state::{Interrupt, SatState};

/// Re-exported so callers can name the result of [`Solver::solve`] without reaching into a
/// private module.
pub use crate::search::SolveResult;

/// A boolean satisfiability solver.
pub struct Solver<'a> {
    ctx: Box<Context<'a>>,
    /// Whether [`crate::decision::Polarity::init_from_occurrences`] has run yet.
    ///
    /// Seeding is only meaningful once against the initial formula; re-running it after the
    /// search has already explored part of the tree would throw away learned phase information.
    seeded: bool,
}

impl<'a> Default for Solver<'a> {
    fn default() -> Solver<'a> {
        Solver::new(SolverConfig::default())
    }
}

impl<'a> Solver<'a> {
    /// Create a new solver using the given configuration.
    pub fn new(config: SolverConfig) -> Solver<'a> {
        Solver {
            ctx: Box::new(Context::new(config)),
            seeded: false,
        }
    }

    /// Allocate a fresh variable.
    pub fn new_var(&mut self) -> Var {
        self.ctx.new_var()
    }

    /// Number of variables known to the solver.
    pub fn var_count(&self) -> usize {
        self.ctx.var_count()
    }

    /// Freeze or unfreeze a variable.
    ///
    /// Frozen variables are exempt from bounded variable elimination (§4.8), since eliminating a
    /// variable the caller still cares about the value of would make that value unrecoverable.
    pub fn set_frozen(&mut self, var: Var, frozen: bool) {
        self.ctx.set_var_count(var.index() + 1);
        self.ctx.variables.set_frozen(var, frozen);
    }

    /// Allow or forbid branching on a variable.
    ///
    /// Non-decision variables are still assigned (by propagation or as part of a satisfying
    /// model), they are just never chosen by [`crate::decision::make_decision`].
    pub fn set_decision(&mut self, var: Var, decision: bool) {
        self.ctx.set_var_count(var.index() + 1);
        self.ctx.variables.set_decision(var, decision);
    }

    /// Start writing a DRAT proof to the given target.
    pub fn write_proof(&mut self, target: impl Write + 'a) {
        self.ctx.proof.write_to(target);
    }

    /// Stop writing the proof, flushing any buffered output.
    ///
    /// Returns an error if the most recent write to the proof sink failed.
    pub fn close_proof(&mut self) -> Result<(), ProofError> {
        self.ctx.proof.close();
        match self.ctx.proof.take_error() {
            Some(err) => Err(ProofError::Io(err)),
            None => Ok(()),
        }
    }

    /// A handle that can be sent to another thread to interrupt a running [`Solver::solve`].
    pub fn interrupt_handle(&self) -> Interrupt {
        self.ctx.state.interrupt.clone()
    }

    /// Request that the current (or next) `solve` call stop at the next conflict boundary.
    pub fn interrupt(&self) {
        self.ctx.state.interrupt.set();
    }

    /// Bound the number of conflicts a single `solve` call may use. `None` means unlimited.
    pub fn set_conflict_budget(&mut self, budget: Option<u64>) {
        self.ctx.state.budget.conflict_budget = budget;
    }

    /// Bound the number of propagated literals a single `solve` call may use. `None` means
    /// unlimited.
    pub fn set_propagation_budget(&mut self, budget: Option<u64>) {
        self.ctx.state.budget.propagation_budget = budget;
    }

    /// Add a clause to the formula.
    ///
    /// Tautological clauses (containing both a literal and its negation) are silently dropped.
    /// Adding the empty clause, or a clause that simplifies to empty against the current level-0
    /// assignment, makes the formula permanently unsatisfiable.
    pub fn add_clause(&mut self, lits: &[Lit]) -> Result<(), Unsat> {
        if self.ctx.state.sat_state == SatState::Unsat {
            return Err(Unsat);
        }

        for &lit in lits {
            self.ctx.set_var_count(lit.index() + 1);
        }

        self.ctx.state.sat_state = SatState::Unknown;

        if self.ctx.trail.current_level() > 0 {
            backtrack_to_root(&mut self.ctx);
        }

        let mut sorted = lits.to_vec();
        sorted.sort_unstable();
        sorted.dedup();

        let mut last = None;
        for &lit in sorted.iter() {
            if last == Some(!lit) {
                return Ok(()); // tautology
            }
            last = Some(lit);
        }

        let mut simplified = Vec::with_capacity(sorted.len());
        for &lit in sorted.iter() {
            match self.ctx.assignment.lit_value(lit) {
                Some(true) => return Ok(()), // already satisfied
                Some(false) => {}
                None => simplified.push(lit),
            }
        }

        match simplified[..] {
            [] => {
                self.ctx.state.sat_state = SatState::Unsat;
                Err(Unsat)
            }
            [lit] => {
                enqueue_assignment(
                    &mut self.ctx.assignment,
                    &mut self.ctx.impl_graph,
                    &mut self.ctx.trail,
                    lit,
                    Reason::Unit,
                );
                if propagate(
                    &mut self.ctx.assignment,
                    &mut self.ctx.impl_graph,
                    &mut self.ctx.trail,
                    &mut self.ctx.watchlists,
                    &mut self.ctx.alloc,
                    &self.ctx.binary_clauses,
                )
                .is_err()
                {
                    self.ctx.state.sat_state = SatState::Unsat;
                    return Err(Unsat);
                }
                Ok(())
            }
            [a, b] => {
                self.ctx.binary_clauses.add_binary_clause([a, b]);
                Ok(())
            }
            _ => {
                let cref = self
                    .ctx
                    .db
                    .add_clause(&mut self.ctx.alloc, ClauseHeader::new(), &simplified);
                self.ctx
                    .watchlists
                    .watch_clause(cref, [simplified[0], simplified[1]]);
                Ok(())
            }
        }
    }

    /// Run the search to completion (or until interrupted / a budget is exhausted) under the
    /// given assumptions.
    pub fn solve(&mut self, assumptions: &[Lit]) -> SolveResult {
        if self.ctx.state.sat_state == SatState::Unsat {
            return SolveResult::Unsat;
        }

        if !self.seeded {
            if self.ctx.config.sort_variables {
                self.seed_heuristics();
            }
            self.seeded = true;
        }

        let result = search::solve(&mut self.ctx, assumptions);
        info!("solve finished with {:?}", result);
        result
    }

    /// Value assigned to a variable by the most recent satisfying assignment.
    ///
    /// Only meaningful right after a `solve` call returned [`SolveResult::Sat`].
    pub fn model_value(&self, var: Var) -> Option<bool> {
        self.ctx.assignment.var_value(var)
    }

    /// Seed phase-saving and branching activity from the initial formula's literal occurrence
    /// counts, once, the first time `solve` is called.
    fn seed_heuristics(&mut self) {
        let literals = self
            .ctx
            .db
            .iter_live(&self.ctx.alloc)
            .flat_map(|cref| self.ctx.alloc.clause(cref).lits().to_vec())
            .chain((0..self.ctx.var_count() * 2).flat_map(|code| {
                let lit = Lit::from_code(code);
                self.ctx.binary_clauses.implied(lit).to_vec()
            }))
            .collect::<Vec<_>>();

        let var_count = self.ctx.var_count();
        let mut polarity = std::mem::take(&mut self.ctx.polarity);
        polarity.init_from_occurrences(&mut self.ctx.branching, literals.into_iter(), var_count);
        self.ctx.polarity = polarity;
    }
}

/// Undo every decision, returning to the level-0 assignment.
///
/// Used before adding a clause on top of a partially searched solver, mirroring the restart a
/// fresh round of unit propagation needs once the clause set changes.
fn backtrack_to_root(ctx: &mut Context) {
    let branching = &mut ctx.branching;
    backtrack(&mut ctx.assignment, &mut ctx.trail, 0, |var| {
        branching.on_unassigned(var);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(v: i32) -> Lit {
        let var = Var::from_index((v.unsigned_abs() - 1) as usize);
        Lit::from_var(var, v < 0)
    }

    #[test]
    fn solves_a_small_satisfiable_formula() {
        let mut solver = Solver::default();
        let a = solver.new_var();
        let b = solver.new_var();
        let c = solver.new_var();

        solver
            .add_clause(&[Lit::from_var(a, false), Lit::from_var(b, false), Lit::from_var(c, false)])
            .unwrap();
        solver
            .add_clause(&[Lit::from_var(a, true), Lit::from_var(b, true)])
            .unwrap();

        assert_eq!(solver.solve(&[]), SolveResult::Sat);
        assert!(
            solver.model_value(a) == Some(true)
                || solver.model_value(b) == Some(true)
                || solver.model_value(c) == Some(true)
        );
    }

    #[test]
    fn empty_clause_is_immediately_unsat() {
        let mut solver = Solver::default();
        solver.new_var();
        assert_eq!(solver.add_clause(&[]), Err(Unsat));
        assert_eq!(solver.solve(&[]), SolveResult::Unsat);
    }

    #[test]
    fn tautological_clause_is_dropped() {
        let mut solver = Solver::default();
        let a = solver.new_var();
        solver.add_clause(&[lit(1), !lit(1)]).unwrap();
        let _ = a;
        // A formula with only a dropped tautology is trivially satisfiable.
        assert_eq!(solver.solve(&[]), SolveResult::Sat);
    }

    #[test]
    fn conflicting_units_are_unsat() {
        let mut solver = Solver::default();
        solver.new_var();
        solver.add_clause(&[lit(1)]).unwrap();
        assert_eq!(solver.add_clause(&[!lit(1)]), Err(Unsat));
    }
}
