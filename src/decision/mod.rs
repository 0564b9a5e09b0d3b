//! Decision heuristics.
pub mod lrb;
pub mod vsids;

pub use lrb::Lrb;
pub use vsids::Vsids;

use crate::config::SolverConfig;
use crate::lit::{Lit, Var};
use crate::prop::{enqueue_assignment, Assignment, ImplGraph, Reason, Trail};
use crate::variables::Variables;

/// Dispatch between the two supported branching heuristics.
pub enum Branching {
    Vsids(Vsids),
    Lrb(Lrb),
}

impl Branching {
    pub fn new(config: &SolverConfig) -> Branching {
        if config.use_lrb {
            Branching::Lrb(Lrb::new(config))
        } else {
            let mut vsids = Vsids::default();
            vsids.set_decay(config.vsids_decay);
            Branching::Vsids(vsids)
        }
    }

    pub fn set_var_count(&mut self, count: usize) {
        match self {
            Branching::Vsids(vsids) => vsids.set_var_count(count),
            Branching::Lrb(lrb) => lrb.set_var_count(count),
        }
    }

    pub fn make_available(&mut self, var: Var) {
        match self {
            Branching::Vsids(vsids) => vsids.make_available(var),
            Branching::Lrb(lrb) => lrb.make_available(var),
        }
    }

    fn pop(&mut self) -> Option<Var> {
        match self {
            Branching::Vsids(vsids) => vsids.next(),
            Branching::Lrb(lrb) => lrb.next(),
        }
    }

    /// Bump a variable's activity (VSIDS only; LRB updates via [`Branching::process_conflict`]).
    pub fn bump(&mut self, var: Var) {
        if let Branching::Vsids(vsids) = self {
            vsids.bump(var);
        }
    }

    /// Decay all activities (VSIDS only).
    pub fn decay(&mut self) {
        if let Branching::Vsids(vsids) = self {
            vsids.decay();
        }
    }

    /// Called once per conflict with every variable that participated in conflict analysis while
    /// assigned (LRB only).
    pub fn process_conflict(&mut self, participants: &[Var]) {
        if let Branching::Lrb(lrb) = self {
            lrb.process_conflict(participants);
        }
    }

    /// Called when a variable becomes assigned.
    pub fn on_assigned(&mut self, var: Var) {
        if let Branching::Lrb(lrb) = self {
            lrb.on_assigned(var);
        }
    }

    /// Called when a variable becomes unassigned by backtracking.
    pub fn on_unassigned(&mut self, var: Var) {
        match self {
            Branching::Vsids(vsids) => vsids.make_available(var),
            Branching::Lrb(lrb) => lrb.on_unassigned(var),
        }
    }
}

/// Saved phase ("polarity") per variable, used so that a variable branches the same way it was
/// last assigned (phase saving).
#[derive(Default)]
pub struct Polarity {
    saved: Vec<bool>,
}

impl Polarity {
    pub fn set_var_count(&mut self, count: usize) {
        self.saved.resize(count, true);
    }

    pub fn save(&mut self, var: Var, positive: bool) {
        self.saved[var.index()] = positive;
    }

    pub fn get(&self, var: Var) -> bool {
        self.saved[var.index()]
    }

    /// Seed polarity and activity from relative literal occurrence counts.
    ///
    /// For each variable, the polarity is set to whichever sign occurs more often across the
    /// clause set, on the theory that branching that way satisfies more clauses immediately and
    /// delays conflicts caused by the less common sign. Variable activity is seeded proportionally
    /// to total occurrence count, so initial decisions favor the variables that constrain the
    /// formula the most.
    pub fn init_from_occurrences(
        &mut self,
        branching: &mut Branching,
        clauses: impl Iterator<Item = Lit>,
        var_count: usize,
    ) {
        let mut pos_count = vec![0u32; var_count];
        let mut neg_count = vec![0u32; var_count];

        for lit in clauses {
            if lit.is_positive() {
                pos_count[lit.var().index()] += 1;
            } else {
                neg_count[lit.var().index()] += 1;
            }
        }

        for i in 0..var_count {
            let var = Var::from_index(i);
            self.saved[i] = pos_count[i] >= neg_count[i];

            let total = pos_count[i] + neg_count[i];
            for _ in 0..total.min(64) {
                branching.bump(var);
            }
        }
    }
}

/// Make a decision and enqueue it.
///
/// Pops variables from the branching heuristic until an unassigned decision variable is found (or
/// the heuristic runs out, in which case the formula is satisfied under the current assignment).
/// Returns `false` if no decision was made because all variables are assigned.
pub fn make_decision(
    branching: &mut Branching,
    polarity: &Polarity,
    variables: &Variables,
    assignment: &mut Assignment,
    impl_graph: &mut ImplGraph,
    trail: &mut Trail,
) -> bool {
    while let Some(var) = branching.pop() {
        if assignment.var_value(var).is_some() {
            continue;
        }
        if !variables.is_decision_var(var) {
            continue;
        }

        let decision = Lit::from_var(var, !polarity.get(var));

        trail.new_decision_level();
        enqueue_assignment(assignment, impl_graph, trail, decision, Reason::Unit);
        branching.on_assigned(var);

        return true;
    }
    false
}
