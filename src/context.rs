//! Central solver data structure.
//!
//! `Context` simply bundles every subsystem the search driver (`search.rs`) needs to touch. There's
//! no `partial_ref` borrow-splitting here, unlike the solver this is adapted from: `search.rs`
//! borrows the fields it needs directly off `&mut Context`.
use crate::analyze_conflict::AnalyzeConflict;
use crate::binary::BinaryClauses;
use crate::clause::{ClauseActivity, ClauseAlloc, ClauseDb, ReduceDb};
use crate::config::SolverConfig;
use crate::decision::{Branching, Polarity};
use crate::lit::Var;
use crate::proof::Proof;
use crate::prop::{Assignment, ImplGraph, Trail, Watchlists};
use crate::restart::Restart;
use crate::simplify::EliminatedClauses;
use crate::state::SolverState;
use crate::tmp::TmpData;
use crate::variables::Variables;

/// Central solver data structure.
///
/// Holds everything `search.rs` and `simplify.rs` operate on for a single solver instance. `'a` is
/// the lifetime of the attached proof sink's write target, see [`Proof`].
pub struct Context<'a> {
    pub assignment: Assignment,
    pub trail: Trail,
    pub impl_graph: ImplGraph,
    pub watchlists: Watchlists,
    pub alloc: ClauseAlloc,
    pub db: ClauseDb,
    pub clause_activity: ClauseActivity,
    pub reduce_db: ReduceDb,
    pub binary_clauses: BinaryClauses,
    pub variables: Variables,
    pub branching: Branching,
    pub polarity: Polarity,
    pub analyze: AnalyzeConflict,
    pub restart: Restart,
    pub tmp: TmpData,
    pub state: SolverState,
    pub config: SolverConfig,
    pub eliminated: EliminatedClauses,
    pub proof: Proof<'a>,
    var_count: usize,
}

impl<'a> Context<'a> {
    /// Create a fresh, empty context using the given configuration.
    pub fn new(config: SolverConfig) -> Context<'a> {
        let mut clause_activity = ClauseActivity::default();
        clause_activity.set_decay(config.clause_activity_decay);

        Context {
            assignment: Assignment::default(),
            trail: Trail::default(),
            impl_graph: ImplGraph::default(),
            watchlists: Watchlists::default(),
            alloc: ClauseAlloc::new(),
            db: ClauseDb::default(),
            clause_activity,
            reduce_db: ReduceDb::new(
                config.reduce_persistent_lbd,
                config.reduce_volatile_lbd,
                config.reduce_first_threshold,
                config.reduce_threshold_increment,
            ),
            binary_clauses: BinaryClauses::default(),
            variables: Variables::default(),
            branching: Branching::new(&config),
            polarity: Polarity::default(),
            analyze: AnalyzeConflict::default(),
            restart: Restart::new(&config),
            tmp: TmpData::default(),
            state: SolverState::default(),
            eliminated: EliminatedClauses::default(),
            proof: Proof::default(),
            config,
            var_count: 0,
        }
    }

    /// Number of variables currently known to the solver.
    pub fn var_count(&self) -> usize {
        self.var_count
    }

    /// Allocate a fresh variable, growing every subsystem to cover it.
    pub fn new_var(&mut self) -> Var {
        let var = Var::from_index(self.var_count);
        self.set_var_count(self.var_count + 1);
        var
    }

    /// Update every subsystem for a new variable count.
    ///
    /// No-op if `count` is not larger than the current count.
    pub fn set_var_count(&mut self, count: usize) {
        if count <= self.var_count {
            return;
        }
        self.var_count = count;
        self.assignment.set_var_count(count);
        self.impl_graph.set_var_count(count);
        self.watchlists.set_var_count(count);
        self.binary_clauses.set_var_count(count);
        self.variables.set_var_count(count);
        self.branching.set_var_count(count);
        self.polarity.set_var_count(count);
        self.analyze.set_var_count(count);
        self.tmp.set_var_count(count);
        self.eliminated.set_var_count(count);
    }
}
