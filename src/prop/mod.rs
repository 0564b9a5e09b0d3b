//! Unit propagation.
pub mod assignment;
pub mod binary;
pub mod graph;
pub mod long;
pub mod lower_bound;
pub mod watch;

pub use assignment::{backtrack, enqueue_assignment, Assignment, Trail};
pub use binary::propagate_binary;
pub use graph::{Conflict, ImplGraph, ImplNode, Reason};
pub use long::propagate_long;
pub use lower_bound::LowerBoundProp;
pub use watch::{Watch, Watchlists};

use crate::binary::BinaryClauses;
use crate::clause::ClauseAlloc;
use crate::lit::Lit;

/// Propagate all consequences of the current trail using binary clauses and the 2-watched-literal
/// scheme for long clauses.
///
/// Processes the propagation queue until it's empty or a conflict is found. On conflict the queue
/// is left partially processed; the caller is expected to backtrack before propagating again.
pub fn propagate(
    assignment: &mut Assignment,
    impl_graph: &mut ImplGraph,
    trail: &mut Trail,
    watchlists: &mut Watchlists,
    alloc: &mut ClauseAlloc,
    binary_clauses: &BinaryClauses,
) -> Result<(), Conflict> {
    while let Some(lit) = trail.pop_queue() {
        propagate_binary(assignment, impl_graph, trail, binary_clauses, lit)?;
        propagate_long(assignment, impl_graph, trail, watchlists, alloc, lit)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clause::{ClauseDb, ClauseHeader};
    use crate::lit::Var;

    fn lit(v: i32) -> Lit {
        let var = Var::from_index((v.abs() - 1) as usize);
        Lit::from_var(var, v < 0)
    }

    #[test]
    fn propagates_through_binary_and_long_clauses() {
        let mut assignment = Assignment::default();
        let mut impl_graph = ImplGraph::default();
        let mut trail = Trail::default();
        let mut watchlists = Watchlists::default();
        let mut alloc = ClauseAlloc::new();
        let mut db = ClauseDb::default();
        let mut binary = BinaryClauses::default();

        assignment.set_var_count(4);
        impl_graph.set_var_count(4);
        watchlists.set_var_count(4);
        binary.set_var_count(4);

        // (1 -> 2) as a binary clause, (−2, 3, 4) as a long clause.
        binary.add_binary_clause([!lit(1), lit(2)]);
        let cref = db.add_clause(&mut alloc, ClauseHeader::new(), &[!lit(2), lit(3), lit(4)]);
        watchlists.watch_clause(cref, [!lit(2), lit(3)]);

        enqueue_assignment(&mut assignment, &mut impl_graph, &mut trail, lit(1), Reason::Unit);
        enqueue_assignment(&mut assignment, &mut impl_graph, &mut trail, !lit(4), Reason::Unit);

        propagate(
            &mut assignment,
            &mut impl_graph,
            &mut trail,
            &mut watchlists,
            &mut alloc,
            &binary,
        )
        .unwrap();

        assert!(assignment.lit_is_true(lit(2)));
        assert!(assignment.lit_is_true(lit(3)));
    }
}
