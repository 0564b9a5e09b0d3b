//! Propagation of binary clauses.
use crate::binary::BinaryClauses;
use crate::lit::Lit;

use super::{enqueue_assignment, Assignment, Conflict, ImplGraph, Reason, Trail};

/// Propagate all literals implied by the given literal via binary clauses.
///
/// On conflict return the binary clause propagating the conflicting assignment.
pub fn propagate_binary(
    assignment: &mut Assignment,
    impl_graph: &mut ImplGraph,
    trail: &mut Trail,
    binary_clauses: &BinaryClauses,
    lit: Lit,
) -> Result<(), Conflict> {
    for &implied in binary_clauses.implied(lit) {
        if assignment.lit_is_false(implied) {
            return Err(Conflict::Binary([implied, !lit]));
        } else if !assignment.lit_is_true(implied) {
            enqueue_assignment(assignment, impl_graph, trail, implied, Reason::Binary([!lit]));
        }
    }

    Ok(())
}
