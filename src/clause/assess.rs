//! Clause assessment.
use crate::glue::compute_glue;
use crate::lit::Lit;
use crate::prop::ImplGraph;
use crate::tmp::TmpData;

use super::ClauseHeader;

/// Assess a newly learned clause and generate a clause header for it.
///
/// This is called while the clause is still in conflict, thus the computed glue level is one
/// higher than it'll be after backtracking when the clause becomes asserting.
pub fn assess_learned_clause(
    tmp_data: &mut TmpData,
    impl_graph: &ImplGraph,
    reduce_initial_usage: u32,
    lits: &[Lit],
) -> ClauseHeader {
    let glue = compute_glue(tmp_data, impl_graph, lits) - 1;

    let mut header = ClauseHeader::new();
    header.learnt = true;
    header.set_glue(glue);
    header.usage = reduce_initial_usage;

    header
}
