//! Propagation of long clauses.
use crate::clause::ClauseAlloc;
use crate::lit::Lit;
use crate::vec_mut_scan::VecMutScan;

use super::enqueue_assignment;
use super::{Assignment, Conflict, ImplGraph, Reason, Trail, Watch, Watchlists};

/// Propagate all literals implied by long clauses watched by the given literal.
///
/// On conflict return the clause propagating the conflicting assignment.
///
/// See [`prop::watch`](crate::prop::watch) for the invariants that this has to uphold.
pub fn propagate_long(
    assignment: &mut Assignment,
    impl_graph: &mut ImplGraph,
    trail: &mut Trail,
    watchlists: &mut Watchlists,
    alloc: &mut ClauseAlloc,
    lit: Lit,
) -> Result<(), Conflict> {
    let false_lit = !lit;

    // New watches destined for a literal other than `lit` can't be pushed onto that literal's
    // watchlist while we're still scanning `lit`'s own list (it might be the same list, and it's
    // borrowed by the scan either way). Collect them and apply them once the scan is done.
    let mut retarget = vec![];
    let mut conflict = None;

    {
        let watch_list = watchlists.watched_by_mut(lit);
        let mut scan = VecMutScan::new(watch_list);

        'watchers: while let Some(watch) = scan.next() {
            if assignment.lit_is_true(watch.blocking) {
                continue;
            }

            let cref = watch.cref;
            let clause = alloc.clause_mut(cref);
            let lits = clause.lits_mut();

            if lits[0] == false_lit {
                lits.swap(0, 1);
            }
            let first = lits[0];

            let new_watch = Watch {
                cref,
                blocking: first,
            };

            if first != watch.blocking && assignment.lit_is_true(first) {
                watch.replace(new_watch);
                continue;
            }

            if let Some(rest_pos) = (2..lits.len()).find(|&i| !assignment.lit_is_false(lits[i])) {
                let rest_lit = lits[rest_pos];
                lits[1] = rest_lit;
                lits[rest_pos] = false_lit;
                retarget.push((!rest_lit, new_watch));
                watch.remove();
                continue 'watchers;
            }

            watch.replace(new_watch);

            if assignment.lit_is_false(first) {
                conflict = Some(Conflict::Long(cref));
                break;
            }

            enqueue_assignment(assignment, impl_graph, trail, first, Reason::Long(cref));
        }
    }

    for (target, watch) in retarget {
        watchlists.add_watch(target, watch);
    }

    match conflict {
        Some(conflict) => Err(conflict),
        None => Ok(()),
    }
}
