//! Clause activity.
use crate::config::SolverConfig;

use super::{ClauseAlloc, ClauseDb};

/// Clause activity bookkeeping.
///
/// The individual clause activities are stored in the clause headers. This stores global metadata
/// used for bumping and decaying activities.
pub struct ClauseActivity {
    /// The value to add on bumping.
    bump: f32,
    /// The inverse of the decay factor.
    inv_decay: f32,
}

impl Default for ClauseActivity {
    fn default() -> ClauseActivity {
        ClauseActivity {
            bump: 1.0,
            inv_decay: 1.0 / SolverConfig::default().clause_activity_decay,
        }
    }
}

impl ClauseActivity {
    /// Change the decay factor.
    pub fn set_decay(&mut self, decay: f32) {
        assert!(decay < 1.0);
        assert!(decay > 1.0 / 16.0);
        self.inv_decay = 1.0 / decay;
    }
}

/// Rescale activities if any value exceeds this value.
fn rescale_limit() -> f32 {
    std::f32::MAX / 16.0
}

/// Increase a clause's activity.
pub fn bump_clause_activity(
    activities: &mut ClauseActivity,
    db: &ClauseDb,
    alloc: &mut ClauseAlloc,
    cref: super::ClauseRef,
) {
    let bump = activities.bump;
    let header = alloc.header_mut(cref);

    let activity = header.activity() + bump;
    header.set_activity(activity);

    if activity > rescale_limit() {
        rescale_clause_activities(activities, db, alloc);
    }
}

/// Rescale all values to avoid an overflow.
fn rescale_clause_activities(activities: &mut ClauseActivity, db: &ClauseDb, alloc: &mut ClauseAlloc) {
    let rescale_factor = 1.0 / rescale_limit();

    for cref in db.iter_live(alloc).collect::<Vec<_>>() {
        let header = alloc.header_mut(cref);
        let activity = header.activity() * rescale_factor;
        header.set_activity(activity);
    }

    activities.bump *= rescale_factor;
}

/// Decay the clause activities.
pub fn decay_clause_activities(activities: &mut ClauseActivity, db: &ClauseDb, alloc: &mut ClauseAlloc) {
    activities.bump *= activities.inv_decay;
    if activities.bump >= rescale_limit() {
        rescale_clause_activities(activities, db, alloc);
    }
}
