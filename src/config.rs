//! Solver configuration.

/// Tunable parameters of the solver.
///
/// All fields have defaults matching typical CDCL solver tunings; see the individual field docs.
pub struct SolverConfig {
    /// Multiplicative decay for the VSIDS decision heuristic. (Default: 0.95)
    pub vsids_decay: f32,

    /// Multiplicative decay for clause activities. (Default: 0.999)
    pub clause_activity_decay: f32,

    /// Whether LRB is used instead of VSIDS for branching. (Default: false)
    pub use_lrb: bool,
    /// Floor for LRB's step size. (Default: 0.06)
    pub lrb_min_step_size: f32,
    /// Amount the LRB step size is decremented by per conflict. (Default: 1e-5)
    pub lrb_step_size_dec: f32,

    /// Whether to initialize polarity and activity/weight from relative literal occurrence.
    /// (Default: true)
    pub sort_variables: bool,

    /// Persistent LBD threshold for ReduceDB; learned clauses with LBD at or below this are never
    /// reclaimed. (Default: 2)
    pub reduce_persistent_lbd: u32,
    /// Volatile LBD threshold; clauses with LBD at or above this are reclaimed more eagerly.
    /// (Default: 7)
    pub reduce_volatile_lbd: u32,
    /// Usage counter a freshly learned clause starts with. (Default: 8)
    pub reduce_initial_usage: u32,
    /// Conflict count before the first ReduceDB invocation. (Default: 2000)
    pub reduce_first_threshold: u64,
    /// Amount the ReduceDB threshold grows by after each invocation. (Default: 300)
    pub reduce_threshold_increment: u64,

    /// Minimum number of conflicts between restart checks. (Default: 1000)
    pub restart_minimum_conflicts: u64,
    /// EMA decay for the narrow LBD average. (Default: 3e-2)
    pub restart_lbd_narrow_alpha: f32,
    /// EMA decay for the wide LBD average. (Default: 1e-5)
    pub restart_lbd_wide_alpha: f32,
    /// EMA decay for the narrow trail-size average. (Default: 1e-2)
    pub restart_trail_narrow_alpha: f32,
    /// EMA decay for the wide trail-size average. (Default: 1e-5)
    pub restart_trail_wide_alpha: f32,
    /// Restart is signalled once narrow/wide LBD exceeds this ratio. (Default: 1.25)
    pub restart_force: f64,
    /// Restart is suppressed ("blocked") once narrow/wide trail size exceeds this ratio.
    /// (Default: 1.4)
    pub restart_block: f64,

    /// Maximum resolvent size accepted during bounded variable elimination. (Default: 20)
    pub eliminate_clause_lim: usize,
}

impl Default for SolverConfig {
    fn default() -> SolverConfig {
        SolverConfig {
            vsids_decay: 0.95,
            clause_activity_decay: 0.999,

            use_lrb: false,
            lrb_min_step_size: 0.06,
            lrb_step_size_dec: 1e-5,

            sort_variables: true,

            reduce_persistent_lbd: 2,
            reduce_volatile_lbd: 7,
            reduce_initial_usage: 8,
            reduce_first_threshold: 2000,
            reduce_threshold_increment: 300,

            restart_minimum_conflicts: 1000,
            restart_lbd_narrow_alpha: 3e-2,
            restart_lbd_wide_alpha: 1e-5,
            restart_trail_narrow_alpha: 1e-2,
            restart_trail_wide_alpha: 1e-5,
            restart_force: 1.25,
            restart_block: 1.4,

            eliminate_clause_lim: 20,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = SolverConfig::default();
        assert!(config.vsids_decay < 1.0);
        assert!(config.clause_activity_decay < 1.0);
        assert!(config.restart_force > 1.0);
        assert!(config.restart_block > 1.0);
    }
}
