//! Glucose-style EMA based restart policy (§4.7).
//!
//! Two exponential moving averages of the conflict clause's glue (LBD) are tracked, one narrow
//! (fast-reacting) and one wide (slow, long-term baseline). A restart is triggered once the narrow
//! average runs far enough above the wide one, signalling the search has drifted into a bad
//! region. A second pair of EMAs over the trail size is used to "block" a triggered restart when
//! the search is making unusually good progress (a long trail relative to its own baseline),
//! following the same scheme used for the glue EMAs.
use crate::config::SolverConfig;

/// An exponential moving average with "robust initialization".
///
/// A plain EMA started at zero is heavily biased for its first `1/alpha` samples. Instead, this
/// falls back to a plain cumulative average until enough samples have been seen for the EMA's own
/// weighting to dominate, then switches over seamlessly.
#[derive(Clone, Copy)]
struct Ema {
    value: f64,
    alpha: f64,
    count: u64,
}

impl Ema {
    fn new(alpha: f64) -> Ema {
        Ema {
            value: 0.0,
            alpha,
            count: 0,
        }
    }

    fn update(&mut self, sample: f64) {
        self.count += 1;
        let warmup_rate = 1.0 / self.count as f64;
        let rate = if warmup_rate > self.alpha {
            warmup_rate
        } else {
            self.alpha
        };
        self.value += rate * (sample - self.value);
    }

    fn get(&self) -> f64 {
        self.value
    }
}

/// Restart scheduling state.
pub struct Restart {
    lbd_narrow: Ema,
    lbd_wide: Ema,
    trail_narrow: Ema,
    trail_wide: Ema,
    conflicts_since_restart: u64,
    minimum_conflicts: u64,
    force_ratio: f64,
    block_ratio: f64,
}

impl Restart {
    pub fn new(config: &SolverConfig) -> Restart {
        Restart {
            lbd_narrow: Ema::new(config.restart_lbd_narrow_alpha as f64),
            lbd_wide: Ema::new(config.restart_lbd_wide_alpha as f64),
            trail_narrow: Ema::new(config.restart_trail_narrow_alpha as f64),
            trail_wide: Ema::new(config.restart_trail_wide_alpha as f64),
            conflicts_since_restart: 0,
            minimum_conflicts: config.restart_minimum_conflicts,
            force_ratio: config.restart_force,
            block_ratio: config.restart_block,
        }
    }

    /// Feed in the glue of a just-learned clause and the trail size at the time of the conflict.
    pub fn process_conflict(&mut self, glue: usize, trail_size: usize) {
        self.lbd_narrow.update(glue as f64);
        self.lbd_wide.update(glue as f64);
        self.trail_narrow.update(trail_size as f64);
        self.trail_wide.update(trail_size as f64);
        self.conflicts_since_restart += 1;
    }

    /// Whether a restart should happen now.
    ///
    /// Resets the conflict counter as a side effect when it returns `true`.
    pub fn should_restart(&mut self) -> bool {
        if self.conflicts_since_restart < self.minimum_conflicts {
            return false;
        }

        let blocked = self.trail_wide.count > 0
            && self.trail_narrow.get() > self.trail_wide.get() * self.block_ratio;
        if blocked {
            return false;
        }

        let forced =
            self.lbd_wide.count > 0 && self.lbd_narrow.get() > self.lbd_wide.get() * self.force_ratio;

        if forced {
            self.conflicts_since_restart = 0;
        }

        forced
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restarts_once_narrow_lbd_degrades() {
        let mut config = SolverConfig::default();
        config.restart_minimum_conflicts = 10;
        let mut restart = Restart::new(&config);

        for _ in 0..50 {
            restart.process_conflict(3, 100);
        }
        assert!(!restart.should_restart());

        for _ in 0..20 {
            restart.process_conflict(20, 100);
        }
        assert!(restart.should_restart());
    }

    #[test]
    fn block_suppresses_restart_on_long_trail() {
        let mut config = SolverConfig::default();
        config.restart_minimum_conflicts = 10;
        let mut restart = Restart::new(&config);

        for _ in 0..50 {
            restart.process_conflict(3, 100);
        }
        for _ in 0..20 {
            // Degrade LBD but also grow the trail far past its own baseline: blocked.
            restart.process_conflict(20, 1000);
        }
        assert!(!restart.should_restart());
    }
}
