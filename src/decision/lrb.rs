//! The LRB (Learning Rate Branching) heuristic.
//!
//! LRB treats each variable's usefulness as an online learning-rate estimate: each variable
//! records how often it took part in conflict analysis (by appearing in the learned clause or
//! being resolved on) while it was assigned, relative to how long it stayed assigned. Variables
//! that are frequently "relevant" to recent conflicts relative to how long they've been assigned
//! get a higher activity. See Liang, Ganesh, Poupart, Czarnecki, "Learning Rate Based Branching
//! Heuristic for SAT Solvers" (SAT 2016).
//!
//! The heap mechanics mirror [`super::vsids::Vsids`]; only the activity update rule differs.

use ordered_float::OrderedFloat;

use crate::config::SolverConfig;
use crate::lit::Var;

/// The LRB branching heuristic.
pub struct Lrb {
    activity: Vec<OrderedFloat<f32>>,
    heap: Vec<Var>,
    position: Vec<Option<usize>>,

    /// Conflicts a variable participated in since it was last assigned.
    participated: Vec<u32>,
    /// Conflict counter at the time a variable was assigned.
    assigned_at: Vec<u64>,

    conflicts: u64,
    step_size: f32,
    min_step_size: f32,
    step_size_dec: f32,
}

impl Lrb {
    pub fn new(config: &SolverConfig) -> Lrb {
        Lrb {
            activity: vec![],
            heap: vec![],
            position: vec![],
            participated: vec![],
            assigned_at: vec![],
            conflicts: 0,
            step_size: 0.4,
            min_step_size: config.lrb_min_step_size,
            step_size_dec: config.lrb_step_size_dec,
        }
    }

    /// Update structures for a new variable count.
    pub fn set_var_count(&mut self, count: usize) {
        let old_count = self.activity.len();
        self.activity.resize(count, OrderedFloat(0.0));
        self.position.resize(count, None);
        self.participated.resize(count, 0);
        self.assigned_at.resize(count, 0);

        for i in old_count..count {
            self.make_available(Var::from_index(i));
        }
    }

    /// Called once per conflict, after the learned clause and resolved variables are known.
    ///
    /// `participants` are all variables that appeared in the conflict side of a resolution step
    /// (including the final learned clause) while assigned.
    pub fn process_conflict(&mut self, participants: &[Var]) {
        self.conflicts += 1;
        for &var in participants {
            self.participated[var.index()] += 1;
        }
        self.step_size = (self.step_size - self.step_size_dec).max(self.min_step_size);
    }

    /// Called when a variable becomes assigned (decision or propagation).
    pub fn on_assigned(&mut self, var: Var) {
        self.assigned_at[var.index()] = self.conflicts;
        self.participated[var.index()] = 0;
    }

    /// Called when a variable becomes unassigned by backtracking.
    ///
    /// Updates the variable's activity from its learning-rate estimate and re-inserts it into the
    /// heap.
    pub fn on_unassigned(&mut self, var: Var) {
        let interval = self.conflicts.saturating_sub(self.assigned_at[var.index()]);
        if interval > 0 {
            let rate = self.participated[var.index()] as f32 / interval as f32;
            let old = self.activity[var.index()].0;
            self.activity[var.index()] = OrderedFloat((1.0 - self.step_size) * old + self.step_size * rate);
        }
        self.make_available(var);
    }

    /// Insert a variable into the heap if not already present.
    pub fn make_available(&mut self, var: Var) {
        if self.position[var.index()].is_none() {
            let position = self.heap.len();
            self.position[var.index()] = Some(position);
            self.heap.push(var);
            self.sift_up(position);
        }
    }

    fn sift_up(&mut self, mut pos: usize) {
        let var = self.heap[pos];
        loop {
            if pos == 0 {
                return;
            }
            let parent_pos = (pos - 1) / 2;
            let parent_var = self.heap[parent_pos];
            if self.activity[parent_var.index()] >= self.activity[var.index()] {
                return;
            }
            self.position[var.index()] = Some(parent_pos);
            self.heap[parent_pos] = var;
            self.position[parent_var.index()] = Some(pos);
            self.heap[pos] = parent_var;
            pos = parent_pos;
        }
    }

    fn sift_down(&mut self, mut pos: usize) {
        let var = self.heap[pos];
        loop {
            let mut largest_pos = pos;
            let mut largest_var = var;

            let left_pos = pos * 2 + 1;
            if left_pos < self.heap.len() {
                let left_var = self.heap[left_pos];
                if self.activity[largest_var.index()] < self.activity[left_var.index()] {
                    largest_pos = left_pos;
                    largest_var = left_var;
                }
            }

            let right_pos = pos * 2 + 2;
            if right_pos < self.heap.len() {
                let right_var = self.heap[right_pos];
                if self.activity[largest_var.index()] < self.activity[right_var.index()] {
                    largest_pos = right_pos;
                    largest_var = right_var;
                }
            }

            if largest_pos == pos {
                return;
            }

            self.position[var.index()] = Some(largest_pos);
            self.heap[largest_pos] = var;
            self.position[largest_var.index()] = Some(pos);
            self.heap[pos] = largest_var;
            pos = largest_pos;
        }
    }
}

impl Iterator for Lrb {
    type Item = Var;

    fn next(&mut self) -> Option<Var> {
        if self.heap.is_empty() {
            None
        } else {
            let var = self.heap.swap_remove(0);
            if !self.heap.is_empty() {
                let top_var = self.heap[0];
                self.position[top_var.index()] = Some(0);
                self.sift_down(0);
            }
            self.position[var.index()] = None;
            Some(var)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unassigned_vars_are_reinserted() {
        let config = SolverConfig::default();
        let mut lrb = Lrb::new(&config);
        lrb.set_var_count(4);

        let var = lrb.next().unwrap();
        lrb.on_assigned(var);
        lrb.process_conflict(&[var]);
        lrb.on_unassigned(var);

        assert!(lrb.position[var.index()].is_some());
    }
}
