//! Per-variable bookkeeping that isn't part of the trail.
use crate::lit::Var;

/// Per-variable data outside of the assignment/trail.
#[derive(Copy, Clone, Default)]
pub struct VarData {
    /// Excluded from variable elimination while frozen (e.g. part of the current assumptions).
    pub frozen: bool,
    /// Whether branching may pick this variable.
    pub decision: bool,
    /// Set once a variable has been removed by bounded variable elimination.
    pub eliminated: bool,
}

/// Tracks per-variable flags not already covered by the assignment or the implication graph.
#[derive(Default)]
pub struct Variables {
    var_data: Vec<VarData>,
}

impl Variables {
    /// Update structures for a new variable count.
    ///
    /// Newly created variables default to being decision variables and not frozen.
    pub fn set_var_count(&mut self, count: usize) {
        self.var_data.resize(
            count,
            VarData {
                frozen: false,
                decision: true,
                eliminated: false,
            },
        );
    }

    pub fn count(&self) -> usize {
        self.var_data.len()
    }

    pub fn is_frozen(&self, var: Var) -> bool {
        self.var_data[var.index()].frozen
    }

    pub fn set_frozen(&mut self, var: Var, frozen: bool) {
        self.var_data[var.index()].frozen = frozen;
    }

    pub fn is_decision_var(&self, var: Var) -> bool {
        self.var_data[var.index()].decision
    }

    pub fn set_decision(&mut self, var: Var, decision: bool) {
        self.var_data[var.index()].decision = decision;
    }

    pub fn is_eliminated(&self, var: Var) -> bool {
        self.var_data[var.index()].eliminated
    }

    pub fn set_eliminated(&mut self, var: Var, eliminated: bool) {
        self.var_data[var.index()].eliminated = eliminated;
        // Eliminated variables are not branched on; restoring one (e.g. because it became frozen
        // again for a later incremental solve) makes it a decision variable again.
        self.var_data[var.index()].decision = !eliminated;
    }

    pub fn iter(&self) -> impl Iterator<Item = Var> + '_ {
        (0..self.var_data.len()).map(Var::from_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_variables_are_decision_vars() {
        let mut variables = Variables::default();
        variables.set_var_count(3);
        for var in variables.iter() {
            assert!(variables.is_decision_var(var));
            assert!(!variables.is_frozen(var));
            assert!(!variables.is_eliminated(var));
        }
    }

    #[test]
    fn eliminating_clears_decision_flag() {
        let mut variables = Variables::default();
        variables.set_var_count(1);
        let var = Var::from_index(0);
        variables.set_eliminated(var, true);
        assert!(!variables.is_decision_var(var));
        variables.set_eliminated(var, false);
        assert!(variables.is_decision_var(var));
    }
}
