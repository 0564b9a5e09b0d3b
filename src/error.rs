//! Errors surfaced by the solver core.

/// Error returned by operations that can be rejected because they would make the formula
/// unsatisfiable.
///
/// This is not used for search results (see [`crate::search::SolveResult`]), only for input
/// operations such as [`crate::solver::Solver::add_clause`].
#[derive(Debug, Clone, Copy, Eq, PartialEq, thiserror::Error)]
#[error("formula is unsatisfiable")]
pub struct Unsat;

/// Errors that can occur while writing to an attached DRUP proof sink.
#[derive(Debug, thiserror::Error)]
pub enum ProofError {
    #[error("error writing to the proof sink")]
    Io(#[from] std::io::Error),
}
