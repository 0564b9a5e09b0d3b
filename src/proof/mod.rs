//! DRUP/DRAT proof generation.
//!
//! Unlike the upstream solver this is distilled from, there is no on-the-fly proof checker and no
//! separate binary or self-describing wire format here: proof consumption is an external-tooling
//! concern (run `drat-trim` on the emitted file). What's kept is the part that is actually the
//! solver's own responsibility: emitting a valid clause addition/deletion trace as clauses are
//! learned (§4.4), strengthened or eliminated (§4.8).
use std::io::{self, sink, BufWriter, Write};

use crate::lit::Lit;

mod drat;

/// A single clause mutation to record in the proof.
pub enum ProofStep<'a> {
    /// The given clause is redundant: assuming the negation of its literals leads to a unit
    /// propagation conflict against the clauses already in the proof.
    AddClause(&'a [Lit]),
    /// The given clause, in its current (possibly already strengthened) form, is removed.
    DeleteClause(&'a [Lit]),
}

/// DRAT proof generation sink.
///
/// Writes nothing until [`Proof::write_to`] attaches a target.
pub struct Proof<'a> {
    target: BufWriter<Box<dyn Write + 'a>>,
    active: bool,
    io_error: Option<io::Error>,
}

impl<'a> Default for Proof<'a> {
    fn default() -> Proof<'a> {
        Proof {
            target: BufWriter::new(Box::new(sink())),
            active: false,
            io_error: None,
        }
    }
}

impl<'a> Proof<'a> {
    /// Start writing a DRAT proof to the given target.
    pub fn write_to(&mut self, target: impl Write + 'a) {
        self.target = BufWriter::new(Box::new(target));
        self.active = true;
        self.io_error = None;
    }

    /// Stop writing proof steps, flushing any buffered output.
    pub fn close(&mut self) {
        if self.active {
            if let Err(err) = self.target.flush() {
                self.io_error = Some(err);
            }
        }
        self.active = false;
        self.target = BufWriter::new(Box::new(sink()));
    }

    /// Whether proof generation is active.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// The most recent I/O error encountered while writing, if any.
    ///
    /// Writing a proof is best-effort logging, not something that should abort a search on
    /// failure, so errors are recorded here instead of propagated from [`Proof::add_step`].
    pub fn take_error(&mut self) -> Option<io::Error> {
        self.io_error.take()
    }

    /// Record a proof step.
    ///
    /// A no-op when proof generation is inactive.
    pub fn add_step(&mut self, step: ProofStep) {
        if !self.active {
            return;
        }
        if let Err(err) = drat::write_step(&mut self.target, &step) {
            self.io_error = Some(err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::lit::Var;

    fn lit(v: i32) -> Lit {
        let var = Var::from_index((v.unsigned_abs() - 1) as usize);
        Lit::from_var(var, v < 0)
    }

    #[test]
    fn writes_add_and_delete_lines() {
        let mut owned = Vec::new();
        let mut proof = Proof::default();
        assert!(!proof.is_active());
        proof.write_to(io::Cursor::new(&mut owned));
        assert!(proof.is_active());
        proof.add_step(ProofStep::AddClause(&[lit(1), lit(-2)]));
        proof.add_step(ProofStep::DeleteClause(&[lit(1), lit(-2)]));
        proof.close();
        assert!(!proof.is_active());
        assert!(proof.take_error().is_none());

        let text = String::from_utf8(owned).unwrap();
        assert_eq!(text, "1 -2 0\nd 1 -2 0\n");
    }

    #[test]
    fn inactive_proof_writes_nothing() {
        let mut proof = Proof::default();
        proof.add_step(ProofStep::AddClause(&[lit(1)]));
    }
}
