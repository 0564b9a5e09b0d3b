use std::io::{self, Write};

use crate::lit::Lit;

use super::ProofStep;

/// Writes a single proof step in DRAT format.
pub fn write_step(target: &mut impl Write, step: &ProofStep) -> io::Result<()> {
    match step {
        ProofStep::AddClause(clause) => write_literals(target, clause),
        ProofStep::DeleteClause(clause) => {
            target.write_all(b"d ")?;
            write_literals(target, clause)
        }
    }
}

/// Writes the literals of a clause for a step in a DRAT proof.
fn write_literals(target: &mut impl Write, literals: &[Lit]) -> io::Result<()> {
    for &lit in literals {
        itoa::write(&mut *target, lit.to_dimacs())?;
        target.write_all(b" ")?;
    }
    target.write_all(b"0\n")?;
    Ok(())
}
