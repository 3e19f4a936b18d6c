use std::fmt;

use serde::Serialize;
use thiserror::Error;

use super::grammar::{Production, Symbol};

/// Where a reserved symbol was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Location {
    Grammar { line: usize },
    Input,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Grammar { line } => write!(f, "Line {}", line),
            Location::Input => f.write_str("Input"),
        }
    }
}

/// Two different productions competing for one cell of the LL(1) table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableConflict {
    pub non_terminal: String,
    pub terminal: Symbol,
    pub existing: Production,
    pub incoming: Production,
}

impl fmt::Display for TableConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "M[{nt}, {t}]: {nt} -> {} / {nt} -> {}",
            self.existing,
            self.incoming,
            nt = self.non_terminal,
            t = self.terminal
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    #[error("Line {line}: missing \"->\"")]
    MissingArrow { line: usize },

    #[error("Line {line}: `{lhs}` is not a valid non-terminal")]
    InvalidLeftHandSide { line: usize, lhs: String },

    /// `$` is the end marker and cannot be written by hand.
    #[error("{location}, column {column}: reserved symbol `$`")]
    ReservedSymbolMisuse { location: Location, column: usize },

    #[error("Grammar has no production")]
    EmptyGrammar,

    /// The grammar is not LL(1). Every conflicting cell is listed.
    #[error(
        "Grammar is not LL(1): {}",
        .0.iter().map(|c| c.to_string()).collect::<Vec<_>>().join("; ")
    )]
    TableConflict(Vec<TableConflict>),

    #[error("{stage} did not settle within {limit} iterations")]
    IterationLimit { stage: &'static str, limit: usize },
}
