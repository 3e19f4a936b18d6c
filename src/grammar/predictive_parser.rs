use std::fmt;

use log::{debug, trace};
use serde::Serialize;

use super::{
    error::GrammarError,
    grammar::{Production, Symbol},
    ll1_parsing_table::LL1ParsingTable,
    parse::tokenize_input,
    DEFAULT_ITERATION_LIMIT,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParseStatus {
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RejectReason {
    /// A terminal on the stack differs from the input symbol.
    Mismatch,
    /// No table entry for the nonterminal on the stack and the input symbol.
    UnexpectedSymbol,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RejectReason::Mismatch => "mismatch",
            RejectReason::UnexpectedSymbol => "unexpected symbol",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TraceAction {
    Match,
    Apply {
        non_terminal: String,
        production: Production,
    },
    Accept,
    Error(RejectReason),
}

impl fmt::Display for TraceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceAction::Match => Ok(()),
            TraceAction::Apply {
                non_terminal,
                production,
            } => write!(f, "{} -> {}", non_terminal, production),
            TraceAction::Accept => f.write_str("accept"),
            TraceAction::Error(reason) => write!(f, "error: {}", reason),
        }
    }
}

/// One configuration of the automaton and the action taken from it.
/// The stack is listed bottom to top.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceRow {
    pub stack: Vec<Symbol>,
    pub input: Vec<Symbol>,
    pub action: TraceAction,
}

fn concat(symbols: &[Symbol]) -> String {
    symbols.iter().map(|s| s.to_string()).collect()
}

impl TraceRow {
    pub fn stack_string(&self) -> String {
        concat(&self.stack)
    }

    pub fn input_string(&self) -> String {
        concat(&self.input)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseTrace {
    rows: Vec<TraceRow>,
    status: ParseStatus,
}

impl ParseTrace {
    fn new() -> Self {
        Self {
            rows: Vec::new(),
            status: ParseStatus::Rejected,
        }
    }

    fn push(&mut self, stack: &[Symbol], input: &[Symbol], action: TraceAction) {
        trace!("{:>12} {:>12} {}", concat(stack), concat(input), action);
        self.rows.push(TraceRow {
            stack: stack.to_vec(),
            input: input.to_vec(),
            action,
        });
    }

    pub fn rows(&self) -> &[TraceRow] {
        &self.rows
    }

    pub fn status(&self) -> ParseStatus {
        self.status
    }

    pub fn is_accepted(&self) -> bool {
        self.status == ParseStatus::Accepted
    }

    pub fn last(&self) -> Option<&TraceRow> {
        self.rows.last()
    }
}

impl LL1ParsingTable {
    /// Parses `input` from `start`. A rejected input is a normal result; only
    /// a reserved symbol in the input is an error.
    pub fn parse(&self, start: &str, input: &str) -> Result<ParseTrace, GrammarError> {
        self.parse_with(start, input, DEFAULT_ITERATION_LIMIT)
    }

    /// Like [`parse`](Self::parse), failing with `IterationLimit` after
    /// `limit` steps. Only a table built from a non-LL(1) grammar can need it.
    pub fn parse_with(
        &self,
        start: &str,
        input: &str,
        limit: usize,
    ) -> Result<ParseTrace, GrammarError> {
        let tokens = tokenize_input(input)?;
        self.parse_symbols(start, tokens, limit)
    }

    pub fn parse_symbols(
        &self,
        start: &str,
        mut input: Vec<Symbol>,
        limit: usize,
    ) -> Result<ParseTrace, GrammarError> {
        input.push(Symbol::EndMarker);
        let mut stack: Vec<Symbol> = vec![Symbol::EndMarker, Symbol::NonTerminal(start.to_string())];
        let mut pos = 0;
        let mut trace = ParseTrace::new();

        while let Some(top) = stack.last().cloned() {
            if trace.rows.len() >= limit {
                return Err(GrammarError::IterationLimit {
                    stage: "parse",
                    limit,
                });
            }
            let cur = input.get(pos).cloned().unwrap_or(Symbol::EndMarker);
            let rest = &input[pos.min(input.len())..];

            match &top {
                Symbol::NonTerminal(name) => match self.get(name, &cur) {
                    Some(production) => {
                        let action = TraceAction::Apply {
                            non_terminal: name.clone(),
                            production: production.clone(),
                        };
                        trace.push(&stack, rest, action);
                        stack.pop();
                        stack.extend(production.symbols().iter().rev().cloned());
                    }
                    None => {
                        trace.push(&stack, rest, TraceAction::Error(RejectReason::UnexpectedSymbol));
                        debug!("rejected: no entry for M[{}, {}]", name, cur);
                        return Ok(trace);
                    }
                },
                _ if top == cur => {
                    trace.push(&stack, rest, TraceAction::Match);
                    stack.pop();
                    pos += 1;
                }
                _ => {
                    trace.push(&stack, rest, TraceAction::Error(RejectReason::Mismatch));
                    debug!("rejected: expected `{}`, found `{}`", top, cur);
                    return Ok(trace);
                }
            }
        }

        trace.push(&[], &[], TraceAction::Accept);
        trace.status = ParseStatus::Accepted;
        debug!("accepted after {} steps", trace.rows.len());
        Ok(trace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::Grammar;

    fn table(text: &str) -> LL1ParsingTable {
        let g = Grammar::parse(text)
            .unwrap()
            .eliminate_left_recursion()
            .unwrap()
            .left_factor();
        let first = g.first_sets().unwrap();
        let follow = g.follow_sets(&first).unwrap();
        g.generate_ll1_parsing_table(&first, &follow).unwrap()
    }

    fn columns(trace: &ParseTrace) -> Vec<(String, String, String)> {
        trace
            .rows()
            .iter()
            .map(|r| (r.stack_string(), r.input_string(), r.action.to_string()))
            .collect()
    }

    #[test]
    fn accepts_with_full_trace() {
        let t = table("S->aSb\nS->c");
        let trace = t.parse("S", "acb").unwrap();

        assert_eq!(trace.status(), ParseStatus::Accepted);
        let expected: Vec<(String, String, String)> = [
            ("$S", "acb$", "S -> aSb"),
            ("$bSa", "acb$", ""),
            ("$bS", "cb$", "S -> c"),
            ("$bc", "cb$", ""),
            ("$b", "b$", ""),
            ("$", "$", ""),
            ("", "", "accept"),
        ]
        .iter()
        .map(|(a, b, c)| (a.to_string(), b.to_string(), c.to_string()))
        .collect();
        assert_eq!(columns(&trace), expected);
    }

    #[test]
    fn epsilon_pushes_nothing() {
        let t = table("S->aS\nS->&");
        let trace = t.parse("S", "aa").unwrap();
        assert!(trace.is_accepted());
        let apply_eps = trace
            .rows()
            .iter()
            .position(|r| r.action.to_string() == "S -> &")
            .unwrap();
        assert_eq!(trace.rows()[apply_eps + 1].stack_string(), "$");
    }

    #[test]
    fn unknown_symbol_is_rejected() {
        let t = table("S->aSb\nS->c");
        let trace = t.parse("S", "axb").unwrap();
        assert_eq!(trace.status(), ParseStatus::Rejected);
        let last = trace.last().unwrap();
        assert_eq!(last.action, TraceAction::Error(RejectReason::UnexpectedSymbol));
        assert_eq!(last.action.to_string(), "error: unexpected symbol");
        assert_eq!(last.stack_string(), "$bS");
        assert_eq!(last.input_string(), "xb$");
    }

    #[test]
    fn terminal_mismatch_is_rejected() {
        let t = table("S->aSb\nS->c");
        let trace = t.parse("S", "acc").unwrap();
        assert!(!trace.is_accepted());
        assert_eq!(
            trace.last().unwrap().action,
            TraceAction::Error(RejectReason::Mismatch)
        );
    }

    #[test]
    fn input_ending_early_is_rejected() {
        let t = table("S->aSb\nS->c");
        let trace = t.parse("S", "ac").unwrap();
        assert!(!trace.is_accepted());
        assert_eq!(trace.last().unwrap().input_string(), "$");
    }

    #[test]
    fn runaway_expansion_hits_step_limit() {
        // without elimination M[S, b] holds `Sa`, which expands forever
        let g = Grammar::parse("S->Sa\nS->b").unwrap();
        let first = g.first_sets().unwrap();
        let follow = g.follow_sets(&first).unwrap();
        let (t, conflicts) = LL1ParsingTable::build(&g, &first, &follow);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(
            t.parse_with("S", "ba", 50),
            Err(GrammarError::IterationLimit {
                stage: "parse",
                limit: 50
            })
        );
    }

    #[test]
    fn step_limit_counts_rows() {
        let t = table("S->a");
        assert!(t.parse_with("S", "a", 3).unwrap().is_accepted());
        assert!(matches!(
            t.parse_with("S", "a", 2),
            Err(GrammarError::IterationLimit { .. })
        ));
    }

    #[test]
    fn end_marker_in_input_is_an_error() {
        let t = table("S->a");
        assert!(matches!(
            t.parse("S", "a$"),
            Err(GrammarError::ReservedSymbolMisuse { .. })
        ));
    }
}
