use log::{debug, warn};

use super::{
    error::{GrammarError, Location},
    grammar::{Production, Symbol},
    Grammar, ARROW, END_MARK, EPSILON,
};

/// A nonterminal token is one uppercase ASCII letter followed by apostrophes.
pub fn is_non_terminal(token: &str) -> bool {
    let mut chars = token.chars();
    match chars.next() {
        Some(c) if c.is_ascii_uppercase() => chars.all(|c| c == '\''),
        _ => false,
    }
}

/// Splits a rule into its textual tokens: each uppercase letter together with
/// its trailing apostrophes, and every other character on its own.
pub fn split_symbols(rule: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut rest = rule;
    while let Some(c) = rest.chars().next() {
        let mut end = c.len_utf8();
        if c.is_ascii_uppercase() {
            end += rest[end..].chars().take_while(|&c| c == '\'').count();
        }
        tokens.push(&rest[..end]);
        rest = &rest[end..];
    }
    tokens
}

fn classify(token: &str) -> Symbol {
    if is_non_terminal(token) {
        return Symbol::NonTerminal(token.to_string());
    }
    match token.chars().next() {
        Some(EPSILON) => Symbol::Epsilon,
        Some(END_MARK) => Symbol::EndMarker,
        Some(c) => Symbol::Terminal(c),
        None => Symbol::Epsilon,
    }
}

/// Tokenizes a right-hand side. `&` tokens vanish, so `&` alone is the ε production.
pub fn tokenize(rule: &str) -> Production {
    Production::new(split_symbols(rule).into_iter().map(classify).collect())
}

fn check_reserved(text: &str, location: Location) -> Result<(), GrammarError> {
    match text.chars().position(|c| c == END_MARK) {
        Some(i) => Err(GrammarError::ReservedSymbolMisuse {
            location,
            column: i + 1,
        }),
        None => Ok(()),
    }
}

impl Grammar {
    pub fn parse(grammar: &str) -> Result<Self, GrammarError> {
        let mut g = Self::new();

        for (i, line) in grammar.lines().enumerate() {
            if line.chars().all(|c| c.is_whitespace()) {
                continue;
            }
            let line_no = i + 1;
            check_reserved(line, Location::Grammar { line: line_no })?;

            let (left, right) = line
                .split_once(ARROW)
                .ok_or(GrammarError::MissingArrow { line: line_no })?;
            if !is_non_terminal(left) {
                return Err(GrammarError::InvalidLeftHandSide {
                    line: line_no,
                    lhs: left.to_string(),
                });
            }

            g.add_production(left, tokenize(right));
        }

        for nt in g.non_terminal_iter() {
            if nt.productions.is_empty() {
                warn!("`{}` is used but has no production", nt.name);
            }
        }
        debug!(
            "parsed grammar with {} non-terminals and {} terminals",
            g.order().len(),
            g.terminals().len()
        );
        Ok(g)
    }
}

/// Tokenizes parser input: every character is one terminal and `&` is dropped.
pub fn tokenize_input(input: &str) -> Result<Vec<Symbol>, GrammarError> {
    check_reserved(input, Location::Input)?;
    Ok(input
        .chars()
        .filter(|&c| c != EPSILON)
        .map(Symbol::Terminal)
        .collect())
}
