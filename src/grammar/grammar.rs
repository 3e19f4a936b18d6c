use std::{
    collections::{BTreeSet, HashMap},
    fmt,
};

use log::trace;
use serde::{Serialize, Serializer};

use super::{END_MARK, EPSILON};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Symbol {
    Terminal(char),
    NonTerminal(String),
    Epsilon,
    EndMarker,
}

impl Symbol {
    pub fn non_terminal(&self) -> Option<&str> {
        match self {
            Symbol::NonTerminal(name) => Some(name.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Terminal(c) => write!(f, "{}", c),
            Symbol::NonTerminal(name) => f.write_str(name),
            Symbol::Epsilon => write!(f, "{}", EPSILON),
            Symbol::EndMarker => write!(f, "{}", END_MARK),
        }
    }
}

impl Serialize for Symbol {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The right-hand side of one alternative. An empty sequence is the ε production.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Production(Vec<Symbol>);

impl Production {
    pub fn new(symbols: Vec<Symbol>) -> Self {
        Self(
            symbols
                .into_iter()
                .filter(|s| *s != Symbol::Epsilon)
                .collect(),
        )
    }

    pub fn epsilon() -> Self {
        Self(Vec::new())
    }

    pub fn is_epsilon(&self) -> bool {
        self.0.is_empty()
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.0
    }

    pub fn first(&self) -> Option<&Symbol> {
        self.0.first()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn starts_with(&self, prefix: &[Symbol]) -> bool {
        self.0.starts_with(prefix)
    }

    /// Builds `head · rest`.
    pub fn splice(head: &Production, rest: &[Symbol]) -> Self {
        Self(head.0.iter().chain(rest.iter()).cloned().collect())
    }

    pub fn push(&mut self, symbol: Symbol) {
        if symbol != Symbol::Epsilon {
            self.0.push(symbol);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.0.iter()
    }
}

impl From<&[Symbol]> for Production {
    fn from(symbols: &[Symbol]) -> Self {
        Self::new(symbols.to_vec())
    }
}

impl fmt::Display for Production {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "{}", EPSILON);
        }
        for s in &self.0 {
            write!(f, "{}", s)?;
        }
        Ok(())
    }
}

impl Serialize for Production {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonTerminal {
    pub name: String,
    /// Processing rank, always equal to the position in [`Grammar::order`].
    pub rank: usize,
    pub productions: Vec<Production>,
}

impl NonTerminal {
    pub fn new(name: String, rank: usize) -> Self {
        Self {
            name,
            rank,
            productions: Vec::new(),
        }
    }

    /// Adds an alternative unless it is already present.
    pub fn add_production(&mut self, production: Production) -> bool {
        if self.productions.contains(&production) {
            return false;
        }
        self.productions.push(production);
        true
    }

    pub fn is_left_recursive(&self) -> bool {
        self.productions
            .iter()
            .any(|p| p.first().and_then(Symbol::non_terminal) == Some(self.name.as_str()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grammar {
    non_terminals: HashMap<String, NonTerminal>,
    order: Vec<String>,
    terminals: BTreeSet<char>,
}

impl Grammar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_symbol(&self) -> Option<&str> {
        self.order.first().map(|s| s.as_str())
    }

    /// Nonterminal names in definition order.
    pub fn order(&self) -> &[String] {
        &self.order
    }

    pub fn terminals(&self) -> &BTreeSet<char> {
        &self.terminals
    }

    pub fn terminal_iter(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.terminals.iter().map(|&c| Symbol::Terminal(c))
    }

    pub fn non_terminal_iter(&self) -> impl Iterator<Item = &NonTerminal> {
        self.order.iter().filter_map(|n| self.non_terminals.get(n))
    }

    pub fn non_terminal(&self, name: &str) -> Option<&NonTerminal> {
        self.non_terminals.get(name)
    }

    pub fn contains_non_terminal(&self, name: &str) -> bool {
        self.non_terminals.contains_key(name)
    }

    pub fn productions(&self, name: &str) -> &[Production] {
        self.non_terminals
            .get(name)
            .map(|nt| nt.productions.as_slice())
            .unwrap_or(&[])
    }

    pub fn rank(&self, name: &str) -> Option<usize> {
        self.non_terminals.get(name).map(|nt| nt.rank)
    }

    /// Registers `name` at the end of the definition order if it is new.
    pub fn add_non_terminal(&mut self, name: &str) -> usize {
        if let Some(nt) = self.non_terminals.get(name) {
            return nt.rank;
        }
        let rank = self.order.len();
        self.order.push(name.to_string());
        self.non_terminals
            .insert(name.to_string(), NonTerminal::new(name.to_string(), rank));
        rank
    }

    /// Adds `left -> production`, registering `left` and every symbol the
    /// alternative mentions. Returns false for a duplicate alternative.
    pub fn add_production(&mut self, left: &str, production: Production) -> bool {
        self.add_non_terminal(left);
        for symbol in production.iter() {
            match symbol {
                Symbol::Terminal(c) => {
                    self.terminals.insert(*c);
                }
                Symbol::NonTerminal(name) => {
                    self.add_non_terminal(name);
                }
                _ => {}
            }
        }
        self.non_terminals
            .get_mut(left)
            .map(|nt| nt.add_production(production))
            .unwrap_or(false)
    }

    /// Replaces every alternative of `left`, collapsing duplicates.
    pub(crate) fn set_productions(&mut self, left: &str, productions: Vec<Production>) {
        if let Some(nt) = self.non_terminals.get_mut(left) {
            nt.productions.clear();
            for p in productions {
                nt.add_production(p);
            }
        }
    }

    pub(crate) fn take_productions(&mut self, left: &str) -> Vec<Production> {
        self.non_terminals
            .get_mut(left)
            .map(|nt| std::mem::take(&mut nt.productions))
            .unwrap_or_default()
    }

    /// Picks an unused name by appending apostrophes to `base`, registers it
    /// with no alternatives and ranks it immediately after `base`.
    pub fn fresh_non_terminal(&mut self, base: &str) -> String {
        let mut name = format!("{}'", base);
        while self.non_terminals.contains_key(&name) {
            name.push('\'');
        }

        let position = match self.order.iter().position(|n| n == base) {
            Some(i) => i + 1,
            None => self.order.len(),
        };
        self.order.insert(position, name.clone());
        self.non_terminals
            .insert(name.clone(), NonTerminal::new(name.clone(), position));
        self.renumber(position);

        trace!("fresh non-terminal `{}` ranked {} after `{}`", name, position, base);
        name
    }

    fn renumber(&mut self, from: usize) {
        for (rank, name) in self.order.iter().enumerate().skip(from) {
            if let Some(nt) = self.non_terminals.get_mut(name) {
                nt.rank = rank;
            }
        }
    }

    /// All rules as `A -> α` strings, in definition order.
    pub fn rules(&self) -> Vec<String> {
        self.non_terminal_iter()
            .flat_map(|nt| {
                nt.productions
                    .iter()
                    .map(move |p| format!("{} -> {}", nt.name, p))
            })
            .collect()
    }
}
