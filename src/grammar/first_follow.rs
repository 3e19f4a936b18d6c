use std::collections::{BTreeMap, BTreeSet};

use log::debug;
use serde::Serialize;

use super::{error::GrammarError, grammar::Symbol, Grammar, DEFAULT_ITERATION_LIMIT};

pub type SymbolSet = BTreeSet<Symbol>;

/// FIRST of every nonterminal. Contains [`Symbol::Epsilon`] exactly when the
/// nonterminal is nullable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FirstSets(BTreeMap<String, SymbolSet>);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FollowSets(BTreeMap<String, SymbolSet>);

impl FirstSets {
    pub fn get(&self, name: &str) -> Option<&SymbolSet> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &SymbolSet)> {
        self.0.iter()
    }

    pub fn is_nullable(&self, name: &str) -> bool {
        self.0
            .get(name)
            .map_or(false, |set| set.contains(&Symbol::Epsilon))
    }

    pub fn of_symbol(&self, symbol: &Symbol) -> SymbolSet {
        match symbol {
            Symbol::NonTerminal(name) => self.0.get(name).cloned().unwrap_or_default(),
            other => BTreeSet::from([other.clone()]),
        }
    }

    /// FIRST of a symbol string; ε is included when every symbol is nullable,
    /// in particular for the empty string.
    pub fn of_sequence(&self, symbols: &[Symbol]) -> SymbolSet {
        let mut first = SymbolSet::new();
        for symbol in symbols {
            let f = self.of_symbol(symbol);
            let nullable = f.contains(&Symbol::Epsilon);
            first.extend(f.into_iter().filter(|s| *s != Symbol::Epsilon));
            if !nullable {
                return first;
            }
        }
        first.insert(Symbol::Epsilon);
        first
    }
}

impl FollowSets {
    pub fn get(&self, name: &str) -> Option<&SymbolSet> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &SymbolSet)> {
        self.0.iter()
    }
}

/// Unions `update` into `sets[name]`, reporting growth.
fn extend_set(sets: &mut BTreeMap<String, SymbolSet>, name: &str, update: SymbolSet) -> bool {
    let set = sets.entry(name.to_string()).or_default();
    let before = set.len();
    set.extend(update);
    set.len() != before
}

impl Grammar {
    pub fn first_sets(&self) -> Result<FirstSets, GrammarError> {
        self.first_sets_with(DEFAULT_ITERATION_LIMIT)
    }

    /// Iterates to a fixed point, so mutually referencing nonterminals only
    /// ever read the sets computed so far.
    pub fn first_sets_with(&self, limit: usize) -> Result<FirstSets, GrammarError> {
        let mut first = FirstSets(
            self.order()
                .iter()
                .map(|name| (name.clone(), SymbolSet::new()))
                .collect(),
        );

        let mut rounds = 0;
        let mut changed = true;
        while changed {
            rounds += 1;
            if rounds > limit {
                return Err(GrammarError::IterationLimit {
                    stage: "FIRST",
                    limit,
                });
            }

            changed = false;
            for nt in self.non_terminal_iter() {
                let update = nt
                    .productions
                    .iter()
                    .fold(SymbolSet::new(), |mut update, production| {
                        update.extend(first.of_sequence(production.symbols()));
                        update
                    });
                changed |= extend_set(&mut first.0, &nt.name, update);
            }
        }

        debug!("FIRST settled after {} rounds", rounds);
        Ok(first)
    }

    pub fn follow_sets(&self, first: &FirstSets) -> Result<FollowSets, GrammarError> {
        self.follow_sets_with(first, DEFAULT_ITERATION_LIMIT)
    }

    pub fn follow_sets_with(
        &self,
        first: &FirstSets,
        limit: usize,
    ) -> Result<FollowSets, GrammarError> {
        let mut follow: BTreeMap<String, SymbolSet> = self
            .order()
            .iter()
            .map(|name| (name.clone(), SymbolSet::new()))
            .collect();
        if let Some(start) = self.start_symbol() {
            extend_set(&mut follow, start, BTreeSet::from([Symbol::EndMarker]));
        }

        let mut rounds = 0;
        let mut changed = true;
        while changed {
            rounds += 1;
            if rounds > limit {
                return Err(GrammarError::IterationLimit {
                    stage: "FOLLOW",
                    limit,
                });
            }

            changed = false;
            for nt in self.non_terminal_iter() {
                for production in &nt.productions {
                    let symbols = production.symbols();
                    for (k, symbol) in symbols.iter().enumerate() {
                        let b = match symbol {
                            Symbol::NonTerminal(b) => b,
                            _ => continue,
                        };
                        let rest = first.of_sequence(&symbols[k + 1..]);
                        let mut update: SymbolSet = rest
                            .iter()
                            .filter(|s| **s != Symbol::Epsilon)
                            .cloned()
                            .collect();
                        if rest.contains(&Symbol::Epsilon) {
                            if let Some(left_follow) = follow.get(&nt.name) {
                                update.extend(left_follow.iter().cloned());
                            }
                        }
                        changed |= extend_set(&mut follow, b, update);
                    }
                }
            }
        }

        debug!("FOLLOW settled after {} rounds", rounds);
        Ok(FollowSets(follow))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(s: &str) -> SymbolSet {
        s.chars()
            .map(|c| match c {
                '&' => Symbol::Epsilon,
                '$' => Symbol::EndMarker,
                c => Symbol::Terminal(c),
            })
            .collect()
    }

    fn expression_grammar() -> Grammar {
        Grammar::parse("E->E+T\nE->T\nT->T*F\nT->F\nF->(E)\nF->i")
            .unwrap()
            .eliminate_left_recursion()
            .unwrap()
    }

    #[test]
    fn expression_first_follow() {
        let g = expression_grammar();
        let first = g.first_sets().unwrap();
        let follow = g.follow_sets(&first).unwrap();

        assert_eq!(first.get("E"), Some(&set("(i")));
        assert_eq!(first.get("E'"), Some(&set("+&")));
        assert_eq!(first.get("T"), Some(&set("(i")));
        assert_eq!(first.get("T'"), Some(&set("*&")));
        assert_eq!(first.get("F"), Some(&set("(i")));

        assert_eq!(follow.get("E"), Some(&set(")$")));
        assert_eq!(follow.get("E'"), Some(&set(")$")));
        assert_eq!(follow.get("T"), Some(&set("+)$")));
        assert_eq!(follow.get("T'"), Some(&set("+)$")));
        assert_eq!(follow.get("F"), Some(&set("*+)$")));
    }

    #[test]
    fn terminal_first_is_itself() {
        let first = FirstSets::default();
        assert_eq!(first.of_symbol(&Symbol::Terminal('x')), set("x"));
        assert_eq!(first.of_symbol(&Symbol::EndMarker), set("$"));
        assert_eq!(first.of_sequence(&[]), set("&"));
    }

    #[test]
    fn nullable_through_chain() {
        let g = Grammar::parse("S->ABc\nA->a\nA->&\nB->&\nB->b\nC->AB").unwrap();
        let first = g.first_sets().unwrap();

        assert_eq!(first.get("S"), Some(&set("abc")));
        assert_eq!(first.get("C"), Some(&set("ab&")));
        assert!(first.is_nullable("A"));
        assert!(!first.is_nullable("S"));

        let follow = g.follow_sets(&first).unwrap();
        // c follows A across the nullable B
        assert_eq!(follow.get("A"), Some(&set("bc")));
        assert_eq!(follow.get("S"), Some(&set("$")));
    }

    #[test]
    fn mutually_referencing_non_terminals_terminate() {
        let g = Grammar::parse("A->Ba\nA->c\nB->Ab\nB->d").unwrap();
        let first = g.first_sets().unwrap();
        assert_eq!(first.get("A"), Some(&set("cd")));
        assert_eq!(first.get("B"), Some(&set("cd")));

        let follow = g.follow_sets(&first).unwrap();
        assert_eq!(follow.get("A"), Some(&set("$b")));
        assert_eq!(follow.get("B"), Some(&set("a")));
    }

    #[test]
    fn iteration_limit_is_reported() {
        let g = expression_grammar();
        assert_eq!(
            g.first_sets_with(1),
            Err(GrammarError::IterationLimit {
                stage: "FIRST",
                limit: 1
            })
        );
    }
}
