use std::collections::{HashSet, VecDeque};

use log::{debug, trace, warn};

use super::{
    error::GrammarError,
    grammar::{Production, Symbol},
    Grammar, DEFAULT_ITERATION_LIMIT,
};

/// How alternatives led by an earlier-ranked nonterminal are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EliminationPolicy {
    /// Substitute every such alternative (Paull's algorithm as usually stated).
    #[default]
    Always,
    /// Substitute only when some expansion leads back to the nonterminal
    /// being processed; otherwise keep the alternative as written.
    OnlyWhenRecursive,
}

fn leads_with(production: &Production, name: &str) -> bool {
    production.first().and_then(Symbol::non_terminal) == Some(name)
}

impl Grammar {
    pub fn eliminate_left_recursion(&self) -> Result<Grammar, GrammarError> {
        self.eliminate_left_recursion_with(EliminationPolicy::default(), DEFAULT_ITERATION_LIMIT)
    }

    /// Paull's algorithm over the nonterminals in rank order. Nonterminals
    /// generated on the way rank right after their base and are visited too.
    pub fn eliminate_left_recursion_with(
        &self,
        policy: EliminationPolicy,
        limit: usize,
    ) -> Result<Grammar, GrammarError> {
        let mut g = self.clone();

        let mut i = 0;
        while i < g.order().len() {
            let name = g.order()[i].clone();
            g.substitute_earlier(&name, policy, limit)?;
            if g.non_terminal(&name).map_or(false, |nt| nt.is_left_recursive()) {
                g.remove_direct_left_recursion(&name);
            }
            i += 1;
        }

        debug!(
            "left recursion eliminated: {} non-terminals",
            g.order().len()
        );
        Ok(g)
    }

    fn substitute_earlier(
        &mut self,
        name: &str,
        policy: EliminationPolicy,
        limit: usize,
    ) -> Result<(), GrammarError> {
        let rank = match self.rank(name) {
            Some(rank) => rank,
            None => return Ok(()),
        };

        let old_productions = self.take_productions(name);
        let mut productions = Vec::with_capacity(old_productions.len());
        for production in old_productions {
            let expansions = self.expand_below(rank, production.clone(), limit)?;
            let keep_original = policy == EliminationPolicy::OnlyWhenRecursive
                && !expansions.iter().any(|p| leads_with(p, name));
            if keep_original {
                productions.push(production);
            } else {
                if expansions.len() != 1 || expansions[0] != production {
                    trace!("{} -> {} expands to {} alternatives", name, production, expansions.len());
                }
                productions.extend(expansions);
            }
        }
        self.set_productions(name, productions);
        Ok(())
    }

    /// Repeatedly replaces a leading nonterminal ranked below `rank` by each
    /// of its alternatives, until every result leads with a terminal or a
    /// nonterminal ranked at least `rank`.
    fn expand_below(
        &self,
        rank: usize,
        production: Production,
        limit: usize,
    ) -> Result<Vec<Production>, GrammarError> {
        let mut finished: Vec<Production> = Vec::new();
        let mut pending: VecDeque<Production> = VecDeque::from([production]);
        let mut seen: HashSet<Production> = HashSet::new();
        let mut steps = 0;

        while let Some(p) = pending.pop_front() {
            if !seen.insert(p.clone()) {
                continue;
            }
            steps += 1;
            if steps > limit {
                return Err(GrammarError::IterationLimit {
                    stage: "left recursion substitution",
                    limit,
                });
            }

            let lower = p
                .first()
                .and_then(Symbol::non_terminal)
                .filter(|b| self.rank(b).map_or(false, |r| r < rank));
            match lower {
                Some(b) => {
                    for head in self.productions(b) {
                        pending.push_back(Production::splice(head, &p.symbols()[1..]));
                    }
                }
                None => {
                    if !finished.contains(&p) {
                        finished.push(p);
                    }
                }
            }
        }
        Ok(finished)
    }

    /// `A -> Aα | β` becomes `A -> βA'` and `A' -> αA' | ε`.
    fn remove_direct_left_recursion(&mut self, name: &str) {
        let prime = self.fresh_non_terminal(name);
        let prime_symbol = Symbol::NonTerminal(prime.clone());

        let mut base: Vec<Production> = Vec::new();
        let mut recursive: Vec<Production> = Vec::new();
        for mut production in self.take_productions(name) {
            if leads_with(&production, name) {
                let alpha = &production.symbols()[1..];
                // A -> A derives nothing new
                if alpha.is_empty() {
                    continue;
                }
                let mut p = Production::from(alpha);
                p.push(prime_symbol.clone());
                recursive.push(p);
            } else {
                production.push(prime_symbol.clone());
                base.push(production);
            }
        }
        recursive.push(Production::epsilon());

        if base.is_empty() {
            warn!("`{}` has no non-recursive alternative and derives no string", name);
        }
        debug!("removed direct left recursion of `{}` via `{}`", name, prime);

        self.set_productions(name, base);
        self.set_productions(&prime, recursive);
    }
}
