use log::debug;

use super::{
    grammar::{Production, Symbol},
    Grammar,
};

fn common_prefix_len(a: &[Symbol], b: &[Symbol]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

/// Longest prefix shared by some pair of alternatives. Pairs are scanned in
/// insertion order and only a strictly longer prefix replaces the best one,
/// so among equally long prefixes the earliest pair wins.
pub fn longest_common_prefix(productions: &[Production]) -> Option<Vec<Symbol>> {
    let mut best: &[Symbol] = &[];
    for (i, a) in productions.iter().enumerate() {
        for b in &productions[i + 1..] {
            let n = common_prefix_len(a.symbols(), b.symbols());
            if n > best.len() {
                best = &a.symbols()[..n];
            }
        }
    }
    if best.is_empty() {
        None
    } else {
        Some(best.to_vec())
    }
}

impl Grammar {
    pub fn left_factor(&self) -> Grammar {
        let mut g = self.clone();

        let mut i = 0;
        while i < g.order().len() {
            let name = g.order()[i].clone();
            while let Some(prefix) = longest_common_prefix(g.productions(&name)) {
                g.factor_out(&name, &prefix);
            }
            i += 1;
        }

        debug!("left factoring done: {} non-terminals", g.order().len());
        g
    }

    /// `A -> πα | πβ | γ` becomes `A -> πA' | γ` and `A' -> α | β`.
    fn factor_out(&mut self, name: &str, prefix: &[Symbol]) {
        let prime = self.fresh_non_terminal(name);

        let mut kept: Vec<Production> = Vec::new();
        let mut suffixes: Vec<Production> = Vec::new();
        let mut slot: Option<usize> = None;
        for production in self.take_productions(name) {
            if production.starts_with(prefix) {
                if slot.is_none() {
                    slot = Some(kept.len());
                }
                suffixes.push(Production::from(&production.symbols()[prefix.len()..]));
            } else {
                kept.push(production);
            }
        }

        let mut factored = Production::from(prefix);
        factored.push(Symbol::NonTerminal(prime.clone()));
        debug!(
            "factored `{}` out of {} alternatives of `{}` into `{}`",
            Production::from(prefix),
            suffixes.len(),
            name,
            prime
        );
        kept.insert(slot.unwrap_or(kept.len()), factored);

        self.set_productions(name, kept);
        self.set_productions(&prime, suffixes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_prefixes() {
        let g = Grammar::parse("P->abc\nP->abcd\nP->ab").unwrap().left_factor();

        assert_eq!(g.order(), &["P", "P''", "P'"]);
        assert_eq!(
            g.rules(),
            vec!["P -> abP''", "P'' -> cP'", "P'' -> &", "P' -> &", "P' -> d"]
        );
        let ab = g
            .productions("P")
            .iter()
            .filter(|p| p.starts_with(&[Symbol::Terminal('a'), Symbol::Terminal('b')]))
            .count();
        assert_eq!(ab, 1);
    }

    #[test]
    fn equal_length_prefixes_take_earliest_pair() {
        let g = Grammar::parse("A->xy\nA->ab\nA->ac\nA->xz").unwrap();
        let prefix = longest_common_prefix(g.productions("A")).unwrap();
        assert_eq!(prefix, vec![Symbol::Terminal('x')]);

        let g = g.left_factor();
        assert_eq!(g.order(), &["A", "A''", "A'"]);
        assert_eq!(
            g.rules(),
            vec![
                "A -> xA'",
                "A -> aA''",
                "A'' -> b",
                "A'' -> c",
                "A' -> y",
                "A' -> z",
            ]
        );
    }

    #[test]
    fn prefix_compares_symbols_not_characters() {
        // `A'` and `A''` share the character `A` but are different symbols
        let g = Grammar::parse("S->A'a\nS->A''b\nA'->c\nA''->d").unwrap();
        assert_eq!(longest_common_prefix(g.productions("S")), None);
        assert_eq!(g.left_factor(), g);
    }

    #[test]
    fn factored_after_elimination() {
        let g = Grammar::parse("S->S,T\nS->T\nT->id\nT->id(S)")
            .unwrap()
            .eliminate_left_recursion()
            .unwrap()
            .left_factor();
        assert_eq!(
            g.rules(),
            vec![
                "S -> TS'",
                "S' -> ,TS'",
                "S' -> &",
                "T -> idT'",
                "T' -> &",
                "T' -> (S)",
            ]
        );
    }
}
