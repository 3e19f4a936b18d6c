use std::collections::BTreeMap;

use crowbook_text_processing::escape;
use log::{debug, warn};
use serde::Serialize;

use super::{
    error::{GrammarError, TableConflict},
    first_follow::{FirstSets, FollowSets},
    grammar::{Production, Symbol},
    pretty_print::{align, production_to_latex},
    Grammar,
};

/// `M[A, t]` for every nonterminal `A` and every terminal or end marker `t`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LL1ParsingTable {
    non_terminals: Vec<String>,
    terminals: Vec<Symbol>,
    rows: BTreeMap<String, BTreeMap<Symbol, Production>>,
}

impl LL1ParsingTable {
    /// Fills the table, keeping the first production written to each cell
    /// and returning every rejected write as a conflict.
    pub fn build(
        g: &Grammar,
        first: &FirstSets,
        follow: &FollowSets,
    ) -> (LL1ParsingTable, Vec<TableConflict>) {
        let mut table = LL1ParsingTable {
            non_terminals: g.order().to_vec(),
            terminals: g
                .terminal_iter()
                .chain(std::iter::once(Symbol::EndMarker))
                .collect(),
            rows: BTreeMap::new(),
        };
        let mut conflicts: Vec<TableConflict> = Vec::new();

        for nt in g.non_terminal_iter() {
            for production in &nt.productions {
                let first_set = first.of_sequence(production.symbols());
                for t in first_set.iter().filter(|s| **s != Symbol::Epsilon) {
                    table.insert(&nt.name, t, production, &mut conflicts);
                }
                if first_set.contains(&Symbol::Epsilon) {
                    for t in follow.get(&nt.name).into_iter().flatten() {
                        table.insert(&nt.name, t, production, &mut conflicts);
                    }
                }
            }
        }

        debug!(
            "LL(1) table: {} cells, {} conflicts",
            table.len(),
            conflicts.len()
        );
        (table, conflicts)
    }

    fn insert(
        &mut self,
        non_terminal: &str,
        terminal: &Symbol,
        production: &Production,
        conflicts: &mut Vec<TableConflict>,
    ) {
        let row = self.rows.entry(non_terminal.to_string()).or_default();
        match row.get(terminal) {
            None => {
                row.insert(terminal.clone(), production.clone());
            }
            Some(existing) if existing != production => {
                let conflict = TableConflict {
                    non_terminal: non_terminal.to_string(),
                    terminal: terminal.clone(),
                    existing: existing.clone(),
                    incoming: production.clone(),
                };
                warn!("conflict {}", conflict);
                conflicts.push(conflict);
            }
            Some(_) => {}
        }
    }

    pub fn get(&self, non_terminal: &str, terminal: &Symbol) -> Option<&Production> {
        self.rows.get(non_terminal)?.get(terminal)
    }

    pub fn non_terminals(&self) -> &[String] {
        &self.non_terminals
    }

    /// Column headers: every terminal, then the end marker.
    pub fn terminals(&self) -> &[Symbol] {
        &self.terminals
    }

    /// Number of filled cells.
    pub fn len(&self) -> usize {
        self.rows.values().map(|row| row.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn cell_text(&self, non_terminal: &str, terminal: &Symbol) -> String {
        self.get(non_terminal, terminal)
            .map(|p| format!("{} -> {}", non_terminal, p))
            .unwrap_or_default()
    }

    pub fn to_plaintext(&self) -> String {
        let mut header: Vec<String> = vec![String::new()];
        header.extend(self.terminals.iter().map(|t| t.to_string()));
        let mut output: Vec<Vec<String>> = vec![header];
        for left in &self.non_terminals {
            let mut line: Vec<String> = vec![left.clone()];
            line.extend(self.terminals.iter().map(|t| self.cell_text(left, t)));
            output.push(line);
        }

        align(&output)
    }

    pub fn to_latex(&self) -> String {
        let mut header: Vec<String> = vec![format!(
            "\\[\\begin{{array}}{{c{}}}\n",
            "|l".repeat(self.terminals.len()),
        )];
        header.extend(
            self.terminals
                .iter()
                .map(|t| format!("\\text{{{}}}", escape::tex(t.to_string().as_str()))),
        );
        let header = header.join(" & ");

        let mut output: Vec<String> = Vec::new();
        for left in &self.non_terminals {
            let mut line: Vec<String> = vec![escape::tex(left.as_str()).to_string()];
            line.extend(self.terminals.iter().map(|t| match self.get(left, t) {
                Some(p) => format!(
                    "{} \\rightarrow {}",
                    escape::tex(left.as_str()),
                    production_to_latex(p)
                ),
                None => String::new(),
            }));
            output.push(line.join(" & "));
        }

        let output = output.join("\\\\\n");

        header + "\\\\\\hline\n" + &output + "\n\\end{array}\\]"
    }
}

impl Grammar {
    /// Builds the LL(1) table, failing with every conflicting cell when the
    /// grammar is not LL(1).
    pub fn generate_ll1_parsing_table(
        &self,
        first: &FirstSets,
        follow: &FollowSets,
    ) -> Result<LL1ParsingTable, GrammarError> {
        let (table, conflicts) = LL1ParsingTable::build(self, first, follow);
        if conflicts.is_empty() {
            Ok(table)
        } else {
            Err(GrammarError::TableConflict(conflicts))
        }
    }
}
