use crowbook_text_processing::escape;
use serde::Serialize;

use super::{
    first_follow::{FirstSets, FollowSets, SymbolSet},
    grammar::{Production, Symbol},
    predictive_parser::{ParseStatus, ParseTrace},
    Grammar,
};

pub fn production_to_latex(production: &Production) -> String {
    if production.is_epsilon() {
        return "\\epsilon".to_string();
    }
    production
        .iter()
        .map(|s| {
            let text = s.to_string();
            escape::tex(text.as_str()).into_owned()
        })
        .collect::<Vec<_>>()
        .join(" \\ ")
}

/// Lays out rows as right-aligned columns separated by ` | `.
pub(crate) fn align(output: &[Vec<String>]) -> String {
    let columns = output.iter().map(|line| line.len()).max().unwrap_or(0);
    let width: Vec<usize> = (0..columns)
        .map(|j| {
            output
                .iter()
                .filter_map(|line| line.get(j))
                .map(|s| s.chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect();
    output
        .iter()
        .map(|line| {
            line.iter()
                .enumerate()
                .map(|(i, s)| format!("{:>width$}", s, width = width[i]))
                .collect::<Vec<_>>()
                .join(" | ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductionOutput<'a> {
    pub left: &'a str,
    #[serde(skip)]
    productions: &'a [Production],
    pub rights: Vec<String>,
}

impl ProductionOutput<'_> {
    pub fn to_plaintext(&self, left_width: usize, multiline: bool) -> String {
        self.rights
            .iter()
            .enumerate()
            .map(|(i, right)| {
                if i == 0 {
                    format!("{:>width$} -> {}", self.left, right, width = left_width)
                } else if multiline {
                    format!("{:>width$}  | {}", "", right, width = left_width)
                } else {
                    format!(" | {}", right)
                }
            })
            .collect::<Vec<_>>()
            .join(if multiline { "\n" } else { "" })
    }

    pub fn to_latex(&self, and_sign: bool) -> String {
        if self.productions.is_empty() {
            return String::new();
        }

        let left = if and_sign {
            format!("{} & \\rightarrow & ", escape::tex(self.left))
        } else {
            format!("{} \\rightarrow ", escape::tex(self.left))
        };
        let right = self
            .productions
            .iter()
            .map(production_to_latex)
            .collect::<Vec<_>>()
            .join(" \\mid ");

        left + &right
    }
}

#[derive(Debug, Serialize)]
pub struct ProductionOutputVec<'a> {
    productions: Vec<ProductionOutput<'a>>,
}

impl ProductionOutputVec<'_> {
    pub fn to_plaintext(&self) -> String {
        let left_max_len = self
            .productions
            .iter()
            .map(|p| p.left.chars().count())
            .max()
            .unwrap_or(0);
        self.productions
            .iter()
            .map(|s| s.to_plaintext(left_max_len, true))
            .collect::<Vec<String>>()
            .join("\n")
    }

    pub fn to_latex(&self) -> String {
        std::iter::once("\\[\\begin{array}{cll}".to_string())
            .chain(self.productions.iter().map(|s| s.to_latex(true)))
            .chain(std::iter::once("\\end{array}\\]".to_string()))
            .collect::<Vec<String>>()
            .join("\\\\\n")
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl Grammar {
    pub fn to_production_output_vec(&self) -> ProductionOutputVec<'_> {
        let productions = self
            .non_terminal_iter()
            .map(|nt| ProductionOutput {
                left: nt.name.as_str(),
                productions: &nt.productions,
                rights: nt.productions.iter().map(|p| p.to_string()).collect(),
            })
            .collect();
        ProductionOutputVec { productions }
    }
}

#[derive(Debug, Serialize)]
struct NonTerminalOutput<'a> {
    name: &'a str,
    nullable: bool,
    first: Vec<String>,
    follow: Vec<String>,
}

impl NonTerminalOutput<'_> {
    fn to_plaintext(&self) -> String {
        format!(
            "{} | {} | {} | {}",
            self.name,
            self.nullable,
            self.first.join(", "),
            self.follow.join(", ")
        )
    }

    fn to_latex(&self) -> String {
        fn f(a: &[String]) -> String {
            a.iter()
                .map(|s| {
                    if s.as_str() == Symbol::Epsilon.to_string() {
                        "$\\epsilon$".to_string()
                    } else {
                        escape::tex(s.as_str()).to_string()
                    }
                })
                .collect::<Vec<_>>()
                .join(r"\ ")
        }

        format!(
            "{} & {} & {} & {}",
            escape::tex(self.name),
            self.nullable,
            f(&self.first),
            f(&self.follow)
        )
    }
}

#[derive(Debug, Serialize)]
pub struct NonTerminalOutputVec<'a> {
    data: Vec<NonTerminalOutput<'a>>,
}

impl NonTerminalOutputVec<'_> {
    pub fn to_plaintext(&self) -> String {
        self.data
            .iter()
            .map(|s| s.to_plaintext())
            .collect::<Vec<String>>()
            .join("\n")
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn to_latex(&self) -> String {
        let content = self
            .data
            .iter()
            .map(|e| e.to_latex())
            .collect::<Vec<_>>()
            .join("\\\\\n ");

        "\\begin{tabular}{c|c|c|c}\n".to_string()
            + "Symbol & Nullable & First & Follow\\\\\\hline\n"
            + &content
            + "\\\\\n\\end{tabular}"
    }
}

fn names(set: Option<&SymbolSet>) -> Vec<String> {
    set.into_iter().flatten().map(|s| s.to_string()).collect()
}

impl Grammar {
    pub fn to_non_terminal_output_vec(
        &self,
        first: &FirstSets,
        follow: &FollowSets,
    ) -> NonTerminalOutputVec<'_> {
        let data = self
            .non_terminal_iter()
            .map(|nt| NonTerminalOutput {
                name: nt.name.as_str(),
                nullable: first.is_nullable(&nt.name),
                first: names(first.get(&nt.name)),
                follow: names(follow.get(&nt.name)),
            })
            .collect();
        NonTerminalOutputVec { data }
    }
}

impl ParseTrace {
    pub fn to_plaintext(&self) -> String {
        let mut output: Vec<Vec<String>> = vec![vec![
            "Stack".to_string(),
            "Input".to_string(),
            "Action".to_string(),
        ]];
        output.extend(self.rows().iter().map(|row| {
            vec![
                row.stack_string(),
                row.input_string(),
                row.action.to_string(),
            ]
        }));
        let status = match self.status() {
            ParseStatus::Accepted => "accepted",
            ParseStatus::Rejected => "rejected",
        };
        align(&output) + "\n" + status
    }

    pub fn to_latex(&self) -> String {
        let content = self
            .rows()
            .iter()
            .map(|row| {
                format!(
                    "{} & {} & {}",
                    escape::tex(row.stack_string().as_str()),
                    escape::tex(row.input_string().as_str()),
                    escape::tex(row.action.to_string().as_str())
                )
            })
            .collect::<Vec<_>>()
            .join("\\\\\n");

        "\\begin{tabular}{r|r|l}\n".to_string()
            + "Stack & Input & Action\\\\\\hline\n"
            + &content
            + "\n\\end{tabular}"
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
