extern crate wasm_bindgen;

use std::fmt::Display;

use wasm_bindgen::prelude::*;

pub mod grammar;
pub use grammar::{
    EliminationPolicy, FirstSets, FollowSets, Grammar, GrammarError, LL1Parser, LL1ParsingTable,
    ParseStatus, ParseTrace, PipelineConfig, Production, Symbol, DEFAULT_ITERATION_LIMIT,
};

fn error_json(e: impl Display) -> String {
    serde_json::json!({ "error": e.to_string() }).to_string()
}

fn first_follow_json(grammar: &str) -> Result<String, GrammarError> {
    let g = Grammar::parse(grammar)?
        .eliminate_left_recursion()?
        .left_factor();
    let first = g.first_sets()?;
    let follow = g.follow_sets(&first)?;
    Ok(g
        .to_non_terminal_output_vec(&first, &follow)
        .to_json()
        .unwrap_or_else(error_json))
}

#[wasm_bindgen]
pub fn first_follow_to_json(grammar: &str) -> String {
    first_follow_json(grammar).unwrap_or_else(error_json)
}

#[wasm_bindgen]
pub fn ll1_table_to_json(grammar: &str) -> String {
    match LL1Parser::new(grammar) {
        Ok(parser) => serde_json::to_string(parser.table()).unwrap_or_else(error_json),
        Err(e) => error_json(e),
    }
}

#[wasm_bindgen]
pub fn parse_to_json(grammar: &str, input: &str) -> String {
    match LL1Parser::new(grammar).and_then(|parser| parser.parse(input)) {
        Ok(trace) => trace.to_json().unwrap_or_else(error_json),
        Err(e) => error_json(e),
    }
}

#[cfg(test)]
mod json_tests {
    #[test]
    fn error_is_reported_as_json() {
        assert_eq!(
            crate::parse_to_json("s->a", "a"),
            r#"{"error":"Line 1: `s` is not a valid non-terminal"}"#
        );
    }

    #[test]
    fn trace_json() {
        let json = crate::parse_to_json("S->a", "a");
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["status"], "Accepted");
        assert_eq!(value["rows"][0]["stack"], serde_json::json!(["$", "S"]));
        assert_eq!(value["rows"][0]["action"]["Apply"]["production"], "a");
        assert_eq!(value["rows"][1]["action"], "Match");
    }

    #[test]
    fn table_json_has_cells() {
        let json = crate::ll1_table_to_json("S->aS\nS->b");
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["rows"]["S"]["a"], "aS");
        assert_eq!(value["terminals"], serde_json::json!(["a", "b", "$"]));
    }

    #[test]
    fn first_follow_json() {
        let json = crate::first_follow_to_json("S->Sa\nS->b");
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["data"][1]["name"], "S'");
        assert_eq!(value["data"][1]["nullable"], true);
    }
}


#[cfg(test)]
mod property_tests {
    use proptest::prelude::*;

    use crate::{Grammar, LL1Parser, Symbol};

    const EXPRESSIONS: &str = "E->E+T\nE->T\nT->T*F\nT->F\nF->(E)\nF->id";

    fn rule() -> impl Strategy<Value = String> {
        proptest::collection::vec(
            prop_oneof![Just('S'), Just('A'), Just('B'), Just('a'), Just('b')],
            1..4,
        )
        .prop_map(|symbols| symbols.into_iter().collect::<String>())
    }

    /// Small grammars over S, A, B with no ε alternatives.
    fn grammar_text() -> impl Strategy<Value = String> {
        (
            proptest::collection::vec(rule(), 1..4),
            proptest::collection::vec(rule(), 1..4),
            proptest::collection::vec(rule(), 1..4),
        )
            .prop_map(|(s, a, b)| {
                let mut lines = Vec::new();
                for (lhs, rights) in [("S", s), ("A", a), ("B", b)] {
                    for right in rights {
                        lines.push(format!("{}->{}", lhs, right));
                    }
                }
                lines.join("\n")
            })
    }

    /// Strings of the expression language.
    fn expression() -> impl Strategy<Value = String> {
        Just("id".to_string()).prop_recursive(4, 32, 2, |inner| {
            prop_oneof![
                inner.clone().prop_map(|e| format!("({})", e)),
                (inner.clone(), inner.clone()).prop_map(|(a, b)| format!("{}+{}", a, b)),
                (inner.clone(), inner).prop_map(|(a, b)| format!("{}*{}", a, b)),
            ]
        })
    }

    proptest! {
        #[test]
        fn transformed_grammars_are_left_recursion_free_and_factored(text in grammar_text()) {
            let g = Grammar::parse(&text).unwrap();
            let g = g.eliminate_left_recursion().unwrap();
            for nt in g.non_terminal_iter() {
                prop_assert!(!nt.is_left_recursive(), "{} in {:?}", nt.name, g.rules());
            }

            let g = g.left_factor();
            for nt in g.non_terminal_iter() {
                prop_assert!(!nt.is_left_recursive());
                for (i, a) in nt.productions.iter().enumerate() {
                    for b in &nt.productions[i + 1..] {
                        prop_assert!(
                            a.first().is_none() || a.first() != b.first(),
                            "{} shares a prefix: {:?}",
                            nt.name,
                            g.rules()
                        );
                    }
                }
            }

            let first = g.first_sets().unwrap();
            let follow = g.follow_sets(&first).unwrap();
            prop_assert!(follow.get("S").unwrap().contains(&Symbol::EndMarker));
            for t in g.terminal_iter() {
                prop_assert_eq!(first.of_symbol(&t).into_iter().collect::<Vec<_>>(), vec![t]);
            }
        }

        #[test]
        fn generated_expressions_are_accepted(input in expression()) {
            let parser = LL1Parser::new(EXPRESSIONS).unwrap();
            let trace = parser.parse(&input).unwrap();
            prop_assert!(trace.is_accepted(), "{}", trace.to_plaintext());
            prop_assert!(trace.last().unwrap().input.is_empty());
        }
    }
}
