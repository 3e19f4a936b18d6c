use log::info;

use super::{
    eliminate_left_recursion::EliminationPolicy,
    error::GrammarError,
    first_follow::{FirstSets, FollowSets},
    ll1_parsing_table::LL1ParsingTable,
    predictive_parser::ParseTrace,
    Grammar, DEFAULT_ITERATION_LIMIT,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    pub elimination: EliminationPolicy,
    pub left_factoring: bool,
    /// Cap on substitution steps, fixed-point rounds and parser steps.
    pub iteration_limit: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            elimination: EliminationPolicy::default(),
            left_factoring: true,
            iteration_limit: DEFAULT_ITERATION_LIMIT,
        }
    }
}

/// A grammar run through every stage, ready to parse input.
#[derive(Debug, Clone)]
pub struct LL1Parser {
    original: Grammar,
    grammar: Grammar,
    first: FirstSets,
    follow: FollowSets,
    table: LL1ParsingTable,
    iteration_limit: usize,
}

impl LL1Parser {
    pub fn new(text: &str) -> Result<Self, GrammarError> {
        Self::with_config(text, &PipelineConfig::default())
    }

    pub fn with_config(text: &str, config: &PipelineConfig) -> Result<Self, GrammarError> {
        Self::from_grammar(Grammar::parse(text)?, config)
    }

    pub fn from_grammar(original: Grammar, config: &PipelineConfig) -> Result<Self, GrammarError> {
        if original.start_symbol().is_none() {
            return Err(GrammarError::EmptyGrammar);
        }

        let mut grammar =
            original.eliminate_left_recursion_with(config.elimination, config.iteration_limit)?;
        if config.left_factoring {
            grammar = grammar.left_factor();
        }
        let first = grammar.first_sets_with(config.iteration_limit)?;
        let follow = grammar.follow_sets_with(&first, config.iteration_limit)?;
        let table = grammar.generate_ll1_parsing_table(&first, &follow)?;

        info!(
            "built LL(1) parser: {} non-terminals, {} table entries",
            grammar.order().len(),
            table.len()
        );
        Ok(Self {
            original,
            grammar,
            first,
            follow,
            table,
            iteration_limit: config.iteration_limit,
        })
    }

    /// The grammar as written.
    pub fn original(&self) -> &Grammar {
        &self.original
    }

    /// The grammar after every transformation.
    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn first_sets(&self) -> &FirstSets {
        &self.first
    }

    pub fn follow_sets(&self) -> &FollowSets {
        &self.follow
    }

    pub fn table(&self) -> &LL1ParsingTable {
        &self.table
    }

    pub fn start_symbol(&self) -> &str {
        self.grammar.start_symbol().unwrap_or_default()
    }

    pub fn parse(&self, input: &str) -> Result<ParseTrace, GrammarError> {
        self.table
            .parse_with(self.start_symbol(), input, self.iteration_limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_grammar_has_no_parser() {
        assert_eq!(LL1Parser::new("").unwrap_err(), GrammarError::EmptyGrammar);
    }

    #[test]
    fn left_factoring_can_be_skipped() {
        let config = PipelineConfig {
            left_factoring: false,
            ..PipelineConfig::default()
        };
        let err = LL1Parser::with_config("S->ab\nS->ac", &config).unwrap_err();
        assert!(matches!(err, GrammarError::TableConflict(ref c) if c.len() == 1));

        let parser = LL1Parser::new("S->ab\nS->ac").unwrap();
        assert!(parser.parse("ac").unwrap().is_accepted());
        assert_eq!(parser.original().order(), &["S"]);
        assert_eq!(parser.grammar().order(), &["S", "S'"]);
    }

    #[test]
    fn iteration_limit_reaches_every_stage() {
        let config = PipelineConfig {
            iteration_limit: 1,
            ..PipelineConfig::default()
        };
        assert!(matches!(
            LL1Parser::with_config("S->a", &config),
            Err(GrammarError::IterationLimit { stage: "FIRST", .. })
        ));
    }
}
