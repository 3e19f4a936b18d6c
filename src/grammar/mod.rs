pub mod eliminate_left_recursion;
pub mod error;
pub mod first_follow;
pub mod grammar;
pub mod left_factoring;
pub mod ll1_parsing_table;
pub mod parse;
pub mod pipeline;
pub mod predictive_parser;
pub mod pretty_print;

pub use eliminate_left_recursion::EliminationPolicy;
pub use error::{GrammarError, Location, TableConflict};
pub use first_follow::{FirstSets, FollowSets};
pub use grammar::{Grammar, NonTerminal, Production, Symbol};
pub use ll1_parsing_table::LL1ParsingTable;
pub use pipeline::{LL1Parser, PipelineConfig};
pub use predictive_parser::{ParseStatus, ParseTrace, RejectReason, TraceAction, TraceRow};

pub const EPSILON: char = '&';
pub const END_MARK: char = '$';
pub const ARROW: &str = "->";

pub const DEFAULT_ITERATION_LIMIT: usize = 10_000;
