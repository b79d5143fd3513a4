//! DRE Extractor - Relation extraction evaluation pipeline
//!
//! Prompts a language model for (head, tail, relation) triples in each
//! dialogue of a gold dataset and scores them with set-based
//! precision/recall/F1, macro-averaged over the dataset.

pub mod dataset;
pub mod metrics;
pub mod parser;
pub mod pipeline;
pub mod prompt;
pub mod report;

pub use dataset::load_dataset;
pub use metrics::{evaluate, MacroAverager, MatchCounts};
pub use parser::{parse_relations, try_parse_relations, ParseError};
pub use pipeline::Pipeline;
pub use prompt::build_relation_prompt;
pub use report::{EvaluationReport, SampleResult};
