//! DRE Core - Domain models, traits, and shared types
//!
//! This crate defines the core abstractions used throughout the DRE system:
//! - Dialogue samples and gold/predicted relation records
//! - Triples and per-sample metric records
//! - Common error types
//! - The LLM client trait used by the extraction pipeline
//! - Configuration management
//! - Relation-type vocabularies

pub mod config;
pub mod vocabulary;

pub use config::{AppConfig, ConfigError, EvalConfig, LlmConfig, LlmProvider, LoggingConfig};
pub use vocabulary::RelationVocabulary;

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Failure to load an input file (dataset or relation vocabulary)
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid content in {path}: {message}")]
    Invalid { path: PathBuf, message: String },
}

/// Failure at the remote inference boundary
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("Endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to parse response: {0}")]
    InvalidResponse(String),

    #[error("No completion returned")]
    EmptyCompletion,
}

/// Failure to write or read back an evaluation report
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse report {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors that end an evaluation run.
///
/// Extraction failures are absent: they degrade to an empty prediction set.
#[derive(Error, Debug)]
pub enum DreError {
    #[error("Dataset error: {0}")]
    Dataset(#[from] DatasetError),

    #[error("Output error: {0}")]
    Output(#[from] OutputError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, DreError>;

// ============================================================================
// Triples
// ============================================================================

/// A (head, tail, relation) triple used for set comparison.
///
/// Equality is exact string equality on all three fields. Triples serialize
/// as 3-element JSON arrays.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "(String, String, String)", into = "(String, String, String)")]
pub struct Triple {
    pub head: String,
    pub tail: String,
    pub relation: String,
}

impl Triple {
    pub fn new(
        head: impl Into<String>,
        tail: impl Into<String>,
        relation: impl Into<String>,
    ) -> Self {
        Self {
            head: head.into(),
            tail: tail.into(),
            relation: relation.into(),
        }
    }
}

impl From<(String, String, String)> for Triple {
    fn from((head, tail, relation): (String, String, String)) -> Self {
        Self {
            head,
            tail,
            relation,
        }
    }
}

impl From<Triple> for (String, String, String) {
    fn from(t: Triple) -> Self {
        (t.head, t.tail, t.relation)
    }
}

impl std::fmt::Display for Triple {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.head, self.tail, self.relation)
    }
}

/// Ordered set of triples; duplicates collapse
pub type TripleSet = BTreeSet<Triple>;

// ============================================================================
// Dataset Records
// ============================================================================

/// A human-annotated relation from the gold dataset.
///
/// Only `x`, `y` and `r` are read; auxiliary fields such as `rid`, `t`,
/// `x_type` and `y_type` are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoldRelation {
    /// Subject entity
    pub x: String,
    /// Object entity
    pub y: String,
    /// Candidate labels; only the first one is scored
    #[serde(default)]
    pub r: Vec<String>,
}

impl GoldRelation {
    /// The label used for scoring (`r[0]`)
    pub fn primary_label(&self) -> Option<&str> {
        self.r.first().map(String::as_str)
    }

    /// Convert to a triple, ignoring alternative labels
    pub fn to_triple(&self) -> Option<Triple> {
        self.primary_label()
            .map(|label| Triple::new(&self.x, &self.y, label))
    }
}

/// A relation predicted by the model.
///
/// `subject`, `object` and `predicate` are read when the primary field is
/// absent; when a record carries both, the primary field wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPredictedRelation")]
pub struct PredictedRelation {
    pub head: String,
    pub tail: String,
    pub relation: String,
}

#[derive(Deserialize)]
struct RawPredictedRelation {
    head: Option<String>,
    subject: Option<String>,
    tail: Option<String>,
    object: Option<String>,
    relation: Option<String>,
    predicate: Option<String>,
}

impl TryFrom<RawPredictedRelation> for PredictedRelation {
    type Error = String;

    fn try_from(raw: RawPredictedRelation) -> std::result::Result<Self, Self::Error> {
        fn pick(
            primary: Option<String>,
            alias: Option<String>,
            name: &str,
        ) -> std::result::Result<String, String> {
            primary
                .or(alias)
                .ok_or_else(|| format!("missing field `{name}`"))
        }

        Ok(Self {
            head: pick(raw.head, raw.subject, "head")?,
            tail: pick(raw.tail, raw.object, "tail")?,
            relation: pick(raw.relation, raw.predicate, "relation")?,
        })
    }
}

impl From<&PredictedRelation> for Triple {
    fn from(r: &PredictedRelation) -> Self {
        Triple::new(&r.head, &r.tail, &r.relation)
    }
}

/// One dialogue with its gold relations, as stored in the dataset file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "(Vec<String>, Vec<GoldRelation>)", into = "(Vec<String>, Vec<GoldRelation>)")]
pub struct DialogueSample {
    /// Ordered utterances
    pub dialogue: Vec<String>,
    /// Gold relations
    pub relations: Vec<GoldRelation>,
}

impl DialogueSample {
    pub fn new(dialogue: Vec<String>, relations: Vec<GoldRelation>) -> Self {
        Self {
            dialogue,
            relations,
        }
    }

    /// Gold triple set built from the first label of each relation
    pub fn gold_triples(&self) -> TripleSet {
        self.relations
            .iter()
            .filter_map(GoldRelation::to_triple)
            .collect()
    }
}

impl From<(Vec<String>, Vec<GoldRelation>)> for DialogueSample {
    fn from((dialogue, relations): (Vec<String>, Vec<GoldRelation>)) -> Self {
        Self::new(dialogue, relations)
    }
}

impl From<DialogueSample> for (Vec<String>, Vec<GoldRelation>) {
    fn from(s: DialogueSample) -> Self {
        (s.dialogue, s.relations)
    }
}

// ============================================================================
// Metrics
// ============================================================================

/// Precision, recall and F1 for one sample or a whole run
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

impl std::fmt::Display for MetricRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "P={:.4}, R={:.4}, F1={:.4}",
            self.precision, self.recall, self.f1
        )
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Trait for LLM clients
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    /// Send one prompt and return the raw completion text
    async fn generate(&self, prompt: &str) -> std::result::Result<String, ExtractionError>;

    /// Model identifier, for logging
    fn model(&self) -> &str;
}

// ============================================================================
// Tests
// ============================================================================
