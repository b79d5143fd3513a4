//! Model reply parsing
//!
//! Interprets a raw completion as a list of predicted relations. Accepts an
//! object carrying a `relations` array or a bare array of records, optionally
//! wrapped in a Markdown code fence.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;

use dre_core::PredictedRelation;

static CODE_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^```[A-Za-z]*\s*(.*?)\s*```$").expect("code fence pattern is valid")
});

/// Why a reply could not be turned into relations
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("reply is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("unexpected reply shape: {0}")]
    UnexpectedShape(String),

    #[error("invalid relation record: {0}")]
    InvalidRecord(#[source] serde_json::Error),
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    CODE_FENCE
        .captures(trimmed)
        .and_then(|c| c.get(1))
        .map_or(trimmed, |m| m.as_str())
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Parse a reply, reporting why it failed.
///
/// An object without a `relations` key yields no relations. A record missing
/// `head`, `tail` or `relation` (and its `subject`, `object` or `predicate`
/// alias) fails the whole reply.
pub fn try_parse_relations(raw: &str) -> Result<Vec<PredictedRelation>, ParseError> {
    let value: Value =
        serde_json::from_str(strip_code_fence(raw)).map_err(ParseError::InvalidJson)?;

    let records = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("relations") {
            None => return Ok(Vec::new()),
            Some(Value::Array(items)) => items,
            Some(other) => {
                return Err(ParseError::UnexpectedShape(format!(
                    "\"relations\" is {}",
                    describe(&other)
                )))
            }
        },
        other => {
            return Err(ParseError::UnexpectedShape(format!(
                "top level is {}",
                describe(&other)
            )))
        }
    };

    records
        .into_iter()
        .map(|record| serde_json::from_value(record).map_err(ParseError::InvalidRecord))
        .collect()
}

/// Parse a reply, treating any failure as "no predictions"
pub fn parse_relations(raw: &str) -> Vec<PredictedRelation> {
    match try_parse_relations(raw) {
        Ok(relations) => relations,
        Err(e) => {
            tracing::debug!(error = %e, "Unparseable model reply");
            Vec::new()
        }
    }
}
