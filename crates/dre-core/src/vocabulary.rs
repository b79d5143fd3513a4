//! Relation-type vocabularies
//!
//! The closed, ordered set of labels offered to the model. Vocabularies are
//! supplied by the caller, never derived from the dataset.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::DatasetError;

/// DialogRE relation labels, in id order
const DIALOGRE_LABELS: &[&str] = &[
    "per:positive_impression",
    "per:negative_impression",
    "per:acquaintance",
    "per:alumni",
    "per:boss",
    "per:subordinate",
    "per:client",
    "per:dates",
    "per:friends",
    "per:girl/boyfriend",
    "per:neighbor",
    "per:roommate",
    "per:children",
    "per:other_family",
    "per:parents",
    "per:siblings",
    "per:spouse",
    "per:place_of_residence",
    "per:place_of_birth",
    "per:visited_place",
    "per:origin",
    "per:employee_or_member_of",
    "per:schools_attended",
    "per:works",
    "per:age",
    "per:date_of_birth",
    "per:major",
    "per:place_of_work",
    "per:title",
    "per:alternate_names",
    "per:pet",
    "gpe:residents_of_place",
    "gpe:births_in_place",
    "gpe:visitors_of_place",
    "org:employees_or_members",
    "org:students",
    "unanswerable",
];

/// Ordered list of permissible relation labels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelationVocabulary {
    labels: Vec<String>,
}

impl RelationVocabulary {
    /// Create from labels, keeping their order and dropping repeats
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out: Vec<String> = Vec::new();
        for label in labels {
            let label = label.into();
            if !out.contains(&label) {
                out.push(label);
            }
        }
        Self { labels: out }
    }

    /// The DialogRE label set
    pub fn dialogre() -> Self {
        Self::new(DIALOGRE_LABELS.iter().copied())
    }

    /// Load from a JSON file.
    ///
    /// Accepts a plain array of labels, an `id -> label` object, or a
    /// `label -> id` object. Object entries are ordered by numeric id.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| DatasetError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let value: Value = serde_json::from_str(&content).map_err(|e| DatasetError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::from_json(value).map_err(|message| DatasetError::Invalid {
            path: path.to_path_buf(),
            message,
        })
    }

    fn from_json(value: Value) -> Result<Self, String> {
        let labels = match value {
            Value::Array(items) => items
                .into_iter()
                .map(|v| match v {
                    Value::String(s) => Ok(s),
                    other => Err(format!("expected a label string, found {other}")),
                })
                .collect::<Result<Vec<_>, _>>()?,
            Value::Object(map) => {
                // Sort key: numeric id when available, then original text
                let mut entries: BTreeMap<(u64, String), String> = BTreeMap::new();
                for (key, v) in map {
                    match v {
                        Value::String(label) => {
                            let id = key.parse::<u64>().unwrap_or(u64::MAX);
                            entries.insert((id, key), label);
                        }
                        Value::Number(n) => {
                            let id = n
                                .as_u64()
                                .ok_or_else(|| format!("invalid id {n} for label {key}"))?;
                            entries.insert((id, key.clone()), key);
                        }
                        other => return Err(format!("unexpected value for {key}: {other}")),
                    }
                }
                entries.into_values().collect()
            }
            other => return Err(format!("expected array or object, found {other}")),
        };

        if labels.is_empty() {
            return Err("relation vocabulary is empty".to_string());
        }
        Ok(Self::new(labels))
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }
}

impl Default for RelationVocabulary {
    fn default() -> Self {
        Self::dialogre()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_dialogre_vocabulary() {
        let vocab = RelationVocabulary::dialogre();
        assert_eq!(vocab.len(), 37);
        assert_eq!(vocab.labels()[0], "per:positive_impression");
        assert!(vocab.contains("per:age"));
        assert!(!vocab.contains("per:Age"));
    }

    #[test]
    fn test_new_drops_repeats_keeps_order() {
        let vocab = RelationVocabulary::new(["b", "a", "b"]);
        assert_eq!(vocab.labels(), &["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn test_from_file_array() {
        let file = write_temp(r#"["per:age", "per:title"]"#);
        let vocab = RelationVocabulary::from_file(file.path()).unwrap();
        assert_eq!(vocab.labels(), &["per:age", "per:title"]);
    }

    #[test]
    fn test_from_file_id2rel() {
        let file = write_temp(r#"{"10": "per:title", "2": "per:age", "1": "per:boss"}"#);
        let vocab = RelationVocabulary::from_file(file.path()).unwrap();
        assert_eq!(vocab.labels(), &["per:boss", "per:age", "per:title"]);
    }

    #[test]
    fn test_from_file_rel2id() {
        let file = write_temp(r#"{"per:title": 3, "per:age": 1}"#);
        let vocab = RelationVocabulary::from_file(file.path()).unwrap();
        assert_eq!(vocab.labels(), &["per:age", "per:title"]);
    }

    #[test]
    fn test_from_file_rejects_empty() {
        let file = write_temp("[]");
        let err = RelationVocabulary::from_file(file.path()).unwrap_err();
        assert!(matches!(err, DatasetError::Invalid { .. }));
    }

    #[test]
    fn test_from_file_missing() {
        let err = RelationVocabulary::from_file("/nonexistent/id2rel.json").unwrap_err();
        assert!(matches!(err, DatasetError::Read { .. }));
    }
}
