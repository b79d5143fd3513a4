//! Dataset loading
//!
//! Reads a JSON array of `[dialogue, relations]` pairs.

use std::path::Path;

use dre_core::{DatasetError, DialogueSample};

/// Load all samples from a dataset file, preserving file order
pub fn load_dataset(path: impl AsRef<Path>) -> Result<Vec<DialogueSample>, DatasetError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| DatasetError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;

    let samples: Vec<DialogueSample> =
        serde_json::from_str(&content).map_err(|e| DatasetError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;

    let unlabeled = samples
        .iter()
        .flat_map(|s| &s.relations)
        .filter(|r| r.r.is_empty())
        .count();
    if unlabeled > 0 {
        tracing::warn!(
            count = unlabeled,
            "Gold relations without a label will not be scored"
        );
    }

    tracing::info!(
        path = %path.display(),
        samples = samples.len(),
        "Dataset loaded"
    );

    Ok(samples)
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
    fn test_load_dataset() {
        let file = write_temp(
            r#"[
                [["Speaker 1: Hi", "Speaker 2: Hello"],
                 [{"x": "Speaker 1", "y": "Speaker 2", "r": ["per:friends"], "t": [""], "rid": [9]}]],
                [["Speaker 1: I am 28."],
                 [{"x": "Speaker 1", "y": "28", "r": ["per:age", "per:title"]}]]
            ]"#,
        );

        let samples = load_dataset(file.path()).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].dialogue[1], "Speaker 2: Hello");

        let gold = samples[1].gold_triples();
        assert_eq!(gold.len(), 1);
        assert_eq!(gold.iter().next().unwrap().relation, "per:age");
    }

    #[test]
    fn test_load_empty_dataset() {
        let file = write_temp("[]");
        assert!(load_dataset(file.path()).unwrap().is_empty());
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_dataset("/nonexistent/test.json").unwrap_err();
        assert!(matches!(err, DatasetError::Read { .. }));
        assert!(err.to_string().contains("/nonexistent/test.json"));
    }

    #[test]
    fn test_load_malformed_json() {
        let file = write_temp("[[\"unterminated\"");
        let err = load_dataset(file.path()).unwrap_err();
        assert!(matches!(err, DatasetError::Parse { .. }));
    }

    #[test]
    fn test_load_wrong_shape() {
        let file = write_temp(r#"{"dialogues": []}"#);
        assert!(matches!(
            load_dataset(file.path()).unwrap_err(),
            DatasetError::Parse { .. }
        ));
    }

    #[test]
    fn test_load_relation_without_labels() {
        let file = write_temp(r#"[[["a"], [{"x": "A", "y": "B", "r": []}, {"x": "A", "y": "B"}]]]"#);
        let samples = load_dataset(file.path()).unwrap();
        assert!(samples[0].gold_triples().is_empty());
    }
}
