//! Evaluation report
//!
//! Per-sample results plus the macro-averaged overall metrics, persisted as
//! indented JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};

use dre_core::{MetricRecord, OutputError, Triple, TripleSet};

use crate::metrics::MacroAverager;

/// Outcome for one dialogue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleResult {
    /// Position of the dialogue in the dataset
    pub dialog_id: usize,
    pub gold_triples: Vec<Triple>,
    pub pred_triples: Vec<Triple>,
    pub metrics: MetricRecord,
}

impl SampleResult {
    pub fn new(
        dialog_id: usize,
        gold: TripleSet,
        predicted: TripleSet,
        metrics: MetricRecord,
    ) -> Self {
        Self {
            dialog_id,
            gold_triples: gold.into_iter().collect(),
            pred_triples: predicted.into_iter().collect(),
            metrics,
        }
    }
}

/// Full report for one evaluation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub results: Vec<SampleResult>,
    pub overall_metrics: MetricRecord,
}

impl EvaluationReport {
    /// Build a report, macro-averaging the per-sample metrics
    pub fn from_results(results: Vec<SampleResult>) -> Self {
        let mut averager = MacroAverager::new();
        averager.extend(results.iter().map(|r| &r.metrics));

        if averager.is_empty() {
            tracing::warn!("No samples evaluated; overall metrics default to zero");
        }

        Self {
            overall_metrics: averager.mean(),
            results,
        }
    }

    /// Write as pretty-printed JSON, creating parent directories as needed
    pub fn write(&self, path: impl AsRef<Path>) -> Result<(), OutputError> {
        let path = path.as_ref();
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| OutputError::Write {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        std::fs::write(path, json).map_err(|e| OutputError::Write {
            path: path.to_path_buf(),
            source: e,
        })?;

        tracing::info!(path = %path.display(), samples = self.results.len(), "Report written");
        Ok(())
    }

    /// Read a report previously written with [`EvaluationReport::write`]
    pub fn read(path: impl AsRef<Path>) -> Result<Self, OutputError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| OutputError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;

        serde_json::from_str(&content).map_err(|e| OutputError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Samples for which the model produced no usable triples
    pub fn empty_predictions(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.pred_triples.is_empty())
            .count()
    }

    /// Plain-text summary of the run
    pub fn summary(&self) -> String {
        format!(
            "=== Relation Extraction Report ===\n\n\
             Dialogues evaluated: {}\n\
             Without predictions: {}\n\n\
             Macro-averaged:\n\
               Precision: {:.1}%\n\
               Recall:    {:.1}%\n\
               F1 Score:  {:.1}%\n",
            self.results.len(),
            self.empty_predictions(),
            self.overall_metrics.precision * 100.0,
            self.overall_metrics.recall * 100.0,
            self.overall_metrics.f1 * 100.0,
        )
    }
}
