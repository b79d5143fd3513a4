//! Evaluation pipeline
//!
//! For each dialogue: build the prompt, query the model, parse its reply,
//! and score the predicted triples against gold. Per-sample failures degrade
//! to an empty prediction set; only dataset loading and report writing can
//! abort a run.
//!
//! Author: hephaex@gmail.com

use std::path::Path;
use std::sync::Arc;

use futures::stream::{self, StreamExt};

use dre_core::{
    DialogueSample, LlmClient, MetricRecord, PredictedRelation, RelationVocabulary, Result,
    Triple, TripleSet,
};

use crate::dataset::load_dataset;
use crate::metrics::evaluate;
use crate::parser::parse_relations;
use crate::prompt::build_relation_prompt;
use crate::report::{EvaluationReport, SampleResult};

/// Drives extraction and scoring over a dataset
pub struct Pipeline {
    client: Arc<dyn LlmClient>,
    vocabulary: RelationVocabulary,
    /// Samples in flight at once
    concurrency: usize,
}

impl Pipeline {
    /// Create a strictly sequential pipeline
    pub fn new(client: Arc<dyn LlmClient>, vocabulary: RelationVocabulary) -> Self {
        Self {
            client,
            vocabulary,
            concurrency: 1,
        }
    }

    /// Process up to `concurrency` samples at once; report order is unchanged
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Ask the model for relations in one dialogue.
    ///
    /// Transport and endpoint failures are logged and yield no predictions.
    pub async fn extract(&self, dialog_id: usize, dialogue: &[String]) -> Vec<PredictedRelation> {
        let prompt = build_relation_prompt(dialogue, self.vocabulary.labels());

        match self.client.generate(&prompt).await {
            Ok(raw) => parse_relations(&raw),
            Err(e) => {
                tracing::warn!(
                    dialog_id,
                    model = self.client.model(),
                    error = %e,
                    "Extraction failed, scoring sample with no predictions"
                );
                Vec::new()
            }
        }
    }

    /// Extract and score a single sample
    pub async fn evaluate_sample(&self, dialog_id: usize, sample: &DialogueSample) -> SampleResult {
        let gold = sample.gold_triples();
        let predicted: TripleSet = self
            .extract(dialog_id, &sample.dialogue)
            .await
            .iter()
            .map(Triple::from)
            .collect();

        let metrics = evaluate(&predicted, &gold);
        tracing::debug!(
            dialog_id,
            gold = gold.len(),
            predicted = predicted.len(),
            precision = metrics.precision,
            recall = metrics.recall,
            f1 = metrics.f1,
            "Sample scored"
        );

        SampleResult::new(dialog_id, gold, predicted, metrics)
    }

    /// Evaluate every sample, keeping dataset order in the report
    pub async fn evaluate_dataset(&self, samples: &[DialogueSample]) -> EvaluationReport {
        let total = samples.len();
        tracing::info!(
            samples = total,
            model = self.client.model(),
            relation_types = self.vocabulary.len(),
            concurrency = self.concurrency,
            "Starting evaluation"
        );

        let results: Vec<SampleResult> = stream::iter(samples.iter().enumerate())
            .map(|(dialog_id, sample)| async move {
                let result = self.evaluate_sample(dialog_id, sample).await;
                tracing::info!(
                    dialog_id,
                    total,
                    f1 = result.metrics.f1,
                    "Sample evaluated"
                );
                result
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        EvaluationReport::from_results(results)
    }

    /// Load a dataset, evaluate it, write the report and return the overall metrics
    pub async fn run(
        &self,
        dataset_path: impl AsRef<Path>,
        output_path: impl AsRef<Path>,
    ) -> Result<MetricRecord> {
        let report = self.run_report(dataset_path, output_path).await?;
        Ok(report.overall_metrics)
    }

    /// Same as [`Pipeline::run`], returning the whole report
    pub async fn run_report(
        &self,
        dataset_path: impl AsRef<Path>,
        output_path: impl AsRef<Path>,
    ) -> Result<EvaluationReport> {
        let samples = load_dataset(dataset_path)?;
        let report = self.evaluate_dataset(&samples).await;
        report.write(output_path)?;

        tracing::info!(
            precision = report.overall_metrics.precision,
            recall = report.overall_metrics.recall,
            f1 = report.overall_metrics.f1,
            "Evaluation complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use dre_core::{ExtractionError, GoldRelation};
    use std::sync::Mutex;

    /// Replies with a fixed outcome and records the prompts it saw
    struct FixedClient {
        reply: std::result::Result<String, u16>,
        prompts: Mutex<Vec<String>>,
    }

    impl FixedClient {
        fn ok(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(reply.to_string()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn failing(status: u16) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(status),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl LlmClient for FixedClient {
        async fn generate(&self, prompt: &str) -> std::result::Result<String, ExtractionError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            match &self.reply {
                Ok(reply) => Ok(reply.clone()),
                Err(status) => Err(ExtractionError::Status {
                    status: *status,
                    body: "unavailable".to_string(),
                }),
            }
        }

        fn model(&self) -> &str {
            "fixed"
        }
    }

    fn sample() -> DialogueSample {
        DialogueSample::new(
            vec![
                "Speaker 1: Emma, you're 28 now?".to_string(),
                "Speaker 2: Yes, Ross.".to_string(),
            ],
            vec![
                GoldRelation {
                    x: "Speaker 2".to_string(),
                    y: "28".to_string(),
                    r: vec!["per:age".to_string(), "per:title".to_string()],
                },
                GoldRelation {
                    x: "Speaker 2".to_string(),
                    y: "Emma".to_string(),
                    r: vec!["per:alternate_names".to_string()],
                },
            ],
        )
    }

    #[test]
    fn test_with_concurrency_floor() {
        let pipeline =
            Pipeline::new(FixedClient::ok("[]"), RelationVocabulary::dialogre()).with_concurrency(0);
        assert_eq!(pipeline.concurrency(), 1);
    }

    #[test]
    fn test_evaluate_sample_scores_predictions() {
        let client = FixedClient::ok(
            r#"{"relations": [
                {"head": "Speaker 2", "tail": "28", "relation": "per:age"},
                {"head": "Speaker 1", "tail": "Ross", "relation": "per:friends"}
            ]}"#,
        );
        let pipeline = Pipeline::new(client.clone(), RelationVocabulary::dialogre());

        let result = tokio_test::block_on(pipeline.evaluate_sample(3, &sample()));

        assert_eq!(result.dialog_id, 3);
        assert_eq!(result.gold_triples.len(), 2);
        assert_eq!(result.pred_triples.len(), 2);
        assert!(result
            .gold_triples
            .contains(&Triple::new("Speaker 2", "28", "per:age")));
        assert!((result.metrics.precision - 0.5).abs() < 1e-12);
        assert!((result.metrics.recall - 0.5).abs() < 1e-12);

        let prompts = client.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Speaker 1: Emma, you're 28 now?\nSpeaker 2: Yes, Ross."));
        assert!(prompts[0].contains("per:alternate_names"));
    }

    #[test]
    fn test_extraction_failure_degrades_to_empty() {
        let pipeline = Pipeline::new(FixedClient::failing(503), RelationVocabulary::dialogre());

        let result = tokio_test::block_on(pipeline.evaluate_sample(0, &sample()));

        assert!(result.pred_triples.is_empty());
        assert_eq!(result.gold_triples.len(), 2);
        assert_eq!(result.metrics, MetricRecord::default());
    }

    #[test]
    fn test_unparseable_reply_degrades_to_empty() {
        let pipeline = Pipeline::new(
            FixedClient::ok("I found these relations: Emma is 28."),
            RelationVocabulary::dialogre(),
        );

        let result = tokio_test::block_on(pipeline.evaluate_sample(0, &sample()));
        assert!(result.pred_triples.is_empty());
    }

    #[test]
    fn test_duplicate_predictions_collapse() {
        let pipeline = Pipeline::new(
            FixedClient::ok(
                r#"[
                    {"head": "Speaker 2", "tail": "28", "relation": "per:age"},
                    {"head": "Speaker 2", "tail": "28", "relation": "per:age"}
                ]"#,
            ),
            RelationVocabulary::dialogre(),
        );

        let result = tokio_test::block_on(pipeline.evaluate_sample(0, &sample()));
        assert_eq!(result.pred_triples.len(), 1);
        assert_eq!(result.metrics.precision, 1.0);
    }

    #[test]
    fn test_custom_vocabulary_reaches_prompt() {
        let client = FixedClient::ok("[]");
        let pipeline = Pipeline::new(client.clone(), RelationVocabulary::new(["likes", "hates"]));

        tokio_test::block_on(pipeline.evaluate_dataset(&[sample()]));

        let prompts = client.prompts.lock().unwrap();
        assert!(prompts[0].contains(r#"["likes","hates"]"#));
        assert!(!prompts[0].contains("per:age"));
    }
}
