//! Quality Metrics module
//!
//! Set-based precision, recall and F1 between predicted and gold triples,
//! plus macro-averaging across samples.

use serde::{Deserialize, Serialize};

use dre_core::{MetricRecord, TripleSet};

// ============================================================================
// Match Counts
// ============================================================================

/// Overlap counts between a predicted and a gold triple set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchCounts {
    /// Triples present in both sets
    pub true_positives: usize,
    /// Predicted triples absent from gold
    pub false_positives: usize,
    /// Gold triples the model missed
    pub false_negatives: usize,
}

impl MatchCounts {
    /// Count exact-match overlap between two triple sets
    pub fn between(predicted: &TripleSet, gold: &TripleSet) -> Self {
        let true_positives = predicted.intersection(gold).count();

        Self {
            true_positives,
            false_positives: predicted.len() - true_positives,
            false_negatives: gold.len() - true_positives,
        }
    }

    /// Calculate precision (TP / (TP + FP))
    pub fn precision(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_positives)
    }

    /// Calculate recall (TP / (TP + FN))
    pub fn recall(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_negatives)
    }

    /// Calculate F1 score (2 * P * R / (P + R))
    pub fn f1_score(&self) -> f64 {
        let p = self.precision();
        let r = self.recall();
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * p * r / (p + r)
        }
    }

    pub fn to_record(&self) -> MetricRecord {
        MetricRecord {
            precision: self.precision(),
            recall: self.recall(),
            f1: self.f1_score(),
        }
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Score a predicted triple set against gold.
///
/// Every zero denominator scores 0, so empty inputs yield an all-zero record.
pub fn evaluate(predicted: &TripleSet, gold: &TripleSet) -> MetricRecord {
    MatchCounts::between(predicted, gold).to_record()
}

// ============================================================================
// Macro Averaging
// ============================================================================

/// Accumulates per-sample metrics and reports their arithmetic mean
#[derive(Debug, Clone, Default)]
pub struct MacroAverager {
    precision: Vec<f64>,
    recall: Vec<f64>,
    f1: Vec<f64>,
}

impl MacroAverager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one sample's metrics
    pub fn push(&mut self, metrics: &MetricRecord) {
        self.precision.push(metrics.precision);
        self.recall.push(metrics.recall);
        self.f1.push(metrics.f1);
    }

    /// Number of samples accumulated
    pub fn len(&self) -> usize {
        self.f1.len()
    }

    pub fn is_empty(&self) -> bool {
        self.f1.is_empty()
    }

    /// Mean of each metric stream; all zeros when nothing was added
    pub fn mean(&self) -> MetricRecord {
        MetricRecord {
            precision: mean(&self.precision),
            recall: mean(&self.recall),
            f1: mean(&self.f1),
        }
    }
}

impl<'a> Extend<&'a MetricRecord> for MacroAverager {
    fn extend<I: IntoIterator<Item = &'a MetricRecord>>(&mut self, iter: I) {
        for metrics in iter {
            self.push(metrics);
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use dre_core::Triple;
    use proptest::prelude::*;

    fn set(triples: &[(&str, &str, &str)]) -> TripleSet {
        triples
            .iter()
            .map(|(h, t, r)| Triple::new(*h, *t, *r))
            .collect()
    }

    fn zero() -> MetricRecord {
        MetricRecord {
            precision: 0.0,
            recall: 0.0,
            f1: 0.0,
        }
    }

    #[test]
    fn test_evaluate_both_empty() {
        assert_eq!(evaluate(&TripleSet::new(), &TripleSet::new()), zero());
    }

    #[test]
    fn test_evaluate_empty_gold() {
        let predicted = set(&[("A", "B", "per:friends")]);
        assert_eq!(evaluate(&predicted, &TripleSet::new()), zero());
    }

    #[test]
    fn test_evaluate_empty_predictions() {
        let gold = set(&[("A", "B", "per:friends")]);
        assert_eq!(evaluate(&TripleSet::new(), &gold), zero());
    }

    #[test]
    fn test_evaluate_exact_match() {
        let triples = set(&[("A", "B", "per:friend")]);
        let metrics = evaluate(&triples, &triples.clone());

        assert_eq!(metrics.precision, 1.0);
        assert_eq!(metrics.recall, 1.0);
        assert_eq!(metrics.f1, 1.0);
    }

    #[test]
    fn test_evaluate_partial_overlap() {
        let predicted = set(&[("A", "B", "r1"), ("C", "D", "r2")]);
        let gold = set(&[("A", "B", "r1"), ("E", "F", "r3")]);

        let counts = MatchCounts::between(&predicted, &gold);
        assert_eq!(counts.true_positives, 1);
        assert_eq!(counts.false_positives, 1);
        assert_eq!(counts.false_negatives, 1);

        let metrics = evaluate(&predicted, &gold);
        assert!((metrics.precision - 0.5).abs() < 1e-12);
        assert!((metrics.recall - 0.5).abs() < 1e-12);
        assert!((metrics.f1 - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_evaluate_uneven_overlap() {
        // P = 1/1, R = 1/4, F1 = 2 * 0.25 / 1.25 = 0.4
        let predicted = set(&[("A", "B", "r1")]);
        let gold = set(&[("A", "B", "r1"), ("C", "D", "r2"), ("E", "F", "r3"), ("G", "H", "r4")]);

        let metrics = evaluate(&predicted, &gold);
        assert_eq!(metrics.precision, 1.0);
        assert!((metrics.recall - 0.25).abs() < 1e-12);
        assert!((metrics.f1 - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_evaluate_label_mismatch_is_miss() {
        let predicted = set(&[("A", "B", "per:friends")]);
        let gold = set(&[("A", "B", "per:roommate")]);

        assert_eq!(evaluate(&predicted, &gold), zero());
    }

    #[test]
    fn test_macro_average_is_mean_of_samples() {
        let mut averager = MacroAverager::new();
        averager.push(&MetricRecord {
            precision: 1.0,
            recall: 1.0,
            f1: 1.0,
        });
        averager.push(&zero());

        let overall = averager.mean();
        assert_eq!(averager.len(), 2);
        assert!((overall.precision - 0.5).abs() < 1e-12);
        assert!((overall.recall - 0.5).abs() < 1e-12);
        assert!((overall.f1 - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_macro_average_empty() {
        let averager = MacroAverager::new();
        assert!(averager.is_empty());
        assert_eq!(averager.mean(), zero());
    }

    fn triple_set() -> impl Strategy<Value = TripleSet> {
        prop::collection::btree_set((0..3u8, 0..3u8, 0..3u8), 0..8).prop_map(|items| {
            items
                .into_iter()
                .map(|(h, t, r)| Triple::new(format!("e{h}"), format!("e{t}"), format!("r{r}")))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_metrics_within_unit_interval(predicted in triple_set(), gold in triple_set()) {
            let m = evaluate(&predicted, &gold);
            prop_assert!((0.0..=1.0).contains(&m.precision));
            prop_assert!((0.0..=1.0).contains(&m.recall));
            prop_assert!((0.0..=1.0).contains(&m.f1));
        }

        #[test]
        fn prop_evaluate_is_idempotent(predicted in triple_set(), gold in triple_set()) {
            prop_assert_eq!(evaluate(&predicted, &gold), evaluate(&predicted, &gold));
        }

        #[test]
        fn prop_counts_partition_sets(predicted in triple_set(), gold in triple_set()) {
            let c = MatchCounts::between(&predicted, &gold);
            prop_assert_eq!(c.true_positives + c.false_positives, predicted.len());
            prop_assert_eq!(c.true_positives + c.false_negatives, gold.len());
        }
    }
}
