//! Classifier seam and cross-validated scoring
//!
//! The pipeline itself is model-agnostic: anything implementing
//! [`Classifier`] can train on the encoded matrix. [`MajorityClass`] is the
//! reference baseline every real model should beat.

use crate::error::{MarkovifyError, Result};
use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Next-action classifier contract.
///
/// `fit` trains on an encoded feature matrix and the matching label vector
/// of event-type codes; `predict` returns one code per input row.
pub trait Classifier {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<i64>) -> Result<()>;
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<i64>>;
}

/// Baseline classifier that always predicts the most frequent training
/// label. Count ties resolve to the smaller event code.
#[derive(Debug, Clone, Default)]
pub struct MajorityClass {
    majority: Option<i64>,
}

impl MajorityClass {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Classifier for MajorityClass {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<i64>) -> Result<()> {
        if x.nrows() != y.len() {
            return Err(MarkovifyError::ValidationError(format!(
                "feature rows ({}) do not match labels ({})",
                x.nrows(),
                y.len()
            )));
        }
        if y.is_empty() {
            return Err(MarkovifyError::ValidationError(
                "cannot fit on an empty label vector".to_string(),
            ));
        }

        let mut counts: HashMap<i64, usize> = HashMap::new();
        for &label in y {
            *counts.entry(label).or_insert(0) += 1;
        }

        let mut best: Option<(i64, usize)> = None;
        for (&label, &count) in &counts {
            let better = match best {
                None => true,
                Some((best_label, best_count)) => {
                    count > best_count || (count == best_count && label < best_label)
                }
            };
            if better {
                best = Some((label, count));
            }
        }

        self.majority = best.map(|(label, _)| label);
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<i64>> {
        let majority = self.majority.ok_or(MarkovifyError::NotFitted)?;
        Ok(Array1::from_elem(x.nrows(), majority))
    }
}

/// A single train/test split
#[derive(Debug, Clone)]
pub struct CVSplit {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
    pub fold_idx: usize,
}

/// Cross-validation results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CVResults {
    /// Scores for each fold
    pub scores: Vec<f64>,
    /// Mean score across folds
    pub mean_score: f64,
    /// Standard deviation of scores
    pub std_score: f64,
    /// Number of folds
    pub n_folds: usize,
}

impl CVResults {
    /// Create CV results from fold scores
    pub fn from_scores(scores: Vec<f64>) -> Self {
        let n_folds = scores.len();
        let mean_score = scores.iter().sum::<f64>() / n_folds as f64;
        let variance =
            scores.iter().map(|s| (s - mean_score).powi(2)).sum::<f64>() / n_folds as f64;
        let std_score = variance.sqrt();

        Self {
            scores,
            mean_score,
            std_score,
            n_folds,
        }
    }
}

/// Shuffled k-fold splits over `n_samples` rows. Fold sizes differ by at
/// most one; the first `n_samples % n_splits` folds take the extra row.
pub fn k_fold_split(
    n_samples: usize,
    n_splits: usize,
    random_state: Option<u64>,
) -> Result<Vec<CVSplit>> {
    if n_splits < 2 {
        return Err(MarkovifyError::ValidationError(
            "n_splits must be at least 2".to_string(),
        ));
    }
    if n_samples < n_splits {
        return Err(MarkovifyError::ValidationError(format!(
            "n_samples ({}) must be >= n_splits ({})",
            n_samples, n_splits
        )));
    }

    let mut indices: Vec<usize> = (0..n_samples).collect();
    let mut rng = match random_state {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };
    indices.shuffle(&mut rng);

    let fold_sizes: Vec<usize> = (0..n_splits)
        .map(|i| {
            let base = n_samples / n_splits;
            let remainder = n_samples % n_splits;
            if i < remainder {
                base + 1
            } else {
                base
            }
        })
        .collect();

    let mut splits = Vec::with_capacity(n_splits);
    let mut current = 0;

    for fold_idx in 0..n_splits {
        let fold_size = fold_sizes[fold_idx];
        let test_indices: Vec<usize> = indices[current..current + fold_size].to_vec();
        let train_indices: Vec<usize> = indices[..current]
            .iter()
            .chain(indices[current + fold_size..].iter())
            .copied()
            .collect();

        splits.push(CVSplit {
            train_indices,
            test_indices,
            fold_idx,
        });

        current += fold_size;
    }

    Ok(splits)
}

/// Fraction of exactly matching predictions.
pub fn accuracy(y_true: &Array1<i64>, y_pred: &Array1<i64>) -> f64 {
    if y_true.is_empty() || y_true.len() != y_pred.len() {
        return 0.0;
    }
    let correct = y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(t, p)| t == p)
        .count();
    correct as f64 / y_true.len() as f64
}

/// Cross-validated accuracy of `model` over the encoded dataset.
///
/// The model is cloned per fold, so the caller's instance is never mutated.
pub fn cross_val_accuracy<C>(
    model: &C,
    x: &Array2<f64>,
    y: &Array1<i64>,
    n_folds: usize,
    random_state: Option<u64>,
) -> Result<CVResults>
where
    C: Classifier + Clone,
{
    if x.nrows() != y.len() {
        return Err(MarkovifyError::ValidationError(format!(
            "feature rows ({}) do not match labels ({})",
            x.nrows(),
            y.len()
        )));
    }

    let splits = k_fold_split(x.nrows(), n_folds, random_state)?;
    let mut scores = Vec::with_capacity(splits.len());

    for split in &splits {
        let x_train = x.select(Axis(0), &split.train_indices);
        let y_train = y.select(Axis(0), &split.train_indices);
        let x_test = x.select(Axis(0), &split.test_indices);
        let y_test = y.select(Axis(0), &split.test_indices);

        let mut fold_model = model.clone();
        fold_model.fit(&x_train, &y_train)?;
        let predictions = fold_model.predict(&x_test)?;
        scores.push(accuracy(&y_test, &predictions));
    }

    Ok(CVResults::from_scores(scores))
}
