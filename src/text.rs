//! Text feature extraction
//!
//! A bounded-vocabulary TF-IDF vectorizer used for the free-text session
//! columns. The vectorizer is fit once on the first batch and then reused,
//! so later batches are encoded against the same vocabulary and weights.

use crate::error::{MarkovifyError, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Simple text tokenizer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextTokenizer {
    lowercase: bool,
    min_token_length: usize,
    stop_words: Vec<String>,
}

impl TextTokenizer {
    pub fn new() -> Self {
        Self {
            lowercase: true,
            min_token_length: 2,
            stop_words: Vec::new(),
        }
    }

    pub fn with_lowercase(mut self, lowercase: bool) -> Self {
        self.lowercase = lowercase;
        self
    }

    pub fn with_min_length(mut self, len: usize) -> Self {
        self.min_token_length = len;
        self
    }

    pub fn with_english_stop_words(mut self) -> Self {
        self.stop_words = vec![
            "a", "an", "the", "and", "or", "but", "in", "on", "at", "to", "for",
            "of", "with", "by", "is", "was", "are", "were", "be", "have", "has",
            "it", "this", "that", "i", "you", "he", "she", "we", "they", "from",
            "your", "our", "my", "their", "its", "not", "no", "so", "if", "then",
            "than", "there", "here", "when", "what", "how", "all", "will", "can",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        self
    }

    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let processed = if self.lowercase {
            text.to_lowercase()
        } else {
            text.to_string()
        };

        processed
            .split(|c: char| !c.is_alphanumeric())
            .filter(|s| !s.is_empty())
            .filter(|s| s.len() >= self.min_token_length)
            .filter(|s| !self.stop_words.contains(&s.to_string()))
            .map(|s| s.to_string())
            .collect()
    }
}

impl Default for TextTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

/// TF-IDF vectorizer with a document-frequency-bounded vocabulary.
///
/// Vocabulary selection keeps the `max_features` terms with the highest
/// document frequency, breaking frequency ties lexically, and orders the
/// output columns lexically. Feature names are therefore stable for a given
/// corpus, which matters because they become dataset column labels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    tokenizer: TextTokenizer,
    max_features: usize,
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    is_fitted: bool,
}

impl TfidfVectorizer {
    pub fn new(max_features: usize) -> Self {
        Self {
            tokenizer: TextTokenizer::new().with_english_stop_words(),
            max_features: max_features.max(1),
            vocabulary: HashMap::new(),
            idf: Vec::new(),
            is_fitted: false,
        }
    }

    /// Learns the vocabulary and IDF weights. An all-empty corpus is not an
    /// error; it yields a zero-width vectorizer that still counts as fitted.
    pub fn fit(&mut self, documents: &[String]) -> Result<()> {
        let mut doc_freq: HashMap<String, usize> = HashMap::new();

        for doc in documents {
            let tokens = self.tokenizer.tokenize(doc);
            let unique: HashSet<&String> = tokens.iter().collect();
            for token in unique {
                *doc_freq.entry(token.clone()).or_insert(0) += 1;
            }
        }

        let mut ranked: Vec<(String, usize)> = doc_freq.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(self.max_features);

        let mut terms: Vec<(String, usize)> = ranked;
        terms.sort_by(|a, b| a.0.cmp(&b.0));

        let n_docs = documents.len() as f64;
        self.vocabulary.clear();
        self.idf.clear();
        for (idx, (term, df)) in terms.into_iter().enumerate() {
            self.vocabulary.insert(term, idx);
            self.idf.push(((n_docs + 1.0) / (df as f64 + 1.0)).ln() + 1.0);
        }

        self.is_fitted = true;
        Ok(())
    }

    /// Encodes documents against the fitted vocabulary as an L2-normalized
    /// `(n_docs, n_features)` matrix.
    pub fn transform(&self, documents: &[String]) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(MarkovifyError::NotFitted);
        }

        let n_docs = documents.len();
        let n_features = self.vocabulary.len();
        let mut result = Array2::zeros((n_docs, n_features));

        for (doc_idx, doc) in documents.iter().enumerate() {
            let tokens = self.tokenizer.tokenize(doc);

            let mut counts: HashMap<&str, f64> = HashMap::new();
            for token in &tokens {
                *counts.entry(token.as_str()).or_insert(0.0) += 1.0;
            }

            for (term, &idx) in &self.vocabulary {
                if let Some(&count) = counts.get(term.as_str()) {
                    result[[doc_idx, idx]] = count * self.idf[idx];
                }
            }

            let norm: f64 = result.row(doc_idx).iter().map(|&v| v * v).sum::<f64>().sqrt();
            if norm > 0.0 {
                for j in 0..n_features {
                    result[[doc_idx, j]] /= norm;
                }
            }
        }

        Ok(result)
    }

    pub fn fit_transform(&mut self, documents: &[String]) -> Result<Array2<f64>> {
        self.fit(documents)?;
        self.transform(documents)
    }

    /// Vocabulary terms in column order.
    pub fn feature_names(&self) -> Vec<String> {
        let mut names = vec![String::new(); self.vocabulary.len()];
        for (term, &idx) in &self.vocabulary {
            names[idx] = term.clone();
        }
        names
    }

    pub fn n_features(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }
}
