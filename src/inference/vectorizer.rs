//! TF-IDF Vectorizer Module
//!
//! Maps cleaned text onto the fixed feature space the model was trained on.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::inference::text::tokenize;

/// Row normalization applied after weighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Norm {
    L1,
    L2,
}

fn default_ngram_range() -> (usize, usize) {
    (1, 1)
}

fn default_norm() -> Option<Norm> {
    Some(Norm::L2)
}

// == TF-IDF Vectorizer ==
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    /// Term to feature index
    vocabulary: HashMap<String, usize>,
    /// Inverse document frequency per feature; plain term counts when absent
    #[serde(default)]
    idf: Option<Vec<f64>>,
    /// Smallest and largest n-gram length, in tokens
    #[serde(default = "default_ngram_range")]
    ngram_range: (usize, usize),
    #[serde(default = "default_norm")]
    norm: Option<Norm>,
}

impl TfidfVectorizer {
    /// Creates a unigram, L2-normalized vectorizer.
    pub fn new(vocabulary: HashMap<String, usize>, idf: Option<Vec<f64>>) -> Self {
        Self {
            vocabulary,
            idf,
            ngram_range: default_ngram_range(),
            norm: default_norm(),
        }
    }

    pub fn with_ngram_range(mut self, min: usize, max: usize) -> Self {
        self.ngram_range = (min, max);
        self
    }

    pub fn with_norm(mut self, norm: Option<Norm>) -> Self {
        self.norm = norm;
        self
    }

    /// Width of the produced feature rows.
    pub fn n_features(&self) -> usize {
        match &self.idf {
            Some(idf) => idf.len(),
            None => self.vocabulary.values().max().map_or(0, |max| max + 1),
        }
    }

    /// Checks internal consistency after deserialization.
    pub fn validate(&self) -> Result<(), String> {
        let (min, max) = self.ngram_range;
        if min == 0 || min > max {
            return Err(format!("invalid ngram_range ({}, {})", min, max));
        }

        let width = self.n_features();
        if let Some((term, index)) = self.vocabulary.iter().find(|(_, index)| **index >= width) {
            return Err(format!(
                "vocabulary term '{}' maps to index {} beyond {} features",
                term, index, width
            ));
        }
        if let Some(idf) = &self.idf {
            if idf.iter().any(|w| !w.is_finite()) {
                return Err("idf contains non-finite weights".to_string());
            }
        }

        Ok(())
    }

    // == Transform ==
    /// Turns cleaned text into one dense feature row.
    ///
    /// Out-of-vocabulary n-grams are ignored; a text with no known n-gram
    /// yields an all-zero row.
    pub fn transform(&self, text: &str) -> Vec<f64> {
        let mut row = vec![0.0; self.n_features()];
        let tokens = tokenize(text);
        let (min, max) = self.ngram_range;

        for n in min.max(1)..=max {
            for window in tokens.windows(n) {
                let gram = window.join(" ");
                if let Some(slot) = self.vocabulary.get(&gram).and_then(|&i| row.get_mut(i)) {
                    *slot += 1.0;
                }
            }
        }

        if let Some(idf) = &self.idf {
            for (value, weight) in row.iter_mut().zip(idf) {
                *value *= weight;
            }
        }

        let total = match self.norm {
            Some(Norm::L2) => row.iter().map(|v| v * v).sum::<f64>().sqrt(),
            Some(Norm::L1) => row.iter().map(|v| v.abs()).sum::<f64>(),
            None => 0.0,
        };
        if total > 0.0 {
            row.iter_mut().for_each(|v| *v /= total);
        }

        row
    }
}
