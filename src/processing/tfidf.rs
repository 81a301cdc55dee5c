//! TF-IDF vectorization over word n-grams with sparse, L2-normalized rows

use crate::config::NgramRange;
use crate::processing::text_processor::TextProcessor;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Sparse vector of `(feature index, weight)` pairs sorted by index
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    entries: Vec<(usize, f32)>,
}

impl SparseVector {
    pub fn from_sorted(entries: Vec<(usize, f32)>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[(usize, f32)] {
        &self.entries
    }

    pub fn is_zero(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    pub fn norm(&self) -> f32 {
        self.entries.iter().map(|(_, w)| w * w).sum::<f32>().sqrt()
    }

    pub fn dot(&self, other: &SparseVector) -> f32 {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0;
        while i < self.entries.len() && j < other.entries.len() {
            let (a_idx, a_w) = self.entries[i];
            let (b_idx, b_w) = other.entries[j];
            match a_idx.cmp(&b_idx) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += a_w * b_w;
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }

    /// Cosine similarity, zero when either side is the zero vector.
    pub fn cosine(&self, other: &SparseVector) -> f32 {
        let denom = self.norm() * other.norm();
        if denom == 0.0 {
            return 0.0;
        }
        (self.dot(other) / denom).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TfidfParams {
    pub ngram_range: NgramRange,
    /// Minimum number of documents a feature must appear in
    pub min_df: usize,
    /// Maximum share of documents a feature may appear in
    pub max_df: f32,
    pub sublinear_tf: bool,
}

impl Default for TfidfParams {
    fn default() -> Self {
        Self {
            ngram_range: NgramRange::default(),
            min_df: 1,
            max_df: 1.0,
            sublinear_tf: false,
        }
    }
}

/// Fitted vocabulary and smoothed IDF weights.
///
/// Feature indices follow lexical order of the vocabulary, so two fits over
/// the same documents produce identical vectors.
pub struct TfidfVectorizer {
    params: TfidfParams,
    vocabulary: HashMap<String, usize>,
    idf: Vec<f32>,
    processor: TextProcessor,
}

impl TfidfVectorizer {
    pub fn fit<S: AsRef<str>>(documents: &[S], params: TfidfParams) -> Self {
        let processor = TextProcessor::new();
        let mut doc_counts: BTreeMap<String, usize> = BTreeMap::new();

        for doc in documents {
            let unique: HashSet<String> = processor
                .analyze(doc.as_ref(), params.ngram_range)
                .into_iter()
                .collect();
            for term in unique {
                *doc_counts.entry(term).or_insert(0) += 1;
            }
        }

        let n_docs = documents.len();
        let max_doc_count = params.max_df * n_docs as f32;

        let mut vocabulary = HashMap::new();
        let mut idf = Vec::new();
        for (term, df) in doc_counts {
            if df < params.min_df || df as f32 > max_doc_count {
                continue;
            }
            vocabulary.insert(term, idf.len());
            idf.push(((1.0 + n_docs as f32) / (1.0 + df as f32)).ln() + 1.0);
        }

        Self {
            params,
            vocabulary,
            idf,
            processor,
        }
    }

    /// Fit and transform the same documents in one pass
    pub fn fit_transform<S: AsRef<str>>(
        documents: &[S],
        params: TfidfParams,
    ) -> (Self, Vec<SparseVector>) {
        let vectorizer = Self::fit(documents, params);
        let rows = documents
            .iter()
            .map(|d| vectorizer.transform(d.as_ref()))
            .collect();
        (vectorizer, rows)
    }

    /// Project text into the fitted space. Unknown features are dropped;
    /// text with no known features yields the zero vector.
    pub fn transform(&self, text: &str) -> SparseVector {
        let mut counts: BTreeMap<usize, f32> = BTreeMap::new();
        for term in self.processor.analyze(text, self.params.ngram_range) {
            if let Some(&idx) = self.vocabulary.get(&term) {
                *counts.entry(idx).or_insert(0.0) += 1.0;
            }
        }

        let mut entries: Vec<(usize, f32)> = counts
            .into_iter()
            .map(|(idx, tf)| {
                let tf = if self.params.sublinear_tf {
                    1.0 + tf.ln()
                } else {
                    tf
                };
                (idx, tf * self.idf[idx])
            })
            .collect();

        let norm = entries.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
        if norm > 0.0 {
            for (_, w) in entries.iter_mut() {
                *w /= norm;
            }
        }

        SparseVector::from_sorted(entries)
    }

    pub fn vocabulary_size(&self) -> usize {
        self.idf.len()
    }

    pub fn contains(&self, term: &str) -> bool {
        self.vocabulary.contains_key(term)
    }

    pub fn params(&self) -> &TfidfParams {
        &self.params
    }
}
