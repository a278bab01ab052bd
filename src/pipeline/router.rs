//! Local router: TF-IDF features + multinomial naive Bayes.
//!
//! Trained once at startup and never mutated, so a `TrainedRouter` can be
//! shared behind an `Arc` by every request without locking. There is no
//! untrained state: the only way to get a router is a successful `train`.

use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info};

use crate::error::RouterError;
use crate::pipeline::normalize::normalize;
use crate::pipeline::types::{Category, LabeledExample};

/// Additive (Laplace) smoothing for the naive-Bayes likelihoods.
const ALPHA: f64 = 1.0;

/// Tokens of two or more word characters.
static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b\w\w+\b").unwrap_or_else(|e| panic!("invalid token pattern: {e}"))
});

fn tokenize(doc: &str) -> impl Iterator<Item = &str> {
    TOKEN_RE.find_iter(doc).map(|m| m.as_str())
}

/// Sparse feature vector: `(feature index, weight)`, sorted by index.
pub type SparseVector = Vec<(usize, f64)>;

// ── Vectorizer ──────────────────────────────────────────────────────

/// TF-IDF vectorizer with a vocabulary fixed at fit time.
#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
}

impl TfidfVectorizer {
    /// Learn the vocabulary and smoothed IDF weights from normalized docs.
    ///
    /// `idf = ln((1 + n) / (1 + df)) + 1`, so every term has a finite,
    /// strictly positive weight.
    pub fn fit(docs: &[String]) -> Self {
        let terms: BTreeSet<&str> = docs.iter().flat_map(|d| tokenize(d)).collect();
        let vocabulary: HashMap<String, usize> = terms
            .into_iter()
            .enumerate()
            .map(|(i, t)| (t.to_string(), i))
            .collect();

        let mut df = vec![0usize; vocabulary.len()];
        for doc in docs {
            let seen: BTreeSet<usize> = tokenize(doc)
                .filter_map(|t| vocabulary.get(t).copied())
                .collect();
            for index in seen {
                df[index] += 1;
            }
        }

        let n = docs.len() as f64;
        let idf = df
            .into_iter()
            .map(|d| ((1.0 + n) / (1.0 + d as f64)).ln() + 1.0)
            .collect();

        Self { vocabulary, idf }
    }

    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }

    /// Vectorize a normalized document: raw counts × IDF, L2-normalized.
    ///
    /// Out-of-vocabulary tokens are dropped; a document with no known
    /// tokens yields an empty vector.
    pub fn transform(&self, doc: &str) -> SparseVector {
        let mut counts: HashMap<usize, f64> = HashMap::new();
        for token in tokenize(doc) {
            if let Some(&index) = self.vocabulary.get(token) {
                *counts.entry(index).or_insert(0.0) += 1.0;
            }
        }

        let mut vector: SparseVector = counts
            .into_iter()
            .map(|(index, count)| (index, count * self.idf[index]))
            .collect();
        vector.sort_unstable_by_key(|(index, _)| *index);

        let norm = vector.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, weight) in &mut vector {
                *weight /= norm;
            }
        }
        vector
    }
}

// ── Naive Bayes ─────────────────────────────────────────────────────

/// Multinomial naive Bayes over the two categories.
#[derive(Debug, Clone)]
pub struct MultinomialNb {
    class_log_prior: [f64; 2],
    feature_log_prob: [Vec<f64>; 2],
}

impl MultinomialNb {
    /// Fit from vectorized documents. Both classes must be present.
    fn fit(vectors: &[SparseVector], labels: &[Category], n_features: usize) -> Self {
        let mut class_docs = [0usize; 2];
        let mut feature_count = [vec![0.0f64; n_features], vec![0.0f64; n_features]];

        for (vector, label) in vectors.iter().zip(labels) {
            let c = label.index();
            class_docs[c] += 1;
            for &(index, weight) in vector {
                feature_count[c][index] += weight;
            }
        }

        let total_docs = labels.len() as f64;
        let class_log_prior = [
            (class_docs[0] as f64 / total_docs).ln(),
            (class_docs[1] as f64 / total_docs).ln(),
        ];

        let feature_log_prob = feature_count.map(|counts| {
            let denom = (counts.iter().sum::<f64>() + ALPHA * n_features as f64).ln();
            counts
                .iter()
                .map(|c| (c + ALPHA).ln() - denom)
                .collect::<Vec<f64>>()
        });

        Self {
            class_log_prior,
            feature_log_prob,
        }
    }

    /// Joint log-likelihood `log P(c) + Σ x_t log P(t|c)` per class.
    pub fn joint_log_likelihood(&self, vector: &SparseVector) -> [f64; 2] {
        let mut scores = self.class_log_prior;
        for (c, score) in scores.iter_mut().enumerate() {
            *score += vector
                .iter()
                .map(|&(index, weight)| weight * self.feature_log_prob[c][index])
                .sum::<f64>();
        }
        scores
    }
}

// ── Router ──────────────────────────────────────────────────────────

/// The fitted router: vocabulary, IDF weights and naive-Bayes parameters.
#[derive(Debug, Clone)]
pub struct TrainedRouter {
    vectorizer: TfidfVectorizer,
    model: MultinomialNb,
    class_counts: [usize; 2],
}

impl TrainedRouter {
    /// Train from the full labeled collection.
    pub fn train(examples: &[LabeledExample]) -> Result<Self, RouterError> {
        if examples.is_empty() {
            return Err(RouterError::EmptyDataset);
        }
        if let Some(index) = examples.iter().position(|e| e.text.trim().is_empty()) {
            return Err(RouterError::EmptyText { index });
        }

        let mut class_counts = [0usize; 2];
        for example in examples {
            class_counts[example.label.index()] += 1;
        }
        if let Some(missing) = Category::ALL.iter().find(|c| class_counts[c.index()] == 0) {
            return Err(RouterError::MissingCategory {
                category: missing.to_string(),
            });
        }

        info!(count = examples.len(), "Training local router");

        let docs: Vec<String> = examples.iter().map(|e| normalize(&e.text)).collect();
        let vectorizer = TfidfVectorizer::fit(&docs);
        if vectorizer.vocabulary_len() == 0 {
            return Err(RouterError::EmptyVocabulary);
        }

        let vectors: Vec<SparseVector> = docs.iter().map(|d| vectorizer.transform(d)).collect();
        let labels: Vec<Category> = examples.iter().map(|e| e.label).collect();
        let model = MultinomialNb::fit(&vectors, &labels, vectorizer.vocabulary_len());

        info!(
            vocabulary = vectorizer.vocabulary_len(),
            productive = class_counts[Category::Productive.index()],
            unproductive = class_counts[Category::Unproductive.index()],
            "Local router trained"
        );

        Ok(Self {
            vectorizer,
            model,
            class_counts,
        })
    }

    /// Classify raw text. Never fails, including for empty input.
    ///
    /// The class with the higher joint log-likelihood wins; ties go to
    /// `Unproductive`.
    pub fn predict(&self, text: &str) -> Category {
        let [unproductive, productive] = self.predict_scores(text);
        let category = if productive > unproductive {
            Category::Productive
        } else {
            Category::Unproductive
        };
        debug!(unproductive, productive, category = %category, "Router prediction");
        category
    }

    /// Joint log-likelihoods `[unproductive, productive]` for `text`.
    pub fn predict_scores(&self, text: &str) -> [f64; 2] {
        let vector = self.vectorizer.transform(&normalize(text));
        self.model.joint_log_likelihood(&vector)
    }

    pub fn vocabulary_len(&self) -> usize {
        self.vectorizer.vocabulary_len()
    }

    /// Training examples per category, indexed by `Category::index`.
    pub fn class_counts(&self) -> [usize; 2] {
        self.class_counts
    }
}
