//! Email classification pipeline.
//!
//! Every submission flows through:
//! 1. `submission::decode()`: plain text or PDF upload → text (blocking pool)
//! 2. `normalize::normalize()`: lowercase, strip punctuation, stopwords, stem
//! 3. `TrainedRouter::predict()`: local TF-IDF + naive Bayes (no LLM)
//! 4. `EnrichmentClient::enrich()`: sub-category and suggested reply
//!
//! `EmailProcessor` sequences the steps and owns the trivial-input guard.

pub mod dataset;
pub mod enrichment;
pub mod normalize;
pub mod processor;
pub mod router;
pub mod submission;
pub mod types;

pub use enrichment::EnrichmentClient;
pub use processor::EmailProcessor;
pub use router::TrainedRouter;
pub use types::{Category, EnrichmentResult, LabeledExample, RawSubmission, ResponsePayload};
