//! Cited-URL content tooling: batched page extraction and content-structure
//! classification.

pub mod classifier;
pub mod error;
pub mod extractor;

pub use classifier::{
    classify_heuristic, Classification, UrlClassifier, HEURISTIC_VERSION, LLM_VERSION,
};
pub use error::ContentError;
pub use extractor::{
    ExtractedPage, ExtractionOutcome, ExtractorClient, FailedExtraction, EXTRACT_BATCH_SIZE,
};
