pub mod classifier;
pub mod deck;
pub mod diagnosis;
pub mod llm_service;
pub mod submitter;

pub use classifier::{Classifier, LlmClassifier, TextOracle};
pub use deck::{load_deck, load_deck_with_rng, Deck};
pub use diagnosis::diagnose;
pub use llm_service::LlmService;
pub use submitter::{build_payload, FileResultSink, HttpResultSink, ResultSink};
