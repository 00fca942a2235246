pub mod answer;
pub mod loaders;
pub mod plate;
pub mod report;

pub use answer::{Answer, ClassificationResult, Evaluation, FALLBACK_REASONING};
pub use loaders::{load_catalog, parse_catalog, validate_catalog};
pub use plate::{ExpectedAnswers, Plate, VisionCategory};
pub use report::{
    AnswerRecord, DiagnosisCounts, ScreeningReport, SessionSummary, SubmissionPayload,
    SubmissionReceipt,
};
