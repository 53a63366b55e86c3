pub mod analysis_client;
pub mod llm_service;
pub mod persistence;
pub mod selector;
pub mod verifier;

pub use analysis_client::{AnalysisClient, AnalysisService};
pub use llm_service::LlmAnalysisService;
pub use persistence::{HistoryWriter, PersistenceSink};
pub use selector::CandidateSelector;
pub use verifier::{QualityVerifier, VerificationOutcome};
