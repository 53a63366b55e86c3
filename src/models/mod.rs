pub mod analysis;
pub mod loaders;
pub mod paper;

pub use analysis::{
    AnalysisOutput, AnalysisResult, AnalysisStatus, FailureEntry, RunOutcome, RunReport,
};
pub use loaders::{load_all_paper_files, load_paper_records};
pub use paper::{Candidate, CandidateBatch, PaperRecord};
