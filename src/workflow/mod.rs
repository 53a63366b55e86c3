pub mod paper_ctx;
pub mod recovery;

pub use paper_ctx::PaperCtx;
pub use recovery::{RecoveryOrchestrator, RejectedItem};
