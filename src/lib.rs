//! # arXiv Paper Analysis
//!
//! 一个带质量监控和自恢复能力的论文批量分析流水线
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 数据层（Models）
//! - `models/` - PaperRecord / CandidateBatch / AnalysisResult / RunReport
//! - `models/loaders/` - 从本地 JSON 文件加载论文记录
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个条目
//! - `CandidateSelector` - 过滤 / 去重 / 打分 / 截断能力
//! - `AnalysisClient` - 带重试的分析调用能力
//! - `LlmAnalysisService` - LLM 分析能力（`AnalysisService` 的生产实现）
//! - `QualityVerifier` - 结果质量校验能力
//! - `HistoryWriter` - 运行历史落盘能力
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一条被拒条目"的恢复流程
//! - `PaperCtx` - 上下文封装（paper_id + batch_index）
//! - `RecoveryOrchestrator` - 恢复编排（重分析 → 复验 → 标记）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/run_coordinator` - 一次运行的状态机与统计汇总

pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::{Config, FilterConfig};
pub use error::{ConfigError, FailureReason, PipelineError, RejectReason, ServiceFailure};
pub use models::{
    AnalysisOutput, AnalysisResult, AnalysisStatus, CandidateBatch, PaperRecord, RunOutcome,
    RunReport,
};
pub use orchestrator::{RunCoordinator, RunState};
pub use services::{
    AnalysisClient, AnalysisService, CandidateSelector, HistoryWriter, LlmAnalysisService,
    PersistenceSink, QualityVerifier, VerificationOutcome,
};
pub use workflow::{PaperCtx, RecoveryOrchestrator, RejectedItem};
