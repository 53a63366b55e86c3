//! 运行协调器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整条流水线的入口，按状态机顺序驱动一次完整运行：
//!
//! ```text
//! Idle → Selecting → Analyzing → Verifying → Recovering → Finalizing → Idle
//! ```
//!
//! ## 核心功能
//!
//! 1. **配置校验**：在任何 I/O 之前拒绝非法配置
//! 2. **候选筛选**：委托 CandidateSelector 产出有序批次
//! 3. **批量分析**：委托 AnalysisClient，按配置的并发数推进
//! 4. **质量校验**：委托 QualityVerifier 划分 {通过, 被拒}
//! 5. **恢复**：委托 RecoveryOrchestrator 重驱被拒条目
//! 6. **汇总**：构建 RunReport，连同采纳结果交给持久化协作方
//!
//! ## 设计特点
//!
//! - 条目失败被吸收进报告，整次运行只在配置非法或服务完全
//!   不可达时才失败
//! - 报告顺序是批次顺序的函数，与并发完成顺序无关（结果按
//!   批次位置归位）

use crate::config::Config;
use crate::error::{FailureReason, PipelineError, ServiceFailure};
use crate::models::{
    AnalysisResult, AnalysisStatus, FailureEntry, PaperRecord, RunOutcome, RunReport,
};
use crate::services::{
    AnalysisClient, AnalysisService, CandidateSelector, QualityVerifier, VerificationOutcome,
};
use crate::utils::logging::truncate_text;
use crate::workflow::{PaperCtx, RecoveryOrchestrator, RejectedItem};
use chrono::Utc;
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};

/// 运行状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Selecting,
    Analyzing,
    Verifying,
    Recovering,
    Finalizing,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Idle => "空闲",
            RunState::Selecting => "筛选中",
            RunState::Analyzing => "分析中",
            RunState::Verifying => "校验中",
            RunState::Recovering => "恢复中",
            RunState::Finalizing => "汇总中",
        };
        write!(f, "{}", name)
    }
}

/// 运行协调器
pub struct RunCoordinator<S: AnalysisService> {
    config: Config,
    client: AnalysisClient<S>,
    verifier: QualityVerifier,
}

impl<S: AnalysisService> RunCoordinator<S> {
    pub fn new(config: Config, service: S) -> Self {
        let client = AnalysisClient::new(service, &config);
        let verifier = QualityVerifier::new(&config);
        Self {
            config,
            client,
            verifier,
        }
    }

    /// 执行一次完整的流水线运行
    ///
    /// 这是核心对外的唯一入口。返回采纳结果集和运行报告；
    /// 条目级失败不会让整次运行失败
    pub async fn run_once(&self, records: Vec<PaperRecord>) -> Result<RunOutcome, PipelineError> {
        // 配置校验：在任何 I/O 之前
        self.config.validate()?;

        let started_at = Utc::now();
        let deadline = self
            .config
            .run_timeout_seconds
            .map(|secs| Instant::now() + Duration::from_secs(secs));
        let total_records = records.len();

        // ========== Selecting ==========
        let mut state = self.transition(RunState::Idle, RunState::Selecting);

        let selector =
            CandidateSelector::new(self.config.filter.clone(), self.config.max_batch_size);
        let batch = selector.select(records)?;

        info!(
            "✓ 筛选完成: {} 篇原始记录 → {} 篇候选",
            total_records,
            batch.len()
        );
        if self.config.verbose_logging {
            for (idx, candidate) in batch.candidates.iter().enumerate() {
                info!(
                    "[论文 {}] {} (得分 {:.1}, 关键词: {:?})",
                    idx + 1,
                    truncate_text(&candidate.record.title, 60),
                    candidate.score,
                    candidate.keyword_matches
                );
            }
        }

        if batch.is_empty() {
            state = self.transition(state, RunState::Finalizing);
            let report = RunReport {
                started_at,
                selected: 0,
                analyzed: 0,
                verified_ok: 0,
                recovered: 0,
                permanently_failed: 0,
                failure_reasons: vec![],
            };
            log_run_complete(&report);
            self.transition(state, RunState::Idle);
            return Ok(RunOutcome {
                accepted: vec![],
                report,
            });
        }

        // ========== Analyzing ==========
        state = self.transition(state, RunState::Analyzing);

        let results = self
            .client
            .analyze_batch(&batch, self.config.max_concurrent_analysis, deadline)
            .await;

        // 完全不可达判定：任何成功之前所有条目均为"服务不可达"
        let any_success = results
            .iter()
            .any(|r| r.status == AnalysisStatus::Succeeded);
        if !any_success
            && results.iter().all(|r| {
                matches!(
                    r.failure,
                    Some(FailureReason::Service(ServiceFailure::ServiceUnavailable))
                )
            })
        {
            return Err(PipelineError::ServiceUnreachable {
                attempted: results.len(),
            });
        }

        // ========== Verifying ==========
        state = self.transition(state, RunState::Verifying);

        // 结果按批次位置归位，与完成顺序无关
        let mut slots: Vec<Option<AnalysisResult>> = Vec::with_capacity(batch.len());
        slots.resize_with(batch.len(), || None);

        let mut first_pass_ok = 0usize;
        let mut rejected_indices = Vec::new();
        let mut rejected_items = Vec::new();

        for (idx, (candidate, result)) in
            batch.candidates.iter().zip(results.into_iter()).enumerate()
        {
            let ctx = PaperCtx::new(candidate.record.id.clone(), idx + 1);

            // 超时跳过的条目未经分析，不进入恢复
            if result.failure == Some(FailureReason::RunTimeout) {
                slots[idx] = Some(result);
                continue;
            }

            match self.verifier.verify(&candidate.record, &result) {
                VerificationOutcome::Accepted => {
                    info!("{} ✓ 校验通过", ctx);
                    first_pass_ok += 1;
                    slots[idx] = Some(result);
                }
                VerificationOutcome::Rejected(reason) => {
                    warn!("{} ⚠️ 校验未通过: {}", ctx, reason);
                    rejected_indices.push(idx);
                    rejected_items.push(RejectedItem {
                        ctx,
                        paper: &candidate.record,
                        result,
                        reason,
                    });
                }
            }
        }

        // ========== Recovering ==========
        state = self.transition(state, RunState::Recovering);

        if !rejected_items.is_empty() {
            info!("🔄 {} 条条目进入恢复流程", rejected_items.len());
            let orchestrator = RecoveryOrchestrator::new(
                &self.client,
                &self.verifier,
                self.config.max_recovery_attempts,
            );
            let recovered = orchestrator.recover(rejected_items).await;
            info!("恢复流程结束，共消耗 {} 个恢复轮次", orchestrator.cycles_spent());

            for (idx, result) in rejected_indices.into_iter().zip(recovered) {
                slots[idx] = Some(result);
            }
        }

        // ========== Finalizing ==========
        state = self.transition(state, RunState::Finalizing);

        let final_results: Vec<AnalysisResult> = slots.into_iter().flatten().collect();

        let analyzed = final_results.iter().filter(|r| r.attempts > 0).count();
        let recovered_count = final_results
            .iter()
            .filter(|r| r.status == AnalysisStatus::Recovered)
            .count();
        let failure_reasons: Vec<FailureEntry> = final_results
            .iter()
            .filter(|r| r.is_failed())
            .map(|r| FailureEntry {
                paper_id: r.paper_id.clone(),
                reason: r
                    .failure
                    .clone()
                    .unwrap_or(FailureReason::Service(ServiceFailure::ServiceUnavailable)),
            })
            .collect();

        let report = RunReport {
            started_at,
            selected: batch.len(),
            analyzed,
            verified_ok: first_pass_ok,
            recovered: recovered_count,
            permanently_failed: failure_reasons.len(),
            failure_reasons,
        };

        let accepted: Vec<AnalysisResult> = final_results
            .into_iter()
            .filter(|r| r.is_succeeded())
            .collect();

        log_run_complete(&report);
        self.transition(state, RunState::Idle);

        Ok(RunOutcome { accepted, report })
    }

    fn transition(&self, from: RunState, to: RunState) -> RunState {
        info!("🔁 状态: {} → {}", from, to);
        to
    }
}

// ========== 日志辅助函数 ==========

fn log_run_complete(report: &RunReport) {
    info!("{}", "=".repeat(60));
    info!("📊 本次运行统计");
    info!("入选: {}", report.selected);
    info!("已分析: {}", report.analyzed);
    info!("✅ 首轮通过: {}", report.verified_ok);
    info!("🔄 恢复成功: {}", report.recovered);
    info!("❌ 永久失败: {}", report.permanently_failed);
    for entry in &report.failure_reasons {
        info!("  - {}: {}", entry.paper_id, entry.reason);
    }
    info!("{}", "=".repeat(60));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AnalysisOutput;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct UnreachableService;

    impl AnalysisService for UnreachableService {
        async fn analyze(
            &self,
            _title: &str,
            _abstract_text: &str,
        ) -> Result<AnalysisOutput, ServiceFailure> {
            Err(ServiceFailure::ServiceUnavailable)
        }
    }

    fn matching_paper(id: &str) -> PaperRecord {
        PaperRecord {
            id: id.to_string(),
            title: "A large language model study".to_string(),
            abstract_text: "We analyze agent behavior.".to_string(),
            categories: vec!["cs.AI".to_string()],
            published: Utc::now(),
            url: String::new(),
        }
    }

    fn fast_config() -> Config {
        Config {
            retry_delay_seconds: 0,
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn test_unreachable_service_is_fatal() {
        let coordinator = RunCoordinator::new(fast_config(), UnreachableService);

        let outcome = coordinator
            .run_once(vec![matching_paper("u1"), matching_paper("u2")])
            .await;

        assert!(matches!(
            outcome,
            Err(PipelineError::ServiceUnreachable { attempted: 2 })
        ));
    }

    #[tokio::test]
    async fn test_empty_selection_produces_zero_report() {
        let coordinator = RunCoordinator::new(fast_config(), UnreachableService);

        // 没有任何记录命中过滤条件
        let nothing = PaperRecord {
            id: "n1".to_string(),
            title: "Pure mathematics".to_string(),
            abstract_text: "Number theory.".to_string(),
            categories: vec!["math.NT".to_string()],
            published: Utc::now(),
            url: String::new(),
        };

        let outcome = coordinator.run_once(vec![nothing]).await.unwrap();
        assert_eq!(outcome.report.selected, 0);
        assert!(outcome.accepted.is_empty());
    }

    /// 记录调用次数的合格桩服务
    struct CountingService {
        calls: Arc<AtomicUsize>,
    }

    impl AnalysisService for CountingService {
        async fn analyze(
            &self,
            _title: &str,
            _abstract_text: &str,
        ) -> Result<AnalysisOutput, ServiceFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(AnalysisOutput {
                summary: "该文分析了大模型智能体的行为模式并给出了系统性结论。".to_string(),
                category: "LLM".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_run_timeout_marks_remaining_items_without_recovery() {
        let calls = Arc::new(AtomicUsize::new(0));
        let config = Config {
            run_timeout_seconds: Some(0),
            ..fast_config()
        };
        let coordinator = RunCoordinator::new(
            config,
            CountingService {
                calls: calls.clone(),
            },
        );

        let outcome = coordinator
            .run_once(vec![matching_paper("t1"), matching_paper("t2")])
            .await
            .unwrap();
        let report = &outcome.report;

        // 超时条目仍入选但未经分析，部分报告照常产出
        assert_eq!(report.selected, 2);
        assert_eq!(report.analyzed, 0);
        assert_eq!(report.verified_ok, 0);
        assert_eq!(report.recovered, 0);
        assert_eq!(report.permanently_failed, 2);
        assert!(report
            .failure_reasons
            .iter()
            .all(|entry| entry.reason == FailureReason::RunTimeout));

        assert!(outcome.accepted.is_empty());
        // 超时条目不进入恢复流程，服务不应收到任何调用
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invalid_config_rejected_before_io() {
        let config = Config {
            max_batch_size: 0,
            ..fast_config()
        };
        let coordinator = RunCoordinator::new(config, UnreachableService);

        let outcome = coordinator.run_once(vec![matching_paper("c1")]).await;
        assert!(matches!(outcome, Err(PipelineError::Config(_))));
    }
}
