//! 恢复编排 - 流程层
//!
//! 核心职责：对质量校验被拒的条目重新驱动分析
//!
//! 流程顺序：
//! 1. 重新调用分析客户端（一个完整的重试周期）
//! 2. 复验新结果
//! 3. 通过 → 标记 Recovered 并提前结束；未通过 → 进入下一轮
//! 4. 轮数耗尽 → 标记永久失败，原因记入运行报告

use crate::error::{FailureReason, RejectReason};
use crate::models::{AnalysisResult, PaperRecord};
use crate::services::{AnalysisClient, AnalysisService, QualityVerifier, VerificationOutcome};
use crate::workflow::paper_ctx::PaperCtx;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{error, info, warn};

/// 一条待恢复的条目
#[derive(Debug)]
pub struct RejectedItem<'a> {
    pub ctx: PaperCtx,
    pub paper: &'a PaperRecord,
    pub result: AnalysisResult,
    pub reason: RejectReason,
}

/// 恢复编排器
///
/// - 逐条重新分析并复验，条目之间相互独立
/// - 轮数限制按条目生效；全局计数器只用于观测，不参与判断
/// - 不持有任何资源，只依赖业务能力（client / verifier）
pub struct RecoveryOrchestrator<'a, S: AnalysisService> {
    client: &'a AnalysisClient<S>,
    verifier: &'a QualityVerifier,
    max_recovery_attempts: usize,
    /// 本次运行累计消耗的恢复轮数（观测用）
    cycles_spent: AtomicUsize,
}

impl<'a, S: AnalysisService> RecoveryOrchestrator<'a, S> {
    pub fn new(
        client: &'a AnalysisClient<S>,
        verifier: &'a QualityVerifier,
        max_recovery_attempts: usize,
    ) -> Self {
        Self {
            client,
            verifier,
            max_recovery_attempts,
            cycles_spent: AtomicUsize::new(0),
        }
    }

    /// 本次运行累计消耗的恢复轮数
    pub fn cycles_spent(&self) -> usize {
        self.cycles_spent.load(Ordering::Relaxed)
    }

    /// 依次恢复所有被拒条目，返回顺序与输入一致
    pub async fn recover(&self, rejected: Vec<RejectedItem<'_>>) -> Vec<AnalysisResult> {
        let mut recovered = Vec::with_capacity(rejected.len());
        for item in rejected {
            recovered.push(self.recover_item(item).await);
        }
        recovered
    }

    /// 恢复单条条目
    async fn recover_item(&self, item: RejectedItem<'_>) -> AnalysisResult {
        let RejectedItem {
            ctx,
            paper,
            mut result,
            mut reason,
        } = item;

        for cycle in 1..=self.max_recovery_attempts {
            info!(
                "{} 🔄 恢复轮次 {}/{} (上次原因: {})",
                ctx, cycle, self.max_recovery_attempts, reason
            );
            self.cycles_spent.fetch_add(1, Ordering::Relaxed);

            let (outcome, attempts) = self.client.run_cycle(paper).await;
            match outcome {
                Ok(output) => {
                    // 复验新产出
                    let mut fresh = AnalysisResult::pending(&paper.id);
                    fresh.mark_succeeded(output.clone(), 0);

                    match self.verifier.verify(paper, &fresh) {
                        VerificationOutcome::Accepted => {
                            result.mark_recovered(output, attempts);
                            info!("{} ✅ 恢复成功 (轮次 {})", ctx, cycle);
                            return result;
                        }
                        VerificationOutcome::Rejected(new_reason) => {
                            warn!("{} ⚠️ 恢复结果仍未通过校验: {}", ctx, new_reason);
                            result.attempts += attempts;
                            reason = new_reason;
                        }
                    }
                }
                Err(kind) => {
                    warn!("{} ⚠️ 恢复轮次分析失败: {}", ctx, kind);
                    result.attempts += attempts;
                    reason = RejectReason::AnalysisFailed(kind);
                }
            }
        }

        // 轮数耗尽：按最后一次拒绝原因标记永久失败
        let final_reason = match reason {
            RejectReason::AnalysisFailed(kind) => FailureReason::Service(kind),
            other => FailureReason::VerificationRejected(other),
        };
        result.mark_failed(final_reason, 0);
        error!("{} ❌ 恢复次数耗尽，标记为永久失败", ctx);
        result
    }
}
