use crate::error::FailureReason;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 分析服务返回的原始结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisOutput {
    pub summary: String,
    pub category: String,
}

/// 分析条目状态
///
/// 状态迁移：`Pending → {Succeeded | Failed}`；`Failed`（或校验被拒的条目）
/// 在恢复成功后迁移到 `Recovered`，恢复耗尽则保持 `Failed`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AnalysisStatus {
    Pending,
    Succeeded,
    Failed,
    Recovered,
}

/// 单篇论文的分析结果
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    /// 对应 PaperRecord 的标识
    pub paper_id: String,
    pub summary: String,
    pub category: String,
    /// 累计调用次数（含失败的调用和恢复轮次中的调用）
    pub attempts: usize,
    pub status: AnalysisStatus,
    /// 最终失败原因（仅 Failed 状态持有）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureReason>,
}

impl AnalysisResult {
    /// 创建初始（Pending）结果
    pub fn pending(paper_id: impl Into<String>) -> Self {
        Self {
            paper_id: paper_id.into(),
            summary: String::new(),
            category: String::new(),
            attempts: 0,
            status: AnalysisStatus::Pending,
            failure: None,
        }
    }

    /// 标记分析成功
    pub fn mark_succeeded(&mut self, output: AnalysisOutput, attempts: usize) {
        self.summary = output.summary;
        self.category = output.category;
        self.attempts += attempts;
        self.status = AnalysisStatus::Succeeded;
        self.failure = None;
    }

    /// 标记分析失败
    pub fn mark_failed(&mut self, reason: FailureReason, attempts: usize) {
        self.attempts += attempts;
        self.status = AnalysisStatus::Failed;
        self.failure = Some(reason);
    }

    /// 恢复成功：用新的分析结果覆盖并迁移到 Recovered
    pub fn mark_recovered(&mut self, output: AnalysisOutput, attempts: usize) {
        self.summary = output.summary;
        self.category = output.category;
        self.attempts += attempts;
        self.status = AnalysisStatus::Recovered;
        self.failure = None;
    }

    pub fn is_succeeded(&self) -> bool {
        matches!(
            self.status,
            AnalysisStatus::Succeeded | AnalysisStatus::Recovered
        )
    }

    pub fn is_failed(&self) -> bool {
        self.status == AnalysisStatus::Failed
    }
}

/// 最终失败条目及原因
#[derive(Debug, Clone, Serialize)]
pub struct FailureEntry {
    pub paper_id: String,
    pub reason: FailureReason,
}

/// 一次运行的汇总报告
///
/// 由 RunCoordinator 在 Finalizing 阶段一次性构建，运行结束后不再修改；
/// 与最终接受的结果集一起交给持久化协作方
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    /// 入选批次的论文数
    pub selected: usize,
    /// 实际发起过分析调用的论文数
    pub analyzed: usize,
    /// 首轮校验即通过的论文数
    pub verified_ok: usize,
    /// 经恢复后通过的论文数
    pub recovered: usize,
    /// 最终失败的论文数
    pub permanently_failed: usize,
    /// 每个最终失败条目的原因（不允许静默丢弃）
    pub failure_reasons: Vec<FailureEntry>,
}

/// 一次运行的完整产出
#[derive(Debug)]
pub struct RunOutcome {
    /// 按批次顺序排列的、校验通过的结果集
    pub accepted: Vec<AnalysisResult>,
    pub report: RunReport,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceFailure;

    #[test]
    fn test_status_transitions() {
        let mut result = AnalysisResult::pending("2508.01234");
        assert_eq!(result.status, AnalysisStatus::Pending);

        result.mark_failed(ServiceFailure::Timeout.into(), 3);
        assert_eq!(result.status, AnalysisStatus::Failed);
        assert_eq!(result.attempts, 3);
        assert!(result.failure.is_some());

        result.mark_recovered(
            AnalysisOutput {
                summary: "恢复后的摘要".to_string(),
                category: "LLM".to_string(),
            },
            2,
        );
        assert_eq!(result.status, AnalysisStatus::Recovered);
        assert_eq!(result.attempts, 5);
        assert!(result.failure.is_none());
        assert!(result.is_succeeded());
    }
}
