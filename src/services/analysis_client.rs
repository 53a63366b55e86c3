//! 分析客户端 - 业务能力层
//!
//! 负责驱动外部 AI 分析服务的调用：重试、退避、批次推进。
//! 条目失败是数据而不是异常——重试耗尽后记录失败原因并继续下一条，
//! 绝不向调用方抛出

use crate::config::Config;
use crate::error::{FailureReason, ServiceFailure};
use crate::models::{AnalysisOutput, AnalysisResult, CandidateBatch, PaperRecord};
use futures::future::join_all;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

/// 外部分析服务接口
///
/// 生产实现调用 LLM API（见 `LlmAnalysisService`）；
/// 测试中用脚本化的桩实现注入失败序列
#[allow(async_fn_in_trait)]
pub trait AnalysisService {
    /// 对一篇论文的标题和 abstract 做一次分析调用
    async fn analyze(
        &self,
        title: &str,
        abstract_text: &str,
    ) -> Result<AnalysisOutput, ServiceFailure>;
}

/// 分析客户端
///
/// 职责：
/// - 对单篇论文执行"调用 + 重试"的完整周期
/// - 按批次顺序推进，条目之间相互独立
/// - 不做质量判断，不做本地持久化
pub struct AnalysisClient<S: AnalysisService> {
    service: S,
    max_retries: usize,
    retry_delay: Duration,
}

impl<S: AnalysisService> AnalysisClient<S> {
    pub fn new(service: S, config: &Config) -> Self {
        Self {
            service,
            max_retries: config.max_analysis_retries.max(1),
            retry_delay: Duration::from_secs(config.retry_delay_seconds),
        }
    }

    /// 使用自定义重试策略创建（测试中配合零延迟使用）
    pub fn with_retry_policy(service: S, max_retries: usize, retry_delay: Duration) -> Self {
        Self {
            service,
            max_retries: max_retries.max(1),
            retry_delay,
        }
    }

    /// 执行一个完整的重试周期：最多 `max_retries` 次调用
    ///
    /// 返回最终结果和本周期实际发起的调用次数
    pub async fn run_cycle(
        &self,
        paper: &PaperRecord,
    ) -> (Result<AnalysisOutput, ServiceFailure>, usize) {
        let mut attempts = 0;
        loop {
            attempts += 1;
            debug!(
                "[论文 {}] 发起分析调用 (第 {}/{} 次)",
                paper.id, attempts, self.max_retries
            );

            match self.service.analyze(&paper.title, &paper.abstract_text).await {
                Ok(output) => return (Ok(output), attempts),
                Err(kind) => {
                    warn!(
                        "[论文 {}] 分析调用失败 (第 {}/{} 次): {}",
                        paper.id, attempts, self.max_retries, kind
                    );
                    if attempts >= self.max_retries {
                        return (Err(kind), attempts);
                    }
                    if !self.retry_delay.is_zero() {
                        sleep(self.retry_delay).await;
                    }
                }
            }
        }
    }

    /// 分析单篇论文，失败记录在结果中而不是抛出
    pub async fn analyze(&self, paper: &PaperRecord) -> AnalysisResult {
        let mut result = AnalysisResult::pending(&paper.id);
        match self.run_cycle(paper).await {
            (Ok(output), attempts) => result.mark_succeeded(output, attempts),
            (Err(kind), attempts) => result.mark_failed(kind.into(), attempts),
        }
        result
    }

    /// 按批次顺序分析所有候选论文
    ///
    /// 以 `max_concurrent` 为一波并发推进，每波完成后再开始下一波；
    /// 结果顺序严格等于批次顺序，与完成顺序无关。
    /// 超过 `deadline` 后尚未开始的条目直接记为 RunTimeout 失败，
    /// 已在途的调用不会被中途取消
    pub async fn analyze_batch(
        &self,
        batch: &CandidateBatch,
        max_concurrent: usize,
        deadline: Option<Instant>,
    ) -> Vec<AnalysisResult> {
        let wave_size = max_concurrent.max(1);
        let mut results = Vec::with_capacity(batch.len());

        for wave in batch.candidates.chunks(wave_size) {
            let wave_futures = wave
                .iter()
                .map(|candidate| self.analyze_unless_expired(&candidate.record, deadline));
            results.extend(join_all(wave_futures).await);
        }

        results
    }

    async fn analyze_unless_expired(
        &self,
        paper: &PaperRecord,
        deadline: Option<Instant>,
    ) -> AnalysisResult {
        if let Some(deadline) = deadline {
            if Instant::now() >= deadline {
                warn!("[论文 {}] ⚠️ 运行已超时，跳过分析", paper.id);
                let mut result = AnalysisResult::pending(&paper.id);
                result.mark_failed(FailureReason::RunTimeout, 0);
                return result;
            }
        }
        self.analyze(paper).await
    }
}
