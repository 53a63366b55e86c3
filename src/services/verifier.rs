//! 质量校验服务 - 业务能力层
//!
//! 只负责判断"一条分析结果是否合格"，纯函数，无副作用。
//! 拒绝原因是封闭枚举（`RejectReason`），供恢复编排和运行报告使用

use crate::config::Config;
use crate::error::RejectReason;
use crate::models::{AnalysisResult, PaperRecord};
use std::collections::HashSet;

/// 校验结论
#[derive(Debug, Clone, PartialEq)]
pub enum VerificationOutcome {
    /// 通过，结果原样采纳
    Accepted,
    /// 未通过，携带结构化原因
    Rejected(RejectReason),
}

impl VerificationOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, VerificationOutcome::Accepted)
    }
}

/// 质量校验器
pub struct QualityVerifier {
    min_summary_length: usize,
    /// 有效分类集合（小写比较；为空则不校验分类）
    valid_categories: HashSet<String>,
    /// 摘要与原文重合度阈值，超过视为照抄
    echo_threshold: f64,
}

impl QualityVerifier {
    pub fn new(config: &Config) -> Self {
        Self {
            min_summary_length: config.min_summary_length,
            valid_categories: config
                .filter
                .valid_categories
                .iter()
                .map(|c| c.to_lowercase())
                .collect(),
            echo_threshold: config.abstract_echo_threshold,
        }
    }

    /// 校验一条分析结果
    ///
    /// 检查顺序：分析是否失败 → 摘要是否为空 → 摘要长度 →
    /// 是否照抄原文 → 分类是否有效
    pub fn verify(&self, paper: &PaperRecord, result: &AnalysisResult) -> VerificationOutcome {
        use crate::error::FailureReason;

        if result.is_failed() {
            let kind = match &result.failure {
                Some(FailureReason::Service(kind)) => *kind,
                // 超时等非服务类失败统一按服务不可达处理
                _ => crate::error::ServiceFailure::ServiceUnavailable,
            };
            return VerificationOutcome::Rejected(RejectReason::AnalysisFailed(kind));
        }

        let summary = result.summary.trim();
        if summary.is_empty() {
            return VerificationOutcome::Rejected(RejectReason::EmptySummary);
        }

        let len = summary.chars().count();
        if len < self.min_summary_length {
            return VerificationOutcome::Rejected(RejectReason::SummaryTooShort {
                len,
                min: self.min_summary_length,
            });
        }

        let similarity = echo_similarity(summary, &paper.abstract_text);
        if similarity >= self.echo_threshold {
            return VerificationOutcome::Rejected(RejectReason::AbstractEcho { similarity });
        }

        if !self.valid_categories.is_empty()
            && !self.valid_categories.contains(&result.category.to_lowercase())
        {
            return VerificationOutcome::Rejected(RejectReason::InvalidCategory {
                category: result.category.clone(),
            });
        }

        VerificationOutcome::Accepted
    }
}

/// 计算摘要对原文的重合度（0.0 ~ 1.0）
///
/// 摘要的词元有多大比例逐字出现在原文中；摘要整段包含于原文时直接记 1.0
fn echo_similarity(summary: &str, abstract_text: &str) -> f64 {
    let abstract_lower = abstract_text.to_lowercase();
    let summary_lower = summary.to_lowercase();

    if abstract_lower.contains(summary_lower.trim()) {
        return 1.0;
    }

    let summary_tokens: Vec<&str> = summary_lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect();
    if summary_tokens.is_empty() {
        return 0.0;
    }

    let abstract_tokens: HashSet<&str> = abstract_lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect();

    let overlap = summary_tokens
        .iter()
        .filter(|t| abstract_tokens.contains(**t))
        .count();

    overlap as f64 / summary_tokens.len() as f64
}
