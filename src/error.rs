//! 错误类型定义
//!
//! 错误分为两类：
//! - 致命错误（`PipelineError`）：配置非法、分析服务完全不可达，直接终止本次运行
//! - 条目级错误（`ServiceFailure` / `RejectReason`）：作为数据记录在
//!   `AnalysisResult` 中，不会中断整个批次

use serde::Serialize;
use thiserror::Error;

/// 流水线级别错误（终止整次运行）
#[derive(Debug, Error)]
pub enum PipelineError {
    /// 配置错误（在任何 I/O 之前检查）
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    /// 分析服务完全不可达：所有条目在任何一次成功之前全部失败
    #[error("分析服务完全不可达: 共尝试 {attempted} 篇论文，无一成功")]
    ServiceUnreachable { attempted: usize },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 批次大小必须为正数
    #[error("批次大小必须大于 0")]
    InvalidBatchSize,

    /// 过滤配置没有任何有效条件
    #[error("过滤配置无效: 关键词列表和分类白名单均为空")]
    NoActiveCriteria,

    /// 读取过滤配置文件失败
    #[error("无法读取过滤配置文件 ({path}): {source}")]
    FilterFileReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// 过滤配置文件解析失败
    #[error("过滤配置文件解析失败 ({path}): {source}")]
    FilterFileParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// 分析服务的瞬时失败类型
///
/// 这些失败会触发重试；重试耗尽后记录为条目失败，不向上抛出
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
pub enum ServiceFailure {
    /// 网络错误或服务端 5xx
    #[error("分析服务不可达")]
    ServiceUnavailable,

    /// 请求超时
    #[error("分析请求超时")]
    Timeout,

    /// 触发限流（429）
    #[error("分析请求被限流")]
    RateLimited,

    /// 响应无法解析（非 JSON、字段缺失、内容为空）
    #[error("分析服务返回内容无法解析")]
    MalformedResponse,
}

/// 质量校验的拒绝原因（封闭集合，便于穷举测试）
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
pub enum RejectReason {
    /// 分析调用本身失败（重试已耗尽）
    #[error("分析调用失败: {0}")]
    AnalysisFailed(ServiceFailure),

    /// 摘要为空
    #[error("摘要为空")]
    EmptySummary,

    /// 摘要长度低于阈值
    #[error("摘要过短 ({len} < {min})")]
    SummaryTooShort { len: usize, min: usize },

    /// 摘要与原文 abstract 几乎逐字重复（未经分析的直接复述）
    #[error("摘要疑似照抄原文 (重合度 {similarity:.2})")]
    AbstractEcho { similarity: f64 },

    /// 分类不在有效分类集合中
    #[error("分类 {category} 不在有效分类集合中")]
    InvalidCategory { category: String },
}

/// 条目最终失败原因（写入 RunReport）
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
pub enum FailureReason {
    /// 分析服务瞬时失败且重试耗尽
    #[error("{0}")]
    Service(#[from] ServiceFailure),

    /// 质量校验未通过且恢复次数耗尽
    #[error("质量校验未通过: {0}")]
    VerificationRejected(#[from] RejectReason),

    /// 运行超时，条目未被处理
    #[error("运行超时，条目未被处理")]
    RunTimeout,
}
