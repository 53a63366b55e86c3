use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 单篇论文的元数据
///
/// 从订阅源获取后在一次运行内不再变化
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperRecord {
    /// 来源内唯一且稳定的标识（如 arXiv ID）
    pub id: String,
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    /// 来源分类标签（如 cs.AI）
    #[serde(default)]
    pub categories: Vec<String>,
    /// 发布时间
    pub published: DateTime<Utc>,
    /// 原文链接
    pub url: String,
}

/// 通过筛选的候选论文及其选取依据
#[derive(Debug, Clone)]
pub struct Candidate {
    pub record: PaperRecord,
    /// 相关性得分（关键词权重之和 + 命中分类数）
    pub score: f64,
    /// 命中的关键词（写入日志，便于回溯选取原因）
    pub keyword_matches: Vec<String>,
}

/// 一次运行中选出的候选批次
///
/// 顺序即分析优先级：得分降序，得分相同时发布时间更新者优先，
/// 再相同时按 id 升序保证确定性
#[derive(Debug, Clone, Default)]
pub struct CandidateBatch {
    pub candidates: Vec<Candidate>,
}

impl CandidateBatch {
    pub fn new(candidates: Vec<Candidate>) -> Self {
        Self { candidates }
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// 按优先级顺序遍历论文记录
    pub fn papers(&self) -> impl Iterator<Item = &PaperRecord> {
        self.candidates.iter().map(|c| &c.record)
    }
}
