//! 候选筛选服务 - 业务能力层
//!
//! 只负责"从原始论文中选出本次要分析的批次"这一能力：
//! 过滤 → 去重 → 打分排序 → 截断。纯函数，无任何副作用

use crate::config::FilterConfig;
use crate::error::ConfigError;
use crate::models::{Candidate, CandidateBatch, PaperRecord};
use tracing::debug;

/// 候选筛选器
pub struct CandidateSelector {
    filter: FilterConfig,
    max_batch_size: usize,
}

impl CandidateSelector {
    pub fn new(filter: FilterConfig, max_batch_size: usize) -> Self {
        Self {
            filter,
            max_batch_size,
        }
    }

    /// 从原始记录中选出候选批次
    ///
    /// - 保留分类命中白名单、或标题/abstract 命中关键词的记录
    /// - 按 id 去重，保留首次出现
    /// - 得分降序排列，得分相同时发布时间更新者在前，再按 id 升序
    /// - 截断到 `max_batch_size`
    pub fn select(&self, records: Vec<PaperRecord>) -> Result<CandidateBatch, ConfigError> {
        if self.max_batch_size == 0 {
            return Err(ConfigError::InvalidBatchSize);
        }
        if !self.filter.has_active_criteria() {
            return Err(ConfigError::NoActiveCriteria);
        }

        let mut seen_ids = std::collections::HashSet::new();
        let mut candidates: Vec<Candidate> = Vec::new();

        for record in records {
            // 去重：保留输入顺序中的首次出现
            if !seen_ids.insert(record.id.clone()) {
                debug!("跳过重复论文: {}", record.id);
                continue;
            }

            let (score, keyword_matches) = self.score(&record);
            if score <= 0.0 {
                continue;
            }

            candidates.push(Candidate {
                record,
                score,
                keyword_matches,
            });
        }

        // 完整排序键保证确定性：得分 desc → 发布时间 desc → id asc
        candidates.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| b.record.published.cmp(&a.record.published))
                .then_with(|| a.record.id.cmp(&b.record.id))
        });

        candidates.truncate(self.max_batch_size);

        Ok(CandidateBatch::new(candidates))
    }

    /// 计算相关性得分并返回命中的关键词
    ///
    /// 得分 = 命中关键词的权重之和 + 命中白名单的分类数
    fn score(&self, record: &PaperRecord) -> (f64, Vec<String>) {
        let text = format!("{} {}", record.title, record.abstract_text).to_lowercase();

        let mut score = 0.0;
        let mut matches = Vec::new();

        for (keyword, weight) in &self.filter.keywords {
            if text.contains(&keyword.to_lowercase()) {
                score += weight;
                matches.push(keyword.clone());
            }
        }

        for category in &record.categories {
            if self
                .filter
                .categories
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(category))
            {
                score += 1.0;
            }
        }

        (score, matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::collections::BTreeMap;

    fn paper(id: &str, title: &str, abstract_text: &str, day: u32) -> PaperRecord {
        PaperRecord {
            id: id.to_string(),
            title: title.to_string(),
            abstract_text: abstract_text.to_string(),
            categories: vec![],
            published: Utc.with_ymd_and_hms(2025, 8, day, 0, 0, 0).unwrap(),
            url: format!("https://arxiv.org/abs/{}", id),
        }
    }

    fn keyword_filter(pairs: &[(&str, f64)]) -> FilterConfig {
        let mut keywords = BTreeMap::new();
        for (k, w) in pairs {
            keywords.insert(k.to_string(), *w);
        }
        FilterConfig {
            keywords,
            categories: vec![],
            valid_categories: vec![],
        }
    }

    #[test]
    fn test_output_bounded_and_deduplicated() {
        let filter = keyword_filter(&[("agent", 1.0)]);
        let selector = CandidateSelector::new(filter, 2);

        let records = vec![
            paper("a1", "Agent systems", "agent", 1),
            paper("a1", "Agent systems duplicate", "agent", 1),
            paper("a2", "Multi-agent RL", "agent", 2),
            paper("a3", "Agent memory", "agent", 3),
        ];

        let batch = selector.select(records).unwrap();
        assert!(batch.len() <= 2);

        let ids: Vec<_> = batch.papers().map(|p| p.id.as_str()).collect();
        let mut unique = ids.clone();
        unique.dedup();
        assert_eq!(ids, unique, "批次中不应出现重复 id");
    }

    #[test]
    fn test_non_matching_records_excluded() {
        let filter = keyword_filter(&[("diffusion", 1.0)]);
        let selector = CandidateSelector::new(filter, 10);

        let records = vec![
            paper("m1", "Diffusion models", "We study diffusion processes.", 1),
            paper("m2", "Graph theory", "Pure combinatorics.", 2),
        ];

        let batch = selector.select(records).unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.papers().next().unwrap().id, "m1");
    }

    #[test]
    fn test_ordering_by_score_then_recency_then_id() {
        let filter = keyword_filter(&[("llm", 2.0), ("agent", 1.0)]);
        let selector = CandidateSelector::new(filter, 10);

        let records = vec![
            paper("b1", "agent only", "agent", 5),
            paper("b2", "llm and agent", "llm agent", 1),
            // 与 b1 同分同日，id 较小者在前
            paper("b0", "agent only too", "agent", 5),
        ];

        let batch = selector.select(records).unwrap();
        let ids: Vec<_> = batch.papers().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["b2", "b0", "b1"]);
    }

    #[test]
    fn test_category_allowlist_matches() {
        let filter = FilterConfig {
            keywords: BTreeMap::new(),
            categories: vec!["cs.AI".to_string()],
            valid_categories: vec![],
        };
        let selector = CandidateSelector::new(filter, 10);

        let mut matching = paper("c1", "Unrelated title", "Unrelated body", 1);
        matching.categories = vec!["cs.AI".to_string()];
        let non_matching = paper("c2", "Unrelated title", "Unrelated body", 2);

        let batch = selector.select(vec![matching, non_matching]).unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.papers().next().unwrap().id, "c1");
    }

    #[test]
    fn test_invalid_config_rejected() {
        let filter = keyword_filter(&[("agent", 1.0)]);
        let selector = CandidateSelector::new(filter, 0);
        assert!(matches!(
            selector.select(vec![]),
            Err(ConfigError::InvalidBatchSize)
        ));

        let selector = CandidateSelector::new(FilterConfig::default(), 10);
        assert!(matches!(
            selector.select(vec![]),
            Err(ConfigError::NoActiveCriteria)
        ));
    }
}
