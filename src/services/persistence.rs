//! 持久化接口与本地历史记录 - 业务能力层
//!
//! 核心只保证交付一套完整、已校验的结果集；各持久化目的地
//! （文档库、RSS、邮件等）通过 `PersistenceSink` 接入，成败不影响
//! 流水线本身的正确性。本模块自带一个本地 JSON 历史记录实现

use crate::config::Config;
use crate::models::{AnalysisResult, RunReport};
use anyhow::{Context, Result};
use serde_json::json;
use std::path::PathBuf;
use tokio::fs;
use tracing::{debug, info};

/// 持久化协作方接口
///
/// 接收最终采纳的结果集和运行报告
#[allow(async_fn_in_trait)]
pub trait PersistenceSink {
    async fn persist(&self, accepted: &[AnalysisResult], report: &RunReport) -> Result<()>;
}

/// 运行历史记录服务
///
/// 职责：
/// - 把每次运行的报告和采纳结果写成一个 JSON 文件
/// - 文件名带时间戳，历次运行互不覆盖
/// - 不关心流程顺序
pub struct HistoryWriter {
    history_folder: String,
}

impl HistoryWriter {
    pub fn new(config: &Config) -> Self {
        Self {
            history_folder: config.history_folder.clone(),
        }
    }

    /// 使用自定义目录创建
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            history_folder: path.into(),
        }
    }

    fn record_path(&self, report: &RunReport) -> PathBuf {
        // 纳秒部分保证同一秒内的多次运行互不覆盖
        let filename = format!(
            "run_{}.json",
            report.started_at.format("%Y%m%d_%H%M%S_%f")
        );
        PathBuf::from(&self.history_folder).join(filename)
    }
}

impl PersistenceSink for HistoryWriter {
    async fn persist(&self, accepted: &[AnalysisResult], report: &RunReport) -> Result<()> {
        fs::create_dir_all(&self.history_folder)
            .await
            .with_context(|| format!("无法创建历史记录目录: {}", self.history_folder))?;

        let record = json!({
            "timestamp": report.started_at.to_rfc3339(),
            "report": report,
            "accepted": accepted,
        });

        let path = self.record_path(report);
        let content = serde_json::to_string_pretty(&record)?;
        fs::write(&path, content)
            .await
            .with_context(|| format!("无法写入历史记录: {}", path.display()))?;

        debug!("历史记录大小: {} 条采纳结果", accepted.len());
        info!("📝 历史记录已保存: {}", path.display());

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn report_at(nanos: u32) -> RunReport {
        RunReport {
            started_at: Utc.timestamp_opt(1_756_000_000, nanos).unwrap(),
            selected: 0,
            analyzed: 0,
            verified_ok: 0,
            recovered: 0,
            permanently_failed: 0,
            failure_reasons: vec![],
        }
    }

    #[test]
    fn test_record_paths_unique_within_same_second() {
        let writer = HistoryWriter::with_path("history");
        assert_ne!(
            writer.record_path(&report_at(1)),
            writer.record_path(&report_at(2))
        );
    }

    #[tokio::test]
    async fn test_history_record_written() {
        let dir = std::env::temp_dir().join("history_writer_test");
        let writer = HistoryWriter::with_path(dir.to_string_lossy().to_string());

        let report = RunReport {
            started_at: Utc::now(),
            selected: 1,
            analyzed: 1,
            verified_ok: 1,
            recovered: 0,
            permanently_failed: 0,
            failure_reasons: vec![],
        };

        writer.persist(&[], &report).await.unwrap();

        let path = writer.record_path(&report);
        let content = tokio::fs::read_to_string(&path).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed["report"]["selected"], 1);

        tokio::fs::remove_file(&path).await.ok();
    }
}
