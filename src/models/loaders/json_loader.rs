use crate::models::paper::PaperRecord;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

/// 从 JSON 文件加载论文记录列表
///
/// 文件内容为 `PaperRecord` 数组（订阅源抓取脚本的输出格式）
pub async fn load_paper_records(json_file_path: &Path) -> Result<Vec<PaperRecord>> {
    let content = fs::read_to_string(json_file_path)
        .await
        .with_context(|| format!("无法读取论文文件: {}", json_file_path.display()))?;

    let records: Vec<PaperRecord> = serde_json::from_str(&content)
        .with_context(|| format!("无法解析论文文件: {}", json_file_path.display()))?;

    Ok(records)
}

/// 从文件夹中加载所有 JSON 论文文件
///
/// 单个文件解析失败只记录警告，不影响其他文件
pub async fn load_all_paper_files(folder_path: &str) -> Result<Vec<PaperRecord>> {
    let folder = PathBuf::from(folder_path);

    if !folder.exists() {
        anyhow::bail!("文件夹不存在: {}", folder_path);
    }

    let mut all_records = Vec::new();
    let mut entries = fs::read_dir(&folder)
        .await
        .with_context(|| format!("无法读取文件夹: {}", folder_path))?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) == Some("json") {
            tracing::info!(
                "正在加载: {}",
                path.file_name().unwrap_or_default().to_string_lossy()
            );

            match load_paper_records(&path).await {
                Ok(records) => {
                    tracing::info!("成功加载 {} 篇论文", records.len());
                    all_records.extend(records);
                }
                Err(e) => {
                    tracing::warn!("加载文件失败 {}: {}", path.display(), e);
                }
            }
        }
    }

    Ok(all_records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_paper_records_from_json() {
        let json = r#"[
            {
                "id": "2508.01234",
                "title": "Scaling Laws for Agentic Systems",
                "abstract": "We study scaling behavior of agent frameworks.",
                "categories": ["cs.AI"],
                "published": "2025-08-01T12:00:00Z",
                "url": "https://arxiv.org/abs/2508.01234"
            }
        ]"#;

        let dir = std::env::temp_dir().join("paper_loader_test");
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let file = dir.join("papers.json");
        tokio::fs::write(&file, json).await.unwrap();

        let records = load_paper_records(&file).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "2508.01234");
        assert_eq!(records[0].categories, vec!["cs.AI"]);

        tokio::fs::remove_file(&file).await.ok();
    }
}
