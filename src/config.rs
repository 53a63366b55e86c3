use crate::error::ConfigError;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 每次运行最多分析的论文数量
    pub max_batch_size: usize,
    /// 单篇论文分析的最大重试次数
    pub max_analysis_retries: usize,
    /// 重试间隔（秒）
    pub retry_delay_seconds: u64,
    /// 质量校验失败后的最大恢复轮数
    pub max_recovery_attempts: usize,
    /// 摘要最小长度（字符数）
    pub min_summary_length: usize,
    /// 摘要与原文重合度超过该阈值视为照抄
    pub abstract_echo_threshold: f64,
    /// 同时进行的分析调用数量（1 表示串行）
    pub max_concurrent_analysis: usize,
    /// 整次运行的超时时间（秒），不设置则不限时
    pub run_timeout_seconds: Option<u64>,
    /// 过滤配置文件路径（TOML）
    pub filter_file: String,
    /// 待分析论文 JSON 文件存放目录
    pub papers_folder: String,
    /// 运行历史记录存放目录
    pub history_folder: String,
    /// 输出日志文件
    pub output_log_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    // --- 过滤配置 ---
    pub filter: FilterConfig,
}

/// 论文过滤配置
///
/// 从 TOML 文件加载，示例：
///
/// ```toml
/// categories = ["cs.AI", "cs.CL", "cs.LG"]
/// valid_categories = ["LLM", "Agent", "RL", "CV", "Other"]
///
/// [keywords]
/// "large language model" = 2.0
/// "reinforcement learning" = 1.5
/// "agent" = 1.0
/// ```
#[derive(Clone, Debug, Default, Deserialize)]
pub struct FilterConfig {
    /// 关键词及其权重（命中标题或 abstract 即计分）
    #[serde(default)]
    pub keywords: BTreeMap<String, f64>,
    /// 来源分类白名单（arXiv 分类标签）
    #[serde(default)]
    pub categories: Vec<String>,
    /// 分析结果的有效分类集合（为空则不校验分类）
    #[serde(default)]
    pub valid_categories: Vec<String>,
}

impl FilterConfig {
    /// 从 TOML 文件加载过滤配置
    pub fn from_toml_file(path: &str) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::FilterFileReadFailed {
                path: path.to_string(),
                source: e,
            })?;

        toml::from_str(&content).map_err(|e| ConfigError::FilterFileParseFailed {
            path: path.to_string(),
            source: e,
        })
    }

    /// 是否存在至少一个有效的过滤条件
    pub fn has_active_criteria(&self) -> bool {
        !self.keywords.is_empty() || !self.categories.is_empty()
    }
}

impl Default for Config {
    fn default() -> Self {
        let mut keywords = BTreeMap::new();
        keywords.insert("large language model".to_string(), 2.0);
        keywords.insert("reinforcement learning".to_string(), 1.5);
        keywords.insert("agent".to_string(), 1.0);
        keywords.insert("retrieval".to_string(), 1.0);

        Self {
            max_batch_size: 20,
            max_analysis_retries: 3,
            retry_delay_seconds: 5,
            max_recovery_attempts: 2,
            min_summary_length: 80,
            abstract_echo_threshold: 0.9,
            max_concurrent_analysis: 1,
            run_timeout_seconds: None,
            filter_file: "filter.toml".to_string(),
            papers_folder: "papers".to_string(),
            history_folder: "history".to_string(),
            output_log_file: "output.txt".to_string(),
            verbose_logging: false,
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4o-mini".to_string(),
            filter: FilterConfig {
                keywords,
                categories: vec![
                    "cs.AI".to_string(),
                    "cs.CL".to_string(),
                    "cs.LG".to_string(),
                ],
                valid_categories: vec![
                    "LLM".to_string(),
                    "Agent".to_string(),
                    "RL".to_string(),
                    "CV".to_string(),
                    "Other".to_string(),
                ],
            },
        }
    }
}

impl Config {
    /// 从环境变量读取配置（缺省时使用默认值）
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            max_batch_size: std::env::var("MAX_BATCH_SIZE").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_batch_size),
            max_analysis_retries: std::env::var("MAX_ANALYSIS_RETRIES").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_analysis_retries),
            retry_delay_seconds: std::env::var("RETRY_DELAY_SECONDS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.retry_delay_seconds),
            max_recovery_attempts: std::env::var("MAX_RECOVERY_ATTEMPTS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_recovery_attempts),
            min_summary_length: std::env::var("MIN_SUMMARY_LENGTH").ok().and_then(|v| v.parse().ok()).unwrap_or(default.min_summary_length),
            abstract_echo_threshold: std::env::var("ABSTRACT_ECHO_THRESHOLD").ok().and_then(|v| v.parse().ok()).unwrap_or(default.abstract_echo_threshold),
            max_concurrent_analysis: std::env::var("MAX_CONCURRENT_ANALYSIS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_concurrent_analysis),
            run_timeout_seconds: std::env::var("RUN_TIMEOUT_SECONDS").ok().and_then(|v| v.parse().ok()),
            filter_file: std::env::var("FILTER_FILE").unwrap_or(default.filter_file),
            papers_folder: std::env::var("PAPERS_FOLDER").unwrap_or(default.papers_folder),
            history_folder: std::env::var("HISTORY_FOLDER").unwrap_or(default.history_folder),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or(default.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
            filter: default.filter,
        }
    }

    /// 加载完整配置：环境变量 + 过滤配置文件（存在时覆盖默认过滤条件）
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_env();
        if Path::new(&config.filter_file).exists() {
            config.filter = FilterConfig::from_toml_file(&config.filter_file)?;
        }
        Ok(config)
    }

    /// 校验配置（在任何 I/O 之前调用）
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_batch_size == 0 {
            return Err(ConfigError::InvalidBatchSize);
        }
        if !self.filter.has_active_criteria() {
            return Err(ConfigError::NoActiveCriteria);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let config = Config {
            max_batch_size: 0,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidBatchSize)
        ));
    }

    #[test]
    fn test_empty_filter_rejected() {
        let config = Config {
            filter: FilterConfig::default(),
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NoActiveCriteria)
        ));
    }

    #[test]
    fn test_filter_config_from_toml() {
        let toml_str = r#"
            categories = ["cs.AI"]
            valid_categories = ["LLM", "Other"]

            [keywords]
            "large language model" = 2.0
            "agent" = 1.0
        "#;
        let filter: FilterConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(filter.keywords.len(), 2);
        assert_eq!(filter.categories, vec!["cs.AI"]);
        assert!(filter.has_active_criteria());
    }
}
