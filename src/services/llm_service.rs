//! LLM 分析服务 - 业务能力层
//!
//! `AnalysisService` 的生产实现：把论文的标题和 abstract 交给 LLM，
//! 得到结构化的 `{summary, category}` 分析结果
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型
//! - 兼容 OpenAI API 的服务（如 Azure, Gemini, Doubao 等）

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::ServiceFailure;
use crate::models::AnalysisOutput;
use crate::services::analysis_client::AnalysisService;

/// LLM 分析服务
///
/// 职责：
/// - 一次调用分析一篇论文，返回摘要和分类
/// - 把传输层/协议层错误归类为封闭的 `ServiceFailure` 集合
/// - 不关心重试（由 `AnalysisClient` 负责）
/// - 不关心批次和流程顺序
pub struct LlmAnalysisService {
    client: Client<OpenAIConfig>,
    model_name: String,
    valid_categories: Vec<String>,
}

impl LlmAnalysisService {
    pub fn new(config: &Config) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        Self {
            client: Client::with_config(openai_config),
            model_name: config.llm_model_name.clone(),
            valid_categories: config.filter.valid_categories.clone(),
        }
    }

    /// 构建分析用的消息
    ///
    /// 返回 (user_message, system_message)
    fn build_messages(&self, title: &str, abstract_text: &str) -> (String, String) {
        let system_message = "你是一个学术论文分析助手。阅读论文的标题和摘要后，\
                              用中文给出一段凝练的分析性总结（说明研究问题、方法和贡献，\
                              不要逐字复述原文），并从给定分类中选择最合适的一个。\
                              只返回 JSON，不要返回任何其他内容。"
            .to_string();

        let categories = if self.valid_categories.is_empty() {
            "自行判断一个简短的英文分类词".to_string()
        } else {
            self.valid_categories.join(" / ")
        };

        let user_message = format!(
            r#"请分析以下论文并返回 JSON：

标题：{}

摘要：{}

可选分类：{}

返回格式（严格 JSON，无代码块标记）：
{{"summary": "分析性总结", "category": "所选分类"}}"#,
            title, abstract_text, categories
        );

        (user_message, system_message)
    }

    /// 从 LLM 响应文本中解析出结构化结果
    ///
    /// 容忍常见的代码块包裹（```json ... ```），其余格式一律视为 MalformedResponse
    fn parse_output(&self, content: &str) -> Result<AnalysisOutput, ServiceFailure> {
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Err(ServiceFailure::MalformedResponse);
        }

        // 截取第一个 '{' 到最后一个 '}' 之间的内容，跳过代码块标记
        let json_part = match (trimmed.find('{'), trimmed.rfind('}')) {
            (Some(start), Some(end)) if start < end => &trimmed[start..=end],
            _ => return Err(ServiceFailure::MalformedResponse),
        };

        let output: AnalysisOutput = serde_json::from_str(json_part).map_err(|e| {
            warn!("LLM 返回内容无法解析为 JSON: {}", e);
            ServiceFailure::MalformedResponse
        })?;

        Ok(output)
    }

    /// 把 async-openai 的错误归类为瞬时失败类型
    fn classify_error(error: &OpenAIError) -> ServiceFailure {
        match error {
            OpenAIError::Reqwest(inner) if inner.is_timeout() => ServiceFailure::Timeout,
            OpenAIError::Reqwest(_) => ServiceFailure::ServiceUnavailable,
            OpenAIError::JSONDeserialize(..) => ServiceFailure::MalformedResponse,
            OpenAIError::ApiError(api) => {
                let text = format!(
                    "{} {}",
                    api.r#type.as_deref().unwrap_or_default(),
                    api.message
                )
                .to_lowercase();
                if text.contains("rate") || text.contains("429") {
                    ServiceFailure::RateLimited
                } else {
                    ServiceFailure::ServiceUnavailable
                }
            }
            _ => ServiceFailure::ServiceUnavailable,
        }
    }
}

impl AnalysisService for LlmAnalysisService {
    async fn analyze(
        &self,
        title: &str,
        abstract_text: &str,
    ) -> Result<AnalysisOutput, ServiceFailure> {
        debug!("调用 LLM API，模型: {}", self.model_name);

        let (user_message, system_message) = self.build_messages(title, abstract_text);

        let system_msg = ChatCompletionRequestSystemMessageArgs::default()
            .content(system_message)
            .build()
            .map_err(|e| Self::classify_error(&e))?;

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(user_message)
            .build()
            .map_err(|e| Self::classify_error(&e))?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(vec![
                ChatCompletionRequestMessage::System(system_msg),
                ChatCompletionRequestMessage::User(user_msg),
            ])
            .temperature(0.3)
            .max_tokens(1024u32)
            .build()
            .map_err(|e| Self::classify_error(&e))?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            Self::classify_error(&e)
        })?;

        debug!("LLM API 调用成功");

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or(ServiceFailure::MalformedResponse)?;

        self.parse_output(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service() -> LlmAnalysisService {
        let config = Config {
            llm_api_key: "test-key".to_string(),
            ..Config::default()
        };
        LlmAnalysisService::new(&config)
    }

    #[test]
    fn test_parse_output_plain_json() {
        let service = test_service();
        let output = service
            .parse_output(r#"{"summary": "该文提出了新的检索增强方法", "category": "LLM"}"#)
            .unwrap();
        assert_eq!(output.category, "LLM");
        assert!(!output.summary.is_empty());
    }

    #[test]
    fn test_parse_output_with_code_fence() {
        let service = test_service();
        let content = "```json\n{\"summary\": \"总结\", \"category\": \"Agent\"}\n```";
        let output = service.parse_output(content).unwrap();
        assert_eq!(output.category, "Agent");
    }

    #[test]
    fn test_parse_output_rejects_garbage() {
        let service = test_service();
        assert_eq!(
            service.parse_output(""),
            Err(ServiceFailure::MalformedResponse)
        );
        assert_eq!(
            service.parse_output("这不是 JSON"),
            Err(ServiceFailure::MalformedResponse)
        );
        assert_eq!(
            service.parse_output("{\"summary\": 123}"),
            Err(ServiceFailure::MalformedResponse)
        );
    }

    /// 真实 API 连通性测试
    ///
    /// 运行方式：
    /// ```bash
    /// cargo test test_llm_analyze_real -- --ignored --nocapture
    /// ```
    #[tokio::test]
    #[ignore]
    async fn test_llm_analyze_real() {
        let _ = tracing_subscriber::fmt::try_init();

        let service = LlmAnalysisService::new(&Config::from_env());

        let result = service
            .analyze(
                "Attention Is All You Need",
                "The dominant sequence transduction models are based on complex \
                 recurrent or convolutional neural networks...",
            )
            .await;

        match result {
            Ok(output) => {
                println!("分类: {}", output.category);
                println!("摘要: {}", output.summary);
                assert!(!output.summary.is_empty());
            }
            Err(e) => panic!("LLM API 调用失败: {}", e),
        }
    }
}
