use crate::adapters::ProviderOptions;
use crate::domain::model::{
    CodeContext, GenerationRequest, GenerationResponse, ProviderCapability,
};
use crate::domain::ports::LlmProvider;
use crate::utils::error::{AcaError, Result};
use crate::utils::validation;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4-turbo-preview";

const PROVIDER: &str = "OpenAI";
const CHARS_PER_TOKEN: usize = 4;

const BASE_SYSTEM_PROMPT: &str = "You are an expert software developer and code assistant. \
Generate clean, efficient, well-structured code following best practices. \
Include proper error handling, type hints, and documentation when appropriate. \
Focus on maintainability, performance, and readability.";

/// Models this adapter accepts, in display order.
pub const SUPPORTED_MODELS: &[&str] = &["gpt-4", "gpt-4-turbo", "gpt-4-turbo-preview", "gpt-3.5-turbo"];

fn model_capabilities(model: &str) -> Option<BTreeSet<ProviderCapability>> {
    use ProviderCapability::*;

    let caps: &[ProviderCapability] = match model {
        "gpt-4" | "gpt-4-turbo-preview" => &[
            CodeGeneration,
            CodeReview,
            CodeRefactoring,
            Documentation,
            Testing,
            FunctionCalling,
        ],
        "gpt-4-turbo" => &[
            CodeGeneration,
            CodeReview,
            CodeRefactoring,
            Documentation,
            Testing,
            FunctionCalling,
            Vision,
        ],
        "gpt-3.5-turbo" => &[CodeGeneration, CodeReview, Documentation, FunctionCalling],
        _ => return None,
    };
    Some(caps.iter().copied().collect())
}

fn model_token_limit(model: &str) -> usize {
    match model {
        "gpt-4" => 8192,
        "gpt-4-turbo" | "gpt-4-turbo-preview" => 128_000,
        "gpt-3.5-turbo" => 16_384,
        _ => 4096,
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub(crate) struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<&'a [String]>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    id: String,
    #[serde(default)]
    model: String,
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
    #[serde(default)]
    total_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    capabilities: BTreeSet<ProviderCapability>,
}

impl OpenAiProvider {
    pub fn new(options: ProviderOptions) -> Result<Self> {
        let api_key = options.api_key.filter(|key| !key.trim().is_empty());
        let api_key = validation::validate_required_field("OPENAI_API_KEY", &api_key)?.clone();

        let model = options.model.unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let capabilities =
            model_capabilities(&model).ok_or_else(|| AcaError::UnsupportedModel {
                model: model.clone(),
                supported: SUPPORTED_MODELS.join(", "),
            })?;

        let base_url = options
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let client = Client::builder().timeout(options.timeout).build()?;

        tracing::debug!("OpenAI provider ready: model={}, base_url={}", model, base_url);

        Ok(Self {
            client,
            api_key,
            base_url,
            model,
            capabilities,
        })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    pub fn token_limit(&self) -> usize {
        model_token_limit(&self.model)
    }

    pub(crate) fn system_prompt(context: Option<&CodeContext>) -> String {
        let mut prompt = BASE_SYSTEM_PROMPT.to_string();

        if let Some(language) = context.and_then(|c| c.language.as_deref()) {
            prompt.push_str(&format!(" You are working with {} code.", language));
        }
        if let Some(path) = context.and_then(|c| c.filepath.as_deref()) {
            prompt.push_str(&format!(" The target file is: {}", path));
        }

        prompt
    }

    pub(crate) fn build_messages(request: &GenerationRequest) -> Vec<ChatMessage> {
        let context = request.context.as_ref();
        let mut messages = vec![
            ChatMessage {
                role: "system",
                content: Self::system_prompt(context),
            },
            ChatMessage {
                role: "user",
                content: request.instruction.clone(),
            },
        ];

        if let Some(ctx) = context.filter(|c| !c.content.is_empty()) {
            messages.push(ChatMessage {
                role: "user",
                content: format!(
                    "Here's the current code for context:\n\n```{}\n{}\n```",
                    ctx.language.as_deref().unwrap_or(""),
                    ctx.content
                ),
            });
        }

        messages
    }

    fn estimate_request_tokens(&self, request: &GenerationRequest) -> usize {
        let context = request.context.as_ref();
        let instruction_tokens = self.estimate_tokens(&request.instruction);
        let context_tokens = context
            .filter(|c| !c.content.is_empty())
            .map(|c| self.estimate_tokens(&c.content))
            .unwrap_or(0);
        let system_tokens = self.estimate_tokens(&Self::system_prompt(context));

        instruction_tokens + context_tokens + system_tokens + request.max_tokens as usize
    }

    async fn send(&self, body: &ChatCompletionRequest<'_>) -> Result<ChatCompletionResponse> {
        let url = self.completions_url();
        tracing::debug!("POST {} (model={}, messages={})", url, body.model, body.messages.len());

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("API response status: {}", status);

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorEnvelope>(&text)
                .map(|envelope| envelope.error.message)
                .unwrap_or_else(|_| {
                    if text.trim().is_empty() {
                        status.canonical_reason().unwrap_or("request failed").to_string()
                    } else {
                        text
                    }
                });
            return Err(AcaError::ApiError {
                provider: PROVIDER.to_string(),
                status: status.as_u16(),
                message,
            });
        }

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "OpenAIProvider"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn capabilities(&self) -> &BTreeSet<ProviderCapability> {
        &self.capabilities
    }

    fn validate_request(&self, request: &GenerationRequest) -> Result<()> {
        if request.instruction.trim().is_empty() {
            return Err(AcaError::EmptyInstruction);
        }

        if request.max_tokens == 0 {
            return Err(AcaError::validation("max_tokens", "max_tokens must be positive"));
        }

        if !(0.0..=2.0).contains(&request.temperature) {
            return Err(AcaError::validation(
                "temperature",
                "temperature must be between 0.0 and 2.0",
            ));
        }

        let estimated = self.estimate_request_tokens(request);
        let limit = self.token_limit();
        if estimated > limit {
            return Err(AcaError::TokenLimitExceeded { estimated, limit });
        }

        Ok(())
    }

    fn estimate_tokens(&self, text: &str) -> usize {
        (text.chars().count() / CHARS_PER_TOKEN).max(1)
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse> {
        self.validate_request(request)?;

        let body = ChatCompletionRequest {
            model: &self.model,
            messages: Self::build_messages(request),
            max_tokens: request.max_tokens,
            temperature: Some(request.temperature),
            stop: (!request.stop_sequences.is_empty()).then_some(request.stop_sequences.as_slice()),
        };

        let completion = self.send(&body).await?;

        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AcaError::provider(PROVIDER, "response contained no choices"))?;

        let (prompt_tokens, completion_tokens, total_tokens) = completion
            .usage
            .map(|u| (u.prompt_tokens, u.completion_tokens, u.total_tokens))
            .unwrap_or((0, 0, 0));

        let mut metadata = HashMap::new();
        metadata.insert("prompt_tokens".to_string(), prompt_tokens.into());
        metadata.insert("completion_tokens".to_string(), completion_tokens.into());
        metadata.insert("response_id".to_string(), completion.id.into());

        tracing::info!(
            "🤖 {} answered: {} tokens, finish_reason={}",
            completion.model,
            total_tokens,
            choice.finish_reason.as_deref().unwrap_or("unknown")
        );

        Ok(GenerationResponse {
            content: choice.message.content.unwrap_or_default(),
            tokens_used: total_tokens,
            model: completion.model,
            finish_reason: choice.finish_reason.unwrap_or_else(|| "unknown".to_string()),
            metadata,
        })
    }

    async fn check_health(&self) -> bool {
        let body = ChatCompletionRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: "test".to_string(),
            }],
            max_tokens: 1,
            temperature: None,
            stop: None,
        };

        match self.send(&body).await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!("Health check failed: {}", e);
                false
            }
        }
    }
}
