use serde::{Deserialize, Serialize};

use crate::build_prompt::Message;
use crate::error::{RagError, Result};
use crate::http::HttpClient;

/// The external language model. Only the text in and the text out are owned
/// by this crate.
pub trait ChatModel: Send + Sync {
    fn complete(&self, messages: &[Message]) -> Result<String>;
}

#[derive(Clone, Copy, Debug)]
pub struct SamplingOptions {
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: Option<ChatMessage>,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

pub struct OllamaChat {
    http: HttpClient,
    base_url: String,
    model: String,
    options: SamplingOptions,
}

impl OllamaChat {
    pub fn new(http: HttpClient, base_url: &str, model: &str, options: SamplingOptions) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            options,
        }
    }
}

impl ChatModel for OllamaChat {
    fn complete(&self, messages: &[Message]) -> Result<String> {
        let url = format!("{}/api/chat", self.base_url);
        let req = OllamaChatRequest {
            model: &self.model,
            messages,
            stream: false,
            options: OllamaOptions {
                temperature: self.options.temperature,
                num_predict: self.options.max_tokens,
            },
        };
        let res = self
            .http
            .post_json::<OllamaChatResponse, _>(&url, &req)
            .map_err(|e| RagError::Generation(e.to_string()))?;
        Ok(res.message.and_then(|m| m.content).unwrap_or_default())
    }
}

#[derive(Serialize)]
struct OpenAiChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
    frequency_penalty: f32,
    presence_penalty: f32,
}

#[derive(Deserialize)]
struct OpenAiChatResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: ChatMessage,
}

pub struct OpenAiChat {
    http: HttpClient,
    base_url: String,
    model: String,
    options: SamplingOptions,
}

impl OpenAiChat {
    pub fn new(http: HttpClient, base_url: &str, model: &str, options: SamplingOptions) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            options,
        }
    }
}

impl ChatModel for OpenAiChat {
    fn complete(&self, messages: &[Message]) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let req = OpenAiChatRequest {
            model: &self.model,
            messages,
            temperature: self.options.temperature,
            max_tokens: self.options.max_tokens,
            top_p: 0.9,
            frequency_penalty: 0.3,
            presence_penalty: 0.1,
        };
        let res = self
            .http
            .post_json::<OpenAiChatResponse, _>(&url, &req)
            .map_err(|e| RagError::Generation(e.to_string()))?;
        res.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| RagError::Generation("response has no choices".to_string()))
    }
}
