use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// 对话角色
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// 一条对话消息
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// 归一化请求：各供应商适配器统一接受的形状
#[derive(Clone, Debug)]
pub struct ChatRequest {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub messages: Vec<ChatMessage>,
}

/// 归一化响应：纯文本回答 + 原始报文（诊断用）
#[derive(Clone, Debug)]
pub struct ChatResponse {
    pub text: String,
    pub raw: Option<String>,
}

#[derive(thiserror::Error, Debug)]
pub enum LlmError {
    #[error("unsupported provider: {0}")]
    UnsupportedProvider(String),
    #[error("missing credential for provider {0}")]
    MissingCredential(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("auth failed: {0}")]
    Auth(String),
    #[error("http error: {0}")]
    Http(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn chat(&self, req: ChatRequest) -> Result<ChatResponse, LlmError>;
}
