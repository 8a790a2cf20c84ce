use crate::ai::alibaba::AlibabaProvider;
use crate::ai::baidu::BaiduProvider;
use crate::ai::deepseek::DeepSeekProvider;
use crate::ai::openai::OpenAiProvider;
use crate::ai::types::{ChatRequest, ChatResponse, LlmError, LlmProvider};
use crate::config::{ProviderConfig, ProviderId};
use async_trait::async_trait;

#[derive(Clone, Debug)]
pub enum InnerProvider {
    OpenAi(OpenAiProvider),
    Baidu(BaiduProvider),
    Alibaba(AlibabaProvider),
    DeepSeek(DeepSeekProvider),
}

/// 统一入口：按解析好的配置实例化对应适配器
#[derive(Clone, Debug)]
pub struct AnyProvider {
    inner: InnerProvider,
}

impl AnyProvider {
    pub fn from_config(cfg: &ProviderConfig) -> Result<Self, LlmError> {
        let inner = match cfg.provider {
            ProviderId::OpenAi => InnerProvider::OpenAi(OpenAiProvider::new(
                cfg.api_key.clone(),
                cfg.base_url.clone(),
                cfg.timeout_secs,
            )?),
            ProviderId::Baidu => {
                // 解析阶段已保证 secret_key 存在
                let secret = cfg.secret_key.clone().ok_or_else(|| {
                    LlmError::MissingCredential("baidu (secret_key)".to_string())
                })?;
                InnerProvider::Baidu(BaiduProvider::new(
                    cfg.api_key.clone(),
                    secret,
                    cfg.base_url.clone(),
                    cfg.timeout_secs,
                )?)
            }
            ProviderId::Alibaba => InnerProvider::Alibaba(AlibabaProvider::new(
                cfg.api_key.clone(),
                cfg.base_url.clone(),
                cfg.timeout_secs,
            )?),
            ProviderId::DeepSeek => InnerProvider::DeepSeek(DeepSeekProvider::new(
                cfg.api_key.clone(),
                cfg.base_url.clone(),
                cfg.timeout_secs,
            )?),
        };
        Ok(Self { inner })
    }
}

#[async_trait]
impl LlmProvider for AnyProvider {
    async fn chat(&self, req: ChatRequest) -> Result<ChatResponse, LlmError> {
        match &self.inner {
            InnerProvider::OpenAi(p) => p.chat(req).await,
            InnerProvider::Baidu(p) => p.chat(req).await,
            InnerProvider::Alibaba(p) => p.chat(req).await,
            InnerProvider::DeepSeek(p) => p.chat(req).await,
        }
    }
}
