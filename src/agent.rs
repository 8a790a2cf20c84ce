use crate::ai::{AnyProvider, ChatMessage, ChatRequest, LlmError, LlmProvider};
use crate::config::{self, ConfigDocument, ConfigOverrides, ProviderConfig};
use crate::session::ConversationSession;
use log::debug;
use std::path::Path;

/// 单次 ask 的覆盖项，只作用于当次调用，不改动已解析的配置
#[derive(Clone, Debug, Default)]
pub struct AskOptions {
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

/// 多厂商 LLM 代理门面
///
/// 一个实例绑定一个供应商适配器和一个会话；换供应商或换密钥需要新建实例。
/// `ask` 走 `&mut self`，同一实例的并发调用在编译期就被挡住。
#[derive(Debug)]
pub struct LLMAgent {
    config: ProviderConfig,
    provider: AnyProvider,
    session: ConversationSession,
}

impl LLMAgent {
    /// 从配置文件构建：未给路径时按常见位置探测（找不到会写出默认配置）
    pub fn new(
        provider: &str,
        config_path: Option<&Path>,
        overrides: ConfigOverrides,
    ) -> Result<Self, LlmError> {
        let doc = ConfigDocument::discover(config_path)?;
        Self::from_document(provider, &doc, overrides)
    }

    /// 从已加载的配置文档构建（无磁盘 I/O）
    pub fn from_document(
        provider: &str,
        doc: &ConfigDocument,
        overrides: ConfigOverrides,
    ) -> Result<Self, LlmError> {
        let config = config::resolve(provider, doc, &overrides)?;
        let provider = AnyProvider::from_config(&config)?;
        let session = ConversationSession::new(config.max_history_length);
        Ok(Self {
            config,
            provider,
            session,
        })
    }

    pub async fn ask(&mut self, text: &str) -> Result<String, LlmError> {
        self.ask_with(text, AskOptions::default()).await
    }

    /// 追加 user 轮 → 组窗口 → 调适配器 → 成功后追加 assistant 轮
    ///
    /// 适配器失败时 user 轮留在历史里（无配对 assistant 轮），错误原样上抛，
    /// 这一层不做任何重试。
    pub async fn ask_with(&mut self, text: &str, opts: AskOptions) -> Result<String, LlmError> {
        self.session.append_user(text);

        let req = ChatRequest {
            model: opts
                .model
                .unwrap_or_else(|| self.config.default_model.clone()),
            temperature: opts.temperature.unwrap_or(self.config.default_temperature),
            max_tokens: opts.max_tokens.unwrap_or(self.config.default_max_tokens),
            messages: self.session.window(),
        };
        debug!(
            "ask: provider={} model={} turns={}",
            self.config.provider.as_str(),
            req.model,
            req.messages.len()
        );

        let resp = self.provider.chat(req).await?;
        self.session.append_assistant(resp.text.clone());
        Ok(resp.text)
    }

    pub fn set_system_prompt(&mut self, prompt: &str) {
        self.session.set_system_prompt(prompt);
    }

    pub fn get_history(&self) -> Vec<ChatMessage> {
        self.session.history()
    }

    pub fn clear_history(&mut self) {
        self.session.clear();
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }
}
