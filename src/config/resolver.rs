use crate::ai::LlmError;
use crate::config::document::ConfigDocument;

/// 支持的供应商封闭集合：新增供应商 = 新增一个变体
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderId {
    OpenAi,
    Baidu,
    Alibaba,
    DeepSeek,
}

impl ProviderId {
    pub fn parse(s: &str) -> Result<Self, LlmError> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(ProviderId::OpenAi),
            "baidu" => Ok(ProviderId::Baidu),
            "alibaba" => Ok(ProviderId::Alibaba),
            "deepseek" => Ok(ProviderId::DeepSeek),
            other => Err(LlmError::UnsupportedProvider(format!(
                "{other} (supported: openai, baidu, alibaba, deepseek)"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenAi => "openai",
            ProviderId::Baidu => "baidu",
            ProviderId::Alibaba => "alibaba",
            ProviderId::DeepSeek => "deepseek",
        }
    }

    /// 内置默认值 (base_url, default_model)
    fn defaults(&self) -> (&'static str, &'static str) {
        match self {
            ProviderId::OpenAi => ("https://api.openai.com/v1", "gpt-3.5-turbo"),
            ProviderId::Baidu => ("https://aip.baidubce.com", "ERNIE-Bot-turbo"),
            ProviderId::Alibaba => ("https://dashscope.aliyuncs.com/api/v1", "qwen-turbo"),
            ProviderId::DeepSeek => ("https://api.deepseek.com/v1", "deepseek-chat"),
        }
    }
}

/// 解析完成的供应商配置：Agent 生命周期内不可变
#[derive(Clone, Debug)]
pub struct ProviderConfig {
    pub provider: ProviderId,
    pub api_key: String,
    pub secret_key: Option<String>,
    pub base_url: String,
    pub default_model: String,
    pub timeout_secs: u64,
    pub default_temperature: f32,
    pub default_max_tokens: u32,
    pub max_history_length: usize,
}

/// 调用方覆盖项：优先级最高
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub api_key: Option<String>,
    pub secret_key: Option<String>,
    pub base_url: Option<String>,
    pub default_model: Option<String>,
    pub timeout_secs: Option<u64>,
}

fn non_empty(v: Option<&String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// 解析顺序：调用方覆盖 > 配置文档 providers.<id> > 内置默认值
///
/// api_key 在任何网络调用之前校验，解析不出来直接报 MissingCredential。
pub fn resolve(
    provider: &str,
    doc: &ConfigDocument,
    overrides: &ConfigOverrides,
) -> Result<ProviderConfig, LlmError> {
    let id = ProviderId::parse(provider)?;
    let (default_base_url, default_model) = id.defaults();
    let entry = doc.providers.get(id.as_str());

    let api_key = non_empty(overrides.api_key.as_ref())
        .or_else(|| non_empty(entry.and_then(|e| e.api_key.as_ref())))
        .ok_or_else(|| LlmError::MissingCredential(id.as_str().to_string()))?;

    let secret_key = non_empty(overrides.secret_key.as_ref())
        .or_else(|| non_empty(entry.and_then(|e| e.secret_key.as_ref())));
    if id == ProviderId::Baidu && secret_key.is_none() {
        return Err(LlmError::MissingCredential("baidu (secret_key)".to_string()));
    }

    let base_url = non_empty(overrides.base_url.as_ref())
        .or_else(|| non_empty(entry.and_then(|e| e.base_url.as_ref())))
        .unwrap_or_else(|| default_base_url.to_string());

    let model = non_empty(overrides.default_model.as_ref())
        .or_else(|| non_empty(entry.and_then(|e| e.default_model.as_ref())))
        .unwrap_or_else(|| default_model.to_string());

    let settings = &doc.settings;
    Ok(ProviderConfig {
        provider: id,
        api_key,
        secret_key,
        base_url,
        default_model: model,
        timeout_secs: overrides.timeout_secs.or(settings.timeout).unwrap_or(60),
        default_temperature: settings.default_temperature.unwrap_or(0.7),
        default_max_tokens: settings.default_max_tokens.unwrap_or(1000),
        max_history_length: settings.max_history_length.unwrap_or(20),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::document::{ProviderEntry, Settings};
    use std::collections::HashMap;

    fn doc_with(id: &str, entry: ProviderEntry) -> ConfigDocument {
        let mut providers = HashMap::new();
        providers.insert(id.to_string(), entry);
        ConfigDocument {
            providers,
            settings: Settings {
                timeout: Some(30),
                max_history_length: Some(6),
                default_temperature: Some(0.5),
                default_max_tokens: Some(256),
            },
        }
    }

    #[test]
    fn document_values_resolve_exactly() {
        let doc = doc_with(
            "deepseek",
            ProviderEntry {
                api_key: Some("sk-x".to_string()),
                secret_key: None,
                base_url: Some("https://api.example/v1".to_string()),
                default_model: Some("deepseek-chat".to_string()),
            },
        );
        let cfg = resolve("deepseek", &doc, &ConfigOverrides::default()).unwrap();
        assert_eq!(cfg.provider, ProviderId::DeepSeek);
        assert_eq!(cfg.api_key, "sk-x");
        assert_eq!(cfg.base_url, "https://api.example/v1");
        assert_eq!(cfg.default_model, "deepseek-chat");
        assert_eq!(cfg.timeout_secs, 30);
        assert_eq!(cfg.max_history_length, 6);
        assert_eq!(cfg.default_max_tokens, 256);
    }

    #[test]
    fn overrides_win_over_document() {
        let doc = doc_with(
            "openai",
            ProviderEntry {
                api_key: Some("file-key".to_string()),
                secret_key: None,
                base_url: Some("https://file.example/v1".to_string()),
                default_model: Some("gpt-3.5-turbo".to_string()),
            },
        );
        let overrides = ConfigOverrides {
            api_key: Some("override-key".to_string()),
            base_url: Some("https://override.example/v1".to_string()),
            default_model: Some("gpt-4".to_string()),
            timeout_secs: Some(5),
            ..Default::default()
        };
        let cfg = resolve("openai", &doc, &overrides).unwrap();
        assert_eq!(cfg.api_key, "override-key");
        assert_eq!(cfg.base_url, "https://override.example/v1");
        assert_eq!(cfg.default_model, "gpt-4");
        assert_eq!(cfg.timeout_secs, 5);
    }

    #[test]
    fn builtin_defaults_fill_missing_fields() {
        let doc = doc_with(
            "alibaba",
            ProviderEntry {
                api_key: Some("k".to_string()),
                ..Default::default()
            },
        );
        let cfg = resolve("alibaba", &doc, &ConfigOverrides::default()).unwrap();
        assert_eq!(cfg.base_url, "https://dashscope.aliyuncs.com/api/v1");
        assert_eq!(cfg.default_model, "qwen-turbo");
    }

    #[test]
    fn missing_api_key_fails_before_anything_else() {
        // 空字符串等同于未配置
        let doc = doc_with(
            "openai",
            ProviderEntry {
                api_key: Some(String::new()),
                ..Default::default()
            },
        );
        let err = resolve("openai", &doc, &ConfigOverrides::default()).unwrap_err();
        assert!(matches!(err, LlmError::MissingCredential(_)));
    }

    #[test]
    fn baidu_requires_secret_key() {
        let doc = doc_with(
            "baidu",
            ProviderEntry {
                api_key: Some("ak".to_string()),
                ..Default::default()
            },
        );
        let err = resolve("baidu", &doc, &ConfigOverrides::default()).unwrap_err();
        assert!(matches!(err, LlmError::MissingCredential(_)));
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let doc = ConfigDocument::default();
        let err = resolve("gemini", &doc, &ConfigOverrides::default()).unwrap_err();
        assert!(matches!(err, LlmError::UnsupportedProvider(_)));
    }
}
