use crate::ai::LlmError;
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// 外部配置文档（YAML / JSON）的类型化模型
///
/// ```yaml
/// providers:
///   deepseek:
///     api_key: sk-...
///     base_url: https://api.deepseek.com/v1
///     default_model: deepseek-chat
/// settings:
///   timeout: 60
///   max_history_length: 20
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigDocument {
    #[serde(default)]
    pub providers: HashMap<String, ProviderEntry>,
    #[serde(default)]
    pub settings: Settings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderEntry {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub secret_key: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub default_model: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub timeout: Option<u64>,
    #[serde(default)]
    pub max_history_length: Option<usize>,
    #[serde(default)]
    pub default_temperature: Option<f32>,
    #[serde(default)]
    pub default_max_tokens: Option<u32>,
}

/// 未指定路径时按此顺序探测配置文件
const SEARCH_PATHS: &[&str] = &[
    "config/config.yaml",
    "config/config.yml",
    "config/config.json",
    "config.yaml",
    "config.yml",
    "config.json",
    "../config/config.yaml",
    "../config/config.yml",
    "../config/config.json",
];

/// 默认配置落盘位置
const DEFAULT_CONFIG_PATH: &str = "config/config.yaml";

impl Default for ConfigDocument {
    fn default() -> Self {
        let mut providers = HashMap::new();
        providers.insert(
            "openai".to_string(),
            ProviderEntry {
                api_key: Some(String::new()),
                secret_key: None,
                base_url: Some("https://api.openai.com/v1".to_string()),
                default_model: Some("gpt-3.5-turbo".to_string()),
            },
        );
        providers.insert(
            "baidu".to_string(),
            ProviderEntry {
                api_key: Some(String::new()),
                secret_key: Some(String::new()),
                base_url: Some("https://aip.baidubce.com".to_string()),
                default_model: Some("ERNIE-Bot-turbo".to_string()),
            },
        );
        providers.insert(
            "alibaba".to_string(),
            ProviderEntry {
                api_key: Some(String::new()),
                secret_key: None,
                base_url: Some("https://dashscope.aliyuncs.com/api/v1".to_string()),
                default_model: Some("qwen-turbo".to_string()),
            },
        );
        providers.insert(
            "deepseek".to_string(),
            ProviderEntry {
                api_key: Some(String::new()),
                secret_key: None,
                base_url: Some("https://api.deepseek.com/v1".to_string()),
                default_model: Some("deepseek-chat".to_string()),
            },
        );
        Self {
            providers,
            settings: Settings {
                timeout: Some(60),
                max_history_length: Some(20),
                default_temperature: Some(0.7),
                default_max_tokens: Some(1000),
            },
        }
    }
}

impl ConfigDocument {
    /// 按扩展名解析配置文件：.json 走 serde_json，其余按 YAML 处理
    pub fn load(path: &Path) -> Result<Self, LlmError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            LlmError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        if path.extension().and_then(|e| e.to_str()) == Some("json") {
            serde_json::from_str(&content).map_err(|e| {
                LlmError::Config(format!("invalid json in {}: {e}", path.display()))
            })
        } else {
            serde_yaml::from_str(&content).map_err(|e| {
                LlmError::Config(format!("invalid yaml in {}: {e}", path.display()))
            })
        }
    }

    /// 定位并加载配置文档
    ///
    /// 给了路径就只认该路径；否则依次探测常见位置，
    /// 全都不存在时写出一份默认配置（空密钥）再返回默认文档。
    pub fn discover(explicit: Option<&Path>) -> Result<Self, LlmError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        for candidate in SEARCH_PATHS {
            let path = Path::new(candidate);
            if path.exists() {
                return Self::load(path);
            }
        }

        let doc = Self::default();
        doc.write_default_file()?;
        Ok(doc)
    }

    fn write_default_file(&self) -> Result<(), LlmError> {
        let path = PathBuf::from(DEFAULT_CONFIG_PATH);
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| {
                LlmError::Config(format!("cannot create {}: {e}", dir.display()))
            })?;
        }
        let yaml = serde_yaml::to_string(self)
            .map_err(|e| LlmError::Config(format!("cannot serialize default config: {e}")))?;
        std::fs::write(&path, yaml).map_err(|e| {
            LlmError::Config(format!("cannot write {}: {e}", path.display()))
        })?;
        info!("created default config file: {}", path.display());
        Ok(())
    }
}
