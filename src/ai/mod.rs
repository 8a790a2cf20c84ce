pub mod alibaba;
pub mod baidu;
pub mod deepseek;
pub mod openai;
pub mod types;
pub mod unified;

pub use alibaba::AlibabaProvider;
pub use baidu::BaiduProvider;
pub use deepseek::DeepSeekProvider;
pub use openai::OpenAiProvider;
pub use types::{ChatMessage, ChatRequest, ChatResponse, LlmError, LlmProvider, Role};
pub use unified::AnyProvider;

pub(crate) fn build_llm_http_client(timeout_secs: u64) -> Result<reqwest::Client, LlmError> {
    let mut builder =
        reqwest::Client::builder().timeout(std::time::Duration::from_secs(timeout_secs));

    if let Ok(raw) = std::env::var("LLM_PROXY") {
        let t = raw.trim();
        if !t.is_empty() {
            let url = if t.contains("://") {
                t.to_string()
            } else {
                format!("socks5h://{}", t)
            };
            let proxy = reqwest::Proxy::all(&url).map_err(|e| LlmError::Http(e.to_string()))?;
            builder = builder.proxy(proxy);
        }
    }

    builder.build().map_err(|e| LlmError::Http(e.to_string()))
}
