use crate::ai::build_llm_http_client;
use crate::ai::types::{ChatRequest, ChatResponse, LlmError, LlmProvider};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;

/// DeepSeek 适配器：与 OpenAI 同构的 /chat/completions 接口
#[derive(Clone, Debug)]
pub struct DeepSeekProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl DeepSeekProvider {
    pub fn new(api_key: String, base_url: String, timeout_secs: u64) -> Result<Self, LlmError> {
        Ok(Self {
            client: build_llm_http_client(timeout_secs)?,
            api_key,
            base_url,
        })
    }
}

#[async_trait]
impl LlmProvider for DeepSeekProvider {
    async fn chat(&self, req: ChatRequest) -> Result<ChatResponse, LlmError> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let body = serde_json::json!({
            "model": req.model,
            "temperature": req.temperature,
            "max_tokens": req.max_tokens,
            "messages": req.messages,
            "stream": false
        });

        let resp = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Http(e.to_string()))?;

        let status = resp.status();
        let raw = resp
            .text()
            .await
            .map_err(|e| LlmError::Http(e.to_string()))?;

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(LlmError::Auth(format!("deepseek: http {} {}", status.as_u16(), raw)))
            }
            _ => {}
        }

        if !status.is_success() {
            // DeepSeek 错误报文与 OpenAI 同形：{"error": {"message": ...}}
            let msg = serde_json::from_str::<Value>(&raw)
                .ok()
                .and_then(|v| {
                    v.get("error")
                        .and_then(|e| e.get("message"))
                        .and_then(|m| m.as_str())
                        .map(|s| s.to_string())
                })
                .unwrap_or_else(|| raw.clone());
            return Err(LlmError::InvalidResponse(format!(
                "deepseek: http {} {}",
                status.as_u16(),
                msg
            )));
        }

        let v: Value = serde_json::from_str(&raw)
            .map_err(|e| LlmError::InvalidResponse(format!("json parse failed: {e}, raw={raw}")))?;

        let text = v
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|x| x.as_str())
            .ok_or_else(|| {
                LlmError::InvalidResponse(format!(
                    "missing choices[0].message.content, raw={raw}"
                ))
            })?
            .to_string();

        Ok(ChatResponse {
            text,
            raw: Some(raw),
        })
    }
}
