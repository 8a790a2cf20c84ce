use crate::ai::build_llm_http_client;
use crate::ai::types::{ChatRequest, ChatResponse, LlmError, LlmProvider};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;

/// 阿里通义千问（DashScope 原生接口）适配器
///
/// 与 OpenAI 形状的差异：api_key 走专用请求头而不是 Bearer，
/// messages 包在 input 里，回答在 output.text。
#[derive(Clone, Debug)]
pub struct AlibabaProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl AlibabaProvider {
    pub fn new(api_key: String, base_url: String, timeout_secs: u64) -> Result<Self, LlmError> {
        Ok(Self {
            client: build_llm_http_client(timeout_secs)?,
            api_key,
            base_url,
        })
    }
}

#[async_trait]
impl LlmProvider for AlibabaProvider {
    async fn chat(&self, req: ChatRequest) -> Result<ChatResponse, LlmError> {
        let url = format!(
            "{}/services/aigc/text-generation/generation",
            self.base_url.trim_end_matches('/')
        );
        let body = serde_json::json!({
            "model": req.model,
            "input": {
                "messages": req.messages
            },
            "parameters": {
                "temperature": req.temperature,
                "max_tokens": req.max_tokens,
                "result_format": "text"
            }
        });

        let resp = self
            .client
            .post(url)
            .header("X-DashScope-API-Key", &self.api_key)
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
                return Err(LlmError::Auth(format!("alibaba: http {} {}", status.as_u16(), raw)))
            }
            _ => {}
        }

        if !status.is_success() {
            // DashScope 错误报文：{"code": "...", "message": "..."}
            let msg = serde_json::from_str::<Value>(&raw)
                .ok()
                .and_then(|v| {
                    let code = v.get("code").and_then(|c| c.as_str()).unwrap_or("");
                    v.get("message")
                        .and_then(|m| m.as_str())
                        .map(|m| format!("{code}: {m}"))
                })
                .unwrap_or_else(|| raw.clone());
            return Err(LlmError::InvalidResponse(format!(
                "alibaba: http {} {}",
                status.as_u16(),
                msg
            )));
        }

        let v: Value = serde_json::from_str(&raw)
            .map_err(|e| LlmError::InvalidResponse(format!("json parse failed: {e}, raw={raw}")))?;

        let text = v
            .get("output")
            .and_then(|o| o.get("text"))
            .and_then(|t| t.as_str())
            .ok_or_else(|| {
                LlmError::InvalidResponse(format!("missing output.text, raw={raw}"))
            })?
            .to_string();

        Ok(ChatResponse {
            text,
            raw: Some(raw),
        })
    }
}
