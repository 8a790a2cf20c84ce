use crate::ai::build_llm_http_client;
use crate::ai::types::{ChatRequest, ChatResponse, LlmError, LlmProvider};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;

/// OpenAI 兼容适配器：POST {base_url}/chat/completions + Bearer 认证
#[derive(Clone, Debug)]
pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenAiProvider {
    pub fn new(api_key: String, base_url: String, timeout_secs: u64) -> Result<Self, LlmError> {
        Ok(Self {
            client: build_llm_http_client(timeout_secs)?,
            api_key,
            base_url,
        })
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
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
                return Err(LlmError::Auth(format!(
                    "openai: http {} {}",
                    status.as_u16(),
                    error_message(&raw).unwrap_or_else(|| raw.clone())
                )))
            }
            _ => {}
        }

        if !status.is_success() {
            return Err(LlmError::InvalidResponse(format!(
                "openai: http {} {}",
                status.as_u16(),
                error_message(&raw).unwrap_or_else(|| raw.clone())
            )));
        }

        let v: Value = serde_json::from_str(&raw)
            .map_err(|e| LlmError::InvalidResponse(format!("json parse failed: {e}, raw={raw}")))?;
        let text = extract_chat_text(&v, &raw)?;

        Ok(ChatResponse {
            text,
            raw: Some(raw),
        })
    }
}

/// 从供应商错误报文中取可读信息（error.message 或顶层 message）
fn error_message(raw: &str) -> Option<String> {
    let v: Value = serde_json::from_str(raw).ok()?;
    v.get("error")
        .and_then(|e| e.get("message"))
        .or_else(|| v.get("message"))
        .and_then(|m| m.as_str())
        .map(|s| s.to_string())
}

// 兼容不同模型的返回结构：
// - 标准：choices[0].message.content (string 或 content parts 数组，含 text)
// - 一些模型：choices[0].text
// - 兼容：choices[0].content (直接内容或数组)
pub(crate) fn extract_chat_text(v: &Value, raw: &str) -> Result<String, LlmError> {
    let choice0 = v
        .get("choices")
        .and_then(|c| c.get(0))
        .ok_or_else(|| LlmError::InvalidResponse(format!("missing choices[0], raw={raw}")))?;

    let content = choice0
        .get("message")
        .and_then(|m| m.get("content"))
        .or_else(|| choice0.get("content"));

    if let Some(content) = content {
        match content {
            Value::String(s) => Ok(s.clone()),
            Value::Array(arr) => {
                let mut parts = Vec::new();
                for it in arr {
                    if let Some(t) = it.get("text").and_then(|x| x.as_str()) {
                        parts.push(t.to_string());
                    } else if let Some(t) = it.as_str() {
                        parts.push(t.to_string());
                    }
                }
                Ok(parts.join("\n"))
            }
            _ => Err(LlmError::InvalidResponse(format!(
                "unexpected message.content type, raw={raw}"
            ))),
        }
    } else if let Some(Value::String(s)) = choice0.get("text") {
        Ok(s.clone())
    } else {
        Err(LlmError::InvalidResponse(format!(
            "missing content/text in choices[0], raw={raw}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extract_standard_message_content() {
        let v = json!({"choices": [{"message": {"role": "assistant", "content": "hello"}}]});
        assert_eq!(extract_chat_text(&v, "").unwrap(), "hello");
    }

    #[test]
    fn extract_content_parts_array() {
        let v = json!({"choices": [{"message": {"content": [
            {"type": "text", "text": "a"},
            {"type": "text", "text": "b"}
        ]}}]});
        assert_eq!(extract_chat_text(&v, "").unwrap(), "a\nb");
    }

    #[test]
    fn empty_choices_is_invalid_response() {
        let v = json!({"choices": []});
        assert!(matches!(
            extract_chat_text(&v, "{}"),
            Err(LlmError::InvalidResponse(_))
        ));
    }
}
