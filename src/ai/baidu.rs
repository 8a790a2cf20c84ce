use crate::ai::build_llm_http_client;
use crate::ai::types::{ChatMessage, ChatRequest, ChatResponse, LlmError, LlmProvider, Role};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use log::{info, warn};
use reqwest::StatusCode;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;

/// 提前刷新余量，避免拿到临过期令牌后聊天请求落空
const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

/// 文心接口的鉴权错误码（无效 / 过期的 access_token）
const ERR_INVALID_TOKEN: i64 = 110;
const ERR_EXPIRED_TOKEN: i64 = 111;

#[derive(Clone, Debug)]
struct AccessToken {
    token: String,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    fn is_valid(&self) -> bool {
        Utc::now() < self.expires_at
    }
}

/// 百度文心一言适配器：两段式协议
///
/// 先用 api_key + secret_key 换短期 access_token（实例内缓存到过期），
/// 再带着令牌调聊天接口。聊天接口返回鉴权错误时作废缓存、
/// 重新换一次令牌再试，第二次仍失败则向上抛 Auth。
#[derive(Clone, Debug)]
pub struct BaiduProvider {
    client: reqwest::Client,
    api_key: String,
    secret_key: String,
    base_url: String,
    token: Arc<Mutex<Option<AccessToken>>>,
}

impl BaiduProvider {
    pub fn new(
        api_key: String,
        secret_key: String,
        base_url: String,
        timeout_secs: u64,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            client: build_llm_http_client(timeout_secs)?,
            api_key,
            secret_key,
            base_url,
            token: Arc::new(Mutex::new(None)),
        })
    }

    /// 取可用令牌：缓存未过期直接复用，否则向令牌端点换新
    async fn ensure_token(&self) -> Result<String, LlmError> {
        let mut guard = self.token.lock().await;
        if let Some(ref tok) = *guard {
            if tok.is_valid() {
                return Ok(tok.token.clone());
            }
        }

        let url = format!(
            "{}/oauth/2.0/token?grant_type=client_credentials&client_id={}&client_secret={}",
            self.base_url.trim_end_matches('/'),
            self.api_key,
            self.secret_key
        );

        let resp = self
            .client
            .post(url)
            .send()
            .await
            .map_err(|e| LlmError::Http(e.to_string()))?;

        let status = resp.status();
        let raw = resp
            .text()
            .await
            .map_err(|e| LlmError::Http(e.to_string()))?;

        if status != StatusCode::OK {
            return Err(LlmError::Auth(format!(
                "baidu token endpoint: http {} {}",
                status.as_u16(),
                raw
            )));
        }

        let v: Value = serde_json::from_str(&raw)
            .map_err(|e| LlmError::Auth(format!("baidu token parse failed: {e}, raw={raw}")))?;
        let token = v
            .get("access_token")
            .and_then(|t| t.as_str())
            .ok_or_else(|| {
                // 200 但没有 access_token，报文里是 error/error_description
                let desc = v
                    .get("error_description")
                    .or_else(|| v.get("error"))
                    .and_then(|d| d.as_str())
                    .unwrap_or(&raw);
                LlmError::Auth(format!("baidu token exchange failed: {desc}"))
            })?
            .to_string();
        let expires_in = v
            .get("expires_in")
            .and_then(|e| e.as_i64())
            .unwrap_or(2_592_000);

        let tok = AccessToken {
            token: token.clone(),
            expires_at: Utc::now() + Duration::seconds(expires_in - TOKEN_REFRESH_MARGIN_SECS),
        };
        info!("baidu access token refreshed, expires_in={}s", expires_in);
        *guard = Some(tok);
        Ok(token)
    }

    async fn invalidate_token(&self) {
        *self.token.lock().await = None;
    }

    async fn send_chat(
        &self,
        token: &str,
        model: &str,
        body: &Value,
    ) -> Result<(StatusCode, String), LlmError> {
        let url = format!(
            "{}/rpc/2.0/ai_custom/v1/wenxinworkshop/chat/{}?access_token={}",
            self.base_url.trim_end_matches('/'),
            model.to_lowercase(),
            token
        );
        let resp = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| LlmError::Http(e.to_string()))?;
        let status = resp.status();
        let raw = resp
            .text()
            .await
            .map_err(|e| LlmError::Http(e.to_string()))?;
        Ok((status, raw))
    }
}

/// 文心的 messages 数组不接受开头的 system 角色，
/// 把 system 轮并入请求的专用 system 字段，其余轮按原序保留
pub(crate) fn split_system(messages: &[ChatMessage]) -> (Option<String>, Vec<ChatMessage>) {
    let mut system_parts = Vec::new();
    let mut rest = Vec::new();
    for m in messages {
        match m.role {
            Role::System => system_parts.push(m.content.clone()),
            _ => rest.push(m.clone()),
        }
    }
    let system = if system_parts.is_empty() {
        None
    } else {
        Some(system_parts.join("\n"))
    };
    (system, rest)
}

/// 聊天接口的鉴权失败有两种表现：HTTP 401/403，或 200 带 error_code 110/111
fn is_auth_error(status: StatusCode, raw: &str) -> bool {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return true;
    }
    serde_json::from_str::<Value>(raw)
        .ok()
        .and_then(|v| v.get("error_code").and_then(|c| c.as_i64()))
        .map(|code| code == ERR_INVALID_TOKEN || code == ERR_EXPIRED_TOKEN)
        .unwrap_or(false)
}

#[async_trait]
impl LlmProvider for BaiduProvider {
    async fn chat(&self, req: ChatRequest) -> Result<ChatResponse, LlmError> {
        let (system, messages) = split_system(&req.messages);
        let mut body = serde_json::json!({
            "messages": messages,
            "temperature": req.temperature,
            "max_output_tokens": req.max_tokens,
            "stream": false
        });
        if let Some(system) = system {
            body["system"] = Value::String(system);
        }

        let token = self.ensure_token().await?;
        let (mut status, mut raw) = self.send_chat(&token, &req.model, &body).await?;

        if is_auth_error(status, &raw) {
            // 缓存令牌可能已在服务端失效：作废后重新换一次令牌
            warn!("baidu chat rejected the cached token, re-authenticating once");
            self.invalidate_token().await;
            let token = self.ensure_token().await?;
            let retried = self.send_chat(&token, &req.model, &body).await?;
            status = retried.0;
            raw = retried.1;
            if is_auth_error(status, &raw) {
                return Err(LlmError::Auth(format!(
                    "baidu chat auth failed after token refresh: http {} {}",
                    status.as_u16(),
                    raw
                )));
            }
        }

        if !status.is_success() {
            let msg = serde_json::from_str::<Value>(&raw)
                .ok()
                .and_then(|v| {
                    v.get("error_msg")
                        .and_then(|m| m.as_str())
                        .map(|s| s.to_string())
                })
                .unwrap_or_else(|| raw.clone());
            return Err(LlmError::InvalidResponse(format!(
                "baidu: http {} {}",
                status.as_u16(),
                msg
            )));
        }

        let v: Value = serde_json::from_str(&raw)
            .map_err(|e| LlmError::InvalidResponse(format!("json parse failed: {e}, raw={raw}")))?;

        // 文心出错时也返回 200，靠 error_code 区分
        if let Some(code) = v.get("error_code").and_then(|c| c.as_i64()) {
            let msg = v
                .get("error_msg")
                .and_then(|m| m.as_str())
                .unwrap_or("unknown error");
            return Err(LlmError::InvalidResponse(format!(
                "baidu: error_code={code} {msg}"
            )));
        }

        let text = v
            .get("result")
            .and_then(|r| r.as_str())
            .ok_or_else(|| LlmError::InvalidResponse(format!("missing result, raw={raw}")))?
            .to_string();

        Ok(ChatResponse {
            text,
            raw: Some(raw),
        })
    }
}
