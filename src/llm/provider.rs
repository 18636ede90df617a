//! LLM provider abstraction and the OpenAI-compatible HTTP transport.
//!
//! Grounded in the teacher's `agent/provider.rs::OpenAICompatibleProvider`:
//! same `reqwest::Client` + `base_url`/`api_key` shape, same
//! `chat/completions` endpoint, same bearer-auth-if-present idiom. The
//! teacher's token-by-token SSE parsing is dropped since this fabric has no
//! streaming requirement (§4.1 only needs the final text plus usage); a
//! single non-streaming POST is sufficient and simpler to cost-account.

use crate::error::LlmError;
use async_trait::async_trait;
use serde_json::json;

/// One LLM call's raw token usage, as reported by the provider (or
/// estimated when a provider omits usage accounting).
#[derive(Debug, Clone, Copy, Default)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// A provider's response: the generated text plus its token usage.
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub text: String,
    pub usage: Usage,
}

/// Abstraction over a single LLM backend, matching the teacher's
/// `#[async_trait] pub trait LLMProvider` shape.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        system: Option<&str>,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<GenerationResult, LlmError>;

    /// Human-readable provider key, used in cost/diagnostics records.
    fn name(&self) -> &str;
}

/// Calls any OpenAI-chat-completions-compatible HTTP endpoint.
pub struct OpenAICompatibleProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    name: String,
}

impl OpenAICompatibleProvider {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key,
            name: name.into(),
        }
    }
}

#[async_trait]
impl LLMProvider for OpenAICompatibleProvider {
    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        system: Option<&str>,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<GenerationResult, LlmError> {
        let mut messages = Vec::new();
        if let Some(system) = system {
            messages.push(json!({"role": "system", "content": system}));
        }
        messages.push(json!({"role": "user", "content": prompt}));

        let body = json!({
            "model": model,
            "messages": messages,
            "temperature": temperature,
            "max_tokens": max_tokens,
            "stream": false,
        });

        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let mut request = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() || e.is_connect() {
                LlmError::TransientNetwork { provider: self.name.clone(), message: e.to_string() }
            } else if e.status().map(|s| s.as_u16()) == Some(429) {
                LlmError::RateLimited { provider: self.name.clone() }
            } else if matches!(e.status().map(|s| s.as_u16()), Some(401) | Some(403)) {
                LlmError::AuthFailed { provider: self.name.clone() }
            } else {
                LlmError::TransientNetwork { provider: self.name.clone(), message: e.to_string() }
            }
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(LlmError::RateLimited { provider: self.name.clone() });
        }
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(LlmError::AuthFailed { provider: self.name.clone() });
        }
        if !status.is_success() {
            return Err(LlmError::TransientNetwork {
                provider: self.name.clone(),
                message: format!("HTTP {status}"),
            });
        }

        let value: serde_json::Value = response.json().await.map_err(|e| LlmError::ResponseParseError {
            provider: self.name.clone(),
            message: e.to_string(),
        })?;

        let text = value["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| LlmError::ResponseParseError {
                provider: self.name.clone(),
                message: "missing choices[0].message.content".to_string(),
            })?
            .to_string();

        let input_tokens = value["usage"]["prompt_tokens"].as_u64()
            .unwrap_or_else(|| estimate_tokens(prompt));
        let output_tokens = value["usage"]["completion_tokens"].as_u64()
            .unwrap_or_else(|| estimate_tokens(&text));

        Ok(GenerationResult { text, usage: Usage { input_tokens, output_tokens } })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn estimate_tokens(text: &str) -> u64 {
    (text.len() / 4).max(1) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn live_call_is_gated_by_env_var() {
        if std::env::var("TEST_NATIVE").is_err() {
            return;
        }
        let provider = OpenAICompatibleProvider::new("test", "http://localhost:8080/v1", None);
        let _ = provider.generate("test-model", "hi", None, 0.1, 16).await;
    }

    #[test]
    fn estimate_tokens_is_at_least_one() {
        assert_eq!(estimate_tokens(""), 1);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens(&"x".repeat(400)), 100);
    }
}
