//! HTTP implementation of the Tool Gateway
//!
//! Tool providers expose a single `POST /invoke` endpoint taking
//! `{"operation": ..., "args": ...}` and answering with the operation's
//! JSON result. The oracle speaks the chat-completions wire format
//! instead; both are normalized behind the same invoke contract.

use super::{ServiceId, ToolGateway};
use async_trait::async_trait;
use scholarmatch_common::config::{OracleConfig, ToolsConfig};
use scholarmatch_common::metrics::record_tool_call;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// HTTP tool gateway over the configured provider endpoints
pub struct HttpToolGateway {
    client: reqwest::Client,
    tools: ToolsConfig,
    oracle: OracleConfig,
}

#[derive(Serialize)]
struct InvokeRequest<'a> {
    operation: &'a str,
    args: &'a Value,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

impl HttpToolGateway {
    pub fn new(tools: ToolsConfig, oracle: OracleConfig) -> Self {
        let timeout = tools.timeout_secs.max(oracle.timeout_secs);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout))
            .build()
            .unwrap_or_default();

        Self {
            client,
            tools,
            oracle,
        }
    }

    fn base_url(&self, service: ServiceId) -> &str {
        match service {
            ServiceId::Search => &self.tools.search_url,
            ServiceId::University => &self.tools.university_url,
            ServiceId::Scholar => &self.tools.scholar_url,
            ServiceId::Document => &self.tools.document_url,
            ServiceId::Oracle => &self.oracle.endpoint,
        }
    }

    async fn dispatch(
        &self,
        service: ServiceId,
        operation: &str,
        args: &Value,
    ) -> anyhow::Result<Value> {
        if service == ServiceId::Oracle {
            return self.generate(args).await;
        }

        let url = format!("{}/invoke", self.base_url(service));
        let response = self
            .client
            .post(&url)
            .timeout(Duration::from_secs(self.tools.timeout_secs))
            .json(&InvokeRequest { operation, args })
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("tool returned status {}", response.status());
        }

        let text = response.text().await?;
        match serde_json::from_str::<Value>(&text) {
            Ok(value) => Ok(value),
            // Providers occasionally answer with bare text; surface it
            // the way callers expect instead of failing the call.
            Err(_) => Ok(json!({ "raw": text })),
        }
    }

    async fn generate(&self, args: &Value) -> anyhow::Result<Value> {
        let prompt = args
            .get("prompt")
            .and_then(Value::as_str)
            .unwrap_or_default();

        let request = ChatRequest {
            model: &self.oracle.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let mut builder = self
            .client
            .post(&self.oracle.endpoint)
            .timeout(Duration::from_secs(self.oracle.timeout_secs))
            .json(&request);
        if let Some(key) = &self.oracle.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", key));
        }

        let response = builder.send().await?;
        if !response.status().is_success() {
            anyhow::bail!("oracle returned status {}", response.status());
        }

        let chat: ChatResponse = response.json().await?;
        let content = chat
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .unwrap_or_default();

        Ok(Value::String(content))
    }
}

#[async_trait]
impl ToolGateway for HttpToolGateway {
    async fn invoke(&self, service: ServiceId, operation: &str, args: Value) -> Value {
        let started = Instant::now();
        debug!(service = service.as_str(), operation, "Tool invocation");

        match self.dispatch(service, operation, &args).await {
            Ok(value) => {
                record_tool_call(
                    service.as_str(),
                    operation,
                    started.elapsed().as_secs_f64(),
                    true,
                );
                value
            }
            Err(error) => {
                warn!(
                    service = service.as_str(),
                    operation,
                    error = %error,
                    "Tool invocation failed, returning empty result"
                );
                record_tool_call(
                    service.as_str(),
                    operation,
                    started.elapsed().as_secs_f64(),
                    false,
                );
                json!({})
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unroutable_gateway() -> HttpToolGateway {
        let tools = ToolsConfig {
            search_url: "http://127.0.0.1:1".to_string(),
            university_url: "http://127.0.0.1:1".to_string(),
            scholar_url: "http://127.0.0.1:1".to_string(),
            document_url: "http://127.0.0.1:1".to_string(),
            timeout_secs: 1,
        };
        let oracle = OracleConfig {
            endpoint: "http://127.0.0.1:1".to_string(),
            api_key: None,
            model: "test".to_string(),
            timeout_secs: 1,
        };
        HttpToolGateway::new(tools, oracle)
    }

    #[tokio::test]
    async fn transport_failure_degrades_to_empty_object() {
        let gateway = unroutable_gateway();
        let result = gateway
            .invoke(ServiceId::Search, "search_web", json!({"query": "x"}))
            .await;
        assert_eq!(result, json!({}));
    }

    #[tokio::test]
    async fn oracle_failure_degrades_to_empty_object() {
        let gateway = unroutable_gateway();
        let result = gateway
            .invoke(ServiceId::Oracle, "generate_text", json!({"prompt": "x"}))
            .await;
        assert_eq!(result, json!({}));
    }
}
