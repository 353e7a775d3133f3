//! HTTP client for the chat backend.

use url::Url;

use crate::chat::types::{ChatError, ChatRequest, ChatResult};
use crate::config::ChatConfig;
use crate::observability::metrics;

/// Relays chat messages to the configured backend endpoint.
#[derive(Debug, Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    endpoint: Url,
}

impl ChatClient {
    /// Create a client for the configured endpoint.
    pub fn new(config: &ChatConfig) -> ChatResult<Self> {
        let endpoint: Url = config.backend_url.parse().map_err(|e| {
            ChatError::Backend(format!("Invalid backend URL '{}': {}", config.backend_url, e))
        })?;
        // Backend calls bypass environment proxies.
        let http = reqwest::Client::builder()
            .no_proxy()
            .build()
            .map_err(|e| ChatError::Backend(e.to_string()))?;
        Ok(Self { http, endpoint })
    }

    /// The backend URL messages are posted to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Post `request` to the backend and return its JSON reply unchanged.
    pub async fn send(&self, request: &ChatRequest) -> ChatResult<serde_json::Value> {
        let result = self.exchange(request).await;
        metrics::record_chat_relay(match &result {
            Ok(_) => "ok",
            Err(ChatError::BackendUnavailable(_)) => "unavailable",
            Err(_) => "error",
        });
        result
    }

    async fn exchange(&self, request: &ChatRequest) -> ChatResult<serde_json::Value> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Chat backend returned an error");
            return Err(ChatError::Status {
                status: status.as_u16(),
            });
        }

        let reply: serde_json::Value = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "Chat backend reply is not JSON");
            ChatError::Backend(e.to_string())
        })?;
        tracing::debug!(reply = %reply, "Response from chat backend");
        Ok(reply)
    }
}

fn classify(err: reqwest::Error) -> ChatError {
    if err.is_connect() {
        tracing::error!(error = %err, "Chat backend unreachable");
        ChatError::BackendUnavailable(err.to_string())
    } else {
        tracing::error!(error = %err, "Chat backend request failed");
        ChatError::Backend(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_url() {
        let config = ChatConfig {
            backend_url: "not a url".into(),
        };
        assert!(ChatClient::new(&config).is_err());
    }

    #[tokio::test]
    async fn refused_connection_is_unavailable() {
        // Bind then drop to get a port nothing listens on.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = ChatClient::new(&ChatConfig {
            backend_url: format!("http://{addr}/api/chat"),
        })
        .unwrap();
        let err = client.send(&ChatRequest::default()).await.unwrap_err();
        assert!(err.is_unavailable(), "got {err}");
    }
}
