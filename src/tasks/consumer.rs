//! Queue consumer.
//!
//! Each message is either a management command (`{"command", "args",
//! "kwargs"}`) or an event-bus envelope describing an HTTP request that is
//! replayed through the application router.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{HeaderName, HeaderValue, Method, Request, StatusCode, header};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use tracing::{error, info};

use super::queue::{MessageQueue, QueueMessage};
use super::schedule::CommandPayload;
use crate::config::{ServerConfig, TasksConfig};

const MAX_IDLE_SLEEP_SECS: u64 = 10;

/// Executes a decoded management command.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run_command(&self, payload: CommandPayload) -> Result<()>;
}

/// What a single message turned into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Processed {
    Command(String),
    Replayed(StatusCode),
}

pub struct Consumer {
    queue: Arc<dyn MessageQueue>,
    runner: Arc<dyn CommandRunner>,
    router: Router,
    tasks: TasksConfig,
    server: ServerConfig,
}

impl Consumer {
    #[must_use]
    pub fn new(
        queue: Arc<dyn MessageQueue>,
        runner: Arc<dyn CommandRunner>,
        router: Router,
        tasks: TasksConfig,
        server: ServerConfig,
    ) -> Self {
        Self {
            queue,
            runner,
            router,
            tasks,
            server,
        }
    }

    pub async fn run(&self) -> Result<()> {
        info!(event = "consumer_started", queue = %self.tasks.queue_name, "Queue consumer running");

        let mut empty_tries: u64 = 0;
        loop {
            let handled = self.poll_once().await?;
            if handled == 0 {
                empty_tries += 1;
                tokio::time::sleep(Duration::from_secs(empty_tries.min(MAX_IDLE_SLEEP_SECS))).await;
            } else {
                empty_tries = 0;
            }
        }
    }

    /// Receives one batch and handles it. Returns the number of messages.
    pub async fn poll_once(&self) -> Result<usize> {
        let messages = self
            .queue
            .receive(
                &self.tasks.queue_name,
                self.tasks.max_messages.clamp(1, 10),
                Duration::from_secs(self.tasks.visibility_timeout_seconds),
                Duration::from_secs(self.tasks.wait_time_seconds),
            )
            .await?;

        let count = messages.len();
        for message in messages {
            self.handle(&message).await;
            self.queue.delete(&message.receipt_handle).await?;
            info!(
                event = "queue_message_deleted",
                receipt_handle = %message.receipt_handle,
                "Received and deleted message"
            );
        }
        Ok(count)
    }

    async fn handle(&self, message: &QueueMessage) {
        match self.process(&message.body).await {
            Ok(Processed::Replayed(status)) if status.as_u16() > 201 => {
                error!(
                    event = "queue_replay_unexpected_status",
                    status = status.as_u16(),
                    body = %message.body,
                    "Unexpected status while processing message from the event bus"
                );
            }
            Ok(_) => {}
            Err(e) => {
                error!(
                    event = "queue_message_failed",
                    error = %e,
                    body = %message.body,
                    "Failed to process queue message"
                );
            }
        }
    }

    pub async fn process(&self, body: &str) -> Result<Processed> {
        let decoded: Value = serde_json::from_str(body).context("Message body is not JSON")?;

        if decoded.get("command").is_some() {
            let payload: CommandPayload =
                serde_json::from_value(decoded).context("Malformed command payload")?;
            let name = payload.command.clone();
            self.runner.run_command(payload).await?;
            return Ok(Processed::Command(name));
        }

        let request = envelope_request(&decoded, self.server.primary_host())?;
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .map_err(|e| anyhow!("Router failed: {e}"))?;

        let status = response.status();
        if status.as_u16() > 201 {
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
            error!(
                event = "queue_replay_response",
                status = status.as_u16(),
                body = %String::from_utf8_lossy(&bytes),
                "Replayed request failed"
            );
        }
        Ok(Processed::Replayed(status))
    }
}

/// Rebuilds an HTTP request from an event-bus envelope.
pub fn envelope_request(envelope: &Value, host: Option<&str>) -> Result<Request<Body>> {
    let path = envelope
        .get("detail-type")
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("Envelope has no detail-type"))?;
    let detail = envelope
        .get("detail")
        .ok_or_else(|| anyhow!("Envelope has no detail"))?;

    let method = detail
        .get("httpMethod")
        .and_then(Value::as_str)
        .unwrap_or("POST");
    let method = Method::from_bytes(method.as_bytes()).context("Invalid httpMethod")?;

    let body = match detail.get("body") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    };

    let query = detail
        .get("queryStringParameters")
        .and_then(Value::as_object)
        .map(|params| {
            params
                .iter()
                .map(|(k, v)| {
                    let v = v.as_str().map_or_else(|| v.to_string(), ToString::to_string);
                    format!("{}={}", urlencoding::encode(k), urlencoding::encode(&v))
                })
                .collect::<Vec<_>>()
                .join("&")
        })
        .unwrap_or_default();

    let uri = if query.is_empty() {
        path.to_string()
    } else {
        format!("{path}?{query}")
    };

    let mut builder = Request::builder().method(method).uri(uri);

    let mut has_content_type = false;
    if let Some(headers) = detail.get("headers").and_then(Value::as_object) {
        for (name, value) in headers {
            let Some(value) = value.as_str() else {
                continue;
            };
            let name = HeaderName::from_bytes(name.as_bytes()).context("Invalid header name")?;
            if name == header::CONTENT_TYPE {
                has_content_type = true;
            }
            builder = builder.header(name, HeaderValue::from_str(value).context("Invalid header value")?);
        }
    }
    if !has_content_type {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
    }

    let mut request = builder.body(Body::from(body)).context("Failed to build request")?;
    if let Some(host) = host {
        request
            .headers_mut()
            .insert(header::HOST, HeaderValue::from_str(host).context("Invalid host")?);
    }
    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use serde_json::json;

    #[tokio::test]
    async fn envelope_becomes_request() {
        let envelope = json!({
            "version": "0",
            "detail-type": "/api/v1/support/help/",
            "source": "com.test",
            "detail": {
                "httpMethod": "PUT",
                "body": {"title": "t"},
                "headers": null,
                "queryStringParameters": {"page": "2", "q": "a b"}
            }
        });

        let request = envelope_request(&envelope, Some("animeon.example")).unwrap();
        assert_eq!(request.method(), Method::PUT);
        assert_eq!(request.uri(), "/api/v1/support/help/?page=2&q=a%20b");
        assert_eq!(request.headers()[header::CONTENT_TYPE], "application/json");
        assert_eq!(request.headers()[header::HOST], "animeon.example");

        let body = request.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], br#"{"title":"t"}"#);
    }

    #[test]
    fn configured_host_replaces_envelope_host() {
        let envelope = json!({
            "detail-type": "/ping/",
            "detail": {"headers": {"Host": "internal.local", "X-Trace": "1"}},
        });
        let request = envelope_request(&envelope, Some("animeon.example")).unwrap();

        let hosts: Vec<_> = request.headers().get_all(header::HOST).iter().collect();
        assert_eq!(hosts, ["animeon.example"]);
        assert_eq!(request.headers()["x-trace"], "1");
    }

    #[test]
    fn envelope_defaults_to_post() {
        let envelope = json!({"detail-type": "/ping/", "detail": {}});
        let request = envelope_request(&envelope, None).unwrap();
        assert_eq!(request.method(), Method::POST);
        assert!(request.headers().get(header::HOST).is_none());

        assert!(envelope_request(&json!({"detail": {}}), None).is_err());
    }
}
