use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use talktastic_core::{OutboundPayload, Transport, TransportError};
use tracing::{debug, info, warn};

/// Webhook transport configuration
#[derive(Debug, Clone)]
pub struct WebhookTransportConfig {
    /// Request timeout (seconds)
    pub timeout: u64,

    /// User-Agent header
    pub user_agent: String,
}

impl Default for WebhookTransportConfig {
    fn default() -> Self {
        Self {
            timeout: 30,
            user_agent: format!("talktastic/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Posts payloads to the agent webhook, one attempt per call.
pub struct WebhookTransport {
    client: Client,
}

impl WebhookTransport {
    pub fn new(config: &WebhookTransportConfig) -> anyhow::Result<Self> {
        info!("Creating WebhookTransport (timeout {}s)", config.timeout);
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .user_agent(config.user_agent.clone())
            .pool_max_idle_per_host(0)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for WebhookTransport {
    async fn post(
        &self,
        endpoint: &str,
        payload: &OutboundPayload,
    ) -> Result<String, TransportError> {
        info!("Sending message to webhook: {endpoint}");
        debug!(
            "Payload: {}",
            payload.to_json().unwrap_or_else(|e| e.to_string())
        );

        let response = self
            .client
            .post(endpoint)
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                let kind = if e.is_timeout() { "timed out" } else { "failed" };
                warn!("Request to {endpoint} {kind}: {e}");
                TransportError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!("Webhook answered with status {status}");
            return Err(TransportError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| {
            warn!("Could not read webhook response body: {e}");
            TransportError::Network(e.to_string())
        })?;

        debug!("Webhook response: {body}");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use talktastic_core::encode_send;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::Mutex;

    /// Serve exactly one request with a canned response and capture what
    /// was received.
    async fn serve_once(status_line: &'static str, body: &'static str) -> (String, Arc<Mutex<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let captured = Arc::new(Mutex::new(String::new()));
        let sink = captured.clone();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                received.extend_from_slice(&buf[..n]);
                if request_complete(&received) {
                    break;
                }
            }
            *sink.lock().await = String::from_utf8_lossy(&received).into_owned();

            let response = format!(
                "HTTP/1.1 {status_line}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });

        (format!("http://{addr}/webhook/chat"), captured)
    }

    fn request_complete(received: &[u8]) -> bool {
        let text = String::from_utf8_lossy(received);
        let Some(header_end) = text.find("\r\n\r\n") else {
            return false;
        };
        let content_length = text[..header_end]
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        received.len() >= header_end + 4 + content_length
    }

    /// Answer two requests with keep-alive responses, holding each socket
    /// open, and report how many connections were accepted.
    async fn serve_keep_alive_twice() -> (String, tokio::task::JoinHandle<usize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let mut held = Vec::new();
            for _ in 0..2 {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut received = Vec::new();
                let mut buf = [0u8; 4096];
                while !request_complete(&received) {
                    let n = socket.read(&mut buf).await.unwrap();
                    if n == 0 {
                        break;
                    }
                    received.extend_from_slice(&buf[..n]);
                }
                socket
                    .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 2\r\n\r\nok")
                    .await
                    .unwrap();
                held.push(socket);
            }
            held.len()
        });

        (format!("http://{addr}/webhook/chat"), server)
    }

    fn transport() -> WebhookTransport {
        WebhookTransport::new(&WebhookTransportConfig {
            timeout: 5,
            ..WebhookTransportConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn posts_json_and_returns_raw_body() {
        let (endpoint, captured) = serve_once("200 OK", r#"{"type":"text","content":"hi there"}"#).await;
        let payload = encode_send("hello", None, true, None);

        let body = transport().post(&endpoint, &payload).await.unwrap();
        assert_eq!(body, r#"{"type":"text","content":"hi there"}"#);

        let request = captured.lock().await.clone();
        assert!(request.starts_with("POST /webhook/chat HTTP/1.1"));
        assert!(request.to_ascii_lowercase().contains("content-type: application/json"));
        assert!(request.contains(r#""message":"hello""#));
        assert!(request.contains(r#""sessionId":"anonymous""#));
    }

    #[tokio::test]
    async fn non_success_status_is_classified() {
        let (endpoint, _) = serve_once("500 Internal Server Error", "boom").await;
        let payload = encode_send("hello", None, true, None);

        let err = transport().post(&endpoint, &payload).await.unwrap_err();
        assert_eq!(err, TransportError::Status { status: 500 });
    }

    #[tokio::test]
    async fn empty_body_is_returned_as_is() {
        let (endpoint, _) = serve_once("200 OK", "").await;
        let payload = encode_send("hello", None, true, None);

        let body = transport().post(&endpoint, &payload).await.unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn each_post_opens_a_new_connection() {
        let (endpoint, server) = serve_keep_alive_twice().await;
        let payload = encode_send("hello", None, true, None);
        let transport = transport();

        assert_eq!(transport.post(&endpoint, &payload).await.unwrap(), "ok");
        assert_eq!(transport.post(&endpoint, &payload).await.unwrap(), "ok");
        assert_eq!(server.await.unwrap(), 2);
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let payload = encode_send("hello", None, true, None);
        let err = transport()
            .post(&format!("http://{addr}/webhook"), &payload)
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Network(_)));
    }
}
